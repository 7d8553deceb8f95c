//! Environment-resolved configuration (spec §6 "Environment").

use std::env;
use std::path::PathBuf;

use raii_engine::DEFAULT_ABANDON_THRESHOLD;

const DB_DIR_ENV: &str = "RAII_DB_DIR";
const ABANDON_THRESHOLD_ENV: &str = "RAII_ABANDON_THRESHOLD";

/// `--db-dir` wins over `RAII_DB_DIR`, which wins over the default
/// per-user dotfile directory.
pub fn resolve_db_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| env::var_os(DB_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(default_db_dir)
}

fn default_db_dir() -> PathBuf {
    let home = env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    home.join(".claude").join("raii")
}

pub fn abandon_threshold() -> usize {
    env::var(ABANDON_THRESHOLD_ENV)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_ABANDON_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_overrides_default() {
        let dir = resolve_db_dir(Some(PathBuf::from("/tmp/custom-raii")));
        assert_eq!(dir, PathBuf::from("/tmp/custom-raii"));
    }
}
