use std::path::PathBuf;

use clap::Parser;

/// Shared CLI surface for every interceptor binary.
#[derive(Parser, Debug)]
#[command(version)]
pub struct HookCli {
    /// Store directory override (falls back to RAII_DB_DIR, then
    /// ~/.claude/raii).
    #[arg(long)]
    pub db_dir: Option<PathBuf>,
}
