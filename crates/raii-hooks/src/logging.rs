//! File-backed `tracing` setup shared by every interceptor binary —
//! the Rust analogue of the original `logging.basicConfig(filename=...)`
//! each Python hook called individually.

use std::fs::OpenOptions;
use std::path::Path;

pub fn init(db_dir: &Path) {
    let _ = std::fs::create_dir_all(db_dir);
    let log_path = db_dir.join("hooks.log");

    let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) else {
        return;
    };

    let _ = tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}
