use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_subscriber::fmt::time::UtcTime;

use crate::app_dirs::AppDirs;

static TRACING_INIT: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Tracing is off unless asked for, the terminal is owned by the UI
pub fn logging_requested(flag: bool) -> bool {
    flag || env::var_os("RECITE_LOG").is_some()
}

/// Install a JSON file subscriber once. Returns the log path when logging is active.
pub fn init_tracing(enabled: bool) -> Option<PathBuf> {
    if !enabled {
        return None;
    }

    TRACING_INIT
        .get_or_init(|| {
            let path = AppDirs::trace_log_path();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).ok()?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .ok()?;
            let subscriber = tracing_subscriber::fmt()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .with_writer(file)
                .with_current_span(false)
                .with_span_list(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber).ok()?;
            Some(path)
        })
        .clone()
}
