use directories::ProjectDirs;
use std::env;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", "recite") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("recite_config.json")
        }
    }

    /// Where the JSON trace log goes; `RECITE_LOG` names a file explicitly
    pub fn trace_log_path() -> PathBuf {
        if let Ok(path) = env::var("RECITE_LOG") {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        ProjectDirs::from("", "", "recite")
            .map(|pd| pd.data_local_dir().join("recite_trace.jsonl"))
            .unwrap_or_else(|| env::temp_dir().join("recite_trace.jsonl"))
    }
}
