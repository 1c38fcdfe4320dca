use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// Root under which each train gets its own scoped temp directory.
    pub tmp_dir: PathBuf,
    /// How many finished train records the queue keeps for introspection.
    pub queue_history: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            tmp_dir: std::env::var("TMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir().join("backup-conductor")),
            queue_history: std::env::var("QUEUE_HISTORY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(64),
        }
    }
}
