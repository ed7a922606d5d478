use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub history_path: PathBuf,
    pub settings_path: PathBuf,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    pub fetch_concurrency: usize,
}
