use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::service::retry::RetryPolicy;

// 一組輸入/輸出目錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirPair {
    pub input: PathBuf,
    pub output: PathBuf,
}

// 應用配置結構體，封裝所有參數
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pairs: Vec<DirPair>,
    pub extensions: Vec<String>,
    pub exclude: Vec<String>,
    pub reference_file: Option<PathBuf>,
    pub max_concurrent: usize,
    pub timeout_secs: u64,
    pub backoff_secs: u64,
    pub jitter_ms: u64,
    pub export_timeout_secs: u64,
    pub office_binary: Option<PathBuf>,
    pub no_dialog: bool,
    pub no_progress: bool,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            pairs: Vec::new(),
            extensions: vec!["xlsx".to_string()],
            // 辦公軟體開啟檔案時產生的鎖定檔
            exclude: vec!["~$*".to_string()],
            reference_file: None,
            max_concurrent: 1,
            timeout_secs: 30,
            backoff_secs: 1,
            jitter_ms: 0,
            export_timeout_secs: 120,
            office_binary: None,
            no_dialog: false,
            no_progress: false,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_secs(self.timeout_secs),
            Duration::from_secs(self.backoff_secs),
        )
        .with_jitter(Duration::from_millis(self.jitter_ms))
    }

    pub fn export_timeout(&self) -> Duration {
        Duration::from_secs(self.export_timeout_secs)
    }
}

// 配置來源的 Port
pub trait ConfigPort {
    fn get_config(&self) -> io::Result<AppConfig>;
}
