use dialoguer::{Confirm, Input};
use std::io;
use std::path::{Path, PathBuf};

use crate::action::cli::run_batch;
use crate::config::ports::{AppConfig, ConfigPort, DirPair};
use crate::models::conversion::BatchOutcome;
use crate::service::config_service::{ConfigService, DefaultConfigAdapter};
use crate::utils::utils::setup_logging;

pub fn process_interactive_mode() -> io::Result<BatchOutcome> {
    println!("=== 歡迎使用互動模式 ===");
    let use_default_config = get_default_config_option()?;
    let pairs = get_directory_pairs()?;

    let config_port: Box<dyn ConfigPort> = if use_default_config {
        println!("使用預設配置：xlsx 檔案，單一並行，逾時 30 秒，重試間隔 1 秒");
        Box::new(DefaultConfigAdapter::new(pairs))
    } else {
        Box::new(InteractiveConfigAdapter::new(pairs))
    };

    let config = ConfigService::new(config_port).get_config()?;
    setup_logging(&config.log_level)?;
    run_batch(&config)
}

pub fn get_default_config_option() -> io::Result<bool> {
    Confirm::new()
        .with_prompt("是否使用預設配置？（僅需指定輸入和輸出目錄）")
        .default(true)
        .interact()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("預設配置選擇失敗: {}", e)))
}

pub fn get_input_dir() -> io::Result<PathBuf> {
    Input::<String>::new()
        .with_prompt("請輸入試算表所在目錄")
        .validate_with(|input: &String| -> Result<(), String> {
            if Path::new(input).is_dir() { Ok(()) } else { Err(format!("目錄 '{}' 不存在", input)) }
        })
        .interact_text()
        .map(PathBuf::from)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
}

pub fn get_output_dir() -> io::Result<PathBuf> {
    Input::<String>::new()
        .with_prompt("輸入 PDF 輸出目錄（預設為 output）")
        .default("output".to_string())
        .interact_text()
        .map(PathBuf::from)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
}

pub fn get_directory_pairs() -> io::Result<Vec<DirPair>> {
    let mut pairs = Vec::new();
    loop {
        let input = get_input_dir()?;
        let output = get_output_dir()?;
        pairs.push(DirPair { input, output });
        let more = Confirm::new()
            .with_prompt("是否加入另一組目錄？")
            .default(false)
            .interact()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("目錄選擇失敗: {}", e)))?;
        if !more {
            return Ok(pairs);
        }
    }
}

fn prompt_number<T>(prompt: &str, default: T) -> io::Result<T>
where
    T: Clone + ToString + std::str::FromStr,
    <T as std::str::FromStr>::Err: ToString,
{
    Input::<T>::new()
        .with_prompt(prompt)
        .default(default)
        .interact_text()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("數值輸入失敗: {}", e)))
}

pub fn get_extensions() -> io::Result<Vec<String>> {
    let extensions = Input::<String>::new()
        .with_prompt("輸入副檔名（例如：xlsx,xlsm，預設為 xlsx）")
        .default("xlsx".to_string())
        .interact_text()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("副檔名輸入失敗: {}", e)))?
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<String>>();
    Ok(extensions)
}

pub fn get_reference_file() -> io::Result<Option<PathBuf>> {
    let reference = Input::<String>::new()
        .with_prompt("參考檔案路徑（留空表示不使用）")
        .allow_empty(true)
        .interact_text()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("參考檔案輸入失敗: {}", e)))?;
    let reference = reference.trim();
    Ok(if reference.is_empty() { None } else { Some(PathBuf::from(reference)) })
}

// 交互配置適配器
pub struct InteractiveConfigAdapter {
    pairs: Vec<DirPair>,
}

impl InteractiveConfigAdapter {
    pub fn new(pairs: Vec<DirPair>) -> Self {
        InteractiveConfigAdapter { pairs }
    }
}

impl ConfigPort for InteractiveConfigAdapter {
    fn get_config(&self) -> io::Result<AppConfig> {
        let defaults = AppConfig::default();
        let extensions = get_extensions()?;
        let reference_file = get_reference_file()?;
        let max_concurrent = prompt_number("最大並行數", defaults.max_concurrent)?;
        let timeout_secs = prompt_number("單一檔案逾時（秒）", defaults.timeout_secs)?;
        let backoff_secs = prompt_number("重試間隔（秒）", defaults.backoff_secs)?;

        Ok(AppConfig {
            pairs: self.pairs.clone(),
            extensions,
            reference_file,
            max_concurrent,
            timeout_secs,
            backoff_secs,
            ..defaults
        })
    }
}
