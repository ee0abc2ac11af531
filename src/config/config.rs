use clap::Parser;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::ports::{AppConfig, DirPair};

#[derive(Parser, Clone, Debug)]
#[command(
    name = "sheet_to_pdf",
    about = "批次將試算表檔案轉換為 PDF",
    long_about = "透過辦公軟體（預設為無介面模式的 LibreOffice）將輸入目錄中的試算表批次匯出為 PDF，輸出檔名附加當日日期（DD-MM-YYYY）。\n每個檔案失敗時會在逾時前持續重試，完成後以對話框顯示成功轉換的數量。\n不帶任何參數執行時進入互動模式。使用 `--help` 查看詳細用法。",
    arg_required_else_help = false
)]
pub struct Cli {
    /// 輸入目錄，可用逗號分隔多個，與 --output 依序配對
    #[arg(short, long, value_delimiter = ',')]
    pub input: Vec<PathBuf>,
    /// 輸出目錄，可用逗號分隔多個
    #[arg(short, long, value_delimiter = ',')]
    pub output: Vec<PathBuf>,
    /// TOML 設定檔，命令列參數會覆蓋檔案中的設定
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, value_delimiter = ',')]
    pub extension: Option<Vec<String>>,
    #[arg(long, value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,
    /// 批次期間以唯讀方式開啟的參考檔案
    #[arg(long)]
    pub reference: Option<PathBuf>,
    #[arg(long)]
    pub max_concurrent: Option<usize>,
    /// 單一檔案的重試逾時（秒）
    #[arg(long)]
    pub timeout: Option<u64>,
    /// 重試間隔（秒）
    #[arg(long)]
    pub backoff: Option<u64>,
    #[arg(long)]
    pub jitter_ms: Option<u64>,
    /// 單次匯出程序的執行上限（秒）
    #[arg(long)]
    pub export_timeout: Option<u64>,
    #[arg(long)]
    pub office_bin: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    pub no_dialog: bool,
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
    #[arg(long, value_parser = ["debug", "info", "warn", "error"])]
    pub log_level: Option<String>,
    #[arg(long, default_value_t = false)]
    pub show_config: bool,
}

pub fn validate_input_path(input: &Path) -> io::Result<&Path> {
    if !input.exists() {
        log::error!("路徑不存在：{}", input.display());
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("路徑 '{}' 不存在", input.display()),
        ));
    }
    Ok(input)
}

pub fn is_valid_pattern(pattern: &str) -> bool {
    let invalid_chars = ['/', '\\', ':', '?', '"', '<', '>', '|'];
    !pattern.is_empty() && !pattern.contains(&invalid_chars[..])
}

pub fn validate_file_patterns(extensions: &[String], exclude: &[String]) -> io::Result<()> {
    if extensions.is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "至少需要一個副檔名"));
    }
    for ext in extensions {
        if !is_valid_pattern(ext) || ext.contains('*') {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, format!("無效的副檔名: {}", ext)));
        }
    }
    for pattern in exclude {
        if !is_valid_pattern(pattern) {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, format!("無效的排除模式: {}", pattern)));
        }
    }
    Ok(())
}

/// 將輸入與輸出目錄依序配對，兩者數量必須一致
pub fn pair_directories(inputs: &[PathBuf], outputs: &[PathBuf]) -> io::Result<Vec<DirPair>> {
    if inputs.len() != outputs.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("輸入目錄數量（{}）與輸出目錄數量（{}）不一致", inputs.len(), outputs.len()),
        ));
    }
    Ok(inputs
        .iter()
        .zip(outputs)
        .map(|(input, output)| DirPair {
            input: input.clone(),
            output: output.clone(),
        })
        .collect())
}

pub fn validate_config(config: &AppConfig) -> io::Result<()> {
    if config.pairs.is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "未指定任何輸入/輸出目錄"));
    }
    if config.max_concurrent == 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "max_concurrent 必須至少為 1"));
    }
    if config.export_timeout_secs == 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "export_timeout_secs 必須大於 0"));
    }
    validate_file_patterns(&config.extensions, &config.exclude)?;
    if let Some(reference) = &config.reference_file {
        validate_input_path(reference)?;
    }
    if config.max_concurrent > 1 {
        log::warn!(
            "並行數設為 {}，請確認辦公軟體自動化介面支援多個實例同時執行",
            config.max_concurrent
        );
    }
    Ok(())
}
