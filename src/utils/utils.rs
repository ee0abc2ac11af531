use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use regex::RegexSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub fn log_level_filter(log_level: &str) -> log::LevelFilter {
    match log_level {
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    }
}

pub fn setup_logging(log_level: &str) -> io::Result<()> {
    env_logger::Builder::new()
        .filter_level(log_level_filter(log_level))
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("日誌初始化失敗: {}", e)))
}

pub struct ProgressManager {
    pb: ProgressBar,
    no_progress: bool,
    start: Instant,
}

impl ProgressManager {
    pub fn new(total: u64, no_progress: bool) -> Self {
        let pb = if no_progress {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{msg} [{bar:40}] {pos}/{len} ETA: {eta_precise}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("##-"),
            );
            pb
        };
        ProgressManager {
            pb,
            no_progress,
            start: Instant::now(),
        }
    }

    pub fn update(&self, converted: usize, failed: usize, current: &Path) {
        if self.no_progress {
            return;
        }
        self.pb.set_message(format!(
            "成功 {}，失敗 {}，最後完成：{}",
            converted,
            failed,
            current.file_name().unwrap_or(current.as_os_str()).to_string_lossy()
        ));
        self.pb.inc(1);
    }

    pub fn finish(&self, converted: usize, failed: usize) {
        if self.no_progress {
            return;
        }
        self.pb.finish_with_message(format!(
            "完成，成功 {} 個，失敗 {} 個，耗時 {:.1} 秒",
            converted,
            failed,
            self.start.elapsed().as_secs_f64()
        ));
    }
}

pub fn create_progress_bar(total: u64, no_progress: bool) -> ProgressManager {
    ProgressManager::new(total, no_progress)
}

/// 將 `~$*` 這類萬用字元模式轉成比對整個檔名的正規表示式
pub fn create_regex_set(patterns: &[String]) -> RegexSet {
    let regex_patterns: Vec<_> = patterns
        .iter()
        .map(|p| format!("^{}$", regex::escape(p).replace("\\*", ".*")))
        .collect();

    RegexSet::new(&regex_patterns).unwrap_or_else(|e| {
        log::warn!("無效的排除模式: {}，使用空集作為回退", e);
        RegexSet::empty()
    })
}

/// 產生 `<原檔名>_<DD-MM-YYYY>.<副檔名>`，放在 `output_path` 所在目錄
pub fn timestamped_output_path(input_path: &Path, output_path: &Path, date: NaiveDate) -> PathBuf {
    let stem = input_path
        .file_stem()
        .unwrap_or(std::ffi::OsStr::new("output"))
        .to_string_lossy();
    let extension = output_path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "pdf".to_string());
    let file_name = format!("{}_{}.{}", stem, date.format("%d-%m-%Y"), extension);
    match output_path.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}
