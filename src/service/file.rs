use log::{debug, info, warn};
use regex::RegexSet;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::ports::DirPair;
use crate::models::conversion::ConversionJob;
use crate::service::traits::i_office::ExportFormat;
use crate::service::traits::i_service::FileServiceTrait;
use crate::utils::utils::create_regex_set;

/// 檔案服務，負責在輸入目錄中列舉試算表
pub struct FileService {
    extensions: Vec<String>,
    exclude_set: RegexSet,
    format: ExportFormat,
}

impl FileService {
    pub fn new(extensions: &[String], exclude: &[String]) -> Self {
        FileService {
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            exclude_set: create_regex_set(exclude),
            format: ExportFormat::Pdf,
        }
    }

    pub fn is_file_valid(&self, path: &Path) -> bool {
        let extension_matches = path
            .extension()
            .map(|e| {
                let e = e.to_string_lossy().to_ascii_lowercase();
                self.extensions.iter().any(|wanted| *wanted == e)
            })
            .unwrap_or(false);
        if !extension_matches {
            return false;
        }
        let file_name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        if self.exclude_set.is_match(&file_name) {
            debug!("排除檔案：{}", path.display());
            return false;
        }
        true
    }

    fn collect_pair(&self, pair: &DirPair, jobs: &mut Vec<ConversionJob>) -> io::Result<()> {
        if !pair.input.is_dir() {
            warn!("輸入目錄不存在或不是目錄，跳過：{}", pair.input.display());
            return Ok(());
        }
        let before = jobs.len();
        for entry in WalkDir::new(&pair.input)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            if !entry.file_type().is_file() || !self.is_file_valid(entry.path()) {
                continue;
            }
            let stem = entry.path().file_stem().unwrap_or_default().to_string_lossy().to_string();
            let output_path = pair.output.join(format!("{}.{}", stem, self.format.extension()));
            if entry.path().exists() {
                jobs.push(ConversionJob {
                    input_path: entry.path().to_path_buf(),
                    output_path,
                });
            }
        }
        info!("目錄 {} 找到 {} 個待轉換檔案", pair.input.display(), jobs.len() - before);
        Ok(())
    }
}

impl FileServiceTrait for FileService {
    fn collect_jobs(&self, pairs: &[DirPair]) -> io::Result<Vec<ConversionJob>> {
        let mut jobs = Vec::new();
        for pair in pairs {
            self.collect_pair(pair, &mut jobs)?;
        }
        Ok(jobs)
    }
}
