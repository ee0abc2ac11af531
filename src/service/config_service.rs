use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::config::validate_config;
use crate::config::ports::{AppConfig, ConfigPort, DirPair};

// 配置服務，負責選擇適當的配置適配器
pub struct ConfigService {
    config_port: Box<dyn ConfigPort>,
}

impl ConfigService {
    pub fn new(config_port: Box<dyn ConfigPort>) -> Self {
        ConfigService { config_port }
    }

    /// 只合併配置來源，不做驗證
    pub fn resolve(&self) -> io::Result<AppConfig> {
        self.config_port.get_config()
    }

    /// 取得配置並驗證
    pub fn get_config(&self) -> io::Result<AppConfig> {
        let config = self.resolve()?;
        validate_config(&config)?;
        Ok(config)
    }
}

// 預設配置適配器
pub struct DefaultConfigAdapter {
    pairs: Vec<DirPair>,
}

impl DefaultConfigAdapter {
    pub fn new(pairs: Vec<DirPair>) -> Self {
        DefaultConfigAdapter { pairs }
    }
}

impl ConfigPort for DefaultConfigAdapter {
    fn get_config(&self) -> io::Result<AppConfig> {
        Ok(AppConfig {
            pairs: self.pairs.clone(),
            ..AppConfig::default()
        })
    }
}

// TOML 設定檔適配器
pub struct FileConfigAdapter {
    path: PathBuf,
}

impl FileConfigAdapter {
    pub fn new(path: PathBuf) -> Self {
        FileConfigAdapter { path }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_config(&self) -> io::Result<AppConfig> {
        load_config_file(&self.path)
    }
}

pub fn load_config_file(path: &Path) -> io::Result<AppConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        io::Error::new(e.kind(), format!("無法讀取設定檔 '{}': {}", path.display(), e))
    })?;
    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        io::Error::new(io::ErrorKind::InvalidData, format!("設定檔格式錯誤 '{}': {}", path.display(), e))
    })?;
    log::info!("已載入設定檔：{}", path.display());
    Ok(config)
}
