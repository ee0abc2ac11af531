use std::path::{Path, PathBuf};

use crate::error::OfficeError;

// 辦公軟體自動化邊界：開啟、匯出、關閉、結束

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    pub read_only: bool,
    pub visible: bool,
}

impl OpenOptions {
    /// 唯讀且不顯示視窗
    pub fn read_only_hidden() -> Self {
        OpenOptions {
            read_only: true,
            visible: false,
        }
    }
}

/// 已開啟文件的識別
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    id: u64,
    path: PathBuf,
}

impl DocumentHandle {
    pub fn new(id: u64, path: PathBuf) -> Self {
        DocumentHandle { id, path }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// 建立新的應用程式實例；每個 worker 各自取得一個實例
pub trait OfficeLauncher: Send + Sync {
    fn launch(&self) -> Result<Box<dyn OfficeApp>, OfficeError>;
}

/// 單一應用程式實例，不可跨執行緒共用
pub trait OfficeApp: Send {
    fn set_display_alerts(&mut self, enabled: bool);
    fn display_alerts(&self) -> bool;
    fn open(&mut self, path: &Path, options: OpenOptions) -> Result<DocumentHandle, OfficeError>;
    fn export(&mut self, document: &DocumentHandle, format: ExportFormat, destination: &Path) -> Result<(), OfficeError>;
    fn close(&mut self, document: DocumentHandle, save_changes: bool) -> Result<(), OfficeError>;
    fn quit(&mut self) -> Result<(), OfficeError>;
}
