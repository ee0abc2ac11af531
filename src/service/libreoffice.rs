use log::{debug, info};
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;

use crate::error::OfficeError;
use crate::service::process::ProcessTracker;
use crate::service::traits::i_office::{DocumentHandle, ExportFormat, OfficeApp, OfficeLauncher, OpenOptions};

const BINARY_CANDIDATES: [&str; 2] = ["soffice", "libreoffice"];

#[cfg(windows)]
const DEFAULT_INSTALL_PATHS: [&str; 2] = [
    r"C:\Program Files\LibreOffice\program\soffice.exe",
    r"C:\Program Files (x86)\LibreOffice\program\soffice.exe",
];
#[cfg(target_os = "macos")]
const DEFAULT_INSTALL_PATHS: [&str; 1] = ["/Applications/LibreOffice.app/Contents/MacOS/soffice"];
#[cfg(not(any(windows, target_os = "macos")))]
const DEFAULT_INSTALL_PATHS: [&str; 0] = [];

/// 以無介面模式驅動 LibreOffice。
/// 每個實例使用獨立的使用者設定目錄，避免同時執行的實例互相鎖定。
pub struct LibreOfficeLauncher {
    binary: Option<PathBuf>,
    export_timeout: Duration,
    tracker: ProcessTracker,
}

impl LibreOfficeLauncher {
    pub fn new(binary: Option<PathBuf>, export_timeout: Duration, tracker: ProcessTracker) -> Self {
        LibreOfficeLauncher {
            binary,
            export_timeout,
            tracker,
        }
    }

    pub fn resolve_binary(&self) -> Result<PathBuf, OfficeError> {
        if let Some(binary) = &self.binary {
            if binary.is_file() {
                return Ok(binary.clone());
            }
            return which::which(binary).map_err(|_| OfficeError::BinaryNotFound(binary.display().to_string()));
        }
        for candidate in BINARY_CANDIDATES {
            if let Ok(path) = which::which(candidate) {
                return Ok(path);
            }
        }
        DEFAULT_INSTALL_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file())
            .ok_or_else(|| OfficeError::BinaryNotFound(BINARY_CANDIDATES.join(" / ")))
    }
}

impl OfficeLauncher for LibreOfficeLauncher {
    fn launch(&self) -> Result<Box<dyn OfficeApp>, OfficeError> {
        let binary = self.resolve_binary()?;
        let workspace = tempfile::Builder::new().prefix("sheet_to_pdf-").tempdir()?;
        fs::create_dir_all(workspace.path().join("profile"))?;
        fs::create_dir_all(workspace.path().join("out"))?;
        debug!("建立 LibreOffice 實例，設定目錄：{}", workspace.path().display());
        Ok(Box::new(LibreOfficeApp {
            binary,
            workspace: Some(workspace),
            export_timeout: self.export_timeout,
            tracker: self.tracker.clone(),
            display_alerts: true,
            documents: HashMap::new(),
            next_id: 1,
        }))
    }
}

pub struct LibreOfficeApp {
    binary: PathBuf,
    workspace: Option<TempDir>,
    export_timeout: Duration,
    tracker: ProcessTracker,
    display_alerts: bool,
    documents: HashMap<u64, PathBuf>,
    next_id: u64,
}

impl LibreOfficeApp {
    fn workspace(&self) -> Result<&Path, OfficeError> {
        self.workspace.as_ref().map(|w| w.path()).ok_or(OfficeError::AppClosed)
    }

    fn export_command(&self, input: &Path, format: ExportFormat, out_dir: &Path, profile: &Path) -> Command {
        let filter = match format {
            ExportFormat::Pdf => "pdf:calc_pdf_Export",
        };
        let mut command = Command::new(&self.binary);
        command
            .arg("--headless")
            .arg("--norestore")
            .arg("--nolockcheck")
            .arg("--nologo")
            .arg("--nodefault")
            .arg(format!("-env:UserInstallation={}", file_url(profile)))
            .arg("--convert-to")
            .arg(filter)
            .arg("--outdir")
            .arg(out_dir)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::null());
        command
    }
}

impl OfficeApp for LibreOfficeApp {
    fn set_display_alerts(&mut self, enabled: bool) {
        // 無介面模式本身不會彈出對話框，只記錄狀態
        self.display_alerts = enabled;
    }

    fn display_alerts(&self) -> bool {
        self.display_alerts
    }

    fn open(&mut self, path: &Path, options: OpenOptions) -> Result<DocumentHandle, OfficeError> {
        self.workspace()?;
        File::open(path).map_err(|source| OfficeError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        if options.visible {
            debug!("無介面模式不支援顯示視窗，忽略 visible：{}", path.display());
        }
        let id = self.next_id;
        self.next_id += 1;
        self.documents.insert(id, path.to_path_buf());
        Ok(DocumentHandle::new(id, path.to_path_buf()))
    }

    fn export(&mut self, document: &DocumentHandle, format: ExportFormat, destination: &Path) -> Result<(), OfficeError> {
        let input = self
            .documents
            .get(&document.id())
            .cloned()
            .ok_or(OfficeError::DocumentNotOpen(document.id()))?;
        let workspace = self.workspace()?.to_path_buf();
        let out_dir = workspace.join("out");
        let stem = input.file_stem().unwrap_or_default().to_string_lossy().to_string();
        let staged = out_dir.join(format!("{}.{}", stem, format.extension()));
        if staged.exists() {
            fs::remove_file(&staged)?;
        }

        let stderr_path = workspace.join("stderr.log");
        let stderr = File::create(&stderr_path)?;
        let mut command = self.export_command(&input, format, &out_dir, &workspace.join("profile"));
        command.stderr(Stdio::from(stderr));

        let pid = self.tracker.spawn(&mut command)?;
        let status = match self.tracker.wait_timeout(pid, self.export_timeout)? {
            Some(status) => status,
            None => {
                self.tracker.kill(pid)?;
                return Err(OfficeError::ExportTimedOut(self.export_timeout));
            }
        };
        if !status.success() {
            let detail = fs::read_to_string(&stderr_path).unwrap_or_default().trim().to_string();
            return Err(OfficeError::ExportFailed {
                code: status.code(),
                detail,
            });
        }
        if !staged.is_file() {
            return Err(OfficeError::MissingOutput(staged));
        }
        move_file(&staged, destination)?;
        Ok(())
    }

    fn close(&mut self, document: DocumentHandle, save_changes: bool) -> Result<(), OfficeError> {
        if save_changes {
            debug!("文件以唯讀方式開啟，不儲存變更：{}", document.path().display());
        }
        self.documents
            .remove(&document.id())
            .map(|_| ())
            .ok_or(OfficeError::DocumentNotOpen(document.id()))
    }

    fn quit(&mut self) -> Result<(), OfficeError> {
        self.documents.clear();
        if let Some(workspace) = self.workspace.take() {
            let path = workspace.path().to_path_buf();
            workspace.close()?;
            debug!("已清除 LibreOffice 實例目錄：{}", path.display());
        }
        Ok(())
    }
}

/// 跨磁碟時 rename 會失敗，改為複製後刪除
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)?;
    info!("已移動輸出檔案至：{}", to.display());
    Ok(())
}

fn file_url(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    let encoded = normalized.replace('%', "%25").replace(' ', "%20");
    format!("file:///{}", encoded.trim_start_matches('/'))
}
