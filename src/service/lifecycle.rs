use log::{info, warn};
use std::path::Path;

use crate::error::OfficeError;
use crate::service::process::ProcessTracker;
use crate::service::traits::i_office::{DocumentHandle, OfficeApp, OfficeLauncher, OpenOptions};

/// 收尾結果，供日誌與測試檢查
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CleanupReport {
    pub reference_closed: bool,
    pub app_quit: bool,
    pub processes_terminated: usize,
}

/// 批次生命週期守衛：批次期間持有主應用程式實例與唯讀的參考文件，
/// 不論批次成功、失敗或 panic，收尾只執行一次
pub struct LifecycleGuard {
    app: Option<Box<dyn OfficeApp>>,
    reference: Option<DocumentHandle>,
    tracker: ProcessTracker,
    report: Option<CleanupReport>,
}

impl LifecycleGuard {
    pub fn acquire(
        launcher: &dyn OfficeLauncher,
        reference_file: Option<&Path>,
        tracker: ProcessTracker,
    ) -> Result<Self, OfficeError> {
        let mut guard = LifecycleGuard {
            app: None,
            reference: None,
            tracker,
            report: None,
        };
        // 取得過程中失敗時，guard 被 drop 會清理已取得的部分
        let app = guard.app.insert(launcher.launch()?);
        if let Some(path) = reference_file {
            let document = app.open(path, OpenOptions::read_only_hidden())?;
            info!("已開啟參考檔案（唯讀）：{}", path.display());
            guard.reference = Some(document);
        }
        Ok(guard)
    }

    pub fn is_finalized(&self) -> bool {
        self.report.is_some()
    }

    /// 關閉參考文件（不儲存）、結束主實例、終止本次啟動且仍在執行的程序
    pub fn finalize(&mut self) -> CleanupReport {
        if let Some(report) = &self.report {
            return report.clone();
        }
        let mut report = CleanupReport::default();
        if let Some(app) = self.app.as_mut() {
            if let Some(document) = self.reference.take() {
                match app.close(document, false) {
                    Ok(()) => report.reference_closed = true,
                    Err(e) => warn!("關閉參考檔案失敗：{}", e),
                }
            }
        }
        if let Some(mut app) = self.app.take() {
            match app.quit() {
                Ok(()) => report.app_quit = true,
                Err(e) => warn!("結束主應用程式實例失敗：{}", e),
            }
        }
        report.processes_terminated = self.tracker.terminate_all();
        info!(
            "收尾完成：參考檔案已關閉={}，主實例已結束={}，強制終止程序 {} 個",
            report.reference_closed, report.app_quit, report.processes_terminated
        );
        self.report = Some(report.clone());
        report
    }
}

impl Drop for LifecycleGuard {
    fn drop(&mut self) {
        self.finalize();
    }
}
