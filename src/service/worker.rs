use log::{debug, error, info, warn};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::OfficeError;
use crate::models::conversion::{ConversionJob, ConversionResult};
use crate::service::retry::{CancellationToken, RetryOutcome, RetryPolicy};
use crate::service::traits::i_office::{DocumentHandle, ExportFormat, OfficeApp, OfficeLauncher, OpenOptions};
use crate::service::traits::i_service::ConverterTrait;
use crate::utils::clock::Clock;
use crate::utils::utils::timestamped_output_path;

/// 單一 worker 持有的應用程式實例。
/// 離開作用域時（包含 panic 展開）關閉文件且不儲存、還原警告設定並結束實例。
struct AppSession {
    app: Box<dyn OfficeApp>,
    document: Option<DocumentHandle>,
    previous_alerts: bool,
}

impl AppSession {
    fn acquire(launcher: &dyn OfficeLauncher) -> Result<Self, OfficeError> {
        let mut app = launcher.launch()?;
        let previous_alerts = app.display_alerts();
        app.set_display_alerts(false);
        Ok(AppSession {
            app,
            document: None,
            previous_alerts,
        })
    }

    fn open(&mut self, job: &ConversionJob) -> Result<DocumentHandle, OfficeError> {
        let document = self.app.open(&job.input_path, OpenOptions::read_only_hidden())?;
        self.document = Some(document.clone());
        Ok(document)
    }
}

impl Drop for AppSession {
    fn drop(&mut self) {
        if let Some(document) = self.document.take() {
            if let Err(e) = self.app.close(document, false) {
                warn!("關閉文件失敗：{}", e);
            }
        }
        self.app.set_display_alerts(self.previous_alerts);
        if let Err(e) = self.app.quit() {
            warn!("結束應用程式實例失敗：{}", e);
        }
    }
}

/// 轉換 worker：每個工作取得自己的應用程式實例，匯出失敗時依重試策略重試
pub struct ConversionWorker {
    launcher: Arc<dyn OfficeLauncher>,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
    format: ExportFormat,
}

impl ConversionWorker {
    pub fn new(
        launcher: Arc<dyn OfficeLauncher>,
        policy: RetryPolicy,
        clock: Arc<dyn Clock>,
        cancel: CancellationToken,
    ) -> Self {
        ConversionWorker {
            launcher,
            policy,
            clock,
            cancel,
            format: ExportFormat::Pdf,
        }
    }

    fn destination(&self, job: &ConversionJob) -> std::io::Result<PathBuf> {
        let destination = timestamped_output_path(&job.input_path, &job.output_path, self.clock.today());
        if let Some(dir) = destination.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        Ok(destination)
    }

    fn run(&self, job: &ConversionJob) -> Result<ConversionResult, OfficeError> {
        let destination = self.destination(job)?;
        let mut session = AppSession::acquire(self.launcher.as_ref())?;
        let document = session.open(job)?;

        let outcome = self.policy.run(self.clock.as_ref(), &self.cancel, |attempt| {
            debug!("第 {} 次匯出：{} -> {}", attempt, job.input_path.display(), destination.display());
            session.app.export(&document, self.format, &destination)
        });
        drop(session);

        let result = match &outcome {
            RetryOutcome::Succeeded { .. } => {
                info!("檔案轉換成功：{}", destination.display());
                ConversionResult::succeeded(job.clone(), destination)
            }
            RetryOutcome::TimedOut { last_error, elapsed, .. } => {
                error!(
                    "超過時間限制（{:?}），略過檔案：{}，最後錯誤：{}",
                    elapsed,
                    job.input_path.display(),
                    last_error
                );
                ConversionResult::failed(job.clone(), last_error.clone())
            }
            RetryOutcome::Cancelled { .. } => {
                warn!("轉換已取消：{}", job.input_path.display());
                ConversionResult::cancelled(job.clone())
            }
        };
        Ok(ConversionResult {
            attempts: outcome.attempts(),
            elapsed: outcome.elapsed(),
            ..result
        })
    }
}

impl ConverterTrait for ConversionWorker {
    fn convert(&self, job: &ConversionJob) -> ConversionResult {
        if self.cancel.is_cancelled() {
            return ConversionResult::cancelled(job.clone());
        }
        let start = self.clock.now();
        match self.run(job) {
            Ok(result) => result,
            Err(e) => {
                error!("無法處理檔案 {}：{}", job.input_path.display(), e);
                let mut result = ConversionResult::failed(job.clone(), e.to_string());
                result.elapsed = self.clock.now().saturating_duration_since(start);
                result
            }
        }
    }
}
