use log::{error, info, warn};
use std::io;
use std::sync::Arc;

use crate::config::ports::AppConfig;
use crate::facade::traits::i_conversion::ConversionFacadeTrait;
use crate::models::conversion::BatchOutcome;
use crate::service::controller::ConcurrencyController;
use crate::service::file::FileService;
use crate::service::libreoffice::LibreOfficeLauncher;
use crate::service::lifecycle::LifecycleGuard;
use crate::service::notifier::{notify_with_fallback, summary_message, DialogNotifier, LogNotifier, TerminalNotifier, SUMMARY_TITLE};
use crate::service::process::ProcessTracker;
use crate::service::retry::CancellationToken;
use crate::service::traits::i_office::OfficeLauncher;
use crate::service::traits::i_service::{FileServiceTrait, NotifierTrait};
use crate::service::worker::ConversionWorker;
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::utils::create_progress_bar;

pub struct ConversionFacade {
    file_service: Box<dyn FileServiceTrait>,
    launcher: Arc<dyn OfficeLauncher>,
    tracker: ProcessTracker,
    notifier: Box<dyn NotifierTrait>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl ConversionFacade {
    pub fn new(
        file_service: Box<dyn FileServiceTrait>,
        launcher: Arc<dyn OfficeLauncher>,
        tracker: ProcessTracker,
        notifier: Box<dyn NotifierTrait>,
        clock: Arc<dyn Clock>,
        cancel: CancellationToken,
    ) -> Self {
        ConversionFacade {
            file_service,
            launcher,
            tracker,
            notifier,
            clock,
            cancel,
        }
    }

    /// 依配置組裝 LibreOffice 後端與對應的通知方式
    pub fn from_config(config: &AppConfig) -> Self {
        let tracker = ProcessTracker::new();
        let launcher = LibreOfficeLauncher::new(config.office_binary.clone(), config.export_timeout(), tracker.clone());
        let notifier: Box<dyn NotifierTrait> = if config.no_dialog {
            Box::new(LogNotifier)
        } else {
            Box::new(DialogNotifier)
        };
        ConversionFacade::new(
            Box::new(FileService::new(&config.extensions, &config.exclude)),
            Arc::new(launcher),
            tracker,
            notifier,
            Arc::new(SystemClock),
            CancellationToken::new(),
        )
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn report(&self, outcome: &BatchOutcome) {
        for input in &outcome.failed_inputs {
            warn!("未轉換：{}", input.display());
        }
        let message = summary_message(outcome);
        let chain: [&dyn NotifierTrait; 3] = [self.notifier.as_ref(), &TerminalNotifier, &LogNotifier];
        if let Err(e) = notify_with_fallback(&chain, SUMMARY_TITLE, &message) {
            error!("無法顯示轉換結果通知：{}", e);
        }
    }
}

impl ConversionFacadeTrait for ConversionFacade {
    fn execute_batch(&self, config: &AppConfig) -> io::Result<BatchOutcome> {
        let jobs = self.file_service.collect_jobs(&config.pairs)?;
        info!("共找到 {} 個待轉換檔案", jobs.len());

        let mut guard = LifecycleGuard::acquire(
            self.launcher.as_ref(),
            config.reference_file.as_deref(),
            self.tracker.clone(),
        )
        .map_err(|e| {
            error!("無法取得辦公軟體資源，批次中止：{}", e);
            io::Error::from(e)
        })?;

        let worker = ConversionWorker::new(
            Arc::clone(&self.launcher),
            config.retry_policy(),
            Arc::clone(&self.clock),
            self.cancel.clone(),
        );
        let controller = ConcurrencyController::new(config.max_concurrent, self.cancel.clone());
        let progress = create_progress_bar(jobs.len() as u64, config.no_progress);
        let result = controller.run(jobs, Arc::new(worker), &progress);

        guard.finalize();
        let outcome = result?;
        self.report(&outcome);
        Ok(outcome)
    }
}
