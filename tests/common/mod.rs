#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use sheet_to_pdf::config::ports::{AppConfig, DirPair};
use sheet_to_pdf::error::OfficeError;
use sheet_to_pdf::facade::conversion_facade::ConversionFacade;
use sheet_to_pdf::service::file::FileService;
use sheet_to_pdf::service::process::ProcessTracker;
use sheet_to_pdf::service::retry::CancellationToken;
use sheet_to_pdf::service::traits::i_office::{DocumentHandle, ExportFormat, OfficeApp, OfficeLauncher, OpenOptions};
use sheet_to_pdf::service::traits::i_service::NotifierTrait;
use sheet_to_pdf::utils::clock::{Clock, ManualClock};

/// 依檔名決定的模擬行為
#[derive(Clone, Debug)]
pub enum Behaviour {
    Succeed,
    FailAlways,
    FailTimes(u32),
    OpenFails,
    Panic,
}

#[derive(Default)]
pub struct Stats {
    pub launches: AtomicUsize,
    pub live_workers: AtomicUsize,
    pub peak_workers: AtomicUsize,
    pub quits: Mutex<Vec<usize>>,
    pub closed: Mutex<Vec<PathBuf>>,
    pub attempts: Mutex<HashMap<String, u32>>,
    pub alerts_at_quit: Mutex<Vec<bool>>,
}

impl Stats {
    pub fn quits_of(&self, instance: usize) -> usize {
        self.quits.lock().unwrap().iter().filter(|id| **id == instance).count()
    }

    pub fn closes_of(&self, path: &Path) -> usize {
        self.closed.lock().unwrap().iter().filter(|p| p.as_path() == path).count()
    }

    pub fn attempts_of(&self, file_name: &str) -> u32 {
        self.attempts.lock().unwrap().get(file_name).copied().unwrap_or(0)
    }
}

pub struct MockLauncher {
    pub script: HashMap<String, Behaviour>,
    pub stats: Arc<Stats>,
    pub fail_launch: bool,
    pub export_delay: Duration,
}

impl MockLauncher {
    pub fn new(script: &[(&str, Behaviour)]) -> Self {
        MockLauncher {
            script: script.iter().map(|(name, b)| (name.to_string(), b.clone())).collect(),
            stats: Arc::new(Stats::default()),
            fail_launch: false,
            export_delay: Duration::ZERO,
        }
    }
}

impl OfficeLauncher for MockLauncher {
    fn launch(&self) -> Result<Box<dyn OfficeApp>, OfficeError> {
        if self.fail_launch {
            return Err(OfficeError::BinaryNotFound("mock".to_string()));
        }
        let instance = self.stats.launches.fetch_add(1, Ordering::SeqCst);
        // 第一個實例是生命週期守衛持有的主實例
        if instance > 0 {
            let live = self.stats.live_workers.fetch_add(1, Ordering::SeqCst) + 1;
            self.stats.peak_workers.fetch_max(live, Ordering::SeqCst);
        }
        Ok(Box::new(MockApp {
            instance,
            script: self.script.clone(),
            stats: Arc::clone(&self.stats),
            alerts: true,
            documents: HashMap::new(),
            next_id: 1,
            export_delay: self.export_delay,
            quit: false,
        }))
    }
}

pub struct MockApp {
    instance: usize,
    script: HashMap<String, Behaviour>,
    stats: Arc<Stats>,
    alerts: bool,
    documents: HashMap<u64, PathBuf>,
    next_id: u64,
    export_delay: Duration,
    quit: bool,
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().to_string()
}

impl MockApp {
    fn behaviour(&self, path: &Path) -> Behaviour {
        self.script.get(&file_name(path)).cloned().unwrap_or(Behaviour::Succeed)
    }
}

impl OfficeApp for MockApp {
    fn set_display_alerts(&mut self, enabled: bool) {
        self.alerts = enabled;
    }

    fn display_alerts(&self) -> bool {
        self.alerts
    }

    fn open(&mut self, path: &Path, options: OpenOptions) -> Result<DocumentHandle, OfficeError> {
        assert!(options.read_only);
        assert!(!options.visible);
        if let Behaviour::OpenFails = self.behaviour(path) {
            return Err(OfficeError::Open {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "locked"),
            });
        }
        let id = self.next_id;
        self.next_id += 1;
        self.documents.insert(id, path.to_path_buf());
        Ok(DocumentHandle::new(id, path.to_path_buf()))
    }

    fn export(&mut self, document: &DocumentHandle, format: ExportFormat, destination: &Path) -> Result<(), OfficeError> {
        assert_eq!(format, ExportFormat::Pdf);
        assert!(!self.alerts, "alerts must be suppressed while exporting");
        let input = self
            .documents
            .get(&document.id())
            .cloned()
            .ok_or(OfficeError::DocumentNotOpen(document.id()))?;
        let attempt = {
            let mut attempts = self.stats.attempts.lock().unwrap();
            let entry = attempts.entry(file_name(&input)).or_insert(0);
            *entry += 1;
            *entry
        };
        if !self.export_delay.is_zero() {
            std::thread::sleep(self.export_delay);
        }
        match self.behaviour(&input) {
            Behaviour::Succeed => {}
            Behaviour::FailAlways => {
                return Err(OfficeError::ExportFailed {
                    code: Some(1),
                    detail: "export rejected".to_string(),
                })
            }
            Behaviour::FailTimes(n) if attempt <= n => {
                return Err(OfficeError::ExportFailed {
                    code: Some(1),
                    detail: format!("transient failure {}", attempt),
                })
            }
            Behaviour::FailTimes(_) => {}
            Behaviour::Panic => panic!("automation crashed"),
            Behaviour::OpenFails => unreachable!(),
        }
        fs::write(destination, b"%PDF-1.7")?;
        Ok(())
    }

    fn close(&mut self, document: DocumentHandle, save_changes: bool) -> Result<(), OfficeError> {
        assert!(!save_changes);
        self.documents
            .remove(&document.id())
            .ok_or(OfficeError::DocumentNotOpen(document.id()))?;
        self.stats.closed.lock().unwrap().push(document.path().to_path_buf());
        Ok(())
    }

    fn quit(&mut self) -> Result<(), OfficeError> {
        if self.quit {
            return Ok(());
        }
        self.quit = true;
        if self.instance > 0 {
            self.stats.live_workers.fetch_sub(1, Ordering::SeqCst);
        }
        self.stats.quits.lock().unwrap().push(self.instance);
        self.stats.alerts_at_quit.lock().unwrap().push(self.alerts);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub messages: Arc<Mutex<Vec<(String, String)>>>,
}

impl NotifierTrait for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) -> io::Result<()> {
        self.messages.lock().unwrap().push((title.to_string(), message.to_string()));
        Ok(())
    }
}

pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
}

pub struct Fixture {
    pub input: tempfile::TempDir,
    pub output: tempfile::TempDir,
    pub clock: Arc<ManualClock>,
    pub notifier: RecordingNotifier,
    pub cancel: CancellationToken,
}

impl Fixture {
    pub fn new(files: &[&str]) -> Self {
        let input = tempfile::tempdir().unwrap();
        for name in files {
            fs::write(input.path().join(name), b"PK\x03\x04").unwrap();
        }
        Fixture {
            input,
            output: tempfile::tempdir().unwrap(),
            clock: Arc::new(ManualClock::new(test_date())),
            notifier: RecordingNotifier::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> AppConfig {
        AppConfig {
            pairs: vec![DirPair {
                input: self.input.path().to_path_buf(),
                output: self.output.path().to_path_buf(),
            }],
            no_dialog: true,
            no_progress: true,
            ..AppConfig::default()
        }
    }

    pub fn facade(&self, launcher: Arc<MockLauncher>) -> ConversionFacade {
        let config = self.config();
        let clock: Arc<dyn Clock> = self.clock.clone();
        ConversionFacade::new(
            Box::new(FileService::new(&config.extensions, &config.exclude)),
            launcher,
            ProcessTracker::new(),
            Box::new(self.notifier.clone()),
            clock,
            self.cancel.clone(),
        )
    }

    pub fn output_file(&self, stem: &str) -> PathBuf {
        self.output.path().join(format!("{}_05-03-2024.pdf", stem))
    }
}
