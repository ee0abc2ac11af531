use log::{error, info, warn};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use crate::models::conversion::{BatchOutcome, ConversionJob, ConversionResult, JobStatus};
use crate::service::retry::CancellationToken;
use crate::service::traits::i_service::ConverterTrait;
use crate::utils::utils::ProgressManager;

/// 將工作提交到固定大小的執行緒池，同時執行中的工作數不超過 `max_in_flight`
pub struct ConcurrencyController {
    max_in_flight: usize,
    cancel: CancellationToken,
}

impl ConcurrencyController {
    pub fn new(max_in_flight: usize, cancel: CancellationToken) -> Self {
        ConcurrencyController {
            max_in_flight: max_in_flight.max(1),
            cancel,
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    pub fn run(
        &self,
        jobs: Vec<ConversionJob>,
        converter: Arc<dyn ConverterTrait>,
        progress: &ProgressManager,
    ) -> io::Result<BatchOutcome> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_in_flight)
            .thread_name(|i| format!("convert-worker-{}", i))
            .build()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("無法建立執行緒池: {}", e)))?;

        let (tx, rx) = mpsc::channel::<ConversionResult>();
        let mut outcome = BatchOutcome::default();
        let mut in_flight = 0usize;
        let total = jobs.len();

        for (index, job) in jobs.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                outcome.cancelled += total - index;
                warn!("批次已取消，剩餘 {} 個工作不再提交", total - index);
                break;
            }
            if !job.input_path.exists() {
                warn!("輸入檔案已不存在，跳過：{}", job.input_path.display());
                outcome.skipped += 1;
                continue;
            }

            if in_flight >= self.max_in_flight {
                // 先等到至少一個完成，再取走所有已完成的結果
                in_flight -= wait_for_completions(&rx, &mut outcome, progress)?;
            }

            let tx = tx.clone();
            let converter = Arc::clone(&converter);
            in_flight += 1;
            pool.spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| converter.convert(&job)))
                    .unwrap_or_else(|_| {
                        error!("轉換檔案時發生未預期的錯誤：{}", job.input_path.display());
                        ConversionResult::failed(job.clone(), "worker panic")
                    });
                let _ = tx.send(result);
            });
        }
        drop(tx);

        while in_flight > 0 {
            in_flight -= wait_for_completions(&rx, &mut outcome, progress)?;
        }

        progress.finish(outcome.converted, outcome.failed);
        info!(
            "批次完成：成功 {}，失敗 {}，跳過 {}，取消 {}",
            outcome.converted, outcome.failed, outcome.skipped, outcome.cancelled
        );
        Ok(outcome)
    }
}

/// 阻塞直到收到一個結果，再取走目前所有已完成的結果；返回取得的數量
fn wait_for_completions(
    rx: &Receiver<ConversionResult>,
    outcome: &mut BatchOutcome,
    progress: &ProgressManager,
) -> io::Result<usize> {
    let first = rx
        .recv()
        .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "worker 在回報結果前中斷"))?;
    let mut completed = 1;
    record(first, outcome, progress);
    while let Ok(result) = rx.try_recv() {
        record(result, outcome, progress);
        completed += 1;
    }
    Ok(completed)
}

fn record(result: ConversionResult, outcome: &mut BatchOutcome, progress: &ProgressManager) {
    if let JobStatus::Failed(reason) = &result.status {
        error!(
            "檔案轉換失敗：{}（嘗試 {} 次，耗時 {:?}）：{}",
            result.job.input_path.display(),
            result.attempts,
            result.elapsed,
            reason
        );
    }
    outcome.record(&result);
    progress.update(outcome.converted, outcome.failed, &result.job.input_path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    struct CountingConverter {
        current: AtomicUsize,
        peak: AtomicUsize,
        seen: Mutex<Vec<PathBuf>>,
    }

    impl CountingConverter {
        fn new() -> Self {
            CountingConverter {
                current: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl ConverterTrait for CountingConverter {
        fn convert(&self, job: &ConversionJob) -> ConversionResult {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            self.seen.lock().unwrap().push(job.input_path.clone());
            self.current.fetch_sub(1, Ordering::SeqCst);
            let name = job.input_path.file_name().unwrap().to_string_lossy().to_string();
            if name.starts_with("bad") {
                panic!("simulated fault");
            }
            if name.starts_with("ok") {
                ConversionResult::succeeded(job.clone(), job.output_path.clone())
            } else {
                ConversionResult::failed(job.clone(), "export rejected")
            }
        }
    }

    fn jobs_in(dir: &std::path::Path, names: &[&str]) -> Vec<ConversionJob> {
        names
            .iter()
            .map(|name| {
                let input = dir.join(name);
                fs::write(&input, b"x").unwrap();
                ConversionJob {
                    input_path: input,
                    output_path: dir.join("out.pdf"),
                }
            })
            .collect()
    }

    fn hidden() -> ProgressManager {
        ProgressManager::new(0, true)
    }

    #[test]
    fn never_exceeds_configured_in_flight_limit() {
        let dir = tempfile::tempdir().unwrap();
        let names: Vec<String> = (0..12).map(|i| format!("ok{}.xlsx", i)).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let jobs = jobs_in(dir.path(), &names);

        for limit in [1, 3] {
            let converter = Arc::new(CountingConverter::new());
            let controller = ConcurrencyController::new(limit, CancellationToken::new());
            let outcome = controller.run(jobs.clone(), converter.clone(), &hidden()).unwrap();
            assert_eq!(outcome.converted, 12);
            assert!(converter.peak.load(Ordering::SeqCst) <= limit);
            assert_eq!(converter.seen.lock().unwrap().len(), 12);
        }
    }

    #[test]
    fn total_counts_only_successes() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = jobs_in(dir.path(), &["ok1.xlsx", "fail.xlsx", "ok2.xlsx"]);
        let controller = ConcurrencyController::new(2, CancellationToken::new());
        let outcome = controller.run(jobs, Arc::new(CountingConverter::new()), &hidden()).unwrap();
        assert_eq!(outcome.converted, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.failed_inputs, vec![dir.path().join("fail.xlsx")]);
    }

    #[test]
    fn panicking_worker_is_counted_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = jobs_in(dir.path(), &["ok1.xlsx", "bad.xlsx", "ok2.xlsx"]);
        let controller = ConcurrencyController::new(1, CancellationToken::new());
        let outcome = controller.run(jobs, Arc::new(CountingConverter::new()), &hidden()).unwrap();
        assert_eq!(outcome.converted, 2);
        assert_eq!(outcome.failed, 1);
    }

    #[test]
    fn missing_input_is_skipped_without_submission() {
        let dir = tempfile::tempdir().unwrap();
        let mut jobs = jobs_in(dir.path(), &["ok1.xlsx"]);
        jobs.push(ConversionJob {
            input_path: dir.path().join("gone.xlsx"),
            output_path: dir.path().join("gone.pdf"),
        });
        let converter = Arc::new(CountingConverter::new());
        let controller = ConcurrencyController::new(1, CancellationToken::new());
        let outcome = controller.run(jobs, converter.clone(), &hidden()).unwrap();
        assert_eq!(outcome.converted, 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(converter.seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn cancelled_batch_submits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = jobs_in(dir.path(), &["ok1.xlsx", "ok2.xlsx"]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let converter = Arc::new(CountingConverter::new());
        let outcome = ConcurrencyController::new(1, cancel)
            .run(jobs, converter.clone(), &hidden())
            .unwrap();
        assert_eq!(outcome.cancelled, 2);
        assert_eq!(outcome.converted, 0);
        assert!(converter.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn zero_limit_is_raised_to_one() {
        assert_eq!(ConcurrencyController::new(0, CancellationToken::new()).max_in_flight(), 1);
    }
}
