use log::{debug, warn};
use rand::Rng;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::utils::clock::Clock;

/// 批次層級的取消旗標，可在多個 worker 之間共用
#[derive(Clone, Default, Debug)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// 重試策略：失敗後等待 backoff（加上隨機 jitter）再試，
/// 直到自第一次嘗試起經過的時間達到 max_duration 為止
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_duration: Duration,
    backoff: Duration,
    jitter: Duration,
}

#[derive(Debug, PartialEq)]
pub enum RetryOutcome<T> {
    Succeeded { value: T, attempts: u32, elapsed: Duration },
    TimedOut { attempts: u32, elapsed: Duration, last_error: String },
    Cancelled { attempts: u32, elapsed: Duration },
}

impl<T> RetryOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Succeeded { attempts, .. }
            | RetryOutcome::TimedOut { attempts, .. }
            | RetryOutcome::Cancelled { attempts, .. } => *attempts,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            RetryOutcome::Succeeded { elapsed, .. }
            | RetryOutcome::TimedOut { elapsed, .. }
            | RetryOutcome::Cancelled { elapsed, .. } => *elapsed,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_duration: Duration, backoff: Duration) -> Self {
        RetryPolicy {
            max_duration,
            backoff,
            jitter: Duration::ZERO,
        }
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn max_duration(&self) -> Duration {
        self.max_duration
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// jitter 上限（毫秒），超出 u64 時取最大值
    fn jitter_ceiling_ms(&self) -> u64 {
        u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX)
    }

    fn next_delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.backoff;
        }
        let jitter_ms = self.jitter_ceiling_ms();
        self.backoff
            .saturating_add(Duration::from_millis(rand::rng().random_range(0..=jitter_ms)))
    }

    /// 反覆呼叫 `op` 直到成功、逾時或被取消。
    /// `op` 收到的是目前的嘗試次數（從 1 開始）。
    pub fn run<T, E, F>(&self, clock: &dyn Clock, cancel: &CancellationToken, mut op: F) -> RetryOutcome<T>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        let start = clock.now();
        let mut attempts = 0;
        loop {
            if cancel.is_cancelled() {
                return RetryOutcome::Cancelled {
                    attempts,
                    elapsed: clock.now() - start,
                };
            }
            attempts += 1;
            match op(attempts) {
                Ok(value) => {
                    return RetryOutcome::Succeeded {
                        value,
                        attempts,
                        elapsed: clock.now() - start,
                    }
                }
                Err(e) => {
                    let elapsed = clock.now() - start;
                    if elapsed >= self.max_duration {
                        return RetryOutcome::TimedOut {
                            attempts,
                            elapsed,
                            last_error: e.to_string(),
                        };
                    }
                    warn!("第 {} 次嘗試失敗：{}，已耗時 {:?}", attempts, e, elapsed);
                    if cancel.is_cancelled() {
                        return RetryOutcome::Cancelled { attempts, elapsed };
                    }
                    let delay = self.next_delay();
                    debug!("等待 {:?} 後重試", delay);
                    clock.sleep(delay);
                }
            }
        }
    }
}
