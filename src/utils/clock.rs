use chrono::{Local, NaiveDate};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// 時間來源，讓重試與檔名日期可以在測試中以手動時鐘取代
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
    fn today(&self) -> NaiveDate;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// 手動時鐘：sleep 只推進內部時間，不會真的等待
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
    date: NaiveDate,
}

impl ManualClock {
    pub fn new(date: NaiveDate) -> Self {
        ManualClock {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            date,
        }
    }

    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn advance(&self, duration: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(|e| e.into_inner());
        *elapsed += duration;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }

    fn today(&self) -> NaiveDate {
        self.date
    }
}
