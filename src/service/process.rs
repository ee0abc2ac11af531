use log::{debug, warn};
use std::collections::HashMap;
use std::io;
use std::process::{Child, Command, ExitStatus};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 記錄本次執行啟動的子程序。
/// 收尾時只終止這裡登記、仍在執行的程序，不依名稱終止系統上其他同名程序。
#[derive(Clone, Default)]
pub struct ProcessTracker {
    children: Arc<Mutex<HashMap<u32, Child>>>,
}

impl ProcessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u32, Child>> {
        self.children.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn spawn(&self, command: &mut Command) -> io::Result<u32> {
        let child = command.spawn()?;
        let pid = child.id();
        debug!("啟動子程序 pid={}", pid);
        self.lock().insert(pid, child);
        Ok(pid)
    }

    /// 等待程序結束，最多等待 `timeout`；逾時返回 `Ok(None)`，程序仍保留在登記中
    pub fn wait_timeout(&self, pid: u32, timeout: Duration) -> io::Result<Option<ExitStatus>> {
        let deadline = Instant::now() + timeout;
        loop {
            {
                let mut children = self.lock();
                let child = children.get_mut(&pid).ok_or_else(|| {
                    io::Error::new(io::ErrorKind::NotFound, format!("未登記的子程序 pid={}", pid))
                })?;
                if let Some(status) = child.try_wait()? {
                    children.remove(&pid);
                    return Ok(Some(status));
                }
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            std::thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }

    pub fn kill(&self, pid: u32) -> io::Result<()> {
        let child = self.lock().remove(&pid);
        match child {
            Some(mut child) => {
                if let Err(e) = child.kill() {
                    // 程序可能剛好已結束
                    if e.kind() != io::ErrorKind::InvalidInput {
                        return Err(e);
                    }
                }
                child.wait()?;
                debug!("已終止子程序 pid={}", pid);
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// 終止所有仍在執行的登記程序，返回實際終止的數量
    pub fn terminate_all(&self) -> usize {
        let children: Vec<(u32, Child)> = self.lock().drain().collect();
        let mut killed = 0;
        for (pid, mut child) in children {
            match child.try_wait() {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(e) => warn!("無法查詢子程序 pid={} 狀態：{}", pid, e),
            }
            match child.kill().and_then(|_| child.wait()) {
                Ok(_) => {
                    warn!("強制終止殘留的子程序 pid={}", pid);
                    killed += 1;
                }
                Err(e) => warn!("終止子程序 pid={} 失敗：{}", pid, e),
            }
        }
        killed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn finished_process_is_unregistered() {
        let tracker = ProcessTracker::new();
        let pid = tracker.spawn(&mut Command::new("true")).unwrap();
        let status = tracker.wait_timeout(pid, Duration::from_secs(5)).unwrap();
        assert!(status.unwrap().success());
        assert!(tracker.is_empty());
    }

    #[test]
    fn timeout_leaves_process_registered_until_killed() {
        let tracker = ProcessTracker::new();
        let pid = tracker.spawn(Command::new("sleep").arg("30")).unwrap();
        let status = tracker.wait_timeout(pid, Duration::from_millis(200)).unwrap();
        assert!(status.is_none());
        assert_eq!(tracker.len(), 1);
        tracker.kill(pid).unwrap();
        assert!(tracker.is_empty());
    }

    #[test]
    fn terminate_all_only_touches_tracked_children() {
        let tracker = ProcessTracker::new();
        tracker.spawn(Command::new("sleep").arg("30")).unwrap();
        tracker.spawn(Command::new("sleep").arg("30")).unwrap();
        assert_eq!(tracker.terminate_all(), 2);
        assert!(tracker.is_empty());
        assert_eq!(tracker.terminate_all(), 0);
    }

    #[test]
    fn unknown_pid_is_an_error() {
        let tracker = ProcessTracker::new();
        let err = tracker.wait_timeout(999_999, Duration::from_millis(10)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
