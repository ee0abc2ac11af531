use dialoguer::Confirm;
use std::io;

use crate::models::conversion::BatchOutcome;
use crate::service::traits::i_service::NotifierTrait;

pub const SUMMARY_TITLE: &str = "轉換完成";

/// 只顯示成功總數；個別失敗僅記錄在日誌中
pub fn summary_message(outcome: &BatchOutcome) -> String {
    format!("您好，分析師。本次共成功轉換 {} 個檔案為 PDF。", outcome.converted)
}

/// 系統原生的模態對話框，使用者按下確定後才返回
pub struct DialogNotifier;

impl NotifierTrait for DialogNotifier {
    fn notify(&self, title: &str, message: &str) -> io::Result<()> {
        if !display_available() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "沒有可用的圖形顯示環境"));
        }
        rfd::MessageDialog::new()
            .set_title(title)
            .set_description(message)
            .set_level(rfd::MessageLevel::Info)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
        Ok(())
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn display_available() -> bool {
    ["DISPLAY", "WAYLAND_DISPLAY"]
        .iter()
        .any(|key| std::env::var_os(key).is_some_and(|v| !v.is_empty()))
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn display_available() -> bool {
    true
}

/// 終端機中的阻塞式提示，按 Enter 關閉；沒有終端機時返回錯誤
pub struct TerminalNotifier;

impl NotifierTrait for TerminalNotifier {
    fn notify(&self, title: &str, message: &str) -> io::Result<()> {
        println!("=== {} ===", title);
        println!("{}", message);
        Confirm::new()
            .with_prompt("按 Enter 關閉")
            .default(true)
            .show_default(false)
            .wait_for_newline(true)
            .interact()
            .map(|_| ())
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("終端提示顯示失敗: {}", e)))
    }
}

/// 不互動，只輸出到日誌與標準輸出
pub struct LogNotifier;

impl NotifierTrait for LogNotifier {
    fn notify(&self, title: &str, message: &str) -> io::Result<()> {
        log::info!("{}：{}", title, message);
        println!("{}：{}", title, message);
        Ok(())
    }
}

/// 依序嘗試每個通知方式，直到其中一個成功；全部失敗時返回最後的錯誤
pub fn notify_with_fallback(notifiers: &[&dyn NotifierTrait], title: &str, message: &str) -> io::Result<()> {
    let mut last_error = io::Error::new(io::ErrorKind::NotFound, "沒有可用的通知方式");
    for notifier in notifiers {
        match notifier.notify(title, message) {
            Ok(()) => return Ok(()),
            Err(e) => {
                log::warn!("{}，改用下一個通知方式", e);
                last_error = e;
            }
        }
    }
    Err(last_error)
}
