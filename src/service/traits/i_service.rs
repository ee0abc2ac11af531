use std::io;

use crate::config::ports::DirPair;
use crate::models::conversion::{ConversionJob, ConversionResult};

// File 服務接口，負責列舉轉換工作
pub trait FileServiceTrait: Send + Sync {
    /// 掃描每組輸入目錄，為符合副檔名的檔案建立轉換工作
    /// # 參數
    /// - pairs: 輸入/輸出目錄配對
    /// # 回傳
    /// - 成功時返回轉換工作列表，失敗時返回 IO 錯誤
    fn collect_jobs(&self, pairs: &[DirPair]) -> io::Result<Vec<ConversionJob>>;
}

// 轉換接口，負責處理單一工作
pub trait ConverterTrait: Send + Sync {
    /// 轉換單一檔案，所有錯誤都必須收斂為結果而非向外傳遞
    fn convert(&self, job: &ConversionJob) -> ConversionResult;
}

// 通知接口，負責將總結顯示給使用者
pub trait NotifierTrait {
    /// 顯示訊息並阻塞直到使用者關閉
    fn notify(&self, title: &str, message: &str) -> io::Result<()>;
}
