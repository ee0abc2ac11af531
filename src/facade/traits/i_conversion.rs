use std::io;

use crate::config::ports::AppConfig;
use crate::models::conversion::BatchOutcome;

// Facade 接口，負責協調整批轉換流程
pub trait ConversionFacadeTrait {
    /// 執行整批轉換：列舉工作、取得生命週期資源、並行轉換、收尾並通知
    /// # 參數
    /// - config: 已驗證的配置
    /// # 回傳
    /// - 成功時返回批次結果；資源取得失敗時在收尾後返回 IO 錯誤
    fn execute_batch(&self, config: &AppConfig) -> io::Result<BatchOutcome>;
}
