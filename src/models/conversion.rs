use std::path::PathBuf;
use std::time::Duration;

/// 單一檔案的轉換工作
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Succeeded,
    Failed(String),
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub job: ConversionJob,
    pub status: JobStatus,
    pub attempts: u32,
    pub elapsed: Duration,
    pub output: Option<PathBuf>,
}

impl ConversionResult {
    pub fn succeeded(job: ConversionJob, output: PathBuf) -> Self {
        ConversionResult {
            job,
            status: JobStatus::Succeeded,
            attempts: 0,
            elapsed: Duration::ZERO,
            output: Some(output),
        }
    }

    pub fn failed(job: ConversionJob, reason: impl Into<String>) -> Self {
        ConversionResult {
            job,
            status: JobStatus::Failed(reason.into()),
            attempts: 0,
            elapsed: Duration::ZERO,
            output: None,
        }
    }

    pub fn cancelled(job: ConversionJob) -> Self {
        ConversionResult {
            job,
            status: JobStatus::Cancelled,
            attempts: 0,
            elapsed: Duration::ZERO,
            output: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Succeeded
    }
}

/// 整批轉換的結果，`converted` 即顯示給使用者的成功數量
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub converted: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: usize,
    pub failed_inputs: Vec<PathBuf>,
}

impl BatchOutcome {
    pub fn record(&mut self, result: &ConversionResult) {
        match &result.status {
            JobStatus::Succeeded => self.converted += 1,
            JobStatus::Failed(_) => {
                self.failed += 1;
                self.failed_inputs.push(result.job.input_path.clone());
            }
            JobStatus::Cancelled => self.cancelled += 1,
        }
    }

    pub fn attempted(&self) -> usize {
        self.converted + self.failed + self.cancelled
    }
}
