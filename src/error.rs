use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// 辦公軟體自動化邊界的錯誤
#[derive(Debug, Error)]
pub enum OfficeError {
    #[error("找不到辦公軟體執行檔：{0}")]
    BinaryNotFound(String),
    #[error("無法開啟檔案 {path}：{source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("文件未開啟（handle {0}）")]
    DocumentNotOpen(u64),
    #[error("匯出失敗（結束碼 {code:?}）：{detail}")]
    ExportFailed { code: Option<i32>, detail: String },
    #[error("匯出程序逾時（{0:?}），已強制終止")]
    ExportTimedOut(Duration),
    #[error("匯出完成但找不到輸出檔案：{0}")]
    MissingOutput(PathBuf),
    #[error("應用程式實例已關閉")]
    AppClosed,
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<OfficeError> for io::Error {
    fn from(error: OfficeError) -> Self {
        match error {
            OfficeError::Io(e) => e,
            OfficeError::Open { source, .. } => source,
            OfficeError::BinaryNotFound(name) => {
                io::Error::new(io::ErrorKind::NotFound, format!("找不到辦公軟體執行檔：{}", name))
            }
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_not_found_maps_to_not_found() {
        let err: io::Error = OfficeError::BinaryNotFound("soffice".to_string()).into();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("soffice"));
    }

    #[test]
    fn open_error_keeps_source_kind() {
        let err: io::Error = OfficeError::Open {
            path: PathBuf::from("a.xlsx"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }
}
