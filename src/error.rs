// src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // --- 请求层错误 (传输失败、响应无法解析) ---
    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("network middleware error: {0}")]
    NetworkMiddleware(#[from] reqwest_middleware::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to persist temporary file: {0}")]
    TempFilePersist(#[from] tempfile::PersistError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not parse the API response from '{url}': {source}")]
    ApiParseFailed {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    // --- 应用层错误 (服务器已响应，但报告失败) ---
    #[error("{0}")]
    Application(String),

    #[error("no completed download to retrieve")]
    NoCompletedDownload,
    #[error("download still unfinished after {0} status checks")]
    PollLimitReached(u32),
    /// 错误已经通过前端提示过用户
    #[error("{0}")]
    ActionFailed(&'static str),
    #[error("security error: {0}")]
    Security(String),
    #[error("interrupted by user")]
    UserInterrupt,
    #[error("{0}")] // 只打印内部信息，不加任何前缀
    UserInputError(String),
    #[error("unexpected error: {0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// 传输层失败：轮询期间只记录日志，不终止任务
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            AppError::Network(_)
                | AppError::NetworkMiddleware(_)
                | AppError::ApiParseFailed { .. }
                | AppError::Json(_)
                | AppError::Io(_)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_families() {
        let parse = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        assert!(AppError::ApiParseFailed { url: "u".into(), source: parse }.is_request_error());
        assert!(!AppError::Application("failed".into()).is_request_error());
        assert_eq!(AppError::Application("URL is required".into()).to_string(), "URL is required");
    }
}
