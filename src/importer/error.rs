// ==========================================
// 房产 CRM 线索导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 错误消息直接展示给操作员,使用英文
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file format: {0} (only .csv, .xlsx and .xls are supported)")]
    UnsupportedFormat(String),

    #[error("Failed to read file: {0}")]
    FileReadError(String),

    #[error("Failed to parse spreadsheet: {0}")]
    ExcelParseError(String),

    #[error("Failed to parse CSV: {0}")]
    CsvParseError(String),

    // ===== 会话状态错误 =====
    #[error("Action not allowed while import is {state}: {action}")]
    InvalidState { state: String, action: String },

    #[error("Column not present in the uploaded file: {0}")]
    UnknownHeader(String),

    #[error("Unknown lead field: {0}")]
    UnknownField(String),

    #[error("An import is already in progress")]
    CommitInProgress,

    #[error("Nothing to import: the file has no data rows")]
    EmptyBatch,

    // ===== 提交错误 =====
    #[error("{message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    // ===== 映射模板错误 =====
    #[error("Mapping profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Mapping profile store error: {0}")]
    ProfileStoreError(String),

    // ===== 配置错误 =====
    #[error("Failed to read config ({path}): {message}")]
    ConfigReadError { path: String, message: String },

    #[error("Invalid config value (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 提交失败后可原样重试（会话保持打开）
    pub fn is_retryable(&self) -> bool {
        matches!(self, ImportError::Transport { .. })
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::ProfileStoreError(err.to_string())
    }
}

/// Result 类型别名
pub type ImporterResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_message_is_verbatim() {
        let err = ImportError::Transport {
            status: Some(422),
            message: "leads.0.email: value is not a valid email".to_string(),
        };
        assert_eq!(err.to_string(), "leads.0.email: value is not a valid email");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_unsupported_format_message() {
        let err = ImportError::UnsupportedFormat("pdf".to_string());
        assert!(err.to_string().contains("pdf"));
        assert!(!err.is_retryable());
    }
}
