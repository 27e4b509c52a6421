// ==========================================
// 房产 CRM 线索导入 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换导入层错误为操作员可读的错误消息
// ==========================================

use crate::importer::ImportError;
use serde::Serialize;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入与状态错误
    // ==========================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("An import is already in progress")]
    Busy,

    // ==========================================
    // 文件错误
    // ==========================================
    #[error("{0}")]
    FileError(String),

    // ==========================================
    // 提交错误（可原样重试）
    // ==========================================
    #[error("{message}")]
    ImportFailed { status: Option<u16>, message: String },

    // ==========================================
    // 配置与内部错误
    // ==========================================
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// API结果类型
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// 错误分类码（供序列化输出）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::NotFound(_) => "not_found",
            ApiError::InvalidState(_) => "invalid_state",
            ApiError::Busy => "busy",
            ApiError::FileError(_) => "file_error",
            ApiError::ImportFailed { .. } => "import_failed",
            ApiError::ConfigError(_) => "config_error",
            ApiError::Internal(_) => "internal",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::ImportFailed { .. })
    }
}

/// 序列化形式的错误（JSON 输出）
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl From<&ApiError> for ErrorBody {
    fn from(err: &ApiError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FileNotFound(_)
            | ImportError::UnsupportedFormat(_)
            | ImportError::FileReadError(_)
            | ImportError::ExcelParseError(_)
            | ImportError::CsvParseError(_) => ApiError::FileError(err.to_string()),

            ImportError::InvalidState { .. } => ApiError::InvalidState(err.to_string()),
            ImportError::CommitInProgress => ApiError::Busy,

            ImportError::UnknownHeader(_)
            | ImportError::UnknownField(_)
            | ImportError::EmptyBatch => ApiError::InvalidInput(err.to_string()),

            ImportError::Transport { status, message } => {
                ApiError::ImportFailed { status, message }
            }

            ImportError::ProfileNotFound(name) => {
                ApiError::NotFound(format!("mapping profile '{}'", name))
            }

            ImportError::ConfigReadError { .. } | ImportError::ConfigValueError { .. } => {
                ApiError::ConfigError(err.to_string())
            }

            ImportError::ProfileStoreError(_) | ImportError::Other(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_keeps_message_verbatim() {
        let err: ApiError = ImportError::Transport {
            status: Some(422),
            message: "leads.0.email: invalid".to_string(),
        }
        .into();

        assert_eq!(err.to_string(), "leads.0.email: invalid");
        assert!(err.is_retryable());
        assert_eq!(err.code(), "import_failed");
    }

    #[test]
    fn test_error_mapping() {
        let err: ApiError = ImportError::UnsupportedFormat(".pdf".to_string()).into();
        assert!(matches!(err, ApiError::FileError(_)));
        assert!(!err.is_retryable());

        let err: ApiError = ImportError::CommitInProgress.into();
        assert!(matches!(err, ApiError::Busy));

        let err: ApiError = ImportError::ProfileNotFound("zillow".to_string()).into();
        assert_eq!(err.to_string(), "Not found: mapping profile 'zillow'");

        let body = ErrorBody::from(&ApiError::InvalidInput("owner id is required".to_string()));
        assert_eq!(body.code, "invalid_input");
        assert_eq!(body.message, "Invalid input: owner id is required");
    }
}
