// ==========================================
// 房产 CRM 线索导入 - 配置管理器
// ==========================================
// 职责: 配置加载、环境变量覆写、校验、保存
// 存储: <config dir>/lead-importer/config.json
// 优先级: 环境变量 > 配置文件 > 默认值
// ==========================================

use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::file_parser::DEFAULT_MAX_FILE_SIZE_MB;
use crate::importer::http_client::DEFAULT_IMPORT_PATH;
use crate::importer::report::DEFAULT_MAX_INLINE_ERRORS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// 应用目录名（位于系统配置目录下）
pub const APP_DIR_NAME: &str = "lead-importer";
const CONFIG_FILE_NAME: &str = "config.json";
const PROFILES_FILE_NAME: &str = "profiles.json";

// ==========================================
// ImportConfig - 导入配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// 后端地址
    pub api_base_url: String,
    /// 导入接口路径
    pub import_path: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 预览行数
    pub preview_rows: usize,
    /// 结果中内联展示的错误条数
    pub max_inline_errors: usize,
    /// 分块提交大小；None 表示整批一次提交
    pub chunk_size: Option<usize>,
    /// 文件大小提示阈值（MB）,超出仅告警
    pub max_file_size_mb: u64,
    pub default_stage: String,
    pub add_to_dashboard: bool,
    pub owner_id: Option<String>,
    /// 映射模板文件；None 时使用配置目录下的 profiles.json
    pub profile_store_path: Option<PathBuf>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            import_path: DEFAULT_IMPORT_PATH.to_string(),
            request_timeout_secs: 120,
            preview_rows: 5,
            max_inline_errors: DEFAULT_MAX_INLINE_ERRORS,
            chunk_size: None,
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            default_stage: "New".to_string(),
            add_to_dashboard: true,
            owner_id: None,
            profile_store_path: None,
        }
    }
}

impl ImportConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 校验配置取值
    pub fn validate(&self) -> ImporterResult<()> {
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(value_error(
                config_keys::API_BASE_URL,
                &self.api_base_url,
                "must start with http:// or https://",
            ));
        }
        if self.import_path.trim().is_empty() {
            return Err(value_error(
                config_keys::IMPORT_PATH,
                &self.import_path,
                "must not be empty",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(value_error(
                config_keys::REQUEST_TIMEOUT_SECS,
                "0",
                "must be greater than zero",
            ));
        }
        if self.preview_rows == 0 {
            return Err(value_error(
                config_keys::PREVIEW_ROWS,
                "0",
                "must be greater than zero",
            ));
        }
        if self.chunk_size == Some(0) {
            return Err(value_error(
                config_keys::CHUNK_SIZE,
                "0",
                "must be greater than zero when set",
            ));
        }
        if self.default_stage.trim().is_empty() {
            return Err(value_error(
                config_keys::DEFAULT_STAGE,
                &self.default_stage,
                "must not be empty",
            ));
        }
        Ok(())
    }
}

fn value_error(key: &str, value: &str, message: &str) -> ImportError {
    ImportError::ConfigValueError {
        key: key.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    path: PathBuf,
    config: ImportConfig,
}

impl ConfigManager {
    /// 默认配置文件路径
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// 加载配置（文件 + 进程环境变量）
    ///
    /// # 参数
    /// - path: 配置文件路径；None 时使用默认路径
    pub fn load(path: Option<PathBuf>) -> ImporterResult<Self> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// 加载配置,环境变量来源可注入（测试用）
    pub fn load_with_env<F>(path: Option<PathBuf>, env: F) -> ImporterResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = path
            .or_else(Self::default_path)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

        let mut config = read_config_file(&path)?;
        apply_env_overrides(&mut config, env)?;
        config.validate()?;

        info!(path = %path.display(), api = %config.api_base_url, "配置已加载");
        Ok(Self { path, config })
    }

    /// 从内存配置创建（不读文件、不读环境变量）
    pub fn from_config(path: impl Into<PathBuf>, config: ImportConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// 更新配置（先校验,失败时保持原值）
    pub fn update(&mut self, config: ImportConfig) -> ImporterResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// 写回配置文件
    pub fn save(&self) -> ImporterResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&self.config).map_err(|e| {
            ImportError::ConfigReadError {
                path: self.path.display().to_string(),
                message: e.to_string(),
            }
        })?;
        std::fs::write(&self.path, raw)?;
        info!(path = %self.path.display(), "配置已保存");
        Ok(())
    }

    /// 映射模板文件路径
    pub fn profile_store_path(&self) -> PathBuf {
        if let Some(path) = &self.config.profile_store_path {
            return path.clone();
        }
        match self.path.parent() {
            Some(dir) => dir.join(PROFILES_FILE_NAME),
            None => PathBuf::from(PROFILES_FILE_NAME),
        }
    }
}

fn read_config_file(path: &Path) -> ImporterResult<ImportConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "配置文件不存在,使用默认值");
        return Ok(ImportConfig::default());
    }

    let read_error = |message: String| ImportError::ConfigReadError {
        path: path.display().to_string(),
        message,
    };

    let raw = std::fs::read_to_string(path).map_err(|e| read_error(e.to_string()))?;
    if raw.trim().is_empty() {
        return Ok(ImportConfig::default());
    }
    serde_json::from_str(&raw).map_err(|e| read_error(e.to_string()))
}

fn apply_env_overrides<F>(config: &mut ImportConfig, env: F) -> ImporterResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = non_empty(env(config_keys::ENV_API_URL)) {
        debug!(value = %url, "环境变量覆写 api_base_url");
        config.api_base_url = url;
    }

    if let Some(owner) = non_empty(env(config_keys::ENV_OWNER_ID)) {
        config.owner_id = Some(owner);
    }

    if let Some(raw) = non_empty(env(config_keys::ENV_CHUNK_SIZE)) {
        let size: usize = raw.parse().map_err(|_| {
            value_error(config_keys::ENV_CHUNK_SIZE, &raw, "expected a positive integer")
        })?;
        config.chunk_size = (size > 0).then_some(size);
    }

    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 配置文件字段
    pub const API_BASE_URL: &str = "api_base_url";
    pub const IMPORT_PATH: &str = "import_path";
    pub const REQUEST_TIMEOUT_SECS: &str = "request_timeout_secs";
    pub const PREVIEW_ROWS: &str = "preview_rows";
    pub const CHUNK_SIZE: &str = "chunk_size";
    pub const DEFAULT_STAGE: &str = "default_stage";

    // 环境变量
    pub const ENV_API_URL: &str = "LEAD_IMPORT_API_URL";
    pub const ENV_OWNER_ID: &str = "LEAD_IMPORT_OWNER_ID";
    pub const ENV_CHUNK_SIZE: &str = "LEAD_IMPORT_CHUNK_SIZE";
}
