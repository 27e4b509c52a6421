// ==========================================
// 房产 CRM 线索导入 - 核心库
// ==========================================
// 流程: 文件解析 → 列映射 → 行转换 → 批量提交
// 技术栈: Rust + tokio + reqwest
// 系统定位: 操作员驱动的批量线索导入（最终提交由操作员确认）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 数据结构与目标字段目录
pub mod domain;

// 导入层 - 解析 / 映射 / 转换 / 提交
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    FieldKey, FieldKind, FieldMapping, ImportMeta, ImportResult, LeadValue, MappingTarget,
    RawTable, RowError, TransformedLead, TARGET_SCHEMA,
};

// 导入管道
pub use importer::{
    guess_mapping, BatchCommitter, HttpLeadImportClient, ImportError, ImportReport,
    ImportSession, ImporterResult, LeadImportClient, RowTransformer, SessionPhase,
    UniversalFileParser,
};

// 配置
pub use config::{ConfigManager, ImportConfig};

// API
pub use api::{ApiError, ImportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Lead Importer";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_pipeline_reexports() {
        let mapping = guess_mapping(&["Zip Code".to_string()]);
        assert_eq!(
            mapping.get("Zip Code"),
            Some(MappingTarget::Field(FieldKey::ZipPostalCode))
        );
    }
}
