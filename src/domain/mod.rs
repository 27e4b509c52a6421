// ==========================================
// 房产 CRM 线索导入 - 领域模型层
// ==========================================
// 职责: 定义导入管道的数据结构与目标字段目录
// 红线: 不含文件读取逻辑,不含网络逻辑
// ==========================================

pub mod lead;
pub mod mapping;
pub mod raw_table;
pub mod types;

// 重导出核心类型
pub use lead::{ImportMeta, ImportPayload, ImportResult, LeadValue, RowError, TransformedLead};
pub use mapping::{DuplicateTarget, FieldMapping, MappingTarget};
pub use raw_table::{RawRecord, RawTable};
pub use types::{FieldKey, FieldKind, FieldSpec, TARGET_SCHEMA};
