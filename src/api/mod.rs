// ==========================================
// 房产 CRM 线索导入 - API 层
// ==========================================
// 职责: 提供导入业务接口,供 CLI（或上层界面）调用
// ==========================================

pub mod error;
pub mod import_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult, ErrorBody};
pub use import_api::{
    list_fields, parse_target, ColumnView, FieldView, ImportApi, MappingView, PreviewResponse,
};
