// ==========================================
// 房产 CRM 线索导入 - 导入层
// ==========================================
// 流程: 文件解析 → 列映射 → 行转换 → 批量提交
// 支持: CSV, xlsx, xls
// ==========================================

// 模块声明
pub mod batch_committer;
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod http_client;
pub mod lead_importer_trait;
pub mod profile_store;
pub mod report;
pub mod row_transformer;
pub mod session;

// 重导出核心类型
pub use batch_committer::{describe_failure, BatchCommitter};
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use error::{ImportError, ImporterResult};
pub use field_mapper::{guess_mapping, normalize_header, HeuristicFieldMapper, MAPPING_RULES};
pub use file_parser::{CsvParser, ExcelParser, FileFormat, UniversalFileParser};
pub use http_client::HttpLeadImportClient;
pub use profile_store::{
    InMemoryProfileStore, JsonFileProfileStore, MappingProfile, MappingProfileStore,
};
pub use report::{merge_inserted_leads, ImportReport};
pub use row_transformer::RowTransformer;
pub use session::{CommitOutcome, ImportSession, SessionPhase};

// 重导出 Trait 接口
pub use lead_importer_trait::{
    DataCleaner, FieldMapper, FileParser, LeadImportClient, TransportFailure,
};
