// ==========================================
// 房产 CRM 线索导入 - 导入管道 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 流程: 解析 → 列映射 → 清洗/转换 → 批量提交
// ==========================================

use crate::domain::{FieldMapping, ImportPayload, ImportResult, RawTable};
use crate::importer::error::ImporterResult;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 1）
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析内存中的文件内容为 RawTable
    ///
    /// # 参数
    /// - file_name: 原始文件名（用于错误信息与格式判断）
    /// - bytes: 文件内容
    ///
    /// # 返回
    /// - Ok(RawTable): 表头 + 行记录
    /// - Err: 格式错误
    fn parse_bytes(&self, file_name: &str, bytes: &[u8]) -> ImporterResult<RawTable>;

    /// 解析磁盘文件
    fn parse_file(&self, file_path: &Path) -> ImporterResult<RawTable> {
        if !file_path.exists() {
            return Err(crate::importer::error::ImportError::FileNotFound(
                file_path.display().to_string(),
            ));
        }
        let bytes = std::fs::read(file_path)?;
        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        self.parse_bytes(file_name, &bytes)
    }
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 列映射猜测接口（阶段 2）
// 实现者: HeuristicFieldMapper
pub trait FieldMapper: Send + Sync {
    /// 根据表头猜测映射（纯函数,永不失败）
    fn guess_mapping(&self, headers: &[String]) -> FieldMapping;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 单元格类型转换接口（阶段 3）
// 实现者: DataCleaner
pub trait DataCleaner: Send + Sync {
    /// 清洗文本（TRIM；空串 → None）
    fn clean_text(&self, value: &str) -> Option<String>;

    /// 解析整数（去除所有非数字字符；无法解析 → None）
    fn parse_integer(&self, value: &str) -> Option<i64>;

    /// 拆分逗号列表（TRIM,丢弃空项；可能为空列表）
    fn split_list(&self, value: &str) -> Vec<String>;
}

// ==========================================
// 导入接口失败
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// 非 2xx 响应（body 为原始响应体）
    Http { status: u16, body: String },
    /// 网络异常 / 响应无法解析
    Network(String),
}

// ==========================================
// LeadImportClient Trait
// ==========================================
// 用途: 外部导入接口（协作方契约）
// 实现者: HttpLeadImportClient（reqwest）
#[async_trait]
pub trait LeadImportClient: Send + Sync {
    /// 提交一批线索
    ///
    /// # 返回
    /// - Ok(ImportResult): {inserted, skipped, errors, inserted_leads}
    /// - Err(TransportFailure): 网络失败或结构化错误响应
    async fn import_leads(
        &self,
        payload: &ImportPayload<'_>,
    ) -> Result<ImportResult, TransportFailure>;
}
