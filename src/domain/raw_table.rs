// ==========================================
// 房产 CRM 线索导入 - 原始表格 (RawTable)
// ==========================================
// 职责: 文件解析结果的统一内存表示
// 红线: 生成后只读,转换完成即丢弃
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 原始行记录（列名 → 已 TRIM 的单元格字符串）
pub type RawRecord = HashMap<String, String>;

/// 解析后的原始表格
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<RawRecord>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<RawRecord>) -> Self {
        Self { headers, rows }
    }

    /// 表头（保持文件顺序,允许重复）
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// 数据行（保持文件顺序）
    pub fn rows(&self) -> &[RawRecord] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_header(&self, header: &str) -> bool {
        self.headers.iter().any(|h| h == header)
    }
}
