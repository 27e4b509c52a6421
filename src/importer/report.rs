// ==========================================
// 房产 CRM 线索导入 - 导入结果展示
// ==========================================
// 职责: 汇总行 + 前 N 条行级错误 + "+N more"；合并新增线索到调用方列表
// ==========================================

use crate::domain::ImportResult;
use serde::Serialize;
use serde_json::Value;

/// 默认内联展示的错误条数
pub const DEFAULT_MAX_INLINE_ERRORS: usize = 10;

/// 面向操作员的导入结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub inserted: u64,
    pub skipped: u64,
    pub summary: String,
    pub error_lines: Vec<String>,
    /// 超出内联条数的剩余错误提示,如 "+3 more"
    pub more: Option<String>,
}

impl ImportReport {
    pub fn from_result(result: &ImportResult, max_inline_errors: usize) -> Self {
        let error_lines: Vec<String> = result
            .errors
            .iter()
            .take(max_inline_errors)
            .map(|e| format!("Row {}: {}", e.row, e.reason))
            .collect();

        let hidden = result.errors.len().saturating_sub(max_inline_errors);
        let more = (hidden > 0).then(|| format!("+{} more", hidden));

        Self {
            inserted: result.inserted,
            skipped: result.skipped,
            summary: format!("Imported {} • Skipped {}", result.inserted, result.skipped),
            error_lines,
            more,
        }
    }

    /// 纯文本渲染（CLI 输出）
    pub fn render(&self) -> String {
        let mut lines = vec![self.summary.clone()];
        lines.extend(self.error_lines.iter().cloned());
        if let Some(more) = &self.more {
            lines.push(more.clone());
        }
        lines.join("\n")
    }
}

/// 将新增线索合并到调用方的线索列表
///
/// 已存在相同 id 的线索原位替换；其余按返回顺序插入列表头部。
pub fn merge_inserted_leads(collection: &mut Vec<Value>, inserted: &[Value]) {
    let mut fresh = Vec::new();

    for lead in inserted {
        let position = lead
            .get("id")
            .filter(|id| !id.is_null())
            .and_then(|id| collection.iter().position(|c| c.get("id") == Some(id)));

        match position {
            Some(idx) => collection[idx] = lead.clone(),
            None => fresh.push(lead.clone()),
        }
    }

    collection.splice(0..0, fresh);
}
