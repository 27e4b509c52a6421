// ==========================================
// 房产 CRM 线索导入 - 批量提交器
// ==========================================
// 阶段 4: 整批线索一次请求提交到导入接口
// 红线: 不拆分、不去重；失败消息按固定优先级拼装
// 扩展: chunk_size 配置后按块顺序提交并汇总（默认关闭）
// ==========================================

use crate::domain::{ImportMeta, ImportPayload, ImportResult, TransformedLead};
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::lead_importer_trait::{LeadImportClient, TransportFailure};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

pub struct BatchCommitter<C: LeadImportClient> {
    client: C,
    chunk_size: Option<usize>,
}

impl<C: LeadImportClient> BatchCommitter<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            chunk_size: None,
        }
    }

    /// 启用分块提交（0 或 None 表示整批一次提交）
    pub fn with_chunk_size(mut self, chunk_size: Option<usize>) -> Self {
        self.chunk_size = chunk_size.filter(|size| *size > 0);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// 提交转换后的线索
    ///
    /// # 返回
    /// - Ok(ImportResult): 后端结构化结果
    /// - Err(ImportError::Transport): 已按优先级拼装的操作员可读消息
    /// - Err(ImportError::EmptyBatch): 无数据行,未发送请求
    #[instrument(skip(self, rows, meta), fields(rows = rows.len(), chunked = self.chunk_size.is_some()))]
    pub async fn commit(
        &self,
        rows: &[TransformedLead],
        meta: &ImportMeta,
    ) -> ImporterResult<ImportResult> {
        if rows.is_empty() {
            return Err(ImportError::EmptyBatch);
        }

        let start_time = Instant::now();
        let result = match self.chunk_size {
            Some(size) if size < rows.len() => self.commit_chunked(rows, meta, size).await?,
            _ => self.send(rows, meta).await?,
        };

        info!(
            inserted = result.inserted,
            skipped = result.skipped,
            errors = result.errors.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "线索批量导入完成"
        );
        Ok(result)
    }

    async fn send(&self, rows: &[TransformedLead], meta: &ImportMeta) -> ImporterResult<ImportResult> {
        let payload = ImportPayload::new(meta, rows);
        self.client.import_leads(&payload).await.map_err(|failure| {
            let message = describe_failure(&failure);
            error!(error = %message, "导入请求失败");
            ImportError::Transport {
                status: failure_status(&failure),
                message,
            }
        })
    }

    /// 分块顺序提交；行号偏移到整批坐标,首个失败块终止
    async fn commit_chunked(
        &self,
        rows: &[TransformedLead],
        meta: &ImportMeta,
        size: usize,
    ) -> ImporterResult<ImportResult> {
        let mut total = ImportResult::default();

        for (chunk_idx, chunk) in rows.chunks(size).enumerate() {
            let offset = chunk_idx * size;
            debug!(chunk = chunk_idx, offset, len = chunk.len(), "提交分块");

            let mut part = match self.send(chunk, meta).await {
                Ok(part) => part,
                Err(ImportError::Transport { status, message }) => {
                    return Err(ImportError::Transport {
                        status,
                        message: format!(
                            "Rows {}-{}: {}",
                            offset + 1,
                            offset + chunk.len(),
                            message
                        ),
                    });
                }
                Err(other) => return Err(other),
            };

            total.inserted += part.inserted;
            total.skipped += part.skipped;
            for err in &mut part.errors {
                err.row += offset as i64;
            }
            total.errors.append(&mut part.errors);
            total.inserted_leads.append(&mut part.inserted_leads);
        }

        Ok(total)
    }
}

fn failure_status(failure: &TransportFailure) -> Option<u16> {
    match failure {
        TransportFailure::Http { status, .. } => Some(*status),
        TransportFailure::Network(_) => None,
    }
}

// ==========================================
// 失败消息拼装
// ==========================================
// 优先级: 校验错误列表(detail 数组) → detail 字符串 → errors 数组
//        → 原始响应体 → 网络异常消息
pub fn describe_failure(failure: &TransportFailure) -> String {
    match failure {
        TransportFailure::Network(message) => {
            let message = message.trim();
            if message.is_empty() {
                "Import failed: network error".to_string()
            } else {
                message.to_string()
            }
        }
        TransportFailure::Http { status, body } => describe_error_body(body)
            .unwrap_or_else(|| format!("Import failed (HTTP {})", status)),
    }
}

fn describe_error_body(body: &str) -> Option<String> {
    let raw = body.trim();
    let parsed: Option<Value> = serde_json::from_str(raw).ok();

    if let Some(value) = &parsed {
        if let Some(items) = value.get("detail").and_then(Value::as_array) {
            let messages = join_non_empty(items.iter().map(format_validation_item));
            if !messages.is_empty() {
                return Some(messages);
            }
        }

        if let Some(detail) = value.get("detail").and_then(Value::as_str) {
            if !detail.trim().is_empty() {
                return Some(detail.trim().to_string());
            }
        }

        if let Some(items) = value.get("errors").and_then(Value::as_array) {
            let messages = join_non_empty(items.iter().map(format_generic_item));
            if !messages.is_empty() {
                return Some(messages);
            }
        }
    }

    if raw.is_empty() {
        return None;
    }

    Some(match parsed {
        Some(value) => value.to_string(),
        None => raw.to_string(),
    })
}

fn join_non_empty<I: Iterator<Item = String>>(items: I) -> String {
    items
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

/// 校验错误项: {"loc": ["body", "leads", 0, "email"], "msg": "..."}
fn format_validation_item(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        Value::Object(obj) => {
            let msg = obj
                .get("msg")
                .or_else(|| obj.get("message"))
                .and_then(Value::as_str)
                .unwrap_or_default();

            let loc = obj
                .get("loc")
                .and_then(Value::as_array)
                .map(|parts| {
                    parts
                        .iter()
                        .filter(|p| p.as_str() != Some("body"))
                        .map(|p| match p {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(".")
                })
                .unwrap_or_default();

            match (loc.is_empty(), msg.is_empty()) {
                (_, true) => item.to_string(),
                (true, false) => msg.to_string(),
                (false, false) => format!("{}: {}", loc, msg),
            }
        }
        other => other.to_string(),
    }
}

/// 通用错误项: 字符串 / {row, reason} / {message}
fn format_generic_item(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        Value::Object(obj) => {
            let text = ["reason", "message", "msg", "detail", "error"]
                .iter()
                .find_map(|key| obj.get(*key).and_then(Value::as_str));

            match (obj.get("row"), text) {
                (Some(row), Some(text)) => format!("Row {}: {}", row, text),
                (None, Some(text)) => text.to_string(),
                _ => item.to_string(),
            }
        }
        other => other.to_string(),
    }
}
