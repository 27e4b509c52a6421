// ==========================================
// 房产 CRM 线索导入 - 导入接口 HTTP 客户端
// ==========================================
// 协作方契约: POST /import-leads
// 请求: {user_id, default_stage, in_dashboard, leads}
// 响应: {inserted, skipped, errors, inserted_leads}
// ==========================================

use crate::domain::{ImportPayload, ImportResult};
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::lead_importer_trait::{LeadImportClient, TransportFailure};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_IMPORT_PATH: &str = "/import-leads";

pub struct HttpLeadImportClient {
    client: Client,
    endpoint: String,
}

impl HttpLeadImportClient {
    /// 创建客户端
    ///
    /// # 参数
    /// - base_url: 后端地址（如 http://localhost:8000）
    /// - import_path: 导入接口路径
    /// - timeout: 单次请求超时
    pub fn new(base_url: &str, import_path: &str, timeout: Duration) -> ImporterResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ImportError::Other(anyhow::anyhow!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: join_url(base_url, import_path),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[async_trait]
impl LeadImportClient for HttpLeadImportClient {
    async fn import_leads(
        &self,
        payload: &ImportPayload<'_>,
    ) -> Result<ImportResult, TransportFailure> {
        debug!(endpoint = %self.endpoint, leads = payload.leads.len(), "发送导入请求");

        let response = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| TransportFailure::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportFailure::Network(e.to_string()))?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "导入接口返回错误");
            return Err(TransportFailure::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str::<ImportResult>(&body).map_err(|e| {
            TransportFailure::Network(format!(
                "invalid import response ({}): {}",
                e,
                body_excerpt(&body)
            ))
        })
    }
}

/// 响应体摘录（去空白,最多 BODY_EXCERPT_CHARS 个字符）
fn body_excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    match trimmed.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

const BODY_EXCERPT_CHARS: usize = 200;
