// ==========================================
// 线索导入API
// ==========================================
// 职责: 组合导入会话、提交器、配置、映射模板与线索列表
// 输出: 可序列化的视图（映射视图 / 预览 / 导入报告）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ImportConfig;
use crate::domain::{
    DuplicateTarget, FieldKey, FieldKind, ImportMeta, MappingTarget, TransformedLead,
};
use crate::importer::{
    BatchCommitter, ImportError, ImportReport, ImportSession, LeadImportClient, MappingProfile,
    MappingProfileStore, SessionPhase, UniversalFileParser,
};
use crate::importer::report::merge_inserted_leads;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

/// 单列映射视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnView {
    pub header: String,
    /// None 表示跳过
    pub field: Option<FieldKey>,
    pub label: Option<&'static str>,
}

/// 映射视图（映射编辑步骤展示）
#[derive(Debug, Clone, Serialize)]
pub struct MappingView {
    pub file_name: Option<String>,
    pub row_count: usize,
    pub columns: Vec<ColumnView>,
    pub duplicates: Vec<DuplicateTarget>,
}

/// 预览响应
#[derive(Debug, Clone, Serialize)]
pub struct PreviewResponse {
    pub total_rows: usize,
    pub rows: Vec<TransformedLead>,
}

/// 目标字段目录项
#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub key: FieldKey,
    pub label: &'static str,
    pub kind: FieldKind,
}

/// 列出全部目标字段
pub fn list_fields() -> Vec<FieldView> {
    FieldKey::all()
        .map(|key| FieldView {
            key,
            label: key.label(),
            kind: key.kind(),
        })
        .collect()
}

/// 解析操作员输入的映射目标（"skip" 或字段键）
pub fn parse_target(raw: &str) -> ApiResult<MappingTarget> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("skip") || raw.is_empty() {
        return Ok(MappingTarget::Skip);
    }
    raw.parse::<FieldKey>()
        .map(MappingTarget::Field)
        .map_err(|_| ImportError::UnknownField(raw.to_string()).into())
}

/// 线索导入API
pub struct ImportApi<C: LeadImportClient> {
    config: ImportConfig,
    session: ImportSession,
    committer: BatchCommitter<C>,
    profiles: Box<dyn MappingProfileStore>,
    leads: Vec<Value>,
}

impl<C: LeadImportClient> ImportApi<C> {
    /// 创建新的ImportApi实例
    ///
    /// # 参数
    /// - config: 导入配置（预览行数、分块、默认阶段等）
    /// - client: 导入接口客户端
    /// - profiles: 映射模板存储
    pub fn new(config: ImportConfig, client: C, profiles: Box<dyn MappingProfileStore>) -> Self {
        let session = ImportSession::new(UniversalFileParser::new(config.max_file_size_mb));
        let committer = BatchCommitter::new(client).with_chunk_size(config.chunk_size);
        Self {
            config,
            session,
            committer,
            profiles,
            leads: Vec::new(),
        }
    }

    /// 预置调用方已有的线索列表
    pub fn with_leads(mut self, leads: Vec<Value>) -> Self {
        self.leads = leads;
        self
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        self.committer.client()
    }

    pub fn session(&self) -> &ImportSession {
        &self.session
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    /// 调用方的线索列表（提交成功后合并新增线索）
    pub fn leads(&self) -> &[Value] {
        &self.leads
    }

    // ==========================================
    // 文件与映射
    // ==========================================

    /// 打开磁盘文件并猜测映射
    pub fn open_file<P: AsRef<Path>>(&mut self, path: P) -> ApiResult<MappingView> {
        self.session.choose_file(path)?;
        Ok(self.mapping_view())
    }

    /// 打开上传内容并猜测映射
    pub fn open_bytes(&mut self, file_name: &str, bytes: &[u8]) -> ApiResult<MappingView> {
        self.session.choose_bytes(file_name, bytes)?;
        Ok(self.mapping_view())
    }

    pub fn mapping_view(&self) -> MappingView {
        let columns = self
            .session
            .mapping()
            .iter()
            .map(|(header, target)| ColumnView {
                header: header.to_string(),
                field: target.field(),
                label: target.field().map(|key| key.label()),
            })
            .collect();

        MappingView {
            file_name: self.session.file_name().map(str::to_string),
            row_count: self.session.table().map_or(0, |t| t.row_count()),
            columns,
            duplicates: self.session.duplicate_targets(),
        }
    }

    /// 修改单列映射
    ///
    /// # 参数
    /// - header: 源列名（必须存在于当前文件）
    /// - target: "skip" 或目标字段键
    pub fn set_column(&mut self, header: &str, target: &str) -> ApiResult<MappingView> {
        let target = parse_target(target)?;
        self.session.set_mapping(header, target)?;
        Ok(self.mapping_view())
    }

    /// 预览（行数取自配置）
    pub fn preview(&self) -> PreviewResponse {
        PreviewResponse {
            total_rows: self.session.table().map_or(0, |t| t.row_count()),
            rows: self.session.preview(self.config.preview_rows),
        }
    }

    // ==========================================
    // 映射模板
    // ==========================================

    pub fn save_profile(&self, name: &str) -> ApiResult<MappingProfile> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::InvalidInput("profile name must not be empty".to_string()));
        }
        if self.session.mapping().is_empty() {
            return Err(ApiError::InvalidState(
                "open a file before saving a mapping profile".to_string(),
            ));
        }
        let profile = MappingProfile::new(name, self.session.mapping().clone());
        self.profiles.save(profile.clone())?;
        Ok(profile)
    }

    /// 套用映射模板,返回被覆盖的列数
    pub fn apply_profile(&mut self, name: &str) -> ApiResult<usize> {
        let profile = self.profiles.load(name)?;
        Ok(self.session.apply_profile(&profile)?)
    }

    pub fn list_profiles(&self) -> ApiResult<Vec<MappingProfile>> {
        Ok(self.profiles.list()?)
    }

    pub fn delete_profile(&self, name: &str) -> ApiResult<()> {
        Ok(self.profiles.delete(name)?)
    }

    // ==========================================
    // 提交
    // ==========================================

    /// 组装提交参数（未指定项取配置默认值）
    pub fn build_meta(
        &self,
        owner_id: Option<&str>,
        default_stage: Option<&str>,
        add_to_dashboard: Option<bool>,
    ) -> ApiResult<ImportMeta> {
        let owner_id = owner_id
            .map(str::to_string)
            .or_else(|| self.config.owner_id.clone())
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ApiError::InvalidInput("an owner id is required".to_string()))?;

        Ok(ImportMeta {
            default_stage: default_stage
                .unwrap_or(self.config.default_stage.as_str())
                .to_string(),
            add_to_dashboard: add_to_dashboard.unwrap_or(self.config.add_to_dashboard),
            owner_id,
        })
    }

    /// 提交全部转换后的线索
    ///
    /// 成功时新增线索合并到线索列表,返回操作员报告；
    /// 失败时会话保持打开,可修改映射或原样重试。
    pub async fn commit(&mut self, meta: &ImportMeta) -> ApiResult<ImportReport> {
        match self.session.commit(&self.committer, meta).await {
            Ok(result) => {
                merge_inserted_leads(&mut self.leads, &result.inserted_leads);
                info!(
                    inserted = result.inserted,
                    skipped = result.skipped,
                    total_leads = self.leads.len(),
                    "导入完成,线索列表已更新"
                );
                Ok(ImportReport::from_result(&result, self.config.max_inline_errors))
            }
            Err(e) => {
                warn!(error = %e, "导入未完成,会话保持打开");
                Err(e.into())
            }
        }
    }

    /// 放弃当前会话
    pub fn reset(&mut self) {
        self.session.reset();
    }
}
