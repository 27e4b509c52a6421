// ==========================================
// 房产 CRM 线索导入 - 导入会话状态机
// ==========================================
// 状态: Choose → Mapped → (操作员修改映射) → Committing → Result
// 红线: 重置回 Choose 时丢弃全部表格与映射状态；Committing 必定终止
// ==========================================

use crate::domain::{
    DuplicateTarget, FieldMapping, ImportMeta, ImportResult, MappingTarget, RawTable,
    TransformedLead,
};
use crate::importer::batch_committer::BatchCommitter;
use crate::importer::error::{ImportError, ImporterResult};
use crate::importer::field_mapper::HeuristicFieldMapper;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::lead_importer_trait::{FieldMapper, LeadImportClient};
use crate::importer::profile_store::MappingProfile;
use crate::importer::row_transformer::RowTransformer;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Choose,
    Mapped,
    Committing,
    Result,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Choose => write!(f, "choosing a file"),
            SessionPhase::Mapped => write!(f, "mapping columns"),
            SessionPhase::Committing => write!(f, "committing"),
            SessionPhase::Result => write!(f, "showing results"),
        }
    }
}

/// 最近一次提交的结果
#[derive(Debug, Clone)]
pub enum CommitOutcome {
    Success(ImportResult),
    Failure(String),
}

/// 一次导入会话
pub struct ImportSession {
    id: Uuid,
    phase: SessionPhase,
    busy: bool,
    file_name: Option<String>,
    table: Option<RawTable>,
    mapping: FieldMapping,
    outcome: Option<CommitOutcome>,
    parser: UniversalFileParser,
    mapper: Box<dyn FieldMapper>,
    transformer: RowTransformer,
}

impl Default for ImportSession {
    fn default() -> Self {
        Self::new(UniversalFileParser::default())
    }
}

impl ImportSession {
    pub fn new(parser: UniversalFileParser) -> Self {
        Self {
            id: Uuid::new_v4(),
            phase: SessionPhase::Choose,
            busy: false,
            file_name: None,
            table: None,
            mapping: FieldMapping::new(),
            outcome: None,
            parser,
            mapper: Box::new(HeuristicFieldMapper),
            transformer: RowTransformer::default(),
        }
    }

    // ===== 只读访问 =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn table(&self) -> Option<&RawTable> {
        self.table.as_ref()
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    pub fn outcome(&self) -> Option<&CommitOutcome> {
        self.outcome.as_ref()
    }

    pub fn duplicate_targets(&self) -> Vec<DuplicateTarget> {
        self.mapping.duplicate_targets()
    }

    // ===== 状态迁移 =====

    /// 选择磁盘文件: Choose/任意 → Mapped；失败时会话不变
    pub fn choose_file<P: AsRef<Path>>(&mut self, path: P) -> ImporterResult<&FieldMapping> {
        self.ensure_idle("choose a file")?;
        let path = path.as_ref();
        let table = self.parser.parse(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        Ok(self.load_table(file_name, table))
    }

    /// 选择内存中的文件内容（上传场景）
    pub fn choose_bytes(&mut self, file_name: &str, bytes: &[u8]) -> ImporterResult<&FieldMapping> {
        self.ensure_idle("choose a file")?;
        let table = self.parser.parse_bytes(file_name, bytes)?;
        Ok(self.load_table(file_name.to_string(), table))
    }

    fn load_table(&mut self, file_name: String, table: RawTable) -> &FieldMapping {
        // 新文件: 从头猜测映射,不继承旧映射
        self.mapping = self.mapper.guess_mapping(table.headers());
        self.outcome = None;
        self.phase = SessionPhase::Mapped;

        info!(
            session = %self.id,
            file = %file_name,
            rows = table.row_count(),
            mapped = self.mapping.mapped_count(),
            columns = self.mapping.len(),
            "文件已载入,列映射已猜测"
        );
        self.warn_duplicates();

        self.file_name = Some(file_name);
        self.table = Some(table);
        &self.mapping
    }

    /// 操作员修改单列映射
    pub fn set_mapping(&mut self, header: &str, target: MappingTarget) -> ImporterResult<()> {
        self.ensure_idle("edit the mapping")?;
        let table = self.table.as_ref().ok_or_else(|| ImportError::InvalidState {
            state: self.phase.to_string(),
            action: "edit the mapping".to_string(),
        })?;

        if !table.has_header(header) {
            return Err(ImportError::UnknownHeader(header.to_string()));
        }

        self.mapping.set(header, target);
        self.outcome = None;
        self.phase = SessionPhase::Mapped;
        self.warn_duplicates();
        Ok(())
    }

    /// 套用映射模板: 仅覆盖当前文件中存在的列,返回被覆盖的列数
    pub fn apply_profile(&mut self, profile: &MappingProfile) -> ImporterResult<usize> {
        self.ensure_idle("apply a mapping profile")?;
        let table = self.table.as_ref().ok_or_else(|| ImportError::InvalidState {
            state: self.phase.to_string(),
            action: "apply a mapping profile".to_string(),
        })?;

        let mut applied = 0;
        for (header, target) in profile.mapping.iter() {
            if table.has_header(header) {
                self.mapping.set(header, target);
                applied += 1;
            }
        }

        info!(session = %self.id, profile = %profile.name, applied, "映射模板已套用");
        self.outcome = None;
        self.phase = SessionPhase::Mapped;
        self.warn_duplicates();
        Ok(applied)
    }

    /// 预览前 N 行（不影响提交使用的完整集合）
    pub fn preview(&self, limit: usize) -> Vec<TransformedLead> {
        match &self.table {
            Some(table) => self
                .transformer
                .transform(table.rows(), &self.mapping, Some(limit)),
            None => Vec::new(),
        }
    }

    /// 完整转换结果（提交使用）
    pub fn transformed_rows(&self) -> Vec<TransformedLead> {
        match &self.table {
            Some(table) => self.transformer.transform(table.rows(), &self.mapping, None),
            None => Vec::new(),
        }
    }

    /// 提交: Mapped/Result → Committing → Result
    ///
    /// 失败后会话保持打开,可原样重试；重复提交会在后端重复插入。
    pub async fn commit<C: LeadImportClient>(
        &mut self,
        committer: &BatchCommitter<C>,
        meta: &ImportMeta,
    ) -> ImporterResult<ImportResult> {
        if self.busy {
            return Err(ImportError::CommitInProgress);
        }
        if !matches!(self.phase, SessionPhase::Mapped | SessionPhase::Result) {
            return Err(ImportError::InvalidState {
                state: self.phase.to_string(),
                action: "commit".to_string(),
            });
        }

        let rows = self.transformed_rows();
        info!(session = %self.id, rows = rows.len(), "开始提交");

        // future 被丢弃时由 guard 落到 Result
        let guard = CommitGuard::enter(&mut self.phase, &mut self.busy, &mut self.outcome);
        let result = committer.commit(&rows, meta).await;
        guard.finish(&result);

        result
    }

    /// 重置: 任意 → Choose,丢弃全部状态
    pub fn reset(&mut self) {
        info!(session = %self.id, "会话重置");
        self.id = Uuid::new_v4();
        self.phase = SessionPhase::Choose;
        self.busy = false;
        self.file_name = None;
        self.table = None;
        self.mapping = FieldMapping::new();
        self.outcome = None;
    }

    fn ensure_idle(&self, action: &str) -> ImporterResult<()> {
        if self.busy {
            return Err(ImportError::InvalidState {
                state: self.phase.to_string(),
                action: action.to_string(),
            });
        }
        Ok(())
    }

    fn warn_duplicates(&self) {
        for dup in self.mapping.duplicate_targets() {
            warn!(
                field = %dup.field,
                headers = ?dup.headers,
                "多列映射到同一字段,后写覆盖"
            );
        }
    }
}

/// 提交期间的会话状态
///
/// 无论 commit future 正常完成还是被丢弃（超时、select）,
/// drop 时都清除 busy 并进入 Result。
struct CommitGuard<'a> {
    phase: &'a mut SessionPhase,
    busy: &'a mut bool,
    outcome: &'a mut Option<CommitOutcome>,
    finished: bool,
}

impl<'a> CommitGuard<'a> {
    fn enter(
        phase: &'a mut SessionPhase,
        busy: &'a mut bool,
        outcome: &'a mut Option<CommitOutcome>,
    ) -> Self {
        *busy = true;
        *phase = SessionPhase::Committing;
        Self {
            phase,
            busy,
            outcome,
            finished: false,
        }
    }

    fn finish(mut self, result: &ImporterResult<ImportResult>) {
        *self.outcome = Some(match result {
            Ok(res) => CommitOutcome::Success(res.clone()),
            Err(e) => CommitOutcome::Failure(e.to_string()),
        });
        self.finished = true;
    }
}

impl Drop for CommitGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!("提交在收到响应前被中断");
            *self.outcome = Some(CommitOutcome::Failure(INTERRUPTED_MESSAGE.to_string()));
        }
        *self.busy = false;
        *self.phase = SessionPhase::Result;
    }
}

const INTERRUPTED_MESSAGE: &str = "Import was interrupted before the server responded";
