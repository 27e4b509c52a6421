// ==========================================
// 房产 CRM 线索导入 - 列映射模板存储
// ==========================================
// 职责: 保存 / 读取 / 列出 / 删除命名映射模板
// 红线: 通过注入的存储端口访问,不使用全局状态
// ==========================================

use crate::domain::FieldMapping;
use crate::importer::error::{ImportError, ImporterResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// 命名映射模板
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingProfile {
    pub name: String,
    pub mapping: FieldMapping,
    pub saved_at: DateTime<Utc>,
}

impl MappingProfile {
    pub fn new(name: impl Into<String>, mapping: FieldMapping) -> Self {
        Self {
            name: name.into(),
            mapping,
            saved_at: Utc::now(),
        }
    }
}

// ==========================================
// MappingProfileStore Trait
// ==========================================
// 实现者: JsonFileProfileStore, InMemoryProfileStore
pub trait MappingProfileStore: Send + Sync {
    fn save(&self, profile: MappingProfile) -> ImporterResult<()>;

    fn load(&self, name: &str) -> ImporterResult<MappingProfile>;

    /// 按名称排序
    fn list(&self) -> ImporterResult<Vec<MappingProfile>>;

    fn delete(&self, name: &str) -> ImporterResult<()>;
}

// ==========================================
// 内存存储（测试 / 无持久化场景）
// ==========================================
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: Mutex<BTreeMap<String, MappingProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> ImporterResult<std::sync::MutexGuard<'_, BTreeMap<String, MappingProfile>>> {
        self.profiles
            .lock()
            .map_err(|e| ImportError::ProfileStoreError(format!("lock poisoned: {}", e)))
    }
}

impl MappingProfileStore for InMemoryProfileStore {
    fn save(&self, profile: MappingProfile) -> ImporterResult<()> {
        self.lock()?.insert(profile.name.clone(), profile);
        Ok(())
    }

    fn load(&self, name: &str) -> ImporterResult<MappingProfile> {
        self.lock()?
            .get(name)
            .cloned()
            .ok_or_else(|| ImportError::ProfileNotFound(name.to_string()))
    }

    fn list(&self) -> ImporterResult<Vec<MappingProfile>> {
        Ok(self.lock()?.values().cloned().collect())
    }

    fn delete(&self, name: &str) -> ImporterResult<()> {
        self.lock()?
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ImportError::ProfileNotFound(name.to_string()))
    }
}

// ==========================================
// JSON 文件存储
// ==========================================
// 文件格式: { "<name>": MappingProfile, ... }
pub struct JsonFileProfileStore {
    path: PathBuf,
}

impl JsonFileProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> ImporterResult<BTreeMap<String, MappingProfile>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_all(&self, profiles: &BTreeMap<String, MappingProfile>) -> ImporterResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(profiles)?;
        std::fs::write(&self.path, raw)?;
        debug!(path = %self.path.display(), count = profiles.len(), "映射模板已写入");
        Ok(())
    }
}

impl MappingProfileStore for JsonFileProfileStore {
    fn save(&self, profile: MappingProfile) -> ImporterResult<()> {
        let mut profiles = self.read_all()?;
        info!(profile = %profile.name, "保存映射模板");
        profiles.insert(profile.name.clone(), profile);
        self.write_all(&profiles)
    }

    fn load(&self, name: &str) -> ImporterResult<MappingProfile> {
        self.read_all()?
            .remove(name)
            .ok_or_else(|| ImportError::ProfileNotFound(name.to_string()))
    }

    fn list(&self) -> ImporterResult<Vec<MappingProfile>> {
        Ok(self.read_all()?.into_values().collect())
    }

    fn delete(&self, name: &str) -> ImporterResult<()> {
        let mut profiles = self.read_all()?;
        if profiles.remove(name).is_none() {
            return Err(ImportError::ProfileNotFound(name.to_string()));
        }
        self.write_all(&profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldKey, MappingTarget};
    use tempfile::TempDir;

    fn sample_mapping() -> FieldMapping {
        vec![
            ("Given".to_string(), MappingTarget::Field(FieldKey::FirstName)),
            ("Internal".to_string(), MappingTarget::Skip),
        ]
        .into_iter()
        .collect()
    }

    fn exercise_store(store: &dyn MappingProfileStore) {
        store.save(MappingProfile::new("zillow", sample_mapping())).unwrap();
        store.save(MappingProfile::new("realtor", FieldMapping::new())).unwrap();

        let loaded = store.load("zillow").unwrap();
        assert_eq!(loaded.mapping, sample_mapping());

        let names: Vec<String> = store.list().unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["realtor", "zillow"]);

        store.delete("realtor").unwrap();
        assert!(matches!(store.load("realtor"), Err(ImportError::ProfileNotFound(_))));
        assert!(matches!(store.delete("realtor"), Err(ImportError::ProfileNotFound(_))));
    }

    #[test]
    fn test_in_memory_store() {
        exercise_store(&InMemoryProfileStore::new());
    }

    #[test]
    fn test_json_file_store_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("profiles.json");

        let store = JsonFileProfileStore::new(&path);
        exercise_store(&store);

        // 重新打开仍可读取
        let reopened = JsonFileProfileStore::new(&path);
        assert_eq!(reopened.load("zillow").unwrap().mapping, sample_mapping());
    }

    #[test]
    fn test_json_file_store_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileProfileStore::new(dir.path().join("absent.json"));
        assert!(store.list().unwrap().is_empty());
    }
}
