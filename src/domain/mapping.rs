// ==========================================
// 房产 CRM 线索导入 - 列映射 (FieldMapping)
// ==========================================
// 职责: 源列 → 目标字段 / 跳过
// 说明: 不强制目标字段唯一,同一目标多列时按表头顺序后写覆盖
// ==========================================

use crate::domain::types::FieldKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 单列映射目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "field")]
pub enum MappingTarget {
    Skip,
    Field(FieldKey),
}

impl MappingTarget {
    pub fn field(&self) -> Option<FieldKey> {
        match self {
            MappingTarget::Skip => None,
            MappingTarget::Field(key) => Some(*key),
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, MappingTarget::Skip)
    }
}

impl fmt::Display for MappingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingTarget::Skip => write!(f, "skip"),
            MappingTarget::Field(key) => write!(f, "{}", key),
        }
    }
}

impl From<FieldKey> for MappingTarget {
    fn from(key: FieldKey) -> Self {
        MappingTarget::Field(key)
    }
}

/// 同一目标字段被多列写入的诊断信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateTarget {
    pub field: FieldKey,
    /// 按表头顺序,最后一列生效
    pub headers: Vec<String>,
}

/// 列映射（保持表头顺序）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    entries: Vec<(String, MappingTarget)>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置某列的映射目标；重复表头只保留一条（首次出现的位置）
    pub fn set(&mut self, header: impl Into<String>, target: MappingTarget) {
        let header = header.into();
        match self.entries.iter_mut().find(|(h, _)| *h == header) {
            Some(entry) => entry.1 = target,
            None => self.entries.push((header, target)),
        }
    }

    pub fn get(&self, header: &str) -> Option<MappingTarget> {
        self.entries
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, target)| *target)
    }

    pub fn contains(&self, header: &str) -> bool {
        self.entries.iter().any(|(h, _)| h == header)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, MappingTarget)> {
        self.entries.iter().map(|(h, t)| (h.as_str(), *t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 已映射（非 skip）列数
    pub fn mapped_count(&self) -> usize {
        self.entries.iter().filter(|(_, t)| !t.is_skip()).count()
    }

    /// 多列指向同一目标字段的情况（非致命,仅提示操作员）
    pub fn duplicate_targets(&self) -> Vec<DuplicateTarget> {
        let mut duplicates: Vec<DuplicateTarget> = Vec::new();
        for (header, target) in &self.entries {
            let Some(field) = target.field() else {
                continue;
            };
            match duplicates.iter_mut().find(|d| d.field == field) {
                Some(existing) => existing.headers.push(header.clone()),
                None => duplicates.push(DuplicateTarget {
                    field,
                    headers: vec![header.clone()],
                }),
            }
        }
        duplicates.retain(|d| d.headers.len() > 1);
        duplicates
    }
}

impl FromIterator<(String, MappingTarget)> for FieldMapping {
    fn from_iter<I: IntoIterator<Item = (String, MappingTarget)>>(iter: I) -> Self {
        let mut mapping = FieldMapping::new();
        for (header, target) in iter {
            mapping.set(header, target);
        }
        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites_in_place() {
        let mut mapping = FieldMapping::new();
        mapping.set("Name", MappingTarget::Skip);
        mapping.set("Mail", FieldKey::Email.into());
        mapping.set("Name", FieldKey::FirstName.into());

        let headers: Vec<&str> = mapping.iter().map(|(h, _)| h).collect();
        assert_eq!(headers, vec!["Name", "Mail"]);
        assert_eq!(mapping.get("Name"), Some(MappingTarget::Field(FieldKey::FirstName)));
        assert_eq!(mapping.mapped_count(), 2);
    }

    #[test]
    fn test_duplicate_targets_reported() {
        let mapping: FieldMapping = vec![
            ("Email".to_string(), FieldKey::Email.into()),
            ("Phone".to_string(), FieldKey::Phone.into()),
            ("Buyer Email".to_string(), FieldKey::Email.into()),
            ("Ignored".to_string(), MappingTarget::Skip),
        ]
        .into_iter()
        .collect();

        let duplicates = mapping.duplicate_targets();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].field, FieldKey::Email);
        assert_eq!(duplicates[0].headers, vec!["Email", "Buyer Email"]);
    }

    #[test]
    fn test_target_serde_shape() {
        let json = serde_json::to_value(MappingTarget::Field(FieldKey::PriceMax)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "field", "field": "price_max"}));
        let json = serde_json::to_value(MappingTarget::Skip).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "skip"}));
    }
}
