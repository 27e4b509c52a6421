// ==========================================
// 房产 CRM 线索导入 - 线索与导入结果
// ==========================================
// 职责: TransformedLead / 导入请求体 / 导入接口响应
// 红线: ImportResult 由后端返回,本模块只读
// ==========================================

use crate::domain::types::FieldKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 转换后的字段值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LeadValue {
    Integer(i64),
    Text(String),
    List(Vec<String>),
}

impl LeadValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            LeadValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            LeadValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            LeadValue::List(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for LeadValue {
    fn from(value: &str) -> Self {
        LeadValue::Text(value.to_string())
    }
}

impl From<i64> for LeadValue {
    fn from(value: i64) -> Self {
        LeadValue::Integer(value)
    }
}

/// 单行转换结果（空值字段不出现）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformedLead {
    fields: BTreeMap<FieldKey, LeadValue>,
}

impl TransformedLead {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入字段；同一字段重复写入时后写覆盖
    pub fn insert(&mut self, key: FieldKey, value: LeadValue) {
        self.fields.insert(key, value);
    }

    pub fn get(&self, key: FieldKey) -> Option<&LeadValue> {
        self.fields.get(&key)
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.fields.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &LeadValue)> {
        self.fields.iter()
    }
}

impl FromIterator<(FieldKey, LeadValue)> for TransformedLead {
    fn from_iter<I: IntoIterator<Item = (FieldKey, LeadValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// 提交参数（操作员在弹窗中选择）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMeta {
    pub default_stage: String,
    pub add_to_dashboard: bool,
    pub owner_id: String,
}

/// 导入接口请求体
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportPayload<'a> {
    pub user_id: &'a str,
    pub default_stage: &'a str,
    pub in_dashboard: bool,
    pub leads: &'a [TransformedLead],
}

impl<'a> ImportPayload<'a> {
    pub fn new(meta: &'a ImportMeta, leads: &'a [TransformedLead]) -> Self {
        Self {
            user_id: &meta.owner_id,
            default_stage: &meta.default_stage,
            in_dashboard: meta.add_to_dashboard,
            leads,
        }
    }
}

/// 后端返回的行级错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: i64,
    pub reason: String,
}

/// 导入接口响应
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    #[serde(default)]
    pub inserted: u64,
    #[serde(default)]
    pub skipped: u64,
    #[serde(default)]
    pub errors: Vec<RowError>,
    /// 后端线索对象,原样透传
    #[serde(default)]
    pub inserted_leads: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transformed_lead_serializes_flat() {
        let lead: TransformedLead = vec![
            (FieldKey::FirstName, LeadValue::from("Jane")),
            (FieldKey::PriceMax, LeadValue::from(600000)),
            (
                FieldKey::SourceTags,
                LeadValue::List(vec!["Website".to_string()]),
            ),
        ]
        .into_iter()
        .collect();

        let value = serde_json::to_value(&lead).unwrap();
        assert_eq!(
            value,
            json!({"first_name": "Jane", "price_max": 600000, "source_tags": ["Website"]})
        );
    }

    #[test]
    fn test_payload_shape() {
        let meta = ImportMeta {
            default_stage: "New".to_string(),
            add_to_dashboard: true,
            owner_id: "agent-7".to_string(),
        };
        let leads = vec![TransformedLead::new()];
        let value = serde_json::to_value(ImportPayload::new(&meta, &leads)).unwrap();
        assert_eq!(
            value,
            json!({"user_id": "agent-7", "default_stage": "New", "in_dashboard": true, "leads": [{}]})
        );
    }

    #[test]
    fn test_import_result_defaults_missing_arrays() {
        let result: ImportResult = serde_json::from_value(json!({"inserted": 2, "skipped": 1})).unwrap();
        assert_eq!(result.inserted, 2);
        assert_eq!(result.skipped, 1);
        assert!(result.errors.is_empty());
        assert!(result.inserted_leads.is_empty());
    }
}
