// ==========================================
// 房产 CRM 线索导入 - 行转换器
// ==========================================
// 阶段 3: 按映射逐行取值 + 类型转换
// 红线: 空值字段直接省略（不写空串）；保持源文件行顺序
// ==========================================

use crate::domain::{FieldKind, FieldMapping, LeadValue, RawRecord, TransformedLead};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::lead_importer_trait::DataCleaner as DataCleanerTrait;

pub struct RowTransformer {
    cleaner: Box<dyn DataCleanerTrait>,
}

impl Default for RowTransformer {
    fn default() -> Self {
        Self::new(Box::new(DataCleaner))
    }
}

impl RowTransformer {
    pub fn new(cleaner: Box<dyn DataCleanerTrait>) -> Self {
        Self { cleaner }
    }

    /// 转换行集合
    ///
    /// # 参数
    /// - rows: 原始行（源文件顺序）
    /// - mapping: 列映射（可能经操作员修改）
    /// - limit: 仅用于预览,取前 N 行
    pub fn transform(
        &self,
        rows: &[RawRecord],
        mapping: &FieldMapping,
        limit: Option<usize>,
    ) -> Vec<TransformedLead> {
        let take = limit.unwrap_or(rows.len());
        rows.iter()
            .take(take)
            .map(|row| self.transform_row(row, mapping))
            .collect()
    }

    /// 转换单行；同一目标字段多列时,表头顺序靠后的非空值覆盖
    pub fn transform_row(&self, row: &RawRecord, mapping: &FieldMapping) -> TransformedLead {
        let mut lead = TransformedLead::new();

        for (header, target) in mapping.iter() {
            let Some(field) = target.field() else {
                continue;
            };
            let Some(raw) = row.get(header) else {
                continue;
            };

            let value = match field.kind() {
                FieldKind::Integer => self.cleaner.parse_integer(raw).map(LeadValue::Integer),
                FieldKind::List => Some(LeadValue::List(self.cleaner.split_list(raw))),
                FieldKind::Text | FieldKind::Enumerated => {
                    self.cleaner.clean_text(raw).map(LeadValue::Text)
                }
            };

            if let Some(value) = value {
                lead.insert(field, value);
            }
        }

        lead
    }
}

/// 便捷函数: 默认清洗器
pub fn transform(
    rows: &[RawRecord],
    mapping: &FieldMapping,
    limit: Option<usize>,
) -> Vec<TransformedLead> {
    RowTransformer::default().transform(rows, mapping, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldKey, MappingTarget};

    fn row(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn mapping(pairs: &[(&str, MappingTarget)]) -> FieldMapping {
        pairs.iter().map(|(h, t)| (h.to_string(), *t)).collect()
    }

    #[test]
    fn test_transform_coerces_by_kind() {
        let rows = vec![row(&[
            ("First Name", " Jane "),
            ("Budget Max", "$600,000"),
            ("Tags", "Website, Lead Generator AI, "),
            ("Phone", "5551234567"),
        ])];
        let mapping = mapping(&[
            ("First Name", FieldKey::FirstName.into()),
            ("Budget Max", FieldKey::PriceMax.into()),
            ("Tags", FieldKey::SourceTags.into()),
            ("Phone", FieldKey::Phone.into()),
        ]);

        let leads = transform(&rows, &mapping, None);
        assert_eq!(leads.len(), 1);
        let lead = &leads[0];
        assert_eq!(lead.get(FieldKey::FirstName).and_then(|v| v.as_text()), Some("Jane"));
        assert_eq!(lead.get(FieldKey::PriceMax).and_then(|v| v.as_integer()), Some(600000));
        assert_eq!(
            lead.get(FieldKey::SourceTags).and_then(|v| v.as_list()),
            Some(&["Website".to_string(), "Lead Generator AI".to_string()][..])
        );
        assert_eq!(lead.get(FieldKey::Phone).and_then(|v| v.as_text()), Some("5551234567"));
    }

    #[test]
    fn test_empty_and_invalid_values_are_omitted() {
        let rows = vec![row(&[
            ("Email", ""),
            ("Price Min", "not a number"),
            ("City", "   "),
            ("Last Name", "Doe"),
        ])];
        let mapping = mapping(&[
            ("Email", FieldKey::Email.into()),
            ("Price Min", FieldKey::PriceMin.into()),
            ("City", FieldKey::City.into()),
            ("Last Name", FieldKey::LastName.into()),
            ("Not In File", FieldKey::Notes.into()),
        ]);

        let lead = &transform(&rows, &mapping, None)[0];
        assert_eq!(lead.len(), 1);
        assert!(!lead.contains(FieldKey::Email));
        assert!(!lead.contains(FieldKey::PriceMin));
        assert!(!lead.contains(FieldKey::City));
        assert!(!lead.contains(FieldKey::Notes));
    }

    #[test]
    fn test_skip_columns_ignored() {
        let rows = vec![row(&[("Internal Id", "42")])];
        let mapping = mapping(&[("Internal Id", MappingTarget::Skip)]);
        assert!(transform(&rows, &mapping, None)[0].is_empty());
    }

    #[test]
    fn test_empty_tag_cell_yields_empty_list() {
        let rows = vec![row(&[("Tags", "")])];
        let mapping = mapping(&[("Tags", FieldKey::SourceTags.into())]);
        let lead = &transform(&rows, &mapping, None)[0];
        assert_eq!(lead.get(FieldKey::SourceTags), Some(&LeadValue::List(vec![])));
    }

    #[test]
    fn test_duplicate_destination_last_write_wins() {
        let rows = vec![row(&[("Email", "a@x.com"), ("Buyer Email", "b@x.com")])];
        let mapping = mapping(&[
            ("Email", FieldKey::Email.into()),
            ("Buyer Email", FieldKey::Email.into()),
        ]);
        let lead = &transform(&rows, &mapping, None)[0];
        assert_eq!(lead.get(FieldKey::Email).and_then(|v| v.as_text()), Some("b@x.com"));
    }

    #[test]
    fn test_order_preserved_and_limit_truncates() {
        let rows: Vec<RawRecord> = (0..8)
            .map(|i| row(&[("First Name", format!("Lead{}", i).as_str())]))
            .collect();
        let mapping = mapping(&[("First Name", FieldKey::FirstName.into())]);

        let full = transform(&rows, &mapping, None);
        assert_eq!(full.len(), 8);
        for (i, lead) in full.iter().enumerate() {
            let expected = format!("Lead{}", i);
            assert_eq!(lead.get(FieldKey::FirstName).and_then(|v| v.as_text()), Some(expected.as_str()));
        }

        let preview = transform(&rows, &mapping, Some(3));
        assert_eq!(preview.as_slice(), &full[..3]);
        // 预览不影响完整集合
        assert_eq!(transform(&rows, &mapping, None).len(), 8);
        assert_eq!(transform(&rows, &mapping, Some(100)).len(), 8);
    }
}
