// ==========================================
// 房产 CRM 线索导入 - 数据清洗器实现
// ==========================================
// 阶段 3: TRIM / 空值标准化 / 整数提取 / 列表拆分
// 红线: 脏数据降级为"字段缺省",不抛错
// ==========================================

use crate::importer::lead_importer_trait::DataCleaner as DataCleanerTrait;

pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn clean_text(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn parse_integer(&self, value: &str) -> Option<i64> {
        // 去除货币符号、千分位等全部非数字字符
        let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
        digits.parse::<i64>().ok()
    }

    fn split_list(&self, value: &str) -> Vec<String> {
        value
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect()
    }
}
