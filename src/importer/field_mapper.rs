// ==========================================
// 房产 CRM 线索导入 - 列映射猜测器实现
// ==========================================
// 阶段 2: 源列名 → 目标字段
// 规则: 有序规则表,按优先级逐条匹配,首条命中即生效,全部不命中 → skip
// 红线: 规则表必须覆盖全部目标字段（见 tests::test_rule_table_covers_schema）
// ==========================================

use crate::domain::{FieldKey, FieldMapping, MappingTarget};
use crate::importer::lead_importer_trait::FieldMapper as FieldMapperTrait;
use tracing::debug;

/// 单条映射规则
///
/// `requires` 中每一组关键字至少命中一个子串；`excludes` 中任一子串出现即不匹配。
#[derive(Debug, Clone, Copy)]
pub struct MappingRule {
    pub requires: &'static [&'static [&'static str]],
    pub excludes: &'static [&'static str],
    pub target: FieldKey,
}

impl MappingRule {
    pub fn matches(&self, normalized: &str) -> bool {
        self.requires
            .iter()
            .all(|group| group.iter().any(|kw| normalized.contains(kw)))
            && !self.excludes.iter().any(|kw| normalized.contains(kw))
    }
}

const fn rule(
    requires: &'static [&'static [&'static str]],
    excludes: &'static [&'static str],
    target: FieldKey,
) -> MappingRule {
    MappingRule {
        requires,
        excludes,
        target,
    }
}

/// 映射规则表（顺序即优先级）
pub const MAPPING_RULES: &[MappingRule] = &[
    // ===== 邮箱（必须先于地址,"email_address" 不应落到 address）=====
    rule(&[&["email", "e-mail", "e_mail"], &["2", "secondary", "alternate", "other"]], &[], FieldKey::Email2),
    rule(&[&["email", "e-mail", "e_mail"]], &[], FieldKey::Email),
    // ===== 电话（工作/住宅先于通用电话）=====
    rule(&[&["phone", "tel"], &["work", "office", "business"]], &[], FieldKey::WorkPhone),
    rule(&[&["phone"], &["home", "landline"]], &[], FieldKey::HomePhone),
    rule(&[&["phone", "mobile", "cell"]], &[], FieldKey::Phone),
    // ===== 姓名 =====
    rule(&[&["first"], &["name"]], &[], FieldKey::FirstName),
    rule(&[&["fname", "given_name", "forename"]], &[], FieldKey::FirstName),
    rule(&[&["last"], &["name"]], &[], FieldKey::LastName),
    rule(&[&["lname", "surname", "family_name"]], &[], FieldKey::LastName),
    // ===== 管道元数据 =====
    rule(&[&["pipeline"]], &[], FieldKey::Pipeline),
    rule(&[&["stage"]], &[], FieldKey::Stage),
    rule(&[&["status"]], &[], FieldKey::Status),
    rule(&[&["priority"]], &[], FieldKey::Priority),
    rule(&[&["rating", "score", "temperature"]], &[], FieldKey::LeadRating),
    // ===== 价格 / 预算（先于 buying_in,"buyer_budget" 属于预算）=====
    rule(&[&["price", "budget"], &["min", "low", "from", "floor"]], &[], FieldKey::PriceMin),
    rule(&[&["price", "budget"], &["max", "high", "upper", "ceiling"]], &[], FieldKey::PriceMax),
    rule(&[&["budget", "price"]], &[], FieldKey::Budget),
    // ===== 卖房（"house_to_sell" 先于 selling_in 与 property_type）=====
    rule(&[&["to_sell", "home_to_sell", "house_to_sell"]], &[], FieldKey::HouseToSell),
    rule(&[&["sell"]], &[], FieldKey::SellingIn),
    rule(&[&["buying", "timeframe", "timeline", "move_in"]], &[], FieldKey::BuyingIn),
    // ===== 地址族（邮编/城市/社区先于通用地址）=====
    rule(&[&["zip", "postal", "postcode"]], &[], FieldKey::ZipPostalCode),
    rule(&[&["neighborhood", "neighbourhood", "community", "subdivision", "district"]], &[], FieldKey::Neighborhood),
    rule(&[&["city", "town", "municipality"]], &[], FieldKey::City),
    rule(&[&["address", "street", "addr"]], &[], FieldKey::Address),
    // ===== 房屋属性 =====
    rule(&[&["property", "home", "house", "dwelling"], &["type", "style", "kind"]], &[], FieldKey::PropertyType),
    rule(&[&["bed", "bdrm"]], &[], FieldKey::Bedrooms),
    rule(&[&["bath"]], &[], FieldKey::Bathrooms),
    rule(&[&["basement"]], &[], FieldKey::Basement),
    rule(&[&["parking", "garage"]], &[], FieldKey::ParkingType),
    rule(&[&["own"], &["rent"]], &[], FieldKey::OwnsRents),
    rule(&[&["owns", "tenure", "homeowner", "renter"]], &[], FieldKey::OwnsRents),
    rule(&[&["mortgage", "financing", "loan"]], &[], FieldKey::MortgageType),
    // ===== 自由文本 =====
    rule(&[&["tag", "source", "campaign"]], &[], FieldKey::SourceTags),
    rule(&[&["description", "summary", "about"]], &[], FieldKey::LeadDescription),
    rule(&[&["note", "comment", "remark", "memo"]], &[], FieldKey::Notes),
];

/// 列名标准化: TRIM → 小写 → 连续的 '/' 或空白折叠为单个 '_'
pub fn normalize_header(header: &str) -> String {
    let mut normalized = String::with_capacity(header.len());
    let mut in_separator = false;

    for ch in header.trim().chars() {
        if ch == '/' || ch.is_whitespace() {
            if !in_separator {
                normalized.push('_');
                in_separator = true;
            }
        } else {
            normalized.extend(ch.to_lowercase());
            in_separator = false;
        }
    }

    normalized
}

/// 单列猜测
pub fn guess_target(header: &str) -> MappingTarget {
    let normalized = normalize_header(header);
    MAPPING_RULES
        .iter()
        .find(|rule| rule.matches(&normalized))
        .map(|rule| MappingTarget::Field(rule.target))
        .unwrap_or(MappingTarget::Skip)
}

/// 整表猜测（纯函数）
pub fn guess_mapping(headers: &[String]) -> FieldMapping {
    headers
        .iter()
        .map(|header| (header.clone(), guess_target(header)))
        .collect()
}

// ==========================================
// 启发式映射器
// ==========================================
pub struct HeuristicFieldMapper;

impl FieldMapperTrait for HeuristicFieldMapper {
    fn guess_mapping(&self, headers: &[String]) -> FieldMapping {
        let mapping = guess_mapping(headers);
        debug!(
            headers = headers.len(),
            mapped = mapping.mapped_count(),
            "列映射猜测完成"
        );
        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(header: &str) -> Option<FieldKey> {
        guess_target(header).field()
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("First Name"), "first_name");
        assert_eq!(normalize_header("  Zip / Postal   Code "), "zip_postal_code");
        assert_eq!(normalize_header("Owns/Rents"), "owns_rents");
        assert_eq!(normalize_header("EMAIL\t2"), "email_2");
    }

    #[test]
    fn test_characteristic_vocabulary() {
        let cases = [
            ("First Name", FieldKey::FirstName),
            ("first_name", FieldKey::FirstName),
            ("FIRSTNAME", FieldKey::FirstName),
            ("Last Name", FieldKey::LastName),
            ("Surname", FieldKey::LastName),
            ("Phone", FieldKey::Phone),
            ("Mobile Phone", FieldKey::Phone),
            ("Cell", FieldKey::Phone),
            ("Email", FieldKey::Email),
            ("Buyer's Email", FieldKey::Email),
            ("Email Address", FieldKey::Email),
            ("Email 2", FieldKey::Email2),
            ("Secondary Email", FieldKey::Email2),
            ("Work Phone", FieldKey::WorkPhone),
            ("Home Phone", FieldKey::HomePhone),
            ("Pipeline", FieldKey::Pipeline),
            ("Status", FieldKey::Status),
            ("Lead Stage", FieldKey::Stage),
            ("Priority", FieldKey::Priority),
            ("Lead Rating", FieldKey::LeadRating),
            ("Address", FieldKey::Address),
            ("Street Address", FieldKey::Address),
            ("City", FieldKey::City),
            ("Zip Code", FieldKey::ZipPostalCode),
            ("Zip/Postal Code", FieldKey::ZipPostalCode),
            ("Neighborhood", FieldKey::Neighborhood),
            ("Property Type", FieldKey::PropertyType),
            ("Home Type", FieldKey::PropertyType),
            ("Buying In", FieldKey::BuyingIn),
            ("Budget", FieldKey::Budget),
            ("Buyer Budget", FieldKey::Budget),
            ("Price Min", FieldKey::PriceMin),
            ("Min Price", FieldKey::PriceMin),
            ("Budget Max", FieldKey::PriceMax),
            ("Max Price", FieldKey::PriceMax),
            ("Bedrooms", FieldKey::Bedrooms),
            ("Bathrooms", FieldKey::Bathrooms),
            ("Basement", FieldKey::Basement),
            ("Parking Type", FieldKey::ParkingType),
            ("House to Sell", FieldKey::HouseToSell),
            ("Selling In", FieldKey::SellingIn),
            ("Owns/Rents", FieldKey::OwnsRents),
            ("Own or Rent", FieldKey::OwnsRents),
            ("Mortgage Type", FieldKey::MortgageType),
            ("Notes", FieldKey::Notes),
            ("Tags", FieldKey::SourceTags),
            ("Lead Source", FieldKey::SourceTags),
            ("Source Tags", FieldKey::SourceTags),
            ("Lead Description", FieldKey::LeadDescription),
        ];

        for (header, expected) in cases {
            assert_eq!(target(header), Some(expected), "header: {}", header);
        }
    }

    #[test]
    fn test_unmatched_header_skips() {
        assert_eq!(guess_target("Favourite Colour"), MappingTarget::Skip);
        assert_eq!(guess_target(""), MappingTarget::Skip);
        assert_eq!(guess_target("Owner"), MappingTarget::Skip);
    }

    #[test]
    fn test_rule_table_covers_schema() {
        for key in FieldKey::all() {
            assert!(
                MAPPING_RULES.iter().any(|rule| rule.target == key),
                "no mapping rule for {}",
                key
            );
        }
    }

    #[test]
    fn test_guess_mapping_is_deterministic() {
        let headers: Vec<String> = ["First Name", "Last Name", "Phone", "Budget Max", "Misc"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let first = guess_mapping(&headers);
        let second = HeuristicFieldMapper.guess_mapping(&headers);
        assert_eq!(first, second);

        let targets: Vec<String> = first.iter().map(|(_, t)| t.to_string()).collect();
        assert_eq!(
            targets,
            vec!["first_name", "last_name", "phone", "price_max", "skip"]
        );
    }
}
