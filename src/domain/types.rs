// ==========================================
// 房产 CRM 线索导入 - 领域类型定义
// ==========================================
// 职责: 目标字段目录 (TargetSchema)
// 红线: 静态配置数据,不是运行时状态
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 目标字段值类型 (Field Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,       // 普通字符串
    Integer,    // 整数（价格上下限）
    List,       // 逗号分隔列表（标签）
    Enumerated, // 枚举字符串（后端校验取值）
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Integer => write!(f, "integer"),
            FieldKind::List => write!(f, "list"),
            FieldKind::Enumerated => write!(f, "enumerated"),
        }
    }
}

// ==========================================
// 目标字段键 (Field Key)
// ==========================================
// 序列化格式: snake_case (与导入接口一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    // 身份
    FirstName,
    LastName,
    Phone,
    Email,
    #[serde(rename = "email_2")]
    Email2,
    WorkPhone,
    HomePhone,
    // 管道元数据
    Pipeline,
    Status,
    Stage,
    Priority,
    LeadRating,
    // 地址
    Address,
    City,
    ZipPostalCode,
    Neighborhood,
    // 买卖属性
    PropertyType,
    BuyingIn,
    Budget,
    PriceMin,
    PriceMax,
    Bedrooms,
    Bathrooms,
    Basement,
    ParkingType,
    HouseToSell,
    SellingIn,
    OwnsRents,
    MortgageType,
    // 自由文本
    Notes,
    SourceTags,
    LeadDescription,
}

/// 字段目录条目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: FieldKey,
    pub label: &'static str,
    pub kind: FieldKind,
}

/// 目标字段目录（顺序即前端下拉框顺序）
pub const TARGET_SCHEMA: &[FieldSpec] = &[
    FieldSpec { key: FieldKey::FirstName, label: "First Name", kind: FieldKind::Text },
    FieldSpec { key: FieldKey::LastName, label: "Last Name", kind: FieldKind::Text },
    FieldSpec { key: FieldKey::Phone, label: "Phone", kind: FieldKind::Text },
    FieldSpec { key: FieldKey::Email, label: "Email", kind: FieldKind::Text },
    FieldSpec { key: FieldKey::Email2, label: "Email 2", kind: FieldKind::Text },
    FieldSpec { key: FieldKey::WorkPhone, label: "Work Phone", kind: FieldKind::Text },
    FieldSpec { key: FieldKey::HomePhone, label: "Home Phone", kind: FieldKind::Text },
    FieldSpec { key: FieldKey::Pipeline, label: "Pipeline", kind: FieldKind::Enumerated },
    FieldSpec { key: FieldKey::Status, label: "Status", kind: FieldKind::Enumerated },
    FieldSpec { key: FieldKey::Stage, label: "Stage", kind: FieldKind::Enumerated },
    FieldSpec { key: FieldKey::Priority, label: "Priority", kind: FieldKind::Enumerated },
    FieldSpec { key: FieldKey::LeadRating, label: "Lead Rating", kind: FieldKind::Enumerated },
    FieldSpec { key: FieldKey::Address, label: "Address", kind: FieldKind::Text },
    FieldSpec { key: FieldKey::City, label: "City", kind: FieldKind::Text },
    FieldSpec { key: FieldKey::ZipPostalCode, label: "Zip / Postal Code", kind: FieldKind::Text },
    FieldSpec { key: FieldKey::Neighborhood, label: "Neighborhood", kind: FieldKind::Text },
    FieldSpec { key: FieldKey::PropertyType, label: "Property Type", kind: FieldKind::Enumerated },
    FieldSpec { key: FieldKey::BuyingIn, label: "Buying In", kind: FieldKind::Text },
    FieldSpec { key: FieldKey::Budget, label: "Budget", kind: FieldKind::Text },
    FieldSpec { key: FieldKey::PriceMin, label: "Price Min", kind: FieldKind::Integer },
    FieldSpec { key: FieldKey::PriceMax, label: "Price Max", kind: FieldKind::Integer },
    FieldSpec { key: FieldKey::Bedrooms, label: "Bedrooms", kind: FieldKind::Text },
    FieldSpec { key: FieldKey::Bathrooms, label: "Bathrooms", kind: FieldKind::Text },
    FieldSpec { key: FieldKey::Basement, label: "Basement", kind: FieldKind::Enumerated },
    FieldSpec { key: FieldKey::ParkingType, label: "Parking Type", kind: FieldKind::Enumerated },
    FieldSpec { key: FieldKey::HouseToSell, label: "House to Sell", kind: FieldKind::Enumerated },
    FieldSpec { key: FieldKey::SellingIn, label: "Selling In", kind: FieldKind::Text },
    FieldSpec { key: FieldKey::OwnsRents, label: "Owns / Rents", kind: FieldKind::Enumerated },
    FieldSpec { key: FieldKey::MortgageType, label: "Mortgage Type", kind: FieldKind::Enumerated },
    FieldSpec { key: FieldKey::Notes, label: "Notes", kind: FieldKind::Text },
    FieldSpec { key: FieldKey::SourceTags, label: "Source Tags", kind: FieldKind::List },
    FieldSpec { key: FieldKey::LeadDescription, label: "Lead Description", kind: FieldKind::Text },
];

// 编译期校验: 目录条目数与枚举一致,且第 i 条即判别值为 i 的字段
const _: () = {
    assert!(TARGET_SCHEMA.len() == FieldKey::COUNT);
    let mut i = 0;
    while i < TARGET_SCHEMA.len() {
        assert!(TARGET_SCHEMA[i].key as usize == i);
        i += 1;
    }
};

impl FieldKey {
    /// 目录中的全部字段键
    pub fn all() -> impl Iterator<Item = FieldKey> {
        TARGET_SCHEMA.iter().map(|spec| spec.key)
    }

    /// 字段键个数（LeadDescription 为最后一个变体）
    pub const COUNT: usize = FieldKey::LeadDescription as usize + 1;

    /// 目录条目,按枚举判别值索引
    pub fn spec(&self) -> &'static FieldSpec {
        &TARGET_SCHEMA[*self as usize]
    }

    pub fn label(&self) -> &'static str {
        self.spec().label
    }

    pub fn kind(&self) -> FieldKind {
        self.spec().kind
    }

    /// 接口使用的字段键字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::FirstName => "first_name",
            FieldKey::LastName => "last_name",
            FieldKey::Phone => "phone",
            FieldKey::Email => "email",
            FieldKey::Email2 => "email_2",
            FieldKey::WorkPhone => "work_phone",
            FieldKey::HomePhone => "home_phone",
            FieldKey::Pipeline => "pipeline",
            FieldKey::Status => "status",
            FieldKey::Stage => "stage",
            FieldKey::Priority => "priority",
            FieldKey::LeadRating => "lead_rating",
            FieldKey::Address => "address",
            FieldKey::City => "city",
            FieldKey::ZipPostalCode => "zip_postal_code",
            FieldKey::Neighborhood => "neighborhood",
            FieldKey::PropertyType => "property_type",
            FieldKey::BuyingIn => "buying_in",
            FieldKey::Budget => "budget",
            FieldKey::PriceMin => "price_min",
            FieldKey::PriceMax => "price_max",
            FieldKey::Bedrooms => "bedrooms",
            FieldKey::Bathrooms => "bathrooms",
            FieldKey::Basement => "basement",
            FieldKey::ParkingType => "parking_type",
            FieldKey::HouseToSell => "house_to_sell",
            FieldKey::SellingIn => "selling_in",
            FieldKey::OwnsRents => "owns_rents",
            FieldKey::MortgageType => "mortgage_type",
            FieldKey::Notes => "notes",
            FieldKey::SourceTags => "source_tags",
            FieldKey::LeadDescription => "lead_description",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        FieldKey::all()
            .find(|key| key.as_str() == wanted)
            .ok_or_else(|| format!("unknown lead field: {}", wanted))
    }
}
