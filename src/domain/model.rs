use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// 資料來源的 id 可能是數字也可能是字串
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s.trim().to_string(),
        }
    }
}

/// 純數字 id 依數值排序，其餘依字串排序並排在數字之後
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(from = "RawId", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<RawId> for $name {
            fn from(raw: RawId) -> Self {
                Self(String::from(raw))
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                compare_ids(&self.0, &other.0)
            }
        }
    };
}

string_id!(CustomerId);
string_id!(TypeId);

pub const DEFAULT_DUE_DAY: u32 = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationType {
    pub id: TypeId,
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_day: Option<u32>,
}

impl DeclarationType {
    /// 類型未設定到期日時使用 `fallback`
    pub fn due_day_or(&self, fallback: u32) -> u32 {
        self.default_day.unwrap_or(fallback)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub title: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// 去重鍵：(customerId, typeId, periodName)
pub type DedupKey = (CustomerId, TypeId, String);

/// 下一期要建立的申報項目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationItem {
    pub customer_id: CustomerId,
    pub type_id: TypeId,
    #[serde(default, with = "crate::utils::date_format")]
    pub due_date: Option<NaiveDate>,
    pub period_name: String,
    pub customer_title: String,
}

impl DeclarationItem {
    pub fn dedup_key(&self) -> DedupKey {
        (
            self.customer_id.clone(),
            self.type_id.clone(),
            self.period_name.clone(),
        )
    }
}

/// 來源期間的申報，已補上顯示名稱
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceItem {
    pub customer_id: CustomerId,
    pub customer_title: String,
    pub type_id: TypeId,
    pub type_name: String,
    #[serde(default, with = "crate::utils::date_format")]
    pub due_date: Option<NaiveDate>,
    pub period_name: String,
}

/// 尚未整理的來源資料，欄位皆可能缺漏
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDeclarationItem {
    pub customer_id: Option<CustomerId>,
    pub customer_title: Option<String>,
    pub type_id: Option<TypeId>,
    pub type_name: Option<String>,
    #[serde(default, with = "crate::utils::date_format")]
    pub due_date: Option<NaiveDate>,
    pub period_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingDeclaration {
    pub customer_id: CustomerId,
    pub type_id: TypeId,
    pub period_name: String,
}

impl ExistingDeclaration {
    pub fn matches(&self, customer_id: &CustomerId, type_id: &TypeId, period_name: &str) -> bool {
        &self.customer_id == customer_id && &self.type_id == type_id && self.period_name == period_name
    }
}

/// 持久化後的申報紀錄
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDeclaration {
    pub id: u64,
    pub customer_id: CustomerId,
    pub type_id: TypeId,
    pub period_name: String,
    #[serde(default, with = "crate::utils::date_format")]
    pub due_date: Option<NaiveDate>,
    #[serde(default = "default_status")]
    pub status: String,
}

pub const DEFAULT_STATUS: &str = "Pending";

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

impl StoredDeclaration {
    pub fn as_existing(&self) -> ExistingDeclaration {
        ExistingDeclaration {
            customer_id: self.customer_id.clone(),
            type_id: self.type_id.clone(),
            period_name: self.period_name.clone(),
        }
    }
}

/// 哪些客戶要加入新注入的季報/年報
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSelection(BTreeMap<CustomerId, bool>);

impl CustomerSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, customer_id: CustomerId, included: bool) {
        self.0.insert(customer_id, included);
    }

    pub fn is_included(&self, customer_id: &CustomerId) -> bool {
        self.0.get(customer_id).copied().unwrap_or(false)
    }

    /// 已勾選的客戶，依 id 排序
    pub fn included(&self) -> impl Iterator<Item = &CustomerId> {
        self.0
            .iter()
            .filter_map(|(id, included)| (*included).then_some(id))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(CustomerId, bool)> for CustomerSelection {
    fn from_iter<I: IntoIterator<Item = (CustomerId, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_accept_numbers_and_strings() {
        let from_number: TypeId = serde_json::from_str("7").unwrap();
        let from_text: TypeId = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(from_number, from_text);
        assert_eq!(serde_json::to_string(&from_number).unwrap(), "\"7\"");
    }

    #[test]
    fn test_numeric_ids_sort_numerically() {
        let mut ids = vec![CustomerId::from(10), CustomerId::from(2), CustomerId::from("abc")];
        ids.sort();
        assert_eq!(ids, vec![CustomerId::from(2), CustomerId::from(10), CustomerId::from("abc")]);
    }

    #[test]
    fn test_declaration_type_default_day() {
        let json = r#"{"id": 3, "typeName": "KDV"}"#;
        let ty: DeclarationType = serde_json::from_str(json).unwrap();
        assert_eq!(ty.default_day, None);
        assert_eq!(ty.due_day_or(DEFAULT_DUE_DAY), 15);
        assert_eq!(ty.id.as_str(), "3");
    }

    #[test]
    fn test_item_serializes_empty_due_date() {
        let item = DeclarationItem {
            customer_id: CustomerId::from(1),
            type_id: TypeId::from(2),
            due_date: None,
            period_name: "07/2025".to_string(),
            customer_title: "Acme".to_string(),
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["dueDate"], "");
        assert_eq!(value["customerId"], "1");
        assert_eq!(value["periodName"], "07/2025");
    }

    #[test]
    fn test_selection_lists_only_included() {
        let selection: CustomerSelection = vec![
            (CustomerId::from(3), true),
            (CustomerId::from(1), false),
            (CustomerId::from(2), true),
        ]
        .into_iter()
        .collect();
        let included: Vec<_> = selection.included().map(|id| id.as_str()).collect();
        assert_eq!(included, vec!["2", "3"]);
        assert!(!selection.is_included(&CustomerId::from(99)));
    }
}
