//! 滾動前的來源資料整理：正規化項目、預設客戶勾選與各類型預設到期日。

use crate::core::classifier::{ObligationClass, ObligationClassifier};
use crate::core::due_date::{annual_due_date, due_date_for};
use crate::core::period::Period;
use crate::domain::model::{
    Customer, CustomerId, CustomerSelection, DeclarationType, DedupKey, RawDeclarationItem,
    SourceItem, TypeId,
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRef {
    pub customer_id: CustomerId,
    pub customer_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub type_id: TypeId,
    pub type_name: String,
}

/// 缺少客戶、類型或期間的項目直接略過；同一組 (客戶, 類型, 期間) 只保留第一筆。
pub fn normalize_items(raw: &[RawDeclarationItem], fallback_period: &str) -> Vec<SourceItem> {
    let mut seen: HashSet<DedupKey> = HashSet::new();
    let mut items = Vec::with_capacity(raw.len());

    for entry in raw {
        let customer_id = match entry.customer_id.as_ref().filter(|id| !id.is_empty()) {
            Some(id) => id.clone(),
            None => continue,
        };
        let type_id = match entry.type_id.as_ref().filter(|id| !id.is_empty()) {
            Some(id) => id.clone(),
            None => continue,
        };
        let period_name = entry
            .period_name
            .as_deref()
            .unwrap_or(fallback_period)
            .to_string();
        if period_name.is_empty() {
            continue;
        }

        if !seen.insert((customer_id.clone(), type_id.clone(), period_name.clone())) {
            continue;
        }

        items.push(SourceItem {
            customer_title: entry
                .customer_title
                .clone()
                .unwrap_or_else(|| format!("Customer #{}", customer_id)),
            type_name: entry
                .type_name
                .clone()
                .unwrap_or_else(|| format!("Type #{}", type_id)),
            customer_id,
            type_id,
            due_date: entry.due_date,
            period_name,
        });
    }

    items
}

/// 依客戶名稱排序的不重複客戶
pub fn unique_customers(items: &[SourceItem]) -> Vec<CustomerRef> {
    let mut seen = HashSet::new();
    let mut customers: Vec<CustomerRef> = items
        .iter()
        .filter(|item| seen.insert(item.customer_id.clone()))
        .map(|item| CustomerRef {
            customer_id: item.customer_id.clone(),
            customer_title: item.customer_title.clone(),
        })
        .collect();
    customers.sort_by(|a, b| a.customer_title.cmp(&b.customer_title));
    customers
}

/// 依類型名稱排序的不重複類型
pub fn unique_types(items: &[SourceItem]) -> Vec<TypeRef> {
    let mut seen = HashSet::new();
    let mut types: Vec<TypeRef> = items
        .iter()
        .filter(|item| seen.insert(item.type_id.clone()))
        .map(|item| TypeRef {
            type_id: item.type_id.clone(),
            type_name: item.type_name.clone(),
        })
        .collect();
    types.sort_by(|a, b| a.type_name.cmp(&b.type_name));
    types
}

/// 客戶目錄中有的客戶依是否啟用決定，查不到的客戶預設勾選
pub fn default_customer_selection(
    customers: &[CustomerRef],
    directory: &[Customer],
) -> CustomerSelection {
    customers
        .iter()
        .map(|cust| {
            let included = directory
                .iter()
                .find(|known| known.id == cust.customer_id)
                .map(|known| known.is_active)
                .unwrap_or(true);
            (cust.customer_id.clone(), included)
        })
        .collect()
}

/// 各類型的預設到期日。
///
/// 以該類型第一筆項目的期間計算（沒有項目則用 `fallback_period`），
/// 季報類型在季末月份改用對應的季計算，年報一律為次年 3/31。
pub fn initial_type_dates(
    types: &[TypeRef],
    items: &[SourceItem],
    fallback_period: &str,
    catalog: &[DeclarationType],
    classifier: &ObligationClassifier,
    fallback_day: u32,
) -> BTreeMap<TypeId, NaiveDate> {
    let mut dates = BTreeMap::new();

    for ty in types {
        let period_text = items
            .iter()
            .find(|item| item.type_id == ty.type_id)
            .map(|item| item.period_name.as_str())
            .unwrap_or(fallback_period);
        let default_day = catalog
            .iter()
            .find(|known| known.id == ty.type_id)
            .and_then(|known| known.default_day)
            .unwrap_or(fallback_day);

        let period = Period::parse(period_text);
        let due_date = match classifier.classify(&ty.type_name) {
            // 年報固定於次年 3/31，與注入時相同
            ObligationClass::Annual => annual_due_date(&period),
            ObligationClass::Quarterly => {
                due_date_for(&period.quarter_end().unwrap_or(period), default_day)
            }
            ObligationClass::Monthly => due_date_for(&period, default_day),
        };

        if let Some(date) = due_date {
            dates.insert(ty.type_id.clone(), date);
        }
    }

    dates
}
