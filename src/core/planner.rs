use crate::core::classifier::{find_by_tokens, ObligationClass, ObligationClassifier};
use crate::core::due_date::{annual_due_date, due_date_for};
use crate::core::period::Period;
use crate::domain::model::{
    Customer, CustomerId, CustomerSelection, DeclarationItem, DeclarationType, DedupKey,
    ExistingDeclaration, SourceItem, TypeId, DEFAULT_DUE_DAY,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

pub const DEFAULT_CUSTOMER_TITLE_TEMPLATE: &str = "Customer #{id}";

/// 規劃一次滾動所需的全部輸入，皆由呼叫端提供
#[derive(Debug, Clone, Copy)]
pub struct RolloverInput<'a> {
    /// 使用者選擇帶到下一期的來源項目
    pub selected_items: &'a [SourceItem],
    pub target_period: &'a str,
    /// 各類型指定的到期日
    pub per_type_dates: &'a BTreeMap<TypeId, NaiveDate>,
    pub customers: &'a [Customer],
    pub customer_selection: &'a CustomerSelection,
    pub declaration_types: &'a [DeclarationType],
    pub existing_declarations: &'a [ExistingDeclaration],
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStats {
    pub carried: usize,
    pub dropped: usize,
    pub injected: usize,
    pub skipped_existing: usize,
    pub duplicates_removed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolloverPlan {
    pub items: Vec<DeclarationItem>,
    /// 輸入的各類型到期日，加上本次新注入類型算出的預設值
    pub resolved_due_dates_by_type: BTreeMap<TypeId, NaiveDate>,
    pub stats: PlanStats,
}

impl RolloverPlan {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 缺少到期日、需要人工補上的項目
    pub fn items_missing_due_date(&self) -> impl Iterator<Item = &DeclarationItem> {
        self.items.iter().filter(|item| item.due_date.is_none())
    }
}

/// 目標期間的季末/年末判斷
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TargetShape {
    quarter_end: bool,
    year_end: bool,
}

impl TargetShape {
    fn of(target: &Period) -> Self {
        Self {
            quarter_end: target.quarter_end().is_some()
                || matches!(target, Period::Quarterly { .. }),
            year_end: target.is_year_end(),
        }
    }

    fn includes(&self, class: ObligationClass) -> bool {
        match class {
            ObligationClass::Monthly => true,
            ObligationClass::Quarterly => self.quarter_end,
            ObligationClass::Annual => self.year_end,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RolloverPlanner {
    classifier: ObligationClassifier,
    customer_title_template: String,
    default_due_day: u32,
}

impl Default for RolloverPlanner {
    fn default() -> Self {
        Self::new(ObligationClassifier::default())
    }
}

impl RolloverPlanner {
    pub fn new(classifier: ObligationClassifier) -> Self {
        Self {
            classifier,
            customer_title_template: DEFAULT_CUSTOMER_TITLE_TEMPLATE.to_string(),
            default_due_day: DEFAULT_DUE_DAY,
        }
    }

    /// 類型沒有設定到期日時使用的日
    pub fn with_default_due_day(mut self, day: u32) -> Self {
        self.default_due_day = day;
        self
    }

    /// `{id}` 會被替換成客戶 id
    pub fn with_customer_title_template(mut self, template: impl Into<String>) -> Self {
        self.customer_title_template = template.into();
        self
    }

    pub fn classifier(&self) -> &ObligationClassifier {
        &self.classifier
    }

    pub fn plan(&self, input: &RolloverInput<'_>) -> RolloverPlan {
        let target = Period::parse(input.target_period);
        let shape = TargetShape::of(&target);
        let mut stats = PlanStats::default();
        let mut resolved = input.per_type_dates.clone();

        tracing::debug!(
            "Planning rollover to {} (quarter end: {}, year end: {})",
            input.target_period,
            shape.quarter_end,
            shape.year_end
        );

        // 1. 帶入選取的來源項目
        let mut items = self.carry_forward(input, shape, &mut stats);

        // 2. 季末/年末補上缺少的季報與年報
        if shape.quarter_end || shape.year_end {
            let injected = self.inject_missing(input, &target, shape, &items, &mut resolved, &mut stats);
            items.extend(injected);
        } else {
            tracing::debug!("Target {} is neither quarter nor year end, skipping injection", input.target_period);
        }

        // 3. 去重，保留第一次出現的項目
        let before = items.len();
        let items = deduplicate(items);
        stats.duplicates_removed = before - items.len();

        tracing::info!(
            "📋 Planned {} declarations for {} (carried: {}, dropped: {}, injected: {}, already existing: {}, duplicates removed: {})",
            items.len(),
            input.target_period,
            stats.carried,
            stats.dropped,
            stats.injected,
            stats.skipped_existing,
            stats.duplicates_removed
        );

        RolloverPlan {
            items,
            resolved_due_dates_by_type: resolved,
            stats,
        }
    }

    fn carry_forward(
        &self,
        input: &RolloverInput<'_>,
        shape: TargetShape,
        stats: &mut PlanStats,
    ) -> Vec<DeclarationItem> {
        let mut items = Vec::with_capacity(input.selected_items.len());

        for source in input.selected_items {
            let class = self.classifier.classify(&source.type_name);
            if !shape.includes(class) {
                tracing::debug!(
                    "Dropping {} declaration '{}' for customer {}",
                    class,
                    source.type_name,
                    source.customer_id
                );
                stats.dropped += 1;
                continue;
            }

            items.push(DeclarationItem {
                customer_id: source.customer_id.clone(),
                type_id: source.type_id.clone(),
                due_date: input.per_type_dates.get(&source.type_id).copied(),
                period_name: input.target_period.to_string(),
                customer_title: source.customer_title.clone(),
            });
            stats.carried += 1;
        }

        items
    }

    fn inject_missing(
        &self,
        input: &RolloverInput<'_>,
        target: &Period,
        shape: TargetShape,
        carried: &[DeclarationItem],
        resolved: &mut BTreeMap<TypeId, NaiveDate>,
        stats: &mut PlanStats,
    ) -> Vec<DeclarationItem> {
        let tokens = self
            .classifier
            .injection_tokens(shape.quarter_end, shape.year_end);
        let candidate_types = find_by_tokens(input.declaration_types, &tokens);
        if candidate_types.is_empty() {
            tracing::debug!("No catalog types match injection tokens {:?}", tokens);
            return Vec::new();
        }

        let existing: HashSet<(&str, &str, &str)> = input
            .existing_declarations
            .iter()
            .map(|d| (d.customer_id.as_str(), d.type_id.as_str(), d.period_name.as_str()))
            .collect();
        let mut in_payload: HashSet<DedupKey> = carried.iter().map(DeclarationItem::dedup_key).collect();
        let mut injected = Vec::new();

        for customer_id in input.customer_selection.included() {
            let title = self.customer_title(customer_id, input.customers);

            for decl_type in &candidate_types {
                if existing.contains(&(
                    customer_id.as_str(),
                    decl_type.id.as_str(),
                    input.target_period,
                )) {
                    stats.skipped_existing += 1;
                    continue;
                }

                let key = (
                    customer_id.clone(),
                    decl_type.id.clone(),
                    input.target_period.to_string(),
                );
                if in_payload.contains(&key) {
                    continue;
                }

                let due_date = match self.classifier.classify(&decl_type.type_name) {
                    ObligationClass::Annual => annual_due_date(target),
                    _ => None,
                }
                .or_else(|| due_date_for(target, decl_type.due_day_or(self.default_due_day)));

                if let Some(date) = due_date {
                    resolved.entry(decl_type.id.clone()).or_insert(date);
                }

                in_payload.insert(key);
                injected.push(DeclarationItem {
                    customer_id: customer_id.clone(),
                    type_id: decl_type.id.clone(),
                    due_date,
                    period_name: input.target_period.to_string(),
                    customer_title: title.clone(),
                });
                stats.injected += 1;
            }
        }

        injected
    }

    fn customer_title(&self, customer_id: &CustomerId, customers: &[Customer]) -> String {
        customers
            .iter()
            .find(|c| &c.id == customer_id)
            .map(|c| c.title.trim())
            .filter(|title| !title.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                self.customer_title_template
                    .replace("{id}", customer_id.as_str())
            })
    }
}

/// 依 (customerId, typeId, periodName) 去重，保留先出現者與其欄位值
pub fn deduplicate(items: Vec<DeclarationItem>) -> Vec<DeclarationItem> {
    let mut seen: HashSet<DedupKey> = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.dedup_key()))
        .collect()
}
