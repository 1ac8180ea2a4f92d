use crate::config::RolloverConfig;
use crate::core::classifier::ObligationClassifier;
use crate::core::period::{self, Period};
use crate::core::planner::{RolloverInput, RolloverPlan, RolloverPlanner};
use crate::core::prepare::{
    default_customer_selection, initial_type_dates, normalize_items, unique_customers,
    unique_types,
};
use crate::domain::model::{
    Customer, CustomerId, DeclarationType, ExistingDeclaration, RawDeclarationItem, SourceItem,
    StoredDeclaration, TypeId, DEFAULT_DUE_DAY,
};
use crate::domain::ports::{CatalogProvider, CustomerDirectory, ExistingRecords, PersistenceSink};
use crate::utils::error::{Result, RolloverError};
use crate::utils::validation::validate_payload;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// 一次滾動的參數；未指定的期間由資料推得
#[derive(Debug, Clone, Default)]
pub struct RolloverRequest {
    pub source_period: Option<String>,
    pub target_period: Option<String>,
    pub selection_overrides: Vec<(CustomerId, bool)>,
    pub due_date_overrides: BTreeMap<TypeId, NaiveDate>,
    pub dry_run: bool,
}

impl RolloverRequest {
    pub fn from_config(config: &RolloverConfig) -> Self {
        Self {
            source_period: config.planning.source_period.clone(),
            target_period: config.planning.target_period.clone(),
            selection_overrides: config.selection_overrides().into_iter().collect(),
            due_date_overrides: config.due_date_overrides(),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RolloverOutcome {
    pub source_period: String,
    pub target_period: String,
    pub plan: RolloverPlan,
    /// 實際寫入的紀錄；dry run 或沒有項目時為空
    pub created: Vec<StoredDeclaration>,
    pub persisted: bool,
}

pub struct RolloverEngine<S> {
    store: S,
    planner: RolloverPlanner,
    default_due_day: u32,
}

impl<S> RolloverEngine<S>
where
    S: CatalogProvider + ExistingRecords + CustomerDirectory + PersistenceSink,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            planner: RolloverPlanner::default(),
            default_due_day: DEFAULT_DUE_DAY,
        }
    }

    pub fn from_config(store: S, config: &RolloverConfig) -> Self {
        let planner = RolloverPlanner::new(ObligationClassifier::new(config.classifier.clone()))
            .with_default_due_day(config.planning.default_due_day)
            .with_customer_title_template(config.planning.customer_title_template.clone());
        Self {
            store,
            planner,
            default_due_day: config.planning.default_due_day,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn run(&self, request: &RolloverRequest) -> Result<RolloverOutcome> {
        tracing::info!("Starting declaration rollover");

        let catalog = self.store.declaration_types().await?;
        let customers = self.store.customers().await?;
        let declarations = self.store.declarations().await?;
        tracing::debug!(
            "Loaded {} declaration types, {} customers, {} declarations",
            catalog.len(),
            customers.len(),
            declarations.len()
        );

        let (source_period, target_period) = resolve_periods(request, &declarations)?;
        tracing::info!("🔁 Rolling {} -> {}", source_period, target_period);

        let source_items = collect_source_items(&declarations, &catalog, &customers, &source_period);
        tracing::info!("Found {} declarations in {}", source_items.len(), source_period);

        let mut selection = default_customer_selection(&unique_customers(&source_items), &customers);
        for (customer_id, included) in &request.selection_overrides {
            selection.set(customer_id.clone(), *included);
        }
        let selected_items: Vec<SourceItem> = source_items
            .iter()
            .filter(|item| selection.is_included(&item.customer_id))
            .cloned()
            .collect();

        // 沒有傳入項目：各類型一律以目標期間計算
        let mut per_type_dates = initial_type_dates(
            &unique_types(&source_items),
            &[],
            &target_period,
            &catalog,
            self.planner.classifier(),
            self.default_due_day,
        );
        per_type_dates.extend(request.due_date_overrides.iter().map(|(k, v)| (k.clone(), *v)));

        let existing: Vec<ExistingDeclaration> =
            declarations.iter().map(StoredDeclaration::as_existing).collect();

        let plan = self.planner.plan(&RolloverInput {
            selected_items: &selected_items,
            target_period: &target_period,
            per_type_dates: &per_type_dates,
            customers: &customers,
            customer_selection: &selection,
            declaration_types: &catalog,
            existing_declarations: &existing,
        });

        let missing = plan.items_missing_due_date().count();
        if missing > 0 {
            tracing::warn!("⚠️ {} declarations need a due date before they can be created", missing);
        }

        let mut outcome = RolloverOutcome {
            source_period,
            target_period,
            plan,
            created: Vec::new(),
            persisted: false,
        };

        if request.dry_run {
            tracing::info!("🔍 Dry run, nothing written");
            return Ok(outcome);
        }

        // 已存在的項目在規劃時一律帶入，寫入前先排除
        let to_create: Vec<_> = outcome
            .plan
            .items
            .iter()
            .filter(|item| {
                !existing.iter().any(|d| d.matches(&item.customer_id, &item.type_id, &item.period_name))
            })
            .cloned()
            .collect();

        if to_create.is_empty() {
            tracing::info!("Nothing new to create for {}", outcome.target_period);
            return Ok(outcome);
        }

        validate_payload(&to_create)?;
        outcome.created = self.store.create_batch(&to_create).await?;
        outcome.persisted = true;
        tracing::info!(
            "✅ Created {} declarations for {}",
            outcome.created.len(),
            outcome.target_period
        );

        Ok(outcome)
    }
}

/// 來源期間預設為資料中最新的期間，目標期間預設為其下一個月
fn resolve_periods(
    request: &RolloverRequest,
    declarations: &[StoredDeclaration],
) -> Result<(String, String)> {
    let source = match request.source_period.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => {
            let names: Vec<&str> = declarations.iter().map(|d| d.period_name.as_str()).collect();
            period::find_latest(&names)
        }
    };
    if !Period::parse(&source).is_valid() {
        return Err(RolloverError::MissingConfigError {
            field: "planning.source_period".to_string(),
        });
    }

    let target = match request.target_period.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => period::next_period_name(&source),
    };
    if !Period::parse(&target).is_valid() {
        return Err(RolloverError::InvalidConfigValueError {
            field: "planning.target_period".to_string(),
            value: target,
            reason: "Expected MM/YYYY or Qn/YYYY".to_string(),
        });
    }

    if period::compare(&target, &source) != Ordering::Greater {
        return Err(RolloverError::ConfigValidationError {
            field: "planning.target_period".to_string(),
            message: format!("Target period {} must come after source period {}", target, source),
        });
    }

    Ok((source, target))
}

fn collect_source_items(
    declarations: &[StoredDeclaration],
    catalog: &[DeclarationType],
    customers: &[Customer],
    source_period: &str,
) -> Vec<SourceItem> {
    let source = Period::parse(source_period);
    let raw: Vec<RawDeclarationItem> = declarations
        .iter()
        .filter(|d| Period::parse(&d.period_name) == source)
        .map(|d| RawDeclarationItem {
            customer_id: Some(d.customer_id.clone()),
            customer_title: customers
                .iter()
                .find(|c| c.id == d.customer_id)
                .map(|c| c.title.clone()),
            type_id: Some(d.type_id.clone()),
            type_name: catalog
                .iter()
                .find(|t| t.id == d.type_id)
                .map(|t| t.type_name.clone()),
            due_date: d.due_date,
            period_name: Some(d.period_name.clone()),
        })
        .collect();
    normalize_items(&raw, source_period)
}
