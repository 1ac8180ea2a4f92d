use chrono::NaiveDate;
use decl_rollover::adapters::StoreDocument;
use decl_rollover::core::ExistingRecords;
use decl_rollover::{
    CustomerId, JsonFileStore, RolloverConfig, RolloverEngine, RolloverError, RolloverRequest,
    TypeId,
};
use std::collections::HashSet;
use tempfile::TempDir;

const SEED: &str = r#"{
  "declarationTypes": [
    {"id": 1, "typeName": "TVSH", "defaultDay": 20},
    {"id": 2, "typeName": "QL"},
    {"id": 3, "typeName": "CD"},
    {"id": 4, "typeName": "IS"},
    {"id": 5, "typeName": "PD"}
  ],
  "customers": [
    {"id": 1, "title": "Alfa Shpk", "isActive": true},
    {"id": 2, "title": "Beta Sh.a", "isActive": false}
  ],
  "declarations": [
    {"id": 1, "customerId": 1, "typeId": 1, "periodName": "10/2025", "dueDate": "2025-11-20", "status": "Completed"},
    {"id": 2, "customerId": 1, "typeId": 1, "periodName": "11/2025", "dueDate": "2025-12-20"},
    {"id": 3, "customerId": 2, "typeId": 1, "periodName": "11/2025", "dueDate": "2025-12-20"}
  ]
}"#;

async fn seeded_store(dir: &TempDir) -> JsonFileStore {
    let path = dir.path().join("declarations.json");
    tokio::fs::write(&path, SEED).await.unwrap();
    JsonFileStore::new(path)
}

fn keys(store_doc: &StoreDocument, period: &str) -> HashSet<(String, String)> {
    store_doc
        .declarations
        .iter()
        .filter(|d| d.period_name == period)
        .map(|d| (d.customer_id.to_string(), d.type_id.to_string()))
        .collect()
}

#[tokio::test]
async fn test_year_end_rollover_persists_batch() {
    let dir = TempDir::new().unwrap();
    let engine = RolloverEngine::new(seeded_store(&dir).await);

    let outcome = engine.run(&RolloverRequest::default()).await.unwrap();

    assert_eq!(outcome.source_period, "11/2025");
    assert_eq!(outcome.target_period, "12/2025");
    assert!(outcome.persisted);

    let document = engine.store().load().await.unwrap();
    let created = keys(&document, "12/2025");
    // 客戶 2 未啟用：不帶入也不注入
    let expected: HashSet<(String, String)> = ["1", "2", "3", "4", "5"]
        .iter()
        .map(|t| ("1".to_string(), t.to_string()))
        .collect();
    assert_eq!(created, expected);
    assert_eq!(outcome.created.len(), 5);

    let tvsh = document
        .declarations
        .iter()
        .find(|d| d.period_name == "12/2025" && d.type_id == TypeId::from(1))
        .unwrap();
    assert_eq!(tvsh.due_date, NaiveDate::from_ymd_opt(2026, 1, 20));
    assert_eq!(tvsh.status, "Pending");

    let cd = document
        .declarations
        .iter()
        .find(|d| d.period_name == "12/2025" && d.type_id == TypeId::from(3))
        .unwrap();
    assert_eq!(cd.due_date, NaiveDate::from_ymd_opt(2026, 3, 31));
}

#[tokio::test]
async fn test_second_run_creates_nothing() {
    let dir = TempDir::new().unwrap();
    let engine = RolloverEngine::new(seeded_store(&dir).await);
    let request = RolloverRequest {
        source_period: Some("11/2025".to_string()),
        ..RolloverRequest::default()
    };

    engine.run(&request).await.unwrap();
    let before = engine.store().declarations().await.unwrap().len();

    let outcome = engine.run(&request).await.unwrap();
    assert!(!outcome.persisted);
    assert_eq!(outcome.plan.stats.injected, 0);
    assert_eq!(engine.store().declarations().await.unwrap().len(), before);
}

#[tokio::test]
async fn test_dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let engine = RolloverEngine::new(seeded_store(&dir).await);
    let request = RolloverRequest {
        dry_run: true,
        ..RolloverRequest::default()
    };

    let outcome = engine.run(&request).await.unwrap();
    assert!(!outcome.persisted);
    assert!(!outcome.plan.is_empty());
    assert_eq!(engine.store().declarations().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_selection_override_includes_inactive_customer() {
    let dir = TempDir::new().unwrap();
    let engine = RolloverEngine::new(seeded_store(&dir).await);
    let request = RolloverRequest {
        selection_overrides: vec![(CustomerId::from(2), true)],
        dry_run: true,
        ..RolloverRequest::default()
    };

    let outcome = engine.run(&request).await.unwrap();
    assert!(outcome
        .plan
        .items
        .iter()
        .any(|i| i.customer_id == CustomerId::from(2) && i.type_id == TypeId::from(5)));
}

#[tokio::test]
async fn test_mid_quarter_target_carries_monthly_only() {
    let dir = TempDir::new().unwrap();
    let engine = RolloverEngine::new(seeded_store(&dir).await);
    let request = RolloverRequest {
        source_period: Some("10/2025".to_string()),
        target_period: Some("11/2025".to_string()),
        ..RolloverRequest::default()
    };

    // 11/2025 已有客戶 1 的 TVSH，沒有新項目
    let outcome = engine.run(&request).await.unwrap();
    assert_eq!(outcome.plan.items.len(), 1);
    assert_eq!(outcome.plan.stats.injected, 0);
    assert!(!outcome.persisted);
}

#[tokio::test]
async fn test_missing_due_date_aborts_whole_batch() {
    let dir = TempDir::new().unwrap();
    let config = RolloverConfig::from_toml_str(&format!(
        "[store]\npath = \"{}\"\n\n[planning]\ndefault_due_day = 31\n",
        dir.path().join("declarations.json").display()
    ))
    .unwrap();
    // 4 月沒有 31 日：Q1 季末注入的 QL/IS 算不出到期日
    let engine = RolloverEngine::from_config(seeded_store(&dir).await, &config);
    let request = RolloverRequest {
        source_period: Some("11/2025".to_string()),
        target_period: Some("03/2026".to_string()),
        ..RolloverRequest::default()
    };

    let result = engine.run(&request).await;
    assert!(matches!(result, Err(RolloverError::InvalidPayload { .. })));
    assert_eq!(engine.store().declarations().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_backwards_target_is_rejected() {
    let dir = TempDir::new().unwrap();
    let engine = RolloverEngine::new(seeded_store(&dir).await);
    let request = RolloverRequest {
        source_period: Some("11/2025".to_string()),
        target_period: Some("11/2025".to_string()),
        ..RolloverRequest::default()
    };

    let err = engine.run(&request).await.unwrap_err();
    assert!(matches!(err, RolloverError::ConfigValidationError { .. }));
}

#[tokio::test]
async fn test_carried_and_injected_annual_share_due_date() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("declarations.json");
    tokio::fs::write(
        &path,
        r#"{
          "declarationTypes": [
            {"id": 1, "typeName": "TVSH", "defaultDay": 20},
            {"id": 3, "typeName": "CD"}
          ],
          "customers": [
            {"id": 1, "title": "Alfa Shpk", "isActive": true},
            {"id": 2, "title": "Beta Sh.a", "isActive": true}
          ],
          "declarations": [
            {"id": 1, "customerId": 1, "typeId": 3, "periodName": "11/2025", "dueDate": "2025-03-31"},
            {"id": 2, "customerId": 2, "typeId": 1, "periodName": "11/2025", "dueDate": "2025-12-20"}
          ]
        }"#,
    )
    .await
    .unwrap();
    let engine = RolloverEngine::new(JsonFileStore::new(path));
    let request = RolloverRequest {
        dry_run: true,
        ..RolloverRequest::default()
    };

    let outcome = engine.run(&request).await.unwrap();

    // 客戶 1 的 CD 是帶入的，客戶 2 的 CD 是注入的
    let annual_due: Vec<_> = outcome
        .plan
        .items
        .iter()
        .filter(|i| i.type_id == TypeId::from(3))
        .map(|i| (i.customer_id.to_string(), i.due_date))
        .collect();
    let expected = NaiveDate::from_ymd_opt(2026, 3, 31);
    assert_eq!(
        annual_due,
        vec![("1".to_string(), expected), ("2".to_string(), expected)]
    );
    assert_eq!(
        outcome.plan.resolved_due_dates_by_type.get(&TypeId::from(3)).copied(),
        expected
    );
}
