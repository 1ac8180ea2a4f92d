use crate::domain::model::{
    Customer, DeclarationItem, DeclarationType, StoredDeclaration, DEFAULT_STATUS,
};
use crate::domain::ports::{CatalogProvider, CustomerDirectory, ExistingRecords, PersistenceSink};
use crate::utils::error::{Result, RolloverError};
use crate::utils::validation::validate_payload;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// 檔案內容：申報類型目錄、客戶與已建立的申報
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDocument {
    #[serde(default)]
    pub declaration_types: Vec<DeclarationType>,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub declarations: Vec<StoredDeclaration>,
}

/// 以單一 JSON 檔案保存的申報資料
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<StoreDocument> {
        let data = tokio::fs::read(&self.path).await?;
        let document = serde_json::from_slice(&data)?;
        Ok(document)
    }

    /// 先寫暫存檔再改名，避免寫到一半留下損壞的檔案
    pub async fn save(&self, document: &StoreDocument) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_vec_pretty(document)?;
        let tmp_path = self.path.with_extension("json.tmp");
        if let Err(e) = write_then_rename(&tmp_path, &self.path, &data).await {
            // 失敗時不留下暫存檔
            if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
                tracing::debug!("Could not remove {}: {}", tmp_path.display(), cleanup);
            }
            return Err(e.into());
        }
        Ok(())
    }
}

async fn write_then_rename(tmp_path: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(tmp_path, data).await?;
    tokio::fs::rename(tmp_path, path).await
}

#[async_trait]
impl CatalogProvider for JsonFileStore {
    async fn declaration_types(&self) -> Result<Vec<DeclarationType>> {
        Ok(self.load().await?.declaration_types)
    }
}

#[async_trait]
impl ExistingRecords for JsonFileStore {
    async fn declarations(&self) -> Result<Vec<StoredDeclaration>> {
        Ok(self.load().await?.declarations)
    }
}

#[async_trait]
impl CustomerDirectory for JsonFileStore {
    async fn customers(&self) -> Result<Vec<Customer>> {
        Ok(self.load().await?.customers)
    }
}

#[async_trait]
impl PersistenceSink for JsonFileStore {
    async fn create_batch(&self, items: &[DeclarationItem]) -> Result<Vec<StoredDeclaration>> {
        if items.is_empty() {
            return Err(RolloverError::PersistenceError {
                message: "At least one declaration item is required".to_string(),
            });
        }
        validate_payload(items)?;

        let _guard = self.write_lock.lock().await;
        let mut document = self.load().await?;

        let stored: HashSet<(&str, &str, &str)> = document
            .declarations
            .iter()
            .map(|d| (d.customer_id.as_str(), d.type_id.as_str(), d.period_name.as_str()))
            .collect();
        if let Some(dup) = items.iter().find(|item| {
            stored.contains(&(
                item.customer_id.as_str(),
                item.type_id.as_str(),
                item.period_name.as_str(),
            ))
        }) {
            return Err(RolloverError::DuplicateDeclaration {
                customer_id: dup.customer_id.to_string(),
                type_id: dup.type_id.to_string(),
                period_name: dup.period_name.clone(),
            });
        }

        let mut next_id = document.declarations.iter().map(|d| d.id).max().unwrap_or(0) + 1;
        let mut created = Vec::with_capacity(items.len());
        for item in items {
            created.push(StoredDeclaration {
                id: next_id,
                customer_id: item.customer_id.clone(),
                type_id: item.type_id.clone(),
                period_name: item.period_name.clone(),
                due_date: item.due_date,
                status: DEFAULT_STATUS.to_string(),
            });
            next_id += 1;
        }

        document.declarations.extend(created.iter().cloned());
        self.save(&document).await?;

        tracing::debug!("Stored {} declarations in {}", created.len(), self.path.display());
        Ok(created)
    }
}
