use crate::domain::model::{Customer, DeclarationItem, DeclarationType, StoredDeclaration};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 申報類型目錄，每次規劃只讀取一次
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn declaration_types(&self) -> Result<Vec<DeclarationType>>;
}

/// 已持久化的申報，必須是本次滾動前的狀態
#[async_trait]
pub trait ExistingRecords: Send + Sync {
    async fn declarations(&self) -> Result<Vec<StoredDeclaration>>;
}

#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn customers(&self) -> Result<Vec<Customer>>;
}

/// 整批寫入，任何一筆失敗則整批不寫入
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    async fn create_batch(&self, items: &[DeclarationItem]) -> Result<Vec<StoredDeclaration>>;
}
