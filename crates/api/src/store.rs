//! Signature persistence seam.
//!
//! Handlers talk to a [`SignatureStore`]; the binary picks Postgres when
//! `DATABASE_URL` is set and falls back to [`MemorySignatureStore`]
//! otherwise.

use std::collections::HashMap;

use async_trait::async_trait;
use sigcraft_core::signature::Signature;
use sigcraft_core::types::{DbId, SignatureId};
use sigcraft_db::repositories::SignatureRepo;
use sigcraft_db::DbPool;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait SignatureStore: Send + Sync {
    async fn get(&self, id: SignatureId) -> Result<Option<Signature>, StoreError>;

    /// Most recently updated first. `None` lists every owner.
    async fn list(&self, owner_id: Option<DbId>) -> Result<Vec<Signature>, StoreError>;

    async fn create(&self, signature: Signature) -> Result<Signature, StoreError>;

    /// Replace a stored record. `None` when it does not exist.
    async fn update(&self, signature: Signature) -> Result<Option<Signature>, StoreError>;

    async fn delete(&self, id: SignatureId) -> Result<bool, StoreError>;

    async fn health(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Postgres
// ---------------------------------------------------------------------------

pub struct PgSignatureStore {
    pool: DbPool,
}

impl PgSignatureStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SignatureStore for PgSignatureStore {
    async fn get(&self, id: SignatureId) -> Result<Option<Signature>, StoreError> {
        Ok(SignatureRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list(&self, owner_id: Option<DbId>) -> Result<Vec<Signature>, StoreError> {
        Ok(SignatureRepo::list_by_owner(&self.pool, owner_id).await?)
    }

    async fn create(&self, signature: Signature) -> Result<Signature, StoreError> {
        Ok(SignatureRepo::create(&self.pool, &signature).await?)
    }

    async fn update(&self, signature: Signature) -> Result<Option<Signature>, StoreError> {
        Ok(SignatureRepo::update(&self.pool, &signature).await?)
    }

    async fn delete(&self, id: SignatureId) -> Result<bool, StoreError> {
        Ok(SignatureRepo::delete(&self.pool, id).await?)
    }

    async fn health(&self) -> bool {
        sigcraft_db::health_check(&self.pool).await.is_ok()
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemorySignatureStore {
    records: RwLock<HashMap<SignatureId, Signature>>,
}

impl MemorySignatureStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SignatureStore for MemorySignatureStore {
    async fn get(&self, id: SignatureId) -> Result<Option<Signature>, StoreError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn list(&self, owner_id: Option<DbId>) -> Result<Vec<Signature>, StoreError> {
        let records = self.records.read().await;
        let mut list: Vec<Signature> = records
            .values()
            .filter(|s| owner_id.is_none() || s.owner_id == owner_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        Ok(list)
    }

    async fn create(&self, signature: Signature) -> Result<Signature, StoreError> {
        self.records
            .write()
            .await
            .insert(signature.id, signature.clone());
        Ok(signature)
    }

    async fn update(&self, signature: Signature) -> Result<Option<Signature>, StoreError> {
        let mut records = self.records.write().await;
        match records.get_mut(&signature.id) {
            Some(existing) => {
                *existing = signature.clone();
                Ok(Some(signature))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: SignatureId) -> Result<bool, StoreError> {
        Ok(self.records.write().await.remove(&id).is_some())
    }

    async fn health(&self) -> bool {
        true
    }
}
