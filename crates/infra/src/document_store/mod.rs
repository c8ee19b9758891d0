//! Document persistence boundary.
//!
//! Defines a schemaless find/save/delete abstraction with an in-memory and a
//! Postgres implementation, plus typed helpers for stored entities.

pub mod document;
pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use document::Document;
pub use in_memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use r#trait::{Collection, DocumentStore, Filter, StoreError};

use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::config::{StoreBackend, StoreConfig};

/// Store selected at startup from configuration.
///
/// The process opens it once, hands it to the operations layer and closes it
/// on exit.
#[derive(Debug)]
pub enum AnyStore {
    Memory(InMemoryDocumentStore),
    Postgres(PostgresDocumentStore),
}

impl AnyStore {
    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        match config.backend {
            StoreBackend::Memory => {
                tracing::info!("using in-memory document store");
                Ok(Self::Memory(InMemoryDocumentStore::new()))
            }
            StoreBackend::Postgres => {
                let url = config
                    .postgres_url()
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
                let store = PostgresDocumentStore::connect(url, config.max_connections).await?;
                store.ensure_schema().await?;
                tracing::info!("connected to postgres document store");
                Ok(Self::Postgres(store))
            }
        }
    }

    pub async fn close(&self) {
        if let Self::Postgres(store) = self {
            store.close().await;
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for AnyStore {
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<JsonValue>, StoreError> {
        match self {
            Self::Memory(store) => store.find_one(collection, filter).await,
            Self::Postgres(store) => store.find_one(collection, filter).await,
        }
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<JsonValue>, StoreError> {
        match self {
            Self::Memory(store) => store.find(collection, filter).await,
            Self::Postgres(store) => store.find(collection, filter).await,
        }
    }

    async fn save(
        &self,
        collection: Collection,
        id: Uuid,
        document: JsonValue,
    ) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.save(collection, id, document).await,
            Self::Postgres(store) => store.save(collection, id, document).await,
        }
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError> {
        match self {
            Self::Memory(store) => store.delete_one(collection, filter).await,
            Self::Postgres(store) => store.delete_one(collection, filter).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_opens_without_a_url() {
        let store = AnyStore::open(&StoreConfig::default()).await.unwrap();
        assert!(matches!(store, AnyStore::Memory(_)));
        assert!(store.find(Collection::Items, &Filter::all()).await.unwrap().is_empty());
        store.close().await;
    }

    #[tokio::test]
    async fn postgres_backend_requires_a_url() {
        let config = StoreConfig {
            backend: StoreBackend::Postgres,
            ..StoreConfig::default()
        };
        let err = AnyStore::open(&config).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(msg) if msg.contains("DATABASE_URL")));
    }
}
