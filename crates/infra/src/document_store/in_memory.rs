use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value as JsonValue;
use uuid::Uuid;

use super::r#trait::{Collection, DocumentStore, Filter, StoreError};

/// In-memory document store.
///
/// Intended for tests/dev. Documents keep insertion order per collection.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<Collection, Vec<(Uuid, JsonValue)>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .map(|c| c.get(&collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("lock poisoned".to_string())
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<JsonValue>, StoreError> {
        let collections = self.collections.read().map_err(|_| Self::poisoned())?;
        Ok(collections.get(&collection).and_then(|docs| {
            docs.iter()
                .find(|(_, doc)| filter.matches(doc))
                .map(|(_, doc)| doc.clone())
        }))
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<JsonValue>, StoreError> {
        let collections = self.collections.read().map_err(|_| Self::poisoned())?;
        Ok(collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| filter.matches(doc))
                    .map(|(_, doc)| doc.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn save(
        &self,
        collection: Collection,
        id: Uuid,
        document: JsonValue,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().map_err(|_| Self::poisoned())?;
        let docs = collections.entry(collection).or_default();
        match docs.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, doc)) => *doc = document,
            None => docs.push((id, document)),
        }
        Ok(())
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().map_err(|_| Self::poisoned())?;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(0);
        };
        match docs.iter().position(|(_, doc)| filter.matches(doc)) {
            Some(idx) => {
                docs.remove(idx);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
