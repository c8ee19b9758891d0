use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Named group of documents (one per entity type).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Collection {
    Items,
    Users,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Items => "items",
            Self::Users => "users",
        }
    }
}

impl core::fmt::Display for Collection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conjunction of top-level field equalities.
///
/// An empty filter matches every document in a collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    fields: Map<String, JsonValue>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_name(name: &str) -> Self {
        Self::all().eq("name", name)
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn matches(&self, document: &JsonValue) -> bool {
        self.fields
            .iter()
            .all(|(field, expected)| document.get(field) == Some(expected))
    }

    /// JSON object form, usable as a containment pattern.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(self.fields.clone())
    }
}

/// Document store operation error.
///
/// These are **infrastructure errors** as opposed to domain errors (validation,
/// missing records, stock limits).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected or failed the operation.
    #[error("store backend error: {0}")]
    Backend(String),

    /// A document could not be converted to or from its typed form.
    #[error("document codec error: {0}")]
    Codec(String),

    /// The store cannot be reached (closed pool, poisoned lock, ...).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Schemaless document store with find/save/delete primitives.
///
/// There are no transactions: every call is independent, and callers that
/// touch several documents must accept partial completion.
///
/// ## Semantics
///
/// - `find_one` returns any one matching document (no uniqueness is enforced)
/// - `find` returns matching documents in insertion order
/// - `save` upserts by `(collection, id)`
/// - `delete_one` removes at most one matching document and returns the count
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<JsonValue>, StoreError>;

    async fn find(&self, collection: Collection, filter: &Filter)
    -> Result<Vec<JsonValue>, StoreError>;

    async fn save(
        &self,
        collection: Collection,
        id: Uuid,
        document: JsonValue,
    ) -> Result<(), StoreError>;

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError>;
}

#[async_trait::async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<JsonValue>, StoreError> {
        (**self).find_one(collection, filter).await
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<JsonValue>, StoreError> {
        (**self).find(collection, filter).await
    }

    async fn save(
        &self,
        collection: Collection,
        id: Uuid,
        document: JsonValue,
    ) -> Result<(), StoreError> {
        (**self).save(collection, id, document).await
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError> {
        (**self).delete_one(collection, filter).await
    }
}
