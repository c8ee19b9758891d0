//! Typed access on top of the schemaless store.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use stockroom_core::Entity;
use stockroom_inventory::{Item, User};

use super::r#trait::{Collection, DocumentStore, Filter, StoreError};

/// An entity that is stored as one JSON document.
pub trait Document: Entity + Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;
}

impl Document for Item {
    const COLLECTION: Collection = Collection::Items;
}

impl Document for User {
    const COLLECTION: Collection = Collection::Users;
}

/// Serialize `doc`, refusing documents that would not decode again
/// (non-finite numbers serialize as `null`).
pub fn encode<T: Document>(doc: &T) -> Result<JsonValue, StoreError> {
    let value = serde_json::to_value(doc).map_err(|e| {
        StoreError::Codec(format!("failed to encode {} document: {e}", T::COLLECTION))
    })?;
    serde_json::from_value::<T>(value.clone()).map_err(|e| {
        StoreError::Codec(format!(
            "refusing to write unreadable {} document: {e}",
            T::COLLECTION
        ))
    })?;
    Ok(value)
}

pub fn decode<T: Document>(value: JsonValue) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| {
        StoreError::Codec(format!("failed to decode {} document: {e}", T::COLLECTION))
    })
}

pub async fn load_one<T, S>(store: &S, filter: &Filter) -> Result<Option<T>, StoreError>
where
    T: Document,
    S: DocumentStore + ?Sized,
{
    store
        .find_one(T::COLLECTION, filter)
        .await?
        .map(decode)
        .transpose()
}

pub async fn load_all<T, S>(store: &S, filter: &Filter) -> Result<Vec<T>, StoreError>
where
    T: Document,
    S: DocumentStore + ?Sized,
{
    store
        .find(T::COLLECTION, filter)
        .await?
        .into_iter()
        .map(decode)
        .collect()
}

pub async fn store_one<T, S>(store: &S, doc: &T) -> Result<(), StoreError>
where
    T: Document,
    S: DocumentStore + ?Sized,
{
    let id: uuid::Uuid = (*doc.id()).into();
    store.save(T::COLLECTION, id, encode(doc)?).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_store::InMemoryDocumentStore;

    #[tokio::test]
    async fn typed_roundtrip_through_store() {
        let store = InMemoryDocumentStore::new();
        let drill = Item::tool("Drill", 1, 80.0, 5, 60).unwrap();
        store_one(&store, &drill).await.unwrap();

        let loaded: Item = load_one(&store, &Filter::by_name("Drill")).await.unwrap().unwrap();
        assert_eq!(loaded, drill);

        let users: Vec<User> = load_all(&store, &Filter::all()).await.unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn lossy_documents_are_not_written() {
        let store = InMemoryDocumentStore::new();
        let mut nails = Item::plain("Nails", 10, 1.0).unwrap();
        let patch = stockroom_inventory::ItemPatch {
            cost: Some(f64::NAN),
            ..Default::default()
        };
        nails.apply_patch(&patch).unwrap();

        let err = store_one(&store, &nails).await.unwrap_err();
        assert!(matches!(err, StoreError::Codec(msg) if msg.contains("unreadable items")));
        assert!(store.find(Collection::Items, &Filter::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_documents_surface_as_codec_errors() {
        let store = InMemoryDocumentStore::new();
        store
            .save(
                Collection::Users,
                uuid::Uuid::now_v7(),
                serde_json::json!({ "name": "Alice" }),
            )
            .await
            .unwrap();

        let err = load_one::<User, _>(&store, &Filter::by_name("Alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Codec(msg) if msg.contains("users")));
    }
}
