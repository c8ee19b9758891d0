//! Domain operations (application-level orchestration).
//!
//! Each operation is a short sequence of store round trips around the pure
//! rules in `stockroom-inventory`:
//!
//! ```text
//! look up record(s) by name
//!   ↓
//! apply domain rule in memory
//!   ↓
//! save each mutated record
//! ```
//!
//! There are no transactions. An operation that saves several records can fail
//! after some of them are written; those writes stay.
//!
//! `Inventory` owns the store handle. Category views (`items()`,
//! `materials()`, `tools()`, `users()`) borrow it and expose the per-category
//! operation set.

mod items;
mod materials;
mod tools;
mod users;

pub use items::Items;
pub use materials::Materials;
pub use tools::Tools;
pub use users::Users;

use thiserror::Error;

use stockroom_core::{DomainError, Entity};

use crate::config::{ErrorPolicy, OperationsConfig};
use crate::document_store::document::{self, Document};
use crate::document_store::{DocumentStore, Filter, StoreError};

/// Failure of a domain operation.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type OperationResult<T> = Result<T, OperationError>;

/// Entry point for every shell-facing operation.
#[derive(Debug)]
pub struct Inventory<S> {
    store: S,
    config: OperationsConfig,
}

impl<S: DocumentStore> Inventory<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, OperationsConfig::default())
    }

    pub fn with_config(store: S, config: OperationsConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &OperationsConfig {
        &self.config
    }

    pub fn items(&self) -> Items<'_, S> {
        Items::new(self)
    }

    pub fn materials(&self) -> Materials<'_, S> {
        Materials::new(self)
    }

    pub fn tools(&self) -> Tools<'_, S> {
        Tools::new(self)
    }

    pub fn users(&self) -> Users<'_, S> {
        Users::new(self)
    }

    /// Fetch one record; `what` names it in the not-found error.
    pub(crate) async fn fetch<T: Document>(&self, filter: &Filter, what: &str) -> OperationResult<T> {
        let found = document::load_one(&self.store, filter).await?;
        tracing::debug!(record = %what, found = found.is_some(), "lookup");
        found.ok_or_else(|| DomainError::not_found(what).into())
    }

    pub(crate) async fn fetch_all<T: Document>(&self, filter: &Filter) -> OperationResult<Vec<T>> {
        Ok(document::load_all(&self.store, filter).await?)
    }

    pub(crate) async fn persist<T: Document>(&self, doc: &T) -> OperationResult<()> {
        Ok(document::store_one(&self.store, doc).await?)
    }

    /// Save a freshly created record, honouring the add-operation's policy.
    ///
    /// Returns `None` when the save failed and the policy suppressed it.
    pub(crate) async fn persist_new<T: Document>(
        &self,
        doc: T,
        policy: ErrorPolicy,
    ) -> OperationResult<Option<T>> {
        match document::store_one(&self.store, &doc).await {
            Ok(()) => {
                tracing::info!(collection = %T::COLLECTION, name = %doc.name(), "record added");
                Ok(Some(doc))
            }
            Err(err) if policy == ErrorPolicy::LogAndSuppress => {
                tracing::error!(
                    collection = %T::COLLECTION,
                    name = %doc.name(),
                    error = %err,
                    "failed to add record"
                );
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) async fn remove<T: Document>(&self, filter: &Filter, what: &str) -> OperationResult<()> {
        let deleted = self.store.delete_one(T::COLLECTION, filter).await?;
        if deleted == 0 {
            return Err(DomainError::not_found(what).into());
        }
        tracing::info!(collection = %T::COLLECTION, record = %what, "record deleted");
        Ok(())
    }
}

/// Quoted label used in not-found messages, e.g. `tool "Drill"`.
pub(crate) fn label(kind: &str, name: &str) -> String {
    format!("{kind} {name:?}")
}
