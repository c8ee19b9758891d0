//! Infrastructure layer: document store, configuration, and the domain
//! operations the shell calls into.

pub mod config;
pub mod document_store;
pub mod operations;


pub use config::{AppConfig, ErrorPolicy, OperationsConfig, StoreBackend, StoreConfig};
pub use document_store::{AnyStore, DocumentStore, InMemoryDocumentStore, PostgresDocumentStore};
pub use operations::{Inventory, OperationError, OperationResult};
