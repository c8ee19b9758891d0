//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// missing records, stock and condition limits). Storage concerns belong to
/// the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// A value failed validation (negative quantity, mismatched inputs, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// No record matches the lookup key.
    #[error("{0} not found")]
    NotFound(String),

    /// The requested quantity exceeds what is in stock.
    #[error("not enough {name} available: requested {requested}, have {available}")]
    InsufficientStock {
        name: String,
        requested: i64,
        available: i64,
    },

    /// A tool's condition is too low for it to be used.
    #[error("tool {name} cannot be used due to its condition ({condition})")]
    Unusable { name: String, condition: i64 },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// `what` describes the missing record, e.g. `user "alice"`.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn insufficient_stock(name: impl Into<String>, requested: i64, available: i64) -> Self {
        Self::InsufficientStock {
            name: name.into(),
            requested,
            available,
        }
    }

    pub fn unusable(name: impl Into<String>, condition: i64) -> Self {
        Self::Unusable {
            name: name.into(),
            condition,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
