//! Configuration loading and representation.
//!
//! Everything is read from environment variables; the CLI may override the
//! store settings with flags after loading.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `STOCKROOM_STORE` | `postgres` if `DATABASE_URL` is set, else `memory` |
//! | `DATABASE_URL` | unset |
//! | `STOCKROOM_MAX_CONNECTIONS` | `5` |
//! | `STOCKROOM_ADD_ITEM_ERRORS` | `propagate` |
//! | `STOCKROOM_ADD_MATERIAL_ERRORS` | `propagate` |
//! | `STOCKROOM_ADD_TOOL_ERRORS` | `propagate` |
//! | `STOCKROOM_ADD_USER_ERRORS` | `propagate` |

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} is required for the postgres store")]
    Missing(&'static str),
}

/// What an add-operation does when persisting the new record fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Return the store error to the caller.
    #[default]
    Propagate,
    /// Log the store error and report that nothing was added.
    LogAndSuppress,
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "propagate" => Ok(Self::Propagate),
            "suppress" | "log" | "log_and_suppress" => Ok(Self::LogAndSuppress),
            other => Err(format!("expected propagate or suppress, got {other:?}")),
        }
    }
}

/// Per-operation error policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperationsConfig {
    pub add_item: ErrorPolicy,
    pub add_material: ErrorPolicy,
    pub add_tool: ErrorPolicy,
    pub add_user: ErrorPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(format!("expected memory or postgres, got {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_url: None,
            max_connections: 5,
        }
    }
}

impl StoreConfig {
    /// The URL to connect with, if the backend needs one.
    pub fn postgres_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing("DATABASE_URL"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub operations: OperationsConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup (used by tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let backend = match parse::<StoreBackend>(&lookup, "STOCKROOM_STORE")? {
            Some(backend) => backend,
            None if database_url.is_some() => StoreBackend::Postgres,
            None => StoreBackend::Memory,
        };

        let max_connections = parse::<u32>(&lookup, "STOCKROOM_MAX_CONNECTIONS")?
            .unwrap_or(StoreConfig::default().max_connections);

        let operations = OperationsConfig {
            add_item: policy(&lookup, "STOCKROOM_ADD_ITEM_ERRORS")?,
            add_material: policy(&lookup, "STOCKROOM_ADD_MATERIAL_ERRORS")?,
            add_tool: policy(&lookup, "STOCKROOM_ADD_TOOL_ERRORS")?,
            add_user: policy(&lookup, "STOCKROOM_ADD_USER_ERRORS")?,
        };

        let store = StoreConfig {
            backend,
            database_url,
            max_connections,
        };
        if store.backend == StoreBackend::Postgres {
            store.postgres_url()?;
        }

        Ok(Self { store, operations })
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value,
            reason: e.to_string(),
        }),
    }
}

fn policy(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<ErrorPolicy, ConfigError> {
    Ok(parse(lookup, var)?.unwrap_or_default())
}
