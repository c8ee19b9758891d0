//! Building something out of several inventory items.
//!
//! A build is a best-effort sequence: each entry either borrows a tool or
//! consumes stock, and a failing entry does not undo the ones before it.

use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity};

use crate::item::{Item, ItemType};
use crate::user::User;

/// One item and the amount a build needs of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEntry {
    pub name: String,
    pub amount: i64,
}

/// What applying an entry did to its item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The tool was used; its condition and borrower list changed, and so did
    /// the user's used items.
    ToolUsed,
    /// `amount` units were taken out of stock.
    Consumed { amount: i64 },
}

impl BuildEntry {
    /// Apply this entry to the looked-up `item` on behalf of `user`.
    ///
    /// The stock check applies to tools as well, so asking for more tools than
    /// are held fails even when the tool is in good condition.
    pub fn apply_to(&self, item: &mut Item, user: &mut User) -> DomainResult<BuildOutcome> {
        if self.amount < 0 {
            return Err(DomainError::validation(format!(
                "cannot use a negative amount of {}",
                self.name
            )));
        }
        if self.amount > item.amount() {
            return Err(DomainError::insufficient_stock(
                item.name(),
                self.amount,
                item.amount(),
            ));
        }

        match item.item_type() {
            ItemType::Tool => {
                item.use_tool(user)?;
                Ok(BuildOutcome::ToolUsed)
            }
            ItemType::Material | ItemType::Item => {
                item.consume(self.amount)?;
                Ok(BuildOutcome::Consumed {
                    amount: self.amount,
                })
            }
        }
    }
}

/// Paired item names and amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    entries: Vec<BuildEntry>,
}

impl BuildRequest {
    /// Zip names with amounts; the two lists must be the same length.
    pub fn pair(names: Vec<String>, amounts: Vec<i64>) -> DomainResult<Self> {
        if names.len() != amounts.len() {
            return Err(DomainError::validation(format!(
                "the number of item names ({}) and amounts ({}) must match",
                names.len(),
                amounts.len()
            )));
        }
        let entries = names
            .into_iter()
            .zip(amounts)
            .map(|(name, amount)| BuildEntry { name, amount })
            .collect();
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[BuildEntry] {
        &self.entries
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialUsage {
    pub name: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildFailure {
    pub entry: BuildEntry,
    pub error: DomainError,
}

/// Result of a build: what was done and what was not.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildReport {
    pub builder: String,
    pub tools_used: Vec<String>,
    pub materials_used: Vec<MaterialUsage>,
    pub failed: Vec<BuildFailure>,
}

impl BuildReport {
    pub fn new(builder: impl Into<String>) -> Self {
        Self {
            builder: builder.into(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, entry: &BuildEntry, outcome: BuildOutcome) {
        match outcome {
            BuildOutcome::ToolUsed => self.tools_used.push(entry.name.clone()),
            BuildOutcome::Consumed { amount } => self.materials_used.push(MaterialUsage {
                name: entry.name.clone(),
                amount,
            }),
        }
    }

    pub fn record_failure(&mut self, entry: &BuildEntry, error: DomainError) {
        self.failed.push(BuildFailure {
            entry: entry.clone(),
            error,
        });
    }

    /// True when every entry was applied.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.tools_used.len() + self.materials_used.len()
    }
}

impl core::fmt::Display for BuildReport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} built something using tools: [", self.builder)?;
        write!(f, "{}", self.tools_used.join(", "))?;
        write!(f, "] and materials: [")?;
        for (idx, used) in self.materials_used.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} x{}", used.name, used.amount)?;
        }
        write!(f, "]")?;
        for failure in &self.failed {
            write!(f, "\n  failed {}: {}", failure.entry.name, failure.error)?;
        }
        Ok(())
    }
}
