use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, UserId};

use crate::patch::UserPatch;

/// Someone who consumes items, borrows tools and builds things.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    name: String,
    age: i64,
    /// Item names, first-use order, no duplicates.
    #[serde(default)]
    used_items: Vec<String>,
}

impl User {
    pub fn create(name: impl Into<String>, age: i64) -> DomainResult<Self> {
        Self::create_with_id(UserId::new(), name, age)
    }

    pub fn create_with_id(id: UserId, name: impl Into<String>, age: i64) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if age < 0 {
            return Err(DomainError::validation("age must be non-negative"));
        }
        Ok(Self {
            id,
            name,
            age,
            used_items: Vec::new(),
        })
    }

    pub fn age(&self) -> i64 {
        self.age
    }

    pub fn used_items(&self) -> &[String] {
        &self.used_items
    }

    /// Returns `false` when the item was already listed.
    pub fn record_used_item(&mut self, item_name: impl Into<String>) -> bool {
        let item_name = item_name.into();
        if self.used_items.contains(&item_name) {
            return false;
        }
        self.used_items.push(item_name);
        true
    }

    pub fn apply_patch(&mut self, patch: &UserPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
