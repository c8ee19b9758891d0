use tracing::instrument;

use stockroom_core::Entity;
use stockroom_inventory::{
    BuildEntry, BuildOutcome, BuildReport, BuildRequest, Item, User, UserPatch,
};

use super::{Inventory, OperationError, OperationResult, label};
use crate::document_store::{DocumentStore, Filter};

/// Operations on users and the actions they take.
pub struct Users<'a, S> {
    inventory: &'a Inventory<S>,
}

impl<'a, S: DocumentStore> Users<'a, S> {
    pub(super) fn new(inventory: &'a Inventory<S>) -> Self {
        Self { inventory }
    }

    #[instrument(skip(self), err)]
    pub async fn add(&self, name: &str, age: i64) -> OperationResult<Option<User>> {
        let user = User::create(name, age)?;
        let policy = self.inventory.config().add_user;
        self.inventory.persist_new(user, policy).await
    }

    pub async fn find(&self, name: &str) -> OperationResult<User> {
        self.inventory
            .fetch(&Filter::by_name(name), &label("user", name))
            .await
    }

    #[instrument(skip(self), err)]
    pub async fn update(&self, name: &str, patch: &UserPatch) -> OperationResult<User> {
        let mut user = self.find(name).await?;
        user.apply_patch(patch);
        self.inventory.persist(&user).await?;
        tracing::info!("user updated");
        Ok(user)
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, name: &str) -> OperationResult<()> {
        self.inventory
            .remove::<User>(&Filter::by_name(name), &label("user", name))
            .await
    }

    pub async fn list(&self) -> OperationResult<Vec<User>> {
        self.inventory.fetch_all(&Filter::all()).await
    }

    /// Consume `quantity` of any item and note the user on it.
    #[instrument(skip(self), err)]
    pub async fn use_item(
        &self,
        user_name: &str,
        item_name: &str,
        quantity: i64,
    ) -> OperationResult<String> {
        let user = self.find(user_name).await?;
        let mut item = self.inventory.items().find(item_name).await?;

        item.consume(quantity)?;
        item.record_use_by(user.name());
        self.inventory.persist(&item).await?;

        tracing::info!(remaining = item.amount(), "item used");
        Ok(format!("User {} used {} of {}.", user.name(), quantity, item.name()))
    }

    pub async fn used_items(&self, user_name: &str) -> OperationResult<Vec<String>> {
        Ok(self.find(user_name).await?.used_items().to_vec())
    }

    /// Build something from paired item names and amounts.
    ///
    /// Entries run in order. A domain failure on one entry is recorded in the
    /// report and the build moves on; a store failure stops it. Nothing is
    /// rolled back either way.
    #[instrument(skip(self), err)]
    pub async fn build(
        &self,
        user_name: &str,
        names: Vec<String>,
        amounts: Vec<i64>,
    ) -> OperationResult<BuildReport> {
        let request = BuildRequest::pair(names, amounts)?;
        let mut user = self.find(user_name).await?;
        let mut report = BuildReport::new(user.name());

        for entry in request.entries() {
            match self.apply_entry(entry, &mut user).await {
                Ok(outcome) => report.record(entry, outcome),
                Err(OperationError::Domain(error)) => {
                    tracing::warn!(item = %entry.name, error = %error, "build entry failed");
                    report.record_failure(entry, error);
                }
                Err(store_error) => return Err(store_error),
            }
        }

        tracing::info!(
            tools = report.tools_used.len(),
            materials = report.materials_used.len(),
            failed = report.failed.len(),
            "build finished"
        );
        Ok(report)
    }

    async fn apply_entry(&self, entry: &BuildEntry, user: &mut User) -> OperationResult<BuildOutcome> {
        let mut item: Item = self
            .inventory
            .fetch(&Filter::by_name(&entry.name), &label("item", &entry.name))
            .await?;

        let outcome = entry.apply_to(&mut item, user)?;
        self.inventory.persist(&item).await?;
        if outcome == BuildOutcome::ToolUsed {
            self.inventory.persist(&*user).await?;
        }
        Ok(outcome)
    }
}
