use tracing::instrument;

use stockroom_inventory::{Item, ItemPatch};

use super::{Inventory, OperationResult, label};
use crate::document_store::{DocumentStore, Filter};

/// Operations over every item regardless of its kind.
pub struct Items<'a, S> {
    inventory: &'a Inventory<S>,
}

impl<'a, S: DocumentStore> Items<'a, S> {
    pub(super) fn new(inventory: &'a Inventory<S>) -> Self {
        Self { inventory }
    }

    #[instrument(skip(self), err)]
    pub async fn add(&self, name: &str, amount: i64, cost: f64) -> OperationResult<Option<Item>> {
        let item = Item::plain(name, amount, cost)?;
        let policy = self.inventory.config().add_item;
        self.inventory.persist_new(item, policy).await
    }

    pub async fn find(&self, name: &str) -> OperationResult<Item> {
        self.inventory
            .fetch(&Filter::by_name(name), &label("item", name))
            .await
    }

    #[instrument(skip(self), err)]
    pub async fn update(&self, name: &str, patch: &ItemPatch) -> OperationResult<Item> {
        let mut item = self.find(name).await?;
        item.apply_patch(patch)?;
        self.inventory.persist(&item).await?;
        tracing::info!("item updated");
        Ok(item)
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, name: &str) -> OperationResult<()> {
        self.inventory
            .remove::<Item>(&Filter::by_name(name), &label("item", name))
            .await
    }

    pub async fn list(&self) -> OperationResult<Vec<Item>> {
        self.inventory.fetch_all(&Filter::all()).await
    }

    pub async fn worth(&self, name: &str) -> OperationResult<f64> {
        Ok(self.find(name).await?.worth())
    }

    #[instrument(skip(self), err)]
    pub async fn add_arrival(&self, name: &str, delta: i64) -> OperationResult<Item> {
        let mut item = self.find(name).await?;
        item.new_arrival(delta)?;
        self.inventory.persist(&item).await?;
        tracing::info!(amount = item.amount(), "new arrival added");
        Ok(item)
    }
}
