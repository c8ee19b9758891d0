use tracing::instrument;

use stockroom_inventory::{Item, ItemPatch, ItemType};

use super::{Inventory, OperationResult, label};
use crate::document_store::{DocumentStore, Filter};

/// Operations restricted to materials.
pub struct Materials<'a, S> {
    inventory: &'a Inventory<S>,
}

fn filter(name: &str) -> Filter {
    Filter::by_name(name).eq("itemType", ItemType::Material.as_str())
}

impl<'a, S: DocumentStore> Materials<'a, S> {
    pub(super) fn new(inventory: &'a Inventory<S>) -> Self {
        Self { inventory }
    }

    #[instrument(skip(self), err)]
    pub async fn add(
        &self,
        name: &str,
        amount: i64,
        cost: f64,
        supplier: &str,
        quality: &str,
    ) -> OperationResult<Option<Item>> {
        let material = Item::material(name, amount, cost, supplier, quality)?;
        let policy = self.inventory.config().add_material;
        self.inventory.persist_new(material, policy).await
    }

    pub async fn find(&self, name: &str) -> OperationResult<Item> {
        self.inventory
            .fetch(&filter(name), &label("material", name))
            .await
    }

    #[instrument(skip(self), err)]
    pub async fn update(&self, name: &str, patch: &ItemPatch) -> OperationResult<Item> {
        let mut material = self.find(name).await?;
        material.apply_patch(patch)?;
        self.inventory.persist(&material).await?;
        tracing::info!("material updated");
        Ok(material)
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, name: &str) -> OperationResult<()> {
        self.inventory
            .remove::<Item>(&filter(name), &label("material", name))
            .await
    }

    pub async fn list(&self) -> OperationResult<Vec<Item>> {
        let all = Filter::all().eq("itemType", ItemType::Material.as_str());
        self.inventory.fetch_all(&all).await
    }

    /// Take `quantity` out of stock and save the material.
    #[instrument(skip(self), err)]
    pub async fn use_material(&self, name: &str, quantity: i64) -> OperationResult<Item> {
        let mut material = self.find(name).await?;
        material.consume(quantity)?;
        self.inventory.persist(&material).await?;
        tracing::info!(remaining = material.amount(), "material used");
        Ok(material)
    }
}
