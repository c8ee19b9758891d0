use tracing::instrument;

use stockroom_core::Entity;
use stockroom_inventory::{Item, ItemPatch, ItemType, User};

use super::{Inventory, OperationResult, label};
use crate::document_store::{DocumentStore, Filter};

/// Operations restricted to tools.
pub struct Tools<'a, S> {
    inventory: &'a Inventory<S>,
}

fn filter(name: &str) -> Filter {
    Filter::by_name(name).eq("itemType", ItemType::Tool.as_str())
}

impl<'a, S: DocumentStore> Tools<'a, S> {
    pub(super) fn new(inventory: &'a Inventory<S>) -> Self {
        Self { inventory }
    }

    #[instrument(skip(self), err)]
    pub async fn add(
        &self,
        name: &str,
        amount: i64,
        cost: f64,
        usage: i64,
        condition: i64,
    ) -> OperationResult<Option<Item>> {
        let tool = Item::tool(name, amount, cost, usage, condition)?;
        let policy = self.inventory.config().add_tool;
        self.inventory.persist_new(tool, policy).await
    }

    pub async fn find(&self, name: &str) -> OperationResult<Item> {
        self.inventory.fetch(&filter(name), &label("tool", name)).await
    }

    #[instrument(skip(self), err)]
    pub async fn update(&self, name: &str, patch: &ItemPatch) -> OperationResult<Item> {
        let mut tool = self.find(name).await?;
        tool.apply_patch(patch)?;
        self.inventory.persist(&tool).await?;
        tracing::info!("tool updated");
        Ok(tool)
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, name: &str) -> OperationResult<()> {
        self.inventory
            .remove::<Item>(&filter(name), &label("tool", name))
            .await
    }

    pub async fn list(&self) -> OperationResult<Vec<Item>> {
        let all = Filter::all().eq("itemType", ItemType::Tool.as_str());
        self.inventory.fetch_all(&all).await
    }

    /// Use the tool on behalf of `user_name`; returns a confirmation line.
    #[instrument(skip(self), err)]
    pub async fn use_tool(&self, name: &str, user_name: &str) -> OperationResult<String> {
        let mut tool = self.find(name).await?;
        let mut user = self.inventory.users().find(user_name).await?;
        use_and_save(self.inventory, &mut tool, &mut user).await?;
        Ok(format!("Tool {} used by {}", tool.name(), user.name()))
    }

    /// Repair the tool and save it.
    #[instrument(skip(self), err)]
    pub async fn fix(&self, name: &str) -> OperationResult<Item> {
        let mut tool = self.find(name).await?;
        let condition = tool.fix_tool()?;
        self.inventory.persist(&tool).await?;
        tracing::info!(condition, "tool fixed");
        Ok(tool)
    }
}

/// Apply the tool-use rule and save the tool, then the user.
async fn use_and_save<S: DocumentStore>(
    inventory: &Inventory<S>,
    tool: &mut Item,
    user: &mut User,
) -> OperationResult<()> {
    tool.use_tool(user)?;
    inventory.persist(&*tool).await?;
    inventory.persist(&*user).await?;
    tracing::info!(
        tool = %tool.name(),
        user = %user.name(),
        condition = tool.tool_spec().map(|t| t.condition),
        "tool used"
    );
    Ok(())
}
