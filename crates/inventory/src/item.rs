use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, ItemId};

use crate::patch::ItemPatch;
use crate::user::User;

/// A tool can only be used while its condition is strictly above this.
pub const TOOL_USABLE_ABOVE: i64 = 15;
/// Condition lost per use.
pub const TOOL_WEAR_PER_USE: i64 = 10;
/// Condition regained per repair.
pub const TOOL_REPAIR_STEP: i64 = 20;
/// Upper bound for tool condition and usage.
pub const CONDITION_MAX: i64 = 100;

/// Discriminator stored in the `itemType` field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Item,
    Material,
    Tool,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Item => "Item",
            Self::Material => "Material",
            Self::Tool => "Tool",
        }
    }
}

impl core::fmt::Display for ItemType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Material-only data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialSpec {
    pub supplier: String,
    pub quality: String,
}

/// Tool-only data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    pub usage: i64,
    pub condition: i64,
    /// Users who borrowed the tool, in first-borrow order.
    #[serde(default)]
    pub borrowed_by: Vec<stockroom_core::UserId>,
}

impl ToolSpec {
    pub fn new(usage: i64, condition: i64) -> Self {
        Self {
            usage,
            condition,
            borrowed_by: Vec::new(),
        }
    }

    pub fn is_usable(&self) -> bool {
        self.condition > TOOL_USABLE_ABOVE
    }
}

/// Category-specific part of an item, tagged by `itemType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "itemType")]
pub enum ItemKind {
    Item,
    Material(MaterialSpec),
    Tool(ToolSpec),
}

impl ItemKind {
    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Item => ItemType::Item,
            Self::Material(_) => ItemType::Material,
            Self::Tool(_) => ItemType::Tool,
        }
    }
}

/// Inventory record: an item, a material or a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    id: ItemId,
    name: String,
    amount: i64,
    cost: f64,
    #[serde(flatten)]
    kind: ItemKind,
    /// Names of users who consumed this item; absent until the first use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    used_by: Option<Vec<String>>,
}

impl Item {
    /// Validate and build a new record with a fresh id.
    pub fn create(
        name: impl Into<String>,
        amount: i64,
        cost: f64,
        kind: ItemKind,
    ) -> DomainResult<Self> {
        Self::create_with_id(ItemId::new(), name, amount, cost, kind)
    }

    pub fn create_with_id(
        id: ItemId,
        name: impl Into<String>,
        amount: i64,
        cost: f64,
        kind: ItemKind,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if amount < 0 {
            return Err(DomainError::validation("amount must be a non-negative integer"));
        }
        if !cost.is_finite() || cost < 0.0 {
            return Err(DomainError::validation("cost must be a non-negative number"));
        }
        if let ItemKind::Tool(tool) = &kind {
            ensure_percent("usage", tool.usage)?;
            ensure_percent("condition", tool.condition)?;
        }

        Ok(Self {
            id,
            name,
            amount,
            cost,
            kind,
            used_by: None,
        })
    }

    pub fn plain(name: impl Into<String>, amount: i64, cost: f64) -> DomainResult<Self> {
        Self::create(name, amount, cost, ItemKind::Item)
    }

    pub fn material(
        name: impl Into<String>,
        amount: i64,
        cost: f64,
        supplier: impl Into<String>,
        quality: impl Into<String>,
    ) -> DomainResult<Self> {
        let spec = MaterialSpec {
            supplier: supplier.into(),
            quality: quality.into(),
        };
        Self::create(name, amount, cost, ItemKind::Material(spec))
    }

    pub fn tool(
        name: impl Into<String>,
        amount: i64,
        cost: f64,
        usage: i64,
        condition: i64,
    ) -> DomainResult<Self> {
        Self::create(name, amount, cost, ItemKind::Tool(ToolSpec::new(usage, condition)))
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    pub fn item_type(&self) -> ItemType {
        self.kind.item_type()
    }

    pub fn material_spec(&self) -> Option<&MaterialSpec> {
        match &self.kind {
            ItemKind::Material(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn tool_spec(&self) -> Option<&ToolSpec> {
        match &self.kind {
            ItemKind::Tool(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn used_by(&self) -> &[String] {
        self.used_by.as_deref().unwrap_or(&[])
    }

    /// Total value held: amount x cost.
    pub fn worth(&self) -> f64 {
        self.amount as f64 * self.cost
    }

    /// Record a delivery of `delta` units.
    pub fn new_arrival(&mut self, delta: i64) -> DomainResult<()> {
        if delta < 0 {
            return Err(DomainError::validation("arrival amount must be non-negative"));
        }
        self.amount = self.amount.checked_add(delta).ok_or_else(|| {
            DomainError::validation(format!(
                "arrival of {delta} would overflow the stock of {}",
                self.name
            ))
        })?;
        Ok(())
    }

    /// Take `quantity` units out of stock.
    pub fn consume(&mut self, quantity: i64) -> DomainResult<()> {
        if quantity < 0 {
            return Err(DomainError::validation(format!(
                "cannot use a negative amount of {}",
                self.name
            )));
        }
        if quantity > self.amount {
            return Err(DomainError::insufficient_stock(
                &self.name,
                quantity,
                self.amount,
            ));
        }
        self.amount -= quantity;
        Ok(())
    }

    /// Note that `user_name` consumed this item.
    pub fn record_use_by(&mut self, user_name: impl Into<String>) {
        self.used_by.get_or_insert_with(Vec::new).push(user_name.into());
    }

    /// The single mutation path for a tool being used by `user`.
    ///
    /// Wears the tool, records the borrower once, and adds the tool to the
    /// user's used items. Nothing changes when the tool is unusable.
    pub fn use_tool(&mut self, user: &mut User) -> DomainResult<()> {
        let name = self.name.clone();
        let tool = self.tool_mut()?;
        if !tool.is_usable() {
            return Err(DomainError::unusable(name, tool.condition));
        }

        tool.condition = tool.condition.saturating_sub(TOOL_WEAR_PER_USE).max(0);
        let user_id = *user.id();
        if !tool.borrowed_by.contains(&user_id) {
            tool.borrowed_by.push(user_id);
        }
        user.record_used_item(name);
        Ok(())
    }

    /// Repair the tool; returns the new condition.
    pub fn fix_tool(&mut self) -> DomainResult<i64> {
        let tool = self.tool_mut()?;
        tool.condition = tool.condition.saturating_add(TOOL_REPAIR_STEP).min(CONDITION_MAX);
        Ok(tool.condition)
    }

    /// Shallow-merge the provided fields. Values are taken as given; only
    /// fields that do not exist on this kind of item are rejected.
    pub fn apply_patch(&mut self, patch: &ItemPatch) -> DomainResult<()> {
        let item_type = self.item_type();
        match &mut self.kind {
            ItemKind::Material(spec) => {
                if patch.usage.is_some() || patch.condition.is_some() {
                    return Err(not_applicable("usage/condition", item_type));
                }
                if let Some(supplier) = &patch.supplier {
                    spec.supplier = supplier.clone();
                }
                if let Some(quality) = &patch.quality {
                    spec.quality = quality.clone();
                }
            }
            ItemKind::Tool(spec) => {
                if patch.supplier.is_some() || patch.quality.is_some() {
                    return Err(not_applicable("supplier/quality", item_type));
                }
                if let Some(usage) = patch.usage {
                    spec.usage = usage;
                }
                if let Some(condition) = patch.condition {
                    spec.condition = condition;
                }
            }
            ItemKind::Item => {
                if patch.touches_category_fields() {
                    return Err(not_applicable("category", item_type));
                }
            }
        }

        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(cost) = patch.cost {
            self.cost = cost;
        }
        Ok(())
    }

    fn tool_mut(&mut self) -> DomainResult<&mut ToolSpec> {
        match &mut self.kind {
            ItemKind::Tool(spec) => Ok(spec),
            other => Err(DomainError::validation(format!(
                "{} is a {}, not a Tool",
                self.name,
                other.item_type()
            ))),
        }
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn ensure_percent(field: &str, value: i64) -> DomainResult<()> {
    if !(0..=CONDITION_MAX).contains(&value) {
        return Err(DomainError::validation(format!(
            "{field} must be between 0 and {CONDITION_MAX}"
        )));
    }
    Ok(())
}

fn not_applicable(fields: &str, item_type: ItemType) -> DomainError {
    DomainError::validation(format!("{fields} fields do not apply to a {item_type}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nails() -> Item {
        Item::plain("Nails", 100, 2.0).unwrap()
    }

    fn drill(condition: i64) -> Item {
        Item::tool("Drill", 1, 80.0, 0, condition).unwrap()
    }

    fn user(name: &str) -> User {
        User::create(name, 30).unwrap()
    }

    #[test]
    fn create_rejects_invalid_fields() {
        assert!(matches!(
            Item::plain("  ", 1, 1.0),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            Item::plain("Nails", -1, 1.0),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            Item::plain("Nails", 1, -0.5),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            Item::plain("Nails", 1, f64::NAN),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            Item::tool("Drill", 1, 1.0, 101, 50),
            Err(DomainError::Validation(msg)) if msg.starts_with("usage")
        ));
        assert!(matches!(
            Item::tool("Drill", 1, 1.0, 0, -1),
            Err(DomainError::Validation(msg)) if msg.starts_with("condition")
        ));
    }

    #[test]
    fn nails_scenario() {
        let mut item = nails();
        assert_eq!(item.worth(), 200.0);

        item.new_arrival(50).unwrap();
        assert_eq!(item.amount(), 150);

        let err = item.consume(200).unwrap_err();
        assert_eq!(err, DomainError::insufficient_stock("Nails", 200, 150));
        assert_eq!(item.amount(), 150);
    }

    #[test]
    fn negative_arrival_leaves_amount_unchanged() {
        let mut item = nails();
        assert!(matches!(item.new_arrival(-1), Err(DomainError::Validation(_))));
        assert_eq!(item.amount(), 100);
    }

    #[test]
    fn negative_consumption_is_rejected() {
        let mut item = nails();
        assert!(matches!(item.consume(-3), Err(DomainError::Validation(_))));
        assert_eq!(item.amount(), 100);
    }

    #[test]
    fn drill_scenario() {
        let mut tool = drill(20);
        let mut alice = user("Alice");
        let mut bob = user("Bob");

        tool.use_tool(&mut alice).unwrap();
        let spec = tool.tool_spec().unwrap();
        assert_eq!(spec.condition, 10);
        assert_eq!(spec.borrowed_by, vec![*alice.id()]);
        assert_eq!(alice.used_items(), ["Drill".to_string()]);

        let err = tool.use_tool(&mut bob).unwrap_err();
        assert_eq!(err, DomainError::unusable("Drill", 10));
        assert_eq!(tool.tool_spec().unwrap().condition, 10);
        assert_eq!(tool.tool_spec().unwrap().borrowed_by.len(), 1);
        assert!(bob.used_items().is_empty());
    }

    #[test]
    fn repeated_use_records_borrower_once() {
        let mut tool = drill(100);
        let mut alice = user("Alice");

        tool.use_tool(&mut alice).unwrap();
        tool.use_tool(&mut alice).unwrap();

        let spec = tool.tool_spec().unwrap();
        assert_eq!(spec.condition, 80);
        assert_eq!(spec.borrowed_by, vec![*alice.id()]);
        assert_eq!(alice.used_items().len(), 1);
    }

    #[test]
    fn condition_boundary_at_fifteen() {
        let mut alice = user("Alice");
        assert!(drill(15).use_tool(&mut alice).is_err());
        assert!(drill(16).use_tool(&mut alice).is_ok());
    }

    #[test]
    fn fix_caps_at_one_hundred() {
        let mut tool = drill(90);
        assert_eq!(tool.fix_tool().unwrap(), 100);

        let mut tool = drill(10);
        assert_eq!(tool.fix_tool().unwrap(), 30);
    }

    #[test]
    fn arrival_that_would_overflow_is_rejected() {
        let mut item = nails();

        let err = item.new_arrival(i64::MAX).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("overflow")));
        assert_eq!(item.amount(), 100);
    }

    #[test]
    fn fix_saturates_an_unvalidated_condition() {
        let mut tool = drill(50);
        let patch = ItemPatch {
            condition: Some(i64::MAX),
            ..ItemPatch::default()
        };
        tool.apply_patch(&patch).unwrap();

        assert_eq!(tool.fix_tool().unwrap(), 100);
    }

    #[test]
    fn tool_rules_reject_non_tools() {
        let mut item = nails();
        let mut alice = user("Alice");
        assert!(matches!(item.use_tool(&mut alice), Err(DomainError::Validation(_))));
        assert!(matches!(item.fix_tool(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn used_by_is_lazily_created() {
        let mut item = nails();
        assert!(item.used_by().is_empty());
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("usedBy").is_none());

        item.record_use_by("Alice");
        item.record_use_by("Alice");
        assert_eq!(item.used_by(), ["Alice".to_string(), "Alice".to_string()]);
    }

    #[test]
    fn patch_merges_without_revalidation() {
        let mut item = Item::material("Wood", 10, 3.0, "Acme", "A").unwrap();
        let patch = ItemPatch {
            amount: Some(-5),
            supplier: Some("Globex".to_string()),
            ..ItemPatch::default()
        };
        item.apply_patch(&patch).unwrap();
        assert_eq!(item.amount(), -5);
        assert_eq!(item.material_spec().unwrap().supplier, "Globex");
    }

    #[test]
    fn patch_rejects_fields_of_another_kind() {
        let mut tool = drill(50);
        let patch = ItemPatch {
            quality: Some("B".to_string()),
            ..ItemPatch::default()
        };
        assert!(matches!(tool.apply_patch(&patch), Err(DomainError::Validation(_))));

        let mut item = nails();
        let before = item.clone();
        let patch = ItemPatch {
            amount: Some(1),
            condition: Some(40),
            ..ItemPatch::default()
        };
        assert!(matches!(item.apply_patch(&patch), Err(DomainError::Validation(_))));
        assert_eq!(item, before);
    }

    #[test]
    fn document_shape_uses_item_type_tag() {
        let item = Item::tool("Saw", 2, 15.0, 5, 70).unwrap();
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["itemType"], "Tool");
        assert_eq!(json["condition"], 70);
        assert_eq!(json["borrowedBy"], serde_json::json!([]));

        let back: Item = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);

        let plain = serde_json::to_value(nails()).unwrap();
        assert_eq!(plain["itemType"], "Item");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            #[test]
            fn worth_is_amount_times_cost(amount in 0i64..1_000_000, cents in 0u32..100_000) {
                let cost = f64::from(cents) / 100.0;
                let item = Item::plain("Widget", amount, cost).unwrap();
                prop_assert_eq!(item.worth(), amount as f64 * cost);
            }

            #[test]
            fn arrival_adds_exactly_delta(amount in 0i64..1_000_000, delta in -1_000i64..1_000_000) {
                let mut item = Item::plain("Widget", amount, 1.0).unwrap();
                let result = item.new_arrival(delta);
                if delta < 0 {
                    prop_assert!(result.is_err());
                    prop_assert_eq!(item.amount(), amount);
                } else {
                    prop_assert!(result.is_ok());
                    prop_assert_eq!(item.amount(), amount + delta);
                }
            }

            #[test]
            fn consume_never_goes_negative(amount in 0i64..10_000, quantity in -100i64..20_000) {
                let mut item = Item::material("Wood", amount, 1.0, "Acme", "A").unwrap();
                match item.consume(quantity) {
                    Ok(()) => prop_assert_eq!(item.amount(), amount - quantity),
                    Err(_) => prop_assert_eq!(item.amount(), amount),
                }
                prop_assert!(item.amount() >= 0);
            }

            #[test]
            fn condition_stays_in_range(start in 0i64..=100, ops in prop::collection::vec(any::<bool>(), 0..50)) {
                let mut tool = Item::tool("Drill", 1, 1.0, 0, start).unwrap();
                let mut user = User::create("Alice", 30).unwrap();
                for use_it in ops {
                    if use_it {
                        let _ = tool.use_tool(&mut user);
                    } else {
                        tool.fix_tool().unwrap();
                    }
                    let condition = tool.tool_spec().unwrap().condition;
                    prop_assert!((0..=CONDITION_MAX).contains(&condition));
                }
                prop_assert!(tool.tool_spec().unwrap().borrowed_by.len() <= 1);
            }
        }
    }
}
