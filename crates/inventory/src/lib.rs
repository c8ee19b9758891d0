//! Inventory domain module.
//!
//! This crate contains business rules for items, materials, tools and the
//! users who consume them, implemented purely as deterministic domain logic
//! (no IO, no storage). Callers persist whatever the rules mutate.

pub mod build;
pub mod item;
pub mod patch;
pub mod user;

pub use build::{BuildEntry, BuildFailure, BuildOutcome, BuildReport, BuildRequest, MaterialUsage};
pub use item::{
    CONDITION_MAX, Item, ItemKind, ItemType, MaterialSpec, TOOL_REPAIR_STEP, TOOL_USABLE_ABOVE,
    TOOL_WEAR_PER_USE, ToolSpec,
};
pub use patch::{ItemPatch, UserPatch};
pub use user::User;
