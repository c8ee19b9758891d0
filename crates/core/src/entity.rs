//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Every stored record has a stable identifier and a human-facing name. The
/// name is the lookup key used by the shell; the id is what the store keys on.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + Into<uuid::Uuid>;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Returns the lookup name.
    fn name(&self) -> &str;
}
