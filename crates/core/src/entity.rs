//! Entities: values that keep their identity while their state changes.

/// Something addressed by a stable key.
///
/// An inventory record is an entity keyed by its sku: marking it sold changes
/// its state, not which record it is.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Same identity, regardless of state.
    fn same_identity(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
