//! Entity and aggregate-root traits: identity + continuity across state changes.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Aggregate root marker + minimal interface.
///
/// An aggregate root is the single entry point of a consistency boundary:
/// every mutation goes through a named operation on the root, which validates
/// and then commits atomically. The root never exposes raw field setters.
pub trait AggregateRoot: Entity {
    /// Monotonically increasing version of the aggregate's state.
    ///
    /// Bumped once per committed named operation; useful for optimistic
    /// conflict detection at the storage boundary.
    fn version(&self) -> u64;
}
