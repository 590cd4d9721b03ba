//! Aggregate root trait for document-style domain models.

/// Aggregate root marker + minimal interface.
///
/// An aggregate owns its children outright (a document header owns its line
/// items): it is persisted and removed as one unit, and nothing outside the
/// aggregate holds a reference to a child.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Child records owned by the aggregate.
    type Child;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// Owned children, in their persisted order.
    fn children(&self) -> &[Self::Child];
}
