use hecs::Entity;

/// Component added to indicate that an entity has a parent.
/// The entity's local matrix is then relative to the parent's world matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub Entity);
