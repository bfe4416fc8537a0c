use hecs::Entity;

use crate::collaborators::ProviderId;

/// Identifies who caused a change to an object's world matrix.
///
/// Comparisons are by identity: two distinct providers never compare equal, even if they are the
/// same kind of provider. Changes with no interesting origin pass `None` instead of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// The object itself, or its transform
    Entity(Entity),
    /// A bound collaborator, eg. a physics body or a network synchroniser
    Provider(ProviderId),
}

impl From<Entity> for Source {
    fn from(entity: Entity) -> Self {
        Source::Entity(entity)
    }
}

impl From<ProviderId> for Source {
    fn from(id: ProviderId) -> Self {
        Source::Provider(id)
    }
}
