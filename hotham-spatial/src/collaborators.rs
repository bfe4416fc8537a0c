use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use glam::Affine3A;
use hecs::{Entity, World};

use crate::{
    components::{bounds::Aabb, Children},
    source::Source,
    SpatialContext,
};

static NEXT_PROVIDER_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a bound collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId(u64);

impl ProviderId {
    fn next() -> Self {
        ProviderId(NEXT_PROVIDER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A physics body that mirrors an object's world position.
pub trait PhysicsProvider: Send + Sync {
    /// Disabled providers are not told about position changes.
    fn is_enabled(&self) -> bool;

    /// Called after `entity`'s world matrix changed because of something other than this provider.
    ///
    /// The provider may read or write the world, including moving the object again, as long as it
    /// does not claim the object itself as the source of that move.
    fn on_world_position_changed(
        &self,
        world: &mut World,
        spatial_context: &mut SpatialContext,
        entity: Entity,
        source: Option<Source>,
    );

    /// Where the physics simulation currently has the object, if it is driving its position.
    fn world_position(&self) -> Option<Affine3A> {
        None
    }
}

/// Broadcasts an object's position to other participants of a multiplayer session.
pub trait SyncProvider: Send + Sync {
    /// Whether this object should currently be synchronised at all.
    fn is_eligible(&self) -> bool {
        true
    }

    fn request_position_broadcast(&self, entity: Entity, world_matrix: &Affine3A);
}

/// Spatial index used for fast bounds queries.
pub trait BroadPhase {
    /// The object's world bounds moved.
    fn move_entity(&mut self, entity: Entity, world_aabb: &Aabb);

    /// The object's shape changed and its proxy should be rebuilt.
    fn update_shape(&mut self, entity: Entity, world_aabb: &Aabb);

    /// The object no longer has a transform.
    fn remove_entity(&mut self, _entity: Entity) {}
}

/// Whatever draws the object.
pub trait RenderSurface {
    /// The object's world matrix or bounds changed; anything derived from them must be redrawn.
    fn invalidate(&mut self, entity: Entity);
}

impl BroadPhase for () {
    fn move_entity(&mut self, _: Entity, _: &Aabb) {}
    fn update_shape(&mut self, _: Entity, _: &Aabb) {}
}

impl RenderSurface for () {
    fn invalidate(&mut self, _: Entity) {}
}

/// A collaborator attached to an object, paired with the identity used for `source` comparisons.
///
/// Bindings are stored as components on the object's entity, and a copy is cached by the
/// object's [`crate::components::Transform`].
pub struct Binding<T: ?Sized> {
    id: ProviderId,
    provider: Arc<T>,
}

impl<T: ?Sized> Binding<T> {
    pub fn from_arc(provider: Arc<T>) -> Self {
        Self {
            id: ProviderId::next(),
            provider,
        }
    }

    pub fn id(&self) -> ProviderId {
        self.id
    }

    /// The [`Source`] this collaborator should pass when it moves the object.
    pub fn source(&self) -> Source {
        Source::Provider(self.id)
    }

    pub fn provider(&self) -> &Arc<T> {
        &self.provider
    }

    pub(crate) fn is_source(&self, source: Option<Source>) -> bool {
        source == Some(Source::Provider(self.id))
    }
}

impl<T: ?Sized> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            provider: self.provider.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding").field("id", &self.id).finish()
    }
}

/// Component binding a physics body to an object
pub type PhysicsBinding = Binding<dyn PhysicsProvider>;
/// Component binding a network synchroniser to an object
pub type SyncBinding = Binding<dyn SyncProvider>;

impl PhysicsBinding {
    pub fn physics<P: PhysicsProvider + 'static>(provider: P) -> Self {
        Self::from_arc(Arc::new(provider))
    }
}

impl SyncBinding {
    pub fn sync<S: SyncProvider + 'static>(provider: S) -> Self {
        Self::from_arc(Arc::new(provider))
    }
}

/// A capability that can be added to an object's entity.
#[derive(Debug)]
pub enum Capability {
    Physics(PhysicsBinding),
    Sync(SyncBinding),
    Hierarchy(Children),
}

impl Capability {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Capability::Physics(_) => CapabilityKind::Physics,
            Capability::Sync(_) => CapabilityKind::Sync,
            Capability::Hierarchy(_) => CapabilityKind::Hierarchy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    Physics,
    Sync,
    Hierarchy,
}

/// Copies of the collaborators attached to an object, kept current by [`SpatialContext`].
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    pub(crate) physics: Option<PhysicsBinding>,
    pub(crate) sync: Option<SyncBinding>,
    pub(crate) hierarchy: bool,
}

impl Bindings {
    /// Resolve every capability currently attached to `entity`.
    pub(crate) fn resolve(world: &World, entity: Entity) -> Self {
        Self {
            physics: world.get::<&PhysicsBinding>(entity).ok().map(|b| (*b).clone()),
            sync: world.get::<&SyncBinding>(entity).ok().map(|b| (*b).clone()),
            hierarchy: world.get::<&Children>(entity).is_ok(),
        }
    }

    pub(crate) fn added(&mut self, capability: &Capability) {
        match capability {
            Capability::Physics(b) => self.physics = Some(b.clone()),
            Capability::Sync(b) => self.sync = Some(b.clone()),
            Capability::Hierarchy(_) => self.hierarchy = true,
        }
    }

    pub(crate) fn removed(&mut self, kind: CapabilityKind) {
        match kind {
            CapabilityKind::Physics => self.physics = None,
            CapabilityKind::Sync => self.sync = None,
            CapabilityKind::Hierarchy => self.hierarchy = false,
        }
    }

    pub fn physics(&self) -> Option<&PhysicsBinding> {
        self.physics.as_ref()
    }

    pub fn sync(&self) -> Option<&SyncBinding> {
        self.sync.as_ref()
    }

    pub fn has_hierarchy(&self) -> bool {
        self.hierarchy
    }
}
