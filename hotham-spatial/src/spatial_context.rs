use glam::Affine3A;
use hecs::{Entity, World};
use log::{debug, trace};

use crate::{
    collaborators::{
        Bindings, BroadPhase, Capability, CapabilityKind, PhysicsBinding, RenderSurface,
        SyncBinding,
    },
    components::{
        Aabb, Children, InScene, Parent, PositionChanged, PositionObservers, Transform,
    },
    config::SpatialConfig,
    hierarchy,
    source::Source,
    util, SpatialResult,
};

/// Builder for [`SpatialContext`].
#[derive(Default)]
pub struct SpatialContextBuilder {
    config: SpatialConfig,
    broad_phase: Option<Box<dyn BroadPhase>>,
    render_surface: Option<Box<dyn RenderSurface>>,
}

impl SpatialContextBuilder {
    /// Create a `SpatialContextBuilder`
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the scene configuration
    pub fn config(mut self, config: SpatialConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the spatial index that is told whenever an object's bounds move
    pub fn broad_phase(mut self, broad_phase: impl BroadPhase + 'static) -> Self {
        self.broad_phase = Some(Box::new(broad_phase));
        self
    }

    /// Set the surface that is invalidated whenever an object's bounds are recomputed
    pub fn render_surface(mut self, render_surface: impl RenderSurface + 'static) -> Self {
        self.render_surface = Some(Box::new(render_surface));
        self
    }

    /// Build the `SpatialContext`
    pub fn build(self) -> SpatialContext {
        SpatialContext {
            config: self.config,
            broad_phase: self.broad_phase.unwrap_or_else(|| Box::new(())),
            render_surface: self.render_surface.unwrap_or_else(|| Box::new(())),
        }
    }
}

/// One unit of work while propagating a change through the hierarchy.
#[derive(Debug, Clone, Copy)]
enum Step {
    /// Compose the object's world matrix from its local matrix and `parent_world`.
    Compose {
        entity: Entity,
        parent_world: Affine3A,
    },
    /// The object's world matrix changed: update its bounds, then its children.
    Changed(Entity),
    /// The object and all of its descendants are up to date.
    Settled(Entity),
    /// Tell physics and drop cached inverses.
    Finish(Entity),
}

/// Owns the per-scene state needed to move objects around: configuration, and the broad-phase
/// and render collaborators that every object shares.
///
/// All operations run synchronously to completion, including propagation to every descendant.
/// A parent is always fully updated (world matrix, bounds, broad-phase) before any of its children
/// begin their own update.
pub struct SpatialContext {
    config: SpatialConfig,
    broad_phase: Box<dyn BroadPhase>,
    render_surface: Box<dyn RenderSurface>,
}

impl Default for SpatialContext {
    fn default() -> Self {
        SpatialContextBuilder::new().build()
    }
}

impl SpatialContext {
    pub fn new(config: SpatialConfig) -> Self {
        SpatialContextBuilder::new().config(config).build()
    }

    pub fn builder() -> SpatialContextBuilder {
        SpatialContextBuilder::new()
    }

    pub fn config(&self) -> &SpatialConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SpatialConfig) {
        self.config = config;
    }

    /// Attach a [`Transform`] to `entity`, binding it to whatever capabilities the entity already
    /// has. The transform's world matrix is composed with its parent's, if any, and the usual
    /// change notifications are raised.
    pub fn attach_transform(
        &mut self,
        world: &mut World,
        entity: Entity,
        mut transform: Transform,
    ) -> SpatialResult<()> {
        transform.bindings = Bindings::resolve(world, entity);
        transform.local_matrix_changed = true;
        world.insert_one(entity, transform)?;
        if world.get::<&PositionObservers>(entity).is_err() {
            world.insert_one(entity, PositionObservers::default())?;
        }
        debug!("Attached transform to {entity:?}");

        self.update_world_matrix(world, entity, None)
    }

    /// Remove `entity`'s [`Transform`] along with its observers, and drop it from the broad-phase.
    ///
    /// `entity` leaves the hierarchy: it is removed from its parent's children, and its own
    /// children become roots, keeping their current world positions.
    pub fn detach_transform(
        &mut self,
        world: &mut World,
        entity: Entity,
    ) -> SpatialResult<Transform> {
        world.get::<&Transform>(entity)?;

        let children = world
            .get::<&Children>(entity)
            .map(|children| children.iter().collect::<Vec<_>>())
            .unwrap_or_default();
        for child in children {
            if world.get::<&Transform>(child).is_ok() {
                hierarchy::remove_child(world, self, entity, child)?;
            } else {
                let _ = world.remove_one::<Parent>(child);
            }
        }

        if let Some(parent) = parent_of(world, entity) {
            if let Ok(mut children) = world.get::<&mut Children>(parent) {
                children.remove(entity);
            }
            world.remove_one::<Parent>(entity)?;
        }

        let transform = world.remove_one::<Transform>(entity)?;
        let _ = world.remove_one::<PositionObservers>(entity);
        self.broad_phase.remove_entity(entity);
        debug!("Detached transform from {entity:?}");

        Ok(transform)
    }

    /// Add a capability to `entity`, updating the bindings of its transform.
    pub fn add_capability(
        &mut self,
        world: &mut World,
        entity: Entity,
        capability: Capability,
    ) -> SpatialResult<()> {
        if let Ok(mut transform) = world.get::<&mut Transform>(entity) {
            transform.bindings.added(&capability);
        }
        debug!("Adding {:?} to {entity:?}", capability.kind());

        match capability {
            Capability::Physics(binding) => world.insert_one(entity, binding)?,
            Capability::Sync(binding) => world.insert_one(entity, binding)?,
            Capability::Hierarchy(children) => world.insert_one(entity, children)?,
        }

        Ok(())
    }

    /// Remove a capability from `entity`, updating the bindings of its transform.
    pub fn remove_capability(
        &mut self,
        world: &mut World,
        entity: Entity,
        kind: CapabilityKind,
    ) -> SpatialResult<()> {
        match kind {
            CapabilityKind::Physics => {
                world.remove_one::<PhysicsBinding>(entity)?;
            }
            CapabilityKind::Sync => {
                world.remove_one::<SyncBinding>(entity)?;
            }
            CapabilityKind::Hierarchy => {
                world.remove_one::<Children>(entity)?;
            }
        }

        if let Ok(mut transform) = world.get::<&mut Transform>(entity) {
            transform.bindings.removed(kind);
        }
        debug!("Removed {kind:?} from {entity:?}");

        Ok(())
    }

    /// Move `entity` so that its world matrix becomes `matrix`.
    ///
    /// If the transform has a scale override, `matrix` is normalised and rescaled first. If the
    /// entity has a parent, its local matrix becomes `matrix` relative to the parent's world matrix.
    ///
    /// Returns `false` without notifying anyone if neither the local matrix nor the parent's world
    /// matrix changed.
    ///
    /// ## Panics
    /// In debug builds, if `matrix` is not finite or is degenerate.
    pub fn set_world_matrix(
        &mut self,
        world: &mut World,
        entity: Entity,
        matrix: Affine3A,
        source: Option<Source>,
    ) -> SpatialResult<bool> {
        util::assert_valid_matrix(&matrix);

        let parent = parent_of(world, entity);
        let parent_world = match parent {
            Some(parent) => *world.get::<&Transform>(parent)?.world(),
            None => Affine3A::IDENTITY,
        };

        {
            let mut transform = world.get::<&mut Transform>(entity)?;
            let matrix = transform.apply_scale(matrix);
            let local = match parent {
                Some(_) => parent_world.inverse() * matrix,
                None => matrix,
            };

            let epsilon = self.config.epsilon;
            if util::approx_eq(&transform.local, &local, epsilon)
                && util::approx_eq(&transform.previous_parent_world, &parent_world, epsilon)
            {
                return Ok(false);
            }

            transform.local_matrix_changed = true;
            transform.local = local;
        }

        self.update_world_matrix(world, entity, source)?;

        if parent.is_none() {
            self.request_position_sync(world, entity, source)?;
        }

        Ok(true)
    }

    /// Recompute `entity`'s world state after its local matrix changed.
    ///
    /// Parented entities are composed with their parent's current world matrix. Root entities
    /// take their local matrix as their world matrix and are always treated as changed.
    pub fn update_world_matrix(
        &mut self,
        world: &mut World,
        entity: Entity,
        source: Option<Source>,
    ) -> SpatialResult<()> {
        if let Some(parent) = parent_of(world, entity) {
            let parent_world = *world.get::<&Transform>(parent)?.world();
            self.update_world_matrix_with_parent(world, entity, parent_world, source)?;
            return Ok(());
        }

        {
            let mut transform = world.get::<&mut Transform>(entity)?;
            transform.world = transform.local;
            transform.previous_parent_world = Affine3A::IDENTITY;
            transform.local_matrix_changed = false;
        }

        self.run(world, vec![Step::Finish(entity), Step::Changed(entity)], source)
    }

    /// Compose `entity`'s world matrix with `parent_world` and propagate the result.
    ///
    /// Does nothing and returns `false` if `parent_world` is the same as last time and the local
    /// matrix has not changed since.
    pub fn update_world_matrix_with_parent(
        &mut self,
        world: &mut World,
        entity: Entity,
        parent_world: Affine3A,
        source: Option<Source>,
    ) -> SpatialResult<bool> {
        if !self.compose(world, entity, parent_world)? {
            return Ok(false);
        }

        self.run(world, vec![Step::Finish(entity), Step::Changed(entity)], source)?;
        Ok(true)
    }

    /// Push `entity`'s world matrix down to each of its children, in order.
    /// Does nothing if the entity has no hierarchy.
    pub fn update_children(
        &mut self,
        world: &mut World,
        entity: Entity,
        source: Option<Source>,
    ) -> SpatialResult<()> {
        let mut stack = Vec::new();
        self.push_children(world, entity, &mut stack)?;
        self.run(world, stack, source)
    }

    /// Recompute `entity`'s world bounds from its local bounds and invalidate it for rendering.
    pub fn update_world_volume(&mut self, world: &mut World, entity: Entity) -> SpatialResult<()> {
        world.get::<&mut Transform>(entity)?.update_world_volume();
        self.render_surface.invalidate(entity);
        Ok(())
    }

    /// Make a change to `entity`'s world matrix visible to the rest of the scene: bounds,
    /// broad-phase, children and finally observers.
    ///
    /// ## Panics
    /// In debug builds, if `source` is `entity` itself. This means a collaborator fed the
    /// entity's own change back into it.
    pub fn on_world_position_changed(
        &mut self,
        world: &mut World,
        entity: Entity,
        source: Option<Source>,
    ) -> SpatialResult<()> {
        self.run(world, vec![Step::Changed(entity)], source)
    }

    /// Set `entity`'s local bounds, and rebuild its broad-phase proxy.
    pub fn set_local_aabb(
        &mut self,
        world: &mut World,
        entity: Entity,
        aabb: Aabb,
    ) -> SpatialResult<()> {
        world.get::<&mut Transform>(entity)?.set_local_bounds(aabb);
        self.update_world_volume(world, entity)?;

        let world_aabb = *world.get::<&Transform>(entity)?.world_aabb();
        self.broad_phase.update_shape(entity, &world_aabb);
        Ok(())
    }

    fn compose(
        &self,
        world: &World,
        entity: Entity,
        parent_world: Affine3A,
    ) -> SpatialResult<bool> {
        let mut transform = world.get::<&mut Transform>(entity)?;
        if !transform.local_matrix_changed
            && util::approx_eq(&transform.previous_parent_world, &parent_world, self.config.epsilon)
        {
            return Ok(false);
        }

        transform.local_matrix_changed = false;
        transform.world = parent_world * transform.local;
        transform.previous_parent_world = parent_world;
        Ok(true)
    }

    fn push_children(
        &self,
        world: &World,
        entity: Entity,
        stack: &mut Vec<Step>,
    ) -> SpatialResult<()> {
        let transform = world.get::<&Transform>(entity)?;
        if !transform.bindings.hierarchy {
            return Ok(());
        }

        let Ok(children) = world.get::<&Children>(entity) else {
            return Ok(());
        };

        // Reversed, so the first child is popped first.
        for child in children.iter().rev() {
            if world.get::<&Transform>(child).is_err() {
                trace!("Skipping child {child:?} of {entity:?}, it has no transform");
                continue;
            }
            stack.push(Step::Compose {
                entity: child,
                parent_world: transform.world,
            });
        }

        Ok(())
    }

    fn run(
        &mut self,
        world: &mut World,
        mut stack: Vec<Step>,
        source: Option<Source>,
    ) -> SpatialResult<()> {
        while let Some(step) = stack.pop() {
            match step {
                Step::Compose {
                    entity,
                    parent_world,
                } => {
                    if self.compose(world, entity, parent_world)? {
                        stack.push(Step::Finish(entity));
                        stack.push(Step::Changed(entity));
                    }
                }
                Step::Changed(entity) => {
                    debug_assert!(
                        source != Some(Source::Entity(entity)),
                        "Recursion detected! {entity:?} was moved by its own position change"
                    );
                    trace!("{entity:?} moved, source: {source:?}");

                    self.update_world_volume(world, entity)?;
                    let world_aabb = *world.get::<&Transform>(entity)?.world_aabb();
                    self.broad_phase.move_entity(entity, &world_aabb);

                    stack.push(Step::Settled(entity));
                    self.push_children(world, entity, &mut stack)?;
                }
                Step::Settled(entity) => {
                    if let Ok(observers) = world.get::<&PositionObservers>(entity) {
                        observers.notify(&PositionChanged { entity, source });
                    }
                }
                Step::Finish(entity) => {
                    let physics = {
                        let mut transform = world.get::<&mut Transform>(entity)?;
                        transform.mark_inverses_dirty();
                        transform.bindings.physics.clone()
                    };

                    if let Some(physics) = physics {
                        if physics.provider().is_enabled() && !physics.is_source(source) {
                            physics
                                .provider()
                                .on_world_position_changed(world, self, entity, source);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn request_position_sync(
        &self,
        world: &World,
        entity: Entity,
        source: Option<Source>,
    ) -> SpatialResult<()> {
        if !self.config.multiplayer_enabled || !self.config.synchronization_enabled {
            return Ok(());
        }

        if world.get::<&InScene>(entity).is_err() {
            return Ok(());
        }

        let transform = world.get::<&Transform>(entity)?;
        let Some(sync) = transform.bindings.sync.as_ref() else {
            return Ok(());
        };

        if !sync.is_source(source) && sync.provider().is_eligible() {
            sync.provider()
                .request_position_broadcast(entity, &transform.world);
        }

        Ok(())
    }
}

pub(crate) fn parent_of(world: &World, entity: Entity) -> Option<Entity> {
    world.get::<&Parent>(entity).ok().map(|p| p.0)
}
