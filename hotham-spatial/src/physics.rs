use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use glam::Affine3A;
use hecs::{Entity, World};
use log::warn;
use rapier3d::prelude::{RigidBodyHandle, RigidBodySet, RigidBodyType};

use crate::{
    collaborators::{PhysicsBinding, PhysicsProvider},
    components::{Parent, Transform},
    source::Source,
    util, SpatialContext, SpatialResult,
};

/// A rapier3d rigid body that follows its object around.
///
/// There are two ways an object with a `RapierBody` can move:
///
/// 1. **Game controlled** - the game calls [`SpatialContext::set_world_matrix`] and the body is
///    moved to match. Kinematic bodies are given a next kinematic position, anything else is
///    teleported.
/// 1. **Physics controlled** - a [`RigidBodyType::Dynamic`] body is simulated, and
///    [`physics_system`] copies its position back onto the object. The body is not told about
///    that change, as it caused it.
pub struct RapierBody {
    handle: RigidBodyHandle,
    rigid_bodies: Arc<Mutex<RigidBodySet>>,
    enabled: AtomicBool,
}

impl RapierBody {
    pub fn new(rigid_bodies: Arc<Mutex<RigidBodySet>>, handle: RigidBodyHandle) -> Self {
        Self {
            handle,
            rigid_bodies,
            enabled: AtomicBool::new(true),
        }
    }

    pub fn handle(&self) -> RigidBodyHandle {
        self.handle
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }
}

impl PhysicsProvider for RapierBody {
    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    fn on_world_position_changed(
        &self,
        world: &mut World,
        _spatial_context: &mut SpatialContext,
        entity: Entity,
        _source: Option<Source>,
    ) {
        let Ok(transform) = world.get::<&Transform>(entity) else {
            return;
        };
        let position = util::isometry_from_affine(transform.world());

        let Ok(mut rigid_bodies) = self.rigid_bodies.lock() else {
            warn!("Rigid body set is poisoned, not moving {:?}", self.handle);
            return;
        };
        if let Some(rigid_body) = rigid_bodies.get_mut(self.handle) {
            if rigid_body.is_kinematic() {
                rigid_body.set_next_kinematic_position(position);
            } else {
                rigid_body.set_position(position, true);
            }
        }
    }

    fn world_position(&self) -> Option<Affine3A> {
        let Ok(rigid_bodies) = self.rigid_bodies.lock() else {
            warn!("Rigid body set is poisoned, can't read {:?}", self.handle);
            return None;
        };
        let rigid_body = rigid_bodies.get(self.handle)?;
        if rigid_body.body_type() != RigidBodyType::Dynamic {
            return None;
        }

        Some(util::affine_from_isometry(rigid_body.position()))
    }
}

/// Copy the position of every physics controlled root object from the physics simulation.
///
/// Run this after the physics simulation has been stepped.
pub fn physics_system(
    world: &mut World,
    spatial_context: &mut SpatialContext,
) -> SpatialResult<()> {
    let bodies = world
        .query::<(&PhysicsBinding, &Transform)>()
        .without::<&Parent>()
        .iter()
        .map(|(entity, (binding, _))| (entity, binding.clone()))
        .collect::<Vec<_>>();

    for (entity, binding) in bodies {
        if !binding.provider().is_enabled() {
            continue;
        }

        if let Some(position) = binding.provider().world_position() {
            spatial_context.set_world_matrix(world, entity, position, Some(binding.source()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{collaborators::Capability, components::PositionObservers};
    use approx::assert_relative_eq;
    use glam::{Quat, Vec3};
    use rapier3d::{
        na::{Isometry3 as Isometry, Vector3},
        prelude::RigidBodyBuilder,
    };
    use std::sync::atomic::AtomicUsize;

    fn setup(
        rigid_body_type: RigidBodyType,
    ) -> (World, SpatialContext, Entity, Arc<Mutex<RigidBodySet>>, RigidBodyHandle) {
        let mut world = World::new();
        let mut spatial_context = SpatialContext::default();
        let rigid_bodies = Arc::new(Mutex::new(RigidBodySet::new()));
        let handle = rigid_bodies
            .lock()
            .unwrap()
            .insert(RigidBodyBuilder::new(rigid_body_type).build());

        let entity = world.spawn(());
        spatial_context
            .attach_transform(&mut world, entity, Transform::default())
            .unwrap();
        let binding = PhysicsBinding::physics(RapierBody::new(rigid_bodies.clone(), handle));
        spatial_context
            .add_capability(&mut world, entity, Capability::Physics(binding))
            .unwrap();

        (world, spatial_context, entity, rigid_bodies, handle)
    }

    #[test]
    pub fn test_game_controlled_body_follows_transform() {
        let (mut world, mut spatial_context, entity, rigid_bodies, handle) =
            setup(RigidBodyType::Fixed);

        let rotation = Quat::from_rotation_y(0.5);
        spatial_context
            .set_world_matrix(
                &mut world,
                entity,
                Affine3A::from_rotation_translation(rotation, [1.0, 2.0, 3.0].into()),
                None,
            )
            .unwrap();

        let rigid_bodies = rigid_bodies.lock().unwrap();
        let position = rigid_bodies[handle].position();
        assert_relative_eq!(position.translation.vector, Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(position.rotation.angle(), 0.5, epsilon = 1e-5);
    }

    #[test]
    pub fn test_kinematic_body_gets_next_position() {
        let (mut world, mut spatial_context, entity, rigid_bodies, handle) =
            setup(RigidBodyType::KinematicPositionBased);

        spatial_context
            .set_world_matrix(
                &mut world,
                entity,
                Affine3A::from_translation([4.0, 0.0, 0.0].into()),
                None,
            )
            .unwrap();

        let rigid_bodies = rigid_bodies.lock().unwrap();
        let next_position = rigid_bodies[handle].next_position();
        assert_relative_eq!(next_position.translation.vector, Vector3::new(4.0, 0.0, 0.0));
    }

    #[test]
    pub fn test_physics_system() {
        let (mut world, mut spatial_context, entity, rigid_bodies, handle) =
            setup(RigidBodyType::Dynamic);

        let moves = Arc::new(AtomicUsize::new(0));
        {
            let moves = moves.clone();
            world
                .get::<&mut PositionObservers>(entity)
                .unwrap()
                .subscribe(move |_| {
                    moves.fetch_add(1, Ordering::Relaxed);
                });
        }

        // Simulate a physics step
        move_body(&rigid_bodies, handle, -2.0);
        physics_system(&mut world, &mut spatial_context).unwrap();
        assert_relative_eq!(
            world.get::<&Transform>(entity).unwrap().translation(),
            Vec3::new(0.0, -2.0, 0.0)
        );
        assert_eq!(moves.load(Ordering::Relaxed), 1);

        // The body didn't move, so neither does the object
        physics_system(&mut world, &mut spatial_context).unwrap();
        assert_eq!(moves.load(Ordering::Relaxed), 1);

        move_body(&rigid_bodies, handle, -3.0);
        physics_system(&mut world, &mut spatial_context).unwrap();
        assert_relative_eq!(
            world.get::<&Transform>(entity).unwrap().translation(),
            Vec3::new(0.0, -3.0, 0.0)
        );
        assert_eq!(moves.load(Ordering::Relaxed), 2);
    }

    fn move_body(rigid_bodies: &Mutex<RigidBodySet>, handle: RigidBodyHandle, y: f32) {
        rigid_bodies
            .lock()
            .unwrap()
            .get_mut(handle)
            .unwrap()
            .set_position(Isometry::translation(0.0, y, 0.0), true);
    }

    #[test]
    pub fn test_disabled_body_is_ignored() {
        let rigid_bodies = Arc::new(Mutex::new(RigidBodySet::new()));
        let handle = rigid_bodies
            .lock()
            .unwrap()
            .insert(RigidBodyBuilder::fixed().build());
        let body = RapierBody::new(rigid_bodies.clone(), handle);
        body.set_enabled(false);

        let mut world = World::new();
        let mut spatial_context = SpatialContext::default();
        let entity = world.spawn((PhysicsBinding::physics(body),));
        spatial_context
            .attach_transform(&mut world, entity, Transform::default())
            .unwrap();

        spatial_context
            .set_world_matrix(
                &mut world,
                entity,
                Affine3A::from_translation([9.0, 9.0, 9.0].into()),
                None,
            )
            .unwrap();

        let rigid_bodies = rigid_bodies.lock().unwrap();
        assert_relative_eq!(
            rigid_bodies[handle].position().translation.vector,
            Vector3::<f32>::zeros()
        );
    }

    #[test]
    pub fn test_poisoned_rigid_body_set_is_tolerated() {
        let (mut world, mut spatial_context, entity, rigid_bodies, handle) =
            setup(RigidBodyType::Dynamic);
        let body = RapierBody::new(rigid_bodies.clone(), handle);

        let poisoner = rigid_bodies.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poisoning the rigid body set");
        })
        .join();
        assert!(rigid_bodies.is_poisoned());

        assert!(body.world_position().is_none());
        physics_system(&mut world, &mut spatial_context).unwrap();
        assert!(spatial_context
            .set_world_matrix(
                &mut world,
                entity,
                Affine3A::from_translation([1.0, 0.0, 0.0].into()),
                None,
            )
            .unwrap());
    }
}
