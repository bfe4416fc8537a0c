//! Spatial state for Hotham scenes.
//!
//! Every object that has a position in a scene carries a [`components::Transform`]. The transform
//! holds the object's local matrix, its world matrix and its bounds, and [`SpatialContext`] keeps
//! them consistent across a hierarchy of [`components::Parent`] and [`components::Children`]:
//! moving an object moves all of its descendants, top-down, before the call returns.
//!
//! Every effective change is announced exactly once to the collaborators that care about it:
//! the broad-phase index ([`collaborators::BroadPhase`]), the renderer
//! ([`collaborators::RenderSurface`]), the object's physics body
//! ([`collaborators::PhysicsProvider`]), its network synchroniser
//! ([`collaborators::SyncProvider`]) and any [`components::PositionObservers`]. Collaborators that
//! move an object in response pass their own [`Source`], so the change is not echoed back to them.
//!
//! # Getting started
//! ```ignore
//! let mut world = hecs::World::new();
//! let mut spatial_context = SpatialContext::default();
//!
//! let parent = world.spawn(());
//! spatial_context.attach_transform(&mut world, parent, Transform::default())?;
//! let child = world.spawn(());
//! spatial_context.attach_transform(&mut world, child, Transform::default())?;
//! hierarchy::add_child(&mut world, &mut spatial_context, parent, child)?;
//!
//! spatial_context.set_world_matrix(&mut world, parent, Affine3A::from_translation(Vec3::X), None)?;
//! ```

pub use glam;
pub use hecs;
pub use rapier3d;

pub use collaborators::{Binding, Capability, CapabilityKind, PhysicsBinding, SyncBinding};
pub use config::SpatialConfig;
pub use source::Source;
pub use spatial_context::{SpatialContext, SpatialContextBuilder};
pub use spatial_error::SpatialError;

/// Traits implemented by the systems that are told about position changes
pub mod collaborators;
/// Components are data attached to an object's entity
pub mod components;
pub mod config;
/// Functions to edit the hierarchy without moving anything
pub mod hierarchy;
/// Integration with rapier3d
pub mod physics;
mod source;
mod spatial_context;
mod spatial_error;
/// Matrix helpers
pub mod util;

/// Hotham spatial result type
pub type SpatialResult<T> = std::result::Result<T, SpatialError>;
