use hecs::{Entity, World};
use log::debug;

use crate::{
    collaborators::Capability,
    components::{Children, Parent, Transform},
    spatial_context::parent_of,
    SpatialContext, SpatialError, SpatialResult,
};

/// Make `child` a child of `parent`, keeping `child` where it currently is in the world.
///
/// If `child` already had a different parent it is removed from that parent's children first.
/// The parent gains the hierarchy capability if it did not have it.
pub fn add_child(
    world: &mut World,
    spatial_context: &mut SpatialContext,
    parent: Entity,
    child: Entity,
) -> SpatialResult<()> {
    if parent == child || is_ancestor(world, child, parent) {
        return Err(SpatialError::HierarchyCycle { parent, child });
    }

    // Both ends need a transform before the hierarchy is touched.
    world.get::<&Transform>(parent)?;
    let current = *world.get::<&Transform>(child)?.world();

    match parent_of(world, child) {
        Some(existing) if existing == parent => return Ok(()),
        Some(existing) => {
            if let Ok(mut children) = world.get::<&mut Children>(existing) {
                children.remove(child);
            }
        }
        None => {}
    }

    let has_children = match world.get::<&mut Children>(parent) {
        Ok(mut children) => {
            children.push(child);
            true
        }
        Err(_) => false,
    };
    if !has_children {
        let children = Children::from_iter([child]);
        spatial_context.add_capability(world, parent, Capability::Hierarchy(children))?;
    }

    world.insert_one(child, Parent(parent))?;
    debug!("{child:?} is now a child of {parent:?}");

    spatial_context.set_world_matrix(world, child, current, None)?;

    Ok(())
}

/// Detach `child` from `parent`, keeping `child` where it currently is in the world.
///
/// Returns `false` if `child` was not a child of `parent`.
pub fn remove_child(
    world: &mut World,
    spatial_context: &mut SpatialContext,
    parent: Entity,
    child: Entity,
) -> SpatialResult<bool> {
    if parent_of(world, child) != Some(parent) {
        return Ok(false);
    }

    let current = *world.get::<&Transform>(child)?.world();
    if let Ok(mut children) = world.get::<&mut Children>(parent) {
        children.remove(child);
    }
    world.remove_one::<Parent>(child)?;
    debug!("{child:?} is no longer a child of {parent:?}");

    spatial_context.set_world_matrix(world, child, current, None)?;

    Ok(true)
}

/// Whether `ancestor` is `entity`'s parent, or its parent's parent, and so on.
pub fn is_ancestor(world: &World, ancestor: Entity, entity: Entity) -> bool {
    let mut current = entity;
    while let Some(parent) = parent_of(world, current) {
        if parent == ancestor {
            return true;
        }
        current = parent;
    }
    false
}
