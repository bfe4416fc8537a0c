/// Marks an entity as attached to the live scene.
///
/// Only objects in the scene have their position broadcast to other players.
///
/// Basic usage:
/// ```ignore
/// world.insert_one(entity, InScene {})
/// world.remove_one::<InScene>(entity)
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct InScene {}
