pub mod bounds;
pub mod children;
pub mod in_scene;
pub mod observers;
pub mod parent;
pub mod transform;

pub use bounds::{Aabb, BoundingSphere};
pub use children::Children;
pub use in_scene::InScene;
pub use observers::{ObserverId, PositionChanged, PositionObservers};
pub use parent::Parent;
pub use transform::Transform;
