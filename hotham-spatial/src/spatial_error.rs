use hecs::{ComponentError, Entity, NoSuchEntity};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpatialError {
    #[error("The entity does not exist")]
    NoSuchEntity(#[from] NoSuchEntity),
    #[error("The entity is missing a required component")]
    MissingComponent(#[from] ComponentError),
    #[error("Invalid transform: {0}")]
    InvalidTransform(&'static str),
    #[error("Making {child:?} a child of {parent:?} would create a cycle")]
    HierarchyCycle { parent: Entity, child: Entity },
    #[error("Unable to parse configuration")]
    Config(#[from] serde_json::Error),
}
