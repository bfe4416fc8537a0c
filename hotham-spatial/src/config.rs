use serde::{Deserialize, Serialize};

use crate::SpatialResult;

/// Default tolerance used when deciding whether a matrix actually changed
pub const DEFAULT_EPSILON: f32 = 1e-4;

/// Per-scene configuration for [`crate::SpatialContext`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Whether the scene is part of a multiplayer session
    pub multiplayer_enabled: bool,
    /// Whether root objects broadcast their position to other players when moved
    pub synchronization_enabled: bool,
    /// Absolute per-element tolerance for matrix comparisons
    pub epsilon: f32,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            multiplayer_enabled: false,
            synchronization_enabled: true,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl SpatialConfig {
    /// Configuration for a multiplayer scene with position synchronisation
    pub fn multiplayer() -> Self {
        Self {
            multiplayer_enabled: true,
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> SpatialResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
