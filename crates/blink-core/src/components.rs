//! ECS components for hecs entities.
//!
//! Components are plain data structs. Behaviour lives in the dash crate.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::{AGENT_HIP_HEIGHT, TRAIL_HIDDEN_TRANSPARENCY};
use crate::types::{ColliderId, Transform};

/// The controllable agent's body. Its root sits `hip_height` above the feet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentBody {
    pub hip_height: f32,
    /// Collider excluded from the agent's own dash queries.
    pub collider: Option<ColliderId>,
    pub movement_locked: bool,
}

impl Default for AgentBody {
    fn default() -> Self {
        Self {
            hip_height: AGENT_HIP_HEIGHT,
            collider: None,
            movement_locked: false,
        }
    }
}

/// Visual state of a pooled snapshot entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    /// 0.0 = opaque, 1.0 = invisible.
    pub transparency: f32,
    pub collidable: bool,
}

impl Appearance {
    /// The state every pooled entity is reset to on checkout.
    pub const HIDDEN: Self = Self {
        transparency: TRAIL_HIDDEN_TRANSPARENCY,
        collidable: false,
    };
}

/// Marks an entity as owned by a pool, with its fixed slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pooled {
    pub slot: usize,
}

/// One rigid piece of the agent silhouette, relative to the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailPart {
    pub name: String,
    pub offset: Transform,
    pub size: Vec3,
}

/// Visual template cloned into every trail snapshot entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailTemplate {
    pub name: String,
    pub parts: Vec<TrailPart>,
}

impl Default for TrailTemplate {
    /// A single torso-sized box, enough for a readable silhouette.
    fn default() -> Self {
        Self {
            name: "Afterimage".to_string(),
            parts: vec![TrailPart {
                name: "Body".to_string(),
                offset: Transform::IDENTITY,
                size: Vec3::new(1.0, 2.0, 1.0),
            }],
        }
    }
}
