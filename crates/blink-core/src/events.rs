//! Lifecycle events published by an ability.

use serde::{Deserialize, Serialize};

use crate::types::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AbilityEvent {
    /// Activation succeeded at clock time `at` (seconds).
    Activated { at: f64 },
    /// The ability went back to idle. The session scope is already clean.
    Deactivated,
    /// The ability was torn down and can never activate again.
    Destroyed,
}

/// Presentation requests made by a dash, recorded by the headless engine in
/// place of a real camera, animator and effect pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FeedbackEvent {
    Animation { name: String, duration: f64 },
    FovPulse { duration: f64, degrees: f32 },
    CameraShake { duration: f64, magnitude: f32 },
    ImpactFrame { duration: f64 },
    Afterimage { transform: Transform, fade_secs: f64 },
}
