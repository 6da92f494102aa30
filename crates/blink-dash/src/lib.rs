//! The Blink dash ability and its headless runtime.
//!
//! `DashAbility` composes the lifecycle machine, cooldown policy, target
//! resolver and trail pool; `DashEngine` drives it tick by tick over a
//! hecs world and a static scene.

pub mod ability;
pub mod collaborators;
pub mod engine;
pub mod motion;
pub mod pool;
pub mod world_setup;

pub use blink_core as core;
pub use ability::{DashAbility, DashStats};
pub use collaborators::{
    AgentHandle, Afterimage, AimSource, Animator, CameraRig, DashContext, EffectSink,
    FeedbackRecorder,
};
pub use engine::{DashEngine, EngineConfig};
pub use motion::{DashMotion, SnapshotCadence};
pub use pool::{EntityPool, TrailSnapshot};
