//! Core types and definitions for the Blink dash ability.
//!
//! This crate defines the vocabulary shared across all other crates:
//! geometry, ECS components, configuration, commands, events, clocks and
//! snapshots.
//! It has no dependency on any engine or runtime framework.

pub mod clock;
pub mod commands;
pub mod components;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod state;
pub mod types;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use components::{AgentBody, Appearance, Pooled, TrailPart, TrailTemplate};
pub use config::{DashConfig, PoolConfig, ResolveFailurePolicy, ResolverConfig};
pub use error::{ConfigError, ResolveFailure};
pub use types::{ColliderId, Hit, Ray, Transform};
