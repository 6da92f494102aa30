//! Ability lifecycle engine for Blink.
//!
//! A generic activation/deactivation state machine with scoped resource
//! cleanup, a synchronous event channel, a cooperative scheduler for
//! deferred and per-frame continuations, and a cooldown policy layered on
//! top of lifecycle events. Everything is single-threaded.

pub mod channel;
pub mod cooldown;
pub mod liveness;
pub mod machine;
pub mod scheduler;
pub mod scope;

pub use blink_core as core;
pub use channel::{EventChannel, Subscription};
pub use cooldown::Cooldown;
pub use liveness::LivenessToken;
pub use machine::{AbilityHooks, AbilityStateMachine, ActivationFlow, CooldownFlag};
pub use scheduler::{FrameControl, Scheduler, TaskHandle};
pub use scope::{Destroy, Disposable, ScopedResourceSet};

#[cfg(test)]
mod tests;
