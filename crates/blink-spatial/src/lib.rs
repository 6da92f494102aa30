//! Spatial queries and dash target resolution for Blink.
//!
//! The host engine implements [`SpatialQuery`]; [`StaticScene`] is a small
//! reference implementation used headless and in tests.

pub mod query;
pub mod resolver;
pub mod scene;

pub use blink_core as core;
pub use query::{QueryFilter, SpatialQuery};
pub use resolver::{Resolution, ResolutionPath, TargetResolver};
pub use scene::{Collider, Shape, StaticScene};

#[cfg(test)]
mod tests;
