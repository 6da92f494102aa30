//! Fundamental geometric types.
//!
//! World space is right-handed with +Y up. Distances are world units.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// World up axis.
pub const UP: Vec3 = Vec3::Y;

/// Position and orientation of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Same orientation, different position.
    pub fn with_position(self, position: Vec3) -> Self {
        Self { position, ..self }
    }

    /// Facing direction (local -Z).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Distance on the XZ plane (ignoring height).
    pub fn horizontal_distance_to(&self, other: &Transform) -> f32 {
        let d = other.position - self.position;
        (d.x * d.x + d.z * d.z).sqrt()
    }
}

/// A half-line used for aiming. `direction` is unit length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRay")]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Wire form of [`Ray`]; decoding goes through [`Ray::new`].
#[derive(Deserialize)]
struct RawRay {
    origin: Vec3,
    direction: Vec3,
}

impl From<RawRay> for Ray {
    fn from(raw: RawRay) -> Self {
        Ray::new(raw.origin, raw.direction)
    }
}

impl Ray {
    /// Build a ray, normalizing the direction. A zero direction stays zero.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Ray from `origin` through `target`.
    pub fn toward(origin: Vec3, target: Vec3) -> Self {
        Self::new(origin, target - origin)
    }

    /// Point at distance `t` along the ray.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Identifier of a collider known to the spatial query provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColliderId(pub u32);

/// Result of a spatial query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Contact point on the surface.
    pub position: Vec3,
    /// Unit surface normal at the contact.
    pub normal: Vec3,
    /// Distance travelled along the query before contact.
    pub distance: f32,
    pub collider: ColliderId,
}

impl Hit {
    /// Alignment of the surface normal with world up (1 = flat floor, 0 = wall).
    pub fn flatness(&self) -> f32 {
        self.normal.dot(UP)
    }

    /// Whether the surface is flat enough to stand on.
    pub fn is_walkable(&self, threshold: f32) -> bool {
        self.flatness() >= threshold
    }
}

/// Drop the vertical component of a vector.
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}
