//! Static collision scene: a reference [`SpatialQuery`] provider.
//!
//! Shapes are one-sided where that matters (planes, panels) and sphere sweeps
//! are answered against the shape inflated by the sphere radius. Box corners
//! and panel edges are therefore square rather than rounded, which is close
//! enough for landing searches.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use blink_core::error::ConfigError;
use blink_core::types::{ColliderId, Hit};

use crate::query::{QueryFilter, SpatialQuery};

/// Directions shorter than this are treated as zero.
const EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    /// Infinite plane `normal · p = offset`, solid behind the normal.
    Plane { normal: Vec3, offset: f32 },
    /// Axis-aligned solid box.
    Cuboid { min: Vec3, max: Vec3 },
    /// One-sided rectangle facing `normal`. `half_u` and `half_v` are
    /// orthogonal half-extent vectors lying in the panel.
    Panel {
        center: Vec3,
        normal: Vec3,
        half_u: Vec3,
        half_v: Vec3,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub id: ColliderId,
    pub shape: Shape,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticScene {
    colliders: Vec<Collider>,
    #[serde(skip)]
    next_id: u32,
}

/// Entry along a sweep, before it is turned into a [`Hit`].
struct Contact {
    t: f32,
    normal: Vec3,
}

impl StaticScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a scene from JSON, normalizing plane and panel normals.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let mut scene: Self = serde_json::from_str(json)?;
        for collider in &mut scene.colliders {
            normalize_shape(&mut collider.shape)?;
        }
        scene.next_id = scene
            .colliders
            .iter()
            .map(|c| c.id.0 + 1)
            .max()
            .unwrap_or(0);
        Ok(scene)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    fn push(&mut self, shape: Shape) -> ColliderId {
        let id = ColliderId(self.next_id);
        self.next_id += 1;
        self.colliders.push(Collider { id, shape });
        id
    }

    /// Infinite floor at height `y`.
    pub fn add_ground(&mut self, y: f32) -> ColliderId {
        self.push(Shape::Plane {
            normal: Vec3::Y,
            offset: y,
        })
    }

    /// Infinite plane through `point` facing `normal`.
    pub fn add_plane(&mut self, point: Vec3, normal: Vec3) -> ColliderId {
        let normal = normal.normalize_or_zero();
        self.push(Shape::Plane {
            normal,
            offset: normal.dot(point),
        })
    }

    pub fn add_cuboid(&mut self, min: Vec3, max: Vec3) -> ColliderId {
        self.push(Shape::Cuboid {
            min: min.min(max),
            max: min.max(max),
        })
    }

    /// Square panel of half side `half_size` centered on `center`.
    pub fn add_panel(&mut self, center: Vec3, normal: Vec3, half_size: f32) -> ColliderId {
        let normal = normal.normalize_or_zero();
        let u = normal.any_orthonormal_vector();
        let v = normal.cross(u);
        self.push(Shape::Panel {
            center,
            normal,
            half_u: u * half_size,
            half_v: v * half_size,
        })
    }

    fn closest(
        &self,
        origin: Vec3,
        radius: f32,
        displacement: Vec3,
        filter: &QueryFilter,
    ) -> Option<Hit> {
        let length = displacement.length();
        if length < EPSILON {
            return None;
        }
        let dir = displacement / length;

        let mut best: Option<Hit> = None;
        for collider in self.colliders.iter().filter(|c| filter.allows(c.id)) {
            let Some(contact) = sweep_shape(&collider.shape, origin, radius, dir, length) else {
                continue;
            };
            if best.as_ref().is_some_and(|b| b.distance <= contact.t) {
                continue;
            }
            let center = origin + dir * contact.t;
            best = Some(Hit {
                position: center - contact.normal * radius,
                normal: contact.normal,
                distance: contact.t,
                collider: collider.id,
            });
        }
        best
    }
}

impl SpatialQuery for StaticScene {
    fn cast_ray(&self, origin: Vec3, displacement: Vec3, filter: &QueryFilter) -> Option<Hit> {
        self.closest(origin, 0.0, displacement, filter)
    }

    fn sweep_sphere(
        &self,
        origin: Vec3,
        radius: f32,
        displacement: Vec3,
        filter: &QueryFilter,
    ) -> Option<Hit> {
        self.closest(origin, radius.max(0.0), displacement, filter)
    }
}

fn normalize_shape(shape: &mut Shape) -> Result<(), ConfigError> {
    match shape {
        Shape::Plane { normal, .. } | Shape::Panel { normal, .. } => {
            if normal.length_squared() < EPSILON {
                return Err(ConfigError::invalid("normal", "must not be zero"));
            }
            *normal = normal.normalize();
        }
        Shape::Cuboid { min, max } => {
            let (lo, hi) = (min.min(*max), min.max(*max));
            *min = lo;
            *max = hi;
        }
    }
    Ok(())
}

fn sweep_shape(shape: &Shape, origin: Vec3, radius: f32, dir: Vec3, length: f32) -> Option<Contact> {
    match *shape {
        Shape::Plane { normal, offset } => sweep_plane(normal, offset, origin, radius, dir, length),
        Shape::Cuboid { min, max } => {
            let inflate = Vec3::splat(radius);
            sweep_cuboid(min - inflate, max + inflate, origin, dir, length)
        }
        Shape::Panel {
            center,
            normal,
            half_u,
            half_v,
        } => {
            let contact = sweep_plane(normal, normal.dot(center), origin, radius, dir, length)?;
            let point = origin + dir * contact.t - normal * radius;
            within_panel(point - center, half_u, half_v).then_some(contact)
        }
    }
}

/// One-sided plane test: only approached from the front, and only when the
/// sphere starts clear of it.
fn sweep_plane(
    normal: Vec3,
    offset: f32,
    origin: Vec3,
    radius: f32,
    dir: Vec3,
    length: f32,
) -> Option<Contact> {
    let approach = normal.dot(dir);
    if approach >= -EPSILON {
        return None;
    }
    let clearance = normal.dot(origin) - offset - radius;
    if clearance <= 0.0 {
        return None;
    }
    let t = clearance / -approach;
    (t <= length).then_some(Contact { t, normal })
}

/// Slab test against an axis-aligned box. Starting inside reports nothing.
fn sweep_cuboid(min: Vec3, max: Vec3, origin: Vec3, dir: Vec3, length: f32) -> Option<Contact> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = Vec3::ZERO;

    for axis in 0..3 {
        let (o, d, lo, hi) = (origin[axis], dir[axis], min[axis], max[axis]);
        if d.abs() < EPSILON {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let (mut near, mut far) = ((lo - o) / d, (hi - o) / d);
        if near > far {
            std::mem::swap(&mut near, &mut far);
        }
        if near > t_enter {
            t_enter = near;
            normal = Vec3::ZERO;
            normal[axis] = -d.signum();
        }
        t_exit = t_exit.min(far);
    }

    if t_enter > t_exit || t_enter < 0.0 || t_enter > length {
        return None;
    }
    Some(Contact {
        t: t_enter,
        normal,
    })
}

fn within_panel(offset: Vec3, half_u: Vec3, half_v: Vec3) -> bool {
    let fits = |half: Vec3| {
        let extent_sq = half.length_squared();
        extent_sq > EPSILON && offset.dot(half).abs() <= extent_sq + EPSILON
    };
    fits(half_u) && fits(half_v)
}
