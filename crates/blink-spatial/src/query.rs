//! Spatial query provider contract.

use std::rc::Rc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use blink_core::types::{ColliderId, Hit};

/// Colliders to ignore during a query. Constant for one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub excluded: Vec<ColliderId>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn excluding(ids: impl IntoIterator<Item = ColliderId>) -> Self {
        Self {
            excluded: ids.into_iter().collect(),
        }
    }

    pub fn allows(&self, id: ColliderId) -> bool {
        !self.excluded.contains(&id)
    }
}

/// Ray casts and sphere sweeps against the world.
///
/// Both queries travel along `displacement` (direction and length) and report
/// the first surface reached. Colliders the query starts inside of, or in
/// contact with, are not reported.
pub trait SpatialQuery {
    fn cast_ray(&self, origin: Vec3, displacement: Vec3, filter: &QueryFilter) -> Option<Hit>;

    /// `Hit::position` is the contact point on the surface, not the sphere center.
    fn sweep_sphere(
        &self,
        origin: Vec3,
        radius: f32,
        displacement: Vec3,
        filter: &QueryFilter,
    ) -> Option<Hit>;
}

impl<T: SpatialQuery + ?Sized> SpatialQuery for Rc<T> {
    fn cast_ray(&self, origin: Vec3, displacement: Vec3, filter: &QueryFilter) -> Option<Hit> {
        (**self).cast_ray(origin, displacement, filter)
    }

    fn sweep_sphere(
        &self,
        origin: Vec3,
        radius: f32,
        displacement: Vec3,
        filter: &QueryFilter,
    ) -> Option<Hit> {
        (**self).sweep_sphere(origin, radius, displacement, filter)
    }
}
