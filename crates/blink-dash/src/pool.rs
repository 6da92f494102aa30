//! Fixed-capacity pool of trail snapshot entities.
//!
//! Every entity lives in the pool's own staging world from construction on;
//! checkout and release only move handles between the available queue and
//! the in-use list, so a dash never spawns or despawns anything.

use std::collections::VecDeque;
use std::sync::Arc;

use hecs::{Entity, World};

use blink_core::components::{Appearance, Pooled, TrailTemplate};
use blink_core::types::Transform;

/// Shared template handle stored on each pooled entity.
#[derive(Debug, Clone)]
struct Rig(Arc<TrailTemplate>);

/// Everything a visual collaborator needs to draw one snapshot.
#[derive(Debug, Clone)]
pub struct TrailSnapshot {
    pub slot: usize,
    pub transform: Transform,
    pub appearance: Appearance,
    pub template: Arc<TrailTemplate>,
}

pub struct EntityPool {
    staging: World,
    available: VecDeque<Entity>,
    in_use: Vec<Entity>,
    capacity: usize,
}

impl EntityPool {
    /// Build `capacity` hidden copies of `template` in the staging world.
    pub fn new(template: TrailTemplate, capacity: usize) -> Self {
        let template = Arc::new(template);
        let mut staging = World::new();
        let available = (0..capacity)
            .map(|slot| {
                staging.spawn((
                    Pooled { slot },
                    Rig(template.clone()),
                    Transform::IDENTITY,
                    Appearance::HIDDEN,
                ))
            })
            .collect();
        Self {
            staging,
            available,
            in_use: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Take the oldest available entity, reset to the hidden identity pose.
    /// `None` when every entity is checked out.
    pub fn checkout(&mut self) -> Option<Entity> {
        let entity = self.available.pop_front()?;
        if let Ok((transform, appearance)) = self
            .staging
            .query_one_mut::<(&mut Transform, &mut Appearance)>(entity)
        {
            *transform = Transform::IDENTITY;
            *appearance = Appearance::HIDDEN;
        }
        self.in_use.push(entity);
        Some(entity)
    }

    /// Return an entity to the back of the queue. Ignored unless checked out.
    pub fn release(&mut self, entity: Entity) {
        let Some(index) = self.in_use.iter().position(|e| *e == entity) else {
            return;
        };
        self.in_use.swap_remove(index);
        self.available.push_back(entity);
    }

    /// Move a checked-out entity. Returns false for anything not in use.
    pub fn set_transform(&mut self, entity: Entity, pose: Transform) -> bool {
        if !self.is_in_use(entity) {
            return false;
        }
        match self.staging.query_one_mut::<&mut Transform>(entity) {
            Ok(transform) => {
                *transform = pose;
                true
            }
            Err(_) => false,
        }
    }

    pub fn transform(&self, entity: Entity) -> Option<Transform> {
        self.staging.get::<&Transform>(entity).ok().map(|t| *t)
    }

    pub fn appearance(&self, entity: Entity) -> Option<Appearance> {
        self.staging.get::<&Appearance>(entity).ok().map(|a| *a)
    }

    pub fn template_of(&self, entity: Entity) -> Option<Arc<TrailTemplate>> {
        self.staging.get::<&Rig>(entity).ok().map(|rig| rig.0.clone())
    }

    /// Current state of a pooled entity, ready to hand to a renderer.
    pub fn snapshot(&self, entity: Entity) -> Option<TrailSnapshot> {
        let slot = self.staging.get::<&Pooled>(entity).ok()?.slot;
        Some(TrailSnapshot {
            slot,
            transform: self.transform(entity)?,
            appearance: self.appearance(entity)?,
            template: self.template_of(entity)?,
        })
    }

    pub fn is_in_use(&self, entity: Entity) -> bool {
        self.in_use.contains(&entity)
    }

    pub fn available_len(&self) -> usize {
        self.available.len()
    }

    pub fn in_use_len(&self) -> usize {
        self.in_use.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The staging world. Its entity count never changes.
    pub fn staging(&self) -> &World {
        &self.staging
    }
}
