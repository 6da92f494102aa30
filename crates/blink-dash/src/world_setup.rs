//! Agent spawning and the adapter that exposes the agent entity to a dash.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hecs::{Entity, World};

use blink_core::components::AgentBody;
use blink_core::types::{ColliderId, Ray, Transform};

use crate::collaborators::{AgentHandle, AimSource};

/// Spawn the controllable agent with its root at `pose`.
pub fn spawn_agent(world: &mut World, pose: Transform, body: AgentBody) -> Entity {
    world.spawn((pose, body))
}

/// [`AgentHandle`] over an entity in a shared world. The agent has no
/// character while its `Transform` component is missing.
pub struct WorldAgent {
    world: Rc<RefCell<World>>,
    entity: Entity,
}

impl WorldAgent {
    pub fn new(world: Rc<RefCell<World>>, entity: Entity) -> Self {
        Self { world, entity }
    }

    fn body(&self) -> AgentBody {
        self.world
            .borrow()
            .get::<&AgentBody>(self.entity)
            .map(|body| *body)
            .unwrap_or_default()
    }
}

impl AgentHandle for WorldAgent {
    fn pose(&self) -> Option<Transform> {
        self.world
            .borrow()
            .get::<&Transform>(self.entity)
            .ok()
            .map(|t| *t)
    }

    fn set_pose(&self, pose: Transform) {
        if let Ok(mut transform) = self.world.borrow().get::<&mut Transform>(self.entity) {
            *transform = pose;
        }
    }

    fn hip_height(&self) -> f32 {
        self.body().hip_height
    }

    fn collider(&self) -> Option<ColliderId> {
        self.body().collider
    }

    fn set_movement_locked(&self, locked: bool) {
        if let Ok(mut body) = self.world.borrow().get::<&mut AgentBody>(self.entity) {
            body.movement_locked = locked;
        }
    }
}

/// Aim taken from the most recent dash command, falling back to the
/// agent's facing.
#[derive(Debug, Default)]
pub struct CommandAim {
    ray: Cell<Option<Ray>>,
}

impl CommandAim {
    pub fn set(&self, ray: Ray) {
        self.ray.set(Some(ray));
    }
}

impl AimSource for CommandAim {
    fn aim_ray(&self, agent: &Transform) -> Ray {
        self.ray
            .get()
            .unwrap_or_else(|| Ray::new(agent.position, agent.forward()))
    }
}
