//! Dash target resolution.
//!
//! Turns an aim ray into a landing transform in four stages:
//!
//! 1. **Intent**: cast the aim ray up to `max_distance`.
//! 2. **Direct surface**: a walkable aim hit within range is used as is.
//! 3. **Forward sweep**: sweep a sphere from the agent toward the intent
//!    point; back off from obstructions by the wall clearance.
//! 4. **Landing search**: sweep a smaller sphere down from above the
//!    candidate, stepping past steep surfaces, then validate the drop.
//!
//! Spheres rather than rays keep the path from threading gaps narrower than
//! the agent.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use blink_core::config::ResolverConfig;
use blink_core::error::ResolveFailure;
use blink_core::types::{horizontal, Hit, Ray, Transform, UP};

use crate::query::{QueryFilter, SpatialQuery};

/// Which stage produced the landing point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionPath {
    /// The aim ray hit walkable ground in range.
    DirectSurface,
    /// Forward sweep was clear; landed below its endpoint.
    OpenPath,
    /// Forward sweep hit an obstruction; landed below the backed-off point.
    Obstructed,
}

/// Landing transform plus the intermediate points that led to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub landing: Transform,
    pub path: ResolutionPath,
    pub intent: Vec3,
    /// Dash point before the landing search (absent on the direct path).
    pub candidate: Option<Vec3>,
    /// First obstruction of the forward sweep.
    pub obstruction: Option<Hit>,
    /// Surface the agent lands on.
    pub ground: Hit,
}

#[derive(Debug, Clone, Default)]
pub struct TargetResolver {
    config: ResolverConfig,
}

impl TargetResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a landing transform. The agent keeps its current facing.
    pub fn resolve(
        &self,
        query: &dyn SpatialQuery,
        agent: Option<&Transform>,
        aim: &Ray,
        filter: &QueryFilter,
    ) -> Result<Transform, ResolveFailure> {
        self.resolve_detailed(query, agent, aim, filter)
            .map(|resolution| resolution.landing)
    }

    pub fn resolve_detailed(
        &self,
        query: &dyn SpatialQuery,
        agent: Option<&Transform>,
        aim: &Ray,
        filter: &QueryFilter,
    ) -> Result<Resolution, ResolveFailure> {
        let agent = agent.ok_or(ResolveFailure::NoCharacter)?;
        let cfg = &self.config;

        // Casts are `max_distance` long only along a unit direction. A
        // degenerate aim falls back to the agent's facing.
        let direction = aim.direction.normalize_or_zero();
        let aim = if direction != Vec3::ZERO {
            Ray {
                origin: aim.origin,
                direction,
            }
        } else {
            Ray::new(agent.position, agent.forward())
        };

        let aim_hit = query.cast_ray(aim.origin, aim.direction * cfg.max_distance, filter);
        let intent = aim_hit.map_or_else(|| aim.at(cfg.max_distance), |hit| hit.position);
        debug!(
            intent = ?intent,
            aim_hit = aim_hit.is_some(),
            "dash_intent_resolved"
        );

        if let Some(hit) = aim_hit {
            let in_range = hit.position.distance(agent.position) <= cfg.max_distance;
            if hit.is_walkable(cfg.flatness_threshold) && in_range {
                let position = hit.position + hit.normal * cfg.surface_offset;
                debug!(landing = ?position, "dash_direct_surface");
                return Ok(Resolution {
                    landing: agent.with_position(position),
                    path: ResolutionPath::DirectSurface,
                    intent,
                    candidate: None,
                    obstruction: None,
                    ground: hit,
                });
            }
        }

        let (candidate, obstruction) =
            self.forward_candidate(query, agent.position, intent, aim.direction, filter);
        let ground = self.find_landing(query, candidate, filter)?;
        let position = ground.position + UP * cfg.surface_offset;
        debug!(
            candidate = ?candidate,
            landing = ?position,
            obstructed = obstruction.is_some(),
            "dash_landing_resolved"
        );

        Ok(Resolution {
            landing: agent.with_position(position),
            path: if obstruction.is_some() {
                ResolutionPath::Obstructed
            } else {
                ResolutionPath::OpenPath
            },
            intent,
            candidate: Some(candidate),
            obstruction,
            ground,
        })
    }

    /// Sweep from just above the agent toward `intent`, clamped to the
    /// maximum distance. Returns the dash point and the obstruction, if any.
    pub fn forward_candidate(
        &self,
        query: &dyn SpatialQuery,
        agent_position: Vec3,
        intent: Vec3,
        fallback_dir: Vec3,
        filter: &QueryFilter,
    ) -> (Vec3, Option<Hit>) {
        let cfg = &self.config;
        let start = agent_position + UP * cfg.forward_sweep_lift;
        let to_intent = intent - start;
        let distance = to_intent.length();
        let dir = if distance > f32::EPSILON {
            to_intent / distance
        } else {
            fallback_dir
        };
        let displacement = dir * distance.min(cfg.max_distance);

        let Some(hit) = query.sweep_sphere(start, cfg.forward_sweep_radius, displacement, filter)
        else {
            return (start + displacement, None);
        };

        let mut candidate = hit.position + hit.normal * cfg.wall_clearance;
        let push = horizontal(hit.normal);
        if push.length_squared() > f32::EPSILON {
            let push = push.normalize() * cfg.wall_clearance;
            if query
                .sweep_sphere(candidate, cfg.forward_sweep_radius, push, filter)
                .is_some()
            {
                trace!("dash_candidate_pushed_out");
                candidate = hit.position + hit.normal * (cfg.wall_clearance * 2.0);
            }
        }
        (candidate, Some(hit))
    }

    /// Search downward from above `candidate` for walkable ground, stepping
    /// below steep surfaces up to `max_retries` times.
    pub fn find_landing(
        &self,
        query: &dyn SpatialQuery,
        candidate: Vec3,
        filter: &QueryFilter,
    ) -> Result<Hit, ResolveFailure> {
        let cfg = &self.config;
        let mut origin = candidate + UP * cfg.landing_probe_height;
        let mut remaining = cfg.max_drop + cfg.landing_probe_height;
        let mut retries = 0;

        loop {
            if remaining <= 0.0 {
                return Err(ResolveFailure::NoGround);
            }
            let hit = query
                .sweep_sphere(origin, cfg.landing_sweep_radius, UP * -remaining, filter)
                .ok_or(ResolveFailure::NoGround)?;

            if hit.is_walkable(cfg.flatness_threshold) {
                let drop = candidate.y - hit.position.y;
                if drop > cfg.max_drop {
                    debug!(drop, max_drop = cfg.max_drop, "dash_drop_too_far");
                    return Err(ResolveFailure::DropTooFar);
                }
                return Ok(hit);
            }

            if retries >= cfg.max_retries {
                debug!(retries, "dash_landing_too_steep");
                return Err(ResolveFailure::TooSteep);
            }
            retries += 1;
            let next_y = hit.position.y - cfg.retry_step;
            trace!(retry = retries, flatness = hit.flatness(), next_y, "dash_landing_retry");
            remaining -= origin.y - next_y;
            origin.y = next_y;
        }
    }
}
