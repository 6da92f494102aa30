//! Tests for target resolution against static scenes.

use std::cell::RefCell;
use std::collections::VecDeque;

use glam::Vec3;

use blink_core::config::ResolverConfig;
use blink_core::error::ResolveFailure;
use blink_core::types::{ColliderId, Hit, Ray, Transform};

use crate::query::{QueryFilter, SpatialQuery};
use crate::resolver::{ResolutionPath, TargetResolver};
use crate::scene::StaticScene;

const TOLERANCE: f32 = 1e-3;

fn resolver_with_range(max_distance: f32) -> TargetResolver {
    TargetResolver::new(ResolverConfig {
        max_distance,
        ..Default::default()
    })
}

fn agent_at_origin() -> Transform {
    Transform::IDENTITY
}

fn assert_close(actual: Vec3, expected: Vec3) {
    assert!(
        (actual - expected).length() < TOLERANCE,
        "expected {expected:?}, got {actual:?}"
    );
}

/// Spatial query that replays scripted sweep results.
struct ScriptedQuery {
    sweeps: RefCell<VecDeque<Option<Hit>>>,
}

impl ScriptedQuery {
    fn new(sweeps: Vec<Option<Hit>>) -> Self {
        Self {
            sweeps: RefCell::new(sweeps.into()),
        }
    }
}

impl SpatialQuery for ScriptedQuery {
    fn cast_ray(&self, _: Vec3, _: Vec3, _: &QueryFilter) -> Option<Hit> {
        None
    }

    fn sweep_sphere(&self, _: Vec3, _: f32, _: Vec3, _: &QueryFilter) -> Option<Hit> {
        self.sweeps.borrow_mut().pop_front().flatten()
    }
}

/// Stack of steep panels above `y = 0` ground, one every 3 units from `top` down.
fn steep_stack(count: usize, top: f32) -> StaticScene {
    let mut scene = StaticScene::new();
    scene.add_ground(0.0);
    let steep = Vec3::new(3.0, 1.0, 0.0).normalize();
    for i in 0..count {
        scene.add_panel(Vec3::new(0.0, top - 3.0 * i as f32, 0.0), steep, 2.0);
    }
    scene
}

// ---- Scenario A: flat ground, aim point in range ----

#[test]
fn test_flat_ground_lands_on_aim_point() {
    let mut scene = StaticScene::new();
    scene.add_ground(0.0);
    let resolver = resolver_with_range(100.0);
    let aim = Ray::toward(Vec3::new(0.0, 5.0, -10.0), Vec3::new(0.0, 0.0, 50.0));

    let resolution = resolver
        .resolve_detailed(&scene, Some(&agent_at_origin()), &aim, &QueryFilter::new())
        .unwrap();
    assert_eq!(resolution.path, ResolutionPath::DirectSurface);
    assert_close(resolution.landing.position, Vec3::new(0.0, 0.1, 50.0));
    assert!(resolution.candidate.is_none());
}

#[test]
fn test_landing_keeps_agent_facing() {
    let mut scene = StaticScene::new();
    scene.add_ground(0.0);
    let agent = Transform::new(Vec3::ZERO, glam::Quat::from_rotation_y(0.7));
    let aim = Ray::toward(Vec3::new(0.0, 5.0, -10.0), Vec3::new(0.0, 0.0, 20.0));
    let landing = resolver_with_range(100.0)
        .resolve(&scene, Some(&agent), &aim, &QueryFilter::new())
        .unwrap();
    assert_eq!(landing.rotation, agent.rotation);
}

// ---- Scenario B: wall in the way ----

#[test]
fn test_wall_backs_off_by_clearance_then_lands() {
    let mut scene = StaticScene::new();
    scene.add_ground(0.0);
    let wall = scene.add_cuboid(Vec3::new(-50.0, 0.0, 20.0), Vec3::new(50.0, 10.0, 22.0));
    let resolver = resolver_with_range(100.0);
    let clearance = resolver.config().wall_clearance;
    let aim = Ray::toward(Vec3::new(0.0, 5.0, -10.0), Vec3::new(0.0, 2.0, 40.0));

    let resolution = resolver
        .resolve_detailed(&scene, Some(&agent_at_origin()), &aim, &QueryFilter::new())
        .unwrap();
    assert_eq!(resolution.path, ResolutionPath::Obstructed);

    let obstruction = resolution.obstruction.unwrap();
    assert_eq!(obstruction.collider, wall);
    assert_close(obstruction.normal, Vec3::NEG_Z);

    let candidate = resolution.candidate.unwrap();
    let wall_face_z = 20.0;
    assert!(wall_face_z - candidate.z >= clearance - TOLERANCE);

    let landing = resolution.landing.position;
    assert!(wall_face_z - landing.z >= clearance - TOLERANCE);
    assert!((landing.y - 0.1).abs() < TOLERANCE, "landed on the ground");
    assert!((landing.z - 17.5).abs() < TOLERANCE);
}

#[test]
fn test_secondary_obstruction_doubles_clearance() {
    let wall_hit = Hit {
        position: Vec3::new(0.0, 2.0, 20.0),
        normal: Vec3::NEG_Z,
        distance: 19.5,
        collider: ColliderId(1),
    };
    let behind = Hit {
        position: Vec3::new(0.0, 2.0, 16.0),
        normal: Vec3::Z,
        distance: 1.0,
        collider: ColliderId(2),
    };
    let resolver = TargetResolver::default();
    let intent = Vec3::new(0.0, 2.0, 20.0);

    let blocked = ScriptedQuery::new(vec![Some(wall_hit), Some(behind)]);
    let (candidate, obstruction) =
        resolver.forward_candidate(&blocked, Vec3::ZERO, intent, Vec3::Z, &QueryFilter::new());
    assert_eq!(obstruction, Some(wall_hit));
    assert_close(candidate, Vec3::new(0.0, 2.0, 15.0));

    let clear = ScriptedQuery::new(vec![Some(wall_hit), None]);
    let (candidate, _) =
        resolver.forward_candidate(&clear, Vec3::ZERO, intent, Vec3::Z, &QueryFilter::new());
    assert_close(candidate, Vec3::new(0.0, 2.0, 17.5));
}

#[test]
fn test_floor_obstruction_skips_horizontal_push() {
    let floor_hit = Hit {
        position: Vec3::new(0.0, 0.0, 10.0),
        normal: Vec3::Y,
        distance: 10.0,
        collider: ColliderId(1),
    };
    // A second scripted hit would double the clearance if it were consumed.
    let query = ScriptedQuery::new(vec![Some(floor_hit), Some(floor_hit)]);
    let (candidate, _) = TargetResolver::default().forward_candidate(
        &query,
        Vec3::ZERO,
        Vec3::new(0.0, 0.0, 20.0),
        Vec3::Z,
        &QueryFilter::new(),
    );
    assert_close(candidate, Vec3::new(0.0, 2.5, 10.0));
}

// ---- Scenario C: drop beyond the maximum ----

#[test]
fn test_cliff_drop_beyond_max_fails() {
    let mut scene = StaticScene::new();
    scene.add_cuboid(Vec3::new(-50.0, -40.0, -50.0), Vec3::new(50.0, 0.0, 10.0));
    scene.add_ground(-40.0);
    let resolver = TargetResolver::default();
    let aim = Ray::new(Vec3::new(0.0, 2.0, 0.0), Vec3::Z);

    let result = resolver.resolve(&scene, Some(&agent_at_origin()), &aim, &QueryFilter::new());
    assert_eq!(result, Err(ResolveFailure::NoGround));
}

#[test]
fn test_ground_just_past_max_drop_rejected() {
    let mut scene = StaticScene::new();
    scene.add_ground(-30.2);
    let resolver = TargetResolver::default();
    let result = resolver.find_landing(&scene, Vec3::ZERO, &QueryFilter::new());
    assert_eq!(result, Err(ResolveFailure::DropTooFar));
}

#[test]
fn test_cliff_within_max_drop_lands_below() {
    let mut scene = StaticScene::new();
    scene.add_cuboid(Vec3::new(-50.0, -20.0, -50.0), Vec3::new(50.0, 0.0, 10.0));
    scene.add_ground(-20.0);
    let resolver = TargetResolver::default();
    let aim = Ray::new(Vec3::new(0.0, 2.0, 0.0), Vec3::Z);

    let resolution = resolver
        .resolve_detailed(&scene, Some(&agent_at_origin()), &aim, &QueryFilter::new())
        .unwrap();
    assert_eq!(resolution.path, ResolutionPath::OpenPath);
    assert!((resolution.landing.position.y - (-19.9)).abs() < TOLERANCE);
    assert!(resolution.landing.position.z > 10.0);
}

// ---- Steep surfaces ----

#[test]
fn test_steep_surfaces_skipped_to_flat_ground() {
    let scene = steep_stack(5, 18.0);
    let resolver = TargetResolver::default();
    let ground = resolver
        .find_landing(&scene, Vec3::new(0.0, 20.0, 0.0), &QueryFilter::new())
        .unwrap();
    assert!(ground.position.y.abs() < TOLERANCE);
    assert_eq!(ground.normal, Vec3::Y);
}

#[test]
fn test_steep_surfaces_exhaust_retries() {
    let scene = steep_stack(6, 18.0);
    let resolver = TargetResolver::default();
    let result = resolver.find_landing(&scene, Vec3::new(0.0, 20.0, 0.0), &QueryFilter::new());
    assert_eq!(result, Err(ResolveFailure::TooSteep));
}

#[test]
fn test_steep_aim_hit_is_not_a_shortcut() {
    let mut scene = StaticScene::new();
    scene.add_ground(0.0);
    // Steep ramp face straight ahead.
    scene.add_panel(
        Vec3::new(0.0, 3.0, 15.0),
        Vec3::new(0.0, 1.0, -3.0).normalize(),
        3.0,
    );
    let aim = Ray::new(Vec3::new(0.0, 3.0, 0.0), Vec3::Z);
    let resolution = TargetResolver::default()
        .resolve_detailed(&scene, Some(&agent_at_origin()), &aim, &QueryFilter::new())
        .unwrap();
    assert_ne!(resolution.path, ResolutionPath::DirectSurface);
}

// ---- Range and sweeps ----

#[test]
fn test_aim_hit_beyond_range_is_swept_instead() {
    let mut scene = StaticScene::new();
    scene.add_ground(0.0);
    let resolver = resolver_with_range(50.0);
    let aim = Ray::toward(Vec3::new(0.0, 3.0, 30.0), Vec3::new(0.0, 0.0, 75.0));

    let resolution = resolver
        .resolve_detailed(&scene, Some(&agent_at_origin()), &aim, &QueryFilter::new())
        .unwrap();
    assert_ne!(resolution.path, ResolutionPath::DirectSurface);
    let landing = resolution.landing.position;
    assert!(landing.length() <= 50.0);
    assert!((landing.z - 37.5).abs() < 0.05);
}

#[test]
fn test_sphere_sweep_does_not_thread_narrow_gap() {
    let mut scene = StaticScene::new();
    scene.add_ground(0.0);
    scene.add_cuboid(Vec3::new(-5.0, 0.0, 10.0), Vec3::new(-0.3, 10.0, 11.0));
    scene.add_cuboid(Vec3::new(0.3, 0.0, 10.0), Vec3::new(5.0, 10.0, 11.0));
    let aim = Ray::new(Vec3::new(0.0, 1.5, 0.0), Vec3::new(0.0, 0.05, 1.0));

    // The zero-width aim ray slips through the 0.6 gap...
    assert!(scene
        .cast_ray(aim.origin, aim.direction * 50.0, &QueryFilter::new())
        .is_none());

    // ...but the dash stops in front of it.
    let landing = TargetResolver::default()
        .resolve(&scene, Some(&agent_at_origin()), &aim, &QueryFilter::new())
        .unwrap();
    assert!(landing.position.z < 10.0);
    assert!((landing.position.z - 7.5).abs() < TOLERANCE);
}

#[test]
fn test_agent_collider_must_be_excluded() {
    let mut scene = StaticScene::new();
    scene.add_ground(0.0);
    let body = scene.add_cuboid(Vec3::new(-0.5, 0.0, -0.5), Vec3::new(0.5, 4.0, 0.5));
    let resolver = resolver_with_range(100.0);
    let aim = Ray::toward(Vec3::new(0.0, 3.0, -10.0), Vec3::new(0.0, 0.0, 50.0));

    let excluded = resolver
        .resolve(&scene, Some(&agent_at_origin()), &aim, &QueryFilter::excluding([body]))
        .unwrap();
    assert_close(excluded.position, Vec3::new(0.0, 0.1, 50.0));

    let unfiltered = resolver
        .resolve(&scene, Some(&agent_at_origin()), &aim, &QueryFilter::new())
        .unwrap();
    assert!(unfiltered.position.z.abs() < 1.0, "aim ray stopped on the agent");
}

#[test]
fn test_missing_character_fails() {
    let scene = StaticScene::new();
    let aim = Ray::new(Vec3::ZERO, Vec3::Z);
    assert_eq!(
        TargetResolver::default().resolve(&scene, None, &aim, &QueryFilter::new()),
        Err(ResolveFailure::NoCharacter)
    );
}

#[test]
fn test_zero_aim_uses_agent_facing() {
    let mut scene = StaticScene::new();
    scene.add_ground(0.0);
    let aim = Ray::new(Vec3::new(0.0, 2.0, 0.0), Vec3::ZERO);
    let landing = TargetResolver::default()
        .resolve(&scene, Some(&agent_at_origin()), &aim, &QueryFilter::new())
        .unwrap();
    // Identity faces -Z.
    assert!(landing.position.z < -10.0);
}

#[test]
fn test_aim_length_does_not_change_landing() {
    let mut scene = StaticScene::new();
    scene.add_ground(0.0);
    let resolver = resolver_with_range(40.0);
    let origin = Vec3::new(0.0, 5.0, 0.0);
    let stretched = Ray {
        origin,
        direction: Vec3::new(0.0, -0.2, 2.0),
    };
    let unit = Ray::new(origin, stretched.direction);

    let from_stretched = resolver
        .resolve(&scene, Some(&agent_at_origin()), &stretched, &QueryFilter::new())
        .unwrap();
    let from_unit = resolver
        .resolve(&scene, Some(&agent_at_origin()), &unit, &QueryFilter::new())
        .unwrap();

    assert_close(from_stretched.position, from_unit.position);
    // The aim ray runs out before reaching the ground, so the dash goes the
    // full range.
    assert!(from_unit.position.z > 39.0 && from_unit.position.z <= 40.0);
    assert!((from_unit.position.y - 0.1).abs() < TOLERANCE);
}
