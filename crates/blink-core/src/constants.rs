//! Tuning parameters and their defaults.

// --- Target resolution ---

/// Maximum dash distance (world units).
pub const MAX_DASH_DISTANCE: f32 = 50.0;

/// Minimum `normal · up` for a surface to count as walkable (~53° max slope).
pub const FLATNESS_THRESHOLD: f32 = 0.6;

/// Offset applied along the surface normal to a landing point to avoid clipping.
pub const SURFACE_OFFSET: f32 = 0.1;

/// Height above the agent from which the forward sweep starts.
pub const FORWARD_SWEEP_LIFT: f32 = 1.0;

/// Radius of the forward obstruction sweep.
pub const FORWARD_SWEEP_RADIUS: f32 = 0.5;

/// Distance kept between the dash point and an obstructing wall.
pub const WALL_CLEARANCE: f32 = 2.5;

/// Height above the candidate point from which the landing search starts.
pub const LANDING_PROBE_HEIGHT: f32 = 3.0;

/// Radius of the downward landing sweep.
pub const LANDING_SWEEP_RADIUS: f32 = 0.3;

/// Maximum vertical drop from the candidate point to the landing surface.
pub const MAX_DROP_DISTANCE: f32 = 30.0;

/// Retries allowed when the landing sweep hits a steep surface.
pub const LANDING_MAX_RETRIES: u32 = 5;

/// How far below a rejected steep hit the next landing sweep starts.
pub const LANDING_RETRY_STEP: f32 = 0.1;

// --- Trail pool ---

/// Default number of preallocated trail snapshot entities.
pub const TRAIL_POOL_CAPACITY: usize = 10;

/// Transparency of a freshly checked-out trail entity (1 = invisible).
pub const TRAIL_HIDDEN_TRANSPARENCY: f32 = 1.0;

// --- Dash timing ---

/// Duration of the dash movement (seconds).
pub const DASH_DURATION_SECS: f64 = 0.2;

/// Wall-clock interval between trail snapshots (seconds).
pub const SNAPSHOT_INTERVAL_SECS: f64 = 0.05;

/// Length of the impact-frame effect that precedes the movement (seconds).
pub const IMPACT_FRAME_SECS: f64 = 0.05;

/// Cooldown applied after each deactivation (seconds).
pub const DASH_COOLDOWN_SECS: f64 = 1.0;

/// Delay after which the headless engine deactivates a running dash (seconds).
pub const AUTO_DEACTIVATE_SECS: f64 = 0.5;

/// Lifetime of a single afterimage handed to the effect sink (seconds).
pub const AFTERIMAGE_FADE_SECS: f64 = 0.3;

// --- Camera feedback ---

/// Magnitude of the camera shake at dash start.
pub const CAMERA_SHAKE_MAGNITUDE: f32 = 0.4;

/// Field-of-view increase during the dash (degrees).
pub const FOV_PULSE_DEGREES: f32 = 12.0;

// --- Agent ---

/// Default height of the agent root above its feet.
pub const AGENT_HIP_HEIGHT: f32 = 2.0;

/// Name of the animation played while dashing.
pub const DASH_ANIMATION: &str = "Dash";

// --- Engine ---

/// Default simulation step (seconds).
pub const DEFAULT_STEP_SECS: f64 = 1.0 / 60.0;
