//! Dash configuration.
//!
//! Every field has a default from [`crate::constants`], so a config file only
//! needs to list the values it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ConfigError;

/// What the dash does when no landing point can be resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveFailurePolicy {
    /// Stay active without moving until something deactivates the ability.
    /// The cooldown is still consumed on that deactivation.
    #[default]
    HoldActive,
    /// Deactivate right after the failed activation.
    Deactivate,
}

/// Parameters of the target resolution pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub max_distance: f32,
    pub flatness_threshold: f32,
    pub surface_offset: f32,
    pub forward_sweep_lift: f32,
    pub forward_sweep_radius: f32,
    pub wall_clearance: f32,
    pub landing_probe_height: f32,
    pub landing_sweep_radius: f32,
    pub max_drop: f32,
    pub max_retries: u32,
    pub retry_step: f32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_distance: MAX_DASH_DISTANCE,
            flatness_threshold: FLATNESS_THRESHOLD,
            surface_offset: SURFACE_OFFSET,
            forward_sweep_lift: FORWARD_SWEEP_LIFT,
            forward_sweep_radius: FORWARD_SWEEP_RADIUS,
            wall_clearance: WALL_CLEARANCE,
            landing_probe_height: LANDING_PROBE_HEIGHT,
            landing_sweep_radius: LANDING_SWEEP_RADIUS,
            max_drop: MAX_DROP_DISTANCE,
            max_retries: LANDING_MAX_RETRIES,
            retry_step: LANDING_RETRY_STEP,
        }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_distance > 0.0) {
            return Err(ConfigError::invalid("max_distance", "must be positive"));
        }
        if !(-1.0..=1.0).contains(&self.flatness_threshold) {
            return Err(ConfigError::invalid(
                "flatness_threshold",
                "must lie in [-1, 1]",
            ));
        }
        if !(self.forward_sweep_radius > 0.0) || !(self.landing_sweep_radius > 0.0) {
            return Err(ConfigError::invalid("sweep radius", "must be positive"));
        }
        if self.forward_sweep_lift < 0.0 || self.landing_probe_height < 0.0 {
            return Err(ConfigError::invalid("probe height", "must not be negative"));
        }
        if self.wall_clearance < 0.0 || self.surface_offset < 0.0 {
            return Err(ConfigError::invalid("offset", "must not be negative"));
        }
        if !(self.max_drop >= 0.0) {
            return Err(ConfigError::invalid("max_drop", "must not be negative"));
        }
        if !(self.retry_step > 0.0) {
            return Err(ConfigError::invalid("retry_step", "must be positive"));
        }
        Ok(())
    }
}

/// Trail snapshot pool sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub capacity: usize,
    pub afterimage_fade_secs: f64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: TRAIL_POOL_CAPACITY,
            afterimage_fade_secs: AFTERIMAGE_FADE_SECS,
        }
    }
}

/// Full configuration of one dash ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub resolver: ResolverConfig,
    pub pool: PoolConfig,
    pub dash_duration_secs: f64,
    pub snapshot_interval_secs: f64,
    pub impact_frame_secs: f64,
    pub cooldown_secs: f64,
    /// `None` leaves deactivation entirely to the caller.
    pub auto_deactivate_secs: Option<f64>,
    pub failure_policy: ResolveFailurePolicy,
    pub camera_shake_magnitude: f32,
    pub fov_pulse_degrees: f32,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            pool: PoolConfig::default(),
            dash_duration_secs: DASH_DURATION_SECS,
            snapshot_interval_secs: SNAPSHOT_INTERVAL_SECS,
            impact_frame_secs: IMPACT_FRAME_SECS,
            cooldown_secs: DASH_COOLDOWN_SECS,
            auto_deactivate_secs: Some(AUTO_DEACTIVATE_SECS),
            failure_policy: ResolveFailurePolicy::default(),
            camera_shake_magnitude: CAMERA_SHAKE_MAGNITUDE,
            fov_pulse_degrees: FOV_PULSE_DEGREES,
        }
    }
}

impl DashConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolver.validate()?;
        if self.pool.capacity == 0 {
            return Err(ConfigError::invalid("pool.capacity", "must be at least 1"));
        }
        if !(self.dash_duration_secs > 0.0) {
            return Err(ConfigError::invalid("dash_duration_secs", "must be positive"));
        }
        if !(self.snapshot_interval_secs > 0.0) {
            return Err(ConfigError::invalid(
                "snapshot_interval_secs",
                "must be positive",
            ));
        }
        if self.impact_frame_secs < 0.0 {
            return Err(ConfigError::invalid(
                "impact_frame_secs",
                "must not be negative",
            ));
        }
        if matches!(self.auto_deactivate_secs, Some(secs) if secs < 0.0) {
            return Err(ConfigError::invalid(
                "auto_deactivate_secs",
                "must not be negative",
            ));
        }
        Ok(())
    }
}
