//! Dash movement: interpolation toward the landing point and the snapshot
//! cadence that runs alongside it.

use glam::Vec3;

use blink_core::types::{Transform, UP};

const TIME_EPSILON: f64 = 1e-9;

/// Linear dash from a start pose to a resolved landing point.
///
/// The root ends `hip_height` above the landing point. Height never drops
/// below the landing point itself, so a dash up onto a ledge lifts the
/// agent first instead of dragging it through the ledge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashMotion {
    start: Transform,
    end: Vec3,
    floor_y: f32,
    duration: f64,
}

impl DashMotion {
    pub fn new(start: Transform, landing: Transform, hip_height: f32, duration: f64) -> Self {
        let end = landing.position + UP * hip_height;
        Self {
            start,
            end,
            floor_y: end.y - hip_height,
            duration,
        }
    }

    pub fn start(&self) -> Transform {
        self.start
    }

    /// Final root pose.
    pub fn end(&self) -> Transform {
        self.start.with_position(self.end)
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Root pose `elapsed` seconds into the dash. Rotation is held.
    pub fn sample(&self, elapsed: f64) -> Transform {
        let alpha = if self.duration > 0.0 {
            (elapsed / self.duration).clamp(0.0, 1.0) as f32
        } else {
            1.0
        };
        let from = self.start.position;
        let position = Vec3::new(
            from.x + (self.end.x - from.x) * alpha,
            (from.y + (self.end.y - from.y) * alpha).max(self.floor_y),
            from.z + (self.end.z - from.z) * alpha,
        );
        self.start.with_position(position)
    }

    pub fn is_complete(&self, elapsed: f64) -> bool {
        elapsed >= self.duration - TIME_EPSILON
    }
}

/// Snapshot times `k * interval` for every `k` with `k * interval < duration`.
///
/// Due snapshots are counted against elapsed time, not frames, so a long
/// frame catches up on every missed snapshot and the total is the same at
/// any frame rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotCadence {
    interval: f64,
    duration: f64,
    next: u32,
}

impl SnapshotCadence {
    pub fn new(interval: f64, duration: f64) -> Self {
        Self {
            interval,
            duration,
            next: 0,
        }
    }

    /// Time of the oldest snapshot due by `elapsed` that has not been taken
    /// yet, marking it taken.
    pub fn next_due(&mut self, elapsed: f64) -> Option<f64> {
        if self.interval <= 0.0 {
            return None;
        }
        let at = f64::from(self.next) * self.interval;
        if at >= self.duration - TIME_EPSILON || at > elapsed + TIME_EPSILON {
            return None;
        }
        self.next += 1;
        Some(at)
    }

    /// Number of snapshots due by `elapsed` that have not been taken yet,
    /// marking them all taken.
    pub fn take_due(&mut self, elapsed: f64) -> u32 {
        let mut due = 0;
        while self.next_due(elapsed).is_some() {
            due += 1;
        }
        due
    }

    /// Total snapshots over a whole dash.
    pub fn total(&self) -> u32 {
        let mut probe = Self::new(self.interval, self.duration);
        probe.take_due(self.duration)
    }
}
