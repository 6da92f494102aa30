//! Seams to the host engine.
//!
//! A dash never renders, animates or reads input itself. It asks these
//! traits, all fire-and-forget and callable through shared references.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use blink_core::components::TrailTemplate;
use blink_core::events::FeedbackEvent;
use blink_core::types::{ColliderId, Ray, Transform};
use blink_spatial::SpatialQuery;

/// The controllable character.
pub trait AgentHandle {
    /// Root pose, or `None` while the character is not loaded.
    fn pose(&self) -> Option<Transform>;
    fn set_pose(&self, pose: Transform);
    fn hip_height(&self) -> f32;
    /// The agent's own collider, excluded from dash queries.
    fn collider(&self) -> Option<ColliderId>;
    fn set_movement_locked(&self, locked: bool);
}

/// Where the player is pointing, usually the camera's view ray.
pub trait AimSource {
    fn aim_ray(&self, agent: &Transform) -> Ray;
}

pub trait CameraRig {
    fn shake(&self, duration: f64, magnitude: f32);
    fn pulse_fov(&self, duration: f64, degrees: f32);
}

/// A fading copy of the agent left behind during a dash.
#[derive(Debug, Clone)]
pub struct Afterimage {
    pub transform: Transform,
    pub fade_secs: f64,
    pub template: Arc<TrailTemplate>,
}

pub trait EffectSink {
    fn impact_frame(&self, duration: f64);
    fn afterimage(&self, image: Afterimage);
}

pub trait Animator {
    fn play(&self, name: &str, duration: f64);
}

/// Everything a dash talks to besides its own state.
#[derive(Clone)]
pub struct DashContext {
    pub agent: Rc<dyn AgentHandle>,
    pub aim: Rc<dyn AimSource>,
    pub spatial: Rc<dyn SpatialQuery>,
    pub camera: Rc<dyn CameraRig>,
    pub effects: Rc<dyn EffectSink>,
    pub animator: Rc<dyn Animator>,
}

/// Headless stand-in for the camera, animator and effect pipeline.
/// Records every request as a [`FeedbackEvent`].
#[derive(Debug, Default)]
pub struct FeedbackRecorder {
    events: RefCell<Vec<FeedbackEvent>>,
}

impl FeedbackRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<FeedbackEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn afterimage_count(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, FeedbackEvent::Afterimage { .. }))
            .count()
    }

    fn record(&self, event: FeedbackEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl CameraRig for FeedbackRecorder {
    fn shake(&self, duration: f64, magnitude: f32) {
        self.record(FeedbackEvent::CameraShake { duration, magnitude });
    }

    fn pulse_fov(&self, duration: f64, degrees: f32) {
        self.record(FeedbackEvent::FovPulse { duration, degrees });
    }
}

impl EffectSink for FeedbackRecorder {
    fn impact_frame(&self, duration: f64) {
        self.record(FeedbackEvent::ImpactFrame { duration });
    }

    fn afterimage(&self, image: Afterimage) {
        self.record(FeedbackEvent::Afterimage {
            transform: image.transform,
            fade_secs: image.fade_secs,
        });
    }
}

impl Animator for FeedbackRecorder {
    fn play(&self, name: &str, duration: f64) {
        self.record(FeedbackEvent::Animation {
            name: name.to_string(),
            duration,
        });
    }
}
