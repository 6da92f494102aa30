//! Engine snapshot: the visible state of the agent and its dash after each tick.

use serde::{Deserialize, Serialize};

use crate::error::ResolveFailure;
use crate::events::{AbilityEvent, FeedbackEvent};
use crate::types::Transform;

/// What the most recent activation did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DashOutcome {
    /// Target resolved, movement pending or in progress.
    Moving { target: Transform },
    /// Movement ran to completion.
    Arrived { target: Transform },
    /// No landing point. The agent did not move.
    Failed { reason: ResolveFailure },
    /// The activation ended before movement finished.
    Interrupted,
}

/// Ability flags as seen from outside.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilityView {
    pub active: bool,
    pub on_cooldown: bool,
    pub destroyed: bool,
    pub last_activation: Option<f64>,
}

/// Snapshot returned by every engine tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashSnapshot {
    pub tick: u64,
    pub time_secs: f64,
    /// `None` while the agent has no character.
    pub agent: Option<Transform>,
    pub ability: AbilityView,
    pub outcome: Option<DashOutcome>,
    /// Trail snapshot entities currently checked out.
    pub trail_in_use: usize,
    /// Events published since the previous tick, in order.
    pub events: Vec<AbilityEvent>,
    /// Presentation requests made since the previous tick.
    pub feedback: Vec<FeedbackEvent>,
    pub ui_focused: bool,
}
