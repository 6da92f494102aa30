//! Commands sent from the input layer to the dash engine.
//!
//! Commands are queued and applied at the next tick boundary.

use serde::{Deserialize, Serialize};

use crate::types::Ray;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerCommand {
    /// Edge-triggered dash request aimed along `aim` (usually camera to cursor).
    Dash { aim: Ray },
    /// Deactivate the running dash, if any.
    Deactivate,
    /// A UI element gained or lost input focus. Dash requests are ignored
    /// while focused.
    SetUiFocus { focused: bool },
    /// Tear the ability down permanently.
    Destroy,
}
