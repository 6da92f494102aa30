//! Cooldown policy layered on lifecycle events.
//!
//! Every `Deactivated` event puts the ability on cooldown and schedules the
//! flag's clearing. A new deactivation restarts the timer.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use blink_core::events::AbilityEvent;

use crate::machine::AbilityStateMachine;
use crate::scheduler::{Scheduler, TaskHandle};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cooldown {
    pub secs: f64,
}

impl Cooldown {
    pub fn new(secs: f64) -> Self {
        Self { secs }
    }

    /// Subscribe to `machine`. The subscription and any pending timer are
    /// released with the machine's lifetime scope. A non-positive duration
    /// attaches nothing.
    pub fn attach(self, machine: &mut AbilityStateMachine, scheduler: &Scheduler) {
        if !(self.secs > 0.0) {
            return;
        }
        let secs = self.secs;
        let flag = machine.cooldown_flag();
        let pending: Rc<RefCell<Option<TaskHandle>>> = Rc::default();
        let timer = pending.clone();
        let scheduler = scheduler.clone();

        let subscription = machine.subscribe(move |event| {
            if !matches!(event, AbilityEvent::Deactivated) {
                return;
            }
            flag.set(true);
            if let Some(previous) = timer.borrow_mut().take() {
                previous.cancel();
            }
            let clear = flag.clone();
            let handle = scheduler.delay(secs, move || {
                clear.set(false);
                debug!(secs, "cooldown_elapsed");
            });
            *timer.borrow_mut() = Some(handle);
        });

        let Some(subscription) = subscription else {
            return;
        };
        machine
            .lifetime_scope()
            .add(subscription)
            .add_cleanup(move || {
                if let Some(handle) = pending.borrow_mut().take() {
                    handle.cancel();
                }
            });
    }
}
