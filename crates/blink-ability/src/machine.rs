//! Generic ability lifecycle: activation gate, session/lifetime scopes and
//! lifecycle events.
//!
//! Concrete abilities plug in through [`AbilityHooks`] instead of
//! subclassing. Cooldown is not handled here; see [`crate::cooldown`].

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, info, trace};

use blink_core::clock::Clock;
use blink_core::events::AbilityEvent;
use blink_core::state::AbilityView;

use crate::channel::{EventChannel, Subscription};
use crate::scope::ScopedResourceSet;

/// Returned by the activation hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationFlow {
    /// The activation keeps running until `deactivate` is called.
    Running,
    /// The activation is over already; deactivate right away.
    Finished,
}

type ActivateHook = Box<dyn FnMut(&mut ScopedResourceSet) -> ActivationFlow>;
type DeactivateHook = Box<dyn FnMut()>;

/// Ability-specific behaviour run by the state machine.
#[derive(Default)]
pub struct AbilityHooks {
    on_activated: Option<ActivateHook>,
    on_deactivated: Option<DeactivateHook>,
}

impl AbilityHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called after `Activated` is published, with the fresh session scope.
    pub fn on_activated(
        mut self,
        hook: impl FnMut(&mut ScopedResourceSet) -> ActivationFlow + 'static,
    ) -> Self {
        self.on_activated = Some(Box::new(hook));
        self
    }

    /// Called at the start of deactivation, before the session is cleaned.
    pub fn on_deactivated(mut self, hook: impl FnMut() + 'static) -> Self {
        self.on_deactivated = Some(Box::new(hook));
        self
    }
}

/// Shared `on_cooldown` flag, written by cooldown policy.
#[derive(Debug, Clone, Default)]
pub struct CooldownFlag(Rc<Cell<bool>>);

impl CooldownFlag {
    pub fn get(&self) -> bool {
        self.0.get()
    }

    pub fn set(&self, on_cooldown: bool) {
        self.0.set(on_cooldown);
    }
}

pub struct AbilityStateMachine {
    name: String,
    clock: Rc<dyn Clock>,
    hooks: AbilityHooks,
    active: bool,
    destroyed: bool,
    cooldown: CooldownFlag,
    last_activation: Option<f64>,
    lifetime: ScopedResourceSet,
    session: ScopedResourceSet,
    events: EventChannel<AbilityEvent>,
}

impl AbilityStateMachine {
    pub fn new(name: impl Into<String>, clock: Rc<dyn Clock>, hooks: AbilityHooks) -> Self {
        Self {
            name: name.into(),
            clock,
            hooks,
            active: false,
            destroyed: false,
            cooldown: CooldownFlag::default(),
            last_activation: None,
            lifetime: ScopedResourceSet::new(),
            session: ScopedResourceSet::new(),
            events: EventChannel::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn can_activate(&self) -> bool {
        !self.active && !self.cooldown.get() && !self.destroyed
    }

    /// Try to activate. Rejections are silent: no event, no scope change.
    pub fn activate(&mut self) -> bool {
        if !self.can_activate() {
            trace!(
                ability = %self.name,
                active = self.active,
                on_cooldown = self.cooldown.get(),
                destroyed = self.destroyed,
                "activation_rejected"
            );
            return false;
        }

        let now = self.clock.now();
        self.active = true;
        self.last_activation = Some(now);
        self.session.clean();
        info!(ability = %self.name, at = now, "ability_activated");
        self.events.publish(&AbilityEvent::Activated { at: now });

        let flow = match self.hooks.on_activated.as_mut() {
            Some(hook) => hook(&mut self.session),
            None => ActivationFlow::Running,
        };
        if flow == ActivationFlow::Finished {
            debug!(ability = %self.name, "activation_finished_immediately");
            self.deactivate();
        }
        true
    }

    /// Return to idle. No-op when not active.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(hook) = self.hooks.on_deactivated.as_mut() {
            hook();
        }
        let released = self.session.len();
        self.session.clean();
        info!(ability = %self.name, released, "ability_deactivated");
        self.events.publish(&AbilityEvent::Deactivated);
    }

    /// Tear down permanently. Idempotent.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.deactivate();
        self.destroyed = true;
        info!(ability = %self.name, "ability_destroyed");
        self.events.publish(&AbilityEvent::Destroyed);
        self.session.destroy();
        self.lifetime.destroy();
        self.events.destroy();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_on_cooldown(&self) -> bool {
        self.cooldown.get()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn last_activation(&self) -> Option<f64> {
        self.last_activation
    }

    pub fn cooldown_flag(&self) -> CooldownFlag {
        self.cooldown.clone()
    }

    pub fn events(&self) -> &EventChannel<AbilityEvent> {
        &self.events
    }

    /// Shorthand for `events().subscribe(..)`.
    pub fn subscribe(&self, callback: impl FnMut(&AbilityEvent) + 'static) -> Option<Subscription> {
        self.events.subscribe(callback)
    }

    /// Resources that live until the ability is destroyed.
    pub fn lifetime_scope(&mut self) -> &mut ScopedResourceSet {
        &mut self.lifetime
    }

    /// Resources registered by the current activation.
    pub fn session_len(&self) -> usize {
        self.session.len()
    }

    pub fn view(&self) -> AbilityView {
        AbilityView {
            active: self.active,
            on_cooldown: self.cooldown.get(),
            destroyed: self.destroyed,
            last_activation: self.last_activation,
        }
    }
}

impl Drop for AbilityStateMachine {
    fn drop(&mut self) {
        self.destroy();
    }
}
