//! Tests for the lifecycle engine: scopes, channel re-entrancy, state machine
//! and cooldown policy.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use blink_core::clock::ManualClock;
use blink_core::events::AbilityEvent;

use crate::channel::EventChannel;
use crate::cooldown::Cooldown;
use crate::machine::{AbilityHooks, AbilityStateMachine, ActivationFlow};
use crate::scheduler::Scheduler;
use crate::scope::{Destroy, Disposable, ScopedResourceSet};

/// Destroyable handle that counts how many times it was destroyed.
struct Counted(Rc<Cell<u32>>);

impl Destroy for Counted {
    fn destroy(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

fn counter() -> Rc<Cell<u32>> {
    Rc::new(Cell::new(0))
}

fn machine_with(clock: &ManualClock, hooks: AbilityHooks) -> AbilityStateMachine {
    AbilityStateMachine::new("dash", Rc::new(clock.clone()), hooks)
}

fn record_events(machine: &AbilityStateMachine) -> Rc<RefCell<Vec<AbilityEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    machine
        .subscribe(move |event| sink.borrow_mut().push(*event))
        .unwrap();
    log
}

// ---- ScopedResourceSet ----

#[test]
fn test_scope_clean_disposes_each_resource_once() {
    let channel: EventChannel<u32> = EventChannel::new();
    let subscription = channel.subscribe(|_| {}).unwrap();
    let handle_count = counter();
    let cleanup_count = counter();

    let mut scope = ScopedResourceSet::new();
    let c = cleanup_count.clone();
    scope
        .add(subscription.clone())
        .add(Disposable::handle(Counted(handle_count.clone())))
        .add_cleanup(move || c.set(c.get() + 1));
    assert_eq!(scope.len(), 3);

    scope.clean();
    scope.clean();
    assert!(!subscription.is_connected());
    assert_eq!(handle_count.get(), 1);
    assert_eq!(cleanup_count.get(), 1);
    assert!(scope.is_empty());
}

#[test]
fn test_scope_disposes_in_insertion_order() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let mut scope = ScopedResourceSet::new();
    for i in 0..4 {
        let o = order.clone();
        scope.add_cleanup(move || o.borrow_mut().push(i));
    }
    scope.clean();
    assert_eq!(*order.borrow(), vec![0, 1, 2, 3]);
}

#[test]
fn test_scope_add_after_destroy_disposes_synchronously() {
    let mut scope = ScopedResourceSet::new();
    scope.destroy();
    let count = counter();
    scope.add(Disposable::handle(Counted(count.clone())));
    assert_eq!(count.get(), 1, "disposed inside add");
    assert!(scope.is_empty());
    assert!(scope.is_destroyed());
}

#[test]
fn test_scope_reusable_after_clean() {
    let count = counter();
    let mut scope = ScopedResourceSet::new();
    scope.add(Disposable::handle(Counted(count.clone())));
    scope.clean();
    scope.add(Disposable::handle(Counted(count.clone())));
    assert_eq!(scope.len(), 1, "clean does not destroy");
    scope.clean();
    assert_eq!(count.get(), 2);
}

#[test]
fn test_scope_add_returning_hands_back_the_resource() {
    let clock = ManualClock::new();
    let scheduler = Scheduler::new(clock);
    let mut scope = ScopedResourceSet::new();
    let handle = scope.add_returning(scheduler.delay(1.0, || {}));
    assert!(handle.is_pending());
    assert_eq!(scope.len(), 1);
    scope.clean();
    assert!(!handle.is_pending());
}

#[test]
fn test_scope_drop_releases_remaining() {
    let count = counter();
    {
        let mut scope = ScopedResourceSet::new();
        scope.add(Disposable::handle(Counted(count.clone())));
    }
    assert_eq!(count.get(), 1);
}

// ---- EventChannel re-entrancy ----

#[test]
fn test_disconnect_self_during_publish() {
    let channel: EventChannel<u32> = EventChannel::new();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let own: Rc<RefCell<Option<crate::channel::Subscription>>> = Rc::default();

    let (c, o) = (calls.clone(), own.clone());
    let sub = channel
        .subscribe(move |_| {
            c.borrow_mut().push("a");
            if let Some(s) = o.borrow().as_ref() {
                s.disconnect();
            }
        })
        .unwrap();
    *own.borrow_mut() = Some(sub);
    let c = calls.clone();
    channel.subscribe(move |_| c.borrow_mut().push("b")).unwrap();

    channel.publish(&0);
    channel.publish(&0);
    assert_eq!(*calls.borrow(), vec!["a", "b", "b"]);
}

#[test]
fn test_disconnect_other_during_publish() {
    let channel: EventChannel<u32> = EventChannel::new();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let victim: Rc<RefCell<Option<crate::channel::Subscription>>> = Rc::default();

    let (c, v) = (calls.clone(), victim.clone());
    channel
        .subscribe(move |_| {
            c.borrow_mut().push("killer");
            if let Some(s) = v.borrow().as_ref() {
                s.disconnect();
            }
        })
        .unwrap();
    let c = calls.clone();
    let sub = channel.subscribe(move |_| c.borrow_mut().push("victim")).unwrap();
    *victim.borrow_mut() = Some(sub);
    let c = calls.clone();
    channel.subscribe(move |_| c.borrow_mut().push("bystander")).unwrap();

    channel.publish(&0);
    assert_eq!(*calls.borrow(), vec!["killer", "bystander"]);
}

#[test]
fn test_reentrant_publish_skips_running_callback() {
    let channel: Rc<EventChannel<u32>> = Rc::new(EventChannel::new());
    let first_runs = Rc::new(Cell::new(0));
    let second_seen = Rc::new(RefCell::new(Vec::new()));

    let (runs, inner) = (first_runs.clone(), Rc::downgrade(&channel));
    channel
        .subscribe(move |event| {
            runs.set(runs.get() + 1);
            if *event == 1 {
                if let Some(channel) = inner.upgrade() {
                    channel.publish(&2);
                }
            }
        })
        .unwrap();
    let seen = second_seen.clone();
    channel
        .subscribe(move |event| seen.borrow_mut().push(*event))
        .unwrap();

    channel.publish(&1);
    assert_eq!(first_runs.get(), 1);
    assert_eq!(*second_seen.borrow(), vec![2, 1]);
}

// ---- Scheduler ----

#[test]
fn test_task_cancels_later_task_in_same_pass() {
    let clock = ManualClock::new();
    let scheduler = Scheduler::new(clock.clone());
    let victim: Rc<RefCell<Option<crate::scheduler::TaskHandle>>> = Rc::default();
    let victim_ran = Rc::new(Cell::new(false));

    let target = victim.clone();
    scheduler.delay(0.1, move || {
        if let Some(handle) = target.borrow().as_ref() {
            handle.cancel();
        }
    });
    let ran = victim_ran.clone();
    *victim.borrow_mut() = Some(scheduler.delay(0.2, move || ran.set(true)));

    clock.advance(1.0);
    assert_eq!(scheduler.run_due(), 1);
    assert!(!victim_ran.get());
    assert_eq!(scheduler.pending(), 0);
}

// ---- AbilityStateMachine ----

#[test]
fn test_flags_false_before_first_activation() {
    let clock = ManualClock::new();
    let machine = machine_with(&clock, AbilityHooks::new());
    assert!(!machine.is_active());
    assert!(!machine.is_on_cooldown());
    assert!(machine.last_activation().is_none());
    assert!(machine.can_activate());
}

#[test]
fn test_activate_publishes_then_runs_hook_with_session() {
    let clock = ManualClock::starting_at(3.0);
    let order = Rc::new(RefCell::new(Vec::new()));
    let o = order.clone();
    let mut machine = machine_with(
        &clock,
        AbilityHooks::new().on_activated(move |session| {
            o.borrow_mut().push("hook");
            session.add_cleanup(|| {});
            ActivationFlow::Running
        }),
    );
    let o = order.clone();
    machine
        .subscribe(move |event| {
            if matches!(event, AbilityEvent::Activated { .. }) {
                o.borrow_mut().push("event");
            }
        })
        .unwrap();

    assert!(machine.activate());
    assert_eq!(*order.borrow(), vec!["event", "hook"]);
    assert_eq!(machine.last_activation(), Some(3.0));
    assert_eq!(machine.session_len(), 1);
}

#[test]
fn test_session_cleaned_before_deactivated_event() {
    let clock = ManualClock::new();
    let released = Rc::new(Cell::new(false));
    let r = released.clone();
    let mut machine = machine_with(
        &clock,
        AbilityHooks::new().on_activated(move |session| {
            let r = r.clone();
            session.add_cleanup(move || r.set(true));
            ActivationFlow::Running
        }),
    );
    let seen_released = Rc::new(Cell::new(false));
    let (s, r) = (seen_released.clone(), released.clone());
    machine
        .subscribe(move |event| {
            if matches!(event, AbilityEvent::Deactivated) {
                s.set(r.get());
            }
        })
        .unwrap();

    machine.activate();
    machine.deactivate();
    assert!(seen_released.get());
    assert_eq!(machine.session_len(), 0);
}

#[test]
fn test_rejected_activation_has_no_side_effects() {
    let clock = ManualClock::new();
    let hook_calls = counter();
    let h = hook_calls.clone();
    let mut machine = machine_with(
        &clock,
        AbilityHooks::new().on_activated(move |session| {
            h.set(h.get() + 1);
            session.add_cleanup(|| {});
            ActivationFlow::Running
        }),
    );
    let events = record_events(&machine);

    assert!(machine.activate());
    let before = events.borrow().len();
    clock.advance(1.0);
    assert!(!machine.activate());
    assert_eq!(events.borrow().len(), before);
    assert_eq!(hook_calls.get(), 1);
    assert_eq!(machine.session_len(), 1);
    assert_eq!(machine.last_activation(), Some(0.0));

    machine.deactivate();
    machine.cooldown_flag().set(true);
    let before = events.borrow().len();
    assert!(!machine.activate(), "rejected while on cooldown");
    assert_eq!(events.borrow().len(), before);
}

#[test]
fn test_deactivate_when_idle_is_noop() {
    let clock = ManualClock::new();
    let deactivations = counter();
    let d = deactivations.clone();
    let mut machine = machine_with(
        &clock,
        AbilityHooks::new().on_deactivated(move || d.set(d.get() + 1)),
    );
    let events = record_events(&machine);
    machine.deactivate();
    assert_eq!(deactivations.get(), 0);
    assert!(events.borrow().is_empty());
}

#[test]
fn test_finished_flow_deactivates_immediately() {
    let clock = ManualClock::new();
    let mut machine = machine_with(
        &clock,
        AbilityHooks::new().on_activated(|_| ActivationFlow::Finished),
    );
    let events = record_events(&machine);
    assert!(machine.activate());
    assert!(!machine.is_active());
    assert_eq!(
        *events.borrow(),
        vec![AbilityEvent::Activated { at: 0.0 }, AbilityEvent::Deactivated]
    );
}

#[test]
fn test_destroy_forces_deactivate_and_blocks_activation() {
    let clock = ManualClock::new();
    let session_released = counter();
    let lifetime_released = counter();
    let s = session_released.clone();
    let mut machine = machine_with(
        &clock,
        AbilityHooks::new().on_activated(move |session| {
            let s = s.clone();
            session.add_cleanup(move || s.set(s.get() + 1));
            ActivationFlow::Running
        }),
    );
    let l = lifetime_released.clone();
    machine.lifetime_scope().add_cleanup(move || l.set(l.get() + 1));
    let events = record_events(&machine);

    machine.activate();
    machine.destroy();
    machine.destroy();

    assert!(!machine.is_active());
    assert!(machine.is_destroyed());
    assert_eq!(session_released.get(), 1);
    assert_eq!(lifetime_released.get(), 1);
    assert_eq!(
        *events.borrow(),
        vec![
            AbilityEvent::Activated { at: 0.0 },
            AbilityEvent::Deactivated,
            AbilityEvent::Destroyed,
        ]
    );
    assert!(!machine.activate());
    assert!(machine.subscribe(|_| {}).is_none());

    // Late resources are released on the spot.
    let late = counter();
    let l = late.clone();
    machine.lifetime_scope().add_cleanup(move || l.set(1));
    assert_eq!(late.get(), 1);
}

#[test]
fn test_active_only_between_activate_and_deactivate() {
    let clock = ManualClock::new();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut machine = machine_with(&clock, AbilityHooks::new());
    let mut expected_active = false;

    for _ in 0..500 {
        if rng.gen_bool(0.5) {
            let activated = machine.activate();
            assert_eq!(activated, !expected_active);
            expected_active = true;
        } else {
            machine.deactivate();
            expected_active = false;
        }
        assert_eq!(machine.is_active(), expected_active);
    }
}

// ---- Cooldown ----

#[test]
fn test_cooldown_blocks_second_activation_in_window() {
    let clock = ManualClock::new();
    let scheduler = Scheduler::new(clock.clone());
    let mut machine = machine_with(&clock, AbilityHooks::new());
    Cooldown::new(1.0).attach(&mut machine, &scheduler);
    let events = record_events(&machine);

    assert!(machine.activate());
    machine.deactivate();
    assert!(machine.is_on_cooldown());

    let before = events.borrow().len();
    clock.advance(0.5);
    scheduler.run_due();
    assert!(!machine.activate(), "second activation inside cooldown window");
    assert_eq!(events.borrow().len(), before);

    clock.advance(0.5);
    scheduler.run_due();
    assert!(!machine.is_on_cooldown());
    assert!(machine.activate());
}

#[test]
fn test_cooldown_zero_attaches_nothing() {
    let clock = ManualClock::new();
    let scheduler = Scheduler::new(clock.clone());
    let mut machine = machine_with(&clock, AbilityHooks::new());
    Cooldown::new(0.0).attach(&mut machine, &scheduler);
    machine.activate();
    machine.deactivate();
    assert!(!machine.is_on_cooldown());
    assert_eq!(machine.events().subscriber_count(), 0);
}

#[test]
fn test_destroy_cancels_pending_cooldown_timer() {
    let clock = ManualClock::new();
    let scheduler = Scheduler::new(clock.clone());
    let mut machine = machine_with(&clock, AbilityHooks::new());
    Cooldown::new(1.0).attach(&mut machine, &scheduler);
    machine.activate();
    machine.deactivate();
    assert_eq!(scheduler.pending(), 1);
    machine.destroy();
    assert_eq!(scheduler.pending(), 0);
}
