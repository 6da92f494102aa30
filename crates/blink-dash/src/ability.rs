//! The dash ability: composition root tying the lifecycle machine, cooldown,
//! target resolver, motion and trail pool together.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde::Serialize;
use tracing::{debug, info, warn};

use blink_ability::{
    AbilityHooks, AbilityStateMachine, ActivationFlow, Cooldown, FrameControl, LivenessToken,
    Scheduler, ScopedResourceSet, Subscription, TaskHandle,
};
use blink_core::components::TrailTemplate;
use blink_core::config::{DashConfig, ResolveFailurePolicy};
use blink_core::constants::DASH_ANIMATION;
use blink_core::error::ResolveFailure;
use blink_core::events::AbilityEvent;
use blink_core::state::{AbilityView, DashOutcome};
use blink_core::types::Transform;
use blink_spatial::{QueryFilter, TargetResolver};

use crate::collaborators::{Afterimage, DashContext};
use crate::motion::{DashMotion, SnapshotCadence};
use crate::pool::EntityPool;

/// Counters across every activation of one ability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashStats {
    pub dashes_started: u32,
    pub dashes_arrived: u32,
    pub snapshots_emitted: u32,
    pub snapshots_skipped: u32,
}

struct DashShared {
    config: DashConfig,
    context: DashContext,
    resolver: TargetResolver,
    scheduler: Scheduler,
    pool: RefCell<EntityPool>,
    outcome: Cell<Option<DashOutcome>>,
    stats: Cell<DashStats>,
}

impl DashShared {
    fn bump(&self, f: impl FnOnce(&mut DashStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    /// Check out a pooled entity at `pose`, hand it to the effect sink and
    /// put it straight back. Skipped when the pool is exhausted.
    fn emit_snapshot(&self, pose: Transform) {
        let (entity, snapshot) = {
            let mut pool = self.pool.borrow_mut();
            let Some(entity) = pool.checkout() else {
                debug!(capacity = pool.capacity(), "trail_pool_exhausted");
                self.bump(|s| s.snapshots_skipped += 1);
                return;
            };
            pool.set_transform(entity, pose);
            (entity, pool.snapshot(entity))
        };
        if let Some(snapshot) = snapshot {
            self.context.effects.afterimage(Afterimage {
                transform: snapshot.transform,
                fade_secs: self.config.pool.afterimage_fade_secs,
                template: snapshot.template,
            });
            self.bump(|s| s.snapshots_emitted += 1);
        }
        self.pool.borrow_mut().release(entity);
    }
}

/// One dash's movement, resumed once per scheduler pass. Holds the ability
/// weakly: the scheduler that owns this task is itself owned by it.
struct MotionRun {
    shared: Weak<DashShared>,
    motion: DashMotion,
    landing: Transform,
    cadence: SnapshotCadence,
    started_at: f64,
    liveness: LivenessToken,
}

impl MotionRun {
    fn step(&mut self, now: f64) -> FrameControl {
        let Some(shared) = self.shared.upgrade() else {
            return FrameControl::Done;
        };
        if !self.liveness.is_alive() {
            return FrameControl::Done;
        }
        let elapsed = now - self.started_at;
        shared.context.agent.set_pose(self.motion.sample(elapsed));
        // A long step catches up on missed snapshots, each at its own time.
        while let Some(at) = self.cadence.next_due(elapsed) {
            shared.emit_snapshot(self.motion.sample(at));
        }
        if !self.motion.is_complete(elapsed) {
            return FrameControl::Continue;
        }
        shared.outcome.set(Some(DashOutcome::Arrived {
            target: self.landing,
        }));
        shared.bump(|s| s.dashes_arrived += 1);
        debug!(elapsed, "dash_arrived");
        FrameControl::Done
    }
}

pub struct DashAbility {
    machine: Rc<RefCell<AbilityStateMachine>>,
    shared: Rc<DashShared>,
}

impl DashAbility {
    pub fn new(
        config: DashConfig,
        context: DashContext,
        template: TrailTemplate,
        scheduler: Scheduler,
    ) -> Self {
        let shared = Rc::new(DashShared {
            resolver: TargetResolver::new(config.resolver.clone()),
            pool: RefCell::new(EntityPool::new(template, config.pool.capacity)),
            outcome: Cell::new(None),
            stats: Cell::new(DashStats::default()),
            scheduler: scheduler.clone(),
            context,
            config,
        });

        let on_start = shared.clone();
        let on_stop = shared.clone();
        let hooks = AbilityHooks::new()
            .on_activated(move |session| begin_dash(&on_start, session))
            .on_deactivated(move || end_dash(&on_stop));
        let mut machine = AbilityStateMachine::new("dash", scheduler.clock(), hooks);
        Cooldown::new(shared.config.cooldown_secs).attach(&mut machine, &scheduler);

        Self {
            machine: Rc::new(RefCell::new(machine)),
            shared,
        }
    }

    pub fn activate(&self) -> bool {
        self.machine.borrow_mut().activate()
    }

    pub fn deactivate(&self) {
        self.machine.borrow_mut().deactivate();
    }

    pub fn destroy(&self) {
        self.machine.borrow_mut().destroy();
    }

    /// Deactivate `secs` from now unless the handle is cancelled first.
    pub fn schedule_deactivation(&self, secs: f64) -> TaskHandle {
        let machine: Weak<RefCell<AbilityStateMachine>> = Rc::downgrade(&self.machine);
        self.shared.scheduler.delay(secs, move || {
            if let Some(machine) = machine.upgrade() {
                info!(secs, "dash_auto_deactivate");
                machine.borrow_mut().deactivate();
            }
        })
    }

    pub fn subscribe(&self, callback: impl FnMut(&AbilityEvent) + 'static) -> Option<Subscription> {
        self.machine.borrow().subscribe(callback)
    }

    pub fn is_active(&self) -> bool {
        self.machine.borrow().is_active()
    }

    pub fn is_on_cooldown(&self) -> bool {
        self.machine.borrow().is_on_cooldown()
    }

    pub fn is_destroyed(&self) -> bool {
        self.machine.borrow().is_destroyed()
    }

    pub fn view(&self) -> AbilityView {
        self.machine.borrow().view()
    }

    /// What the most recent activation did, if there was one.
    pub fn last_outcome(&self) -> Option<DashOutcome> {
        self.shared.outcome.get()
    }

    pub fn stats(&self) -> DashStats {
        self.shared.stats.get()
    }

    pub fn config(&self) -> &DashConfig {
        &self.shared.config
    }

    pub fn trail_in_use(&self) -> usize {
        self.shared.pool.borrow().in_use_len()
    }

    /// Direct access to the trail pool, for hosts that hold entities longer.
    pub fn with_pool<R>(&self, f: impl FnOnce(&mut EntityPool) -> R) -> R {
        f(&mut self.shared.pool.borrow_mut())
    }
}

fn begin_dash(shared: &Rc<DashShared>, session: &mut ScopedResourceSet) -> ActivationFlow {
    let ctx = &shared.context;
    let config = &shared.config;
    let liveness = session.add_returning(LivenessToken::new());

    ctx.agent.set_movement_locked(true);
    ctx.animator.play(DASH_ANIMATION, config.dash_duration_secs);
    ctx.camera.pulse_fov(config.dash_duration_secs, config.fov_pulse_degrees);
    ctx.camera.shake(config.dash_duration_secs, config.camera_shake_magnitude);
    ctx.effects.impact_frame(config.impact_frame_secs);

    let resolved = match ctx.agent.pose() {
        Some(pose) => {
            let aim = ctx.aim.aim_ray(&pose);
            let filter = QueryFilter::excluding(ctx.agent.collider());
            shared
                .resolver
                .resolve(ctx.spatial.as_ref(), Some(&pose), &aim, &filter)
                .map(|landing| (pose, landing))
        }
        None => Err(ResolveFailure::NoCharacter),
    };

    let (start, landing) = match resolved {
        Ok(pair) => pair,
        Err(reason) => {
            warn!(%reason, policy = ?config.failure_policy, "dash_target_unresolved");
            shared.outcome.set(Some(DashOutcome::Failed { reason }));
            return match config.failure_policy {
                ResolveFailurePolicy::HoldActive => ActivationFlow::Running,
                ResolveFailurePolicy::Deactivate => ActivationFlow::Finished,
            };
        }
    };

    let motion = DashMotion::new(
        start,
        landing,
        ctx.agent.hip_height(),
        config.dash_duration_secs,
    );
    shared.outcome.set(Some(DashOutcome::Moving { target: landing }));
    shared.bump(|s| s.dashes_started += 1);
    debug!(
        x = landing.position.x,
        y = landing.position.y,
        z = landing.position.z,
        "dash_target_resolved"
    );

    let runner = Rc::downgrade(shared);
    let token = liveness.clone();
    let starter = shared.scheduler.delay(config.impact_frame_secs, move || {
        if let (Some(shared), true) = (runner.upgrade(), token.is_alive()) {
            start_motion(&shared, motion, landing, token);
        }
    });
    liveness.adopt(starter);
    ActivationFlow::Running
}

fn start_motion(
    shared: &Rc<DashShared>,
    motion: DashMotion,
    landing: Transform,
    liveness: LivenessToken,
) {
    let started_at = shared.scheduler.now();
    let mut run = MotionRun {
        shared: Rc::downgrade(shared),
        motion,
        landing,
        cadence: SnapshotCadence::new(
            shared.config.snapshot_interval_secs,
            shared.config.dash_duration_secs,
        ),
        started_at,
        liveness: liveness.clone(),
    };
    if run.step(started_at) == FrameControl::Done {
        return;
    }
    let handle = shared.scheduler.every_frame(move |now| run.step(now));
    liveness.adopt(handle);
}

fn end_dash(shared: &DashShared) {
    shared.context.agent.set_movement_locked(false);
    if let Some(DashOutcome::Moving { .. }) = shared.outcome.get() {
        debug!("dash_interrupted");
        shared.outcome.set(Some(DashOutcome::Interrupted));
    }
}
