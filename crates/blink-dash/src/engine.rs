//! Headless dash runtime.
//!
//! `DashEngine` owns the clock, scheduler, ECS world and the dash ability,
//! applies queued player commands at tick boundaries and produces a
//! `DashSnapshot` per tick. Nothing here touches a window or a renderer,
//! which keeps whole dashes reproducible in tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use hecs::{Entity, World};
use tracing::{debug, trace};

use blink_ability::{Scheduler, TaskHandle};
use blink_core::clock::{Clock, ManualClock};
use blink_core::commands::PlayerCommand;
use blink_core::components::{AgentBody, TrailTemplate};
use blink_core::config::DashConfig;
use blink_core::constants::DEFAULT_STEP_SECS;
use blink_core::error::ConfigError;
use blink_core::events::AbilityEvent;
use blink_core::state::DashSnapshot;
use blink_core::types::Transform;
use blink_spatial::StaticScene;

use crate::ability::DashAbility;
use crate::collaborators::{DashContext, FeedbackRecorder};
use crate::world_setup::{self, CommandAim, WorldAgent};

/// Configuration for starting a new engine.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub dash: DashConfig,
    /// Agent root pose at tick 0.
    pub spawn: Transform,
    pub agent: AgentBody,
    pub trail: TrailTemplate,
}

pub struct DashEngine {
    clock: ManualClock,
    scheduler: Scheduler,
    world: Rc<RefCell<World>>,
    agent: Entity,
    scene: Rc<StaticScene>,
    aim: Rc<CommandAim>,
    feedback: Rc<FeedbackRecorder>,
    ability: DashAbility,
    tick: u64,
    ui_focused: bool,
    command_queue: VecDeque<PlayerCommand>,
    events: Rc<RefCell<Vec<AbilityEvent>>>,
    auto_deactivate: Option<TaskHandle>,
}

impl DashEngine {
    /// Create an engine over `scene`. Fails on an invalid dash config.
    pub fn new(config: EngineConfig, scene: StaticScene) -> Result<Self, ConfigError> {
        config.dash.validate()?;

        let clock = ManualClock::new();
        let scheduler = Scheduler::new(clock.clone());
        let mut world = World::new();
        let agent = world_setup::spawn_agent(&mut world, config.spawn, config.agent);
        let world = Rc::new(RefCell::new(world));
        let scene = Rc::new(scene);
        let aim = Rc::new(CommandAim::default());
        let feedback = Rc::new(FeedbackRecorder::new());

        let context = DashContext {
            agent: Rc::new(WorldAgent::new(world.clone(), agent)),
            aim: aim.clone(),
            spatial: scene.clone(),
            camera: feedback.clone(),
            effects: feedback.clone(),
            animator: feedback.clone(),
        };
        let ability = DashAbility::new(config.dash, context, config.trail, scheduler.clone());

        let events: Rc<RefCell<Vec<AbilityEvent>>> = Rc::default();
        let log = events.clone();
        let _ = ability.subscribe(move |event| log.borrow_mut().push(*event));

        Ok(Self {
            clock,
            scheduler,
            world,
            agent,
            scene,
            aim,
            feedback,
            ability,
            tick: 0,
            ui_focused: false,
            command_queue: VecDeque::new(),
            events,
            auto_deactivate: None,
        })
    }

    /// Queue a player command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: PlayerCommand) {
        self.command_queue.push_back(command);
    }

    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = PlayerCommand>) {
        self.command_queue.extend(commands);
    }

    /// Apply queued commands, advance the clock by `dt` seconds, run every
    /// due continuation and return the resulting snapshot.
    pub fn tick(&mut self, dt: f64) -> DashSnapshot {
        self.process_commands();
        self.clock.advance(dt);
        let ran = self.scheduler.run_due();
        self.tick += 1;
        trace!(tick = self.tick, ran, "tick");
        self.snapshot()
    }

    /// Tick at the default 60 Hz step.
    pub fn step(&mut self) -> DashSnapshot {
        self.tick(DEFAULT_STEP_SECS)
    }

    /// Tick at `dt` until at least `secs` have passed. Returns the last
    /// snapshot carrying the events and feedback of every tick in the run.
    pub fn run_for(&mut self, secs: f64, dt: f64) -> DashSnapshot {
        let until = self.clock.now() + secs - 1e-9;
        let mut events = Vec::new();
        let mut feedback = Vec::new();
        loop {
            let mut snapshot = self.tick(dt);
            events.append(&mut snapshot.events);
            feedback.append(&mut snapshot.feedback);
            if dt <= 0.0 || self.clock.now() >= until {
                snapshot.events = events;
                snapshot.feedback = feedback;
                return snapshot;
            }
        }
    }

    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    fn handle_command(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::Dash { aim } => {
                if self.ui_focused {
                    debug!("dash_ignored_ui_focused");
                    return;
                }
                self.aim.set(aim);
                if !self.ability.activate() {
                    return;
                }
                self.cancel_auto_deactivate();
                let auto = self.ability.config().auto_deactivate_secs;
                if let (Some(secs), true) = (auto, self.ability.is_active()) {
                    self.auto_deactivate = Some(self.ability.schedule_deactivation(secs));
                }
            }
            PlayerCommand::Deactivate => {
                self.cancel_auto_deactivate();
                self.ability.deactivate();
            }
            PlayerCommand::SetUiFocus { focused } => {
                self.ui_focused = focused;
            }
            PlayerCommand::Destroy => {
                self.cancel_auto_deactivate();
                self.ability.destroy();
            }
        }
    }

    fn cancel_auto_deactivate(&mut self) {
        if let Some(handle) = self.auto_deactivate.take() {
            handle.cancel();
        }
    }

    fn snapshot(&self) -> DashSnapshot {
        DashSnapshot {
            tick: self.tick,
            time_secs: self.clock.now(),
            agent: self.agent_pose(),
            ability: self.ability.view(),
            outcome: self.ability.last_outcome(),
            trail_in_use: self.ability.trail_in_use(),
            events: std::mem::take(&mut *self.events.borrow_mut()),
            feedback: self.feedback.drain(),
            ui_focused: self.ui_focused,
        }
    }

    // ---- Agent ----

    pub fn agent_pose(&self) -> Option<Transform> {
        self.world
            .borrow()
            .get::<&Transform>(self.agent)
            .ok()
            .map(|t| *t)
    }

    pub fn agent_body(&self) -> Option<AgentBody> {
        self.world
            .borrow()
            .get::<&AgentBody>(self.agent)
            .ok()
            .map(|b| *b)
    }

    /// Remove the agent's character, as while it is respawning.
    pub fn unload_agent(&mut self) {
        let _ = self.world.borrow_mut().remove_one::<Transform>(self.agent);
    }

    /// Give the agent a character again at `pose`.
    pub fn load_agent(&mut self, pose: Transform) {
        let _ = self.world.borrow_mut().insert_one(self.agent, pose);
    }

    // ---- Accessors ----

    pub fn ability(&self) -> &DashAbility {
        &self.ability
    }

    pub fn scene(&self) -> &StaticScene {
        &self.scene
    }

    pub fn time(&self) -> f64 {
        self.clock.now()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn is_ui_focused(&self) -> bool {
        self.ui_focused
    }

    /// Afterimages recorded since the last snapshot.
    pub fn pending_afterimages(&self) -> usize {
        self.feedback.afterimage_count()
    }
}
