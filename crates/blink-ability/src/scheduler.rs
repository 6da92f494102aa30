//! Cooperative scheduler for deferred and per-frame continuations.
//!
//! Nothing runs on its own: the owner calls [`Scheduler::run_due`] once per
//! simulation step after advancing the clock. Tasks scheduled while a pass is
//! running are picked up by the next pass, never the current one.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use blink_core::clock::Clock;

use crate::scope::{Destroy, Disposable};

/// Returned by a per-frame task after each resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameControl {
    Continue,
    Done,
}

enum TaskKind {
    Deferred(Box<dyn FnOnce()>),
    Frame(Box<dyn FnMut(f64) -> FrameControl>),
}

struct Task {
    id: u64,
    due: f64,
    kind: TaskKind,
    alive: Rc<Cell<bool>>,
}

struct SchedulerInner {
    clock: Rc<dyn Clock>,
    tasks: RefCell<Vec<Task>>,
    next_id: Cell<u64>,
}

/// Cheap-to-clone handle to a shared task queue.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

/// Handle to a scheduled task. Cancelling is idempotent.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    alive: Rc<Cell<bool>>,
}

impl TaskHandle {
    pub fn cancel(&self) {
        self.alive.set(false);
    }

    /// Still waiting to run (deferred) or still resuming (per-frame).
    pub fn is_pending(&self) -> bool {
        self.alive.get()
    }
}

impl Destroy for TaskHandle {
    fn destroy(&mut self) {
        self.cancel();
    }
}

impl From<TaskHandle> for Disposable {
    fn from(handle: TaskHandle) -> Self {
        Disposable::handle(handle)
    }
}

impl Scheduler {
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self::with_clock(Rc::new(clock))
    }

    pub fn with_clock(clock: Rc<dyn Clock>) -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                clock,
                tasks: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    pub fn clock(&self) -> Rc<dyn Clock> {
        self.inner.clock.clone()
    }

    pub fn now(&self) -> f64 {
        self.inner.clock.now()
    }

    /// Run `f` once, on the first pass at least `secs` from now.
    pub fn delay(&self, secs: f64, f: impl FnOnce() + 'static) -> TaskHandle {
        let due = self.now() + secs.max(0.0);
        self.push(due, TaskKind::Deferred(Box::new(f)))
    }

    /// Resume `f` on every pass, starting with the next one, until it
    /// returns [`FrameControl::Done`] or is cancelled.
    pub fn every_frame(&self, f: impl FnMut(f64) -> FrameControl + 'static) -> TaskHandle {
        let due = self.now();
        self.push(due, TaskKind::Frame(Box::new(f)))
    }

    fn push(&self, due: f64, kind: TaskKind) -> TaskHandle {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        let alive = Rc::new(Cell::new(true));
        self.inner.tasks.borrow_mut().push(Task {
            id,
            due,
            kind,
            alive: alive.clone(),
        });
        TaskHandle { alive }
    }

    /// Run every task due at the current clock time. Returns how many ran.
    pub fn run_due(&self) -> usize {
        let now = self.now();
        let mut ready = {
            let mut tasks = self.inner.tasks.borrow_mut();
            tasks.retain(|task| task.alive.get());
            let (ready, waiting): (Vec<Task>, Vec<Task>) =
                tasks.drain(..).partition(|task| task.due <= now);
            *tasks = waiting;
            ready
        };
        ready.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)));

        let mut ran = 0;
        for task in ready {
            // An earlier task in this pass may have cancelled this one.
            if !task.alive.get() {
                continue;
            }
            ran += 1;
            match task.kind {
                TaskKind::Deferred(f) => {
                    task.alive.set(false);
                    f();
                }
                TaskKind::Frame(mut f) => match f(now) {
                    FrameControl::Continue if task.alive.get() => {
                        self.inner.tasks.borrow_mut().push(Task {
                            kind: TaskKind::Frame(f),
                            ..task
                        });
                    }
                    _ => task.alive.set(false),
                },
            }
        }
        ran
    }

    /// Number of tasks still scheduled.
    pub fn pending(&self) -> usize {
        self.inner
            .tasks
            .borrow()
            .iter()
            .filter(|task| task.alive.get())
            .count()
    }
}
