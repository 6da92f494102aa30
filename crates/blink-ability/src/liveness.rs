//! Liveness token for continuations that outlive the call that started them.
//!
//! An activation hands the token to every task it schedules and registers
//! the token in its session scope. Cleaning the session kills the token,
//! which cancels the adopted tasks; tasks also check it after each resume.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::scheduler::TaskHandle;
use crate::scope::{Destroy, Disposable};

#[derive(Debug, Clone)]
pub struct LivenessToken {
    alive: Rc<Cell<bool>>,
    tasks: Rc<RefCell<Vec<TaskHandle>>>,
}

impl Default for LivenessToken {
    fn default() -> Self {
        Self::new()
    }
}

impl LivenessToken {
    pub fn new() -> Self {
        Self {
            alive: Rc::new(Cell::new(true)),
            tasks: Rc::default(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    /// Tie a task to this token. A dead token cancels it on the spot.
    pub fn adopt(&self, handle: TaskHandle) {
        if self.is_alive() {
            self.tasks.borrow_mut().retain(TaskHandle::is_pending);
            self.tasks.borrow_mut().push(handle);
        } else {
            handle.cancel();
        }
    }

    pub fn kill(&self) {
        self.alive.set(false);
        for handle in self.tasks.borrow_mut().drain(..) {
            handle.cancel();
        }
    }
}

impl Destroy for LivenessToken {
    fn destroy(&mut self) {
        self.kill();
    }
}

impl From<LivenessToken> for Disposable {
    fn from(token: LivenessToken) -> Self {
        Disposable::handle(token)
    }
}
