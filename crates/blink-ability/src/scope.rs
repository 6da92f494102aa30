//! Cleanup scopes: collect disposable resources and release them together.

use tracing::trace;

use crate::channel::Subscription;

/// Something with an explicit teardown operation.
pub trait Destroy {
    fn destroy(&mut self);
}

/// The resource shapes a scope knows how to release.
pub enum Disposable {
    /// Disconnected on release.
    Subscription(Subscription),
    /// Destroyed on release.
    Handle(Box<dyn Destroy>),
    /// Called once on release.
    Cleanup(Box<dyn FnOnce()>),
}

impl Disposable {
    /// Wrap a zero-argument cleanup function.
    pub fn cleanup(f: impl FnOnce() + 'static) -> Self {
        Self::Cleanup(Box::new(f))
    }

    /// Wrap a destroyable handle.
    pub fn handle(handle: impl Destroy + 'static) -> Self {
        Self::Handle(Box::new(handle))
    }

    fn dispose(self) {
        match self {
            Self::Subscription(subscription) => subscription.disconnect(),
            Self::Handle(mut handle) => handle.destroy(),
            Self::Cleanup(f) => f(),
        }
    }
}

impl From<Subscription> for Disposable {
    fn from(subscription: Subscription) -> Self {
        Self::Subscription(subscription)
    }
}

impl From<Box<dyn Destroy>> for Disposable {
    fn from(handle: Box<dyn Destroy>) -> Self {
        Self::Handle(handle)
    }
}

/// Ordered set of disposables released in insertion order.
///
/// After [`ScopedResourceSet::destroy`], anything added is released on the
/// spot instead of stored, so late handles never leak.
#[derive(Default)]
pub struct ScopedResourceSet {
    resources: Vec<Disposable>,
    destroyed: bool,
}

impl ScopedResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a resource, or dispose it immediately if the set is destroyed.
    pub fn add(&mut self, resource: impl Into<Disposable>) -> &mut Self {
        let resource = resource.into();
        if self.destroyed {
            trace!("scope_add_after_destroy");
            resource.dispose();
        } else {
            self.resources.push(resource);
        }
        self
    }

    /// Like [`add`](Self::add), but hands back a clone of the resource so a
    /// handle can be stored and kept in one step.
    pub fn add_returning<R>(&mut self, resource: R) -> R
    where
        R: Into<Disposable> + Clone,
    {
        self.add(resource.clone());
        resource
    }

    /// Store a cleanup closure.
    pub fn add_cleanup(&mut self, f: impl FnOnce() + 'static) -> &mut Self {
        self.add(Disposable::cleanup(f))
    }

    /// Dispose everything in insertion order and empty the set.
    pub fn clean(&mut self) {
        // Take first so a resource that triggers another clean sees an empty set.
        let resources = std::mem::take(&mut self.resources);
        for resource in resources {
            resource.dispose();
        }
    }

    /// Mark the set permanently released, then clean it.
    pub fn destroy(&mut self) {
        self.destroyed = true;
        self.clean();
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl Drop for ScopedResourceSet {
    fn drop(&mut self) {
        self.clean();
    }
}
