//! Render queue and mount-completion queue
//!
//! State changes mark a component dirty and append it to the pending queue.
//! Only the first entry of a batch asks the host to schedule a flush, so any
//! number of updates in one synchronous burst collapse into a single flush.

use crate::component::ComponentRef;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::trace;

/// Host capability: run `Engine::flush` on a later turn
pub trait FlushScheduler {
    fn schedule_flush(&self);
}

/// Records flush requests; the host drives flushes itself
#[derive(Debug, Default)]
pub struct ManualScheduler {
    requests: Cell<usize>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of flushes requested so far
    pub fn requests(&self) -> usize {
        self.requests.get()
    }
}

impl FlushScheduler for ManualScheduler {
    fn schedule_flush(&self) {
        self.requests.set(self.requests.get() + 1);
    }
}

/// Closure-backed scheduler
pub struct FnScheduler(Box<dyn Fn()>);

impl FnScheduler {
    pub fn new(f: impl Fn() + 'static) -> Self {
        FnScheduler(Box::new(f))
    }
}

impl FlushScheduler for FnScheduler {
    fn schedule_flush(&self) {
        (self.0)()
    }
}

/// Wakes an async host through [`tokio::sync::Notify`].
///
/// A request made while nobody waits is kept, so the next
/// [`wait`](Self::wait) returns immediately.
#[cfg(feature = "async")]
#[derive(Debug, Default, Clone)]
pub struct NotifyScheduler {
    notify: std::sync::Arc<tokio::sync::Notify>,
}

#[cfg(feature = "async")]
impl NotifyScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn wait(&self) {
        self.notify.notified().await
    }
}

#[cfg(feature = "async")]
impl FlushScheduler for NotifyScheduler {
    fn schedule_flush(&self) {
        self.notify.notify_one();
    }
}

/// Components waiting for a scheduled re-render
pub struct RenderQueue {
    pending: RefCell<Vec<ComponentRef>>,
    scheduler: RefCell<Rc<dyn FlushScheduler>>,
}

impl RenderQueue {
    pub fn new(scheduler: Rc<dyn FlushScheduler>) -> Self {
        RenderQueue {
            pending: RefCell::new(Vec::new()),
            scheduler: RefCell::new(scheduler),
        }
    }

    /// Route later flush requests to `scheduler`. A non-empty queue asks it
    /// for a flush right away.
    pub fn set_scheduler(&self, scheduler: Rc<dyn FlushScheduler>) {
        *self.scheduler.borrow_mut() = scheduler;
        if !self.is_empty() {
            self.request_flush();
        }
    }

    fn request_flush(&self) {
        let scheduler = self.scheduler.borrow().clone();
        scheduler.schedule_flush();
    }

    pub fn enqueue(&self, component: &ComponentRef) {
        if !component.mark_dirty() {
            return;
        }

        let len = {
            let mut pending = self.pending.borrow_mut();
            pending.push(component.clone());
            pending.len()
        };
        trace!(component = component.name(), pending = len, "enqueued render");

        if len == 1 {
            self.request_flush();
        }
    }

    /// Detach the current batch; later enqueues start a fresh one
    pub fn take_batch(&self) -> Vec<ComponentRef> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }
}

/// Components whose first mount finished and still await `did_mount`
#[derive(Default)]
pub(crate) struct MountQueue {
    pending: Vec<ComponentRef>,
}

impl MountQueue {
    pub fn push(&mut self, component: ComponentRef) {
        self.pending.push(component);
    }

    /// Next component to notify, most recently queued first
    pub fn pop(&mut self) -> Option<ComponentRef> {
        self.pending.pop()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
