//! Engine entry points
//!
//! One [`Engine`] owns everything a render touches: the adapter, the
//! identity store, the render and mount queues, the ambient diff state and
//! the configuration. Independent engines never share state.

use crate::adapter::{NodeId, TreeAdapter};
use crate::component::{ComponentRef, StateUpdate};
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::identity::IdentityStore;
use crate::scheduler::{FlushScheduler, ManualScheduler, MountQueue, RenderQueue};
use crate::value::{Context, PropMap};
use crate::vdom::VNode;
use std::rc::Rc;
use tracing::{debug, info, instrument};

/// How a component render is dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Update fields only
    NoRender,
    /// Render now
    Sync,
    /// Render now, bypassing `should_update`
    Force,
    /// Go through the render queue
    Async,
}

pub struct Engine<A: TreeAdapter> {
    pub(crate) adapter: A,
    pub(crate) identity: IdentityStore,
    pub(crate) queue: Rc<RenderQueue>,
    pub(crate) mounts: MountQueue,
    pub(crate) config: EngineConfig,
    /// Creating SVG-namespaced elements
    pub(crate) svg_mode: bool,
    /// Nesting depth of `diff`; 0 outside any reconciliation
    pub(crate) diff_level: usize,
    root_context: Context,
}

impl<A: TreeAdapter> Engine<A> {
    pub fn new(adapter: A) -> Self {
        Engine {
            adapter,
            identity: IdentityStore::new(),
            queue: Rc::new(RenderQueue::new(Rc::new(ManualScheduler::new()))),
            mounts: MountQueue::default(),
            config: EngineConfig::default(),
            svg_mode: false,
            diff_level: 0,
            root_context: Context::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the flush scheduler. Renders already queued are kept and
    /// reported to the new scheduler.
    pub fn with_scheduler(self, scheduler: Rc<dyn FlushScheduler>) -> Self {
        self.queue.set_scheduler(scheduler);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    pub fn into_adapter(self) -> A {
        self.adapter
    }

    pub fn identity(&self) -> &IdentityStore {
        &self.identity
    }

    /// Component whose root is `node`
    pub fn owner_of(&self, node: NodeId) -> Option<ComponentRef> {
        self.identity.component(node)
    }

    /// Virtual node last reconciled into `node`
    pub fn vnode_of(&self, node: NodeId) -> Option<VNode> {
        self.identity.vnode(node)
    }

    /// Reconcile `vnode` against the last child of `container` and attach the
    /// result to `container`.
    #[instrument(level = "debug", skip(self, vnode), fields(container = %container))]
    pub fn mount(&mut self, vnode: impl Into<Option<VNode>>, container: NodeId) -> EngineResult<NodeId> {
        let context = self.root_context.clone();
        self.mount_in_context(vnode.into(), container, &context)
    }

    /// [`mount`](Self::mount) with an initial context for the whole tree
    #[instrument(level = "debug", skip(self, vnode, context), fields(container = %container))]
    pub fn mount_with_context(
        &mut self,
        vnode: impl Into<Option<VNode>>,
        container: NodeId,
        context: PropMap,
    ) -> EngineResult<NodeId> {
        let context = Rc::new(context);
        self.mount_in_context(vnode.into(), container, &context)
    }

    fn mount_in_context(
        &mut self,
        vnode: Option<VNode>,
        container: NodeId,
        context: &Context,
    ) -> EngineResult<NodeId> {
        let existing = self.adapter.last_child(container);
        let out = self.diff(existing, vnode, context, Some(container), false)?;
        debug!(node = %out, reused = existing == Some(out), "mounted tree");
        Ok(out)
    }

    /// Discard a live node and everything it owns
    #[instrument(level = "debug", skip(self))]
    pub fn unmount(&mut self, node: NodeId) -> EngineResult<()> {
        self.recollect(node)
    }

    /// Merge a state change into `component` and schedule its re-render
    pub fn request_update(&self, component: &ComponentRef, update: impl Into<StateUpdate>) {
        component.set_state(update);
    }

    /// [`request_update`](Self::request_update) with a callback run after the re-render
    pub fn request_update_then(
        &self,
        component: &ComponentRef,
        update: impl Into<StateUpdate>,
        callback: impl FnOnce() + 'static,
    ) {
        component.set_state_then(update, callback);
    }

    /// Re-render `component` synchronously, ignoring `should_update`
    #[instrument(level = "debug", skip(self, component), fields(component = component.name()))]
    pub fn force_render(&mut self, component: &ComponentRef) -> EngineResult<()> {
        self.render_component(component, RenderMode::Force, false)
    }

    /// Render every component queued so far, most recently queued first.
    ///
    /// Components enqueued while flushing wait for the next flush. Returns the
    /// number of components rendered; unmounted ones are dropped.
    pub fn flush(&mut self) -> EngineResult<usize> {
        let batch = self.queue.take_batch();
        if batch.is_empty() {
            return Ok(0);
        }
        debug!(queued = batch.len(), "flushing render queue");

        let mut rendered = 0;
        for component in batch.into_iter().rev() {
            if component.is_dirty() && !component.is_disabled() {
                self.render_component(&component, RenderMode::Async, false)?;
                rendered += 1;
            }
        }
        Ok(rendered)
    }

    /// Flush until no render is pending
    pub fn run_until_idle(&mut self) -> EngineResult<usize> {
        let mut total = 0;
        while !self.queue.is_empty() {
            total += self.flush()?;
        }
        if total > 0 {
            info!(rendered = total, "render queue idle");
        }
        Ok(total)
    }

    pub fn has_pending_renders(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn pending_renders(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn flush_mounts(&mut self) {
        if self.mounts.len() > 0 {
            debug!(components = self.mounts.len(), "flushing mount callbacks");
        }
        while let Some(component) = self.mounts.pop() {
            component.call_hook(|behavior, this| behavior.did_mount(this));
        }
    }
}
