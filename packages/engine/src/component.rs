//! Component model
//!
//! A stateful component is a [`Component`] implementation plus the
//! bookkeeping the lifecycle machine keeps for each live instance
//! (props/state/context, pending snapshots, dirty/disabled flags, owned
//! node). Instances are shared through [`ComponentRef`].
//!
//! Hooks receive `&mut self` for the component's own data and a
//! [`ComponentRef`] for everything the engine owns, so a hook can request a
//! state update without re-entering the engine.

use crate::adapter::NodeId;
use crate::scheduler::RenderQueue;
use crate::value::{Context, NodeRef, PropMap};
use crate::vdom::VNode;
use std::any::TypeId;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

/// User component with overridable lifecycle hooks
pub trait Component: 'static {
    fn create(props: &PropMap, context: &Context) -> Self
    where
        Self: Sized;

    fn default_props() -> PropMap
    where
        Self: Sized,
    {
        PropMap::new()
    }

    fn initial_state(&self, _props: &PropMap, _context: &Context) -> PropMap {
        PropMap::new()
    }

    fn render(&self, props: &PropMap, state: &PropMap, context: &Context) -> Option<VNode>;

    /// Entries merged into the context seen by descendants
    fn child_context(&self, _props: &PropMap, _state: &PropMap, _context: &Context) -> Option<PropMap> {
        None
    }

    fn will_mount(&mut self, _this: &ComponentRef) {}

    fn did_mount(&mut self, _this: &ComponentRef) {}

    fn will_receive_props(&mut self, _this: &ComponentRef, _next_props: &PropMap, _next_context: &Context) {}

    fn should_update(
        &mut self,
        _this: &ComponentRef,
        _next_props: &PropMap,
        _next_state: &PropMap,
        _next_context: &Context,
    ) -> bool {
        true
    }

    fn will_update(
        &mut self,
        _this: &ComponentRef,
        _next_props: &PropMap,
        _next_state: &PropMap,
        _next_context: &Context,
    ) {
    }

    fn did_update(
        &mut self,
        _this: &ComponentRef,
        _prev_props: &PropMap,
        _prev_state: &PropMap,
        _prev_context: &Context,
    ) {
    }

    fn will_unmount(&mut self, _this: &ComponentRef) {}

    fn did_unmount(&mut self, _this: &ComponentRef) {}
}

/// Constructor identity of a stateful component
#[derive(Clone, Copy)]
pub struct ComponentClass {
    type_id: TypeId,
    name: &'static str,
    construct: fn(&PropMap, &Context) -> Box<dyn Component>,
    defaults: fn() -> PropMap,
}

fn construct_boxed<T: Component>(props: &PropMap, context: &Context) -> Box<dyn Component> {
    Box::new(T::create(props, context))
}

impl ComponentClass {
    pub fn of<T: Component>() -> Self {
        let full = std::any::type_name::<T>();
        ComponentClass {
            type_id: TypeId::of::<T>(),
            name: full.rsplit("::").next().unwrap_or(full),
            construct: construct_boxed::<T>,
            defaults: T::default_props,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn default_props(&self) -> PropMap {
        (self.defaults)()
    }

    pub(crate) fn construct(&self, props: &PropMap, context: &Context) -> Box<dyn Component> {
        (self.construct)(props, context)
    }
}

impl PartialEq for ComponentClass {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ComponentClass {}

impl fmt::Debug for ComponentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentClass({})", self.name)
    }
}

type RenderFn = dyn Fn(&PropMap, &Context) -> Option<VNode>;

/// Stateless `props -> tree` component
#[derive(Clone)]
pub struct FunctionalComponent {
    name: Rc<str>,
    render: Rc<RenderFn>,
}

impl FunctionalComponent {
    pub fn new(
        name: impl Into<String>,
        render: impl Fn(&PropMap, &Context) -> Option<VNode> + 'static,
    ) -> Self {
        FunctionalComponent {
            name: Rc::from(name.into()),
            render: Rc::new(render),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, props: &PropMap, context: &Context) -> Option<VNode> {
        (self.render)(props, context)
    }
}

impl PartialEq for FunctionalComponent {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.render, &other.render)
    }
}

impl fmt::Debug for FunctionalComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionalComponent({})", self.name)
    }
}

/// Partial state change requested through [`ComponentRef::set_state`]
pub enum StateUpdate {
    /// Entries merged over the current state
    Merge(PropMap),
    /// Entries computed from `(state, props)`, then merged
    Derive(Box<dyn FnOnce(&PropMap, &PropMap) -> PropMap>),
}

impl StateUpdate {
    pub fn derive(f: impl FnOnce(&PropMap, &PropMap) -> PropMap + 'static) -> Self {
        StateUpdate::Derive(Box::new(f))
    }
}

impl From<PropMap> for StateUpdate {
    fn from(patch: PropMap) -> Self {
        StateUpdate::Merge(patch)
    }
}

/// Per-instance engine bookkeeping
#[derive(Default)]
pub(crate) struct Lifecycle {
    pub props: PropMap,
    pub state: PropMap,
    pub context: Context,
    pub prev_props: Option<PropMap>,
    pub prev_state: Option<PropMap>,
    pub prev_context: Option<Context>,
    pub dirty: bool,
    pub disabled: bool,
    pub base: Option<NodeId>,
    pub next_base: Option<NodeId>,
    pub child_component: Option<ComponentRef>,
    pub parent_component: Option<WeakComponentRef>,
    pub render_callbacks: Vec<Box<dyn FnOnce()>>,
    pub key: Option<String>,
    pub component_ref: Option<NodeRef>,
}

struct ComponentCell {
    class: ComponentClass,
    behavior: RefCell<Box<dyn Component>>,
    lifecycle: RefCell<Lifecycle>,
    queue: Weak<RenderQueue>,
}

/// Shared handle to a live component instance
#[derive(Clone)]
pub struct ComponentRef(Rc<ComponentCell>);

/// Non-owning back-reference (child to parent)
#[derive(Clone)]
pub(crate) struct WeakComponentRef(Weak<ComponentCell>);

impl WeakComponentRef {
    pub fn upgrade(&self) -> Option<ComponentRef> {
        self.0.upgrade().map(ComponentRef)
    }
}

impl ComponentRef {
    pub(crate) fn instantiate(
        class: ComponentClass,
        props: &PropMap,
        context: &Context,
        queue: Weak<RenderQueue>,
    ) -> Self {
        let behavior = class.construct(props, context);
        let state = behavior.initial_state(props, context);

        ComponentRef(Rc::new(ComponentCell {
            class,
            behavior: RefCell::new(behavior),
            lifecycle: RefCell::new(Lifecycle {
                props: props.clone(),
                state,
                context: context.clone(),
                ..Lifecycle::default()
            }),
            queue,
        }))
    }

    pub fn class(&self) -> ComponentClass {
        self.0.class
    }

    pub fn name(&self) -> &'static str {
        self.0.class.name()
    }

    pub fn props(&self) -> PropMap {
        self.lifecycle().props.clone()
    }

    pub fn state(&self) -> PropMap {
        self.lifecycle().state.clone()
    }

    pub fn context(&self) -> Context {
        self.lifecycle().context.clone()
    }

    /// Live node this instance currently owns
    pub fn base(&self) -> Option<NodeId> {
        self.lifecycle().base
    }

    pub fn key(&self) -> Option<String> {
        self.lifecycle().key.clone()
    }

    /// Waiting in the render queue
    pub fn is_dirty(&self) -> bool {
        self.lifecycle().dirty
    }

    /// Inside a lifecycle transition, or unmounted
    pub fn is_disabled(&self) -> bool {
        self.lifecycle().disabled
    }

    pub fn child_component(&self) -> Option<ComponentRef> {
        self.lifecycle().child_component.clone()
    }

    pub fn parent_component(&self) -> Option<ComponentRef> {
        self.lifecycle()
            .parent_component
            .as_ref()
            .and_then(WeakComponentRef::upgrade)
    }

    /// Merge a state change and schedule a re-render
    pub fn set_state(&self, update: impl Into<StateUpdate>) {
        self.apply_state(update.into(), None);
    }

    /// Like [`set_state`](Self::set_state); `callback` runs once after the next render of this instance
    pub fn set_state_then(&self, update: impl Into<StateUpdate>, callback: impl FnOnce() + 'static) {
        self.apply_state(update.into(), Some(Box::new(callback)));
    }

    fn apply_state(&self, update: StateUpdate, callback: Option<Box<dyn FnOnce()>>) {
        {
            let mut lifecycle = self.lifecycle_mut();
            if lifecycle.prev_state.is_none() {
                lifecycle.prev_state = Some(lifecycle.state.clone());
            }

            let patch = match update {
                StateUpdate::Merge(patch) => patch,
                StateUpdate::Derive(derive) => derive(&lifecycle.state, &lifecycle.props),
            };
            lifecycle.state.extend(patch);

            if let Some(callback) = callback {
                lifecycle.render_callbacks.push(callback);
            }
        }

        if let Some(queue) = self.0.queue.upgrade() {
            queue.enqueue(self);
        }
    }

    pub fn ptr_eq(&self, other: &ComponentRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn downgrade(&self) -> WeakComponentRef {
        WeakComponentRef(Rc::downgrade(&self.0))
    }

    pub(crate) fn lifecycle(&self) -> Ref<'_, Lifecycle> {
        self.0.lifecycle.borrow()
    }

    pub(crate) fn lifecycle_mut(&self) -> RefMut<'_, Lifecycle> {
        self.0.lifecycle.borrow_mut()
    }

    /// Returns false when already dirty
    pub(crate) fn mark_dirty(&self) -> bool {
        let mut lifecycle = self.lifecycle_mut();
        if lifecycle.dirty {
            return false;
        }
        lifecycle.dirty = true;
        true
    }

    /// Run a hook. No engine-side borrow of this instance is held meanwhile.
    pub(crate) fn call_hook<R>(&self, hook: impl FnOnce(&mut dyn Component, &ComponentRef) -> R) -> R {
        let mut behavior = self.0.behavior.borrow_mut();
        hook(behavior.as_mut(), self)
    }

    pub(crate) fn render_output(&self, props: &PropMap, state: &PropMap, context: &Context) -> Option<VNode> {
        self.0.behavior.borrow().render(props, state, context)
    }

    pub(crate) fn child_context(&self, props: &PropMap, state: &PropMap, context: &Context) -> Option<PropMap> {
        self.0.behavior.borrow().child_context(props, state, context)
    }
}

impl PartialEq for ComponentRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lifecycle = self.0.lifecycle.try_borrow();
        let mut s = f.debug_struct("ComponentRef");
        s.field("name", &self.name());
        if let Ok(lifecycle) = lifecycle {
            s.field("base", &lifecycle.base)
                .field("dirty", &lifecycle.dirty)
                .field("disabled", &lifecycle.disabled);
        }
        s.finish()
    }
}
