//! Component lifecycle machine
//!
//! `unmounted -> mounting -> mounted <-> updating -> unmounting -> unmounted`.
//! The `disabled` flag guards every transition against re-entry from the
//! component's own hooks, and stays set once the instance is unmounted.

use crate::adapter::{NodeId, TreeAdapter};
use crate::component::{ComponentClass, ComponentRef};
use crate::engine::{Engine, RenderMode};
use crate::error::{EngineError, EngineResult};
use crate::value::{Context, PropMap, RefTarget, Value};
use crate::vdom::{ComponentKind, ComponentNode, VNode};
use std::rc::Rc;
use tracing::debug;

impl<A: TreeAdapter> Engine<A> {
    pub(crate) fn instantiate(&self, class: ComponentClass, props: &PropMap, context: &Context) -> ComponentRef {
        debug!(component = class.name(), "creating component instance");
        ComponentRef::instantiate(class, props, context, Rc::downgrade(&self.queue))
    }

    /// Hand new props (and context) to `component`, then render per `mode`
    pub(crate) fn set_component_props(
        &mut self,
        component: &ComponentRef,
        mut props: PropMap,
        mode: RenderMode,
        context: &Context,
    ) -> EngineResult<()> {
        if component.is_disabled() {
            return Ok(());
        }
        component.lifecycle_mut().disabled = true;

        let node_ref = match props.remove("ref") {
            Some(Value::Ref(node_ref)) => Some(node_ref),
            _ => None,
        };
        let key = props.remove("key").and_then(|k| k.to_text());
        let mounted = {
            let mut lifecycle = component.lifecycle_mut();
            lifecycle.component_ref = node_ref.clone();
            lifecycle.key = key;
            lifecycle.base.is_some()
        };

        if mounted {
            component.call_hook(|behavior, this| behavior.will_receive_props(this, &props, context));
        } else {
            component.call_hook(|behavior, this| behavior.will_mount(this));
        }

        {
            let mut lifecycle = component.lifecycle_mut();
            if !Rc::ptr_eq(context, &lifecycle.context) {
                if lifecycle.prev_context.is_none() {
                    lifecycle.prev_context = Some(lifecycle.context.clone());
                }
                lifecycle.context = context.clone();
            }

            let previous = std::mem::replace(&mut lifecycle.props, props);
            if lifecycle.prev_props.is_none() {
                lifecycle.prev_props = Some(previous);
            }
            lifecycle.disabled = false;
        }

        match mode {
            RenderMode::NoRender => {}
            RenderMode::Sync => self.render_component(component, RenderMode::Sync, false)?,
            _ if !mounted => self.render_component(component, RenderMode::Sync, false)?,
            _ => self.queue.enqueue(component),
        }

        if let Some(node_ref) = node_ref {
            node_ref.call(RefTarget::Component(component.clone()));
        }

        Ok(())
    }

    /// Render `component` and reconcile its output.
    ///
    /// `is_child` marks the render of a freshly created child component from
    /// inside its parent's render; such renders neither register ownership
    /// nor flush mount callbacks.
    pub(crate) fn render_component(
        &mut self,
        component: &ComponentRef,
        mode: RenderMode,
        is_child: bool,
    ) -> EngineResult<()> {
        if component.is_disabled() {
            return Ok(());
        }

        let (props, state, context, previous_props, previous_state, previous_context, base, next_base, initial_child) = {
            let lifecycle = component.lifecycle();
            (
                lifecycle.props.clone(),
                lifecycle.state.clone(),
                lifecycle.context.clone(),
                lifecycle.prev_props.clone().unwrap_or_else(|| lifecycle.props.clone()),
                lifecycle.prev_state.clone().unwrap_or_else(|| lifecycle.state.clone()),
                lifecycle.prev_context.clone().unwrap_or_else(|| lifecycle.context.clone()),
                lifecycle.base,
                lifecycle.next_base,
                lifecycle.child_component.clone(),
            )
        };

        let is_update = base.is_some();
        let initial_base = base.or(next_base);
        let mut skip = false;

        if is_update {
            // Hooks observe the previous values through `this` while deciding
            {
                let mut lifecycle = component.lifecycle_mut();
                lifecycle.props = previous_props.clone();
                lifecycle.state = previous_state.clone();
                lifecycle.context = previous_context.clone();
            }

            if mode != RenderMode::Force
                && !component.call_hook(|behavior, this| behavior.should_update(this, &props, &state, &context))
            {
                skip = true;
            } else {
                component.call_hook(|behavior, this| behavior.will_update(this, &props, &state, &context));
            }

            let mut lifecycle = component.lifecycle_mut();
            lifecycle.props = props.clone();
            lifecycle.state = state.clone();
            lifecycle.context = context.clone();
        }

        {
            let mut lifecycle = component.lifecycle_mut();
            lifecycle.prev_props = None;
            lifecycle.prev_state = None;
            lifecycle.prev_context = None;
            lifecycle.next_base = None;
            lifecycle.dirty = false;
        }

        if skip {
            debug!(component = component.name(), "render skipped by should_update");
        } else {
            self.render_body(
                component,
                mode,
                is_child,
                (&props, &state, &context),
                initial_base,
                next_base,
                initial_child,
            )?;
        }

        if !is_update {
            if component.base().is_some() {
                self.mounts.push(component.clone());
            }
        } else if !skip {
            component.call_hook(|behavior, this| {
                behavior.did_update(this, &previous_props, &previous_state, &previous_context)
            });
        }

        let callbacks = std::mem::take(&mut component.lifecycle_mut().render_callbacks);
        for callback in callbacks.into_iter().rev() {
            callback();
        }

        if self.diff_level == 0 && !is_child {
            self.flush_mounts();
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn render_body(
        &mut self,
        component: &ComponentRef,
        mode: RenderMode,
        is_child: bool,
        (props, state, context): (&PropMap, &PropMap, &Context),
        initial_base: Option<NodeId>,
        next_base: Option<NodeId>,
        initial_child: Option<ComponentRef>,
    ) -> EngineResult<()> {
        let rendered = component.render_output(props, state, context);

        let context = match component.child_context(props, state, context) {
            Some(extra) => {
                let mut merged = (**context).clone();
                merged.extend(extra);
                Rc::new(merged)
            }
            None => context.clone(),
        };

        let rendered = self.resolve_functional(rendered, &context)?;

        let mut to_unmount: Option<ComponentRef> = None;
        let mut instance: Option<ComponentRef> = None;
        let base: Option<NodeId>;

        match stateful_child(&rendered) {
            Some((class, node)) => {
                let child_props = node.node_props();
                let child_key = child_props.get("key").and_then(Value::to_text);

                let reusable = initial_child
                    .clone()
                    .filter(|child| child.class() == class && child.key() == child_key);

                let child = match reusable {
                    Some(child) => {
                        self.set_component_props(&child, child_props, RenderMode::Sync, &context)?;
                        child
                    }
                    None => {
                        to_unmount = initial_child.clone();

                        let child = self.instantiate(class, &child_props, &context);
                        {
                            let mut lifecycle = child.lifecycle_mut();
                            if lifecycle.next_base.is_none() {
                                lifecycle.next_base = next_base;
                            }
                            lifecycle.parent_component = Some(component.downgrade());
                        }
                        component.lifecycle_mut().child_component = Some(child.clone());

                        self.set_component_props(&child, child_props, RenderMode::NoRender, &context)?;
                        self.render_component(&child, RenderMode::Sync, true)?;
                        child
                    }
                };

                base = child.base();
                instance = Some(child);
            }
            None => {
                let mut previous_root = initial_base;
                to_unmount = initial_child.clone();

                if to_unmount.is_some() {
                    previous_root = None;
                    component.lifecycle_mut().child_component = None;
                }

                if initial_base.is_some() || mode == RenderMode::Sync {
                    if let Some(root) = previous_root {
                        self.identity.clear_owner(root);
                    }
                    let container = initial_base.and_then(|b| self.adapter.parent(b));
                    base = Some(self.diff(previous_root, rendered, &context, container, true)?);
                } else {
                    base = None;
                }
            }
        }

        let same_child = match (&instance, &initial_child) {
            (Some(a), Some(b)) => a.ptr_eq(b),
            (None, None) => true,
            _ => false,
        };

        if let (Some(initial), Some(new_base)) = (initial_base, base) {
            if new_base != initial && !same_child {
                if let Some(parent) = self.adapter.parent(initial) {
                    if new_base != parent {
                        debug!(component = component.name(), old = %initial, new = %new_base, "component root replaced");
                        self.adapter.replace_child(parent, new_base, initial)?;
                        if to_unmount.is_none() {
                            self.recollect(initial)?;
                        }
                    }
                }
            }
        }

        if let Some(outgoing) = to_unmount {
            self.unmount_component(&outgoing, base != initial_base)?;
        }

        component.lifecycle_mut().base = base;

        if let (Some(base), false) = (base, is_child) {
            let mut owner = component.clone();
            let mut cursor = component.parent_component();
            while let Some(parent) = cursor {
                parent.lifecycle_mut().base = Some(base);
                cursor = parent.parent_component();
                owner = parent;
            }
            self.identity.set_owner(base, &owner);
        }

        Ok(())
    }

    /// Reconcile a stateful component node into `node`
    pub(crate) fn build_component_from_vnode(
        &mut self,
        node: Option<NodeId>,
        vnode: &ComponentNode,
        context: &Context,
    ) -> EngineResult<NodeId> {
        let class = match &vnode.kind {
            ComponentKind::Stateful(class) => *class,
            ComponentKind::Functional(_) => {
                let resolved = self.resolve_functional(Some(VNode::Component(Rc::new(vnode.clone()))), context)?;
                return self.idiff(node, resolved, context);
            }
        };

        let original = self.owner(node);
        let is_direct_owner =
            original.is_some() && node.and_then(|n| self.identity.constructor(n)) == Some(class);

        // An ancestor in the parent chain may own this position too
        let mut owner = original.clone();
        let mut is_owner = is_direct_owner;
        while !is_owner {
            owner = owner.and_then(|c| c.parent_component());
            match &owner {
                Some(candidate) => is_owner = candidate.class() == class,
                None => break,
            }
        }

        let props = vnode.node_props();

        let result = match owner.filter(|_| is_owner) {
            Some(owner) => {
                self.set_component_props(&owner, props, RenderMode::Async, context)?;
                owner.base()
            }
            None => {
                let mut node = node;
                let mut old_node = node;

                if let Some(original) = original {
                    self.unmount_component(&original, true)?;
                    node = None;
                    old_node = None;
                }

                let component = self.instantiate(class, &props, context);
                if let Some(adopt) = node {
                    let mut lifecycle = component.lifecycle_mut();
                    if lifecycle.next_base.is_none() {
                        lifecycle.next_base = Some(adopt);
                        old_node = None;
                    }
                }

                self.set_component_props(&component, props, RenderMode::Sync, context)?;
                let base = component.base();

                if let Some(old) = old_node {
                    if base != Some(old) {
                        self.recollect(old)?;
                    }
                }
                base
            }
        };

        result.ok_or_else(|| EngineError::MissingBase {
            component: class.name().to_string(),
        })
    }

    /// Tear down `component` and the subtree it owns.
    ///
    /// With `remove` unset the live root is left in place: it is shared with
    /// the instance replacing this one.
    pub(crate) fn unmount_component(&mut self, component: &ComponentRef, remove: bool) -> EngineResult<()> {
        debug!(component = component.name(), base = ?component.base(), "unmounting component");

        component.lifecycle_mut().disabled = true;
        component.call_hook(|behavior, this| behavior.will_unmount(this));

        let (base, inner) = {
            let mut lifecycle = component.lifecycle_mut();
            (lifecycle.base.take(), lifecycle.child_component.clone())
        };

        if let Some(inner) = inner {
            self.unmount_component(&inner, remove)?;
        } else if let (Some(base), true) = (base, remove) {
            if let Some(entry) = self.identity.remove(base) {
                if let Some(node_ref) = entry.vnode.as_ref().and_then(VNode::node_ref) {
                    node_ref.call(RefTarget::Detached);
                }
            }
            if let Some(parent) = self.adapter.parent(base) {
                self.adapter.remove_child(parent, base)?;
            }
            self.discard_children(base)?;
        }

        let component_ref = component.lifecycle().component_ref.clone();
        if let Some(node_ref) = component_ref {
            node_ref.call(RefTarget::Detached);
        }
        component.call_hook(|behavior, this| behavior.did_unmount(this));

        Ok(())
    }
}

/// Class and node when `rendered` is a stateful component
fn stateful_child(rendered: &Option<VNode>) -> Option<(ComponentClass, &ComponentNode)> {
    match rendered {
        Some(VNode::Component(node)) => match &node.kind {
            ComponentKind::Stateful(class) => Some((*class, node.as_ref())),
            ComponentKind::Functional(_) => None,
        },
        _ => None,
    }
}
