//! Tree diff
//!
//! Reconciles a live node against a target virtual node, reusing the live
//! node whenever its shape allows and replacing it otherwise. Children are
//! matched by key first, then by position among the unkeyed leftovers.

use crate::accessor::set_accessor;
use crate::adapter::{Namespace, NodeId, TreeAdapter};
use crate::component::ComponentRef;
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::value::{Context, PropMap, RefTarget, Value};
use crate::vdom::{ComponentKind, ElementNode, VNode};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use tracing::{debug, trace};

impl<A: TreeAdapter> Engine<A> {
    /// Top-level diff pass.
    ///
    /// Tracks the nesting level: the outermost pass picks the namespace from
    /// `container` and, unless it renders a component root, flushes pending
    /// mount callbacks once the tree has settled.
    pub(crate) fn diff(
        &mut self,
        node: Option<NodeId>,
        vnode: Option<VNode>,
        context: &Context,
        container: Option<NodeId>,
        component_root: bool,
    ) -> EngineResult<NodeId> {
        if self.diff_level == 0 {
            self.svg_mode = container.is_some_and(|c| self.adapter.namespace(c) == Namespace::Svg);
        }
        self.diff_level += 1;

        let result = self.idiff(node, vnode, context).and_then(|out| {
            if let Some(container) = container {
                if self.adapter.parent(out) != Some(container) {
                    self.adapter.append_child(container, out)?;
                }
            }
            Ok(out)
        });

        self.diff_level -= 1;
        if self.diff_level == 0 && !component_root {
            self.flush_mounts();
        }
        result
    }

    /// Reconcile one position
    pub(crate) fn idiff(
        &mut self,
        node: Option<NodeId>,
        vnode: Option<VNode>,
        context: &Context,
    ) -> EngineResult<NodeId> {
        let vnode = self.resolve_functional(vnode, context)?;

        match vnode {
            None => self.diff_text(node, ""),
            Some(VNode::Text(text)) => self.diff_text(node, &text),
            Some(VNode::Component(component)) => self.build_component_from_vnode(node, &component, context),
            Some(VNode::Element(element)) => self.diff_element(node, element, context),
        }
    }

    /// Expand functional components until the result is something else
    pub(crate) fn resolve_functional(
        &self,
        mut vnode: Option<VNode>,
        context: &Context,
    ) -> EngineResult<Option<VNode>> {
        let mut depth = 0;

        while let Some(VNode::Component(component)) = &vnode {
            let ComponentKind::Functional(function) = &component.kind else {
                break;
            };

            depth += 1;
            if depth > self.config.max_functional_depth {
                return Err(EngineError::RecursiveComponent {
                    component: function.name().to_string(),
                    depth: self.config.max_functional_depth,
                });
            }

            let next = function.call(&component.node_props(), context);
            vnode = next;
        }

        Ok(vnode)
    }

    fn diff_text(&mut self, node: Option<NodeId>, text: &str) -> EngineResult<NodeId> {
        if let Some(node) = node {
            if let Some(current) = self.adapter.text(node) {
                if current != text {
                    self.adapter.set_text(node, text)?;
                }
                return Ok(node);
            }
            self.recollect(node)?;
        }

        Ok(self.adapter.create_text(text)?)
    }

    fn diff_element(
        &mut self,
        node: Option<NodeId>,
        element: Rc<ElementNode>,
        context: &Context,
    ) -> EngineResult<NodeId> {
        let previous_svg = self.svg_mode;
        if element.tag == "svg" {
            self.svg_mode = true;
        } else if element.tag == "foreignObject" {
            self.svg_mode = false;
        }

        let result = self.diff_element_in_namespace(node, element, context);
        self.svg_mode = previous_svg;
        result
    }

    fn diff_element_in_namespace(
        &mut self,
        node: Option<NodeId>,
        element: Rc<ElementNode>,
        context: &Context,
    ) -> EngineResult<NodeId> {
        let reusable = node.filter(|n| {
            self.adapter
                .tag_name(*n)
                .is_some_and(|tag| tag.eq_ignore_ascii_case(&element.tag))
        });

        let out = match reusable {
            Some(out) => out,
            None => {
                let namespace = if self.svg_mode {
                    Namespace::Svg
                } else {
                    Namespace::Html
                };
                let out = self.adapter.create_element(&element.tag, namespace)?;

                if let Some(old) = node {
                    debug!(old = %old, new = %out, tag = %element.tag, "replacing node");
                    if let Some(parent) = self.adapter.parent(old) {
                        self.adapter.replace_child(parent, out, old)?;
                    }
                    self.recollect(old)?;
                }
                out
            }
        };

        let previous = match self.identity.vnode(out) {
            Some(VNode::Element(previous)) => Some(previous),
            _ => None,
        };
        self.identity.record_vnode(out, VNode::Element(element.clone()));

        let old_children = previous.as_ref().map_or(&[][..], |p| p.children.as_slice());
        self.diff_children(out, &element.children, old_children, context)?;

        self.diff_attributes(out, &element.attributes, previous.as_ref().map(|p| &p.attributes))?;

        if let Some(node_ref) = element.attributes.get("ref").and_then(Value::as_ref_callback) {
            node_ref.call(RefTarget::Node(out));
        }

        Ok(out)
    }

    /// Keyed child-list reconciliation
    pub(crate) fn diff_children(
        &mut self,
        container: NodeId,
        children: &[VNode],
        old_children: &[VNode],
        context: &Context,
    ) -> EngineResult<()> {
        let live = self.adapter.children(container);
        let original_len = live.len();

        let mut keyed: HashMap<String, NodeId> = HashMap::new();
        let mut keyed_order: Vec<String> = Vec::new();
        let mut unkeyed: VecDeque<NodeId> = VecDeque::new();

        for (old, handle) in old_children.iter().zip(live.iter().copied()) {
            match old.key() {
                Some(key) if !keyed.contains_key(key) => {
                    keyed.insert(key.to_string(), handle);
                    keyed_order.push(key.to_string());
                }
                // A repeated key is matched positionally like an unkeyed child
                _ => unkeyed.push_back(handle),
            }
        }

        for (index, child) in children.iter().enumerate() {
            let candidate = child
                .key()
                .and_then(|key| keyed.remove(key))
                .or_else(|| unkeyed.pop_front());
            trace!(index, key = child.key(), candidate = ?candidate, "matching child");

            let out = self.idiff(candidate, Some(child.clone()), context)?;

            if index >= original_len {
                if self.adapter.parent(out) != Some(container)
                    || self.adapter.last_child(container) != Some(out)
                {
                    self.adapter.append_child(container, out)?;
                }
            } else {
                match self.adapter.child_at(container, index) {
                    Some(current) if current == out => {}
                    Some(current) => self.adapter.insert_before(container, out, current)?,
                    None => self.adapter.append_child(container, out)?,
                }
            }
        }

        for key in keyed_order {
            if let Some(handle) = keyed.remove(&key) {
                self.recollect(handle)?;
            }
        }
        for handle in unkeyed {
            self.recollect(handle)?;
        }

        Ok(())
    }

    /// Clear attributes that disappeared, set the ones that changed
    pub(crate) fn diff_attributes(
        &mut self,
        node: NodeId,
        attributes: &PropMap,
        previous: Option<&PropMap>,
    ) -> EngineResult<()> {
        if let Some(previous) = previous {
            for (name, old) in previous {
                if !attributes.contains_key(name) && !old.is_null() {
                    set_accessor(
                        &mut self.adapter,
                        &self.config,
                        node,
                        name,
                        &Value::Null,
                        Some(old),
                        self.svg_mode,
                    )?;
                }
            }
        }

        for (name, value) in attributes {
            if name == "children" || name == "innerHTML" {
                continue;
            }

            let old = previous.and_then(|p| p.get(name));
            let unchanged = match old {
                Some(old) => old == value,
                None => value.is_null(),
            };
            if unchanged {
                continue;
            }

            set_accessor(
                &mut self.adapter,
                &self.config,
                node,
                name,
                value,
                old,
                self.svg_mode,
            )?;
        }

        Ok(())
    }

    /// Discard a live node.
    ///
    /// A component root is handed to its owner's unmount. Anything else
    /// detaches its ref, leaves its parent and forgets its identity, then its
    /// children are discarded last-first.
    pub(crate) fn recollect(&mut self, node: NodeId) -> EngineResult<()> {
        if let Some(component) = self.identity.component(node) {
            return self.unmount_component(&component, true);
        }

        if let Some(entry) = self.identity.remove(node) {
            if let Some(node_ref) = entry.vnode.as_ref().and_then(VNode::node_ref) {
                node_ref.call(RefTarget::Detached);
            }
        }

        if let Some(parent) = self.adapter.parent(node) {
            self.adapter.remove_child(parent, node)?;
        }

        self.discard_children(node)
    }

    pub(crate) fn discard_children(&mut self, node: NodeId) -> EngineResult<()> {
        while let Some(child) = self.adapter.last_child(node) {
            self.recollect(child)?;
            if self.adapter.parent(child) == Some(node) {
                self.adapter.remove_child(node, child)?;
            }
        }
        Ok(())
    }

    /// Owner lookup used by component reconciliation
    pub(crate) fn owner(&self, node: Option<NodeId>) -> Option<ComponentRef> {
        node.and_then(|n| self.identity.component(n))
    }
}
