//! In-memory mutable tree
//!
//! Arena-backed [`TreeAdapter`] with an append-only operation log. Used by the
//! CLI and by tests that count creates, sets and removals.
//!
//! Removing a node only detaches it, since the engine may still reinsert a
//! detached node during the same pass. [`MemoryTree::sweep`] reclaims every
//! node that is no longer reachable from a container; later allocations reuse
//! the freed slots.

use crate::adapter::{Namespace, NodeId, TreeAdapter, TreeError, TreeResult};
use crate::value::{Event, EventHandler};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One primitive mutation, as recorded in the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum TreeOp {
    CreateElement {
        node: NodeId,
        tag: String,
        namespace: Namespace,
    },
    CreateText {
        node: NodeId,
        text: String,
    },
    SetText {
        node: NodeId,
        text: String,
    },
    AppendChild {
        parent: NodeId,
        child: NodeId,
    },
    InsertBefore {
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    },
    ReplaceChild {
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    },
    RemoveChild {
        parent: NodeId,
        child: NodeId,
    },
    SetAttribute {
        node: NodeId,
        name: String,
        value: String,
        namespace: Namespace,
    },
    RemoveAttribute {
        node: NodeId,
        name: String,
        namespace: Namespace,
    },
    BindEvent {
        node: NodeId,
        event: String,
        capture: bool,
    },
    UnbindEvent {
        node: NodeId,
        event: String,
        capture: bool,
    },
}

impl TreeOp {
    pub fn kind(&self) -> &'static str {
        match self {
            TreeOp::CreateElement { .. } => "createElement",
            TreeOp::CreateText { .. } => "createText",
            TreeOp::SetText { .. } => "setText",
            TreeOp::AppendChild { .. } => "appendChild",
            TreeOp::InsertBefore { .. } => "insertBefore",
            TreeOp::ReplaceChild { .. } => "replaceChild",
            TreeOp::RemoveChild { .. } => "removeChild",
            TreeOp::SetAttribute { .. } => "setAttribute",
            TreeOp::RemoveAttribute { .. } => "removeAttribute",
            TreeOp::BindEvent { .. } => "bindEvent",
            TreeOp::UnbindEvent { .. } => "unbindEvent",
        }
    }
}

#[derive(Debug, Clone)]
struct Listener {
    event: String,
    capture: bool,
    handler: EventHandler,
}

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        tag: String,
        namespace: Namespace,
        attributes: BTreeMap<String, String>,
        listeners: Vec<Listener>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct MemoryNode {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Attribute storage key; xlink attributes keep their prefix
fn attribute_key(name: &str, namespace: Namespace) -> String {
    match namespace {
        Namespace::XLink => format!("xlink:{}", name),
        _ => name.to_string(),
    }
}

#[derive(Debug, Default)]
pub struct MemoryTree {
    nodes: Vec<Option<MemoryNode>>,
    free: Vec<NodeId>,
    containers: Vec<NodeId>,
    ops: Vec<TreeOp>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detached element to mount into, created without logging
    pub fn create_container(&mut self, tag: &str) -> NodeId {
        let container = self.alloc(NodeData::Element {
            tag: tag.to_string(),
            namespace: Namespace::Html,
            attributes: BTreeMap::new(),
            listeners: Vec::new(),
        });
        self.containers.push(container);
        container
    }

    /// Free every node not reachable from a container and return how many
    /// were freed.
    ///
    /// Only call this between passes: handles to swept nodes become unknown,
    /// and their ids are handed out again by later creates.
    pub fn sweep(&mut self) -> usize {
        let mut reachable = vec![false; self.nodes.len()];
        let mut stack = self.containers.clone();
        while let Some(id) = stack.pop() {
            let Some(node) = self.slot(id) else {
                continue;
            };
            reachable[id.raw() as usize] = true;
            stack.extend(node.children.iter().copied());
        }

        let mut freed = 0;
        for (index, slot) in self.nodes.iter_mut().enumerate() {
            if slot.is_some() && !reachable[index] {
                *slot = None;
                self.free.push(NodeId::new(index as u32));
                freed += 1;
            }
        }
        freed
    }

    pub fn ops(&self) -> &[TreeOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<TreeOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Number of logged operations of `kind` (see [`TreeOp::kind`])
    pub fn count(&self, kind: &str) -> usize {
        self.ops.iter().filter(|op| op.kind() == kind).count()
    }

    /// Logged operation count per kind
    pub fn summary(&self) -> BTreeMap<&'static str, usize> {
        let mut summary = BTreeMap::new();
        for op in &self.ops {
            *summary.entry(op.kind()).or_insert(0) += 1;
        }
        summary
    }

    /// Live nodes, containers included
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.slot(node)?.data {
            NodeData::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            NodeData::Text(_) => None,
        }
    }

    pub fn attributes(&self, node: NodeId) -> BTreeMap<String, String> {
        match self.slot(node).map(|n| &n.data) {
            Some(NodeData::Element { attributes, .. }) => attributes.clone(),
            _ => BTreeMap::new(),
        }
    }

    /// `(event, capture)` pairs bound on `node`
    pub fn listeners(&self, node: NodeId) -> Vec<(String, bool)> {
        match self.slot(node).map(|n| &n.data) {
            Some(NodeData::Element { listeners, .. }) => listeners
                .iter()
                .map(|l| (l.event.clone(), l.capture))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Invoke every listener for `event` bound directly on `node`.
    /// Returns how many ran.
    pub fn fire(&self, node: NodeId, event: &str) -> usize {
        let handlers: Vec<EventHandler> = match self.slot(node).map(|n| &n.data) {
            Some(NodeData::Element { listeners, .. }) => listeners
                .iter()
                .filter(|l| l.event == event)
                .map(|l| l.handler.clone())
                .collect(),
            _ => Vec::new(),
        };

        let payload = Event {
            kind: event.to_string(),
            target: node,
        };
        for handler in &handlers {
            handler.call(&payload);
        }
        handlers.len()
    }

    /// Concatenated text of `node` and its descendants
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.slot(node) else {
            return;
        };
        match &n.data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element { .. } => {
                for child in &n.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Markup for `node` and its subtree
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    /// Markup for the children of `node`
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            self.write_html(child, &mut out);
        }
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.slot(node) else {
            return;
        };

        match &n.data {
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Element {
                tag, attributes, ..
            } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(value));
                    out.push('"');
                }

                if VOID_ELEMENTS.contains(&tag.as_str()) && n.children.is_empty() {
                    out.push_str(" />");
                    return;
                }

                out.push('>');
                for child in &n.children {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let node = MemoryNode {
            data,
            parent: None,
            children: Vec::new(),
        };
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.raw() as usize] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                NodeId::new(self.nodes.len() as u32 - 1)
            }
        }
    }

    fn slot(&self, id: NodeId) -> Option<&MemoryNode> {
        self.nodes.get(id.raw() as usize)?.as_ref()
    }

    fn node(&self, id: NodeId) -> TreeResult<&MemoryNode> {
        self.slot(id).ok_or(TreeError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> TreeResult<&mut MemoryNode> {
        self.nodes
            .get_mut(id.raw() as usize)
            .and_then(Option::as_mut)
            .ok_or(TreeError::UnknownNode(id))
    }

    fn element_mut(
        &mut self,
        id: NodeId,
    ) -> TreeResult<(&mut BTreeMap<String, String>, &mut Vec<Listener>)> {
        match &mut self.node_mut(id)?.data {
            NodeData::Element {
                attributes,
                listeners,
                ..
            } => Ok((attributes, listeners)),
            NodeData::Text(_) => Err(TreeError::NotAnElement(id)),
        }
    }

    fn is_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.slot(node).and_then(|n| n.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    /// Validate that `child` may go under `parent`, then unlink it from its current parent
    fn prepare_insert(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        if !matches!(self.node(parent)?.data, NodeData::Element { .. }) {
            return Err(TreeError::NotAnElement(parent));
        }
        self.node(child)?;
        if self.is_ancestor(child, parent) {
            return Err(TreeError::HierarchyRequest { parent, child });
        }
        self.unlink(child);
        Ok(())
    }

    fn unlink(&mut self, child: NodeId) {
        let Some(parent) = self.node_mut(child).ok().and_then(|n| n.parent.take()) else {
            return;
        };
        if let Ok(parent) = self.node_mut(parent) {
            parent.children.retain(|c| *c != child);
        }
    }

    fn index_of(&self, parent: NodeId, child: NodeId) -> TreeResult<usize> {
        self.node(parent)?
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or(TreeError::NotAChild { parent, child })
    }
}

impl TreeAdapter for MemoryTree {
    fn create_element(&mut self, tag: &str, namespace: Namespace) -> TreeResult<NodeId> {
        let node = self.alloc(NodeData::Element {
            tag: tag.to_string(),
            namespace,
            attributes: BTreeMap::new(),
            listeners: Vec::new(),
        });
        self.ops.push(TreeOp::CreateElement {
            node,
            tag: tag.to_string(),
            namespace,
        });
        Ok(node)
    }

    fn create_text(&mut self, text: &str) -> TreeResult<NodeId> {
        let node = self.alloc(NodeData::Text(text.to_string()));
        self.ops.push(TreeOp::CreateText {
            node,
            text: text.to_string(),
        });
        Ok(node)
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> TreeResult<()> {
        match &mut self.node_mut(node)?.data {
            NodeData::Text(current) => *current = text.to_string(),
            NodeData::Element { .. } => return Err(TreeError::NotAnElement(node)),
        }
        self.ops.push(TreeOp::SetText {
            node,
            text: text.to_string(),
        });
        Ok(())
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        match &self.slot(node)?.data {
            NodeData::Text(text) => Some(text),
            NodeData::Element { .. } => None,
        }
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        match &self.slot(node)?.data {
            NodeData::Element { tag, .. } => Some(tag),
            NodeData::Text(_) => None,
        }
    }

    fn namespace(&self, node: NodeId) -> Namespace {
        match self.slot(node).map(|n| &n.data) {
            Some(NodeData::Element { namespace, .. }) => *namespace,
            _ => Namespace::Html,
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.slot(node)?.parent
    }

    fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.slot(parent)?.children.get(index).copied()
    }

    fn child_count(&self, parent: NodeId) -> usize {
        self.slot(parent).map_or(0, |n| n.children.len())
    }

    fn last_child(&self, parent: NodeId) -> Option<NodeId> {
        self.slot(parent)?.children.last().copied()
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        self.prepare_insert(parent, child)?;
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        self.ops.push(TreeOp::AppendChild { parent, child });
        Ok(())
    }

    fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> TreeResult<()> {
        if child == reference {
            return Ok(());
        }
        self.index_of(parent, reference)?;
        self.prepare_insert(parent, child)?;

        let index = self.index_of(parent, reference)?;
        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        self.ops.push(TreeOp::InsertBefore {
            parent,
            child,
            reference,
        });
        Ok(())
    }

    fn replace_child(&mut self, parent: NodeId, new_child: NodeId, old_child: NodeId) -> TreeResult<()> {
        if new_child == old_child {
            return Ok(());
        }
        self.index_of(parent, old_child)?;
        self.prepare_insert(parent, new_child)?;

        let index = self.index_of(parent, old_child)?;
        self.node_mut(parent)?.children[index] = new_child;
        self.node_mut(new_child)?.parent = Some(parent);
        self.node_mut(old_child)?.parent = None;
        self.ops.push(TreeOp::ReplaceChild {
            parent,
            new_child,
            old_child,
        });
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        let index = self.index_of(parent, child)?;
        self.node_mut(parent)?.children.remove(index);
        self.node_mut(child)?.parent = None;
        self.ops.push(TreeOp::RemoveChild { parent, child });
        Ok(())
    }

    fn set_attribute(
        &mut self,
        node: NodeId,
        name: &str,
        value: &str,
        namespace: Namespace,
    ) -> TreeResult<()> {
        let (attributes, _) = self.element_mut(node)?;
        attributes.insert(attribute_key(name, namespace), value.to_string());
        self.ops.push(TreeOp::SetAttribute {
            node,
            name: name.to_string(),
            value: value.to_string(),
            namespace,
        });
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str, namespace: Namespace) -> TreeResult<()> {
        let (attributes, _) = self.element_mut(node)?;
        attributes.remove(&attribute_key(name, namespace));
        self.ops.push(TreeOp::RemoveAttribute {
            node,
            name: name.to_string(),
            namespace,
        });
        Ok(())
    }

    fn bind_event(
        &mut self,
        node: NodeId,
        event: &str,
        handler: &EventHandler,
        capture: bool,
    ) -> TreeResult<()> {
        let (_, listeners) = self.element_mut(node)?;
        listeners.push(Listener {
            event: event.to_string(),
            capture,
            handler: handler.clone(),
        });
        self.ops.push(TreeOp::BindEvent {
            node,
            event: event.to_string(),
            capture,
        });
        Ok(())
    }

    fn unbind_event(
        &mut self,
        node: NodeId,
        event: &str,
        handler: &EventHandler,
        capture: bool,
    ) -> TreeResult<()> {
        let (_, listeners) = self.element_mut(node)?;
        listeners.retain(|l| !(l.event == event && l.capture == capture && &l.handler == handler));
        self.ops.push(TreeOp::UnbindEvent {
            node,
            event: event.to_string(),
            capture,
        });
        Ok(())
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
