//! Mutable-tree adapter
//!
//! The engine never touches a concrete tree. Every primitive edit goes through
//! [`TreeAdapter`], which a host implements for its own node storage
//! ([`crate::MemoryTree`] is the in-process reference implementation).

use crate::value::EventHandler;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Opaque live-tree handle, minted by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn new(raw: u32) -> Self {
        NodeId(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Element / attribute namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    #[default]
    Html,
    Svg,
    XLink,
}

impl Namespace {
    pub fn uri(self) -> &'static str {
        match self {
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::XLink => "http://www.w3.org/1999/xlink",
        }
    }
}

pub type TreeResult<T> = Result<T, TreeError>;

/// Adapter contract failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Node {0} not found")]
    UnknownNode(NodeId),

    #[error("Node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("Node {child} cannot be inserted under {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },
}

/// Primitive operations on a live, mutable tree.
///
/// Queries return `Option`: a missing parent or child is a normal state.
/// Mutations return [`TreeResult`] and fail only on contract violations
/// (stale handles, non-children, cycles).
pub trait TreeAdapter {
    fn create_element(&mut self, tag: &str, namespace: Namespace) -> TreeResult<NodeId>;

    fn create_text(&mut self, text: &str) -> TreeResult<NodeId>;

    fn set_text(&mut self, node: NodeId, text: &str) -> TreeResult<()>;

    /// Text content, if `node` is a text node
    fn text(&self, node: NodeId) -> Option<&str>;

    /// Tag name, if `node` is an element
    fn tag_name(&self, node: NodeId) -> Option<&str>;

    fn namespace(&self, node: NodeId) -> Namespace;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId>;

    fn child_count(&self, parent: NodeId) -> usize;

    fn last_child(&self, parent: NodeId) -> Option<NodeId>;

    /// Append `child`, detaching it from any current parent first
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()>;

    /// Insert `child` before `reference`, detaching it from any current parent first
    fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> TreeResult<()>;

    fn replace_child(&mut self, parent: NodeId, new_child: NodeId, old_child: NodeId) -> TreeResult<()>;

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()>;

    fn set_attribute(
        &mut self,
        node: NodeId,
        name: &str,
        value: &str,
        namespace: Namespace,
    ) -> TreeResult<()>;

    fn remove_attribute(&mut self, node: NodeId, name: &str, namespace: Namespace) -> TreeResult<()>;

    fn bind_event(
        &mut self,
        node: NodeId,
        event: &str,
        handler: &EventHandler,
        capture: bool,
    ) -> TreeResult<()>;

    fn unbind_event(
        &mut self,
        node: NodeId,
        event: &str,
        handler: &EventHandler,
        capture: bool,
    ) -> TreeResult<()>;

    /// Snapshot of the children of `parent`, in order
    fn children(&self, parent: NodeId) -> Vec<NodeId> {
        (0..self.child_count(parent))
            .filter_map(|i| self.child_at(parent, i))
            .collect()
    }
}
