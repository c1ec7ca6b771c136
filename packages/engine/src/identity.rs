//! Node-identity store
//!
//! Side table keyed by live handle. It remembers the virtual node last
//! reconciled into each handle and, for component roots, the owning
//! instance and its class. The reconciler reads the previous node from here
//! instead of walking the live tree.

use crate::adapter::NodeId;
use crate::component::{ComponentClass, ComponentRef};
use crate::vdom::VNode;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct IdentityEntry {
    /// Last virtual node reconciled into the handle
    pub vnode: Option<VNode>,
    /// Owning instance, when the handle is a component root
    pub component: Option<ComponentRef>,
    /// Class of `component`, compared without touching the instance
    pub constructor: Option<ComponentClass>,
}

impl IdentityEntry {
    fn is_empty(&self) -> bool {
        self.vnode.is_none() && self.component.is_none()
    }
}

#[derive(Debug, Default)]
pub struct IdentityStore {
    entries: HashMap<NodeId, IdentityEntry>,
}

impl IdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: NodeId) -> Option<&IdentityEntry> {
        self.entries.get(&node)
    }

    pub fn vnode(&self, node: NodeId) -> Option<VNode> {
        self.entries.get(&node).and_then(|e| e.vnode.clone())
    }

    pub fn component(&self, node: NodeId) -> Option<ComponentRef> {
        self.entries.get(&node).and_then(|e| e.component.clone())
    }

    pub fn constructor(&self, node: NodeId) -> Option<ComponentClass> {
        self.entries.get(&node).and_then(|e| e.constructor)
    }

    pub fn record_vnode(&mut self, node: NodeId, vnode: VNode) {
        self.entries.entry(node).or_default().vnode = Some(vnode);
    }

    pub fn set_owner(&mut self, node: NodeId, component: &ComponentRef) {
        let entry = self.entries.entry(node).or_default();
        entry.constructor = Some(component.class());
        entry.component = Some(component.clone());
    }

    pub fn clear_owner(&mut self, node: NodeId) {
        if let Some(entry) = self.entries.get_mut(&node) {
            entry.component = None;
            entry.constructor = None;
            if entry.is_empty() {
                self.entries.remove(&node);
            }
        }
    }

    pub fn remove(&mut self, node: NodeId) -> Option<IdentityEntry> {
        self.entries.remove(&node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.entries.contains_key(&node)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
