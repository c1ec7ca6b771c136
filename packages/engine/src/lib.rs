pub mod accessor;
pub mod adapter;
pub mod component;
pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
mod lifecycle;
pub mod memory_tree;
mod reconciler;
pub mod scheduler;
pub mod value;
pub mod vdom;

pub use adapter::{Namespace, NodeId, TreeAdapter, TreeError, TreeResult};
pub use component::{Component, ComponentClass, ComponentRef, FunctionalComponent, StateUpdate};
pub use config::{ConfigError, EngineConfig, DEFAULT_CONFIG_NAME};
pub use engine::{Engine, RenderMode};
pub use error::{EngineError, EngineResult};
pub use identity::{IdentityEntry, IdentityStore};
pub use memory_tree::{MemoryTree, TreeOp};
pub use scheduler::{FlushScheduler, FnScheduler, ManualScheduler, RenderQueue};
pub use value::{Context, Event, EventHandler, NodeRef, PropMap, RefTarget, Value};
pub use vdom::{clone_element, h, ChildArg, ComponentKind, ComponentNode, ElementNode, Tag, VNode};

#[cfg(feature = "async")]
pub use scheduler::NotifyScheduler;
