//! Attribute, prop and state values.

use crate::adapter::NodeId;
use crate::component::ComponentRef;
use crate::vdom::VNode;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Ordered name → value mapping used for attributes, props, state and context.
pub type PropMap = BTreeMap<String, Value>;

/// Context handed down the tree. Two contexts are "the same" only when they
/// point at the same allocation.
pub type Context = Rc<PropMap>;

/// Build a [`PropMap`] from `name => value` pairs.
///
/// ```rust,ignore
/// let attrs = props! { "id" => "main", "tabIndex" => 2 };
/// ```
#[macro_export]
macro_rules! props {
    () => {
        $crate::PropMap::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::PropMap::new();
        $(
            map.insert(::std::string::String::from($name), $crate::Value::from($value));
        )+
        map
    }};
}

/// A single attribute / prop / state value
#[derive(Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    /// Child nodes passed to a component as `props.children`
    Children(Vec<VNode>),
    /// Event listener (`onClick`, `onInputCapture`, ...)
    Handler(EventHandler),
    /// `ref` callback
    Ref(NodeRef),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
            Value::Children(_) | Value::Handler(_) | Value::Ref(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_children(&self) -> Option<&[VNode]> {
        match self {
            Value::Children(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_handler(&self) -> Option<&EventHandler> {
        match self {
            Value::Handler(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_ref_callback(&self) -> Option<&NodeRef> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Scalar text form, as written into a live attribute or used as a list key.
    ///
    /// Returns `None` for values that have no textual form.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(format_number(*n)),
            Value::Boolean(b) => Some(b.to_string()),
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(Value::to_text)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            Value::Null
            | Value::Object(_)
            | Value::Children(_)
            | Value::Handler(_)
            | Value::Ref(_) => None,
        }
    }
}

/// Integral numbers print without a fractional part (`2`, not `2.0`).
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Children(a), Value::Children(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.ptr_eq(y))
            }
            (Value::Handler(a), Value::Handler(b)) => a == b,
            (Value::Ref(a), Value::Ref(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(items) => f.debug_list().entries(items).finish(),
            Value::Object(map) => f.debug_map().entries(map).finish(),
            Value::Children(nodes) => write!(f, "<{} children>", nodes.len()),
            Value::Handler(_) => write!(f, "<handler>"),
            Value::Ref(_) => write!(f, "<ref>"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<Vec<VNode>> for Value {
    fn from(nodes: Vec<VNode>) -> Self {
        Value::Children(nodes)
    }
}

impl From<PropMap> for Value {
    fn from(map: PropMap) -> Self {
        Value::Object(map)
    }
}

impl From<EventHandler> for Value {
    fn from(handler: EventHandler) -> Self {
        Value::Handler(handler)
    }
}

impl From<NodeRef> for Value {
    fn from(r: NodeRef) -> Self {
        Value::Ref(r)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Event delivered to a bound listener
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Lowercased event name (`click`, `input`, ...)
    pub kind: String,
    pub target: NodeId,
}

/// Event listener. Equality is callback identity.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&Event)>);

impl EventHandler {
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }
}

impl PartialEq for EventHandler {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0))
    }
}

/// What a `ref` callback is attached to
#[derive(Clone)]
pub enum RefTarget {
    /// Live node produced for an element
    Node(NodeId),
    /// Instance produced for a stateful component
    Component(ComponentRef),
    /// The node or instance was detached
    Detached,
}

impl RefTarget {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            RefTarget::Node(id) => Some(*id),
            _ => None,
        }
    }

    pub fn component(&self) -> Option<&ComponentRef> {
        match self {
            RefTarget::Component(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_detached(&self) -> bool {
        matches!(self, RefTarget::Detached)
    }
}

/// `ref` callback. Equality is callback identity.
#[derive(Clone)]
pub struct NodeRef(Rc<dyn Fn(RefTarget)>);

impl NodeRef {
    pub fn new(f: impl Fn(RefTarget) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, target: RefTarget) {
        (self.0)(target)
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeRef({:p})", Rc::as_ptr(&self.0))
    }
}
