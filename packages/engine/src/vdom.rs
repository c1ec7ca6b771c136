use crate::component::{ComponentClass, FunctionalComponent};
use crate::value::{format_number, NodeRef, PropMap, Value};
use std::fmt;
use std::rc::Rc;

/// Virtual tree node.
///
/// The variant is fixed at construction, so the reconciler never has to probe
/// what a node is. Element and component payloads are shared: cloning a node
/// (to keep it as the "previous" render) is a reference-count bump.
#[derive(Clone)]
pub enum VNode {
    /// Text run
    Text(String),
    /// Primitive element (`div`, `svg`, ...)
    Element(Rc<ElementNode>),
    /// User component, resolved by the lifecycle machine
    Component(Rc<ComponentNode>),
}

#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: String,
    pub attributes: PropMap,
    pub children: Vec<VNode>,
    /// Sibling identity for keyed list reconciliation (from the `key` attribute)
    pub key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ComponentNode {
    pub kind: ComponentKind,
    pub attributes: PropMap,
    pub children: Vec<VNode>,
    pub key: Option<String>,
}

/// Functional vs. stateful component discriminant
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentKind {
    /// Pure `props -> tree` function, expanded in place during reconciliation
    Functional(FunctionalComponent),
    /// Class with lifecycle hooks and an instance per live position
    Stateful(ComponentClass),
}

impl ComponentKind {
    pub fn name(&self) -> &str {
        match self {
            ComponentKind::Functional(f) => f.name(),
            ComponentKind::Stateful(c) => c.name(),
        }
    }
}

impl From<FunctionalComponent> for ComponentKind {
    fn from(f: FunctionalComponent) -> Self {
        ComponentKind::Functional(f)
    }
}

impl From<ComponentClass> for ComponentKind {
    fn from(c: ComponentClass) -> Self {
        ComponentKind::Stateful(c)
    }
}

/// First argument of [`h`]: an element name or a component
#[derive(Debug, Clone)]
pub enum Tag {
    Element(String),
    Component(ComponentKind),
}

impl From<&str> for Tag {
    fn from(name: &str) -> Self {
        Tag::Element(name.to_string())
    }
}

impl From<String> for Tag {
    fn from(name: String) -> Self {
        Tag::Element(name)
    }
}

impl From<ComponentKind> for Tag {
    fn from(kind: ComponentKind) -> Self {
        Tag::Component(kind)
    }
}

impl From<ComponentClass> for Tag {
    fn from(class: ComponentClass) -> Self {
        Tag::Component(ComponentKind::Stateful(class))
    }
}

impl From<FunctionalComponent> for Tag {
    fn from(f: FunctionalComponent) -> Self {
        Tag::Component(ComponentKind::Functional(f))
    }
}

/// Loosely-typed child argument, normalized by [`h`]
#[derive(Debug, Clone)]
pub enum ChildArg {
    Node(VNode),
    Text(String),
    Number(f64),
    Bool(bool),
    None,
    List(Vec<ChildArg>),
}

impl ChildArg {
    fn is_absent(&self) -> bool {
        match self {
            ChildArg::None => true,
            ChildArg::List(items) => items.is_empty(),
            _ => false,
        }
    }

    fn from_value(value: Value) -> Self {
        match value {
            Value::Children(nodes) => ChildArg::List(nodes.into_iter().map(ChildArg::Node).collect()),
            Value::String(s) => ChildArg::Text(s),
            Value::Number(n) => ChildArg::Number(n),
            Value::Boolean(b) => ChildArg::Bool(b),
            Value::Array(items) => ChildArg::List(items.into_iter().map(ChildArg::from_value).collect()),
            _ => ChildArg::None,
        }
    }

    fn flatten_into(self, out: &mut Vec<VNode>) {
        match self {
            ChildArg::Node(VNode::Text(text)) | ChildArg::Text(text) => push_text(out, text),
            ChildArg::Node(node) => out.push(node),
            ChildArg::Number(n) => push_text(out, format_number(n)),
            ChildArg::Bool(_) | ChildArg::None => {}
            ChildArg::List(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
        }
    }
}

fn push_text(out: &mut Vec<VNode>, text: String) {
    if let Some(VNode::Text(last)) = out.last_mut() {
        last.push_str(&text);
    } else {
        out.push(VNode::Text(text));
    }
}

impl From<VNode> for ChildArg {
    fn from(node: VNode) -> Self {
        ChildArg::Node(node)
    }
}

impl From<&str> for ChildArg {
    fn from(s: &str) -> Self {
        ChildArg::Text(s.to_string())
    }
}

impl From<String> for ChildArg {
    fn from(s: String) -> Self {
        ChildArg::Text(s)
    }
}

impl From<f64> for ChildArg {
    fn from(n: f64) -> Self {
        ChildArg::Number(n)
    }
}

impl From<i32> for ChildArg {
    fn from(n: i32) -> Self {
        ChildArg::Number(n as f64)
    }
}

impl From<i64> for ChildArg {
    fn from(n: i64) -> Self {
        ChildArg::Number(n as f64)
    }
}

impl From<usize> for ChildArg {
    fn from(n: usize) -> Self {
        ChildArg::Number(n as f64)
    }
}

impl From<bool> for ChildArg {
    fn from(b: bool) -> Self {
        ChildArg::Bool(b)
    }
}

impl From<()> for ChildArg {
    fn from(_: ()) -> Self {
        ChildArg::None
    }
}

impl<T: Into<ChildArg>> From<Option<T>> for ChildArg {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(ChildArg::None)
    }
}

impl<T: Into<ChildArg>> From<Vec<T>> for ChildArg {
    fn from(items: Vec<T>) -> Self {
        ChildArg::List(items.into_iter().map(Into::into).collect())
    }
}

/// Keys are strings or numbers; an empty string means "no key".
fn key_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(format_number(*n)),
        _ => None,
    }
}

/// Build a virtual node.
///
/// Children are flattened, `None` and booleans dropped, numbers stringified
/// and adjacent text runs merged. A `children` attribute supplies the
/// children when none are passed positionally, and is never kept as an
/// attribute.
pub fn h(tag: impl Into<Tag>, attributes: PropMap, children: impl Into<ChildArg>) -> VNode {
    let mut attributes = attributes;
    let mut children = children.into();

    if let Some(from_attributes) = attributes.remove("children") {
        if children.is_absent() {
            children = ChildArg::from_value(from_attributes);
        }
    }

    let mut flat = Vec::new();
    children.flatten_into(&mut flat);

    let key = attributes.get("key").and_then(key_from_value);

    match tag.into() {
        Tag::Element(tag) => VNode::Element(Rc::new(ElementNode {
            tag,
            attributes,
            children: flat,
            key,
        })),
        Tag::Component(kind) => VNode::Component(Rc::new(ComponentNode {
            kind,
            attributes,
            children: flat,
            key,
        })),
    }
}

/// Copy `vnode` with `props` merged over its attributes.
///
/// `children` replaces the original children when given.
pub fn clone_element(vnode: &VNode, props: PropMap, children: Option<Vec<VNode>>) -> VNode {
    match vnode {
        VNode::Text(_) => vnode.clone(),
        VNode::Element(element) => {
            let mut attributes = element.attributes.clone();
            attributes.extend(props);
            let children = children.unwrap_or_else(|| element.children.clone());
            h(element.tag.clone(), attributes, children)
        }
        VNode::Component(component) => {
            let mut attributes = component.attributes.clone();
            attributes.extend(props);
            let children = children.unwrap_or_else(|| component.children.clone());
            h(Tag::Component(component.kind.clone()), attributes, children)
        }
    }
}

impl VNode {
    pub fn text(content: impl Into<String>) -> Self {
        VNode::Text(content.into())
    }

    pub fn element(tag: impl Into<String>) -> Self {
        h(tag.into(), PropMap::new(), ())
    }

    pub fn component(kind: impl Into<ComponentKind>) -> Self {
        h(Tag::Component(kind.into()), PropMap::new(), ())
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            VNode::Text(_) => None,
            VNode::Element(e) => e.key.as_deref(),
            VNode::Component(c) => c.key.as_deref(),
        }
    }

    pub fn attributes(&self) -> Option<&PropMap> {
        match self {
            VNode::Text(_) => None,
            VNode::Element(e) => Some(&e.attributes),
            VNode::Component(c) => Some(&c.attributes),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attributes().and_then(|attrs| attrs.get(name))
    }

    /// `ref` callback carried by the `ref` attribute
    pub fn node_ref(&self) -> Option<&NodeRef> {
        self.attr("ref").and_then(Value::as_ref_callback)
    }

    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Text(_) => &[],
            VNode::Element(e) => &e.children,
            VNode::Component(c) => &c.children,
        }
    }

    pub fn tag_name(&self) -> Option<&str> {
        match self {
            VNode::Element(e) => Some(&e.tag),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            VNode::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Same text, or the very same element/component payload
    pub fn ptr_eq(&self, other: &VNode) -> bool {
        match (self, other) {
            (VNode::Text(a), VNode::Text(b)) => a == b,
            (VNode::Element(a), VNode::Element(b)) => Rc::ptr_eq(a, b),
            (VNode::Component(a), VNode::Component(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        let key = if name == "key" {
            Some(key_from_value(&value))
        } else {
            None
        };

        match self {
            VNode::Text(_) => {}
            VNode::Element(ref mut e) => {
                let e = Rc::make_mut(e);
                if let Some(key) = key {
                    e.key = key;
                }
                e.attributes.insert(name, value);
            }
            VNode::Component(ref mut c) => {
                let c = Rc::make_mut(c);
                if let Some(key) = key {
                    c.key = key;
                }
                c.attributes.insert(name, value);
            }
        }
        self
    }

    pub fn with_key(self, key: impl Into<String>) -> Self {
        self.with_attr("key", key.into())
    }

    pub fn with_ref(self, node_ref: NodeRef) -> Self {
        self.with_attr("ref", node_ref)
    }

    pub fn with_child(self, child: impl Into<ChildArg>) -> Self {
        self.with_children(vec![child.into()])
    }

    pub fn with_children(mut self, new_children: Vec<impl Into<ChildArg>>) -> Self {
        let children = match &mut self {
            VNode::Text(_) => None,
            VNode::Element(e) => Some(&mut Rc::make_mut(e).children),
            VNode::Component(c) => Some(&mut Rc::make_mut(c).children),
        };
        if let Some(children) = children {
            for child in new_children {
                child.into().flatten_into(children);
            }
        }
        self
    }
}

impl ComponentNode {
    /// Props handed to the component: class defaults, then attributes,
    /// then `children`.
    pub fn node_props(&self) -> PropMap {
        let mut props = match &self.kind {
            ComponentKind::Stateful(class) => class.default_props(),
            ComponentKind::Functional(_) => PropMap::new(),
        };
        props.extend(self.attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
        props.insert("children".to_string(), Value::Children(self.children.clone()));
        props
    }

    pub fn name(&self) -> &str {
        self.kind.name()
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VNode::Text(text) => f.debug_tuple("Text").field(text).finish(),
            VNode::Element(e) => f
                .debug_struct("Element")
                .field("tag", &e.tag)
                .field("key", &e.key)
                .field("attributes", &e.attributes)
                .field("children", &e.children)
                .finish(),
            VNode::Component(c) => f
                .debug_struct("Component")
                .field("name", &c.kind.name())
                .field("key", &c.key)
                .field("attributes", &c.attributes)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props;

    #[test]
    fn test_h_flattens_and_merges_text() {
        let node = h(
            "p",
            props! {},
            vec![
                ChildArg::from("a"),
                ChildArg::from(vec![ChildArg::from("b"), ChildArg::from(3)]),
                ChildArg::from(None::<VNode>),
                ChildArg::from(false),
                ChildArg::from(VNode::element("br")),
                ChildArg::from("c"),
            ],
        );

        let children = node.children();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].as_text(), Some("ab3"));
        assert_eq!(children[1].tag_name(), Some("br"));
        assert_eq!(children[2].as_text(), Some("c"));
    }

    #[test]
    fn test_children_attribute_fallback() {
        let node = h("div", props! { "children" => "fallback" }, ());
        assert_eq!(node.children()[0].as_text(), Some("fallback"));
        assert!(node.attr("children").is_none());

        let node = h("div", props! { "children" => "ignored" }, "positional");
        assert_eq!(node.children().len(), 1);
        assert_eq!(node.children()[0].as_text(), Some("positional"));
        assert!(node.attr("children").is_none());
    }

    #[test]
    fn test_key_from_attribute() {
        assert_eq!(h("li", props! { "key" => 7 }, ()).key(), Some("7"));
        assert_eq!(h("li", props! { "key" => "a" }, ()).key(), Some("a"));
        assert_eq!(h("li", props! { "key" => "" }, ()).key(), None);
        assert_eq!(VNode::element("li").with_key("z").key(), Some("z"));
    }

    #[test]
    fn test_builders() {
        let node = VNode::element("ul")
            .with_attr("id", "list")
            .with_child(VNode::element("li").with_child("one"))
            .with_child("tail")
            .with_child("!");

        assert_eq!(node.attr("id"), Some(&Value::from("list")));
        assert_eq!(node.children().len(), 2);
        assert_eq!(node.children()[1].as_text(), Some("tail!"));
    }

    #[test]
    fn test_clone_element() {
        let original = h("a", props! { "href" => "/", "title" => "home" }, "Home");
        let copy = clone_element(&original, props! { "title" => "start" }, None);

        assert_eq!(copy.attr("href"), Some(&Value::from("/")));
        assert_eq!(copy.attr("title"), Some(&Value::from("start")));
        assert_eq!(copy.children()[0].as_text(), Some("Home"));
        assert_eq!(original.attr("title"), Some(&Value::from("home")));

        let replaced = clone_element(&original, props! {}, Some(vec![VNode::text("Back")]));
        assert_eq!(replaced.children()[0].as_text(), Some("Back"));
    }

    #[test]
    fn test_ptr_eq() {
        let a = VNode::element("div");
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&VNode::element("div")));
        assert!(VNode::text("x").ptr_eq(&VNode::text("x")));
    }
}
