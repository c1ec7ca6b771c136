//! Element, text and attribute reconciliation against the in-memory tree

use arbor_engine::{
    h, props, Engine, EngineConfig, EngineError, EventHandler, FunctionalComponent, MemoryTree,
    Namespace, NodeId, NodeRef, PropMap, RefTarget, TreeAdapter, VNode,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn setup() -> (Engine<MemoryTree>, NodeId) {
    let mut tree = MemoryTree::new();
    let container = tree.create_container("root");
    (Engine::new(tree), container)
}

#[test]
fn test_second_mount_reuses_nodes() {
    let (mut engine, container) = setup();

    let first = h("div", props! { "id" => "a" }, h("span", props! {}, "x"));
    let div = engine.mount(first, container).unwrap();
    let span = engine.adapter().child_at(div, 0).unwrap();
    let text = engine.adapter().child_at(span, 0).unwrap();
    engine.adapter_mut().clear_ops();

    let second = h("div", props! { "id" => "b" }, h("span", props! {}, "y"));
    let again = engine.mount(second, container).unwrap();

    let tree = engine.adapter();
    assert_eq!(again, div);
    assert_eq!(tree.child_at(div, 0), Some(span));
    assert_eq!(tree.child_at(span, 0), Some(text));
    assert_eq!(tree.get_attribute(div, "id"), Some("b"));
    assert_eq!(tree.text_content(div), "y");
    assert_eq!(tree.count("createElement"), 0);
    assert_eq!(tree.count("createText"), 0);
    assert_eq!(tree.children(container), vec![div]);

    println!("✓ Second mount reuses div and span");
}

#[test]
fn test_tag_change_replaces_node_once() {
    let (mut engine, container) = setup();

    let div = engine.mount(h("div", props! {}, "a"), container).unwrap();
    engine.adapter_mut().clear_ops();

    let p = engine.mount(h("p", props! {}, "a"), container).unwrap();

    let tree = engine.adapter();
    assert_ne!(p, div);
    assert_eq!(tree.children(container), vec![p]);
    assert_eq!(tree.parent(div), None);
    assert_eq!(tree.count("createElement"), 1);
    assert_eq!(tree.count("replaceChild"), 1);
    assert!(engine.vnode_of(div).is_none());
    assert!(engine.vnode_of(p).is_some());
}

#[test]
fn test_tag_match_is_case_insensitive() {
    let (mut engine, container) = setup();

    let div = engine.mount(VNode::element("DIV"), container).unwrap();
    let again = engine.mount(VNode::element("div"), container).unwrap();
    assert_eq!(div, again);
}

#[test]
fn test_text_updates_in_place() {
    let (mut engine, container) = setup();

    let text = engine.mount(VNode::text("hello"), container).unwrap();
    engine.adapter_mut().clear_ops();

    let same = engine.mount(VNode::text("hello"), container).unwrap();
    assert_eq!(same, text);
    assert_eq!(engine.adapter().count("setText"), 0);

    let changed = engine.mount(VNode::text("bye"), container).unwrap();
    assert_eq!(changed, text);
    assert_eq!(engine.adapter().text(text), Some("bye"));
    assert_eq!(engine.adapter().count("setText"), 1);
}

#[test]
fn test_text_replaces_element() {
    let (mut engine, container) = setup();

    let div = engine.mount(h("div", props! {}, "inner"), container).unwrap();
    let text = engine.mount(VNode::text("plain"), container).unwrap();

    assert_ne!(div, text);
    assert_eq!(engine.adapter().children(container), vec![text]);
    assert_eq!(engine.adapter().parent(div), None);
}

#[test]
fn test_null_vnode_renders_empty_text() {
    let (mut engine, container) = setup();

    let node = engine.mount(None::<VNode>, container).unwrap();
    assert_eq!(engine.adapter().text(node), Some(""));
    assert_eq!(engine.adapter().children(container), vec![node]);
}

#[test]
fn test_unchanged_attribute_is_not_rewritten() {
    let (mut engine, container) = setup();

    engine
        .mount(h("div", props! { "id" => "a", "title" => "t" }, ()), container)
        .unwrap();
    engine.adapter_mut().clear_ops();

    engine
        .mount(h("div", props! { "id" => "a", "title" => "t" }, ()), container)
        .unwrap();
    assert!(engine.adapter().ops().is_empty());
}

#[test]
fn test_removed_attribute_is_cleared_once() {
    let (mut engine, container) = setup();

    let div = engine
        .mount(h("div", props! { "id" => "a", "title" => "t" }, ()), container)
        .unwrap();
    engine.adapter_mut().clear_ops();

    engine.mount(h("div", props! { "id" => "a" }, ()), container).unwrap();

    let tree = engine.adapter();
    assert_eq!(tree.count("removeAttribute"), 1);
    assert_eq!(tree.count("setAttribute"), 0);
    assert_eq!(tree.get_attribute(div, "title"), None);
    assert_eq!(tree.get_attribute(div, "id"), Some("a"));
}

#[test]
fn test_null_attribute_value_clears() {
    let (mut engine, container) = setup();

    let div = engine
        .mount(h("div", props! { "title" => "t" }, ()), container)
        .unwrap();
    engine.adapter_mut().clear_ops();

    engine
        .mount(h("div", props! { "title" => None::<&str> }, ()), container)
        .unwrap();
    assert_eq!(engine.adapter().get_attribute(div, "title"), None);
    assert_eq!(engine.adapter().count("removeAttribute"), 1);

    // Still null: nothing to do
    engine.adapter_mut().clear_ops();
    engine
        .mount(h("div", props! { "title" => None::<&str> }, ()), container)
        .unwrap();
    assert!(engine.adapter().ops().is_empty());
}

#[test]
fn test_attribute_forms() {
    let (mut engine, container) = setup();

    let input = engine
        .mount(
            h(
                "input",
                props! {
                    "className" => props! { "active" => true, "hidden" => false },
                    "htmlFor" => "name",
                    "style" => props! { "width" => 10, "backgroundColor" => "red", "opacity" => 0.5 },
                    "disabled" => true,
                    "checked" => false,
                    "tabIndex" => 2,
                    "key" => "k",
                },
                (),
            ),
            container,
        )
        .unwrap();

    let attributes = engine.adapter().attributes(input);
    assert_eq!(attributes.get("class").map(String::as_str), Some("active"));
    assert_eq!(attributes.get("for").map(String::as_str), Some("name"));
    assert_eq!(
        attributes.get("style").map(String::as_str),
        Some("background-color: red; opacity: 0.5; width: 10px;")
    );
    assert_eq!(attributes.get("disabled").map(String::as_str), Some(""));
    assert_eq!(attributes.get("tabIndex").map(String::as_str), Some("2"));
    assert!(!attributes.contains_key("checked"));
    assert!(!attributes.contains_key("key"));
    assert_eq!(engine.adapter().to_html(input), "<input class=\"active\" disabled=\"\" for=\"name\" style=\"background-color: red; opacity: 0.5; width: 10px;\" tabIndex=\"2\" />");
}

#[test]
fn test_custom_alias_from_config() {
    let mut tree = MemoryTree::new();
    let container = tree.create_container("root");
    let mut config = EngineConfig::default();
    config
        .attribute_aliases
        .insert("tabIndex".to_string(), "tabindex".to_string());
    let mut engine = Engine::new(tree).with_config(config);

    let div = engine
        .mount(h("div", props! { "tabIndex" => 1 }, ()), container)
        .unwrap();
    assert_eq!(engine.adapter().get_attribute(div, "tabindex"), Some("1"));
}

#[test]
fn test_event_listeners_rebind_on_change() {
    let (mut engine, container) = setup();
    let hits = Rc::new(RefCell::new(Vec::new()));

    let log = hits.clone();
    let first = EventHandler::new(move |event| log.borrow_mut().push(format!("first:{}", event.kind)));
    let log = hits.clone();
    let second = EventHandler::new(move |event| log.borrow_mut().push(format!("second:{}", event.kind)));

    let button = engine
        .mount(h("button", props! { "onClick" => first.clone() }, "go"), container)
        .unwrap();
    assert_eq!(engine.adapter().listeners(button), vec![("click".to_string(), false)]);
    engine.adapter().fire(button, "click");

    // Same handler: no rebinding
    engine.adapter_mut().clear_ops();
    engine
        .mount(h("button", props! { "onClick" => first }, "go"), container)
        .unwrap();
    assert_eq!(engine.adapter().count("bindEvent"), 0);

    engine
        .mount(h("button", props! { "onClick" => second }, "go"), container)
        .unwrap();
    engine.adapter().fire(button, "click");

    engine.mount(h("button", props! {}, "go"), container).unwrap();
    assert_eq!(engine.adapter().fire(button, "click"), 0);
    assert!(engine.adapter().listeners(button).is_empty());

    assert_eq!(*hits.borrow(), vec!["first:click", "second:click"]);
}

#[test]
fn test_capture_listener() {
    let (mut engine, container) = setup();
    let handler = EventHandler::new(|_| {});

    let div = engine
        .mount(h("div", props! { "onFocusCapture" => handler }, ()), container)
        .unwrap();
    assert_eq!(engine.adapter().listeners(div), vec![("focus".to_string(), true)]);
}

#[test]
fn test_svg_namespace_tracking() {
    let (mut engine, container) = setup();

    let svg = engine
        .mount(
            h(
                "svg",
                props! {},
                vec![
                    h("use", props! { "xlinkHref" => "#icon" }, ()),
                    h("foreignObject", props! {}, h("div", props! {}, "html")),
                ],
            ),
            container,
        )
        .unwrap();

    let tree = engine.adapter();
    let use_node = tree.child_at(svg, 0).unwrap();
    let foreign = tree.child_at(svg, 1).unwrap();
    let div = tree.child_at(foreign, 0).unwrap();

    assert_eq!(tree.namespace(svg), Namespace::Svg);
    assert_eq!(tree.namespace(use_node), Namespace::Svg);
    assert_eq!(tree.get_attribute(use_node, "xlink:href"), Some("#icon"));
    assert_eq!(tree.namespace(div), Namespace::Html);

    // Namespace mode does not leak to siblings outside the svg
    let p = engine
        .mount(h("section", props! {}, vec![h("svg", props! {}, ()), h("p", props! {}, ())]), container)
        .unwrap();
    let para = engine.adapter().child_at(p, 1).unwrap();
    assert_eq!(engine.adapter().namespace(para), Namespace::Html);
}

#[test]
fn test_mount_inside_svg_container() {
    let mut tree = MemoryTree::new();
    let container = tree.create_element("svg", Namespace::Svg).unwrap();
    let mut engine = Engine::new(tree);

    let rect = engine.mount(VNode::element("rect"), container).unwrap();
    assert_eq!(engine.adapter().namespace(rect), Namespace::Svg);
}

#[test]
fn test_element_ref_receives_node_and_detach() {
    let (mut engine, container) = setup();
    let seen: Rc<RefCell<Vec<Option<NodeId>>>> = Rc::new(RefCell::new(Vec::new()));

    let log = seen.clone();
    let node_ref = NodeRef::new(move |target| {
        log.borrow_mut().push(target.node());
    });

    let div = engine
        .mount(VNode::element("div").with_ref(node_ref), container)
        .unwrap();
    engine.mount(VNode::element("p"), container).unwrap();

    assert_eq!(*seen.borrow(), vec![Some(div), None]);
}

#[test]
fn test_nested_ref_detached_when_parent_discarded() {
    let (mut engine, container) = setup();
    let detached = Rc::new(Cell::new(0));

    let counter = detached.clone();
    let node_ref = NodeRef::new(move |target| {
        if matches!(target, RefTarget::Detached) {
            counter.set(counter.get() + 1);
        }
    });

    engine
        .mount(
            h("div", props! {}, h("span", props! { "ref" => node_ref }, "x")),
            container,
        )
        .unwrap();
    engine.mount(VNode::text("gone"), container).unwrap();

    assert_eq!(detached.get(), 1);
}

#[test]
fn test_functional_components_expand() {
    let (mut engine, container) = setup();

    let greeting = FunctionalComponent::new("Greeting", |props: &PropMap, _| {
        Some(h("p", props! {}, vec![VNode::text("Hi "), VNode::text(props["name"].as_str().unwrap_or(""))]))
    });
    let wrapper = {
        let greeting = greeting.clone();
        FunctionalComponent::new("Wrapper", move |props: &PropMap, _| {
            Some(h(greeting.clone(), props.clone(), ()))
        })
    };

    let p = engine
        .mount(h(wrapper, props! { "name" => "Ada" }, ()), container)
        .unwrap();

    assert_eq!(engine.adapter().to_html(p), "<p>Hi Ada</p>");
    assert!(engine.owner_of(p).is_none());
}

#[test]
fn test_functional_component_receives_children() {
    let (mut engine, container) = setup();

    let frame = FunctionalComponent::new("Frame", |props: &PropMap, _| {
        let children = props["children"].as_children().unwrap_or(&[]).to_vec();
        Some(h("section", props! {}, children))
    });

    let section = engine
        .mount(h(frame, props! {}, vec![h("b", props! {}, "1"), h("i", props! {}, "2")]), container)
        .unwrap();
    assert_eq!(engine.adapter().inner_html(section), "<b>1</b><i>2</i>");
}

fn endless(_props: &PropMap, _context: &arbor_engine::Context) -> Option<VNode> {
    Some(h(FunctionalComponent::new("Endless", endless), props! {}, ()))
}

#[test]
fn test_runaway_functional_component_is_an_error() {
    let mut tree = MemoryTree::new();
    let container = tree.create_container("root");
    let config = EngineConfig {
        max_functional_depth: 8,
        ..EngineConfig::default()
    };
    let mut engine = Engine::new(tree).with_config(config);

    let err = engine
        .mount(h(FunctionalComponent::new("Endless", endless), props! {}, ()), container)
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::RecursiveComponent {
            component: "Endless".to_string(),
            depth: 8
        }
    );
}

#[test]
fn test_unmount_detaches_subtree() {
    let (mut engine, container) = setup();

    let div = engine
        .mount(h("div", props! {}, h("span", props! {}, "x")), container)
        .unwrap();
    let span = engine.adapter().child_at(div, 0).unwrap();

    engine.unmount(div).unwrap();

    let tree = engine.adapter();
    assert!(tree.children(container).is_empty());
    assert!(tree.children(div).is_empty());
    assert_eq!(tree.parent(span), None);
    assert!(engine.identity().is_empty());
}

#[test]
fn test_sweep_after_element_swaps_keeps_arena_flat() {
    let (mut engine, container) = setup();

    let list = |tag: &str| {
        let items: Vec<VNode> = ["a", "b", "c"]
            .iter()
            .map(|name| h("li", props! {}, *name))
            .collect();
        h(tag, props! {}, items)
    };

    engine.mount(list("ul"), container).unwrap();
    let live = engine.adapter().node_count();
    assert_eq!(live, 8);

    for round in 0..10 {
        let tag = if round % 2 == 0 { "ol" } else { "ul" };
        let root = engine.mount(list(tag), container).unwrap();
        engine.adapter_mut().sweep();

        let tree = engine.adapter();
        assert_eq!(tree.node_count(), live);
        assert_eq!(tree.children(container), vec![root]);
        assert_eq!(tree.tag_name(root), Some(tag));
        assert_eq!(tree.text_content(root), "abc");
    }
}
