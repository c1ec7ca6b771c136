//! Keyed and positional child-list reconciliation

use arbor_engine::{h, props, Engine, MemoryTree, NodeId, TreeAdapter, VNode};
use std::collections::HashMap;

fn setup() -> (Engine<MemoryTree>, NodeId) {
    let mut tree = MemoryTree::new();
    let container = tree.create_container("root");
    (Engine::new(tree), container)
}

fn keyed_list(keys: &[&str]) -> VNode {
    let items: Vec<VNode> = keys
        .iter()
        .map(|key| h("li", props! { "key" => *key }, *key))
        .collect();
    h("ul", props! {}, items)
}

fn plain_list(labels: &[&str]) -> VNode {
    let items: Vec<VNode> = labels.iter().map(|label| h("li", props! {}, *label)).collect();
    h("ul", props! {}, items)
}

/// key (text content) -> live handle
fn handles_by_text(engine: &Engine<MemoryTree>, list: NodeId) -> HashMap<String, NodeId> {
    let tree = engine.adapter();
    tree.children(list)
        .into_iter()
        .map(|li| (tree.text_content(li), li))
        .collect()
}

#[test]
fn test_keyed_swap_moves_without_discarding() {
    let (mut engine, container) = setup();

    let ul = engine.mount(keyed_list(&["1", "2"]), container).unwrap();
    let before = engine.adapter().children(ul);
    engine.adapter_mut().clear_ops();

    engine.mount(keyed_list(&["2", "1"]), container).unwrap();

    let tree = engine.adapter();
    assert_eq!(tree.children(ul), vec![before[1], before[0]]);
    assert_eq!(tree.count("removeChild"), 0);
    assert_eq!(tree.count("replaceChild"), 0);
    assert_eq!(tree.count("createElement"), 0);
    assert_eq!(tree.count("insertBefore"), 1);

    println!("✓ Keyed swap preserves both handles");
}

#[test]
fn test_keyed_permutation_preserves_identity() {
    let (mut engine, container) = setup();

    let ul = engine
        .mount(keyed_list(&["a", "b", "c", "d", "e"]), container)
        .unwrap();
    let before = handles_by_text(&engine, ul);
    engine.adapter_mut().clear_ops();

    let order = ["c", "a", "e", "b", "d"];
    engine.mount(keyed_list(&order), container).unwrap();

    let tree = engine.adapter();
    let after: Vec<NodeId> = tree.children(ul);
    let expected: Vec<NodeId> = order.iter().map(|k| before[*k]).collect();
    assert_eq!(after, expected);
    assert_eq!(tree.count("createElement"), 0);
    assert_eq!(tree.count("createText"), 0);
    assert_eq!(tree.count("removeChild"), 0);
    assert_eq!(handles_by_text(&engine, ul), before);
}

#[test]
fn test_keyed_insert_and_remove() {
    let (mut engine, container) = setup();

    let ul = engine.mount(keyed_list(&["a", "b", "c"]), container).unwrap();
    let before = handles_by_text(&engine, ul);
    engine.adapter_mut().clear_ops();

    engine.mount(keyed_list(&["a", "x", "c"]), container).unwrap();

    let tree = engine.adapter();
    let children = tree.children(ul);
    assert_eq!(children.len(), 3);
    assert_eq!(children[0], before["a"]);
    assert_eq!(children[2], before["c"]);
    assert_eq!(tree.text_content(children[1]), "x");
    assert_eq!(tree.parent(before["b"]), None);
    assert_eq!(tree.count("createElement"), 1);
    // the discarded item leaves the list, then its text leaves the item
    assert_eq!(tree.count("removeChild"), 2);
}

#[test]
fn test_unkeyed_children_reuse_by_position() {
    let (mut engine, container) = setup();

    let ul = engine.mount(plain_list(&["A", "B", "C"]), container).unwrap();
    let original = engine.adapter().children(ul);
    engine.adapter_mut().clear_ops();

    // "C" is an exact content match for the old third child, yet the first
    // two positions are reused and the third is dropped.
    engine.mount(plain_list(&["C", "Y"]), container).unwrap();

    let tree = engine.adapter();
    assert_eq!(tree.children(ul), vec![original[0], original[1]]);
    assert_eq!(tree.text_content(original[0]), "C");
    assert_eq!(tree.text_content(original[1]), "Y");
    assert_eq!(tree.parent(original[2]), None);
    assert_eq!(tree.count("createElement"), 0);
    assert_eq!(tree.count("removeChild"), 2);
}

#[test]
fn test_growing_unkeyed_list_appends() {
    let (mut engine, container) = setup();

    let ul = engine.mount(plain_list(&["A"]), container).unwrap();
    let first = engine.adapter().children(ul)[0];

    engine.mount(plain_list(&["A", "B", "C"]), container).unwrap();

    let tree = engine.adapter();
    let children = tree.children(ul);
    assert_eq!(children.len(), 3);
    assert_eq!(children[0], first);
    assert_eq!(tree.text_content(ul), "ABC");
}

#[test]
fn test_mixed_keyed_and_unkeyed() {
    let (mut engine, container) = setup();

    let list = |first: &str| {
        h(
            "div",
            props! {},
            vec![
                h("header", props! { "key" => "head" }, "head"),
                h("p", props! {}, first),
                h("p", props! {}, "second"),
            ],
        )
    };

    let div = engine.mount(list("one"), container).unwrap();
    let before = engine.adapter().children(div);

    let reordered = h(
        "div",
        props! {},
        vec![
            h("p", props! {}, "uno"),
            h("p", props! {}, "dos"),
            h("header", props! { "key" => "head" }, "head"),
        ],
    );
    engine.mount(reordered, container).unwrap();

    let tree = engine.adapter();
    assert_eq!(tree.children(div), vec![before[1], before[2], before[0]]);
    assert_eq!(tree.text_content(div), "unodoshead");
}

#[test]
fn test_duplicate_keys_first_match_wins() {
    let (mut engine, container) = setup();

    let ul = engine.mount(keyed_list(&["k", "k"]), container).unwrap();
    let before = engine.adapter().children(ul);
    assert_eq!(before.len(), 2);

    engine.mount(keyed_list(&["k", "k", "z"]), container).unwrap();

    let tree = engine.adapter();
    let after = tree.children(ul);
    assert_eq!(after.len(), 3);
    assert_eq!(&after[..2], &before[..]);
    assert_eq!(tree.text_content(ul), "kkz");
}

#[test]
fn test_keyed_to_empty_discards_everything() {
    let (mut engine, container) = setup();

    let ul = engine.mount(keyed_list(&["a", "b", "c"]), container).unwrap();
    let before = engine.adapter().children(ul);

    engine.mount(h("ul", props! {}, ()), container).unwrap();

    let tree = engine.adapter();
    assert!(tree.children(ul).is_empty());
    for li in before {
        assert_eq!(tree.parent(li), None);
        assert!(engine.vnode_of(li).is_none());
    }
}
