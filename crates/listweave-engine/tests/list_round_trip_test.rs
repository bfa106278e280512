//! Round-trip tests: upcast of a nested external list followed by downcast
//! must reproduce an equivalent container nesting/kind structure at every
//! level, modulo id regeneration.

use listweave_engine::{Engine, ListType, ViewId, ViewKind, ViewTree};
use pretty_assertions::assert_eq;

/// Compact structural signature of the list containers in a view:
/// `ul[li[..],li[..]]`, block containers and text ignored except as markers.
fn list_structure(view: &ViewTree) -> String {
    let mut out = String::new();
    for &child in view.children(view.root()) {
        write_structure(view, child, &mut out);
    }
    out
}

fn write_structure(view: &ViewTree, node: ViewId, out: &mut String) {
    match view.kind(node) {
        ViewKind::List { kind, .. } => {
            out.push_str(match kind {
                ListType::Bulleted => "ul",
                ListType::Numbered => "ol",
            });
            out.push('[');
            for &child in view.children(node) {
                write_structure(view, child, out);
            }
            out.push(']');
        }
        ViewKind::Item { .. } => {
            out.push_str("li[");
            for &child in view.children(node) {
                write_structure(view, child, out);
            }
            out.push(']');
        }
        ViewKind::Block { .. } => out.push('.'),
        ViewKind::Bogus => {
            if !view.text_content(node).is_empty() {
                out.push('.');
            }
        }
        ViewKind::Text { content } => {
            if !content.is_empty() {
                out.push('.');
            }
        }
        ViewKind::Root => {}
    }
}

#[test]
fn test_flat_bulleted_list_round_trips() {
    let mut input = ViewTree::new();
    let ul = input.push_list(input.root(), ListType::Bulleted);
    for text in ["one", "two", "three"] {
        let li = input.push_item(ul);
        input.push_block(li, "p", text);
    }
    let expected = list_structure(&input);

    let mut engine = Engine::new();
    engine.load(input);

    assert_eq!(list_structure(&engine.render_data()), expected);
    assert_eq!(
        engine.to_html(),
        "<ul><li>one</li><li>two</li><li>three</li></ul>"
    );
}

#[test]
fn test_mixed_type_nesting_round_trips() {
    // <ul><li>a<ol><li>b<ul><li>c</li></ul></li></ol></li><li>d</li></ul>
    let mut input = ViewTree::new();
    let ul = input.push_list(input.root(), ListType::Bulleted);
    let li_a = input.push_item(ul);
    input.push_block(li_a, "p", "a");
    let ol = input.push_list(li_a, ListType::Numbered);
    let li_b = input.push_item(ol);
    input.push_block(li_b, "p", "b");
    let inner = input.push_list(li_b, ListType::Bulleted);
    let li_c = input.push_item(inner);
    input.push_block(li_c, "p", "c");
    let li_d = input.push_item(ul);
    input.push_block(li_d, "p", "d");
    let expected = list_structure(&input);

    let mut engine = Engine::new();
    assert_eq!(engine.load(input), 4);

    assert_eq!(list_structure(&engine.render_data()), expected);
    assert_eq!(
        engine.to_html(),
        "<ul><li>a<ol><li>b<ul><li>c</li></ul></li></ol></li><li>d</li></ul>"
    );
}

#[test]
fn test_item_with_only_nested_list_survives_round_trip() {
    // <ul><li><ul><li>inner</li></ul></li></ul>: the outer item has no own
    // content and must not be lost.
    let mut input = ViewTree::new();
    let ul = input.push_list(input.root(), ListType::Bulleted);
    let li = input.push_item(ul);
    let nested = input.push_list(li, ListType::Bulleted);
    let li_inner = input.push_item(nested);
    input.push_block(li_inner, "p", "inner");
    let expected = list_structure(&input);

    let mut engine = Engine::new();
    assert_eq!(engine.load(input), 2, "placeholder block plus inner block");

    assert_eq!(list_structure(&engine.render_data()), expected);
    assert_eq!(
        engine.to_html(),
        "<ul><li><ul><li>inner</li></ul></li></ul>"
    );
}

#[test]
fn test_malformed_input_is_sanitized_not_reported() {
    let mut input = ViewTree::new();
    let ul = input.push_list(input.root(), ListType::Bulleted);
    input.push_text(ul, "\n   ");
    let li = input.push_item(ul);
    input.push_block(li, "p", "kept");
    input.push_text(ul, "junk");

    let mut engine = Engine::new();
    assert_eq!(engine.load(input), 1);
    assert_eq!(engine.to_html(), "<ul><li>kept</li></ul>");
}

#[test]
fn test_multi_block_items_round_trip_with_real_paragraphs() {
    let mut input = ViewTree::new();
    let ul = input.push_list(input.root(), ListType::Bulleted);
    let li = input.push_item(ul);
    input.push_block(li, "p", "first");
    input.push_block(li, "p", "second");

    let mut engine = Engine::new();
    assert_eq!(engine.load(input), 2);
    assert_eq!(
        engine.to_html(),
        "<ul><li><p>first</p><p>second</p></li></ul>"
    );
}

#[test]
fn test_editing_view_matches_data_view_structurally() {
    let mut input = ViewTree::new();
    let ul = input.push_list(input.root(), ListType::Numbered);
    for text in ["x", "y"] {
        let li = input.push_item(ul);
        input.push_block(li, "p", text);
    }

    let mut engine = Engine::new();
    engine.load(input);

    assert_eq!(
        list_structure(engine.view()),
        list_structure(&engine.render_data())
    );
}
