//! Upcast: external container tree → model blocks with list attributes.
//!
//! Conversion recurses depth-first through list containers. Every item
//! container yields the blocks of its own content plus, further down the
//! sequence, the blocks of its nested lists; attributes are assigned only to
//! blocks that do not already carry `listItemId` (deeper blocks were handled
//! by the recursive pass). Malformed input is sanitized by the cleanup pass
//! before items are read.

use std::collections::HashSet;

use uuid::Uuid;

use crate::model::{
    AttrValue, Block, BlockKind, LIST_ID, LIST_INDENT, LIST_ITEM_ID, LIST_TYPE, ListType,
};
use crate::view::{ViewId, ViewKind, ViewTree};

/// Conversion event kinds gating one-shot work per node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpcastEvent {
    CleanList,
    ConvertItem,
}

/// Tracks which `(node, event)` pairs were already handled, so cleanup and
/// item conversion never reprocess a node.
#[derive(Debug, Default)]
pub struct ConsumptionTracker {
    consumed: HashSet<(ViewId, UpcastEvent)>,
}

impl ConsumptionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the pair consumed; returns false when it already was.
    pub fn consume(&mut self, node: ViewId, event: UpcastEvent) -> bool {
        self.consumed.insert((node, event))
    }

    pub fn is_consumed(&self, node: ViewId, event: UpcastEvent) -> bool {
        self.consumed.contains(&(node, event))
    }
}

/// Removes children of a list container that are neither item containers nor
/// nested list containers (stray text and junk elements from malformed
/// input). Idempotent through the consumption tracker.
pub fn clean_list(view: &mut ViewTree, list: ViewId, tracker: &mut ConsumptionTracker) {
    assert!(
        view.kind(list).is_list_container(),
        "clean_list called on a non-list node"
    );
    if !tracker.consume(list, UpcastEvent::CleanList) {
        return;
    }
    let junk: Vec<ViewId> = view
        .children(list)
        .iter()
        .copied()
        .filter(|&child| {
            let kind = view.kind(child);
            !kind.is_item_container() && !kind.is_list_container()
        })
        .collect();
    for child in junk {
        view.remove(child);
    }
}

/// Converts every top-level node of the input tree: list containers through
/// the list conversion, everything else as plain blocks.
pub fn convert_fragment(view: &mut ViewTree, tracker: &mut ConsumptionTracker) -> Vec<Block> {
    let mut out = Vec::new();
    for child in view.children(view.root()).to_vec() {
        match view.kind(child).clone() {
            ViewKind::List { kind, .. } => {
                convert_list_children(view, child, kind, 0, &mut out, tracker);
            }
            ViewKind::Block { name } => {
                out.push(Block::new(kind_for_name(&name), view.text_content(child)));
            }
            ViewKind::Text { content } => {
                out.push(Block::paragraph(content));
            }
            _ => {}
        }
    }
    out
}

/// Converts one list container (and everything nested below it) to blocks.
pub fn convert_list(
    view: &mut ViewTree,
    list: ViewId,
    tracker: &mut ConsumptionTracker,
) -> Vec<Block> {
    let kind = match view.kind(list) {
        ViewKind::List { kind, .. } => *kind,
        other => panic!("convert_list called on a non-list node: {other:?}"),
    };
    let mut out = Vec::new();
    convert_list_children(view, list, kind, 0, &mut out, tracker);
    out
}

fn convert_list_children(
    view: &mut ViewTree,
    list: ViewId,
    kind: ListType,
    indent: u32,
    out: &mut Vec<Block>,
    tracker: &mut ConsumptionTracker,
) {
    clean_list(view, list, tracker);
    for child in view.children(list).to_vec() {
        match view.kind(child).clone() {
            ViewKind::Item { .. } => convert_item(view, child, kind, indent, out, tracker),
            // A list nested directly inside a list still nests one level
            // deeper, as if it had its own item.
            ViewKind::List { kind: nested, .. } => {
                convert_list_children(view, child, nested, indent + 1, out, tracker);
            }
            _ => {}
        }
    }
}

fn convert_item(
    view: &mut ViewTree,
    item: ViewId,
    list_type: ListType,
    indent: u32,
    out: &mut Vec<Block>,
    tracker: &mut ConsumptionTracker,
) {
    if !tracker.consume(item, UpcastEvent::ConvertItem) {
        return;
    }

    let start = out.len();
    let mut inline = String::new();

    for child in view.children(item).to_vec() {
        match view.kind(child).clone() {
            ViewKind::List { kind, .. } => {
                flush_inline(&mut inline, out);
                convert_list_children(view, child, kind, indent + 1, out, tracker);
            }
            ViewKind::Block { name } => {
                flush_inline(&mut inline, out);
                out.push(Block::new(kind_for_name(&name), view.text_content(child)));
            }
            ViewKind::Text { content } => inline.push_str(&content),
            ViewKind::Bogus => inline.push_str(&view.text_content(child)),
            _ => {}
        }
    }
    flush_inline(&mut inline, out);

    // An item with no content of its own still occupies a model position; an
    // item whose only content is a nested list keeps an explicit empty
    // placeholder block, so the item itself survives a round trip.
    let own_count = out[start..].iter().filter(|b| !b.is_list_block()).count();
    if own_count == 0 {
        out.insert(start, Block::paragraph(""));
    }

    let item_id = Uuid::new_v4();
    for i in start..out.len() {
        if out[i].has_attr(LIST_ITEM_ID) {
            continue;
        }
        let list_id = inherited_list_id(out, i, indent, list_type);
        let block = &mut out[i];
        block.set_attr(LIST_ITEM_ID.into(), AttrValue::Uid(item_id));
        block.set_attr(LIST_INDENT.into(), AttrValue::Int(indent as i64));
        block.set_attr(LIST_TYPE.into(), AttrValue::Type(list_type));
        block.set_attr(LIST_ID.into(), AttrValue::Uid(list_id));
    }
}

/// The id of the whole list is inherited from the previous sibling block at
/// the same indent when that sibling exists and has the same type; otherwise
/// the list starts fresh.
fn inherited_list_id(out: &[Block], index: usize, indent: u32, list_type: ListType) -> Uuid {
    for block in out[..index].iter().rev() {
        let Some(block_indent) = block.list_indent() else {
            break;
        };
        if block_indent > indent {
            continue;
        }
        if block_indent < indent {
            break;
        }
        if block.list_type() == Some(list_type) {
            return block
                .list_id()
                .expect("list block without listId attribute");
        }
        break;
    }
    Uuid::new_v4()
}

fn flush_inline(inline: &mut String, out: &mut Vec<Block>) {
    if !inline.trim().is_empty() {
        out.push(Block::paragraph(std::mem::take(inline).trim().to_string()));
    } else {
        inline.clear();
    }
}

fn kind_for_name(name: &str) -> BlockKind {
    match name {
        "p" => BlockKind::Paragraph,
        "pre" => BlockKind::CodeBlock,
        _ if name.len() == 2 && name.starts_with('h') => {
            let level = name[1..].parse().unwrap_or(1);
            BlockKind::Heading { level }
        }
        _ => BlockKind::Paragraph,
    }
}
