//! Item-level operations over the block sequence: enumerating the blocks of
//! a logical item, expanding a selection to whole items, splitting and
//! merging items, and shifting indents.

use uuid::Uuid;

use crate::model::{
    AttrValue, Block, LIST_ATTRIBUTE_PREFIX, LIST_INDENT, LIST_ITEM_ID, ListWalker, Transaction,
    WalkDirection, WalkerOptions,
};

fn item_opts(direction: WalkDirection, include_self: bool) -> WalkerOptions {
    WalkerOptions {
        direction,
        include_self,
        same_indent: true,
        same_item_id: true,
        ..Default::default()
    }
}

/// Whether the block heads its item (no earlier block shares its item id).
pub fn is_first_block_of_item(blocks: &[Block], index: usize) -> bool {
    ListWalker::first(blocks, index, item_opts(WalkDirection::Backward, false)).is_none()
}

/// Blocks of the item owning `index`, from `index` forward, `index` included.
pub fn item_blocks_forward(blocks: &[Block], index: usize) -> Vec<usize> {
    ListWalker::new(blocks, index, item_opts(WalkDirection::Forward, true)).collect()
}

/// Every block of the item owning `index`, in document order.
pub fn item_blocks(blocks: &[Block], index: usize) -> Vec<usize> {
    let mut before: Vec<usize> =
        ListWalker::new(blocks, index, item_opts(WalkDirection::Backward, false)).collect();
    before.reverse();
    before.extend(item_blocks_forward(blocks, index));
    before
}

/// Expands a selected block range so it covers whole items: backward to the
/// first block of the first selected item, forward over the last selected
/// block's continuation blocks and its trailing deeper subtree (indenting an
/// item carries its sub-items).
pub fn expand_to_complete_items(
    blocks: &[Block],
    selection: std::ops::Range<usize>,
) -> std::ops::Range<usize> {
    assert!(!selection.is_empty(), "cannot expand an empty selection");

    let start = ListWalker::new(
        blocks,
        selection.start,
        item_opts(WalkDirection::Backward, false),
    )
    .last()
    .unwrap_or(selection.start);

    let mut end = selection.end - 1;
    let reference = &blocks[end];
    let ref_indent = reference
        .list_indent()
        .expect("list block without listIndent attribute");
    let ref_item = reference.list_item_id();
    for (j, block) in blocks.iter().enumerate().skip(end + 1) {
        if !block.is_list_block() {
            break;
        }
        let indent = block
            .list_indent()
            .expect("list block without listIndent attribute");
        if indent > ref_indent || (indent == ref_indent && block.list_item_id() == ref_item) {
            end = j;
        } else {
            break;
        }
    }

    start..end + 1
}

/// Gives the block at `index` and all following blocks of the same item a
/// fresh item id, turning the run into its own item at the same indent.
/// Returns the affected indices.
pub fn split_item_before(txn: &mut Transaction<'_>, index: usize) -> Vec<usize> {
    let affected = item_blocks_forward(txn.blocks(), index);
    let fresh = Uuid::new_v4();
    for &i in &affected {
        txn.set_attr(i, LIST_ITEM_ID, AttrValue::Uid(fresh));
    }
    affected
}

/// Merges the block at `index` into the item of `parent_index`: the block
/// adopts every list attribute of the parent except the indent (the indent is
/// shifted uniformly afterwards by the caller).
pub fn merge_block_into_item(txn: &mut Transaction<'_>, index: usize, parent_index: usize) {
    let adopted: Vec<(String, AttrValue)> = txn.blocks()[parent_index]
        .attrs()
        .filter(|(k, _)| k.starts_with(LIST_ATTRIBUTE_PREFIX) && *k != LIST_INDENT)
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    for (key, value) in adopted {
        txn.set_attr(index, key, value);
    }
}

/// Whether the item of `parent_index` has another block at the parent's
/// indent after position `after` (i.e. the run ending at `after` sits in the
/// middle of the parent item).
pub fn item_continues_after(blocks: &[Block], after: usize, parent_index: usize) -> bool {
    let parent = &blocks[parent_index];
    let parent_indent = parent
        .list_indent()
        .expect("list block without listIndent attribute");
    let parent_item = parent.list_item_id();
    for block in &blocks[after..] {
        if !block.is_list_block() {
            return false;
        }
        let indent = block
            .list_indent()
            .expect("list block without listIndent attribute");
        if indent > parent_indent {
            continue;
        }
        return indent == parent_indent && block.list_item_id() == parent_item;
    }
    false
}

/// Uniformly shifts `listIndent` of the given blocks. A shift below zero
/// removes the whole list attribute family: the block leaves the list.
pub fn indent_blocks(txn: &mut Transaction<'_>, indices: &[usize], by: i64) {
    for &i in indices {
        let indent = txn.blocks()[i]
            .list_indent()
            .expect("list block without listIndent attribute") as i64;
        let shifted = indent + by;
        if shifted < 0 {
            txn.clear_list_attrs(i);
        } else {
            txn.set_attr(i, LIST_INDENT, AttrValue::Int(shifted));
        }
    }
}
