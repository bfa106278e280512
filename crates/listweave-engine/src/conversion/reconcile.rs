//! Reconciliation: consumes one transaction's change log and re-renders
//! exactly the blocks whose rendered form no longer matches the model.
//!
//! The pass first registers the head of every list run touched by a change,
//! then walks each run once with a stack of per-indent frames describing the
//! wrapper chain every block is expected to sit in. A block is refreshed when
//! it was directly changed, when its bogus-paragraph decision flipped, or
//! when its actual wrapper chain disagrees with the expected stack. All heads
//! are processed before the first refresh is issued; each marked block is
//! re-rendered exactly once.

use std::collections::{BTreeSet, HashSet};

use uuid::Uuid;

use crate::conversion::{downcast, should_use_bogus_paragraph};
use crate::model::{
    Block, BlockId, Change, LIST_ATTRIBUTE_PREFIX, LIST_ITEM_ID, ListType, Model, ops,
};
use crate::view::{Mapper, ViewKind, ViewTree};

/// The innermost open item at one indent depth during a run walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StackFrame {
    id: Uuid,
    kind: ListType,
}

/// What one reconciliation pass refreshed, in model order.
#[derive(Debug, Default, Clone)]
pub struct ReconcileReport {
    pub refreshed: Vec<BlockId>,
}

pub(crate) fn reconcile(
    model: &Model,
    view: &mut ViewTree,
    mapper: &mut Mapper,
    changes: &[Change],
) -> ReconcileReport {
    let blocks = model.blocks();
    let mut heads: BTreeSet<usize> = BTreeSet::new();
    let mut changed_items: HashSet<BlockId> = HashSet::new();
    let mut to_refresh: BTreeSet<usize> = BTreeSet::new();

    for change in changes {
        match change {
            Change::Insert { index } => {
                register_head(blocks, *index, &mut heads);
                let block = &blocks[*index];
                if block.is_list_block() {
                    changed_items.insert(block.id());
                } else {
                    register_head(blocks, index + 1, &mut heads);
                }
                // New blocks always render, list or not.
                to_refresh.insert(*index);
            }
            Change::Remove { index, id, attrs } => {
                if attrs.contains_key(LIST_ITEM_ID) {
                    register_head(blocks, *index, &mut heads);
                }
                downcast::drop_block_rendering(view, mapper, *id);
            }
            Change::Attribute {
                index, key, new, ..
            } => {
                let block = &blocks[*index];
                if key.starts_with(LIST_ATTRIBUTE_PREFIX) {
                    register_head(blocks, *index, &mut heads);
                    if new.is_none() {
                        register_head(blocks, index + 1, &mut heads);
                        refresh_paragraph_if_needed(
                            blocks,
                            *index,
                            Some(&[]),
                            view,
                            mapper,
                            &mut to_refresh,
                        );
                        // The block sheds (or already shed) its wrappers.
                        to_refresh.insert(*index);
                    } else {
                        changed_items.insert(block.id());
                        to_refresh.insert(*index);
                    }
                } else if block.is_list_block() {
                    refresh_paragraph_if_needed(blocks, *index, None, view, mapper, &mut to_refresh);
                }
            }
            // Inline edits are patched in place by the engine and are
            // invisible to this pass.
            Change::Content { .. } => {}
        }
    }

    for &head in &heads {
        check_list(
            blocks,
            head,
            view,
            mapper,
            &changed_items,
            &mut to_refresh,
        );
    }

    log::debug!(
        "reconcile: {} change(s), {} head(s), {} refresh(es)",
        changes.len(),
        heads.len(),
        to_refresh.len()
    );

    let refreshed: Vec<BlockId> = to_refresh.iter().map(|&i| blocks[i].id()).collect();
    for &index in &to_refresh {
        downcast::refresh_block(model, index, view, mapper);
    }
    ReconcileReport { refreshed }
}

/// Registers the head of the maximal contiguous list run containing the gap
/// position `index`. A position bordered by no list block registers nothing.
fn register_head(blocks: &[Block], index: usize, heads: &mut BTreeSet<usize>) {
    let before_is_list = index
        .checked_sub(1)
        .and_then(|i| blocks.get(i))
        .is_some_and(Block::is_list_block);

    if before_is_list {
        let mut head = index - 1;
        while head > 0 && blocks[head - 1].is_list_block() {
            head -= 1;
        }
        heads.insert(head);
    } else if blocks.get(index).is_some_and(Block::is_list_block) {
        heads.insert(index);
    }
}

/// Walks the run starting at `head`, maintaining the per-indent frame stack
/// and evaluating both refresh triggers for every visited block.
fn check_list(
    blocks: &[Block],
    head: usize,
    view: &ViewTree,
    mapper: &Mapper,
    changed_items: &HashSet<BlockId>,
    to_refresh: &mut BTreeSet<usize>,
) {
    assert!(
        blocks.get(head).is_some_and(Block::is_list_block),
        "reconciliation head is not a list block"
    );

    let mut visited: HashSet<BlockId> = HashSet::new();
    let mut stack: Vec<StackFrame> = Vec::new();
    let mut prev_indent: Option<u32> = None;

    let mut index = head;
    while let Some(block) = blocks.get(index) {
        if !block.is_list_block() {
            break;
        }
        let indent = block
            .list_indent()
            .expect("list block without listIndent attribute");
        if visited.contains(&block.id()) {
            prev_indent = Some(indent);
            index += 1;
            continue;
        }

        let frame = StackFrame {
            id: block
                .list_item_id()
                .expect("list block without listItemId attribute"),
            kind: block
                .list_type()
                .expect("list block without listType attribute"),
        };
        if prev_indent.is_some_and(|prev| indent < prev) {
            stack.truncate(indent as usize + 1);
        }
        while stack.len() < indent as usize {
            stack.push(frame);
        }
        if stack.len() == indent as usize {
            stack.push(frame);
        } else {
            stack[indent as usize] = frame;
        }

        let item = ops::item_blocks_forward(blocks, index);
        for &member in &item {
            visited.insert(blocks[member].id());
            refresh_paragraph_if_needed(blocks, member, Some(&item), view, mapper, to_refresh);
            refresh_wrapping_if_needed(
                blocks,
                member,
                &stack,
                view,
                mapper,
                changed_items,
                to_refresh,
            );
        }

        prev_indent = Some(indent);
        index += 1;
    }
}

/// Marks the block when its bogus-paragraph decision disagrees with the
/// currently rendered form.
fn refresh_paragraph_if_needed(
    blocks: &[Block],
    index: usize,
    item_blocks: Option<&[usize]>,
    view: &ViewTree,
    mapper: &Mapper,
    to_refresh: &mut BTreeSet<usize>,
) {
    let block = &blocks[index];
    if block.kind() != crate::model::BlockKind::Paragraph {
        return;
    }
    let Some(element) = mapper.to_view(block.id()) else {
        return;
    };
    let use_bogus = should_use_bogus_paragraph(blocks, index, item_blocks);
    let is_bogus = matches!(view.kind(element), ViewKind::Bogus);
    if use_bogus != is_bogus {
        to_refresh.insert(index);
    }
}

/// Marks the block when its rendered ancestor chain disagrees with the
/// expected stack. Directly changed blocks are refreshed unconditionally;
/// unrendered blocks are skipped.
fn refresh_wrapping_if_needed(
    blocks: &[Block],
    index: usize,
    stack: &[StackFrame],
    view: &ViewTree,
    mapper: &Mapper,
    changed_items: &HashSet<BlockId>,
    to_refresh: &mut BTreeSet<usize>,
) {
    let block = &blocks[index];
    if changed_items.contains(&block.id()) {
        // Queued by the change scan already; no chain walk needed.
        return;
    }
    let Some(element) = mapper.to_view(block.id()) else {
        return;
    };

    let mut level = stack.len() as isize - 1;
    let mut current = view.parent(element);
    while let Some(node) = current {
        if node == view.root() {
            break;
        }
        match view.kind(node) {
            ViewKind::Item { id, .. } => {
                if level < 0 || *id != stack[level as usize].id {
                    to_refresh.insert(index);
                    return;
                }
            }
            ViewKind::List { kind, .. } => {
                if level < 0 || *kind != stack[level as usize].kind {
                    to_refresh.insert(index);
                    return;
                }
                level -= 1;
            }
            _ => break,
        }
        current = view.parent(node);
    }
    if level >= 0 {
        // Chain ran out before the stack did.
        to_refresh.insert(index);
    }
}
