/*!
 * Conversion between the block model and the rendered view: upcast (external
 * tree → list attributes), downcast (block → wrapped rendered structure) and
 * the reconciliation pass that decides which blocks need re-rendering after a
 * transaction.
 */

pub mod downcast;
pub mod reconcile;
pub mod upcast;

use crate::model::{
    Block, BlockKind, LIST_ATTRIBUTE_PREFIX, SELECTION_ATTRIBUTE_PREFIX, ops,
};

pub use reconcile::ReconcileReport;
pub use upcast::ConsumptionTracker;

/// How downcast output is going to be consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Incrementally maintained view; inline pass-through blocks keep an
    /// explicit bogus marker element.
    #[default]
    Editing,
    /// Final output: inline pass-through content is flattened so no marker
    /// survives serialization.
    Data,
}

/// Whether the block renders as inline pass-through content instead of a
/// visible paragraph container.
///
/// True iff the block is a paragraph carrying `listItemId`, has no attribute
/// outside the list family (selection metadata ignored), and is the sole
/// block of its item. `item_blocks` lets callers supply the item's block set
/// when they already know it (or want to force an empty one).
pub fn should_use_bogus_paragraph(
    blocks: &[Block],
    index: usize,
    item_blocks: Option<&[usize]>,
) -> bool {
    let block = &blocks[index];
    if block.kind() != BlockKind::Paragraph || !block.is_list_block() {
        return false;
    }
    for key in block.attr_keys() {
        if key.starts_with(SELECTION_ATTRIBUTE_PREFIX) {
            continue;
        }
        if !key.starts_with(LIST_ATTRIBUTE_PREFIX) {
            return false;
        }
    }
    let count = match item_blocks {
        Some(set) => set.len(),
        None => ops::item_blocks(blocks, index).len(),
    };
    count < 2
}
