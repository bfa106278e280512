//! The indent/outdent command: merges, splits and re-indents the selected
//! items while keeping the nesting invariants intact.

use crate::Engine;
use crate::model::{
    Block, BlockId, ListWalker, Model, Transaction, WalkerOptions, ops,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentDirection {
    /// Indent: nest the selected items one level deeper.
    Forward,
    /// Outdent: lift the selected items one level up.
    Backward,
}

/// Listener invoked after `execute`, inside the same transaction, with the
/// mutated blocks. External rebalancing (renumbering, coalescing of adjacent
/// same-id runs) hangs off this hook; the command itself never touches
/// unrelated siblings.
pub type AfterExecute = Box<dyn FnMut(&mut Transaction<'_>, &[BlockId])>;

pub struct IndentCommand {
    direction: IndentDirection,
    is_enabled: bool,
    after_execute: Vec<AfterExecute>,
}

impl IndentCommand {
    pub fn new(direction: IndentDirection) -> Self {
        Self {
            direction,
            is_enabled: false,
            after_execute: Vec::new(),
        }
    }

    pub fn direction(&self) -> IndentDirection {
        self.direction
    }

    /// Derived state; recompute whenever the model or selection changed.
    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    pub fn on_after_execute(
        &mut self,
        listener: impl FnMut(&mut Transaction<'_>, &[BlockId]) + 'static,
    ) {
        self.after_execute.push(Box::new(listener));
    }

    fn indent_by(&self) -> i64 {
        match self.direction {
            IndentDirection::Forward => 1,
            IndentDirection::Backward => -1,
        }
    }

    /// Recomputes enablement from the current selection.
    pub fn refresh(&mut self, model: &Model) {
        self.is_enabled = self.check_enabled(model);
    }

    fn check_enabled(&self, model: &Model) -> bool {
        let blocks = model.blocks();
        let selected = selected_list_blocks(blocks, model.selection());
        let Some(&first) = selected.first() else {
            return false;
        };

        // Every list item can always be outdented.
        if self.direction == IndentDirection::Backward {
            return true;
        }

        // Continuation blocks of a single item cannot independently nest.
        if is_single_item(blocks, &selected) && !ops::is_first_block_of_item(blocks, first) {
            return false;
        }

        let expanded = ops::expand_to_complete_items(blocks, first..selected[selected.len() - 1] + 1);
        let first = expanded.start;

        // Some item before the selection must be able to become its parent.
        let sibling = ListWalker::first(
            blocks,
            first,
            WalkerOptions {
                same_indent: true,
                ..Default::default()
            },
        );
        let Some(sibling) = sibling else {
            return false;
        };
        blocks[sibling].list_type() == blocks[first].list_type()
    }

    /// Applies the indent change to the current selection. Calling this
    /// while the command is disabled is a contract violation.
    ///
    /// Returns the mutated blocks, which are also handed to every
    /// `afterExecute` listener inside the same transaction.
    pub fn execute(&mut self, engine: &mut Engine) -> Vec<BlockId> {
        assert!(
            self.is_enabled,
            "indent command executed while disabled"
        );
        let indent_by = self.indent_by();
        let listeners = &mut self.after_execute;

        engine.change(|txn| {
            let selected = selected_list_blocks(txn.blocks(), txn.selection());
            let first = selected[0];

            // A selection confined to the continuation blocks of one item:
            // indent is a no-op, outdent splits the run into its own item.
            let affected: Vec<usize> = if is_single_item(txn.blocks(), &selected)
                && !ops::is_first_block_of_item(txn.blocks(), first)
            {
                if indent_by < 0 {
                    ops::split_item_before(txn, first)
                } else {
                    Vec::new()
                }
            } else {
                let expanded =
                    ops::expand_to_complete_items(txn.blocks(), first..selected[selected.len() - 1] + 1);
                let indices: Vec<usize> = expanded.clone().collect();

                if indent_by < 0 {
                    merge_outdented_into_parents(txn, &indices, expanded.end);
                }
                ops::indent_blocks(txn, &indices, indent_by);
                indices
            };

            let ids: Vec<BlockId> = affected
                .iter()
                .map(|&i| txn.blocks()[i].id())
                .collect();
            log::debug!(
                "indent command (by {}): {} block(s) affected",
                indent_by,
                ids.len()
            );
            for listener in listeners.iter_mut() {
                listener(txn, &ids);
            }
            ids
        })
    }
}

/// Merges every selected block whose indent sits in `[1, first block's
/// indent]` into its structural parent item, but only when the parent's
/// item continues after the outdented run; an outdented run that nothing
/// follows keeps its identity and becomes the parent's sibling.
fn merge_outdented_into_parents(txn: &mut Transaction<'_>, indices: &[usize], run_end: usize) {
    let first_indent = txn.blocks()[indices[0]]
        .list_indent()
        .expect("list block without listIndent attribute");
    for &i in indices {
        let indent = txn.blocks()[i]
            .list_indent()
            .expect("list block without listIndent attribute");
        if indent < 1 || indent > first_indent {
            continue;
        }
        let parent = ListWalker::first(
            txn.blocks(),
            i,
            WalkerOptions {
                smaller_indent: true,
                ..Default::default()
            },
        );
        let Some(parent) = parent else {
            continue;
        };
        if ops::item_continues_after(txn.blocks(), run_end, parent) {
            ops::merge_block_into_item(txn, i, parent);
        }
    }
}

/// Selected blocks truncated at the first non-list block.
fn selected_list_blocks(blocks: &[Block], selection: std::ops::Range<usize>) -> Vec<usize> {
    selection
        .take_while(|&i| blocks[i].is_list_block())
        .collect()
}

/// Whether all the given blocks belong to one logical item.
fn is_single_item(blocks: &[Block], selected: &[usize]) -> bool {
    let first = blocks[selected[0]].list_item_id();
    selected
        .iter()
        .all(|&i| blocks[i].list_item_id() == first)
}
