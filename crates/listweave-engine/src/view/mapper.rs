//! Model ↔ view association.
//!
//! Ownership stays acyclic: neither tree stores pointers into the other, the
//! association lives in two hash-map indices here. Absent mappings are legal
//! and mean "not rendered yet"; callers skip, they do not fail.

use std::collections::HashMap;

use crate::model::BlockId;
use crate::view::{ViewId, ViewKind, ViewTree};

/// Bidirectional block ↔ rendered element lookup.
#[derive(Debug, Default)]
pub struct Mapper {
    to_view: HashMap<BlockId, ViewId>,
    to_model: HashMap<ViewId, BlockId>,
}

impl Mapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, block: BlockId, element: ViewId) {
        if let Some(old) = self.to_view.insert(block, element) {
            self.to_model.remove(&old);
        }
        if let Some(old) = self.to_model.insert(element, block) {
            self.to_view.remove(&old);
        }
    }

    pub fn unbind_block(&mut self, block: BlockId) {
        if let Some(element) = self.to_view.remove(&block) {
            self.to_model.remove(&element);
        }
    }

    pub fn unbind_element(&mut self, element: ViewId) {
        if let Some(block) = self.to_model.remove(&element) {
            self.to_view.remove(&block);
        }
    }

    pub fn to_view(&self, block: BlockId) -> Option<ViewId> {
        self.to_view.get(&block).copied()
    }

    pub fn to_model(&self, element: ViewId) -> Option<BlockId> {
        self.to_model.get(&element).copied()
    }

    /// Number of model positions a rendered item container occupies (≥ 1).
    ///
    /// Nested list containers contribute the recursive sum of their items.
    /// A non-list child that is unmapped is inline content living directly in
    /// the item, which makes the whole container a single inline-content
    /// item. An item with no block-producing children still counts as 1.
    pub fn view_item_model_length(&self, view: &ViewTree, item: ViewId) -> usize {
        let mut length = 0;

        for &child in view.children(item) {
            if view.kind(child).is_list_container() {
                for &nested_item in view.children(child) {
                    length += self.view_item_model_length(view, nested_item);
                }
            }
        }

        let mut has_blocks = false;
        for &child in view.children(item) {
            if view.kind(child).is_list_container() {
                continue;
            }
            if self.to_model(child).is_none() {
                return length + 1;
            }
            length += 1;
            has_blocks = true;
        }

        if !has_blocks {
            length += 1;
        }
        length
    }

    /// Model positions covered by an arbitrary view node.
    fn node_model_length(&self, view: &ViewTree, node: ViewId) -> usize {
        match view.kind(node) {
            ViewKind::List { .. } => view
                .children(node)
                .iter()
                .map(|&item| self.view_item_model_length(view, item))
                .sum(),
            ViewKind::Item { .. } => self.view_item_model_length(view, node),
            ViewKind::Block { .. } | ViewKind::Bogus => {
                if self.to_model(node).is_some() {
                    1
                } else {
                    0
                }
            }
            ViewKind::Root | ViewKind::Text { .. } => 0,
        }
    }

    /// Converts a model block index to the view position where that block's
    /// element belongs: `(parent, child offset)`. At container boundaries the
    /// shallowest position wins; wrapper merging pulls the inserted element
    /// into the right container afterwards.
    pub fn view_position_for_index(&self, view: &ViewTree, index: usize) -> (ViewId, usize) {
        self.descend(view, view.root(), index)
    }

    fn descend(&self, view: &ViewTree, container: ViewId, mut remaining: usize) -> (ViewId, usize) {
        for (offset, &child) in view.children(container).iter().enumerate() {
            let length = self.node_model_length(view, child);
            if remaining == 0 {
                return (container, offset);
            }
            if remaining < length {
                if view.kind(child).is_list_wrapper() {
                    return self.descend(view, child, remaining);
                }
                return (container, offset);
            }
            remaining -= length;
        }
        (container, view.children(container).len())
    }
}
