//! Exclusive, scoped model mutation and the per-transaction change log.
//!
//! Every mutation applies to the model immediately and appends a [`Change`]
//! entry. Indices recorded in earlier entries are fixed up by later
//! insertions/removals, so by the time the log is consumed every index refers
//! to the post-transaction model.

use std::collections::BTreeMap;

use crate::model::{AttrValue, Block, BlockId, LIST_ATTRIBUTE_PREFIX, Model};

/// One entry of the transaction change log.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// A block was inserted and now lives at `index`.
    Insert { index: usize },
    /// A block was removed; `index` is the resulting gap position.
    Remove {
        index: usize,
        id: BlockId,
        attrs: BTreeMap<String, AttrValue>,
    },
    /// An attribute changed on the block at `index`. `new == None` means the
    /// attribute was removed.
    Attribute {
        index: usize,
        key: String,
        old: Option<AttrValue>,
        new: Option<AttrValue>,
    },
    /// Inline content changed inside the block at `index`.
    Content { index: usize },
}

impl Change {
    fn index(&self) -> usize {
        match self {
            Change::Insert { index }
            | Change::Remove { index, .. }
            | Change::Attribute { index, .. }
            | Change::Content { index } => *index,
        }
    }

    fn index_mut(&mut self) -> &mut usize {
        match self {
            Change::Insert { index }
            | Change::Remove { index, .. }
            | Change::Attribute { index, .. }
            | Change::Content { index } => index,
        }
    }

    fn refers_to_block(&self) -> bool {
        !matches!(self, Change::Remove { .. })
    }
}

/// Scoped mutation handle over the model. Obtained through
/// [`crate::Engine::change`]; dropped (and its log flushed) when the closure
/// returns, on every exit path.
pub struct Transaction<'a> {
    model: &'a mut Model,
    log: Vec<Change>,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(model: &'a mut Model) -> Self {
        Self {
            model,
            log: Vec::new(),
        }
    }

    pub(crate) fn into_log(self) -> Vec<Change> {
        self.model.clamp_selection();
        self.log
    }

    // ----- read access -----

    pub fn blocks(&self) -> &[Block] {
        self.model.blocks()
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.model.block(index)
    }

    pub fn len(&self) -> usize {
        self.model.len()
    }

    pub fn is_empty(&self) -> bool {
        self.model.is_empty()
    }

    pub fn selection(&self) -> std::ops::Range<usize> {
        self.model.selection()
    }

    // ----- mutation -----

    pub fn set_selection(&mut self, selection: std::ops::Range<usize>) {
        self.model.set_selection(selection);
    }

    pub fn insert_block(&mut self, index: usize, block: Block) {
        assert!(index <= self.model.len(), "insert index out of bounds");
        for entry in &mut self.log {
            if entry.index() >= index {
                *entry.index_mut() += 1;
            }
        }
        self.model.blocks_mut().insert(index, block);
        self.log.push(Change::Insert { index });
    }

    pub fn push_block(&mut self, block: Block) {
        self.insert_block(self.model.len(), block);
    }

    pub fn remove_block(&mut self, index: usize) -> Block {
        assert!(index < self.model.len(), "remove index out of bounds");
        let removed = self.model.blocks_mut().remove(index);

        // A block inserted and removed within the same transaction never
        // existed outside it; its entries cancel out entirely.
        let inserted_here = self
            .log
            .iter()
            .any(|e| matches!(e, Change::Insert { index: i } if *i == index));
        self.log
            .retain(|e| !(e.refers_to_block() && e.index() == index));
        for entry in &mut self.log {
            if entry.index() > index {
                *entry.index_mut() -= 1;
            }
        }
        if !inserted_here {
            self.log.push(Change::Remove {
                index,
                id: removed.id(),
                attrs: removed.attrs().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            });
        }
        self.model.clamp_selection();
        removed
    }

    pub fn set_attr(&mut self, index: usize, key: impl Into<String>, value: AttrValue) {
        let key = key.into();
        let block = &mut self.model.blocks_mut()[index];
        let old = block.set_attr(key.clone(), value.clone());
        if old.as_ref() == Some(&value) {
            return;
        }
        self.log.push(Change::Attribute {
            index,
            key,
            old,
            new: Some(value),
        });
    }

    pub fn remove_attr(&mut self, index: usize, key: &str) {
        let block = &mut self.model.blocks_mut()[index];
        let Some(old) = block.remove_attr(key) else {
            return;
        };
        self.log.push(Change::Attribute {
            index,
            key: key.to_string(),
            old: Some(old),
            new: None,
        });
    }

    /// Removes the whole `list*` attribute family; the block stops being a
    /// list block.
    pub fn clear_list_attrs(&mut self, index: usize) {
        let keys: Vec<String> = self.model.blocks_mut()[index]
            .attr_keys()
            .filter(|k| k.starts_with(LIST_ATTRIBUTE_PREFIX))
            .map(str::to_string)
            .collect();
        for key in keys {
            self.remove_attr(index, &key);
        }
    }

    pub fn set_content(&mut self, index: usize, content: impl Into<String>) {
        self.model.blocks_mut()[index].set_content(content.into());
        self.log.push(Change::Content { index });
    }
}
