/*!
 * Block model: a flat, attribute-tagged sequence of blocks.
 *
 * List structure is not represented as a tree here. Every block that belongs
 * to a list carries the `list*` attribute family (`listItemId`, `listIndent`,
 * `listType`, `listId`) and nesting exists only as the `listIndent` value.
 * The rendered nesting is reconstructed by the downcast converters.
 *
 * All blocks sharing one `listItemId` form a single logical item and are
 * contiguous in document order (blocks of deeper items may sit between them).
 */

pub mod ops;
pub mod transaction;
pub mod walker;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

pub use transaction::{Change, Transaction};
pub use walker::{ListWalker, WalkDirection, WalkerOptions};

/// Attribute key for the opaque id shared by every block of one logical item.
pub const LIST_ITEM_ID: &str = "listItemId";
/// Attribute key for the integer nesting depth (0 = top level).
pub const LIST_INDENT: &str = "listIndent";
/// Attribute key for the list kind (bulleted/numbered).
pub const LIST_TYPE: &str = "listType";
/// Attribute key for the id of a whole same-type list at one indent level.
pub const LIST_ID: &str = "listId";

/// Prefix shared by the whole list attribute family.
pub const LIST_ATTRIBUTE_PREFIX: &str = "list";
/// Prefix of selection metadata attributes, ignored by rendering decisions.
pub const SELECTION_ATTRIBUTE_PREFIX: &str = "selection:";

static NEXT_BLOCK_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identifier of a block, unique for the lifetime of the process.
/// Survives attribute changes and reordering; used by the mapper to associate
/// blocks with their rendered elements.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct BlockId(pub u64);

/// Kind of list container / list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListType {
    Bulleted,
    Numbered,
}

/// Block-level element kind. Only paragraphs take part in the
/// bogus-paragraph rendering decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading { level: u8 },
    CodeBlock,
}

/// Attribute value. List ids are UUIDs, indents are integers; anything else
/// external features may store is a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Uid(Uuid),
    Int(i64),
    Str(String),
    Type(ListType),
}

impl AttrValue {
    pub fn as_uid(&self) -> Option<Uuid> {
        match self {
            AttrValue::Uid(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list_type(&self) -> Option<ListType> {
        match self {
            AttrValue::Type(t) => Some(*t),
            _ => None,
        }
    }
}

/// One block of the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    id: BlockId,
    kind: BlockKind,
    content: String,
    attrs: BTreeMap<String, AttrValue>,
}

impl Block {
    pub fn new(kind: BlockKind, content: impl Into<String>) -> Self {
        Self {
            id: BlockId(NEXT_BLOCK_ID.fetch_add(1, Ordering::Relaxed)),
            kind,
            content: content.into(),
            attrs: BTreeMap::new(),
        }
    }

    pub fn paragraph(content: impl Into<String>) -> Self {
        Self::new(BlockKind::Paragraph, content)
    }

    /// Builder-style attribute assignment, mostly for constructing fixtures.
    pub fn with_attr(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        self.attrs.insert(key.into(), value);
        self
    }

    /// Builder-style assignment of the whole list attribute family.
    pub fn with_list_attrs(
        self,
        item_id: Uuid,
        indent: u32,
        list_type: ListType,
        list_id: Uuid,
    ) -> Self {
        self.with_attr(LIST_ITEM_ID, AttrValue::Uid(item_id))
            .with_attr(LIST_INDENT, AttrValue::Int(indent as i64))
            .with_attr(LIST_TYPE, AttrValue::Type(list_type))
            .with_attr(LIST_ID, AttrValue::Uid(list_id))
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    pub fn has_attr(&self, key: &str) -> bool {
        self.attrs.contains_key(key)
    }

    pub fn attr_keys(&self) -> impl Iterator<Item = &str> {
        self.attrs.keys().map(String::as_str)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether this block belongs to a list at all.
    pub fn is_list_block(&self) -> bool {
        self.attrs.contains_key(LIST_ITEM_ID)
    }

    pub fn list_item_id(&self) -> Option<Uuid> {
        self.attrs.get(LIST_ITEM_ID).and_then(AttrValue::as_uid)
    }

    pub fn list_indent(&self) -> Option<u32> {
        self.attrs
            .get(LIST_INDENT)
            .and_then(AttrValue::as_int)
            .map(|n| n as u32)
    }

    pub fn list_type(&self) -> Option<ListType> {
        self.attrs.get(LIST_TYPE).and_then(AttrValue::as_list_type)
    }

    pub fn list_id(&self) -> Option<Uuid> {
        self.attrs.get(LIST_ID).and_then(AttrValue::as_uid)
    }

    pub(crate) fn set_attr(&mut self, key: String, value: AttrValue) -> Option<AttrValue> {
        self.attrs.insert(key, value)
    }

    pub(crate) fn remove_attr(&mut self, key: &str) -> Option<AttrValue> {
        self.attrs.remove(key)
    }

    pub(crate) fn set_content(&mut self, content: String) {
        self.content = content;
    }
}

/// The document model: an ordered block sequence plus the selected block
/// range. Mutation goes through [`Transaction`] only.
#[derive(Debug)]
pub struct Model {
    blocks: Vec<Block>,
    selection: std::ops::Range<usize>,
    version: u64,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            selection: 0..0,
            version: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn index_of(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id() == id)
    }

    /// Selected block index range. May be empty.
    pub fn selection(&self) -> std::ops::Range<usize> {
        self.selection.clone()
    }

    pub fn set_selection(&mut self, selection: std::ops::Range<usize>) {
        debug_assert!(selection.end <= self.blocks.len());
        self.selection = selection;
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    pub(crate) fn clamp_selection(&mut self) {
        let len = self.blocks.len();
        let start = self.selection.start.min(len);
        let end = self.selection.end.min(len).max(start);
        self.selection = start..end;
    }
}
