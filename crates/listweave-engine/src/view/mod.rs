/*!
 * Rendered view: a containers-within-containers tree.
 *
 * Node kinds are tagged variants rather than element-name strings. List and
 * item wrappers carry the indent level they wrap, so wrapper reuse during
 * downcast can never merge containers across nesting levels.
 *
 * The same tree type doubles as the input format for upcast: callers parse
 * external markup with whatever tool they like and rebuild it through the
 * `push_*` builder API.
 */

pub mod mapper;
pub mod writer;

use std::collections::HashMap;

use uuid::Uuid;

use crate::model::ListType;

pub use mapper::Mapper;

/// Identifier of a view node, stable for the node's lifetime.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct ViewId(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum ViewKind {
    Root,
    /// List container (`ul`/`ol`), wrapping one indent level.
    List { kind: ListType, level: u32 },
    /// Item container (`li`), identified by the item id it renders.
    Item { id: Uuid, level: u32 },
    /// Ordinary block container (`p`, `h1`, `pre`, ...).
    Block { name: String },
    /// Inline pass-through marker: the block renders without a visible
    /// container (editing pipeline only; flattened away in data rendering).
    Bogus,
    Text { content: String },
}

impl ViewKind {
    pub fn is_list_container(&self) -> bool {
        matches!(self, ViewKind::List { .. })
    }

    pub fn is_item_container(&self) -> bool {
        matches!(self, ViewKind::Item { .. })
    }

    /// List or item container: the wrappers downcast owns.
    pub fn is_list_wrapper(&self) -> bool {
        self.is_list_container() || self.is_item_container()
    }
}

#[derive(Debug)]
struct ViewNode {
    kind: ViewKind,
    parent: Option<ViewId>,
    children: Vec<ViewId>,
}

#[derive(Debug)]
pub struct ViewTree {
    nodes: HashMap<ViewId, ViewNode>,
    root: ViewId,
    next_id: u64,
}

impl Default for ViewTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewTree {
    pub fn new() -> Self {
        let root = ViewId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            ViewNode {
                kind: ViewKind::Root,
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            nodes,
            root,
            next_id: 1,
        }
    }

    pub fn root(&self) -> ViewId {
        self.root
    }

    pub fn contains(&self, id: ViewId) -> bool {
        self.nodes.contains_key(&id)
    }

    fn node(&self, id: ViewId) -> &ViewNode {
        self.nodes.get(&id).expect("stale view node id")
    }

    fn node_mut(&mut self, id: ViewId) -> &mut ViewNode {
        self.nodes.get_mut(&id).expect("stale view node id")
    }

    pub fn kind(&self, id: ViewId) -> &ViewKind {
        &self.node(id).kind
    }

    pub fn parent(&self, id: ViewId) -> Option<ViewId> {
        self.node(id).parent
    }

    pub fn children(&self, id: ViewId) -> &[ViewId] {
        &self.node(id).children
    }

    pub(crate) fn set_parent(&mut self, id: ViewId, parent: Option<ViewId>) {
        self.node_mut(id).parent = parent;
    }

    pub(crate) fn children_mut(&mut self, id: ViewId) -> &mut Vec<ViewId> {
        &mut self.node_mut(id).children
    }

    pub(crate) fn take_children(&mut self, id: ViewId) -> Vec<ViewId> {
        std::mem::take(&mut self.node_mut(id).children)
    }

    pub(crate) fn forget(&mut self, id: ViewId) {
        self.nodes.remove(&id);
    }

    pub(crate) fn alloc(&mut self, kind: ViewKind) -> ViewId {
        let id = ViewId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            ViewNode {
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    // ----- builder API (appending children, for input trees and tests) -----

    /// Appends a node of the given kind under `parent`.
    pub fn push(&mut self, parent: ViewId, kind: ViewKind) -> ViewId {
        let id = self.alloc(kind);
        self.node_mut(parent).children.push(id);
        self.node_mut(id).parent = Some(parent);
        id
    }

    /// Appends a list container; its level is derived from the ancestry.
    pub fn push_list(&mut self, parent: ViewId, kind: ListType) -> ViewId {
        let level = self.list_ancestor_count(parent);
        self.push(parent, ViewKind::List { kind, level })
    }

    /// Appends an item container with a fresh id.
    pub fn push_item(&mut self, parent: ViewId) -> ViewId {
        let level = self.list_ancestor_count(parent).saturating_sub(1);
        self.push(
            parent,
            ViewKind::Item {
                id: Uuid::new_v4(),
                level,
            },
        )
    }

    /// Appends a block container holding one text node.
    pub fn push_block(&mut self, parent: ViewId, name: impl Into<String>, text: &str) -> ViewId {
        let block = self.push(parent, ViewKind::Block { name: name.into() });
        if !text.is_empty() {
            self.push_text(block, text);
        }
        block
    }

    pub fn push_text(&mut self, parent: ViewId, content: impl Into<String>) -> ViewId {
        self.push(
            parent,
            ViewKind::Text {
                content: content.into(),
            },
        )
    }

    fn list_ancestor_count(&self, mut id: ViewId) -> u32 {
        let mut count = 0;
        loop {
            if self.node(id).kind.is_list_container() {
                count += 1;
            }
            match self.node(id).parent {
                Some(p) => id = p,
                None => return count,
            }
        }
    }

    // ----- content access -----

    /// Concatenated text of the node's descendants.
    pub fn text_content(&self, id: ViewId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: ViewId, out: &mut String) {
        match &self.node(id).kind {
            ViewKind::Text { content } => out.push_str(content),
            _ => {
                for child in self.node(id).children.clone() {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Replaces the text content of a block-level element with a single text
    /// node. Used for in-place content patches.
    pub(crate) fn set_text(&mut self, id: ViewId, content: &str) {
        let children = self.node(id).children.clone();
        for child in children {
            self.remove(child);
        }
        if !content.is_empty() {
            self.push_text(id, content);
        }
    }

    // ----- serialization -----

    /// Serializes the tree as HTML-like markup. Bogus markers do not survive:
    /// their content is emitted inline.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in self.children(self.root) {
            self.write_html(*child, &mut out);
        }
        out
    }

    fn write_html(&self, id: ViewId, out: &mut String) {
        match &self.node(id).kind {
            ViewKind::Root => {}
            ViewKind::List { kind, .. } => {
                let tag = match kind {
                    ListType::Bulleted => "ul",
                    ListType::Numbered => "ol",
                };
                self.write_element(id, tag, out);
            }
            ViewKind::Item { .. } => self.write_element(id, "li", out),
            ViewKind::Block { name } => {
                let name = name.clone();
                self.write_element(id, &name, out);
            }
            ViewKind::Bogus => {
                for child in self.node(id).children.clone() {
                    self.write_html(child, out);
                }
            }
            ViewKind::Text { content } => {
                out.push_str(&html_escape::encode_text(content));
            }
        }
    }

    fn write_element(&self, id: ViewId, tag: &str, out: &mut String) {
        out.push('<');
        out.push_str(tag);
        out.push('>');
        for child in self.node(id).children.clone() {
            self.write_html(child, out);
        }
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
}
