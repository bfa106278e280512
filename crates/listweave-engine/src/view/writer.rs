//! Structural operations over the view tree: insert, remove, move, and the
//! wrap/unwrap pair the downcast converters are built on.
//!
//! Wrapping reuses existing wrapper instances: a node is accepted where it
//! already sits, moved into an identical adjacent wrapper, or gets a fresh
//! wrapper created in place. Adjacent wrappers with the same key (item id +
//! level, or list kind + level) are merged, so adjacent blocks of one item
//! end up sharing a single rendered container. Unwrapping is the inverse and
//! splits part-filled wrappers instead of dissolving them.

use uuid::Uuid;

use crate::model::ListType;
use crate::view::{ViewId, ViewKind, ViewTree};

impl ViewTree {
    // ----- primitive structural ops -----

    /// Inserts a new node of `kind` under `parent` at `offset`.
    pub fn insert(&mut self, parent: ViewId, offset: usize, kind: ViewKind) -> ViewId {
        let id = self.alloc(kind);
        self.attach(id, parent, offset);
        id
    }

    /// Detaches `id` from its parent; the subtree stays alive.
    pub fn detach(&mut self, id: ViewId) {
        if let Some(parent) = self.parent(id) {
            let children = self.children_mut(parent);
            let pos = children
                .iter()
                .position(|c| *c == id)
                .expect("child not present in its parent");
            children.remove(pos);
            self.set_parent(id, None);
        }
    }

    /// Removes `id` and its whole subtree.
    pub fn remove(&mut self, id: ViewId) {
        assert_ne!(id, self.root(), "cannot remove the root");
        self.detach(id);
        self.drop_subtree(id);
    }

    /// Moves `id` (with its subtree) under `parent` at `offset`.
    pub fn move_node(&mut self, id: ViewId, parent: ViewId, offset: usize) {
        self.detach(id);
        self.attach(id, parent, offset);
    }

    /// Position of `id` within its parent.
    pub fn position(&self, id: ViewId) -> (ViewId, usize) {
        let parent = self.parent(id).expect("node has no parent");
        let offset = self
            .children(parent)
            .iter()
            .position(|c| *c == id)
            .expect("child not present in its parent");
        (parent, offset)
    }

    fn attach(&mut self, id: ViewId, parent: ViewId, offset: usize) {
        self.children_mut(parent).insert(offset, id);
        self.set_parent(id, Some(parent));
    }

    fn drop_subtree(&mut self, id: ViewId) {
        for child in self.take_children(id) {
            self.drop_subtree(child);
        }
        self.forget(id);
    }

    // ----- wrapping -----

    /// Wraps `target` in an item container keyed by `(item_id, level)`,
    /// reusing the parent or an identical adjacent sibling when possible.
    /// Returns the wrapper that now contains `target`.
    pub fn wrap_in_item(&mut self, target: ViewId, item_id: Uuid, level: u32) -> ViewId {
        let wanted = ViewKind::Item { id: item_id, level };
        self.wrap_with(target, wanted)
    }

    /// Wraps `target` in a list container keyed by `(kind, level)`.
    pub fn wrap_in_list(&mut self, target: ViewId, kind: ListType, level: u32) -> ViewId {
        let wanted = ViewKind::List { kind, level };
        self.wrap_with(target, wanted)
    }

    fn wrap_with(&mut self, target: ViewId, wanted: ViewKind) -> ViewId {
        let (parent, offset) = self.position(target);

        if *self.kind(parent) == wanted {
            return parent;
        }
        if offset > 0 {
            let prev = self.children(parent)[offset - 1];
            if *self.kind(prev) == wanted {
                let end = self.children(prev).len();
                self.move_node(target, prev, end);
                self.merge_with_siblings(target);
                return prev;
            }
        }
        if offset + 1 < self.children(parent).len() {
            let next = self.children(parent)[offset + 1];
            if *self.kind(next) == wanted {
                self.move_node(target, next, 0);
                self.merge_with_siblings(target);
                return next;
            }
        }
        let wrapper = self.insert(parent, offset, wanted);
        self.move_node(target, wrapper, 0);
        wrapper
    }

    /// Merges `id` with its previous/next sibling when they are wrappers with
    /// the same key. Returns the surviving node.
    pub(crate) fn merge_with_siblings(&mut self, id: ViewId) -> ViewId {
        if !self.kind(id).is_list_wrapper() {
            return id;
        }
        let mut survivor = id;
        let (parent, offset) = self.position(survivor);
        if offset > 0 {
            let prev = self.children(parent)[offset - 1];
            if self.kind(prev) == self.kind(survivor) {
                survivor = self.merge_pair(prev, survivor);
            }
        }
        let (parent, offset) = self.position(survivor);
        if offset + 1 < self.children(parent).len() {
            let next = self.children(parent)[offset + 1];
            if self.kind(next) == self.kind(survivor) {
                survivor = self.merge_pair(survivor, next);
            }
        }
        survivor
    }

    /// Moves `b`'s children to the end of `a`, drops `b`, and merges the two
    /// wrappers that meet at the join. `a` and `b` must be adjacent siblings.
    fn merge_pair(&mut self, a: ViewId, b: ViewId) -> ViewId {
        let boundary = self.children(a).last().copied();
        for child in self.take_children(b) {
            let end = self.children(a).len();
            self.attach(child, a, end);
        }
        self.remove(b);
        if let Some(last_old) = boundary {
            // The join point may bring two identical wrappers together.
            let joined = self.children(a).iter().position(|c| *c == last_old);
            if let Some(pos) = joined {
                if pos + 1 < self.children(a).len() {
                    let first_new = self.children(a)[pos + 1];
                    if self.kind(last_old).is_list_wrapper()
                        && self.kind(last_old) == self.kind(first_new)
                    {
                        self.merge_pair(last_old, first_new);
                    }
                }
            }
        }
        a
    }

    /// Re-joins the two wrappers that became adjacent at `(parent, offset)`
    /// after a removal, when they carry the same key.
    pub(crate) fn heal_adjacent(&mut self, parent: ViewId, offset: usize) {
        if offset == 0 || offset >= self.children(parent).len() {
            return;
        }
        let a = self.children(parent)[offset - 1];
        let b = self.children(parent)[offset];
        if self.kind(a).is_list_wrapper() && self.kind(a) == self.kind(b) {
            self.merge_pair(a, b);
        }
    }

    // ----- unwrapping -----

    /// Removes every list wrapper around `target`, innermost outward,
    /// stopping at the first non-wrapper ancestor. Part-filled wrappers are
    /// split; siblings keep equivalent wrappers of their own.
    pub fn unwrap_list_wrappers(&mut self, target: ViewId) {
        while let Some(parent) = self.parent(target) {
            if !self.kind(parent).is_list_wrapper() {
                break;
            }
            self.split_out_of_parent(target);
        }
    }

    /// Lifts `target` out of its parent wrapper into the grandparent,
    /// splitting the wrapper when `target` has siblings on both sides.
    fn split_out_of_parent(&mut self, target: ViewId) {
        let (parent, offset) = self.position(target);
        let (grandparent, parent_offset) = self.position(parent);

        let after: Vec<ViewId> = self.children(parent)[offset + 1..].to_vec();
        self.detach(target);
        self.attach(target, grandparent, parent_offset + 1);

        if !after.is_empty() {
            let tail_kind = self.kind(parent).clone();
            let tail = self.insert(grandparent, parent_offset + 2, tail_kind);
            for (i, child) in after.into_iter().enumerate() {
                self.move_node(child, tail, i);
            }
        }
        if self.children(parent).is_empty() {
            self.remove(parent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ListType;
    use pretty_assertions::assert_eq;

    fn item_key() -> Uuid {
        Uuid::new_v4()
    }

    #[test]
    fn test_wrap_creates_wrappers_in_place() {
        let mut view = ViewTree::new();
        let p = view.push_block(view.root(), "p", "a");
        let id = item_key();

        let li = view.wrap_in_item(p, id, 0);
        let ul = view.wrap_in_list(li, ListType::Bulleted, 0);

        assert_eq!(view.to_html(), "<ul><li><p>a</p></li></ul>");
        assert_eq!(view.parent(p), Some(li));
        assert_eq!(view.parent(li), Some(ul));
    }

    #[test]
    fn test_wrap_reuses_matching_parent() {
        let mut view = ViewTree::new();
        let p = view.push_block(view.root(), "p", "a");
        let id = item_key();
        let li = view.wrap_in_item(p, id, 0);
        assert_eq!(view.wrap_in_item(p, id, 0), li, "no duplicate wrapper");
    }

    #[test]
    fn test_wrap_merges_into_previous_sibling_item() {
        let mut view = ViewTree::new();
        let id = item_key();
        let p1 = view.push_block(view.root(), "p", "one");
        let p2 = view.push_block(view.root(), "p", "two");

        let li = view.wrap_in_item(p1, id, 0);
        let li2 = view.wrap_in_item(p2, id, 0);

        assert_eq!(li, li2, "same item id shares one container");
        assert_eq!(view.children(li), &[p1, p2]);
    }

    #[test]
    fn test_wrap_does_not_merge_lists_across_levels() {
        let mut view = ViewTree::new();
        let p1 = view.push_block(view.root(), "p", "outer");
        let li0 = view.wrap_in_item(p1, item_key(), 0);
        let ul0 = view.wrap_in_list(li0, ListType::Bulleted, 0);

        // A level-1 wrapper chain right after the level-0 list must not fold
        // into it by kind alone.
        let p2 = view.push_block(view.root(), "p", "inner");
        let li1 = view.wrap_in_item(p2, item_key(), 1);
        let ul1 = view.wrap_in_list(li1, ListType::Bulleted, 1);

        assert_ne!(ul0, ul1);
        assert_eq!(view.children(view.root()).len(), 2);
    }

    #[test]
    fn test_adjacent_same_key_wrappers_merge_on_wrap() {
        let mut view = ViewTree::new();
        let id = item_key();
        let p1 = view.push_block(view.root(), "p", "one");
        let li = view.wrap_in_item(p1, id, 0);
        let ul = view.wrap_in_list(li, ListType::Bulleted, 0);

        // Second block rendered later at the root is pulled into the same
        // list and the same item.
        let p2 = view.push_block(view.root(), "p", "two");
        let li2 = view.wrap_in_item(p2, id, 0);
        view.wrap_in_list(li2, ListType::Bulleted, 0);

        assert_eq!(view.to_html(), "<ul><li><p>one</p><p>two</p></li></ul>");
        assert_eq!(view.children(ul).len(), 1);
    }

    #[test]
    fn test_unwrap_splits_part_filled_wrappers() {
        let mut view = ViewTree::new();
        let id = item_key();
        let p1 = view.push_block(view.root(), "p", "one");
        let li = view.wrap_in_item(p1, id, 0);
        view.wrap_in_list(li, ListType::Bulleted, 0);
        let p2 = view.push_block(view.root(), "p", "two");
        let li2 = view.wrap_in_item(p2, id, 0);
        view.wrap_in_list(li2, ListType::Bulleted, 0);
        let p3 = view.push_block(view.root(), "p", "three");
        let li3 = view.wrap_in_item(p3, id, 0);
        view.wrap_in_list(li3, ListType::Bulleted, 0);

        view.unwrap_list_wrappers(p2);

        assert_eq!(
            view.to_html(),
            "<ul><li><p>one</p></li></ul><p>two</p><ul><li><p>three</p></li></ul>"
        );
    }

    #[test]
    fn test_unwrap_sole_child_drops_empty_wrappers() {
        let mut view = ViewTree::new();
        let p = view.push_block(view.root(), "p", "a");
        let li = view.wrap_in_item(p, item_key(), 0);
        view.wrap_in_list(li, ListType::Bulleted, 0);

        view.unwrap_list_wrappers(p);

        assert_eq!(view.to_html(), "<p>a</p>");
        assert_eq!(view.children(view.root()), &[p]);
    }

    #[test]
    fn test_rewrap_after_unwrap_restores_single_container() {
        let mut view = ViewTree::new();
        let id = item_key();
        let p1 = view.push_block(view.root(), "p", "one");
        let li = view.wrap_in_item(p1, id, 0);
        view.wrap_in_list(li, ListType::Bulleted, 0);
        let p2 = view.push_block(view.root(), "p", "two");
        let li2 = view.wrap_in_item(p2, id, 0);
        view.wrap_in_list(li2, ListType::Bulleted, 0);

        view.unwrap_list_wrappers(p1);
        let li_again = view.wrap_in_item(p1, id, 0);
        view.wrap_in_list(li_again, ListType::Bulleted, 0);

        assert_eq!(view.to_html(), "<ul><li><p>one</p><p>two</p></li></ul>");
    }

    #[test]
    fn test_nested_wrap_lands_inside_parent_item() {
        let mut view = ViewTree::new();
        let parent_id = item_key();
        let child_id = item_key();

        let pa = view.push_block(view.root(), "p", "A");
        let li_a = view.wrap_in_item(pa, parent_id, 0);
        view.wrap_in_list(li_a, ListType::Bulleted, 0);

        let pb = view.push_block(view.root(), "p", "B");
        let li_b = view.wrap_in_item(pb, child_id, 1);
        let ul_b = view.wrap_in_list(li_b, ListType::Bulleted, 1);
        let li_outer = view.wrap_in_item(ul_b, parent_id, 0);
        view.wrap_in_list(li_outer, ListType::Bulleted, 0);

        assert_eq!(
            view.parent(ul_b),
            Some(li_a),
            "nested list joins the parent item"
        );
        assert_eq!(
            view.to_html(),
            "<ul><li><p>A</p><ul><li><p>B</p></li></ul></li></ul>"
        );
    }
}
