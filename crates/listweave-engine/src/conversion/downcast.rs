//! Downcast: one block → its rendered element wrapped in the list-wrapper
//! chain its attributes call for.
//!
//! Re-rendering always unwraps first; re-wrapping from a stale chain would
//! nest duplicate containers on every attribute change. The wrapper chain is
//! rebuilt from the block's indent down to level 0, each shallower level
//! governed by the nearest preceding block at that level.

use crate::conversion::{RenderMode, should_use_bogus_paragraph};
use crate::model::{Block, BlockId, BlockKind, ListWalker, Model, WalkerOptions};
use crate::view::{Mapper, ViewId, ViewKind, ViewTree};

fn block_element_name(kind: BlockKind) -> String {
    match kind {
        BlockKind::Paragraph => "p".to_string(),
        BlockKind::Heading { level } => format!("h{level}"),
        BlockKind::CodeBlock => "pre".to_string(),
    }
}

/// Creates the rendered element for one block at the given view position and
/// binds it. In data mode a bogus paragraph is flattened away: only the
/// inline content is emitted and no binding is kept for it.
fn create_block_element(
    model: &Model,
    index: usize,
    view: &mut ViewTree,
    mapper: &mut Mapper,
    mode: RenderMode,
    position: (ViewId, usize),
) -> ViewId {
    let block = &model.blocks()[index];
    let (parent, offset) = position;

    let bogus = should_use_bogus_paragraph(model.blocks(), index, None);
    let element = match (bogus, mode) {
        (true, RenderMode::Editing) => {
            let marker = view.insert(parent, offset, ViewKind::Bogus);
            if !block.content().is_empty() {
                view.push_text(marker, block.content());
            }
            mapper.bind(block.id(), marker);
            marker
        }
        (true, RenderMode::Data) => view.insert(
            parent,
            offset,
            ViewKind::Text {
                content: block.content().to_string(),
            },
        ),
        (false, _) => {
            let name = block_element_name(block.kind());
            let element = view.insert(parent, offset, ViewKind::Block { name });
            if !block.content().is_empty() {
                view.push_text(element, block.content());
            }
            mapper.bind(block.id(), element);
            element
        }
    };
    element
}

/// Wraps a freshly rendered element in the item/list wrapper chain demanded
/// by the block's attributes, reusing adjacent wrappers. Walks the indent
/// down to 0, locating the governing item of each shallower level. Returns
/// false when the block carries no complete wrapper identity.
pub(crate) fn wrap_list_item_block(
    blocks: &[Block],
    index: usize,
    view: &mut ViewTree,
    element: ViewId,
) -> bool {
    let block = &blocks[index];
    // A block is only wrapped when the whole identity triple is present; a
    // partially cleared block renders as a plain sibling of the list.
    let (Some(indent), Some(mut item_id), Some(mut list_type)) = (
        block.list_indent(),
        block.list_item_id(),
        block.list_type(),
    ) else {
        return false;
    };

    let mut current = index;
    let mut node = element;
    for level in (0..=indent).rev() {
        let item = view.wrap_in_item(node, item_id, level);
        node = view.wrap_in_list(item, list_type, level);

        if level == 0 {
            break;
        }
        let parent = ListWalker::first(
            blocks,
            current,
            WalkerOptions {
                smaller_indent: true,
                ..Default::default()
            },
        );
        // No shallower item: a fragment holding only part of a nested list.
        let Some(parent) = parent else {
            break;
        };
        item_id = blocks[parent]
            .list_item_id()
            .expect("list block without listItemId attribute");
        list_type = blocks[parent]
            .list_type()
            .expect("list block without listType attribute");
        current = parent;
    }
    // A re-render next to an identical outer wrapper re-joins it.
    view.merge_with_siblings(node);
    true
}

/// Unwraps, removes and unbinds the block's rendered element, re-joining the
/// wrappers its removal left adjacent.
pub(crate) fn drop_block_rendering(view: &mut ViewTree, mapper: &mut Mapper, block: BlockId) {
    let Some(element) = mapper.to_view(block) else {
        return;
    };
    view.unwrap_list_wrappers(element);
    let (parent, offset) = view.position(element);
    view.remove(element);
    view.heal_adjacent(parent, offset);
    mapper.unbind_block(block);
}

/// Drops the current rendering of the block at `index` (if any) and renders
/// it anew: unwrap, remove, re-insert at the mapped position, re-wrap.
pub(crate) fn refresh_block(
    model: &Model,
    index: usize,
    view: &mut ViewTree,
    mapper: &mut Mapper,
) {
    let block_id = model.blocks()[index].id();
    drop_block_rendering(view, mapper, block_id);

    let position = mapper.view_position_for_index(view, index);
    let element = create_block_element(model, index, view, mapper, RenderMode::Editing, position);
    if !wrap_list_item_block(model.blocks(), index, view, element) {
        // A non-list block landing inside a run splits the wrappers open.
        view.unwrap_list_wrappers(element);
    }
}

/// Renders the whole model from scratch. Used for the data pipeline; the
/// editing pipeline maintains its view incrementally through reconciliation.
pub fn render_document(model: &Model, mode: RenderMode) -> (ViewTree, Mapper) {
    let mut view = ViewTree::new();
    let mut mapper = Mapper::new();
    for index in 0..model.len() {
        let position = (view.root(), view.children(view.root()).len());
        let element = create_block_element(model, index, &mut view, &mut mapper, mode, position);
        wrap_list_item_block(model.blocks(), index, &mut view, element);
    }
    (view, mapper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttrValue, Block, BlockKind, ListType, Model, Transaction};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn model_of(blocks: Vec<Block>) -> Model {
        let mut model = Model::new();
        let mut txn = Transaction::new(&mut model);
        for block in blocks {
            txn.push_block(block);
        }
        txn.into_log();
        model
    }

    fn bulleted(text: &str, item: Uuid, indent: u32, list: Uuid) -> Block {
        Block::paragraph(text).with_list_attrs(item, indent, ListType::Bulleted, list)
    }

    #[test]
    fn test_render_flat_list_data_mode() {
        let list = Uuid::new_v4();
        let model = model_of(vec![
            bulleted("a", Uuid::new_v4(), 0, list),
            bulleted("b", Uuid::new_v4(), 0, list),
        ]);
        let (view, _) = render_document(&model, RenderMode::Data);
        assert_eq!(view.to_html(), "<ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn test_render_nested_list() {
        let list = Uuid::new_v4();
        let nested = Uuid::new_v4();
        let model = model_of(vec![
            bulleted("a", Uuid::new_v4(), 0, list),
            bulleted("b", Uuid::new_v4(), 1, nested),
        ]);
        let (view, _) = render_document(&model, RenderMode::Data);
        assert_eq!(view.to_html(), "<ul><li>a<ul><li>b</li></ul></li></ul>");
    }

    #[test]
    fn test_render_mixed_types_nested() {
        let model = model_of(vec![
            bulleted("a", Uuid::new_v4(), 0, Uuid::new_v4()),
            Block::paragraph("n").with_list_attrs(
                Uuid::new_v4(),
                1,
                ListType::Numbered,
                Uuid::new_v4(),
            ),
        ]);
        let (view, _) = render_document(&model, RenderMode::Data);
        assert_eq!(view.to_html(), "<ul><li>a<ol><li>n</li></ol></li></ul>");
    }

    #[test]
    fn test_multi_block_item_renders_real_paragraphs() {
        let item = Uuid::new_v4();
        let list = Uuid::new_v4();
        let model = model_of(vec![
            bulleted("x", item, 0, list),
            bulleted("y", item, 0, list),
        ]);
        let (view, _) = render_document(&model, RenderMode::Data);
        assert_eq!(view.to_html(), "<ul><li><p>x</p><p>y</p></li></ul>");
    }

    #[test]
    fn test_editing_mode_keeps_bogus_marker() {
        let model = model_of(vec![bulleted("a", Uuid::new_v4(), 0, Uuid::new_v4())]);
        let (view, mapper) = render_document(&model, RenderMode::Editing);
        let element = mapper.to_view(model.block(0).unwrap().id()).unwrap();
        assert_eq!(view.kind(element), &ViewKind::Bogus);
        // The marker itself never serializes.
        assert_eq!(view.to_html(), "<ul><li>a</li></ul>");
    }

    #[test]
    fn test_foreign_attribute_forces_real_paragraph() {
        let block = bulleted("a", Uuid::new_v4(), 0, Uuid::new_v4())
            .with_attr("alignment", AttrValue::Str("right".into()));
        let model = model_of(vec![block]);
        let (view, _) = render_document(&model, RenderMode::Data);
        assert_eq!(view.to_html(), "<ul><li><p>a</p></li></ul>");
    }

    #[test]
    fn test_heading_block_in_list_keeps_its_container() {
        let block = Block::new(BlockKind::Heading { level: 2 }, "t").with_list_attrs(
            Uuid::new_v4(),
            0,
            ListType::Bulleted,
            Uuid::new_v4(),
        );
        let model = model_of(vec![block]);
        let (view, _) = render_document(&model, RenderMode::Data);
        assert_eq!(view.to_html(), "<ul><li><h2>t</h2></li></ul>");
    }

    #[test]
    fn test_non_list_block_renders_unwrapped() {
        let model = model_of(vec![Block::paragraph("plain")]);
        let (view, _) = render_document(&model, RenderMode::Data);
        assert_eq!(view.to_html(), "<p>plain</p>");
    }

    #[test]
    fn test_refresh_block_replaces_stale_wrapping() {
        let item = Uuid::new_v4();
        let mut model = model_of(vec![bulleted("a", item, 0, Uuid::new_v4())]);
        let (mut view, mut mapper) = render_document(&model, RenderMode::Editing);

        // Turn the sole item into a numbered one and refresh.
        let mut txn = Transaction::new(&mut model);
        txn.set_attr(0, crate::model::LIST_TYPE, AttrValue::Type(ListType::Numbered));
        txn.into_log();
        refresh_block(&model, 0, &mut view, &mut mapper);

        assert_eq!(view.to_html(), "<ol><li>a</li></ol>");
    }

    #[test]
    fn test_refresh_unrendered_block_inserts_it() {
        let list = Uuid::new_v4();
        let first = bulleted("a", Uuid::new_v4(), 0, list);
        let second = bulleted("b", Uuid::new_v4(), 0, list);
        let model = model_of(vec![first, second]);

        // Render only the first block, then refresh the second into place.
        let partial = model_of(vec![model.block(0).unwrap().clone()]);
        let (mut view, mut mapper) = render_document(&partial, RenderMode::Editing);
        refresh_block(&model, 1, &mut view, &mut mapper);

        assert_eq!(view.to_html(), "<ul><li>a</li><li>b</li></ul>");
    }
}
