//! Sibling lookup over the block sequence by indent relation.
//!
//! A walker starts from a reference block and yields indices of list blocks
//! related to it by indent: same level, the nearest shallower level (the
//! structural parent direction), or deeper levels. The scan never crosses a
//! non-list block, and a shallower block closes the scope unless shallower
//! blocks are what is being looked for.

use uuid::Uuid;

use crate::model::Block;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkDirection {
    Forward,
    #[default]
    Backward,
}

/// What the walker should yield relative to the reference block's indent.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkerOptions {
    pub direction: WalkDirection,
    /// Yield the reference block itself first.
    pub include_self: bool,
    /// Yield blocks at the same indent.
    pub same_indent: bool,
    /// Yield blocks at a smaller indent (otherwise a smaller indent ends the
    /// walk).
    pub smaller_indent: bool,
    /// Yield blocks at a bigger indent (otherwise they are skipped).
    pub bigger_indent: bool,
    /// Restrict same-indent matches to the reference block's item; a
    /// same-indent block of another item ends the walk.
    pub same_item_id: bool,
}

pub struct ListWalker<'a> {
    blocks: &'a [Block],
    pos: Option<usize>,
    reference_indent: u32,
    reference_item: Option<Uuid>,
    opts: WalkerOptions,
}

impl<'a> ListWalker<'a> {
    pub fn new(blocks: &'a [Block], start: usize, opts: WalkerOptions) -> Self {
        let reference = &blocks[start];
        let pos = if opts.include_self {
            Some(start)
        } else {
            Self::step(blocks, start, opts.direction)
        };
        Self {
            blocks,
            pos,
            reference_indent: reference.list_indent().unwrap_or(0),
            reference_item: reference.list_item_id(),
            opts,
        }
    }

    /// First matching sibling, or `None`.
    pub fn first(blocks: &'a [Block], start: usize, opts: WalkerOptions) -> Option<usize> {
        Self::new(blocks, start, opts).next()
    }

    fn step(blocks: &[Block], from: usize, direction: WalkDirection) -> Option<usize> {
        match direction {
            WalkDirection::Forward => {
                let next = from + 1;
                (next < blocks.len()).then_some(next)
            }
            WalkDirection::Backward => from.checked_sub(1),
        }
    }
}

impl Iterator for ListWalker<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while let Some(i) = self.pos {
            self.pos = Self::step(self.blocks, i, self.opts.direction);

            let block = &self.blocks[i];
            if !block.is_list_block() {
                break;
            }
            let indent = block
                .list_indent()
                .expect("list block without listIndent attribute");

            if indent > self.reference_indent {
                if !self.opts.bigger_indent {
                    continue;
                }
            } else if indent < self.reference_indent {
                if !self.opts.smaller_indent {
                    break;
                }
            } else {
                if !self.opts.same_indent {
                    if self.opts.smaller_indent {
                        continue;
                    }
                    break;
                }
                if self.opts.same_item_id && block.list_item_id() != self.reference_item {
                    break;
                }
            }
            return Some(i);
        }
        self.pos = None;
        None
    }
}
