//! The editing session: owns the model, the rendered view and the mapper,
//! and enforces the mutation protocol: all edits inside an exclusive scoped
//! transaction, reconciliation strictly after the transaction and strictly
//! before any further mutation.

use crate::conversion::reconcile::reconcile;
use crate::conversion::upcast::{ConsumptionTracker, convert_fragment};
use crate::conversion::{ReconcileReport, RenderMode, downcast};
use crate::model::{Change, Model, Transaction};
use crate::view::{Mapper, ViewTree};

/// A single-threaded editing session over one document.
///
/// The model is mutated only through [`Engine::change`]; the view is derived
/// and written only by the converters driven from here.
#[derive(Default)]
pub struct Engine {
    model: Model,
    view: ViewTree,
    mapper: Mapper,
    in_change: bool,
    reconciling: bool,
    last_report: ReconcileReport,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn view(&self) -> &ViewTree {
        &self.view
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    /// Blocks refreshed by the most recent transaction.
    pub fn last_reconcile(&self) -> &ReconcileReport {
        &self.last_report
    }

    /// Runs `f` inside an exclusive transaction. The change log is flushed
    /// when `f` returns, on every exit path, and the reconciliation pass
    /// runs immediately afterwards, before this method returns.
    ///
    /// Re-entrant invocation (from inside a transaction or from inside
    /// reconciliation) is a contract violation.
    pub fn change<R>(&mut self, f: impl FnOnce(&mut Transaction<'_>) -> R) -> R {
        assert!(!self.in_change, "re-entrant model transaction");
        assert!(
            !self.reconciling,
            "model mutation started during reconciliation"
        );

        self.in_change = true;
        let mut txn = Transaction::new(&mut self.model);
        let result = f(&mut txn);
        let log = txn.into_log();
        self.in_change = false;
        self.model.bump_version();

        self.reconciling = true;
        self.patch_content(&log);
        self.last_report = reconcile(&self.model, &mut self.view, &mut self.mapper, &log);
        self.reconciling = false;

        result
    }

    /// Inline content edits never go through the refresh machinery; the
    /// mapped element's text is patched in place.
    fn patch_content(&mut self, log: &[Change]) {
        for change in log {
            if let Change::Content { index } = change {
                let block = &self.model.blocks()[*index];
                if let Some(element) = self.mapper.to_view(block.id()) {
                    self.view.set_text(element, block.content());
                }
            }
        }
    }

    /// Imports an external container tree: cleanup, upcast, and insertion of
    /// the resulting blocks at the end of the document. Returns how many
    /// blocks were created.
    pub fn load(&mut self, mut input: ViewTree) -> usize {
        let mut tracker = ConsumptionTracker::new();
        let blocks = convert_fragment(&mut input, &mut tracker);
        let count = blocks.len();
        log::debug!("load: {} block(s) upcast from external tree", count);
        self.change(|txn| {
            for block in blocks {
                txn.push_block(block);
            }
        });
        count
    }

    /// Renders the document from scratch for final output; inline
    /// pass-through markers do not survive this mode.
    pub fn render_data(&self) -> ViewTree {
        let (view, _mapper) = downcast::render_document(&self.model, RenderMode::Data);
        view
    }

    /// Serialized form of the data rendering.
    pub fn to_html(&self) -> String {
        self.render_data().to_html()
    }
}
