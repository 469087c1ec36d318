//! # Purge View
//!
//! Purge may discard the undo of a transaction once every open read view
//! sees that transaction's changes. The purge view is the horizon that
//! encodes this: a copy of the oldest open read view, advanced from time to
//! time by the purge coordinator.
//!
//! The view is kept behind an `RwLock`. Anything that reasons about "has
//! purge possibly removed this undo?" must hold a `PurgeLatch` for the whole
//! decision so the horizon cannot move under it. Callers that also hold a
//! page latch take it first, then the purge latch.

use super::read_view::ReadView;
use super::transaction::TrxSys;
use super::TrxId;
use log::debug;
use parking_lot::{RwLock, RwLockReadGuard};

pub struct PurgeSys {
    view: RwLock<ReadView>,
}

/// Shared latch on the purge view.
pub struct PurgeLatch<'a> {
    view: RwLockReadGuard<'a, ReadView>,
}

impl Default for PurgeSys {
    fn default() -> Self {
        Self::new()
    }
}

impl PurgeSys {
    /// Purge system whose horizon sees nothing yet.
    pub fn new() -> Self {
        Self {
            view: RwLock::new(ReadView::empty()),
        }
    }

    pub fn latch(&self) -> PurgeLatch<'_> {
        PurgeLatch {
            view: self.view.read(),
        }
    }

    /// Moves the horizon up to the oldest read view still open in `trx_sys`.
    pub fn advance(&self, trx_sys: &TrxSys) {
        let oldest = trx_sys.clone_oldest_view();
        let mut view = self.view.write();
        debug!(
            "purge view advanced: [{}, {}) -> [{}, {})",
            view.up_limit(),
            view.low_limit(),
            oldest.up_limit(),
            oldest.low_limit()
        );
        *view = oldest;
    }
}

impl PurgeLatch<'_> {
    pub fn changes_visible(&self, trx_id: TrxId, table_name: &str) -> bool {
        self.view.changes_visible(trx_id, table_name)
    }

    pub fn view(&self) -> &ReadView {
        &self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizon_follows_oldest_open_view() {
        let trx_sys = TrxSys::new();
        let purge = PurgeSys::new();

        let t1 = trx_sys.begin();
        trx_sys.commit(t1.id()).unwrap();
        assert!(!purge.latch().changes_visible(t1.id(), "t"));

        let t2 = trx_sys.begin();
        let view = trx_sys.open_read_view(None);
        trx_sys.commit(t2.id()).unwrap();

        purge.advance(&trx_sys);
        assert!(purge.latch().changes_visible(t1.id(), "t"));
        assert!(!purge.latch().changes_visible(t2.id(), "t"));

        drop(view);
        purge.advance(&trx_sys);
        assert!(purge.latch().changes_visible(t2.id(), "t"));
    }
}
