//! # Read Views
//!
//! A `ReadView` is a snapshot boundary. It is taken from the transaction
//! table and answers one question: were the changes of transaction `id`
//! committed as far as this snapshot is concerned?
//!
//! ## Visibility Rules
//!
//! ```text
//! id == creator           -> visible (own changes)
//! id <  up_limit          -> visible (committed before every active trx)
//! id >= low_limit         -> invisible (started after the snapshot)
//! id in active            -> invisible (uncommitted at snapshot time)
//! otherwise               -> visible
//! ```
//!
//! `up_limit` is the smallest id active at snapshot time (or `low_limit`
//! when none were active) and `low_limit` is the next id the transaction
//! table would have assigned. Transaction id 0 is reserved for bootstrapped
//! rows and is visible to every view.
//!
//! A view is immutable once created. The version engine only reads it.

use super::TrxId;
use log::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadView {
    creator: Option<TrxId>,
    up_limit: TrxId,
    low_limit: TrxId,
    active: Vec<TrxId>,
}

impl ReadView {
    /// Builds a view from the ids active at snapshot time. `active` need not
    /// be sorted and may contain the creator.
    pub fn new(creator: Option<TrxId>, mut active: Vec<TrxId>, low_limit: TrxId) -> Self {
        active.retain(|id| Some(*id) != creator);
        active.sort_unstable();
        active.dedup();
        let up_limit = active.first().copied().unwrap_or(low_limit);
        Self {
            creator,
            up_limit,
            low_limit,
            active,
        }
    }

    /// View that sees nothing but bootstrapped rows.
    pub fn empty() -> Self {
        Self::new(None, Vec::new(), 1)
    }

    pub fn creator(&self) -> Option<TrxId> {
        self.creator
    }

    pub fn up_limit(&self) -> TrxId {
        self.up_limit
    }

    pub fn low_limit(&self) -> TrxId {
        self.low_limit
    }

    pub fn active_ids(&self) -> &[TrxId] {
        &self.active
    }

    pub fn changes_visible(&self, trx_id: TrxId, table_name: &str) -> bool {
        let visible = if trx_id == 0 || Some(trx_id) == self.creator || trx_id < self.up_limit {
            true
        } else if trx_id >= self.low_limit {
            false
        } else {
            self.active.binary_search(&trx_id).is_err()
        };
        trace!(
            "read view [{}, {}) on '{}': trx {} visible={}",
            self.up_limit,
            self.low_limit,
            table_name,
            trx_id,
            visible
        );
        visible
    }

    /// Same snapshot with the creator's own changes treated as uncommitted.
    pub fn without_creator(&self) -> ReadView {
        let mut active = self.active.clone();
        active.extend(self.creator);
        ReadView::new(None, active, self.low_limit)
    }
}
