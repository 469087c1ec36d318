//! # Transaction Table
//!
//! `TrxSys` assigns transaction ids, tracks which transactions are active and
//! hands out read views. The version engine consults it for two things:
//!
//! - "is transaction X active right now?" (semi-consistent reads, implicit
//!   lock detection). The answer is a reference-counted `TrxHandle` so the
//!   caller can keep using the transaction after the table lock is released,
//!   e.g. to enqueue a lock wait.
//! - "is this transaction id plausible?" (`sanity_check`), used to diagnose
//!   corrupted records.
//!
//! ## Transaction Lifecycle
//!
//! ```text
//! begin() ─────> Active ─────> commit() ─────────> Committed
//!                  │
//!                  └──> rollback_finish() ───────> RolledBack
//! ```
//!
//! A transaction being rolled back stays Active until its rollback has
//! finished, so readers never mistake a half-undone row for committed data.
//!
//! ## Invariants
//!
//! 1. Ids are assigned from a monotonically increasing counter starting at 1
//! 2. Id 0 is reserved for bootstrapped rows
//! 3. Every id below `max_trx_id()` has been assigned
//! 4. Read views are snapshots: they never change after creation

use super::read_view::ReadView;
use super::TrxId;
use eyre::{bail, Result};
use hashbrown::HashMap;
use log::{debug, error};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrxState {
    #[default]
    Active,
    Committed,
    RolledBack,
}

#[derive(Debug)]
pub struct Trx {
    id: TrxId,
    state: Mutex<TrxState>,
}

impl Trx {
    pub fn id(&self) -> TrxId {
        self.id
    }

    pub fn state(&self) -> TrxState {
        *self.state.lock()
    }
}

/// Shared handle to a transaction, valid after it leaves the active set.
pub type TrxHandle = Arc<Trx>;

pub struct TrxSys {
    next_id: AtomicU64,
    active: RwLock<HashMap<TrxId, TrxHandle>>,
    views: Mutex<Vec<Weak<ReadView>>>,
}

impl Default for TrxSys {
    fn default() -> Self {
        Self::new()
    }
}

impl TrxSys {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            active: RwLock::new(HashMap::new()),
            views: Mutex::new(Vec::new()),
        }
    }

    pub fn begin(&self) -> TrxHandle {
        let mut active = self.active.write();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let trx = Arc::new(Trx {
            id,
            state: Mutex::new(TrxState::Active),
        });
        active.insert(id, Arc::clone(&trx));
        debug!("trx {} started", id);
        trx
    }

    pub fn commit(&self, trx_id: TrxId) -> Result<()> {
        self.finish(trx_id, TrxState::Committed)
    }

    /// Marks the end of a rollback. Until this call the transaction is
    /// still reported active.
    pub fn rollback_finish(&self, trx_id: TrxId) -> Result<()> {
        self.finish(trx_id, TrxState::RolledBack)
    }

    fn finish(&self, trx_id: TrxId, state: TrxState) -> Result<()> {
        let Some(trx) = self.active.write().remove(&trx_id) else {
            bail!("trx {} is not active", trx_id);
        };
        *trx.state.lock() = state;
        debug!("trx {} finished: {:?}", trx_id, state);
        Ok(())
    }

    pub fn is_active(&self, trx_id: TrxId) -> Option<TrxHandle> {
        self.active.read().get(&trx_id).cloned()
    }

    pub fn is_active_id(&self, trx_id: TrxId) -> bool {
        self.active.read().contains_key(&trx_id)
    }

    /// Next id to be assigned. Every id below it has been handed out.
    pub fn max_trx_id(&self) -> TrxId {
        self.next_id.load(Ordering::SeqCst)
    }

    /// Checks that `trx_id` found on a record of `table_name` could have been
    /// assigned. Logs and returns false for ids from the future; debug builds
    /// outside this crate's unit tests also assert.
    pub fn sanity_check(&self, trx_id: TrxId, table_name: &str) -> bool {
        let max = self.max_trx_id();
        if trx_id >= max {
            error!(
                "transaction id {} on a record of table '{}' is in the future (max assigned {})",
                trx_id,
                table_name,
                max.saturating_sub(1)
            );
            debug_assert!(
                cfg!(test),
                "transaction id {} on a record of table '{}' is in the future",
                trx_id,
                table_name
            );
            return false;
        }
        true
    }

    /// Takes a snapshot. The view stays registered (for purge) while any
    /// clone of the returned `Arc` is alive.
    pub fn open_read_view(&self, creator: Option<TrxId>) -> Arc<ReadView> {
        let view = {
            let active = self.active.read();
            let low_limit = self.max_trx_id();
            Arc::new(ReadView::new(
                creator,
                active.keys().copied().collect(),
                low_limit,
            ))
        };
        let mut views = self.views.lock();
        views.retain(|w| w.strong_count() > 0);
        views.push(Arc::downgrade(&view));
        view
    }

    /// Copy of the oldest open view, or a fresh snapshot when none is open.
    /// Nothing visible to the result is invisible to any open view.
    pub fn clone_oldest_view(&self) -> ReadView {
        let oldest = {
            let mut views = self.views.lock();
            views.retain(|w| w.strong_count() > 0);
            views
                .iter()
                .filter_map(Weak::upgrade)
                .min_by_key(|v| (v.low_limit(), v.up_limit()))
        };
        match oldest {
            Some(view) => view.without_creator(),
            None => {
                let active = self.active.read();
                ReadView::new(None, active.keys().copied().collect(), self.max_trx_id())
            }
        }
    }
}
