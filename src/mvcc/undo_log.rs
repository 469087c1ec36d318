//! # Undo Log
//!
//! The version engine reads undo through the [`UndoStore`] trait: given a
//! roll pointer, copy the undo record bytes into a caller buffer, or report
//! that the record no longer exists because purge removed it.
//!
//! `UndoLog` is the in-memory store used by the version producer, the tests
//! and the benches. Records are indexed by undo number and remember the
//! transaction that wrote them so that [`UndoLog::purge`] can drop the undo
//! of every transaction the purge view already sees.
//!
//! ## Purge Contract
//!
//! The undo written by transaction T rebuilds the version *before* T's
//! change. Once the purge view sees T, every open read view sees T too and
//! nobody needs that older version any more. Removing it is safe for
//! correct readers; a reader that still asks for it gets `Ok(false)`, which
//! the builder reports as missing history.

use super::purge::PurgeLatch;
use super::TrxId;
use crate::record::RollPtr;
use eyre::Result;
use hashbrown::HashMap;
use log::debug;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of undo record bytes.
pub trait UndoStore {
    /// Copies the record at `roll_ptr` into `out` (cleared first). Returns
    /// `Ok(false)` when the record has been purged.
    fn read_undo(&self, roll_ptr: RollPtr, out: &mut Vec<u8>) -> Result<bool>;
}

impl<T: UndoStore + ?Sized> UndoStore for &T {
    fn read_undo(&self, roll_ptr: RollPtr, out: &mut Vec<u8>) -> Result<bool> {
        (**self).read_undo(roll_ptr, out)
    }
}

struct StoredUndo {
    trx_id: TrxId,
    table_name: String,
    bytes: Vec<u8>,
}

pub struct UndoLog {
    records: RwLock<HashMap<u64, StoredUndo>>,
    next_undo_no: AtomicU64,
}

impl Default for UndoLog {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoLog {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            next_undo_no: AtomicU64::new(1),
        }
    }

    pub fn allocate_undo_no(&self) -> u64 {
        self.next_undo_no.fetch_add(1, Ordering::Relaxed)
    }

    pub fn append(&self, undo_no: u64, trx_id: TrxId, table_name: &str, bytes: Vec<u8>) {
        self.records.write().insert(
            undo_no,
            StoredUndo {
                trx_id,
                table_name: table_name.to_string(),
                bytes,
            },
        );
    }

    pub fn contains(&self, undo_no: u64) -> bool {
        self.records.read().contains_key(&undo_no)
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Removes a single record, as if purged.
    pub fn remove(&self, undo_no: u64) -> bool {
        self.records.write().remove(&undo_no).is_some()
    }

    /// Drops the undo of every transaction visible to the purge view.
    /// Returns the number of records removed.
    pub fn purge(&self, latch: &PurgeLatch<'_>) -> usize {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|_, undo| !latch.changes_visible(undo.trx_id, &undo.table_name));
        let removed = before - records.len();
        debug!("purged {} undo records, {} left", removed, records.len());
        removed
    }
}

impl UndoStore for UndoLog {
    fn read_undo(&self, roll_ptr: RollPtr, out: &mut Vec<u8>) -> Result<bool> {
        out.clear();
        match self.records.read().get(&roll_ptr.undo_no()) {
            Some(undo) => {
                out.extend_from_slice(&undo.bytes);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mvcc::{PurgeSys, TrxSys};

    #[test]
    fn read_undo_copies_into_buffer() {
        let log = UndoLog::new();
        let no = log.allocate_undo_no();
        log.append(no, 5, "t", vec![1, 2, 3]);

        let mut buf = vec![9, 9];
        assert!(log.read_undo(RollPtr::update(no), &mut buf).unwrap());
        assert_eq!(buf, vec![1, 2, 3]);

        assert!(!log.read_undo(RollPtr::update(no + 1), &mut buf).unwrap());
        assert!(buf.is_empty());
    }

    #[test]
    fn purge_drops_only_visible_transactions() {
        let trx_sys = TrxSys::new();
        let purge = PurgeSys::new();
        let log = UndoLog::new();

        let t1 = trx_sys.begin();
        let t2 = trx_sys.begin();
        let a = log.allocate_undo_no();
        log.append(a, t1.id(), "t", vec![0]);
        let b = log.allocate_undo_no();
        log.append(b, t2.id(), "t", vec![0]);

        trx_sys.commit(t1.id()).unwrap();
        purge.advance(&trx_sys);

        assert_eq!(log.purge(&purge.latch()), 1);
        assert!(!log.contains(a));
        assert!(log.contains(b));
    }
}
