//! # Implicit-Lock Detection
//!
//! A transaction that modifies a row holds an implicit exclusive lock on the
//! clustered record and on every secondary record its change touched. There
//! is no lock-table entry for it; it is inferred from the history. Before a
//! lock request on a secondary record can wait, the lock manager asks: is
//! the transaction that last wrote the clustered row still active, and did
//! it author the current state of this secondary record?
//!
//! ## Relation of a Version to the Secondary Record
//!
//! A version *matches* `sec_rec` when it is not delete-marked and the entry
//! it produces equals `sec_rec`, first under the index collation and then
//! byte for byte (`'abc'` -> `'ABC'` changes the requirement on the
//! secondary record even though the two sort equal).
//!
//! ## Search
//!
//! ```text
//! trx T wrote clust_rec, T active?  ── no ──> no lock
//!        │ yes
//!        ▼
//! looking_for_match = !matches(current)   (undecidable: sec_rec delete-marked?)
//!        │
//!        ▼
//! for each predecessor p:
//!     matches(p) == looking_for_match  ──> T changed the relation: lock held
//!     p written by another trx         ──> T never touched sec_rec: no lock
//!        │
//!        ▼
//! chain ends inside T: lock held iff !looking_for_match
//! ```
//!
//! A predecessor whose relation cannot be decided (virtual column value
//! missing) is passed over: an undo record that logged no virtual values
//! changed no indexed column, so the relation did not change there.
//!
//! A transaction id that fails the sanity check is logged and treated as no
//! lock, so a corrupt record never blocks progress. Debug builds assert.

use super::matcher::{matches, matches_binary, MatchResult};
use super::walker::{StopDecision, WalkOutcome};
use super::{BuildMode, RowVers};
use crate::error::VersionError;
use crate::mvcc::{TrxHandle, UndoStore};
use crate::record::RecordView;
use crate::row::{decode_row, IndexEntry, VirtualRow};
use crate::schema::{IndexDef, TableDef, VirtualEvaluator};
use crate::storage::ExternStore;
use log::{debug, error};

impl<'a, U: UndoStore, X: ExternStore, E: VirtualEvaluator> RowVers<'a, U, X, E> {
    /// Active transaction holding an implicit lock on `sec_rec`, a record of
    /// `index` pointing at the clustered record `clust_rec`.
    pub fn implicit_lock(
        &self,
        table: &TableDef,
        clust_rec: &[u8],
        index: &IndexDef,
        sec_rec: &[u8],
    ) -> Result<Option<TrxHandle>, VersionError> {
        let trx_id = RecordView::new(clust_rec)?.trx_id();
        if !self.trx_sys.sanity_check(trx_id, table.name()) {
            return Ok(None);
        }
        let Some(trx) = self.trx_sys.is_active(trx_id) else {
            return Ok(None);
        };

        let sec = RecordView::new(sec_rec)?;
        let sec_entry = IndexEntry::from_record(&sec)?;

        let relation = |v: &RecordView<'_>,
                        vrow: Option<&VirtualRow>|
         -> Result<Option<bool>, VersionError> {
            if v.is_delete_marked() {
                return Ok(Some(false));
            }
            let row = decode_row(v, table, self.ext)?;
            Ok(match matches(index, &row, vrow, &sec_entry) {
                MatchResult::Match => {
                    Some(matches_binary(index, &row, vrow, &sec_entry) == MatchResult::Match)
                }
                MatchResult::Mismatch => Some(false),
                MatchResult::Undecidable => None,
            })
        };

        let mut walker = self.walker(table, clust_rec, BuildMode::Read, index.has_virtual())?;
        let looking_for_match = {
            let current = walker.current_view()?;
            match relation(&current, walker.current_vrow())? {
                Some(rel) => !rel,
                None => sec.is_delete_marked(),
            }
        };

        let outcome = walker.walk(|v, vrow| {
            if relation(v, vrow)? == Some(looking_for_match) {
                return Ok(StopDecision::Accept);
            }
            if v.trx_id() != trx_id {
                return Ok(StopDecision::NoMoreHistory);
            }
            Ok(StopDecision::Continue)
        })?;

        let holds = match outcome {
            WalkOutcome::Accepted => true,
            WalkOutcome::Stopped => false,
            WalkOutcome::Exhausted => !looking_for_match,
            WalkOutcome::HistoryMissing => {
                error!(
                    "undo of active trx {} on '{}' is missing after {} steps",
                    trx_id,
                    table.name(),
                    walker.steps()
                );
                !looking_for_match
            }
        };
        debug!(
            "trx {} {} an implicit lock on a record of '{}'",
            trx_id,
            if holds { "holds" } else { "does not hold" },
            index.name()
        );
        Ok(holds.then_some(trx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mvcc::{MvccTable, PurgeSys, TrxSys, UndoField, UndoKind, UndoLog, UndoRecord};
    use crate::record::{build_record, RecordHeader, RollPtr};
    use crate::schema::{ColumnDef, ExprEvaluator, IndexField};
    use crate::storage::MemoryExternStore;
    use crate::types::{Collation, DataType, OwnedValue, Value};

    struct Fixture {
        table: TableDef,
        trx_sys: TrxSys,
        purge: PurgeSys,
        log: UndoLog,
        ext: MemoryExternStore,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                table: TableDef::new(
                    1,
                    "l",
                    vec![
                        ColumnDef::new("id", DataType::Int8),
                        ColumnDef::new("b", DataType::Text),
                        ColumnDef::new("note", DataType::Text),
                    ],
                )
                .with_index(IndexDef::new(
                    "idx_b",
                    vec![IndexField::stored(1).with_collation(Collation::CaseInsensitive)],
                )),
                trx_sys: TrxSys::new(),
                purge: PurgeSys::new(),
                log: UndoLog::new(),
                ext: MemoryExternStore::new(),
            }
        }

        fn mvcc(&self) -> MvccTable<'_, MemoryExternStore, ExprEvaluator> {
            MvccTable::new(&self.table, &self.log, &self.ext, &ExprEvaluator)
        }

        fn lock_holder(&self, clust: &[u8], b: &str, marked: bool) -> Option<u64> {
            let vers = RowVers::new(&self.trx_sys, &self.purge, &self.log, &self.ext, &ExprEvaluator);
            let sec = IndexEntry::new(vec![OwnedValue::text(b), OwnedValue::Int(1)])
                .delete_marked(marked)
                .to_record();
            vers.implicit_lock(&self.table, clust, self.table.index("idx_b").unwrap(), &sec)
                .unwrap()
                .map(|trx| trx.id())
        }

        /// Row (1, "abc", "n") inserted and committed by its own transaction.
        fn committed_row(&self) -> Vec<u8> {
            let trx = self.trx_sys.begin();
            let rec = self
                .mvcc()
                .insert(&trx, &[OwnedValue::Int(1), "abc".into(), "n".into()])
                .unwrap();
            self.trx_sys.commit(trx.id()).unwrap();
            rec
        }
    }

    #[test]
    fn committed_writer_holds_no_lock() {
        let f = Fixture::new();
        let rec = f.committed_row();
        assert_eq!(f.lock_holder(&rec, "abc", false), None);
    }

    #[test]
    fn fresh_insert_locks_its_entry() {
        let f = Fixture::new();
        let trx = f.trx_sys.begin();
        let rec = f
            .mvcc()
            .insert(&trx, &[OwnedValue::Int(1), "abc".into(), "n".into()])
            .unwrap();
        assert_eq!(f.lock_holder(&rec, "abc", false), Some(trx.id()));
    }

    #[test]
    fn update_of_indexed_column_locks_old_and_new_entries() {
        let f = Fixture::new();
        let v1 = f.committed_row();
        let trx = f.trx_sys.begin();
        let v2 = f.mvcc().update(&trx, &v1, &[(1, "xyz".into())]).unwrap();

        assert_eq!(f.lock_holder(&v2, "abc", false), Some(trx.id()));
        assert_eq!(f.lock_holder(&v2, "abc", true), Some(trx.id()));
        assert_eq!(f.lock_holder(&v2, "xyz", false), Some(trx.id()));
    }

    #[test]
    fn update_of_other_columns_leaves_entry_unlocked() {
        let f = Fixture::new();
        let v1 = f.committed_row();
        let trx = f.trx_sys.begin();
        let v2 = f.mvcc().update(&trx, &v1, &[(2, "m".into())]).unwrap();
        assert_eq!(f.lock_holder(&v2, "abc", false), None);
    }

    #[test]
    fn case_only_change_counts_as_a_change() {
        let f = Fixture::new();
        let v1 = f.committed_row();
        let trx = f.trx_sys.begin();
        let v2 = f.mvcc().update(&trx, &v1, &[(1, "ABC".into())]).unwrap();
        assert_eq!(f.lock_holder(&v2, "abc", false), Some(trx.id()));
    }

    #[test]
    fn future_trx_id_is_no_lock() {
        let f = Fixture::new();
        let rec = build_record(
            RecordHeader::new(999, RollPtr::update(1)),
            &[Value::Int(1), Value::Text("abc".into()), Value::Text("n".into())],
        );
        assert_eq!(f.lock_holder(&rec, "abc", false), None);
    }

    #[test]
    fn int_to_float_rewrite_is_a_change() {
        let table = TableDef::new(
            4,
            "n",
            vec![
                ColumnDef::new("id", DataType::Int8),
                ColumnDef::new("b", DataType::Int8),
            ],
        )
        .with_index(IndexDef::new("idx_b", vec![IndexField::stored(1)]));
        let (trx_sys, purge, log, ext) =
            (TrxSys::new(), PurgeSys::new(), UndoLog::new(), MemoryExternStore::new());

        let t1 = trx_sys.begin();
        let v1 = MvccTable::new(&table, &log, &ext, &ExprEvaluator)
            .insert(&t1, &[OwnedValue::Int(1), OwnedValue::Int(2)])
            .unwrap();
        trx_sys.commit(t1.id()).unwrap();

        // b = 2 rewritten as 2.0 by a writer that skips the type check
        let t2 = trx_sys.begin();
        let undo_no = log.allocate_undo_no();
        let mut undo = UndoRecord::new(UndoKind::Update, table.id(), undo_no, t2.id());
        undo.old_trx_id = t1.id();
        undo.old_roll_ptr = RecordView::new(&v1).unwrap().roll_ptr();
        undo.no_ord_change = false;
        undo.update.push(UndoField {
            field_no: 1,
            old: Value::Int(2),
        });
        log.append(undo_no, t2.id(), table.name(), undo.to_bytes());
        let v2 = build_record(
            RecordHeader::new(t2.id(), RollPtr::update(undo_no)),
            &[Value::Int(1), Value::Float(2.0)],
        );

        let sec = IndexEntry::new(vec![OwnedValue::Int(2), OwnedValue::Int(1)]).to_record();
        let vers = RowVers::new(&trx_sys, &purge, &log, &ext, &ExprEvaluator);
        let holder = vers
            .implicit_lock(&table, &v2, table.index("idx_b").unwrap(), &sec)
            .unwrap();
        assert_eq!(holder.map(|trx| trx.id()), Some(t2.id()));
    }
}
