//! # Version-Chain Walker
//!
//! Walks a row's history from its current clustered record backwards, one
//! [`VersionBuilder`] step at a time, until a caller predicate accepts a
//! version or the chain ends.
//!
//! ## Double Buffering
//!
//! ```text
//!            step n                         step n+1
//!  cur  [ version n   ]  ──build──>  prev [ version n+1 ]
//!                                      │ swap
//!  cur  [ version n+1 ]  <─────────────┘     prev [ reused ]
//! ```
//!
//! Only the version under inspection and its freshly built predecessor are
//! alive. Both buffers keep their capacity, so a long walk allocates once.
//!
//! ## Virtual Rows
//!
//! When virtual columns are wanted, the walker keeps the virtual row of the
//! version under inspection:
//!
//! - the starting version is evaluated from its own base columns; values it
//!   cannot compute are filled from the `new` values later undo records log
//! - a predecessor takes the `old` values its undo record logged, then the
//!   successor's values for everything the record did not log (an undo
//!   record that logged nothing changed no indexed column)
//! - an insert version has never been logged, so whatever is still missing
//!   is evaluated from its base columns
//!
//! ## Termination
//!
//! Every step moves to a strictly smaller undo number (the builder rejects
//! anything else as corrupt), so a walk ends after at most as many steps as
//! there are undo records.

use super::builder::{BuildOutcome, VersionBuilder};
use super::vcol::{fill_missing, materialize};
use super::BuildMode;
use crate::config::VERSION_BUFFER_CAPACITY;
use crate::error::VersionError;
use crate::mvcc::UndoStore;
use crate::record::RecordView;
use crate::row::{decode_row, VirtualRow};
use crate::schema::{TableDef, VirtualEvaluator};
use crate::storage::ExternStore;
use log::debug;

/// What a walk predicate decides about the version it was shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopDecision {
    Accept,
    Continue,
    NoMoreHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The predecessor is now the current version.
    Built,
    /// The current version has no predecessor to build.
    NoPredecessor,
    /// The current version's undo is gone.
    HistoryMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    /// The predicate accepted the current version.
    Accepted,
    /// The chain ended before any version was accepted.
    Exhausted,
    /// The predicate answered `NoMoreHistory`.
    Stopped,
    /// Undo needed to go further back is gone. The current version is the
    /// last one that could be built.
    HistoryMissing,
}

pub struct VersionWalker<'a, U, X, E> {
    table: &'a TableDef,
    ext: &'a X,
    eval: &'a E,
    builder: VersionBuilder<'a, U>,
    mode: BuildMode<'a>,
    want_virtual: bool,
    cur: Vec<u8>,
    prev: Vec<u8>,
    vrow: Option<VirtualRow>,
    steps: usize,
}

impl<'a, U: UndoStore, X: ExternStore, E: VirtualEvaluator> VersionWalker<'a, U, X, E> {
    pub fn new(
        table: &'a TableDef,
        undo: &'a U,
        ext: &'a X,
        eval: &'a E,
        start: &[u8],
        mode: BuildMode<'a>,
        want_virtual: bool,
    ) -> Result<Self, VersionError> {
        let mut cur = Vec::with_capacity(VERSION_BUFFER_CAPACITY.max(start.len()));
        cur.extend_from_slice(start);

        let vrow = if want_virtual {
            let view = RecordView::new(&cur)?;
            let row = decode_row(&view, table, ext)?;
            Some(materialize(table, row.values(), eval)?)
        } else {
            None
        };

        Ok(Self {
            table,
            ext,
            eval,
            builder: VersionBuilder::new(table, undo),
            mode,
            want_virtual,
            cur,
            prev: Vec::with_capacity(VERSION_BUFFER_CAPACITY),
            vrow,
            steps: 0,
        })
    }

    /// Record image of the version under inspection.
    pub fn current(&self) -> &[u8] {
        &self.cur
    }

    pub fn current_view(&self) -> Result<RecordView<'_>, VersionError> {
        Ok(RecordView::new(&self.cur)?)
    }

    /// Virtual row of the version under inspection, when requested.
    pub fn current_vrow(&self) -> Option<&VirtualRow> {
        self.vrow.as_ref()
    }

    pub fn take_vrow(&mut self) -> Option<VirtualRow> {
        self.vrow.take()
    }

    /// Number of predecessors built so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Moves to the predecessor of the current version.
    pub fn step(&mut self) -> Result<Step, VersionError> {
        let outcome = {
            let view = RecordView::new(&self.cur)?;
            self.builder
                .build_previous(&view, self.mode, self.want_virtual, &mut self.prev)?
        };

        let (old_vrow, new_vrow) = match outcome {
            BuildOutcome::NoPredecessor => return Ok(Step::NoPredecessor),
            BuildOutcome::HistoryMissing => return Ok(Step::HistoryMissing),
            BuildOutcome::Built { old_vrow, new_vrow } => (old_vrow, new_vrow),
        };

        if self.want_virtual {
            let mut succ = self
                .vrow
                .take()
                .unwrap_or_else(|| VirtualRow::new(self.table.n_virtual()));
            if let Some(new_vrow) = &new_vrow {
                succ.accumulate(new_vrow);
            }
            let mut vrow = old_vrow.unwrap_or_else(|| VirtualRow::new(self.table.n_virtual()));
            vrow.accumulate(&succ);

            let prev = RecordView::new(&self.prev)?;
            if prev.roll_ptr().is_insert() {
                let row = decode_row(&prev, self.table, self.ext)?;
                fill_missing(self.table, row.values(), &mut vrow, self.eval)?;
            }
            self.vrow = Some(vrow);
        }

        std::mem::swap(&mut self.cur, &mut self.prev);
        self.steps += 1;
        Ok(Step::Built)
    }

    /// Steps back until `pred` accepts a version or the chain ends. `pred`
    /// sees every predecessor, never the starting version.
    pub fn walk<F>(&mut self, mut pred: F) -> Result<WalkOutcome, VersionError>
    where
        F: FnMut(&RecordView<'_>, Option<&VirtualRow>) -> Result<StopDecision, VersionError>,
    {
        loop {
            match self.step()? {
                Step::NoPredecessor => {
                    debug!("walk on '{}' exhausted after {} steps", self.table.name(), self.steps);
                    return Ok(WalkOutcome::Exhausted);
                }
                Step::HistoryMissing => return Ok(WalkOutcome::HistoryMissing),
                Step::Built => {}
            }

            let view = RecordView::new(&self.cur)?;
            match pred(&view, self.vrow.as_ref())? {
                StopDecision::Accept => {
                    debug!(
                        "walk on '{}' accepted trx {} after {} steps",
                        self.table.name(),
                        view.trx_id(),
                        self.steps
                    );
                    return Ok(WalkOutcome::Accepted);
                }
                StopDecision::Continue => {}
                StopDecision::NoMoreHistory => return Ok(WalkOutcome::Stopped),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mvcc::{MvccTable, TrxSys, UndoLog};
    use crate::schema::{
        ColumnDef, ExprEvaluator, GeneratedExpr, IndexDef, IndexField, VirtualColumnDef,
    };
    use crate::storage::MemoryExternStore;
    use crate::types::{DataType, OwnedValue, Value};

    fn table() -> TableDef {
        TableDef::new(
            2,
            "w",
            vec![
                ColumnDef::new("id", DataType::Int8),
                ColumnDef::new("b", DataType::Int8),
                ColumnDef::new("note", DataType::Text),
            ],
        )
        .with_virtual_column(VirtualColumnDef::new(
            "b2",
            DataType::Int8,
            GeneratedExpr::add(GeneratedExpr::column(1), GeneratedExpr::column(1)),
        ))
        .with_index(IndexDef::new("idx_b2", vec![IndexField::virtual_col(0)]))
    }

    fn history(t: &TableDef, log: &UndoLog, ext: &MemoryExternStore) -> Vec<u8> {
        let sys = TrxSys::new();
        let mvcc = MvccTable::new(t, log, ext, &ExprEvaluator);
        let trx = sys.begin();
        let mut rec = mvcc
            .insert(&trx, &[OwnedValue::Int(1), OwnedValue::Int(1), "n0".into()])
            .unwrap();
        rec = mvcc.update(&trx, &rec, &[(1, OwnedValue::Int(2))]).unwrap();
        rec = mvcc.update(&trx, &rec, &[(2, "n1".into())]).unwrap();
        mvcc.update(&trx, &rec, &[(1, OwnedValue::Int(3))]).unwrap()
    }

    #[test]
    fn walk_visits_every_version_once_then_ends() {
        let t = table();
        let (log, ext) = (UndoLog::new(), MemoryExternStore::new());
        let rec = history(&t, &log, &ext);

        let mut walker =
            VersionWalker::new(&t, &log, &ext, &ExprEvaluator, &rec, BuildMode::Read, false)
                .unwrap();
        let mut seen = Vec::new();
        let outcome = walker
            .walk(|v, _| {
                seen.push(v.field(1).unwrap().as_int().unwrap());
                Ok(StopDecision::Continue)
            })
            .unwrap();
        assert_eq!(outcome, WalkOutcome::Exhausted);
        assert_eq!(seen, vec![2, 2, 1]);
        assert_eq!(walker.steps(), 3);
        assert!(walker.current_view().unwrap().roll_ptr().is_insert());
    }

    #[test]
    fn virtual_rows_follow_each_version() {
        let t = table();
        let (log, ext) = (UndoLog::new(), MemoryExternStore::new());
        let rec = history(&t, &log, &ext);

        let mut walker =
            VersionWalker::new(&t, &log, &ext, &ExprEvaluator, &rec, BuildMode::Read, true)
                .unwrap();
        assert_eq!(walker.current_vrow().unwrap().get(0), Some(&OwnedValue::Int(6)));

        let mut seen = Vec::new();
        walker
            .walk(|v, vrow| {
                let b = v.field(1).unwrap().as_int().unwrap();
                let b2 = vrow.and_then(|r| r.get(0)).cloned();
                seen.push((b, b2));
                Ok(StopDecision::Continue)
            })
            .unwrap();
        assert_eq!(
            seen,
            vec![
                (2, Some(OwnedValue::Int(4))),
                (2, Some(OwnedValue::Int(4))),
                (1, Some(OwnedValue::Int(2))),
            ]
        );
    }

    #[test]
    fn accept_and_stop_end_the_walk_early() {
        let t = table();
        let (log, ext) = (UndoLog::new(), MemoryExternStore::new());
        let rec = history(&t, &log, &ext);

        let mut walker =
            VersionWalker::new(&t, &log, &ext, &ExprEvaluator, &rec, BuildMode::Read, false)
                .unwrap();
        let outcome = walker.walk(|_, _| Ok(StopDecision::Accept)).unwrap();
        assert_eq!(outcome, WalkOutcome::Accepted);
        assert_eq!(walker.steps(), 1);
        assert_eq!(walker.current_view().unwrap().field(1).unwrap(), Value::Int(2));

        let outcome = walker.walk(|_, _| Ok(StopDecision::NoMoreHistory)).unwrap();
        assert_eq!(outcome, WalkOutcome::Stopped);
        assert_eq!(walker.steps(), 2);
    }

    #[test]
    fn missing_undo_keeps_last_built_version() {
        let t = table();
        let (log, ext) = (UndoLog::new(), MemoryExternStore::new());
        let rec = history(&t, &log, &ext);

        let mut walker =
            VersionWalker::new(&t, &log, &ext, &ExprEvaluator, &rec, BuildMode::Read, false)
                .unwrap();
        assert_eq!(walker.step().unwrap(), Step::Built);
        let roll_ptr = walker.current_view().unwrap().roll_ptr();
        log.remove(roll_ptr.undo_no());

        let outcome = walker.walk(|_, _| Ok(StopDecision::Continue)).unwrap();
        assert_eq!(outcome, WalkOutcome::HistoryMissing);
        assert_eq!(walker.current_view().unwrap().roll_ptr(), roll_ptr);
    }
}
