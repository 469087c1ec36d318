//! # Read Version Builders
//!
//! Two ways a reader that cannot use the current clustered record finds the
//! version it should see instead.
//!
//! ## Consistent Read
//!
//! Walks back to the newest version whose transaction the reader's
//! [`ReadView`] sees. If the chain ends first the row did not exist for the
//! view. If undo the view still needs has been purged the read fails with
//! `MissingHistory`: the snapshot can no longer be honoured and a wrong
//! answer is never substituted.
//!
//! ## Semi-Consistent Read
//!
//! Used by locking scans that would rather see the latest committed value
//! than wait. Walks back to the newest version whose transaction is not
//! active right now. Never fails on missing history: the last version that
//! could be built is returned instead.
//!
//! If the accepted version belongs to the transaction that wrote the
//! current record, that transaction committed while we walked. The current
//! record is then itself committed and is returned as is. A transaction
//! being rolled back stays active until its rollback has finished, so
//! nothing half-undone can be taken for committed data here.
//!
//! Both builders copy their result into a caller-owned `Bump` so it survives
//! the release of the page latch protecting the live record.

use super::walker::{StopDecision, WalkOutcome};
use super::{BuildMode, RowVers};
use crate::error::VersionError;
use crate::mvcc::{ReadView, UndoStore};
use crate::record::RecordView;
use crate::row::VirtualRow;
use crate::schema::{TableDef, VirtualEvaluator};
use crate::storage::ExternStore;
use bumpalo::Bump;
use log::{debug, warn};

/// A version accepted by a consistent read.
#[derive(Debug)]
pub struct ConsistentVersion<'out> {
    pub record: &'out [u8],
    /// Merged virtual row of the version, when requested. Columns neither
    /// logged nor computable stay missing.
    pub vrow: Option<VirtualRow>,
}

impl<'a, U: UndoStore, X: ExternStore, E: VirtualEvaluator> RowVers<'a, U, X, E> {
    /// Newest version of `rec` visible to `view`, or `None` if the row did
    /// not exist for it. The caller has already found that `view` does not
    /// see the transaction that wrote `rec`.
    pub fn build_for_consistent_read<'out>(
        &self,
        table: &TableDef,
        rec: &[u8],
        view: &ReadView,
        want_virtual: bool,
        out: &'out Bump,
    ) -> Result<Option<ConsistentVersion<'out>>, VersionError> {
        let start = RecordView::new(rec)?;
        debug_assert!(!view.changes_visible(start.trx_id(), table.name()));

        let mut walker = self.walker(table, rec, BuildMode::Read, want_virtual)?;
        let outcome = walker.walk(|v, _| {
            Ok(if view.changes_visible(v.trx_id(), table.name()) {
                StopDecision::Accept
            } else {
                StopDecision::Continue
            })
        })?;

        match outcome {
            WalkOutcome::Accepted => {
                debug!(
                    "consistent read on '{}' sees trx {} (view [{}, {}))",
                    table.name(),
                    walker.current_view()?.trx_id(),
                    view.up_limit(),
                    view.low_limit()
                );
                Ok(Some(ConsistentVersion {
                    record: out.alloc_slice_copy(walker.current()),
                    vrow: walker.take_vrow(),
                }))
            }
            WalkOutcome::Exhausted | WalkOutcome::Stopped => Ok(None),
            WalkOutcome::HistoryMissing => {
                let cur = walker.current_view()?;
                warn!(
                    "consistent read on '{}' needs purged undo {} of trx {} (view [{}, {}))",
                    table.name(),
                    cur.roll_ptr(),
                    cur.trx_id(),
                    view.up_limit(),
                    view.low_limit()
                );
                Err(VersionError::MissingHistory {
                    trx_id: cur.trx_id(),
                    roll_ptr: cur.roll_ptr(),
                })
            }
        }
    }

    /// Newest version of `rec` whose transaction is not active, or `None`
    /// if every version was written by transactions still active.
    pub fn build_for_semi_consistent_read<'out>(
        &self,
        table: &TableDef,
        rec: &[u8],
        out: &'out Bump,
    ) -> Result<Option<&'out [u8]>, VersionError> {
        let rec_trx_id = RecordView::new(rec)?.trx_id();
        if !self.trx_sys.is_active_id(rec_trx_id) {
            return Ok(Some(out.alloc_slice_copy(rec)));
        }

        let mut walker = self.walker(table, rec, BuildMode::Read, false)?;
        let outcome = walker.walk(|v, _| {
            Ok(if self.trx_sys.is_active_id(v.trx_id()) {
                StopDecision::Continue
            } else {
                StopDecision::Accept
            })
        })?;

        match outcome {
            WalkOutcome::Accepted => {
                let accepted = walker.current_view()?.trx_id();
                if accepted == rec_trx_id {
                    warn!(
                        "trx {} committed during a semi-consistent read on '{}', using the current record",
                        rec_trx_id,
                        table.name()
                    );
                    Ok(Some(out.alloc_slice_copy(rec)))
                } else {
                    Ok(Some(out.alloc_slice_copy(walker.current())))
                }
            }
            WalkOutcome::Exhausted | WalkOutcome::Stopped => Ok(None),
            WalkOutcome::HistoryMissing => {
                warn!(
                    "semi-consistent read on '{}' ran out of undo after {} steps, using the last built version",
                    table.name(),
                    walker.steps()
                );
                Ok(Some(out.alloc_slice_copy(walker.current())))
            }
        }
    }
}
