//! # Purge Safety Check
//!
//! Purge removes a delete-marked secondary-index entry only when no version
//! of the clustered row that some reader may still need would produce it.
//! `old_has_index_entry` answers that question.
//!
//! ```text
//! take purge latch, start walker (current virtual row evaluated once)
//!        │
//!        ▼
//! also_curr && current not delete-marked && current matches  ──> keep
//!        │
//!        ▼
//! walk back in CheckPurgeability mode:
//!     delete-marked version          ──> skip
//!     matches the entry              ──> keep
//!     match undecidable              ──> skip
//!     version visible to purge view  ──> chain ends here
//!        │
//!        ▼
//! no version matched                 ──> entry may be purged
//! ```
//!
//! The walk stops at the first version whose transaction the purge view
//! already sees: every reader sees that version or a newer one, so nothing
//! older can be needed, and its undo may already be gone.
//!
//! The purge latch is taken after the caller's page latch and held for the
//! whole walk so the horizon cannot move while the answer is computed.

use super::matcher::{matches, MatchResult};
use super::walker::{StopDecision, WalkOutcome};
use super::{BuildMode, RowVers};
use crate::error::VersionError;
use crate::mvcc::UndoStore;
use crate::row::{decode_row, IndexEntry};
use crate::schema::{IndexDef, TableDef, VirtualEvaluator};
use crate::storage::ExternStore;
use log::{debug, warn};

impl<'a, U: UndoStore, X: ExternStore, E: VirtualEvaluator> RowVers<'a, U, X, E> {
    /// True when a version of `clust_rec` not yet purgeable (or the current
    /// version, with `also_curr`) would produce `entry` in `index`.
    pub fn old_has_index_entry(
        &self,
        table: &TableDef,
        also_curr: bool,
        clust_rec: &[u8],
        index: &IndexDef,
        entry: &IndexEntry,
    ) -> Result<bool, VersionError> {
        let latch = self.purge.latch();
        let mut walker = self.walker(
            table,
            clust_rec,
            BuildMode::CheckPurgeability(&latch),
            index.has_virtual(),
        )?;

        if also_curr {
            let current = walker.current_view()?;
            if !current.is_delete_marked() {
                let row = decode_row(&current, table, self.ext)?;
                if matches(index, &row, walker.current_vrow(), entry) == MatchResult::Match {
                    debug!("current version of a '{}' row has the entry", table.name());
                    return Ok(true);
                }
            }
        }
        let outcome = walker.walk(|v, vrow| {
            if v.is_delete_marked() {
                return Ok(StopDecision::Continue);
            }
            let row = decode_row(v, table, self.ext)?;
            Ok(match matches(index, &row, vrow, entry) {
                MatchResult::Match => StopDecision::Accept,
                MatchResult::Mismatch | MatchResult::Undecidable => StopDecision::Continue,
            })
        })?;

        match outcome {
            WalkOutcome::Accepted => Ok(true),
            WalkOutcome::Exhausted | WalkOutcome::Stopped => Ok(false),
            WalkOutcome::HistoryMissing => {
                let cur = walker.current_view()?;
                warn!(
                    "undo {} of trx {} on '{}' purged while the purge view still needs it",
                    cur.roll_ptr(),
                    cur.trx_id(),
                    table.name()
                );
                Err(VersionError::MissingHistory {
                    trx_id: cur.trx_id(),
                    roll_ptr: cur.roll_ptr(),
                })
            }
        }
    }
}
