//! # Version Engine Errors
//!
//! Collaborators (undo store, external store, virtual-column evaluator) and
//! the byte codecs report failures as `eyre::Report`. The four top-level
//! entry points report `VersionError`, which separates the one condition a
//! caller must act on, missing history, from everything else.
//!
//! | Variant | Meaning |
//! |---------|---------|
//! | `MissingHistory` | undo needed by a read view was purged ("snapshot too old") |
//! | `CorruptUndo` | undo record present but undecodable or inconsistent with the version pointing at it |
//! | `Service` | failure propagated from a collaborator or a record decoder |
//!
//! No variant leaves shared state modified: every walk works on private
//! buffers and the caller's output arena.

use crate::mvcc::TrxId;
use crate::record::RollPtr;
use std::fmt::Display;

#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("missing history: undo {roll_ptr} of trx {trx_id} has been purged")]
    MissingHistory { trx_id: TrxId, roll_ptr: RollPtr },

    #[error("corrupt undo record at {roll_ptr}: {reason}")]
    CorruptUndo { roll_ptr: RollPtr, reason: String },

    #[error("{0:#}")]
    Service(eyre::Report),
}

impl VersionError {
    pub fn corrupt(roll_ptr: RollPtr, reason: impl Display) -> Self {
        VersionError::CorruptUndo {
            roll_ptr,
            reason: reason.to_string(),
        }
    }

    pub fn is_missing_history(&self) -> bool {
        matches!(self, VersionError::MissingHistory { .. })
    }
}

impl From<eyre::Report> for VersionError {
    fn from(report: eyre::Report) -> Self {
        VersionError::Service(report)
    }
}
