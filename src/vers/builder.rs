//! # Version-Image Builder
//!
//! One step back in a row's history: read the undo record named by the
//! current version's roll pointer and apply it to the current field values.
//!
//! ```text
//! current version            undo record               previous version
//! +------------------+       +------------------+      +------------------+
//! | trx 12, undo:40  | ----> | undo 40, trx 12  | ---> | trx 7, insert:31 |
//! | a=1 b=2 c=x      |       | old trx 7        |      | a=1 b=1 c=x      |
//! +------------------+       | old roll ins:31  |      +------------------+
//!                            | b: 1             |
//!                            +------------------+
//! ```
//!
//! The builder validates the undo record against the version pointing at
//! it before trusting it. Besides format errors this catches a roll pointer
//! naming another transaction's undo and a chain that does not move
//! strictly backwards, which would otherwise loop forever.
//!
//! Field values are staged in a scratch `Bump` reset before every step; the
//! result is written into a caller buffer so the walker can ping-pong two
//! buffers instead of allocating a record per step.

use super::BuildMode;
use crate::config::{SCRATCH_ARENA_CAPACITY, UNDO_BUFFER_CAPACITY};
use crate::error::VersionError;
use crate::mvcc::{UndoKind, UndoRecord, UndoStore};
use crate::record::{write_record, RecordHeader, RecordView};
use crate::row::VirtualRow;
use crate::schema::TableDef;
use bumpalo::Bump;
use log::trace;

/// Result of one build step.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    /// The predecessor was written to the output buffer. The virtual rows
    /// are present only when requested and the undo record logged virtual
    /// columns: `old_vrow` for the predecessor, `new_vrow` for the version
    /// the step started from.
    Built {
        old_vrow: Option<VirtualRow>,
        new_vrow: Option<VirtualRow>,
    },
    /// The version was produced by an insert, or purge may already have
    /// removed its undo.
    NoPredecessor,
    /// The undo record is gone.
    HistoryMissing,
}

pub struct VersionBuilder<'a, U> {
    table: &'a TableDef,
    undo: &'a U,
    undo_buf: Vec<u8>,
    scratch: Bump,
}

impl<'a, U: UndoStore> VersionBuilder<'a, U> {
    pub fn new(table: &'a TableDef, undo: &'a U) -> Self {
        Self {
            table,
            undo,
            undo_buf: Vec::with_capacity(UNDO_BUFFER_CAPACITY),
            scratch: Bump::with_capacity(SCRATCH_ARENA_CAPACITY),
        }
    }

    /// Writes the version preceding `cur` into `out`.
    pub fn build_previous(
        &mut self,
        cur: &RecordView<'_>,
        mode: BuildMode<'_>,
        want_virtual: bool,
        out: &mut Vec<u8>,
    ) -> Result<BuildOutcome, VersionError> {
        let roll_ptr = cur.roll_ptr();
        if roll_ptr.is_insert() {
            return Ok(BuildOutcome::NoPredecessor);
        }
        if let BuildMode::CheckPurgeability(latch) = mode {
            if latch.changes_visible(cur.trx_id(), self.table.name()) {
                trace!(
                    "trx {} visible to purge, not following {}",
                    cur.trx_id(),
                    roll_ptr
                );
                return Ok(BuildOutcome::NoPredecessor);
            }
        }

        if !self.undo.read_undo(roll_ptr, &mut self.undo_buf)? {
            return Ok(BuildOutcome::HistoryMissing);
        }

        self.scratch.reset();
        let undo = UndoRecord::decode(&self.undo_buf)
            .map_err(|e| VersionError::corrupt(roll_ptr, format!("{:#}", e)))?;
        self.validate(&undo, cur)?;

        let mut fields = bumpalo::collections::Vec::with_capacity_in(cur.n_fields(), &self.scratch);
        for i in 0..cur.n_fields() {
            fields.push(cur.field(i)?);
        }
        for upd in &undo.update {
            fields[upd.field_no] = upd.old.clone();
        }

        let header = RecordHeader {
            flags: undo.old_info_bits,
            trx_id: undo.old_trx_id,
            roll_ptr: undo.old_roll_ptr,
        };
        write_record(header, &fields, out);
        trace!(
            "{} (trx {}) -> {} (trx {})",
            roll_ptr,
            cur.trx_id(),
            undo.old_roll_ptr,
            undo.old_trx_id
        );

        let (old_vrow, new_vrow) = if want_virtual && undo.has_virtual() {
            let n = self.table.n_virtual();
            (Some(undo.old_virtual(n)), Some(undo.new_virtual(n)))
        } else {
            (None, None)
        };
        Ok(BuildOutcome::Built { old_vrow, new_vrow })
    }

    fn validate(&self, undo: &UndoRecord<'_>, cur: &RecordView<'_>) -> Result<(), VersionError> {
        let roll_ptr = cur.roll_ptr();
        let fail = |reason: String| Err(VersionError::corrupt(roll_ptr, reason));

        if undo.kind == UndoKind::Insert {
            return fail("insert undo reached through an update roll pointer".into());
        }
        if undo.table_id != self.table.id() {
            return fail(format!(
                "undo belongs to table {}, record to table {}",
                undo.table_id,
                self.table.id()
            ));
        }
        if undo.undo_no != roll_ptr.undo_no() {
            return fail(format!("undo record claims number {}", undo.undo_no));
        }
        if undo.trx_id != cur.trx_id() {
            return fail(format!(
                "undo written by trx {}, record by trx {}",
                undo.trx_id,
                cur.trx_id()
            ));
        }
        if undo.old_trx_id > undo.trx_id {
            return fail(format!(
                "older version has newer trx {} than {}",
                undo.old_trx_id, undo.trx_id
            ));
        }
        if undo.old_roll_ptr.undo_no() >= undo.undo_no {
            return fail(format!(
                "chain does not move backwards: {} -> {}",
                roll_ptr, undo.old_roll_ptr
            ));
        }
        if let Some(f) = undo.update.iter().find(|f| f.field_no >= cur.n_fields()) {
            return fail(format!(
                "update of field {} on a {}-field record",
                f.field_no,
                cur.n_fields()
            ));
        }
        if let Some(v) = undo.vcols.iter().find(|v| v.vcol_no >= self.table.n_virtual()) {
            return fail(format!(
                "virtual column {} on a table with {}",
                v.vcol_no,
                self.table.n_virtual()
            ));
        }
        Ok(())
    }
}
