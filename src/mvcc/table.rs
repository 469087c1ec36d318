//! # Version Producer
//!
//! `MvccTable` is the write side of row versioning: it turns an INSERT,
//! UPDATE or DELETE on one clustered row into a new record image plus the
//! undo record that rebuilds the image it replaced. The version engine only
//! ever reads what this module writes.
//!
//! ## Write Path (Update)
//!
//! ```text
//! MvccTable::update(trx, current, changes)
//!    │
//!    ▼
//! Decode current record, reject primary-key changes and values
//! the column type does not accept
//!    │
//!    ▼
//! Undo record: old trx id, old roll pointer, old info bits,
//!              (field_no, old value) for every changed field
//!    │
//!    ├─ ordering column changed? ──> log (vcol, old, new) for every
//!    │                               indexed virtual column
//!    ▼
//! UndoLog::append(undo_no, ...)
//!    │
//!    ▼
//! New record: header (trx, undo:undo_no), delete mark cleared
//! ```
//!
//! Delete-marking always logs the indexed virtual columns (old == new), so
//! purge can tell which secondary entries the marked version had.
//!
//! The caller holds whatever latch protects `current`; this module does no
//! locking of its own beyond the undo log's internal lock.

use super::transaction::Trx;
use super::undo_log::UndoLog;
use super::undo_record::{UndoField, UndoKind, UndoRecord, UndoVcol};
use crate::record::{build_record, set_header, RecordHeader, RecordView, RollPtr};
use crate::row::resolve_externs;
use crate::schema::{TableDef, VirtualEvaluator};
use crate::storage::ExternStore;
use crate::types::{OwnedValue, Value};
use eyre::{ensure, Result};
use log::debug;

pub struct MvccTable<'a, X, E> {
    table: &'a TableDef,
    undo: &'a UndoLog,
    ext: &'a X,
    eval: &'a E,
}

impl<'a, X: ExternStore, E: VirtualEvaluator> MvccTable<'a, X, E> {
    pub fn new(table: &'a TableDef, undo: &'a UndoLog, ext: &'a X, eval: &'a E) -> Self {
        Self {
            table,
            undo,
            ext,
            eval,
        }
    }

    pub fn table(&self) -> &TableDef {
        self.table
    }

    pub fn insert(&self, trx: &Trx, values: &[OwnedValue]) -> Result<Vec<u8>> {
        ensure!(
            values.len() == self.table.n_fields(),
            "insert into '{}' has {} values, table has {} columns",
            self.table.name(),
            values.len(),
            self.table.n_fields()
        );
        for (col, value) in values.iter().enumerate() {
            self.check_type(col, value)?;
        }

        let undo_no = self.undo.allocate_undo_no();
        let mut undo = UndoRecord::new(UndoKind::Insert, self.table.id(), undo_no, trx.id());
        for (field_no, value) in values.iter().enumerate().take(self.table.n_pk()) {
            undo.update.push(UndoField {
                field_no,
                old: value.to_value(),
            });
        }
        self.undo
            .append(undo_no, trx.id(), self.table.name(), undo.to_bytes());

        let row: Vec<Value<'_>> = values.iter().map(OwnedValue::to_value).collect();
        debug!("trx {} inserted into '{}' (undo {})", trx.id(), self.table.name(), undo_no);
        Ok(build_record(
            RecordHeader::new(trx.id(), RollPtr::insert(undo_no)),
            &row,
        ))
    }

    /// Applies `changes` as `(column, new value)` pairs to `current`.
    pub fn update(
        &self,
        trx: &Trx,
        current: &[u8],
        changes: &[(usize, OwnedValue)],
    ) -> Result<Vec<u8>> {
        let view = self.checked_view(current)?;
        for (col, _) in changes {
            ensure!(
                *col < self.table.n_fields(),
                "table '{}' has no column {}",
                self.table.name(),
                col
            );
            ensure!(
                *col >= self.table.n_pk(),
                "primary key column {} of '{}' cannot be updated in place",
                col,
                self.table.name()
            );
        }
        for (col, value) in changes {
            self.check_type(*col, value)?;
        }

        let old_values = view.values()?;
        let mut new_values = old_values.clone();
        for (col, value) in changes {
            new_values[*col] = value.to_value();
        }

        let no_ord_change = !changes
            .iter()
            .any(|(col, _)| self.table.is_ordering_column(*col));
        let logged = if no_ord_change {
            Vec::new()
        } else {
            self.virtual_images(&old_values, &new_values)?
        };

        let undo_no = self.undo.allocate_undo_no();
        let mut undo = self.undo_header(UndoKind::Update, undo_no, trx, &view);
        undo.no_ord_change = no_ord_change;
        for (col, _) in changes {
            undo.update.push(UndoField {
                field_no: *col,
                old: old_values[*col].clone(),
            });
        }
        push_vcols(&mut undo, &logged);
        self.undo
            .append(undo_no, trx.id(), self.table.name(), undo.to_bytes());

        debug!(
            "trx {} updated {} field(s) in '{}' (undo {}, ordering change: {})",
            trx.id(),
            changes.len(),
            self.table.name(),
            undo_no,
            !no_ord_change
        );
        Ok(build_record(
            RecordHeader::new(trx.id(), RollPtr::update(undo_no)),
            &new_values,
        ))
    }

    pub fn delete_mark(&self, trx: &Trx, current: &[u8]) -> Result<Vec<u8>> {
        let view = self.checked_view(current)?;
        ensure!(
            !view.is_delete_marked(),
            "record of '{}' is already delete-marked",
            self.table.name()
        );

        let values = view.values()?;
        let logged = self.virtual_images(&values, &values)?;

        let undo_no = self.undo.allocate_undo_no();
        let mut undo = self.undo_header(UndoKind::DeleteMark, undo_no, trx, &view);
        undo.no_ord_change = false;
        push_vcols(&mut undo, &logged);
        self.undo
            .append(undo_no, trx.id(), self.table.name(), undo.to_bytes());

        let mut header = RecordHeader::new(trx.id(), RollPtr::update(undo_no));
        header.set_deleted(true);
        let mut out = current.to_vec();
        set_header(&mut out, header);
        debug!("trx {} delete-marked a row of '{}' (undo {})", trx.id(), self.table.name(), undo_no);
        Ok(out)
    }

    fn check_type(&self, col: usize, value: &OwnedValue) -> Result<()> {
        let data_type = self.table.column(col)?.data_type();
        ensure!(
            data_type.accepts(&value.to_value()),
            "column {} of '{}' is {:?}, got {:?}",
            col,
            self.table.name(),
            data_type,
            value
        );
        Ok(())
    }

    fn checked_view<'r>(&self, current: &'r [u8]) -> Result<RecordView<'r>> {
        let view = RecordView::new(current)?;
        ensure!(
            view.n_fields() == self.table.n_fields(),
            "record has {} fields, table '{}' has {}",
            view.n_fields(),
            self.table.name(),
            self.table.n_fields()
        );
        Ok(view)
    }

    fn undo_header<'u>(
        &self,
        kind: UndoKind,
        undo_no: u64,
        trx: &Trx,
        view: &RecordView<'_>,
    ) -> UndoRecord<'u> {
        let mut undo = UndoRecord::new(kind, self.table.id(), undo_no, trx.id());
        let header = view.header();
        undo.old_trx_id = header.trx_id;
        undo.old_roll_ptr = header.roll_ptr;
        undo.old_info_bits = header.flags;
        undo
    }

    /// Old and new values of every indexed virtual column that can be
    /// evaluated on both sides.
    fn virtual_images(
        &self,
        old: &[Value<'_>],
        new: &[Value<'_>],
    ) -> Result<Vec<(usize, OwnedValue, OwnedValue)>> {
        let mut old_base = old.to_vec();
        resolve_externs(&mut old_base, self.table, self.ext)?;
        let mut new_base = new.to_vec();
        resolve_externs(&mut new_base, self.table, self.ext)?;

        let mut logged = Vec::new();
        for vcol in self.table.indexed_virtual_columns() {
            let before = self.eval.evaluate(self.table, vcol, &old_base)?;
            let after = self.eval.evaluate(self.table, vcol, &new_base)?;
            if let (Some(before), Some(after)) = (before, after) {
                logged.push((vcol, before, after));
            }
        }
        Ok(logged)
    }
}

fn push_vcols<'u>(undo: &mut UndoRecord<'u>, logged: &'u [(usize, OwnedValue, OwnedValue)]) {
    for (vcol_no, old, new) in logged {
        undo.vcols.push(UndoVcol {
            vcol_no: *vcol_no,
            old: old.to_value(),
            new: new.to_value(),
        });
    }
}
