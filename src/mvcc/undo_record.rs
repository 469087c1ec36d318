//! # Undo Records
//!
//! An undo record is what a modification leaves behind so that the version
//! before it can be rebuilt. Applied to the version that points at it (via
//! its roll pointer) it yields the previous version's header and fields.
//!
//! ## Kinds
//!
//! | Kind | Written by | Previous version |
//! |------|------------|------------------|
//! | Insert | INSERT | none (roll pointer carries the insert flag) |
//! | Update | UPDATE | fields in the update vector take their old values |
//! | DeleteMark | DELETE | same fields, delete mark taken from `old_info_bits` |
//!
//! ## Virtual Columns
//!
//! Virtual columns are not part of the record image, so an undo record only
//! knows about them if it logged them. Updates log every indexed virtual
//! column, as `(vcol_no, old, new)`, exactly when they changed an ordering
//! column (`no_ord_change == false`). Delete-marks always log them. An undo
//! record that logged nothing says nothing: the values may or may not be
//! the same as in the neighbouring versions.
//!
//! ## Binary Layout
//!
//! ```text
//! [kind u8]
//! [table_id varint][undo_no varint][trx_id varint]
//! [old_trx_id varint][old_roll_ptr u64 BE][old_info_bits u8]
//! [flags u8]                       bit 0: no_ord_change
//! [n_update varint] { [field_no varint][old value] }*
//! [n_vcol varint]   { [vcol_no varint][old value][new value] }*
//! ```
//!
//! Values use the tagged encoding of [`crate::encoding::value`] and are
//! decoded without copying out of the undo buffer.

use super::TrxId;
use crate::config::MAX_FIELDS_PER_RECORD;
use crate::encoding::{decode_value, decode_varint, encode_value, put_varint};
use crate::record::RollPtr;
use crate::row::VirtualRow;
use crate::types::{OwnedValue, Value};
use eyre::{bail, ensure, Result};
use smallvec::SmallVec;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoKind {
    Insert = 1,
    Update = 2,
    DeleteMark = 3,
}

impl TryFrom<u8> for UndoKind {
    type Error = eyre::Report;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(UndoKind::Insert),
            2 => Ok(UndoKind::Update),
            3 => Ok(UndoKind::DeleteMark),
            _ => bail!("unknown undo record kind: {}", value),
        }
    }
}

const FLAG_NO_ORD_CHANGE: u8 = 0b0000_0001;

#[derive(Debug, Clone, PartialEq)]
pub struct UndoField<'a> {
    pub field_no: usize,
    pub old: Value<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UndoVcol<'a> {
    pub vcol_no: usize,
    pub old: Value<'a>,
    pub new: Value<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UndoRecord<'a> {
    pub kind: UndoKind,
    pub table_id: u64,
    pub undo_no: u64,
    pub trx_id: TrxId,
    pub old_trx_id: TrxId,
    pub old_roll_ptr: RollPtr,
    pub old_info_bits: u8,
    pub no_ord_change: bool,
    pub update: SmallVec<[UndoField<'a>; 4]>,
    pub vcols: Vec<UndoVcol<'a>>,
}

impl<'a> UndoRecord<'a> {
    pub fn new(kind: UndoKind, table_id: u64, undo_no: u64, trx_id: TrxId) -> Self {
        Self {
            kind,
            table_id,
            undo_no,
            trx_id,
            old_trx_id: 0,
            old_roll_ptr: RollPtr::default(),
            old_info_bits: 0,
            no_ord_change: true,
            update: SmallVec::new(),
            vcols: Vec::new(),
        }
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.kind as u8);
        put_varint(self.table_id, out);
        put_varint(self.undo_no, out);
        put_varint(self.trx_id, out);
        put_varint(self.old_trx_id, out);
        out.extend_from_slice(&self.old_roll_ptr.raw().to_be_bytes());
        out.push(self.old_info_bits);
        out.push(if self.no_ord_change { FLAG_NO_ORD_CHANGE } else { 0 });

        put_varint(self.update.len() as u64, out);
        for field in &self.update {
            put_varint(field.field_no as u64, out);
            encode_value(&field.old, out);
        }

        put_varint(self.vcols.len() as u64, out);
        for vcol in &self.vcols {
            put_varint(vcol.vcol_no as u64, out);
            encode_value(&vcol.old, out);
            encode_value(&vcol.new, out);
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode(&mut out);
        out
    }

    pub fn decode(buf: &'a [u8]) -> Result<Self> {
        let mut cur = Cursor { buf, pos: 0 };

        let kind = UndoKind::try_from(cur.u8()?)?;
        let table_id = cur.varint()?;
        let undo_no = cur.varint()?;
        let trx_id = cur.varint()?;
        let old_trx_id = cur.varint()?;
        let old_roll_ptr = RollPtr::from_raw(u64::from_be_bytes(cur.take(8)?.try_into()?));
        let old_info_bits = cur.u8()?;
        let flags = cur.u8()?;
        ensure!(flags & !FLAG_NO_ORD_CHANGE == 0, "unknown undo flags: {:02x}", flags);

        let n_update = cur.count()?;
        let mut update = SmallVec::with_capacity(n_update);
        for _ in 0..n_update {
            let field_no = cur.count()?;
            let old = cur.value()?;
            update.push(UndoField { field_no, old });
        }

        let n_vcol = cur.count()?;
        let mut vcols = Vec::with_capacity(n_vcol);
        for _ in 0..n_vcol {
            let vcol_no = cur.count()?;
            let old = cur.value()?;
            let new = cur.value()?;
            vcols.push(UndoVcol { vcol_no, old, new });
        }

        ensure!(
            cur.pos == buf.len(),
            "undo record {} has {} trailing bytes",
            undo_no,
            buf.len() - cur.pos
        );

        Ok(Self {
            kind,
            table_id,
            undo_no,
            trx_id,
            old_trx_id,
            old_roll_ptr,
            old_info_bits,
            no_ord_change: flags & FLAG_NO_ORD_CHANGE != 0,
            update,
            vcols,
        })
    }

    /// True when this record logged virtual-column values.
    pub fn has_virtual(&self) -> bool {
        !self.vcols.is_empty()
    }

    /// Virtual values of the version this record rebuilds.
    pub fn old_virtual(&self, n_virtual: usize) -> VirtualRow {
        let mut row = VirtualRow::new(n_virtual);
        for v in &self.vcols {
            row.set(v.vcol_no, OwnedValue::from(&v.old));
        }
        row
    }

    /// Virtual values of the version that points at this record.
    pub fn new_virtual(&self, n_virtual: usize) -> VirtualRow {
        let mut row = VirtualRow::new(n_virtual);
        for v in &self.vcols {
            row.set(v.vcol_no, OwnedValue::from(&v.new));
        }
        row
    }
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        ensure!(
            self.buf.len() - self.pos >= n,
            "undo record truncated at byte {}",
            self.pos
        );
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn varint(&mut self) -> Result<u64> {
        let (v, used) = decode_varint(&self.buf[self.pos..])?;
        self.pos += used;
        Ok(v)
    }

    fn count(&mut self) -> Result<usize> {
        let n = self.varint()? as usize;
        ensure!(n <= MAX_FIELDS_PER_RECORD, "undo field count {} too large", n);
        Ok(n)
    }

    fn value(&mut self) -> Result<Value<'a>> {
        let (v, used) = decode_value(&self.buf[self.pos..])?;
        self.pos += used;
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    fn sample<'a>() -> UndoRecord<'a> {
        let mut rec = UndoRecord::new(UndoKind::Update, 3, 42, 17);
        rec.old_trx_id = 9;
        rec.old_roll_ptr = RollPtr::insert(41);
        rec.old_info_bits = 0;
        rec.no_ord_change = false;
        rec.update.push(UndoField {
            field_no: 1,
            old: Value::Int(1),
        });
        rec.vcols.push(UndoVcol {
            vcol_no: 0,
            old: Value::Text(Cow::Borrowed("one")),
            new: Value::Text(Cow::Borrowed("two")),
        });
        rec
    }

    #[test]
    fn decode_reads_back_every_section() {
        let bytes = sample().to_bytes();
        let rec = UndoRecord::decode(&bytes).unwrap();
        assert_eq!(rec, sample());
        assert!(rec.has_virtual());
        assert_eq!(rec.old_virtual(2).get(0), Some(&OwnedValue::text("one")));
        assert_eq!(rec.new_virtual(2).get(0), Some(&OwnedValue::text("two")));
        assert!(rec.old_virtual(2).is_missing(1));
    }

    #[test]
    fn truncated_or_padded_input_is_rejected() {
        let bytes = sample().to_bytes();
        for cut in 0..bytes.len() {
            assert!(UndoRecord::decode(&bytes[..cut]).is_err(), "cut at {}", cut);
        }
        let mut padded = bytes.clone();
        padded.push(0);
        assert!(UndoRecord::decode(&padded).is_err());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let mut bytes = sample().to_bytes();
        bytes[0] = 9;
        assert!(UndoRecord::decode(&bytes).is_err());
    }
}
