//! # Zero-Copy Record View
//!
//! `RecordView` parses the fixed prefix and field offset table of a record
//! image once, then gives O(1) access to any field without copying. It plays
//! the role of a record paired with its computed offsets: every consumer of
//! a version (builder, matcher, read builders) works through a view.
//!
//! ## Binary Layout
//!
//! ```text
//! +---------------+-----------+----------------------+-----------------+
//! | RecordHeader  | n_fields  | end offsets          | payload         |
//! | 17 bytes      | u16 BE    | u32 BE x n_fields    | tagged values   |
//! +---------------+-----------+----------------------+-----------------+
//! ```
//!
//! End offsets are relative to the payload start and must be non-decreasing
//! and within the payload. Field `i` occupies
//! `payload[end[i-1]..end[i]]` (with `end[-1] = 0`) and holds exactly one
//! encoded value.

use super::header::{RecordHeader, RollPtr};
use crate::config::{FIELD_OFFSET_SIZE, INLINE_FIELDS, MAX_FIELDS_PER_RECORD, RECORD_FIXED_PREFIX};
use crate::encoding::decode_value;
use crate::mvcc::TrxId;
use crate::types::Value;
use eyre::{ensure, Result};
use smallvec::SmallVec;

#[derive(Debug, Clone)]
pub struct RecordView<'a> {
    data: &'a [u8],
    header: RecordHeader,
    payload_start: usize,
    ends: SmallVec<[u32; INLINE_FIELDS]>,
}

impl<'a> RecordView<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let header = RecordHeader::from_bytes(data)?;
        ensure!(
            data.len() >= RECORD_FIXED_PREFIX,
            "record too short for field count: {} bytes",
            data.len()
        );
        let n_fields =
            u16::from_be_bytes([data[RecordHeader::SIZE], data[RecordHeader::SIZE + 1]]) as usize;
        ensure!(
            n_fields <= MAX_FIELDS_PER_RECORD,
            "record declares {} fields, max is {}",
            n_fields,
            MAX_FIELDS_PER_RECORD
        );

        let payload_start = RECORD_FIXED_PREFIX + n_fields * FIELD_OFFSET_SIZE;
        ensure!(
            data.len() >= payload_start,
            "record offset table truncated: need {} bytes, have {}",
            payload_start,
            data.len()
        );
        let payload_len = data.len() - payload_start;

        let mut ends = SmallVec::with_capacity(n_fields);
        let mut prev = 0u32;
        for chunk in data[RECORD_FIXED_PREFIX..payload_start].chunks_exact(FIELD_OFFSET_SIZE) {
            let end = u32::from_be_bytes(chunk.try_into()?);
            ensure!(
                end >= prev && end as usize <= payload_len,
                "corrupt field offset {} (previous {}, payload {})",
                end,
                prev,
                payload_len
            );
            ends.push(end);
            prev = end;
        }

        Ok(Self {
            data,
            header,
            payload_start,
            ends,
        })
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    pub fn header(&self) -> RecordHeader {
        self.header
    }

    pub fn trx_id(&self) -> TrxId {
        self.header.trx_id
    }

    pub fn roll_ptr(&self) -> RollPtr {
        self.header.roll_ptr
    }

    pub fn is_delete_marked(&self) -> bool {
        self.header.is_deleted()
    }

    pub fn n_fields(&self) -> usize {
        self.ends.len()
    }

    /// Raw encoded bytes of field `idx`.
    pub fn field_bytes(&self, idx: usize) -> Result<&'a [u8]> {
        ensure!(
            idx < self.ends.len(),
            "field {} out of range ({} fields)",
            idx,
            self.ends.len()
        );
        let start = if idx == 0 { 0 } else { self.ends[idx - 1] as usize };
        let end = self.ends[idx] as usize;
        Ok(&self.data[self.payload_start + start..self.payload_start + end])
    }

    pub fn field(&self, idx: usize) -> Result<Value<'a>> {
        let bytes = self.field_bytes(idx)?;
        let (value, used) = decode_value(bytes)?;
        ensure!(
            used == bytes.len(),
            "field {} has {} trailing bytes",
            idx,
            bytes.len() - used
        );
        Ok(value)
    }

    pub fn values(&self) -> Result<Vec<Value<'a>>> {
        (0..self.n_fields()).map(|i| self.field(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::builder::build_record;
    use super::*;
    use std::borrow::Cow;

    #[test]
    fn view_gives_random_access_to_fields() {
        let hdr = RecordHeader::new(9, RollPtr::update(4));
        let values = [
            Value::Int(1),
            Value::Text(Cow::Borrowed("two")),
            Value::Null,
        ];
        let rec = build_record(hdr, &values);
        let view = RecordView::new(&rec).unwrap();

        assert_eq!(view.trx_id(), 9);
        assert_eq!(view.roll_ptr(), RollPtr::update(4));
        assert_eq!(view.n_fields(), 3);
        assert_eq!(view.field(1).unwrap(), Value::Text(Cow::Borrowed("two")));
        assert_eq!(view.field(2).unwrap(), Value::Null);
        assert!(view.field(3).is_err());
    }

    #[test]
    fn corrupt_offsets_are_rejected() {
        let rec = build_record(RecordHeader::default(), &[Value::Int(1), Value::Int(2)]);

        let mut bad = rec.clone();
        // second end offset smaller than the first
        bad[RECORD_FIXED_PREFIX + 4..RECORD_FIXED_PREFIX + 8].copy_from_slice(&1u32.to_be_bytes());
        assert!(RecordView::new(&bad).is_err());

        assert!(RecordView::new(&rec[..RECORD_FIXED_PREFIX + 3]).is_err());
    }

    #[test]
    fn field_count_limit_is_enforced() {
        let mut rec = build_record(RecordHeader::default(), &[]);
        rec[RecordHeader::SIZE..RecordHeader::SIZE + 2].copy_from_slice(&u16::MAX.to_be_bytes());
        assert!(RecordView::new(&rec).is_err());
    }
}
