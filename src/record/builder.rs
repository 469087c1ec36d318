//! # Record Image Builder
//!
//! Serializes a header and a list of field values into the layout parsed by
//! [`RecordView`](super::RecordView). The builder writes into a caller
//! supplied buffer so the version walker can reuse its two version buffers
//! across steps instead of allocating a fresh image for every predecessor.

use super::header::RecordHeader;
use crate::config::{FIELD_OFFSET_SIZE, RECORD_FIXED_PREFIX};
use crate::encoding::encode_value;
use crate::types::Value;

/// Clears `out` and writes the record image for `header` and `values`.
pub fn write_record(header: RecordHeader, values: &[Value<'_>], out: &mut Vec<u8>) {
    debug_assert!(values.len() <= u16::MAX as usize);
    out.clear();

    let payload_start = RECORD_FIXED_PREFIX + values.len() * FIELD_OFFSET_SIZE;
    out.resize(payload_start, 0);
    header.write_to(&mut out[..RecordHeader::SIZE]);
    out[RecordHeader::SIZE..RECORD_FIXED_PREFIX]
        .copy_from_slice(&(values.len() as u16).to_be_bytes());

    for (i, value) in values.iter().enumerate() {
        encode_value(value, out);
        let end = (out.len() - payload_start) as u32;
        let slot = RECORD_FIXED_PREFIX + i * FIELD_OFFSET_SIZE;
        out[slot..slot + FIELD_OFFSET_SIZE].copy_from_slice(&end.to_be_bytes());
    }
}

pub fn build_record(header: RecordHeader, values: &[Value<'_>]) -> Vec<u8> {
    let mut out = Vec::new();
    write_record(header, values, &mut out);
    out
}

/// Rewrites the header of an existing record image in place.
pub fn set_header(record: &mut [u8], header: RecordHeader) {
    header.write_to(&mut record[..RecordHeader::SIZE]);
}

#[cfg(test)]
mod tests {
    use super::super::{RecordView, RollPtr};
    use super::*;
    use std::borrow::Cow;

    #[test]
    fn write_record_reuses_buffer() {
        let mut buf = Vec::with_capacity(64);
        write_record(
            RecordHeader::new(1, RollPtr::insert(1)),
            &[Value::Text(Cow::Borrowed("a long enough value"))],
            &mut buf,
        );
        write_record(RecordHeader::new(2, RollPtr::update(2)), &[Value::Int(3)], &mut buf);

        let view = RecordView::new(&buf).unwrap();
        assert_eq!(view.trx_id(), 2);
        assert_eq!(view.n_fields(), 1);
        assert_eq!(view.field(0).unwrap(), Value::Int(3));
    }

    #[test]
    fn set_header_preserves_fields() {
        let mut rec = build_record(RecordHeader::new(1, RollPtr::insert(1)), &[Value::Int(7)]);
        let mut hdr = RecordHeader::new(5, RollPtr::update(9));
        hdr.set_deleted(true);
        set_header(&mut rec, hdr);

        let view = RecordView::new(&rec).unwrap();
        assert!(view.is_delete_marked());
        assert_eq!(view.trx_id(), 5);
        assert_eq!(view.field(0).unwrap(), Value::Int(7));
    }
}
