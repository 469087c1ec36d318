//! # Record Header for Version Tracking
//!
//! Every record image starts with a 17-byte header carrying the version
//! metadata the walker needs:
//!
//! ## Binary Layout (17 bytes)
//!
//! ```text
//! +----------+----------+------------------+
//! | Flags    | TrxId    | RollPtr          |
//! | (1 byte) | (8 bytes)| (8 bytes)        |
//! +----------+----------+------------------+
//! ```
//!
//! ## Flags Byte (bitmask)
//!
//! ```text
//! Bit 1: DELETE_BIT  - Row is delete-marked (tombstone awaiting purge)
//! Other bits: reserved
//! ```
//!
//! ## Roll Pointer
//!
//! ```text
//! bit 63      : insert flag (version produced by INSERT, no predecessor)
//! bits 0..=62 : undo number of the record that rebuilds the prior version
//! ```
//!
//! A roll pointer with the insert flag set is the insert sentinel: building
//! the previous version of such a record yields nothing.
//!
//! Secondary-index records reuse the same header with `trx_id = 0` and a
//! zero roll pointer; only the delete bit is meaningful there.

use crate::config::{RECORD_HEADER_SIZE, ROLL_PTR_INSERT_FLAG, ROLL_PTR_UNDO_NO_MASK};
use crate::mvcc::TrxId;
use eyre::{ensure, Result};
use std::fmt;

pub mod flags {
    pub const DELETE_BIT: u8 = 0b0000_0010;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct RollPtr(u64);

impl RollPtr {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Roll pointer of a version produced by INSERT.
    pub const fn insert(undo_no: u64) -> Self {
        Self(ROLL_PTR_INSERT_FLAG | (undo_no & ROLL_PTR_UNDO_NO_MASK))
    }

    /// Roll pointer of a version produced by UPDATE or delete-mark.
    pub const fn update(undo_no: u64) -> Self {
        Self(undo_no & ROLL_PTR_UNDO_NO_MASK)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }

    pub const fn is_insert(&self) -> bool {
        self.0 & ROLL_PTR_INSERT_FLAG != 0
    }

    pub const fn undo_no(&self) -> u64 {
        self.0 & ROLL_PTR_UNDO_NO_MASK
    }
}

impl fmt::Display for RollPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_insert() {
            write!(f, "insert:{}", self.undo_no())
        } else {
            write!(f, "undo:{}", self.undo_no())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordHeader {
    pub flags: u8,
    pub trx_id: TrxId,
    pub roll_ptr: RollPtr,
}

impl RecordHeader {
    pub const SIZE: usize = RECORD_HEADER_SIZE;

    pub fn new(trx_id: TrxId, roll_ptr: RollPtr) -> Self {
        Self {
            flags: 0,
            trx_id,
            roll_ptr,
        }
    }

    /// Header used by secondary-index records.
    pub fn secondary(delete_marked: bool) -> Self {
        let mut hdr = Self::default();
        hdr.set_deleted(delete_marked);
        hdr
    }

    pub fn from_bytes(slice: &[u8]) -> Result<Self> {
        ensure!(
            slice.len() >= Self::SIZE,
            "record header too short: {} < {}",
            slice.len(),
            Self::SIZE
        );
        let flags = slice[0];
        let trx_id = u64::from_be_bytes(slice[1..9].try_into()?);
        let roll_ptr = RollPtr(u64::from_be_bytes(slice[9..17].try_into()?));
        Ok(Self {
            flags,
            trx_id,
            roll_ptr,
        })
    }

    pub fn write_to(&self, slice: &mut [u8]) {
        debug_assert!(slice.len() >= Self::SIZE);
        slice[0] = self.flags;
        slice[1..9].copy_from_slice(&self.trx_id.to_be_bytes());
        slice[9..17].copy_from_slice(&self.roll_ptr.raw().to_be_bytes());
    }

    pub fn is_deleted(&self) -> bool {
        self.flags & flags::DELETE_BIT != 0
    }

    pub fn set_deleted(&mut self, deleted: bool) {
        if deleted {
            self.flags |= flags::DELETE_BIT;
        } else {
            self.flags &= !flags::DELETE_BIT;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_header_size_is_17_bytes() {
        assert_eq!(RecordHeader::SIZE, 17);
    }

    #[test]
    fn record_header_from_bytes_parses_correctly() {
        let mut buf = [0u8; 17];
        buf[0] = flags::DELETE_BIT;
        buf[1..9].copy_from_slice(&100u64.to_be_bytes());
        buf[9..17].copy_from_slice(&RollPtr::update(77).raw().to_be_bytes());

        let hdr = RecordHeader::from_bytes(&buf).unwrap();
        assert!(hdr.is_deleted());
        assert_eq!(hdr.trx_id, 100);
        assert_eq!(hdr.roll_ptr.undo_no(), 77);
        assert!(!hdr.roll_ptr.is_insert());
    }

    #[test]
    fn record_header_rejects_short_input() {
        assert!(RecordHeader::from_bytes(&[0u8; 16]).is_err());
    }

    #[test]
    fn insert_flag_is_separate_from_undo_number() {
        let ptr = RollPtr::insert(5);
        assert!(ptr.is_insert());
        assert_eq!(ptr.undo_no(), 5);
        assert_eq!(ptr.to_string(), "insert:5");

        let ptr = RollPtr::update(u64::MAX);
        assert!(!ptr.is_insert());
        assert_eq!(ptr.undo_no(), ROLL_PTR_UNDO_NO_MASK);
    }

    #[test]
    fn delete_bit_set_and_clear() {
        let mut hdr = RecordHeader::new(1, RollPtr::insert(1));
        assert!(!hdr.is_deleted());
        hdr.set_deleted(true);
        assert!(hdr.is_deleted());
        hdr.set_deleted(false);
        assert!(!hdr.is_deleted());
        assert!(RecordHeader::secondary(true).is_deleted());
    }
}
