//! # Externally Stored Column Values
//!
//! Large TEXT and BLOB values are not kept inline in a record image. The
//! record carries a 17-byte reference instead and the bytes live in an
//! external store, split into fixed-size chunks.
//!
//! ## Reference Format
//!
//! ```text
//! +--------+-------------+----------+
//! | Marker | Total Size  | Chunk ID |
//! | 1 byte | 8 bytes     | 8 bytes  |
//! | 0xFE   | u64 LE      | u64 LE   |
//! +--------+-------------+----------+
//! ```
//!
//! ## Null References
//!
//! A reference with `chunk_id == 0` was written by an insert whose external
//! bytes have not been stored yet. Such a reference cannot be resolved. The
//! version engine only meets one on a freshly inserted row, where it is
//! treated as "does not match" rather than as an error: the inserting
//! transaction writes the secondary-index entries itself once the value is
//! stored.
//!
//! ## Chunk Keys
//!
//! Chunks are addressed by `(chunk_id, chunk_seq)`, encoded big-endian so
//! that the chunks of one value sort together.

use crate::config::{EXTERN_MARKER, EXTERN_REF_SIZE};
use eyre::{ensure, Result};
use hashbrown::HashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Bytes per stored chunk.
pub const EXTERN_CHUNK_SIZE: usize = 4000;

/// Resolves external references to their bytes.
///
/// `Ok(None)` means the reference is unresolved (null reference or chunks not
/// written yet). `Err` is reserved for store failures.
pub trait ExternStore {
    fn fetch(&self, ext: &ExternRef) -> Result<Option<Vec<u8>>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExternRef {
    pub total_size: u64,
    pub chunk_id: u64,
}

impl ExternRef {
    pub const NULL_CHUNK: u64 = 0;

    pub fn new(chunk_id: u64, total_size: u64) -> Self {
        Self {
            total_size,
            chunk_id,
        }
    }

    /// Reference written before the external bytes exist.
    pub fn null(total_size: u64) -> Self {
        Self::new(Self::NULL_CHUNK, total_size)
    }

    pub fn is_null(&self) -> bool {
        self.chunk_id == Self::NULL_CHUNK
    }

    pub fn encode(&self) -> [u8; EXTERN_REF_SIZE] {
        let mut buf = [0u8; EXTERN_REF_SIZE];
        buf[0] = EXTERN_MARKER;
        buf[1..9].copy_from_slice(&self.total_size.to_le_bytes());
        buf[9..17].copy_from_slice(&self.chunk_id.to_le_bytes());
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        ensure!(
            data.len() >= EXTERN_REF_SIZE,
            "extern reference too short: {} < {}",
            data.len(),
            EXTERN_REF_SIZE
        );
        ensure!(
            data[0] == EXTERN_MARKER,
            "invalid extern marker: {:02x}",
            data[0]
        );

        let total_size = u64::from_le_bytes(data[1..9].try_into()?);
        let chunk_id = u64::from_le_bytes(data[9..17].try_into()?);

        Ok(Self {
            total_size,
            chunk_id,
        })
    }
}

pub fn chunk_count(total_size: usize) -> usize {
    total_size.div_ceil(EXTERN_CHUNK_SIZE)
}

pub fn make_chunk_key(chunk_id: u64, chunk_seq: u32) -> [u8; 12] {
    let mut key = [0u8; 12];
    key[0..8].copy_from_slice(&chunk_id.to_be_bytes());
    key[8..12].copy_from_slice(&chunk_seq.to_be_bytes());
    key
}

/// In-memory chunked external store.
pub struct MemoryExternStore {
    chunks: RwLock<HashMap<[u8; 12], Vec<u8>>>,
    next_chunk_id: AtomicU64,
}

impl Default for MemoryExternStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryExternStore {
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(HashMap::new()),
            next_chunk_id: AtomicU64::new(1),
        }
    }

    /// Stores `data` and returns the reference to embed in a record.
    pub fn store(&self, data: &[u8]) -> ExternRef {
        let chunk_id = self.next_chunk_id.fetch_add(1, Ordering::Relaxed);
        let mut chunks = self.chunks.write();
        for (seq, chunk) in data.chunks(EXTERN_CHUNK_SIZE).enumerate() {
            chunks.insert(make_chunk_key(chunk_id, seq as u32), chunk.to_vec());
        }
        ExternRef::new(chunk_id, data.len() as u64)
    }

    /// Removes every chunk of `ext`. Later fetches report it unresolved.
    pub fn remove(&self, ext: &ExternRef) {
        let mut chunks = self.chunks.write();
        for seq in 0..chunk_count(ext.total_size as usize) {
            chunks.remove(&make_chunk_key(ext.chunk_id, seq as u32));
        }
    }
}

impl ExternStore for MemoryExternStore {
    fn fetch(&self, ext: &ExternRef) -> Result<Option<Vec<u8>>> {
        if ext.is_null() {
            return Ok(None);
        }

        let total_size = ext.total_size as usize;
        let chunks = self.chunks.read();
        let mut out = Vec::with_capacity(total_size.min(chunks.len() * EXTERN_CHUNK_SIZE));
        for seq in 0..chunk_count(total_size) {
            match chunks.get(&make_chunk_key(ext.chunk_id, seq as u32)) {
                Some(chunk) => out.extend_from_slice(chunk),
                None => return Ok(None),
            }
        }

        ensure!(
            out.len() == total_size,
            "extern value {} reassembled to {} bytes, expected {}",
            ext.chunk_id,
            out.len(),
            total_size
        );
        Ok(Some(out))
    }
}
