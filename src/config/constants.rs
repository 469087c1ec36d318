//! # rowvers Configuration Constants
//!
//! This module centralizes the numeric layout and sizing constants used by the
//! record codec, the undo codec and the version walker. Constants that depend
//! on each other are co-located and their relationships are checked at
//! compile time.
//!
//! ## Dependency Graph
//!
//! ```text
//! RECORD_HEADER_SIZE (17 bytes: flags + trx_id + roll_ptr)
//!       │
//!       └─> RECORD_FIXED_PREFIX (derived: header + u16 field count)
//!
//! MAX_FIELDS_PER_RECORD (1024)
//!       │
//!       └─> INLINE_FIELDS (offset table entries kept inline before spilling)
//!
//! ROLL_PTR_INSERT_FLAG (bit 63)
//!       │
//!       └─> ROLL_PTR_UNDO_NO_MASK (derived: every bit below the flag)
//!
//! EXTERN_REF_SIZE (17 bytes: marker + total_size + chunk_id)
//! ```
//!
//! ## Critical Invariants
//!
//! 1. `RECORD_FIXED_PREFIX == RECORD_HEADER_SIZE + 2`
//! 2. `INLINE_FIELDS <= MAX_FIELDS_PER_RECORD`
//! 3. `ROLL_PTR_INSERT_FLAG & ROLL_PTR_UNDO_NO_MASK == 0`
//!
//! ## Usage
//!
//! ```ignore
//! use crate::config::{RECORD_HEADER_SIZE, SCRATCH_ARENA_CAPACITY};
//! ```

// ============================================================================
// RECORD LAYOUT
// ============================================================================

/// Size of the version header prepended to every record image.
///
/// Layout: `[flags: u8][trx_id: u64 BE][roll_ptr: u64 BE]`.
pub const RECORD_HEADER_SIZE: usize = 1 + 8 + 8;

/// Header plus the big-endian u16 field count.
pub const RECORD_FIXED_PREFIX: usize = RECORD_HEADER_SIZE + 2;

/// Width of one entry in the field end-offset table.
pub const FIELD_OFFSET_SIZE: usize = 4;

/// Upper bound on the number of fields a record may carry. Decoders reject
/// anything larger before allocating an offset table.
pub const MAX_FIELDS_PER_RECORD: usize = 1024;

/// Offset table entries kept inline in a `SmallVec` before spilling to the
/// heap. Covers every table used in practice without allocating.
pub const INLINE_FIELDS: usize = 16;

const _: () = assert!(
    RECORD_FIXED_PREFIX == RECORD_HEADER_SIZE + 2,
    "RECORD_FIXED_PREFIX must be header plus field count"
);

const _: () = assert!(
    INLINE_FIELDS <= MAX_FIELDS_PER_RECORD,
    "INLINE_FIELDS must not exceed MAX_FIELDS_PER_RECORD"
);

// ============================================================================
// ROLL POINTERS
// ============================================================================

/// Roll-pointer bit marking a version produced by an INSERT. Such a version
/// has no predecessor.
pub const ROLL_PTR_INSERT_FLAG: u64 = 1 << 63;

/// Bits of a roll pointer addressing the undo record.
pub const ROLL_PTR_UNDO_NO_MASK: u64 = ROLL_PTR_INSERT_FLAG - 1;

const _: () = assert!(
    ROLL_PTR_INSERT_FLAG & ROLL_PTR_UNDO_NO_MASK == 0,
    "insert flag must not overlap the undo number"
);

// ============================================================================
// VALUE ENCODING
// ============================================================================

/// Tag bytes of the self-delimiting value encoding used in record payloads
/// and undo records.
pub const TAG_NULL: u8 = 0;
pub const TAG_INT: u8 = 1;
pub const TAG_FLOAT: u8 = 2;
pub const TAG_TEXT: u8 = 3;
pub const TAG_BLOB: u8 = 4;
pub const TAG_EXTERN: u8 = 5;
pub const TAG_ARRAY: u8 = 6;

/// Marker byte leading an external-value reference.
pub const EXTERN_MARKER: u8 = 0xFE;

/// Encoded size of an external-value reference: marker + total_size + chunk_id.
pub const EXTERN_REF_SIZE: usize = 1 + 8 + 8;

/// Maximum nesting depth accepted when decoding array values.
pub const MAX_ARRAY_DEPTH: usize = 4;

// ============================================================================
// VERSION WALK MEMORY
// ============================================================================

/// Initial capacity of the per-step scratch arena. The arena is reset after
/// every walk step so this bounds steady-state memory for typical rows.
pub const SCRATCH_ARENA_CAPACITY: usize = 1024;

/// Initial capacity of each of the two version buffers the walker swaps
/// between (current version and predecessor under construction).
pub const VERSION_BUFFER_CAPACITY: usize = 256;

/// Initial capacity of the buffer receiving raw undo-record bytes.
pub const UNDO_BUFFER_CAPACITY: usize = 256;
