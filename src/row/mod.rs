//! # Logical Rows and Index Entries
//!
//! The row/tuple codec sitting between record images and the matcher:
//!
//! - [`tuple`]: `Row`, stored values of one version with external values resolved
//! - [`virtual_row`]: `VirtualRow`, sparse virtual-column values
//! - [`entry`]: `IndexEntry` and derivation of a version's index entries

pub mod entry;
pub mod tuple;
pub mod virtual_row;

pub use entry::{build_index_entries, IndexEntry};
pub use tuple::{decode_row, resolve_externs, Row};
pub use virtual_row::VirtualRow;
