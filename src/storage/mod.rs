//! # Storage Collaborators
//!
//! The version engine never touches pages directly. It only needs to resolve
//! column values that were moved out of the record image:
//!
//! - [`extern_store`]: external (off-record) storage for large TEXT/BLOB values

pub mod extern_store;

pub use extern_store::{ExternRef, ExternStore, MemoryExternStore};
