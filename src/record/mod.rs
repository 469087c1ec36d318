//! # Physical Record Images
//!
//! A record image is the byte form of one version of a row: a version header
//! followed by a field offset table and tagged values. Clustered-index
//! records, the predecessor images rebuilt from undo, and secondary-index
//! records all share this layout.
//!
//! - [`header`]: `RecordHeader` and `RollPtr`
//! - [`view`]: zero-copy `RecordView` with O(1) field access
//! - [`builder`]: serialization into reusable buffers

pub mod builder;
pub mod header;
pub mod view;

pub use builder::{build_record, set_header, write_record};
pub use header::{flags, RecordHeader, RollPtr};
pub use view::RecordView;
