//! # Encoding Module
//!
//! Byte-level codecs shared by record images and undo records:
//!
//! - **Varint encoding**: Variable-length integers for lengths and counts
//! - **Value encoding**: Self-delimiting tagged column values

pub mod value;
pub mod varint;

pub use value::{decode_value, encode_owned, encode_value};
pub use varint::{decode_varint, encode_varint, put_varint, varint_len};
