//! # Value Type System
//!
//! This module provides the column types and runtime values flowing through
//! the record codec, the version builder and the secondary-index matcher.
//!
//! ## Module Structure
//!
//! - `data_type`: `DataType` discriminant for stored and virtual columns
//! - `value`: Runtime `Value<'a>` with zero-copy support
//! - `owned_value`: Heap-owned `OwnedValue` for values outliving a record
//! - `collation`: Text comparison rules used by index fields
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | `DataType` | Column type discriminant |
//! | `Value<'a>` | Runtime value (zero-copy from record images) |
//! | `OwnedValue` | Heap-owned value (virtual rows, index entries) |
//! | `Collation` | Text equality rule of an index field |
//!
//! ## Usage
//!
//! ```ignore
//! use rowvers::types::{Collation, OwnedValue, Value};
//!
//! let val = Value::Int(42);
//! let owned: OwnedValue = (&val).into();
//! assert!(owned.to_value().eq_under(&val, Collation::Binary));
//! ```

mod collation;
mod data_type;
mod owned_value;
mod value;

pub use collation::Collation;
pub use data_type::DataType;
pub use owned_value::OwnedValue;
pub use value::Value;
