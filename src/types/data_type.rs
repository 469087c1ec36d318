//! # Column Data Types
//!
//! This module provides the `DataType` enum describing the stored and
//! computed columns a table can carry. The engine needs types for three
//! decisions:
//!
//! - Which values a column accepts when a new version is written
//! - How an externally stored value is decoded once fetched (text or bytes)
//! - How an index prefix length is measured (characters for text, bytes for
//!   binary data)
//!
//! | Type | Accepts | Prefix unit |
//! |------|---------|-------------|
//! | Int8 | `Int` | n/a |
//! | Float8 | `Float` | n/a |
//! | Text | `Text`, `Extern` | characters |
//! | Blob | `Blob`, `Extern` | bytes |
//!
//! NULL is accepted by every type.

use super::Value;

/// Data type of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int8,
    Float8,
    Text,
    Blob,
}

impl DataType {
    /// Returns true if this is a text-like type.
    pub fn is_text(&self) -> bool {
        matches!(self, DataType::Text)
    }

    /// Returns true if `value` may be stored in a column of this type.
    pub fn accepts(&self, value: &Value<'_>) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (DataType::Int8, Value::Int(_)) => true,
            (DataType::Float8, Value::Float(_)) => true,
            (DataType::Text, Value::Text(_) | Value::Extern(_)) => true,
            (DataType::Blob, Value::Blob(_) | Value::Extern(_)) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ExternRef;
    use std::borrow::Cow;

    #[test]
    fn only_text_is_text() {
        assert!(DataType::Text.is_text());
        assert!(!DataType::Blob.is_text());
        assert!(!DataType::Int8.is_text());
    }

    #[test]
    fn numeric_types_do_not_mix() {
        assert!(DataType::Int8.accepts(&Value::Int(2)));
        assert!(!DataType::Int8.accepts(&Value::Float(2.0)));
        assert!(DataType::Float8.accepts(&Value::Float(2.0)));
        assert!(!DataType::Float8.accepts(&Value::Int(2)));
    }

    #[test]
    fn null_and_extern_values() {
        let ext = Value::Extern(ExternRef::null(10));
        for dt in [DataType::Int8, DataType::Float8, DataType::Text, DataType::Blob] {
            assert!(dt.accepts(&Value::Null));
        }
        assert!(DataType::Text.accepts(&ext));
        assert!(DataType::Blob.accepts(&ext));
        assert!(!DataType::Int8.accepts(&ext));
        assert!(!DataType::Text.accepts(&Value::Blob(Cow::Borrowed(b"x"))));
        assert!(!DataType::Blob.accepts(&Value::Text(Cow::Borrowed("x"))));
    }
}
