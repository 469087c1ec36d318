//! # Heap-Owned Value Representation
//!
//! `OwnedValue` is the fully-owned counterpart of `Value<'a>`. It is used
//! wherever a value must outlive the buffer it was decoded from:
//!
//! - Virtual-column values carried across version-walk steps
//! - Index entries handed in by callers (purge, lock resolution)
//! - Column values supplied to the version producer (insert/update)
//!
//! ## Conversion
//!
//! ```ignore
//! // Value -> OwnedValue (always works, may allocate)
//! let owned: OwnedValue = (&value).into();
//!
//! // OwnedValue -> Value (borrows from owned)
//! let borrowed: Value<'_> = owned.to_value();
//! ```

use super::Value;
use crate::storage::ExternRef;
use std::borrow::Cow;

/// Fully-owned column value.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    Extern(ExternRef),
    Array(Vec<OwnedValue>),
}

impl OwnedValue {
    pub fn text(s: impl Into<String>) -> Self {
        OwnedValue::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, OwnedValue::Null)
    }

    /// Borrows this value as a `Value<'_>`.
    pub fn to_value(&self) -> Value<'_> {
        match self {
            OwnedValue::Null => Value::Null,
            OwnedValue::Int(i) => Value::Int(*i),
            OwnedValue::Float(f) => Value::Float(*f),
            OwnedValue::Text(s) => Value::Text(Cow::Borrowed(s.as_str())),
            OwnedValue::Blob(b) => Value::Blob(Cow::Borrowed(b.as_slice())),
            OwnedValue::Extern(r) => Value::Extern(*r),
            OwnedValue::Array(items) => Value::Array(items.iter().map(|v| v.to_value()).collect()),
        }
    }
}

impl<'a> From<&Value<'a>> for OwnedValue {
    fn from(v: &Value<'a>) -> Self {
        match v {
            Value::Null => OwnedValue::Null,
            Value::Int(i) => OwnedValue::Int(*i),
            Value::Float(f) => OwnedValue::Float(*f),
            Value::Text(s) => OwnedValue::Text(s.to_string()),
            Value::Blob(b) => OwnedValue::Blob(b.to_vec()),
            Value::Extern(r) => OwnedValue::Extern(*r),
            Value::Array(items) => OwnedValue::Array(items.iter().map(OwnedValue::from).collect()),
        }
    }
}

impl<'a> From<Value<'a>> for OwnedValue {
    fn from(v: Value<'a>) -> Self {
        OwnedValue::from(&v)
    }
}

impl From<i64> for OwnedValue {
    fn from(i: i64) -> Self {
        OwnedValue::Int(i)
    }
}

impl From<&str> for OwnedValue {
    fn from(s: &str) -> Self {
        OwnedValue::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_value_borrows_text() {
        let owned = OwnedValue::text("alice");
        match owned.to_value() {
            Value::Text(Cow::Borrowed(s)) => assert_eq!(s, "alice"),
            other => panic!("expected borrowed text, got {:?}", other),
        }
    }

    #[test]
    fn array_converts_element_wise() {
        let v = Value::Array(vec![Value::Int(1), Value::Text(Cow::Borrowed("x"))]);
        let owned = OwnedValue::from(&v);
        assert_eq!(
            owned,
            OwnedValue::Array(vec![OwnedValue::Int(1), OwnedValue::text("x")])
        );
    }
}
