//! # Runtime Value Representation
//!
//! This module provides `Value<'a>`, the runtime representation for column
//! values decoded from physical records. Text and blob payloads use `Cow` so
//! a value can borrow straight out of a record image (zero-copy) while still
//! supporting owned data when a value is computed.
//!
//! ## Value Variants
//!
//! | Variant | Rust Type | Description |
//! |---------|-----------|-------------|
//! | Null | - | SQL NULL |
//! | Int | i64 | 64-bit signed integer |
//! | Float | f64 | 64-bit floating point |
//! | Text | Cow<str> | UTF-8 string |
//! | Blob | Cow<[u8]> | Binary data |
//! | Extern | ExternRef | Reference to an externally stored value |
//! | Array | Vec<Value> | Multi-valued virtual column result |
//!
//! ## Equality Semantics
//!
//! Index matching needs equality, not SQL three-valued logic: two NULLs in
//! the same index position are equal (an index entry with a NULL key part
//! matches the row that produced it). `compare()` therefore orders NULL
//! first and treats NULL == NULL.
//!
//! Text comparison is collation dependent, see [`Collation`]. An `Extern`
//! value has no comparable payload; callers must resolve it first.

use super::Collation;
use crate::storage::ExternRef;
use std::borrow::Cow;
use std::cmp::Ordering;

/// Runtime value representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Null,
    Int(i64),
    Float(f64),
    Text(Cow<'a, str>),
    Blob(Cow<'a, [u8]>),
    Extern(ExternRef),
    Array(Vec<Value<'a>>),
}

impl<'a> Value<'a> {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this value still points at external storage.
    pub fn is_extern(&self) -> bool {
        matches!(self, Value::Extern(_))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Rank used to order values of different variants.
    fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Int(_) | Value::Float(_) => 1,
            Value::Text(_) => 2,
            Value::Blob(_) => 3,
            Value::Array(_) => 4,
            Value::Extern(_) => 5,
        }
    }

    /// Compares two values under `collation`.
    ///
    /// Int and Float compare numerically. Under `Collation::Binary` an Int
    /// and a Float are never equal: on a numeric tie the Int sorts first,
    /// since the two are stored differently. Values of unrelated variants
    /// are ordered by variant rank so the result is always total.
    pub fn compare(&self, other: &Value<'_>, collation: Collation) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Int(a), Value::Float(b)) => {
                let ord = (*a as f64).total_cmp(b);
                match collation {
                    Collation::Binary => ord.then(Ordering::Less),
                    _ => ord,
                }
            }
            (Value::Float(_), Value::Int(_)) => other.compare(self, collation).reverse(),
            (Value::Text(a), Value::Text(b)) => collation.compare(a, b),
            (Value::Blob(a), Value::Blob(b)) => a.as_ref().cmp(b.as_ref()),
            (Value::Array(a), Value::Array(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = x.compare(y, collation);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (Value::Extern(a), Value::Extern(b)) => {
                (a.chunk_id, a.total_size).cmp(&(b.chunk_id, b.total_size))
            }
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }

    /// Equality under `collation`.
    pub fn eq_under(&self, other: &Value<'_>, collation: Collation) -> bool {
        self.compare(other, collation) == Ordering::Equal
    }

    /// Truncates text to `chars` characters or binary data to `chars` bytes,
    /// mirroring how a prefix index stores its key part.
    pub fn prefix(&self, chars: usize) -> Value<'a> {
        match self {
            Value::Text(s) => match s.char_indices().nth(chars) {
                Some((byte_end, _)) => match s {
                    Cow::Borrowed(b) => Value::Text(Cow::Borrowed(&b[..byte_end])),
                    Cow::Owned(o) => Value::Text(Cow::Owned(o[..byte_end].to_string())),
                },
                None => self.clone(),
            },
            Value::Blob(b) if b.len() > chars => match b {
                Cow::Borrowed(slice) => Value::Blob(Cow::Borrowed(&slice[..chars])),
                Cow::Owned(v) => Value::Blob(Cow::Owned(v[..chars].to_vec())),
            },
            other => other.clone(),
        }
    }

    /// Returns true if `needle` equals any element of this array value.
    /// A scalar value behaves as a one-element array.
    pub fn contains(&self, needle: &Value<'_>, collation: Collation) -> bool {
        match self {
            Value::Array(items) => items.iter().any(|v| v.eq_under(needle, collation)),
            scalar => scalar.eq_under(needle, collation),
        }
    }

    /// Detaches the value from any borrowed buffer.
    pub fn into_static(self) -> Value<'static> {
        match self {
            Value::Null => Value::Null,
            Value::Int(i) => Value::Int(i),
            Value::Float(f) => Value::Float(f),
            Value::Text(s) => Value::Text(Cow::Owned(s.into_owned())),
            Value::Blob(b) => Value::Blob(Cow::Owned(b.into_owned())),
            Value::Extern(r) => Value::Extern(r),
            Value::Array(items) => Value::Array(items.into_iter().map(Value::into_static).collect()),
        }
    }
}
