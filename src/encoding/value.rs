//! # Tagged Value Encoding
//!
//! Record payloads and undo records store column values in a
//! self-delimiting form: a one-byte tag followed by the value body.
//!
//! ```text
//! Null    [0]
//! Int     [1][i64 BE]
//! Float   [2][f64 bits BE]
//! Text    [3][varint len][utf-8 bytes]
//! Blob    [4][varint len][bytes]
//! Extern  [5][0xFE][total_size u64 LE][chunk_id u64 LE]
//! Array   [6][varint count][value]*
//! ```
//!
//! Decoding borrows text and blob bodies from the input buffer. Every length
//! is checked against the remaining input, so arbitrary bytes produce an
//! error and never a panic.

use super::varint::{decode_varint, put_varint};
use crate::config::{
    EXTERN_REF_SIZE, MAX_ARRAY_DEPTH, TAG_ARRAY, TAG_BLOB, TAG_EXTERN, TAG_FLOAT, TAG_INT,
    TAG_NULL, TAG_TEXT,
};
use crate::storage::ExternRef;
use crate::types::{OwnedValue, Value};
use eyre::{bail, ensure, Result, WrapErr};
use std::borrow::Cow;

/// Appends the encoding of `value` to `out`.
pub fn encode_value(value: &Value<'_>, out: &mut Vec<u8>) {
    match value {
        Value::Null => out.push(TAG_NULL),
        Value::Int(i) => {
            out.push(TAG_INT);
            out.extend_from_slice(&i.to_be_bytes());
        }
        Value::Float(f) => {
            out.push(TAG_FLOAT);
            out.extend_from_slice(&f.to_bits().to_be_bytes());
        }
        Value::Text(s) => {
            out.push(TAG_TEXT);
            put_varint(s.len() as u64, out);
            out.extend_from_slice(s.as_bytes());
        }
        Value::Blob(b) => {
            out.push(TAG_BLOB);
            put_varint(b.len() as u64, out);
            out.extend_from_slice(b);
        }
        Value::Extern(ext) => {
            out.push(TAG_EXTERN);
            out.extend_from_slice(&ext.encode());
        }
        Value::Array(items) => {
            out.push(TAG_ARRAY);
            put_varint(items.len() as u64, out);
            for item in items {
                encode_value(item, out);
            }
        }
    }
}

pub fn encode_owned(value: &OwnedValue, out: &mut Vec<u8>) {
    encode_value(&value.to_value(), out);
}

/// Decodes one value from the front of `buf`, returning `(value, bytes_read)`.
pub fn decode_value(buf: &[u8]) -> Result<(Value<'_>, usize)> {
    decode_nested(buf, 0)
}

fn decode_nested(buf: &[u8], depth: usize) -> Result<(Value<'_>, usize)> {
    ensure!(!buf.is_empty(), "empty buffer for value decode");
    let body = &buf[1..];

    match buf[0] {
        TAG_NULL => Ok((Value::Null, 1)),
        TAG_INT => {
            ensure!(body.len() >= 8, "truncated int value");
            let i = i64::from_be_bytes(body[..8].try_into()?);
            Ok((Value::Int(i), 9))
        }
        TAG_FLOAT => {
            ensure!(body.len() >= 8, "truncated float value");
            let bits = u64::from_be_bytes(body[..8].try_into()?);
            Ok((Value::Float(f64::from_bits(bits)), 9))
        }
        TAG_TEXT => {
            let (bytes, used) = length_prefixed(body)?;
            let s = std::str::from_utf8(bytes).wrap_err("text value is not valid utf-8")?;
            Ok((Value::Text(Cow::Borrowed(s)), 1 + used))
        }
        TAG_BLOB => {
            let (bytes, used) = length_prefixed(body)?;
            Ok((Value::Blob(Cow::Borrowed(bytes)), 1 + used))
        }
        TAG_EXTERN => {
            let ext = ExternRef::decode(body)?;
            Ok((Value::Extern(ext), 1 + EXTERN_REF_SIZE))
        }
        TAG_ARRAY => {
            ensure!(depth < MAX_ARRAY_DEPTH, "array nesting exceeds {}", MAX_ARRAY_DEPTH);
            let (count, mut pos) = decode_varint(body)?;
            // every element takes at least one byte
            ensure!(
                count as usize <= body.len() - pos,
                "array count {} exceeds remaining input",
                count
            );
            let mut items = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let (item, used) = decode_nested(&body[pos..], depth + 1)?;
                items.push(item);
                pos += used;
            }
            Ok((Value::Array(items), 1 + pos))
        }
        tag => bail!("unknown value tag: {}", tag),
    }
}

fn length_prefixed(buf: &[u8]) -> Result<(&[u8], usize)> {
    let (len, hdr) = decode_varint(buf)?;
    let len = usize::try_from(len)?;
    ensure!(
        len <= buf.len() - hdr,
        "value length {} exceeds remaining {} bytes",
        len,
        buf.len() - hdr
    );
    Ok((&buf[hdr..hdr + len], hdr + len))
}
