//! # Secondary-Index Matcher
//!
//! Decides whether a row version would produce a given secondary-index
//! entry. Comparison follows the index's own rules: each field's collation,
//! prefix truncation of the version's value (characters for text, bytes for
//! binary), and element membership for the multi-value field.
//!
//! Stored fields are compared first. They are cheap, always available and
//! include the primary key, so most mismatches are found without touching
//! virtual columns. A virtual field whose value is missing from the virtual
//! row makes the answer `Undecidable` unless another field already
//! mismatched: the caller must look further back rather than guess.
//!
//! An unresolved external value never matches. It only occurs on a row whose
//! inserting transaction has not yet written the value, and that transaction
//! writes the secondary entries itself.

use crate::row::entry::field_value;
use crate::row::{IndexEntry, Row, VirtualRow};
use crate::schema::{IndexDef, IndexField};
use crate::types::{Collation, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    Match,
    Mismatch,
    Undecidable,
}

/// Compares under each field's collation.
pub fn matches(
    index: &IndexDef,
    row: &Row<'_>,
    vrow: Option<&VirtualRow>,
    entry: &IndexEntry,
) -> MatchResult {
    compare_entry(index, row, vrow, entry, false)
}

/// Compares byte for byte, so `'abc'` and `'ABC'` differ even under a
/// case-insensitive collation.
pub fn matches_binary(
    index: &IndexDef,
    row: &Row<'_>,
    vrow: Option<&VirtualRow>,
    entry: &IndexEntry,
) -> MatchResult {
    compare_entry(index, row, vrow, entry, true)
}

fn compare_entry(
    index: &IndexDef,
    row: &Row<'_>,
    vrow: Option<&VirtualRow>,
    entry: &IndexEntry,
    binary: bool,
) -> MatchResult {
    let fields = index.fields();
    if entry.fields.len() != fields.len() {
        return MatchResult::Mismatch;
    }

    for (field, want) in fields.iter().zip(&entry.fields) {
        if field.is_virtual() {
            continue;
        }
        let Some(have) = field_value(field.col, row, None) else {
            return MatchResult::Mismatch;
        };
        if !field_equal(index, field, &have, &want.to_value(), binary) {
            return MatchResult::Mismatch;
        }
    }

    let mut undecidable = false;
    for (field, want) in fields.iter().zip(&entry.fields) {
        if !field.is_virtual() {
            continue;
        }
        let Some(have) = field_value(field.col, row, vrow) else {
            undecidable = true;
            continue;
        };
        if !field_equal(index, field, &have, &want.to_value(), binary) {
            return MatchResult::Mismatch;
        }
    }

    if undecidable {
        MatchResult::Undecidable
    } else {
        MatchResult::Match
    }
}

fn field_equal(
    index: &IndexDef,
    field: &IndexField,
    have: &Value<'_>,
    want: &Value<'_>,
    binary: bool,
) -> bool {
    if have.is_extern() {
        return false;
    }
    let collation = if binary {
        Collation::Binary
    } else {
        field.collation
    };
    let have = match field.prefix_len {
        Some(n) => have.prefix(n),
        None => have.clone(),
    };
    if index.is_multi_value() && matches!(have, Value::Array(_)) {
        have.contains(want, collation)
    } else {
        have.eq_under(want, collation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::build_index_entries;
    use crate::schema::{ColumnDef, IndexField, TableDef};
    use crate::storage::ExternRef;
    use crate::types::{DataType, OwnedValue};
    use std::borrow::Cow;

    fn table() -> TableDef {
        TableDef::new(
            1,
            "t",
            vec![
                ColumnDef::new("id", DataType::Int8),
                ColumnDef::new("name", DataType::Text),
                ColumnDef::new("blob", DataType::Blob),
            ],
        )
        .with_index(IndexDef::new(
            "idx_name",
            vec![IndexField::stored(1)
                .with_prefix(3)
                .with_collation(Collation::CaseInsensitive)],
        ))
        .with_index(IndexDef::new("idx_blob", vec![IndexField::stored(2)]))
        .with_index(IndexDef::new("idx_v", vec![IndexField::virtual_col(0)]))
    }

    fn row(name: &str) -> Row<'_> {
        Row::new(vec![
            Value::Int(1),
            Value::Text(Cow::Borrowed(name)),
            Value::Blob(Cow::Borrowed(&b"bytes"[..])),
        ])
    }

    #[test]
    fn entry_derived_from_version_matches_it() {
        let t = table();
        let idx = t.index("idx_name").unwrap();
        let r = row("Zürich");
        for entry in build_index_entries(idx, &r, None).unwrap() {
            assert_eq!(matches(idx, &r, None, &entry), MatchResult::Match);
            assert_eq!(matches_binary(idx, &r, None, &entry), MatchResult::Match);
        }
        let other = build_index_entries(idx, &row("Genf"), None).unwrap();
        assert_eq!(matches(idx, &r, None, &other[0]), MatchResult::Mismatch);
    }

    #[test]
    fn prefix_and_collation_apply() {
        let t = table();
        let idx = t.index("idx_name").unwrap();
        let entry = IndexEntry::new(vec![OwnedValue::text("zÜr"), OwnedValue::Int(1)]);
        assert_eq!(matches(idx, &row("Zürich"), None, &entry), MatchResult::Match);
        assert_eq!(
            matches_binary(idx, &row("Zürich"), None, &entry),
            MatchResult::Mismatch
        );
    }

    #[test]
    fn primary_key_is_part_of_the_entry() {
        let t = table();
        let idx = t.index("idx_name").unwrap();
        let entry = IndexEntry::new(vec![OwnedValue::text("Zür"), OwnedValue::Int(2)]);
        assert_eq!(matches(idx, &row("Zürich"), None, &entry), MatchResult::Mismatch);
        let short = IndexEntry::new(vec![OwnedValue::text("Zür")]);
        assert_eq!(matches(idx, &row("Zürich"), None, &short), MatchResult::Mismatch);
    }

    #[test]
    fn unresolved_extern_never_matches() {
        let t = table();
        let idx = t.index("idx_blob").unwrap();
        let r = Row::new(vec![
            Value::Int(1),
            Value::Text(Cow::Borrowed("x")),
            Value::Extern(ExternRef::null(10_000)),
        ]);
        let entry = IndexEntry::new(vec![OwnedValue::Blob(b"bytes".to_vec()), OwnedValue::Int(1)]);
        assert_eq!(matches(idx, &r, None, &entry), MatchResult::Mismatch);
    }

    #[test]
    fn missing_virtual_value_is_undecidable_unless_stored_fields_differ() {
        let t = table();
        let idx = t.index("idx_v").unwrap();
        let entry = IndexEntry::new(vec![OwnedValue::Int(5), OwnedValue::Int(1)]);
        let missing = VirtualRow::new(1);
        assert_eq!(
            matches(idx, &row("a"), Some(&missing), &entry),
            MatchResult::Undecidable
        );

        let wrong_pk = IndexEntry::new(vec![OwnedValue::Int(5), OwnedValue::Int(2)]);
        assert_eq!(
            matches(idx, &row("a"), Some(&missing), &wrong_pk),
            MatchResult::Mismatch
        );

        let mut present = VirtualRow::new(1);
        present.set(0, OwnedValue::Int(5));
        assert_eq!(matches(idx, &row("a"), Some(&present), &entry), MatchResult::Match);
    }
}
