//! # Secondary-Index Entries
//!
//! An `IndexEntry` is the logical content of one secondary-index record: the
//! index's field values (user fields then primary key) plus the record's
//! delete mark. Entries are only compared, never modified in place.
//!
//! `build_index_entries` derives the entries a row version produces in an
//! index. It returns `None` when a needed value is unknown: an unresolved
//! external value, or a virtual column missing from the virtual row.

use super::tuple::Row;
use super::virtual_row::VirtualRow;
use crate::record::{build_record, RecordHeader, RecordView};
use crate::schema::{FieldRef, IndexDef};
use crate::types::{OwnedValue, Value};
use eyre::Result;
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub fields: Vec<OwnedValue>,
    pub delete_marked: bool,
}

impl IndexEntry {
    pub fn new(fields: Vec<OwnedValue>) -> Self {
        Self {
            fields,
            delete_marked: false,
        }
    }

    pub fn delete_marked(mut self, marked: bool) -> Self {
        self.delete_marked = marked;
        self
    }

    pub fn from_record(view: &RecordView<'_>) -> Result<Self> {
        let fields = view
            .values()?
            .iter()
            .map(OwnedValue::from)
            .collect();
        Ok(Self {
            fields,
            delete_marked: view.is_delete_marked(),
        })
    }

    /// Secondary-index record image of this entry.
    pub fn to_record(&self) -> Vec<u8> {
        let values: Vec<Value<'_>> = self.fields.iter().map(OwnedValue::to_value).collect();
        build_record(RecordHeader::secondary(self.delete_marked), &values)
    }
}

/// Value a version contributes to one index field, before prefix truncation.
pub(crate) fn field_value<'r>(
    col: FieldRef,
    row: &'r Row<'_>,
    vrow: Option<&'r VirtualRow>,
) -> Option<Value<'r>> {
    match col {
        FieldRef::Stored(i) => row.get(i).map(|v| match v {
            Value::Text(s) => Value::Text(Cow::Borrowed(s.as_ref())),
            Value::Blob(b) => Value::Blob(Cow::Borrowed(b.as_ref())),
            other => other.clone(),
        }),
        FieldRef::Virtual(v) => vrow.and_then(|r| r.get(v)).map(OwnedValue::to_value),
    }
}

/// Derives the entries `index` holds for the version given by `row` and
/// `vrow`. A multi-value index yields one entry per distinct array element.
pub fn build_index_entries(
    index: &IndexDef,
    row: &Row<'_>,
    vrow: Option<&VirtualRow>,
) -> Option<Vec<IndexEntry>> {
    let mut fields = Vec::with_capacity(index.fields().len());
    let mut multi: Option<(usize, Vec<OwnedValue>)> = None;

    for (pos, field) in index.fields().iter().enumerate() {
        let value = field_value(field.col, row, vrow)?;
        if value.is_extern() {
            return None;
        }
        let value = match field.prefix_len {
            Some(n) => value.prefix(n),
            None => value,
        };
        match value {
            Value::Array(items) if index.is_multi_value() => {
                let mut elems: Vec<OwnedValue> = Vec::with_capacity(items.len());
                for item in &items {
                    let owned = OwnedValue::from(item);
                    if !elems.contains(&owned) {
                        elems.push(owned);
                    }
                }
                multi = Some((pos, elems));
                fields.push(OwnedValue::Null);
            }
            other => fields.push(OwnedValue::from(&other)),
        }
    }

    match multi {
        None => Some(vec![IndexEntry::new(fields)]),
        Some((pos, elems)) => Some(
            elems
                .into_iter()
                .map(|elem| {
                    let mut f = fields.clone();
                    f[pos] = elem;
                    IndexEntry::new(f)
                })
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDef, IndexField, TableDef};
    use crate::storage::ExternRef;
    use crate::types::DataType;

    fn row() -> Row<'static> {
        Row::new(vec![
            Value::Int(10),
            Value::Text(Cow::Borrowed("Grüße aus Köln")),
            Value::Extern(ExternRef::null(4096)),
        ])
    }

    #[test]
    fn entry_carries_prefix_and_primary_key() {
        let table = TableDef::new(
            1,
            "t",
            vec![
                ColumnDef::new("id", DataType::Int8),
                ColumnDef::new("s", DataType::Text),
            ],
        )
        .with_index(IndexDef::new("i", vec![IndexField::stored(1).with_prefix(4)]));
        let idx = table.index("i").unwrap();

        let entries = build_index_entries(idx, &row(), None).unwrap();
        assert_eq!(
            entries,
            vec![IndexEntry::new(vec![OwnedValue::text("Grüß"), OwnedValue::Int(10)])]
        );
    }

    #[test]
    fn unresolved_extern_and_missing_virtual_give_none() {
        let on_blob = IndexDef::new("b", vec![IndexField::stored(2)]);
        assert!(build_index_entries(&on_blob, &row(), None).is_none());

        let on_virtual = IndexDef::new("v", vec![IndexField::virtual_col(0)]);
        assert!(build_index_entries(&on_virtual, &row(), Some(&VirtualRow::new(1))).is_none());
    }

    #[test]
    fn record_form_keeps_delete_mark() {
        let entry = IndexEntry::new(vec![OwnedValue::Int(1), OwnedValue::text("k")]).delete_marked(true);
        let rec = entry.to_record();
        let view = RecordView::new(&rec).unwrap();
        assert_eq!(IndexEntry::from_record(&view).unwrap(), entry);
    }
}
