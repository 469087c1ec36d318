//! # Decoded Rows
//!
//! `Row` is the logical form of one clustered record version: its stored
//! column values in declaration order, borrowed from the record image where
//! possible. Externally stored values are resolved through an
//! [`ExternStore`] while decoding. A reference that cannot be resolved stays
//! as `Value::Extern`, which downstream code treats as "value unknown".

use crate::record::RecordView;
use crate::schema::TableDef;
use crate::storage::ExternStore;
use crate::types::Value;
use eyre::{ensure, Result, WrapErr};
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq)]
pub struct Row<'a> {
    values: Vec<Value<'a>>,
}

impl<'a> Row<'a> {
    pub fn new(values: Vec<Value<'a>>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value<'a>] {
        &self.values
    }

    pub fn get(&self, idx: usize) -> Option<&Value<'a>> {
        self.values.get(idx)
    }

    pub fn into_values(self) -> Vec<Value<'a>> {
        self.values
    }

    pub fn has_unresolved(&self) -> bool {
        self.values.iter().any(Value::is_extern)
    }
}

/// Decodes `view` into a row of `table`, resolving external values.
pub fn decode_row<'a, X: ExternStore>(
    view: &RecordView<'a>,
    table: &TableDef,
    ext: &X,
) -> Result<Row<'a>> {
    ensure!(
        view.n_fields() == table.n_fields(),
        "record has {} fields, table '{}' has {}",
        view.n_fields(),
        table.name(),
        table.n_fields()
    );

    let mut values = view.values()?;
    resolve_externs(&mut values, table, ext)?;
    Ok(Row::new(values))
}

/// Replaces every resolvable `Value::Extern` in `values` with the fetched
/// text or binary value, according to the column type.
pub fn resolve_externs<X: ExternStore>(
    values: &mut [Value<'_>],
    table: &TableDef,
    ext: &X,
) -> Result<()> {
    for (i, value) in values.iter_mut().enumerate() {
        let Value::Extern(r) = value else {
            continue;
        };
        let Some(bytes) = ext.fetch(r)? else {
            continue;
        };
        *value = if table.column(i)?.data_type().is_text() {
            let s = String::from_utf8(bytes)
                .wrap_err_with(|| format!("external text in column {} is not utf-8", i))?;
            Value::Text(Cow::Owned(s))
        } else {
            Value::Blob(Cow::Owned(bytes))
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{build_record, RecordHeader, RollPtr};
    use crate::schema::ColumnDef;
    use crate::storage::{ExternRef, MemoryExternStore};
    use crate::types::DataType;

    fn table() -> TableDef {
        TableDef::new(
            1,
            "docs",
            vec![
                ColumnDef::new("id", DataType::Int8),
                ColumnDef::new("body", DataType::Text),
            ],
        )
    }

    #[test]
    fn external_text_is_resolved() {
        let store = MemoryExternStore::new();
        let ext = store.store("a long body".as_bytes());
        let rec = build_record(
            RecordHeader::new(1, RollPtr::insert(1)),
            &[Value::Int(1), Value::Extern(ext)],
        );
        let view = RecordView::new(&rec).unwrap();
        let row = decode_row(&view, &table(), &store).unwrap();
        assert_eq!(row.get(1), Some(&Value::Text(Cow::Borrowed("a long body"))));
        assert!(!row.has_unresolved());
    }

    #[test]
    fn null_reference_stays_unresolved() {
        let store = MemoryExternStore::new();
        let rec = build_record(
            RecordHeader::new(1, RollPtr::insert(1)),
            &[Value::Int(1), Value::Extern(ExternRef::null(50))],
        );
        let view = RecordView::new(&rec).unwrap();
        let row = decode_row(&view, &table(), &store).unwrap();
        assert!(row.has_unresolved());
    }

    #[test]
    fn field_count_mismatch_is_an_error() {
        let rec = build_record(RecordHeader::default(), &[Value::Int(1)]);
        let view = RecordView::new(&rec).unwrap();
        assert!(decode_row(&view, &table(), &MemoryExternStore::new()).is_err());
    }
}
