//! # Table Definition
//!
//! `TableDef` bundles what the version engine needs to know about a table:
//! its stored columns (the clustered record layout), the primary-key prefix,
//! its virtual columns and its secondary indexes.
//!
//! ## Example
//!
//! ```rust,ignore
//! use rowvers::schema::{ColumnDef, GeneratedExpr, IndexDef, IndexField, TableDef, VirtualColumnDef};
//! use rowvers::types::DataType;
//!
//! let table = TableDef::new(1, "t", vec![
//!         ColumnDef::new("a", DataType::Int8),
//!         ColumnDef::new("b", DataType::Int8),
//!     ])
//!     .with_primary_key(1)
//!     .with_virtual_column(VirtualColumnDef::new(
//!         "b_plus_a",
//!         DataType::Int8,
//!         GeneratedExpr::add(GeneratedExpr::column(0), GeneratedExpr::column(1)),
//!     ))
//!     .with_index(IndexDef::new("idx_b", vec![IndexField::stored(1)]));
//! ```
//!
//! Virtual columns must be declared before the indexes that reference them.
//!
//! ## Ordering Columns
//!
//! A stored column is an ordering column when changing it can change some
//! index entry: it is part of the primary key, part of a secondary index, or
//! read by an indexed virtual column. Updates touching an ordering column log
//! the indexed virtual-column values in their undo record.

use super::column::{ColumnDef, VirtualColumnDef};
use super::index::{FieldRef, IndexDef};
use eyre::{eyre, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    id: u64,
    name: String,
    columns: Vec<ColumnDef>,
    n_pk: usize,
    virtual_columns: Vec<VirtualColumnDef>,
    indexes: Vec<IndexDef>,
}

impl TableDef {
    pub fn new(id: u64, name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            id,
            name: name.into(),
            columns,
            n_pk: 1,
            virtual_columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Declares the first `n_pk` stored columns as the primary key.
    pub fn with_primary_key(mut self, n_pk: usize) -> Self {
        debug_assert!(n_pk >= 1 && n_pk <= self.columns.len());
        self.n_pk = n_pk;
        self
    }

    pub fn with_virtual_column(mut self, vcol: VirtualColumnDef) -> Self {
        self.virtual_columns.push(vcol);
        self
    }

    pub fn with_index(mut self, mut index: IndexDef) -> Self {
        let multi_value = index.user_fields().iter().any(|f| match f.col {
            FieldRef::Virtual(v) => self
                .virtual_columns
                .get(v)
                .is_some_and(VirtualColumnDef::is_multi_value),
            FieldRef::Stored(_) => false,
        });
        index.attach(self.indexes.len() as u32 + 1, self.n_pk, multi_value);
        self.indexes.push(index);
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn n_fields(&self) -> usize {
        self.columns.len()
    }

    pub fn n_pk(&self) -> usize {
        self.n_pk
    }

    pub fn column(&self, idx: usize) -> Result<&ColumnDef> {
        self.columns
            .get(idx)
            .ok_or_else(|| eyre!("table '{}' has no column {}", self.name, idx))
    }

    pub fn virtual_columns(&self) -> &[VirtualColumnDef] {
        &self.virtual_columns
    }

    pub fn n_virtual(&self) -> usize {
        self.virtual_columns.len()
    }

    pub fn virtual_column(&self, vcol_no: usize) -> Result<&VirtualColumnDef> {
        self.virtual_columns
            .get(vcol_no)
            .ok_or_else(|| eyre!("table '{}' has no virtual column {}", self.name, vcol_no))
    }

    pub fn indexes(&self) -> &[IndexDef] {
        &self.indexes
    }

    pub fn index(&self, name: &str) -> Result<&IndexDef> {
        self.indexes
            .iter()
            .find(|idx| idx.name() == name)
            .ok_or_else(|| eyre!("table '{}' has no index '{}'", self.name, name))
    }

    /// Virtual columns referenced by at least one secondary index.
    pub fn indexed_virtual_columns(&self) -> Vec<usize> {
        (0..self.virtual_columns.len())
            .filter(|v| self.indexes.iter().any(|idx| idx.references_virtual(*v)))
            .collect()
    }

    pub fn is_ordering_column(&self, col: usize) -> bool {
        col < self.n_pk
            || self.indexes.iter().any(|idx| idx.references_stored(col))
            || self
                .indexed_virtual_columns()
                .into_iter()
                .any(|v| self.virtual_columns[v].expr().depends_on(col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{GeneratedExpr, IndexField};
    use crate::types::DataType;

    fn table() -> TableDef {
        TableDef::new(
            7,
            "t",
            vec![
                ColumnDef::new("id", DataType::Int8),
                ColumnDef::new("name", DataType::Text),
                ColumnDef::new("note", DataType::Text),
                ColumnDef::new("tags", DataType::Text),
            ],
        )
        .with_primary_key(1)
        .with_virtual_column(VirtualColumnDef::new(
            "lname",
            DataType::Text,
            GeneratedExpr::lower(GeneratedExpr::column(1)),
        ))
        .with_virtual_column(VirtualColumnDef::multi_value(
            "tag",
            DataType::Text,
            GeneratedExpr::split(GeneratedExpr::column(3), ','),
        ))
        .with_index(IndexDef::new("idx_lname", vec![IndexField::virtual_col(0)]))
        .with_index(IndexDef::new("idx_tag", vec![IndexField::virtual_col(1)]))
    }

    #[test]
    fn secondary_indexes_carry_primary_key() {
        let t = table();
        let idx = t.index("idx_lname").unwrap();
        assert_eq!(idx.fields().len(), 2);
        assert_eq!(idx.user_fields().len(), 1);
        assert_eq!(idx.fields()[1].col, FieldRef::Stored(0));
        assert!(idx.has_virtual());
        assert!(!idx.is_multi_value());
        assert!(t.index("idx_tag").unwrap().is_multi_value());
        assert!(t.index("missing").is_err());
    }

    #[test]
    fn ordering_columns_follow_virtual_dependencies() {
        let t = table();
        assert!(t.is_ordering_column(0));
        assert!(t.is_ordering_column(1));
        assert!(!t.is_ordering_column(2));
        assert!(t.is_ordering_column(3));
        assert_eq!(t.indexed_virtual_columns(), vec![0, 1]);
    }
}
