//! # Index Definitions
//!
//! An index is an ordered list of fields. Each field references either a
//! stored column or a virtual column and carries the rules used when an
//! entry is compared with a row version:
//!
//! - `prefix_len`: only the first N characters (text) or bytes (binary) are
//!   indexed
//! - `descending`: ordering only, never affects equality
//! - `collation`: text equality rule
//!
//! Secondary indexes hold the primary-key columns after their own fields so
//! that every entry identifies exactly one clustered row. `TableDef` appends
//! those fields when the index is attached.
//!
//! An index is multi-value when one of its fields references a multi-value
//! virtual column. Such an index stores one entry per array element.

use crate::types::Collation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRef {
    Stored(usize),
    Virtual(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexField {
    pub col: FieldRef,
    pub prefix_len: Option<usize>,
    pub descending: bool,
    pub collation: Collation,
}

impl IndexField {
    pub fn stored(col: usize) -> Self {
        Self {
            col: FieldRef::Stored(col),
            prefix_len: None,
            descending: false,
            collation: Collation::Binary,
        }
    }

    pub fn virtual_col(vcol: usize) -> Self {
        Self {
            col: FieldRef::Virtual(vcol),
            ..Self::stored(0)
        }
    }

    pub fn with_prefix(mut self, len: usize) -> Self {
        self.prefix_len = Some(len);
        self
    }

    pub fn with_collation(mut self, collation: Collation) -> Self {
        self.collation = collation;
        self
    }

    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.col, FieldRef::Virtual(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    id: u32,
    name: String,
    fields: Vec<IndexField>,
    n_user_fields: usize,
    multi_value: bool,
}

impl IndexDef {
    pub fn new(name: impl Into<String>, fields: Vec<IndexField>) -> Self {
        let n_user_fields = fields.len();
        Self {
            id: 0,
            name: name.into(),
            fields,
            n_user_fields,
            multi_value: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// All fields of an entry: user fields followed by primary-key fields.
    pub fn fields(&self) -> &[IndexField] {
        &self.fields
    }

    /// Fields declared by the user, without the appended primary key.
    pub fn user_fields(&self) -> &[IndexField] {
        &self.fields[..self.n_user_fields]
    }

    pub fn is_multi_value(&self) -> bool {
        self.multi_value
    }

    pub fn has_virtual(&self) -> bool {
        self.fields.iter().any(IndexField::is_virtual)
    }

    pub fn references_stored(&self, col: usize) -> bool {
        self.fields.iter().any(|f| f.col == FieldRef::Stored(col))
    }

    pub fn references_virtual(&self, vcol: usize) -> bool {
        self.fields.iter().any(|f| f.col == FieldRef::Virtual(vcol))
    }

    pub(super) fn attach(&mut self, id: u32, n_pk: usize, multi_value: bool) {
        self.id = id;
        self.multi_value = multi_value;
        for pk in 0..n_pk {
            let covered = self
                .fields
                .iter()
                .any(|f| f.col == FieldRef::Stored(pk) && f.prefix_len.is_none());
            if !covered {
                self.fields.push(IndexField::stored(pk));
            }
        }
    }
}
