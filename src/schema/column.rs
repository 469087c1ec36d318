//! # Column Definitions
//!
//! A table has two kinds of columns:
//!
//! - **Stored columns** (`ColumnDef`): materialized in every clustered record
//!   image, in declaration order. The first `n_pk` stored columns form the
//!   primary key.
//! - **Virtual columns** (`VirtualColumnDef`): never stored in the clustered
//!   record. Their value is computed from stored columns by a
//!   [`GeneratedExpr`], or recovered from undo records when an indexed
//!   column changed.
//!
//! A virtual column flagged `multi_value` evaluates to an array and an index
//! on it holds one entry per array element.

use super::expr::GeneratedExpr;
use crate::types::DataType;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    name: String,
    data_type: DataType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VirtualColumnDef {
    name: String,
    data_type: DataType,
    expr: GeneratedExpr,
    multi_value: bool,
}

impl VirtualColumnDef {
    pub fn new(name: impl Into<String>, data_type: DataType, expr: GeneratedExpr) -> Self {
        Self {
            name: name.into(),
            data_type,
            expr,
            multi_value: false,
        }
    }

    /// Virtual column producing an array, indexed one element per entry.
    pub fn multi_value(name: impl Into<String>, element_type: DataType, expr: GeneratedExpr) -> Self {
        Self {
            multi_value: true,
            ..Self::new(name, element_type, expr)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type of the value, or of each element for a multi-value column.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn expr(&self) -> &GeneratedExpr {
        &self.expr
    }

    pub fn is_multi_value(&self) -> bool {
        self.multi_value
    }
}
