//! # Schema Metadata
//!
//! Table, column and index definitions consumed by the version engine. The
//! engine never changes a schema; it only reads column types, index field
//! rules and virtual-column expressions.
//!
//! - [`table`]: `TableDef`, ordering-column analysis
//! - [`column`]: stored and virtual column definitions
//! - [`index`]: index fields with prefix, collation and multi-value rules
//! - [`expr`]: generated-column expressions and the `VirtualEvaluator` seam

pub mod column;
pub mod expr;
pub mod index;
pub mod table;

pub use column::{ColumnDef, VirtualColumnDef};
pub use expr::{ExprEvaluator, GeneratedExpr, VirtualEvaluator};
pub use index::{FieldRef, IndexDef, IndexField};
pub use table::TableDef;
