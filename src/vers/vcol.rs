//! # Virtual-Column Materializer
//!
//! Virtual columns are not stored, so the value a version had must come
//! from somewhere else:
//!
//! - an undo record that logged it (an ordering column changed), merged
//!   into the walker's running row with [`VirtualRow::accumulate`]
//! - the version's own base columns, evaluated with the column expression
//!
//! Evaluation is always correct for the version it is given, but it needs
//! every base column the expression reads. An insert version never logged
//! virtual values, so for those evaluation is the only source.
//!
//! Only virtual columns referenced by some index are materialized.

use crate::row::VirtualRow;
use crate::schema::{TableDef, VirtualEvaluator};
use crate::types::Value;
use eyre::Result;

/// Evaluates every indexed virtual column of `table` against `base`.
/// Columns whose value cannot be computed are left missing.
pub fn materialize<E: VirtualEvaluator>(
    table: &TableDef,
    base: &[Value<'_>],
    eval: &E,
) -> Result<VirtualRow> {
    let mut row = VirtualRow::new(table.n_virtual());
    fill_missing(table, base, &mut row, eval)?;
    Ok(row)
}

/// Evaluates the indexed virtual columns still missing from `row`.
pub fn fill_missing<E: VirtualEvaluator>(
    table: &TableDef,
    base: &[Value<'_>],
    row: &mut VirtualRow,
    eval: &E,
) -> Result<()> {
    for vcol in table.indexed_virtual_columns() {
        if !row.is_missing(vcol) {
            continue;
        }
        if let Some(value) = eval.evaluate(table, vcol, base)? {
            row.set(vcol, value);
        }
    }
    Ok(())
}
