//! # Sparse Virtual Rows
//!
//! A `VirtualRow` holds values for a table's virtual columns, one slot per
//! column. A slot starts missing and is filled either from an undo record
//! that logged the column or by evaluating the column's expression.
//!
//! `accumulate` is a left-biased merge: slots already present are kept and
//! only missing slots are taken from the other row. Applying the same row
//! twice therefore changes nothing the second time.

use crate::types::OwnedValue;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct VirtualRow {
    values: Vec<Option<OwnedValue>>,
}

impl VirtualRow {
    pub fn new(n_virtual: usize) -> Self {
        Self {
            values: vec![None; n_virtual],
        }
    }

    /// True when no slot has a value.
    pub fn all_missing(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    pub fn get(&self, vcol: usize) -> Option<&OwnedValue> {
        self.values.get(vcol).and_then(Option::as_ref)
    }

    pub fn is_missing(&self, vcol: usize) -> bool {
        self.get(vcol).is_none()
    }

    pub fn set(&mut self, vcol: usize, value: OwnedValue) {
        if vcol >= self.values.len() {
            self.values.resize(vcol + 1, None);
        }
        self.values[vcol] = Some(value);
    }

    /// Fills missing slots from `other`, keeping present ones.
    pub fn accumulate(&mut self, other: &VirtualRow) {
        if other.values.len() > self.values.len() {
            self.values.resize(other.values.len(), None);
        }
        for (mine, theirs) in self.values.iter_mut().zip(other.values.iter()) {
            if mine.is_none() {
                mine.clone_from(theirs);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(vals: &[Option<i64>]) -> VirtualRow {
        let mut r = VirtualRow::new(vals.len());
        for (i, v) in vals.iter().enumerate() {
            if let Some(v) = v {
                r.set(i, OwnedValue::Int(*v));
            }
        }
        r
    }

    #[test]
    fn accumulate_is_left_biased() {
        let mut acc = row(&[Some(1), None, None]);
        acc.accumulate(&row(&[Some(9), Some(2), None]));
        assert_eq!(acc, row(&[Some(1), Some(2), None]));
    }

    #[test]
    fn accumulate_is_idempotent() {
        let undo = row(&[None, Some(5), Some(6)]);
        let mut once = row(&[Some(1), None, None]);
        once.accumulate(&undo);
        let mut twice = once.clone();
        twice.accumulate(&undo);
        assert_eq!(once, twice);
    }

    #[test]
    fn all_missing_ignores_width() {
        assert!(VirtualRow::new(3).all_missing());
        assert!(!row(&[None, Some(4), None]).all_missing());
    }
}
