//! # Text Collations
//!
//! Secondary indexes compare text under the collation declared on each index
//! field. Two collations are supported:
//!
//! | Collation | Equality |
//! |-----------|----------|
//! | `Binary` | byte-for-byte |
//! | `CaseInsensitive` | Unicode lowercase folding, character by character |
//!
//! Folding is done lazily over `char` iterators so no lowercase copy of the
//! operands is allocated.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Collation {
    #[default]
    Binary,
    CaseInsensitive,
}

impl Collation {
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            Collation::Binary => a.as_bytes().cmp(b.as_bytes()),
            Collation::CaseInsensitive => a
                .chars()
                .flat_map(char::to_lowercase)
                .cmp(b.chars().flat_map(char::to_lowercase)),
        }
    }
}
