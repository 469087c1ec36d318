//! # Generated Column Expressions
//!
//! Virtual columns are defined by a small expression language evaluated
//! against the stored (base) columns of one row version:
//!
//! | Expression | Result |
//! |------------|--------|
//! | `Column(i)` | stored column `i` |
//! | `Literal(v)` | constant |
//! | `Add(a, b)` | numeric sum (Int + Int stays Int) |
//! | `Concat([..])` | text concatenation of the operands |
//! | `Lower(e)` / `Upper(e)` | case-mapped text |
//! | `Substr { expr, start, len }` | character substring, 0-based |
//! | `Split { expr, sep }` | array of the non-empty pieces |
//!
//! NULL propagates through every operator. Evaluation yields `Ok(None)` when
//! a referenced base column is an unresolved external value: the value of
//! the virtual column is then unknown rather than wrong.

use super::TableDef;
use crate::types::{OwnedValue, Value};
use eyre::{bail, ensure, Result};

/// Computes virtual-column values from base columns.
///
/// `base` holds the stored columns of one version in declaration order, with
/// external values already resolved where possible.
pub trait VirtualEvaluator {
    fn evaluate(
        &self,
        table: &TableDef,
        vcol_no: usize,
        base: &[Value<'_>],
    ) -> Result<Option<OwnedValue>>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedExpr {
    Column(usize),
    Literal(OwnedValue),
    Add(Box<GeneratedExpr>, Box<GeneratedExpr>),
    Concat(Vec<GeneratedExpr>),
    Lower(Box<GeneratedExpr>),
    Upper(Box<GeneratedExpr>),
    Substr {
        expr: Box<GeneratedExpr>,
        start: usize,
        len: usize,
    },
    Split {
        expr: Box<GeneratedExpr>,
        sep: char,
    },
}

impl GeneratedExpr {
    pub fn column(i: usize) -> Self {
        GeneratedExpr::Column(i)
    }

    pub fn add(a: GeneratedExpr, b: GeneratedExpr) -> Self {
        GeneratedExpr::Add(Box::new(a), Box::new(b))
    }

    pub fn lower(e: GeneratedExpr) -> Self {
        GeneratedExpr::Lower(Box::new(e))
    }

    pub fn upper(e: GeneratedExpr) -> Self {
        GeneratedExpr::Upper(Box::new(e))
    }

    pub fn substr(e: GeneratedExpr, start: usize, len: usize) -> Self {
        GeneratedExpr::Substr {
            expr: Box::new(e),
            start,
            len,
        }
    }

    pub fn split(e: GeneratedExpr, sep: char) -> Self {
        GeneratedExpr::Split {
            expr: Box::new(e),
            sep,
        }
    }

    /// Appends every stored column this expression reads to `out`.
    pub fn base_columns(&self, out: &mut Vec<usize>) {
        match self {
            GeneratedExpr::Column(i) => {
                if !out.contains(i) {
                    out.push(*i);
                }
            }
            GeneratedExpr::Literal(_) => {}
            GeneratedExpr::Add(a, b) => {
                a.base_columns(out);
                b.base_columns(out);
            }
            GeneratedExpr::Concat(parts) => parts.iter().for_each(|p| p.base_columns(out)),
            GeneratedExpr::Lower(e)
            | GeneratedExpr::Upper(e)
            | GeneratedExpr::Substr { expr: e, .. }
            | GeneratedExpr::Split { expr: e, .. } => e.base_columns(out),
        }
    }

    pub fn depends_on(&self, col: usize) -> bool {
        let mut cols = Vec::new();
        self.base_columns(&mut cols);
        cols.contains(&col)
    }

    pub fn eval(&self, base: &[Value<'_>]) -> Result<Option<OwnedValue>> {
        let value = match self {
            GeneratedExpr::Column(i) => {
                ensure!(*i < base.len(), "column {} out of range ({} base columns)", i, base.len());
                if base[*i].is_extern() {
                    return Ok(None);
                }
                OwnedValue::from(&base[*i])
            }
            GeneratedExpr::Literal(v) => v.clone(),
            GeneratedExpr::Add(a, b) => {
                let (Some(a), Some(b)) = (a.eval(base)?, b.eval(base)?) else {
                    return Ok(None);
                };
                match (a, b) {
                    (OwnedValue::Null, _) | (_, OwnedValue::Null) => OwnedValue::Null,
                    (OwnedValue::Int(x), OwnedValue::Int(y)) => match x.checked_add(y) {
                        Some(sum) => OwnedValue::Int(sum),
                        None => bail!("integer overflow in generated column: {} + {}", x, y),
                    },
                    (OwnedValue::Int(x), OwnedValue::Float(y)) => OwnedValue::Float(x as f64 + y),
                    (OwnedValue::Float(x), OwnedValue::Int(y)) => OwnedValue::Float(x + y as f64),
                    (OwnedValue::Float(x), OwnedValue::Float(y)) => OwnedValue::Float(x + y),
                    (a, b) => bail!("cannot add {:?} and {:?}", a, b),
                }
            }
            GeneratedExpr::Concat(parts) => {
                let mut out = String::new();
                for part in parts {
                    let Some(v) = part.eval(base)? else {
                        return Ok(None);
                    };
                    match v {
                        OwnedValue::Null => return Ok(Some(OwnedValue::Null)),
                        OwnedValue::Text(s) => out.push_str(&s),
                        OwnedValue::Int(i) => out.push_str(&i.to_string()),
                        OwnedValue::Float(f) => out.push_str(&f.to_string()),
                        other => bail!("cannot concatenate {:?}", other),
                    }
                }
                OwnedValue::Text(out)
            }
            GeneratedExpr::Lower(e) | GeneratedExpr::Upper(e) => {
                let Some(v) = e.eval(base)? else {
                    return Ok(None);
                };
                match v {
                    OwnedValue::Null => OwnedValue::Null,
                    OwnedValue::Text(s) if matches!(self, GeneratedExpr::Lower(_)) => {
                        OwnedValue::Text(s.to_lowercase())
                    }
                    OwnedValue::Text(s) => OwnedValue::Text(s.to_uppercase()),
                    other => bail!("case mapping needs text, got {:?}", other),
                }
            }
            GeneratedExpr::Substr { expr, start, len } => {
                let Some(v) = expr.eval(base)? else {
                    return Ok(None);
                };
                match v {
                    OwnedValue::Null => OwnedValue::Null,
                    OwnedValue::Text(s) => {
                        OwnedValue::Text(s.chars().skip(*start).take(*len).collect())
                    }
                    OwnedValue::Blob(b) => {
                        OwnedValue::Blob(b.iter().skip(*start).take(*len).copied().collect())
                    }
                    other => bail!("substring needs text or blob, got {:?}", other),
                }
            }
            GeneratedExpr::Split { expr, sep } => {
                let Some(v) = expr.eval(base)? else {
                    return Ok(None);
                };
                match v {
                    OwnedValue::Null => OwnedValue::Null,
                    OwnedValue::Text(s) => OwnedValue::Array(
                        s.split(*sep)
                            .filter(|p| !p.is_empty())
                            .map(OwnedValue::from)
                            .collect(),
                    ),
                    other => bail!("split needs text, got {:?}", other),
                }
            }
        };
        Ok(Some(value))
    }
}

/// Evaluates the `GeneratedExpr` attached to each virtual column.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExprEvaluator;

impl VirtualEvaluator for ExprEvaluator {
    fn evaluate(
        &self,
        table: &TableDef,
        vcol_no: usize,
        base: &[Value<'_>],
    ) -> Result<Option<OwnedValue>> {
        let vcol = table.virtual_column(vcol_no)?;
        let value = vcol.expr().eval(base)?;
        Ok(value.map(|v| match v {
            OwnedValue::Null | OwnedValue::Array(_) => v,
            scalar if vcol.is_multi_value() => OwnedValue::Array(vec![scalar]),
            scalar => scalar,
        }))
    }
}
