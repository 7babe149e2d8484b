use std::cmp::Ordering;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{Document, FieldValue};
use crate::query::filter::{Comparison, Filter};

/// Evaluates filter trees against documents
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterEvaluator {
    pub strict: bool,  // Missing fields fail with FieldNotFound instead of evaluating false
}

impl FilterEvaluator {
    pub fn new(strict: bool) -> Self {
        FilterEvaluator { strict }
    }

    pub fn evaluate(&self, doc: &Document, filter: &Filter) -> Result<bool> {
        match filter {
            Filter::Leaf { op, field, value } => self.evaluate_leaf(doc, *op, field, value),
            Filter::And(l, r) => Ok(self.evaluate(doc, l)? && self.evaluate(doc, r)?),
            Filter::Or(l, r) => Ok(self.evaluate(doc, l)? || self.evaluate(doc, r)?),
        }
    }

    fn evaluate_leaf(&self, doc: &Document, op: Comparison, field: &str, target: &FieldValue) -> Result<bool> {
        let Some(value) = doc.get_path(field) else {
            if self.strict {
                return Err(Error::new(
                    ErrorKind::FieldNotFound,
                    format!("document '{}' has no field '{}'", doc.id, field),
                ));
            }
            return Ok(false);
        };

        Ok(match (value, op) {
            // Arrays: `$not` holds when no element equals, the rest when any element matches
            (FieldValue::Array(items), Comparison::Ne) => {
                !items.iter().any(|item| matches(item, Comparison::Eq, target))
            }
            (FieldValue::Array(items), _) => items.iter().any(|item| matches(item, op, target)),
            _ => matches(value, op, target),
        })
    }
}

/// Mixed types never compare, so every operator yields false for them
fn matches(value: &FieldValue, op: Comparison, target: &FieldValue) -> bool {
    let Some(ordering) = value.compare(target) else {
        return false;
    };
    match op {
        Comparison::Eq => ordering == Ordering::Equal,
        Comparison::Ne => ordering != Ordering::Equal,
        Comparison::Gt => ordering == Ordering::Greater,
        Comparison::Gte => ordering != Ordering::Less,
        Comparison::Lt => ordering == Ordering::Less,
        Comparison::Lte => ordering != Ordering::Greater,
    }
}
