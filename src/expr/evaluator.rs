// SPDX-License-Identifier: MIT

//! Predicate expression evaluator

use super::ast::{CompareOp, Expr, Literal, Param};
use super::candidate::Candidate;
use serde_json::Value;

/// What an operand position resolves to
enum Operand {
    /// The bound candidate itself
    Bound,
    /// A concrete value; `None` for a missing field
    Value(Option<Value>),
}

/// Evaluate `body` with `param` bound to `candidate`.
///
/// References to any other parameter resolve to `null`; closedness is checked
/// when a predicate is compiled, not here.
pub fn evaluate<C: Candidate + ?Sized>(body: &Expr, param: Param, candidate: &C) -> bool {
    Scope { param, candidate }.test(body)
}

struct Scope<'a, C: ?Sized> {
    param: Param,
    candidate: &'a C,
}

impl<C: Candidate + ?Sized> Scope<'_, C> {
    fn test(&self, expr: &Expr) -> bool {
        match expr {
            Expr::True => true,
            Expr::False => false,
            Expr::And(left, right) => self.test(left) && self.test(right),
            Expr::Or(left, right) => self.test(left) || self.test(right),
            Expr::Not(inner) => !self.test(inner),
            Expr::Compare { left, op, right } if is_non_finite(left) || is_non_finite(right) => {
                let left = self.resolve_number(left);
                let right = self.resolve_number(right);
                compare_floats(left, *op, right)
            }
            Expr::Compare { left, op, right } => {
                let left = self.resolve_value(left);
                let right = self.resolve_value(right);
                evaluate_compare(left.as_ref(), *op, right.as_ref())
            }
            Expr::Param(_) | Expr::Field { .. } | Expr::Literal(_) => {
                matches!(self.resolve_value(expr), Some(Value::Bool(true)))
            }
        }
    }

    fn resolve(&self, expr: &Expr) -> Operand {
        match expr {
            Expr::Param(p) if *p == self.param => Operand::Bound,
            Expr::Param(_) => Operand::Value(None),
            Expr::Field { target, name } => match self.resolve(target) {
                Operand::Bound => Operand::Value(self.candidate.field(name)),
                Operand::Value(Some(v)) => Operand::Value(v.get(name.as_str()).cloned()),
                Operand::Value(None) => Operand::Value(None),
            },
            Expr::Literal(lit) => Operand::Value(Some(literal_value(lit))),
            Expr::True
            | Expr::False
            | Expr::And(..)
            | Expr::Or(..)
            | Expr::Not(_)
            | Expr::Compare { .. } => Operand::Value(Some(Value::Bool(self.test(expr)))),
        }
    }

    fn resolve_number(&self, expr: &Expr) -> Option<f64> {
        match expr {
            Expr::Literal(Literal::Number(n)) => Some(*n),
            other => self.resolve_value(other).as_ref().and_then(Value::as_f64),
        }
    }

    fn resolve_value(&self, expr: &Expr) -> Option<Value> {
        match self.resolve(expr) {
            // A bare candidate has no scalar value of its own
            Operand::Bound => None,
            Operand::Value(v) => v,
        }
    }
}

pub(crate) fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::String(s) => Value::String(s.clone()),
        Literal::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Literal::Boolean(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
    }
}

/// JSON has no NaN or infinity, so these literals never reach `Value`
fn is_non_finite(expr: &Expr) -> bool {
    matches!(expr, Expr::Literal(Literal::Number(n)) if !n.is_finite())
}

/// IEEE comparison; a non-number side only satisfies `!=`
fn compare_floats(left: Option<f64>, op: CompareOp, right: Option<f64>) -> bool {
    let (Some(a), Some(b)) = (left, right) else {
        return op == CompareOp::NotEq;
    };
    match op {
        CompareOp::Eq => a == b,
        CompareOp::NotEq => a != b,
        CompareOp::Gt => a > b,
        CompareOp::Gte => a >= b,
        CompareOp::Lt => a < b,
        CompareOp::Lte => a <= b,
        CompareOp::Contains => false,
    }
}

fn evaluate_compare(left: Option<&Value>, op: CompareOp, right: Option<&Value>) -> bool {
    match op {
        CompareOp::Eq => values_equal(left, right),
        CompareOp::NotEq => !values_equal(left, right),
        CompareOp::Gt => compare_numbers(left, right, |a, b| a > b),
        CompareOp::Gte => compare_numbers(left, right, |a, b| a >= b),
        CompareOp::Lt => compare_numbers(left, right, |a, b| a < b),
        CompareOp::Lte => compare_numbers(left, right, |a, b| a <= b),
        CompareOp::Contains => check_contains(left, right),
    }
}

fn is_null(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

fn values_equal(left: Option<&Value>, right: Option<&Value>) -> bool {
    if is_null(left) || is_null(right) {
        return is_null(left) && is_null(right);
    }
    match (left, right) {
        (Some(Value::String(s)), Some(Value::String(rs))) => s == rs,
        (Some(Value::Number(n)), Some(Value::Number(rn))) => match (n.as_f64(), rn.as_f64()) {
            (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
            _ => false,
        },
        (Some(Value::Bool(b)), Some(Value::Bool(rb))) => b == rb,
        (Some(l @ Value::Array(_)), Some(r @ Value::Array(_)))
        | (Some(l @ Value::Object(_)), Some(r @ Value::Object(_))) => l == r,
        _ => false,
    }
}

fn compare_numbers<F>(left: Option<&Value>, right: Option<&Value>, cmp: F) -> bool
where
    F: Fn(f64, f64) -> bool,
{
    match (left.and_then(Value::as_f64), right.and_then(Value::as_f64)) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

fn check_contains(left: Option<&Value>, right: Option<&Value>) -> bool {
    match (left, right) {
        // String contains substring
        (Some(Value::String(s)), Some(Value::String(substr))) => s.contains(substr.as_str()),
        // Array contains value
        (Some(Value::Array(arr)), needle) => arr.iter().any(|v| values_equal(Some(v), needle)),
        _ => false,
    }
}
