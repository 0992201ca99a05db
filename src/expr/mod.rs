// SPDX-License-Identifier: MIT

//! Predicate expressions
//!
//! A predicate is a small lambda, `|x| body`, kept as data rather than as a
//! closure so that it can be rewritten, rendered for a query layer and
//! evaluated in-process:
//! - `ast` - the expression tree
//! - `candidate` - how fields are read off evaluated values
//! - `evaluator` - in-process interpretation
//! - `compose` - parameter rebinding and boolean grafting
//! - `parser` - the textual condition language

mod ast;
mod candidate;
pub mod compose;
mod evaluator;
mod parser;

pub use ast::{CompareOp, Expr, Literal, Param};
pub use candidate::{Candidate, Json};
pub use compose::{BoolOp, ParameterRebinder};
pub use evaluator::evaluate;
pub use parser::{parse, parse_body};

use crate::error::ExprError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// A boolean expression over a candidate of type `T`.
///
/// The type parameter only tags the predicate; two predicates can be combined
/// only when they test the same candidate type.
#[derive(Deserialize, Serialize)]
#[serde(bound = "")]
pub struct Predicate<T> {
    param: Param,
    body: Expr,
    #[serde(skip)]
    _candidate: PhantomData<fn(&T) -> bool>,
}

impl<T> Predicate<T> {
    /// Build a predicate over a fresh parameter.
    ///
    /// ```
    /// use ruleflow_rs::expr::Predicate;
    /// let p: Predicate<serde_json::Value> = Predicate::new(|x| x.field("counter").gt(0));
    /// assert_eq!(p.to_condition().unwrap(), "counter > 0");
    /// ```
    pub fn new(build: impl FnOnce(Expr) -> Expr) -> Self {
        let param = Param::fresh();
        let body = build(Expr::Param(param));
        Self::from_parts(param, body)
    }

    pub fn from_parts(param: Param, body: Expr) -> Self {
        Self {
            param,
            body,
            _candidate: PhantomData,
        }
    }

    pub fn always() -> Self {
        Self::from_parts(Param::fresh(), Expr::True)
    }

    pub fn never() -> Self {
        Self::from_parts(Param::fresh(), Expr::False)
    }

    pub fn param(&self) -> Param {
        self.param
    }

    pub fn body(&self) -> &Expr {
        &self.body
    }

    pub fn into_parts(self) -> (Param, Expr) {
        (self.param, self.body)
    }

    /// Parameters referenced by the body other than the bound one
    pub fn free_params(&self) -> Vec<Param> {
        self.body
            .params()
            .into_iter()
            .filter(|p| *p != self.param)
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.free_params().is_empty()
    }

    /// Evaluate directly against a candidate
    pub fn evaluate(&self, candidate: &T) -> bool
    where
        T: Candidate,
    {
        evaluator::evaluate(&self.body, self.param, candidate)
    }

    /// Check the predicate is closed and return a callable form of it
    pub fn compile(&self) -> Result<CompiledPredicate<T>, ExprError> {
        if let Some(free) = self.free_params().first() {
            return Err(ExprError::UnboundParameter(free.to_string()));
        }
        Ok(CompiledPredicate {
            predicate: self.clone(),
        })
    }

    /// Render the body in the condition language, with field paths relative
    /// to the bound parameter.
    ///
    /// Fails with [`ExprError::Untranslatable`] for anything the language
    /// cannot read back: strings holding both quote characters, non-finite
    /// numbers, and field names that are not plain identifiers.
    pub fn to_condition(&self) -> Result<String, ExprError> {
        self.render(&self.body)
    }

    fn render(&self, expr: &Expr) -> Result<String, ExprError> {
        match expr {
            Expr::True => Ok("true".to_string()),
            Expr::False => Ok("false".to_string()),
            Expr::And(l, r) => Ok(format!("({}) and ({})", self.render(l)?, self.render(r)?)),
            Expr::Or(l, r) => Ok(format!("({}) or ({})", self.render(l)?, self.render(r)?)),
            Expr::Not(inner) => Ok(format!("not ({})", self.render(inner)?)),
            Expr::Compare { left, op, right } => Ok(format!(
                "{} {} {}",
                self.render_operand(left)?,
                op,
                self.render_operand(right)?
            )),
            Expr::Field { .. } => Ok(format!("{} == true", self.render_path(expr)?)),
            Expr::Literal(Literal::Boolean(true)) => Ok("true".to_string()),
            Expr::Literal(Literal::Boolean(false)) => Ok("false".to_string()),
            Expr::Literal(_) | Expr::Param(_) => {
                Err(ExprError::Untranslatable(format!("`{}` is not a test", expr)))
            }
        }
    }

    fn render_operand(&self, expr: &Expr) -> Result<String, ExprError> {
        match expr {
            Expr::Literal(Literal::String(s)) if s.contains('\'') && s.contains('"') => Err(
                ExprError::Untranslatable(format!("string {:?} mixes quote characters", s)),
            ),
            Expr::Literal(Literal::Number(n)) if !n.is_finite() => Err(
                ExprError::Untranslatable(format!("number {} has no literal form", n)),
            ),
            Expr::Literal(lit) => Ok(lit.to_string()),
            Expr::Field { .. } => self.render_path(expr),
            other => Err(ExprError::Untranslatable(format!(
                "`{}` is not a field or literal",
                other
            ))),
        }
    }

    fn render_path(&self, expr: &Expr) -> Result<String, ExprError> {
        match expr {
            Expr::Field { name, .. } if !parser::is_field_name(name) => Err(
                ExprError::Untranslatable(format!("field name {:?} cannot be written", name)),
            ),
            Expr::Field { target, name } => match target.as_ref() {
                Expr::Param(p) if *p == self.param => Ok(name.clone()),
                Expr::Param(p) => Err(ExprError::UnboundParameter(p.to_string())),
                inner => Ok(format!("{}.{}", self.render_path(inner)?, name)),
            },
            Expr::Param(p) if *p == self.param => Err(ExprError::Untranslatable(
                "bare parameter without a field".to_string(),
            )),
            Expr::Param(p) => Err(ExprError::UnboundParameter(p.to_string())),
            other => Err(ExprError::Untranslatable(format!(
                "`{}` is not a field path",
                other
            ))),
        }
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self::from_parts(self.param, self.body.clone())
    }
}

impl<T> PartialEq for Predicate<T> {
    fn eq(&self, other: &Self) -> bool {
        self.param == other.param && self.body == other.body
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("param", &self.param)
            .field("body", &self.body)
            .finish()
    }
}

impl<T> fmt::Display for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|{}| {}", self.param, self.body)
    }
}

/// A predicate known to be closed, ready to be called
pub struct CompiledPredicate<T> {
    predicate: Predicate<T>,
}

impl<T: Candidate> CompiledPredicate<T> {
    pub fn call(&self, candidate: &T) -> bool {
        self.predicate.evaluate(candidate)
    }

    pub fn into_fn(self) -> impl Fn(&T) -> bool {
        move |candidate| self.call(candidate)
    }
}

impl<T> CompiledPredicate<T> {
    pub fn predicate(&self) -> &Predicate<T> {
        &self.predicate
    }
}
