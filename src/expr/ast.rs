// SPDX-License-Identifier: MIT

//! Abstract Syntax Tree for predicate expressions

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PARAM: AtomicU64 = AtomicU64::new(0);

/// Identity of a bound variable.
///
/// Every predicate binds exactly one `Param`. Two independently built
/// predicates never share one unless the composer rewrites them onto a
/// common binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Param(u64);

impl Param {
    /// Allocate a process-unique parameter
    pub fn fresh() -> Self {
        Param(NEXT_PARAM.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// A predicate expression
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// Reference to a bound variable
    Param(Param),
    /// Member access: target.name
    Field { target: Box<Expr>, name: String },
    /// Constant operand
    Literal(Literal),
    /// Comparison expression: left op right
    Compare {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
    },
    /// Logical AND
    And(Box<Expr>, Box<Expr>),
    /// Logical OR
    Or(Box<Expr>, Box<Expr>),
    /// Logical NOT
    Not(Box<Expr>),
    /// Literal true
    True,
    /// Literal false
    False,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    /// ==
    Eq,
    /// !=
    NotEq,
    /// >
    Gt,
    /// >=
    Gte,
    /// <
    Lt,
    /// <=
    Lte,
    /// contains (for strings and arrays)
    Contains,
}

/// Literal values in expressions
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
}

impl Expr {
    /// Member access on this expression
    pub fn field(self, name: impl Into<String>) -> Expr {
        Expr::Field {
            target: Box::new(self),
            name: name.into(),
        }
    }

    /// Access a dotted path such as `address.city`
    pub fn path(self, path: &str) -> Expr {
        path.split('.').fold(self, |expr, part| expr.field(part))
    }

    pub fn compare(self, op: CompareOp, rhs: impl Into<Expr>) -> Expr {
        Expr::Compare {
            left: Box::new(self),
            op,
            right: Box::new(rhs.into()),
        }
    }

    pub fn eq(self, rhs: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Eq, rhs)
    }

    pub fn ne(self, rhs: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::NotEq, rhs)
    }

    pub fn gt(self, rhs: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Gt, rhs)
    }

    pub fn gte(self, rhs: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Gte, rhs)
    }

    pub fn lt(self, rhs: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Lt, rhs)
    }

    pub fn lte(self, rhs: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Lte, rhs)
    }

    pub fn contains(self, rhs: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Contains, rhs)
    }

    pub fn and(self, rhs: Expr) -> Expr {
        Expr::And(Box::new(self), Box::new(rhs))
    }

    pub fn or(self, rhs: Expr) -> Expr {
        Expr::Or(Box::new(self), Box::new(rhs))
    }

    /// Collect every parameter referenced anywhere in this expression
    pub fn params(&self) -> Vec<Param> {
        let mut out = Vec::new();
        collect_params(self, &mut out);
        out
    }
}

fn collect_params(expr: &Expr, out: &mut Vec<Param>) {
    match expr {
        Expr::Param(p) => {
            if !out.contains(p) {
                out.push(*p);
            }
        }
        Expr::Field { target, .. } => collect_params(target, out),
        Expr::Compare { left, right, .. } | Expr::And(left, right) | Expr::Or(left, right) => {
            collect_params(left, out);
            collect_params(right, out);
        }
        Expr::Not(inner) => collect_params(inner, out),
        Expr::Literal(_) | Expr::True | Expr::False => {}
    }
}

impl std::ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

impl From<Literal> for Expr {
    fn from(lit: Literal) -> Self {
        Expr::Literal(lit)
    }
}

impl From<Param> for Expr {
    fn from(param: Param) -> Self {
        Expr::Param(param)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Expr::Literal(Literal::String(s.to_string()))
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Expr::Literal(Literal::String(s))
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        Expr::Literal(Literal::Boolean(b))
    }
}

impl From<f64> for Expr {
    fn from(n: f64) -> Self {
        Expr::Literal(Literal::Number(n))
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Expr::Literal(Literal::Number(n as f64))
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        Expr::Literal(Literal::Number(f64::from(n)))
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::NotEq => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
            CompareOp::Contains => write!(f, "contains"),
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::String(s) if s.contains('\'') => write!(f, "\"{}\"", s),
            Literal::String(s) => write!(f, "'{}'", s),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Null => write!(f, "null"),
        }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Param(p) => write!(f, "{}", p),
            Expr::Field { target, name } => write!(f, "{}.{}", target, name),
            Expr::Literal(lit) => write!(f, "{}", lit),
            Expr::Compare { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Expr::And(l, r) => write!(f, "({}) and ({})", l, r),
            Expr::Or(l, r) => write!(f, "({}) or ({})", l, r),
            Expr::Not(inner) => write!(f, "not ({})", inner),
            Expr::True => write!(f, "true"),
            Expr::False => write!(f, "false"),
        }
    }
}
