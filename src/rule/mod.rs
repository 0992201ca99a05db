// SPDX-License-Identifier: MIT

//! Rules: describable predicates that compose with and/or/not
//!
//! A `Rule` wraps a [`Predicate`] and can be asked two things: whether a
//! candidate satisfies it, and what its predicate looks like as an expression.
//! The first is always answered through the second, so the two cannot drift.

pub mod loader;
pub mod query;

pub use loader::{RuleBook, RuleDefinition, RuleSetDefinition, RuleSetLoader};
pub use query::{filter_slice, Filter, Matching};

use crate::error::{ExprError, ParseError};
use crate::expr::compose::{self, BoolOp};
use crate::expr::{self, Candidate, Predicate};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

enum RuleKind<T> {
    Atomic(Predicate<T>),
    And(Rule<T>, Rule<T>),
    Or(Rule<T>, Rule<T>),
    Not(Rule<T>),
}

struct RuleNode<T> {
    kind: RuleKind<T>,
    /// Composites build their predicate on first use
    predicate: OnceCell<Predicate<T>>,
}

/// A predicate over `T` with an optional human-readable description.
///
/// Cloning is cheap: composite rules share their operands instead of copying
/// them. The description belongs to the handle, so it should be set while the
/// rule is being configured, before it is shared.
pub struct Rule<T> {
    node: Arc<RuleNode<T>>,
    description: Option<String>,
}

impl<T> Rule<T> {
    /// Create an atomic rule.
    ///
    /// # Panics
    ///
    /// Panics if the predicate references a parameter it does not bind.
    /// Use [`Rule::try_new`] for predicates assembled from untrusted parts.
    pub fn new(predicate: Predicate<T>) -> Self {
        assert!(
            predicate.is_closed(),
            "rule predicate {} references unbound parameters",
            predicate
        );
        Self::from_kind(RuleKind::Atomic(predicate))
    }

    pub fn try_new(predicate: Predicate<T>) -> Result<Self, ExprError> {
        predicate.compile()?;
        Ok(Self::from_kind(RuleKind::Atomic(predicate)))
    }

    /// Build an atomic rule from an expression over a fresh parameter
    pub fn build(body: impl FnOnce(expr::Expr) -> expr::Expr) -> Self {
        Self::new(Predicate::new(body))
    }

    /// Parse an atomic rule from the condition language
    pub fn parse(condition: &str) -> Result<Self, ParseError> {
        Ok(Self::from_kind(RuleKind::Atomic(expr::parse(condition)?)))
    }

    pub fn always() -> Self {
        Self::new(Predicate::always())
    }

    pub fn never() -> Self {
        Self::new(Predicate::never())
    }

    fn from_kind(kind: RuleKind<T>) -> Self {
        Self {
            node: Arc::new(RuleNode {
                kind,
                predicate: OnceCell::new(),
            }),
            description: None,
        }
    }

    /// Set the description and hand the same rule back
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn set_description(&mut self, text: impl Into<String>) -> &mut Self {
        self.description = Some(text.into());
        self
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The structural form of this rule.
    ///
    /// For composites this is built once, by rebinding the operands onto a
    /// shared parameter, and cached. Each cached copy holds its whole
    /// subtree, so a left-folded chain of `n` rules keeps O(n²) expression
    /// nodes across its intermediate composites.
    pub fn predicate(&self) -> &Predicate<T> {
        match &self.node.kind {
            RuleKind::Atomic(p) => p,
            kind => self.node.predicate.get_or_init(|| match kind {
                RuleKind::And(a, b) => compose::combine(a.predicate(), b.predicate(), BoolOp::And),
                RuleKind::Or(a, b) => compose::combine(a.predicate(), b.predicate(), BoolOp::Or),
                RuleKind::Not(inner) => compose::negate(inner.predicate()),
                RuleKind::Atomic(p) => p.clone(),
            }),
        }
    }

    pub fn is_satisfied(&self, candidate: &T) -> bool
    where
        T: Candidate,
    {
        self.predicate().evaluate(candidate)
    }

    pub fn and(&self, other: &Rule<T>) -> Rule<T> {
        Self::from_kind(RuleKind::And(self.clone(), other.clone()))
    }

    pub fn or(&self, other: &Rule<T>) -> Rule<T> {
        Self::from_kind(RuleKind::Or(self.clone(), other.clone()))
    }

    pub fn negate(&self) -> Rule<T> {
        Self::from_kind(RuleKind::Not(self.clone()))
    }

    /// Whether both handles point at the same underlying rule
    pub fn ptr_eq(a: &Rule<T>, b: &Rule<T>) -> bool {
        Arc::ptr_eq(&a.node, &b.node)
    }
}

/// `a and b`
pub fn and<T>(a: &Rule<T>, b: &Rule<T>) -> Rule<T> {
    a.and(b)
}

/// `a or b`
pub fn or<T>(a: &Rule<T>, b: &Rule<T>) -> Rule<T> {
    a.or(b)
}

/// `not a`
pub fn not<T>(a: &Rule<T>) -> Rule<T> {
    a.negate()
}

impl<T> Clone for Rule<T> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
            description: self.description.clone(),
        }
    }
}

impl<T> fmt::Debug for Rule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("description", &self.description)
            .field("predicate", self.predicate())
            .finish()
    }
}

impl<T> From<Predicate<T>> for Rule<T> {
    fn from(predicate: Predicate<T>) -> Self {
        Rule::new(predicate)
    }
}

impl<T> std::ops::BitAnd for &Rule<T> {
    type Output = Rule<T>;

    fn bitand(self, rhs: &Rule<T>) -> Rule<T> {
        self.and(rhs)
    }
}

impl<T> std::ops::BitOr for &Rule<T> {
    type Output = Rule<T>;

    fn bitor(self, rhs: &Rule<T>) -> Rule<T> {
        self.or(rhs)
    }
}

impl<T> std::ops::Not for &Rule<T> {
    type Output = Rule<T>;

    fn not(self) -> Rule<T> {
        self.negate()
    }
}

impl<T> std::ops::Not for Rule<T> {
    type Output = Rule<T>;

    fn not(self) -> Rule<T> {
        self.negate()
    }
}
