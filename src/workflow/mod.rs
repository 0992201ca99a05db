// SPDX-License-Identifier: MIT

//! Precondition-gated workflows
//!
//! This module provides:
//! - `Workflow` - a state transition guarded by an optional precondition rule
//! - `Step` - a workflow built from a closure
//! - `Maybe` - a present-or-absent value that workflows can be chained over
//! - `WorkflowRegistry` - workflows resolved by name

pub mod chain;
pub mod registry;

pub use chain::Maybe;
pub use registry::{SharedWorkflow, WorkflowRegistry};

use crate::error::PreconditionViolation;
use crate::expr::Candidate;
use crate::rule::Rule;
use std::fmt;
use std::marker::PhantomData;

/// A rule gating a workflow.
///
/// The rule is paired with its evaluation when it is attached, so a
/// workflow over a type that cannot be evaluated simply has no
/// precondition and still runs.
pub struct Precondition<T> {
    rule: Rule<T>,
    check: fn(&Rule<T>, &T) -> bool,
}

impl<T> Precondition<T> {
    pub fn rule(&self) -> &Rule<T> {
        &self.rule
    }

    pub fn description(&self) -> Option<&str> {
        self.rule.description()
    }

    /// Err carries the rule's description
    pub fn validate(&self, candidate: &T) -> Result<(), PreconditionViolation> {
        if (self.check)(&self.rule, candidate) {
            Ok(())
        } else {
            Err(PreconditionViolation::new(self.rule.description()))
        }
    }
}

impl<T: Candidate> From<Rule<T>> for Precondition<T> {
    fn from(rule: Rule<T>) -> Self {
        Self {
            rule,
            check: Rule::is_satisfied,
        }
    }
}

impl<T> Clone for Precondition<T> {
    fn clone(&self) -> Self {
        Self {
            rule: self.rule.clone(),
            check: self.check,
        }
    }
}

impl<T> fmt::Debug for Precondition<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Precondition").field(&self.rule).finish()
    }
}

/// A transition from `T` to `U`, run only when the precondition holds.
///
/// Implementors provide [`transition`](Workflow::transition) and optionally a
/// [`precondition`](Workflow::precondition); callers use
/// [`execute`](Workflow::execute). A workflow keeps no per-call state, so one
/// instance can serve any number of candidates. `T` is unconstrained: only
/// attaching a precondition needs `T: Candidate`.
pub trait Workflow<T, U = T> {
    /// Must be able to carry a precondition violation; any other variants
    /// come from the transition and pass through untouched.
    type Error: From<PreconditionViolation>;

    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn precondition(&self) -> Option<&Precondition<T>> {
        None
    }

    /// The transition itself, without validation
    fn transition(&self, candidate: T) -> Result<U, Self::Error>;

    /// Validate the candidate against the precondition, then transition it.
    ///
    /// The precondition sees the exact value the transition receives. On
    /// rejection the transition never runs and the error carries the rule's
    /// description.
    fn execute(&self, candidate: T) -> Result<U, Self::Error> {
        if let Some(precondition) = self.precondition() {
            log::debug!("Validating precondition of workflow {}", self.name());
            if let Err(violation) = precondition.validate(&candidate) {
                log::warn!("Workflow {} rejected candidate: {}", self.name(), violation);
                return Err(violation.into());
            }
        }

        log::debug!("Executing workflow {}", self.name());
        self.transition(candidate)
    }
}

/// A workflow backed by a closure
pub struct Step<T, U, E, F> {
    name: String,
    precondition: Option<Precondition<T>>,
    transition: F,
    _signature: PhantomData<fn(T) -> Result<U, E>>,
}

impl<T, U, E, F> Step<T, U, E, F>
where
    F: Fn(T) -> Result<U, E>,
{
    pub fn new(name: impl Into<String>, transition: F) -> Self {
        Self {
            name: name.into(),
            precondition: None,
            transition,
            _signature: PhantomData,
        }
    }

    /// Gate the step behind `rule`
    pub fn with_precondition(mut self, rule: impl Into<Precondition<T>>) -> Self {
        self.precondition = Some(rule.into());
        self
    }
}

impl<T, U, E, F> Workflow<T, U> for Step<T, U, E, F>
where
    F: Fn(T) -> Result<U, E>,
    E: From<PreconditionViolation>,
{
    type Error = E;

    fn name(&self) -> &str {
        &self.name
    }

    fn precondition(&self) -> Option<&Precondition<T>> {
        self.precondition.as_ref()
    }

    fn transition(&self, candidate: T) -> Result<U, E> {
        (self.transition)(candidate)
    }
}
