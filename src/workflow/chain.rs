// SPDX-License-Identifier: MIT

//! Present-or-absent values for chaining workflows
//!
//! `Maybe::wrap(x).chain(&a)?.chain(&b)?` runs `a` then `b`. Once the value
//! is absent, every later `chain` is skipped and the result stays absent.
//! A precondition rejection is still an error; absence is not.
//!
//! "No value" is `Option::None`: [`Maybe::from_option`] and
//! [`Maybe::chain_optional`] turn it into absence.

use super::Workflow;
use crate::expr::Candidate;
use crate::rule::Rule;

/// A value of type `T`, or nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Maybe<T> {
    Present(T),
    Absent,
}

impl<T> Maybe<T> {
    /// Wrap a value that is there. Use [`Maybe::from_option`] when it may not be.
    pub fn wrap(value: T) -> Self {
        Maybe::Present(value)
    }

    /// Wrap a value that may be missing; `None` is absent
    pub fn from_option(value: Option<T>) -> Self {
        value.into()
    }

    pub fn absent() -> Self {
        Maybe::Absent
    }

    pub fn has_value(&self) -> bool {
        matches!(self, Maybe::Present(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Maybe::Present(v) => Some(v),
            Maybe::Absent => None,
        }
    }

    pub fn value_mut(&mut self) -> Option<&mut T> {
        match self {
            Maybe::Present(v) => Some(v),
            Maybe::Absent => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        self.into()
    }

    /// Run `workflow` on the value, if there is one.
    ///
    /// An absent input skips the workflow and yields an absent output.
    /// Errors from the workflow, including precondition violations, are
    /// returned as-is.
    pub fn chain<U, W>(self, workflow: &W) -> Result<Maybe<U>, W::Error>
    where
        W: Workflow<T, U> + ?Sized,
    {
        match self {
            Maybe::Present(value) => workflow.execute(value).map(Maybe::Present),
            Maybe::Absent => {
                log::trace!("Skipping workflow {} on absent value", workflow.name());
                Ok(Maybe::Absent)
            }
        }
    }

    /// Run a workflow that may produce no value; a `None` result is absent.
    pub fn chain_optional<U, W>(self, workflow: &W) -> Result<Maybe<U>, W::Error>
    where
        W: Workflow<T, Option<U>> + ?Sized,
    {
        self.chain(workflow).map(Maybe::flatten)
    }

    /// False when absent, otherwise whether the value satisfies `rule`
    pub fn satisfies(&self, rule: &Rule<T>) -> bool
    where
        T: Candidate,
    {
        match self {
            Maybe::Present(value) => rule.is_satisfied(value),
            Maybe::Absent => false,
        }
    }
}

impl<T> Maybe<Option<T>> {
    /// Collapse a present `None` into absence
    pub fn flatten(self) -> Maybe<T> {
        match self {
            Maybe::Present(Some(value)) => Maybe::Present(value),
            Maybe::Present(None) | Maybe::Absent => Maybe::Absent,
        }
    }
}

impl<T> Default for Maybe<T> {
    fn default() -> Self {
        Maybe::Absent
    }
}

/// Null-aware wrapping: `None` becomes absent
impl<T> From<Option<T>> for Maybe<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Maybe::Present(v),
            None => Maybe::Absent,
        }
    }
}

impl<T> From<Maybe<T>> for Option<T> {
    fn from(value: Maybe<T>) -> Self {
        match value {
            Maybe::Present(v) => Some(v),
            Maybe::Absent => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuleflowError;
    use crate::workflow::Step;
    use serde_json::{json, Value};
    use std::cell::Cell;

    fn bump() -> impl Workflow<Value, Value, Error = RuleflowError> {
        Step::new("bump", |mut v: Value| {
            let n = v["counter"].as_i64().unwrap_or_default();
            v["counter"] = json!(n + 1);
            Ok::<_, RuleflowError>(v)
        })
    }

    #[test]
    fn test_wrap_and_from_option() {
        assert!(Maybe::wrap(1).has_value());
        assert!(!Maybe::<i32>::from(None).has_value());
        assert_eq!(Maybe::from(Some(3)).into_value(), Some(3));
        assert_eq!(Maybe::<i32>::default(), Maybe::Absent);
    }

    #[test]
    fn test_chain_runs_in_order() {
        let out = Maybe::wrap(json!({"counter": 0}))
            .chain(&bump())
            .unwrap()
            .chain(&bump())
            .unwrap();
        assert_eq!(out.value(), Some(&json!({"counter": 2})));
    }

    #[test]
    fn test_absent_skips_workflow() {
        let calls = Cell::new(0);
        let step = Step::new("never", |v: Value| {
            calls.set(calls.get() + 1);
            Ok::<_, RuleflowError>(v.to_string())
        });
        let out: Maybe<String> = Maybe::<Value>::absent().chain(&step).unwrap();
        assert_eq!(out, Maybe::Absent);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_rejection_is_an_error_not_absence() {
        let gated = Step::new("gated", |v: Value| Ok::<_, RuleflowError>(v))
            .with_precondition(Rule::parse("counter > 0").unwrap().describe("must be positive"));
        let err = Maybe::wrap(json!({"counter": 0})).chain(&gated).unwrap_err();
        assert_eq!(err.to_string(), "must be positive");
    }

    #[test]
    fn test_from_option_is_null_aware() {
        assert!(!Maybe::from_option(None::<Value>).has_value());
        assert!(Maybe::from_option(Some(json!(null))).has_value());
        assert_eq!(Maybe::from_option(Some(2)), Maybe::wrap(2));
    }

    #[test]
    fn test_chain_optional_collapses_none() {
        let lookup = Step::new("lookup", |v: Value| {
            Ok::<_, RuleflowError>(v.get("next").cloned())
        });
        let missing: Maybe<Value> = Maybe::wrap(json!({})).chain_optional(&lookup).unwrap();
        assert!(!missing.has_value());

        let found = Maybe::wrap(json!({"next": {"counter": 1}}))
            .chain_optional(&lookup)
            .unwrap()
            .chain(&bump())
            .unwrap();
        assert_eq!(found.into_value(), Some(json!({"counter": 2})));
    }

    #[test]
    fn test_flatten_collapses_none() {
        let lookup = Step::new("lookup", |v: Value| {
            Ok::<_, RuleflowError>(v.get("next").cloned())
        });
        let found = Maybe::wrap(json!({"next": {"counter": 1}}))
            .chain(&lookup)
            .unwrap()
            .flatten();
        assert!(found.has_value());

        let missing = Maybe::wrap(json!({})).chain(&lookup).unwrap().flatten();
        assert!(!missing.has_value());
        let after = missing.chain(&bump()).unwrap();
        assert!(!after.has_value());
    }

    #[test]
    fn test_satisfies() {
        let rule: Rule<Value> = Rule::parse("counter == 1").unwrap();
        assert!(Maybe::wrap(json!({"counter": 1})).satisfies(&rule));
        assert!(!Maybe::wrap(json!({"counter": 2})).satisfies(&rule));
        assert!(!Maybe::<Value>::Absent.satisfies(&rule));
        assert!(!Maybe::<Value>::Absent.satisfies(&Rule::always()));
    }

    #[test]
    fn test_value_mut() {
        let mut m = Maybe::wrap(json!({"counter": 1}));
        if let Some(v) = m.value_mut() {
            v["counter"] = json!(5);
        }
        assert_eq!(m.value(), Some(&json!({"counter": 5})));
    }
}
