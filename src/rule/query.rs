// SPDX-License-Identifier: MIT

//! Filtering sequences with rules and predicates
//!
//! This is the in-process query evaluator: it takes the structural form of a
//! rule, checks that it compiles, and keeps the items it accepts.

use super::Rule;
use crate::error::ExprError;
use crate::expr::{Candidate, Predicate};
use std::borrow::Borrow;

/// Iterator adapter yielding the items a predicate accepts, in order
pub struct Matching<I, T> {
    iter: I,
    predicate: Predicate<T>,
}

impl<I, T> Iterator for Matching<I, T>
where
    I: Iterator,
    I::Item: Borrow<T>,
    T: Candidate,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        let predicate = &self.predicate;
        self.iter
            .by_ref()
            .find(|item| predicate.evaluate(item.borrow()))
    }
}

/// Filtering by rule or predicate for any iterator over candidates
/// (owned or borrowed).
pub trait Filter: Iterator + Sized {
    /// Keep the items satisfying `rule`
    fn satisfying<T>(self, rule: &Rule<T>) -> Matching<Self, T>
    where
        Self::Item: Borrow<T>,
        T: Candidate,
    {
        // Rules only ever hold closed predicates
        Matching {
            iter: self,
            predicate: rule.predicate().clone(),
        }
    }

    /// Keep the items matching `predicate`, which must be closed
    fn matching<T>(self, predicate: &Predicate<T>) -> Result<Matching<Self, T>, ExprError>
    where
        Self::Item: Borrow<T>,
        T: Candidate,
    {
        let compiled = predicate.compile()?;
        Ok(Matching {
            iter: self,
            predicate: compiled.predicate().clone(),
        })
    }
}

impl<I: Iterator> Filter for I {}

/// Borrow the items of `items` that match `predicate`
pub fn filter_slice<'a, T: Candidate>(
    items: &'a [T],
    predicate: &Predicate<T>,
) -> Result<Vec<&'a T>, ExprError> {
    Ok(items.iter().matching(predicate)?.collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Expr, Param};
    use serde_json::{json, Value};

    fn records() -> Vec<Value> {
        vec![
            json!({"name": "a", "counter": -1}),
            json!({"name": "b", "counter": 5}),
            json!({"name": "c", "counter": 15}),
            json!({"name": "d", "counter": 7}),
        ]
    }

    #[test]
    fn test_satisfying_keeps_order() {
        let rule: Rule<Value> = Rule::parse("counter > 0 and counter < 10").unwrap();
        let names: Vec<_> = records()
            .iter()
            .satisfying(&rule)
            .map(|r| r["name"].clone())
            .collect();
        assert_eq!(names, vec![json!("b"), json!("d")]);
    }

    #[test]
    fn test_satisfying_owned_items() {
        let rule: Rule<Value> = Rule::parse("counter < 0").unwrap();
        let kept: Vec<Value> = records().into_iter().satisfying(&rule).collect();
        assert_eq!(kept, vec![json!({"name": "a", "counter": -1})]);
    }

    #[test]
    fn test_filter_equals_is_satisfied() {
        let rule: Rule<Value> = Rule::parse("counter >= 5").unwrap().negate();
        let data = records();
        let filtered: Vec<&Value> = data.iter().satisfying(&rule).collect();
        let expected: Vec<&Value> = data.iter().filter(|r| rule.is_satisfied(r)).collect();
        assert_eq!(filtered, expected);
    }

    #[test]
    fn test_filter_slice() {
        let data = records();
        let p: Predicate<Value> = Predicate::new(|x| x.field("name").eq("c"));
        let hits = filter_slice(&data, &p).unwrap();
        assert_eq!(hits, vec![&data[2]]);
    }

    #[test]
    fn test_matching_rejects_open_predicate() {
        let open: Predicate<Value> =
            Predicate::from_parts(Param::fresh(), Expr::Param(Param::fresh()).field("a").eq(1));
        assert!(records().iter().matching(&open).is_err());
    }
}
