// SPDX-License-Identifier: MIT

//! Structural composition of predicates
//!
//! Two predicates built independently bind different parameters. Joining
//! their bodies as-is would leave one of them referring to a variable the
//! combined lambda does not bind. Composition therefore rewrites each body
//! onto one shared parameter first, then grafts the bodies under the boolean
//! node.

use super::ast::{Expr, Param};
use super::Predicate;

/// Binary boolean connectives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

/// Rewrites every occurrence of one parameter into another
#[derive(Debug, Clone, Copy)]
pub struct ParameterRebinder {
    from: Param,
    to: Param,
}

impl ParameterRebinder {
    pub fn new(from: Param, to: Param) -> Self {
        Self { from, to }
    }

    /// Return a copy of `expr` with `from` replaced by `to`
    pub fn rewrite(&self, expr: &Expr) -> Expr {
        match expr {
            Expr::Param(p) if *p == self.from => Expr::Param(self.to),
            Expr::Param(p) => Expr::Param(*p),
            Expr::Field { target, name } => Expr::Field {
                target: Box::new(self.rewrite(target)),
                name: name.clone(),
            },
            Expr::Compare { left, op, right } => Expr::Compare {
                left: Box::new(self.rewrite(left)),
                op: *op,
                right: Box::new(self.rewrite(right)),
            },
            Expr::And(l, r) => Expr::And(Box::new(self.rewrite(l)), Box::new(self.rewrite(r))),
            Expr::Or(l, r) => Expr::Or(Box::new(self.rewrite(l)), Box::new(self.rewrite(r))),
            Expr::Not(inner) => Expr::Not(Box::new(self.rewrite(inner))),
            Expr::Literal(lit) => Expr::Literal(lit.clone()),
            Expr::True => Expr::True,
            Expr::False => Expr::False,
        }
    }

    /// Rebind a whole predicate's body onto `to`
    pub fn rebind<T>(predicate: &Predicate<T>, to: Param) -> Expr {
        ParameterRebinder::new(predicate.param(), to).rewrite(predicate.body())
    }
}

/// Combine two predicates with `op` over one shared, freshly allocated parameter.
///
/// # Panics
///
/// Panics if either operand references a parameter it does not bind; such a
/// predicate can only come from hand-assembled parts and is a programming error.
pub fn combine<T>(left: &Predicate<T>, right: &Predicate<T>, op: BoolOp) -> Predicate<T> {
    assert_closed(left);
    assert_closed(right);

    let shared = Param::fresh();
    let l = Box::new(ParameterRebinder::rebind(left, shared));
    let r = Box::new(ParameterRebinder::rebind(right, shared));
    let body = match op {
        BoolOp::And => Expr::And(l, r),
        BoolOp::Or => Expr::Or(l, r),
    };
    Predicate::from_parts(shared, body)
}

/// Negate a predicate over a freshly allocated parameter.
///
/// # Panics
///
/// Panics under the same conditions as [`combine`].
pub fn negate<T>(inner: &Predicate<T>) -> Predicate<T> {
    assert_closed(inner);

    let shared = Param::fresh();
    let body = Expr::Not(Box::new(ParameterRebinder::rebind(inner, shared)));
    Predicate::from_parts(shared, body)
}

fn assert_closed<T>(predicate: &Predicate<T>) {
    let free = predicate.free_params();
    assert!(
        free.is_empty(),
        "cannot compose {}: unbound parameters {:?}",
        predicate,
        free
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn counter_gt(n: i64) -> Predicate<Value> {
        Predicate::new(|x| x.field("counter").gt(n))
    }

    fn counter_lt(n: i64) -> Predicate<Value> {
        Predicate::new(|x| x.field("counter").lt(n))
    }

    #[test]
    fn test_rebinder_replaces_only_target() {
        let a = Param::fresh();
        let b = Param::fresh();
        let c = Param::fresh();
        let expr = Expr::Param(a).field("x").eq(Expr::Param(b).field("y"));
        let out = ParameterRebinder::new(a, c).rewrite(&expr);
        assert_eq!(out, Expr::Param(c).field("x").eq(Expr::Param(b).field("y")));
    }

    #[test]
    fn test_combine_leaves_single_binding() {
        let left = counter_gt(0);
        let right = counter_lt(10);
        let both = combine(&left, &right, BoolOp::And);

        assert_eq!(both.body().params(), vec![both.param()]);
        assert_ne!(both.param(), left.param());
        assert_ne!(both.param(), right.param());
    }

    #[test]
    fn test_combine_does_not_touch_operands() {
        let left = counter_gt(0);
        let before = left.clone();
        let _ = combine(&left, &counter_lt(10), BoolOp::Or);
        assert_eq!(left, before);
    }

    #[test]
    fn test_combined_semantics() {
        let and = combine(&counter_gt(0), &counter_lt(10), BoolOp::And);
        let or = combine(&counter_gt(10), &counter_lt(0), BoolOp::Or);
        let not = negate(&and);

        for n in [-5, 0, 5, 10, 15] {
            let c = json!({ "counter": n });
            assert_eq!(and.evaluate(&c), n > 0 && n < 10, "and @ {}", n);
            assert_eq!(or.evaluate(&c), !(0..=10).contains(&n), "or @ {}", n);
            assert_eq!(not.evaluate(&c), !(n > 0 && n < 10), "not @ {}", n);
        }
    }

    #[test]
    fn test_deep_composition_stays_closed() {
        let mut acc = counter_gt(-100);
        for i in 0..20 {
            let step = if i % 2 == 0 { counter_lt(100 - i) } else { counter_gt(-100 + i) };
            acc = combine(&acc, &step, BoolOp::And);
            acc = negate(&negate(&acc));
        }
        assert!(acc.is_closed());
        assert!(acc.evaluate(&json!({"counter": 0})));
        assert!(!acc.evaluate(&json!({"counter": 99})));
    }

    #[test]
    fn test_reusing_operand_twice() {
        let p = counter_gt(3);
        let doubled = combine(&p, &p, BoolOp::And);
        assert!(doubled.is_closed());
        assert!(doubled.evaluate(&json!({"counter": 4})));
        assert!(!doubled.evaluate(&json!({"counter": 3})));
    }

    #[test]
    #[should_panic(expected = "unbound parameters")]
    fn test_combine_panics_on_open_predicate() {
        let open: Predicate<Value> =
            Predicate::from_parts(Param::fresh(), Expr::Param(Param::fresh()).field("a").eq(1));
        combine(&open, &counter_gt(0), BoolOp::And);
    }
}
