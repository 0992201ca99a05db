// SPDX-License-Identifier: MIT

//! Field access on the values predicates are evaluated against

use serde::Serialize;
use serde_json::Value;
use std::ops::Deref;
use std::rc::Rc;
use std::sync::Arc;

/// Anything a predicate can be evaluated against.
///
/// Implementors expose their fields as JSON values; a field that does not
/// exist returns `None` and is treated as `null` by comparisons.
pub trait Candidate {
    fn field(&self, name: &str) -> Option<Value>;
}

impl Candidate for Value {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl<C: Candidate + ?Sized> Candidate for &C {
    fn field(&self, name: &str) -> Option<Value> {
        (**self).field(name)
    }
}

impl<C: Candidate + ?Sized> Candidate for &mut C {
    fn field(&self, name: &str) -> Option<Value> {
        (**self).field(name)
    }
}

impl<C: Candidate + ?Sized> Candidate for Box<C> {
    fn field(&self, name: &str) -> Option<Value> {
        (**self).field(name)
    }
}

impl<C: Candidate + ?Sized> Candidate for Rc<C> {
    fn field(&self, name: &str) -> Option<Value> {
        (**self).field(name)
    }
}

impl<C: Candidate + ?Sized> Candidate for Arc<C> {
    fn field(&self, name: &str) -> Option<Value> {
        (**self).field(name)
    }
}

/// Any `Serialize` type as a candidate, read through its JSON form.
///
/// The value is serialized on every field access; hand-written impls avoid
/// that cost for hot paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Serialize> Candidate for Json<T> {
    fn field(&self, name: &str) -> Option<Value> {
        match serde_json::to_value(&self.0) {
            Ok(Value::Object(mut fields)) => fields.remove(name),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Failed to serialize candidate: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Order {
        id: u32,
        total: f64,
        customer: Customer,
        note: Option<String>,
    }

    #[derive(Serialize)]
    struct Customer {
        tier: String,
    }

    #[test]
    fn test_serde_adapter() {
        let order = Json(Order {
            id: 7,
            total: 12.5,
            customer: Customer {
                tier: "gold".to_string(),
            },
            note: None,
        });
        assert_eq!(order.field("id"), Some(json!(7)));
        assert_eq!(order.field("customer"), Some(json!({"tier": "gold"})));
        assert_eq!(order.field("note"), Some(Value::Null));
        assert_eq!(order.field("missing"), None);
        assert_eq!(order.id, 7);
        assert_eq!(Json(5).field("anything"), None);
    }

    #[test]
    fn test_json_object_fields() {
        let value = json!({"counter": 3, "name": "a"});
        assert_eq!(value.field("counter"), Some(json!(3)));
        assert_eq!(value.field("missing"), None);
    }

    #[test]
    fn test_non_object_has_no_fields() {
        assert_eq!(json!(42).field("anything"), None);
    }

    #[test]
    fn test_forwarding_impls() {
        let value = json!({"k": true});
        let mut owned = value.clone();
        assert_eq!((&value).field("k"), Some(json!(true)));
        assert_eq!((&mut owned).field("k"), Some(json!(true)));
        assert_eq!(Box::new(value.clone()).field("k"), Some(json!(true)));
        assert_eq!(Rc::new(value.clone()).field("k"), Some(json!(true)));
        assert_eq!(Arc::new(value).field("k"), Some(json!(true)));
    }
}
