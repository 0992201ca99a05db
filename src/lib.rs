// SPDX-License-Identifier: MIT

//! Composable rules over typed candidates and precondition-gated workflows
//!
//! - [`expr`] - predicate expressions: AST, evaluation, composition, parsing
//! - [`rule`] - `Rule<T>`, filtering, YAML rule sets
//! - [`workflow`] - `Workflow<T, U>`, `Maybe<T>` chaining, the workflow registry

pub mod error;
pub mod expr;
pub mod rule;
pub mod workflow;

pub use error::{PreconditionViolation, ResolutionError, RuleflowError};
pub use expr::{Candidate, Json, Predicate};
pub use rule::{Filter, Rule};
pub use workflow::{Maybe, Precondition, Step, Workflow, WorkflowRegistry};
