// SPDX-License-Identifier: MIT

//! Typed error handling for ruleflow-rs
//!
//! Rule evaluation and composition never fail at runtime. Errors come from
//! three places: a workflow rejecting its candidate, resolving something by
//! name (registry, rule sets), and turning text into expressions.

use thiserror::Error;

/// Top-level error type for ruleflow-rs
#[derive(Debug, Error)]
pub enum RuleflowError {
    /// A workflow's precondition rejected the candidate
    #[error(transparent)]
    Precondition(#[from] PreconditionViolation),

    /// Workflow lookup by name failed
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// A rule set could not be turned into rules
    #[error(transparent)]
    RuleSet(#[from] RuleSetError),

    /// A condition string could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// An expression could not be compiled or rendered
    #[error(transparent)]
    Expr(#[from] ExprError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error wrapper, mostly for transition logic
    #[error("{0}")]
    Other(String),
}

/// Raised when a workflow's precondition is not satisfied.
///
/// The message is exactly the rule's description, or empty when the rule
/// was never described.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{description}")]
pub struct PreconditionViolation {
    pub description: String,
}

impl PreconditionViolation {
    pub fn new(description: Option<&str>) -> Self {
        Self {
            description: description.unwrap_or_default().to_string(),
        }
    }
}

/// Workflow registry lookup errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// Nothing registered under this name
    #[error("No workflow registered under '{name}'")]
    NotFound { name: String },

    /// Registered, but for a different candidate/result/error type
    #[error("Workflow '{name}' is registered as {registered}, not {expected}")]
    TypeMismatch {
        name: String,
        expected: String,
        registered: String,
    },
}

/// Condition parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Blank input
    #[error("Empty condition")]
    Empty,

    /// Nothing recognisable as a comparison
    #[error("Could not parse condition: {0}")]
    Condition(String),

    /// Right-hand side is neither a literal nor a field path
    #[error("Could not parse operand: {0}")]
    Operand(String),

    /// Quotes or parentheses do not pair up
    #[error("Unbalanced quotes or parentheses in: {0}")]
    Unbalanced(String),
}

/// Expression compilation and rendering errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    /// The body references a parameter the predicate does not bind
    #[error("Expression references unbound parameter {0}")]
    UnboundParameter(String),

    /// The expression has no equivalent in the condition language
    #[error("Expression cannot be rendered as a condition: {0}")]
    Untranslatable(String),
}

/// Rule set resolution errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleSetError {
    /// A rule references a name that is not defined
    #[error("Rule '{rule}' references unknown rule '{reference}'")]
    UnknownRule { rule: String, reference: String },

    /// Requested a rule that is not defined
    #[error("Rule '{0}' not found")]
    NotFound(String),

    /// Rules reference each other in a loop
    #[error("Circular rule reference: {0:?}")]
    CircularReference(Vec<String>),

    /// The entry does not define exactly one of when/all/any/not
    #[error("Invalid definition for rule '{rule}': {reason}")]
    InvalidDefinition { rule: String, reason: String },

    /// A `when` condition failed to parse
    #[error("Rule '{rule}': {source}")]
    Parse {
        rule: String,
        #[source]
        source: ParseError,
    },
}

impl RuleflowError {
    /// Create from a generic message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<&str> for RuleflowError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for RuleflowError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_message_is_description() {
        let err = PreconditionViolation::new(Some("must be positive"));
        assert_eq!(err.to_string(), "must be positive");

        let wrapped: RuleflowError = err.into();
        assert_eq!(wrapped.to_string(), "must be positive");
    }

    #[test]
    fn test_precondition_without_description_is_empty() {
        let err = PreconditionViolation::new(None);
        assert_eq!(err.to_string(), "");
    }

    #[test]
    fn test_resolution_messages_differ() {
        let missing = ResolutionError::NotFound {
            name: "raise".into(),
        };
        let mismatch = ResolutionError::TypeMismatch {
            name: "raise".into(),
            expected: "A".into(),
            registered: "B".into(),
        };
        assert!(missing.to_string().contains("No workflow"));
        assert!(mismatch.to_string().contains("registered as B"));
    }
}
