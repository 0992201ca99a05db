// SPDX-License-Identifier: MIT

//! Rule set loader - YAML file loading and resolution
//!
//! A rule set names rules and lets later entries combine earlier ones:
//!
//! ```yaml
//! rules:
//!   positive: { when: "counter > 0", description: "must be positive" }
//!   small:    { when: "counter < 10" }
//!   in_range: { all: [positive, small] }
//!   outside:  { not: in_range }
//! ```

use super::Rule;
use crate::error::{RuleSetError, RuleflowError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Top-level rule set file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RuleSetDefinition {
    /// Rules keyed by name
    #[serde(default)]
    pub rules: BTreeMap<String, RuleDefinition>,
}

/// One named rule; exactly one of `when`, `all`, `any` or `not` is set
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDefinition {
    /// Shown when the rule rejects a workflow candidate
    pub description: Option<String>,
    /// Condition in the condition language
    pub when: Option<String>,
    /// Names of rules that must all hold
    pub all: Option<Vec<String>>,
    /// Names of rules of which at least one must hold
    pub any: Option<Vec<String>>,
    /// Name of a rule that must not hold
    pub not: Option<String>,
}

/// Loads rule set definitions from YAML files
pub struct RuleSetLoader;

impl RuleSetLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a rule set definition from a YAML file
    pub fn load_rule_set<P: AsRef<Path>>(&self, path: P) -> Result<RuleSetDefinition, RuleflowError> {
        let path = path.as_ref();
        log::debug!("Loading rule set from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::parse_yaml(&content)
    }

    /// Parse a rule set definition from a YAML string
    pub fn parse_yaml(content: &str) -> Result<RuleSetDefinition, RuleflowError> {
        let def: RuleSetDefinition = serde_yaml::from_str(content)?;
        Ok(def)
    }
}

impl Default for RuleSetLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolved rules keyed by name
pub struct RuleBook<T> {
    rules: BTreeMap<String, Rule<T>>,
}

impl<T> RuleBook<T> {
    pub fn get(&self, name: &str) -> Result<&Rule<T>, RuleSetError> {
        self.rules
            .get(name)
            .ok_or_else(|| RuleSetError::NotFound(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl RuleSetDefinition {
    /// Resolve every entry into a `Rule<T>`
    pub fn build<T>(&self) -> Result<RuleBook<T>, RuleSetError> {
        let mut resolved = BTreeMap::new();
        for name in self.rules.keys() {
            let mut stack = Vec::new();
            self.resolve(name, &mut resolved, &mut stack)?;
        }
        log::debug!("Resolved {} rules", resolved.len());
        Ok(RuleBook { rules: resolved })
    }

    fn resolve<T>(
        &self,
        name: &str,
        resolved: &mut BTreeMap<String, Rule<T>>,
        stack: &mut Vec<String>,
    ) -> Result<Rule<T>, RuleSetError> {
        if let Some(rule) = resolved.get(name) {
            return Ok(rule.clone());
        }
        if let Some(start) = stack.iter().position(|n| n == name) {
            let mut cycle = stack[start..].to_vec();
            cycle.push(name.to_string());
            return Err(RuleSetError::CircularReference(cycle));
        }
        let def = self
            .rules
            .get(name)
            .ok_or_else(|| RuleSetError::NotFound(name.to_string()))?;

        stack.push(name.to_string());
        let rule = self.resolve_definition(name, def, resolved, stack)?;
        stack.pop();

        let rule = match &def.description {
            Some(text) => rule.describe(text.clone()),
            None => rule,
        };
        resolved.insert(name.to_string(), rule.clone());
        Ok(rule)
    }

    fn resolve_definition<T>(
        &self,
        name: &str,
        def: &RuleDefinition,
        resolved: &mut BTreeMap<String, Rule<T>>,
        stack: &mut Vec<String>,
    ) -> Result<Rule<T>, RuleSetError> {
        let invalid = |reason: &str| RuleSetError::InvalidDefinition {
            rule: name.to_string(),
            reason: reason.to_string(),
        };

        let set = [
            def.when.is_some(),
            def.all.is_some(),
            def.any.is_some(),
            def.not.is_some(),
        ]
        .iter()
        .filter(|s| **s)
        .count();
        if set != 1 {
            return Err(invalid("expected exactly one of when, all, any, not"));
        }

        if let Some(condition) = &def.when {
            return Rule::parse(condition).map_err(|source| RuleSetError::Parse {
                rule: name.to_string(),
                source,
            });
        }
        if let Some(inner) = &def.not {
            return Ok(self.resolve_reference(name, inner, resolved, stack)?.negate());
        }

        let (members, all) = match (&def.all, &def.any) {
            (Some(members), _) => (members, true),
            (_, Some(members)) => (members, false),
            _ => return Err(invalid("expected exactly one of when, all, any, not")),
        };
        let mut rules = Vec::with_capacity(members.len());
        for member in members {
            rules.push(self.resolve_reference(name, member, resolved, stack)?);
        }
        join_balanced(rules, all).ok_or_else(|| invalid("member list is empty"))
    }

    fn resolve_reference<T>(
        &self,
        name: &str,
        reference: &str,
        resolved: &mut BTreeMap<String, Rule<T>>,
        stack: &mut Vec<String>,
    ) -> Result<Rule<T>, RuleSetError> {
        if !self.rules.contains_key(reference) {
            return Err(RuleSetError::UnknownRule {
                rule: name.to_string(),
                reference: reference.to_string(),
            });
        }
        self.resolve(reference, resolved, stack)
    }
}

/// Join members pairwise so the tree stays O(log n) deep; every composite
/// caches a copy of its subtree, so depth bounds the total size.
fn join_balanced<T>(mut rules: Vec<Rule<T>>, all: bool) -> Option<Rule<T>> {
    while rules.len() > 1 {
        rules = rules
            .chunks(2)
            .filter_map(|pair| {
                pair.iter()
                    .cloned()
                    .reduce(|a, b| if all { a.and(&b) } else { a.or(&b) })
            })
            .collect();
    }
    rules.pop()
}
