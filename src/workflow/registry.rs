// SPDX-License-Identifier: MIT

//! Workflows resolved by name
//!
//! Registration happens while the application is being wired up and takes
//! `&mut self`; once built, the registry is only read, so it can be shared
//! without a lock.

use super::Workflow;
use crate::error::ResolutionError;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::Arc;

/// A workflow handle as handed out by the registry
pub type SharedWorkflow<T, U, E> = Arc<dyn Workflow<T, U, Error = E> + Send + Sync>;

type Factory = Box<dyn Fn() -> Box<dyn Any + Send + Sync> + Send + Sync>;

struct Entry {
    factory: Factory,
    signature: String,
}

#[derive(Default)]
pub struct WorkflowRegistry {
    entries: HashMap<String, Entry>,
}

fn signature<T, U, E>() -> String {
    format!(
        "Workflow<{}, {}, Error = {}>",
        type_name::<T>(),
        type_name::<U>(),
        type_name::<E>()
    )
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a factory under `name`, replacing any previous entry
    pub fn register<T, U, W, F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        T: 'static,
        U: 'static,
        W: Workflow<T, U> + Send + Sync + 'static,
        W::Error: 'static,
        F: Fn() -> W + Send + Sync + 'static,
    {
        let signature = signature::<T, U, W::Error>();
        log::debug!("Registering workflow '{}' as {}", name, signature);

        let factory: Factory = Box::new(move || {
            let workflow: SharedWorkflow<T, U, W::Error> = Arc::new(factory());
            Box::new(workflow) as Box<dyn Any + Send + Sync>
        });
        if self
            .entries
            .insert(name.to_string(), Entry { factory, signature })
            .is_some()
        {
            log::warn!("Workflow '{}' was already registered; replaced", name);
        }
        self
    }

    /// Build the workflow registered under `name`
    pub fn get<T, U, E>(&self, name: &str) -> Result<SharedWorkflow<T, U, E>, ResolutionError>
    where
        T: 'static,
        U: 'static,
        E: 'static,
    {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| ResolutionError::NotFound {
                name: name.to_string(),
            })?;

        (entry.factory)()
            .downcast::<SharedWorkflow<T, U, E>>()
            .map(|workflow| *workflow)
            .map_err(|_| ResolutionError::TypeMismatch {
                name: name.to_string(),
                expected: signature::<T, U, E>(),
                registered: entry.signature.clone(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
