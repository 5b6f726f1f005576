//! Rule registry
//!
//! Maps rule names to factories producing [`RuleDescriptor`]s. The registry is a
//! plain value handed to controllers, so independent validation contexts can hold
//! different rule sets.

use crate::error::{Error, Result};
use crate::rule::{FieldSnapshot, RuleDescriptor};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Builds the descriptor for one field.
pub type RuleFactory = Arc<dyn Fn(&FieldSnapshot) -> RuleDescriptor + Send + Sync>;

#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: BTreeMap<String, RuleFactory>,
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.names())
            .finish()
    }
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every rule shipped in [`crate::rules`].
    pub fn with_builtin_rules() -> Self {
        let mut registry = Self::new();
        crate::rules::register_all(&mut registry);
        registry
    }

    /// Register `factory` under `name`. A later registration for the same name wins.
    pub fn add_rule<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(&FieldSnapshot) -> RuleDescriptor + Send + Sync + 'static,
    {
        if self.rules.insert(name.to_string(), Arc::new(factory)).is_some() {
            tracing::debug!("rule '{}' re-registered; previous factory replaced", name);
        }
        self
    }

    pub fn get_rule(&self, name: &str) -> Result<RuleFactory> {
        self.rules
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownRule(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.keys().map(String::as_str).collect()
    }
}
