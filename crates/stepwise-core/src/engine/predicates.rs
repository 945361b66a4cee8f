//! Named predicate registry for custom validation rules and conditions.

use std::{collections::HashMap, fmt, sync::Arc};

use super::condition::ConditionContext;

/// A registered predicate.
pub type Predicate = Arc<dyn Fn(&ConditionContext) -> bool + Send + Sync>;

/// Capability-keyed registry of predicates (name → predicate).
///
/// Lookups that miss are never an error here: conditions treat them as no
/// match and custom validation rules treat them as a failure.
#[derive(Clone, Default)]
pub struct PredicateRegistry {
    predicates: HashMap<String, Predicate>,
}

impl PredicateRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in predicates:
    ///
    /// - `non_empty_value`: the submitted value has non-whitespace content
    /// - `numeric_value`: the submitted value parses as a number
    /// - `affirmative`: the submitted value is yes/y/true/ok/1 (any case)
    pub fn with_builtins() -> Self {
        Self::new()
            .with("non_empty_value", |ctx: &ConditionContext| {
                !ctx.text("value").trim().is_empty()
            })
            .with("numeric_value", |ctx: &ConditionContext| {
                ctx.text("value").trim().parse::<f64>().is_ok()
            })
            .with("affirmative", |ctx: &ConditionContext| {
                matches!(
                    ctx.text("value").trim().to_lowercase().as_str(),
                    "yes" | "y" | "true" | "ok" | "1"
                )
            })
    }

    /// Registers `predicate` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F) -> &mut Self
    where
        F: Fn(&ConditionContext) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(name.into(), Arc::new(predicate));
        self
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&ConditionContext) -> bool + Send + Sync + 'static,
    {
        self.register(name, predicate);
        self
    }

    /// Merges every entry of `other` into this registry.
    pub fn extend(&mut self, other: PredicateRegistry) {
        self.predicates.extend(other.predicates);
    }

    pub fn lookup(&self, name: &str) -> Option<&Predicate> {
        self.predicates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.predicates.keys().collect();
        names.sort();
        f.debug_struct("PredicateRegistry")
            .field("predicates", &names)
            .finish()
    }
}
