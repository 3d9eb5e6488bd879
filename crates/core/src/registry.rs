//! Explicit target-name → user action factory mapping.
//!
//! The embedding application registers its actions at startup. An empty
//! target resolves to the base name; a target `t` resolves to `<base>_t`.

use std::collections::BTreeMap;

use crate::action::UserAction;
use crate::args::ParsedArguments;
use crate::error::HarnessError;

/// Builds one user action per run from the parsed command line.
pub type ActionFactory = Box<dyn Fn(&ParsedArguments) -> Box<dyn UserAction>>;

pub struct ActionRegistry {
    base_name: String,
    factories: BTreeMap<String, ActionFactory>,
}

impl ActionRegistry {
    pub fn new(base_name: impl Into<String>) -> Self {
        ActionRegistry {
            base_name: base_name.into(),
            factories: BTreeMap::new(),
        }
    }

    /// Registration name for a target.
    pub fn action_name(&self, target: &str) -> String {
        if target.is_empty() {
            self.base_name.clone()
        } else {
            format!("{}_{}", self.base_name, target)
        }
    }

    /// Register the action used when no target is given.
    pub fn register_default<F>(&mut self, factory: F) -> &mut Self
    where
        F: Fn(&ParsedArguments) -> Box<dyn UserAction> + 'static,
    {
        let name = self.action_name("");
        self.factories.insert(name, Box::new(factory));
        self
    }

    /// Register the action selected by `target`. Re-registering replaces.
    pub fn register<F>(&mut self, target: &str, factory: F) -> &mut Self
    where
        F: Fn(&ParsedArguments) -> Box<dyn UserAction> + 'static,
    {
        let name = self.action_name(target);
        self.factories.insert(name, Box::new(factory));
        self
    }

    pub fn resolve(&self, target: &str) -> Result<&ActionFactory, HarnessError> {
        let name = self.action_name(target);
        self.factories
            .get(&name)
            .ok_or_else(|| HarnessError::UnknownTarget {
                name,
                target: target.to_string(),
            })
    }

    /// Resolve the factory for `args.target` and build the action.
    pub fn instantiate(&self, args: &ParsedArguments) -> Result<Box<dyn UserAction>, HarnessError> {
        let factory = self.resolve(&args.target)?;
        Ok(factory(args))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}
