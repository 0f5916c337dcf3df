//! Command registry.
//!
//! Stores every [`Descriptor`] under its name. Names are unique across rich
//! and simple commands and lookups are case-sensitive. Registration order is
//! preserved for help listings.

use std::collections::HashMap;

use tracing::debug;

use crate::command::Descriptor;
use crate::error::{MuxError, MuxResult};

#[derive(Debug, Default)]
pub struct Registry {
    /// Descriptors in registration order.
    descriptors: Vec<Descriptor>,
    /// Map from command name to position in `descriptors`.
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor.
    ///
    /// Fails if the name is empty, contains whitespace, or is already taken
    /// by a command of either kind.
    pub fn register(&mut self, descriptor: Descriptor) -> MuxResult<()> {
        let name = descriptor.name();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(MuxError::InvalidCommandName(name.to_string()));
        }
        if self.index.contains_key(name) {
            return Err(MuxError::DuplicateCommand(name.to_string()));
        }

        debug!(command = name, "Registered command");
        self.index.insert(name.to_string(), self.descriptors.len());
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Looks up a descriptor by exact name.
    pub fn lookup(&self, name: &str) -> Option<&Descriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    /// Returns all command names in registration order.
    pub fn all_names(&self) -> Vec<&str> {
        self.descriptors.iter().map(Descriptor::name).collect()
    }

    /// Iterates over descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::SimpleCommand;

    fn simple(name: &str) -> Descriptor {
        SimpleCommand::new(name, "content", "help").into()
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = Registry::new();
        registry.register(simple("rules")).unwrap();
        registry.register(simple("faq")).unwrap();

        assert_eq!(registry.lookup("rules").map(Descriptor::name), Some("rules"));
        assert!(registry.lookup("Rules").is_none());
        assert!(registry.lookup("missing").is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_names_keep_registration_order() {
        let mut registry = Registry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(simple(name)).unwrap();
        }
        assert_eq!(registry.all_names(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let mut registry = Registry::new();
        registry.register(simple("rules")).unwrap();

        let err = registry.register(simple("rules")).unwrap_err();
        assert!(matches!(err, MuxError::DuplicateCommand(name) if name == "rules"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.register(simple("")),
            Err(MuxError::InvalidCommandName(_))
        ));
        assert!(matches!(
            registry.register(simple("two words")),
            Err(MuxError::InvalidCommandName(_))
        ));
        assert!(registry.is_empty());
    }
}
