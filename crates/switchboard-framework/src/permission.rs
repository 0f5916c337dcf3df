//! Role-based command permissions.

use std::collections::{HashMap, HashSet};

/// Maps command names to the roles allowed to invoke them.
///
/// A command without an entry is open to everyone. A command with an entry
/// is allowed only to users holding at least one listed role; an entry with
/// no roles therefore locks the command for everybody.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionTable {
    entries: HashMap<String, HashSet<String>>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts `command` to the given roles (builder style).
    pub fn with<I, S>(mut self, command: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(command, roles);
        self
    }

    /// Restricts `command` to the given roles, replacing any previous entry.
    pub fn insert<I, S>(&mut self, command: impl Into<String>, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .insert(command.into(), roles.into_iter().map(Into::into).collect());
    }

    /// Returns the roles allowed to run `command`, if it is restricted.
    pub fn roles_for(&self, command: &str) -> Option<&HashSet<String>> {
        self.entries.get(command)
    }

    /// Decides whether a user holding `roles` may invoke `command`.
    pub fn allows<S: AsRef<str>>(&self, roles: &[S], command: &str) -> bool {
        match self.entries.get(command) {
            None => true,
            Some(allowed) => roles.iter().any(|role| allowed.contains(role.as_ref())),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<String>)> for PermissionTable {
    fn from_iter<T: IntoIterator<Item = (S, Vec<String>)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (command, roles) in iter {
            table.insert(command, roles);
        }
        table
    }
}

impl From<HashMap<String, Vec<String>>> for PermissionTable {
    fn from(map: HashMap<String, Vec<String>>) -> Self {
        map.into_iter().collect()
    }
}
