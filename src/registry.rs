//! The fixed table of commands known to a shell.
//!
//! Commands are collected through [`RegistryBuilder`] at startup. Once built,
//! the [`Registry`] is never modified; the shell and its completer share it
//! behind an `Rc`.

use crate::command::{Command, CompleterFn};
use crate::error::ShellError;
use std::collections::BTreeMap;
use tracing::warn;

/// Words handled by the shell itself before the registry is consulted.
pub const QUIT: &str = "quit";
pub const HELP: &str = "help";
pub const HELP_SHORT: &str = "?";
pub const MINI_HELP: &str = "??";

/// Built-in words that shadow any registered command of the same name.
pub const SHADOWED_NAMES: [&str; 3] = [HELP, HELP_SHORT, MINI_HELP];

/// Name → command table, sorted by name.
#[derive(Debug, Default)]
pub struct Registry {
    commands: BTreeMap<String, Command>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Commands in name order.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Collects commands and completers, then validates them all at once.
#[derive(Default)]
pub struct RegistryBuilder {
    commands: Vec<Command>,
    completers: Vec<(String, CompleterFn)>,
}

impl RegistryBuilder {
    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Attach a completer to a command registered (before or after) on this builder.
    pub fn completer<F>(mut self, name: &str, completer: F) -> Self
    where
        F: Fn(&str, &str, usize, usize) -> Vec<String> + 'static,
    {
        let completer: CompleterFn = Box::new(completer);
        self.completers.push((name.to_string(), completer));
        self
    }

    /// Build the registry.
    ///
    /// Fails on duplicate or malformed names and on completers attached to
    /// unknown commands.
    pub fn build(self) -> Result<Registry, ShellError> {
        let mut commands = BTreeMap::new();
        for command in self.commands {
            let name = command.name().to_string();
            if name.is_empty() || name.contains(char::is_whitespace) || name.contains('|') {
                return Err(ShellError::InvalidCommandName(name));
            }
            if SHADOWED_NAMES.contains(&name.as_str()) {
                warn!(command = %name, "command is shadowed by the built-in of the same name");
            }
            if commands.contains_key(&name) {
                return Err(ShellError::DuplicateCommand(name));
            }
            commands.insert(name, command);
        }

        for (name, completer) in self.completers {
            match commands.get_mut(&name) {
                Some(command) => command.set_completer(completer),
                None => return Err(ShellError::UnknownCompleterTarget(name)),
            }
        }

        Ok(Registry { commands })
    }
}
