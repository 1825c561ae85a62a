use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while building a command registry or evaluating a line.
///
/// Registration variants are fatal and only surface from
/// [`RegistryBuilder::build`](crate::registry::RegistryBuilder::build) and
/// [`FlagSet::new`](crate::flag::FlagSet::new). Every other variant is reported
/// to the user by the shell, which then keeps reading lines.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The typed command matches nothing, not even by prefix.
    #[error("command unrecognized: {0}. ? for help.")]
    UnrecognizedCommand(String),
    /// The typed command is a prefix of several registered commands.
    #[error("ambiguous command `{token}`, did you mean: {}", candidates.join(", "))]
    AmbiguousCommand {
        token: String,
        candidates: Vec<String>,
    },

    /// Two commands were registered under the same name.
    #[error("duplicate command: {0}")]
    DuplicateCommand(String),
    /// A completer was attached to a name the registry does not know.
    #[error("completer registered for unknown command: {0}")]
    UnknownCompleterTarget(String),
    /// Command names must be a single non-empty token.
    #[error("invalid command name: {0:?}")]
    InvalidCommandName(String),
    /// Two flags in one flag set share a name.
    #[error("duplicate flag in set: -{0}")]
    DuplicateFlag(String),
    /// One flag name is a prefix of another in the same set.
    #[error("ambiguous flags in set: -{0} is a prefix of -{1}")]
    AmbiguousFlag(String, String),
    /// Flag names must be a single token not starting with a dash.
    #[error("invalid flag name: {0:?}")]
    InvalidFlagName(String),

    /// The pipe target could not be started.
    #[error("failed to launch `{command}`: {source}")]
    ExternalLaunch {
        command: String,
        #[source]
        source: io::Error,
    },
    /// The pipe target ran but reported failure.
    #[error("`{command}` exited with status {code}")]
    ExternalStatus { command: String, code: i32 },
    /// The pipe stage has no command after the `|`.
    #[error("missing command after `|`")]
    EmptyPipeTarget,

    /// A flag that needs an argument was given without one.
    #[error("-{0} requires an argument")]
    MissingFlagArgument(String),
    /// Captured output could not be appended to the `-f` file.
    #[error("can't write to {}: {source}", path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A command handler (or one of its flag callbacks) failed.
    #[error("{command}: {error:#}")]
    Handler {
        command: String,
        error: anyhow::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ShellError {
    /// Whether the error belongs to registry construction and must abort startup.
    pub fn is_registration_conflict(&self) -> bool {
        matches!(
            self,
            ShellError::DuplicateCommand(_)
                | ShellError::UnknownCompleterTarget(_)
                | ShellError::InvalidCommandName(_)
                | ShellError::DuplicateFlag(_)
                | ShellError::AmbiguousFlag(_, _)
                | ShellError::InvalidFlagName(_)
        )
    }
}
