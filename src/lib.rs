//! A small framework for interactive line-oriented command shells.
//!
//! Commands are plain Rust closures registered once at startup. Each input
//! line is split into a command, positional arguments and named flags; the
//! command's output can be silenced, appended to a file or piped into one
//! external command. Tab completion and documentation are derived from the
//! same registry.
//!
//! The main entry point is [`Shell`], built from a [`Registry`] and a
//! [`ShellConfig`]. The public modules expose the building blocks: [`flag`]
//! for flag matching, [`completion`] for the completion resolver and
//! [`parser`] for line splitting.

pub mod command;
pub mod completion;
pub mod config;
pub mod docs;
pub mod error;
mod external;
pub mod flag;
pub mod history;
mod io_adapters;
pub mod logging;
pub mod parser;
pub mod registry;
mod shell;

pub use command::{Command, Handler};
pub use config::{CliArgs, ShellConfig};
pub use error::ShellError;
pub use flag::{Flag, FlagSet, MatchedFlags};
pub use history::History;
pub use io_adapters::MemWriter;
pub use registry::Registry;
pub use shell::{Flow, Shell};
