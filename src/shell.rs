use crate::command::Command;
use crate::completion::{CompletionResolver, ShellHelper};
use crate::config::ShellConfig;
use crate::docs;
use crate::error::ShellError;
use crate::external;
use crate::flag::{FlagSet, WRITE_FLAG};
use crate::history::History;
use crate::io_adapters::append_to_file;
use crate::parser::{ParsedLine, parse_line};
use crate::registry::{HELP, HELP_SHORT, MINI_HELP, QUIT, Registry};
use anyhow::Context;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// What the read loop should do after a line has been evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// An interactive shell evaluating lines against a fixed [`Registry`].
///
/// Example
/// ```
/// use ore::{Command, Flow, Handler, MemWriter, Registry, Shell, ShellConfig};
/// let registry = Registry::builder()
///     .command(Command::new("echo", Handler::args(|args, out| {
///         writeln!(out, "{}", args.join(" "))?;
///         Ok(())
///     })))
///     .build()
///     .unwrap();
/// let out = MemWriter::new();
/// let mut sh = Shell::new(registry, ShellConfig::default().history_path(None))
///     .unwrap()
///     .with_output(Box::new(out.clone()));
/// assert_eq!(sh.eval("echo hello world").unwrap(), Flow::Continue);
/// assert_eq!(out.contents(), "hello world\n");
/// ```
pub struct Shell {
    registry: Rc<Registry>,
    config: ShellConfig,
    output_flags: FlagSet,
    history: History,
    out: Box<dyn Write>,
}

impl Shell {
    /// Create a shell writing to stdout, with history opened from the config.
    pub fn new(registry: Registry, config: ShellConfig) -> anyhow::Result<Self> {
        let history = match &config.history_path {
            Some(path) => History::open(path)?,
            None => History::in_memory(),
        };
        Ok(Self {
            registry: Rc::new(registry),
            output_flags: FlagSet::output_flags()?,
            config,
            history,
            out: Box::new(io::stdout()),
        })
    }

    /// Send all output to `out` instead of stdout.
    pub fn with_output(mut self, out: Box<dyn Write>) -> Self {
        self.out = out;
        self
    }

    pub fn with_history(mut self, history: History) -> Self {
        self.history = history;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Split `line` without executing anything.
    pub fn parse(&self, line: &str) -> ParsedLine {
        parse_line(
            line,
            &self.registry,
            &self.output_flags,
            &self.config.split_pattern,
        )
    }

    /// Evaluate one input line.
    ///
    /// A blank line repeats the last history entry. Errors from commands are
    /// reported to the output and do not stop the shell; only failing to write
    /// that output is returned as an error.
    pub fn eval(&mut self, line: &str) -> anyhow::Result<Flow> {
        if line.trim().is_empty() {
            return match self.history.read_last().map(str::to_string) {
                Some(previous) => {
                    debug!(line = %previous, "repeating last line");
                    Ok(self.dispatch(&previous)?)
                }
                None => Ok(Flow::Continue),
            };
        }

        let flow = self.dispatch(line)?;
        if flow == Flow::Continue {
            if let Err(e) = self.history.append(line) {
                warn!(error = %e, "failed to record history");
            }
        }
        Ok(flow)
    }

    fn dispatch(&mut self, line: &str) -> io::Result<Flow> {
        match self.run(line) {
            Ok(flow) => Ok(flow),
            Err(ShellError::Io(e)) => Err(e),
            Err(e) => {
                self.report(&e)?;
                Ok(Flow::Continue)
            }
        }
    }

    fn run(&mut self, line: &str) -> Result<Flow, ShellError> {
        let registry = Rc::clone(&self.registry);
        let parsed = self.parse(line);

        match parsed.command.as_str() {
            QUIT => {
                if let Err(e) = self.quit(&registry, &parsed) {
                    self.report(&e)?;
                }
                Ok(Flow::Quit)
            }
            HELP | HELP_SHORT => {
                let text = match parsed.args.iter().find_map(|arg| registry.get(arg)) {
                    Some(command) => docs::command_docs(command),
                    None => docs::full_docs(&self.config.title, &registry, &self.output_flags),
                };
                self.out.write_all(text.as_bytes())?;
                Ok(Flow::Continue)
            }
            MINI_HELP => {
                self.out.write_all(docs::grouped_listing(&registry).as_bytes())?;
                Ok(Flow::Continue)
            }
            name => match registry.get(name) {
                Some(command) => {
                    debug!(command = name, "dispatching");
                    self.invoke(command, &parsed)?;
                    Ok(Flow::Continue)
                }
                None => self.fallback(&parsed.command, line),
            },
        }
    }

    fn quit(&mut self, registry: &Registry, parsed: &ParsedLine) -> Result<(), ShellError> {
        match registry.get(QUIT) {
            Some(command) => self.invoke(command, parsed),
            None => Ok(writeln!(self.out, "Bye.")?),
        }
    }

    /// Resolve an unknown command by unique prefix, or explain why not.
    fn fallback(&mut self, token: &str, line: &str) -> Result<Flow, ShellError> {
        if token.is_empty() {
            return Err(ShellError::UnrecognizedCommand(line.trim().to_string()));
        }
        let resolver = CompletionResolver::new(Rc::clone(&self.registry));
        let mut candidates = resolver.global_candidates(token);
        match candidates.len() {
            0 => Err(ShellError::UnrecognizedCommand(token.to_string())),
            1 => {
                let candidate = candidates.remove(0);
                let rest = line.trim_start().strip_prefix(token).unwrap_or("");
                let rewritten = format!("{}{}", candidate, rest);
                debug!(from = token, to = %candidate, "completing unrecognized command");
                self.run(&rewritten)
            }
            _ => Err(ShellError::AmbiguousCommand {
                token: token.to_string(),
                candidates,
            }),
        }
    }

    /// Fire matched flag callbacks, call the handler and route its output.
    fn invoke(&mut self, command: &Command, parsed: &ParsedLine) -> Result<(), ShellError> {
        let handler_error = |error: anyhow::Error| ShellError::Handler {
            command: command.name().to_string(),
            error,
        };

        for flag in command.flag_set().iter() {
            if let Some(argument) = parsed.matched_flags.get(flag.name()) {
                flag.fire(argument).map_err(handler_error)?;
            }
        }

        if command.is_bypass() {
            if parsed.bash_string.is_some() {
                warn!(command = command.name(), "output of a bypass command is never piped");
            }
            let result = command
                .handler()
                .call(&parsed.args, &parsed.matched_flags, &mut *self.out);
            self.out.flush()?;
            return result.map_err(handler_error);
        }

        let mut captured = Vec::new();
        let result = command
            .handler()
            .call(&parsed.args, &parsed.matched_flags, &mut captured);
        if let Err(error) = result {
            // Partial output takes the same route as complete output; the
            // handler error is the one reported.
            match &parsed.bash_string {
                Some(bash) => {
                    if let Err(e) = external::pipe_through(bash, &captured, &mut *self.out) {
                        warn!(command = command.name(), error = %e, "piping partial output failed");
                    }
                }
                None if !parsed.silent() => self.out.write_all(&captured)?,
                None => {}
            }
            return Err(handler_error(error));
        }

        match &parsed.bash_string {
            Some(bash) => external::pipe_through(bash, &captured, &mut *self.out),
            None => self.emit(parsed, &captured),
        }
    }

    /// Print and/or append captured output according to `-s` and `-f`.
    fn emit(&mut self, parsed: &ParsedLine, captured: &[u8]) -> Result<(), ShellError> {
        if !parsed.silent() {
            self.out.write_all(captured)?;
            self.out.flush()?;
        }
        match parsed.append_to() {
            Some("") => Err(ShellError::MissingFlagArgument(WRITE_FLAG.to_string())),
            Some(path) => append_to_file(Path::new(path), captured).map_err(|source| {
                ShellError::WriteFile {
                    path: PathBuf::from(path),
                    source,
                }
            }),
            None => Ok(()),
        }
    }

    fn report(&mut self, error: &ShellError) -> io::Result<()> {
        debug!(%error, "reporting error");
        writeln!(self.out, "{} {}", "Error:".red().bold(), error)?;
        self.out.flush()
    }

    /// Write the Markdown README to the configured path.
    pub fn write_readme(&self) -> anyhow::Result<PathBuf> {
        let path = self.config.readme_path.clone();
        let text = docs::readme(&self.config.title, &self.registry, &self.output_flags);
        fs::write(&path, text).with_context(|| format!("can't write {}", path.display()))?;
        info!(path = %path.display(), "generated README");
        Ok(path)
    }

    /// Read-Eval-Print Loop with tab completion, until `quit`, Ctrl-C or Ctrl-D.
    pub fn repl(&mut self) -> anyhow::Result<()> {
        if self.config.generate_readme {
            self.write_readme()?;
        }

        let mut rl: Editor<ShellHelper, DefaultHistory> = Editor::new()?;
        rl.set_helper(Some(ShellHelper::new(Rc::clone(&self.registry))));
        for entry in self.history.entries() {
            rl.add_history_entry(entry.as_str())?;
        }

        writeln!(self.out, "{}", self.config.intro)?;
        loop {
            match rl.readline(&self.config.prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    if self.eval(&line)? == Flow::Quit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    writeln!(self.out, "Interrupted")?;
                    break;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }

        Ok(())
    }
}
