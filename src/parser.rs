//! Splitting one input line into command, arguments, flags and pipe target.

use crate::flag::{FlagSet, MatchedFlags, SILENT_FLAG, WRITE_FLAG};
use crate::registry::Registry;
use tracing::debug;

/// One input line broken into its parts. Lives for a single evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLine {
    /// Everything before the pipe, with escaped pipes unescaped.
    pub command_string: String,
    /// Everything after the first unescaped `|`, verbatim.
    pub bash_string: Option<String>,
    /// First token of the command string.
    pub command: String,
    /// Positional arguments left after flag extraction.
    pub args: Vec<String>,
    /// Flags declared by the command and found on the line.
    pub matched_flags: MatchedFlags,
    /// Global output-control flags found on the line.
    pub output_flags: MatchedFlags,
}

impl ParsedLine {
    /// `-s` was given.
    pub fn silent(&self) -> bool {
        self.output_flags.contains_key(SILENT_FLAG)
    }

    /// The `-f` argument, if the flag was given (possibly empty).
    pub fn append_to(&self) -> Option<&str> {
        self.output_flags.get(WRITE_FLAG).map(String::as_str)
    }
}

/// Parse `line` against the registry.
///
/// Global output flags are extracted first, skipping any name the invoked
/// command declares itself; then the command's own flags are extracted. The
/// rest is split on `split_pattern`, dropping empty tokens.
pub fn parse_line(
    line: &str,
    registry: &Registry,
    output_flags: &FlagSet,
    split_pattern: &str,
) -> ParsedLine {
    let (command_string, bash_string) = split_pipe(line);
    let (command, remainder) = split_command(&command_string);

    let command_flags = registry.get(command).map(|cmd| cmd.flag_set());
    let (remainder, output) = output_flags.extract_unless(remainder, |name| {
        command_flags.is_some_and(|flags| flags.contains(name))
    });
    let (remainder, matched_flags) = match command_flags {
        Some(flags) => flags.extract_all(&remainder),
        None => (remainder, MatchedFlags::new()),
    };

    let parsed = ParsedLine {
        command: command.to_string(),
        args: tokenize(&remainder, split_pattern),
        matched_flags,
        output_flags: output,
        bash_string,
        command_string: command_string.clone(),
    };
    debug!(?parsed, "parsed line");
    parsed
}

/// Split on the first `|` not preceded by a backslash.
pub fn split_pipe(line: &str) -> (String, Option<String>) {
    let mut command = String::with_capacity(line.len());
    let mut chars = line.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '\\' if matches!(chars.peek(), Some((_, '|'))) => {
                command.push('|');
                chars.next();
            }
            '|' => return (command, Some(line[i + 1..].to_string())),
            c => command.push(c),
        }
    }
    (command, None)
}

/// Split at the first whitespace run into the command token and the remainder.
pub fn split_command(command_string: &str) -> (&str, &str) {
    let trimmed = command_string.trim_start();
    match trimmed.find(char::is_whitespace) {
        Some(i) => {
            let rest = &trimmed[i..];
            (&trimmed[..i], rest.trim_start())
        }
        None => (trimmed, ""),
    }
}

/// Split arguments on `pattern`, trimming each token and dropping empty ones.
pub fn tokenize(remainder: &str, pattern: &str) -> Vec<String> {
    if pattern.is_empty() {
        return remainder.split_whitespace().map(str::to_string).collect();
    }
    remainder
        .split(pattern)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
