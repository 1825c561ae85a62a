//! Named line flags: matching a single flag inside a line and extracting a
//! whole set of them.
//!
//! A flag is written as a dash followed by its exact name (`-s`), optionally
//! followed by one whitespace-free argument when the flag declares one
//! (`-f out.txt`). Matching removes the flag (and its argument) from the line,
//! leaving the rest for positional argument splitting.

use crate::error::ShellError;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

/// Flags matched on one line: flag name to argument (empty for switches).
pub type MatchedFlags = BTreeMap<String, String>;

/// Side effect run by the evaluator when a flag is present on a line.
///
/// Receives `Some(argument)` for flags taking an argument and `None` otherwise.
pub type FlagCallback = Box<dyn Fn(Option<&str>) -> anyhow::Result<()>>;

/// Global flag appending captured output to a file.
pub const WRITE_FLAG: &str = "f";
/// Global flag suppressing printed output.
pub const SILENT_FLAG: &str = "s";

/// Result of finding a flag in a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagMatch {
    /// Name of the matched flag.
    pub name: String,
    /// The flag argument, or an empty string for switches and missing arguments.
    pub argument: String,
    /// The line with the flag (and argument) cut out.
    pub remaining: String,
}

/// A single named flag, optionally taking one argument.
pub struct Flag {
    name: String,
    placeholder: Option<String>,
    description: String,
    usage: String,
    pattern: Regex,
    on_match: Option<FlagCallback>,
}

impl Flag {
    /// A flag without an argument, e.g. `-s`.
    pub fn switch(name: &str, description: &str) -> Result<Self, ShellError> {
        Self::build(name, None, description)
    }

    /// A flag taking one argument, e.g. `-f <file>`.
    ///
    /// `placeholder` is only used for the usage string.
    pub fn with_arg(name: &str, placeholder: &str, description: &str) -> Result<Self, ShellError> {
        Self::build(name, Some(placeholder.to_string()), description)
    }

    fn build(
        name: &str,
        placeholder: Option<String>,
        description: &str,
    ) -> Result<Self, ShellError> {
        if name.is_empty() || name.starts_with('-') || name.contains(char::is_whitespace) {
            return Err(ShellError::InvalidFlagName(name.to_string()));
        }

        // The dash must open a token and the name must close it.
        let source = if placeholder.is_some() {
            format!(r"(?:^|\s)(-{})(?:\s+(\S+))?(?:\s|$)", regex::escape(name))
        } else {
            format!(r"(?:^|\s)(-{})(?:\s|$)", regex::escape(name))
        };
        let pattern =
            Regex::new(&source).map_err(|_| ShellError::InvalidFlagName(name.to_string()))?;

        let usage = match &placeholder {
            Some(arg) if !arg.is_empty() => format!("-{} {}", name, arg),
            _ => format!("-{}", name),
        };

        Ok(Self {
            name: name.to_string(),
            placeholder,
            description: description.to_string(),
            usage,
            pattern,
            on_match: None,
        })
    }

    /// Attach a side effect fired by the evaluator when the flag is matched.
    pub fn on_match<F>(mut self, callback: F) -> Self
    where
        F: Fn(Option<&str>) -> anyhow::Result<()> + 'static,
    {
        self.on_match = Some(Box::new(callback));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn takes_argument(&self) -> bool {
        self.placeholder.is_some()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Usage string such as `-f <file>`, fixed at construction.
    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// Find the first occurrence of this flag in `line` and cut it out.
    ///
    /// Whitespace on both sides of the cut collapses into a single space, and
    /// disappears entirely at either end of the line. A switch never consumes
    /// the token that follows it.
    pub fn match_and_strip(&self, line: &str) -> Option<FlagMatch> {
        self.locate(line, &|_| false).map(|(_, found)| found)
    }

    /// Like [`match_and_strip`](Self::match_and_strip), also returning where
    /// the flag starts. A candidate argument for which `is_flag` holds is
    /// left in the line and the argument is empty.
    fn locate(&self, line: &str, is_flag: &dyn Fn(&str) -> bool) -> Option<(usize, FlagMatch)> {
        let caps = self.pattern.captures(line)?;
        let flag = caps.get(1)?;
        let (argument, end) = match caps.get(2) {
            Some(arg) if !is_flag(arg.as_str()) => (arg.as_str().to_string(), arg.end()),
            _ => (String::new(), flag.end()),
        };

        let found = FlagMatch {
            name: self.name.clone(),
            argument,
            remaining: splice(line, flag.start(), end),
        };
        Some((flag.start(), found))
    }

    /// Run the `on_match` callback, if any.
    pub fn fire(&self, argument: &str) -> anyhow::Result<()> {
        match &self.on_match {
            Some(callback) if self.takes_argument() => callback(Some(argument)),
            Some(callback) => callback(None),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .field("description", &self.description)
            .field("on_match", &self.on_match.is_some())
            .finish()
    }
}

fn splice(line: &str, start: usize, end: usize) -> String {
    let head = line[..start].trim_end();
    let tail = line[end..].trim_start();
    if head.is_empty() || tail.is_empty() {
        format!("{}{}", head, tail)
    } else {
        format!("{} {}", head, tail)
    }
}

/// An ordered collection of flags with unique, non-overlapping names.
#[derive(Debug, Default)]
pub struct FlagSet {
    flags: Vec<Flag>,
}

impl FlagSet {
    /// Build a flag set, rejecting duplicate names and names where one is a
    /// prefix of another.
    pub fn new(flags: Vec<Flag>) -> Result<Self, ShellError> {
        for (i, a) in flags.iter().enumerate() {
            for b in &flags[i + 1..] {
                if a.name == b.name {
                    return Err(ShellError::DuplicateFlag(a.name.clone()));
                }
                if b.name.starts_with(&a.name) {
                    return Err(ShellError::AmbiguousFlag(a.name.clone(), b.name.clone()));
                }
                if a.name.starts_with(&b.name) {
                    return Err(ShellError::AmbiguousFlag(b.name.clone(), a.name.clone()));
                }
            }
        }
        Ok(Self { flags })
    }

    /// The output-control flags every line understands: `-f <file>` and `-s`.
    pub fn output_flags() -> Result<Self, ShellError> {
        Self::new(vec![
            Flag::with_arg(WRITE_FLAG, "<file>", "append command output to <file>")?,
            Flag::switch(SILENT_FLAG, "do not print command output")?,
        ])
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Flag> {
        self.flags.iter().find(|flag| flag.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Strip every flag of the set out of `line`.
    ///
    /// The leftmost flag occurrence is cut out of the progressively shrinking
    /// line until none is left, so the result does not depend on declaration
    /// order. Every occurrence of a flag is removed; the first one supplies the
    /// argument. A flag argument never swallows another flag of the set.
    pub fn extract_all(&self, line: &str) -> (String, MatchedFlags) {
        self.extract_unless(line, |_| false)
    }

    /// Like [`extract_all`](Self::extract_all), skipping flags for which
    /// `shadowed` returns true.
    pub fn extract_unless<F>(&self, line: &str, shadowed: F) -> (String, MatchedFlags)
    where
        F: Fn(&str) -> bool,
    {
        let mut matches = MatchedFlags::new();
        if self.flags.is_empty() {
            return (line.to_string(), matches);
        }

        let active: Vec<&Flag> = self
            .flags
            .iter()
            .filter(|flag| !shadowed(&flag.name))
            .collect();
        let is_flag = |token: &str| {
            token
                .strip_prefix('-')
                .is_some_and(|name| active.iter().any(|flag| flag.name == name))
        };

        let mut line = line.to_string();
        loop {
            let leftmost = active
                .iter()
                .filter_map(|flag| flag.locate(&line, &is_flag))
                .min_by_key(|(start, _)| *start);
            let Some((_, found)) = leftmost else {
                break;
            };
            matches.entry(found.name).or_insert(found.argument);
            line = found.remaining;
        }
        (line, matches)
    }

    /// Merged usage string, e.g. `[-f <file>] [-s]`.
    pub fn usage(&self) -> String {
        self.flags
            .iter()
            .map(|flag| format!("[{}]", flag.usage))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn file_flag() -> Flag {
        Flag::with_arg("f", "<file>", "output file").unwrap()
    }

    fn silent_flag() -> Flag {
        Flag::switch("s", "silence").unwrap()
    }

    #[test]
    fn test_usage_is_derived_from_name_and_placeholder() {
        assert_eq!(file_flag().usage(), "-f <file>");
        assert_eq!(silent_flag().usage(), "-s");
        let set = FlagSet::new(vec![file_flag(), silent_flag()]).unwrap();
        assert_eq!(set.usage(), "[-f <file>] [-s]");
    }

    #[test]
    fn test_flag_with_argument_strips_both_tokens() {
        let found = file_flag().match_and_strip("-f build.txt release").unwrap();
        assert_eq!(found.name, "f");
        assert_eq!(found.argument, "build.txt");
        assert_eq!(found.remaining, "release");
    }

    #[test]
    fn test_flag_with_missing_argument_yields_empty_string() {
        let found = file_flag().match_and_strip("release -f").unwrap();
        assert_eq!(found.argument, "");
        assert_eq!(found.remaining, "release");
    }

    #[test]
    fn test_switch_never_consumes_following_token() {
        let found = silent_flag().match_and_strip("-s extra").unwrap();
        assert_eq!(found.argument, "");
        assert_eq!(found.remaining, "extra");
    }

    #[test]
    fn test_seam_whitespace_collapses_to_one_space() {
        let found = silent_flag().match_and_strip("a   -s   b").unwrap();
        assert_eq!(found.remaining, "a b");
    }

    #[test]
    fn test_no_match_inside_other_tokens() {
        let flag = silent_flag();
        assert!(flag.match_and_strip("-silent").is_none());
        assert!(flag.match_and_strip("--s").is_none());
        assert!(flag.match_and_strip("pre-s").is_none());
        assert!(flag.match_and_strip("nothing here").is_none());
    }

    #[test]
    fn test_extract_all_without_flags_present_is_identity() {
        let set = FlagSet::new(vec![file_flag(), silent_flag()]).unwrap();
        for line in ["", "release", "a b  c", "x-s --f"] {
            let (rest, matches) = set.extract_all(line);
            assert_eq!(rest, line);
            assert!(matches.is_empty());
        }
    }

    #[test]
    fn test_extract_all_empty_set_fast_path() {
        let (rest, matches) = FlagSet::default().extract_all(" -f x ");
        assert_eq!(rest, " -f x ");
        assert!(matches.is_empty());
    }

    #[test]
    fn test_extract_all_any_order() {
        let set = FlagSet::new(vec![file_flag(), silent_flag()]).unwrap();
        let (rest, matches) = set.extract_all("-s one -f out.txt two");
        assert_eq!(rest, "one two");
        assert_eq!(matches.get("f").map(String::as_str), Some("out.txt"));
        assert_eq!(matches.get("s").map(String::as_str), Some(""));
    }

    #[test]
    fn test_extract_all_is_idempotent_with_repeated_flags() {
        let set = FlagSet::new(vec![file_flag(), silent_flag()]).unwrap();
        let (rest, matches) = set.extract_all("-f first.txt a -s -f second.txt -s b");
        assert_eq!(rest, "a b");
        assert_eq!(matches["f"], "first.txt");

        let (again, more) = set.extract_all(&rest);
        assert_eq!(again, rest);
        assert!(more.is_empty());
    }

    #[test]
    fn test_argument_never_swallows_a_sibling_flag() {
        let forward = FlagSet::new(vec![file_flag(), silent_flag()]).unwrap();
        let backward = FlagSet::new(vec![silent_flag(), file_flag()]).unwrap();
        for line in ["-f -s x", "x -f -s", "-s -f x -f y", "a -f -s -s b"] {
            assert_eq!(forward.extract_all(line), backward.extract_all(line), "{line:?}");
        }

        let (rest, matches) = forward.extract_all("-f -s x");
        assert_eq!(rest, "x");
        assert_eq!(matches["f"], "");
        assert_eq!(matches["s"], "");
    }

    #[test]
    fn test_argument_may_look_like_an_unknown_flag() {
        let set = FlagSet::new(vec![file_flag(), silent_flag()]).unwrap();
        let (rest, matches) = set.extract_all("-f -q rest");
        assert_eq!(rest, "rest");
        assert_eq!(matches["f"], "-q");
    }

    #[test]
    fn test_extract_unless_skips_shadowed_flags() {
        let set = FlagSet::new(vec![file_flag(), silent_flag()]).unwrap();
        let (rest, matches) = set.extract_unless("-f x -s", |name| name == "f");
        assert_eq!(rest, "-f x");
        assert_eq!(matches.len(), 1);
        assert!(matches.contains_key("s"));
    }

    #[test]
    fn test_flag_set_rejects_duplicates_and_prefixes() {
        let dup = FlagSet::new(vec![silent_flag(), Flag::switch("s", "again").unwrap()]);
        assert!(matches!(dup, Err(ShellError::DuplicateFlag(name)) if name == "s"));

        let overlap = FlagSet::new(vec![
            Flag::switch("verbose", "").unwrap(),
            Flag::switch("v", "").unwrap(),
        ]);
        assert!(matches!(overlap, Err(ShellError::AmbiguousFlag(short, long)) if short == "v" && long == "verbose"));
    }

    #[test]
    fn test_invalid_flag_names_are_rejected() {
        assert!(Flag::switch("", "").is_err());
        assert!(Flag::switch("-x", "").is_err());
        assert!(Flag::with_arg("a b", "<x>", "").is_err());
    }

    #[test]
    fn test_flag_name_with_regex_metacharacters() {
        let flag = Flag::switch("n+", "").unwrap();
        assert!(flag.match_and_strip("-nn").is_none());
        assert_eq!(flag.match_and_strip("x -n+").unwrap().remaining, "x");
    }

    #[test]
    fn test_fire_passes_argument_only_to_argument_flags() {
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        let with_arg = file_flag().on_match(move |arg| {
            sink.borrow_mut().push(arg.map(str::to_string));
            Ok(())
        });
        let sink = Rc::clone(&seen);
        let switch = silent_flag().on_match(move |arg| {
            sink.borrow_mut().push(arg.map(str::to_string));
            Ok(())
        });

        with_arg.fire("out.txt").unwrap();
        switch.fire("").unwrap();
        assert_eq!(*seen.borrow(), vec![Some("out.txt".to_string()), None]);
    }
}
