//! Tab completion.
//!
//! [`CompletionResolver`] decides which candidates apply to the word under
//! the cursor and hands them out one index at a time, the way line-editing
//! completion callbacks ask for them. [`ShellHelper`] plugs the resolver into
//! rustyline.

use crate::registry::{HELP, HELP_SHORT, Registry};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::cell::RefCell;
use std::rc::Rc;

/// Resolves completion candidates against a fixed registry.
#[derive(Debug)]
pub struct CompletionResolver {
    registry: Rc<Registry>,
    matches: Vec<String>,
}

impl CompletionResolver {
    pub fn new(registry: Rc<Registry>) -> Self {
        Self {
            registry,
            matches: Vec::new(),
        }
    }

    /// Indexed completion protocol.
    ///
    /// `state == 0` recomputes and caches the candidates for `text`; any
    /// later state reads the cache. Returns `None` once the candidates are
    /// exhausted.
    pub fn complete(
        &mut self,
        text: &str,
        state: usize,
        line: &str,
        start: usize,
        end: usize,
    ) -> Option<String> {
        if state == 0 {
            self.matches = self.candidates(text, line, start, end);
        }
        self.matches.get(state).cloned()
    }

    /// All candidates for the partial word `text` spanning `start..end` of `line`.
    ///
    /// The first word completes against every command name. Later words are
    /// scoped to the command named by the first word: its own completer
    /// answers, or nothing does.
    pub fn candidates(&self, text: &str, line: &str, start: usize, end: usize) -> Vec<String> {
        let first = line.split_whitespace().next().unwrap_or("");
        let first_start = line.len() - line.trim_start().len();
        let completing_first = start <= first_start;

        if completing_first {
            return self.global_candidates(text);
        }
        if let Some(command) = self.registry.get(first) {
            return match command.completer_fn() {
                Some(completer) => completer(text, line, start, end),
                None => Vec::new(),
            };
        }
        if first == HELP || first == HELP_SHORT {
            return self.prefixed(self.registry.names(), text);
        }
        self.global_candidates(text)
    }

    /// Registered command names starting with `text`.
    pub fn global_candidates(&self, text: &str) -> Vec<String> {
        self.prefixed(self.registry.names(), text)
    }

    fn prefixed<'a>(&self, names: impl Iterator<Item = &'a str>, text: &str) -> Vec<String> {
        let mut names: Vec<String> = names
            .filter(|name| name.starts_with(text))
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }
}

/// Byte offset where the word ending at `pos` begins.
fn word_start(line: &str, pos: usize) -> usize {
    line[..pos]
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map_or(0, |(i, c)| i + c.len_utf8())
}

/// rustyline helper driving a [`CompletionResolver`].
pub struct ShellHelper {
    resolver: RefCell<CompletionResolver>,
}

impl ShellHelper {
    pub fn new(registry: Rc<Registry>) -> Self {
        Self {
            resolver: RefCell::new(CompletionResolver::new(registry)),
        }
    }
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = word_start(line, pos);
        let text = &line[start..pos];

        let mut resolver = self.resolver.borrow_mut();
        let candidates = (0..)
            .map_while(|state| resolver.complete(text, state, line, start, pos))
            .map(|candidate| Pair {
                display: candidate.clone(),
                replacement: candidate,
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<Self::Hint> {
        None
    }
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, Handler};

    fn resolver() -> CompletionResolver {
        let noop = |name: &str| Command::new(name, Handler::plain(|_| Ok(())));
        let registry = Registry::builder()
            .command(noop("build"))
            .command(noop("bench"))
            .command(noop("bundle").completer(|text, line, start, end| {
                vec![format!("{text}|{line}|{start}|{end}")]
            }))
            .command(noop("deploy").completer(|text, _, _, _| {
                ["prod", "staging"]
                    .into_iter()
                    .filter(|env| env.starts_with(text))
                    .map(str::to_string)
                    .collect()
            }))
            .build()
            .unwrap();
        CompletionResolver::new(Rc::new(registry))
    }

    #[test]
    fn test_prefix_candidates_are_sorted() {
        let mut resolver = resolver();
        assert_eq!(resolver.complete("b", 0, "b", 0, 1).as_deref(), Some("bench"));
        assert_eq!(resolver.complete("b", 1, "b", 0, 1).as_deref(), Some("build"));
        assert_eq!(resolver.complete("b", 2, "b", 0, 1).as_deref(), Some("bundle"));
        assert_eq!(resolver.complete("b", 3, "b", 0, 1), None);
    }

    #[test]
    fn test_empty_text_offers_every_registered_name() {
        let resolver = resolver();
        assert_eq!(
            resolver.candidates("", "", 0, 0),
            ["bench", "build", "bundle", "deploy"]
        );
        assert!(resolver.candidates("q", "q", 0, 1).is_empty());
        assert!(resolver.candidates("he", "he", 0, 2).is_empty());
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert!(resolver().candidates("B", "B", 0, 1).is_empty());
    }

    #[test]
    fn test_scoped_without_completer_is_empty() {
        let resolver = resolver();
        assert!(resolver.candidates("", "build ", 6, 6).is_empty());
        assert!(resolver.candidates("b", "build b", 6, 7).is_empty());
    }

    #[test]
    fn test_scoped_completer_gets_full_context() {
        let resolver = resolver();
        assert_eq!(
            resolver.candidates("x", "bundle a x", 9, 10),
            ["x|bundle a x|9|10"]
        );
        assert_eq!(resolver.candidates("st", "deploy st", 7, 9), ["staging"]);
    }

    #[test]
    fn test_first_word_stays_global_even_if_complete() {
        let resolver = resolver();
        assert_eq!(resolver.candidates("build", "build", 0, 5), ["build"]);
        assert_eq!(resolver.candidates("de", "  de", 2, 4), ["deploy"]);
    }

    #[test]
    fn test_help_argument_completes_command_names() {
        let resolver = resolver();
        assert_eq!(resolver.candidates("bu", "help bu", 5, 7), ["build", "bundle"]);
        assert_eq!(resolver.candidates("d", "? d", 2, 3), ["deploy"]);
    }

    #[test]
    fn test_cache_is_reused_until_state_zero() {
        let mut resolver = resolver();
        assert_eq!(resolver.complete("d", 0, "d", 0, 1).as_deref(), Some("deploy"));
        // a later index answers from the cache even if the text changed
        assert_eq!(resolver.complete("b", 1, "b", 0, 1), None);
        assert_eq!(resolver.complete("b", 0, "b", 0, 1).as_deref(), Some("bench"));
    }

    #[test]
    fn test_word_start() {
        assert_eq!(word_start("build rel", 9), 6);
        assert_eq!(word_start("build", 5), 0);
        assert_eq!(word_start("build ", 6), 6);
        assert_eq!(word_start("é\u{a0}x", 5), 4);
    }
}
