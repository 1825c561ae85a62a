use crate::flag::{FlagSet, MatchedFlags};
use anyhow::Result;
use std::fmt;
use std::io::Write;

/// Command-specific completion source.
///
/// Called with the partial word, the whole line buffer and the byte range of
/// the partial word inside the buffer, so it can inspect earlier arguments.
pub type CompleterFn = Box<dyn Fn(&str, &str, usize, usize) -> Vec<String>>;

type PlainFn = Box<dyn Fn(&mut dyn Write) -> Result<()>>;
type ArgsFn = Box<dyn Fn(&[String], &mut dyn Write) -> Result<()>>;
type FlagsFn = Box<dyn Fn(&MatchedFlags, &mut dyn Write) -> Result<()>>;
type FullFn = Box<dyn Fn(&[String], &MatchedFlags, &mut dyn Write) -> Result<()>>;

/// A command handler together with the parameters it declares.
///
/// Every shape receives the output sink last. Handlers must write through the
/// sink rather than to the process stdout, otherwise silencing, `-f` and pipes
/// cannot see their output.
pub enum Handler {
    /// Takes no parameters.
    Plain(PlainFn),
    /// Takes the positional arguments.
    Args(ArgsFn),
    /// Takes the matched command flags.
    Flags(FlagsFn),
    /// Takes both arguments and matched flags.
    Full(FullFn),
}

impl Handler {
    pub fn plain<F>(f: F) -> Self
    where
        F: Fn(&mut dyn Write) -> Result<()> + 'static,
    {
        Handler::Plain(Box::new(f))
    }

    pub fn args<F>(f: F) -> Self
    where
        F: Fn(&[String], &mut dyn Write) -> Result<()> + 'static,
    {
        Handler::Args(Box::new(f))
    }

    pub fn flags<F>(f: F) -> Self
    where
        F: Fn(&MatchedFlags, &mut dyn Write) -> Result<()> + 'static,
    {
        Handler::Flags(Box::new(f))
    }

    pub fn full<F>(f: F) -> Self
    where
        F: Fn(&[String], &MatchedFlags, &mut dyn Write) -> Result<()> + 'static,
    {
        Handler::Full(Box::new(f))
    }

    /// Call the handler with whatever subset of parameters it declared.
    pub fn call(&self, args: &[String], flags: &MatchedFlags, out: &mut dyn Write) -> Result<()> {
        match self {
            Handler::Plain(f) => f(out),
            Handler::Args(f) => f(args, out),
            Handler::Flags(f) => f(flags, out),
            Handler::Full(f) => f(args, flags, out),
        }
    }

    fn shape(&self) -> &'static str {
        match self {
            Handler::Plain(_) => "plain",
            Handler::Args(_) => "args",
            Handler::Flags(_) => "flags",
            Handler::Full(_) => "args+flags",
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({})", self.shape())
    }
}

/// A named action that can be registered with the shell.
///
/// ```
/// use ore::{Command, Handler};
/// let cmd = Command::new("hello", Handler::plain(|out| {
///     writeln!(out, "hello")?;
///     Ok(())
/// }))
/// .doc("Say hello.")
/// .group("demo");
/// assert_eq!(cmd.name(), "hello");
/// ```
pub struct Command {
    name: String,
    handler: Handler,
    flags: FlagSet,
    completer: Option<CompleterFn>,
    doc: String,
    group: Option<String>,
    bypass: bool,
}

impl Command {
    pub fn new(name: impl Into<String>, handler: Handler) -> Self {
        Self {
            name: name.into(),
            handler,
            flags: FlagSet::default(),
            completer: None,
            doc: String::new(),
            group: None,
            bypass: false,
        }
    }

    /// Documentation shown by `help` and in the generated README.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    /// Group label used by the `??` listing.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Flags recognised only when this command is invoked.
    pub fn flags(mut self, flags: FlagSet) -> Self {
        self.flags = flags;
        self
    }

    pub fn completer<F>(mut self, completer: F) -> Self
    where
        F: Fn(&str, &str, usize, usize) -> Vec<String> + 'static,
    {
        self.completer = Some(Box::new(completer));
        self
    }

    /// Write straight to the real output: never captured, silenced,
    /// redirected to a file or piped.
    pub fn bypass(mut self) -> Self {
        self.bypass = true;
        self
    }

    pub(crate) fn set_completer(&mut self, completer: CompleterFn) {
        self.completer = Some(completer);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn flag_set(&self) -> &FlagSet {
        &self.flags
    }

    pub fn completer_fn(&self) -> Option<&CompleterFn> {
        self.completer.as_ref()
    }

    pub fn doc_text(&self) -> &str {
        &self.doc
    }

    pub fn group_label(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn is_bypass(&self) -> bool {
        self.bypass
    }

    /// One-line usage: name followed by the flag usage, e.g. `build [-t <target>]`.
    pub fn usage(&self) -> String {
        if self.flags.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.flags.usage())
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("handler", &self.handler)
            .field("flags", &self.flags)
            .field("completer", &self.completer.is_some())
            .field("group", &self.group)
            .field("bypass", &self.bypass)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flag::Flag;

    fn flags_of(pairs: &[(&str, &str)]) -> MatchedFlags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_handler_receives_declared_parameters_only() {
        let args = vec!["a".to_string(), "b".to_string()];
        let flags = flags_of(&[("t", "x86")]);

        let handlers = [
            Handler::plain(|out| Ok(write!(out, "plain")?)),
            Handler::args(|args, out| Ok(write!(out, "{}", args.join(","))?)),
            Handler::flags(|flags, out| Ok(write!(out, "{:?}", flags.keys().collect::<Vec<_>>())?)),
            Handler::full(|args, flags, out| Ok(write!(out, "{} {}", args.len(), flags.len())?)),
        ];
        let expected = ["plain", "a,b", "[\"t\"]", "2 1"];

        for (handler, want) in handlers.iter().zip(expected) {
            let mut out = Vec::new();
            handler.call(&args, &flags, &mut out).unwrap();
            assert_eq!(String::from_utf8(out).unwrap(), want);
        }
    }

    #[test]
    fn test_handler_errors_propagate() {
        let handler = Handler::args(|_, _| Err(anyhow::anyhow!("boom")));
        let mut out = Vec::new();
        let err = handler.call(&[], &MatchedFlags::new(), &mut out).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_usage_includes_command_flags() {
        let cmd = Command::new("build", Handler::plain(|_| Ok(())))
            .flags(FlagSet::new(vec![Flag::with_arg("t", "<target>", "").unwrap()]).unwrap());
        assert_eq!(cmd.usage(), "build [-t <target>]");

        let bare = Command::new("ls", Handler::plain(|_| Ok(())));
        assert_eq!(bare.usage(), "ls");
        assert!(!bare.is_bypass());
        assert!(bare.group_label().is_none());
    }
}
