use argh::FromArgs;
use std::path::PathBuf;

/// Settings of one shell instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Name shown in documentation headers and the README title.
    pub title: String,
    /// Banner printed when the read loop starts.
    pub intro: String,
    pub prompt: String,
    /// Delimiter between positional arguments. Empty means any whitespace.
    pub split_pattern: String,
    /// History file; `None` keeps history in memory only.
    pub history_path: Option<PathBuf>,
    /// Where `-r` writes the generated README.
    pub readme_path: PathBuf,
    /// Generate the README when the shell starts.
    pub generate_readme: bool,
    /// Style documentation with ANSI colours.
    pub color: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            title: "Ore".to_string(),
            intro: "Welcome. Type ? for documentation.".to_string(),
            prompt: ">> ".to_string(),
            split_pattern: " ".to_string(),
            history_path: Some(PathBuf::from("./.history")),
            readme_path: PathBuf::from("README.md"),
            generate_readme: false,
            color: true,
        }
    }
}

impl ShellConfig {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn intro(mut self, intro: impl Into<String>) -> Self {
        self.intro = intro.into();
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn split_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.split_pattern = pattern.into();
        self
    }

    pub fn history_path(mut self, path: Option<PathBuf>) -> Self {
        self.history_path = path;
        self
    }

    /// Override settings with whatever the command line asked for.
    ///
    /// `no_color_env` tells whether `NO_COLOR` is set in the environment.
    pub fn apply_cli(mut self, args: &CliArgs, no_color_env: bool) -> Self {
        if args.readme {
            self.generate_readme = true;
        }
        if let Some(path) = &args.readme_path {
            self.readme_path = path.clone();
        }
        if args.no_history {
            self.history_path = None;
        } else if let Some(path) = &args.history {
            self.history_path = Some(path.clone());
        }
        if let Some(prompt) = &args.prompt {
            self.prompt = prompt.clone();
        }
        if args.no_color || no_color_env {
            self.color = false;
        }
        self
    }
}

#[derive(FromArgs, Debug, Default)]
/// Interactive command shell.
pub struct CliArgs {
    #[argh(switch, short = 'r')]
    /// generate the README from the registered commands at startup
    pub readme: bool,

    #[argh(option)]
    /// where to write the generated README (default: README.md)
    pub readme_path: Option<PathBuf>,

    #[argh(option)]
    /// history file to load and append to (default: ./.history)
    pub history: Option<PathBuf>,

    #[argh(switch)]
    /// keep history in memory only
    pub no_history: bool,

    #[argh(option)]
    /// prompt shown before each line
    pub prompt: Option<String>,

    #[argh(switch, short = 'v')]
    /// log debug details to stderr
    pub verbose: bool,

    #[argh(switch)]
    /// disable coloured output
    pub no_color: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::from_args(&["ore"], args).unwrap_or_else(|exit| panic!("{}", exit.output))
    }

    #[test]
    fn test_defaults_without_arguments() {
        let config = ShellConfig::default().apply_cli(&parse(&[]), false);
        assert_eq!(config, ShellConfig::default());
        assert_eq!(config.prompt, ">> ");
        assert_eq!(config.split_pattern, " ");
    }

    #[test]
    fn test_cli_overrides() {
        let args = parse(&["-r", "--history", "/tmp/h", "--prompt", "$ ", "--no-color"]);
        let config = ShellConfig::default().apply_cli(&args, false);
        assert!(config.generate_readme);
        assert_eq!(config.history_path, Some(PathBuf::from("/tmp/h")));
        assert_eq!(config.prompt, "$ ");
        assert!(!config.color);
    }

    #[test]
    fn test_no_history_wins_over_history_path() {
        let args = parse(&["--history", "/tmp/h", "--no-history"]);
        let config = ShellConfig::default().apply_cli(&args, false);
        assert_eq!(config.history_path, None);
    }

    #[test]
    fn test_no_color_environment() {
        let config = ShellConfig::default().apply_cli(&parse(&[]), true);
        assert!(!config.color);
    }

    #[test]
    fn test_unknown_argument_is_rejected() {
        assert!(CliArgs::from_args(&["ore"], &["--bogus"]).is_err());
    }
}
