//! Documentation compiled from the registry: full help, one command's help,
//! the grouped `??` listing and a Markdown README.

use crate::command::Command;
use crate::flag::FlagSet;
use crate::registry::Registry;
use colored::Colorize;
use std::collections::BTreeMap;

/// Group label for commands registered without one.
pub const DEFAULT_GROUP: &str = "misc";

const RULE_WIDTH: usize = 25;

/// Documentation for every command followed by the built-ins.
pub fn full_docs(title: &str, registry: &Registry, output_flags: &FlagSet) -> String {
    let mut text = format!(
        "\n{}\n{}\n\n",
        format!("{} Documentation", title).bold(),
        "-".repeat(RULE_WIDTH)
    );
    for command in registry.commands() {
        text.push_str(&command_docs(command));
        text.push('\n');
    }
    text.push_str(&builtin_docs(output_flags));
    text
}

/// Usage line, doc text and flag descriptions of one command.
pub fn command_docs(command: &Command) -> String {
    let mut text = format!("{}\n", command.usage().cyan().bold());
    for line in command.doc_text().lines() {
        text.push_str(&format!("    {}\n", line.trim()));
    }
    for flag in command.flag_set().iter() {
        text.push_str(&entry(&flag.usage().yellow().to_string(), flag.description()));
    }
    text
}

const BUILTINS: [(&str, &str, &str); 4] = [
    ("? | help [cmd]", "`?`, `help [cmd]`", "show documentation"),
    ("??", "`??`", "list commands by group"),
    ("quit", "`quit`", "leave the shell"),
    ("cmd | ext", "`cmd | ext`", "pipe output into an external command"),
];

fn entry(usage: &str, description: &str) -> String {
    format!("    {:<14} {}\n", usage, description)
}

fn builtin_docs(output_flags: &FlagSet) -> String {
    let builtins = BUILTINS
        .iter()
        .map(|(usage, _, description)| entry(usage, description));
    let flags = output_flags
        .iter()
        .map(|flag| entry(flag.usage(), flag.description()));
    format!("{}\n", "Built-ins".bold()) + &builtins.chain(flags).collect::<String>()
}

/// Command names grouped by label, groups in alphabetical order.
pub fn grouped_listing(registry: &Registry) -> String {
    let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for command in registry.commands() {
        groups
            .entry(command.group_label().unwrap_or(DEFAULT_GROUP))
            .or_default()
            .push(command.name());
    }

    groups
        .into_iter()
        .map(|(group, names)| format!("{}\n    {}\n", group.bold(), names.join("  ")))
        .collect()
}

/// Markdown README listing every command. Never styled.
pub fn readme(title: &str, registry: &Registry, output_flags: &FlagSet) -> String {
    let mut text = format!("# {}\n\n## Commands\n\n", title);
    for command in registry.commands() {
        text.push_str(&readme_section(command));
    }

    text.push_str("## Built-ins\n\n");
    for (_, usage, description) in BUILTINS {
        text.push_str(&format!("- {}: {}\n", usage, description));
    }
    for flag in output_flags.iter() {
        text.push_str(&format!("- `{}`: {}\n", flag.usage(), flag.description()));
    }
    text
}

fn readme_section(command: &Command) -> String {
    let mut text = format!("### `{}`\n\n", command.usage());
    if let Some(group) = command.group_label() {
        text.push_str(&format!("*Group: {}*\n\n", group));
    }
    if !command.doc_text().is_empty() {
        let doc: Vec<&str> = command.doc_text().lines().map(str::trim).collect();
        text.push_str(&format!("{}\n\n", doc.join("\n")));
    }
    if !command.flag_set().is_empty() {
        for flag in command.flag_set().iter() {
            text.push_str(&format!("- `{}`: {}\n", flag.usage(), flag.description()));
        }
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Handler;
    use crate::flag::Flag;

    fn registry() -> Registry {
        Registry::builder()
            .command(
                Command::new("build", Handler::plain(|_| Ok(())))
                    .doc("Build the project.\n  Uses cargo.")
                    .group("dev")
                    .flags(
                        FlagSet::new(vec![Flag::with_arg("t", "<target>", "target triple").unwrap()])
                            .unwrap(),
                    ),
            )
            .command(Command::new("bench", Handler::plain(|_| Ok(()))).group("dev"))
            .command(Command::new("ls", Handler::plain(|_| Ok(()))).doc("List things."))
            .build()
            .unwrap()
    }

    #[test]
    fn test_command_docs_have_usage_doc_and_flags() {
        colored::control::set_override(false);
        let registry = registry();
        let text = command_docs(registry.get("build").unwrap());
        assert!(text.starts_with("build [-t <target>]\n"));
        assert!(text.contains("    Build the project.\n    Uses cargo.\n"));
        assert!(text.contains("-t <target>"));
        assert!(text.contains("target triple"));
    }

    #[test]
    fn test_full_docs_cover_commands_and_builtins() {
        colored::control::set_override(false);
        let text = full_docs("Ore", &registry(), &FlagSet::output_flags().unwrap());
        assert!(text.contains("Ore Documentation"));
        let bench = text.find("bench").unwrap();
        let build = text.find("build [-t").unwrap();
        let ls = text.find("List things.").unwrap();
        assert!(bench < build && build < ls);
        assert!(text.contains("Built-ins"));
        assert!(text.contains("-f <file>"));
    }

    #[test]
    fn test_grouped_listing() {
        colored::control::set_override(false);
        assert_eq!(
            grouped_listing(&registry()),
            "dev\n    bench  build\nmisc\n    ls\n"
        );
    }

    #[test]
    fn test_readme_is_markdown() {
        let text = readme("Ore", &registry(), &FlagSet::output_flags().unwrap());
        assert!(text.starts_with("# Ore\n"));
        assert!(text.contains("### `build [-t <target>]`"));
        assert!(text.contains("*Group: dev*"));
        assert!(text.contains("- `-t <target>`: target triple"));
        assert!(text.contains("- `-s`: do not print command output"));
        assert!(!text.contains('\u{1b}'));
    }
}
