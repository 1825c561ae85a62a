use anyhow::Context;
use ore::{CliArgs, Command, Flag, FlagSet, Handler, Registry, Shell, ShellConfig, logging};
use std::io::{BufRead, Write};

const NAMES: [&str; 4] = ["alice", "bob", "carol", "dave"];

fn demo_registry() -> anyhow::Result<Registry> {
    let registry = Registry::builder()
        .command(
            Command::new(
                "echo",
                Handler::args(|args, out| {
                    writeln!(out, "{}", args.join(" "))?;
                    Ok(())
                }),
            )
            .doc("Print the arguments separated by spaces.")
            .group("text"),
        )
        .command(
            Command::new(
                "shout",
                Handler::full(|args, flags, out| {
                    let times = match flags.get("x") {
                        Some(n) => n.parse::<usize>().context("-x expects a number")?,
                        None => 1,
                    };
                    let text = args.join(" ").to_uppercase();
                    for _ in 0..times {
                        writeln!(out, "{}", text)?;
                    }
                    Ok(())
                }),
            )
            .doc("Print the arguments in upper case.")
            .group("text")
            .flags(FlagSet::new(vec![Flag::with_arg(
                "x",
                "<times>",
                "repeat the line <times> times",
            )?])?),
        )
        .command(
            Command::new(
                "count",
                Handler::args(|args, out| {
                    let n = match args.first() {
                        Some(n) => n.parse::<u64>().context("count expects a number")?,
                        None => 10,
                    };
                    for i in 1..=n {
                        writeln!(out, "{}", i)?;
                    }
                    Ok(())
                }),
            )
            .doc("Print the numbers 1 to N (default 10), one per line.\nTry `count 100 | tail -3`.")
            .group("demo"),
        )
        .command(
            Command::new(
                "greet",
                Handler::args(|args, out| {
                    if args.is_empty() {
                        writeln!(out, "Hello, world!")?;
                    } else {
                        writeln!(out, "Hello, {}!", args.join(" and "))?;
                    }
                    Ok(())
                }),
            )
            .doc("Greet people by name. Names complete with tab.")
            .group("demo"),
        )
        .completer("greet", |text, line, _, _| {
            let given: Vec<&str> = line.split_whitespace().skip(1).collect();
            NAMES
                .iter()
                .filter(|name| name.starts_with(text) && !given.contains(*name))
                .map(|name| name.to_string())
                .collect()
        })
        .command(
            Command::new(
                "ask",
                Handler::plain(|out| {
                    write!(out, "What is your name? ")?;
                    out.flush()?;
                    let mut name = String::new();
                    std::io::stdin().lock().read_line(&mut name)?;
                    writeln!(out, "Nice to meet you, {}.", name.trim())?;
                    Ok(())
                }),
            )
            .doc("Ask for your name. Output is never captured.")
            .group("demo")
            .bypass(),
        )
        .build()?;
    Ok(registry)
}

fn main() -> anyhow::Result<()> {
    let args: CliArgs = argh::from_env();
    logging::init_logging(args.verbose)?;

    let no_color_env = std::env::var_os("NO_COLOR").is_some();
    let config = ShellConfig::default().apply_cli(&args, no_color_env);
    if !config.color {
        colored::control::set_override(false);
    }

    let mut shell = Shell::new(demo_registry()?, config)?;
    shell.repl()
}
