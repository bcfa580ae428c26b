//! Code generator front end for CMTCODE definition files.
//!
//! Usage:
//!   codegen                      print the banner and the placeholder message
//!   codegen [OPTIONS] FILE       parse FILE and print the linked definition tree
//!
//! Options:
//!   --format tree|source   tree view (default) or normalized definition text
//!   --check                only validate FILE, print a one-line summary
//!   -v, --verbose          info-level logging (RUST_LOG overrides)
//!   --debug                debug-level logging
//!
//! Exit code 1 if the file cannot be read or fails validation.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use cmtdef::{dump_forest, read_def_file, render_source, DefForest};
use colored::Colorize;
use std::path::PathBuf;

const LOGO: &str = r#"
   ___ ___  ___  ___ ___ ___ _  _
  / __/ _ \|   \| __/ __| __| \| |
 | (_| (_) | |) | _| (_ | _|| .` |
  \___\___/|___/|___\___|___|_|\_|
"#;

#[derive(Parser)]
#[command(name = "codegen", version, about = "generate the code")]
struct Cli {
    /// CMTCODE definition file
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Output format for the parsed definitions
    #[arg(long, value_enum, default_value_t = OutputFormat::Tree, requires = "file")]
    format: OutputFormat,

    /// Only validate the file
    #[arg(long, requires = "file")]
    check: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Tree,
    Source,
}

/// Banner on a bare invocation or an explicit help request.
fn display_logo(args: &[String]) {
    let show = match args {
        [_] => true,
        [_, arg] => matches!(arg.as_str(), "-h" | "--help" | "h" | "help"),
        _ => false,
    };
    if show {
        println!("{}", LOGO.cyan());
    }
}

fn init_logging(debug: bool, verbose: bool) {
    let level = if debug {
        tracing::Level::DEBUG
    } else if verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("cmtdef={}", level))),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn summary(forest: &DefForest) -> String {
    let embedded: usize = forest.roots().iter().map(|e| e.descendants().len()).sum();
    format!(
        "{} root entit{}, {} embedded",
        forest.len(),
        if forest.len() == 1 { "y" } else { "ies" },
        embedded
    )
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    display_logo(&args);

    // `h` and `help` only trigger the banner; clap would read them as a file name.
    let cli = match args.get(1).map(String::as_str) {
        Some("h") | Some("help") if args.len() == 2 => Cli::parse_from([args[0].as_str(), "--help"]),
        _ => Cli::parse_from(&args),
    };
    init_logging(cli.debug, cli.verbose);

    let Some(path) = cli.file else {
        println!("boom! I say!");
        return Ok(());
    };

    let forest = read_def_file(&path)
        .with_context(|| format!("failed to load definitions from {}", path.display()))?;

    if cli.check {
        println!("{}: {} ({})", path.display(), "ok".green(), summary(&forest));
        return Ok(());
    }
    match cli.format {
        OutputFormat::Tree => print!("{}", dump_forest(&forest)),
        OutputFormat::Source => print!("{}", render_source(&forest)),
    }
    Ok(())
}
