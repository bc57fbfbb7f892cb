//! Command-line interface for mdshield
//!
//! Usage:
//!   mdshield process `<path>` [--user] [--format `<fmt>`] [--config `<file>`]
//!       Run the content pipeline
//!   mdshield export `<path>`          - Run export preprocessing
//!   mdshield simplify-latex `<expr>`  - Reduce LaTeX to ASCII
//!
//! A path of `-` reads from stdin. Set `MDSHIELD_LOG=debug` to see per-stage logs.

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::io::Read;
use tracing_subscriber::EnvFilter;

use mdshield::config::Loader;
use mdshield::export::{prepare_for_export, simplify_latex};
use mdshield::{ContentProcessor, ProcessedContent, RenderMode};

fn cli() -> Command {
    Command::new("mdshield")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Prepare assistant-generated markdown for rendering")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("process")
                .about("Run the content pipeline over a message")
                .arg(
                    Arg::new("path")
                        .help("Path to the message, or - for stdin")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("user")
                        .long("user")
                        .help("Render as a user message (no LaTeX, no citation previews)")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format: json, yaml or text")
                        .default_value("json"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .help("TOML file layered over the built-in defaults"),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Number references and flatten math for document export")
                .arg(
                    Arg::new("path")
                        .help("Path to the document, or - for stdin")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("simplify-latex")
                .about("Reduce a LaTeX expression to readable ASCII")
                .arg(
                    Arg::new("expr")
                        .help("The expression")
                        .required(true)
                        .index(1),
                ),
        )
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MDSHIELD_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let result = match matches.subcommand() {
        Some(("process", process_matches)) => handle_process_command(process_matches),
        Some(("export", export_matches)) => handle_export_command(export_matches),
        Some(("simplify-latex", latex_matches)) => handle_simplify_command(latex_matches),
        _ => unreachable!(),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Handle the process command
fn handle_process_command(matches: &ArgMatches) -> Result<()> {
    let source = read_source(required(matches, "path")?)?;
    let mode = if matches.get_flag("user") {
        RenderMode::User
    } else {
        RenderMode::Assistant
    };

    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    let config = loader.build().context("loading configuration")?;

    let processor = ContentProcessor::new(&config);
    let processed = processor.process(&source, mode);
    print!("{}", render(&processed, required(matches, "format")?)?);
    Ok(())
}

/// Handle the export command
fn handle_export_command(matches: &ArgMatches) -> Result<()> {
    let source = read_source(required(matches, "path")?)?;
    print!("{}", prepare_for_export(&source));
    Ok(())
}

/// Handle the simplify-latex command
fn handle_simplify_command(matches: &ArgMatches) -> Result<()> {
    println!("{}", simplify_latex(required(matches, "expr")?));
    Ok(())
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing argument '{}'", name))
}

fn read_source(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path))
}

fn render(processed: &ProcessedContent, format: &str) -> Result<String> {
    match format {
        "json" => Ok(format!("{}\n", serde_json::to_string_pretty(processed)?)),
        "yaml" => Ok(serde_yaml::to_string(processed)?),
        "text" => {
            let mut out = processed.processed_content.clone();
            if !processed.citations.is_empty() {
                out.push_str("\n\n");
                for (i, citation) in processed.citations.iter().enumerate() {
                    out.push_str(&format!("[{}] {} <{}>\n", i + 1, citation.text, citation.link));
                }
            }
            Ok(out)
        }
        other => bail!("unknown format '{}' (expected json, yaml or text)", other),
    }
}
