//! Parse tag soup and dump the resulting document.
//!
//! ## Usage
//!
//! ```bash
//! # Print the page back with every implied end tag written out
//! tagsoup-dump page.html
//!
//! # Show the tree structure
//! curl -s https://example.com | tagsoup-dump --format tree
//!
//! # JSON, with scanner transitions traced to stderr
//! tagsoup-dump page.html --format json -vvv
//! ```

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tagsoup_common::{init_logging, LogConfig};
use tracing::{debug, info};

mod dump;

use dump::OutputFormat;

#[derive(Parser)]
#[command(name = "tagsoup-dump")]
#[command(about = "Parse tag soup and dump the resulting document")]
struct Cli {
    /// HTML file to read; stdin when omitted
    file: Option<PathBuf>,
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Html)]
    format: OutputFormat,
    /// Keep whitespace between top-level nodes
    #[arg(long)]
    keep_whitespace: bool,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(LogConfig::from_verbosity(cli.verbose));

    if let Err(err) = run(&cli) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let source = dump::read_input(cli.file.as_deref())?;
    debug!(bytes = source.len(), "input read");

    let parsed = dump::parse(&source, cli.keep_whitespace)?;
    if let Some(charset) = &parsed.charset {
        if !charset.eq_ignore_ascii_case("utf-8") {
            info!(%charset, "document declares a charset other than UTF-8; input was decoded as UTF-8");
        }
    }

    let output = dump::render(&parsed.document, cli.format)?;
    std::io::stdout().lock().write_all(output.as_bytes())?;
    Ok(())
}
