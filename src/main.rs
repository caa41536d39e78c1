use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::Parser;
use tracing::*;

use loosejson::{Error, Reader, Writer};

mod logging;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(group(
    clap::ArgGroup::new("input").required(true).args(["file", "text"])
))]
struct Args {
    /// Read the document from a file.
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,
    /// Read the document from the command line.
    #[arg(long, value_name = "JSON")]
    text: Option<String>,
    /// Emit compact output instead of pretty-printed.
    #[arg(long)]
    compact: bool,
    /// Reject trailing content after the top-level value.
    #[arg(long)]
    strict: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    logging::setup_logging();

    let cli = Args::parse();

    debug!(?cli);

    let (name, input) = match (&cli.file, &cli.text) {
        (Some(path), _) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read file `{}`", path.display()))?;
            (path.display().to_string(), text)
        }
        (_, Some(text)) => ("<text>".to_string(), text.clone()),
        _ => unreachable!("clap enforces the input group"),
    };

    let mut reader = Reader::new().strict(cli.strict).collect_errors(true);
    let document = match reader.parse_str(&input) {
        Ok(document) => document,
        Err(_) => loosejson::Value::Null,
    };

    if reader.has_errors() {
        for error in reader.errors() {
            eprintln!(
                "Error: {} at [{}:{}]",
                error.reason(),
                error.line(),
                error.column()
            );
        }
        if let Some(error) = reader.last_error() {
            report(error, &name, &input)?;
        }
        return Ok(ExitCode::FAILURE);
    }

    let writer = Writer::new().pretty(!cli.compact);
    println!("{}", writer.render(&document));

    Ok(ExitCode::SUCCESS)
}

fn report(error: &Error, name: &String, input: &str) -> anyhow::Result<()> {
    let offset = byte_offset(input, error.line(), error.column());
    let end = (offset + 1).min(input.len());
    Report::build(ReportKind::Error, name, offset)
        .with_message(error.reason())
        .with_label(
            Label::new((name, offset..end))
                .with_message(error.reason())
                .with_color(Color::Red),
        )
        .finish()
        .eprint((name, Source::from(input)))?;
    Ok(())
}

/// Maps a 1-based line/column to a byte offset, clamping out-of-range
/// coordinates to the end of the input.
fn byte_offset(input: &str, line: i32, column: i32) -> usize {
    if line < 1 || column < 1 {
        return 0;
    }
    let mut remaining_lines = line - 1;
    let mut offset = 0;
    for byte in input.bytes() {
        if remaining_lines == 0 {
            break;
        }
        offset += 1;
        if byte == b'\n' {
            remaining_lines -= 1;
        }
    }
    (offset + column as usize - 1).min(input.len())
}
