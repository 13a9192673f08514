//! Print the module identifiers a configuration payload references.
//!
//! Reads an XML or JSON payload from a file or stdin and prints one
//! identifier per line: namespace URIs for XML, module names for JSON.
//! Useful for checking what a capability lookup table must cover before a
//! payload can be fully grafted into a schema tree.

use anyhow::{Context, Result, bail};
use modelpath::payload;
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse()?;
    let payload = args.source.read()?;
    let format = match args.format {
        Some(format) => format,
        None => PayloadFormat::sniff(&payload),
    };

    let identifiers: Vec<String> = match format {
        PayloadFormat::Xml => payload::xml_namespaces_from_str(&payload)
            .context("failed to extract namespaces from XML payload")?
            .into_iter()
            .collect(),
        PayloadFormat::Json => {
            if args.top_only {
                vec![
                    payload::top_level_module_name_from_str(&payload)
                        .context("failed to extract top-level module name")?,
                ]
            } else {
                payload::json_module_names_from_str(&payload)
                    .context("failed to extract module names from JSON payload")?
                    .into_iter()
                    .collect()
            }
        }
    };

    for identifier in identifiers {
        println!("{identifier}");
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum PayloadFormat {
    Xml,
    Json,
}

impl PayloadFormat {
    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "xml" => Ok(Self::Xml),
            "json" => Ok(Self::Json),
            other => bail!("unknown format '{other}' (expected xml|json)"),
        }
    }

    /// Guess the encoding from the first non-whitespace byte.
    fn sniff(payload: &str) -> Self {
        match payload.trim_start().as_bytes().first() {
            Some(b'<') => Self::Xml,
            _ => Self::Json,
        }
    }
}

struct CliArgs {
    source: InputSource,
    format: Option<PayloadFormat>,
    top_only: bool,
}

enum InputSource {
    File(PathBuf),
    Stdin,
}

impl InputSource {
    fn read(&self) -> Result<String> {
        match self {
            InputSource::File(path) => {
                if !path.is_file() {
                    bail!("input file not found: {}", path.display());
                }
                fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
            }
            InputSource::Stdin => {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("reading stdin")?;
                Ok(buf)
            }
        }
    }
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let mut source: Option<InputSource> = None;
        let mut format: Option<PayloadFormat> = None;
        let mut top_only = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--file" => {
                    if source.is_some() {
                        bail!("--file/--stdin may only be provided once");
                    }
                    let path = args.next().context("missing value for --file")?;
                    source = Some(InputSource::File(PathBuf::from(path)));
                }
                "--stdin" => {
                    if source.is_some() {
                        bail!("--file/--stdin may only be provided once");
                    }
                    source = Some(InputSource::Stdin);
                }
                "--format" => {
                    let raw = args.next().context("missing value for --format")?;
                    format = Some(PayloadFormat::from_str(&raw)?);
                }
                "--top-only" => {
                    top_only = true;
                }
                "--help" | "-h" => {
                    print!("{}", usage());
                    std::process::exit(0);
                }
                other => bail!("unknown flag: {other}"),
            }
        }

        if top_only && matches!(format, Some(PayloadFormat::Xml)) {
            bail!("--top-only applies to JSON payloads only");
        }

        Ok(CliArgs {
            source: source.unwrap_or(InputSource::Stdin),
            format,
            top_only,
        })
    }
}

fn usage() -> &'static str {
    "Usage: payload-modules [--file PATH|--stdin] [--format xml|json] [--top-only]\n\
Reads a configuration payload, detects or honors the encoding, and prints every\n\
referenced module identifier (namespace URIs for XML, module names for JSON) one\n\
per line. --top-only prints just the JSON top-level module name.\n"
}
