//! jebilint -- check, query, and reformat XML files.
//!
//! Parses each input, reports well-formedness errors, and optionally
//! evaluates an `XPath` expression or writes the document back out.

use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use jebixml::encoding;
use jebixml::error::Error;
use jebixml::parser::ParseOptions;
use jebixml::serial::{serialize_node, serialize_with_options, SerializeOptions};
use jebixml::xpath::{self, XPathValue};
use jebixml::Document;

/// jebilint -- check, query, and reformat XML files.
#[derive(Parser, Debug)]
#[command(name = "jebilint", version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// XML files to process (use `-` for stdin).
    #[arg(required = true)]
    files: Vec<String>,

    /// Print debug logs to stderr (otherwise `RUST_LOG` applies).
    #[arg(long)]
    verbose: bool,

    // -- Parsing options ---------------------------------------------------
    /// Encoding to assume for input without a BOM or encoding declaration.
    #[arg(long, value_name = "LABEL")]
    encoding: Option<String>,

    /// Maximum element nesting depth.
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Remove blank (whitespace-only) text nodes inside elements.
    #[arg(long)]
    noblanks: bool,

    // -- Output options ----------------------------------------------------
    /// Evaluate an XPath expression against the document node and print
    /// the result instead of the document.
    #[allow(clippy::doc_markdown)]
    #[arg(long, value_name = "EXPR")]
    xpath: Option<String>,

    /// Do not output the document.
    #[arg(long)]
    noout: bool,

    /// Pretty-print (indent) the output.
    #[arg(long)]
    format: bool,

    /// Print how long reading, parsing, and output took.
    #[arg(long)]
    timing: bool,
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

const EXIT_SUCCESS: u8 = 0;
const EXIT_PARSE_ERROR: u8 = 1;
const EXIT_XPATH_ERROR: u8 = 2;
const EXIT_IO_ERROR: u8 = 3;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let options = parse_options(&cli);
    let worst_exit = cli
        .files
        .iter()
        .map(|file| process_file(&cli, &options, file))
        .max()
        .unwrap_or(EXIT_SUCCESS);

    ExitCode::from(worst_exit)
}

fn parse_options(cli: &Cli) -> ParseOptions {
    let mut options = ParseOptions::default().no_blanks(cli.noblanks);
    if let Some(label) = &cli.encoding {
        options = options.encoding(label.clone());
    }
    if let Some(depth) = cli.max_depth {
        options = options.max_depth(depth);
    }
    options
}

/// Processes a single input file and returns an exit code.
fn process_file(cli: &Cli, options: &ParseOptions, filename: &str) -> u8 {
    let start_read = Instant::now();
    let input = match read_input(filename) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{filename}: failed to read: {e}");
            return EXIT_IO_ERROR;
        }
    };
    if cli.timing {
        eprintln!("Reading file {filename} took {:?}", start_read.elapsed());
    }

    let start_parse = Instant::now();
    let doc = match Document::parse(&input, options) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("{filename}: {e}");
            return EXIT_PARSE_ERROR;
        }
    };
    if cli.timing {
        eprintln!("Parsing took {:?}", start_parse.elapsed());
    }
    debug!(file = filename, nodes = doc.node_count(), "parsed");

    if let Some(expression) = &cli.xpath {
        return match print_xpath(&doc, expression) {
            Ok(()) => EXIT_SUCCESS,
            Err(XPathOutputError::Query(e)) => {
                eprintln!("{filename}: XPath error: {e}");
                EXIT_XPATH_ERROR
            }
            Err(XPathOutputError::Io(e)) => {
                eprintln!("{filename}: failed to write: {e}");
                EXIT_IO_ERROR
            }
        };
    }

    if cli.noout {
        return EXIT_SUCCESS;
    }

    let start_output = Instant::now();
    let bytes = match render(cli, &doc) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("{filename}: {e}");
            return EXIT_PARSE_ERROR;
        }
    };
    if let Err(e) = io::stdout().lock().write_all(&bytes) {
        eprintln!("{filename}: failed to write: {e}");
        return EXIT_IO_ERROR;
    }
    if cli.timing {
        eprintln!("Saving took {:?}", start_output.elapsed());
    }
    EXIT_SUCCESS
}

fn read_input(filename: &str) -> io::Result<Vec<u8>> {
    if filename == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(filename)
    }
}

/// Serializes the document and encodes it in its declared encoding.
fn render(cli: &Cli, doc: &Document) -> Result<Vec<u8>, Error> {
    if !cli.format {
        return Ok(doc.to_bytes()?);
    }
    let text = serialize_with_options(doc, &SerializeOptions::default().indent(true));
    match doc.encoding.as_deref() {
        None => Ok(text.into_bytes()),
        Some(label) => Ok(encoding::encode(&text, label)?),
    }
}

enum XPathOutputError {
    Query(xpath::XPathError),
    Io(io::Error),
}

/// Prints each selected node on its own line, or the scalar result.
fn print_xpath(doc: &Document, expression: &str) -> Result<(), XPathOutputError> {
    let value = xpath::evaluate(doc, doc.root(), expression).map_err(XPathOutputError::Query)?;
    let mut out = io::stdout().lock();
    match &value {
        XPathValue::NodeSet(nodes) => {
            for &node in nodes {
                writeln!(out, "{}", serialize_node(doc, node)).map_err(XPathOutputError::Io)?;
            }
        }
        scalar => writeln!(out, "{scalar}").map_err(XPathOutputError::Io)?,
    }
    Ok(())
}
