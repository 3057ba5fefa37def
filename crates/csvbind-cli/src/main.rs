//! # csvbind-cli
//!
//! Command line interface for csvbind: parse CSV into JSON records, render
//! JSON records back to CSV, and check files for format violations.

use anyhow::{bail, Context};
use clap::Parser;
use csvbind_core::{CsvDocument, CsvFormat};
use csvbind_mapping::{ConvertOptions, DefaultConverter, FieldValue, ValueConverter};
use csvbind_parser::{CsvReader, CsvWriter, LineEnding, Scanner, StringSource};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "csvbind")]
#[command(about = "CSV parsing, formatting, and conversion")]
#[command(version)]
struct Cli {
    /// Path to a YAML dialect configuration file
    #[arg(short, long)]
    dialect: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
enum Commands {
    /// Parse a CSV file into JSON records
    Parse {
        /// Input CSV file path
        input: PathBuf,

        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Guess cell types instead of emitting strings
        #[arg(short, long)]
        typed: bool,
    },

    /// Render a JSON array of records as CSV
    Format {
        /// Input JSON file path
        input: PathBuf,

        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a CSV file and report format violations
    Check {
        /// Input CSV file path
        input: PathBuf,
    },
}

/// Dialect configuration loaded from YAML
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Dialect {
    format: CsvFormat,
    has_header: Option<bool>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let dialect = load_dialect(cli.dialect.as_deref())?;

    match cli.command {
        Commands::Parse {
            input,
            output,
            typed,
        } => parse_command(&input, output.as_deref(), typed, &dialect),
        Commands::Format { input, output } => format_command(&input, output.as_deref(), &dialect),
        Commands::Check { input } => check_command(&input, &dialect),
    }
}

fn load_dialect(path: Option<&Path>) -> anyhow::Result<Dialect> {
    let Some(path) = path else {
        return Ok(Dialect::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read dialect file {}", path.display()))?;
    let dialect: Dialect = serde_yaml::from_str(&text)
        .with_context(|| format!("invalid dialect file {}", path.display()))?;
    dialect
        .format
        .validate()
        .with_context(|| format!("invalid dialect in {}", path.display()))?;
    Ok(dialect)
}

fn parse_command(
    input: &Path,
    output: Option<&Path>,
    typed: bool,
    dialect: &Dialect,
) -> anyhow::Result<()> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("cannot read {}", input.display()))?;
    let reader = CsvReader::new()
        .with_format(dialect.format.clone())
        .has_header(dialect.has_header.unwrap_or(true));
    let doc = reader.read_str(&text)?;
    tracing::info!(rows = doc.len(), "parsed {}", input.display());

    let options = ConvertOptions::default();
    let rows: Vec<serde_json::Value> = doc
        .iter()
        .map(|record| match doc.header() {
            Some(header) => {
                let mut object = serde_json::Map::new();
                for (name, value) in header.columns().iter().zip(record.values()) {
                    object.insert(name.clone(), cell_to_json(value, typed, &options));
                }
                serde_json::Value::Object(object)
            }
            None => serde_json::Value::Array(
                record
                    .values()
                    .iter()
                    .map(|value| cell_to_json(value, typed, &options))
                    .collect(),
            ),
        })
        .collect();

    let rendered = serde_json::to_string_pretty(&rows)?;
    emit(output, &rendered)
}

fn cell_to_json(text: &str, typed: bool, options: &ConvertOptions) -> serde_json::Value {
    if !typed {
        return serde_json::Value::String(text.to_string());
    }
    match options.guess_value(text) {
        FieldValue::Null => serde_json::Value::Null,
        FieldValue::Bool(b) => serde_json::Value::Bool(b),
        FieldValue::Integer(i) => serde_json::Value::Number(i.into()),
        FieldValue::Float(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(text.to_string())),
        other => DefaultConverter
            .format_value(&other)
            .map(serde_json::Value::String)
            .unwrap_or_else(|_| serde_json::Value::String(text.to_string())),
    }
}

fn format_command(input: &Path, output: Option<&Path>, dialect: &Dialect) -> anyhow::Result<()> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("cannot read {}", input.display()))?;
    let rows: Vec<serde_json::Value> =
        serde_json::from_str(&text).context("input must be a JSON array of records")?;

    let mut doc = CsvDocument::new(dialect.format.clone());
    let mut header: Option<Vec<String>> = None;

    for row in &rows {
        match row {
            serde_json::Value::Object(object) => {
                if header.is_none() {
                    header = Some(object.keys().cloned().collect());
                }
                let columns = header.as_ref().expect("header set above");
                let values = columns
                    .iter()
                    .map(|name| json_to_cell(object.get(name)))
                    .collect();
                doc.append_values(values)?;
            }
            serde_json::Value::Array(items) => {
                doc.append_values(items.iter().map(|item| json_to_cell(Some(item))).collect())?;
            }
            other => bail!("unsupported row shape: {other}"),
        }
    }

    let writer = CsvWriter::new()
        .with_format(dialect.format.clone())
        .with_line_ending(LineEnding::Native);
    let mut rendered = Vec::new();
    if let Some(columns) = &header {
        writer.write_rows(&mut rendered, &[columns.clone()])?;
    }
    let rows: Vec<Vec<String>> = doc
        .iter()
        .map(|record| record.values().to_vec())
        .collect();
    writer.write_rows(&mut rendered, &rows)?;

    emit(output, &String::from_utf8(rendered)?)
}

fn json_to_cell(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn check_command(input: &Path, dialect: &Dialect) -> anyhow::Result<()> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("cannot read {}", input.display()))?;
    let mut scanner = Scanner::new(dialect.format.clone());
    let mut source = StringSource::new(&text);
    let mut rows = 0usize;

    loop {
        match scanner.parse_next(&mut source) {
            Ok(Some(_)) => rows += 1,
            Ok(None) => break,
            Err(err) => {
                eprintln!("error: {err}");
                if let Some(excerpt) = err.excerpt() {
                    eprintln!("{}", excerpt.render());
                }
                std::process::exit(1);
            }
        }
    }

    println!("{}: {rows} records OK", input.display());
    Ok(())
}

fn emit(output: Option<&Path>, rendered: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("cannot write {}", path.display())),
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}
