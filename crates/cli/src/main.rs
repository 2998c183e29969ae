//! # intake-cli
//!
//! Command-line interface for spreadsheet imports.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use intake_sheet::{decode_workbook, ExtractOptions, ImportSource, Workbook};
use intake_worker::{ImportResponse, ImportWorker, IntakeConfig};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// intake - spreadsheet ingestion for bulk record imports
#[derive(Parser)]
#[command(name = "intake")]
#[command(author, version, about = "Extract header-keyed rows from spreadsheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// YAML configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Extract rows from a workbook and print the import response
    Import {
        /// Workbook to import (xlsx, xlsm, xlsb, xls, ods or csv)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format (json, summary)
        #[arg(short = 'f', long = "format", default_value = "json")]
        format: OutputFormat,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// List sheets in declared order with their used ranges
    Sheets {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// Output format for import results.
#[derive(Clone, Copy, Debug, Default, PartialEq, clap::ValueEnum)]
enum OutputFormat {
    /// The raw response message (default)
    #[default]
    Json,
    /// Row counts per sheet
    Summary,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let config = IntakeConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let options = config.extract.to_options()?;

    match cli.command {
        Command::Import {
            file,
            format,
            pretty,
        } => run_import(&config, options, file, format, pretty).await,
        Command::Sheets { file } => run_sheets(file).await,
    }
}

/// Import one file through the worker and print its response.
async fn run_import(
    config: &IntakeConfig,
    options: ExtractOptions,
    file: PathBuf,
    format: OutputFormat,
    pretty: bool,
) -> Result<ExitCode> {
    let worker = ImportWorker::spawn(&config.worker, options);
    let reply = worker.submit(ImportSource::path(file)).await?;
    tracing::debug!(request_id = %reply.id, "received reply");

    match (&reply.response, format) {
        (ImportResponse::Failure { error }, OutputFormat::Summary) => {
            eprintln!("{} {error}", "Error:".red().bold());
        }
        _ => print!("{}", render_response(&reply.response, format, pretty)?),
    }

    Ok(if reply.response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// List sheet names and used ranges without extracting rows.
async fn run_sheets(file: PathBuf) -> Result<ExitCode> {
    let workbook = tokio::task::spawn_blocking(move || -> intake_sheet::Result<Workbook> {
        let bytes = ImportSource::path(file).read_all()?;
        decode_workbook(bytes)
    })
    .await??;

    print!("{}", render_sheets(&workbook)?);
    Ok(ExitCode::SUCCESS)
}

/// Render a response in the requested format.
fn render_response(response: &ImportResponse, format: OutputFormat, pretty: bool) -> Result<String> {
    let mut out = String::new();

    match format {
        OutputFormat::Json => {
            let json = if pretty {
                serde_json::to_string_pretty(response)?
            } else {
                serde_json::to_string(response)?
            };
            writeln!(out, "{json}")?;
        }
        OutputFormat::Summary => match response {
            ImportResponse::Success(extraction) => {
                let width = extraction
                    .sheets
                    .iter()
                    .map(String::len)
                    .max()
                    .unwrap_or(0)
                    .max("Sheet".len());

                writeln!(out, "{:<width$}  {}", "Sheet".bold(), "Rows".bold())?;
                for name in &extraction.sheets {
                    let rows = extraction.rows(name).map_or(0, <[_]>::len);
                    writeln!(out, "{name:<width$}  {rows}")?;
                }
                writeln!(
                    out,
                    "{} rows across {} sheets",
                    extraction.row_count(),
                    extraction.sheets.len()
                )?;
            }
            ImportResponse::Failure { error } => writeln!(out, "Error: {error}")?,
        },
    }

    Ok(out)
}

/// Render sheet names with their used ranges.
fn render_sheets(workbook: &Workbook) -> Result<String> {
    let mut out = String::new();
    for sheet in workbook.sheets() {
        let used = sheet
            .used_range()
            .map_or_else(|| "(empty)".to_string(), |range| range.to_string());
        writeln!(out, "{}\t{used}", sheet.name())?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_sheet::{extract_workbook, Sheet};

    fn sample_response() -> ImportResponse {
        let mut book = Workbook::new();
        book.add_sheet(Sheet::from_rows(
            "Claims",
            vec![vec!["Claim", "Amount"], vec!["CL-1", "10"], vec!["CL-2", "20"]],
        ))
        .unwrap();
        book.add_sheet(Sheet::empty("Notes")).unwrap();
        ImportResponse::Success(extract_workbook(&book, &ExtractOptions::default()))
    }

    #[test]
    fn test_parse_import_args() {
        let cli = Cli::try_parse_from(["intake", "import", "book.xlsx", "-f", "summary", "--pretty"])
            .unwrap();
        match cli.command {
            Command::Import {
                file,
                format,
                pretty,
            } => {
                assert_eq!(file, PathBuf::from("book.xlsx"));
                assert_eq!(format, OutputFormat::Summary);
                assert!(pretty);
            }
            Command::Sheets { .. } => panic!("expected import"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["intake", "sheets", "book.xlsx", "--config", "intake.yaml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("intake.yaml")));
        assert!(matches!(cli.command, Command::Sheets { .. }));
    }

    #[test]
    fn test_render_json() {
        let out = render_response(&sample_response(), OutputFormat::Json, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(value["sheets"], serde_json::json!(["Claims", "Notes"]));
        assert_eq!(value["data"]["Claims"][1]["Amount"], serde_json::json!("20"));
        assert_eq!(value["data"]["Notes"], serde_json::json!([]));
    }

    #[test]
    fn test_render_error_json() {
        let response = ImportResponse::Failure {
            error: "Failed to read file: gone".to_string(),
        };
        let out = render_response(&response, OutputFormat::Json, false).unwrap();
        assert_eq!(out, "{\"error\":\"Failed to read file: gone\"}\n");
    }

    #[test]
    fn test_render_summary() {
        colored::control::set_override(false);
        let out = render_response(&sample_response(), OutputFormat::Summary, false).unwrap();
        assert!(out.contains("Claims  2"));
        assert!(out.contains("Notes   0"));
        assert!(out.ends_with("2 rows across 2 sheets\n"));
    }

    #[test]
    fn test_render_sheets() {
        let mut book = Workbook::new();
        book.add_sheet(Sheet::from_rows("Data", vec![vec!["a", "b"], vec!["c", "d"]]))
            .unwrap();
        book.add_sheet(Sheet::empty("Empty")).unwrap();

        assert_eq!(
            render_sheets(&book).unwrap(),
            "Data\tA1:B2\nEmpty\t(empty)\n"
        );
    }
}
