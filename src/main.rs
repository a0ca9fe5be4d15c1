//! CLI entry point for the exam trends tool.
//!
//! Loads every per-year result file once, then answers report queries given
//! on the command line or asked for interactively.

mod prompt;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use exam_trends::analyzers::{
    ReportBuilder, ReportError, ReportQuery, ResultsRepository, SortKey, Subject,
};
use exam_trends::config::{AppConfig, parse_years};
use exam_trends::loader::load_repository;
use exam_trends::output::{ReportDocument, render_table, to_json, write_csv};
use prompt::{ConsolePrompt, QuerySource, ScriptedQueries};
use std::ffi::OsStr;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "exam_trends")]
#[command(about = "Per-school exam averages and projected trends", long_about = None)]
struct Cli {
    /// Directory holding the per-year CSV files [env: EXAM_DATA_DIR]
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Comma-separated years to load, e.g. 2021,2022 (default: every file found) [env: EXAM_YEARS]
    #[arg(short, long, global = true)]
    years: Option<String>,

    /// Year to project trends to (default: latest loaded year + 1) [env: EXAM_TARGET_YEAR]
    #[arg(short, long, global = true)]
    target_year: Option<i32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the report for one city
    Report {
        /// City name, matched exactly (case-sensitive)
        #[arg(short, long)]
        city: String,

        /// P for polish, E for english, M for math, A for all
        #[arg(short, long, default_value = "A")]
        subject: Subject,

        /// A to order by average, T to order by trend
        #[arg(short, long, default_value = "A")]
        order: SortKey,

        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,

        /// Write the report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Prompt for city, subject and order until an empty city is entered
    Interactive,
    /// List every city with results
    ListCities,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
    Csv,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/exam_trends.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("exam_trends.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    let (repository, _) = load_repository(
        &config.data_dir,
        &config.file_prefix,
        config.years.as_deref(),
    )?;

    match cli.command {
        Commands::Report {
            city,
            subject,
            order,
            format,
            output,
        } => {
            let query = ReportQuery::new(city, subject, order);
            let report = render_report(
                &repository,
                config.target_year,
                &query,
                format,
                output.as_deref(),
            )?;
            if let Some(text) = report {
                print!("{text}");
            }
        }
        Commands::Interactive => {
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            if stdin.is_terminal() {
                run_interactive(
                    &repository,
                    config.target_year,
                    &mut ConsolePrompt::default(),
                    &mut stdout,
                )?;
            } else {
                run_interactive(
                    &repository,
                    config.target_year,
                    &mut ScriptedQueries::new(stdin.lock()),
                    &mut stdout,
                )?;
            }
        }
        Commands::ListCities => {
            for city in repository.cities() {
                println!("{city}");
            }
        }
    }

    Ok(())
}

/// Layers CLI flags over the environment configuration.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::from_env()?;

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(years) = &cli.years {
        config.years = Some(parse_years(years).context("invalid --years")?);
    }
    if cli.target_year.is_some() {
        config.target_year = cli.target_year;
    }

    info!(
        data_dir = %config.data_dir.display(),
        years = ?config.years,
        target_year = ?config.target_year,
        "Configuration resolved"
    );
    Ok(config)
}

/// Builds one report. Table and JSON output are returned for printing
/// unless `output` is set; CSV always goes to a file (`report.csv` by default).
/// An unknown city yields a short notice instead of an error.
fn render_report(
    repository: &ResultsRepository,
    target_year: Option<i32>,
    query: &ReportQuery,
    format: Format,
    output: Option<&Path>,
) -> Result<Option<String>> {
    let builder = ReportBuilder::new(repository).target_year(target_year);

    let rows = match builder.build(query) {
        Ok(rows) => rows,
        Err(e @ ReportError::EmptyResult { .. }) => {
            warn!(error = %e, "Empty report");
            return Ok(Some(format!("No schools found for city \"{}\".\n", query.city)));
        }
        Err(e) => return Err(e.into()),
    };

    let target_year = builder
        .resolved_target_year()
        .context("target year unavailable")?;

    let text = match format {
        Format::Table => format!(
            "{} - {} ordered by {}, trend projected to {}\n{}",
            query.city,
            query.subject,
            query.sort,
            target_year,
            render_table(&rows, query)
        ),
        Format::Json => to_json(&ReportDocument::new(query, target_year, &rows))? + "\n",
        Format::Csv => {
            let path = output.unwrap_or(Path::new("report.csv"));
            write_csv(path, &rows)?;
            info!(path = %path.display(), rows = rows.len(), "CSV report written");
            return Ok(None);
        }
    };

    match output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), rows = rows.len(), "Report written");
            Ok(None)
        }
        None => Ok(Some(text)),
    }
}

/// Repeats query-then-report until the source runs out of queries.
fn run_interactive<Q: QuerySource, W: Write>(
    repository: &ResultsRepository,
    target_year: Option<i32>,
    source: &mut Q,
    output: &mut W,
) -> Result<()> {
    while let Some(query) = source.next_query()? {
        let report = render_report(repository, target_year, &query, Format::Table, None)?;
        if let Some(text) = report {
            writeln!(output, "{text}")?;
        }
    }
    Ok(())
}
