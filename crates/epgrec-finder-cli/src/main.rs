//! epgrec-program-finder - lists unreserved epgrec programs.

/// Application configuration (TOML).
mod config;
/// Plain-text result output.
mod output;
/// `--since` resolution.
mod since;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::Parser;
use clap::error::ErrorKind;
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::AppConfig;
use crate::since::resolve_since;
use epgrec_finder_db::query::DATETIME_FORMAT;
use epgrec_finder_db::{MySqlProgramSource, Placeholder, ProgramSource, build_program_query};

const APP_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (rev:",
    env!("GIT_HASH"),
    ")",
);

/// CLI argument parser.
#[derive(Parser)]
#[command(name = "epgrec-program-finder", about, version = APP_VERSION)]
struct Cli {
    /// Load configuration from FILE.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Since start time (default: now).
    /// Formats: "2024-01-01 00:00:00", "2024-01-01T00:00:00", "2024-01-01".
    #[arg(short, long, value_name = "DATETIME")]
    since: Option<String>,
}

/// Parses command-line arguments.
///
/// `--help` and `--version` print and exit with status 0; every other
/// parse error is returned so the process exits with status 1.
///
/// # Errors
///
/// Returns the clap error for unknown flags or invalid values.
fn parse_cli<I, T>(args: I) -> Result<Cli>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(cli),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => Err(e.into()),
    }
}

/// Queries unreserved programs from `source` and writes them to `out`.
///
/// Returns the number of programs found.
///
/// # Errors
///
/// Returns an error if the table prefix is invalid, the query fails, or
/// writing the output fails.
#[allow(clippy::future_not_send)]
#[instrument(skip_all)]
async fn find<S, W>(
    source: &mut S,
    config: &AppConfig,
    since: NaiveDateTime,
    out: &mut W,
) -> Result<usize>
where
    S: ProgramSource,
    W: Write,
{
    let tables = config.table_names()?;
    let query = build_program_query(&config.excludes, since, tables);

    let named = query.compile(Placeholder::Named);
    tracing::debug!(
        sql = %named.sql,
        params = ?named.params,
        exclusions = query.exclusion_count(),
        "Built program query"
    );

    let programs = source
        .find_programs(&query.compile(Placeholder::Positional))
        .await
        .context("failed to query programs")?;

    output::write_programs(out, &programs).context("failed to write results")?;
    Ok(programs.len())
}

/// Runs one lookup: load config, connect, query, print.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded, `--since` is invalid,
/// the database is unreachable, or the query fails.
#[allow(clippy::future_not_send)]
#[instrument(skip_all)]
async fn run(cli: &Cli, started: NaiveDateTime) -> Result<()> {
    let config_path = cli
        .config
        .as_ref()
        .context("missing required option --config <FILE>")?;
    let config = AppConfig::load(config_path).context("failed to load config")?;
    let since = resolve_since(cli.since.as_deref(), started)?;
    tracing::debug!(
        since = %since.format(DATETIME_FORMAT),
        excludes = config.excludes.len(),
        "Loaded config from {}",
        config_path.display()
    );

    let mut source = MySqlProgramSource::connect(&config.database)
        .await
        .with_context(|| format!("failed to connect to {}", config.database.redacted_dsn()))?;

    let stdout = std::io::stdout();
    let count = find(&mut source, &config, since, &mut stdout.lock()).await?;
    tracing::debug!(count, "Lookup complete");

    if let Err(e) = source.close().await {
        tracing::warn!(error = %e, "Failed to close database connection");
    }

    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if the lookup fails; the process then exits with status 1.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let started = Local::now().naive_local();

    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = parse_cli(std::env::args_os())?;
    run(&cli, started).await
}
