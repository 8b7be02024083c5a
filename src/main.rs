//! PopDop - World Bank population dashboard
//!
//! A CLI tool that fetches demographic indicators for the world and a
//! set of countries, aggregates them into per-indicator series and
//! writes a dashboard report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad config, network or HTTP failure, etc.)
//!   2 - The API returned no data for the request

mod analysis;
mod catalog;
mod cli;
mod config;
mod error;
mod fetcher;
mod models;
mod report;
mod store;

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use fetcher::{FetchRequest, Fetcher, HttpTransport, Transport};
use indicatif::{ProgressBar, ProgressStyle};
use models::DashboardReport;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use store::{DashboardStore, FetchStatus};
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is read before logging so its verbosity setting applies
    let config = match prepare_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(args.log_level(config.general.verbose));

    info!("PopDop v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    match run_dashboard(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .popdop.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize countries, indicators, range and more.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run one fetch generation and write the report. Returns the exit code.
async fn run_dashboard(args: Args, config: Config) -> Result<i32> {
    let request = FetchRequest::for_range(
        config.dashboard.countries.clone(),
        config.dashboard.indicators.clone(),
        config.dashboard.range_years,
        Utc::now().year(),
    );

    let transport = HttpTransport::new(config.api.timeout_seconds)?;
    let fetcher = Fetcher::new(transport, config.api.base_url.clone())
        .with_per_page(config.api.per_page)
        .with_concurrency(config.api.concurrency);

    if args.dry_run {
        return Ok(handle_dry_run(&fetcher, &request));
    }

    println!(
        "🌍 Fetching {} indicators for {} ({}-{})",
        request.indicators.len(),
        request.countries.join(", "),
        request.start_year,
        request.end_year
    );

    let mut store = DashboardStore::new(config.dashboard.world_aggregate_id.clone());
    let ticket = store.begin_fetch();

    let spinner = fetch_spinner(!args.quiet, request.indicators.len());
    let start_time = Instant::now();
    let result = fetcher.fetch(&request).await;
    let duration = start_time.elapsed().as_secs_f64();
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    store.complete(ticket, result);
    let snapshot = store.snapshot();

    let report = report::build_report(&snapshot, &request, &config, duration);
    let output_path = output_path(&args, &config);

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    print_summary(&report);

    match &snapshot.status {
        FetchStatus::Ready => println!("\n✅ Report saved to: {}", output_path.display()),
        FetchStatus::NoData => println!(
            "\n⚠️  No data received. Report saved to: {}",
            output_path.display()
        ),
        FetchStatus::Failed(message) => {
            eprintln!("\n❌ Error: {}", message);
            eprintln!("   Report saved to: {}", output_path.display());
        }
        other => warn!("Fetch finished in unexpected state: {}", other),
    }

    Ok(exit_code(&snapshot.status))
}

/// Process exit code for the final state of a fetch.
fn exit_code(status: &FetchStatus) -> i32 {
    match status {
        FetchStatus::Ready => 0,
        FetchStatus::NoData => 2,
        FetchStatus::Failed(_) | FetchStatus::Idle | FetchStatus::Loading => 1,
    }
}

/// Handle --dry-run: print the request URLs and exit.
fn handle_dry_run<T: Transport>(fetcher: &Fetcher<T>, request: &FetchRequest) -> i32 {
    println!("\n🔍 Dry run: requests that would be sent (no network calls)...\n");

    for url in fetcher.request_urls(request) {
        println!("     🔗 {}", url);
    }

    println!("\n   Total: {} requests", request.indicators.len());
    println!("\n✅ Dry run complete.");
    0
}

/// Spinner shown while indicator requests are in flight.
fn fetch_spinner(enabled: bool, indicators: usize) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(format!("Requesting {} indicators...", indicators));
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Report path: JSON output gets a `.json` extension unless a path was given.
fn output_path(args: &Args, config: &Config) -> PathBuf {
    let mut path = PathBuf::from(&config.general.output);
    if args.format == OutputFormat::Json
        && args.output.is_none()
        && path.extension().is_some_and(|ext| ext == "md")
    {
        path.set_extension("json");
    }
    path
}

fn print_summary(report: &DashboardReport) {
    println!("\n📊 Dashboard Summary:");
    for card in &report.headlines {
        match card.year {
            Some(ref year) => println!("   {}: {} ({})", card.title, card.value, year),
            None => println!("   {}: {}", card.title, card.value),
        }
    }
    println!(
        "   Countries: {} | Observations: {}",
        report.country_table.len(),
        report.metadata.observations
    );
    println!("   Duration: {:.1}s", report.metadata.duration_seconds);
}

/// Load the config file, apply CLI overrides and validate the result.
fn prepare_config(args: &Args) -> Result<Config> {
    let mut config = load_config(args)?;
    config.merge_with_args(args);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load config: {:#}. Using defaults.", e);
            Ok(Config::default())
        }
    }
}
