//! Linkwave main entry point
//!
//! This is the command-line interface for the Linkwave link crawler.

use clap::Parser;
use linkwave::config::{load_config_with_hash, validate, Config, ThrottlePolicy};
use linkwave::output::log_report;
use linkwave::{Crawler, LinkwaveError};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Linkwave: a polite breadth-first link crawler
///
/// Linkwave crawls outward from seed URLs, spacing requests per host, and
/// writes every discovered page as a CSV record
/// (Depth,Url,Text,Title,Content). Per-page errors go to a separate sink.
#[derive(Parser, Debug)]
#[command(name = "linkwave")]
#[command(version)]
#[command(about = "A polite breadth-first link crawler", long_about = None)]
struct Cli {
    /// Seed URLs (added to any seeds from the config file)
    #[arg(value_name = "SEEDS")]
    seeds: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum crawl depth
    #[arg(short, long)]
    depth: Option<u32>,

    /// Maximum links followed per page (0 = unlimited)
    #[arg(short, long)]
    breadth: Option<usize>,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Minimum milliseconds between requests to the same host
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// Only follow links on the same host as the page they were found on
    #[arg(long, conflicts_with = "allow_host")]
    same_host: bool,

    /// Only follow links to hosts matching this pattern (repeatable, e.g. "*.example.com")
    #[arg(long, value_name = "PATTERN")]
    allow_host: Vec<String>,

    /// Only throttle requests to the seed hosts
    #[arg(long)]
    seed_hosts_only: bool,

    /// Leave the Content column empty
    #[arg(long)]
    no_content: bool,

    /// Write CSV records to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Write per-page errors to this file instead of stderr
    #[arg(short, long, value_name = "FILE")]
    errors: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate settings and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            if e.is_config() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so they never mix with CSV on stdout.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("linkwave=info,warn"),
            1 => EnvFilter::new("linkwave=debug,info"),
            2 => EnvFilter::new("linkwave=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), LinkwaveError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    apply_overrides(&mut config, &cli);
    validate(&config)?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(&config).await
}

/// Applies command-line flags on top of the file configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    config.seeds.extend(cli.seeds.iter().cloned());

    let crawler = &mut config.crawler;
    if let Some(depth) = cli.depth {
        crawler.max_depth = depth;
    }
    if let Some(breadth) = cli.breadth {
        crawler.max_breadth = breadth;
    }
    if let Some(workers) = cli.workers {
        crawler.workers = workers;
    }
    if let Some(interval) = cli.interval_ms {
        crawler.request_interval_ms = interval;
    }
    if cli.same_host {
        crawler.same_host = true;
        crawler.allowed_hosts.clear();
    }
    if !cli.allow_host.is_empty() {
        crawler.same_host = false;
        crawler.allowed_hosts = cli.allow_host.clone();
    }
    if cli.seed_hosts_only {
        crawler.throttle_policy = ThrottlePolicy::SeedHosts;
    }
    if cli.no_content {
        crawler.include_content = false;
    }

    if let Some(path) = &cli.output {
        config.output.output_path = path.display().to_string();
    }
    if let Some(path) = &cli.errors {
        config.output.error_path = path.display().to_string();
    }
}

/// Handles the --dry-run mode: shows the effective settings
fn handle_dry_run(config: &Config) {
    let crawler = &config.crawler;

    println!("=== Linkwave Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", crawler.max_depth);
    println!("  Max breadth: {}", crawler.max_breadth);
    println!("  Workers: {}", crawler.workers);
    println!("  Request interval: {}ms", crawler.request_interval_ms);
    println!("  Throttle policy: {:?}", crawler.throttle_policy);
    println!("  Same host: {}", crawler.same_host);
    if !crawler.allowed_hosts.is_empty() {
        println!("  Allowed hosts: {}", crawler.allowed_hosts.join(", "));
    }
    println!("  Include content: {}", crawler.include_content);
    println!("  Request timeout: {}s", crawler.request_timeout_secs);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Records: {}", sink_name(&config.output.output_path, "stdout"));
    println!("  Errors: {}", sink_name(&config.output.error_path, "stderr"));

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

fn sink_name<'a>(path: &'a str, default: &'a str) -> &'a str {
    if path.is_empty() {
        default
    } else {
        path
    }
}

fn open_sink(path: &str, default: impl FnOnce() -> Box<dyn Write>) -> io::Result<Box<dyn Write>> {
    if path.is_empty() {
        Ok(default())
    } else {
        Ok(Box::new(BufWriter::new(File::create(path)?)))
    }
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> Result<(), LinkwaveError> {
    let crawler = Crawler::from_config(config)?;

    let output = open_sink(&config.output.output_path, || Box::new(io::stdout()))?;
    let errors = open_sink(&config.output.error_path, || Box::new(io::stderr()))?;

    let stop = crawler.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing tasks in hand");
            stop.stop();
        }
    });

    let report = crawler.crawl(&config.seeds, output, errors).await?;
    log_report(&report);

    Ok(())
}
