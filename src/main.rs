//! Sumi-Skim main entry point
//!
//! This is the command-line interface for the Sumi-Skim site crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use sumi_skim::config::{load_config_with_hash, validate, CrawlConfig};
use sumi_skim::crawler::run_crawl;
use sumi_skim::output::print_summary;
use sumi_skim::ScopeMode;
use tracing_subscriber::EnvFilter;

/// Sumi-Skim: a single-site link skimmer
///
/// Sumi-Skim starts from a seed URL, follows links that stay on the seed's
/// site up to a maximum depth, and records the HTTP status of every URL it
/// visits.
#[derive(Parser, Debug)]
#[command(name = "sumi-skim")]
#[command(version = "1.0.0")]
#[command(about = "A single-site link skimmer", long_about = None)]
struct Cli {
    /// Seed URL; its host defines the crawl scope
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Maximum link depth from the seed [default: 2]
    #[arg(long, value_name = "N")]
    depth: Option<u32>,

    /// Maximum number of concurrent fetches [default: 5]
    #[arg(long, value_name = "N")]
    concurrency: Option<u32>,

    /// CSV file to write; observations are echoed to stdout when absent
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// User-Agent to send; repeat to rotate through several [default: Mozilla/5.0]
    #[arg(long = "user-agent", value_name = "UA")]
    user_agents: Vec<String>,

    /// Proxy for every request (e.g. http://127.0.0.1:8080)
    #[arg(long, value_name = "URL")]
    proxy: Option<String>,

    /// Render pages without static links in headless Chromium
    #[arg(long)]
    headless: bool,

    /// Lower bound of the random delay before each fetch [default: 0]
    #[arg(long, value_name = "MS")]
    min_delay_ms: Option<u64>,

    /// Upper bound of the random delay before each fetch [default: 1000]
    #[arg(long, value_name = "MS")]
    max_delay_ms: Option<u64>,

    /// Which hosts count as the seed's site: substring, exact or suffix [default: substring]
    #[arg(long, value_name = "MODE")]
    scope: Option<ScopeMode>,

    /// Path to TOML configuration file; flags override its values
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Validate configuration and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Layers command-line flags over `config`
    fn apply(&self, config: &mut CrawlConfig) {
        if let Some(url) = &self.url {
            config.crawl.seed_url = url.clone();
        }
        if let Some(depth) = self.depth {
            config.crawl.max_depth = depth;
        }
        if let Some(concurrency) = self.concurrency {
            config.crawl.concurrency = concurrency;
        }
        if let Some(scope) = self.scope {
            config.crawl.scope = scope;
        }
        if let Some(output) = &self.output {
            config.output.csv_path = Some(output.clone());
        }
        if !self.user_agents.is_empty() {
            config.request.user_agents = self.user_agents.clone();
        }
        if let Some(proxy) = &self.proxy {
            config.request.proxy = Some(proxy.clone());
        }
        if let Some(min) = self.min_delay_ms {
            config.request.min_delay_ms = min;
        }
        if let Some(max) = self.max_delay_ms {
            config.request.max_delay_ms = max;
        }
        if self.headless {
            config.headless.enabled = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => CrawlConfig::default(),
    };
    cli.apply(&mut config);

    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_skim=info,warn"),
            1 => EnvFilter::new("sumi_skim=debug,info"),
            2 => EnvFilter::new("sumi_skim=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &CrawlConfig) {
    println!("=== Sumi-Skim Dry Run ===\n");

    println!("Crawl:");
    println!("  Seed: {}", config.crawl.seed_url);
    println!("  Max depth: {}", config.crawl.max_depth);
    println!("  Concurrency: {}", config.crawl.concurrency);
    println!("  Scope: {}", config.crawl.scope);

    println!("\nRequests:");
    println!("  User agents: {}", config.request.user_agents.join(" | "));
    println!(
        "  Proxy: {}",
        config.request.proxy.as_deref().unwrap_or("(none)")
    );
    println!("  Timeout: {}s", config.request.timeout_secs);
    println!(
        "  Delay: {}..{}ms",
        config.request.min_delay_ms, config.request.max_delay_ms
    );

    println!("\nHeadless fallback:");
    if config.headless.enabled {
        println!("  Enabled (settle {}ms)", config.headless.settle_ms);
    } else {
        println!("  Disabled");
    }

    println!("\nOutput:");
    match &config.output.csv_path {
        Some(path) => println!("  CSV: {}", path.display()),
        None => println!("  Console"),
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: CrawlConfig, quiet: bool) -> anyhow::Result<()> {
    match run_crawl(config).await {
        Ok(summary) => {
            if !quiet {
                println!();
                print_summary(&summary);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
