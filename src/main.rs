//! Kasumi main entry point
//!
//! This is the command-line interface for the Kasumi link unfurler.

use clap::Parser;
use kasumi::cache::{CacheStorage, MemoryCache, SqliteCache};
use kasumi::config::{load_config_with_hash, CacheBackend, Config};
use kasumi::fetch::{CachingFetcher, DirectFetcher, FetchCapability};
use kasumi::pipeline::{UnfurlContext, Unfurler};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Kasumi: a link unfurler for document pipelines
///
/// Kasumi resolves a URL to a markup fragment, using a provider's oEmbed
/// endpoint when one is known and declarative page scraping otherwise.
/// Responses are cached, failures included, so reconversions of the same
/// document stay off the network.
#[derive(Parser, Debug)]
#[command(name = "kasumi")]
#[command(version = "1.0.0")]
#[command(about = "A link unfurler for document pipelines", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// URL to unfurl
    #[arg(value_name = "URL")]
    url: String,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print the resolved metadata as JSON instead of a markup fragment
    #[arg(long)]
    json: bool,

    /// Bypass the cache and fetch live
    #[arg(long)]
    no_cache: bool,

    /// Validate config and show how the URL would be resolved, without fetching
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => {
            tracing::debug!("No configuration file given, using built-in defaults");
            Config::default()
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, &cli.url)?;
        return Ok(());
    }

    handle_unfurl(config, &cli).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("kasumi=warn"),
            1 => EnvFilter::new("kasumi=info,warn"),
            2 => EnvFilter::new("kasumi=debug,info"),
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

/// Handles the --dry-run mode: validates config and shows the resolution plan
fn handle_dry_run(config: &Config, url: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Kasumi Dry Run ===\n");

    println!("Identity:");
    println!("  User agent: {}", config.identity.user_agent());

    println!("\nCache:");
    println!("  Backend: {:?}", config.cache.backend);
    if let Some(path) = &config.cache.database_path {
        println!("  Database: {}", path);
    }
    println!("  Success TTL: {}s", config.cache.success_ttl_secs);
    println!("  Failure TTL: {}s", config.cache.failure_ttl_secs);
    println!("  Failure caching: {}", config.cache.cache_failures);
    println!("  Enabled: {}", config.cache.enabled);

    println!("\nProviders ({}):", config.providers.len());
    for provider in &config.providers {
        println!(
            "  - {} ({} endpoints)",
            provider.name,
            provider.endpoints.len()
        );
    }

    println!("\nScraping rules ({} configured):", config.rules.len());
    for rule in &config.rules {
        println!("  - {} ({})", rule.site, rule.pattern);
    }

    let unfurler = Unfurler::new(config);
    println!("\nResolution plan for {}:", url);
    if unfurler.resolver().has_static_endpoint(url) {
        println!("  oEmbed via a configured provider endpoint");
    } else {
        println!("  scrape (with oEmbed discovery attempted first if linked)");
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Builds the fetch capability described by the config and CLI flags
fn build_fetcher(
    config: &Config,
    no_cache: bool,
) -> Result<Arc<dyn FetchCapability>, Box<dyn std::error::Error>> {
    let timeout = Duration::from_secs(config.cache.fetch_timeout_secs);
    let direct = Arc::new(DirectFetcher::new(&config.identity, timeout)?);

    if no_cache || !config.cache.enabled {
        tracing::debug!("caching disabled, all fetches are live");
        return Ok(direct);
    }

    let storage: Arc<dyn CacheStorage> = match config.cache.backend {
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
        CacheBackend::Sqlite => {
            // Validation guarantees a path when the backend is sqlite
            let path = config.cache.database_path.as_deref().unwrap_or("kasumi-cache.db");
            Arc::new(SqliteCache::new(Path::new(path))?)
        }
    };

    let fetcher = CachingFetcher::new(direct, storage)
        .with_ttls(
            Duration::from_secs(config.cache.success_ttl_secs),
            Duration::from_secs(config.cache.failure_ttl_secs),
        )
        .with_failure_caching(config.cache.cache_failures);

    Ok(Arc::new(fetcher))
}

/// Handles the main unfurl operation
async fn handle_unfurl(config: Config, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = build_fetcher(&config, cli.no_cache)?;
    let unfurler = Unfurler::new(&config);
    let ctx = UnfurlContext::new(fetcher);

    if cli.json {
        let json = if unfurler.resolver().has_static_endpoint(&cli.url) {
            let embed = unfurler
                .resolver()
                .fetch_embed(&cli.url, ctx.fetcher.as_ref(), &ctx.cancel)
                .await?;
            serde_json::to_string_pretty(&embed)?
        } else {
            let metadata = unfurler.scrape(&cli.url, &ctx).await?;
            serde_json::to_string_pretty(&metadata)?
        };
        println!("{}", json);
        return Ok(());
    }

    match unfurler.unfurl(&cli.url, &ctx).await {
        Ok(fragment) => {
            println!("{}", fragment);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Unfurl failed: {}", e);
            Err(e.into())
        }
    }
}
