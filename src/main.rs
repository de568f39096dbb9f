//! Bead-Harvest main entry point
//!
//! This is the command-line interface for the Bead-Harvest catalog ingester.

use anyhow::{bail, Context};
use bead_harvest::catalog::{prepare_vocabulary, SharedStore};
use bead_harvest::config::{load_config_with_hash, Config, SiteConfig};
use bead_harvest::crawler::{crawl_site, StopSignal};
use bead_harvest::normalize::SizeTable;
use bead_harvest::output::{load_statistics, print_statistics, write_markdown_report, RunSummary};
use bead_harvest::storage::open_storage;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::Instrument;
use tracing_subscriber::EnvFilter;

/// Bead-Harvest: a polite catalog ingester
///
/// Bead-Harvest crawls bead catalog sites, classifies product codes into
/// sizes, normalizes colours and finishes against a canonical vocabulary and
/// upserts everything into a deduplicated SQLite catalog.
#[derive(Parser, Debug)]
#[command(name = "bead-harvest")]
#[command(version)]
#[command(about = "A polite catalog ingester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Only crawl the named site (repeatable)
    #[arg(long = "site", value_name = "NAME")]
    sites: Vec<String>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show catalog statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let sites = select_sites(&config, &cli.sites)?;

    if cli.dry_run {
        handle_dry_run(&config, &sites);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, config_hash, &cli.sites).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bead_harvest=info,warn"),
            1 => EnvFilter::new("bead_harvest=debug,info"),
            2 => EnvFilter::new("bead_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Resolves `--site` filters; no filter selects every site
fn select_sites<'a>(config: &'a Config, names: &[String]) -> anyhow::Result<Vec<&'a SiteConfig>> {
    if names.is_empty() {
        return Ok(config.sites.iter().collect());
    }
    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        match config.site(name) {
            Some(site) => selected.push(site),
            None => bail!("no site named '{}' in the configuration", name),
        }
    }
    Ok(selected)
}

/// Handles the --dry-run mode: shows sites, seeds, rules and size tables
fn handle_dry_run(config: &Config, sites: &[&SiteConfig]) {
    println!("=== Bead-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Request delay: {}s", config.crawler.request_delay_seconds);
    println!("  Request timeout: {}s", config.crawler.request_timeout_seconds);
    println!(
        "  Retries: {} (backoff {}ms)",
        config.crawler.max_retries, config.crawler.retry_backoff_ms
    );
    match config.crawler.max_pages {
        0 => println!("  Page limit: none"),
        n => println!("  Page limit: {} per site", n),
    }
    println!("  Obey robots.txt: {}", config.crawler.obey_robots);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    if let Some(path) = &config.output.summary_path {
        println!("  Summary: {}", path);
    }

    println!(
        "\nVocabulary seeds: {} colours, {} finishes",
        config.vocabulary.colors.len(),
        config.vocabulary.finishes.len()
    );

    println!("\nSites ({}):", sites.len());
    for site in sites {
        println!(
            "  - {} [{}] brand={} type={} entry={}",
            site.name,
            site.domain_allowlist.join(", "),
            site.brand.name,
            site.item_type,
            site.entry_handler
        );
        for seed in &site.start_urls {
            println!("    * {}", seed);
        }
        println!("    item: {}", site.rules.item_selector);
        println!("    name: {}", site.rules.name_selector);
        if !site.rules.next_page_selectors.is_empty() {
            println!("    next: {}", site.rules.next_page_selectors.join(" | "));
        }
        for pattern in &site.rules.code_patterns {
            println!("    code: {} (pad {})", pattern.pattern, pattern.pad_width);
        }
        let table = SizeTable::from_entries(&site.sizes);
        let sizes: Vec<String> = table
            .rows()
            .iter()
            .map(|(prefix, label)| format!("{}→{}", prefix, label))
            .collect();
        println!("    sizes: {}", sizes.join(", "));
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs",
        sites.iter().map(|s| s.start_urls.len()).sum::<usize>()
    );
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage, 10)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
///
/// Every selected site gets its own driver on its own task; they share the
/// catalog store and the vocabulary snapshot only.
async fn handle_crawl(config: Config, config_hash: String, filter: &[String]) -> anyhow::Result<()> {
    let storage = open_storage(Path::new(&config.output.database_path))?;
    let store: SharedStore = Arc::new(Mutex::new(storage));
    let vocabulary = prepare_vocabulary(&store, &config.vocabulary)?;

    let stop = StopSignal::new();
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping after the current page");
                stop.raise();
            }
        });
    }

    let config = Arc::new(config);
    let config_hash = Arc::new(config_hash);
    let names: Vec<String> = select_sites(&config, filter)?
        .iter()
        .map(|site| site.name.clone())
        .collect();

    let mut handles = Vec::with_capacity(names.len());
    for name in names {
        let config = Arc::clone(&config);
        let config_hash = Arc::clone(&config_hash);
        let store = Arc::clone(&store);
        let vocabulary = Arc::clone(&vocabulary);
        let stop = stop.clone();
        let span = tracing::info_span!("site", name = %name);

        let handle = tokio::spawn(
            async move {
                match config.site(&name) {
                    Some(site) => {
                        crawl_site(&config, site, &config_hash, store, vocabulary, stop).await
                    }
                    None => Ok(RunSummary::new(&name)),
                }
            }
            .instrument(span),
        );
        handles.push(handle);
    }

    let mut summaries = Vec::with_capacity(handles.len());
    let mut failures = 0usize;
    for handle in handles {
        match handle.await {
            Ok(Ok(summary)) => {
                println!("{}", summary);
                summaries.push(summary);
            }
            Ok(Err(e)) => {
                tracing::error!("Site run failed: {}", e);
                failures += 1;
            }
            Err(e) => {
                tracing::error!("Site task panicked: {}", e);
                failures += 1;
            }
        }
    }

    if let Some(path) = &config.output.summary_path {
        let stats = {
            let guard = store
                .lock()
                .map_err(|_| anyhow::anyhow!("catalog store lock poisoned"))?;
            load_statistics(&*guard, 10)?
        };
        write_markdown_report(&summaries, &stats, &config_hash, Path::new(path))
            .with_context(|| format!("failed to write report to {}", path))?;
        tracing::info!("Report written to {}", path);
    }

    if failures > 0 {
        bail!("{} site run(s) failed", failures);
    }
    tracing::info!("Crawl completed successfully");
    Ok(())
}
