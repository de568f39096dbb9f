//! Crawler module: the crawl-extract-persist loop of one site run
//!
//! This module contains:
//! - The FIFO frontier of fetch tasks
//! - HTTP fetching with bounded retry
//! - The parsed page wrapper handed to handlers
//! - The handler registry and the built-in crawl states
//! - Pagination following
//! - The crawl driver that ties them together

mod document;
mod driver;
mod fetcher;
mod frontier;
mod handlers;
mod pagination;
mod task;

pub use document::ParsedPage;
pub use driver::{seed_tasks, CrawlDriver, DriverSettings, StopSignal};
pub use fetcher::{build_http_client, FetchOutcome, Fetcher};
pub use frontier::Frontier;
pub use handlers::{
    DetailHandler, DirectoryHandler, HandlerOutput, HandlerRegistry, ListingHandler, PageHandler,
    SiteEnv, DETAIL, DIRECTORY, LISTING,
};
pub use pagination::PaginationFollower;
pub use task::{FetchTask, TaskContext};

use crate::catalog::{CatalogSink, SharedStore};
use crate::config::{Config, SiteConfig};
use crate::normalize::VocabularySnapshot;
use crate::output::RunSummary;
use crate::storage::RunStatus;
use crate::{HarvestError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Runs one site crawl end to end and records it in the run log
///
/// This is the main entry point for crawling a site. It will:
/// 1. Compile the site's rules against the vocabulary snapshot
/// 2. Record the run as started
/// 3. Build the HTTP client and driver
/// 4. Crawl from the site's seed URLs
/// 5. Record the final status and counters
///
/// # Returns
///
/// * `Ok(RunSummary)` - Crawl completed or was interrupted
/// * `Err(HarvestError)` - Crawl failed; the run is recorded as failed
pub async fn crawl_site(
    config: &Config,
    site: &SiteConfig,
    config_hash: &str,
    store: SharedStore,
    vocabulary: Arc<VocabularySnapshot>,
    stop: StopSignal,
) -> Result<RunSummary> {
    let env = Arc::new(SiteEnv::from_config(site, vocabulary)?);
    let client = build_http_client(&config.user_agent, config.crawler.request_timeout_seconds)?;
    let fetcher = Fetcher::new(
        client,
        config.crawler.max_retries,
        Duration::from_millis(config.crawler.retry_backoff_ms),
    );
    let seeds = seed_tasks(site)?;

    let run_id = store
        .lock()
        .map_err(|_| HarvestError::StorePoisoned)?
        .create_run(&site.name, config_hash)?;

    let mut driver = CrawlDriver::new(
        env,
        HandlerRegistry::with_builtins(),
        fetcher,
        Box::new(CatalogSink::new(store.clone())),
        DriverSettings::from_config(config),
        stop,
    );
    let result = driver.run(seeds).await;

    let (status, summary) = match &result {
        Ok(summary) if summary.interrupted => (RunStatus::Interrupted, summary.clone()),
        Ok(summary) => (RunStatus::Completed, summary.clone()),
        Err(e) => {
            tracing::error!("Crawl of {} failed: {}", site.name, e);
            (RunStatus::Failed, RunSummary::new(&site.name))
        }
    };
    store
        .lock()
        .map_err(|_| HarvestError::StorePoisoned)?
        .finish_run(run_id, status, &summary)?;

    result
}
