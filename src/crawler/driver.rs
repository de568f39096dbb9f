//! Crawl driver: owns the frontier of one site run
//!
//! Fetches are strictly sequential and separated by the politeness delay.
//! Each fetched page is parsed, handed to its named handler, and every record
//! the handler returns is sunk before the next task is dequeued.

use crate::catalog::RecordSink;
use crate::config::{Config, SiteConfig};
use crate::crawler::{
    FetchOutcome, FetchTask, Fetcher, Frontier, HandlerOutput, HandlerRegistry, ParsedPage,
    SiteEnv,
};
use crate::output::RunSummary;
use crate::robots::RobotsCache;
use crate::url::is_allowed;
use crate::{HarvestError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// External cancellation flag, checked between tasks
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Run-wide knobs of a driver
#[derive(Debug, Clone)]
pub struct DriverSettings {
    /// Minimum wait between two fetches
    pub request_delay: Duration,
    /// 0 means unlimited
    pub max_pages: u32,
    pub obey_robots: bool,
    /// Product token matched against robots.txt `User-agent` lines
    pub robots_agent: String,
}

impl DriverSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            request_delay: Duration::from_secs_f64(config.crawler.request_delay_seconds),
            max_pages: config.crawler.max_pages,
            obey_robots: config.crawler.obey_robots,
            robots_agent: config.user_agent.crawler_name.clone(),
        }
    }
}

/// Builds the seed tasks of a site, dispatched to its entry handler
pub fn seed_tasks(site: &SiteConfig) -> Result<Vec<FetchTask>> {
    let mut tasks = Vec::with_capacity(site.start_urls.len());
    for seed in &site.start_urls {
        tasks.push(FetchTask::new(Url::parse(seed)?, site.entry_handler.as_str()));
    }
    Ok(tasks)
}

/// Sequential crawl of one site
pub struct CrawlDriver {
    env: Arc<SiteEnv>,
    registry: HandlerRegistry,
    fetcher: Fetcher,
    sink: Box<dyn RecordSink>,
    settings: DriverSettings,
    stop: StopSignal,
    robots: RobotsCache,
}

impl CrawlDriver {
    pub fn new(
        env: Arc<SiteEnv>,
        registry: HandlerRegistry,
        fetcher: Fetcher,
        sink: Box<dyn RecordSink>,
        settings: DriverSettings,
        stop: StopSignal,
    ) -> Self {
        let robots = RobotsCache::new(&settings.robots_agent);
        Self {
            env,
            registry,
            fetcher,
            sink,
            settings,
            stop,
            robots,
        }
    }

    /// Runs the crawl until the frontier drains, the page limit is hit, or
    /// the stop signal is raised
    ///
    /// # Returns
    ///
    /// * `Ok(RunSummary)` - The run finished; per-branch and per-item failures are counted
    /// * `Err(HarvestError::SeedsUnreachable)` - Not one seed URL could be fetched
    /// * `Err(HarvestError::UnknownHandler)` - A task names a handler that is not registered
    pub async fn run(&mut self, seeds: Vec<FetchTask>) -> Result<RunSummary> {
        let start_time = Instant::now();
        let mut summary = RunSummary::new(&self.env.name);
        let mut frontier = Frontier::new();

        let mut seed_count = 0usize;
        for task in seeds {
            if frontier.push(task) {
                seed_count += 1;
            }
        }
        let mut seeds_failed = 0usize;
        let mut dequeued = 0usize;
        let mut requests = 0u32;

        info!(
            "Starting crawl of {} with {} seed URL(s)",
            self.env.name, seed_count
        );

        while let Some(task) = frontier.pop() {
            if self.stop.is_raised() {
                info!("Stop requested, {} task(s) left unprocessed", frontier.len() + 1);
                summary.interrupted = true;
                break;
            }
            if self.settings.max_pages > 0 && requests >= self.settings.max_pages {
                info!("Page limit of {} reached", self.settings.max_pages);
                break;
            }

            let is_seed = dequeued < seed_count;
            dequeued += 1;

            if !is_allowed(&task.url, &self.env.allowlist) {
                debug!(url = %task.url, "Outside the domain allowlist, skipping");
                if is_seed {
                    seeds_failed += 1;
                }
                continue;
            }

            let handler = self
                .registry
                .get(&task.handler)
                .ok_or_else(|| HarvestError::UnknownHandler(task.handler.clone()))?;

            let mut delay = self.settings.request_delay;
            if self.settings.obey_robots {
                let verdict = self.robots.check(self.fetcher.client(), &task.url).await;
                if !verdict.allowed {
                    info!(url = %task.url, "Disallowed by robots.txt, skipping");
                    if is_seed {
                        seeds_failed += 1;
                    }
                    continue;
                }
                if let Some(crawl_delay) = verdict
                    .crawl_delay
                    .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                {
                    delay = delay.max(crawl_delay);
                }
            }

            if requests > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            requests += 1;

            debug!(url = %task.url, handler = %task.handler, "Fetching");
            let (final_url, body) = match self.fetcher.fetch(&task.url).await {
                FetchOutcome::Success { final_url, body } => (final_url, body),
                FetchOutcome::HttpError { status_code } => {
                    warn!(url = %task.url, status = status_code, "Dropping branch after HTTP error");
                    summary.record_dropped_branch();
                    if is_seed {
                        seeds_failed += 1;
                    }
                    continue;
                }
                FetchOutcome::Exhausted {
                    attempts,
                    last_error,
                } => {
                    warn!(
                        url = %task.url,
                        attempts,
                        error = %last_error,
                        "Dropping branch after exhausting retries"
                    );
                    summary.record_dropped_branch();
                    if is_seed {
                        seeds_failed += 1;
                    }
                    continue;
                }
            };
            summary.pages_fetched += 1;

            // The parsed tree is not Send; it must be dropped before the next await
            let output = {
                let page = ParsedPage::parse(final_url, &body);
                handler.handle(&page, &task.context, &self.env)
            };

            self.absorb(output, &mut frontier, &mut summary);

            if summary.pages_fetched % 10 == 0 {
                let rate = summary.pages_fetched as f64 / start_time.elapsed().as_secs_f64();
                info!(
                    "Progress: {} pages fetched, {} in frontier, {:.2} pages/sec",
                    summary.pages_fetched,
                    frontier.len(),
                    rate
                );
            }
        }

        summary.duration = start_time.elapsed();

        if seed_count > 0 && seeds_failed == seed_count && summary.pages_fetched == 0 {
            return Err(HarvestError::SeedsUnreachable {
                site: self.env.name.clone(),
            });
        }

        info!("Finished {}", summary);
        Ok(summary)
    }

    /// Sinks a handler's records and queues its follow-up work
    fn absorb(&mut self, output: HandlerOutput, frontier: &mut Frontier, summary: &mut RunSummary) {
        summary.items_seen += output.items_seen;
        summary.record_skips(output.unrecognized, output.malformed);

        for record in &output.records {
            match self.sink.accept(record) {
                Ok(_) => summary.items_upserted += 1,
                Err(e) => {
                    warn!(code = %record.product_code, error = %e, "Failed to persist item");
                    summary.record_persistence_failure();
                }
            }
        }

        for task in output.tasks {
            if is_allowed(&task.url, &self.env.allowlist) {
                frontier.push(task);
            } else {
                debug!(url = %task.url, "Follow-up outside the domain allowlist, dropped");
            }
        }

        if let Some(next) = output.next_page {
            if is_allowed(&next.url, &self.env.allowlist) && frontier.push(next) {
                summary.pages_followed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_signal_shared_between_clones() {
        let signal = StopSignal::new();
        let clone = signal.clone();
        assert!(!signal.is_raised());
        clone.raise();
        assert!(signal.is_raised());
    }

    #[test]
    fn test_seed_tasks_use_entry_handler() {
        let site: SiteConfig = toml::from_str(
            r#"
name = "shop"
domain-allowlist = ["shop.example"]
start-urls = ["https://shop.example/a", "https://shop.example/b"]
entry-handler = "directory"
item-type = "Seed Bead"

[brand]
name = "Miyuki"

[rules]
item-selector = "li"
name-selector = "h3"
category-selector = "nav a"
"#,
        )
        .unwrap();

        let seeds = seed_tasks(&site).unwrap();
        assert_eq!(seeds.len(), 2);
        assert!(seeds.iter().all(|task| task.handler == "directory"));
        assert_eq!(seeds[1].url.path(), "/b");
    }
}
