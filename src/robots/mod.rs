//! Robots.txt handling module
//!
//! robots.txt is fetched once per origin per site run and consulted before
//! every request when `obey-robots` is set.

mod parser;

pub use parser::{RobotsRules, MAX_CRAWL_DELAY_SECS};

use reqwest::Client;
use std::collections::HashMap;
use tracing::{debug, info};
use url::Url;

/// Fetches and parses robots.txt for the origin of `url`
///
/// A missing file, an error status or a network failure all yield
/// [`RobotsRules::allow_all`].
pub async fn fetch_robots(client: &Client, url: &Url) -> RobotsRules {
    let robots_url = match url.join("/robots.txt") {
        Ok(robots_url) => robots_url,
        Err(_) => return RobotsRules::allow_all(),
    };

    let response = match client.get(robots_url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            debug!(url = %robots_url, error = %e, "robots.txt unreachable, allowing all");
            return RobotsRules::allow_all();
        }
    };

    if !response.status().is_success() {
        debug!(url = %robots_url, status = %response.status(), "No robots.txt, allowing all");
        return RobotsRules::allow_all();
    }

    match response.text().await {
        Ok(body) => {
            info!(url = %robots_url, "Loaded robots.txt");
            RobotsRules::from_content(&body)
        }
        Err(_) => RobotsRules::allow_all(),
    }
}

/// What robots.txt says about one URL
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotsVerdict {
    pub allowed: bool,
    pub crawl_delay: Option<f64>,
}

/// Per-run cache of robots.txt rules keyed by origin
pub struct RobotsCache {
    agent: String,
    entries: HashMap<String, RobotsRules>,
}

impl RobotsCache {
    /// `agent` is the product token matched against `User-agent` lines
    pub fn new(agent: &str) -> Self {
        Self {
            agent: agent.to_string(),
            entries: HashMap::new(),
        }
    }

    /// Checks a URL, fetching its origin's robots.txt on first use
    pub async fn check(&mut self, client: &Client, url: &Url) -> RobotsVerdict {
        let origin = url.origin().ascii_serialization();
        if !self.entries.contains_key(&origin) {
            let rules = fetch_robots(client, url).await;
            self.entries.insert(origin.clone(), rules);
        }

        match self.entries.get(&origin) {
            Some(rules) => RobotsVerdict {
                allowed: rules.is_allowed(url.as_str(), &self.agent),
                crawl_delay: rules.crawl_delay(&self.agent),
            },
            None => RobotsVerdict {
                allowed: true,
                crawl_delay: None,
            },
        }
    }
}
