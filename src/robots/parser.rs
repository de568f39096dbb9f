//! robots.txt rules backed by the `robotstxt` matcher

use robotstxt::DefaultMatcher;
use tracing::warn;

/// Largest `Crawl-delay` honoured, in seconds
pub const MAX_CRAWL_DELAY_SECS: f64 = 60.0;

/// Rules of one host's robots.txt
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    /// Raw robots.txt content; empty means everything is allowed
    content: String,
}

impl RobotsRules {
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Rules that allow everything, used when robots.txt is missing or unreadable
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Checks a full URL against the rules for `agent`
    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, agent, url)
    }

    /// `Crawl-delay` in seconds for `agent`
    ///
    /// A group naming the agent wins over the `*` group. A group is a run of
    /// `User-agent` lines followed by its rule lines. Values above
    /// [`MAX_CRAWL_DELAY_SECS`] are clamped.
    pub fn crawl_delay(&self, agent: &str) -> Option<f64> {
        let agent = agent.to_lowercase();
        let mut group: Vec<String> = Vec::new();
        let mut in_rules = false;
        let mut specific = None;
        let mut wildcard = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_ascii_lowercase().as_str() {
                "user-agent" => {
                    if in_rules {
                        group.clear();
                        in_rules = false;
                    }
                    if !value.is_empty() {
                        group.push(value.to_lowercase());
                    }
                }
                "crawl-delay" => {
                    in_rules = true;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if delay.is_nan() || delay < 0.0 {
                        continue;
                    }
                    let delay = if delay > MAX_CRAWL_DELAY_SECS {
                        warn!(requested = delay, "Crawl-delay too large, clamping to {}s", MAX_CRAWL_DELAY_SECS);
                        MAX_CRAWL_DELAY_SECS
                    } else {
                        delay
                    };
                    for token in &group {
                        if token == "*" {
                            wildcard.get_or_insert(delay);
                        } else if agent.contains(token.as_str()) {
                            specific.get_or_insert(delay);
                        }
                    }
                }
                _ => in_rules = true,
            }
        }

        specific.or(wildcard)
    }
}
