//! Per-run counters

use std::fmt;
use std::time::Duration;

/// Counters of one site run
///
/// `items_seen` counts every listing entry looked at. Entries resolved on the
/// listing page land in one of `items_upserted`, `items_skipped`, or `errors`
/// (persistence failures). Entries deferred to a detail page are only counted
/// again if that page is fetched; a detail URL already in the frontier, outside
/// the allowlist, disallowed by robots.txt, or lost to a dropped branch leaves
/// its entry in no bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub site: String,
    pub items_seen: u64,
    pub items_skipped: u64,
    pub items_upserted: u64,
    /// Pages fetched successfully
    pub pages_fetched: u64,
    /// Next-page links enqueued
    pub pages_followed: u64,
    /// Abandoned branches plus items that failed to persist
    pub errors: u64,

    // Breakdowns
    pub unrecognized: u64,
    pub malformed: u64,
    pub branches_dropped: u64,
    pub persistence_failures: u64,

    pub interrupted: bool,
    pub duration: Duration,
}

impl RunSummary {
    pub fn new(site: &str) -> Self {
        Self {
            site: site.to_string(),
            ..Self::default()
        }
    }

    pub fn record_skips(&mut self, unrecognized: u64, malformed: u64) {
        self.items_skipped += unrecognized + malformed;
        self.unrecognized += unrecognized;
        self.malformed += malformed;
    }

    pub fn record_dropped_branch(&mut self) {
        self.errors += 1;
        self.branches_dropped += 1;
    }

    pub fn record_persistence_failure(&mut self) {
        self.errors += 1;
        self.persistence_failures += 1;
    }

    /// Percentage of seen items that were skipped
    pub fn skip_rate(&self) -> f64 {
        if self.items_seen == 0 {
            0.0
        } else {
            self.items_skipped as f64 / self.items_seen as f64 * 100.0
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: seen={} skipped={} upserted={} pages={} followed={} errors={}{}",
            self.site,
            self.items_seen,
            self.items_skipped,
            self.items_upserted,
            self.pages_fetched,
            self.pages_followed,
            self.errors,
            if self.interrupted { " (interrupted)" } else { "" }
        )
    }
}
