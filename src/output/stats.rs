//! Catalog statistics from the database

use crate::storage::{CatalogStore, CrawlRunRecord, EntityKind};
use crate::HarvestError;

/// Row counts per entity plus the latest runs
#[derive(Debug, Clone)]
pub struct CatalogStatistics {
    pub counts: Vec<(EntityKind, u64)>,
    pub recent_runs: Vec<CrawlRunRecord>,
}

impl CatalogStatistics {
    pub fn count(&self, kind: EntityKind) -> u64 {
        self.counts
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The catalog store to query
/// * `run_limit` - How many recent runs to include
pub fn load_statistics(
    storage: &dyn CatalogStore,
    run_limit: usize,
) -> Result<CatalogStatistics, HarvestError> {
    let mut counts = Vec::with_capacity(EntityKind::ALL.len());
    for kind in EntityKind::ALL {
        counts.push((kind, storage.count(kind)?));
    }

    Ok(CatalogStatistics {
        counts,
        recent_runs: storage.recent_runs(run_limit)?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CatalogStatistics) {
    println!("=== Catalog Statistics ===\n");

    for (kind, count) in &stats.counts {
        println!("  {:<8} {}", format!("{}s:", kind.label()), count);
    }
    println!();

    if stats.recent_runs.is_empty() {
        println!("No crawl runs recorded.");
        return;
    }

    println!("Recent Runs:");
    for run in &stats.recent_runs {
        println!(
            "  #{} {} [{}] started {} seen={} skipped={} upserted={} errors={}",
            run.id,
            run.site,
            run.status.to_db_string(),
            run.started_at,
            run.items_seen,
            run.items_skipped,
            run.items_upserted,
            run.errors
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{EntityKey, SqliteCatalogStore};

    #[test]
    fn test_load_statistics() {
        let mut store = SqliteCatalogStore::new_in_memory().unwrap();
        store.find_or_create(&EntityKey::Color { name: "Red" }).unwrap();
        store.find_or_create(&EntityKey::Color { name: "Blue" }).unwrap();
        store.create_run("shop", "hash").unwrap();

        let stats = load_statistics(&store, 10).unwrap();
        assert_eq!(stats.count(EntityKind::Color), 2);
        assert_eq!(stats.count(EntityKind::Item), 0);
        assert_eq!(stats.counts.len(), 6);
        assert_eq!(stats.recent_runs.len(), 1);
    }
}
