//! Catalog persistence
//!
//! [`ItemRecord`]s flow from the handlers through a [`RecordSink`] into the
//! [`UpsertGateway`], which talks to a [`crate::storage::CatalogStore`].

mod gateway;
mod records;
mod sink;

pub use gateway::{UpsertGateway, UpsertReport};
pub use records::ItemRecord;
pub use sink::{CatalogSink, RecordSink, SharedStore};

use crate::config::VocabularyConfig;
use crate::normalize::VocabularySnapshot;
use crate::HarvestError;
use std::sync::Arc;

/// Seeds the configured vocabulary, then snapshots everything the store knows
///
/// The snapshot is read-only and shared by every site run of one crawl.
pub fn prepare_vocabulary(
    store: &SharedStore,
    seeds: &VocabularyConfig,
) -> Result<Arc<VocabularySnapshot>, HarvestError> {
    let mut guard = store.lock().map_err(|_| HarvestError::StorePoisoned)?;
    let seeded = UpsertGateway::new(&mut *guard).seed_vocabulary(&seeds.colors, &seeds.finishes)?;
    let snapshot = VocabularySnapshot::load(&*guard)?;
    tracing::info!(
        "Vocabulary ready: {} seed names, {} colours, {} finishes",
        seeded,
        snapshot.colors.len(),
        snapshot.finishes.len()
    );
    Ok(Arc::new(snapshot))
}
