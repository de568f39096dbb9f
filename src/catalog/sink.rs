use crate::catalog::{ItemRecord, UpsertGateway, UpsertReport};
use crate::storage::CatalogStore;
use crate::HarvestError;
use std::sync::{Arc, Mutex};

/// Catalog store shared between concurrent site runs
pub type SharedStore = Arc<Mutex<dyn CatalogStore + Send>>;

/// Receives the records a handler emits, before the next page is fetched
pub trait RecordSink: Send {
    fn accept(&mut self, record: &ItemRecord) -> Result<UpsertReport, HarvestError>;
}

/// Sink that upserts every record into the shared catalog store
pub struct CatalogSink {
    store: SharedStore,
}

impl CatalogSink {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

impl RecordSink for CatalogSink {
    fn accept(&mut self, record: &ItemRecord) -> Result<UpsertReport, HarvestError> {
        let mut guard = self.store.lock().map_err(|_| HarvestError::StorePoisoned)?;
        UpsertGateway::new(&mut *guard).upsert(record)
    }
}
