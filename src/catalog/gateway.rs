//! Upsert persistence gateway
//!
//! Resolves or creates every entity an [`ItemRecord`] references, then the
//! item itself, refreshes its mutable fields and adds missing attribute
//! links. Links are only ever added; an attribute that disappears from a
//! source page keeps its existing link.

use crate::catalog::ItemRecord;
use crate::storage::{CatalogStore, EntityKey, ItemAttributes, Link, StorageError};
use crate::HarvestError;
use tracing::{debug, warn};

/// What one upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertReport {
    pub item_id: i64,
    pub links_added: usize,
}

pub struct UpsertGateway<'a> {
    store: &'a mut dyn CatalogStore,
}

impl<'a> UpsertGateway<'a> {
    pub fn new(store: &'a mut dyn CatalogStore) -> Self {
        Self { store }
    }

    /// Resolve-or-create with one lookup retry on a uniqueness conflict
    ///
    /// # Returns
    ///
    /// * `Err(HarvestError::PersistenceConflict)` - The conflict persisted and no row exists
    pub fn resolve(&mut self, key: &EntityKey<'_>) -> Result<i64, HarvestError> {
        match self.store.find_or_create(key) {
            Ok(id) => Ok(id),
            Err(StorageError::ConstraintViolation(message)) => {
                debug!(
                    entity = key.kind().label(),
                    key = %key.describe(),
                    %message,
                    "Constraint conflict, retrying as lookup"
                );
                match self.store.find(key)? {
                    Some(id) => Ok(id),
                    None => {
                        warn!(
                            entity = key.kind().label(),
                            key = %key.describe(),
                            "Entity could not be resolved after conflict"
                        );
                        Err(HarvestError::PersistenceConflict {
                            entity: key.kind().label(),
                            key: key.describe(),
                        })
                    }
                }
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Persists one item record
    ///
    /// Safe to repeat: running it N times leaves one row per natural key.
    pub fn upsert(&mut self, record: &ItemRecord) -> Result<UpsertReport, HarvestError> {
        let brand_id = self.resolve(&EntityKey::Brand {
            name: &record.brand,
            homepage: record.brand_homepage.as_deref(),
        })?;
        let type_id = self.resolve(&EntityKey::Type {
            brand_id,
            name: &record.type_name,
        })?;
        let size_id = self.resolve(&EntityKey::Size {
            brand_id,
            type_id,
            label: &record.size_label,
        })?;

        let mut color_ids = Vec::with_capacity(record.colors.len());
        for name in &record.colors {
            color_ids.push(self.resolve(&EntityKey::Color { name })?);
        }
        let mut finish_ids = Vec::with_capacity(record.finishes.len());
        for name in &record.finishes {
            finish_ids.push(self.resolve(&EntityKey::Finish { name })?);
        }

        let attrs = ItemAttributes {
            type_id,
            size_id,
            name: record.name.clone(),
            image_url: record.image_url.clone(),
            price: record.price.clone(),
            source_url: record.source_url.clone(),
            details: record.details.clone(),
        };
        let item_id = self.resolve(&EntityKey::Item {
            brand_id,
            product_code: &record.product_code,
            attrs: &attrs,
        })?;
        self.store.update_item(item_id, &attrs)?;

        let mut links_added = 0;
        for color_id in color_ids {
            if self.store.link(Link::Color { item_id, color_id })? {
                links_added += 1;
            }
        }
        for finish_id in finish_ids {
            if self.store.link(Link::Finish { item_id, finish_id })? {
                links_added += 1;
            }
        }

        debug!(code = %record.product_code, item_id, links_added, "Upserted item");
        Ok(UpsertReport {
            item_id,
            links_added,
        })
    }

    /// Resolve-or-creates the configured vocabulary seed entries
    ///
    /// # Returns
    ///
    /// Number of seed names processed
    pub fn seed_vocabulary(
        &mut self,
        colors: &[String],
        finishes: &[String],
    ) -> Result<usize, HarvestError> {
        for name in colors.iter().filter(|n| !n.trim().is_empty()) {
            self.resolve(&EntityKey::Color { name: name.trim() })?;
        }
        for name in finishes.iter().filter(|n| !n.trim().is_empty()) {
            self.resolve(&EntityKey::Finish { name: name.trim() })?;
        }
        Ok(colors.len() + finishes.len())
    }
}
