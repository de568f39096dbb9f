//! Storage traits and error types
//!
//! [`CatalogStore`] is the persistence contract the upsert gateway runs
//! against; [`VocabularySource`] is the read-only slice the normalizer needs.

use crate::normalize::VocabularyDomain;
use crate::output::RunSummary;
use crate::storage::{CrawlRunRecord, EntityKey, EntityKind, ItemAttributes, Link, RunStatus, StoredItem};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A uniqueness (or other) constraint rejected a write
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Read-only access to the canonical vocabularies
pub trait VocabularySource {
    /// All names of one domain, in any order
    fn list_all_names(&self, domain: VocabularyDomain) -> StorageResult<Vec<String>>;
}

/// Catalog persistence backed by natural-key uniqueness constraints
pub trait CatalogStore: VocabularySource {
    // ===== Entities =====

    /// Returns the id of the entity with this natural key, creating it if absent
    ///
    /// Implementations must be a single atomic insert-or-ignore followed by a
    /// fetch, never a check followed by an insert.
    ///
    /// # Returns
    ///
    /// * `Err(StorageError::ConstraintViolation)` - The write was rejected and no row could be read back
    fn find_or_create(&mut self, key: &EntityKey<'_>) -> StorageResult<i64>;

    /// Looks up an entity by natural key without writing
    fn find(&self, key: &EntityKey<'_>) -> StorageResult<Option<i64>>;

    /// Overwrites the mutable fields of an item and bumps `updated_at`
    fn update_item(&mut self, item_id: i64, attrs: &ItemAttributes) -> StorageResult<()>;

    /// Creates an item/attribute link if missing
    ///
    /// # Returns
    ///
    /// `true` when a new link row was written
    fn link(&mut self, link: Link) -> StorageResult<bool>;

    // ===== Queries =====

    /// Loads an item with its resolved names and attribute sets
    fn get_item(&self, brand: &str, product_code: &str) -> StorageResult<Option<StoredItem>>;

    /// Row count of one entity table
    fn count(&self, kind: EntityKind) -> StorageResult<u64>;

    // ===== Run Management =====

    /// Records the start of a site run
    fn create_run(&mut self, site: &str, config_hash: &str) -> StorageResult<i64>;

    /// Stores the final status and counters of a site run
    fn finish_run(&mut self, run_id: i64, status: RunStatus, summary: &RunSummary) -> StorageResult<()>;

    fn get_run(&self, run_id: i64) -> StorageResult<CrawlRunRecord>;

    /// Most recent runs first
    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<CrawlRunRecord>>;
}
