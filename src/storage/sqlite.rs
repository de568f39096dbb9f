//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of [`CatalogStore`].
//! Resolve-or-create is `INSERT ... ON CONFLICT DO NOTHING` followed by a
//! `SELECT` on the same natural key.

use crate::normalize::VocabularyDomain;
use crate::output::RunSummary;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CatalogStore, StorageError, StorageResult, VocabularySource};
use crate::storage::{
    CrawlRunRecord, EntityKey, EntityKind, ItemAttributes, ItemDetails, Link, RunStatus, StoredItem,
};
use crate::HarvestError;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteCatalogStore {
    conn: Connection,
}

impl SqliteCatalogStore {
    /// Opens or creates the database file and applies the schema
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn insert_ignoring_duplicates(&self, key: &EntityKey<'_>) -> rusqlite::Result<usize> {
        let now = Utc::now().to_rfc3339();
        match *key {
            EntityKey::Brand { name, homepage } => self.conn.execute(
                "INSERT INTO brands (name, homepage, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(name) DO NOTHING",
                params![name, homepage, now],
            ),
            EntityKey::Type { brand_id, name } => self.conn.execute(
                "INSERT INTO types (brand_id, name, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(brand_id, name) DO NOTHING",
                params![brand_id, name, now],
            ),
            EntityKey::Size {
                brand_id,
                type_id,
                label,
            } => self.conn.execute(
                "INSERT INTO sizes (brand_id, type_id, label, created_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(brand_id, type_id, label) DO NOTHING",
                params![brand_id, type_id, label, now],
            ),
            EntityKey::Color { name } => self.conn.execute(
                "INSERT INTO colors (name, created_at) VALUES (?1, ?2)
                 ON CONFLICT(name) DO NOTHING",
                params![name, now],
            ),
            EntityKey::Finish { name } => self.conn.execute(
                "INSERT INTO finishes (name, created_at) VALUES (?1, ?2)
                 ON CONFLICT(name) DO NOTHING",
                params![name, now],
            ),
            EntityKey::Item {
                brand_id,
                product_code,
                attrs,
            } => self.conn.execute(
                "INSERT INTO items (brand_id, product_code, type_id, size_id, name, image_url,
                                    price, source_url, description, shape, glass_group,
                                    dyed, galvanized, plating, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)
                 ON CONFLICT(brand_id, product_code) DO NOTHING",
                params![
                    brand_id,
                    product_code,
                    attrs.type_id,
                    attrs.size_id,
                    attrs.name,
                    attrs.image_url,
                    attrs.price,
                    attrs.source_url,
                    attrs.details.description,
                    attrs.details.shape,
                    attrs.details.glass_group,
                    attrs.details.dyed,
                    attrs.details.galvanized,
                    attrs.details.plating,
                    now
                ],
            ),
        }
    }

    fn lookup(&self, key: &EntityKey<'_>) -> rusqlite::Result<Option<i64>> {
        let id_of = |row: &Row<'_>| row.get::<_, i64>(0);
        let found = match *key {
            EntityKey::Brand { name, .. } => self
                .conn
                .query_row("SELECT id FROM brands WHERE name = ?1", params![name], id_of),
            EntityKey::Type { brand_id, name } => self.conn.query_row(
                "SELECT id FROM types WHERE brand_id = ?1 AND name = ?2",
                params![brand_id, name],
                id_of,
            ),
            EntityKey::Size {
                brand_id,
                type_id,
                label,
            } => self.conn.query_row(
                "SELECT id FROM sizes WHERE brand_id = ?1 AND type_id = ?2 AND label = ?3",
                params![brand_id, type_id, label],
                id_of,
            ),
            EntityKey::Color { name } => self
                .conn
                .query_row("SELECT id FROM colors WHERE name = ?1", params![name], id_of),
            EntityKey::Finish { name } => self
                .conn
                .query_row("SELECT id FROM finishes WHERE name = ?1", params![name], id_of),
            EntityKey::Item {
                brand_id,
                product_code,
                ..
            } => self.conn.query_row(
                "SELECT id FROM items WHERE brand_id = ?1 AND product_code = ?2",
                params![brand_id, product_code],
                id_of,
            ),
        };
        found.optional()
    }

    fn attribute_names(&self, sql: &str, item_id: i64) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let names = stmt
            .query_map(params![item_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

/// Separates constraint failures from other SQLite errors
fn classify_write_error(error: rusqlite::Error) -> StorageError {
    match error {
        rusqlite::Error::SqliteFailure(inner, message)
            if inner.code == ErrorCode::ConstraintViolation =>
        {
            StorageError::ConstraintViolation(message.unwrap_or_else(|| inner.to_string()))
        }
        other => StorageError::Sqlite(other),
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<CrawlRunRecord> {
    Ok(CrawlRunRecord {
        id: row.get(0)?,
        site: row.get(1)?,
        config_hash: row.get(2)?,
        started_at: row.get(3)?,
        finished_at: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?).unwrap_or(RunStatus::Failed),
        items_seen: row.get::<_, i64>(6)? as u64,
        items_skipped: row.get::<_, i64>(7)? as u64,
        items_upserted: row.get::<_, i64>(8)? as u64,
        pages_fetched: row.get::<_, i64>(9)? as u64,
        pages_followed: row.get::<_, i64>(10)? as u64,
        errors: row.get::<_, i64>(11)? as u64,
    })
}

const RUN_COLUMNS: &str = "id, site, config_hash, started_at, finished_at, status, items_seen, \
     items_skipped, items_upserted, pages_fetched, pages_followed, errors";

impl VocabularySource for SqliteCatalogStore {
    fn list_all_names(&self, domain: VocabularyDomain) -> StorageResult<Vec<String>> {
        let sql = match domain {
            VocabularyDomain::Color => "SELECT name FROM colors ORDER BY name",
            VocabularyDomain::Finish => "SELECT name FROM finishes ORDER BY name",
        };
        let mut stmt = self.conn.prepare(sql)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

impl CatalogStore for SqliteCatalogStore {
    // ===== Entities =====

    fn find_or_create(&mut self, key: &EntityKey<'_>) -> StorageResult<i64> {
        self.insert_ignoring_duplicates(key)
            .map_err(classify_write_error)?;

        self.lookup(key)?.ok_or_else(|| {
            StorageError::ConstraintViolation(format!(
                "{} '{}' was neither inserted nor found",
                key.kind().label(),
                key.describe()
            ))
        })
    }

    fn find(&self, key: &EntityKey<'_>) -> StorageResult<Option<i64>> {
        Ok(self.lookup(key)?)
    }

    fn update_item(&mut self, item_id: i64, attrs: &ItemAttributes) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let changed = self
            .conn
            .execute(
                "UPDATE items SET type_id = ?1, size_id = ?2, name = ?3, image_url = ?4,
                        price = ?5, source_url = ?6,
                        description = COALESCE(?7, description),
                        shape = COALESCE(?8, shape),
                        glass_group = COALESCE(?9, glass_group),
                        dyed = COALESCE(?10, dyed),
                        galvanized = COALESCE(?11, galvanized),
                        plating = COALESCE(?12, plating),
                        updated_at = ?13
                 WHERE id = ?14",
                params![
                    attrs.type_id,
                    attrs.size_id,
                    attrs.name,
                    attrs.image_url,
                    attrs.price,
                    attrs.source_url,
                    attrs.details.description,
                    attrs.details.shape,
                    attrs.details.glass_group,
                    attrs.details.dyed,
                    attrs.details.galvanized,
                    attrs.details.plating,
                    now,
                    item_id
                ],
            )
            .map_err(classify_write_error)?;

        if changed == 0 {
            return Err(StorageError::Database(format!("item {} does not exist", item_id)));
        }
        Ok(())
    }

    fn link(&mut self, link: Link) -> StorageResult<bool> {
        let inserted = match link {
            Link::Color { item_id, color_id } => self.conn.execute(
                "INSERT INTO item_colors (item_id, color_id) VALUES (?1, ?2)
                 ON CONFLICT(item_id, color_id) DO NOTHING",
                params![item_id, color_id],
            ),
            Link::Finish { item_id, finish_id } => self.conn.execute(
                "INSERT INTO item_finishes (item_id, finish_id) VALUES (?1, ?2)
                 ON CONFLICT(item_id, finish_id) DO NOTHING",
                params![item_id, finish_id],
            ),
        }
        .map_err(classify_write_error)?;

        Ok(inserted > 0)
    }

    // ===== Queries =====

    fn get_item(&self, brand: &str, product_code: &str) -> StorageResult<Option<StoredItem>> {
        let item = self
            .conn
            .query_row(
                "SELECT i.id, b.name, i.product_code, t.name, s.label, i.name, i.image_url,
                        i.price, i.source_url, i.created_at, i.updated_at, i.description,
                        i.shape, i.glass_group, i.dyed, i.galvanized, i.plating
                 FROM items i
                 JOIN brands b ON b.id = i.brand_id
                 JOIN types t ON t.id = i.type_id
                 JOIN sizes s ON s.id = i.size_id
                 WHERE b.name = ?1 AND i.product_code = ?2",
                params![brand, product_code],
                |row| {
                    Ok(StoredItem {
                        id: row.get(0)?,
                        brand: row.get(1)?,
                        product_code: row.get(2)?,
                        type_name: row.get(3)?,
                        size_label: row.get(4)?,
                        name: row.get(5)?,
                        image_url: row.get(6)?,
                        price: row.get(7)?,
                        source_url: row.get(8)?,
                        details: ItemDetails {
                            description: row.get(11)?,
                            shape: row.get(12)?,
                            glass_group: row.get(13)?,
                            dyed: row.get(14)?,
                            galvanized: row.get(15)?,
                            plating: row.get(16)?,
                        },
                        created_at: row.get(9)?,
                        updated_at: row.get(10)?,
                        colors: Vec::new(),
                        finishes: Vec::new(),
                    })
                },
            )
            .optional()?;

        let Some(mut item) = item else {
            return Ok(None);
        };

        item.colors = self.attribute_names(
            "SELECT c.name FROM item_colors ic JOIN colors c ON c.id = ic.color_id
             WHERE ic.item_id = ?1 ORDER BY c.name",
            item.id,
        )?;
        item.finishes = self.attribute_names(
            "SELECT f.name FROM item_finishes itf JOIN finishes f ON f.id = itf.finish_id
             WHERE itf.item_id = ?1 ORDER BY f.name",
            item.id,
        )?;

        Ok(Some(item))
    }

    fn count(&self, kind: EntityKind) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", kind.table_name()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Run Management =====

    fn create_run(&mut self, site: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO crawl_runs (site, config_hash, started_at, status) VALUES (?1, ?2, ?3, ?4)",
            params![site, config_hash, now, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        summary: &RunSummary,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE crawl_runs SET status = ?1, finished_at = ?2, items_seen = ?3,
                    items_skipped = ?4, items_upserted = ?5, pages_fetched = ?6,
                    pages_followed = ?7, errors = ?8
             WHERE id = ?9",
            params![
                status.to_db_string(),
                now,
                summary.items_seen as i64,
                summary.items_skipped as i64,
                summary.items_upserted as i64,
                summary.pages_fetched as i64,
                summary.pages_followed as i64,
                summary.errors as i64,
                run_id
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<CrawlRunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM crawl_runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<CrawlRunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM crawl_runs ORDER BY id DESC LIMIT ?1",
            RUN_COLUMNS
        ))?;
        let runs = stmt
            .query_map(params![limit as i64], run_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }
}
