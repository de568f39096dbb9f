//! Database schema definitions
//!
//! Every catalog entity carries a UNIQUE constraint on its natural key, which
//! is what makes resolve-or-create safe under repetition and across
//! concurrent site runs.

/// SQL schema for the catalog database
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS brands (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL COLLATE NOCASE,
    homepage TEXT,
    created_at TEXT NOT NULL,
    UNIQUE(name)
);

CREATE TABLE IF NOT EXISTS types (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    brand_id INTEGER NOT NULL REFERENCES brands(id),
    name TEXT NOT NULL COLLATE NOCASE,
    created_at TEXT NOT NULL,
    UNIQUE(brand_id, name)
);

CREATE TABLE IF NOT EXISTS sizes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    brand_id INTEGER NOT NULL REFERENCES brands(id),
    type_id INTEGER NOT NULL REFERENCES types(id),
    label TEXT NOT NULL COLLATE NOCASE,
    created_at TEXT NOT NULL,
    UNIQUE(brand_id, type_id, label)
);

CREATE TABLE IF NOT EXISTS colors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL COLLATE NOCASE,
    created_at TEXT NOT NULL,
    UNIQUE(name)
);

CREATE TABLE IF NOT EXISTS finishes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL COLLATE NOCASE,
    created_at TEXT NOT NULL,
    UNIQUE(name)
);

CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    brand_id INTEGER NOT NULL REFERENCES brands(id),
    product_code TEXT NOT NULL,
    type_id INTEGER NOT NULL REFERENCES types(id),
    size_id INTEGER NOT NULL REFERENCES sizes(id),
    name TEXT NOT NULL,
    image_url TEXT,
    price TEXT,
    source_url TEXT NOT NULL,
    description TEXT,
    shape TEXT,
    glass_group TEXT,
    dyed TEXT,
    galvanized TEXT,
    plating TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(brand_id, product_code)
);

CREATE INDEX IF NOT EXISTS idx_items_type ON items(type_id);
CREATE INDEX IF NOT EXISTS idx_items_size ON items(size_id);

CREATE TABLE IF NOT EXISTS item_colors (
    item_id INTEGER NOT NULL REFERENCES items(id),
    color_id INTEGER NOT NULL REFERENCES colors(id),
    UNIQUE(item_id, color_id)
);

CREATE TABLE IF NOT EXISTS item_finishes (
    item_id INTEGER NOT NULL REFERENCES items(id),
    finish_id INTEGER NOT NULL REFERENCES finishes(id),
    UNIQUE(item_id, finish_id)
);

-- One row per site run
CREATE TABLE IF NOT EXISTS crawl_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site TEXT NOT NULL,
    config_hash TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    status TEXT NOT NULL,
    items_seen INTEGER NOT NULL DEFAULT 0,
    items_skipped INTEGER NOT NULL DEFAULT 0,
    items_upserted INTEGER NOT NULL DEFAULT 0,
    pages_fetched INTEGER NOT NULL DEFAULT 0,
    pages_followed INTEGER NOT NULL DEFAULT 0,
    errors INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_crawl_runs_site ON crawl_runs(site);
"#;

/// Detail columns added to `items` after its first release
const ITEM_DETAIL_COLUMNS: &[&str] = &[
    "description",
    "shape",
    "glass_group",
    "dyed",
    "galvanized",
    "plating",
];

/// Initializes the database schema
///
/// Catalogs created before the detail columns existed get them added.
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    add_missing_item_columns(conn)?;
    Ok(())
}

fn add_missing_item_columns(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    let mut stmt = conn.prepare("PRAGMA table_info(items)")?;
    let existing = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;

    for column in ITEM_DETAIL_COLUMNS {
        if !existing.iter().any(|name| name == column) {
            conn.execute_batch(&format!("ALTER TABLE items ADD COLUMN {} TEXT", column))?;
        }
    }
    Ok(())
}
