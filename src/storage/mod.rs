//! Storage module for the bead catalog
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Resolve-or-create of catalog entities by natural key
//! - Item/colour and item/finish link rows
//! - Crawl run bookkeeping

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteCatalogStore;
pub use traits::{CatalogStore, StorageError, StorageResult, VocabularySource};

use crate::HarvestError;
use std::path::Path;

/// Opens (or creates) the catalog database at `path`
pub fn open_storage(path: &Path) -> Result<SqliteCatalogStore, HarvestError> {
    SqliteCatalogStore::new(path)
}

/// Catalog tables that hold entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Brand,
    Type,
    Size,
    Color,
    Finish,
    Item,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        Self::Brand,
        Self::Type,
        Self::Size,
        Self::Color,
        Self::Finish,
        Self::Item,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Brand => "brands",
            Self::Type => "types",
            Self::Size => "sizes",
            Self::Color => "colors",
            Self::Finish => "finishes",
            Self::Item => "items",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Brand => "brand",
            Self::Type => "type",
            Self::Size => "size",
            Self::Color => "color",
            Self::Finish => "finish",
            Self::Item => "item",
        }
    }
}

/// Free-text attributes read from an item's own page
///
/// A field left `None` by a later run keeps its stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDetails {
    pub description: Option<String>,
    pub shape: Option<String>,
    pub glass_group: Option<String>,
    pub dyed: Option<String>,
    pub galvanized: Option<String>,
    pub plating: Option<String>,
}

impl ItemDetails {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Mutable fields of an item, plus the references it is created with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemAttributes {
    pub type_id: i64,
    pub size_id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub source_url: String,
    pub details: ItemDetails,
}

/// Natural key of a catalog entity, with the attributes used on creation
#[derive(Debug, Clone, Copy)]
pub enum EntityKey<'a> {
    Brand {
        name: &'a str,
        homepage: Option<&'a str>,
    },
    Type {
        brand_id: i64,
        name: &'a str,
    },
    Size {
        brand_id: i64,
        type_id: i64,
        label: &'a str,
    },
    Color {
        name: &'a str,
    },
    Finish {
        name: &'a str,
    },
    Item {
        brand_id: i64,
        product_code: &'a str,
        attrs: &'a ItemAttributes,
    },
}

impl EntityKey<'_> {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Brand { .. } => EntityKind::Brand,
            Self::Type { .. } => EntityKind::Type,
            Self::Size { .. } => EntityKind::Size,
            Self::Color { .. } => EntityKind::Color,
            Self::Finish { .. } => EntityKind::Finish,
            Self::Item { .. } => EntityKind::Item,
        }
    }

    /// Human-readable natural key, for logs and errors
    pub fn describe(&self) -> String {
        match self {
            Self::Brand { name, .. } => name.to_string(),
            Self::Type { brand_id, name } => format!("{}/{}", brand_id, name),
            Self::Size {
                brand_id,
                type_id,
                label,
            } => format!("{}/{}/{}", brand_id, type_id, label),
            Self::Color { name } | Self::Finish { name } => name.to_string(),
            Self::Item {
                brand_id,
                product_code,
                ..
            } => format!("{}/{}", brand_id, product_code),
        }
    }
}

/// An item/attribute link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Color { item_id: i64, color_id: i64 },
    Finish { item_id: i64, finish_id: i64 },
}

/// An item as stored, with names resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredItem {
    pub id: i64,
    pub brand: String,
    pub product_code: String,
    pub type_name: String,
    pub size_label: String,
    pub name: String,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub source_url: String,
    pub details: ItemDetails,
    pub created_at: String,
    pub updated_at: String,
    /// Sorted
    pub colors: Vec<String>,
    /// Sorted
    pub finishes: Vec<String>,
}

/// Represents a crawl run of one site
#[derive(Debug, Clone)]
pub struct CrawlRunRecord {
    pub id: i64,
    pub site: String,
    pub config_hash: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: RunStatus,
    pub items_seen: u64,
    pub items_skipped: u64,
    pub items_upserted: u64,
    pub pages_fetched: u64,
    pub pages_followed: u64,
    pub errors: u64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
