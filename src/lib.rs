//! Bead-Harvest: a polite catalog ingester
//!
//! This crate crawls third-party bead catalog sites, extracts per-item fields
//! with data-described rules, classifies product codes into size labels,
//! normalizes descriptive text against a canonical colour/finish vocabulary and
//! upserts the result into a deduplicated SQLite catalog.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod normalize;
pub mod output;
pub mod robots;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Bead-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No handler registered under '{0}'")]
    UnknownHandler(String),

    #[error("None of the start URLs for site '{site}' could be fetched")]
    SeedsUnreachable { site: String },

    #[error("Could not resolve {entity} '{key}' after a uniqueness conflict")]
    PersistenceConflict { entity: &'static str, key: String },

    #[error("Catalog store lock poisoned")]
    StorePoisoned,

    #[error("Vocabulary pattern error: {0}")]
    Vocabulary(#[from] regex::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid code pattern '{pattern}': {message}")]
    InvalidCodePattern { pattern: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Bead-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlDriver, FetchTask, StopSignal};
pub use output::RunSummary;
pub use crate::url::{extract_domain, normalize_url};
