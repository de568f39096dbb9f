//! Configuration module for Bead-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use bead_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Politeness delay: {}s", config.crawler.request_delay_seconds);
//! ```

mod parser;
mod types;
mod validation;

pub use crate::ConfigError;

// Re-export types
pub use types::{
    BrandConfig, CodePatternConfig, Config, CrawlerConfig, OutputConfig, RulesConfig, SiteConfig,
    SizeEntry, UserAgentConfig, VocabularyConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
