//! Output module for run summaries and reports
//!
//! This module handles:
//! - Per-run counters ([`RunSummary`])
//! - Catalog statistics for `--stats`
//! - The markdown run report

mod markdown;
pub mod stats;
mod summary;

pub use markdown::{format_markdown_report, write_markdown_report};
pub use stats::{load_statistics, print_statistics, CatalogStatistics};
pub use summary::RunSummary;
