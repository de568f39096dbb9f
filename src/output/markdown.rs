//! Markdown run report
//!
//! Written after a crawl when `summary-path` is configured.

use crate::output::stats::CatalogStatistics;
use crate::output::RunSummary;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown report for a set of site runs
///
/// # Arguments
///
/// * `summaries` - One summary per site run
/// * `stats` - Catalog totals after the runs
/// * `config_hash` - Hash of the configuration the runs used
/// * `output_path` - Path where the markdown file should be written
pub fn write_markdown_report(
    summaries: &[RunSummary],
    stats: &CatalogStatistics,
    config_hash: &str,
    output_path: &Path,
) -> std::io::Result<()> {
    let markdown = format_markdown_report(summaries, stats, config_hash);
    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;
    Ok(())
}

/// Formats the run report as markdown
pub fn format_markdown_report(
    summaries: &[RunSummary],
    stats: &CatalogStatistics,
    config_hash: &str,
) -> String {
    let mut md = String::new();

    md.push_str("# Bead-Harvest Crawl Summary\n\n");
    md.push_str(&format!(
        "- **Generated**: {}\n",
        chrono::Utc::now().to_rfc3339()
    ));
    md.push_str(&format!("- **Config Hash**: {}\n\n", config_hash));

    md.push_str("## Site Runs\n\n");
    md.push_str(
        "| Site | Seen | Skipped | Upserted | Pages | Followed | Errors | Duration | Status |\n",
    );
    md.push_str(
        "|------|------|---------|----------|-------|----------|--------|----------|--------|\n",
    );
    for s in summaries {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {:.1}s | {} |\n",
            s.site,
            s.items_seen,
            s.items_skipped,
            s.items_upserted,
            s.pages_fetched,
            s.pages_followed,
            s.errors,
            s.duration.as_secs_f64(),
            if s.interrupted { "interrupted" } else { "completed" }
        ));
    }
    md.push('\n');

    let skipped: Vec<&RunSummary> = summaries.iter().filter(|s| s.items_skipped > 0).collect();
    if !skipped.is_empty() {
        md.push_str("## Skipped Items\n\n");
        md.push_str("| Site | Unrecognized | Malformed | Skip Rate |\n");
        md.push_str("|------|--------------|-----------|-----------|\n");
        for s in skipped {
            md.push_str(&format!(
                "| {} | {} | {} | {:.1}% |\n",
                s.site,
                s.unrecognized,
                s.malformed,
                s.skip_rate()
            ));
        }
        md.push('\n');
    }

    let failing: Vec<&RunSummary> = summaries.iter().filter(|s| s.errors > 0).collect();
    if !failing.is_empty() {
        md.push_str("## Errors\n\n");
        for s in failing {
            md.push_str(&format!(
                "- **{}**: {} branch(es) dropped, {} item(s) failed to persist\n",
                s.site, s.branches_dropped, s.persistence_failures
            ));
        }
        md.push('\n');
    }

    md.push_str("## Catalog Totals\n\n");
    md.push_str("| Entity | Rows |\n");
    md.push_str("|--------|------|\n");
    for (kind, count) in &stats.counts {
        md.push_str(&format!("| {} | {} |\n", kind.table_name(), count));
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::EntityKind;

    fn stats() -> CatalogStatistics {
        CatalogStatistics {
            counts: vec![(EntityKind::Brand, 1), (EntityKind::Item, 42)],
            recent_runs: vec![],
        }
    }

    #[test]
    fn test_report_lists_sites_and_totals() {
        let mut summary = RunSummary::new("fire-mountain-gems");
        summary.items_seen = 50;
        summary.items_upserted = 42;
        summary.items_skipped = 8;
        summary.unrecognized = 8;

        let md = format_markdown_report(&[summary], &stats(), "abc123");

        assert!(md.contains("# Bead-Harvest Crawl Summary"));
        assert!(md.contains("abc123"));
        assert!(md.contains("| fire-mountain-gems | 50 | 8 | 42 |"));
        assert!(md.contains("## Skipped Items"));
        assert!(md.contains("| items | 42 |"));
        assert!(!md.contains("## Errors"));
    }

    #[test]
    fn test_report_lists_errors() {
        let mut summary = RunSummary::new("shop");
        summary.record_dropped_branch();

        let md = format_markdown_report(&[summary], &stats(), "h");
        assert!(md.contains("## Errors"));
        assert!(md.contains("1 branch(es) dropped"));
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.md");
        write_markdown_report(&[RunSummary::new("shop")], &stats(), "h", &path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("| shop |"));
    }
}
