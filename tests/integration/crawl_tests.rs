//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock catalog sites and run the full
//! crawl-extract-normalize-persist cycle end-to-end against a temporary
//! SQLite catalog.

use bead_harvest::catalog::{prepare_vocabulary, SharedStore};
use bead_harvest::config::{parse_config, Config};
use bead_harvest::crawler::{crawl_site, StopSignal};
use bead_harvest::storage::{open_storage, CatalogStore, EntityKind, RunStatus, StoredItem};
use bead_harvest::{HarvestError, RunSummary};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING_RULES: &str = r#"
item-selector = "li.product"
link-selector = "a.title"
name-selector = "a.title"
image-selector = "img"
price-selector = ".price"
next-page-selectors = ["a.next", "a[rel=next]"]
"#;

/// Builds a validated configuration for one site served by `base_url`
fn create_test_config(
    base_url: &str,
    db_path: &str,
    crawler_extra: &str,
    site_extra: &str,
    rules: &str,
) -> Config {
    let toml = format!(
        r#"
[crawler]
request-delay-seconds = 0.0
request-timeout-seconds = 5
max-retries = 3
retry-backoff-ms = 10
{crawler_extra}

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"

[output]
database-path = "{db_path}"

[vocabulary]
colors = ["Transparent", "Red", "Blue", "Silver", "Green"]
finishes = ["AB", "Luster", "Matte", "Silver-Lined"]

[[site]]
name = "mock-shop"
domain-allowlist = ["127.0.0.1"]
start-urls = ["{base_url}/delica"]
item-type = "Delica"
brand = {{ name = "Miyuki", homepage = "https://www.miyuki-beads.co.jp/" }}
{site_extra}

[site.rules]
{rules}
"#
    );
    parse_config(&toml).expect("test config should be valid")
}

struct Harness {
    config: Config,
    store: SharedStore,
    _dir: TempDir,
}

impl Harness {
    fn new(base_url: &str, crawler_extra: &str, site_extra: &str, rules: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("catalog.db");
        let db_path = db_path.to_str().unwrap().replace('\\', "/");
        let config = create_test_config(base_url, &db_path, crawler_extra, site_extra, rules);
        let storage = open_storage(std::path::Path::new(&db_path)).unwrap();
        let store: SharedStore = Arc::new(Mutex::new(storage));
        Self {
            config,
            store,
            _dir: dir,
        }
    }

    fn listing(base_url: &str) -> Self {
        Self::new(base_url, "", "", LISTING_RULES)
    }

    async fn crawl_with(&self, stop: StopSignal) -> Result<RunSummary, HarvestError> {
        let vocabulary = prepare_vocabulary(&self.store, &self.config.vocabulary).unwrap();
        crawl_site(
            &self.config,
            &self.config.sites[0],
            "test-hash",
            self.store.clone(),
            vocabulary,
            stop,
        )
        .await
    }

    async fn crawl(&self) -> Result<RunSummary, HarvestError> {
        self.crawl_with(StopSignal::new()).await
    }

    fn item(&self, code: &str) -> Option<StoredItem> {
        self.store.lock().unwrap().get_item("Miyuki", code).unwrap()
    }

    fn count(&self, kind: EntityKind) -> u64 {
        self.store.lock().unwrap().count(kind).unwrap()
    }

    fn last_run_status(&self) -> RunStatus {
        self.store.lock().unwrap().recent_runs(1).unwrap()[0].status
    }
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

fn product(href: &str, name: &str, price: &str) -> String {
    format!(
        r#"<li class="product"><a class="title" href="{href}">{name}</a><img src="/img{href}.jpg"><span class="price">{price}</span></li>"#
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_unrecognized_code_is_skipped_not_persisted() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        "/delica",
        format!(
            "<ul>{}{}</ul>",
            product("/p/db-123", "Delica DB-123 Transparent Red AB", "$4.20"),
            product("/p/xx-999", "Mystery Bead XX-999 Blue", "$1.00"),
        ),
    )
    .await;

    let harness = Harness::listing(&base_url);
    let summary = harness.crawl().await.unwrap();

    assert_eq!(summary.items_seen, 2);
    assert_eq!(summary.items_skipped, 1);
    assert_eq!(summary.items_upserted, 1);
    assert_eq!(summary.unrecognized, 1);
    assert_eq!(summary.errors, 0);

    let item = harness.item("DB-123").expect("DB-123 should be persisted");
    assert_eq!(item.size_label, "11/0");
    assert_eq!(item.type_name, "Delica");
    assert_eq!(item.price.as_deref(), Some("$4.20"));
    assert_eq!(item.source_url, format!("{}/p/db-123", base_url));
    assert_eq!(item.image_url, Some(format!("{}/img/p/db-123.jpg", base_url)));
    assert_eq!(item.finishes, vec!["AB".to_string()]);
    assert_eq!(item.colors, vec!["Red".to_string(), "Transparent".to_string()]);

    assert_eq!(harness.count(EntityKind::Item), 1);
    assert_eq!(harness.last_run_status(), RunStatus::Completed);
}

#[tokio::test]
async fn test_repeated_crawl_creates_no_duplicates() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let page = format!(
        "<ul>{}{}</ul>",
        product("/p/db-123", "Delica DB-123 Transparent Red AB", "$4.20"),
        product("/p/db-2", "Delica DB-2 Silver-Lined Green", "$3.10"),
    );
    mount_page(&server, "/delica", page).await;

    let harness = Harness::listing(&base_url);
    let first = harness.crawl().await.unwrap();
    assert_eq!(first.items_upserted, 2);

    let counts_after_first: Vec<u64> = EntityKind::ALL
        .iter()
        .map(|kind| harness.count(*kind))
        .collect();

    let second = harness.crawl().await.unwrap();
    assert_eq!(second.items_upserted, 2);

    let counts_after_second: Vec<u64> = EntityKind::ALL
        .iter()
        .map(|kind| harness.count(*kind))
        .collect();
    assert_eq!(counts_after_first, counts_after_second);
    assert_eq!(harness.count(EntityKind::Item), 2);
    assert_eq!(harness.count(EntityKind::Brand), 1);
    assert_eq!(harness.count(EntityKind::Size), 1);

    // A changed price is written over the existing row
    server.reset().await;
    mount_page(
        &server,
        "/delica",
        format!(
            "<ul>{}{}</ul>",
            product("/p/db-123", "Delica DB-123 Transparent Red AB", "$4.50"),
            product("/p/db-2", "Delica DB-2 Silver-Lined Green", "$3.10"),
        ),
    )
    .await;

    let third = harness.crawl().await.unwrap();
    assert_eq!(third.items_upserted, 2);
    assert_eq!(harness.count(EntityKind::Item), 2);
    assert_eq!(
        harness.item("DB-123").unwrap().price.as_deref(),
        Some("$4.50")
    );

    let silver = harness.item("DB-2").unwrap();
    assert_eq!(silver.finishes, vec!["Silver-Lined".to_string()]);
    assert_eq!(silver.colors, vec!["Green".to_string()]);
}

#[tokio::test]
async fn test_relative_next_page_is_followed() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        "/delica",
        format!(
            r#"<ul>{}</ul><a class="next" href="delica-p2">Next</a>"#,
            product("/p/db-1", "Delica DB-1 Blue", "$1"),
        ),
    )
    .await;
    // Page 2 links back to page 1; the frontier must not loop
    mount_page(
        &server,
        "/delica-p2",
        format!(
            r#"<ul>{}</ul><a rel="next" href="/delica">Back to start</a>"#,
            product("/p/db-2", "Delica DB-2 Red", "$2"),
        ),
    )
    .await;

    let harness = Harness::listing(&base_url);
    let summary = harness.crawl().await.unwrap();

    assert_eq!(summary.pages_fetched, 2);
    assert_eq!(summary.pages_followed, 1);
    assert_eq!(summary.items_upserted, 2);
    assert!(harness.item("DB-1").is_some());
    assert!(harness.item("DB-2").is_some());
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/delica"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/delica",
        format!("<ul>{}</ul>", product("/p/db-5", "Delica DB-5 Red", "$1")),
    )
    .await;

    let harness = Harness::listing(&base_url);
    let summary = harness.crawl().await.unwrap();

    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.items_upserted, 1);
}

#[tokio::test]
async fn test_any_server_error_is_retried() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/delica"))
        .respond_with(ResponseTemplate::new(501))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/delica",
        format!("<ul>{}</ul>", product("/p/db-6", "Delica DB-6 Red", "$1")),
    )
    .await;

    let harness = Harness::listing(&base_url);
    let summary = harness.crawl().await.unwrap();

    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(summary.errors, 0);
    assert!(harness.item("DB-6").is_some());
}

#[tokio::test]
async fn test_unreachable_seed_fails_the_run() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/delica"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let harness = Harness::listing(&base_url);
    let result = harness.crawl().await;

    assert!(matches!(result, Err(HarvestError::SeedsUnreachable { .. })));
    assert_eq!(harness.last_run_status(), RunStatus::Failed);
}

#[tokio::test]
async fn test_failed_branch_does_not_stop_the_run() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        "/delica",
        format!(
            r#"<ul>{}</ul><a class="next" href="/delica-p2">Next</a>"#,
            product("/p/db-7", "Delica DB-7 Blue Matte", "$1"),
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/delica-p2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let harness = Harness::new(&base_url, "", "", LISTING_RULES);
    let summary = harness.crawl().await.unwrap();

    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(summary.branches_dropped, 1);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.items_upserted, 1);

    let item = harness.item("DB-7").unwrap();
    assert_eq!(item.finishes, vec!["Matte".to_string()]);
    assert_eq!(item.colors, vec!["Blue".to_string()]);
}

#[tokio::test]
async fn test_malformed_entry_skips_only_itself() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        "/delica",
        format!(
            r#"<ul><li class="product"><span>no title</span></li>{}</ul>"#,
            product("/p/db-8", "Delica DB-8 Red", "$1"),
        ),
    )
    .await;

    let harness = Harness::listing(&base_url);
    let summary = harness.crawl().await.unwrap();

    assert_eq!(summary.items_seen, 2);
    assert_eq!(summary.malformed, 1);
    assert_eq!(summary.items_skipped, 1);
    assert_eq!(summary.items_upserted, 1);
}

#[tokio::test]
async fn test_stop_signal_interrupts_before_fetching() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .respond_with(html(String::new()))
        .expect(0)
        .mount(&server)
        .await;

    let harness = Harness::listing(&base_url);
    let stop = StopSignal::new();
    stop.raise();
    let summary = harness.crawl_with(stop).await.unwrap();

    assert!(summary.interrupted);
    assert_eq!(summary.pages_fetched, 0);
    assert_eq!(harness.last_run_status(), RunStatus::Interrupted);
}

#[tokio::test]
async fn test_page_limit() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        "/delica",
        format!(
            r#"<ul>{}</ul><a class="next" href="/delica-p2">Next</a>"#,
            product("/p/db-1", "Delica DB-1 Blue", "$1"),
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/delica-p2"))
        .respond_with(html(String::new()))
        .expect(0)
        .mount(&server)
        .await;

    let harness = Harness::new(&base_url, "max-pages = 1", "", LISTING_RULES);
    let summary = harness.crawl().await.unwrap();

    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(summary.pages_followed, 1);
}

#[tokio::test]
async fn test_robots_disallow_is_honoured() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
        )
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/delica",
        format!(
            r#"<ul>{}</ul><a class="next" href="/private/p2">Next</a>"#,
            product("/p/db-1", "Delica DB-1 Blue", "$1"),
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/private/p2"))
        .respond_with(html(String::new()))
        .expect(0)
        .mount(&server)
        .await;

    let harness = Harness::new(&base_url, "obey-robots = true", "", LISTING_RULES);
    let summary = harness.crawl().await.unwrap();

    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(summary.items_upserted, 1);
}

#[tokio::test]
async fn test_oversized_crawl_delay_does_not_abort_the_run() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nCrawl-delay: 1e300\n"),
        )
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/delica",
        format!("<ul>{}</ul>", product("/p/db-1", "Delica DB-1 Blue", "$1")),
    )
    .await;

    let harness = Harness::new(&base_url, "obey-robots = true", "", LISTING_RULES);
    let summary = harness.crawl().await.unwrap();

    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(summary.items_upserted, 1);
    assert_eq!(harness.last_run_status(), RunStatus::Completed);
}

#[tokio::test]
async fn test_directory_and_detail_flow() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        "/delica",
        r#"<nav class="categories">
             <a href="/cat/delica-11">Delica 11/0</a>
             <a href="/cat/x">Go</a>
           </nav>"#
            .to_string(),
    )
    .await;
    mount_page(
        &server,
        "/cat/delica-11",
        format!(
            "<ul>{}{}</ul>",
            product("/p/db-10", "Delica DB-10", "$2"),
            product("/p/db-11", "Delica DB-11 Red", "$2"),
        ),
    )
    .await;
    mount_page(
        &server,
        "/p/db-10",
        r#"<div class="description">Cylinder bead with a wide hole.</div>
           <table>
             <tr class="attr-color"><td><p>Silver</p></td></tr>
             <tr class="attr-finish"><td><p>Matte AB</p></td></tr>
             <tr class="attr-shape"><td><p>Cylinder</p></td></tr>
             <tr class="attr-galva"><td><p>No</p></td></tr>
           </table>"#
            .to_string(),
    )
    .await;
    // No attribute rows: the listing descriptor is kept
    mount_page(&server, "/p/db-11", "<p>Details coming soon</p>".to_string()).await;

    let rules = format!(
        r#"{}
category-selector = "nav.categories a"
detail-color-selector = "tr.attr-color td"
detail-finish-selector = "tr.attr-finish td"
detail-description-selector = "div.description"
detail-shape-selector = "tr.attr-shape td"
detail-galvanized-selector = "tr.attr-galva td"
"#,
        LISTING_RULES
    );
    let harness = Harness::new(&base_url, "", r#"entry-handler = "directory""#, &rules);
    let summary = harness.crawl().await.unwrap();

    assert_eq!(summary.pages_fetched, 4);
    assert_eq!(summary.items_seen, 2);
    assert_eq!(summary.items_upserted, 2);

    let with_rows = harness.item("DB-10").unwrap();
    assert_eq!(with_rows.type_name, "Delica 11/0");
    assert_eq!(with_rows.colors, vec!["Silver".to_string()]);
    assert_eq!(with_rows.finishes, vec!["AB".to_string(), "Matte".to_string()]);
    assert_eq!(with_rows.details.shape.as_deref(), Some("Cylinder"));
    assert_eq!(with_rows.details.galvanized.as_deref(), Some("No"));
    assert_eq!(
        with_rows.details.description.as_deref(),
        Some("Cylinder bead with a wide hole.")
    );

    let without_rows = harness.item("DB-11").unwrap();
    assert_eq!(without_rows.colors, vec!["Red".to_string()]);
    assert!(without_rows.finishes.is_empty());
    assert!(without_rows.details.is_empty());
}

#[tokio::test]
async fn test_shared_detail_url_is_fetched_once() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        "/delica",
        format!(
            "<ul>{}{}</ul>",
            product("/p/db-20", "Delica DB-20 Red", "$2"),
            product("/p/db-20", "Delica DB-20 Red", "$2"),
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/p/db-20"))
        .respond_with(html(
            r#"<table><tr class="attr-color"><td><p>Red</p></td></tr></table>"#.to_string(),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let rules = format!("{}\ndetail-color-selector = \"tr.attr-color td\"\n", LISTING_RULES);
    let harness = Harness::new(&base_url, "", "", &rules);
    let summary = harness.crawl().await.unwrap();

    // The second entry's detail task is rejected by the frontier and lands in no bucket
    assert_eq!(summary.items_seen, 2);
    assert_eq!(summary.items_upserted, 1);
    assert_eq!(summary.items_skipped, 0);
    assert_eq!(summary.errors, 0);
    assert_eq!(harness.count(EntityKind::Item), 1);
}
