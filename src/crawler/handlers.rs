//! Named page handlers, one per crawl state
//!
//! A handler receives one parsed page plus the context carried by its task
//! and returns, synchronously, every follow-up task and record the page
//! produces. The driver sinks those records before it fetches the next page.

use crate::catalog::ItemRecord;
use crate::config::{ConfigError, SiteConfig};
use crate::crawler::{FetchTask, PaginationFollower, ParsedPage, TaskContext};
use crate::extract::{
    descriptor_strategy, element_text, ExtractOutcome, FieldExtractor, RawItemFields, SiteQuirks,
    SiteRules,
};
use crate::normalize::{AttributeNormalizer, CodeClassifier, SizeLabel, SizeTable, VocabularySnapshot};
use crate::storage::ItemDetails;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

pub const LISTING: &str = "listing";
pub const DETAIL: &str = "detail";
pub const DIRECTORY: &str = "directory";

/// Category link texts shorter than this are navigation noise
const MIN_CATEGORY_LEN: usize = 3;

/// Everything a handler needs to know about the site it is crawling
pub struct SiteEnv {
    pub name: String,
    pub rules: SiteRules,
    pub quirks: Arc<dyn SiteQuirks>,
    pub classifier: CodeClassifier,
    pub vocabulary: Arc<VocabularySnapshot>,
    pub brand: String,
    pub brand_homepage: Option<String>,
    /// Type used when no category is carried in the task context
    pub item_type: String,
    pub allowlist: Vec<String>,
}

impl SiteEnv {
    /// Compiles a validated site config against a vocabulary snapshot
    pub fn from_config(
        site: &SiteConfig,
        vocabulary: Arc<VocabularySnapshot>,
    ) -> Result<Self, ConfigError> {
        let quirks = descriptor_strategy(&site.descriptor).ok_or_else(|| {
            ConfigError::Validation(format!(
                "site '{}': unknown descriptor '{}'",
                site.name, site.descriptor
            ))
        })?;

        Ok(Self {
            name: site.name.clone(),
            rules: SiteRules::compile(&site.rules)?,
            quirks,
            classifier: CodeClassifier::new(SizeTable::from_entries(&site.sizes)),
            vocabulary,
            brand: site.brand.name.clone(),
            brand_homepage: site.brand.homepage.clone(),
            item_type: site.item_type.clone(),
            allowlist: site.domain_allowlist.clone(),
        })
    }

    /// Completes raw fields into a persistable record
    ///
    /// Returns `None` when the code has no size label.
    pub fn build_record(&self, fields: &RawItemFields, context: &TaskContext) -> Option<ItemRecord> {
        let size_label = match self.classifier.classify(&fields.product_code) {
            SizeLabel::Known(label) => label,
            SizeLabel::Unknown => return None,
        };

        let attributes = AttributeNormalizer::new(&self.vocabulary).normalize(
            &size_label,
            fields.raw_color_text.as_deref(),
            fields.raw_finish_text.as_deref(),
        );

        Some(ItemRecord {
            brand: self.brand.clone(),
            brand_homepage: self.brand_homepage.clone(),
            type_name: context
                .category
                .clone()
                .unwrap_or_else(|| self.item_type.clone()),
            size_label: attributes.size_label,
            product_code: fields.product_code.clone(),
            name: fields.name.clone(),
            image_url: fields.image_url.clone(),
            price: fields.price.clone(),
            source_url: fields.source_url.clone(),
            colors: attributes.color_names,
            finishes: attributes.finish_names,
            details: fields.details.clone(),
        })
    }
}

/// What one handler invocation produced
#[derive(Debug, Default)]
pub struct HandlerOutput {
    /// Follow-up work other than pagination
    pub tasks: Vec<FetchTask>,
    /// At most one next-page task
    pub next_page: Option<FetchTask>,
    pub records: Vec<ItemRecord>,
    pub items_seen: u64,
    pub unrecognized: u64,
    pub malformed: u64,
}

/// One crawl state's page-processing logic
pub trait PageHandler: Send + Sync {
    fn handle(&self, page: &ParsedPage, context: &TaskContext, env: &SiteEnv) -> HandlerOutput;

    /// Whether a site run may be seeded with this handler
    fn accepts_seeds(&self) -> bool {
        false
    }
}

/// Handler lookup by name
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn PageHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `listing`, `detail` and `directory` handlers
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(LISTING, Arc::new(ListingHandler));
        registry.register(DETAIL, Arc::new(DetailHandler));
        registry.register(DIRECTORY, Arc::new(DirectoryHandler));
        registry
    }

    pub fn register(&mut self, name: &str, handler: Arc<dyn PageHandler>) {
        self.handlers.insert(name.to_string(), handler);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn PageHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Sorted names of the handlers that accept seed URLs
    pub fn entry_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .handlers
            .iter()
            .filter(|(_, handler)| handler.accepts_seeds())
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

/// Paginated listing of items
///
/// Each entry is extracted independently; unrecognized and malformed entries
/// are counted and skipped without affecting the rest of the page. When the
/// site has detail rules, recognized entries become `detail` tasks instead of
/// records.
pub struct ListingHandler;

impl PageHandler for ListingHandler {
    fn handle(&self, page: &ParsedPage, context: &TaskContext, env: &SiteEnv) -> HandlerOutput {
        let mut output = HandlerOutput::default();
        let extractor = FieldExtractor::new(&env.rules, env.quirks.as_ref(), &env.classifier);

        for entry in page.select_all(&env.rules.item) {
            output.items_seen += 1;

            match extractor.extract(entry, page.url()) {
                ExtractOutcome::Item(fields) => {
                    if env.rules.has_detail_rules() {
                        match url::Url::parse(&fields.source_url) {
                            Ok(detail_url) => {
                                let detail_context = TaskContext {
                                    category: context.category.clone(),
                                    item: Some(Box::new(fields)),
                                };
                                output.tasks.push(FetchTask::with_context(
                                    detail_url,
                                    DETAIL,
                                    detail_context,
                                ));
                            }
                            Err(e) => {
                                warn!(site = %env.name, url = %fields.source_url, error = %e, "Unusable item link");
                                output.malformed += 1;
                            }
                        }
                    } else {
                        match env.build_record(&fields, context) {
                            Some(record) => output.records.push(record),
                            None => output.unrecognized += 1,
                        }
                    }
                }
                ExtractOutcome::Unrecognized { reason } => {
                    debug!(site = %env.name, page = %page.url(), %reason, "Skipping unrecognized item");
                    output.unrecognized += 1;
                }
                ExtractOutcome::Malformed { reason } => {
                    warn!(site = %env.name, page = %page.url(), %reason, "Skipping malformed item");
                    output.malformed += 1;
                }
            }
        }

        output.next_page =
            PaginationFollower::new(&env.rules.next_page).follow(page, LISTING, context);

        trace!(
            site = %env.name,
            page = %page.url(),
            seen = output.items_seen,
            records = output.records.len(),
            "Listing handled"
        );
        output
    }

    fn accepts_seeds(&self) -> bool {
        true
    }
}

/// An item's own page, completing the listing fields with attribute rows
///
/// The colour row replaces the listing-derived descriptor; the finish row is
/// matched with fallback. The free-text rows (description, shape, glass group,
/// dyed, galvanized, plating) are stored as read. A page with none of the rows
/// keeps the listing fields.
pub struct DetailHandler;

impl PageHandler for DetailHandler {
    fn handle(&self, page: &ParsedPage, context: &TaskContext, env: &SiteEnv) -> HandlerOutput {
        let mut output = HandlerOutput::default();

        let mut fields = match &context.item {
            Some(fields) => (**fields).clone(),
            None => {
                warn!(site = %env.name, page = %page.url(), "Detail page reached without item fields");
                return output;
            }
        };

        let row_text = |selector: &Option<scraper::Selector>| {
            selector
                .as_ref()
                .and_then(|selector| page.select_first(selector))
                .map(element_text)
                .filter(|text| !text.is_empty())
        };

        if let Some(color) = row_text(&env.rules.detail_color) {
            fields.raw_color_text = Some(color);
        }
        if let Some(finish) = row_text(&env.rules.detail_finish) {
            fields.raw_finish_text = Some(finish);
        }

        let rows = &env.rules.detail_fields;
        fields.details = ItemDetails {
            description: row_text(&rows.description),
            shape: row_text(&rows.shape),
            glass_group: row_text(&rows.glass_group),
            dyed: row_text(&rows.dyed),
            galvanized: row_text(&rows.galvanized),
            plating: row_text(&rows.plating),
        };
        trace!(site = %env.name, code = %fields.product_code, details = ?fields.details, "Detail rows read");

        match env.build_record(&fields, context) {
            Some(record) => output.records.push(record),
            None => output.unrecognized += 1,
        }
        output
    }
}

/// Category index linking to listings; the category names the item Type
pub struct DirectoryHandler;

impl PageHandler for DirectoryHandler {
    fn handle(&self, page: &ParsedPage, context: &TaskContext, env: &SiteEnv) -> HandlerOutput {
        let mut output = HandlerOutput::default();
        let selector = match &env.rules.category {
            Some(selector) => selector,
            None => {
                warn!(site = %env.name, "Directory page without a category selector");
                return output;
            }
        };

        for link in page.select_all(selector) {
            let category = element_text(link);
            if category.chars().count() < MIN_CATEGORY_LEN {
                continue;
            }
            let url = match link.value().attr("href").and_then(|href| page.resolve(href)) {
                Some(url) => url,
                None => continue,
            };
            debug!(site = %env.name, %category, url = %url, "Found category");
            output.tasks.push(FetchTask::with_context(
                url,
                LISTING,
                TaskContext::with_category(category),
            ));
        }

        output.next_page =
            PaginationFollower::new(&env.rules.next_page).follow(page, DIRECTORY, context);
        output
    }

    fn accepts_seeds(&self) -> bool {
        true
    }
}
