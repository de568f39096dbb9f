use serde::Deserialize;

/// Main configuration structure for Bead-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub vocabulary: VocabularyConfig,
    #[serde(default, rename = "site")]
    pub sites: Vec<SiteConfig>,
}

impl Config {
    /// Looks up a configured site by name
    pub fn site(&self, name: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|site| site.name == name)
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Minimum wait between two requests of one site run (seconds)
    #[serde(rename = "request-delay-seconds", default = "default_request_delay")]
    pub request_delay_seconds: f64,

    /// Per-request network timeout (seconds)
    #[serde(rename = "request-timeout-seconds", default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Retries for transient fetch failures before a branch is abandoned
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base of the exponential retry backoff (milliseconds)
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,

    /// Maximum pages fetched per site run; 0 means unlimited
    #[serde(rename = "max-pages", default)]
    pub max_pages: u32,

    /// Whether robots.txt rules are honoured
    #[serde(rename = "obey-robots", default)]
    pub obey_robots: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_delay_seconds: default_request_delay(),
            request_timeout_seconds: default_request_timeout(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff(),
            max_pages: 0,
            obey_robots: false,
        }
    }
}

fn default_request_delay() -> f64 {
    1.0
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    500
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite catalog database
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Optional path of the markdown run report
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

/// Seed entries for the canonical vocabularies
#[derive(Debug, Clone, Deserialize)]
pub struct VocabularyConfig {
    #[serde(default = "default_colors")]
    pub colors: Vec<String>,

    #[serde(default = "default_finishes")]
    pub finishes: Vec<String>,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            colors: default_colors(),
            finishes: default_finishes(),
        }
    }
}

fn default_colors() -> Vec<String> {
    [
        "Transparent",
        "Translucent",
        "Black",
        "Grey",
        "White",
        "Pink",
        "Red",
        "Orange",
        "Yellow",
        "Green",
        "Blue",
        "Purple",
        "Brown",
        "Beige",
        "Gold",
        "Silver",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_finishes() -> Vec<String> {
    [
        "Matte",
        "Glossy",
        "Metallic",
        "Galvanized",
        "AB",
        "Luster",
        "Ceylon",
        "Opaque",
        "Lined",
        "Silver-Lined",
        "Gold-Lined",
        "Iris",
        "Duracoat",
        "Picasso",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// One source site: where to start, what to accept, how to read its pages
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Unique site name, used in logs and run records
    pub name: String,

    /// Domain patterns (e.g. "example.com" or "*.example.com") the run may fetch
    #[serde(rename = "domain-allowlist")]
    pub domain_allowlist: Vec<String>,

    /// Seed URLs
    #[serde(rename = "start-urls")]
    pub start_urls: Vec<String>,

    /// Handler the seed tasks are dispatched to
    #[serde(rename = "entry-handler", default = "default_entry_handler")]
    pub entry_handler: String,

    /// Name of the descriptor strategy ("full" or "last-segment")
    #[serde(default = "default_descriptor")]
    pub descriptor: String,

    pub brand: BrandConfig,

    /// Type name used when no category context is carried
    #[serde(rename = "item-type")]
    pub item_type: String,

    pub rules: RulesConfig,

    /// Prefix to size label table; defaults to the Delica table
    #[serde(default = "default_sizes")]
    pub sizes: Vec<SizeEntry>,
}

fn default_entry_handler() -> String {
    "listing".to_string()
}

fn default_descriptor() -> String {
    "full".to_string()
}

fn default_sizes() -> Vec<SizeEntry> {
    [("DBS", "15/0"), ("DB", "11/0"), ("DBM", "10/0"), ("DBL", "8/0")]
        .iter()
        .map(|(prefix, label)| SizeEntry {
            prefix: prefix.to_string(),
            label: label.to_string(),
        })
        .collect()
}

/// Brand that every item of a site belongs to
#[derive(Debug, Clone, Deserialize)]
pub struct BrandConfig {
    pub name: String,
    #[serde(default)]
    pub homepage: Option<String>,
}

/// Data-described extraction rules for one site
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RulesConfig {
    /// Selects one element per listing entry
    pub item_selector: String,

    /// Link to the item's own page, resolved against the listing URL
    #[serde(default)]
    pub link_selector: Option<String>,

    pub name_selector: String,

    #[serde(default)]
    pub image_selector: Option<String>,

    #[serde(default)]
    pub price_selector: Option<String>,

    /// Tried in order; the first match is the "next page" link
    #[serde(default)]
    pub next_page_selectors: Vec<String>,

    /// Phrases removed from names before the descriptor is taken
    #[serde(default)]
    pub name_noise: Vec<String>,

    /// Category links on directory pages
    #[serde(default)]
    pub category_selector: Option<String>,

    #[serde(default)]
    pub detail_color_selector: Option<String>,

    #[serde(default)]
    pub detail_finish_selector: Option<String>,

    #[serde(default)]
    pub detail_description_selector: Option<String>,

    #[serde(default)]
    pub detail_shape_selector: Option<String>,

    #[serde(default)]
    pub detail_glass_group_selector: Option<String>,

    #[serde(default)]
    pub detail_dyed_selector: Option<String>,

    #[serde(default)]
    pub detail_galvanized_selector: Option<String>,

    #[serde(default)]
    pub detail_plating_selector: Option<String>,

    #[serde(default = "default_code_patterns")]
    pub code_patterns: Vec<CodePatternConfig>,
}

/// One product-code pattern; must capture `prefix` and `number`
#[derive(Debug, Clone, Deserialize)]
pub struct CodePatternConfig {
    pub pattern: String,

    /// Zero-pads the numeric part to this width
    #[serde(rename = "pad-width", default)]
    pub pad_width: usize,
}

fn default_code_patterns() -> Vec<CodePatternConfig> {
    ["DBS", "DBM", "DBL", "DB"]
        .iter()
        .map(|prefix| CodePatternConfig {
            pattern: format!(r"\b(?P<prefix>{})-?(?P<number>\d+)", prefix),
            pad_width: 0,
        })
        .collect()
}

/// A single row of the size table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SizeEntry {
    pub prefix: String,
    pub label: String,
}
