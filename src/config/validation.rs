use crate::config::types::{Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig};
use crate::crawler::{HandlerRegistry, DIRECTORY};
use crate::extract::{descriptor_strategy, SiteRules};
use crate::url::is_allowed;
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

const MAX_REQUEST_DELAY_SECONDS: f64 = 3600.0;
const MAX_REQUEST_TIMEOUT_SECONDS: u64 = 3600;
const MAX_RETRY_BACKOFF_MS: u64 = 60_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_sites(&config.sites)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if !(0.0..=MAX_REQUEST_DELAY_SECONDS).contains(&config.request_delay_seconds) {
        return Err(ConfigError::Validation(format!(
            "request_delay_seconds must be between 0 and {}, got {}",
            MAX_REQUEST_DELAY_SECONDS, config.request_delay_seconds
        )));
    }

    if !(1..=MAX_REQUEST_TIMEOUT_SECONDS).contains(&config.request_timeout_seconds) {
        return Err(ConfigError::Validation(format!(
            "request_timeout_seconds must be between 1 and {}, got {}",
            MAX_REQUEST_TIMEOUT_SECONDS, config.request_timeout_seconds
        )));
    }

    if config.retry_backoff_ms > MAX_RETRY_BACKOFF_MS {
        return Err(ConfigError::Validation(format!(
            "retry_backoff_ms must be at most {}, got {}",
            MAX_RETRY_BACKOFF_MS, config.retry_backoff_ms
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be between 0 and 10, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if matches!(&config.summary_path, Some(path) if path.is_empty()) {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_sites(sites: &[SiteConfig]) -> Result<(), ConfigError> {
    if sites.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[site]] must be configured".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for site in sites {
        if site.name.is_empty() {
            return Err(ConfigError::Validation(
                "site name cannot be empty".to_string(),
            ));
        }
        if !names.insert(site.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate site name '{}'",
                site.name
            )));
        }
        validate_site(site)?;
    }

    Ok(())
}

/// Validates one site entry: allowlist, seeds, handler names and compiled rules
fn validate_site(site: &SiteConfig) -> Result<(), ConfigError> {
    if site.domain_allowlist.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Site '{}' must have a non-empty domain-allowlist",
            site.name
        )));
    }
    for pattern in &site.domain_allowlist {
        validate_domain_pattern(pattern)?;
    }

    if site.start_urls.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Site '{}' must have at least one start URL",
            site.name
        )));
    }

    for seed in &site.start_urls {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", seed, e)))?;

        if !is_allowed(&url, &site.domain_allowlist) {
            return Err(ConfigError::Validation(format!(
                "Start URL '{}' of site '{}' is not covered by its domain-allowlist",
                seed, site.name
            )));
        }
    }

    let registry = HandlerRegistry::with_builtins();
    let entry_handlers = registry.entry_names();
    if !entry_handlers.contains(&site.entry_handler.as_str()) {
        return Err(ConfigError::Validation(format!(
            "Site '{}' has unknown entry-handler '{}' (expected one of {:?})",
            site.name, site.entry_handler, entry_handlers
        )));
    }

    if descriptor_strategy(&site.descriptor).is_none() {
        return Err(ConfigError::Validation(format!(
            "Site '{}' has unknown descriptor '{}'",
            site.name, site.descriptor
        )));
    }

    if site.brand.name.trim().is_empty() || site.item_type.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "Site '{}' must name its brand and item-type",
            site.name
        )));
    }

    if site.rules.code_patterns.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Site '{}' must declare at least one code pattern",
            site.name
        )));
    }

    let rules = SiteRules::compile(&site.rules)?;
    if site.entry_handler == DIRECTORY && rules.category.is_none() {
        return Err(ConfigError::Validation(format!(
            "Site '{}' uses the directory handler but has no category-selector",
            site.name
        )));
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);
    validate_domain_string(domain)
}

fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
        || domain.contains("..")
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' is not a well-formed host name",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}
