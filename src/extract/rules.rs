//! Compiled per-site extraction rules
//!
//! A [`RulesConfig`] is plain text from the config file; [`SiteRules`] holds the
//! parsed selectors and compiled code patterns that the extractor and the
//! handlers run against every page.

use crate::config::{CodePatternConfig, RulesConfig};
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;

/// Parses a CSS selector, mapping the failure into a config error
pub fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

fn parse_optional(selector: &Option<String>) -> Result<Option<Selector>, ConfigError> {
    selector.as_deref().map(parse_selector).transpose()
}

/// A product code found in free text, already in canonical form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCode {
    /// `{PREFIX}-{NUMBER}[-{SUFFIX}]`
    pub code: String,
    /// Upper-cased prefix, the key of the size table
    pub prefix: String,
}

/// Widest zero padding a code pattern may ask for
const MAX_PAD_WIDTH: usize = 12;

/// One compiled product-code pattern
#[derive(Debug, Clone)]
pub struct CodePattern {
    regex: Regex,
    pad_width: usize,
}

impl CodePattern {
    /// Compiles a pattern, requiring the `prefix` and `number` capture groups
    pub fn compile(config: &CodePatternConfig) -> Result<Self, ConfigError> {
        let regex = Regex::new(&config.pattern).map_err(|e| ConfigError::InvalidCodePattern {
            pattern: config.pattern.clone(),
            message: e.to_string(),
        })?;

        let names: Vec<&str> = regex.capture_names().flatten().collect();
        for required in ["prefix", "number"] {
            if !names.contains(&required) {
                return Err(ConfigError::InvalidCodePattern {
                    pattern: config.pattern.clone(),
                    message: format!("missing named group '{}'", required),
                });
            }
        }

        if config.pad_width > MAX_PAD_WIDTH {
            return Err(ConfigError::InvalidCodePattern {
                pattern: config.pattern.clone(),
                message: format!("pad-width must be at most {}", MAX_PAD_WIDTH),
            });
        }

        Ok(Self {
            regex,
            pad_width: config.pad_width,
        })
    }

    /// Finds the first code in `text`
    ///
    /// Returns the canonical code and the byte range it occupied.
    pub fn find(&self, text: &str) -> Option<(ProductCode, std::ops::Range<usize>)> {
        let caps = self.regex.captures(text)?;
        let whole = caps.get(0)?;
        let prefix = caps.name("prefix")?.as_str().to_uppercase();
        let number = caps.name("number")?.as_str();
        let suffix = caps
            .name("suffix")
            .map(|m| m.as_str().to_uppercase())
            .filter(|s| !s.is_empty());

        let mut code = format!("{}-{:0>width$}", prefix, number, width = self.pad_width);
        if let Some(suffix) = suffix {
            code.push('-');
            code.push_str(&suffix);
        }

        Some((ProductCode { code, prefix }, whole.range()))
    }
}

/// Selectors of the free-text attribute rows on an item's own page
#[derive(Debug, Clone, Default)]
pub struct DetailFieldRules {
    pub description: Option<Selector>,
    pub shape: Option<Selector>,
    pub glass_group: Option<Selector>,
    pub dyed: Option<Selector>,
    pub galvanized: Option<Selector>,
    pub plating: Option<Selector>,
}

impl DetailFieldRules {
    fn compile(config: &RulesConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            description: parse_optional(&config.detail_description_selector)?,
            shape: parse_optional(&config.detail_shape_selector)?,
            glass_group: parse_optional(&config.detail_glass_group_selector)?,
            dyed: parse_optional(&config.detail_dyed_selector)?,
            galvanized: parse_optional(&config.detail_galvanized_selector)?,
            plating: parse_optional(&config.detail_plating_selector)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.shape.is_none()
            && self.glass_group.is_none()
            && self.dyed.is_none()
            && self.galvanized.is_none()
            && self.plating.is_none()
    }
}

/// Parsed selectors and patterns for one site
#[derive(Debug, Clone)]
pub struct SiteRules {
    pub item: Selector,
    pub link: Option<Selector>,
    pub name: Selector,
    pub image: Option<Selector>,
    pub price: Option<Selector>,
    /// Tried in order, first match wins
    pub next_page: Vec<Selector>,
    /// Case-insensitive alternation of every noise phrase
    pub name_noise: Option<Regex>,
    pub category: Option<Selector>,
    pub detail_color: Option<Selector>,
    pub detail_finish: Option<Selector>,
    pub detail_fields: DetailFieldRules,
    /// Tried in order, first match wins
    pub code_patterns: Vec<CodePattern>,
}

impl SiteRules {
    /// Compiles the text rules of a site
    ///
    /// # Returns
    ///
    /// * `Err(ConfigError::InvalidSelector)` - A selector does not parse
    /// * `Err(ConfigError::InvalidCodePattern)` - A pattern does not compile or lacks a group
    pub fn compile(config: &RulesConfig) -> Result<Self, ConfigError> {
        let next_page = config
            .next_page_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>, _>>()?;

        let code_patterns = config
            .code_patterns
            .iter()
            .map(CodePattern::compile)
            .collect::<Result<Vec<_>, _>>()?;

        let phrases: Vec<String> = config
            .name_noise
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| regex::escape(p.trim()))
            .collect();
        let name_noise = if phrases.is_empty() {
            None
        } else {
            let pattern = format!("(?i){}", phrases.join("|"));
            Some(
                Regex::new(&pattern).map_err(|e| ConfigError::InvalidCodePattern {
                    pattern,
                    message: e.to_string(),
                })?,
            )
        };

        Ok(Self {
            item: parse_selector(&config.item_selector)?,
            link: parse_optional(&config.link_selector)?,
            name: parse_selector(&config.name_selector)?,
            image: parse_optional(&config.image_selector)?,
            price: parse_optional(&config.price_selector)?,
            next_page,
            name_noise,
            category: parse_optional(&config.category_selector)?,
            detail_color: parse_optional(&config.detail_color_selector)?,
            detail_finish: parse_optional(&config.detail_finish_selector)?,
            detail_fields: DetailFieldRules::compile(config)?,
            code_patterns,
        })
    }

    /// Whether items should be completed from their own detail page
    pub fn has_detail_rules(&self) -> bool {
        self.detail_color.is_some() || self.detail_finish.is_some() || !self.detail_fields.is_empty()
    }

    /// Runs the code patterns in order over `text`
    pub fn find_code(&self, text: &str) -> Option<(ProductCode, std::ops::Range<usize>)> {
        self.code_patterns.iter().find_map(|p| p.find(text))
    }
}
