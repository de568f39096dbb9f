//! Generic per-entry field extraction driven by [`SiteRules`]

use crate::extract::dom::{element_text, first_attr, resolve_link};
use crate::extract::quirks::SiteQuirks;
use crate::extract::{RawItemFields, SiteRules};
use crate::normalize::{clean_fragment, CodeClassifier, SizeLabel};
use crate::storage::ItemDetails;
use scraper::ElementRef;
use tracing::trace;
use url::Url;

const IMAGE_ATTRS: &[&str] = &["src", "data-src", "data-original"];

/// Result of reading one listing entry
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractOutcome {
    Item(RawItemFields),
    /// No code, or a code the size table does not know; expected and skipped
    Unrecognized { reason: String },
    /// A required element is missing; the entry is skipped with a warning
    Malformed { reason: String },
}

/// Reads listing entries into [`RawItemFields`]
pub struct FieldExtractor<'a> {
    rules: &'a SiteRules,
    quirks: &'a dyn SiteQuirks,
    classifier: &'a CodeClassifier,
}

impl<'a> FieldExtractor<'a> {
    pub fn new(
        rules: &'a SiteRules,
        quirks: &'a dyn SiteQuirks,
        classifier: &'a CodeClassifier,
    ) -> Self {
        Self {
            rules,
            quirks,
            classifier,
        }
    }

    /// Extracts one entry found on the page at `page_url`
    ///
    /// The code is searched in the name first, then in the item link. The
    /// first matching pattern decides the code; a code whose prefix has no
    /// size label is reported as unrecognized rather than defaulted.
    pub fn extract(&self, entry: ElementRef<'_>, page_url: &Url) -> ExtractOutcome {
        let name = match entry.select(&self.rules.name).next().map(element_text) {
            Some(name) if !name.is_empty() => name,
            _ => {
                return ExtractOutcome::Malformed {
                    reason: "entry has no name element".to_string(),
                }
            }
        };

        let source_url = match &self.rules.link {
            Some(selector) => {
                let href = entry
                    .select(selector)
                    .next()
                    .and_then(|link| link.value().attr("href"));
                match href.and_then(|href| resolve_link(page_url, href)) {
                    Some(url) => url,
                    None => {
                        return ExtractOutcome::Malformed {
                            reason: format!("entry '{}' has no usable link", name),
                        }
                    }
                }
            }
            None => page_url.clone(),
        };

        let (code, code_span) = match self.rules.find_code(&name) {
            Some((code, span)) => (code, Some(span)),
            None => match self.rules.find_code(source_url.path()) {
                Some((code, _)) => (code, None),
                None => {
                    return ExtractOutcome::Unrecognized {
                        reason: format!("no product code in '{}'", name),
                    }
                }
            },
        };

        if let SizeLabel::Unknown = self.classifier.classify(&code.code) {
            return ExtractOutcome::Unrecognized {
                reason: format!("code {} has no known size", code.code),
            };
        }

        let mut remainder = match code_span {
            Some(span) => format!("{} {}", &name[..span.start], &name[span.end..]),
            None => name.clone(),
        };
        if let Some(noise) = &self.rules.name_noise {
            remainder = noise.replace_all(&remainder, " ").into_owned();
        }
        let raw_color_text = self.quirks.descriptor(&clean_fragment(&remainder));

        let image_url = self
            .rules
            .image
            .as_ref()
            .and_then(|selector| entry.select(selector).next())
            .and_then(|img| first_attr(img, IMAGE_ATTRS))
            .and_then(|src| resolve_link(page_url, src))
            .map(String::from);

        let price = self
            .rules
            .price
            .as_ref()
            .and_then(|selector| entry.select(selector).next())
            .map(element_text)
            .filter(|text| !text.is_empty());

        trace!(code = %code.code, descriptor = ?raw_color_text, "Extracted entry");

        ExtractOutcome::Item(RawItemFields {
            name,
            product_code: code.code,
            image_url,
            price,
            raw_color_text,
            raw_finish_text: None,
            source_url: source_url.to_string(),
            details: ItemDetails::default(),
        })
    }
}
