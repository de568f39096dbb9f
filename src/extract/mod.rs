//! Field extraction
//!
//! Per-site rules are data ([`SiteRules`]); one generic [`FieldExtractor`]
//! reads every site, with [`SiteQuirks`] strategies covering naming oddities.

mod dom;
mod extractor;
mod quirks;
mod rules;

use crate::storage::ItemDetails;

pub use dom::{element_text, first_attr, resolve_link};
pub use extractor::{ExtractOutcome, FieldExtractor};
pub use quirks::{descriptor_strategy, FullDescriptor, LastSegmentDescriptor, SiteQuirks};
pub use rules::{parse_selector, CodePattern, DetailFieldRules, ProductCode, SiteRules};

/// Raw per-item fields as read from a listing entry, refined by a detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItemFields {
    pub name: String,
    /// Canonical code, e.g. `DB-0123`
    pub product_code: String,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub raw_color_text: Option<String>,
    pub raw_finish_text: Option<String>,
    pub source_url: String,
    /// Filled in from the detail page only
    pub details: ItemDetails,
}
