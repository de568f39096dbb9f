//! Strategy objects for per-site naming quirks

use std::sync::Arc;

/// Derives the descriptive part of an item name
///
/// Input is the name with the product code and noise phrases already removed.
pub trait SiteQuirks: Send + Sync {
    fn descriptor(&self, cleaned_name: &str) -> Option<String>;
}

/// Uses the whole cleaned name
pub struct FullDescriptor;

impl SiteQuirks for FullDescriptor {
    fn descriptor(&self, cleaned_name: &str) -> Option<String> {
        let text = cleaned_name.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Uses the last comma-separated segment, for names like
/// "Delica Beads, 11/0, Opaque Red"
pub struct LastSegmentDescriptor;

impl SiteQuirks for LastSegmentDescriptor {
    fn descriptor(&self, cleaned_name: &str) -> Option<String> {
        cleaned_name
            .rsplit(',')
            .map(str::trim)
            .find(|segment| !segment.is_empty())
            .map(str::to_string)
    }
}

/// Looks up a descriptor strategy by its config name
pub fn descriptor_strategy(name: &str) -> Option<Arc<dyn SiteQuirks>> {
    match name {
        "full" => Some(Arc::new(FullDescriptor)),
        "last-segment" => Some(Arc::new(LastSegmentDescriptor)),
        _ => None,
    }
}
