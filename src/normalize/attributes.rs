use crate::normalize::VocabularySnapshot;
use std::collections::BTreeSet;

/// Normalized attribute sets of one item; sets may be empty, never absent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedAttributes {
    pub size_label: String,
    pub color_names: BTreeSet<String>,
    pub finish_names: BTreeSet<String>,
}

/// Turns raw descriptive text into colour and finish name sets
///
/// The order is fixed: finishes are resolved first, then every finish term is
/// stripped from the colour text before colours are matched. A term present
/// in both vocabularies (say "Silver" and "Silver-Lined") is therefore only
/// ever claimed by the finish side.
pub struct AttributeNormalizer<'a> {
    snapshot: &'a VocabularySnapshot,
}

impl<'a> AttributeNormalizer<'a> {
    pub fn new(snapshot: &'a VocabularySnapshot) -> Self {
        Self { snapshot }
    }

    /// Finish names of an item
    ///
    /// A dedicated finish text is normalized with fallback. Without one, only
    /// vocabulary finishes found in the colour text are returned.
    pub fn finishes(&self, raw_color: Option<&str>, raw_finish: Option<&str>) -> BTreeSet<String> {
        let finishes = &self.snapshot.finishes;
        match raw_finish.filter(|s| !s.trim().is_empty()) {
            Some(text) => finishes.normalize(text),
            None => raw_color.map(|t| finishes.matches(t)).unwrap_or_default(),
        }
    }

    /// Colour names of an item, after finish terms are stripped
    pub fn colors(&self, raw_color: Option<&str>) -> BTreeSet<String> {
        match raw_color {
            Some(text) => {
                let remainder = self.snapshot.finishes.strip(text);
                self.snapshot.colors.normalize(&remainder)
            }
            None => BTreeSet::new(),
        }
    }

    pub fn normalize(
        &self,
        size_label: &str,
        raw_color: Option<&str>,
        raw_finish: Option<&str>,
    ) -> NormalizedAttributes {
        NormalizedAttributes {
            size_label: size_label.to_string(),
            finish_names: self.finishes(raw_color, raw_finish),
            color_names: self.colors(raw_color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> VocabularySnapshot {
        VocabularySnapshot::from_names(
            ["Transparent", "Silver", "Blue", "Red"],
            ["AB", "Luster", "Matte", "Silver-Lined"],
        )
        .unwrap()
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_finishes_stripped_before_colors() {
        let snapshot = snapshot();
        let attrs = AttributeNormalizer::new(&snapshot).normalize(
            "11/0",
            Some("Silver-Lined Blue AB"),
            None,
        );
        assert_eq!(attrs.finish_names, set(&["AB", "Silver-Lined"]));
        assert_eq!(attrs.color_names, set(&["Blue"]));
        assert_eq!(attrs.size_label, "11/0");
    }

    #[test]
    fn test_listing_text_without_finish_terms() {
        let snapshot = snapshot();
        let attrs = AttributeNormalizer::new(&snapshot).normalize("11/0", Some("Transparent Red"), None);
        assert!(attrs.finish_names.is_empty());
        assert_eq!(attrs.color_names, set(&["Red", "Transparent"]));
    }

    #[test]
    fn test_unknown_colour_kept_as_ad_hoc_entry() {
        let snapshot = snapshot();
        let attrs = AttributeNormalizer::new(&snapshot).normalize("11/0", Some("Matte Mauve"), None);
        assert_eq!(attrs.finish_names, set(&["Matte"]));
        assert_eq!(attrs.color_names, set(&["Mauve"]));
    }

    #[test]
    fn test_dedicated_finish_text_falls_back() {
        let snapshot = snapshot();
        let attrs = AttributeNormalizer::new(&snapshot).normalize(
            "11/0",
            Some("Blue"),
            Some("Duracoat Galvanized"),
        );
        assert_eq!(attrs.finish_names, set(&["Duracoat Galvanized"]));
        assert_eq!(attrs.color_names, set(&["Blue"]));
    }

    #[test]
    fn test_colour_text_of_only_finishes_yields_no_colour() {
        let snapshot = snapshot();
        let attrs = AttributeNormalizer::new(&snapshot).normalize("11/0", Some("Matte AB"), None);
        assert_eq!(attrs.finish_names, set(&["AB", "Matte"]));
        assert!(attrs.color_names.is_empty());
    }

    #[test]
    fn test_absent_text() {
        let snapshot = snapshot();
        let attrs = AttributeNormalizer::new(&snapshot).normalize("8/0", None, None);
        assert!(attrs.finish_names.is_empty());
        assert!(attrs.color_names.is_empty());
    }

    #[test]
    fn test_repeatable() {
        let snapshot = snapshot();
        let normalizer = AttributeNormalizer::new(&snapshot);
        let a = normalizer.normalize("11/0", Some("Transparent Blue AB Luster"), None);
        let b = normalizer.normalize("11/0", Some("Transparent Blue AB Luster"), None);
        assert_eq!(a, b);
    }
}
