//! Canonical colour and finish vocabularies
//!
//! Matching is case-insensitive containment: every entry found anywhere in the
//! text is reported, so "Silver-Lined" yields both "Silver-Lined" and "Lined"
//! when both are known. Stripping removes the longest entries first.

use crate::storage::VocabularySource;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Attribute domains backed by a vocabulary table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VocabularyDomain {
    Color,
    Finish,
}

impl fmt::Display for VocabularyDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color => write!(f, "color"),
            Self::Finish => write!(f, "finish"),
        }
    }
}

/// Ordered set of distinct known names for one domain
#[derive(Debug, Clone)]
pub struct CanonicalVocabulary {
    domain: VocabularyDomain,
    names: BTreeSet<String>,
    by_lowercase: HashMap<String, String>,
    stripper: Option<Regex>,
}

impl CanonicalVocabulary {
    /// Builds a vocabulary; names differing only by case collapse to the first seen
    pub fn new<I, S>(domain: VocabularyDomain, names: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut by_lowercase = HashMap::new();
        let mut names_set = BTreeSet::new();
        for name in names {
            let name = clean_fragment(name.as_ref());
            if name.is_empty() {
                continue;
            }
            let key = name.to_lowercase();
            if !by_lowercase.contains_key(&key) {
                by_lowercase.insert(key, name.clone());
                names_set.insert(name);
            }
        }

        let stripper = if names_set.is_empty() {
            None
        } else {
            let mut terms: Vec<&String> = names_set.iter().collect();
            terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
            let alternation = terms
                .iter()
                .map(|term| regex::escape(term))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!("(?i)(?:{})", alternation))?)
        };

        Ok(Self {
            domain,
            names: names_set,
            by_lowercase,
            stripper,
        })
    }

    pub fn domain(&self) -> VocabularyDomain {
        self.domain
    }

    /// Names in lexical order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Vocabulary entries contained in `text`, with no fallback
    pub fn matches(&self, text: &str) -> BTreeSet<String> {
        let haystack = text.to_lowercase();
        self.by_lowercase
            .iter()
            .filter(|(key, _)| haystack.contains(key.as_str()))
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Removes every vocabulary entry from `text` and cleans the remainder
    pub fn strip(&self, text: &str) -> String {
        match &self.stripper {
            Some(stripper) => clean_fragment(&stripper.replace_all(text, " ")),
            None => clean_fragment(text),
        }
    }

    /// Vocabulary entries in `text`, or the cleaned text itself when none match
    ///
    /// Empty or punctuation-only input yields an empty set; any other input
    /// yields at least one name.
    pub fn normalize(&self, text: &str) -> BTreeSet<String> {
        let cleaned = clean_fragment(text);
        if cleaned.is_empty() {
            return BTreeSet::new();
        }

        let hits = self.matches(&cleaned);
        if hits.is_empty() {
            BTreeSet::from([cleaned])
        } else {
            hits
        }
    }
}

/// Collapses whitespace and trims separator punctuation from both ends
pub fn clean_fragment(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '-' | '/' | '|' | ':' | ';' | '#' | '.'))
        .to_string()
}

/// Read-only pair of vocabularies taken once at the start of a crawl
#[derive(Debug, Clone)]
pub struct VocabularySnapshot {
    pub colors: CanonicalVocabulary,
    pub finishes: CanonicalVocabulary,
}

impl VocabularySnapshot {
    /// Reads both vocabularies from the catalog store
    pub fn load<S: VocabularySource + ?Sized>(source: &S) -> crate::Result<Self> {
        let colors = source.list_all_names(VocabularyDomain::Color)?;
        let finishes = source.list_all_names(VocabularyDomain::Finish)?;
        Self::from_names(colors, finishes)
    }

    pub fn from_names<C, F>(colors: C, finishes: F) -> crate::Result<Self>
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        F: IntoIterator,
        F::Item: AsRef<str>,
    {
        Ok(Self {
            colors: CanonicalVocabulary::new(VocabularyDomain::Color, colors)?,
            finishes: CanonicalVocabulary::new(VocabularyDomain::Finish, finishes)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageResult;

    fn finishes() -> CanonicalVocabulary {
        CanonicalVocabulary::new(VocabularyDomain::Finish, ["Matte", "Luster", "AB"]).unwrap()
    }

    #[test]
    fn test_transparent_ab_luster() {
        let found = finishes().matches("Transparent AB Luster");
        assert_eq!(found, BTreeSet::from(["AB".to_string(), "Luster".to_string()]));
        assert_eq!(
            finishes().normalize("Transparent AB Luster"),
            BTreeSet::from(["AB".to_string(), "Luster".to_string()])
        );
    }

    #[test]
    fn test_case_insensitive_returns_canonical_spelling() {
        let found = finishes().matches("matte ab");
        assert_eq!(found, BTreeSet::from(["AB".to_string(), "Matte".to_string()]));
    }

    #[test]
    fn test_no_match_returns_cleaned_fragment() {
        let normalized = finishes().normalize("  Crystal   Clear , ");
        assert_eq!(normalized, BTreeSet::from(["Crystal Clear".to_string()]));
    }

    #[test]
    fn test_empty_input_is_empty_set() {
        assert!(finishes().normalize("").is_empty());
        assert!(finishes().normalize(" - , ").is_empty());
    }

    #[test]
    fn test_contained_entries_are_all_reported() {
        let vocab = CanonicalVocabulary::new(
            VocabularyDomain::Finish,
            ["Lined", "Silver-Lined", "Opaque"],
        )
        .unwrap();
        assert_eq!(
            vocab.matches("Silver-Lined Opaque Crystal"),
            BTreeSet::from([
                "Lined".to_string(),
                "Opaque".to_string(),
                "Silver-Lined".to_string()
            ])
        );
        assert_eq!(vocab.strip("Silver-Lined Opaque Crystal"), "Crystal");
    }

    #[test]
    fn test_match_inside_compound_word() {
        let colors = CanonicalVocabulary::new(VocabularyDomain::Color, ["Silver"]).unwrap();
        assert_eq!(
            colors.matches("Silverlined Topaz"),
            BTreeSet::from(["Silver".to_string()])
        );
    }

    #[test]
    fn test_repeated_term_reported_once() {
        assert_eq!(
            finishes().matches("Matte matte MATTE"),
            BTreeSet::from(["Matte".to_string()])
        );
    }

    #[test]
    fn test_names_lexical_and_deduplicated() {
        let vocab =
            CanonicalVocabulary::new(VocabularyDomain::Color, ["Red", "blue", "Blue", "Amber"])
                .unwrap();
        let names: Vec<&str> = vocab.names().collect();
        assert_eq!(names, vec!["Amber", "Red", "blue"]);
    }

    #[test]
    fn test_parenthesised_entry() {
        let vocab =
            CanonicalVocabulary::new(VocabularyDomain::Finish, ["AB (Aurora Borealis)"]).unwrap();
        assert_eq!(
            vocab.matches("Crystal AB (Aurora Borealis)"),
            BTreeSet::from(["AB (Aurora Borealis)".to_string()])
        );
    }

    #[test]
    fn test_empty_vocabulary_falls_back() {
        let vocab = CanonicalVocabulary::new(VocabularyDomain::Color, Vec::<String>::new()).unwrap();
        assert!(vocab.matches("Red").is_empty());
        assert_eq!(vocab.normalize("Red"), BTreeSet::from(["Red".to_string()]));
    }

    struct FixedSource;

    impl VocabularySource for FixedSource {
        fn list_all_names(&self, domain: VocabularyDomain) -> StorageResult<Vec<String>> {
            Ok(match domain {
                VocabularyDomain::Color => vec!["Blue".to_string()],
                VocabularyDomain::Finish => vec!["Matte".to_string(), "AB".to_string()],
            })
        }
    }

    #[test]
    fn test_snapshot_load() {
        let snapshot = VocabularySnapshot::load(&FixedSource).unwrap();
        assert_eq!(snapshot.colors.len(), 1);
        assert_eq!(snapshot.finishes.names().collect::<Vec<_>>(), vec!["AB", "Matte"]);
        assert_eq!(snapshot.finishes.domain(), VocabularyDomain::Finish);
    }
}
