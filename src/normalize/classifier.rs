use crate::config::SizeEntry;
use std::collections::HashMap;

/// Result of classifying a product code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeLabel {
    Known(String),
    /// The prefix is not in the size table; the item must not be persisted
    Unknown,
}

/// Exact prefix to size label table
#[derive(Debug, Clone, Default)]
pub struct SizeTable {
    entries: HashMap<String, String>,
}

impl SizeTable {
    /// Builds the table from config rows; prefixes compare case-insensitively
    pub fn from_entries(entries: &[SizeEntry]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|e| (e.prefix.to_uppercase(), e.label.clone()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows sorted by prefix, for reports
    pub fn rows(&self) -> Vec<(&str, &str)> {
        let mut rows: Vec<(&str, &str)> = self
            .entries
            .iter()
            .map(|(p, l)| (p.as_str(), l.as_str()))
            .collect();
        rows.sort();
        rows
    }
}

/// Maps a canonical product code to its size label
#[derive(Debug, Clone)]
pub struct CodeClassifier {
    table: SizeTable,
}

impl CodeClassifier {
    pub fn new(table: SizeTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &SizeTable {
        &self.table
    }

    /// Classifies a code by the segment before its first hyphen
    ///
    /// `"DB-0123"` looks up `"DB"`; a code without a hyphen is looked up whole.
    /// Anything absent from the table is [`SizeLabel::Unknown`].
    pub fn classify(&self, code: &str) -> SizeLabel {
        let prefix = code.split('-').next().unwrap_or_default().trim();
        match self.table.entries.get(&prefix.to_uppercase()) {
            Some(label) => SizeLabel::Known(label.clone()),
            None => SizeLabel::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delica() -> CodeClassifier {
        let rows = [("DBS", "15/0"), ("DB", "11/0"), ("DBM", "10/0"), ("DBL", "8/0")];
        CodeClassifier::new(SizeTable::from_entries(
            &rows
                .iter()
                .map(|(p, l)| SizeEntry {
                    prefix: p.to_string(),
                    label: l.to_string(),
                })
                .collect::<Vec<_>>(),
        ))
    }

    #[test]
    fn test_known_prefixes() {
        let classifier = delica();
        assert_eq!(classifier.classify("DB-123"), SizeLabel::Known("11/0".into()));
        assert_eq!(classifier.classify("DBS-0012"), SizeLabel::Known("15/0".into()));
        assert_eq!(classifier.classify("DBM-0001"), SizeLabel::Known("10/0".into()));
        assert_eq!(classifier.classify("DBL-0401-B"), SizeLabel::Known("8/0".into()));
    }

    #[test]
    fn test_lookup_is_exact_not_prefix() {
        let classifier = delica();
        assert_eq!(classifier.classify("DBX-1"), SizeLabel::Unknown);
        assert_eq!(classifier.classify("D-1"), SizeLabel::Unknown);
    }

    #[test]
    fn test_unknown_codes() {
        let classifier = delica();
        assert_eq!(classifier.classify("XX-999"), SizeLabel::Unknown);
        assert_eq!(classifier.classify(""), SizeLabel::Unknown);
        assert_eq!(classifier.classify("-"), SizeLabel::Unknown);
    }

    #[test]
    fn test_case_insensitive_prefix() {
        assert_eq!(delica().classify("db-5"), SizeLabel::Known("11/0".into()));
    }

    #[test]
    fn test_rows_sorted() {
        let classifier = delica();
        let prefixes: Vec<&str> = classifier.table().rows().iter().map(|r| r.0).collect();
        assert_eq!(prefixes, vec!["DB", "DBL", "DBM", "DBS"]);
    }
}
