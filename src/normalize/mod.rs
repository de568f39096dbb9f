//! Pure classification and normalization
//!
//! - [`CodeClassifier`] maps canonical product codes to size labels.
//! - [`CanonicalVocabulary`] matches free text against known colour or finish names.
//! - [`AttributeNormalizer`] applies both vocabularies to one item in a fixed order.

mod attributes;
mod classifier;
mod vocabulary;

pub use attributes::{AttributeNormalizer, NormalizedAttributes};
pub use classifier::{CodeClassifier, SizeLabel, SizeTable};
pub use vocabulary::{clean_fragment, CanonicalVocabulary, VocabularyDomain, VocabularySnapshot};
