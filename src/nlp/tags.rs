//! Tag vocabulary
//!
//! The closed set of coarse part-of-speech tags and fine-grained tags an
//! annotator may emit. Stage filters are checked against it at construction
//! time so that a typo like `"NOUNS"` fails fast instead of silently matching
//! nothing.

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

/// Universal Dependencies coarse POS tags (plus the annotator's `EOL`/`SPACE`).
pub const UNIVERSAL_POS_TAGS: &[&str] = &[
    "ADJ", "ADP", "ADV", "AUX", "CONJ", "CCONJ", "DET", "INTJ", "NOUN", "NUM", "PART", "PRON",
    "PROPN", "PUNCT", "SCONJ", "SYM", "VERB", "X", "EOL", "SPACE",
];

/// Penn Treebank fine-grained tags, including the punctuation tags.
pub const PENN_TREEBANK_TAGS: &[&str] = &[
    ".", ",", "-LRB-", "-RRB-", "``", "\"\"", "''", ":", "$", "#", "AFX", "CC", "CD", "DT", "EX",
    "FW", "HYPH", "IN", "JJ", "JJR", "JJS", "LS", "MD", "NIL", "NN", "NNP", "NNPS", "NNS", "PDT",
    "POS", "PRP", "PRP$", "RB", "RBR", "RBS", "RP", "SP", "TO", "UH", "VB", "VBD", "VBG", "VBN",
    "VBP", "VBZ", "WDT", "WP", "WP$", "WRB", "ADD", "NFP", "GW", "XX", "BES", "HVS", "_SP",
];

static ENGLISH: Lazy<TagVocabulary> = Lazy::new(|| {
    TagVocabulary::from_tags(UNIVERSAL_POS_TAGS.iter().chain(PENN_TREEBANK_TAGS))
});

/// A closed set of valid tag strings. Membership is case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct TagVocabulary {
    tags: FxHashSet<String>,
}

impl TagVocabulary {
    /// The English vocabulary: universal POS tags and Penn Treebank tags.
    pub fn english() -> &'static TagVocabulary {
        &ENGLISH
    }

    /// Build a vocabulary from a custom tag list.
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tags: tags.into_iter().map(|t| t.as_ref().to_string()).collect(),
        }
    }

    /// Check if a tag is part of the vocabulary
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// First value of `values` not in the vocabulary, if any.
    pub fn first_unknown<'a, S: AsRef<str>>(&self, values: &'a [S]) -> Option<&'a str> {
        values
            .iter()
            .map(AsRef::as_ref)
            .find(|v| !self.contains(v))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
