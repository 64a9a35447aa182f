//! Wildcard lexicons
//!
//! A [`Lexicon`] maps category names to word lists in the style of LIWC-like
//! dictionaries. Each entry is either a literal word (`"good"`) or a prefix
//! followed by a trailing wildcard (`"marvel*"`), which also accepts any run
//! of letters after the prefix. Matching is case-insensitive.
//!
//! ```json
//! { "pos": ["good", "marvel*"], "neg": ["bad", "awful*"] }
//! ```
//!
//! Lexicons are compiled once, at stage construction, into one
//! [`CategoryMatcher`] per category (see [`matcher`]).

pub mod matcher;

pub use matcher::{CategoryMatcher, CompiledLexicon};

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::pipeline::errors::ConfigError;

/// Marker for "zero or more letters" at the end of an entry.
pub const WILDCARD: char = '*';

/// Ordered mapping from category name to entry list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lexicon {
    categories: IndexMap<String, Vec<String>>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a category.
    pub fn insert<S: Into<String>>(
        &mut self,
        category: impl Into<String>,
        entries: impl IntoIterator<Item = S>,
    ) {
        self.categories
            .insert(category.into(), entries.into_iter().map(Into::into).collect());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_category<S: Into<String>>(
        mut self,
        category: impl Into<String>,
        entries: impl IntoIterator<Item = S>,
    ) -> Self {
        self.insert(category, entries);
        self
    }

    /// Entries of `category`, if present.
    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    /// Categories with their entries, in insertion order.
    pub fn categories(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Parse a JSON object of `category -> [entries]`.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON word-list file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Check every entry without compiling anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (category, entries) in self.categories() {
            for entry in entries {
                LexiconEntry::parse(category, entry)?;
            }
        }
        Ok(())
    }
}

impl<K, V> FromIterator<(K, Vec<V>)> for Lexicon
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, Vec<V>)>>(iter: T) -> Self {
        let mut lexicon = Lexicon::new();
        for (category, entries) in iter {
            lexicon.insert(category, entries);
        }
        lexicon
    }
}

/// One parsed lexicon entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexiconEntry<'a> {
    /// Must equal the whole word.
    Literal(&'a str),
    /// The word must start with this prefix and continue with letters only.
    Prefix(&'a str),
}

impl<'a> LexiconEntry<'a> {
    /// Parse `raw`, rejecting empty entries and wildcards anywhere but the end.
    pub fn parse(category: &str, raw: &'a str) -> Result<Self, ConfigError> {
        let malformed = |reason| ConfigError::MalformedEntry {
            category: category.to_string(),
            entry: raw.to_string(),
            reason,
        };

        if raw.is_empty() {
            return Err(malformed("entry is empty"));
        }
        let (body, is_prefix) = match raw.strip_suffix(WILDCARD) {
            Some(body) => (body, true),
            None => (raw, false),
        };
        if body.contains(WILDCARD) {
            return Err(malformed("wildcard is only allowed as the final character"));
        }
        Ok(if is_prefix {
            LexiconEntry::Prefix(body)
        } else {
            LexiconEntry::Literal(body)
        })
    }

    /// Literal text of the entry (the prefix for wildcard entries).
    pub fn text(&self) -> &'a str {
        match self {
            Self::Literal(s) | Self::Prefix(s) => s,
        }
    }
}
