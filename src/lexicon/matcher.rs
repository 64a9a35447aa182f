//! Lexicon pattern compiler
//!
//! Each category compiles to one anchored, case-insensitive alternation:
//!
//! ```text
//! ["good", "marvel*", "awful*"]  →  (?i)^(?:good|(?:marvel|awful)\p{L}*)$
//! ```
//!
//! All prefixes share a single letter run, so categories with thousands of
//! wildcard entries stay well under the compiled-size limit.
//!
//! Literal text is escaped, so punctuation in entries (`"c++"`, `"o.k."`)
//! never acts as pattern syntax. A category without entries matches nothing.

use regex::{Regex, RegexBuilder};

use super::{Lexicon, LexiconEntry};
use crate::pipeline::errors::ConfigError;
use crate::types::Token;

/// Pattern fragment a trailing wildcard expands to.
const LETTER_RUN: &str = r"\p{L}*";

/// Compiled-size ceiling for one category, in bytes.
const SIZE_LIMIT: usize = 64 * (1 << 20);

/// Compiled matcher for one lexicon category.
#[derive(Debug, Clone)]
pub struct CategoryMatcher {
    category: String,
    regex: Option<Regex>,
}

impl CategoryMatcher {
    /// Compile the entries of one category.
    pub fn compile<S: AsRef<str>>(category: &str, entries: &[S]) -> Result<Self, ConfigError> {
        let mut alternatives = Vec::with_capacity(entries.len() + 1);
        let mut prefixes = Vec::new();
        for raw in entries {
            match LexiconEntry::parse(category, raw.as_ref())? {
                LexiconEntry::Literal(word) => alternatives.push(regex::escape(word)),
                LexiconEntry::Prefix(prefix) => prefixes.push(regex::escape(prefix)),
            }
        }
        if !prefixes.is_empty() {
            alternatives.push(format!("(?:{}){}", prefixes.join("|"), LETTER_RUN));
        }

        let regex = if alternatives.is_empty() {
            None
        } else {
            let pattern = format!("(?i)^(?:{})$", alternatives.join("|"));
            let compiled = RegexBuilder::new(&pattern)
                .size_limit(SIZE_LIMIT)
                .build()
                .map_err(|source| ConfigError::Pattern {
                    category: category.to_string(),
                    source,
                })?;
            Some(compiled)
        };

        Ok(Self {
            category: category.to_string(),
            regex,
        })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// The compiled pattern, `None` for an empty category.
    pub fn pattern(&self) -> Option<&str> {
        self.regex.as_ref().map(Regex::as_str)
    }

    /// Whether the whole of `word` matches an entry.
    pub fn is_match(&self, word: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(word))
    }

    /// Whether the token's text or its lemma matches.
    ///
    /// A token without a lemma never matches.
    pub fn matches_token(&self, token: &Token) -> bool {
        match token.lemma() {
            Some(lemma) => self.is_match(&token.text) || self.is_match(lemma),
            None => false,
        }
    }
}

/// All categories of a lexicon, compiled, in lexicon order.
#[derive(Debug, Clone, Default)]
pub struct CompiledLexicon {
    matchers: Vec<CategoryMatcher>,
}

impl CompiledLexicon {
    /// Compile every category; fails on the first malformed entry.
    pub fn compile(lexicon: &Lexicon) -> Result<Self, ConfigError> {
        let matchers = lexicon
            .categories()
            .map(|(category, entries)| CategoryMatcher::compile(category, entries))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { matchers })
    }

    pub fn get(&self, category: &str) -> Option<&CategoryMatcher> {
        self.matchers.iter().find(|m| m.category == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryMatcher> {
        self.matchers.iter()
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Categories whose matcher accepts `word`, in lexicon order.
    pub fn categories_of(&self, word: &str) -> Vec<&str> {
        self.matchers
            .iter()
            .filter(|m| m.is_match(word))
            .map(CategoryMatcher::category)
            .collect()
    }
}
