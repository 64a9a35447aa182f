//! Lexicon counting stage
//!
//! For every category of a [`Lexicon`] this stage registers two attributes:
//!
//! - a Token flag, `true` when the token's text or lemma matches the
//!   category and the token passes the configured filters;
//! - a Document count, `count_of_<flag name>`, the number of flagged tokens.
//!
//! Attribute names are built from `[prefix, category, "from", stage name,
//! suffix]`, skipping empty parts and joining with `_`, so two instances of
//! the stage with different lexicons never collide:
//!
//! ```text
//! stage "LIWC", category "posemo"           →  posemo_from_LIWC
//!                                              count_of_posemo_from_LIWC
//! stage "LIWC", prefix "is", suffix "word"  →  is_posemo_from_LIWC_word
//! ```

use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::extension::ExtensionRegistry;
use crate::lexicon::{CategoryMatcher, CompiledLexicon, Lexicon};
use crate::nlp::tags::TagVocabulary;
use crate::pipeline::errors::ConfigError;
use crate::pipeline::traits::{Stage, StageKind};
use crate::types::{Document, Token, Value};

/// Word between the category and the stage name in attribute names.
const NAME_SEPARATOR_WORD: &str = "from";

/// Prefix of the document-level count attribute.
pub const COUNT_PREFIX: &str = "count_of_";

/// Options of a [`LexiconCountStage`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconCountConfig {
    pub lexicon: Lexicon,
    /// Leading name part, e.g. `"is"`.
    pub prefix: Option<String>,
    /// Trailing name part.
    pub suffix: Option<String>,
    /// Tokens with one of these lemmas are never flagged.
    pub exclude_lemmas: Vec<String>,
    /// When non-empty, only tokens with one of these coarse POS tags are flagged.
    pub allowed_pos: Vec<String>,
    /// When non-empty, only tokens with one of these fine tags are flagged.
    pub allowed_tags: Vec<String>,
}

impl LexiconCountConfig {
    pub fn new(lexicon: Lexicon) -> Self {
        Self {
            lexicon,
            ..Self::default()
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn exclude_lemmas<S: Into<String>>(mut self, lemmas: impl IntoIterator<Item = S>) -> Self {
        self.exclude_lemmas = lemmas.into_iter().map(Into::into).collect();
        self
    }

    pub fn allowed_pos<S: Into<String>>(mut self, pos: impl IntoIterator<Item = S>) -> Self {
        self.allowed_pos = pos.into_iter().map(Into::into).collect();
        self
    }

    pub fn allowed_tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.allowed_tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Lemma/POS/tag filters, frozen at construction. An empty set passes
/// every token.
#[derive(Debug, Clone, Default)]
struct TokenFilter {
    exclude_lemmas: FxHashSet<String>,
    allowed_pos: FxHashSet<String>,
    allowed_tags: FxHashSet<String>,
}

impl TokenFilter {
    fn from_config(config: &LexiconCountConfig) -> Self {
        Self {
            exclude_lemmas: config.exclude_lemmas.iter().cloned().collect(),
            allowed_pos: config.allowed_pos.iter().cloned().collect(),
            allowed_tags: config.allowed_tags.iter().cloned().collect(),
        }
    }

    fn accepts(&self, token: &Token) -> bool {
        let lemma_ok = self.exclude_lemmas.is_empty()
            || token
                .lemma()
                .map_or(true, |lemma| !self.exclude_lemmas.contains(lemma));
        let pos_ok = self.allowed_pos.is_empty() || self.allowed_pos.contains(&token.pos);
        let tag_ok = self.allowed_tags.is_empty() || self.allowed_tags.contains(&token.tag);
        lemma_ok && pos_ok && tag_ok
    }
}

/// Counts lexicon category hits per token and per document.
#[derive(Debug, Clone)]
pub struct LexiconCountStage {
    name: String,
    config: LexiconCountConfig,
    matchers: Vec<Arc<CategoryMatcher>>,
    filter: Arc<TokenFilter>,
}

impl LexiconCountStage {
    /// Validate the filters against the English tag vocabulary and compile
    /// the lexicon.
    pub fn new(name: impl Into<String>, config: LexiconCountConfig) -> Result<Self, ConfigError> {
        Self::with_vocabulary(name, config, TagVocabulary::english())
    }

    /// Like [`new`](Self::new), validating filters against `vocabulary`.
    pub fn with_vocabulary(
        name: impl Into<String>,
        config: LexiconCountConfig,
        vocabulary: &TagVocabulary,
    ) -> Result<Self, ConfigError> {
        let name = name.into();

        for (field, values) in [
            ("allowed_pos", &config.allowed_pos),
            ("allowed_tags", &config.allowed_tags),
        ] {
            if let Some(value) = vocabulary.first_unknown(values) {
                return Err(ConfigError::UnknownTag {
                    stage: name,
                    field,
                    value: value.to_string(),
                });
            }
        }

        let matchers = CompiledLexicon::compile(&config.lexicon)?
            .iter()
            .cloned()
            .map(Arc::new)
            .collect();
        let filter = Arc::new(TokenFilter::from_config(&config));

        Ok(Self {
            name,
            config,
            matchers,
            filter,
        })
    }

    pub fn config(&self) -> &LexiconCountConfig {
        &self.config
    }

    /// Token attribute name for `category`.
    pub fn attribute_name(&self, category: &str) -> String {
        [
            self.config.prefix.as_deref().unwrap_or(""),
            category,
            NAME_SEPARATOR_WORD,
            self.name.as_str(),
            self.config.suffix.as_deref().unwrap_or(""),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
    }

    /// Document attribute name for `category`.
    pub fn count_attribute_name(&self, category: &str) -> String {
        format!("{COUNT_PREFIX}{}", self.attribute_name(category))
    }

    /// `(token attribute, document attribute)` per category, in lexicon order.
    pub fn attribute_names(&self) -> Vec<(String, String)> {
        self.matchers
            .iter()
            .map(|m| {
                (
                    self.attribute_name(m.category()),
                    self.count_attribute_name(m.category()),
                )
            })
            .collect()
    }
}

impl Stage for LexiconCountStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::LexiconCount
    }

    fn install(&self, registry: &mut ExtensionRegistry) {
        for matcher in &self.matchers {
            let token_attr = self.attribute_name(matcher.category());
            let count_attr = self.count_attribute_name(matcher.category());

            let m = Arc::clone(matcher);
            let filter = Arc::clone(&self.filter);
            registry.register::<Token, _>(token_attr.clone(), move |token, _| {
                Value::Bool(m.matches_token(token) && filter.accepts(token))
            });

            registry.register::<Document, _>(count_attr, move |doc, cx| {
                Value::from(cx.count_flagged(&token_attr, &doc.tokens))
            });
        }
    }
}
