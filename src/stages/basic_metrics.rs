//! Basic metrics stage
//!
//! Fixed word-class counts over alphabetic tokens. Each document attribute
//! walks the token list once with only its own predicate;
//! [`BasicCounts::scan`] computes all of them in one pass.

use serde::Serialize;

use crate::extension::ExtensionRegistry;
use crate::pipeline::traits::{Stage, StageKind};
use crate::types::{Document, Token, Value};

/// Lemmas left out of the `*_without_be_and_have` counts.
const BE_AND_HAVE: [&str; 2] = ["be", "have"];

/// Default instance name.
pub const DEFAULT_NAME: &str = "BASIC";

/// Token attributes, in registration order.
pub const TOKEN_ATTRIBUTES: [&str; 2] = ["is_VB", "is_VB_without_be_and_have"];

/// Document attributes, in registration order.
pub const DOC_ATTRIBUTES: [&str; 10] = [
    "WORD_count",
    "NOUN_count",
    "ADJ_count",
    "VERB_count",
    "VERB_count_without_be_and_have",
    "VB_count",
    "VB_count_without_be_and_have",
    "JJ_count",
    "JJRs_count",
    "JJSs_count",
];

fn is_be_or_have(token: &Token) -> bool {
    token.lemma().is_some_and(|lemma| BE_AND_HAVE.contains(&lemma))
}

fn is_base_verb(token: &Token) -> bool {
    token.is_alpha && token.tag == "VB"
}

/// Token test behind one document attribute. Callers filter out
/// non-alphabetic tokens first.
fn predicate_of(attribute: &str) -> Option<fn(&Token) -> bool> {
    let predicate: fn(&Token) -> bool = match attribute {
        "WORD_count" => |_: &Token| true,
        "NOUN_count" => |t: &Token| t.pos == "NOUN",
        "ADJ_count" => |t: &Token| t.pos == "ADJ",
        "VERB_count" => |t: &Token| t.pos == "VERB",
        "VERB_count_without_be_and_have" => |t: &Token| t.pos == "VERB" && !is_be_or_have(t),
        "VB_count" => |t: &Token| t.tag == "VB",
        "VB_count_without_be_and_have" => |t: &Token| t.tag == "VB" && !is_be_or_have(t),
        "JJ_count" => |t: &Token| t.tag == "JJ",
        "JJRs_count" => |t: &Token| t.tag == "JJR",
        "JJSs_count" => |t: &Token| t.tag == "JJS",
        _ => return None,
    };
    Some(predicate)
}

fn count_alpha(tokens: &[Token], predicate: fn(&Token) -> bool) -> usize {
    tokens.iter().filter(|t| t.is_alpha && predicate(t)).count()
}

/// Word-class counts of one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BasicCounts {
    pub words: usize,
    pub nouns: usize,
    pub adjectives: usize,
    pub verbs: usize,
    pub verbs_without_be_and_have: usize,
    pub base_verbs: usize,
    pub base_verbs_without_be_and_have: usize,
    pub jj: usize,
    pub jjr: usize,
    pub jjs: usize,
}

impl BasicCounts {
    /// Count everything in a single pass. Non-alphabetic tokens are skipped.
    pub fn scan(tokens: &[Token]) -> Self {
        let mut counts = Self::default();
        for token in tokens.iter().filter(|t| t.is_alpha) {
            counts.words += 1;
            let be_or_have = is_be_or_have(token);

            match token.pos.as_str() {
                "NOUN" => counts.nouns += 1,
                "ADJ" => counts.adjectives += 1,
                "VERB" => {
                    counts.verbs += 1;
                    if !be_or_have {
                        counts.verbs_without_be_and_have += 1;
                    }
                }
                _ => {}
            }

            match token.tag.as_str() {
                "VB" => {
                    counts.base_verbs += 1;
                    if !be_or_have {
                        counts.base_verbs_without_be_and_have += 1;
                    }
                }
                "JJ" => counts.jj += 1,
                "JJR" => counts.jjr += 1,
                "JJS" => counts.jjs += 1,
                _ => {}
            }
        }
        counts
    }

    /// Count a single document attribute without computing the others.
    pub fn count(tokens: &[Token], attribute: &str) -> Option<usize> {
        predicate_of(attribute).map(|predicate| count_alpha(tokens, predicate))
    }

    /// Count by document attribute name.
    pub fn get(&self, attribute: &str) -> Option<usize> {
        let count = match attribute {
            "WORD_count" => self.words,
            "NOUN_count" => self.nouns,
            "ADJ_count" => self.adjectives,
            "VERB_count" => self.verbs,
            "VERB_count_without_be_and_have" => self.verbs_without_be_and_have,
            "VB_count" => self.base_verbs,
            "VB_count_without_be_and_have" => self.base_verbs_without_be_and_have,
            "JJ_count" => self.jj,
            "JJRs_count" => self.jjr,
            "JJSs_count" => self.jjs,
            _ => return None,
        };
        Some(count)
    }
}

/// Registers the word-class counts.
#[derive(Debug, Clone)]
pub struct BasicMetricsStage {
    name: String,
}

impl BasicMetricsStage {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for BasicMetricsStage {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}

impl Stage for BasicMetricsStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::BasicMetrics
    }

    fn install(&self, registry: &mut ExtensionRegistry) {
        registry.register::<Token, _>(TOKEN_ATTRIBUTES[0], |token, _| {
            Value::Bool(is_base_verb(token))
        });
        registry.register::<Token, _>(TOKEN_ATTRIBUTES[1], |token, _| {
            Value::Bool(is_base_verb(token) && !is_be_or_have(token))
        });

        for attribute in DOC_ATTRIBUTES {
            let Some(predicate) = predicate_of(attribute) else {
                continue;
            };
            registry.register::<Document, _>(attribute, move |doc, _| {
                Value::from(count_alpha(&doc.tokens, predicate))
            });
        }
    }
}
