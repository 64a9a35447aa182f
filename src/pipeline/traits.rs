//! Stage trait definitions for the pipeline.
//!
//! A stage has two phases:
//!
//! - **install** (once, while the pipeline is built): register extension
//!   attributes on the pipeline's [`ExtensionRegistry`].
//! - **process** (once per document): optional work on one document, e.g.
//!   writing a stored attribute. The registry is read-only here.
//!
//! Stages are composed dynamically (`Box<dyn Stage>`) because a pipeline is
//! an ordered, heterogeneous list built from configuration.

use serde::{Deserialize, Serialize};

use crate::extension::ExtensionRegistry;
use crate::types::Document;

/// Built-in stage families. Used by validation rules that care about
/// ordering (e.g. a summary must come last).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    LexiconCount,
    BasicMetrics,
    WordCount,
    Sentences,
    Summary,
    /// Anything implemented outside this crate.
    Custom,
}

impl StageKind {
    /// Returns the user-facing name used in specs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LexiconCount => "lexicon_count",
            Self::BasicMetrics => "basic_metrics",
            Self::WordCount => "word_count",
            Self::Sentences => "sentences",
            Self::Summary => "summary",
            Self::Custom => "custom",
        }
    }
}

/// One unit of a feature-extraction pipeline.
///
/// # Contract
///
/// - `install` is called exactly once per pipeline, in declared stage order,
///   on a single thread.
/// - `process` may run concurrently for different documents and must not
///   depend on anything but the document and the registry.
/// - Attribute getters registered by `install` are pure functions of the
///   container they are given.
pub trait Stage: Send + Sync {
    /// Instance name, unique within a pipeline.
    fn name(&self) -> &str;

    fn kind(&self) -> StageKind {
        StageKind::Custom
    }

    /// Register this stage's extension attributes.
    fn install(&self, registry: &mut ExtensionRegistry);

    /// Per-document work. Most stages only register getters and leave this empty.
    fn process(&self, _doc: &mut Document, _registry: &ExtensionRegistry) {}
}

impl<S: Stage + ?Sized> Stage for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn kind(&self) -> StageKind {
        (**self).kind()
    }

    fn install(&self, registry: &mut ExtensionRegistry) {
        (**self).install(registry)
    }

    fn process(&self, doc: &mut Document, registry: &ExtensionRegistry) {
        (**self).process(doc, registry)
    }
}

/// Name and kind of a stage, as seen by validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageDescriptor {
    pub name: String,
    pub kind: StageKind,
}

impl StageDescriptor {
    pub fn new(name: impl Into<String>, kind: StageKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn of(stage: &dyn Stage) -> Self {
        Self::new(stage.name(), stage.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Token, Value};

    /// Custom stage that counts tokens starting with an uppercase letter.
    struct CapitalCount;

    impl Stage for CapitalCount {
        fn name(&self) -> &str {
            "CAPS"
        }

        fn install(&self, registry: &mut ExtensionRegistry) {
            registry.register::<Document, _>("capital_count", |doc, _| {
                Value::from(
                    doc.tokens
                        .iter()
                        .filter(|t| t.text.chars().next().is_some_and(char::is_uppercase))
                        .count(),
                )
            });
        }
    }

    #[test]
    fn test_custom_stage_defaults() {
        let stage = CapitalCount;
        assert_eq!(stage.kind(), StageKind::Custom);
        assert_eq!(StageDescriptor::of(&stage), StageDescriptor::new("CAPS", StageKind::Custom));
    }

    #[test]
    fn test_custom_stage_install_and_resolve() {
        let mut registry = ExtensionRegistry::new();
        CapitalCount.install(&mut registry);

        let mut doc = Document::from_tokens(vec![
            Token::new("Rust", "rust", "PROPN", "NNP"),
            Token::new("is", "be", "AUX", "VBZ"),
            Token::new("Fun", "fun", "ADJ", "JJ"),
        ]);
        CapitalCount.process(&mut doc, &registry);
        assert_eq!(
            registry.resolve("capital_count", &doc, &doc),
            Some(Value::from(2))
        );
    }

    #[test]
    fn test_stage_as_trait_object() {
        let stage: Box<dyn Stage> = Box::new(CapitalCount);
        let mut registry = ExtensionRegistry::new();
        stage.install(&mut registry);
        assert_eq!(stage.name(), "CAPS");
        assert!(registry.has::<Document>("capital_count"));
    }

    #[test]
    fn test_stage_kind_names() {
        assert_eq!(StageKind::LexiconCount.as_str(), "lexicon_count");
        assert_eq!(
            serde_json::to_value(StageKind::BasicMetrics).unwrap(),
            "basic_metrics"
        );
    }
}
