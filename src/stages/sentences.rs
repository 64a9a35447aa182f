//! Sentences stage: `sents`, the text of every sentence in order.

use crate::extension::ExtensionRegistry;
use crate::pipeline::traits::{Stage, StageKind};
use crate::types::{Document, Value};

/// Document attribute registered by [`SentencesStage`].
pub const SENTS: &str = "sents";

pub const DEFAULT_NAME: &str = "SENTENCES";

#[derive(Debug, Clone)]
pub struct SentencesStage {
    name: String,
}

impl SentencesStage {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for SentencesStage {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}

impl Stage for SentencesStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::Sentences
    }

    fn install(&self, registry: &mut ExtensionRegistry) {
        registry.register::<Document, _>(SENTS, |doc, _| {
            Value::Array(
                doc.sentences
                    .iter()
                    .map(|sent| Value::String(sent.text(doc)))
                    .collect(),
            )
        });
    }
}
