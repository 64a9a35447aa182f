//! Word count stage: `word_count`, the number of alphabetic tokens.

use crate::extension::ExtensionRegistry;
use crate::pipeline::traits::{Stage, StageKind};
use crate::types::{Document, Value};

/// Document attribute registered by [`WordCountStage`].
pub const WORD_COUNT: &str = "word_count";

pub const DEFAULT_NAME: &str = "WORD_COUNT";

#[derive(Debug, Clone)]
pub struct WordCountStage {
    name: String,
}

impl WordCountStage {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for WordCountStage {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}

impl Stage for WordCountStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::WordCount
    }

    fn install(&self, registry: &mut ExtensionRegistry) {
        registry.register::<Document, _>(WORD_COUNT, |doc, _| {
            Value::from(doc.tokens.iter().filter(|t| t.is_alpha).count())
        });
    }
}
