//! Summary aggregator stage
//!
//! Snapshots every document attribute registered so far into one
//! [`SummaryRecord`] and stores it on the document under the stage's name.
//!
//! Only attributes registered by *earlier* stages are captured: the record
//! stops at the summary's own entry in the registry's name order. A summary
//! therefore belongs at the end of the pipeline, and the pipeline builder
//! warns when it is not.

use serde::{Deserialize, Serialize};

use crate::extension::ExtensionRegistry;
use crate::pipeline::traits::{Stage, StageKind};
use crate::types::{Document, Value};

/// Default instance name, which is also the output attribute.
pub const DEFAULT_NAME: &str = "SUMMARY";

/// Key holding the raw document text when [`SummaryConfig::include_text`] is set.
pub const TEXT_KEY: &str = "text";

fn default_exclude_names() -> Vec<String> {
    vec!["concr_spans".to_string()]
}

/// Options of a [`SummaryStage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Document attributes left out of the record.
    #[serde(default = "default_exclude_names")]
    pub exclude_names: Vec<String>,
    /// Put the raw document text under `"text"`, ahead of all attributes.
    #[serde(default)]
    pub include_text: bool,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            exclude_names: default_exclude_names(),
            include_text: false,
        }
    }
}

impl SummaryConfig {
    pub fn include_text(mut self, include_text: bool) -> Self {
        self.include_text = include_text;
        self
    }

    pub fn exclude_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.exclude_names = names.into_iter().map(Into::into).collect();
        self
    }
}

/// Attribute name to value, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SummaryRecord(serde_json::Map<String, Value>);

impl SummaryRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_yaml_string(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Read a record previously stored on a document.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().cloned().map(Self)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Collects document attributes into a [`SummaryRecord`].
#[derive(Debug, Clone)]
pub struct SummaryStage {
    name: String,
    config: SummaryConfig,
}

impl SummaryStage {
    pub fn new(name: impl Into<String>, config: SummaryConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    pub fn config(&self) -> &SummaryConfig {
        &self.config
    }

    /// Build the record for `doc` without storing it.
    ///
    /// Covers the document attributes registered before this stage's own
    /// attribute, or all of them when the stage is not installed in
    /// `registry`.
    pub fn snapshot(&self, doc: &Document, registry: &ExtensionRegistry) -> SummaryRecord {
        let mut record = serde_json::Map::new();
        if self.config.include_text {
            record.insert(TEXT_KEY.to_string(), Value::String(doc.text.clone()));
        }

        let earlier = registry
            .list_names::<Document>()
            .into_iter()
            .take_while(|name| *name != self.name);
        for name in earlier {
            if self.config.exclude_names.iter().any(|ex| ex == name) {
                continue;
            }
            if let Some(value) = registry.resolve(name, doc, doc) {
                record.insert(name.to_string(), value);
            }
        }
        SummaryRecord(record)
    }
}

impl Default for SummaryStage {
    fn default() -> Self {
        Self::new(DEFAULT_NAME, SummaryConfig::default())
    }
}

impl Stage for SummaryStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::Summary
    }

    fn install(&self, registry: &mut ExtensionRegistry) {
        registry.declare_doc_value(self.name.clone(), Value::Null);
    }

    fn process(&self, doc: &mut Document, registry: &ExtensionRegistry) {
        let record = self.snapshot(doc, registry);
        doc.attach_value(self.name.clone(), record.into_value());
    }
}
