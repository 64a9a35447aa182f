//! Configuration errors and validation diagnostics.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Stable machine-readable code for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// A POS/tag filter value outside the tag vocabulary.
    UnknownTag,
    /// A lexicon entry that cannot be compiled.
    MalformedEntry,
    /// Two stages share a name.
    DuplicateStage,
    /// A stage whose output would be missed by an earlier summary.
    StageOrder,
    /// The pipeline has no stages.
    EmptyPipeline,
    /// A field the pipeline file schema does not know.
    UnknownField,
    /// A spec version this crate cannot read.
    UnsupportedVersion,
    /// Contradictory or incomplete stage settings.
    InvalidStage,
}

/// A single diagnostic: code, JSON-pointer-like path, message and optional hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineSpecError {
    pub code: ErrorCode,
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl PipelineSpecError {
    pub fn new(code: ErrorCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for PipelineSpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)?;
        } else {
            write!(f, "{}: {}", self.path, self.message)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}

impl std::error::Error for PipelineSpecError {}

/// Fatal errors raised while building stages or pipelines.
///
/// Never raised during per-document processing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A `pos` or `tag` filter value is not in the tag vocabulary.
    #[error("stage \"{stage}\": {field} value \"{value}\" is not a recognized tag")]
    UnknownTag {
        stage: String,
        field: &'static str,
        value: String,
    },

    /// A lexicon entry is empty or has a misplaced wildcard.
    #[error("lexicon category \"{category}\": malformed entry \"{entry}\": {reason}")]
    MalformedEntry {
        category: String,
        entry: String,
        reason: &'static str,
    },

    /// The compiled category pattern was rejected by the regex engine.
    #[error("lexicon category \"{category}\": failed to compile matcher: {source}")]
    Pattern {
        category: String,
        #[source]
        source: regex::Error,
    },

    /// Pipeline validation reported errors.
    #[error("invalid pipeline: {}", join_errors(.0))]
    Invalid(Vec<PipelineSpecError>),

    #[error("unsupported pipeline spec version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn join_errors(errors: &[PipelineSpecError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
