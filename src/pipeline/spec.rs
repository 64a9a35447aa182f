//! Pipeline specification types.
//!
//! A [`PipelineSpec`] describes the ordered stages of a pipeline and their
//! options, so that pipelines can be configured from JSON or YAML files
//! instead of code.
//!
//! # JSON shape
//!
//! ```json
//! {
//!   "v": 1,
//!   "strict": false,
//!   "stages": [
//!     { "type": "lexicon_count", "name": "LIWC", "lexicon_path": "liwc.json",
//!       "exclude_lemmas": ["be", "have"] },
//!     { "type": "basic_metrics" },
//!     { "type": "word_count" },
//!     { "type": "sentences" },
//!     { "type": "summary", "include_text": true }
//!   ]
//! }
//! ```
//!
//! A `lexicon_count` stage takes its lexicon inline (`"lexicon": {...}`) or
//! from a JSON word-list file (`"lexicon_path"`), not both.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::errors::{ConfigError, ErrorCode, PipelineSpecError};
use super::observer::PipelineObserver;
use super::runner::Pipeline;
use super::traits::Stage;
use super::validation::ValidationDiagnostic;
use crate::lexicon::Lexicon;
use crate::stages::{
    basic_metrics, sentences, summary, word_count, BasicMetricsStage, LexiconCountConfig,
    LexiconCountStage, SentencesStage, SummaryConfig, SummaryStage, WordCountStage,
};

/// The only spec version this crate reads.
pub const SPEC_VERSION: u32 = 1;

/// Top-level pipeline specification (v1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// Spec version (currently `1`).
    pub v: u32,

    /// If `true`, unrecognized fields are errors; if `false`, warnings.
    #[serde(default)]
    pub strict: bool,

    /// Stages in execution order.
    #[serde(default)]
    pub stages: Vec<StageSpec>,

    /// Captures any fields not recognized by the schema.
    /// Used by the strict-mode check.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

/// One stage entry, tagged by `"type"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageSpec {
    LexiconCount(LexiconCountSpec),
    BasicMetrics(NamedStageSpec),
    WordCount(NamedStageSpec),
    Sentences(NamedStageSpec),
    Summary(SummarySpec),
}

/// Options of a `lexicon_count` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiconCountSpec {
    pub name: String,

    /// JSON word-list file, read when the pipeline is built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lexicon_path: Option<PathBuf>,

    #[serde(flatten)]
    pub config: LexiconCountConfig,

    /// Keys not recognized for this stage type.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

/// Entry for stages whose only option is their name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamedStageSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

/// Options of a `summary` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(flatten)]
    pub config: SummaryConfig,

    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

impl StageSpec {
    /// Stage name, falling back to the stage's default.
    pub fn name(&self) -> &str {
        match self {
            Self::LexiconCount(spec) => &spec.name,
            Self::BasicMetrics(spec) => spec.name.as_deref().unwrap_or(basic_metrics::DEFAULT_NAME),
            Self::WordCount(spec) => spec.name.as_deref().unwrap_or(word_count::DEFAULT_NAME),
            Self::Sentences(spec) => spec.name.as_deref().unwrap_or(sentences::DEFAULT_NAME),
            Self::Summary(spec) => spec.name.as_deref().unwrap_or(summary::DEFAULT_NAME),
        }
    }

    /// Keys of this entry that its stage type does not recognize.
    pub fn unknown_fields(&self) -> &HashMap<String, serde_json::Value> {
        match self {
            Self::LexiconCount(spec) => &spec.unknown_fields,
            Self::BasicMetrics(spec) | Self::WordCount(spec) | Self::Sentences(spec) => {
                &spec.unknown_fields
            }
            Self::Summary(spec) => &spec.unknown_fields,
        }
    }

    /// Construct the stage, loading any referenced lexicon file.
    pub fn instantiate(&self) -> Result<Box<dyn Stage>, ConfigError> {
        let name = self.name().to_string();
        let stage: Box<dyn Stage> = match self {
            Self::LexiconCount(spec) => {
                let mut config = spec.config.clone();
                if let Some(path) = &spec.lexicon_path {
                    config.lexicon = Lexicon::from_json_file(path)?;
                }
                Box::new(LexiconCountStage::new(name, config)?)
            }
            Self::BasicMetrics(_) => Box::new(BasicMetricsStage::new(name)),
            Self::WordCount(_) => Box::new(WordCountStage::new(name)),
            Self::Sentences(_) => Box::new(SentencesStage::new(name)),
            Self::Summary(spec) => Box::new(SummaryStage::new(name, spec.config.clone())),
        };
        Ok(stage)
    }
}

impl PipelineSpec {
    /// An empty v1 spec.
    pub fn new() -> Self {
        Self {
            v: SPEC_VERSION,
            strict: false,
            stages: Vec::new(),
            unknown_fields: HashMap::new(),
        }
    }

    /// Append a stage entry.
    pub fn with_stage(mut self, stage: StageSpec) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read a spec file; `.yaml`/`.yml` files are parsed as YAML, anything
    /// else as JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml(&raw),
            _ => Self::from_json(&raw),
        }
    }

    /// Check the version and unknown fields.
    ///
    /// Unknown fields are reported to `observer` as warnings, or returned as
    /// errors in strict mode.
    pub fn check(&self, observer: &dyn PipelineObserver) -> Result<(), ConfigError> {
        if self.v != SPEC_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: self.v,
                expected: SPEC_VERSION,
            });
        }

        let mut errors = Vec::new();
        self.report_unknown("", &self.unknown_fields, observer, &mut errors);

        for (i, stage) in self.stages.iter().enumerate() {
            let base = format!("/stages/{i}");
            self.report_unknown(&base, stage.unknown_fields(), observer, &mut errors);
            if let StageSpec::LexiconCount(spec) = stage {
                if spec.lexicon_path.is_some() && !spec.config.lexicon.is_empty() {
                    let err = PipelineSpecError::new(
                        ErrorCode::InvalidStage,
                        format!("/stages/{i}"),
                        format!("stage \"{}\" sets both lexicon and lexicon_path", spec.name),
                    )
                    .with_hint("Use either an inline lexicon or a lexicon file");
                    observer.on_diagnostic(&ValidationDiagnostic::error(err.clone()));
                    errors.push(err);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Report `fields` under `base`, sorted; strict mode also collects them
    /// into `errors`.
    fn report_unknown(
        &self,
        base: &str,
        fields: &HashMap<String, serde_json::Value>,
        observer: &dyn PipelineObserver,
        errors: &mut Vec<PipelineSpecError>,
    ) {
        let mut unknown: Vec<&String> = fields.keys().collect();
        unknown.sort();
        for field in unknown {
            let err = PipelineSpecError::new(
                ErrorCode::UnknownField,
                format!("{base}/{field}"),
                format!("unrecognized field \"{field}\""),
            );
            let diagnostic = if self.strict {
                errors.push(err.clone());
                ValidationDiagnostic::error(err)
            } else {
                ValidationDiagnostic::warning(err.with_hint("Remove the field or check its spelling"))
            };
            observer.on_diagnostic(&diagnostic);
        }
    }

    /// Check version and fields, then construct and install every stage.
    pub fn build(&self, observer: Arc<dyn PipelineObserver>) -> Result<Pipeline, ConfigError> {
        self.check(observer.as_ref())?;

        let mut builder = Pipeline::builder().observer(observer);
        for stage in &self.stages {
            builder = builder.boxed_stage(stage.instantiate()?);
        }
        builder.build()
    }
}

impl Default for PipelineSpec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::observer::RecordingObserver;
    use crate::pipeline::validation::Severity;
    use crate::types::{Document, Token, Value};

    fn recording() -> Arc<RecordingObserver> {
        Arc::new(RecordingObserver::new())
    }

    #[test]
    fn test_deserialize_minimal_spec() {
        let spec = PipelineSpec::from_json(r#"{ "v": 1 }"#).unwrap();
        assert_eq!(spec.v, 1);
        assert!(spec.stages.is_empty());
        assert!(!spec.strict);
    }

    #[test]
    fn test_deserialize_full_spec() {
        let json = r#"{
            "v": 1,
            "strict": true,
            "stages": [
                { "type": "lexicon_count", "name": "LEX0",
                  "lexicon": { "pos": ["good", "marvel*"] },
                  "prefix": "is", "allowed_pos": ["ADJ"] },
                { "type": "basic_metrics" },
                { "type": "word_count", "name": "WC" },
                { "type": "sentences" },
                { "type": "summary", "include_text": true }
            ]
        }"#;
        let spec = PipelineSpec::from_json(json).unwrap();
        assert!(spec.strict);
        assert_eq!(spec.stages.len(), 5);

        let names: Vec<_> = spec.stages.iter().map(StageSpec::name).collect();
        assert_eq!(names, vec!["LEX0", "BASIC", "WC", "SENTENCES", "SUMMARY"]);

        match &spec.stages[0] {
            StageSpec::LexiconCount(lex) => {
                assert_eq!(lex.config.prefix.as_deref(), Some("is"));
                assert_eq!(lex.config.allowed_pos, vec!["ADJ"]);
                assert_eq!(lex.config.lexicon.get("pos").unwrap(), ["good", "marvel*"]);
            }
            other => panic!("expected lexicon_count, got {other:?}"),
        }
        match &spec.stages[4] {
            StageSpec::Summary(s) => {
                assert!(s.config.include_text);
                assert_eq!(s.config.exclude_names, vec!["concr_spans"]);
            }
            other => panic!("expected summary, got {other:?}"),
        }
    }

    #[test]
    fn test_yaml_spec() {
        let yaml = "
v: 1
stages:
  - type: word_count
  - type: summary
    exclude_names: []
";
        let spec = PipelineSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.stages.len(), 2);
        let pipeline = spec.build(recording()).unwrap();
        assert_eq!(pipeline.stage_names(), vec!["WORD_COUNT", "SUMMARY"]);
    }

    #[test]
    fn test_unknown_stage_type_is_parse_error() {
        let result = PipelineSpec::from_json(r#"{"v": 1, "stages": [{"type": "pagerank"}]}"#);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_unknown_fields_warn_when_lenient() {
        let obs = recording();
        let spec = PipelineSpec::from_json(
            r#"{"v": 1, "bogus": 42, "stages": [{"type": "word_count"}]}"#,
        )
        .unwrap();
        assert!(spec.unknown_fields.contains_key("bogus"));

        spec.build(obs.clone()).unwrap();
        let diags = obs.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[0].error.code, ErrorCode::UnknownField);
        assert_eq!(diags[0].error.path, "/bogus");
    }

    #[test]
    fn test_unknown_fields_fail_when_strict() {
        let spec = PipelineSpec::from_json(
            r#"{"v": 1, "strict": true, "zzz": 1, "aaa": 2, "stages": [{"type": "word_count"}]}"#,
        )
        .unwrap();
        match spec.build(recording()) {
            Err(ConfigError::Invalid(errors)) => {
                let paths: Vec<_> = errors.iter().map(|e| e.path.as_str()).collect();
                assert_eq!(paths, vec!["/aaa", "/zzz"]);
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_stage_keys_fail_when_strict() {
        let spec = PipelineSpec::from_json(
            r#"{"v": 1, "strict": true, "stages": [
                {"type": "lexicon_count", "name": "AUX",
                 "lexicon": {"state": ["be", "is"]}, "exclude_lemma": ["be"]},
                {"type": "word_count", "nmae": "WC"},
                {"type": "summary", "include_txt": true}
            ]}"#,
        )
        .unwrap();
        assert!(spec.stages[0].unknown_fields().contains_key("exclude_lemma"));
        match &spec.stages[0] {
            StageSpec::LexiconCount(lex) => assert!(lex.config.exclude_lemmas.is_empty()),
            other => panic!("expected lexicon_count, got {other:?}"),
        }

        let obs = recording();
        match spec.build(obs.clone()) {
            Err(ConfigError::Invalid(errors)) => {
                let paths: Vec<_> = errors.iter().map(|e| e.path.as_str()).collect();
                assert_eq!(
                    paths,
                    vec!["/stages/0/exclude_lemma", "/stages/1/nmae", "/stages/2/include_txt"]
                );
                assert!(errors.iter().all(|e| e.code == ErrorCode::UnknownField));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
        assert!(obs.diagnostics().iter().all(|d| d.severity == Severity::Error));
    }

    #[test]
    fn test_unknown_stage_keys_warn_when_lenient() {
        let obs = recording();
        let spec = PipelineSpec::from_json(
            r#"{"v": 1, "stages": [
                {"type": "lexicon_count", "name": "AUX",
                 "lexicon": {"state": ["be"]}, "exclude": ["be"]}
            ]}"#,
        )
        .unwrap();
        spec.build(obs.clone()).unwrap();

        let diags = obs.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[0].error.path, "/stages/0/exclude");
    }

    #[test]
    fn test_known_stage_keys_are_not_reported() {
        let spec = PipelineSpec::from_json(
            r#"{"v": 1, "strict": true, "stages": [
                {"type": "lexicon_count", "name": "AUX", "lexicon": {"state": ["be"]},
                 "exclude_lemmas": ["be"], "prefix": "is"},
                {"type": "summary", "name": "S", "include_text": true, "exclude_names": []}
            ]}"#,
        )
        .unwrap();
        assert!(spec.stages.iter().all(|s| s.unknown_fields().is_empty()));
        spec.build(recording()).unwrap();
    }

    #[test]
    fn test_unsupported_version() {
        let spec = PipelineSpec::from_json(r#"{"v": 2}"#).unwrap();
        assert!(matches!(
            spec.build(recording()),
            Err(ConfigError::UnsupportedVersion { found: 2, expected: 1 })
        ));
    }

    #[test]
    fn test_lexicon_path_loaded_at_build() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posneg.json");
        std::fs::write(&path, r#"{"pos": ["good", "marvel*"], "neg": ["bad", "awful*"]}"#).unwrap();

        let spec = PipelineSpec::new().with_stage(StageSpec::LexiconCount(LexiconCountSpec {
            name: "LEX0".into(),
            lexicon_path: Some(path),
            config: LexiconCountConfig::default(),
            unknown_fields: HashMap::new(),
        }));
        let pipeline = spec.build(recording()).unwrap();

        let doc = Document::from_tokens(vec![
            Token::new("Marvelous", "marvelous", "ADJ", "JJ"),
            Token::new("awfully", "awfully", "ADV", "RB"),
        ]);
        assert_eq!(pipeline.doc_attr(&doc, "count_of_pos_from_LEX0"), Some(Value::from(1)));
        assert_eq!(pipeline.doc_attr(&doc, "count_of_neg_from_LEX0"), Some(Value::from(1)));
    }

    #[test]
    fn test_missing_lexicon_file() {
        let spec = PipelineSpec::new().with_stage(StageSpec::LexiconCount(LexiconCountSpec {
            name: "LEX0".into(),
            lexicon_path: Some(PathBuf::from("/no/such/lexicon.json")),
            config: LexiconCountConfig::default(),
            unknown_fields: HashMap::new(),
        }));
        assert!(matches!(spec.build(recording()), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_inline_and_path_lexicon_conflict() {
        let spec = PipelineSpec::from_json(
            r#"{"v": 1, "stages": [{"type": "lexicon_count", "name": "L",
                "lexicon": {"pos": ["good"]}, "lexicon_path": "x.json"}]}"#,
        )
        .unwrap();
        match spec.build(recording()) {
            Err(ConfigError::Invalid(errors)) => {
                assert_eq!(errors[0].code, ErrorCode::InvalidStage);
                assert_eq!(errors[0].path, "/stages/0");
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_tag_in_spec_fails_build() {
        let spec = PipelineSpec::from_json(
            r#"{"v": 1, "stages": [{"type": "lexicon_count", "name": "L",
                "lexicon": {"pos": ["good"]}, "allowed_tags": ["JJX"]}]}"#,
        )
        .unwrap();
        assert!(matches!(
            spec.build(recording()),
            Err(ConfigError::UnknownTag { field: "allowed_tags", .. })
        ));
    }

    #[test]
    fn test_from_path_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("pipeline.yml");
        std::fs::write(&yaml, "v: 1\nstages:\n  - type: sentences\n").unwrap();
        let json = dir.path().join("pipeline.json");
        std::fs::write(&json, r#"{"v": 1, "stages": [{"type": "sentences", "name": "S"}]}"#).unwrap();

        assert_eq!(PipelineSpec::from_path(&yaml).unwrap().stages[0].name(), "SENTENCES");
        assert_eq!(PipelineSpec::from_path(&json).unwrap().stages[0].name(), "S");
    }

    #[test]
    fn test_serde_roundtrip_keeps_stage_tags() {
        let spec = PipelineSpec::new()
            .with_stage(StageSpec::WordCount(NamedStageSpec::default()))
            .with_stage(StageSpec::Summary(SummarySpec {
                name: None,
                config: SummaryConfig::default(),
                unknown_fields: HashMap::new(),
            }));
        let back = serde_json::to_value(&spec).unwrap();
        assert_eq!(back["stages"][0]["type"], "word_count");
        assert_eq!(back["stages"][1]["type"], "summary");
        assert_eq!(back["stages"][1]["exclude_names"][0], "concr_spans");
    }
}
