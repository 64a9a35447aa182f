//! Pipeline runner: installs stages and drives documents through them.
//!
//! A [`Pipeline`] owns an ordered list of stages and the
//! [`ExtensionRegistry`] they populated when the pipeline was built. Building
//! is the only phase that writes to the registry; [`Pipeline::run`] and
//! [`Pipeline::process_batch`] only read it, so one pipeline can process many
//! documents on many threads at once.
//!
//! # Ordering
//!
//! For a single document, stage N finishes before stage N+1 starts. Later
//! stages may read attributes registered by earlier ones (the summary stage
//! reads all of them), so stages are never reordered or run concurrently for
//! one document.
//!
//! # Example
//!
//! ```rust,ignore
//! use rapid_docfeatures::pipeline::runner::Pipeline;
//! use rapid_docfeatures::stages::{WordCountStage, SummaryStage};
//!
//! let pipeline = Pipeline::builder()
//!     .stage(WordCountStage::default())
//!     .stage(SummaryStage::default())
//!     .build()?;
//! let doc = pipeline.process(doc);
//! ```

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;

use crate::extension::{Container, ExtensionRegistry, Resolver};
use crate::pipeline::errors::ConfigError;
use crate::pipeline::observer::{PipelineObserver, StageClock, StageReport, TracingObserver};
use crate::pipeline::traits::{Stage, StageDescriptor};
use crate::pipeline::validation::ValidationEngine;
use crate::types::{Document, Value};

/// Enter a tracing span for one stage; it closes at the end of the
/// enclosing block.
macro_rules! trace_stage {
    ($name:expr) => {
        let _span = tracing::info_span!("pipeline_stage", stage = $name).entered();
    };
}

// ============================================================================
// Pipeline
// ============================================================================

/// An ordered list of installed stages and the registry they populated.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    registry: ExtensionRegistry,
    observer: Arc<dyn PipelineObserver>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Run every stage on `doc`, in order.
    pub fn run(&self, doc: &mut Document) {
        for stage in &self.stages {
            trace_stage!(stage.name());
            self.observer.on_stage_start(stage.name());
            let clock = StageClock::start();
            stage.process(doc, &self.registry);
            let report = StageReport::new(clock.elapsed(), doc.len());
            self.observer.on_stage_end(stage.name(), &report);
        }
    }

    /// Owned variant of [`run`](Self::run).
    pub fn process(&self, mut doc: Document) -> Document {
        self.run(&mut doc);
        doc
    }

    /// Process independent documents in parallel. Output order matches
    /// input order.
    pub fn process_batch(&self, docs: Vec<Document>) -> Vec<Document> {
        docs.into_par_iter().map(|doc| self.process(doc)).collect()
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// Read-only attribute access bound to `doc`.
    pub fn resolver<'a>(&'a self, doc: &'a Document) -> Resolver<'a> {
        Resolver::new(&self.registry, doc)
    }

    /// Resolve `name` on `instance`, which belongs to `doc`.
    pub fn get<C: Container>(&self, name: &str, instance: &C, doc: &Document) -> Option<Value> {
        self.registry.resolve(name, instance, doc)
    }

    /// Resolve a document attribute.
    pub fn doc_attr(&self, doc: &Document, name: &str) -> Option<Value> {
        self.registry.resolve(name, doc, doc)
    }

    /// Stage names, in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .field("registry", &self.registry)
            .finish()
    }
}

// ============================================================================
// PipelineBuilder
// ============================================================================

/// Collects stages, validates the layout, and installs the stages into a
/// fresh registry.
pub struct PipelineBuilder {
    stages: Vec<Box<dyn Stage>>,
    observer: Arc<dyn PipelineObserver>,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineBuilder {
    /// Empty builder reporting to the [`TracingObserver`].
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Send registry, validation, and stage events to `observer`.
    pub fn observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Append a stage.
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Append an already boxed stage.
    pub fn boxed_stage(mut self, stage: Box<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Validate the stage layout, then install every stage in order.
    ///
    /// All diagnostics are reported to the observer. Any error aborts the
    /// build with [`ConfigError::Invalid`]; warnings do not.
    pub fn build(self) -> Result<Pipeline, ConfigError> {
        let descriptors: Vec<StageDescriptor> = self
            .stages
            .iter()
            .map(|stage| StageDescriptor::of(&**stage))
            .collect();

        let report = ValidationEngine::with_defaults().validate(&descriptors);
        for diagnostic in &report.diagnostics {
            self.observer.on_diagnostic(diagnostic);
        }
        if report.has_errors() {
            return Err(ConfigError::Invalid(report.into_errors()));
        }

        let mut registry = ExtensionRegistry::with_observer(Arc::clone(&self.observer));
        for stage in &self.stages {
            tracing::debug!(stage = stage.name(), kind = stage.kind().as_str(), "installing stage");
            stage.install(&mut registry);
        }

        Ok(Pipeline {
            stages: self.stages,
            registry,
            observer: self.observer,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Lexicon;
    use crate::pipeline::errors::ErrorCode;
    use crate::pipeline::observer::{ObserverEvent, RecordingObserver};
    use crate::pipeline::validation::Severity;
    use crate::stages::{
        BasicMetricsStage, LexiconCountConfig, LexiconCountStage, SentencesStage, SummaryConfig,
        SummaryRecord, SummaryStage, WordCountStage,
    };
    use crate::types::Token;

    fn sample_doc(words: &[&str]) -> Document {
        Document::from_tokens(
            words
                .iter()
                .map(|w| Token::new(*w, w.to_lowercase(), "NOUN", "NN"))
                .collect(),
        )
    }

    fn recording() -> Arc<RecordingObserver> {
        Arc::new(RecordingObserver::new())
    }

    fn summary_of(pipeline: &Pipeline, doc: &Document) -> SummaryRecord {
        pipeline
            .doc_attr(doc, "SUMMARY")
            .as_ref()
            .and_then(SummaryRecord::from_value)
            .unwrap()
    }

    #[test]
    fn test_builder_installs_in_order() {
        let pipeline = Pipeline::builder()
            .stage(WordCountStage::default())
            .stage(SentencesStage::default())
            .stage(SummaryStage::default())
            .build()
            .unwrap();

        assert_eq!(pipeline.stage_names(), vec!["WORD_COUNT", "SENTENCES", "SUMMARY"]);
        assert_eq!(
            pipeline.registry().list_names::<Document>(),
            vec!["word_count", "sents", "SUMMARY"]
        );
    }

    #[test]
    fn test_run_fills_summary() {
        let pipeline = Pipeline::builder()
            .stage(WordCountStage::default())
            .stage(SummaryStage::new("SUMMARY", SummaryConfig::default().include_text(true)))
            .build()
            .unwrap();

        let mut doc = sample_doc(&["One", "two", "three", "four", "five"]);
        pipeline.run(&mut doc);

        let record = summary_of(&pipeline, &doc);
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["text", "word_count"]);
        assert_eq!(record.get("word_count"), Some(&Value::from(5)));
    }

    #[test]
    fn test_observer_sees_each_stage() {
        let obs = recording();
        let pipeline = Pipeline::builder()
            .observer(obs.clone())
            .stage(BasicMetricsStage::default())
            .stage(SummaryStage::default())
            .build()
            .unwrap();
        obs.clear();

        pipeline.process(sample_doc(&["a", "b", "c"]));
        let reports = obs.stage_reports();
        let names: Vec<_> = reports.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["BASIC", "SUMMARY"]);
        assert!(reports.iter().all(|(_, r)| r.tokens() == 3));
        assert_eq!(obs.events()[0], ObserverEvent::StageStart("BASIC".into()));
    }

    #[test]
    fn test_summary_not_last_warns_but_builds() {
        let obs = recording();
        let pipeline = Pipeline::builder()
            .observer(obs.clone())
            .stage(SummaryStage::default())
            .stage(WordCountStage::default())
            .build()
            .unwrap();

        let diags = obs.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[0].error.code, ErrorCode::StageOrder);

        let doc = pipeline.process(sample_doc(&["one"]));
        assert!(summary_of(&pipeline, &doc).get("word_count").is_none());
    }

    #[test]
    fn test_duplicate_names_fail() {
        let obs = recording();
        let err = Pipeline::builder()
            .observer(obs.clone())
            .stage(WordCountStage::new("X"))
            .stage(SentencesStage::new("X"))
            .build()
            .unwrap_err();

        match err {
            ConfigError::Invalid(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].code, ErrorCode::DuplicateStage);
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
        assert_eq!(obs.diagnostics()[0].severity, Severity::Error);
    }

    #[test]
    fn test_empty_pipeline_passes_documents_through() {
        let obs = recording();
        let pipeline = Pipeline::builder().observer(obs.clone()).build().unwrap();
        assert!(pipeline.is_empty());
        assert_eq!(obs.diagnostics()[0].error.code, ErrorCode::EmptyPipeline);

        let doc = sample_doc(&["unchanged"]);
        assert_eq!(pipeline.process(doc.clone()), doc);
    }

    #[test]
    fn test_process_batch_preserves_order() {
        let pipeline = Pipeline::builder()
            .stage(WordCountStage::default())
            .stage(SummaryStage::new("SUMMARY", SummaryConfig::default().include_text(true)))
            .build()
            .unwrap();

        let docs: Vec<Document> = (0..64)
            .map(|n| {
                let words: Vec<String> = (0..n).map(|i| format!("w{}", "x".repeat(i % 3 + 1))).collect();
                let refs: Vec<&str> = words.iter().map(String::as_str).collect();
                sample_doc(&refs)
            })
            .collect();

        let out = pipeline.process_batch(docs.clone());
        assert_eq!(out.len(), docs.len());
        for (n, (before, after)) in docs.iter().zip(&out).enumerate() {
            assert_eq!(before.text, after.text);
            let record = summary_of(&pipeline, after);
            assert_eq!(record.get("word_count"), Some(&Value::from(n)));
        }
    }

    #[test]
    fn test_pipelines_have_separate_registries() {
        let lexicon = Lexicon::new().with_category("pos", ["good"]);
        let first = Pipeline::builder()
            .stage(LexiconCountStage::new("LEX", LexiconCountConfig::new(lexicon)).unwrap())
            .build()
            .unwrap();
        let second = Pipeline::builder()
            .stage(WordCountStage::default())
            .build()
            .unwrap();

        assert!(first.registry().has::<Document>("count_of_pos_from_LEX"));
        assert!(!second.registry().has::<Document>("count_of_pos_from_LEX"));
        assert!(!first.registry().has::<Document>("word_count"));
    }

    #[test]
    fn test_reinstalling_same_attribute_is_reported_as_replacement() {
        let obs = recording();
        Pipeline::builder()
            .observer(obs.clone())
            .stage(WordCountStage::new("WC1"))
            .stage(WordCountStage::new("WC2"))
            .build()
            .unwrap();

        assert_eq!(
            obs.replacements(),
            vec![(crate::extension::ContainerKind::Doc, "word_count".to_string())]
        );
    }

    #[test]
    fn test_resolver_and_get() {
        let pipeline = Pipeline::builder()
            .stage(BasicMetricsStage::default())
            .build()
            .unwrap();
        let doc = Document::from_tokens(vec![
            Token::new("run", "run", "VERB", "VB"),
            Token::new("be", "be", "AUX", "VB"),
        ]);

        assert_eq!(pipeline.get("is_VB", &doc.tokens[0], &doc), Some(Value::Bool(true)));
        let cx = pipeline.resolver(&doc);
        assert!(!cx.flag("is_VB_without_be_and_have", &doc.tokens[1]));
        assert_eq!(cx.doc_attr("VB_count"), Some(Value::from(2)));
    }
}
