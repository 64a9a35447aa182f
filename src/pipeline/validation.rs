//! Validation engine for pipeline layouts.
//!
//! The engine runs all registered [`ValidationRule`]s against the ordered
//! list of stages a pipeline is about to be built from and collects every
//! diagnostic into a [`ValidationReport`]. It never short-circuits on the
//! first error, so users see all problems at once.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use rapid_docfeatures::pipeline::validation::ValidationEngine;
//!
//! let engine = ValidationEngine::with_defaults();
//! let report = engine.validate(&stages);
//! if report.has_errors() {
//!     for err in report.errors() {
//!         eprintln!("{err}");
//!     }
//! }
//! ```

use rustc_hash::FxHashSet;
use serde::Serialize;

use super::errors::{ErrorCode, PipelineSpecError};
use super::traits::{StageDescriptor, StageKind};

/// Whether a diagnostic is a hard error or a soft warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// One finding about the stage layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: Severity,
    #[serde(flatten)]
    pub error: PipelineSpecError,
}

impl ValidationDiagnostic {
    pub fn error(err: PipelineSpecError) -> Self {
        Self {
            severity: Severity::Error,
            error: err,
        }
    }

    pub fn warning(err: PipelineSpecError) -> Self {
        Self {
            severity: Severity::Warning,
            error: err,
        }
    }
}

/// Every diagnostic from one validation run, in rule order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    /// Iterate over error-severity diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &PipelineSpecError> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| &d.error)
    }

    /// Iterate over warning-severity diagnostics.
    pub fn warnings(&self) -> impl Iterator<Item = &PipelineSpecError> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .map(|d| &d.error)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Owned copies of the errors, for [`ConfigError::Invalid`](super::errors::ConfigError::Invalid).
    pub fn into_errors(self) -> Vec<PipelineSpecError> {
        self.diagnostics
            .into_iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| d.error)
            .collect()
    }
}

/// Check over the ordered stage layout.
pub trait ValidationRule: Send + Sync {
    /// Stable identifier, e.g. `"summary_last"`.
    fn name(&self) -> &str;

    fn validate(&self, stages: &[StageDescriptor]) -> Vec<ValidationDiagnostic>;
}

/// Runs a set of [`ValidationRule`]s against a stage layout.
pub struct ValidationEngine {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Empty pipeline, duplicate names, and summary placement.
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine.add_rule(Box::new(EmptyPipelineRule));
        engine.add_rule(Box::new(DuplicateNameRule));
        engine.add_rule(Box::new(SummaryLastRule));
        engine
    }

    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    /// Names of the registered rules, in evaluation order.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every rule; never stops at the first error.
    pub fn validate(&self, stages: &[StageDescriptor]) -> ValidationReport {
        let mut report = ValidationReport::default();
        for rule in &self.rules {
            report.diagnostics.extend(rule.validate(stages));
        }
        report
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// Rules

struct EmptyPipelineRule;

impl ValidationRule for EmptyPipelineRule {
    fn name(&self) -> &str {
        "empty_pipeline"
    }

    fn validate(&self, stages: &[StageDescriptor]) -> Vec<ValidationDiagnostic> {
        if stages.is_empty() {
            vec![ValidationDiagnostic::warning(
                PipelineSpecError::new(
                    ErrorCode::EmptyPipeline,
                    "/stages",
                    "pipeline has no stages; documents pass through unchanged",
                ),
            )]
        } else {
            vec![]
        }
    }
}

struct DuplicateNameRule;

impl ValidationRule for DuplicateNameRule {
    fn name(&self) -> &str {
        "duplicate_name"
    }

    fn validate(&self, stages: &[StageDescriptor]) -> Vec<ValidationDiagnostic> {
        let mut seen = FxHashSet::default();
        stages
            .iter()
            .enumerate()
            .filter(|(_, stage)| !seen.insert(stage.name.as_str()))
            .map(|(i, stage)| {
                ValidationDiagnostic::error(
                    PipelineSpecError::new(
                        ErrorCode::DuplicateStage,
                        format!("/stages/{i}/name"),
                        format!("duplicate stage name \"{}\"", stage.name),
                    )
                    .with_hint("Give each stage a unique name"),
                )
            })
            .collect()
    }
}

struct SummaryLastRule;

impl ValidationRule for SummaryLastRule {
    fn name(&self) -> &str {
        "summary_last"
    }

    fn validate(&self, stages: &[StageDescriptor]) -> Vec<ValidationDiagnostic> {
        let Some(first_summary) = stages.iter().position(|s| s.kind == StageKind::Summary) else {
            return vec![];
        };

        stages
            .iter()
            .enumerate()
            .skip(first_summary + 1)
            .filter(|(_, stage)| stage.kind != StageKind::Summary)
            .map(|(i, stage)| {
                ValidationDiagnostic::warning(
                    PipelineSpecError::new(
                        ErrorCode::StageOrder,
                        format!("/stages/{i}"),
                        format!(
                            "stage \"{}\" runs after summary \"{}\"; its attributes will be missing from that summary",
                            stage.name, stages[first_summary].name
                        ),
                    )
                    .with_hint("Move summary stages to the end of the pipeline"),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(stages: &[(&str, StageKind)]) -> Vec<StageDescriptor> {
        stages
            .iter()
            .map(|(name, kind)| StageDescriptor::new(*name, *kind))
            .collect()
    }

    fn engine() -> ValidationEngine {
        ValidationEngine::with_defaults()
    }

    // Valid layouts

    #[test]
    fn test_summary_last_is_valid() {
        let report = engine().validate(&layout(&[
            ("LEX0", StageKind::LexiconCount),
            ("BASIC", StageKind::BasicMetrics),
            ("SUMMARY", StageKind::Summary),
        ]));
        assert!(!report.has_errors());
        assert!(report.is_empty());
    }

    #[test]
    fn test_consecutive_summaries_are_fine() {
        let report = engine().validate(&layout(&[
            ("WC", StageKind::WordCount),
            ("SUMMARY", StageKind::Summary),
            ("SUMMARY2", StageKind::Summary),
        ]));
        assert!(report.is_empty());
    }

    // Rule: empty_pipeline

    #[test]
    fn test_empty_pipeline_warns() {
        let report = engine().validate(&[]);
        assert!(!report.has_errors());
        let warns: Vec<_> = report.warnings().collect();
        assert_eq!(warns.len(), 1);
        assert_eq!(warns[0].code, ErrorCode::EmptyPipeline);
    }

    // Rule: duplicate_name

    #[test]
    fn test_duplicate_names_are_errors() {
        let report = engine().validate(&layout(&[
            ("LEX", StageKind::LexiconCount),
            ("LEX", StageKind::LexiconCount),
            ("LEX", StageKind::WordCount),
        ]));
        let errs: Vec<_> = report.errors().collect();
        assert_eq!(errs.len(), 2);
        assert_eq!(errs[0].code, ErrorCode::DuplicateStage);
        assert_eq!(errs[0].path, "/stages/1/name");
        assert_eq!(errs[1].path, "/stages/2/name");
    }

    // Rule: summary_last

    #[test]
    fn test_stage_after_summary_warns() {
        let report = engine().validate(&layout(&[
            ("SUMMARY", StageKind::Summary),
            ("BASIC", StageKind::BasicMetrics),
        ]));
        assert!(!report.has_errors());
        let warns: Vec<_> = report.warnings().collect();
        assert_eq!(warns.len(), 1);
        assert_eq!(warns[0].code, ErrorCode::StageOrder);
        assert_eq!(warns[0].path, "/stages/1");
        assert!(warns[0].message.contains("BASIC"));
    }

    #[test]
    fn test_each_late_stage_reported() {
        let report = engine().validate(&layout(&[
            ("WC", StageKind::WordCount),
            ("SUMMARY", StageKind::Summary),
            ("LEX", StageKind::LexiconCount),
            ("CUSTOM", StageKind::Custom),
        ]));
        assert_eq!(report.warnings().count(), 2);
    }

    // Report helpers

    #[test]
    fn test_into_errors_keeps_only_errors() {
        let report = engine().validate(&layout(&[
            ("SUMMARY", StageKind::Summary),
            ("SUMMARY", StageKind::WordCount),
        ]));
        assert_eq!(report.len(), 2);
        let errors = report.into_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::DuplicateStage);
    }

    // Engine: custom rules

    #[test]
    fn test_custom_rule() {
        struct NoCustomStages;
        impl ValidationRule for NoCustomStages {
            fn name(&self) -> &str {
                "no_custom"
            }
            fn validate(&self, stages: &[StageDescriptor]) -> Vec<ValidationDiagnostic> {
                stages
                    .iter()
                    .filter(|s| s.kind == StageKind::Custom)
                    .map(|s| {
                        ValidationDiagnostic::error(PipelineSpecError::new(
                            ErrorCode::InvalidStage,
                            "",
                            format!("custom stage {} not allowed", s.name),
                        ))
                    })
                    .collect()
            }
        }

        let mut eng = ValidationEngine::new();
        eng.add_rule(Box::new(NoCustomStages));
        assert_eq!(eng.rule_names(), vec!["no_custom"]);
        let report = eng.validate(&layout(&[("X", StageKind::Custom)]));
        assert!(report.has_errors());
    }

    // Serialization

    #[test]
    fn test_report_serializes_to_json() {
        let report = engine().validate(&layout(&[
            ("SUMMARY", StageKind::Summary),
            ("WC", StageKind::WordCount),
        ]));
        let json = serde_json::to_value(&report).unwrap();
        let diags = json["diagnostics"].as_array().unwrap();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0]["severity"], "warning");
        assert_eq!(diags[0]["code"], "stage_order");
    }
}
