//! Pipeline observer: hooks for logging and profiling.
//!
//! Observers receive notifications at stage boundaries and whenever the
//! extension registry changes, without coupling to stage logic. An observer
//! is injected at construction time ([`PipelineBuilder::observer`],
//! [`ExtensionRegistry::with_observer`]); nothing in the crate logs through
//! ambient global state except the default [`TracingObserver`], which
//! forwards to whatever `tracing` subscriber the application installed.
//!
//! [`PipelineBuilder::observer`]: crate::pipeline::runner::PipelineBuilder::observer
//! [`ExtensionRegistry::with_observer`]: crate::extension::ExtensionRegistry::with_observer

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::extension::ContainerKind;
use crate::pipeline::validation::{Severity, ValidationDiagnostic};

// ============================================================================
// Stage timing
// ============================================================================

/// Wall-clock timer started at a stage boundary.
#[derive(Debug, Clone, Copy)]
pub struct StageClock(Instant);

impl StageClock {
    pub fn start() -> Self {
        Self(Instant::now())
    }

    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }
}

/// Metrics reported when a stage finishes processing one document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageReport {
    elapsed: Duration,
    tokens: usize,
}

impl StageReport {
    pub fn new(elapsed: Duration, tokens: usize) -> Self {
        Self { elapsed, tokens }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of tokens in the processed document.
    pub fn tokens(&self) -> usize {
        self.tokens
    }
}

// ============================================================================
// Observer trait
// ============================================================================

/// Receives pipeline and registry events. All methods default to no-ops.
///
/// Documents may be processed on several threads at once, so observers take
/// `&self` and must be `Send + Sync`.
pub trait PipelineObserver: Send + Sync {
    /// A new extension was registered.
    fn on_extension_added(&self, _kind: ContainerKind, _name: &str) {}

    /// An existing extension was overwritten by a new definition.
    fn on_extension_replaced(&self, _kind: ContainerKind, _name: &str) {}

    /// An extension was removed explicitly.
    fn on_extension_removed(&self, _kind: ContainerKind, _name: &str) {}

    /// A non-fatal validation finding produced while building a pipeline.
    fn on_diagnostic(&self, _diagnostic: &ValidationDiagnostic) {}

    fn on_stage_start(&self, _stage: &str) {}

    fn on_stage_end(&self, _stage: &str, _report: &StageReport) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Forwards events to `tracing`: additions and stage timings at `debug`,
/// replacements and warnings at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_extension_added(&self, kind: ContainerKind, name: &str) {
        tracing::debug!(kind = kind.as_str(), name, "adding extension");
    }

    fn on_extension_replaced(&self, kind: ContainerKind, name: &str) {
        tracing::warn!(kind = kind.as_str(), name, "extension was replaced");
    }

    fn on_extension_removed(&self, kind: ContainerKind, name: &str) {
        tracing::debug!(kind = kind.as_str(), name, "removing extension");
    }

    fn on_diagnostic(&self, diagnostic: &ValidationDiagnostic) {
        match diagnostic.severity {
            Severity::Error => tracing::error!(
                code = ?diagnostic.error.code,
                path = %diagnostic.error.path,
                "{}",
                diagnostic.error.message
            ),
            Severity::Warning => tracing::warn!(
                code = ?diagnostic.error.code,
                path = %diagnostic.error.path,
                "{}",
                diagnostic.error.message
            ),
        }
    }

    fn on_stage_end(&self, stage: &str, report: &StageReport) {
        tracing::debug!(
            stage,
            tokens = report.tokens(),
            elapsed_us = report.elapsed().as_micros() as u64,
            "stage finished"
        );
    }
}

// ============================================================================
// RecordingObserver: captures events for inspection
// ============================================================================

/// One captured observer event.
#[derive(Debug, Clone, PartialEq)]
pub enum ObserverEvent {
    ExtensionAdded { kind: ContainerKind, name: String },
    ExtensionReplaced { kind: ContainerKind, name: String },
    ExtensionRemoved { kind: ContainerKind, name: String },
    Diagnostic(ValidationDiagnostic),
    StageStart(String),
    StageEnd { stage: String, report: StageReport },
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<ObserverEvent> {
        self.lock().clone()
    }

    /// Names replaced so far, with their container kind.
    pub fn replacements(&self) -> Vec<(ContainerKind, String)> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ObserverEvent::ExtensionReplaced { kind, name } => Some((*kind, name.clone())),
                _ => None,
            })
            .collect()
    }

    /// Diagnostics received while building.
    pub fn diagnostics(&self) -> Vec<ValidationDiagnostic> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ObserverEvent::Diagnostic(d) => Some(d.clone()),
                _ => None,
            })
            .collect()
    }

    /// Per-stage reports, in completion order.
    pub fn stage_reports(&self) -> Vec<(String, StageReport)> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ObserverEvent::StageEnd { stage, report } => Some((stage.clone(), *report)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn push(&self, event: ObserverEvent) {
        self.lock().push(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ObserverEvent>> {
        // A poisoned log is still a valid log.
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_extension_added(&self, kind: ContainerKind, name: &str) {
        self.push(ObserverEvent::ExtensionAdded {
            kind,
            name: name.to_string(),
        });
    }

    fn on_extension_replaced(&self, kind: ContainerKind, name: &str) {
        self.push(ObserverEvent::ExtensionReplaced {
            kind,
            name: name.to_string(),
        });
    }

    fn on_extension_removed(&self, kind: ContainerKind, name: &str) {
        self.push(ObserverEvent::ExtensionRemoved {
            kind,
            name: name.to_string(),
        });
    }

    fn on_diagnostic(&self, diagnostic: &ValidationDiagnostic) {
        self.push(ObserverEvent::Diagnostic(diagnostic.clone()));
    }

    fn on_stage_start(&self, stage: &str) {
        self.push(ObserverEvent::StageStart(stage.to_string()));
    }

    fn on_stage_end(&self, stage: &str, report: &StageReport) {
        self.push(ObserverEvent::StageEnd {
            stage: stage.to_string(),
            report: *report,
        });
    }
}
