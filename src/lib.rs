//! # rapid-docfeatures
//!
//! Linguistic feature extraction over annotated documents.
//!
//! Documents arrive already tokenized, tagged, and lemmatized. A
//! [`Pipeline`] of stages registers named *extension attributes* on
//! documents, sentence spans, and tokens; values are computed on access from
//! the container's current state. A summary stage snapshots every document
//! attribute into one JSON-serializable record.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use rapid_docfeatures::prelude::*;
//!
//! let lexicon = Lexicon::new()
//!     .with_category("pos", ["good", "marvel*"])
//!     .with_category("neg", ["bad", "awful*"]);
//!
//! let pipeline = Pipeline::builder()
//!     .stage(LexiconCountStage::new("LEX0", LexiconCountConfig::new(lexicon))?)
//!     .stage(BasicMetricsStage::default())
//!     .stage(SummaryStage::default())
//!     .build()?;
//!
//! let doc = pipeline.process(Document::from_json(&annotated_json)?);
//! let summary = pipeline.doc_attr(&doc, "SUMMARY");
//! ```

pub mod extension;
pub mod lexicon;
pub mod nlp;
pub mod pipeline;
pub mod stages;
pub mod types;

pub use extension::{Container, ContainerKind, ExtensionRegistry, Resolver};
pub use lexicon::Lexicon;
pub use pipeline::errors::ConfigError;
pub use pipeline::runner::{Pipeline, PipelineBuilder};
pub use pipeline::spec::PipelineSpec;
pub use types::{Document, Span, Token, Value};

/// Common imports.
pub mod prelude {
    pub use crate::extension::{ContainerKind, ExtensionRegistry, Resolver};
    pub use crate::lexicon::Lexicon;
    pub use crate::pipeline::errors::ConfigError;
    pub use crate::pipeline::observer::{PipelineObserver, RecordingObserver, TracingObserver};
    pub use crate::pipeline::runner::{Pipeline, PipelineBuilder};
    pub use crate::pipeline::spec::PipelineSpec;
    pub use crate::pipeline::traits::Stage;
    pub use crate::stages::{
        BasicMetricsStage, LexiconCountConfig, LexiconCountStage, SentencesStage, SummaryConfig,
        SummaryRecord, SummaryStage, WordCountStage,
    };
    pub use crate::types::{Document, Span, Token, Value};
}
