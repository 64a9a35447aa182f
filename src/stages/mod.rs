//! Built-in pipeline stages.
//!
//! | Stage | Registers |
//! |-------|-----------|
//! | [`LexiconCountStage`] | one token flag and one document count per lexicon category |
//! | [`BasicMetricsStage`] | word-class counts (`WORD_count`, `NOUN_count`, ...) |
//! | [`WordCountStage`] | `word_count` |
//! | [`SentencesStage`] | `sents` |
//! | [`SummaryStage`] | a stored [`SummaryRecord`] of all earlier document attributes |

pub mod basic_metrics;
pub mod lexicon_count;
pub mod sentences;
pub mod summary;
pub mod word_count;

pub use basic_metrics::{BasicCounts, BasicMetricsStage};
pub use lexicon_count::{LexiconCountConfig, LexiconCountStage};
pub use sentences::SentencesStage;
pub use summary::{SummaryConfig, SummaryRecord, SummaryStage};
pub use word_count::WordCountStage;
