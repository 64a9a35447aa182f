//! Pipeline composition
//!
//! Stage trait, builder and runner, layout validation, observers, and the
//! serializable pipeline spec.

pub mod errors;
pub mod observer;
pub mod runner;
pub mod spec;
pub mod traits;
pub mod validation;
