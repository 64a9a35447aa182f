//! Natural Language Processing reference data
//!
//! This module provides the closed tag vocabulary used to validate POS and
//! fine-tag filters.

pub mod tags;
