//! Test utilities for SCMA development.
//!
//! Provides deterministic byte patterns, a seeded allocate/free churn
//! driver, and configuration shortcuts shared by the integration tests and
//! the benchmarks.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    assert_contents, fill_blocks, pattern, tight_config, Churn, ChurnReport, LiveBlock,
};
