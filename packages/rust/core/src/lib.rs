//! Core pipeline orchestration and domain logic for jobwatch.
//!
//! This crate ties together listing extraction, reconciliation against the
//! store, and salary enrichment into one end-to-end run ([`Pipeline::run`]).

pub mod enrichment;
pub mod pipeline;
pub mod reconcile;

pub use enrichment::{EnrichmentOutcome, enrich_postings};
pub use pipeline::{Pipeline, PipelineConfig, ProgressReporter, RunReport, SilentProgress};
pub use reconcile::{Reconciliation, diff};
