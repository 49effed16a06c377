//! Shared types, error model, and configuration for jobwatch.
//!
//! This crate is the foundation depended on by all other jobwatch crates.
//! It provides:
//! - [`JobwatchError`] - the unified error type, tagged by [`ErrorKind`]
//! - The [`JobPosting`] domain type
//! - Configuration ([`AppConfig`], [`SiteConfig`], [`SalaryRules`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, FetchConfig, FetchSection, SalaryRules, ServerSection, SiteConfig, SiteSection,
    StorageSection, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{ErrorKind, JobwatchError, Result};
pub use types::JobPosting;
