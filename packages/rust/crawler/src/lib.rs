//! Page fetching and listing/detail extraction for the job board.
//!
//! This crate provides:
//! - [`listing`] - posting stubs from the listing index table
//! - [`detail`] - salary text from a posting detail page
//! - [`fetch`] - the [`PageFetcher`] seam and its HTTP implementation

pub mod detail;
pub mod fetch;
pub mod listing;

pub use detail::{extract_salary_text, fold_label};
pub use fetch::{HttpFetcher, PageFetcher};
pub use listing::{extract_listings, normalize_posted_at};
