//! Per-file change classification and the comparison payload
//!
//! - `hunk_classifier`: turns one file's unified diff into line-level change records
//! - `file_diff`: per-file results and the `VersionComparison` response

pub mod file_diff;
pub mod hunk_classifier;
