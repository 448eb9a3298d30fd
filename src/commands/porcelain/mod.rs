//! Porcelain commands
//!
//! - `compare`: line-level comparison of two revisions

pub mod compare;
