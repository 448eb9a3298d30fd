//! Tree and line diffing
//!
//! - `tree_diff`: which files changed between two trees
//! - `diff_algorithm`: Myers' diff and hunk grouping for line-by-line comparison
//! - `patch`: unified diff text for one changed file

pub mod diff_algorithm;
pub mod patch;
pub mod tree_diff;
