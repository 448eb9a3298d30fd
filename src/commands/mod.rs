//! Command implementations
//!
//! - `porcelain`: user-facing operations composed from the repository areas and artifacts

pub mod porcelain;
