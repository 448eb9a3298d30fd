//! Core repository components
//!
//! - `database`: Object database for reading blobs, trees, commits and tags
//! - `refs`: Reference lookup (branches, tags, HEAD, packed refs)
//! - `repository`: Entry point tying the object database and refs together

pub mod database;
pub mod refs;
pub mod repository;
