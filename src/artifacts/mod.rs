//! Git data structures and algorithms
//!
//! - `branch`: ref names and revision parsing
//! - `compare`: line-level classification of per-file diffs
//! - `core`: terminal output helpers (pager wrapper)
//! - `database`: tree entry types and packfile reading
//! - `diff`: tree diffing, Myers' line diff and patch rendering
//! - `objects`: git object types (blob, tree, commit, tag)

pub mod branch;
pub mod compare;
pub mod core;
pub mod database;
pub mod diff;
pub mod objects;
