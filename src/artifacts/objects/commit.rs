//! Git commit object
//!
//! ## Format
//!
//! ```text
//! commit <size>\0
//! tree <tree-sha>
//! parent <parent-sha>
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//! [other headers, e.g. gpgsig, possibly continued on lines starting with a space]
//!
//! <commit message>
//! ```
//!
//! Only the tree and parent links matter for comparing revisions, so the remaining
//! headers are skipped rather than validated.

use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use std::io::BufRead;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    /// Parent commit IDs (empty for a root commit, several for merges)
    parents: Vec<ObjectId>,
    /// Root tree of the snapshot
    tree_oid: ObjectId,
}

impl Commit {
    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    /// First parent, as followed by `^` and `~<n>`.
    pub fn parent(&self) -> Option<&ObjectId> {
        self.parents.first()
    }

}

impl Unpackable for Commit {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let content = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;
        let content = String::from_utf8_lossy(&content);

        let headers = content
            .split_once("\n\n")
            .map_or(&*content, |(headers, _)| headers);

        let mut tree_oid = None;
        let mut parents = Vec::new();

        for line in headers.lines() {
            if let Some(oid) = line.strip_prefix("tree ") {
                tree_oid = Some(ObjectId::try_parse(oid.to_string())?);
            } else if let Some(oid) = line.strip_prefix("parent ") {
                parents.push(ObjectId::try_parse(oid.to_string())?);
            }
        }

        Ok(Commit {
            parents,
            tree_oid: tree_oid.context("Invalid commit object: missing tree line")?,
        })
    }
}
