use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::object::ObjectBox;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub enum TreeChange {
    Added(DatabaseEntry),
    Deleted(DatabaseEntry),
    Modified {
        old: DatabaseEntry,
        new: DatabaseEntry,
    },
}

impl TreeChange {
    pub fn from_entries(old: Option<DatabaseEntry>, new: Option<DatabaseEntry>) -> Option<Self> {
        match (old, new) {
            (None, Some(new)) => Some(TreeChange::Added(new)),
            (Some(old), None) => Some(TreeChange::Deleted(old)),
            (Some(old), Some(new)) if old != new => Some(TreeChange::Modified { old, new }),
            _ => None,
        }
    }

    pub fn old_entry(&self) -> Option<&DatabaseEntry> {
        match self {
            TreeChange::Deleted(entry) => Some(entry),
            TreeChange::Modified { old, .. } => Some(old),
            TreeChange::Added(_) => None,
        }
    }

    pub fn new_entry(&self) -> Option<&DatabaseEntry> {
        match self {
            TreeChange::Added(entry) => Some(entry),
            TreeChange::Modified { new, .. } => Some(new),
            TreeChange::Deleted(_) => None,
        }
    }
}

/// Changed paths, ordered by path.
pub type ChangeSet = BTreeMap<PathBuf, TreeChange>;
type TreeEntryMap = BTreeMap<String, DatabaseEntry>;

/// Recursive comparison of two trees (or the trees of two commits).
///
/// Only non-tree entries end up in the change set; a directory that appears or
/// disappears is expanded into one change per file below it.
#[derive(Debug)]
pub struct TreeDiff<'r> {
    database: &'r Database,
    change_set: ChangeSet,
}

impl<'r> TreeDiff<'r> {
    pub fn new(database: &'r Database) -> Self {
        TreeDiff {
            database,
            change_set: BTreeMap::new(),
        }
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.change_set
    }

    pub fn compare_oids(
        &mut self,
        old: Option<&ObjectId>,
        new: Option<&ObjectId>,
        prefix: &Path,
    ) -> anyhow::Result<()> {
        if old == new {
            return Ok(());
        }

        let old_tree_entries = self.inflate_oid_to_tree_entries(old)?;
        let new_tree_entries = self.inflate_oid_to_tree_entries(new)?;

        self.detect_deletions(&old_tree_entries, &new_tree_entries, prefix)?;
        self.detect_additions(&old_tree_entries, &new_tree_entries, prefix)?;

        Ok(())
    }

    fn inflate_oid_to_tree_entries(&self, oid: Option<&ObjectId>) -> anyhow::Result<TreeEntryMap> {
        match oid {
            None => Ok(BTreeMap::new()),
            Some(oid) => Ok(self.inflate_oid_to_tree(oid)?.into_entries().collect()),
        }
    }

    fn inflate_oid_to_tree(&self, oid: &ObjectId) -> anyhow::Result<Tree> {
        match self.database.parse_object(oid)? {
            ObjectBox::Tree(tree) => Ok(*tree),
            ObjectBox::Commit(commit) => self.inflate_oid_to_tree(commit.tree_oid()),
            other => anyhow::bail!(
                "object {} is a {}, not a tree",
                oid.to_short_oid(),
                other.object_type()
            ),
        }
    }

    fn detect_deletions(
        &mut self,
        old: &TreeEntryMap,
        new: &TreeEntryMap,
        prefix: &Path,
    ) -> anyhow::Result<()> {
        for (name, entry) in old {
            let path = prefix.join(name);
            let other = new.get(name);

            if other == Some(entry) {
                continue;
            }

            let tree_a_oid = entry.is_tree().then_some(&entry.oid);
            let tree_b_oid = other.filter(|other| other.is_tree()).map(|other| &other.oid);

            self.compare_oids(tree_a_oid, tree_b_oid, &path)?;

            let blob_a = (!entry.is_tree()).then(|| entry.clone());
            let blob_b = other.filter(|other| !other.is_tree()).cloned();

            if let Some(change) = TreeChange::from_entries(blob_a, blob_b) {
                self.change_set.insert(path, change);
            }
        }

        Ok(())
    }

    fn detect_additions(
        &mut self,
        old: &TreeEntryMap,
        new: &TreeEntryMap,
        prefix: &Path,
    ) -> anyhow::Result<()> {
        for (name, entry) in new {
            if old.contains_key(name) {
                continue;
            }

            let path = prefix.join(name);
            if entry.is_tree() {
                self.compare_oids(None, Some(&entry.oid), &path)?;
            } else {
                self.change_set.insert(path, TreeChange::Added(entry.clone()));
            }
        }

        Ok(())
    }
}
