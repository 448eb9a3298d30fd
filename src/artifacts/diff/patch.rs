//! Unified diff text for a single tree change.

use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::diff::diff_algorithm::MyersDiff;
use crate::artifacts::diff::tree_diff::TreeChange;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use std::fmt::Write;
use std::path::Path;

const NULL_PATH: &str = "/dev/null";
const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

pub type LineSet = Vec<String>;

/// One side of a file diff: the blob's lines (newlines kept), or nothing when the file is
/// absent on that side.
#[derive(Debug, Clone)]
struct DiffTarget {
    oid: Option<ObjectId>,
    data: LineSet,
}

impl DiffTarget {
    /// `Ok(None)` means the entry cannot be line-diffed (binary content or a gitlink).
    fn from_entry(
        entry: Option<&DatabaseEntry>,
        database: &Database,
    ) -> anyhow::Result<Option<Self>> {
        let Some(entry) = entry else {
            return Ok(Some(Self::from_nothing()));
        };

        if !entry.mode.is_blob() {
            return Ok(None);
        }

        let blob = database
            .parse_object_as_blob(&entry.oid)?
            .with_context(|| format!("object {} is not a blob", entry.oid))?;

        Ok(blob.lines().map(|data| DiffTarget {
            oid: Some(entry.oid.clone()),
            data,
        }))
    }

    fn from_nothing() -> Self {
        DiffTarget {
            oid: None,
            data: Vec::new(),
        }
    }

    fn diff_path(&self, prefix: &str, file: &Path) -> String {
        match self.oid {
            Some(_) => format!("{prefix}/{}", file.to_string_lossy().replace('\\', "/")),
            None => NULL_PATH.to_string(),
        }
    }
}

pub struct PatchWriter<'r> {
    database: &'r Database,
}

impl<'r> PatchWriter<'r> {
    pub fn new(database: &'r Database) -> Self {
        PatchWriter { database }
    }

    /// Render the patch for `change` at `file`.
    ///
    /// Returns `None` when there is no textual difference to show: binary content,
    /// submodule entries, or a mode-only change.
    pub fn render(&self, file: &Path, change: &TreeChange) -> anyhow::Result<Option<String>> {
        let Some(a) = DiffTarget::from_entry(change.old_entry(), self.database)? else {
            return Ok(None);
        };
        let Some(b) = DiffTarget::from_entry(change.new_entry(), self.database)? else {
            return Ok(None);
        };

        if a.oid == b.oid {
            return Ok(None);
        }

        let mut patch = String::new();
        writeln!(patch, "--- {}", a.diff_path("a", file))?;
        writeln!(patch, "+++ {}", b.diff_path("b", file))?;

        patch.push_str(&render_hunks(&a.data, &b.data));

        Ok(Some(patch))
    }
}

/// The `@@` blocks of a line diff, as `git diff` prints them.
///
/// Lines keep their own `\n`; a line without one is followed by the
/// `\ No newline at end of file` marker.
pub fn render_hunks(old: &[String], new: &[String]) -> String {
    let mut text = String::new();

    for hunk in MyersDiff::new(old, new).flatten_diff() {
        text.push_str(&hunk.header());
        text.push('\n');

        for edit in hunk.edits() {
            let line = edit.to_string();
            text.push_str(&line);
            if !line.ends_with('\n') {
                text.push('\n');
                text.push_str(NO_NEWLINE_MARKER);
                text.push('\n');
            }
        }
    }

    text
}
