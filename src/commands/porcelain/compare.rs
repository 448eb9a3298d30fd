use crate::areas::repository::{OpenError, Repository};
use crate::artifacts::branch::revision::{Revision, RevisionError};
use crate::artifacts::compare::file_diff::{FileDiff, SkippedFile, VersionComparison};
use crate::artifacts::compare::hunk_classifier::ChangeKind;
use crate::artifacts::diff::patch::PatchWriter;
use crate::artifacts::objects::object_id::ObjectId;
use colored::Colorize;
use std::io::Write;

#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error("Repository not found")]
    RepositoryNotFound(#[from] OpenError),
    #[error("One or both versions do not exist")]
    UnknownRevision { revision: String, reason: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Repository {
    /// Classify every line changed between two revisions, file by file in path order.
    ///
    /// Files whose diff cannot be classified are left out and listed in `skipped_files`.
    pub fn compare_versions(
        &self,
        version1: &str,
        version2: &str,
    ) -> Result<VersionComparison, CompareError> {
        let old_oid = self.resolve_version(version1)?;
        let new_oid = self.resolve_version(version2)?;

        let tree_diff = self.database().tree_diff(Some(&old_oid), Some(&new_oid))?;
        let patch_writer = PatchWriter::new(self.database());

        let mut modified_files = Vec::new();
        let mut skipped_files = Vec::new();

        for (path, change) in tree_diff.changes() {
            let file_path = path.to_string_lossy().replace('\\', "/");

            let Some(patch) = patch_writer.render(path, change)? else {
                log::debug!("no textual diff for {file_path}");
                continue;
            };

            match FileDiff::from_patch(file_path.as_str(), &patch) {
                Ok(Some(file_diff)) => modified_files.push(file_diff),
                Ok(None) => {}
                Err(err) => {
                    log::warn!("skipping {file_path}: {err}");
                    skipped_files.push(SkippedFile {
                        file_path,
                        error: err.to_string(),
                    });
                }
            }
        }

        log::info!(
            "compared {version1} ({}) with {version2} ({}): {} file(s) changed",
            old_oid.to_short_oid(),
            new_oid.to_short_oid(),
            modified_files.len()
        );

        Ok(VersionComparison::new(
            version1,
            version2,
            modified_files,
            skipped_files,
        ))
    }

    fn resolve_version(&self, version: &str) -> Result<ObjectId, CompareError> {
        let unknown = |reason: String| {
            log::debug!("cannot resolve {version}: {reason}");
            CompareError::UnknownRevision {
                revision: version.to_string(),
                reason,
            }
        };

        let revision = Revision::try_parse(version).map_err(|err| unknown(format!("{err:#}")))?;

        revision.resolve(self).map_err(|err| match err {
            RevisionError::Unknown(reason) => unknown(reason),
            RevisionError::Storage(err) => {
                CompareError::Other(err.context(format!("cannot resolve {version}")))
            }
        })
    }
}

impl VersionComparison {
    /// Human-readable listing: one block per file, one line per change.
    pub fn write_text(&self, writer: &mut dyn Write) -> anyhow::Result<()> {
        writeln!(
            writer,
            "{}",
            format!(
                "{}..{}: {} file(s) modified",
                self.version1, self.version2, self.modified_files_count
            )
            .bold()
        )?;

        for file_diff in &self.modified_files_details {
            writeln!(writer)?;
            writeln!(writer, "{}", file_diff.file_path.bold())?;

            for change in &file_diff.changes {
                let old = change.old_content.as_deref().unwrap_or_default();
                let new = change.new_content.as_deref().unwrap_or_default();

                let line = match change.kind {
                    ChangeKind::Added => format!("{:>6} + {new}", change.line_number).green(),
                    ChangeKind::Removed => format!("{:>6} - {old}", change.line_number).red(),
                    ChangeKind::Modified => {
                        format!("{:>6} ~ {old} -> {new}", change.line_number).yellow()
                    }
                };
                writeln!(writer, "{line}")?;
            }
        }

        if !self.skipped_files.is_empty() {
            writeln!(writer)?;
            for skipped in &self.skipped_files {
                writeln!(
                    writer,
                    "{}",
                    format!("skipped {}: {}", skipped.file_path, skipped.error).cyan()
                )?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::compare::hunk_classifier::ChangeRecord;
    use pretty_assertions::assert_eq;

    #[test]
    fn text_listing_marks_each_kind() {
        colored::control::set_override(false);

        let comparison = VersionComparison::new(
            "v1",
            "v2",
            vec![FileDiff {
                file_path: "src/lib.rs".to_string(),
                changes: vec![
                    ChangeRecord::modified(1, "a", "b"),
                    ChangeRecord::added(2, "c"),
                    ChangeRecord::removed(7, "d"),
                ],
            }],
            vec![SkippedFile {
                file_path: "bad".to_string(),
                error: "boom".to_string(),
            }],
        );

        let mut out = Vec::new();
        comparison.write_text(&mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "v1..v2: 1 file(s) modified\n\
             \n\
             src/lib.rs\n     \
             1 ~ a -> b\n     \
             2 + c\n     \
             7 - d\n\
             \n\
             skipped bad: boom\n"
        );
    }
}
