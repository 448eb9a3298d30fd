use crate::artifacts::compare::hunk_classifier::{ChangeRecord, ClassifyError, classify};
use serde::{Deserialize, Serialize};

/// All classified changes of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    pub file_path: String,
    pub changes: Vec<ChangeRecord>,
}

impl FileDiff {
    /// Classify `patch`; `Ok(None)` when it contains no added or removed lines.
    pub fn from_patch(
        file_path: impl Into<String>,
        patch: &str,
    ) -> Result<Option<Self>, ClassifyError> {
        let changes = classify(patch)?;

        if changes.is_empty() {
            return Ok(None);
        }

        Ok(Some(FileDiff {
            file_path: file_path.into(),
            changes,
        }))
    }
}

/// A file left out of the comparison because its diff could not be classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub file_path: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionComparison {
    pub version1: String,
    pub version2: String,
    pub modified_files_count: usize,
    pub modified_files_details: Vec<FileDiff>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_files: Vec<SkippedFile>,
}

impl VersionComparison {
    pub fn new(
        version1: impl Into<String>,
        version2: impl Into<String>,
        modified_files_details: Vec<FileDiff>,
        skipped_files: Vec<SkippedFile>,
    ) -> Self {
        VersionComparison {
            version1: version1.into(),
            version2: version2.into(),
            modified_files_count: modified_files_details.len(),
            modified_files_details,
            skipped_files,
        }
    }
}
