use derive_new::new;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct FileSpec {
    pub path: PathBuf,
    pub content: Vec<u8>,
}

impl FileSpec {
    pub fn text(path: PathBuf, content: &str) -> Self {
        FileSpec::new(path, content.as_bytes().to_vec())
    }
}

pub fn write_file(file_spec: FileSpec) {
    // make sure the parent directory exists
    if let Some(parent) = file_spec.path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("Failed to create directory {:?}: {}", parent, e));
    }

    std::fs::write(&file_spec.path, &file_spec.content)
        .unwrap_or_else(|e| panic!("Failed to write file {:?}: {}", file_spec.path, e));
}

pub fn delete_path(path: &Path) {
    if path.is_dir() {
        std::fs::remove_dir_all(path)
            .unwrap_or_else(|e| panic!("Failed to delete directory {:?}: {}", path, e));
    } else {
        std::fs::remove_file(path)
            .unwrap_or_else(|e| panic!("Failed to delete file {:?}: {}", path, e));
    }
}

/// Write `files_count` single-line text files with random names under `dir`.
///
/// Returns the distinct file names written, sorted.
pub fn write_generated_files(dir: &Path, files_count: usize) -> BTreeSet<String> {
    use fake::{
        Fake,
        faker::lorem::en::{Word, Words},
    };

    let mut names = BTreeSet::new();

    while names.len() < files_count {
        let file_name = format!("{}.txt", Word().fake::<String>());
        if !names.insert(file_name.clone()) {
            continue;
        }

        let file_content = Words(5..10).fake::<Vec<String>>().join(" ");
        write_file(FileSpec::text(dir.join(&file_name), &file_content));
    }

    names
}
