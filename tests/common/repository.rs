use crate::common::command::{git_commit_all, git_init, git_tag};
use crate::common::file::{FileSpec, delete_path, write_file};
use assert_fs::TempDir;
use rstest::fixture;
use serde_json::{Value, json};
use std::path::Path;

/// Commit ids of the two tagged commits of [`tagged_repository_dir`].
#[derive(Debug)]
pub struct TaggedRepository {
    pub dir: TempDir,
    pub v1_oid: String,
    pub v2_oid: String,
}

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// Two commits on `main`: `v1.0` (annotated tag) and `v2.0` (lightweight tag).
///
/// Between them: `README.md` and `src/lib.rs` are edited, `docs/old.txt` is deleted,
/// `notes/new.txt` is added, a binary file changes and `unchanged.txt` stays the same.
#[fixture]
pub fn tagged_repository(repository_dir: TempDir) -> TaggedRepository {
    let root = repository_dir.path();
    git_init(root);

    write_file(FileSpec::text(root.join("README.md"), "# Demo\nfirst line\nsecond line\n"));
    write_file(FileSpec::text(
        root.join("src").join("lib.rs"),
        "fn one() {}\nfn two() {}\nfn three() {}\n",
    ));
    write_file(FileSpec::text(root.join("docs").join("old.txt"), "obsolete\n"));
    write_file(FileSpec::new(root.join("assets").join("logo.bin"), vec![0, 1, 2, 3]));
    write_file(FileSpec::text(root.join("unchanged.txt"), "same\n"));
    let v1_oid = git_commit_all(root, "Initial version");
    git_tag(root, "v1.0", true);

    write_file(FileSpec::text(
        root.join("README.md"),
        "# Demo\nfirst line changed\nsecond line\n",
    ));
    write_file(FileSpec::text(
        root.join("src").join("lib.rs"),
        "fn one() {}\nfn three() {}\nfn four() {}\n",
    ));
    delete_path(&root.join("docs"));
    write_file(FileSpec::text(root.join("notes").join("new.txt"), "hello\nworld\n"));
    write_file(FileSpec::new(root.join("assets").join("logo.bin"), vec![0, 1, 2, 4]));
    let v2_oid = git_commit_all(root, "Second version");
    git_tag(root, "v2.0", false);

    TaggedRepository {
        dir: repository_dir,
        v1_oid,
        v2_oid,
    }
}

/// Remove the loose file of an object, leaving refs that point at it dangling.
pub fn delete_loose_object(root: &Path, oid: &str) {
    let object_path = root.join(".git/objects").join(&oid[..2]).join(&oid[2..]);
    std::fs::remove_file(object_path).expect("Failed to delete loose object");
}

/// Expected `modified_files_details` when comparing `v1.0` with `v2.0`.
pub fn expected_v1_v2_details() -> Value {
    json!([
        {
            "file_path": "README.md",
            "changes": [
                {
                    "line_number": 1,
                    "type": "modified",
                    "old_content": "first line",
                    "new_content": "first line changed",
                },
            ],
        },
        {
            "file_path": "docs/old.txt",
            "changes": [
                {
                    "line_number": 1,
                    "type": "removed",
                    "old_content": "obsolete",
                    "new_content": null,
                },
            ],
        },
        {
            "file_path": "notes/new.txt",
            "changes": [
                {"line_number": 0, "type": "added", "old_content": null, "new_content": "hello"},
                {"line_number": 1, "type": "added", "old_content": null, "new_content": "world"},
            ],
        },
        {
            "file_path": "src/lib.rs",
            "changes": [
                {
                    "line_number": 2,
                    "type": "added",
                    "old_content": null,
                    "new_content": "fn four() {}",
                },
                {
                    "line_number": 1,
                    "type": "removed",
                    "old_content": "fn two() {}",
                    "new_content": null,
                },
            ],
        },
    ])
}
