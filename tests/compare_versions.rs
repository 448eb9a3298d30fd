use common::command::{git, git_commit_all, git_init, git_tag};
use common::file::{FileSpec, write_file, write_generated_files};
use common::repository::{
    TaggedRepository, delete_loose_object, expected_v1_v2_details, repository_dir,
    tagged_repository,
};
use assert_fs::TempDir;
use pretty_assertions::assert_eq;
use revdiff::areas::repository::Repository;
use revdiff::artifacts::branch::revision::Revision;
use revdiff::artifacts::compare::hunk_classifier::ChangeKind;
use revdiff::commands::porcelain::compare::CompareError;
use rstest::rstest;

mod common;

#[rstest]
fn tagged_versions_are_classified_per_file(tagged_repository: TaggedRepository) {
    let repository = Repository::open(tagged_repository.dir.path()).unwrap();

    let comparison = repository.compare_versions("v1.0", "v2.0").unwrap();

    assert_eq!(comparison.version1, "v1.0");
    assert_eq!(comparison.version2, "v2.0");
    assert_eq!(comparison.modified_files_count, 4);
    assert!(comparison.skipped_files.is_empty());
    assert_eq!(
        serde_json::to_value(&comparison.modified_files_details).unwrap(),
        expected_v1_v2_details()
    );
}

#[rstest]
#[case("v1.0", "main")]
#[case("main~1", "HEAD")]
#[case("main^", "@")]
#[case("refs/tags/v1.0", "refs/heads/main")]
fn revision_expressions_resolve_to_the_same_commits(
    tagged_repository: TaggedRepository,
    #[case] version1: &str,
    #[case] version2: &str,
) {
    let repository = Repository::open(tagged_repository.dir.path()).unwrap();

    let comparison = repository.compare_versions(version1, version2).unwrap();

    assert_eq!(
        serde_json::to_value(&comparison.modified_files_details).unwrap(),
        expected_v1_v2_details()
    );
}

#[rstest]
fn abbreviated_and_full_commit_ids_are_accepted(tagged_repository: TaggedRepository) {
    let repository = Repository::open(tagged_repository.dir.path()).unwrap();
    let short_v1 = &tagged_repository.v1_oid[..8];

    let comparison = repository
        .compare_versions(short_v1, &tagged_repository.v2_oid)
        .unwrap();

    assert_eq!(comparison.modified_files_count, 4);
}

#[rstest]
fn comparing_a_version_with_itself_reports_nothing(tagged_repository: TaggedRepository) {
    let repository = Repository::open(tagged_repository.dir.path()).unwrap();

    let comparison = repository.compare_versions("v2.0", "main").unwrap();

    assert_eq!(comparison.modified_files_count, 0);
    assert!(comparison.modified_files_details.is_empty());
}

#[rstest]
fn reversed_comparison_swaps_added_and_removed(tagged_repository: TaggedRepository) {
    let repository = Repository::open(tagged_repository.dir.path()).unwrap();

    let comparison = repository.compare_versions("v2.0", "v1.0").unwrap();
    let old_file = comparison
        .modified_files_details
        .iter()
        .find(|file| file.file_path == "docs/old.txt")
        .unwrap();

    assert_eq!(old_file.changes.len(), 1);
    assert_eq!(old_file.changes[0].kind, ChangeKind::Added);
    assert_eq!(old_file.changes[0].new_content.as_deref(), Some("obsolete"));
}

#[rstest]
#[case("v3.0")]
#[case("v1.0~5")]
#[case("not a ref")]
#[case("deadbeef")]
#[case("0000000000000000000000000000000000000000")]
#[case("v2.0^{tree}")]
fn unknown_versions_are_rejected(tagged_repository: TaggedRepository, #[case] version: &str) {
    let repository = Repository::open(tagged_repository.dir.path()).unwrap();

    let result = repository.compare_versions("v1.0", version);

    assert!(matches!(
        result,
        Err(CompareError::UnknownRevision { revision, .. }) if revision == version
    ));
}

#[rstest]
fn non_commit_objects_are_unknown_versions(tagged_repository: TaggedRepository) {
    let root = tagged_repository.dir.path();
    let tree_oid = git(root, &["rev-parse", "v2.0^{tree}"]);
    let repository = Repository::open(root).unwrap();

    let result = repository.compare_versions("v1.0", &tree_oid);

    assert!(matches!(result, Err(CompareError::UnknownRevision { .. })));
}

#[rstest]
fn missing_tagged_commit_is_a_storage_error(tagged_repository: TaggedRepository) {
    let root = tagged_repository.dir.path();
    delete_loose_object(root, &tagged_repository.v1_oid);
    let repository = Repository::open(root).unwrap();

    let result = repository.compare_versions("v1.0", "v2.0");

    let Err(CompareError::Other(err)) = result else {
        panic!("expected a storage error, got {result:?}");
    };
    assert!(format!("{err:#}").contains(&tagged_repository.v1_oid));
}

#[rstest]
fn garbage_collected_repository_is_read_from_packs(tagged_repository: TaggedRepository) {
    let root = tagged_repository.dir.path();
    git(root, &["gc", "--prune=now", "--quiet"]);
    let v1_oid = &tagged_repository.v1_oid;
    assert!(!root.join(".git/objects").join(&v1_oid[..2]).join(&v1_oid[2..]).exists());

    let repository = Repository::open(root).unwrap();
    let comparison = repository.compare_versions("v1.0", "v2.0").unwrap();
    let by_abbreviated_id = repository
        .compare_versions(&tagged_repository.v1_oid[..8], &tagged_repository.v2_oid)
        .unwrap();

    assert_eq!(
        serde_json::to_value(&comparison.modified_files_details).unwrap(),
        expected_v1_v2_details()
    );
    assert_eq!(
        by_abbreviated_id.modified_files_details,
        comparison.modified_files_details
    );
}

#[rstest]
fn deltified_blobs_are_rebuilt_from_their_base(repository_dir: TempDir) {
    let root = repository_dir.path();
    git_init(root);
    let original = (0..200).map(|i| format!("line {i}\n")).collect::<String>();
    write_file(FileSpec::text(root.join("big.txt"), &original));
    git_commit_all(root, "Base");
    git_tag(root, "base", false);

    let edited = original.replace("line 100\n", "line one hundred\n");
    write_file(FileSpec::text(root.join("big.txt"), &edited));
    git_commit_all(root, "Edit");
    git(root, &["repack", "-a", "-d", "-f", "--depth=50", "--window=250", "--quiet"]);
    git(root, &["prune-packed", "--quiet"]);

    let repository = Repository::open(root).unwrap();
    let comparison = repository.compare_versions("base", "HEAD").unwrap();

    assert_eq!(comparison.modified_files_count, 1);
    let changes = &comparison.modified_files_details[0].changes;
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].kind, ChangeKind::Modified);
    assert_eq!(changes[0].old_content.as_deref(), Some("line 100"));
    assert_eq!(changes[0].new_content.as_deref(), Some("line one hundred"));
}

#[rstest]
fn packed_refs_are_resolved(tagged_repository: TaggedRepository) {
    let root = tagged_repository.dir.path();
    git(root, &["pack-refs", "--all"]);
    assert!(!root.join(".git/refs/tags/v1.0").exists());

    let repository = Repository::open(root).unwrap();
    let comparison = repository.compare_versions("v1.0", "v2.0").unwrap();
    let refs = repository
        .list_refs()
        .unwrap()
        .into_iter()
        .map(|name| name.to_string())
        .collect::<Vec<_>>();

    assert_eq!(comparison.modified_files_count, 4);
    assert_eq!(
        refs,
        vec!["refs/heads/main", "refs/tags/v1.0", "refs/tags/v2.0", "HEAD"]
    );
}

#[rstest]
fn revisions_resolve_like_git(tagged_repository: TaggedRepository) {
    let root = tagged_repository.dir.path();
    let repository = Repository::open(root).unwrap();

    for expression in ["v1.0", "v2.0", "HEAD", "main~1", "v2.0^", "@"] {
        let resolved = Revision::try_parse(expression)
            .unwrap()
            .resolve(&repository)
            .unwrap();
        let expected = git(root, &["rev-parse", &format!("{expression}^{{commit}}")]);

        assert_eq!(resolved.as_ref(), expected, "resolving {expression}");
    }
}

#[rstest]
fn generated_files_are_reported_as_added(repository_dir: TempDir) {
    let root = repository_dir.path();
    git_init(root);
    write_file(FileSpec::text(root.join("README.md"), "base\n"));
    git_commit_all(root, "Base");
    git_tag(root, "base", false);

    let names = write_generated_files(&root.join("generated"), 5);
    git_commit_all(root, "Generated files");

    let repository = Repository::open(root).unwrap();
    let comparison = repository.compare_versions("base", "HEAD").unwrap();

    let paths = comparison
        .modified_files_details
        .iter()
        .map(|file| file.file_path.clone())
        .collect::<Vec<_>>();
    let expected_paths = names
        .iter()
        .map(|name| format!("generated/{name}"))
        .collect::<Vec<_>>();

    assert_eq!(paths, expected_paths);
    assert!(comparison.modified_files_details.iter().all(|file| {
        file.changes.len() == 1 && file.changes[0].kind == ChangeKind::Added
    }));
}

#[test]
fn missing_repository_is_not_found() {
    let dir = TempDir::new().unwrap();

    let result = Repository::open(dir.path().join("missing"));

    assert!(result.is_err());
}
