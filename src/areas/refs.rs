//! Git references (branches, tags, HEAD)
//!
//! References are human-readable names pointing to objects. They can be:
//! - Direct: containing an object SHA-1
//! - Symbolic: pointing to another reference (e.g., HEAD -> refs/heads/main)
//!
//! ## Storage
//!
//! - Loose refs: text files under `.git` (`HEAD`, `refs/heads/*`, `refs/tags/*`, ...)
//!   containing either a 40-character SHA-1 or `ref: <path>`
//! - Packed refs: `.git/packed-refs`, one `<sha1> <refname>` per line, with `^<sha1>`
//!   lines recording the peeled target of the preceding annotated tag
//!
//! A loose ref always takes precedence over a packed ref of the same name.

use crate::artifacts::branch::branch_name::{BranchName, SymRefName};
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use derive_new::new;
use std::collections::BTreeSet;
use std::path::Path;
use walkdir::WalkDir;

/// Regex pattern for parsing symbolic references
const SYMREF_REGEX: &str = r"^ref: (.+)$";

/// Name of the HEAD reference
pub const HEAD_REF_NAME: &str = "HEAD";

const PACKED_REFS_FILE: &str = "packed-refs";

/// Prefixes tried, in order, when a short name is looked up (`git rev-parse` rules).
const REF_SEARCH_PREFIXES: [&str; 5] = ["", "refs/", "refs/tags/", "refs/heads/", "refs/remotes/"];

/// Git references reader, rooted at the `.git` directory.
#[derive(Debug, new)]
pub struct Refs {
    path: Box<Path>,
}

#[derive(Debug, Clone)]
enum SymRefOrOid {
    SymRef { sym_ref_name: SymRefName },
    Oid(ObjectId),
}

impl SymRefOrOid {
    fn read_symref_or_oid(path: &Path) -> anyhow::Result<Option<SymRefOrOid>> {
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read ref file at {:?}", path))?;
        let content = content.trim();

        if content.is_empty() {
            return Ok(None);
        }

        let symref_match = regex::Regex::new(SYMREF_REGEX)?.captures(content);
        if let Some(symref_match) = symref_match {
            Ok(Some(SymRefOrOid::SymRef {
                sym_ref_name: SymRefName::new(symref_match[1].to_string()),
            }))
        } else {
            Ok(Some(SymRefOrOid::Oid(ObjectId::try_parse(
                content.to_string(),
            )?)))
        }
    }
}

impl Refs {
    /// Resolve a short or full ref name to the object it points at.
    ///
    /// Returns `Ok(None)` when no ref has that name or the ref is unborn (e.g. HEAD in an
    /// empty repository); errors are reserved for refs that cannot be read.
    pub fn read_ref(&self, branch_name: BranchName) -> anyhow::Result<Option<ObjectId>> {
        match self.find_ref(branch_name.as_ref())? {
            Some(ref_path) => self.read_ref_path(&ref_path),
            None => Ok(None),
        }
    }

    /// Full path (relative to `.git`) of the first ref matching `name`.
    pub fn find_ref(&self, name: &str) -> anyhow::Result<Option<String>> {
        let packed = self.packed_refs()?;

        Ok(REF_SEARCH_PREFIXES
            .iter()
            .map(|prefix| format!("{prefix}{name}"))
            .find(|candidate| {
                self.path.join(candidate).is_file()
                    || packed.iter().any(|(packed_name, _)| packed_name == candidate)
            }))
    }

    fn read_ref_path(&self, ref_path: &str) -> anyhow::Result<Option<ObjectId>> {
        match SymRefOrOid::read_symref_or_oid(&self.path.join(ref_path))? {
            Some(SymRefOrOid::SymRef { sym_ref_name }) => {
                self.read_ref_path(sym_ref_name.as_ref_path())
            }
            Some(SymRefOrOid::Oid(oid)) => Ok(Some(oid)),
            None => Ok(self
                .packed_refs()?
                .into_iter()
                .find(|(name, _)| name == ref_path)
                .map(|(_, oid)| oid)),
        }
    }

    /// Entries of `packed-refs` as `(refname, oid)`; peeled `^` lines are skipped.
    fn packed_refs(&self) -> anyhow::Result<Vec<(String, ObjectId)>> {
        let path = self.path.join(PACKED_REFS_FILE);
        if !path.is_file() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read packed refs at {:?}", path))?;

        content
            .lines()
            .filter(|line| !line.starts_with('#') && !line.starts_with('^') && !line.is_empty())
            .map(|line| {
                let (oid, name) = line
                    .split_once(' ')
                    .with_context(|| format!("invalid packed ref line: {line}"))?;
                Ok((name.to_string(), ObjectId::try_parse(oid.to_string())?))
            })
            .collect()
    }

    /// All loose and packed refs under `refs/`, followed by `HEAD`.
    pub fn list_refs(&self) -> anyhow::Result<Vec<SymRefName>> {
        let mut names = WalkDir::new(self.refs_path())
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                let relative_path = entry.path().strip_prefix(self.path.as_ref()).ok()?;
                Some(relative_path.to_string_lossy().replace('\\', "/"))
            })
            .collect::<BTreeSet<_>>();

        names.extend(self.packed_refs()?.into_iter().map(|(name, _)| name));

        Ok(names
            .into_iter()
            .map(SymRefName::new)
            .chain(std::iter::once(SymRefName::new(HEAD_REF_NAME.to_string())))
            .collect())
    }

    pub fn refs_path(&self) -> Box<Path> {
        self.path.join("refs").into_boxed_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    const MAIN_OID: &str = "ce013625030ba8dba906f756967f9e9ca394464a";
    const TAG_OID: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";
    const PACKED_OID: &str = "1111111111111111111111111111111111111111";

    #[fixture]
    fn git_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        std::fs::create_dir_all(root.join("refs/heads/feature")).unwrap();
        std::fs::create_dir_all(root.join("refs/tags")).unwrap();
        std::fs::write(root.join("HEAD"), "ref: refs/heads/main\n").unwrap();
        std::fs::write(root.join("refs/heads/main"), format!("{MAIN_OID}\n")).unwrap();
        std::fs::write(root.join("refs/heads/feature/x"), MAIN_OID).unwrap();
        std::fs::write(root.join("refs/tags/v1"), TAG_OID).unwrap();
        std::fs::write(
            root.join(PACKED_REFS_FILE),
            format!(
                "# pack-refs with: peeled fully-peeled sorted\n\
                 {PACKED_OID} refs/tags/v0\n^{MAIN_OID}\n{PACKED_OID} refs/heads/main\n"
            ),
        )
        .unwrap();

        dir
    }

    fn refs(dir: &TempDir) -> Refs {
        Refs::new(dir.path().into())
    }

    #[rstest]
    fn head_follows_symbolic_ref(git_dir: TempDir) {
        let head = refs(&git_dir)
            .read_ref(BranchName::try_parse(HEAD_REF_NAME.to_string()).unwrap())
            .unwrap();

        assert_eq!(head.unwrap().as_ref(), MAIN_OID);
    }

    #[rstest]
    #[case("main", MAIN_OID)]
    #[case("feature/x", MAIN_OID)]
    #[case("v1", TAG_OID)]
    #[case("refs/tags/v1", TAG_OID)]
    #[case("v0", PACKED_OID)]
    fn short_names_resolve(git_dir: TempDir, #[case] name: &str, #[case] expected: &str) {
        let oid = refs(&git_dir)
            .read_ref(BranchName::try_parse(name.to_string()).unwrap())
            .unwrap();

        assert_eq!(oid.unwrap().as_ref(), expected);
    }

    #[rstest]
    fn loose_ref_shadows_packed_ref(git_dir: TempDir) {
        let oid = refs(&git_dir)
            .read_ref(BranchName::try_parse("refs/heads/main".to_string()).unwrap())
            .unwrap();

        assert_eq!(oid.unwrap().as_ref(), MAIN_OID);
    }

    #[rstest]
    fn unknown_ref_is_none(git_dir: TempDir) {
        let result = refs(&git_dir).read_ref(BranchName::try_parse("nope".to_string()).unwrap());

        assert_eq!(result.unwrap(), None);
    }

    #[rstest]
    fn unreadable_ref_is_an_error(git_dir: TempDir) {
        std::fs::write(git_dir.path().join("refs/heads/broken"), "not an object id\n").unwrap();

        let result = refs(&git_dir).read_ref(BranchName::try_parse("broken".to_string()).unwrap());

        assert!(result.is_err());
    }

    #[rstest]
    fn lists_loose_and_packed_refs(git_dir: TempDir) {
        let names = refs(&git_dir)
            .list_refs()
            .unwrap()
            .into_iter()
            .map(|name| name.as_ref_path().to_string())
            .collect::<Vec<_>>();

        assert_eq!(
            names,
            vec![
                "refs/heads/feature/x",
                "refs/heads/main",
                "refs/tags/v0",
                "refs/tags/v1",
                "HEAD",
            ]
        );
    }
}
