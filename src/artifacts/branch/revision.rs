use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::branch::{ANCESTOR_REGEX, PARENT_REGEX, REF_ALIASES};
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;

/// Shortest hex prefix accepted as an abbreviated object id.
const MIN_OID_PREFIX_LENGTH: usize = 4;

/// A revision expression identifying a commit.
///
/// Supports:
/// - Ref names: `main`, `feature/new-feature`, `v1.0`, `refs/tags/v1.0`, `HEAD`
/// - Aliases: `@` (resolves to `HEAD`)
/// - Full or abbreviated OIDs (4-40 hex characters), used when no ref has that name
/// - Parent notation: `<revision>^`
/// - Ancestor notation: `<revision>~<n>`
///
/// OID-like strings are parsed as `Ref` and only treated as object ids during resolution,
/// so that a ref named like a hex string keeps precedence, as in git.
///
/// ```ignore
/// let rev = Revision::try_parse("v1.0~2")?;
/// let commit_oid = rev.resolve(&repository)?;
/// ```
#[derive(Debug, Clone)]
pub enum Revision {
    Ref(BranchName),
    /// The Nth first-parent ancestor of a revision (e.g., HEAD~3)
    Ancestor(Box<Revision>, usize),
    /// The first parent of a revision (e.g., HEAD^)
    Parent(Box<Revision>),
}

/// Why a revision could not be resolved.
#[derive(Debug, thiserror::Error)]
pub enum RevisionError {
    /// Nothing in the repository matches the expression, or it names a non-commit.
    #[error("{0}")]
    Unknown(String),
    /// The repository could not be read while resolving.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl Revision {
    /// Resolve to the id of a commit, peeling annotated tags on the way.
    pub fn resolve(&self, repository: &Repository) -> Result<ObjectId, RevisionError> {
        match self {
            Revision::Ref(branch_name) => {
                let name = branch_name.as_ref();

                match repository.refs().read_ref(branch_name.clone())? {
                    Some(oid) => Self::peel_to_commit(&oid, repository),
                    None if Self::looks_like_oid(name) => Self::resolve_oid(name, repository),
                    None => Err(RevisionError::Unknown(format!(
                        "unknown revision '{name}'"
                    ))),
                }
            }
            Revision::Parent(base_revision) => {
                Self::resolve_commit_parent(&base_revision.resolve(repository)?, repository)
            }
            Revision::Ancestor(base_revision, generations) => {
                let mut oid = base_revision.resolve(repository)?;
                for _ in 0..*generations {
                    oid = Self::resolve_commit_parent(&oid, repository)?;
                }

                Ok(oid)
            }
        }
    }

    fn resolve_commit_parent(
        oid: &ObjectId,
        repository: &Repository,
    ) -> Result<ObjectId, RevisionError> {
        let commit = repository
            .database()
            .parse_object_as_commit(oid)?
            .ok_or_else(|| RevisionError::Unknown(format!("object {oid} is not a commit")))?;

        commit.parent().cloned().ok_or_else(|| {
            RevisionError::Unknown(format!("commit {} has no parent", oid.to_short_oid()))
        })
    }

    fn peel_to_commit(oid: &ObjectId, repository: &Repository) -> Result<ObjectId, RevisionError> {
        let peeled = repository
            .database()
            .peel(oid)
            .with_context(|| format!("cannot read object {oid}"))?;
        Self::validate_oid_is_commit(&peeled, repository)?;

        Ok(peeled)
    }

    fn resolve_oid(oid_str: &str, repository: &Repository) -> Result<ObjectId, RevisionError> {
        let unknown = || {
            RevisionError::Unknown(format!(
                "ambiguous argument '{oid_str}': unknown revision or path not in the working tree"
            ))
        };

        if oid_str.len() == OBJECT_ID_LENGTH {
            let oid = ObjectId::try_parse(oid_str.to_string())?;
            if !repository.database().contains(&oid)? {
                return Err(unknown());
            }
            return Self::peel_to_commit(&oid, repository);
        }

        let matches = repository.database().find_objects_by_prefix(oid_str)?;

        match matches.as_slice() {
            [] => Err(unknown()),
            [single] => Self::peel_to_commit(single, repository),
            _ => {
                let mut commit_matches = Vec::new();
                for oid in &matches {
                    if repository.database().get_object_type(oid)? == ObjectType::Commit {
                        commit_matches.push(oid);
                    }
                }

                match commit_matches.as_slice() {
                    [] => Err(unknown()),
                    [single] => Ok((*single).clone()),
                    candidates => {
                        let mut error_msg = format!(
                            "short SHA1 {oid_str} is ambiguous\nhint: The candidates are:"
                        );
                        for oid in candidates {
                            error_msg.push_str(&format!("\nhint:   {} commit", oid.to_short_oid()));
                        }
                        Err(RevisionError::Unknown(error_msg))
                    }
                }
            }
        }
    }

    fn validate_oid_is_commit(
        oid: &ObjectId,
        repository: &Repository,
    ) -> Result<(), RevisionError> {
        let obj_type = repository.database().get_object_type(oid)?;

        if obj_type != ObjectType::Commit {
            return Err(RevisionError::Unknown(format!(
                "object {} is a {}, not a commit",
                oid.to_short_oid(),
                obj_type
            )));
        }

        Ok(())
    }

    pub fn try_parse(revision: &str) -> anyhow::Result<Revision> {
        let parent_re = regex::Regex::new(PARENT_REGEX)
            .with_context(|| format!("invalid parent regex: {PARENT_REGEX}"))?;
        let ancestor_re = regex::Regex::new(ANCESTOR_REGEX)
            .with_context(|| format!("invalid ancestor regex: {ANCESTOR_REGEX}"))?;

        if let Some(caps) = parent_re.captures(revision) {
            let base_revision = Self::try_parse(&caps[1])?;

            Ok(Revision::Parent(Box::new(base_revision)))
        } else if let Some(caps) = ancestor_re.captures(revision) {
            let generations: usize = caps[2]
                .parse()
                .with_context(|| format!("failed to parse generations in revision: {revision}"))?;
            let base_revision = Self::try_parse(&caps[1])?;

            Ok(Revision::Ancestor(Box::new(base_revision), generations))
        } else {
            let resolved_name = *REF_ALIASES.get(revision).unwrap_or(&revision);
            let branch_name = BranchName::try_parse(resolved_name.to_string())?;
            Ok(Revision::Ref(branch_name))
        }
    }

    fn looks_like_oid(s: &str) -> bool {
        s.len() >= MIN_OID_PREFIX_LENGTH
            && s.len() <= OBJECT_ID_LENGTH
            && s.chars().all(|c| c.is_ascii_hexdigit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ref_name(revision: &Revision) -> Option<&str> {
        match revision {
            Revision::Ref(name) => Some(name.as_ref()),
            _ => None,
        }
    }

    #[test]
    fn test_parse_simple_ref() {
        let result = Revision::try_parse("main").unwrap();

        assert_eq!(ref_name(&result), Some("main"));
    }

    #[test]
    fn test_parse_head_alias() {
        let result = Revision::try_parse("@").unwrap();

        assert_eq!(ref_name(&result), Some("HEAD"));
    }

    #[test]
    fn test_parse_tag_like_name() {
        let result = Revision::try_parse("v1.0.2").unwrap();

        assert_eq!(ref_name(&result), Some("v1.0.2"));
    }

    #[test]
    fn test_parse_nested_parent_and_ancestor() {
        let result = Revision::try_parse("main~2^").unwrap();

        let Revision::Parent(base) = result else {
            panic!("Expected Parent variant");
        };
        let Revision::Ancestor(inner, generations) = *base else {
            panic!("Expected Ancestor variant");
        };
        assert_eq!(generations, 2);
        assert_eq!(ref_name(&inner), Some("main"));
    }

    #[test]
    fn test_parse_invalid_names() {
        for name in ["", "invalid name", "invalid:name", ".invalid", "a..b", ".invalid^"] {
            assert!(Revision::try_parse(name).is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn test_oid_heuristic() {
        assert!(Revision::looks_like_oid("a1b2"));
        assert!(Revision::looks_like_oid(&"f".repeat(40)));
        assert!(!Revision::looks_like_oid("abc"));
        assert!(!Revision::looks_like_oid("main"));
        assert!(!Revision::looks_like_oid(&"f".repeat(41)));
    }

    fn valid_branch_name_strategy() -> impl Strategy<Value = String> {
        prop::string::string_regex("[a-zA-Z0-9][a-zA-Z0-9_/-]*[a-zA-Z0-9]")
            .unwrap()
            .prop_filter("Must not contain invalid patterns", |s| {
                !s.contains("..") && !s.ends_with(".lock") && !s.contains("//")
            })
    }

    proptest! {
        #[test]
        fn prop_ancestor_suffix_creates_ancestor_revision(
            name in valid_branch_name_strategy(),
            generations in 0usize..100
        ) {
            let parsed = Revision::try_parse(&format!("{}~{}", name, generations)).unwrap();

            if let Revision::Ancestor(base, generation) = parsed {
                prop_assert_eq!(generation, generations);
                prop_assert_eq!(ref_name(&base), Some(name.as_str()));
            } else {
                prop_assert!(false, "Expected Ancestor variant");
            }
        }

        #[test]
        fn prop_multiple_parent_suffixes_nest_correctly(
            name in valid_branch_name_strategy(),
            parent_count in 1usize..5
        ) {
            let revision_str = format!("{}{}", name, "^".repeat(parent_count));
            let mut current = Revision::try_parse(&revision_str).unwrap();

            for _ in 0..parent_count {
                match current {
                    Revision::Parent(base) => current = *base,
                    _ => return Err(TestCaseError::fail("Expected Parent variant")),
                }
            }
            prop_assert_eq!(ref_name(&current), Some(name.as_str()));
        }
    }
}
