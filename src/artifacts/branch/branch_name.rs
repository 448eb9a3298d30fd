use crate::artifacts::branch::INVALID_BRANCH_NAME_REGEX;
use anyhow::Context;
use derive_new::new;

/// Path of a ref relative to the `.git` directory, e.g. `refs/heads/main` or `HEAD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord, new)]
pub struct SymRefName(String);

impl SymRefName {
    pub fn as_ref_path(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SymRefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A ref name that satisfies git's `check-ref-format` rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct BranchName(String);

impl BranchName {
    pub fn try_parse(name: String) -> anyhow::Result<Self> {
        if name.is_empty() {
            anyhow::bail!("branch name cannot be empty");
        }

        let re = regex::Regex::new(INVALID_BRANCH_NAME_REGEX)
            .with_context(|| format!("invalid branch name regex: {INVALID_BRANCH_NAME_REGEX}"))?;

        if re.is_match(&name) {
            anyhow::bail!("invalid branch name: {}", name);
        } else {
            Ok(Self(name))
        }
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::proptest;

    proptest! {
        #[test]
        fn valid_names_with_slashes_are_accepted(
            prefix in "[a-zA-Z0-9_-]+",
            suffix in "[a-zA-Z0-9_-]+"
        ) {
            assert!(BranchName::try_parse(format!("{}/{}", prefix, suffix)).is_ok());
        }

        #[test]
        fn names_ending_with_lock_are_rejected(prefix in "[a-zA-Z0-9_-]+") {
            assert!(BranchName::try_parse(format!("{}.lock", prefix)).is_err());
        }

        #[test]
        fn names_with_special_chars_are_rejected(
            prefix in "[a-zA-Z0-9_-]+",
            suffix in "[a-zA-Z0-9_-]+",
            special_char in r"[\*:\?\[\\^~ ]"
        ) {
            let name = format!("{}{}{}", prefix, special_char, suffix);
            assert!(BranchName::try_parse(name).is_err());
        }
    }

    #[test]
    fn release_style_names_are_accepted() {
        assert!(BranchName::try_parse("v1.2.3".to_string()).is_ok());
        assert!(BranchName::try_parse("release/2024-01".to_string()).is_ok());
        assert!(BranchName::try_parse("HEAD".to_string()).is_ok());
    }

    #[test]
    fn empty_and_dotted_names_are_rejected() {
        assert!(BranchName::try_parse("".to_string()).is_err());
        assert!(BranchName::try_parse(".hidden".to_string()).is_err());
        assert!(BranchName::try_parse("a..b".to_string()).is_err());
        assert!(BranchName::try_parse("a/".to_string()).is_err());
    }
}
