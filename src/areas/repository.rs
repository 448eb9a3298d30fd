use crate::areas::database::Database;
use crate::areas::refs::Refs;
use crate::artifacts::branch::branch_name::SymRefName;
use std::path::Path;

const GIT_DIR: &str = ".git";

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("Repository not found at {0}")]
    NotFound(String),
}

/// Read-only handle on a git repository with a `.git` directory.
///
/// Holds no mutable state, so one handle can serve concurrent requests.
#[derive(Debug)]
pub struct Repository {
    database: Database,
    refs: Refs,
}

impl Repository {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OpenError> {
        let requested = path.as_ref();
        let not_found = || OpenError::NotFound(requested.display().to_string());

        let path = requested.canonicalize().map_err(|_| not_found())?;
        let git_dir = path.join(GIT_DIR);
        if !git_dir.is_dir() {
            return Err(not_found());
        }

        let database = Database::new(git_dir.join("objects").into_boxed_path());
        let refs = Refs::new(git_dir.into_boxed_path());

        log::debug!("opened repository at {}", path.display());

        Ok(Repository { database, refs })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn list_refs(&self) -> anyhow::Result<Vec<SymRefName>> {
        self.refs.list_refs()
    }
}
