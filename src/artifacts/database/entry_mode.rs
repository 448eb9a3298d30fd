//! Tree entry modes as they appear in tree objects.

#[derive(Debug, Clone, Copy, Eq, Ord, Default, PartialEq, PartialOrd, Hash)]
pub enum EntryMode {
    #[default]
    Regular,
    Executable,
    Symlink,
    /// Submodule commit; the object lives in another repository
    Gitlink,
    Directory,
}

impl EntryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryMode::Regular => "100644",
            EntryMode::Executable => "100755",
            EntryMode::Symlink => "120000",
            EntryMode::Gitlink => "160000",
            EntryMode::Directory => "40000",
        }
    }

    pub fn from_octal_str(mode: &str) -> anyhow::Result<Self> {
        let mode = u32::from_str_radix(mode, 8)
            .map_err(|_| anyhow::anyhow!("Invalid entry mode: {mode}"))?;

        EntryMode::try_from(mode)
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, EntryMode::Directory)
    }

    /// Whether the entry's object is a blob stored in this repository.
    pub fn is_blob(&self) -> bool {
        matches!(
            self,
            EntryMode::Regular | EntryMode::Executable | EntryMode::Symlink
        )
    }
}

impl TryFrom<u32> for EntryMode {
    type Error = anyhow::Error;

    fn try_from(mode: u32) -> anyhow::Result<Self> {
        match mode {
            0o100644 | 0o100664 => Ok(EntryMode::Regular),
            0o100755 => Ok(EntryMode::Executable),
            0o120000 => Ok(EntryMode::Symlink),
            0o160000 => Ok(EntryMode::Gitlink),
            0o40000 => Ok(EntryMode::Directory),
            _ => Err(anyhow::anyhow!("Invalid entry mode: {mode:o}")),
        }
    }
}
