//! Git object identifier (SHA-1 hash)
//!
//! Object IDs are 40-character hexadecimal strings. Loose objects live at
//! `.git/objects/<first-2-chars>/<remaining-38-chars>`.

use crate::artifacts::objects::OBJECT_ID_LENGTH;
use std::io;
use std::path::PathBuf;

/// Git object identifier (SHA-1 hash), always stored in lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ObjectId(String);

impl ObjectId {
    /// Parse and validate a full 40-character object ID.
    pub fn try_parse(id: String) -> anyhow::Result<Self> {
        if id.len() != OBJECT_ID_LENGTH {
            return Err(anyhow::anyhow!("Invalid object ID length: {}", id.len()));
        }
        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow::anyhow!("Invalid object ID characters: {}", id));
        }
        Ok(Self(id.to_ascii_lowercase()))
    }

    /// Read the 20-byte binary form used inside tree objects.
    pub fn read_h40_from<R: io::Read + ?Sized>(reader: &mut R) -> anyhow::Result<Self> {
        let mut raw = [0u8; OBJECT_ID_LENGTH / 2];
        reader.read_exact(&mut raw)?;

        let hex40 = raw.iter().map(|byte| format!("{byte:02x}")).collect();
        Self::try_parse(hex40)
    }

    /// Path of the loose object relative to the objects directory (`ab/cdef...`).
    pub fn to_path(&self) -> PathBuf {
        let (dir, file) = self.0.split_at(2);
        PathBuf::from(dir).join(file)
    }

    /// First 7 characters of the hash.
    pub fn to_short_oid(&self) -> String {
        self.0.split_at(7).0.to_string()
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::io::Cursor;

    #[test]
    fn object_path_splits_after_two_characters() {
        let oid = ObjectId::try_parse("ce013625030ba8dba906f756967f9e9ca394464a".to_string())
            .unwrap();

        assert_eq!(
            oid.to_path(),
            PathBuf::from("ce").join("013625030ba8dba906f756967f9e9ca394464a")
        );
        assert_eq!(oid.to_short_oid(), "ce01362");
    }

    #[test]
    fn uppercase_ids_are_normalized() {
        let oid = ObjectId::try_parse("CE013625030BA8DBA906F756967F9E9CA394464A".to_string())
            .unwrap();

        assert_eq!(oid.as_ref(), "ce013625030ba8dba906f756967f9e9ca394464a");
    }

    #[test]
    fn invalid_ids_are_rejected() {
        assert!(ObjectId::try_parse("abc".to_string()).is_err());
        assert!(ObjectId::try_parse("z".repeat(40)).is_err());
    }

    proptest! {
        #[test]
        fn binary_form_reads_back_as_hex(raw in proptest::array::uniform20(any::<u8>())) {
            let expected = raw.iter().map(|b| format!("{b:02x}")).collect::<String>();
            let oid = ObjectId::read_h40_from(&mut Cursor::new(raw.to_vec())).unwrap();

            prop_assert_eq!(oid.as_ref(), expected.as_str());
        }
    }
}
