//! Git tree object
//!
//! Trees represent directory snapshots: entries for files (blobs), symlinks,
//! submodules and subdirectories (other trees), keyed by name.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<mode> <name>\0<20-byte-sha1>`

use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::database::entry_mode::EntryMode;
use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use std::collections::BTreeMap;
use std::io::BufRead;

#[derive(Debug, Clone, Default)]
pub struct Tree {
    entries: BTreeMap<String, DatabaseEntry>,
}

impl Tree {
    pub fn entries(&self) -> impl Iterator<Item = (&String, &DatabaseEntry)> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> impl Iterator<Item = (String, DatabaseEntry)> {
        self.entries.into_iter()
    }
}

impl Unpackable for Tree {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let mut entries = BTreeMap::new();
        let mut reader = reader;

        // Reuse scratch buffers to reduce allocs
        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break;
            }
            if mode_bytes.pop() != Some(b' ') {
                return Err(anyhow::anyhow!("unexpected EOF in mode"));
            }

            let mode = EntryMode::from_octal_str(std::str::from_utf8(&mode_bytes)?)?;

            name_bytes.clear();
            reader.read_until(b'\0', &mut name_bytes)?;
            if name_bytes.pop() != Some(b'\0') {
                return Err(anyhow::anyhow!("unexpected EOF in name"));
            }
            let name = String::from_utf8_lossy(&name_bytes).into_owned();

            let oid =
                ObjectId::read_h40_from(&mut reader).context("unexpected EOF in object id")?;

            entries.insert(name, DatabaseEntry::new(oid, mode));
        }

        Ok(Tree { entries })
    }
}
