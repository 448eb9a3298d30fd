//! Packfiles
//!
//! `git gc`, `git repack` and clones store objects in `objects/pack/pack-<hash>.pack`,
//! next to a `.idx` file mapping object ids to offsets in the pack.
//!
//! ## Index (version 2)
//!
//! ```text
//! \377tOc | version (=2) | fanout[256] | oid[N] | crc32[N] | offset32[N] | offset64[M]
//! ```
//!
//! An `offset32` with the high bit set is an index into the `offset64` table.
//!
//! ## Pack entries
//!
//! Each entry starts with a variable-length header holding the type and inflated size,
//! followed by zlib data. Delta entries reference their base either by a negative
//! offset within the same pack (`OFS_DELTA`) or by object id (`REF_DELTA`).

use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use byteorder::{ByteOrder, NetworkEndian, ReadBytesExt};
use bytes::Bytes;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

const INDEX_SIGNATURE: [u8; 4] = [0xff, b't', b'O', b'c'];
const INDEX_VERSION: u32 = 2;
const INDEX_HEADER_SIZE: usize = 8;
const FANOUT_SIZE: usize = 256 * 4;
const RAW_OID_SIZE: usize = 20;
const LARGE_OFFSET_FLAG: u32 = 0x8000_0000;

const PACK_SIGNATURE: &[u8; 4] = b"PACK";

const OBJ_COMMIT: u8 = 1;
const OBJ_TREE: u8 = 2;
const OBJ_BLOB: u8 = 3;
const OBJ_TAG: u8 = 4;
const OBJ_OFS_DELTA: u8 = 6;
const OBJ_REF_DELTA: u8 = 7;

/// Longest delta chain followed before giving up on a corrupt pack.
const MAX_DELTA_CHAIN: usize = 10_000;

/// A parsed `.idx` file.
#[derive(Debug)]
pub struct PackIndex {
    data: Bytes,
    count: usize,
}

impl PackIndex {
    pub fn parse(data: Bytes) -> anyhow::Result<Self> {
        if data.len() < INDEX_HEADER_SIZE + FANOUT_SIZE || data[..4] != INDEX_SIGNATURE {
            anyhow::bail!("Invalid pack index signature");
        }

        let version = NetworkEndian::read_u32(&data[4..8]);
        if version != INDEX_VERSION {
            anyhow::bail!("Unsupported pack index version: {version}");
        }

        let mut index = PackIndex { data, count: 0 };
        index.count = index.fanout(255);

        if (0..256).any(|byte| index.fanout(byte) > index.count) {
            anyhow::bail!("Corrupt pack index fanout table");
        }
        if index.data.len() < index.offsets_start() + index.count * 4 {
            anyhow::bail!("Truncated pack index: {} objects expected", index.count);
        }

        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Offset of the object in the pack, if the index lists it.
    pub fn offset_of(&self, oid: &ObjectId) -> anyhow::Result<Option<u64>> {
        let raw = raw_oid(oid)?;
        let first = raw[0] as usize;

        let mut low = if first == 0 { 0 } else { self.fanout(first - 1) };
        let mut high = self.fanout(first);

        while low < high {
            let mid = low + (high - low) / 2;
            match self.oid_at(mid).cmp(&raw[..]) {
                std::cmp::Ordering::Less => low = mid + 1,
                std::cmp::Ordering::Greater => high = mid,
                std::cmp::Ordering::Equal => return self.offset_at(mid).map(Some),
            }
        }

        Ok(None)
    }

    /// Ids of all listed objects whose hex form starts with `prefix`.
    pub fn oids_with_prefix(&self, prefix: &str) -> anyhow::Result<Vec<ObjectId>> {
        (0..self.count)
            .map(|position| hex(self.oid_at(position)))
            .filter(|oid| oid.starts_with(prefix))
            .map(ObjectId::try_parse)
            .collect()
    }

    fn fanout(&self, byte: usize) -> usize {
        let start = INDEX_HEADER_SIZE + byte * 4;
        NetworkEndian::read_u32(&self.data[start..start + 4]) as usize
    }

    fn oid_at(&self, position: usize) -> &[u8] {
        let start = INDEX_HEADER_SIZE + FANOUT_SIZE + position * RAW_OID_SIZE;
        &self.data[start..start + RAW_OID_SIZE]
    }

    fn offsets_start(&self) -> usize {
        // oids, then one crc32 per object
        INDEX_HEADER_SIZE + FANOUT_SIZE + self.count * (RAW_OID_SIZE + 4)
    }

    fn offset_at(&self, position: usize) -> anyhow::Result<u64> {
        let start = self.offsets_start() + position * 4;
        let offset = NetworkEndian::read_u32(&self.data[start..start + 4]);

        if offset & LARGE_OFFSET_FLAG == 0 {
            return Ok(offset as u64);
        }

        let large_start = self.offsets_start()
            + self.count * 4
            + (offset & !LARGE_OFFSET_FLAG) as usize * 8;
        let large = self
            .data
            .get(large_start..large_start + 8)
            .context("Pack index large offset out of range")?;

        Ok(NetworkEndian::read_u64(large))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EntryKind {
    Object(ObjectType),
    OfsDelta(u64),
    RefDelta(ObjectId),
}

/// A `.pack` file together with its index.
#[derive(Debug)]
pub struct Pack {
    index: PackIndex,
    pack_path: PathBuf,
}

impl Pack {
    /// Open every pack of an objects directory, in file name order.
    pub fn discover(objects_path: &Path) -> anyhow::Result<Vec<Pack>> {
        let pack_dir = objects_path.join("pack");
        if !pack_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut index_paths = std::fs::read_dir(&pack_dir)
            .with_context(|| format!("Unable to read pack directory {}", pack_dir.display()))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "idx"))
            .collect::<Vec<_>>();
        index_paths.sort();

        index_paths.iter().map(|path| Pack::open(path)).collect()
    }

    pub fn open(index_path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read(index_path)
            .with_context(|| format!("Unable to read pack index {}", index_path.display()))?;
        let index = PackIndex::parse(data.into())
            .with_context(|| format!("Invalid pack index {}", index_path.display()))?;

        log::debug!(
            "loaded pack index {} ({} objects)",
            index_path.display(),
            index.len()
        );

        Ok(Pack {
            index,
            pack_path: index_path.with_extension("pack"),
        })
    }

    pub fn index(&self) -> &PackIndex {
        &self.index
    }

    /// Read and fully resolve the object at `offset`.
    ///
    /// `load_base` loads the base of a `REF_DELTA`, which may live outside this pack.
    pub fn read_at(
        &self,
        offset: u64,
        load_base: &dyn Fn(&ObjectId) -> anyhow::Result<(ObjectType, Bytes)>,
    ) -> anyhow::Result<(ObjectType, Bytes)> {
        let mut file = File::open(&self.pack_path)
            .with_context(|| format!("Unable to open pack {}", self.pack_path.display()))?;
        Self::check_signature(&mut file)?;

        let mut deltas = Vec::new();
        let mut offset = offset;

        let (object_type, mut data) = loop {
            if deltas.len() > MAX_DELTA_CHAIN {
                anyhow::bail!("Delta chain too long in {}", self.pack_path.display());
            }

            let (kind, data) = Self::read_entry(&mut file, offset)
                .with_context(|| format!("Corrupt pack entry at offset {offset}"))?;

            match kind {
                EntryKind::Object(object_type) => break (object_type, Bytes::from(data)),
                EntryKind::OfsDelta(distance) => {
                    deltas.push(data);
                    offset = offset
                        .checked_sub(distance)
                        .context("Delta base offset before start of pack")?;
                }
                EntryKind::RefDelta(base_oid) => {
                    deltas.push(data);
                    break load_base(&base_oid)?;
                }
            }
        };

        while let Some(delta) = deltas.pop() {
            data = apply_delta(&data, &delta)?.into();
        }

        Ok((object_type, data))
    }

    fn check_signature(file: &mut File) -> anyhow::Result<()> {
        let mut signature = [0u8; 4];
        file.read_exact(&mut signature)?;

        if &signature != PACK_SIGNATURE {
            anyhow::bail!("Invalid pack file signature");
        }

        Ok(())
    }

    fn read_entry(file: &mut File, offset: u64) -> anyhow::Result<(EntryKind, Vec<u8>)> {
        file.seek(SeekFrom::Start(offset))?;
        let mut reader = BufReader::new(file);

        let mut byte = reader.read_u8()?;
        let type_code = (byte >> 4) & 0x07;
        let mut size = (byte & 0x0f) as u64;
        let mut shift = 4;

        while byte & 0x80 != 0 {
            if shift > 57 {
                anyhow::bail!("Pack entry size overflows");
            }
            byte = reader.read_u8()?;
            size |= ((byte & 0x7f) as u64) << shift;
            shift += 7;
        }

        let kind = match type_code {
            OBJ_COMMIT => EntryKind::Object(ObjectType::Commit),
            OBJ_TREE => EntryKind::Object(ObjectType::Tree),
            OBJ_BLOB => EntryKind::Object(ObjectType::Blob),
            OBJ_TAG => EntryKind::Object(ObjectType::Tag),
            OBJ_OFS_DELTA => EntryKind::OfsDelta(read_base_distance(&mut reader)?),
            OBJ_REF_DELTA => EntryKind::RefDelta(ObjectId::read_h40_from(&mut reader)?),
            other => anyhow::bail!("Unknown pack entry type {other}"),
        };

        let mut data = Vec::new();
        flate2::read::ZlibDecoder::new(reader)
            .read_to_end(&mut data)
            .context("Unable to decompress pack entry")?;

        if data.len() as u64 != size {
            anyhow::bail!("Pack entry size mismatch: {} != {size}", data.len());
        }

        Ok((kind, data))
    }
}

/// Distance back to an `OFS_DELTA` base: big-endian 7-bit groups, each continuation adding one.
fn read_base_distance(reader: &mut impl Read) -> anyhow::Result<u64> {
    let mut byte = reader.read_u8()?;
    let mut distance = (byte & 0x7f) as u64;

    while byte & 0x80 != 0 {
        if distance > (u64::MAX >> 7) - 1 {
            anyhow::bail!("Delta base offset overflows");
        }
        byte = reader.read_u8()?;
        distance = ((distance + 1) << 7) | (byte & 0x7f) as u64;
    }

    Ok(distance)
}

/// Rebuild an object from its base and a git delta (copy and insert instructions).
pub fn apply_delta(base: &[u8], delta: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut cursor = delta;

    let source_size = read_size(&mut cursor)?;
    if source_size != base.len() {
        anyhow::bail!("Delta base size mismatch: {} != {source_size}", base.len());
    }
    let target_size = read_size(&mut cursor)?;
    let mut target = Vec::with_capacity(target_size);

    while let Some((&opcode, rest)) = cursor.split_first() {
        cursor = rest;

        if opcode & 0x80 != 0 {
            let mut copy_offset = 0usize;
            let mut copy_size = 0usize;

            for i in 0..4 {
                if opcode & (1 << i) != 0 {
                    copy_offset |= (cursor.read_u8()? as usize) << (8 * i);
                }
            }
            for i in 0..3 {
                if opcode & (0x10 << i) != 0 {
                    copy_size |= (cursor.read_u8()? as usize) << (8 * i);
                }
            }
            if copy_size == 0 {
                copy_size = 0x10000;
            }

            let chunk = copy_offset
                .checked_add(copy_size)
                .and_then(|end| base.get(copy_offset..end))
                .context("Delta copy out of range")?;
            target.extend_from_slice(chunk);
        } else if opcode != 0 {
            let len = opcode as usize;
            let chunk = cursor.get(..len).context("Truncated delta insert")?;
            target.extend_from_slice(chunk);
            cursor = &cursor[len..];
        } else {
            anyhow::bail!("Invalid delta opcode 0");
        }
    }

    if target.len() != target_size {
        anyhow::bail!("Delta result size mismatch: {} != {target_size}", target.len());
    }

    Ok(target)
}

/// Little-endian 7-bit groups, as used for the sizes at the start of a delta.
fn read_size(cursor: &mut &[u8]) -> anyhow::Result<usize> {
    let mut size = 0usize;
    let mut shift = 0;

    loop {
        let byte = cursor.read_u8().context("Truncated delta header")?;
        if shift > 57 {
            anyhow::bail!("Delta size overflows");
        }
        size |= ((byte & 0x7f) as usize) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            return Ok(size);
        }
    }
}

fn raw_oid(oid: &ObjectId) -> anyhow::Result<[u8; RAW_OID_SIZE]> {
    let hex = oid.as_ref();
    let mut raw = [0u8; RAW_OID_SIZE];

    for (i, byte) in raw.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[2 * i..2 * i + 2], 16)
            .with_context(|| format!("Invalid object ID {hex}"))?;
    }

    Ok(raw)
}

fn hex(raw: &[u8]) -> String {
    raw.iter().map(|byte| format!("{byte:02x}")).collect()
}
