use crate::artifacts::database::pack::Pack;
use crate::artifacts::diff::tree_diff::TreeDiff;
use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{ObjectBox, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use anyhow::Context;
use bytes::Bytes;
use std::collections::BTreeSet;
use std::io::{BufRead, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Read-only view over the object store (`.git/objects`), loose objects and packs.
///
/// Loose objects take precedence; packs are discovered on first use.
#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
    packs: OnceLock<Vec<Pack>>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database {
            path,
            packs: OnceLock::new(),
        }
    }

    pub fn tree_diff(
        &self,
        old_oid: Option<&ObjectId>,
        new_oid: Option<&ObjectId>,
    ) -> anyhow::Result<TreeDiff<'_>> {
        let mut tree_diff = TreeDiff::new(self);
        tree_diff.compare_oids(old_oid, new_oid, Path::new(""))?;
        Ok(tree_diff)
    }

    /// Type and inflated content (without the `<type> <size>` header) of an object.
    pub fn load(&self, object_id: &ObjectId) -> anyhow::Result<(ObjectType, Bytes)> {
        let object_path = self.path.join(object_id.to_path());
        if object_path.is_file() {
            return self.read_object(object_path);
        }

        for pack in self.packs()? {
            if let Some(offset) = pack.index().offset_of(object_id)? {
                return pack
                    .read_at(offset, &|base_oid| self.load(base_oid))
                    .with_context(|| format!("Unable to read object {object_id} from pack"));
            }
        }

        anyhow::bail!("Object {object_id} not found")
    }

    pub fn contains(&self, object_id: &ObjectId) -> anyhow::Result<bool> {
        if self.path.join(object_id.to_path()).is_file() {
            return Ok(true);
        }

        for pack in self.packs()? {
            if pack.index().offset_of(object_id)?.is_some() {
                return Ok(true);
            }
        }

        Ok(false)
    }

    pub fn parse_object(&self, object_id: &ObjectId) -> anyhow::Result<ObjectBox> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Blob => Ok(ObjectBox::Blob(Box::new(Blob::deserialize(object_reader)?))),
            ObjectType::Tree => Ok(ObjectBox::Tree(Box::new(Tree::deserialize(object_reader)?))),
            ObjectType::Commit => Ok(ObjectBox::Commit(Box::new(Commit::deserialize(
                object_reader,
            )?))),
            ObjectType::Tag => Ok(ObjectBox::Tag(Box::new(Tag::deserialize(object_reader)?))),
        }
    }

    pub fn parse_object_as_blob(&self, object_id: &ObjectId) -> anyhow::Result<Option<Blob>> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Blob => Ok(Some(Blob::deserialize(object_reader)?)),
            _ => Ok(None),
        }
    }

    pub fn parse_object_as_commit(&self, object_id: &ObjectId) -> anyhow::Result<Option<Commit>> {
        let (object_type, object_reader) = self.parse_object_as_bytes(object_id)?;

        match object_type {
            ObjectType::Commit => Ok(Some(Commit::deserialize(object_reader)?)),
            _ => Ok(None),
        }
    }

    /// Follow annotated tags until reaching a non-tag object.
    pub fn peel(&self, object_id: &ObjectId) -> anyhow::Result<ObjectId> {
        let mut oid = object_id.clone();

        while let ObjectBox::Tag(tag) = self.parse_object(&oid)? {
            log::debug!("peeling tag {} -> {}", tag.name(), tag.target());
            oid = tag.target().clone();
        }

        Ok(oid)
    }

    pub fn get_object_type(&self, object_id: &ObjectId) -> anyhow::Result<ObjectType> {
        let (object_type, _) = self.load(object_id)?;
        Ok(object_type)
    }

    /// Find all objects whose OID starts with the given prefix.
    ///
    /// Used to resolve abbreviated OIDs. More than one match means the prefix is
    /// ambiguous; an empty result means no such object.
    pub fn find_objects_by_prefix(&self, prefix: &str) -> anyhow::Result<Vec<ObjectId>> {
        let prefix = prefix.to_ascii_lowercase();
        let mut matches = BTreeSet::new();

        let dir_names = if prefix.len() >= 2 {
            vec![prefix[..2].to_string()]
        } else {
            (0..=255u8).map(|i| format!("{i:02x}")).collect()
        };

        for dir_name in dir_names {
            let dir_path = self.path.join(&dir_name);
            if !dir_path.is_dir() {
                continue;
            }

            for entry in std::fs::read_dir(&dir_path)? {
                let file_name = entry?.file_name();
                let full_oid = format!("{}{}", dir_name, file_name.to_string_lossy());

                if full_oid.starts_with(&prefix)
                    && let Ok(oid) = ObjectId::try_parse(full_oid)
                {
                    matches.insert(oid);
                }
            }
        }

        for pack in self.packs()? {
            matches.extend(pack.index().oids_with_prefix(&prefix)?);
        }

        Ok(matches.into_iter().collect())
    }

    fn packs(&self) -> anyhow::Result<&[Pack]> {
        if let Some(packs) = self.packs.get() {
            return Ok(packs);
        }

        let packs = Pack::discover(&self.path)?;
        Ok(self.packs.get_or_init(|| packs))
    }

    fn parse_object_as_bytes(
        &self,
        object_id: &ObjectId,
    ) -> anyhow::Result<(ObjectType, impl BufRead)> {
        let (object_type, object_content) = self.load(object_id)?;

        Ok((object_type, Cursor::new(object_content)))
    }

    fn read_object(&self, object_path: PathBuf) -> anyhow::Result<(ObjectType, Bytes)> {
        let object_content = std::fs::read(&object_path).context(format!(
            "Unable to read object file {}",
            object_path.display()
        ))?;
        let mut object_reader = Cursor::new(Self::decompress(object_content.into())?);

        let object_type = ObjectType::parse_object_type(&mut object_reader)
            .with_context(|| format!("Invalid object header in {}", object_path.display()))?;
        let header_length = object_reader.position() as usize;

        Ok((object_type, object_reader.into_inner().slice(header_length..)))
    }

    fn decompress(data: Bytes) -> anyhow::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(&*data);
        let mut decompressed_content = Vec::new();
        decoder
            .read_to_end(&mut decompressed_content)
            .context("Unable to decompress object content")?;

        Ok(decompressed_content.into())
    }
}
