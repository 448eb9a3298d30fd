use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tag::Tag;
use crate::artifacts::objects::tree::Tree;
use anyhow::Result;
use std::io::BufRead;

pub trait Unpackable {
    /// Parse the object body. The `<type> <size>\0` header has already been consumed.
    fn deserialize(reader: impl BufRead) -> Result<Self>
    where
        Self: Sized;
}

#[derive(Debug)]
pub enum ObjectBox {
    Blob(Box<Blob>),
    Tree(Box<Tree>),
    Commit(Box<Commit>),
    Tag(Box<Tag>),
}

impl ObjectBox {
    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectBox::Blob(_) => ObjectType::Blob,
            ObjectBox::Tree(_) => ObjectType::Tree,
            ObjectBox::Commit(_) => ObjectType::Commit,
            ObjectBox::Tag(_) => ObjectType::Tag,
        }
    }
}
