//! Annotated tag object
//!
//! Lightweight tags are plain refs; annotated tags are objects pointing at another
//! object (usually a commit) and must be peeled before they can be compared.

use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use std::io::BufRead;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    target: ObjectId,
    target_type: ObjectType,
    name: String,
}

impl Tag {
    pub fn target(&self) -> &ObjectId {
        &self.target
    }

    pub fn target_type(&self) -> ObjectType {
        self.target_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Unpackable for Tag {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let mut target = None;
        let mut target_type = None;
        let mut name = String::new();

        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                break;
            }

            if let Some(oid) = line.strip_prefix("object ") {
                target = Some(ObjectId::try_parse(oid.to_string())?);
            } else if let Some(kind) = line.strip_prefix("type ") {
                target_type = Some(ObjectType::try_from(kind)?);
            } else if let Some(tag) = line.strip_prefix("tag ") {
                name = tag.to_string();
            }
        }

        Ok(Tag {
            target: target.context("Invalid tag object: missing object line")?,
            target_type: target_type.context("Invalid tag object: missing type line")?,
            name,
        })
    }
}
