//! Git blob object
//!
//! Blobs store raw file content without any metadata (names and modes live in trees).
//! Content is kept as bytes; a blob only takes part in a line diff when it is text.

use crate::artifacts::objects::object::Unpackable;
use bytes::Bytes;
use derive_new::new;
use std::io::BufRead;

/// Number of leading bytes inspected for a NUL byte, matching git's binary heuristic.
const BINARY_SNIFF_SIZE: usize = 8000;

#[derive(Debug, Clone, new)]
pub struct Blob {
    content: Bytes,
}

impl Blob {
    pub fn is_binary(&self) -> bool {
        let head = &self.content[..self.content.len().min(BINARY_SNIFF_SIZE)];
        head.contains(&0) || std::str::from_utf8(&self.content).is_err()
    }

    /// The content as lines, or `None` for binary blobs.
    ///
    /// Lines are split after each `\n` and keep it, so a last line without one stays
    /// distinguishable from the same line with a newline.
    pub fn lines(&self) -> Option<Vec<String>> {
        if self.is_binary() {
            return None;
        }

        let text = std::str::from_utf8(&self.content).ok()?;
        Some(text.split_inclusive('\n').map(str::to_string).collect())
    }
}

impl Unpackable for Blob {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let content = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;

        Ok(Self::new(content.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("one\ntwo\n", vec!["one\n", "two\n"])]
    #[case("one\ntwo", vec!["one\n", "two"])]
    #[case("one\r\n\ntwo\n", vec!["one\r\n", "\n", "two\n"])]
    #[case("", vec![])]
    fn text_is_split_on_newlines(#[case] content: &str, #[case] expected: Vec<&str>) {
        let blob = Blob::new(Bytes::copy_from_slice(content.as_bytes()));

        assert_eq!(
            blob.lines(),
            Some(expected.into_iter().map(String::from).collect())
        );
    }

    #[test]
    fn nul_bytes_mark_blob_as_binary() {
        let blob = Blob::new(Bytes::from_static(b"PNG\0\x01\x02"));

        assert!(blob.is_binary());
        assert_eq!(blob.lines(), None);
    }

    #[test]
    fn invalid_utf8_is_binary() {
        let blob = Blob::new(Bytes::from_static(&[0xff, 0xfe, b'a']));

        assert!(blob.is_binary());
    }
}
