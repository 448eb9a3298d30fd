//! Line-level classification of one file's unified diff.
//!
//! Added and removed lines share a single running line counter, seeded by the first
//! (old-range) number of each `@@` header; context lines do not advance it. Added lines
//! that directly follow a run of removed lines take over the numbers of that run, so a
//! replacement block lines up. Whenever an added and a removed line land on the same
//! number they are reported together as one `modified` change.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

const HUNK_HEADER_PREFIX: &str = "@@";
const NEW_FILE_HEADER_PREFIX: &str = "+++ ";
const OLD_FILE_HEADER_PREFIX: &str = "--- ";
/// Follows a line that has no trailing newline (`\ No newline at end of file`).
const NO_NEWLINE_MARKER_PREFIX: char = '\\';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("malformed hunk header: {line:?}")]
    MalformedHunkHeader { line: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

/// One changed line. Content that does not exist on a side is `None` (JSON `null`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub line_number: usize,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub old_content: Option<String>,
    pub new_content: Option<String>,
}

impl ChangeRecord {
    pub fn added(line_number: usize, new_content: impl Into<String>) -> Self {
        ChangeRecord {
            line_number,
            kind: ChangeKind::Added,
            old_content: None,
            new_content: Some(new_content.into()),
        }
    }

    pub fn removed(line_number: usize, old_content: impl Into<String>) -> Self {
        ChangeRecord {
            line_number,
            kind: ChangeKind::Removed,
            old_content: Some(old_content.into()),
            new_content: None,
        }
    }

    pub fn modified(
        line_number: usize,
        old_content: impl Into<String>,
        new_content: impl Into<String>,
    ) -> Self {
        ChangeRecord {
            line_number,
            kind: ChangeKind::Modified,
            old_content: Some(old_content.into()),
            new_content: Some(new_content.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiffLine<'d> {
    HunkHeader(&'d str),
    Added(&'d str),
    Removed(&'d str),
    NoNewlineMarker,
    Other,
}

impl<'d> DiffLine<'d> {
    fn parse(line: &'d str) -> Self {
        if line.starts_with(HUNK_HEADER_PREFIX) {
            DiffLine::HunkHeader(line)
        } else if line.starts_with(NEW_FILE_HEADER_PREFIX)
            || line.starts_with(OLD_FILE_HEADER_PREFIX)
        {
            DiffLine::Other
        } else if let Some(text) = line.strip_prefix('+') {
            DiffLine::Added(text)
        } else if let Some(text) = line.strip_prefix('-') {
            DiffLine::Removed(text)
        } else if line.starts_with(NO_NEWLINE_MARKER_PREFIX) {
            DiffLine::NoNewlineMarker
        } else {
            DiffLine::Other
        }
    }
}

/// Line number of the first range in a hunk header (`@@ -12,7 +12,8 @@` gives 12).
fn hunk_start(header: &str) -> Result<usize, ClassifyError> {
    let malformed = || ClassifyError::MalformedHunkHeader {
        line: header.to_string(),
    };

    let range = header.split(' ').nth(1).ok_or_else(malformed)?;
    let range = range.strip_prefix('-').unwrap_or(range);
    let start = range.split(',').next().unwrap_or(range);

    start.parse().map_err(|_| malformed())
}

/// Consecutive removed lines not yet matched by added lines.
#[derive(Debug, Default, Clone, Copy)]
struct RemovedRun {
    start: usize,
    len: usize,
    paired: usize,
}

/// The running line number shared by added and removed lines.
#[derive(Debug, Default)]
struct LineCounter {
    current: usize,
    run: Option<RemovedRun>,
    in_removed_run: bool,
}

impl LineCounter {
    fn reset(&mut self, start: usize) {
        self.current = start;
        self.end_run();
    }

    fn end_run(&mut self) {
        self.run = None;
        self.in_removed_run = false;
    }

    fn next_removed(&mut self) -> usize {
        if !self.in_removed_run {
            self.run = Some(RemovedRun {
                start: self.current,
                ..RemovedRun::default()
            });
            self.in_removed_run = true;
        }
        if let Some(run) = self.run.as_mut() {
            run.len += 1;
        }

        self.advance()
    }

    fn next_added(&mut self) -> usize {
        self.in_removed_run = false;

        match self.run.as_mut() {
            Some(run) if run.paired < run.len => {
                run.paired += 1;
                run.start + run.paired - 1
            }
            _ => {
                self.run = None;
                self.advance()
            }
        }
    }

    fn advance(&mut self) -> usize {
        let line_number = self.current;
        self.current += 1;
        line_number
    }
}

/// Line text keyed by line number, iterated in first-insertion order.
///
/// Writing to a number that is already present replaces its text in place.
#[derive(Debug, Default)]
struct LineBucket {
    lines: Vec<(usize, String)>,
    positions: HashMap<usize, usize>,
}

impl LineBucket {
    fn insert(&mut self, line_number: usize, text: &str) {
        match self.positions.get(&line_number) {
            Some(&position) => self.lines[position].1 = text.to_string(),
            None => {
                self.positions.insert(line_number, self.lines.len());
                self.lines.push((line_number, text.to_string()));
            }
        }
    }

    fn get(&self, line_number: usize) -> Option<&str> {
        self.positions
            .get(&line_number)
            .map(|&position| self.lines[position].1.as_str())
    }

    fn len(&self) -> usize {
        self.lines.len()
    }

    fn into_lines(self) -> impl Iterator<Item = (usize, String)> {
        self.lines.into_iter()
    }
}

/// Classify every added and removed line of a single file's unified diff.
///
/// Records for added line numbers come first (as `modified` when a removed line shares
/// the number), followed by the remaining removed lines. Each line number is reported once.
pub fn classify(diff_text: &str) -> Result<Vec<ChangeRecord>, ClassifyError> {
    let mut counter = LineCounter::default();
    let mut added_lines = LineBucket::default();
    let mut removed_lines = LineBucket::default();

    for line in diff_text.split('\n') {
        match DiffLine::parse(line) {
            DiffLine::HunkHeader(header) => counter.reset(hunk_start(header)?),
            DiffLine::Added(text) => added_lines.insert(counter.next_added(), text),
            DiffLine::Removed(text) => removed_lines.insert(counter.next_removed(), text),
            DiffLine::NoNewlineMarker => {}
            DiffLine::Other => counter.end_run(),
        }
    }

    let mut changes = Vec::with_capacity(added_lines.len() + removed_lines.len());

    for (line_number, new_content) in added_lines.into_lines() {
        match removed_lines.get(line_number) {
            Some(old_content) => {
                changes.push(ChangeRecord::modified(line_number, old_content, new_content))
            }
            None => changes.push(ChangeRecord::added(line_number, new_content)),
        }
    }

    let paired = changes
        .iter()
        .filter(|change| change.kind == ChangeKind::Modified)
        .map(|change| change.line_number)
        .collect::<HashSet<_>>();

    changes.extend(
        removed_lines
            .into_lines()
            .filter(|(line_number, _)| !paired.contains(line_number))
            .map(|(line_number, old_content)| ChangeRecord::removed(line_number, old_content)),
    );

    Ok(changes)
}
