//! Line diff and hunk grouping
//!
//! The edit script follows git's xdiff: the Myers middle-snake search in linear space,
//! preceded by discarding lines that cannot match and followed by sliding changes to the
//! positions git would print them at.

use derive_new::new;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::ops::{Index, IndexMut, Range};

/// Lines of unchanged context kept around each change when grouping hunks.
pub const HUNK_CONTEXT: usize = 3;

/// One step of an edit script. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit<T> {
    Delete { value: T, a_line: usize },
    Insert { value: T, b_line: usize },
    Equal { value: T, a_line: usize, b_line: usize },
}

impl<T> Edit<T> {
    pub fn is_equal(&self) -> bool {
        matches!(self, Edit::Equal { .. })
    }

    pub fn a_line(&self) -> Option<usize> {
        match self {
            Edit::Delete { a_line, .. } | Edit::Equal { a_line, .. } => Some(*a_line),
            Edit::Insert { .. } => None,
        }
    }

    pub fn b_line(&self) -> Option<usize> {
        match self {
            Edit::Insert { b_line, .. } | Edit::Equal { b_line, .. } => Some(*b_line),
            Edit::Delete { .. } => None,
        }
    }
}

impl<T: Display> Display for Edit<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Edit::Delete { value, .. } => write!(f, "-{value}"),
            Edit::Insert { value, .. } => write!(f, "+{value}"),
            Edit::Equal { value, .. } => write!(f, " {value}"),
        }
    }
}

/// Lines with at least this many matches on the other side may be discarded before the
/// Myers pass (capped square root of the line count).
const MAX_EQUAL_LIMIT: usize = 1024;
/// How far around a many-match line to look when deciding whether to discard it.
const SIMILAR_SCAN_WINDOW: usize = 100;
const KEEP_DISCARD_RUN: usize = 4;

const MAX_COST_MIN: isize = 256;
const HEURISTIC_MIN_COST: isize = 256;
const SNAKE_COUNT: isize = 20;
const HEURISTIC_FACTOR: isize = 4;

const MAX_INDENT: usize = 200;
const MAX_BLANKS: usize = 20;
const INDENT_HEURISTIC_MAX_SLIDING: usize = 100;
const INDENT_WEIGHT: isize = 60;

const START_OF_FILE_PENALTY: isize = 1;
const END_OF_FILE_PENALTY: isize = 21;
const TOTAL_BLANK_WEIGHT: isize = -30;
const POST_BLANK_WEIGHT: isize = 6;
const RELATIVE_INDENT_PENALTY: isize = -4;
const RELATIVE_INDENT_WITH_BLANK_PENALTY: isize = 10;
const RELATIVE_OUTDENT_PENALTY: isize = 24;
const RELATIVE_OUTDENT_WITH_BLANK_PENALTY: isize = 17;
const RELATIVE_DEDENT_PENALTY: isize = 23;
const RELATIVE_DEDENT_WITH_BLANK_PENALTY: isize = 17;

/// Line diff producing the same edit script as `git diff` with its default settings.
///
/// - lines are mapped to equivalence classes, and the common head and tail are trimmed
/// - lines without a counterpart (and runs of very common lines among them) are marked
///   changed up front
/// - the rest goes through Myers' divide-and-conquer search for the middle snake, which
///   needs space linear in the input, with git's cost cutoffs for large inputs
/// - groups of changes are slid to line up with the other side or, failing that, to the
///   position the indent heuristic scores best
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct MyersDiff<'d, T> {
    a: &'d [T],
    b: &'d [T],
}

impl<'d, T: AsRef<str> + Eq + Hash + Clone> MyersDiff<'d, T> {
    /// The edit script grouped into hunks with `HUNK_CONTEXT` lines of context.
    pub fn flatten_diff(&self) -> Vec<Hunk<T>> {
        Hunk::filter(&self.diff())
    }

    pub fn diff(&self) -> Vec<Edit<T>> {
        let mut classifier = LineClassifier::default();
        let old_classes = self.a.iter().map(|line| classifier.classify(line, 0)).collect();
        let new_classes = self.b.iter().map(|line| classifier.classify(line, 1)).collect();

        let mut old = Side::new(self.a, old_classes);
        let mut new = Side::new(self.b, new_classes);

        let (start, old_end, new_end) = trim_ends(&old.classes, &new.classes);
        old.discard(start..old_end, &classifier.counts, 1);
        new.discard(start..new_end, &classifier.counts, 0);

        let (old_changes, new_changes) = compare_kept(&old.kept_classes, &new.kept_classes);
        old.mark_changed(&old_changes);
        new.mark_changed(&new_changes);

        compact(&mut old, &new);
        compact(&mut new, &old);

        self.edit_script(&old.changed, &new.changed)
    }

    /// Pair up unchanged lines; within each change, deletions come before insertions.
    fn edit_script(&self, old_changed: &[bool], new_changed: &[bool]) -> Vec<Edit<T>> {
        let (mut i, mut j) = (0, 0);
        let mut edits = Vec::with_capacity(self.a.len().max(self.b.len()));

        while i < self.a.len() || j < self.b.len() {
            let deleting = old_changed.get(i).copied().unwrap_or(false);
            let inserting = new_changed.get(j).copied().unwrap_or(false);

            if !deleting && !inserting {
                let (Some(value), true) = (self.a.get(i), j < self.b.len()) else {
                    break;
                };
                edits.push(Edit::Equal {
                    value: value.clone(),
                    a_line: i + 1,
                    b_line: j + 1,
                });
                i += 1;
                j += 1;
                continue;
            }

            while old_changed.get(i).copied().unwrap_or(false) {
                edits.push(Edit::Delete {
                    value: self.a[i].clone(),
                    a_line: i + 1,
                });
                i += 1;
            }
            while new_changed.get(j).copied().unwrap_or(false) {
                edits.push(Edit::Insert {
                    value: self.b[j].clone(),
                    b_line: j + 1,
                });
                j += 1;
            }
        }

        edits
    }
}

/// Maps equal lines of both inputs to the same class id and counts them per side.
#[derive(Debug)]
struct LineClassifier<'d, T> {
    ids: HashMap<&'d T, usize>,
    counts: Vec<[usize; 2]>,
}

impl<T> Default for LineClassifier<'_, T> {
    fn default() -> Self {
        LineClassifier {
            ids: HashMap::new(),
            counts: Vec::new(),
        }
    }
}

impl<'d, T: Eq + Hash> LineClassifier<'d, T> {
    fn classify(&mut self, line: &'d T, side: usize) -> usize {
        let next_id = self.ids.len();
        let id = *self.ids.entry(line).or_insert(next_id);
        if id == self.counts.len() {
            self.counts.push([0, 0]);
        }
        self.counts[id][side] += 1;

        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Discard {
    NoMatch,
    Keep,
    ManyMatches,
}

/// One input with its per-line change flags.
#[derive(Debug)]
struct Side<'d, T> {
    lines: &'d [T],
    classes: Vec<usize>,
    changed: Vec<bool>,
    /// Lines handed to the Myers pass, and their classes.
    kept: Vec<usize>,
    kept_classes: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
struct Group {
    start: usize,
    end: usize,
}

impl Group {
    fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl<'d, T: AsRef<str>> Side<'d, T> {
    fn new(lines: &'d [T], classes: Vec<usize>) -> Self {
        Side {
            lines,
            classes,
            changed: vec![false; lines.len()],
            kept: Vec::new(),
            kept_classes: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.lines.len()
    }

    /// Mark lines in `range` that cannot or should not be matched; keep the rest.
    ///
    /// `other` selects the per-class count of the opposite input.
    fn discard(&mut self, range: Range<usize>, counts: &[[usize; 2]], other: usize) {
        let limit = bogosqrt(self.len()).min(MAX_EQUAL_LIMIT);
        let kinds = self.classes[range.clone()]
            .iter()
            .map(|&class| match counts[class][other] {
                0 => Discard::NoMatch,
                matches if matches >= limit => Discard::ManyMatches,
                _ => Discard::Keep,
            })
            .collect::<Vec<_>>();

        for (offset, kind) in kinds.iter().enumerate() {
            let index = range.start + offset;
            let keep = match kind {
                Discard::Keep => true,
                Discard::ManyMatches => !is_discardable_many_match(&kinds, offset),
                Discard::NoMatch => false,
            };

            if keep {
                self.kept.push(index);
                self.kept_classes.push(self.classes[index]);
            } else {
                self.changed[index] = true;
            }
        }
    }

    fn mark_changed(&mut self, kept_changes: &[bool]) {
        for (&index, _) in self
            .kept
            .iter()
            .zip(kept_changes)
            .filter(|(_, changed)| **changed)
        {
            self.changed[index] = true;
        }
    }

    fn is_changed(&self, index: usize) -> bool {
        self.changed.get(index).copied().unwrap_or(false)
    }

    fn first_group(&self) -> Group {
        let mut end = 0;
        while self.is_changed(end) {
            end += 1;
        }

        Group { start: 0, end }
    }

    fn next_group(&self, group: &mut Group) -> bool {
        if group.end == self.len() {
            return false;
        }

        group.start = group.end + 1;
        group.end = group.start;
        while self.is_changed(group.end) {
            group.end += 1;
        }

        true
    }

    fn previous_group(&self, group: &mut Group) -> bool {
        if group.start == 0 {
            return false;
        }

        group.end = group.start - 1;
        group.start = group.end;
        while group.start > 0 && self.is_changed(group.start - 1) {
            group.start -= 1;
        }

        true
    }

    /// Move a group one line down if its first line equals the line after it.
    fn slide_down(&mut self, group: &mut Group) -> bool {
        if group.end >= self.len() || self.classes[group.start] != self.classes[group.end] {
            return false;
        }

        self.changed[group.start] = false;
        self.changed[group.end] = true;
        group.start += 1;
        group.end += 1;
        while self.is_changed(group.end) {
            group.end += 1;
        }

        true
    }

    /// Move a group one line up if its last line equals the line before it.
    fn slide_up(&mut self, group: &mut Group) -> bool {
        if group.start == 0 || self.classes[group.start - 1] != self.classes[group.end - 1] {
            return false;
        }

        group.start -= 1;
        group.end -= 1;
        self.changed[group.start] = true;
        self.changed[group.end] = false;
        while group.start > 0 && self.is_changed(group.start - 1) {
            group.start -= 1;
        }

        true
    }

    fn measure_split(&self, split: usize) -> SplitMeasurement {
        let (end_of_file, indent) = match self.lines.get(split) {
            Some(line) => (false, indent_of(line.as_ref())),
            None => (true, None),
        };

        let (pre_blank, pre_indent) = blank_run(self.lines[..split.min(self.len())].iter().rev());
        let (post_blank, post_indent) = blank_run(self.lines.iter().skip(split + 1));

        SplitMeasurement {
            end_of_file,
            indent,
            pre_blank,
            pre_indent,
            post_blank,
            post_indent,
        }
    }
}

/// Length of the run of blank lines, and the indent of the first non-blank line after it.
fn blank_run<'l, T: AsRef<str> + 'l>(
    lines: impl Iterator<Item = &'l T>,
) -> (usize, Option<usize>) {
    let mut blanks = 0;

    for line in lines {
        if let Some(indent) = indent_of(line.as_ref()) {
            return (blanks, Some(indent));
        }
        blanks += 1;
        if blanks == MAX_BLANKS {
            return (blanks, Some(0));
        }
    }

    (blanks, None)
}

/// Leading whitespace width with tabs to multiples of 8; `None` for a blank line.
fn indent_of(line: &str) -> Option<usize> {
    let mut indent = 0;

    for byte in line.bytes() {
        match byte {
            b' ' => indent += 1,
            b'\t' => indent += 8 - indent % 8,
            b'\n' | b'\r' => {}
            _ => return Some(indent),
        }
        if indent >= MAX_INDENT {
            return Some(MAX_INDENT);
        }
    }

    None
}

fn bogosqrt(mut n: usize) -> usize {
    let mut root = 1;
    while n > 0 {
        root <<= 1;
        n >>= 2;
    }

    root
}

/// Lengths of the common head, and the ends of both inputs once the common tail is cut.
fn trim_ends(a: &[usize], b: &[usize]) -> (usize, usize, usize) {
    let head = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let limit = a.len().min(b.len()) - head;
    let tail = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take(limit)
        .take_while(|(x, y)| x == y)
        .count();

    (head, a.len() - tail, b.len() - tail)
}

/// A very common line is dropped when it sits in a run dominated by unmatched lines.
fn is_discardable_many_match(kinds: &[Discard], index: usize) -> bool {
    let start = index.saturating_sub(SIMILAR_SCAN_WINDOW);
    let end = (index + SIMILAR_SCAN_WINDOW).min(kinds.len() - 1);

    fn count_run<'k>(run: impl Iterator<Item = &'k Discard>) -> (usize, usize) {
        let (mut no_match, mut many) = (0, 1);
        for kind in run {
            match kind {
                Discard::NoMatch => no_match += 1,
                Discard::ManyMatches => many += 1,
                Discard::Keep => break,
            }
        }
        (no_match, many)
    }

    let (no_match_before, many_before) = count_run(kinds[start..index].iter().rev());
    if no_match_before == 0 {
        return false;
    }
    let (no_match_after, many_after) = count_run(kinds[index + 1..=end].iter());
    if no_match_after == 0 {
        return false;
    }

    let no_match = no_match_before + no_match_after;
    let many = many_before + many_after;
    many * KEEP_DISCARD_RUN < many + no_match
}

/// Furthest-reaching position per diagonal `k = i1 - i2`, for negative `k` too.
#[derive(Debug)]
struct Diagonals {
    values: Vec<isize>,
    offset: isize,
}

impl Diagonals {
    fn new(size: usize, offset: isize) -> Self {
        Diagonals {
            values: vec![0; size],
            offset,
        }
    }
}

impl Index<isize> for Diagonals {
    type Output = isize;

    fn index(&self, diagonal: isize) -> &isize {
        &self.values[(diagonal + self.offset) as usize]
    }
}

impl IndexMut<isize> for Diagonals {
    fn index_mut(&mut self, diagonal: isize) -> &mut isize {
        &mut self.values[(diagonal + self.offset) as usize]
    }
}

#[derive(Debug, Clone, Copy)]
struct Bounds {
    off1: isize,
    lim1: isize,
    off2: isize,
    lim2: isize,
}

#[derive(Debug, Clone, Copy)]
struct Split {
    i1: isize,
    i2: isize,
    min_lo: bool,
    min_hi: bool,
}

/// Myers over the kept lines; returns the change flags of both sides.
fn compare_kept(ha1: &[usize], ha2: &[usize]) -> (Vec<bool>, Vec<bool>) {
    let mut changed1 = vec![false; ha1.len()];
    let mut changed2 = vec![false; ha2.len()];

    let size = ha1.len() + ha2.len() + 3;
    let mut forward = Diagonals::new(size, ha2.len() as isize + 1);
    let mut backward = Diagonals::new(size, ha2.len() as isize + 1);
    let max_cost = (bogosqrt(size) as isize).max(MAX_COST_MIN);

    let whole = Bounds {
        off1: 0,
        lim1: ha1.len() as isize,
        off2: 0,
        lim2: ha2.len() as isize,
    };
    let mut pending = vec![(whole, false)];

    while let Some((mut bounds, need_min)) = pending.pop() {
        let same = |i1: isize, i2: isize| ha1[i1 as usize] == ha2[i2 as usize];

        while bounds.off1 < bounds.lim1
            && bounds.off2 < bounds.lim2
            && same(bounds.off1, bounds.off2)
        {
            bounds.off1 += 1;
            bounds.off2 += 1;
        }
        while bounds.off1 < bounds.lim1
            && bounds.off2 < bounds.lim2
            && same(bounds.lim1 - 1, bounds.lim2 - 1)
        {
            bounds.lim1 -= 1;
            bounds.lim2 -= 1;
        }

        if bounds.off1 == bounds.lim1 {
            changed2[bounds.off2 as usize..bounds.lim2 as usize].fill(true);
        } else if bounds.off2 == bounds.lim2 {
            changed1[bounds.off1 as usize..bounds.lim1 as usize].fill(true);
        } else {
            let split = find_split(
                ha1,
                ha2,
                bounds,
                (&mut forward, &mut backward),
                need_min,
                max_cost,
            );

            pending.push((
                Bounds {
                    off1: split.i1,
                    off2: split.i2,
                    ..bounds
                },
                split.min_hi,
            ));
            pending.push((
                Bounds {
                    lim1: split.i1,
                    lim2: split.i2,
                    ..bounds
                },
                split.min_lo,
            ));
        }
    }

    (changed1, changed2)
}

/// Find the middle snake of the box, searching from both corners at once.
///
/// Past `HEURISTIC_MIN_COST` a long enough snake is taken as the split point, and past
/// `max_cost` the furthest-reaching diagonal is, trading minimality for time.
fn find_split(
    ha1: &[usize],
    ha2: &[usize],
    bounds: Bounds,
    (forward, backward): (&mut Diagonals, &mut Diagonals),
    need_min: bool,
    max_cost: isize,
) -> Split {
    let Bounds {
        off1,
        lim1,
        off2,
        lim2,
    } = bounds;
    let same = |i1: isize, i2: isize| ha1[i1 as usize] == ha2[i2 as usize];

    let (dmin, dmax) = (off1 - lim2, lim1 - off2);
    let (fmid, bmid) = (off1 - off2, lim1 - lim2);
    let odd = (fmid - bmid) & 1 != 0;
    let (mut fmin, mut fmax) = (fmid, fmid);
    let (mut bmin, mut bmax) = (bmid, bmid);

    forward[fmid] = off1;
    backward[bmid] = lim1;

    let mut cost = 0;
    loop {
        cost += 1;
        let mut got_snake = false;

        if fmin > dmin {
            fmin -= 1;
            forward[fmin - 1] = -1;
        } else {
            fmin += 1;
        }
        if fmax < dmax {
            fmax += 1;
            forward[fmax + 1] = -1;
        } else {
            fmax -= 1;
        }

        for d in (fmin..=fmax).rev().step_by(2) {
            let mut i1 = if forward[d - 1] >= forward[d + 1] {
                forward[d - 1] + 1
            } else {
                forward[d + 1]
            };
            let prev1 = i1;
            let mut i2 = i1 - d;
            while i1 < lim1 && i2 < lim2 && same(i1, i2) {
                i1 += 1;
                i2 += 1;
            }
            if i1 - prev1 > SNAKE_COUNT {
                got_snake = true;
            }
            forward[d] = i1;

            if odd && bmin <= d && d <= bmax && backward[d] <= i1 {
                return Split {
                    i1,
                    i2,
                    min_lo: true,
                    min_hi: true,
                };
            }
        }

        if bmin > dmin {
            bmin -= 1;
            backward[bmin - 1] = isize::MAX;
        } else {
            bmin += 1;
        }
        if bmax < dmax {
            bmax += 1;
            backward[bmax + 1] = isize::MAX;
        } else {
            bmax -= 1;
        }

        for d in (bmin..=bmax).rev().step_by(2) {
            let mut i1 = if backward[d - 1] < backward[d + 1] {
                backward[d - 1]
            } else {
                backward[d + 1] - 1
            };
            let prev1 = i1;
            let mut i2 = i1 - d;
            while i1 > off1 && i2 > off2 && same(i1 - 1, i2 - 1) {
                i1 -= 1;
                i2 -= 1;
            }
            if prev1 - i1 > SNAKE_COUNT {
                got_snake = true;
            }
            backward[d] = i1;

            if !odd && fmin <= d && d <= fmax && i1 <= forward[d] {
                return Split {
                    i1,
                    i2,
                    min_lo: true,
                    min_hi: true,
                };
            }
        }

        if need_min {
            continue;
        }

        if got_snake && cost > HEURISTIC_MIN_COST {
            let mut best = 0;
            let mut best_split = None;
            for d in (fmin..=fmax).rev().step_by(2) {
                let i1 = forward[d];
                let i2 = i1 - d;
                let v = (i1 - off1) + (i2 - off2) - (d - fmid).abs();

                if v > HEURISTIC_FACTOR * cost
                    && v > best
                    && off1 + SNAKE_COUNT <= i1
                    && i1 < lim1
                    && off2 + SNAKE_COUNT <= i2
                    && i2 < lim2
                    && (1..=SNAKE_COUNT).all(|k| same(i1 - k, i2 - k))
                {
                    best = v;
                    best_split = Some((i1, i2));
                }
            }
            if let Some((i1, i2)) = best_split {
                return Split {
                    i1,
                    i2,
                    min_lo: true,
                    min_hi: false,
                };
            }

            let mut best = 0;
            let mut best_split = None;
            for d in (bmin..=bmax).rev().step_by(2) {
                let i1 = backward[d];
                let i2 = i1 - d;
                let v = (lim1 - i1) + (lim2 - i2) - (d - bmid).abs();

                if v > HEURISTIC_FACTOR * cost
                    && v > best
                    && off1 < i1
                    && i1 <= lim1 - SNAKE_COUNT
                    && off2 < i2
                    && i2 <= lim2 - SNAKE_COUNT
                    && (0..SNAKE_COUNT).all(|k| same(i1 + k, i2 + k))
                {
                    best = v;
                    best_split = Some((i1, i2));
                }
            }
            if let Some((i1, i2)) = best_split {
                return Split {
                    i1,
                    i2,
                    min_lo: false,
                    min_hi: true,
                };
            }
        }

        if cost >= max_cost {
            let (mut fbest, mut fbest1) = (-1, -1);
            for d in (fmin..=fmax).rev().step_by(2) {
                let mut i1 = forward[d].min(lim1);
                let mut i2 = i1 - d;
                if lim2 < i2 {
                    i1 = lim2 + d;
                    i2 = lim2;
                }
                if fbest < i1 + i2 {
                    fbest = i1 + i2;
                    fbest1 = i1;
                }
            }

            let (mut bbest, mut bbest1) = (isize::MAX, isize::MAX);
            for d in (bmin..=bmax).rev().step_by(2) {
                let mut i1 = off1.max(backward[d]);
                let mut i2 = i1 - d;
                if i2 < off2 {
                    i1 = off2 + d;
                    i2 = off2;
                }
                if i1 + i2 < bbest {
                    bbest = i1 + i2;
                    bbest1 = i1;
                }
            }

            return if (lim1 + lim2) - bbest < fbest - (off1 + off2) {
                Split {
                    i1: fbest1,
                    i2: fbest - fbest1,
                    min_lo: true,
                    min_hi: false,
                }
            } else {
                Split {
                    i1: bbest1,
                    i2: bbest - bbest1,
                    min_lo: false,
                    min_hi: true,
                }
            };
        }
    }
}

/// Slide every group of changes in `side` as far as it can go, merging groups that touch,
/// then settle it against a change in `other` or at the best-scoring position.
fn compact<T: AsRef<str>>(side: &mut Side<'_, T>, other: &Side<'_, T>) {
    let mut group = side.first_group();
    let mut other_group = other.first_group();

    loop {
        if !group.is_empty() {
            let mut group_size;
            let mut earliest_end;
            let mut matches_other;

            loop {
                group_size = group.end - group.start;
                matches_other = false;

                while side.slide_up(&mut group) {
                    other.previous_group(&mut other_group);
                }
                earliest_end = group.end;
                if !other_group.is_empty() {
                    matches_other = true;
                }

                while side.slide_down(&mut group) {
                    other.next_group(&mut other_group);
                    if !other_group.is_empty() {
                        matches_other = true;
                    }
                }

                if group_size == group.end - group.start {
                    break;
                }
            }

            if group.end == earliest_end {
                // cannot move
            } else if matches_other {
                while other_group.is_empty()
                    && side.slide_up(&mut group)
                    && other.previous_group(&mut other_group)
                {}
            } else {
                let best_shift = best_indent_shift(side, group, group_size, earliest_end);
                while group.end > best_shift
                    && side.slide_up(&mut group)
                    && other.previous_group(&mut other_group)
                {}
            }
        }

        if !side.next_group(&mut group) {
            break;
        }
        other.next_group(&mut other_group);
    }
}

/// End position, between `earliest_end` and the current one, with the lowest split score.
fn best_indent_shift<T: AsRef<str>>(
    side: &Side<'_, T>,
    group: Group,
    group_size: usize,
    earliest_end: usize,
) -> usize {
    let first_shift = earliest_end
        .max(group.end.saturating_sub(group_size + 1))
        .max(group.end.saturating_sub(INDENT_HEURISTIC_MAX_SLIDING));
    let mut best: Option<(usize, SplitScore)> = None;

    for shift in first_shift..=group.end {
        let mut score = SplitScore::default();
        score.add(&side.measure_split(shift));
        score.add(&side.measure_split(shift - group_size));

        if best.is_none_or(|(_, best_score)| score.compare(&best_score) <= 0) {
            best = Some((shift, score));
        }
    }

    best.map_or(group.end, |(shift, _)| shift)
}

/// Surroundings of the boundary before line `split`.
#[derive(Debug)]
struct SplitMeasurement {
    end_of_file: bool,
    indent: Option<usize>,
    pre_blank: usize,
    pre_indent: Option<usize>,
    post_blank: usize,
    post_indent: Option<usize>,
}

#[derive(Debug, Default, Clone, Copy)]
struct SplitScore {
    effective_indent: isize,
    penalty: isize,
}

impl SplitScore {
    fn add(&mut self, split: &SplitMeasurement) {
        if split.pre_indent.is_none() && split.pre_blank == 0 {
            self.penalty += START_OF_FILE_PENALTY;
        }
        if split.end_of_file {
            self.penalty += END_OF_FILE_PENALTY;
        }

        // blank lines after the split, counting the line right after it
        let post_blank = match split.indent {
            None => 1 + split.post_blank as isize,
            Some(_) => 0,
        };
        let total_blank = split.pre_blank as isize + post_blank;
        self.penalty += TOTAL_BLANK_WEIGHT * total_blank + POST_BLANK_WEIGHT * post_blank;

        let indent = split.indent.or(split.post_indent);
        let any_blanks = total_blank != 0;
        self.effective_indent += indent.map_or(-1, |indent| indent as isize);

        let (Some(indent), Some(pre_indent)) = (indent, split.pre_indent) else {
            return;
        };

        if indent > pre_indent {
            self.penalty += if any_blanks {
                RELATIVE_INDENT_WITH_BLANK_PENALTY
            } else {
                RELATIVE_INDENT_PENALTY
            };
        } else if indent < pre_indent {
            let starts_block = split.post_indent.is_some_and(|post| post > indent);
            self.penalty += match (starts_block, any_blanks) {
                (true, true) => RELATIVE_OUTDENT_WITH_BLANK_PENALTY,
                (true, false) => RELATIVE_OUTDENT_PENALTY,
                (false, true) => RELATIVE_DEDENT_WITH_BLANK_PENALTY,
                (false, false) => RELATIVE_DEDENT_PENALTY,
            };
        }
    }

    fn compare(&self, other: &SplitScore) -> isize {
        let indents = self.effective_indent.cmp(&other.effective_indent) as isize;
        INDENT_WEIGHT * indents + (self.penalty - other.penalty)
    }
}

/// A run of edits with surrounding context, printed as one `@@` block.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Hunk<T> {
    a_start: usize,
    b_start: usize,
    edits: Vec<Edit<T>>,
}

impl<T: Clone> Hunk<T> {
    /// Group an edit script into hunks; changes closer than `2 * HUNK_CONTEXT` equal
    /// lines apart share a hunk.
    pub fn filter(edits: &[Edit<T>]) -> Vec<Hunk<T>> {
        let mut hunks = Vec::new();
        let len = edits.len() as isize;
        let mut offset: isize = 0;

        loop {
            while offset < len && edits[offset as usize].is_equal() {
                offset += 1;
            }
            if offset >= len {
                return hunks;
            }

            offset -= HUNK_CONTEXT as isize + 1;

            let (a_start, b_start) = if offset < 0 {
                (0, 0)
            } else {
                let edit = &edits[offset as usize];
                (edit.a_line().unwrap_or(0), edit.b_line().unwrap_or(0))
            };

            let mut hunk = Hunk::new(a_start, b_start, Vec::new());
            offset = hunk.build(edits, offset);
            hunks.push(hunk);
        }
    }

    fn build(&mut self, edits: &[Edit<T>], mut offset: isize) -> isize {
        let len = edits.len() as isize;
        let mut counter: isize = -1;

        while counter != 0 {
            if offset >= 0 && counter > 0 {
                self.edits.push(edits[offset as usize].clone());
            }

            offset += 1;
            if offset >= len {
                break;
            }

            match edits.get((offset + HUNK_CONTEXT as isize) as usize) {
                Some(edit) if !edit.is_equal() => counter = 2 * HUNK_CONTEXT as isize + 1,
                _ => counter -= 1,
            }
        }

        offset
    }
}

impl<T> Hunk<T> {
    pub fn a_start(&self) -> usize {
        self.edits
            .iter()
            .find_map(Edit::a_line)
            .unwrap_or(self.a_start)
    }

    pub fn a_size(&self) -> usize {
        self.edits.iter().filter(|e| e.a_line().is_some()).count()
    }

    pub fn b_start(&self) -> usize {
        self.edits
            .iter()
            .find_map(Edit::b_line)
            .unwrap_or(self.b_start)
    }

    pub fn b_size(&self) -> usize {
        self.edits.iter().filter(|e| e.b_line().is_some()).count()
    }

    pub fn edits(&self) -> &[Edit<T>] {
        &self.edits
    }

    /// `@@ -a,b +c,d @@`, with a count of 1 left out as git does.
    pub fn header(&self) -> String {
        let range = |start: usize, size: usize| match size {
            1 => start.to_string(),
            _ => format!("{start},{size}"),
        };

        format!(
            "@@ -{} +{} @@",
            range(self.a_start(), self.a_size()),
            range(self.b_start(), self.b_size())
        )
    }
}
