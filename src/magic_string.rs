//! Offset-addressed text editing.
//!
//! Edits are recorded against offsets in the original source and applied
//! only when the result is rendered, so visitors never have to track how
//! earlier edits shifted the text.
//!
//! Every offset carries two insertion queues. The left queue belongs to the
//! text that ends at the offset and the right queue to the text that starts
//! there; when rendered, left inserts come first, then right inserts, then the
//! original text or the overwrite that starts at the offset.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

lazy_static! {
    static ref LINE_TERMINATOR_RE: Regex = Regex::new("\r\n|[\n\r\u{2028}\u{2029}]").unwrap();
}

#[derive(Debug, Clone)]
struct Overwrite {
    end: u32,
    content: String,
}

#[derive(Debug, Clone)]
pub struct MagicString {
    original: String,
    overwrites: BTreeMap<u32, Overwrite>,
    left: BTreeMap<u32, Vec<String>>,
    right: BTreeMap<u32, Vec<String>>,
}

impl MagicString {
    pub fn new(original: &str) -> Self {
        MagicString {
            original: original.to_string(),
            overwrites: BTreeMap::new(),
            left: BTreeMap::new(),
            right: BTreeMap::new(),
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn has_changes(&self) -> bool {
        !(self.overwrites.is_empty() && self.left.is_empty() && self.right.is_empty())
    }

    pub fn prepend_left(&mut self, index: u32, content: &str) -> &mut Self {
        self.insert(index, content, Side::Left, true)
    }

    pub fn append_left(&mut self, index: u32, content: &str) -> &mut Self {
        self.insert(index, content, Side::Left, false)
    }

    pub fn prepend_right(&mut self, index: u32, content: &str) -> &mut Self {
        self.insert(index, content, Side::Right, true)
    }

    pub fn append_right(&mut self, index: u32, content: &str) -> &mut Self {
        self.insert(index, content, Side::Right, false)
    }

    /// Replace `[start, end)` with `content`. A range that overlaps an
    /// existing overwrite is rejected and logged.
    pub fn overwrite(&mut self, start: u32, end: u32, content: &str) -> &mut Self {
        let end = end.min(self.len());
        if start >= end {
            tracing::warn!(start, end, "ignoring empty overwrite range");
            return self;
        }

        let overlaps = self
            .overwrites
            .range(..end)
            .next_back()
            .is_some_and(|(&other_start, other)| other_start < end && other.end > start);
        if overlaps {
            tracing::warn!(start, end, "ignoring overwrite that overlaps an earlier edit");
            return self;
        }

        self.overwrites.insert(
            start,
            Overwrite {
                end,
                content: content.to_string(),
            },
        );
        self
    }

    /// Overwrite `[start, end)` but keep every line terminator of the
    /// replaced text, so the rendered output keeps its line numbering.
    pub fn overwrite_padded(&mut self, start: u32, end: u32, content: &str) -> &mut Self {
        let end = end.min(self.len());
        let start = start.min(end);
        let replaced = &self.original[start as usize..end as usize];
        let padded = pad(content, replaced);

        if padded == replaced {
            return self;
        }
        self.overwrite(start, end, &padded)
    }

    fn len(&self) -> u32 {
        self.original.len() as u32
    }

    fn insert(&mut self, index: u32, content: &str, side: Side, prepend: bool) -> &mut Self {
        if content.is_empty() {
            return self;
        }
        let index = index.min(self.len());
        let queue = match side {
            Side::Left => self.left.entry(index).or_default(),
            Side::Right => self.right.entry(index).or_default(),
        };
        if prepend {
            queue.insert(0, content.to_string());
        } else {
            queue.push(content.to_string());
        }
        self
    }
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

impl fmt::Display for MagicString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let points: BTreeSet<u32> = self
            .left
            .keys()
            .chain(self.right.keys())
            .chain(self.overwrites.keys())
            .copied()
            .collect();

        let mut cursor = 0u32;

        for point in points {
            if point < cursor {
                // Swallowed by an overwrite.
                if self.left.contains_key(&point) || self.right.contains_key(&point) {
                    tracing::warn!(index = point, "dropping insert inside an overwritten range");
                }
                continue;
            }

            f.write_str(&self.original[cursor as usize..point as usize])?;
            cursor = point;

            for chunk in self.left.get(&point).into_iter().flatten() {
                f.write_str(chunk)?;
            }
            for chunk in self.right.get(&point).into_iter().flatten() {
                f.write_str(chunk)?;
            }
            if let Some(overwrite) = self.overwrites.get(&point) {
                f.write_str(&overwrite.content)?;
                cursor = overwrite.end;
            }
        }

        f.write_str(&self.original[cursor as usize..])
    }
}

/// Append to `content` every line terminator found in `original`.
pub fn pad(content: &str, original: &str) -> String {
    let mut padded = content.to_string();
    for terminator in LINE_TERMINATOR_RE.find_iter(original) {
        padded.push_str(terminator.as_str());
    }
    padded
}
