//! Source positions and ranges shared by statements and coverage blocks.
//!
//! Lines and columns follow the Go toolchain convention: both are 1-based
//! and columns count bytes, which is also what `go test -coverprofile`
//! writes. The byte offset is carried along for diagnostics but never takes
//! part in comparisons.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

/// A point in a source file.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl Position {
    pub fn new(line: u32, column: u32, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// A position with no known byte offset, as found in coverage profiles.
    pub fn at(line: u32, column: u32) -> Self {
        Self::new(line, column, 0)
    }

    /// Move `width` bytes back on the same line, stopping at column 1.
    #[must_use]
    pub fn back_up(self, width: u32) -> Self {
        let step = width.min(self.column.saturating_sub(1));
        Self {
            line: self.line,
            column: self.column - step,
            offset: self.offset.saturating_sub(step as usize),
        }
    }

    fn key(&self) -> (u32, u32) {
        (self.line, self.column)
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Position {}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.line, self.column)
    }
}

/// A half-open source range: `start` is inside, `end` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Build a range from `(line, column)` pairs.
    pub fn from_coords(start: (u32, u32), end: (u32, u32)) -> Self {
        Self::new(Position::at(start.0, start.1), Position::at(end.0, end.1))
    }

    /// True when the range covers no source at all (or is inverted).
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// True when `start` comes after `end`.
    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    /// Whether two ranges share any source. A range ending exactly where the
    /// other starts does not overlap it, and an empty range overlaps nothing.
    pub fn overlaps(&self, other: &Range) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        !(self.end <= other.start || self.start >= other.end)
    }

    /// Whether `other` lies entirely within this range.
    pub fn contains(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.start, self.end)
    }
}

/// Free-function form of [`Range::overlaps`].
pub fn overlaps(a: &Range, b: &Range) -> bool {
    a.overlaps(b)
}
