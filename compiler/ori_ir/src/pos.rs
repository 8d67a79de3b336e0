//! Source positions.
//!
//! Diagnostics in the layout pass are anchored to declaration sites and are
//! ordered by position so output is reproducible, so a position only needs a
//! line and a column.

use std::cmp::Ordering;
use std::fmt;

/// A line/column source position (both 1-based).
///
/// `Pos::NONE` (line 0) marks a synthesized node with no source location.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
}

impl Pos {
    /// Unknown position.
    pub const NONE: Pos = Pos { line: 0, col: 0 };

    /// Create a new position.
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Pos { line, col }
    }

    /// Check whether this position refers to real source.
    #[inline]
    pub const fn is_known(self) -> bool {
        self.line != 0
    }

    /// Report whether `self` comes strictly before `other` in the source.
    ///
    /// Unknown positions sort after every known one.
    #[inline]
    pub fn is_before(self, other: Pos) -> bool {
        self.cmp(&other) == Ordering::Less
    }

    /// Return `self` if known, otherwise `fallback`.
    #[inline]
    #[must_use]
    pub const fn or(self, fallback: Pos) -> Pos {
        if self.is_known() {
            self
        } else {
            fallback
        }
    }
}

impl Ord for Pos {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_known(), other.is_known()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => (self.line, self.col).cmp(&(other.line, other.col)),
        }
    }
}

impl PartialOrd for Pos {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            write!(f, "{}:{}", self.line, self.col)
        } else {
            write!(f, "<unknown line number>")
        }
    }
}

crate::static_assert_size!(Pos, 8);

#[cfg(test)]
mod tests;
