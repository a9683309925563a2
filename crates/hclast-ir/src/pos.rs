//! Source positions and ranges.

use serde::{Deserialize, Serialize};

/// A single position in source text.
///
/// `line` and `column` are 1-based for positions taken from real source,
/// `column` counting characters. `byte` is the 0-based offset into the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
    pub byte: usize,
}

impl Pos {
    /// The position given to nodes that have no source text, such as
    /// expressions lifted from an already-evaluated value.
    ///
    /// Real positions never have line 0.
    pub const SYNTHETIC: Pos = Pos {
        line: 0,
        column: 0,
        byte: 0,
    };

    /// The first position of a source file.
    pub const START: Pos = Pos {
        line: 1,
        column: 1,
        byte: 0,
    };

    pub fn new(line: usize, column: usize, byte: usize) -> Self {
        Self { line, column, byte }
    }

    pub fn is_synthetic(&self) -> bool {
        self.line == 0
    }
}

/// A half-open span between two positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Pos,
    pub end: Pos,
}

impl Range {
    /// Range carried by every node of a lifted expression tree.
    pub const SYNTHETIC: Range = Range {
        start: Pos::SYNTHETIC,
        end: Pos::SYNTHETIC,
    };

    pub fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    /// A zero-width range at `pos`.
    pub fn at(pos: Pos) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// The range covering everything from the start of `a` to the end of `b`.
    pub fn between(a: Range, b: Range) -> Self {
        Self {
            start: a.start,
            end: b.end,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.start.is_synthetic()
    }

    /// Length of the range in bytes.
    pub fn len(&self) -> usize {
        self.end.byte.saturating_sub(self.start.byte)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
