//! Byte spans into the logical input stream.

/// Half-open byte range `[start, end)` into the logical stream.
///
/// Invariant: offsets are absolute (they count every byte written since the
/// last reset), so a span stays meaningful after the chunk that produced it
/// has been released.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start must be <= end");
        Self { start, end }
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    pub fn len(self) -> usize {
        self.end - self.start
    }

    /// Offset of the last byte covered by the span (inclusive).
    ///
    /// Empty spans report their start so `start <= last` always holds.
    pub fn last(self) -> usize {
        self.end.saturating_sub(1).max(self.start)
    }
}
