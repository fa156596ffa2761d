//! Retained-buffer helpers.
//!
//! All positions handed around the tokenizer are absolute byte offsets into
//! the logical stream. `offset` is the absolute position of `buffer[0]`; bytes
//! before it have been compacted away and must never be addressed again.

use memchr::{memchr, memchr2};

use super::Tokenizer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MatchResult {
    Matched,
    NeedMoreInput,
    NoMatch,
}

impl Tokenizer {
    pub(super) fn end_offset(&self) -> usize {
        self.offset + self.buffer.len()
    }

    pub(super) fn has_unconsumed_input(&self) -> bool {
        self.index < self.end_offset()
    }

    pub(super) fn byte_at(&self, at: usize) -> u8 {
        self.buffer.as_bytes()[at - self.offset]
    }

    pub(super) fn bytes_from(&self, at: usize) -> &[u8] {
        &self.buffer.as_bytes()[at - self.offset..]
    }

    pub(super) fn slice(&self, start: usize, end: usize) -> &str {
        debug_assert!(start >= self.offset, "slice start {start} was compacted away");
        debug_assert!(start <= end, "slice start {start} after end {end}");
        let (start, end) = (start - self.offset, end - self.offset);
        debug_assert!(
            self.buffer.is_char_boundary(start) && self.buffer.is_char_boundary(end),
            "slice bounds must sit on char boundaries"
        );
        &self.buffer[start..end]
    }

    /// First occurrence of `needle` at or after the cursor.
    pub(super) fn find_byte(&self, needle: u8) -> Option<usize> {
        memchr(needle, self.bytes_from(self.index)).map(|rel| self.index + rel)
    }

    pub(super) fn find_either(&self, a: u8, b: u8) -> Option<usize> {
        memchr2(a, b, self.bytes_from(self.index)).map(|rel| self.index + rel)
    }

    /// First byte at or after the cursor satisfying `pred`.
    pub(super) fn position_from(&self, pred: impl Fn(u8) -> bool) -> Option<usize> {
        self.bytes_from(self.index)
            .iter()
            .position(|&b| pred(b))
            .map(|rel| self.index + rel)
    }

    /// Compare the bytes at `at` against `expected`. A prefix that runs off the
    /// end of the buffer is undecided until the stream has ended.
    pub(super) fn match_ascii_prefix(
        &self,
        at: usize,
        expected: &[u8],
        ignore_case: bool,
    ) -> MatchResult {
        let available = self.bytes_from(at);
        for (i, &want) in expected.iter().enumerate() {
            let Some(&got) = available.get(i) else {
                return if self.ended {
                    MatchResult::NoMatch
                } else {
                    MatchResult::NeedMoreInput
                };
            };
            let same = if ignore_case {
                got.eq_ignore_ascii_case(&want)
            } else {
                got == want
            };
            if !same {
                return MatchResult::NoMatch;
            }
        }
        MatchResult::Matched
    }

    /// Drop bytes no pending section can refer to any more.
    pub(super) fn compact(&mut self) {
        let keep = self.retain_from().min(self.index);
        let drop = keep.saturating_sub(self.offset);
        if drop == 0 {
            return;
        }
        self.buffer.drain(..drop);
        self.offset += drop;
        self.stats.compactions = self.stats.compactions.saturating_add(1);
    }

    fn retain_from(&self) -> usize {
        if self.state.retains_from_section() {
            self.section_start
        } else {
            self.section_start.min(self.tag_start)
        }
    }
}

pub(super) fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0C')
}

pub(super) fn is_end_of_tag_section(b: u8) -> bool {
    b == b'/' || b == b'>' || is_whitespace(b)
}
