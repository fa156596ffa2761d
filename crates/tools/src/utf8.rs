//! Incremental UTF-8 decoding for byte streams delivered in arbitrary chunks.
//!
//! A multi-byte sequence split across chunks is held back until it completes.
//! Invalid sequences become U+FFFD and decoding keeps going.

/// Streaming UTF-8 decoder holding at most one incomplete sequence.
#[derive(Clone, Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes of an incomplete trailing sequence (never more than 3).
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Decode `bytes` into `out`, holding back an incomplete suffix.
    pub fn push(&mut self, bytes: &[u8], out: &mut String) {
        let mut rest = bytes;
        while !self.pending.is_empty() && !rest.is_empty() {
            let width = sequence_width(self.pending[0]);
            if width == 0 {
                out.push(char::REPLACEMENT_CHARACTER);
                self.pending.clear();
                break;
            }
            let missing = width.saturating_sub(self.pending.len());
            let take = missing.min(rest.len());
            self.pending.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            if self.pending.len() < width {
                // Still incomplete, unless a continuation byte was wrong.
                if self.pending[1..].iter().all(|b| is_continuation(*b)) {
                    return;
                }
            }
            let held = std::mem::take(&mut self.pending);
            self.decode(&held, out);
        }
        if !rest.is_empty() {
            self.decode(rest, out);
        }
    }

    /// Flush a dangling incomplete sequence as U+FFFD.
    pub fn finish(&mut self, out: &mut String) {
        if self.pending.is_empty() {
            return;
        }
        out.push_str(&String::from_utf8_lossy(&self.pending));
        self.pending.clear();
    }

    fn decode(&mut self, mut bytes: &[u8], out: &mut String) {
        loop {
            match std::str::from_utf8(bytes) {
                Ok(valid) => {
                    out.push_str(valid);
                    return;
                }
                Err(err) => {
                    let (valid, after) = bytes.split_at(err.valid_up_to());
                    // Already validated, so this borrows without replacing.
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            bytes = &after[len..];
                        }
                        None => {
                            self.pending.extend_from_slice(after);
                            return;
                        }
                    }
                }
            }
        }
    }
}

fn sequence_width(lead: u8) -> usize {
    match lead {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

fn is_continuation(b: u8) -> bool {
    b & 0xC0 == 0x80
}

#[cfg(test)]
mod tests {
    use super::Utf8Decoder;

    fn feed(chunks: &[&[u8]]) -> (String, Vec<u8>) {
        let mut decoder = Utf8Decoder::new();
        let mut out = String::new();
        for chunk in chunks {
            decoder.push(chunk, &mut out);
        }
        (out, decoder.pending().to_vec())
    }

    #[test]
    fn two_byte_char_split_in_half() {
        assert_eq!(feed(&[&[0xC3]]), (String::new(), vec![0xC3]));
        assert_eq!(feed(&[&[0xC3], &[0xA9]]).0, "é");
    }

    #[test]
    fn four_byte_char_then_ascii() {
        let (out, pending) = feed(&[&[0xF0, 0x9F], &[0x98, 0x80, b'!']]);
        assert_eq!(out, "\u{1F600}!");
        assert!(pending.is_empty());
    }

    #[test]
    fn one_byte_at_a_time() {
        let source = "a€b\u{1F600}c".as_bytes();
        let chunks: Vec<&[u8]> = source.chunks(1).collect();
        assert_eq!(feed(&chunks), ("a€b\u{1F600}c".to_string(), Vec::new()));
    }

    #[test]
    fn trailing_incomplete_sequence_is_held() {
        let (out, pending) = feed(&[&[0xE2], &[0x82, 0xAC, 0xE2]]);
        assert_eq!(out, "€");
        assert_eq!(pending, [0xE2]);
    }

    #[test]
    fn invalid_bytes_are_replaced() {
        assert_eq!(feed(&[&[0xFF, b'f']]).0, "\u{FFFD}f");
        // Lead byte followed by a non-continuation across a chunk boundary.
        assert_eq!(feed(&[&[0xE2], &[b'x', b'y']]).0, "\u{FFFD}xy");
    }

    #[test]
    fn finish_flushes_dangling_bytes() {
        let mut decoder = Utf8Decoder::new();
        let mut out = String::new();
        decoder.push(&[b'a', 0xE2, 0x82], &mut out);
        assert!(decoder.has_pending());
        decoder.finish(&mut out);
        assert_eq!(out, "a\u{FFFD}");
        assert!(!decoder.has_pending());
    }
}
