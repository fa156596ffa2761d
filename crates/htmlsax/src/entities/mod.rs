//! Character reference decoding.
//!
//! The decoder is a pure function over the bytes starting at `&`. It never
//! consumes input on its own: the tokenizer keeps the reference's bytes in its
//! retained section and calls back in with the grown slice until the answer
//! stops depending on data that has not arrived yet.
//!
//! Contract:
//! - `NeedMoreInput` is only returned when `at_eof` is false and more bytes
//!   could change the outcome (a longer name, a `;`, more digits, or the byte
//!   that decides an attribute-context legacy match).
//! - `NotReference` means the `&` is literal text; the caller re-scans the
//!   following bytes as ordinary data.
//! - Named lookup is longest-prefix with backtracking: `&notit;` yields `¬`
//!   followed by literal `it;`, `&notin;` yields `∉`.

mod table;

use table::{C1_REPLACEMENTS, LEGACY, NAMED, XML};

/// Upper bound on a reference name; longer alphanumeric runs cannot match.
const MAX_NAME_LEN: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeMode {
    /// HTML character data: legacy names are accepted without `;`.
    Legacy,
    /// HTML attribute values: legacy names followed by `=` or an alphanumeric
    /// byte stay literal.
    Attribute,
    /// XML: the five predefined names and numeric references, `;` required.
    Strict,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Replacement {
    Char(char),
    Str(&'static str),
}

impl Replacement {
    pub fn push_to(self, out: &mut String) {
        match self {
            Replacement::Char(ch) => out.push(ch),
            Replacement::Str(s) => out.push_str(s),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// A reference was recognized; `consumed` counts bytes from the `&`.
    Matched {
        consumed: usize,
        value: Replacement,
    },
    NotReference,
    NeedMoreInput,
}

/// Decode the character reference at the start of `input` (which must begin
/// with `&`).
pub fn decode_reference(input: &str, mode: DecodeMode, at_eof: bool) -> DecodeOutcome {
    let bytes = input.as_bytes();
    debug_assert_eq!(bytes.first(), Some(&b'&'), "reference must start at '&'");
    match bytes.get(1) {
        None => pending(at_eof),
        Some(b'#') => decode_numeric(bytes, mode, at_eof),
        Some(b) if b.is_ascii_alphanumeric() => decode_named(input, mode, at_eof),
        Some(_) => DecodeOutcome::NotReference,
    }
}

fn pending(at_eof: bool) -> DecodeOutcome {
    if at_eof {
        DecodeOutcome::NotReference
    } else {
        DecodeOutcome::NeedMoreInput
    }
}

fn decode_numeric(bytes: &[u8], mode: DecodeMode, at_eof: bool) -> DecodeOutcome {
    let (digits_start, radix) = match bytes.get(2) {
        None => return pending(at_eof),
        Some(b'x' | b'X') => (3, 16),
        Some(_) => (2, 10),
    };

    let mut i = digits_start;
    let mut value: u32 = 0;
    while let Some(digit) = bytes.get(i).and_then(|&b| (b as char).to_digit(radix)) {
        // Saturation is enough: anything past U+10FFFF maps to U+FFFD anyway.
        value = value.saturating_mul(radix).saturating_add(digit);
        i += 1;
    }

    if i == bytes.len() && !at_eof {
        return DecodeOutcome::NeedMoreInput;
    }
    if i == digits_start {
        return DecodeOutcome::NotReference;
    }
    let consumed = match bytes.get(i) {
        Some(b';') => i + 1,
        _ if mode == DecodeMode::Strict => return DecodeOutcome::NotReference,
        _ => i,
    };
    DecodeOutcome::Matched {
        consumed,
        value: Replacement::Char(replace_code_point(value)),
    }
}

fn decode_named(input: &str, mode: DecodeMode, at_eof: bool) -> DecodeOutcome {
    let bytes = input.as_bytes();
    let table = if mode == DecodeMode::Strict { XML } else { NAMED };

    let start = 1;
    let mut end = start;
    while end < bytes.len() && end - start < MAX_NAME_LEN && bytes[end].is_ascii_alphanumeric() {
        end += 1;
    }
    let run = &input[start..end];
    let next = bytes.get(end).copied();

    if next.is_none() && !at_eof && end - start < MAX_NAME_LEN && has_prefix(table, run) {
        return DecodeOutcome::NeedMoreInput;
    }

    if next == Some(b';')
        && let Some(value) = lookup(table, run)
    {
        return DecodeOutcome::Matched {
            consumed: end + 1,
            value: Replacement::Str(value),
        };
    }

    if mode == DecodeMode::Strict {
        return DecodeOutcome::NotReference;
    }

    // Backtrack to the longest legacy name that prefixes the run.
    for len in (1..=run.len()).rev() {
        let candidate = &run[..len];
        if LEGACY.binary_search(&candidate).is_err() {
            continue;
        }
        let follow = if len < run.len() {
            Some(bytes[start + len])
        } else {
            next
        };
        if mode == DecodeMode::Attribute
            && follow.is_some_and(|b| b == b'=' || b.is_ascii_alphanumeric())
        {
            return DecodeOutcome::NotReference;
        }
        return match lookup(table, candidate) {
            Some(value) => DecodeOutcome::Matched {
                consumed: start + len,
                value: Replacement::Str(value),
            },
            None => DecodeOutcome::NotReference,
        };
    }

    DecodeOutcome::NotReference
}

fn lookup(table: &[(&str, &'static str)], name: &str) -> Option<&'static str> {
    table
        .binary_search_by(|(candidate, _)| (*candidate).cmp(name))
        .ok()
        .map(|idx| table[idx].1)
}

fn has_prefix(table: &[(&str, &'static str)], prefix: &str) -> bool {
    let idx = table.partition_point(|(name, _)| *name < prefix);
    table
        .get(idx)
        .is_some_and(|(name, _)| name.starts_with(prefix))
}

/// Map a numeric reference value to the character it stands for.
///
/// NUL, surrogates and values beyond U+10FFFF become U+FFFD; the C1 range is
/// remapped through windows-1252.
pub fn replace_code_point(cp: u32) -> char {
    if cp == 0 || cp > 0x10FFFF || (0xD800..=0xDFFF).contains(&cp) {
        return '\u{FFFD}';
    }
    if let Ok(idx) = C1_REPLACEMENTS.binary_search_by_key(&cp, |(code, _)| *code) {
        return C1_REPLACEMENTS[idx].1;
    }
    char::from_u32(cp).unwrap_or('\u{FFFD}')
}
