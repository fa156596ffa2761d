//! Streaming parity: byte chunks through `write_bytes` against one `end_with`.
//!
//! Fast CI mode: default seeds when `CI` is set.
//! Extended local mode: set `HTMLSAX_STREAMING_PARITY_SEEDS` to increase
//! coverage.

use crate::{EventCollector, Parser, ParserOptions};
use tools::Utf8Decoder;

const DEFAULT_SEEDS_CI: usize = 50;
const DEFAULT_SEEDS_LOCAL: usize = 200;
const SEED_MIX: u64 = 0x9e3779b97f4a7c15;

const CASES: &[&str] = &[
    "plain ascii",
    "café <b>crème</b>",
    "e\u{0301}<i title='ü'>x</i>",
    "👨\u{200D}👩\u{200D}👧\u{200D}👦",
    "é<script>😀</script>ö",
    "&amp; café 😀 &notin; &copy2",
    "<!-- ö --><![CDATA[ß]]><?ü?>",
];

#[test]
fn byte_chunks_match_whole_input() {
    let seeds = seed_count();
    for (case_idx, input) in CASES.iter().enumerate() {
        let bytes = input.as_bytes();
        let expected = whole(input);

        assert_parity(case_idx, None, bytes, &[], &expected);
        for size in [1usize, 2, 3, 5] {
            let boundaries: Vec<usize> = (size..bytes.len()).step_by(size).collect();
            assert_parity(case_idx, None, bytes, &boundaries, &expected);
        }
        let base_seed = 0x6874_6d6c_7361_7800 ^ case_idx as u64;
        for iter in 0..seeds {
            let seed = base_seed ^ (iter as u64).wrapping_mul(SEED_MIX);
            let mut rng = LcgRng::new(seed);
            let boundaries = random_boundaries(&mut rng, bytes.len());
            assert_parity(case_idx, Some(seed), bytes, &boundaries, &expected);
        }
    }
}

#[test]
fn invalid_utf8_is_replaced_consistently() {
    let bytes = [0xFFu8, b'<', b'b', b'>', 0xC3, b'x'];
    let mut decoder = Utf8Decoder::new();
    let mut assembled = String::new();
    decoder.push(&bytes, &mut assembled);
    decoder.finish(&mut assembled);
    assert_eq!(assembled, "\u{FFFD}<b>\u{FFFD}x");

    let expected = whole(&assembled);
    for split in 1..bytes.len() {
        assert_parity(0, None, &bytes, &[split], &expected);
    }
}

fn whole(input: &str) -> Vec<String> {
    let mut parser = Parser::new(EventCollector::new(), ParserOptions::default());
    parser.end_with(input);
    parser.into_handler().lines()
}

fn assert_parity(
    case_idx: usize,
    seed: Option<u64>,
    bytes: &[u8],
    boundaries: &[usize],
    expected: &[String],
) {
    let mut parser = Parser::new(EventCollector::new(), ParserOptions::default());
    let mut last = 0usize;
    for &idx in boundaries {
        assert!(idx > last && idx <= bytes.len(), "invalid boundary {idx}");
        parser.write_bytes(&bytes[last..idx]);
        last = idx;
    }
    parser.write_bytes(&bytes[last..]);
    parser.end();
    let actual = parser.into_handler().lines();
    if actual != expected {
        let seed_label = seed
            .map(|seed| format!("seed=0x{seed:016x}"))
            .unwrap_or_else(|| "seed=explicit".to_string());
        panic!(
            "streaming parity mismatch for case={case_idx} {seed_label} boundaries={boundaries:?}\nexpected: {expected:#?}\nactual: {actual:#?}"
        );
    }
}

fn seed_count() -> usize {
    if let Ok(value) = std::env::var("HTMLSAX_STREAMING_PARITY_SEEDS")
        && let Ok(parsed) = value.parse::<usize>()
        && parsed > 0
    {
        return parsed;
    }
    if std::env::var("CI").is_ok() {
        DEFAULT_SEEDS_CI
    } else {
        DEFAULT_SEEDS_LOCAL
    }
}

fn random_boundaries(rng: &mut LcgRng, len: usize) -> Vec<usize> {
    if len <= 1 {
        return Vec::new();
    }
    let max_points = (len - 1).min(64);
    let count = rng.gen_range_usize(0, max_points + 1);
    let mut out: Vec<usize> = (0..count).map(|_| rng.gen_range_usize(1, len)).collect();
    out.sort_unstable();
    out.dedup();
    out
}

struct LcgRng {
    state: u64,
}

impl LcgRng {
    fn new(seed: u64) -> Self {
        let state = if seed == 0 { SEED_MIX } else { seed };
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    fn gen_range_usize(&mut self, start: usize, end: usize) -> usize {
        assert!(start < end, "invalid range: {start}..{end}");
        let span = (end - start) as u64;
        (self.next_u64() % span) as usize + start
    }
}
