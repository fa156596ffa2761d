//! Deterministic and seeded chunk plans for streaming coverage.
//!
//! Fuzz plans are seeded so a failing CI run can be reproduced from its label.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundaryPolicy {
    /// Chunks only split between characters.
    Utf8Aligned,
    /// Chunks may split inside a multi-byte character.
    ByteStream,
}

impl fmt::Display for BoundaryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryPolicy::Utf8Aligned => f.write_str("utf8"),
            BoundaryPolicy::ByteStream => f.write_str("bytes"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkPlan {
    /// Split every `size` bytes; under the utf8 policy offsets that fall
    /// inside a character are skipped.
    Fixed { size: usize, policy: BoundaryPolicy },
    /// Split before each listed offset.
    Boundaries {
        indices: Vec<usize>,
        policy: BoundaryPolicy,
    },
}

impl fmt::Display for ChunkPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkPlan::Fixed { size, policy } => write!(f, "fixed size={size} [{policy}]"),
            ChunkPlan::Boundaries { indices, policy } => {
                write!(f, "boundaries={indices:?} [{policy}]")
            }
        }
    }
}

impl ChunkPlan {
    pub fn fixed(size: usize) -> Self {
        Self::Fixed {
            size,
            policy: BoundaryPolicy::Utf8Aligned,
        }
    }

    pub fn fixed_unaligned(size: usize) -> Self {
        Self::Fixed {
            size,
            policy: BoundaryPolicy::ByteStream,
        }
    }

    pub fn boundaries(indices: impl Into<Vec<usize>>) -> Self {
        Self::Boundaries {
            indices: indices.into(),
            policy: BoundaryPolicy::Utf8Aligned,
        }
    }

    pub fn boundaries_unaligned(indices: impl Into<Vec<usize>>) -> Self {
        Self::Boundaries {
            indices: indices.into(),
            policy: BoundaryPolicy::ByteStream,
        }
    }

    pub fn policy(&self) -> BoundaryPolicy {
        match self {
            ChunkPlan::Fixed { policy, .. } | ChunkPlan::Boundaries { policy, .. } => *policy,
        }
    }

    /// Split offsets this plan produces for `input`, excluding 0 and `len`.
    pub fn split_points(&self, input: &str) -> Vec<usize> {
        let len = input.len();
        match self {
            ChunkPlan::Fixed { size, policy } => {
                assert!(*size > 0, "chunk size must be > 0");
                (*size..len)
                    .step_by(*size)
                    .filter(|&idx| {
                        *policy == BoundaryPolicy::ByteStream || input.is_char_boundary(idx)
                    })
                    .collect()
            }
            ChunkPlan::Boundaries { indices, policy } => {
                let mut last = 0usize;
                for &idx in indices {
                    assert!(idx > last && idx < len, "invalid boundary {idx} in {indices:?}");
                    assert_chunk_boundary(input, idx, *policy);
                    last = idx;
                }
                indices.clone()
            }
        }
    }

    pub fn for_each_chunk(&self, input: &str, mut f: impl FnMut(&[u8])) {
        let bytes = input.as_bytes();
        let mut last = 0usize;
        for idx in self.split_points(input) {
            f(&bytes[last..idx]);
            last = idx;
        }
        if last < bytes.len() {
            f(&bytes[last..]);
        }
    }
}

fn assert_chunk_boundary(input: &str, idx: usize, policy: BoundaryPolicy) {
    if policy == BoundaryPolicy::Utf8Aligned {
        assert!(
            input.is_char_boundary(idx),
            "chunk boundary {idx} splits a character under the utf8 policy"
        );
    }
}

#[derive(Clone, Debug)]
pub struct ChunkPlanCase {
    pub label: String,
    pub plan: ChunkPlan,
}

/// Deterministic plans (fixed sizes, splits around `<`, `</`, `>`, `&`, `;`
/// and quotes) plus `fuzz_runs` seeded random plans.
pub fn build_chunk_plans(
    input: &str,
    fuzz_runs: usize,
    fuzz_seed: u64,
    policy: BoundaryPolicy,
) -> Vec<ChunkPlanCase> {
    let mut plans = Vec::new();
    for size in [1usize, 2, 3, 4, 8, 16, 32, 64] {
        let plan = match policy {
            BoundaryPolicy::Utf8Aligned => ChunkPlan::fixed(size),
            BoundaryPolicy::ByteStream => ChunkPlan::fixed_unaligned(size),
        };
        plans.push(ChunkPlanCase {
            label: format!("fixed size={size}"),
            plan,
        });
    }

    let markup = markup_boundaries(input, policy);
    if !markup.is_empty() {
        plans.push(ChunkPlanCase {
            label: format!("markup-boundaries count={}", markup.len()),
            plan: boundaries_plan(markup.clone(), policy),
        });
    }

    if fuzz_runs > 0 {
        let mut candidates = candidate_boundaries(input, policy);
        candidates.extend(markup);
        candidates.sort_unstable();
        candidates.dedup();
        for i in 0..fuzz_runs {
            let seed = fuzz_seed.wrapping_add(i as u64);
            let mut rng = Lcg::new(seed);
            if candidates.is_empty() {
                break;
            }
            let max = candidates.len().clamp(1, 32);
            let mut picks = candidates.clone();
            rng.shuffle(&mut picks);
            picks.truncate(1 + rng.gen_range(max));
            picks.sort_unstable();
            picks.dedup();
            plans.push(ChunkPlanCase {
                label: format!("fuzz boundaries seed=0x{seed:016x}"),
                plan: boundaries_plan(picks, policy),
            });
        }
    }
    plans
}

/// Drop split points from a failing plan while `still_fails` holds, yielding a
/// locally minimal boundary list.
pub fn shrink_plan(
    input: &str,
    plan: &ChunkPlan,
    mut still_fails: impl FnMut(&ChunkPlan) -> bool,
) -> ChunkPlan {
    let policy = plan.policy();
    let mut points = plan.split_points(input);
    let mut i = 0;
    while i < points.len() {
        let mut candidate = points.clone();
        candidate.remove(i);
        if still_fails(&boundaries_plan(candidate.clone(), policy)) {
            points = candidate;
        } else {
            i += 1;
        }
    }
    boundaries_plan(points, policy)
}

fn boundaries_plan(indices: Vec<usize>, policy: BoundaryPolicy) -> ChunkPlan {
    match policy {
        BoundaryPolicy::Utf8Aligned => ChunkPlan::boundaries(indices),
        BoundaryPolicy::ByteStream => ChunkPlan::boundaries_unaligned(indices),
    }
}

fn markup_boundaries(input: &str, policy: BoundaryPolicy) -> Vec<usize> {
    let bytes = input.as_bytes();
    let mut out = Vec::new();
    for (i, &b) in bytes.iter().enumerate() {
        if matches!(b, b'<' | b'>' | b'"' | b'\'' | b'&' | b';' | b'=') {
            out.push(i);
            out.push(i + 1);
        }
        if b == b'<' && bytes.get(i + 1) == Some(&b'/') {
            out.push(i + 2);
        }
    }
    filter_boundaries(input, out, policy)
}

fn candidate_boundaries(input: &str, policy: BoundaryPolicy) -> Vec<usize> {
    let raw: Vec<usize> = match policy {
        BoundaryPolicy::Utf8Aligned => input.char_indices().map(|(idx, _)| idx).collect(),
        BoundaryPolicy::ByteStream => (0..input.len()).collect(),
    };
    filter_boundaries(input, raw, policy)
}

fn filter_boundaries(input: &str, mut indices: Vec<usize>, policy: BoundaryPolicy) -> Vec<usize> {
    let len = input.len();
    indices.retain(|&idx| {
        idx != 0
            && idx < len
            && (policy == BoundaryPolicy::ByteStream || input.is_char_boundary(idx))
    });
    indices.sort_unstable();
    indices.dedup();
    indices
}

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn gen_range(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        (self.next_u64() >> 32) as usize % upper
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.gen_range(i + 1);
            items.swap(i, j);
        }
    }
}
