//! Mutation and crossover for NPC personalities. Both recompute the alignment
//! header from the resulting lists.

use rand::Rng;

use crate::error::{DnaResult, SchemaMismatchError};
use crate::operators::{pick_first, CrossoverStrategy};
use crate::traits::{clip_to_range, RangeKind};

use super::{NpcPersonalityDna, PairedTrait, UnpairedValue};

fn walk(value: u8, rng: &mut impl Rng, kind: RangeKind) -> u8 {
    let magnitude: i32 = rng.gen_range(1..=2);
    let step = if rng.gen_bool(0.5) { magnitude } else { -magnitude };
    clip_to_range(value as i32 + step, kind)
}

/// Perturb each paired trait and each unpaired value with probability `rate`.
pub fn mutate_npc(dna: &NpcPersonalityDna, rng: &mut impl Rng, rate: f64) -> NpcPersonalityDna {
    let rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };

    let paired: Vec<PairedTrait> = dna
        .paired()
        .iter()
        .map(|t| {
            let mut next = *t;
            if rng.gen_bool(rate) {
                match rng.gen_range(0..3) {
                    0 => next.prevalence = walk(t.prevalence, rng, RangeKind::Prevalence),
                    1 => next.intensity = walk(t.intensity, rng, RangeKind::Intensity),
                    _ => {
                        next.prevalence = walk(t.prevalence, rng, RangeKind::Prevalence);
                        next.intensity = walk(t.intensity, rng, RangeKind::Intensity);
                    }
                }
            }
            next
        })
        .collect();

    let unpaired: Vec<UnpairedValue> = dna
        .unpaired()
        .iter()
        .map(|v| {
            let mut next = *v;
            if rng.gen_bool(rate) {
                next.score = walk(v.score, rng, RangeKind::Score);
            }
            next
        })
        .collect();

    NpcPersonalityDna::derived(paired, unpaired)
}

/// Positional schema check: same length and the same code at every index.
fn check_positions<T: PartialEq + std::fmt::Display>(
    a: &[T],
    b: &[T],
    err: &mut SchemaMismatchError,
) {
    for i in 0..a.len().max(b.len()) {
        match (a.get(i), b.get(i)) {
            (Some(x), Some(y)) if x == y => {}
            (x, y) => {
                if let Some(x) = x {
                    err.only_in_a.push(format!("{}@{}", x, i));
                }
                if let Some(y) = y {
                    err.only_in_b.push(format!("{}@{}", y, i));
                }
            }
        }
    }
}

/// Combine two personalities with the same code layout.
///
/// Paired traits are weighed by intensity and unpaired values by score under
/// [`CrossoverStrategy::WeightedByIntensity`]. Segments are counted separately
/// in each list.
pub fn crossover_npc(
    parent_a: &NpcPersonalityDna,
    parent_b: &NpcPersonalityDna,
    rng: &mut impl Rng,
    strategy: CrossoverStrategy,
) -> DnaResult<NpcPersonalityDna> {
    let codes = |dna: &NpcPersonalityDna| -> (Vec<char>, Vec<char>) {
        (
            dna.paired().iter().map(|t| t.code.letter()).collect(),
            dna.unpaired().iter().map(|v| v.code.letter()).collect(),
        )
    };
    let (paired_a, unpaired_a) = codes(parent_a);
    let (paired_b, unpaired_b) = codes(parent_b);

    let mut mismatch = SchemaMismatchError {
        only_in_a: Vec::new(),
        only_in_b: Vec::new(),
    };
    check_positions(&paired_a, &paired_b, &mut mismatch);
    check_positions(&unpaired_a, &unpaired_b, &mut mismatch);
    if !mismatch.only_in_a.is_empty() || !mismatch.only_in_b.is_empty() {
        return Err(mismatch.into());
    }

    let paired = parent_a
        .paired()
        .iter()
        .zip(parent_b.paired())
        .enumerate()
        .map(|(i, (ta, tb))| {
            if pick_first(strategy, i, ta.intensity, tb.intensity, rng) {
                *ta
            } else {
                *tb
            }
        })
        .collect();

    let unpaired = parent_a
        .unpaired()
        .iter()
        .zip(parent_b.unpaired())
        .enumerate()
        .map(|(i, (va, vb))| {
            if pick_first(strategy, i, va.score, vb.score, rng) {
                *va
            } else {
                *vb
            }
        })
        .collect();

    Ok(NpcPersonalityDna::derived(paired, unpaired))
}
