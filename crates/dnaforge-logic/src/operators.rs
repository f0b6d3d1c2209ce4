//! Genetic operators over World DNA: mutation and crossover.
//!
//! Both take an explicit RNG so a fixed seed reproduces the same child. Neither
//! recomputes thresholds or evolution; run those stages again afterward if the
//! derived blocks are needed.

use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{DnaResult, SchemaMismatchError};
use crate::traits::{Trait, TraitCode, TraitField};
use crate::world::WorldDna;

/// How a child picks each trait from its two parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CrossoverStrategy {
    /// 50/50 per trait.
    #[default]
    Uniform,
    /// The parent whose trait has the higher intensity wins; ties are a coin flip.
    WeightedByIntensity,
    /// Contiguous blocks of `block_len` traits in declaration order, alternating
    /// between parents starting with the first.
    Segment { block_len: usize },
}

/// Add `step` to one field of `t`, clipped to the field's range.
pub fn random_walk(t: &Trait, field: TraitField, step: i32) -> Trait {
    t.shifted(field, step)
}

/// ±1 or ±2.
fn signed_step(rng: &mut impl Rng) -> i32 {
    let magnitude = rng.gen_range(1..=2);
    if rng.gen_bool(0.5) {
        magnitude
    } else {
        -magnitude
    }
}

/// Perturb each trait with probability `rate` (clamped to 0..=1).
///
/// A mutating trait walks its prevalence, its intensity, or both. Results are
/// clipped, so mutation never fails.
pub fn mutate(dna: &WorldDna, rng: &mut impl Rng, rate: f64) -> WorldDna {
    let rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
    let mut changed = 0usize;

    let traits: Vec<Trait> = dna
        .traits()
        .iter()
        .map(|t| {
            if !rng.gen_bool(rate) {
                return t.clone();
            }
            changed += 1;
            match rng.gen_range(0..3) {
                0 => random_walk(t, TraitField::Prevalence, signed_step(rng)),
                1 => random_walk(t, TraitField::Intensity, signed_step(rng)),
                _ => {
                    let walked = random_walk(t, TraitField::Prevalence, signed_step(rng));
                    random_walk(&walked, TraitField::Intensity, signed_step(rng))
                }
            }
        })
        .collect();

    log::debug!("mutate: {} of {} traits perturbed", changed, dna.len());
    dna.with_validated_traits(traits)
}

/// Both parents must carry exactly the same trait codes.
pub fn check_schema(a: &[&TraitCode], b: &[&TraitCode]) -> Result<(), SchemaMismatchError> {
    let set_a: BTreeSet<&TraitCode> = a.iter().copied().collect();
    let set_b: BTreeSet<&TraitCode> = b.iter().copied().collect();
    if set_a == set_b {
        return Ok(());
    }
    Err(SchemaMismatchError {
        only_in_a: set_a.difference(&set_b).map(|c| c.to_string()).collect(),
        only_in_b: set_b.difference(&set_a).map(|c| c.to_string()).collect(),
    })
}

/// Pick the first parent (`true`) or the second for item `index`.
pub(crate) fn pick_first(
    strategy: CrossoverStrategy,
    index: usize,
    weight_a: u8,
    weight_b: u8,
    rng: &mut impl Rng,
) -> bool {
    match strategy {
        CrossoverStrategy::Uniform => rng.gen_bool(0.5),
        CrossoverStrategy::WeightedByIntensity => match weight_a.cmp(&weight_b) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => rng.gen_bool(0.5),
        },
        CrossoverStrategy::Segment { block_len } => (index / block_len.max(1)) % 2 == 0,
    }
}

/// Combine two same-schema parents into a child.
///
/// The child keeps `parent_a`'s trait order, takes the higher version of the
/// two, and starts with empty threshold and evolution blocks.
pub fn crossover(
    parent_a: &WorldDna,
    parent_b: &WorldDna,
    rng: &mut impl Rng,
    strategy: CrossoverStrategy,
) -> DnaResult<WorldDna> {
    let codes_a: Vec<&TraitCode> = parent_a.trait_codes().collect();
    let codes_b: Vec<&TraitCode> = parent_b.trait_codes().collect();
    check_schema(&codes_a, &codes_b)?;

    let mut traits = Vec::with_capacity(parent_a.len());
    for (index, ta) in parent_a.traits().iter().enumerate() {
        let tb = parent_b.require(&ta.code)?;
        let chosen = if pick_first(strategy, index, ta.intensity, tb.intensity, rng) {
            ta
        } else {
            tb
        };
        traits.push(chosen.clone());
    }

    let version = parent_a.version().max(parent_b.version());
    log::debug!("crossover ({:?}): {} traits, version {}", strategy, traits.len(), version);
    WorldDna::new(version, traits)
}
