//! Random generation of worlds and personalities, plus the trait-band
//! heuristics (trends and suggested evolution patterns) used when resolving a
//! freshly generated world.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::evolution::EvolutionPattern;
use crate::npc::{disposition_pairs, NpcPersonalityDna, PairedTrait, UnpairedValue, Virtue};
use crate::traits::{Trait, TraitCode, TraitField};
use crate::world::{DnaVersion, WorldDna};

const HIGH_PREVALENCE: u8 = 7;
const LOW_PREVALENCE: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Rising,
    Falling,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Rising => "RISING",
            Trend::Falling => "FALLING",
        }
    }
}

/// Signed nudge applied to one generated trait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitBias {
    pub code: TraitCode,
    pub prevalence: i8,
    pub intensity: i8,
}

/// A world with every known trait drawn uniformly from its range.
pub fn generate_world(rng: &mut impl Rng) -> WorldDna {
    let traits = TraitCode::KNOWN
        .into_iter()
        .map(|code| Trait {
            code,
            prevalence: rng.gen_range(1..=9),
            intensity: rng.gen_range(1..=5),
        })
        .collect();
    WorldDna::from_parts(DnaVersion::CURRENT, traits, BTreeSet::new(), BTreeMap::new())
}

/// Shift the named traits by their bias, clipped. Codes the DNA lacks are ignored.
pub fn apply_bias(dna: &WorldDna, bias: &[TraitBias]) -> WorldDna {
    let traits = dna
        .traits()
        .iter()
        .map(|t| match bias.iter().find(|b| b.code == t.code) {
            Some(b) => t
                .shifted(TraitField::Prevalence, b.prevalence as i32)
                .shifted(TraitField::Intensity, b.intensity as i32),
            None => t.clone(),
        })
        .collect();
    dna.with_validated_traits(traits)
}

pub fn trend_of(t: &Trait) -> Option<Trend> {
    if t.prevalence >= HIGH_PREVALENCE && t.intensity >= 4 {
        Some(Trend::Rising)
    } else if t.prevalence <= LOW_PREVALENCE && t.intensity <= 2 {
        Some(Trend::Falling)
    } else {
        None
    }
}

/// Traits that are dominant and strong (rising) or rare and faint (falling),
/// in trait order.
pub fn identify_trends(dna: &WorldDna) -> Vec<(TraitCode, Trend)> {
    dna.traits()
        .iter()
        .filter_map(|t| trend_of(t).map(|trend| (t.code.clone(), trend)))
        .collect()
}

/// Pattern a trait is expected to follow, if its bands suggest one.
///
/// | Prevalence | Intensity | Pattern |
/// |------------|-----------|---------|
/// | 7–9 | 4–5 | `ACCELERATING` |
/// | 1–3 | 1–2 | `DECLINING` |
/// | 4–6 | 4–5 | `UNSTABLE` |
/// | 4–6 | 1–2 | `STABILIZING` |
///
/// A trend, when present, wins over the band table.
pub fn suggest_pattern(t: &Trait) -> Option<EvolutionPattern> {
    match trend_of(t) {
        Some(Trend::Rising) => return Some(EvolutionPattern::Accelerating),
        Some(Trend::Falling) => return Some(EvolutionPattern::Declining),
        None => {}
    }
    let moderate = (LOW_PREVALENCE + 1..HIGH_PREVALENCE).contains(&t.prevalence);
    match t.intensity {
        4..=5 if moderate => Some(EvolutionPattern::Unstable),
        1..=2 if moderate => Some(EvolutionPattern::Stabilizing),
        _ => None,
    }
}

/// A personality with one random pole of every pair and every known value.
pub fn generate_npc(rng: &mut impl Rng) -> NpcPersonalityDna {
    let paired = disposition_pairs()
        .into_iter()
        .map(|(pole, opposite)| PairedTrait {
            code: if rng.gen_bool(0.5) { pole } else { opposite },
            prevalence: rng.gen_range(1..=9),
            intensity: rng.gen_range(1..=5),
        })
        .collect();
    let unpaired = Virtue::known()
        .map(|code| UnpairedValue {
            code,
            score: rng.gen_range(1..=9),
        })
        .collect();
    NpcPersonalityDna::derived(paired, unpaired)
}
