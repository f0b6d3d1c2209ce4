//! Temporal evolution: four-point trait trajectories (PAST, PRESENT, NEAR, FAR).
//!
//! The trait's packed two-digit value (`prevalence * 10 + intensity`) is the
//! PRESENT point. The simulator back-fills PAST and projects NEAR and FAR
//! according to a named pattern. Step size scales with the trait's intensity:
//!
//! | Pattern | Step magnitudes (PAST→PRESENT→NEAR→FAR) |
//! |---------|-----------------------------------------|
//! | `ACCELERATING` | b, 2b, 4b upward, clipped at 99 |
//! | `DECLINING` | b, 2b, 4b downward, clipped at 1 |
//! | `STABILIZING` | 4b in, 2b past PRESENT, b back toward it |
//! | `UNSTABLE` | random 2..=8 per step, alternating sign, FAR within 4 of PAST |
//!
//! Every series, decoded or simulated, can be checked against its pattern's
//! consistency predicate. Decoders report violations as warnings.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{DnaResult, RangeError, SeriesConsistencyWarning};
use crate::traits::{check_range, clip_to_range, RangeKind, TraitCode};
use crate::world::WorldDna;

/// Smallest UNSTABLE step magnitude.
pub const UNSTABLE_MIN_STEP: u8 = 2;
/// Largest UNSTABLE step magnitude; also the band the predicate enforces.
pub const UNSTABLE_MAX_STEP: u8 = 8;
/// Largest UNSTABLE net change between PAST and FAR.
pub const UNSTABLE_MAX_DRIFT: u8 = UNSTABLE_MAX_STEP / 2;

const EVOLUTION_CEILING: u8 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvolutionPattern {
    Accelerating,
    Declining,
    Unstable,
    Stabilizing,
}

impl EvolutionPattern {
    pub const ALL: [EvolutionPattern; 4] = [
        EvolutionPattern::Accelerating,
        EvolutionPattern::Declining,
        EvolutionPattern::Unstable,
        EvolutionPattern::Stabilizing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EvolutionPattern::Accelerating => "ACCELERATING",
            EvolutionPattern::Declining => "DECLINING",
            EvolutionPattern::Unstable => "UNSTABLE",
            EvolutionPattern::Stabilizing => "STABILIZING",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }
}

impl fmt::Display for EvolutionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimePeriod {
    Past,
    Present,
    Near,
    Far,
}

impl TimePeriod {
    pub const ALL: [TimePeriod; 4] = [
        TimePeriod::Past,
        TimePeriod::Present,
        TimePeriod::Near,
        TimePeriod::Far,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TimePeriod::Past => "PAST",
            TimePeriod::Present => "PRESENT",
            TimePeriod::Near => "NEAR",
            TimePeriod::Far => "FAR",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Four-point trajectory of one trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvolutionSeries {
    pub pattern: EvolutionPattern,
    pub values: [u8; 4],
}

impl EvolutionSeries {
    /// Range-checks every point (1–99). Pattern consistency is checked
    /// separately by [`check_consistency`](Self::check_consistency).
    pub fn new(pattern: EvolutionPattern, values: [u8; 4]) -> Result<Self, RangeError> {
        for v in values {
            check_range(v as i64, RangeKind::EvolutionValue)?;
        }
        Ok(Self { pattern, values })
    }

    pub fn value(&self, period: TimePeriod) -> u8 {
        self.values[period.index()]
    }

    pub fn present(&self) -> u8 {
        self.value(TimePeriod::Present)
    }

    /// Step deltas PAST→PRESENT, PRESENT→NEAR, NEAR→FAR.
    pub fn deltas(&self) -> [i16; 3] {
        let v = self.values.map(i16::from);
        [v[1] - v[0], v[2] - v[1], v[3] - v[2]]
    }

    /// FAR minus PAST.
    pub fn net_change(&self) -> i16 {
        self.values[3] as i16 - self.values[0] as i16
    }

    pub fn is_consistent(&self) -> bool {
        consistency_violation(self.pattern, &self.values).is_none()
    }

    /// Check the values against the pattern's monotonicity/boundedness rule.
    pub fn check_consistency(&self) -> Result<(), SeriesConsistencyWarning> {
        match consistency_violation(self.pattern, &self.values) {
            None => Ok(()),
            Some(reason) => Err(SeriesConsistencyWarning {
                trait_code: None,
                pattern: self.pattern,
                values: self.values,
                reason,
            }),
        }
    }
}

fn consistency_violation(pattern: EvolutionPattern, values: &[u8; 4]) -> Option<String> {
    let v = values.map(i16::from);
    let d = [v[1] - v[0], v[2] - v[1], v[3] - v[2]];

    match pattern {
        EvolutionPattern::Accelerating => {
            if let Some(i) = d.iter().position(|&x| x < 0) {
                return Some(format!("value falls at step {}", i + 1));
            }
            // A step that lands on the ceiling may be shorter than the one before.
            for i in 1..3 {
                if d[i] < d[i - 1] && values[i + 1] != EVOLUTION_CEILING {
                    return Some(format!(
                        "step {} rises by {} after a rise of {}",
                        i + 1,
                        d[i],
                        d[i - 1]
                    ));
                }
            }
            None
        }
        EvolutionPattern::Declining => d
            .iter()
            .position(|&x| x > 0)
            .map(|i| format!("value rises at step {}", i + 1)),
        EvolutionPattern::Stabilizing => {
            for i in 1..3 {
                if d[i].abs() > d[i - 1].abs() {
                    return Some(format!(
                        "step {} moves by {} after a move of {}",
                        i + 1,
                        d[i].abs(),
                        d[i - 1].abs()
                    ));
                }
            }
            None
        }
        EvolutionPattern::Unstable => {
            let band = UNSTABLE_MAX_STEP as i16;
            if let Some(i) = d.iter().position(|x| x.abs() > band) {
                return Some(format!(
                    "step {} moves by {}, band is {}",
                    i + 1,
                    d[i].abs(),
                    band
                ));
            }
            let drift = (v[3] - v[0]).abs();
            let max_drift = UNSTABLE_MAX_DRIFT as i16;
            if drift > max_drift {
                return Some(format!("net drift {} exceeds {}", drift, max_drift));
            }
            None
        }
    }
}

fn clip(value: i32) -> u8 {
    clip_to_range(value, RangeKind::EvolutionValue)
}

/// Build a series around a PRESENT value.
///
/// `base_step` is normally the trait's intensity. The RNG is only drawn from
/// for `UNSTABLE`.
pub fn project(
    present: u8,
    base_step: u8,
    pattern: EvolutionPattern,
    rng: &mut impl Rng,
) -> EvolutionSeries {
    let p = clip(present as i32) as i32;
    let b = base_step.max(1) as i32;

    let values = match pattern {
        EvolutionPattern::Accelerating => {
            let near = clip(p + 2 * b);
            [clip(p - b), p as u8, near, clip(near as i32 + 4 * b)]
        }
        EvolutionPattern::Declining => {
            let near = clip(p - 2 * b);
            [clip(p + b), p as u8, near, clip(near as i32 - 4 * b)]
        }
        EvolutionPattern::Stabilizing => {
            // Come in from the side with more headroom, overshoot PRESENT,
            // then settle back halfway. Clipping only shortens later steps.
            let dir = if p <= 50 { -1 } else { 1 };
            [
                clip(p - dir * 4 * b),
                p as u8,
                clip(p + dir * 2 * b),
                clip(p + dir * b),
            ]
        }
        EvolutionPattern::Unstable => {
            let min = UNSTABLE_MIN_STEP as i32;
            let max = UNSTABLE_MAX_STEP as i32;
            let drift = UNSTABLE_MAX_DRIFT as i32;

            let sign = if rng.gen_bool(0.5) { 1 } else { -1 };
            let s0 = rng.gen_range(min..=max);
            // NEAR may not fall so far short of PAST that FAR can't come back.
            let s1 = rng.gen_range((s0 - (drift - min)).max(min)..=max);
            let past = clip(p - sign * s0) as i32;
            let near = clip(p - sign * s1) as i32;

            let (step_lo, step_hi) = if sign > 0 {
                (near + min, near + max)
            } else {
                (near - max, near - min)
            };
            let lo = step_lo.max(past - drift);
            let hi = step_hi.min(past + drift);
            let far = if lo <= hi { rng.gen_range(lo..=hi) } else { past };

            [past as u8, p as u8, near as u8, clip(far)]
        }
    };

    EvolutionSeries { pattern, values }
}

/// Evolve one trait of `dna` under `pattern`.
pub fn evolve(
    dna: &WorldDna,
    code: &TraitCode,
    pattern: EvolutionPattern,
    rng: &mut impl Rng,
) -> DnaResult<EvolutionSeries> {
    let t = dna.require(code)?;
    Ok(project(t.packed(), t.intensity, pattern, rng))
}

/// Evolve one trait and write the series into a new DNA's evolution block.
pub fn evolve_into(
    dna: &WorldDna,
    code: &TraitCode,
    pattern: EvolutionPattern,
    rng: &mut impl Rng,
) -> DnaResult<WorldDna> {
    let series = evolve(dna, code, pattern, rng)?;
    dna.with_evolution(code.clone(), series)
}
