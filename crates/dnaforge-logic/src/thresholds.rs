//! Critical thresholds: named tipping points over trait values.
//!
//! Each [`ThresholdId`] is bound to a conjunction of trait predicates. A
//! threshold is triggered when every predicate holds. A predicate over a trait
//! the DNA does not carry is false.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::traits::{TraitCode, TraitField};
use crate::world::WorldDna;

/// Identifier of a registered threshold.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdId {
    HighMagic,
    Unstable,
    Advanced,
    /// Pass-through id retained by lenient decoding.
    Unknown(String),
}

impl ThresholdId {
    pub const KNOWN: [ThresholdId; 3] = [
        ThresholdId::HighMagic,
        ThresholdId::Unstable,
        ThresholdId::Advanced,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ThresholdId::HighMagic => "high_magic",
            ThresholdId::Unstable => "unstable",
            ThresholdId::Advanced => "advanced",
            ThresholdId::Unknown(id) => id,
        }
    }

    pub fn parse_known(name: &str) -> Option<ThresholdId> {
        ThresholdId::KNOWN.into_iter().find(|id| id.as_str() == name)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ThresholdId::Unknown(_))
    }
}

impl fmt::Display for ThresholdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied to one trait field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    AtLeast(u8),
    AtMost(u8),
}

impl Comparison {
    pub fn holds(self, value: u8) -> bool {
        match self {
            Comparison::AtLeast(min) => value >= min,
            Comparison::AtMost(max) => value <= max,
        }
    }
}

/// `trait.field <op> bound`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitPredicate {
    pub code: TraitCode,
    pub field: TraitField,
    pub comparison: Comparison,
}

impl TraitPredicate {
    pub fn at_least(code: TraitCode, field: TraitField, min: u8) -> Self {
        Self {
            code,
            field,
            comparison: Comparison::AtLeast(min),
        }
    }

    pub fn at_most(code: TraitCode, field: TraitField, max: u8) -> Self {
        Self {
            code,
            field,
            comparison: Comparison::AtMost(max),
        }
    }

    pub fn holds(&self, dna: &WorldDna) -> bool {
        dna.get(&self.code)
            .map(|t| self.comparison.holds(t.field(self.field)))
            .unwrap_or(false)
    }
}

impl fmt::Display for TraitPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (op, bound) = match self.comparison {
            Comparison::AtLeast(v) => (">=", v),
            Comparison::AtMost(v) => ("<=", v),
        };
        write!(f, "{}.{} {} {}", self.code, self.field.as_str(), op, bound)
    }
}

/// A threshold and the predicates that must all hold for it to trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdDefinition {
    pub id: ThresholdId,
    pub conditions: Vec<TraitPredicate>,
}

impl ThresholdDefinition {
    pub fn is_met(&self, dna: &WorldDna) -> bool {
        !self.conditions.is_empty() && self.conditions.iter().all(|p| p.holds(dna))
    }
}

/// The fixed threshold registry.
pub fn threshold_registry() -> Vec<ThresholdDefinition> {
    use TraitField::{Intensity, Prevalence};
    vec![
        ThresholdDefinition {
            id: ThresholdId::HighMagic,
            conditions: vec![
                TraitPredicate::at_least(TraitCode::Schools, Prevalence, 7),
                TraitPredicate::at_least(TraitCode::Artifacts, Intensity, 3),
            ],
        },
        ThresholdDefinition {
            id: ThresholdId::Unstable,
            conditions: vec![
                TraitPredicate::at_least(TraitCode::Conflict, Prevalence, 4),
                TraitPredicate::at_most(TraitCode::Stability, Prevalence, 2),
            ],
        },
        ThresholdDefinition {
            id: ThresholdId::Advanced,
            conditions: vec![
                TraitPredicate::at_least(TraitCode::Technology, Prevalence, 7),
                TraitPredicate::at_least(TraitCode::Society, Prevalence, 6),
            ],
        },
    ]
}

/// Registry entry for a known id.
pub fn definition(id: &ThresholdId) -> Option<ThresholdDefinition> {
    threshold_registry().into_iter().find(|d| &d.id == id)
}

/// Every threshold of the default registry currently satisfied by `dna`.
pub fn evaluate_thresholds(dna: &WorldDna) -> BTreeSet<ThresholdId> {
    evaluate_with(dna, &threshold_registry())
}

/// Same as [`evaluate_thresholds`] against a caller-supplied registry.
pub fn evaluate_with(dna: &WorldDna, registry: &[ThresholdDefinition]) -> BTreeSet<ThresholdId> {
    registry
        .iter()
        .filter(|d| d.is_met(dna))
        .map(|d| d.id.clone())
        .collect()
}
