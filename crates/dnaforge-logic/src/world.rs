//! World DNA value type.
//!
//! A `WorldDna` is an immutable value: every transformation in this crate
//! takes one by reference and returns a new one. Traits keep their insertion
//! order (and unique codes) so a decode → encode cycle reproduces the input
//! ordering; thresholds and evolution series are kept in sorted collections.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DnaError, DnaResult};
use crate::evolution::{EvolutionPattern, EvolutionSeries};
use crate::thresholds::ThresholdId;
use crate::traits::{Trait, TraitCode};

/// `<major>.<minor>` format tag. Ordered by major, then minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DnaVersion {
    pub major: u16,
    pub minor: u16,
}

impl DnaVersion {
    /// Version written by the generator.
    pub const CURRENT: DnaVersion = DnaVersion { major: 1, minor: 6 };

    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

/// Documents without a version header are read as 1.0.
impl Default for DnaVersion {
    fn default() -> Self {
        Self { major: 1, minor: 0 }
    }
}

impl fmt::Display for DnaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A complete world description: traits plus the derived threshold and
/// evolution blocks. The text codec is its canonical serialization; the serde
/// form is a plain record that is re-validated on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WorldDnaData", into = "WorldDnaData")]
pub struct WorldDna {
    version: DnaVersion,
    traits: Vec<Trait>,
    thresholds: BTreeSet<ThresholdId>,
    evolution: BTreeMap<TraitCode, EvolutionSeries>,
}

impl WorldDna {
    /// Build a DNA from an ordered trait list. Every trait is range-checked and
    /// codes must be unique.
    pub fn new(version: DnaVersion, traits: Vec<Trait>) -> DnaResult<Self> {
        let mut seen = HashSet::with_capacity(traits.len());
        for t in &traits {
            t.validate()
                .map_err(|e| DnaError::validation(format!("trait `{}`", t.code), 0, e))?;
            check_trait_code(&t.code)?;
            if !seen.insert(&t.code) {
                return Err(DnaError::DuplicateTrait {
                    code: t.code.to_string(),
                });
            }
        }
        Ok(Self {
            version,
            traits,
            thresholds: BTreeSet::new(),
            evolution: BTreeMap::new(),
        })
    }

    pub fn version(&self) -> DnaVersion {
        self.version
    }

    pub fn traits(&self) -> &[Trait] {
        &self.traits
    }

    pub fn thresholds(&self) -> &BTreeSet<ThresholdId> {
        &self.thresholds
    }

    pub fn evolution(&self) -> &BTreeMap<TraitCode, EvolutionSeries> {
        &self.evolution
    }

    pub fn get(&self, code: &TraitCode) -> Option<&Trait> {
        self.traits.iter().find(|t| &t.code == code)
    }

    /// Like [`get`](Self::get) but a missing trait is an error.
    pub fn require(&self, code: &TraitCode) -> DnaResult<&Trait> {
        self.get(code).ok_or_else(|| DnaError::MissingTrait {
            code: code.to_string(),
        })
    }

    pub fn trait_codes(&self) -> impl Iterator<Item = &TraitCode> {
        self.traits.iter().map(|t| &t.code)
    }

    pub fn len(&self) -> usize {
        self.traits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }

    pub fn with_version(&self, version: DnaVersion) -> Self {
        Self {
            version,
            ..self.clone()
        }
    }

    /// Replace the trait list wholesale, keeping version, thresholds and evolution.
    pub fn with_traits(&self, traits: Vec<Trait>) -> DnaResult<Self> {
        let mut next = Self::new(self.version, traits)?;
        next.thresholds = self.thresholds.clone();
        next.evolution = self.evolution.clone();
        Ok(next)
    }

    /// Replace one trait in place (by code), keeping its position.
    pub fn with_trait(&self, replacement: Trait) -> DnaResult<Self> {
        replacement
            .validate()
            .map_err(|e| DnaError::validation(format!("trait `{}`", replacement.code), 0, e))?;
        let mut next = self.clone();
        match next.traits.iter_mut().find(|t| t.code == replacement.code) {
            Some(slot) => *slot = replacement,
            None => {
                return Err(DnaError::MissingTrait {
                    code: replacement.code.to_string(),
                })
            }
        }
        Ok(next)
    }

    pub fn with_thresholds(&self, thresholds: BTreeSet<ThresholdId>) -> DnaResult<Self> {
        for id in &thresholds {
            if let ThresholdId::Unknown(name) = id {
                check_pass_through("threshold", name, ThresholdId::parse_known(name).is_some())?;
            }
        }
        Ok(Self {
            thresholds,
            ..self.clone()
        })
    }

    pub fn with_evolution(&self, code: TraitCode, series: EvolutionSeries) -> DnaResult<Self> {
        check_trait_code(&code)?;
        let mut next = self.clone();
        next.evolution.insert(code, series);
        Ok(next)
    }

    /// Same traits and version with thresholds and evolution cleared.
    pub fn bare(&self) -> Self {
        Self {
            version: self.version,
            traits: self.traits.clone(),
            thresholds: BTreeSet::new(),
            evolution: BTreeMap::new(),
        }
    }

    /// Internal constructor for values assembled by the decoders.
    pub(crate) fn from_parts(
        version: DnaVersion,
        traits: Vec<Trait>,
        thresholds: BTreeSet<ThresholdId>,
        evolution: BTreeMap<TraitCode, EvolutionSeries>,
    ) -> Self {
        Self {
            version,
            traits,
            thresholds,
            evolution,
        }
    }

    /// Trait-only copy built from already-validated traits.
    pub(crate) fn with_validated_traits(&self, traits: Vec<Trait>) -> Self {
        Self {
            traits,
            ..self.clone()
        }
    }
}

fn check_trait_code(code: &TraitCode) -> DnaResult<()> {
    match code {
        TraitCode::Unknown(name) => {
            check_pass_through("trait", name, TraitCode::parse_known(name).is_some())
        }
        _ => Ok(()),
    }
}

/// A pass-through name must be a codec identifier the registry does not claim.
fn check_pass_through(kind: &'static str, name: &str, registered: bool) -> DnaResult<()> {
    let problem = if registered {
        "it names a registered entry"
    } else if !is_identifier(name) {
        "it is not an identifier"
    } else {
        return Ok(());
    };
    Err(DnaError::UnencodableName {
        kind,
        name: name.to_string(),
        problem,
    })
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// One evolution entry in the serde form.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EvolutionEntry {
    #[serde(rename = "trait")]
    code: TraitCode,
    pattern: EvolutionPattern,
    values: [u8; 4],
}

/// Serde form of [`WorldDna`]. Evolution is a list because trait codes with a
/// pass-through payload cannot be JSON object keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorldDnaData {
    version: DnaVersion,
    traits: Vec<Trait>,
    #[serde(default)]
    thresholds: BTreeSet<ThresholdId>,
    #[serde(default)]
    evolution: Vec<EvolutionEntry>,
}

impl From<WorldDna> for WorldDnaData {
    fn from(dna: WorldDna) -> Self {
        Self {
            version: dna.version,
            traits: dna.traits,
            thresholds: dna.thresholds,
            evolution: dna
                .evolution
                .into_iter()
                .map(|(code, series)| EvolutionEntry {
                    code,
                    pattern: series.pattern,
                    values: series.values,
                })
                .collect(),
        }
    }
}

impl TryFrom<WorldDnaData> for WorldDna {
    type Error = DnaError;

    fn try_from(data: WorldDnaData) -> DnaResult<Self> {
        let mut dna = WorldDna::new(data.version, data.traits)?.with_thresholds(data.thresholds)?;
        for entry in data.evolution {
            if dna.evolution.contains_key(&entry.code) {
                return Err(DnaError::DuplicateTrait {
                    code: entry.code.to_string(),
                });
            }
            let series = EvolutionSeries::new(entry.pattern, entry.values).map_err(|e| {
                DnaError::validation(format!("evolution value of `{}`", entry.code), 0, e)
            })?;
            dna = dna.with_evolution(entry.code, series)?;
        }
        Ok(dna)
    }
}
