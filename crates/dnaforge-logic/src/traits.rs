//! Trait model: trait codes, categories and the numeric range invariants.
//!
//! A world trait carries two small integers: *prevalence* (how common or
//! dominant the trait is, 1–9) and *intensity* (how strongly it is expressed,
//! 1–5). These bounds are hard invariants. Decoding rejects anything outside
//! them; only the evolution simulator and the genetic operators clip, and they
//! do so explicitly through [`clip_to_range`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RangeError;

/// Broad grouping of world traits, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraitCategory {
    Physical,
    Cultural,
    Political,
    Magical,
}

impl TraitCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            TraitCategory::Physical => "PHYSICAL",
            TraitCategory::Cultural => "CULTURAL",
            TraitCategory::Political => "POLITICAL",
            TraitCategory::Magical => "MAGICAL",
        }
    }
}

/// Identifier of a world trait.
///
/// Known codes form a fixed registry. `Unknown` only appears when a document
/// is decoded in lenient mode; it keeps the raw name so re-encoding is lossless.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitCode {
    // Physical
    Climate,
    Terrain,
    Resources,
    Hazards,
    // Cultural
    Society,
    Technology,
    Religion,
    Trade,
    // Political
    Government,
    Conflict,
    Diplomacy,
    Stability,
    // Magical
    #[serde(rename = "intensity")]
    MagicIntensity,
    #[serde(rename = "prevalence")]
    MagicPrevalence,
    Schools,
    Artifacts,
    /// Pass-through code retained by lenient decoding.
    Unknown(String),
}

impl TraitCode {
    /// Every known code in canonical declaration order.
    pub const KNOWN: [TraitCode; 16] = [
        TraitCode::Climate,
        TraitCode::Terrain,
        TraitCode::Resources,
        TraitCode::Hazards,
        TraitCode::Society,
        TraitCode::Technology,
        TraitCode::Religion,
        TraitCode::Trade,
        TraitCode::Government,
        TraitCode::Conflict,
        TraitCode::Diplomacy,
        TraitCode::Stability,
        TraitCode::MagicIntensity,
        TraitCode::MagicPrevalence,
        TraitCode::Schools,
        TraitCode::Artifacts,
    ];

    /// Name used in both text dialects.
    pub fn as_str(&self) -> &str {
        match self {
            TraitCode::Climate => "climate",
            TraitCode::Terrain => "terrain",
            TraitCode::Resources => "resources",
            TraitCode::Hazards => "hazards",
            TraitCode::Society => "society",
            TraitCode::Technology => "technology",
            TraitCode::Religion => "religion",
            TraitCode::Trade => "trade",
            TraitCode::Government => "government",
            TraitCode::Conflict => "conflict",
            TraitCode::Diplomacy => "diplomacy",
            TraitCode::Stability => "stability",
            TraitCode::MagicIntensity => "intensity",
            TraitCode::MagicPrevalence => "prevalence",
            TraitCode::Schools => "schools",
            TraitCode::Artifacts => "artifacts",
            TraitCode::Unknown(name) => name,
        }
    }

    /// Look up a known code by name. Returns `None` for anything outside the registry.
    pub fn parse_known(name: &str) -> Option<TraitCode> {
        TraitCode::KNOWN.into_iter().find(|code| code.as_str() == name)
    }

    /// Known code if registered, otherwise an `Unknown` pass-through.
    pub fn from_name(name: &str) -> TraitCode {
        TraitCode::parse_known(name).unwrap_or_else(|| TraitCode::Unknown(name.to_string()))
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, TraitCode::Unknown(_))
    }

    /// Category of a known code; `None` for pass-through codes.
    pub fn category(&self) -> Option<TraitCategory> {
        match self {
            TraitCode::Climate | TraitCode::Terrain | TraitCode::Resources | TraitCode::Hazards => {
                Some(TraitCategory::Physical)
            }
            TraitCode::Society | TraitCode::Technology | TraitCode::Religion | TraitCode::Trade => {
                Some(TraitCategory::Cultural)
            }
            TraitCode::Government
            | TraitCode::Conflict
            | TraitCode::Diplomacy
            | TraitCode::Stability => Some(TraitCategory::Political),
            TraitCode::MagicIntensity
            | TraitCode::MagicPrevalence
            | TraitCode::Schools
            | TraitCode::Artifacts => Some(TraitCategory::Magical),
            TraitCode::Unknown(_) => None,
        }
    }
}

impl fmt::Display for TraitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which numeric domain a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeKind {
    /// Trait prevalence, 1–9.
    Prevalence,
    /// Trait intensity, 1–5.
    Intensity,
    /// LNC / GNE alignment average, 1–9.
    Alignment,
    /// Unpaired NPC value score, 1–9.
    Score,
    /// One point of an evolution series, 1–99.
    EvolutionValue,
}

impl RangeKind {
    pub fn min(self) -> u8 {
        1
    }

    pub fn max(self) -> u8 {
        match self {
            RangeKind::Prevalence | RangeKind::Alignment | RangeKind::Score => 9,
            RangeKind::Intensity => 5,
            RangeKind::EvolutionValue => 99,
        }
    }

    pub fn contains(self, value: i64) -> bool {
        value >= self.min() as i64 && value <= self.max() as i64
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RangeKind::Prevalence => "prevalence",
            RangeKind::Intensity => "intensity",
            RangeKind::Alignment => "alignment",
            RangeKind::Score => "score",
            RangeKind::EvolutionValue => "evolution value",
        }
    }
}

impl fmt::Display for RangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check a raw value against its declared range.
pub fn check_range(value: i64, kind: RangeKind) -> Result<u8, RangeError> {
    if kind.contains(value) {
        Ok(value as u8)
    } else {
        Err(RangeError { kind, value })
    }
}

/// Clamp a value into the legal range for `kind`.
///
/// Only the evolution simulator and the genetic operators call this; decoding
/// never clips.
pub fn clip_to_range(value: i32, kind: RangeKind) -> u8 {
    value.clamp(kind.min() as i32, kind.max() as i32) as u8
}

/// Which of a trait's two numbers a predicate or operator targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitField {
    Prevalence,
    Intensity,
}

impl TraitField {
    pub fn range(self) -> RangeKind {
        match self {
            TraitField::Prevalence => RangeKind::Prevalence,
            TraitField::Intensity => RangeKind::Intensity,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.range().as_str()
    }
}

/// A single world trait.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Trait {
    pub code: TraitCode,
    pub prevalence: u8,
    pub intensity: u8,
}

impl Trait {
    /// Build a trait, rejecting out-of-range values.
    pub fn new(code: TraitCode, prevalence: u8, intensity: u8) -> Result<Self, RangeError> {
        let t = Self {
            code,
            prevalence,
            intensity,
        };
        t.validate()?;
        Ok(t)
    }

    pub fn validate(&self) -> Result<(), RangeError> {
        validate(self)
    }

    pub fn field(&self, field: TraitField) -> u8 {
        match field {
            TraitField::Prevalence => self.prevalence,
            TraitField::Intensity => self.intensity,
        }
    }

    /// Copy of this trait with `delta` added to one field, clipped to range.
    pub fn shifted(&self, field: TraitField, delta: i32) -> Trait {
        let mut next = self.clone();
        let value = clip_to_range(self.field(field) as i32 + delta, field.range());
        match field {
            TraitField::Prevalence => next.prevalence = value,
            TraitField::Intensity => next.intensity = value,
        }
        next
    }

    /// Two-digit packed form: tens = prevalence, units = intensity.
    pub fn packed(&self) -> u8 {
        self.prevalence * 10 + self.intensity
    }
}

/// Validate a trait's prevalence and intensity.
pub fn validate(t: &Trait) -> Result<(), RangeError> {
    check_range(t.prevalence as i64, RangeKind::Prevalence)?;
    check_range(t.intensity as i64, RangeKind::Intensity)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_round_trip_names() {
        for code in TraitCode::KNOWN {
            assert_eq!(TraitCode::parse_known(code.as_str()), Some(code.clone()));
        }
    }

    #[test]
    fn test_magic_codes_use_short_names() {
        assert_eq!(TraitCode::MagicIntensity.as_str(), "intensity");
        assert_eq!(TraitCode::from_name("prevalence"), TraitCode::MagicPrevalence);
    }

    #[test]
    fn test_unknown_code_passthrough() {
        let code = TraitCode::from_name("weather_gods");
        assert_eq!(code, TraitCode::Unknown("weather_gods".into()));
        assert!(!code.is_known());
        assert_eq!(code.category(), None);
    }

    #[test]
    fn test_every_category_has_four_traits() {
        for category in [
            TraitCategory::Physical,
            TraitCategory::Cultural,
            TraitCategory::Political,
            TraitCategory::Magical,
        ] {
            let n = TraitCode::KNOWN
                .iter()
                .filter(|c| c.category() == Some(category))
                .count();
            assert_eq!(n, 4, "{}", category.as_str());
        }
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(Trait::new(TraitCode::Climate, 9, 5).is_ok());
        let err = Trait::new(TraitCode::Climate, 10, 3).unwrap_err();
        assert_eq!(err.kind, RangeKind::Prevalence);
        assert_eq!(err.value, 10);
        let err = Trait::new(TraitCode::Climate, 3, 6).unwrap_err();
        assert_eq!(err.kind, RangeKind::Intensity);
        assert!(Trait::new(TraitCode::Climate, 0, 1).is_err());
    }

    #[test]
    fn test_clip_to_range() {
        assert_eq!(clip_to_range(11, RangeKind::Prevalence), 9);
        assert_eq!(clip_to_range(-3, RangeKind::Intensity), 1);
        assert_eq!(clip_to_range(120, RangeKind::EvolutionValue), 99);
        assert_eq!(clip_to_range(4, RangeKind::Intensity), 4);
    }

    #[test]
    fn test_shifted_clips() {
        let t = Trait::new(TraitCode::Trade, 9, 1).unwrap();
        assert_eq!(t.shifted(TraitField::Prevalence, 2).prevalence, 9);
        assert_eq!(t.shifted(TraitField::Intensity, -2).intensity, 1);
        assert_eq!(t.shifted(TraitField::Intensity, 3).intensity, 4);
    }

    #[test]
    fn test_packed() {
        let t = Trait::new(TraitCode::Technology, 9, 3).unwrap();
        assert_eq!(t.packed(), 93);
    }
}
