//! Decode records: the structured, label-only reading of a resolved DNA that
//! downstream text generation consumes. No prose is produced here.

use serde::{Deserialize, Serialize};

use crate::evolution::EvolutionPattern;
use crate::generation::{trend_of, Trend};
use crate::npc::{Alignment, NpcPersonalityDna};
use crate::thresholds::definition;
use crate::traits::{TraitCategory, TraitCode};
use crate::world::WorldDna;

/// Three-way band over a 1–9 scale (or 1–5 for intensity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Band {
    Low,
    Moderate,
    High,
}

impl Band {
    pub fn of_prevalence(value: u8) -> Band {
        match value {
            0..=3 => Band::Low,
            4..=6 => Band::Moderate,
            _ => Band::High,
        }
    }

    pub fn of_intensity(value: u8) -> Band {
        match value {
            0..=2 => Band::Low,
            3 => Band::Moderate,
            _ => Band::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleReading {
    pub value: u8,
    pub band: Band,
}

impl ScaleReading {
    fn new(value: u8) -> Self {
        Self {
            value,
            band: Band::of_prevalence(value),
        }
    }
}

/// Headline scales; `None` when the contributing traits are absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryScales {
    pub technology: Option<ScaleReading>,
    pub magic: Option<ScaleReading>,
    pub authority: Option<ScaleReading>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitReading {
    pub code: String,
    pub category: Option<TraitCategory>,
    pub prevalence: u8,
    pub intensity: u8,
    pub prevalence_band: Band,
    pub intensity_band: Band,
    pub trend: Option<Trend>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdReading {
    pub id: String,
    pub conditions: Vec<String>,
    /// Whether the conditions still hold on the final values; `None` for ids
    /// outside the registry.
    pub still_satisfied: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionReading {
    pub code: String,
    pub pattern: EvolutionPattern,
    pub values: [u8; 4],
    pub net_change: i16,
    pub consistent: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub rising: Vec<String>,
    pub falling: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldDecodeRecord {
    pub version: String,
    pub primary_scales: PrimaryScales,
    pub per_trait: Vec<TraitReading>,
    pub triggered_thresholds: Vec<ThresholdReading>,
    pub evolution_summary: Vec<EvolutionReading>,
    pub trends: TrendSummary,
}

impl WorldDecodeRecord {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn mean_rounded(values: &[u8]) -> Option<u8> {
    if values.is_empty() {
        return None;
    }
    let sum: u32 = values.iter().map(|&v| v as u32).sum();
    let n = values.len() as u32;
    Some(((2 * sum + n) / (2 * n)) as u8)
}

pub fn build_world_record(dna: &WorldDna) -> WorldDecodeRecord {
    let prevalence_of = |code: TraitCode| dna.get(&code).map(|t| ScaleReading::new(t.prevalence));
    let magical: Vec<u8> = dna
        .traits()
        .iter()
        .filter(|t| t.code.category() == Some(TraitCategory::Magical))
        .map(|t| t.prevalence)
        .collect();

    let primary_scales = PrimaryScales {
        technology: prevalence_of(TraitCode::Technology),
        magic: mean_rounded(&magical).map(ScaleReading::new),
        authority: prevalence_of(TraitCode::Government),
    };

    let mut trends = TrendSummary::default();
    let per_trait = dna
        .traits()
        .iter()
        .map(|t| {
            let trend = trend_of(t);
            match trend {
                Some(Trend::Rising) => trends.rising.push(t.code.to_string()),
                Some(Trend::Falling) => trends.falling.push(t.code.to_string()),
                None => {}
            }
            TraitReading {
                code: t.code.to_string(),
                category: t.code.category(),
                prevalence: t.prevalence,
                intensity: t.intensity,
                prevalence_band: Band::of_prevalence(t.prevalence),
                intensity_band: Band::of_intensity(t.intensity),
                trend,
            }
        })
        .collect();

    let triggered_thresholds = dna
        .thresholds()
        .iter()
        .map(|id| match definition(id) {
            Some(def) => ThresholdReading {
                id: id.to_string(),
                conditions: def.conditions.iter().map(|c| c.to_string()).collect(),
                still_satisfied: Some(def.is_met(dna)),
            },
            None => ThresholdReading {
                id: id.to_string(),
                conditions: Vec::new(),
                still_satisfied: None,
            },
        })
        .collect();

    let evolution_summary = dna
        .evolution()
        .iter()
        .map(|(code, s)| EvolutionReading {
            code: code.to_string(),
            pattern: s.pattern,
            values: s.values,
            net_change: s.net_change(),
            consistent: s.is_consistent(),
        })
        .collect();

    WorldDecodeRecord {
        version: dna.version().to_string(),
        primary_scales,
        per_trait,
        triggered_thresholds,
        evolution_summary,
        trends,
    }
}

const TERRAINS: [&str; 11] = [
    "mountains",
    "forests",
    "plains",
    "desert",
    "arctic",
    "coastal",
    "islands",
    "jungle",
    "swamp",
    "underground",
    "mixed",
];

const CLIMATES: [&str; 6] = ["tropical", "arid", "temperate", "cold", "arctic", "varied"];

/// The five-component label set older world records were keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedTraits {
    pub climate: String,
    pub terrain: String,
    pub resources: String,
    pub conflict: String,
    pub hazards: String,
}

/// Simplified label for one trait, or `None` if the trait has no simplified
/// component.
///
/// Terrain and climate index their label tables by prevalence (wrapping);
/// the others are banded.
pub fn simplified_label(code: &TraitCode, prevalence: u8, intensity: u8) -> Option<&'static str> {
    let label = match code {
        TraitCode::Terrain => TERRAINS[prevalence as usize % TERRAINS.len()],
        TraitCode::Climate => CLIMATES[prevalence as usize % CLIMATES.len()],
        TraitCode::Resources => match prevalence {
            7.. => "abundant",
            4..=6 => "balanced",
            _ => "scarce",
        },
        TraitCode::Conflict => match prevalence {
            7.. if intensity >= 4 => "open_war",
            5.. => "skirmishes",
            3..=4 => "cold_war",
            _ => "peace",
        },
        TraitCode::Hazards => match prevalence {
            7.. => "deadly",
            4..=6 => "dangerous",
            _ => "safe",
        },
        _ => return None,
    };
    Some(label)
}

/// Map a DNA onto the simplified components. Missing traits get the neutral
/// default for their component.
pub fn simplified_traits(dna: &WorldDna) -> SimplifiedTraits {
    let label = |code: TraitCode, default: &str| -> String {
        dna.get(&code)
            .and_then(|t| simplified_label(&t.code, t.prevalence, t.intensity))
            .unwrap_or(default)
            .to_string()
    };
    SimplifiedTraits {
        climate: label(TraitCode::Climate, "temperate"),
        terrain: label(TraitCode::Terrain, "mixed"),
        resources: label(TraitCode::Resources, "balanced"),
        conflict: label(TraitCode::Conflict, "peace"),
        hazards: label(TraitCode::Hazards, "safe"),
    }
}

pub fn lnc_label(value: u8) -> &'static str {
    match value {
        1 => "Highly Chaotic",
        2 => "Very Chaotic",
        3 => "Chaotic",
        4 => "Somewhat Chaotic",
        5 => "Neutral",
        6 => "Somewhat Lawful",
        7 => "Lawful",
        8 => "Very Lawful",
        _ => "Highly Lawful",
    }
}

pub fn gne_label(value: u8) -> &'static str {
    match value {
        1 => "Highly Evil",
        2 => "Very Evil",
        3 => "Evil",
        4 => "Somewhat Evil",
        5 => "Neutral",
        6 => "Somewhat Good",
        7 => "Good",
        8 => "Very Good",
        _ => "Highly Good",
    }
}

pub fn intensity_label(intensity: u8) -> &'static str {
    match intensity {
        1 => "Subtle",
        2 => "Moderate",
        3 => "Strong",
        4 => "Defining",
        _ => "Overwhelming",
    }
}

pub fn strength_label(score: u8) -> &'static str {
    match score {
        0..=2 => "Minimal",
        3..=4 => "Moderate",
        5..=6 => "Strong",
        _ => "Very Strong",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentReading {
    pub stored: Alignment,
    pub derived: Alignment,
    pub lnc: String,
    pub gne: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedReading {
    pub code: char,
    pub pole: String,
    pub opposite: Option<String>,
    pub prevalence: u8,
    pub intensity: u8,
    pub intensity_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueReading {
    pub code: char,
    pub name: String,
    pub score: u8,
    pub strength: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcDecodeRecord {
    pub alignment: AlignmentReading,
    pub paired: Vec<PairedReading>,
    pub unpaired: Vec<ValueReading>,
}

impl NpcDecodeRecord {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn build_npc_record(dna: &NpcPersonalityDna) -> NpcDecodeRecord {
    let stored = dna.alignment();
    NpcDecodeRecord {
        alignment: AlignmentReading {
            stored,
            derived: dna.derived_alignment(),
            lnc: lnc_label(stored.lnc_avg).to_string(),
            gne: gne_label(stored.gne_avg).to_string(),
        },
        paired: dna
            .paired()
            .iter()
            .map(|t| PairedReading {
                code: t.code.letter(),
                pole: t.code.name().to_string(),
                opposite: t.code.opposite().map(|o| o.name().to_string()),
                prevalence: t.prevalence,
                intensity: t.intensity,
                intensity_label: intensity_label(t.intensity).to_string(),
            })
            .collect(),
        unpaired: dna
            .unpaired()
            .iter()
            .map(|v| ValueReading {
                code: v.code.letter(),
                name: v.code.name().to_string(),
                score: v.score,
                strength: strength_label(v.score).to_string(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, Dialect};
    use crate::npc::decode_npc;

    #[test]
    fn test_world_record_scales_and_thresholds() {
        let dna = decode(
            "V1.6 TRAITS{technology:84;government:21;intensity:93;prevalence:72;schools:75;artifacts:13} \
             THRESH{high_magic} EVO{technology:ACCELERATING[80,84,92,99]}",
            Dialect::Dense,
        )
        .unwrap();
        let record = build_world_record(&dna);

        assert_eq!(record.version, "1.6");
        assert_eq!(record.primary_scales.technology, Some(ScaleReading { value: 8, band: Band::High }));
        // (9 + 7 + 7 + 1) / 4 = 6
        assert_eq!(record.primary_scales.magic, Some(ScaleReading { value: 6, band: Band::Moderate }));
        assert_eq!(record.primary_scales.authority.map(|s| s.band), Some(Band::Low));

        assert_eq!(record.triggered_thresholds.len(), 1);
        let t = &record.triggered_thresholds[0];
        assert_eq!(t.id, "high_magic");
        assert_eq!(t.conditions, vec!["schools.prevalence >= 7", "artifacts.intensity >= 3"]);
        assert_eq!(t.still_satisfied, Some(true));

        assert_eq!(record.evolution_summary[0].net_change, 19);
        assert!(record.evolution_summary[0].consistent);

        assert_eq!(record.trends.rising, vec!["technology", "schools"]);
        assert_eq!(record.trends.falling, vec!["government"]);
    }

    #[test]
    fn test_world_record_json_keys() {
        let dna = decode("TRAITS{climate:55}", Dialect::Dense).unwrap();
        let json = build_world_record(&dna).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        for key in ["primary_scales", "per_trait", "triggered_thresholds", "evolution_summary"] {
            assert!(value.get(key).is_some(), "{key}");
        }
        assert!(value["primary_scales"]["technology"].is_null());
    }

    #[test]
    fn test_npc_record_labels() {
        let npc = decode_npc("(7/3) 5B4,2R1 - H7,C3").unwrap();
        let record = build_npc_record(&npc);
        assert_eq!(record.alignment.lnc, "Lawful");
        assert_eq!(record.alignment.gne, "Evil");
        assert_eq!(record.alignment.derived, Alignment { lnc_avg: 4, gne_avg: 5 });
        assert_eq!(record.paired[0].pole, "Brave");
        assert_eq!(record.paired[0].opposite.as_deref(), Some("Cautious"));
        assert_eq!(record.paired[0].intensity_label, "Defining");
        assert_eq!(record.unpaired[0].strength, "Very Strong");
        assert_eq!(record.unpaired[1].strength, "Moderate");
    }

    #[test]
    fn test_strength_bands() {
        assert_eq!(strength_label(1), "Minimal");
        assert_eq!(strength_label(5), "Strong");
        assert_eq!(strength_label(9), "Very Strong");
    }

    #[test]
    fn test_simplified_traits_from_dense_sample() {
        let dna = decode(
            "V1.6 TRAITS{climate:93;terrain:85;resources:62;hazards:33;conflict:74}",
            Dialect::Dense,
        )
        .unwrap();
        let simple = simplified_traits(&dna);
        assert_eq!(
            simple,
            SimplifiedTraits {
                climate: "cold".into(),
                terrain: "swamp".into(),
                resources: "balanced".into(),
                conflict: "open_war".into(),
                hazards: "safe".into(),
            }
        );
    }

    #[test]
    fn test_simplified_label_bands() {
        let conflict = |p, i| simplified_label(&TraitCode::Conflict, p, i);
        assert_eq!(conflict(7, 3), Some("skirmishes"));
        assert_eq!(conflict(5, 5), Some("skirmishes"));
        assert_eq!(conflict(4, 5), Some("cold_war"));
        assert_eq!(conflict(2, 5), Some("peace"));

        assert_eq!(simplified_label(&TraitCode::Resources, 7, 1), Some("abundant"));
        assert_eq!(simplified_label(&TraitCode::Resources, 3, 5), Some("scarce"));
        assert_eq!(simplified_label(&TraitCode::Hazards, 4, 1), Some("dangerous"));
        assert_eq!(simplified_label(&TraitCode::Climate, 6, 1), Some("tropical"));
        assert_eq!(simplified_label(&TraitCode::Terrain, 1, 1), Some("forests"));
        assert_eq!(simplified_label(&TraitCode::Trade, 9, 5), None);
    }

    #[test]
    fn test_simplified_defaults_for_missing_traits() {
        let dna = decode("TRAITS{trade:55}", Dialect::Dense).unwrap();
        let simple = simplified_traits(&dna);
        assert_eq!(simple.climate, "temperate");
        assert_eq!(simple.terrain, "mixed");
        assert_eq!(simple.resources, "balanced");
        assert_eq!(simple.conflict, "peace");
        assert_eq!(simple.hazards, "safe");
    }
}
