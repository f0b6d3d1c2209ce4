//! World DNA text codec.
//!
//! Two dialects, always chosen explicitly by the caller:
//!
//! | Dialect | Shape |
//! |---------|-------|
//! | [`Dialect::Verbose`] | `World DNA Version: 1.6` / `TRAITS { climate: prevalence=9, intensity=3 ... }` / `THRESHOLDS { ... }` / `EVOLUTION { ... }` |
//! | [`Dialect::Dense`] | `V1.6 TRAITS{climate:93;...} THRESH{high_magic;...} EVO{climate:DECLINING[94,93,91,87];...}` |
//!
//! Decoding is all-or-nothing: the first grammar or range problem aborts with a
//! byte-anchored [`DnaError`]. Evolution series that do not match their pattern
//! decode fine and come back as warnings.

mod cursor;
mod dense;
mod verbose;

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{DecodeWarning, DnaError, DnaResult, Decoded};
use crate::evolution::{EvolutionPattern, EvolutionSeries};
use crate::thresholds::ThresholdId;
use crate::traits::{check_range, RangeKind, Trait, TraitCode};
use crate::world::{DnaVersion, WorldDna};

pub(crate) use cursor::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Verbose,
    Dense,
}

/// How unregistered trait codes and threshold ids are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMode {
    /// Unknown codes are errors.
    #[default]
    Strict,
    /// Unknown codes are kept as pass-through values and reported as warnings.
    Lenient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecodeOptions {
    pub dialect: Dialect,
    pub mode: DecodeMode,
}

impl DecodeOptions {
    pub fn strict(dialect: Dialect) -> Self {
        Self {
            dialect,
            mode: DecodeMode::Strict,
        }
    }

    pub fn lenient(dialect: Dialect) -> Self {
        Self {
            dialect,
            mode: DecodeMode::Lenient,
        }
    }
}

/// Strict decode. Consistency warnings are logged and dropped; use
/// [`decode_with`] to receive them.
pub fn decode(text: &str, dialect: Dialect) -> DnaResult<WorldDna> {
    let decoded = decode_with(text, &DecodeOptions::strict(dialect))?;
    for w in &decoded.warnings {
        log::warn!("world dna: {}", w);
    }
    Ok(decoded.value)
}

pub fn decode_with(text: &str, options: &DecodeOptions) -> DnaResult<Decoded<WorldDna>> {
    let mut doc = DocumentBuilder::new(options.mode);
    let version = match options.dialect {
        Dialect::Verbose => verbose::parse(text, &mut doc)?,
        Dialect::Dense => dense::parse(text, &mut doc)?,
    };
    Ok(doc.finish(version))
}

/// Render `dna` in the requested dialect. The output always decodes back to
/// an equal value with the same dialect.
pub fn encode(dna: &WorldDna, dialect: Dialect) -> String {
    match dialect {
        Dialect::Verbose => verbose::render(dna),
        Dialect::Dense => dense::render(dna),
    }
}

/// Dialect-independent assembly of a decoded document.
///
/// The grammar modules only tokenize; name resolution, range checks,
/// uniqueness and consistency warnings all live here so both dialects agree.
pub(crate) struct DocumentBuilder {
    mode: DecodeMode,
    traits: Vec<Trait>,
    seen: HashSet<TraitCode>,
    thresholds: BTreeSet<ThresholdId>,
    evolution: BTreeMap<TraitCode, EvolutionSeries>,
    warnings: Vec<DecodeWarning>,
}

impl DocumentBuilder {
    pub fn new(mode: DecodeMode) -> Self {
        Self {
            mode,
            traits: Vec::new(),
            seen: HashSet::new(),
            thresholds: BTreeSet::new(),
            evolution: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn trait_code(&mut self, name: &str, offset: usize) -> DnaResult<TraitCode> {
        if let Some(code) = TraitCode::parse_known(name) {
            return Ok(code);
        }
        match self.mode {
            DecodeMode::Strict => Err(DnaError::UnknownTrait {
                code: name.to_string(),
                offset,
            }),
            DecodeMode::Lenient => {
                self.warnings.push(DecodeWarning::UnknownTraitRetained {
                    code: name.to_string(),
                    offset,
                });
                Ok(TraitCode::Unknown(name.to_string()))
            }
        }
    }

    pub fn push_trait(
        &mut self,
        code: TraitCode,
        prevalence: (usize, i64),
        intensity: (usize, i64),
    ) -> DnaResult<()> {
        let p = check_range(prevalence.1, RangeKind::Prevalence).map_err(|e| {
            DnaError::validation(format!("prevalence of `{}`", code), prevalence.0, e)
        })?;
        let i = check_range(intensity.1, RangeKind::Intensity).map_err(|e| {
            DnaError::validation(format!("intensity of `{}`", code), intensity.0, e)
        })?;
        if !self.seen.insert(code.clone()) {
            return Err(DnaError::DuplicateTrait {
                code: code.to_string(),
            });
        }
        self.traits.push(Trait {
            code,
            prevalence: p,
            intensity: i,
        });
        Ok(())
    }

    pub fn push_threshold(&mut self, name: &str, offset: usize) -> DnaResult<()> {
        let id = match ThresholdId::parse_known(name) {
            Some(id) => id,
            None => match self.mode {
                DecodeMode::Strict => {
                    return Err(DnaError::UnknownThreshold {
                        id: name.to_string(),
                        offset,
                    })
                }
                DecodeMode::Lenient => {
                    self.warnings.push(DecodeWarning::UnknownThresholdRetained {
                        id: name.to_string(),
                        offset,
                    });
                    ThresholdId::Unknown(name.to_string())
                }
            },
        };
        self.thresholds.insert(id);
        Ok(())
    }

    pub fn push_series(
        &mut self,
        code: TraitCode,
        pattern: EvolutionPattern,
        values: [(usize, i64); 4],
    ) -> DnaResult<()> {
        let mut checked = [0u8; 4];
        for (slot, (offset, raw)) in checked.iter_mut().zip(values) {
            *slot = check_range(raw, RangeKind::EvolutionValue).map_err(|e| {
                DnaError::validation(format!("evolution value of `{}`", code), offset, e)
            })?;
        }
        if self.evolution.contains_key(&code) {
            return Err(DnaError::DuplicateTrait {
                code: code.to_string(),
            });
        }
        let series = EvolutionSeries {
            pattern,
            values: checked,
        };
        if let Err(mut warning) = series.check_consistency() {
            warning.trait_code = Some(code.clone());
            self.warnings.push(warning.into());
        }
        self.evolution.insert(code, series);
        Ok(())
    }

    pub fn finish(self, version: DnaVersion) -> Decoded<WorldDna> {
        Decoded {
            value: WorldDna::from_parts(version, self.traits, self.thresholds, self.evolution),
            warnings: self.warnings,
        }
    }
}

/// `<major>.<minor>` as written after the version marker.
pub(crate) fn parse_version(cur: &mut Cursor<'_>) -> DnaResult<DnaVersion> {
    let (start, major) = cur.number()?;
    cur.expect_char('.')?;
    let (_, minor) = cur.number()?;
    match (u16::try_from(major), u16::try_from(minor)) {
        (Ok(major), Ok(minor)) => Ok(DnaVersion::new(major, minor)),
        _ => Err(cur.error_at(start, "version `<major>.<minor>`").into()),
    }
}

/// Resolve a pattern name at `offset`. Unknown names are grammar errors in
/// either mode.
pub(crate) fn parse_pattern(cur: &Cursor<'_>, name: &str, offset: usize) -> DnaResult<EvolutionPattern> {
    EvolutionPattern::parse(name).ok_or_else(|| {
        cur.error_at(
            offset,
            "evolution pattern (ACCELERATING, DECLINING, UNSTABLE, STABILIZING)",
        )
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_and_lenient_disagree_on_unknown_codes() {
        let text = "TRAITS{weather_gods:42}";
        let err = decode(text, Dialect::Dense).unwrap_err();
        assert!(matches!(err, DnaError::UnknownTrait { ref code, offset: 7 } if code == "weather_gods"));

        let decoded = decode_with(text, &DecodeOptions::lenient(Dialect::Dense)).unwrap();
        assert_eq!(
            decoded.value.traits()[0].code,
            TraitCode::Unknown("weather_gods".into())
        );
        assert_eq!(decoded.warnings.len(), 1);
        assert_eq!(encode(&decoded.value, Dialect::Dense), "V1.0 TRAITS{weather_gods:42}");
    }

    #[test]
    fn test_unknown_threshold_handling() {
        let text = "TRAITS{climate:11} THRESH{doom}";
        assert!(matches!(
            decode(text, Dialect::Dense),
            Err(DnaError::UnknownThreshold { .. })
        ));
        let decoded = decode_with(text, &DecodeOptions::lenient(Dialect::Dense)).unwrap();
        assert!(decoded
            .value
            .thresholds()
            .contains(&ThresholdId::Unknown("doom".into())));
    }

    #[test]
    fn test_series_warning_carries_trait_code() {
        let text = "TRAITS{resources:11} EVO{resources:ACCELERATING[12,11,11,11]}";
        let decoded = decode_with(text, &DecodeOptions::strict(Dialect::Dense)).unwrap();
        let warnings: Vec<_> = decoded.series_warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].trait_code, Some(TraitCode::Resources));
        assert_eq!(
            decoded.value.evolution()[&TraitCode::Resources].values,
            [12, 11, 11, 11]
        );
    }

    #[test]
    fn test_duplicate_trait_is_rejected() {
        let err = decode("TRAITS{climate:11;climate:22}", Dialect::Dense).unwrap_err();
        assert!(matches!(err, DnaError::DuplicateTrait { .. }));
    }

    #[test]
    fn test_dialect_serde_names() {
        assert_eq!(serde_json::to_string(&Dialect::Dense).unwrap(), "\"dense\"");
        let mode: DecodeMode = serde_json::from_str("\"lenient\"").unwrap();
        assert_eq!(mode, DecodeMode::Lenient);
    }
}
