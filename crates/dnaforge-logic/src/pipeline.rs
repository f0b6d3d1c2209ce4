//! World resolution: thresholds, chain reactions, then evolution.
//!
//! Thresholds are recorded as they stood before the chain pass. Patterns are
//! suggested from the post-chain trait values, so a reaction that pushes a
//! trait into a new band changes how it evolves.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::chain::{
    apply_chain_reactions_tracked, AppliedReaction, ApplicationLedger, ChainReactionRule,
};
use crate::codec::{encode, Dialect};
use crate::error::DnaResult;
use crate::evolution::{evolve, EvolutionPattern};
use crate::generation::suggest_pattern;
use crate::record::{build_world_record, WorldDecodeRecord};
use crate::thresholds::evaluate_thresholds;
use crate::world::WorldDna;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolveOptions {
    /// Only evolve traits whose suggested pattern is ACCELERATING or DECLINING.
    pub significant_only: bool,
}

/// A fully resolved world plus the reactions that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWorld {
    pub dna: WorldDna,
    pub applied: Vec<AppliedReaction>,
}

impl ResolvedWorld {
    pub fn record(&self) -> WorldDecodeRecord {
        build_world_record(&self.dna)
    }

    pub fn encode(&self, dialect: Dialect) -> String {
        encode(&self.dna, dialect)
    }
}

fn is_significant(pattern: EvolutionPattern) -> bool {
    matches!(
        pattern,
        EvolutionPattern::Accelerating | EvolutionPattern::Declining
    )
}

/// Resolve a world's derived blocks from its traits.
///
/// Any thresholds or evolution already present on `dna` are discarded.
pub fn resolve_world(
    dna: &WorldDna,
    rules: &[ChainReactionRule],
    options: ResolveOptions,
    rng: &mut impl Rng,
) -> DnaResult<ResolvedWorld> {
    let bare = dna.bare();
    let triggered = evaluate_thresholds(&bare);

    let mut ledger = ApplicationLedger::new();
    let (chained, applied) = apply_chain_reactions_tracked(&bare, &triggered, rules, &mut ledger)?;
    let mut resolved = chained.with_thresholds(triggered)?;

    for t in chained.traits() {
        let Some(pattern) = suggest_pattern(t) else {
            continue;
        };
        if options.significant_only && !is_significant(pattern) {
            continue;
        }
        let series = evolve(&chained, &t.code, pattern, rng)?;
        resolved = resolved.with_evolution(t.code.clone(), series)?;
    }

    log::debug!(
        "resolved world: {} thresholds, {} reactions, {} series",
        resolved.thresholds().len(),
        applied.len(),
        resolved.evolution().len()
    );
    Ok(ResolvedWorld {
        dna: resolved,
        applied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::default_rules;
    use crate::thresholds::ThresholdId;
    use crate::traits::{Trait, TraitCode};
    use crate::world::DnaVersion;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn world(traits: &[(TraitCode, u8, u8)]) -> WorldDna {
        let traits = traits
            .iter()
            .map(|(c, p, i)| Trait::new(c.clone(), *p, *i).unwrap())
            .collect();
        WorldDna::new(DnaVersion::CURRENT, traits).unwrap()
    }

    fn crisis_world() -> WorldDna {
        world(&[
            (TraitCode::Schools, 8, 4),
            (TraitCode::Artifacts, 5, 3),
            (TraitCode::Stability, 2, 2),
            (TraitCode::Conflict, 6, 3),
            (TraitCode::Trade, 5, 3),
            (TraitCode::Society, 5, 3),
        ])
    }

    #[test]
    fn test_thresholds_recorded_before_chain() {
        let mut rng = StdRng::seed_from_u64(42);
        let resolved = resolve_world(
            &crisis_world(),
            &default_rules(),
            ResolveOptions::default(),
            &mut rng,
        )
        .unwrap();

        assert!(resolved.dna.thresholds().contains(&ThresholdId::HighMagic));
        assert!(resolved.dna.thresholds().contains(&ThresholdId::Unstable));
        // high_magic: -2 then clipped; unstable rules: trade -2, society +1 -2.
        assert_eq!(resolved.dna.get(&TraitCode::Stability).unwrap().prevalence, 1);
        assert_eq!(resolved.dna.get(&TraitCode::Trade).unwrap().prevalence, 3);
        assert_eq!(resolved.dna.get(&TraitCode::Society).unwrap().prevalence, 4);
        assert_eq!(resolved.dna.get(&TraitCode::Artifacts).unwrap().prevalence, 7);
        assert_eq!(resolved.applied.len(), 5);
    }

    #[test]
    fn test_significant_only_filters_patterns() {
        let dna = world(&[(TraitCode::Religion, 8, 5), (TraitCode::Climate, 5, 4)]);

        let mut rng = StdRng::seed_from_u64(42);
        let all = resolve_world(&dna, &[], ResolveOptions::default(), &mut rng).unwrap();
        assert_eq!(all.dna.evolution().len(), 2);
        assert_eq!(
            all.dna.evolution()[&TraitCode::Climate].pattern,
            EvolutionPattern::Unstable
        );

        let significant = resolve_world(
            &dna,
            &[],
            ResolveOptions {
                significant_only: true,
            },
            &mut StdRng::seed_from_u64(42),
        )
        .unwrap();
        assert_eq!(significant.dna.evolution().len(), 1);
        let series = significant.dna.evolution()[&TraitCode::Religion];
        assert_eq!(series.pattern, EvolutionPattern::Accelerating);
        assert_eq!(series.present(), 85);
        assert!(series.is_consistent());
    }

    #[test]
    fn test_existing_derived_blocks_are_replaced() {
        let dna = world(&[(TraitCode::Climate, 5, 3)])
            .with_thresholds([ThresholdId::Advanced].into())
            .unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let resolved =
            resolve_world(&dna, &default_rules(), ResolveOptions::default(), &mut rng).unwrap();
        assert!(resolved.dna.thresholds().is_empty());
        assert!(resolved.dna.evolution().is_empty());
        assert!(resolved.applied.is_empty());
    }

    #[test]
    fn test_resolved_world_encodes_and_records() {
        let mut rng = StdRng::seed_from_u64(42);
        let options = ResolveOptions::default();
        let resolved = resolve_world(&crisis_world(), &default_rules(), options, &mut rng).unwrap();
        let text = resolved.encode(Dialect::Dense);
        assert!(text.contains("THRESH{high_magic;unstable}"));
        let record = resolved.record();
        assert_eq!(record.triggered_thresholds.len(), 2);
    }
}
