//! Integration tests for the full world and NPC DNA pipeline.
//!
//! Exercises: generate → bias → resolve (thresholds → chain → evolve)
//! → encode → decode → record, plus the NPC line codec and operators.
//!
//! All tests are pure logic with seeded RNGs.

use std::collections::BTreeSet;

use dnaforge_logic::chain::{
    apply_chain_reactions, apply_chain_reactions_tracked, default_rules, ApplicationLedger,
    ChainReactionRule,
};
use dnaforge_logic::codec::{decode, decode_with, encode, DecodeOptions, Dialect};
use dnaforge_logic::error::{DecodeWarning, DnaError};
use dnaforge_logic::evolution::{evolve, EvolutionPattern, EvolutionSeries};
use dnaforge_logic::generation::{apply_bias, generate_npc, generate_world, TraitBias};
use dnaforge_logic::npc::{crossover_npc, decode_npc, encode_npc, mutate_npc, Alignment};
use dnaforge_logic::operators::{crossover, mutate, random_walk, CrossoverStrategy};
use dnaforge_logic::pipeline::{resolve_world, ResolveOptions};
use dnaforge_logic::record::{build_npc_record, build_world_record};
use dnaforge_logic::thresholds::{evaluate_thresholds, ThresholdId};
use dnaforge_logic::traits::{Trait, TraitCode, TraitField};
use dnaforge_logic::world::{DnaVersion, WorldDna};
use rand::rngs::StdRng;
use rand::SeedableRng;

// ── Helpers ────────────────────────────────────────────────────────────

const LEGACY_NPC_LINES: [&str; 2] = [
    "(7/3) 5B4,2R1,8L3,4F5,7S2,3P1,7D4,2G3,9Y5,1E2,6N3,4K2,6Z4,8O3,7C2,9R4,2A5,6D3,8A1,5I4 - H7,C3,K8,G2,L9,J4,M5,F6,E7,B3,U8,S2,I6,R7,T3,A9,D4,V5,Y2,X6",
    "(8/2) 7B5,3R2,9L4,8F2,6S3,4P5,8D2,3G4,8Y1,2E3,5N4,3K5,7Z1,9O2,8C3,7R5,3A2,7D4,9A5,4I1 - H2,C8,K3,G7,L2,J3,M2,F1,E3,B9,U7,S2,I3,R8,T1,A9,D2,V7,Y3,X8",
];

fn world(traits: &[(TraitCode, u8, u8)]) -> WorldDna {
    let traits = traits
        .iter()
        .map(|(c, p, i)| Trait::new(c.clone(), *p, *i).unwrap())
        .collect();
    WorldDna::new(DnaVersion::CURRENT, traits).unwrap()
}

fn assert_in_range(dna: &WorldDna) {
    for t in dna.traits() {
        assert!((1..=9).contains(&t.prevalence), "{} prevalence {}", t.code, t.prevalence);
        assert!((1..=5).contains(&t.intensity), "{} intensity {}", t.code, t.intensity);
    }
}

fn code_set(dna: &WorldDna) -> BTreeSet<TraitCode> {
    dna.trait_codes().cloned().collect()
}

/// Generate and fully resolve a world for `seed`.
fn resolved_world(seed: u64) -> WorldDna {
    let mut rng = StdRng::seed_from_u64(seed);
    let dna = generate_world(&mut rng);
    resolve_world(&dna, &default_rules(), ResolveOptions::default(), &mut rng)
        .unwrap()
        .dna
}

// ── Worked examples ────────────────────────────────────────────────────

#[test]
fn dense_two_digit_value_splits_into_prevalence_and_intensity() {
    let dna = decode("TRAITS{technology:93}", Dialect::Dense).unwrap();
    let t = dna.get(&TraitCode::Technology).unwrap();
    assert_eq!((t.prevalence, t.intensity), (9, 3));
}

#[test]
fn high_magic_triggers_on_boundary_values() {
    let dna = world(&[(TraitCode::Schools, 7, 1), (TraitCode::Artifacts, 2, 3)]);
    assert!(evaluate_thresholds(&dna).contains(&ThresholdId::HighMagic));
}

#[test]
fn random_walk_clips_at_ceiling() {
    let t = Trait::new(TraitCode::Religion, 9, 3).unwrap();
    assert_eq!(random_walk(&t, TraitField::Prevalence, 2).prevalence, 9);
}

#[test]
fn flat_declining_series_is_consistent_but_not_accelerating() {
    let text = "TRAITS { resources: prevalence=1, intensity=1 }
EVOLUTION {
  resources: DECLINING
    Time Periods:
      PAST: 12
      PRESENT: 11
      NEAR: 11
      FAR: 11
}
";
    let decoded = decode_with(text, &DecodeOptions::strict(Dialect::Verbose)).unwrap();
    assert!(decoded.is_clean());

    let accelerating = text.replace("DECLINING", "ACCELERATING");
    let decoded = decode_with(&accelerating, &DecodeOptions::strict(Dialect::Verbose)).unwrap();
    let warnings: Vec<_> = decoded.series_warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].trait_code, Some(TraitCode::Resources));
    assert_eq!(warnings[0].values, [12, 11, 11, 11]);
    // The series is still returned.
    assert_eq!(decoded.value.evolution()[&TraitCode::Resources].pattern, EvolutionPattern::Accelerating);
}

// ── Round trips ────────────────────────────────────────────────────────

#[test]
fn generated_worlds_round_trip_in_both_dialects() {
    for seed in 0..25 {
        let dna = resolved_world(seed);
        for dialect in [Dialect::Verbose, Dialect::Dense] {
            let text = encode(&dna, dialect);
            let back = decode(&text, dialect).unwrap();
            assert_eq!(back, dna, "seed {seed} {dialect:?}: {text}");
        }
    }
}

#[test]
fn lenient_pass_through_is_lossless() {
    let text = "V1.6 TRAITS{climate:55;mana_flux:73} THRESH{high_magic;eclipse}";
    let decoded = decode_with(text, &DecodeOptions::lenient(Dialect::Dense)).unwrap();
    assert_eq!(decoded.warnings.len(), 2);
    assert!(matches!(
        decoded.warnings[0],
        DecodeWarning::UnknownTraitRetained { ref code, .. } if code == "mana_flux"
    ));
    let again = encode(&decoded.value, Dialect::Dense);
    let back = decode_with(&again, &DecodeOptions::lenient(Dialect::Dense)).unwrap();
    assert_eq!(back.value, decoded.value);

    assert!(matches!(
        decode(text, Dialect::Dense),
        Err(DnaError::UnknownTrait { .. })
    ));
}

#[test]
fn dialects_describe_the_same_world() {
    let dna = resolved_world(7);
    let via_dense = decode(&encode(&dna, Dialect::Dense), Dialect::Dense).unwrap();
    let via_verbose = decode(&encode(&dna, Dialect::Verbose), Dialect::Verbose).unwrap();
    assert_eq!(via_dense, via_verbose);
}

#[test]
fn malformed_documents_are_position_anchored() {
    let err = decode("V1.6 TRAITS{climate:93;terrain 85}", Dialect::Dense).unwrap_err();
    assert!(err.offset().is_some());
    assert!(matches!(err, DnaError::Parse(_)));

    let err = decode("V1.6 TRAITS{climate:97}", Dialect::Dense).unwrap_err();
    assert!(matches!(err, DnaError::Validation { .. }));
    assert!(err.to_string().contains("byte"));
}

// ── Operators ──────────────────────────────────────────────────────────

#[test]
fn mutation_and_chain_reactions_stay_in_range() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..50 {
        let dna = generate_world(&mut rng);
        let mutated = mutate(&dna, &mut rng, 1.0);
        assert_in_range(&mutated);
        assert_eq!(code_set(&mutated), code_set(&dna));

        let chained = apply_chain_reactions(&mutated, &evaluate_thresholds(&mutated), &default_rules())
            .unwrap();
        assert_in_range(&chained);
    }
}

#[test]
fn mutation_leaves_derived_blocks_alone() {
    let dna = resolved_world(3);
    let mut rng = StdRng::seed_from_u64(42);
    let mutated = mutate(&dna, &mut rng, 1.0);
    assert_eq!(mutated.thresholds(), dna.thresholds());
    assert_eq!(mutated.evolution(), dna.evolution());
}

#[test]
fn crossover_closure_over_every_strategy() {
    let mut rng = StdRng::seed_from_u64(42);
    let a = generate_world(&mut rng).with_version(DnaVersion::new(1, 2));
    let b = generate_world(&mut rng);
    for strategy in [
        CrossoverStrategy::Uniform,
        CrossoverStrategy::WeightedByIntensity,
        CrossoverStrategy::Segment { block_len: 3 },
    ] {
        let child = crossover(&a, &b, &mut rng, strategy).unwrap();
        assert_in_range(&child);
        assert_eq!(code_set(&child), code_set(&a));
        assert_eq!(child.version(), DnaVersion::CURRENT);
        for t in child.traits() {
            assert!(a.get(&t.code) == Some(t) || b.get(&t.code) == Some(t));
        }
    }
}

#[test]
fn crossover_rejects_different_schemas() {
    let a = world(&[(TraitCode::Climate, 5, 3), (TraitCode::Trade, 5, 3)]);
    let b = world(&[(TraitCode::Climate, 5, 3), (TraitCode::Religion, 5, 3)]);
    let mut rng = StdRng::seed_from_u64(42);
    assert!(matches!(
        crossover(&a, &b, &mut rng, CrossoverStrategy::Uniform),
        Err(DnaError::SchemaMismatch(_))
    ));
}

#[test]
fn same_seed_same_offspring() {
    let a = resolved_world(1);
    let b = resolved_world(2);
    let run = || {
        let mut rng = StdRng::seed_from_u64(99);
        let child = crossover(&a, &b, &mut rng, CrossoverStrategy::Uniform).unwrap();
        mutate(&child, &mut rng, 0.5)
    };
    assert_eq!(run(), run());
}

// ── Thresholds and chain reactions ─────────────────────────────────────

#[test]
fn threshold_evaluation_is_pure() {
    let dna = resolved_world(11);
    assert_eq!(evaluate_thresholds(&dna), evaluate_thresholds(&dna));
}

#[test]
fn cyclic_rules_fire_once_per_pass_within_budget() {
    // schools feeds high_magic, which feeds schools again.
    let rules = vec![
        ChainReactionRule {
            max_applications: 2,
            ..ChainReactionRule::new(ThresholdId::HighMagic, TraitCode::Schools, 1)
        },
        ChainReactionRule {
            max_applications: 2,
            ..ChainReactionRule::new(ThresholdId::HighMagic, TraitCode::Schools, 1)
        },
    ];
    let dna = world(&[(TraitCode::Schools, 7, 2), (TraitCode::Artifacts, 4, 3)]);
    let mut ledger = ApplicationLedger::new();

    let mut current = dna;
    let mut prevalences = Vec::new();
    for _ in 0..4 {
        let triggered = evaluate_thresholds(&current);
        let (next, _) = apply_chain_reactions_tracked(&current, &triggered, &rules, &mut ledger).unwrap();
        prevalences.push(next.get(&TraitCode::Schools).unwrap().prevalence);
        current = next;
    }
    assert_eq!(prevalences, vec![8, 9, 9, 9]);
    assert_eq!(ledger.count(&ThresholdId::HighMagic, &TraitCode::Schools), 2);
}

// ── Evolution ──────────────────────────────────────────────────────────

#[test]
fn simulated_series_are_consistent_and_bounded() {
    let mut rng = StdRng::seed_from_u64(42);
    let patterns = [
        EvolutionPattern::Accelerating,
        EvolutionPattern::Declining,
        EvolutionPattern::Stabilizing,
        EvolutionPattern::Unstable,
    ];
    for _ in 0..20 {
        let dna = generate_world(&mut rng);
        for code in TraitCode::KNOWN {
            for pattern in patterns {
                let series: EvolutionSeries = evolve(&dna, &code, pattern, &mut rng).unwrap();
                assert!(series.is_consistent(), "{code} {pattern:?} {:?}", series.values);
                assert!(series.values.iter().all(|v| (1..=99).contains(v)));
                assert_eq!(series.present(), dna.get(&code).unwrap().packed());
            }
        }
    }
}

#[test]
fn evolving_a_missing_trait_fails() {
    let dna = world(&[(TraitCode::Climate, 5, 3)]);
    let mut rng = StdRng::seed_from_u64(42);
    assert!(matches!(
        evolve(&dna, &TraitCode::Trade, EvolutionPattern::Declining, &mut rng),
        Err(DnaError::MissingTrait { .. })
    ));
}

// ── Full pipeline ──────────────────────────────────────────────────────

#[test]
fn biased_world_resolves_into_magical_crisis() {
    let mut rng = StdRng::seed_from_u64(42);
    let dna = generate_world(&mut rng);
    let bias = [
        TraitBias {
            code: TraitCode::Schools,
            prevalence: 9,
            intensity: 0,
        },
        TraitBias {
            code: TraitCode::Artifacts,
            prevalence: 0,
            intensity: 5,
        },
    ];
    let biased = apply_bias(&dna, &bias);
    let resolved = resolve_world(&biased, &default_rules(), ResolveOptions::default(), &mut rng).unwrap();

    assert!(resolved.dna.thresholds().contains(&ThresholdId::HighMagic));
    assert!(resolved
        .applied
        .iter()
        .any(|r| r.trigger == ThresholdId::HighMagic && r.target == TraitCode::Stability));

    let text = resolved.encode(Dialect::Dense);
    let record = build_world_record(&decode(&text, Dialect::Dense).unwrap());
    assert!(record
        .triggered_thresholds
        .iter()
        .any(|t| t.id == "high_magic"));
    assert_eq!(record.per_trait.len(), TraitCode::KNOWN.len());
    assert_eq!(record.evolution_summary.len(), resolved.dna.evolution().len());
    assert!(record.to_json().unwrap().contains("\"primary_scales\""));
}

// ── NPC personalities ──────────────────────────────────────────────────

#[test]
fn legacy_npc_lines_round_trip() {
    for line in LEGACY_NPC_LINES {
        let npc = decode_npc(line).unwrap();
        assert_eq!(npc.paired().len(), 20);
        assert_eq!(npc.unpaired().len(), 20);
        assert_eq!(encode_npc(&npc), line);
    }
}

#[test]
fn legacy_headers_are_kept_until_an_operator_runs() {
    let npc = decode_npc(LEGACY_NPC_LINES[1]).unwrap();
    assert_eq!(npc.alignment(), Alignment { lnc_avg: 8, gne_avg: 2 });
    // 120 / 20 = 6; 90 / 20 = 4.5 rounds up.
    assert_eq!(npc.derived_alignment(), Alignment { lnc_avg: 6, gne_avg: 5 });

    let mut rng = StdRng::seed_from_u64(42);
    let child = mutate_npc(&npc, &mut rng, 0.0);
    assert_eq!(child.alignment(), Alignment { lnc_avg: 6, gne_avg: 5 });
}

#[test]
fn npc_operators_keep_ranges_and_derive_alignment() {
    let mut rng = StdRng::seed_from_u64(42);
    let a = decode_npc(LEGACY_NPC_LINES[0]).unwrap();
    let b = decode_npc(LEGACY_NPC_LINES[1]).unwrap();

    let child = crossover_npc(&a, &b, &mut rng, CrossoverStrategy::WeightedByIntensity);
    let child = match child {
        Ok(child) => child,
        Err(DnaError::SchemaMismatch(_)) => panic!("legacy lines share a layout"),
        Err(other) => panic!("unexpected error: {other}"),
    };
    let mutated = mutate_npc(&child, &mut rng, 1.0);
    for t in mutated.paired() {
        assert!((1..=9).contains(&t.prevalence) && (1..=5).contains(&t.intensity));
    }
    for v in mutated.unpaired() {
        assert!((1..=9).contains(&v.score));
    }
    assert!(mutated.alignment_is_current());

    let reread = decode_npc(&encode_npc(&mutated)).unwrap();
    assert_eq!(reread, mutated);
}

#[test]
fn generated_npc_produces_full_record() {
    let mut rng = StdRng::seed_from_u64(42);
    let npc = generate_npc(&mut rng);
    let record = build_npc_record(&npc);
    assert_eq!(record.paired.len(), 13);
    assert_eq!(record.alignment.stored, record.alignment.derived);
    assert!(record.paired.iter().all(|p| p.opposite.is_some()));
    let json = record.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["unpaired"].as_array().is_some());
}
