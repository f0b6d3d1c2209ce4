//! DNA Engine Headless Validation Harness
//!
//! Validates the codec, operators and evolution engine against fixture data.
//! Runs entirely in-process: no I/O beyond the embedded fixtures.
//!
//! Usage:
//!   cargo run -p dnaforge-simtest
//!   cargo run -p dnaforge-simtest -- --verbose

use dnaforge_logic::chain::{
    apply_chain_reactions_tracked, default_rules, ApplicationLedger, ChainReactionRule,
};
use dnaforge_logic::codec::{decode, decode_with, encode, DecodeMode, DecodeOptions, Dialect};
use dnaforge_logic::config::{validate_config, EngineConfig};
use dnaforge_logic::generation::{apply_bias, generate_npc, generate_world, identify_trends, TraitBias};
use dnaforge_logic::npc::{crossover_npc, decode_npc, encode_npc, mutate_npc};
use dnaforge_logic::operators::{crossover, mutate, CrossoverStrategy};
use dnaforge_logic::pipeline::resolve_world;
use dnaforge_logic::record::{build_npc_record, build_world_record, simplified_traits};
use dnaforge_logic::thresholds::{evaluate_thresholds, ThresholdId};
use dnaforge_logic::traits::TraitCode;
use dnaforge_logic::world::WorldDna;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

// ── Fixtures ────────────────────────────────────────────────────────────
const CONFIG_JSON: &str = include_str!("../../../data/engine_config.json");
const SAMPLES_JSON: &str = include_str!("../../../data/sample_dna.json");

#[derive(Debug, Deserialize)]
struct SampleSet {
    worlds: Vec<WorldSample>,
    npcs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WorldSample {
    name: String,
    dialect: Dialect,
    decode_mode: DecodeMode,
    text: String,
    series_warnings: usize,
}

/// Seeds swept by the generation and operator checks.
const SWEEP_SEEDS: u64 = 200;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== DNA Engine Validation Harness ===\n");

    let mut results = Vec::new();

    // 1. Engine configuration fixture
    let config = match load_config(&mut results) {
        Some(config) => config,
        None => EngineConfig::default(),
    };

    // 2. World DNA fixtures
    results.extend(validate_world_samples(verbose));

    // 3. NPC DNA fixtures
    results.extend(validate_npc_samples(verbose));

    // 4. Generate → resolve → encode → decode sweep
    results.extend(validate_generation_sweep(&config, verbose));

    // 5. Operator closure
    results.extend(validate_operators(&config, verbose));

    // 6. Chain-reaction termination
    results.extend(validate_chain_termination(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Configuration ────────────────────────────────────────────────────

fn load_config(results: &mut Vec<TestResult>) -> Option<EngineConfig> {
    println!("--- Engine Configuration ---");

    let config: EngineConfig = match serde_json::from_str(CONFIG_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult {
                name: "config_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            return None;
        }
    };

    let errors = validate_config(&config);
    results.push(TestResult {
        name: "config_valid".into(),
        passed: errors.is_empty(),
        detail: if errors.is_empty() {
            "no configuration errors".into()
        } else {
            errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        },
    });

    results.push(TestResult {
        name: "config_default_rules".into(),
        passed: config.chain_rules == default_rules(),
        detail: format!("{} chain rules loaded", config.chain_rules.len()),
    });

    Some(config)
}

// ── 2. World Samples ────────────────────────────────────────────────────

fn validate_world_samples(verbose: bool) -> Vec<TestResult> {
    println!("--- World DNA Samples ---");
    let mut results = Vec::new();

    let samples: SampleSet = match serde_json::from_str(SAMPLES_JSON) {
        Ok(s) => s,
        Err(e) => {
            results.push(TestResult {
                name: "samples_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            return results;
        }
    };

    for sample in &samples.worlds {
        let options = DecodeOptions {
            dialect: sample.dialect,
            mode: sample.decode_mode,
        };
        let decoded = match decode_with(&sample.text, &options) {
            Ok(d) => d,
            Err(e) => {
                results.push(TestResult {
                    name: format!("world_{}_decode", sample.name),
                    passed: false,
                    detail: e.to_string(),
                });
                continue;
            }
        };

        let series_warnings = decoded.series_warnings().count();
        results.push(TestResult {
            name: format!("world_{}_series_warnings", sample.name),
            passed: series_warnings == sample.series_warnings,
            detail: format!(
                "{} series warnings (expected {})",
                series_warnings, sample.series_warnings
            ),
        });

        let dna = decoded.value;
        let reencoded = encode(&dna, sample.dialect);
        let round_trip = decode_with(&reencoded, &options).map(|d| d.value);
        results.push(TestResult {
            name: format!("world_{}_round_trip", sample.name),
            passed: round_trip.as_ref() == Ok(&dna),
            detail: format!("{} traits, {:?} dialect", dna.len(), sample.dialect),
        });

        let other = match sample.dialect {
            Dialect::Dense => Dialect::Verbose,
            Dialect::Verbose => Dialect::Dense,
        };
        let other_options = DecodeOptions {
            dialect: other,
            ..options
        };
        let cross = decode_with(&encode(&dna, other), &other_options).map(|d| d.value);
        results.push(TestResult {
            name: format!("world_{}_cross_dialect", sample.name),
            passed: cross.as_ref() == Ok(&dna),
            detail: format!("{:?} → {:?} → same value", sample.dialect, other),
        });

        let record = build_world_record(&dna);
        results.push(TestResult {
            name: format!("world_{}_record", sample.name),
            passed: record.per_trait.len() == dna.len() && record.to_json().is_ok(),
            detail: format!(
                "{} thresholds, {} series in record",
                record.triggered_thresholds.len(),
                record.evolution_summary.len()
            ),
        });

        let simple = simplified_traits(&dna);
        let json_back = serde_json::to_string(&dna)
            .and_then(|json| serde_json::from_str::<WorldDna>(&json));
        results.push(TestResult {
            name: format!("world_{}_json", sample.name),
            passed: json_back.as_ref().ok() == Some(&dna),
            detail: format!(
                "serde round trip; simplified {} / {} / {}",
                simple.terrain, simple.climate, simple.conflict
            ),
        });

        if verbose {
            for w in &decoded.warnings {
                println!("  [{}] {}", sample.name, w);
            }
        }
    }

    results
}

// ── 3. NPC Samples ──────────────────────────────────────────────────────

fn validate_npc_samples(verbose: bool) -> Vec<TestResult> {
    println!("--- NPC DNA Samples ---");
    let mut results = Vec::new();

    let samples: SampleSet = match serde_json::from_str(SAMPLES_JSON) {
        Ok(s) => s,
        Err(_) => return results,
    };

    let mut decoded = Vec::new();
    for (i, line) in samples.npcs.iter().enumerate() {
        match decode_npc(line) {
            Ok(npc) => {
                results.push(TestResult {
                    name: format!("npc_{}_round_trip", i),
                    passed: encode_npc(&npc) == *line,
                    detail: format!(
                        "{} paired, {} unpaired",
                        npc.paired().len(),
                        npc.unpaired().len()
                    ),
                });
                if verbose {
                    let a = npc.alignment();
                    let d = npc.derived_alignment();
                    println!(
                        "  npc {}: stored ({}/{}), derived ({}/{})",
                        i, a.lnc_avg, a.gne_avg, d.lnc_avg, d.gne_avg
                    );
                }
                decoded.push(npc);
            }
            Err(e) => results.push(TestResult {
                name: format!("npc_{}_decode", i),
                passed: false,
                detail: e.to_string(),
            }),
        }
    }

    if let [a, b, ..] = decoded.as_slice() {
        let mut rng = StdRng::seed_from_u64(42);
        let child = crossover_npc(a, b, &mut rng, CrossoverStrategy::WeightedByIntensity)
            .map(|c| mutate_npc(&c, &mut rng, 0.5));
        results.push(TestResult {
            name: "npc_offspring_alignment".into(),
            passed: child.as_ref().is_ok_and(|c| c.alignment_is_current()),
            detail: match &child {
                Ok(c) => encode_npc(c),
                Err(e) => e.to_string(),
            },
        });
    }

    let mut rng = StdRng::seed_from_u64(42);
    let generated = generate_npc(&mut rng);
    let record = build_npc_record(&generated);
    results.push(TestResult {
        name: "npc_generated_record".into(),
        passed: record.paired.len() == 13 && record.alignment.stored == record.alignment.derived,
        detail: format!("LNC {}, GNE {}", record.alignment.lnc, record.alignment.gne),
    });

    results
}

// ── 4. Generation Sweep ─────────────────────────────────────────────────

fn in_range(dna: &WorldDna) -> bool {
    dna.traits()
        .iter()
        .all(|t| (1..=9).contains(&t.prevalence) && (1..=5).contains(&t.intensity))
}

fn validate_generation_sweep(config: &EngineConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Generation Sweep ({} seeds) ---", SWEEP_SEEDS);
    let mut results = Vec::new();

    let mut round_trip_failures = Vec::new();
    let mut inconsistent = 0usize;
    let mut out_of_range = 0usize;
    let mut threshold_counts = [0u32; 3];
    let mut trend_count = 0usize;

    for seed in 0..SWEEP_SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let dna = generate_world(&mut rng);
        let options = config.resolve_options();
        let resolved = match resolve_world(&dna, &config.chain_rules, options, &mut rng) {
            Ok(r) => r.dna,
            Err(e) => {
                round_trip_failures.push(format!("seed {}: {}", seed, e));
                continue;
            }
        };

        if !in_range(&resolved) {
            out_of_range += 1;
        }
        inconsistent += resolved
            .evolution()
            .values()
            .filter(|s| !s.is_consistent())
            .count();
        for (slot, id) in threshold_counts.iter_mut().zip(ThresholdId::KNOWN.iter()) {
            if resolved.thresholds().contains(id) {
                *slot += 1;
            }
        }
        trend_count += identify_trends(&resolved).len();

        for dialect in [Dialect::Verbose, Dialect::Dense] {
            match decode(&encode(&resolved, dialect), dialect) {
                Ok(back) if back == resolved => {}
                Ok(_) => {
                    round_trip_failures.push(format!("seed {} {:?}: value changed", seed, dialect))
                }
                Err(e) => round_trip_failures.push(format!("seed {} {:?}: {}", seed, dialect, e)),
            }
        }
    }

    results.push(TestResult {
        name: "sweep_round_trip".into(),
        passed: round_trip_failures.is_empty(),
        detail: if round_trip_failures.is_empty() {
            format!("{} worlds round-trip in both dialects", SWEEP_SEEDS)
        } else {
            round_trip_failures.join("; ")
        },
    });

    results.push(TestResult {
        name: "sweep_ranges".into(),
        passed: out_of_range == 0,
        detail: format!("{} worlds with out-of-range traits", out_of_range),
    });

    results.push(TestResult {
        name: "sweep_series_consistent".into(),
        passed: inconsistent == 0,
        detail: format!("{} simulated series violate their pattern", inconsistent),
    });

    if verbose {
        for (id, count) in ThresholdId::KNOWN.iter().zip(threshold_counts) {
            println!("  {:10}: triggered in {} worlds", id.as_str(), count);
        }
        println!("  trends: {} across all worlds", trend_count);
    }

    results
}

// ── 5. Operators ────────────────────────────────────────────────────────

fn validate_operators(config: &EngineConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Genetic Operators ---");
    let mut results = Vec::new();

    let mut rng = config.rng();
    let mut mutation_violations = 0usize;
    let mut crossover_failures = Vec::new();

    for _ in 0..SWEEP_SEEDS {
        let a = generate_world(&mut rng);
        let b = generate_world(&mut rng);

        let light = mutate(&a, &mut rng, config.mutation_rate);
        let heavy = mutate(&b, &mut rng, 1.0);
        if !in_range(&light) || !in_range(&heavy) {
            mutation_violations += 1;
        }

        let strategies = [
            config.crossover,
            CrossoverStrategy::WeightedByIntensity,
            CrossoverStrategy::Segment { block_len: 4 },
        ];
        for strategy in strategies {
            match crossover(&a, &b, &mut rng, strategy) {
                Ok(child) => {
                    let same_codes = child.trait_codes().eq(a.trait_codes());
                    if !same_codes || !in_range(&child) {
                        crossover_failures.push(format!("{:?}: child left the schema", strategy));
                    }
                }
                Err(e) => crossover_failures.push(format!("{:?}: {}", strategy, e)),
            }
        }
    }

    results.push(TestResult {
        name: "operators_mutation_ranges".into(),
        passed: mutation_violations == 0,
        detail: format!("{} mutated worlds out of range", mutation_violations),
    });

    results.push(TestResult {
        name: "operators_crossover_closure".into(),
        passed: crossover_failures.is_empty(),
        detail: if crossover_failures.is_empty() {
            "every child keeps the parents' schema".into()
        } else {
            crossover_failures.join("; ")
        },
    });

    results
}

// ── 6. Chain Reactions ──────────────────────────────────────────────────

fn validate_chain_termination(verbose: bool) -> Vec<TestResult> {
    println!("--- Chain Reactions ---");
    let mut results = Vec::new();

    // high_magic raises schools, which keeps high_magic triggered.
    let rules = vec![
        ChainReactionRule {
            max_applications: 3,
            ..ChainReactionRule::new(ThresholdId::HighMagic, TraitCode::Schools, 1)
        },
        ChainReactionRule::new(ThresholdId::HighMagic, TraitCode::Artifacts, 1),
    ];

    let mut rng = StdRng::seed_from_u64(42);
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
    let mut dna = apply_bias(&generate_world(&mut rng), &bias);
    let mut ledger = ApplicationLedger::new();
    let mut fired = Vec::new();
    let mut error = None;

    for _ in 0..10 {
        let triggered = evaluate_thresholds(&dna);
        match apply_chain_reactions_tracked(&dna, &triggered, &rules, &mut ledger) {
            Ok((next, applied)) => {
                fired.push(applied.len());
                dna = next;
            }
            Err(e) => {
                error = Some(e.to_string());
                break;
            }
        }
    }

    let schools_budget = rules[0].max_applications as u32;
    let within_budget = rules
        .iter()
        .all(|r| ledger.count(&r.trigger, &r.target) <= r.max_applications as u32);
    results.push(TestResult {
        name: "chain_cyclic_rules_bounded".into(),
        passed: error.is_none()
            && within_budget
            && ledger.count(&ThresholdId::HighMagic, &TraitCode::Schools) == schools_budget,
        detail: match error {
            Some(e) => e,
            None => format!("{} applications over 10 passes", ledger.total()),
        },
    });

    if verbose {
        println!("  applications per pass: {:?}", fired);
    }

    results
}
