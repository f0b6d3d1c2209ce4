//! Engine configuration.
//!
//! Everything a caller tunes lives in one serde-friendly struct so it can be
//! loaded from JSON and validated in one go. The engine itself never stores an
//! RNG; [`EngineConfig::rng`] hands the caller a fresh one.
//!
//! ```
//! use dnaforge_logic::config::{EngineConfig, validate_config};
//!
//! let mut config = EngineConfig::default();
//! config.mutation_rate = 0.25;
//! config.seed = Some(42);
//! assert!(validate_config(&config).is_empty());
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chain::{default_rules, ChainReactionRule};
use crate::codec::{DecodeMode, DecodeOptions, Dialect};
use crate::operators::CrossoverStrategy;
use crate::pipeline::ResolveOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Dialect used when reading and writing World DNA.
    pub dialect: Dialect,
    /// Strict rejects unknown codes; lenient keeps them as pass-through.
    pub decode_mode: DecodeMode,
    /// Per-trait mutation probability, 0.0–1.0.
    pub mutation_rate: f64,
    pub crossover: CrossoverStrategy,
    /// Random seed (None = entropy).
    pub seed: Option<u64>,
    /// Only evolve traits whose suggested pattern is ACCELERATING or DECLINING.
    pub evolve_significant_only: bool,
    #[serde(default = "default_rules")]
    pub chain_rules: Vec<ChainReactionRule>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::Dense,
            decode_mode: DecodeMode::Strict,
            mutation_rate: 0.1,
            crossover: CrossoverStrategy::Uniform,
            seed: None,
            evolve_significant_only: true,
            chain_rules: default_rules(),
        }
    }
}

impl EngineConfig {
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            dialect: self.dialect,
            mode: self.decode_mode,
        }
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            significant_only: self.evolve_significant_only,
        }
    }

    /// Seeded RNG when a seed is configured, otherwise one from OS entropy.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Mutation rate outside 0.0–1.0 or NaN.
    #[error("mutation rate {0} is outside 0.0..=1.0")]
    MutationRateOutOfRange(f64),
    /// Segment crossover with zero-length blocks.
    #[error("segment crossover needs a block length of at least 1")]
    ZeroSegmentLength,
    /// Chain rule triggered by an unregistered threshold.
    #[error("chain rule trigger `{0}` is not a registered threshold")]
    UnknownRuleTrigger(String),
    /// Chain rule targeting an unregistered trait.
    #[error("chain rule target `{0}` is not a registered trait")]
    UnknownRuleTarget(String),
}

/// Validate an engine configuration, returning all errors found.
pub fn validate_config(config: &EngineConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if !(0.0..=1.0).contains(&config.mutation_rate) {
        errors.push(ConfigError::MutationRateOutOfRange(config.mutation_rate));
    }
    if config.crossover == (CrossoverStrategy::Segment { block_len: 0 }) {
        errors.push(ConfigError::ZeroSegmentLength);
    }
    for rule in &config.chain_rules {
        if !rule.trigger.is_known() {
            errors.push(ConfigError::UnknownRuleTrigger(rule.trigger.to_string()));
        }
        if !rule.target.is_known() {
            errors.push(ConfigError::UnknownRuleTarget(rule.target.to_string()));
        }
    }

    errors
}
