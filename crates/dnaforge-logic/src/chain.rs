//! Chain reactions: cascading prevalence deltas fired by triggered thresholds.
//!
//! Rules form a directed graph from thresholds to traits. A resolution pass
//! visits the rule list once, in order; each `(trigger, target)` pair fires at
//! most once per pass and at most `max_applications` times across every pass
//! that shares one [`ApplicationLedger`]. Nothing here re-evaluates
//! thresholds, so cyclic rule graphs terminate by construction.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{DnaError, DnaResult};
use crate::thresholds::ThresholdId;
use crate::traits::{TraitCode, TraitField};
use crate::world::WorldDna;

/// `trigger` → `target.prevalence += delta`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReactionRule {
    pub trigger: ThresholdId,
    pub target: TraitCode,
    pub delta: i8,
    pub max_applications: u8,
}

impl ChainReactionRule {
    /// Rule that may fire once.
    pub fn new(trigger: ThresholdId, target: TraitCode, delta: i8) -> Self {
        Self {
            trigger,
            target,
            delta,
            max_applications: 1,
        }
    }
}

/// Default rules: magical crisis and societal collapse.
pub fn default_rules() -> Vec<ChainReactionRule> {
    vec![
        ChainReactionRule::new(ThresholdId::HighMagic, TraitCode::Stability, -2),
        ChainReactionRule::new(ThresholdId::HighMagic, TraitCode::Society, 1),
        ChainReactionRule::new(ThresholdId::HighMagic, TraitCode::Artifacts, 2),
        ChainReactionRule::new(ThresholdId::Unstable, TraitCode::Trade, -2),
        ChainReactionRule::new(ThresholdId::Unstable, TraitCode::Government, -1),
        ChainReactionRule::new(ThresholdId::Unstable, TraitCode::Society, -2),
    ]
}

/// One rule application as it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedReaction {
    pub trigger: ThresholdId,
    pub target: TraitCode,
    pub delta: i8,
    pub before: u8,
    pub after: u8,
}

/// Application counts per `(trigger, target)` pair.
///
/// Callers that run more than one pass over the same DNA lineage pass the same
/// ledger to every pass so `max_applications` holds across all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationLedger {
    counts: BTreeMap<(ThresholdId, TraitCode), u32>,
}

impl ApplicationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, trigger: &ThresholdId, target: &TraitCode) -> u32 {
        self.counts
            .get(&(trigger.clone(), target.clone()))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    fn record(&mut self, trigger: &ThresholdId, target: &TraitCode) -> u32 {
        let n = self
            .counts
            .entry((trigger.clone(), target.clone()))
            .or_insert(0);
        *n += 1;
        *n
    }
}

/// Apply every rule whose trigger is in `triggered`, once, with a fresh ledger.
pub fn apply_chain_reactions(
    dna: &WorldDna,
    triggered: &BTreeSet<ThresholdId>,
    rules: &[ChainReactionRule],
) -> DnaResult<WorldDna> {
    let mut ledger = ApplicationLedger::new();
    apply_chain_reactions_tracked(dna, triggered, rules, &mut ledger).map(|(next, _)| next)
}

/// One resolution pass against a caller-owned ledger.
///
/// Returns the new DNA and the reactions that actually fired. Rules whose
/// target trait is absent from the DNA are skipped.
pub fn apply_chain_reactions_tracked(
    dna: &WorldDna,
    triggered: &BTreeSet<ThresholdId>,
    rules: &[ChainReactionRule],
    ledger: &mut ApplicationLedger,
) -> DnaResult<(WorldDna, Vec<AppliedReaction>)> {
    let mut traits = dna.traits().to_vec();
    let mut fired_this_pass: BTreeSet<(ThresholdId, TraitCode)> = BTreeSet::new();
    let mut applied = Vec::new();

    for rule in rules {
        if !triggered.contains(&rule.trigger) {
            continue;
        }
        let key = (rule.trigger.clone(), rule.target.clone());
        if fired_this_pass.contains(&key) {
            continue;
        }
        let already = ledger.count(&rule.trigger, &rule.target);
        if already >= rule.max_applications as u32 {
            continue;
        }
        let Some(slot) = traits.iter_mut().find(|t| t.code == rule.target) else {
            log::debug!(
                "chain reaction {} -> {} skipped: target not present",
                rule.trigger,
                rule.target
            );
            continue;
        };

        let applications = ledger.record(&rule.trigger, &rule.target);
        if applications > rule.max_applications as u32 {
            return Err(DnaError::CycleGuardExceeded {
                trigger: rule.trigger.to_string(),
                target: rule.target.to_string(),
                applications,
                max: rule.max_applications,
            });
        }
        fired_this_pass.insert(key);

        let before = slot.prevalence;
        *slot = slot.shifted(TraitField::Prevalence, rule.delta as i32);
        log::debug!(
            "chain reaction {} -> {}: prevalence {} -> {}",
            rule.trigger,
            rule.target,
            before,
            slot.prevalence
        );
        applied.push(AppliedReaction {
            trigger: rule.trigger.clone(),
            target: rule.target.clone(),
            delta: rule.delta,
            before,
            after: slot.prevalence,
        });
    }

    Ok((dna.with_validated_traits(traits), applied))
}
