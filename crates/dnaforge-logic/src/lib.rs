//! World and NPC DNA engine.
//!
//! This crate holds the compact DNA formats for fictional worlds and NPC
//! personalities, along with everything that operates on them. It has no I/O
//! and no runtime dependencies: functions take plain data (and a caller-owned
//! RNG where randomness is involved) and return new values.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`traits`] | Trait codes, categories, value ranges and clipping |
//! | [`error`] | Decode/validation errors and decode warnings |
//! | [`world`] | The immutable `WorldDna` value and its version header |
//! | [`thresholds`] | Threshold registry and evaluation over trait values |
//! | [`chain`] | Chain-reaction rules fired by triggered thresholds |
//! | [`evolution`] | Four-point trajectories, patterns and consistency checks |
//! | [`codec`] | World DNA text codec, verbose and dense dialects |
//! | [`operators`] | Mutation and crossover of World DNA |
//! | [`npc`] | NPC personality DNA, its line codec and operators |
//! | [`generation`] | Random worlds and NPCs, trends and pattern suggestion |
//! | [`pipeline`] | Thresholds → chain reactions → evolution for one world |
//! | [`record`] | Label-only decode records for downstream text generation |
//! | [`config`] | Engine configuration and validation |

pub mod chain;
pub mod codec;
pub mod config;
pub mod error;
pub mod evolution;
pub mod generation;
pub mod npc;
pub mod operators;
pub mod pipeline;
pub mod record;
pub mod thresholds;
pub mod traits;
pub mod world;
