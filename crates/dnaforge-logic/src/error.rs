//! Error taxonomy for the DNA engine.
//!
//! Grammar and range errors abort decoding of the whole document; no partial
//! DNA is ever returned. Evolution consistency problems are not errors at all:
//! they travel next to a successfully decoded value as [`DecodeWarning`]s.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::evolution::EvolutionPattern;
use crate::traits::{RangeKind, TraitCode};

/// Convenience alias used throughout the crate.
pub type DnaResult<T> = Result<T, DnaError>;

/// Malformed grammar, anchored at a byte offset into the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at byte {offset}: expected {expected}, found {found}")]
pub struct ParseError {
    pub offset: usize,
    pub expected: String,
    pub found: String,
}

/// A number outside its declared range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} {value} is outside {}..={}", .kind.min(), .kind.max())]
pub struct RangeError {
    pub kind: RangeKind,
    pub value: i64,
}

/// Crossover parents that do not share one trait schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parents do not share a trait schema (only in first: [{}], only in second: [{}])", .only_in_a.join(", "), .only_in_b.join(", "))]
pub struct SchemaMismatchError {
    pub only_in_a: Vec<String>,
    pub only_in_b: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DnaError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid {subject} at byte {offset}: {source}")]
    Validation {
        subject: String,
        offset: usize,
        source: RangeError,
    },

    #[error("unknown trait code `{code}` at byte {offset}")]
    UnknownTrait { code: String, offset: usize },

    #[error("unknown threshold `{id}` at byte {offset}")]
    UnknownThreshold { id: String, offset: usize },

    #[error("trait `{code}` appears more than once")]
    DuplicateTrait { code: String },

    #[error("trait `{code}` is not present in this DNA")]
    MissingTrait { code: String },

    #[error("pass-through {kind} `{name}` would not read back: {problem}")]
    UnencodableName {
        kind: &'static str,
        name: String,
        problem: &'static str,
    },

    #[error(transparent)]
    SchemaMismatch(#[from] SchemaMismatchError),

    #[error("chain reaction {trigger} -> {target} fired {applications} times, budget is {max}")]
    CycleGuardExceeded {
        trigger: String,
        target: String,
        applications: u32,
        max: u8,
    },
}

impl DnaError {
    /// Byte offset for errors anchored in an input document.
    pub fn offset(&self) -> Option<usize> {
        match self {
            DnaError::Parse(e) => Some(e.offset),
            DnaError::Validation { offset, .. }
            | DnaError::UnknownTrait { offset, .. }
            | DnaError::UnknownThreshold { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    pub(crate) fn validation(subject: impl Into<String>, offset: usize, source: RangeError) -> Self {
        DnaError::Validation {
            subject: subject.into(),
            offset,
            source,
        }
    }
}

/// An evolution series whose values do not follow its declared pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesConsistencyWarning {
    pub trait_code: Option<TraitCode>,
    pub pattern: EvolutionPattern,
    pub values: [u8; 4],
    pub reason: String,
}

impl fmt::Display for SeriesConsistencyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subject = self
            .trait_code
            .as_ref()
            .map(|c| c.as_str().to_string())
            .unwrap_or_else(|| "series".to_string());
        write!(
            f,
            "{} {} {:?}: {}",
            subject,
            self.pattern.as_str(),
            self.values,
            self.reason
        )
    }
}

/// Non-fatal findings returned alongside a decoded value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodeWarning {
    SeriesConsistency(SeriesConsistencyWarning),
    /// Lenient mode kept an unregistered trait code as a pass-through.
    UnknownTraitRetained { code: String, offset: usize },
    /// Lenient mode kept an unregistered threshold id as a pass-through.
    UnknownThresholdRetained { id: String, offset: usize },
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeWarning::SeriesConsistency(w) => write!(f, "inconsistent evolution: {}", w),
            DecodeWarning::UnknownTraitRetained { code, offset } => {
                write!(f, "kept unknown trait `{}` (byte {})", code, offset)
            }
            DecodeWarning::UnknownThresholdRetained { id, offset } => {
                write!(f, "kept unknown threshold `{}` (byte {})", id, offset)
            }
        }
    }
}

impl From<SeriesConsistencyWarning> for DecodeWarning {
    fn from(w: SeriesConsistencyWarning) -> Self {
        DecodeWarning::SeriesConsistency(w)
    }
}

/// A decoded value plus everything worth telling the caller about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded<T> {
    pub value: T,
    pub warnings: Vec<DecodeWarning>,
}

impl<T> Decoded<T> {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn series_warnings(&self) -> impl Iterator<Item = &SeriesConsistencyWarning> {
        self.warnings.iter().filter_map(|w| match w {
            DecodeWarning::SeriesConsistency(s) => Some(s),
            _ => None,
        })
    }
}
