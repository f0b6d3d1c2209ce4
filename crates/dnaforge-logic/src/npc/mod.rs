//! NPC personality DNA.
//!
//! A personality has two ordered lists:
//!
//! - **paired traits** (the LNC axis): one pole of an opposite pair, e.g.
//!   Brave/Cautious, with a prevalence (1–9) and an intensity (1–5);
//! - **unpaired values** (the GNE axis): a single moral value such as Honest or
//!   Just with a score (1–9).
//!
//! The `(lnc/gne)` alignment header is derived from those lists. Decoding keeps
//! whatever header the text carried; every operator that changes a list
//! recomputes it.

pub mod codec;
pub mod operators;

pub use codec::{decode_npc, decode_npc_with, encode_npc};
pub use operators::{crossover_npc, mutate_npc};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DnaError, DnaResult, RangeError};
use crate::traits::{check_range, clip_to_range, RangeKind};

/// One pole of a paired LNC trait, keyed by its letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disposition {
    Brave,
    Cautious,
    Reserved,
    Outspoken,
    Loyal,
    Independent,
    Confident,
    Insecure,
    Stoic,
    Expressive,
    Patient,
    Impulsive,
    Methodical,
    Unpredictable,
    Generous,
    Protective,
    Suspicious,
    Trusting,
    Serious,
    Playful,
    Introverted,
    Extroverted,
    Competitive,
    Harmonious,
    Curious,
    Judgmental,
    /// Letter outside the table, kept by lenient decoding.
    Unknown(char),
}

/// `(pole, opposite, letter, name)` in pair order.
static DISPOSITIONS: [(Disposition, Disposition, char, &str); 26] = [
    (Disposition::Brave, Disposition::Cautious, 'B', "Brave"),
    (Disposition::Cautious, Disposition::Brave, 'C', "Cautious"),
    (Disposition::Reserved, Disposition::Outspoken, 'R', "Reserved"),
    (Disposition::Outspoken, Disposition::Reserved, 'O', "Outspoken"),
    (Disposition::Loyal, Disposition::Independent, 'L', "Loyal"),
    (Disposition::Independent, Disposition::Loyal, 'T', "Independent"),
    (Disposition::Confident, Disposition::Insecure, 'F', "Confident"),
    (Disposition::Insecure, Disposition::Confident, 'I', "Insecure"),
    (Disposition::Stoic, Disposition::Expressive, 'S', "Stoic"),
    (Disposition::Expressive, Disposition::Stoic, 'X', "Expressive"),
    (Disposition::Patient, Disposition::Impulsive, 'P', "Patient"),
    (Disposition::Impulsive, Disposition::Patient, 'M', "Impulsive"),
    (Disposition::Methodical, Disposition::Unpredictable, 'D', "Methodical"),
    (Disposition::Unpredictable, Disposition::Methodical, 'U', "Unpredictable"),
    (Disposition::Generous, Disposition::Protective, 'G', "Generous"),
    (Disposition::Protective, Disposition::Generous, 'H', "Protective"),
    (Disposition::Suspicious, Disposition::Trusting, 'Y', "Suspicious"),
    (Disposition::Trusting, Disposition::Suspicious, 'W', "Trusting"),
    (Disposition::Serious, Disposition::Playful, 'E', "Serious"),
    (Disposition::Playful, Disposition::Serious, 'A', "Playful"),
    (Disposition::Introverted, Disposition::Extroverted, 'N', "Introverted"),
    (Disposition::Extroverted, Disposition::Introverted, 'V', "Extroverted"),
    (Disposition::Competitive, Disposition::Harmonious, 'K', "Competitive"),
    (Disposition::Harmonious, Disposition::Competitive, 'Q', "Harmonious"),
    (Disposition::Curious, Disposition::Judgmental, 'Z', "Curious"),
    (Disposition::Judgmental, Disposition::Curious, 'J', "Judgmental"),
];

impl Disposition {
    pub fn from_letter(letter: char) -> Option<Disposition> {
        DISPOSITIONS
            .iter()
            .find(|(_, _, l, _)| *l == letter)
            .map(|(d, _, _, _)| *d)
    }

    fn entry(self) -> Option<&'static (Disposition, Disposition, char, &'static str)> {
        DISPOSITIONS.iter().find(|(d, _, _, _)| *d == self)
    }

    pub fn letter(self) -> char {
        match self {
            Disposition::Unknown(c) => c,
            known => known.entry().map(|e| e.2).unwrap_or('?'),
        }
    }

    pub fn name(self) -> &'static str {
        self.entry().map(|e| e.3).unwrap_or("Unknown")
    }

    /// The other pole of the pair.
    pub fn opposite(self) -> Option<Disposition> {
        self.entry().map(|e| e.1)
    }

    pub fn is_known(self) -> bool {
        !matches!(self, Disposition::Unknown(_))
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Unpaired GNE value, keyed by its letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Virtue {
    Honest,
    Compassionate,
    Kind,
    Generous,
    Loyal,
    Just,
    Merciful,
    Forgiving,
    Empathetic,
    Benevolent,
    Humble,
    Selfless,
    Integrity,
    Responsible,
    Tolerant,
    Fair,
    Devoted,
    Charitable,
    Accountable,
    Virtuous,
    /// Letter outside the table, kept by lenient decoding.
    Unknown(char),
}

static VIRTUES: [(Virtue, char, &str); 20] = [
    (Virtue::Honest, 'H', "Honest"),
    (Virtue::Compassionate, 'C', "Compassionate"),
    (Virtue::Kind, 'K', "Kind"),
    (Virtue::Generous, 'G', "Generous"),
    (Virtue::Loyal, 'L', "Loyal"),
    (Virtue::Just, 'J', "Just"),
    (Virtue::Merciful, 'M', "Merciful"),
    (Virtue::Forgiving, 'F', "Forgiving"),
    (Virtue::Empathetic, 'E', "Empathetic"),
    (Virtue::Benevolent, 'B', "Benevolent"),
    (Virtue::Humble, 'U', "Humble"),
    (Virtue::Selfless, 'S', "Selfless"),
    (Virtue::Integrity, 'I', "Integrity"),
    (Virtue::Responsible, 'R', "Responsible"),
    (Virtue::Tolerant, 'T', "Tolerant"),
    (Virtue::Fair, 'A', "Fair"),
    (Virtue::Devoted, 'D', "Devoted"),
    (Virtue::Charitable, 'V', "Charitable"),
    (Virtue::Accountable, 'Y', "Accountable"),
    (Virtue::Virtuous, 'X', "Virtuous"),
];

impl Virtue {
    pub const KNOWN_COUNT: usize = 20;

    pub fn from_letter(letter: char) -> Option<Virtue> {
        VIRTUES
            .iter()
            .find(|(_, l, _)| *l == letter)
            .map(|(v, _, _)| *v)
    }

    /// Every known value in table order.
    pub fn known() -> impl Iterator<Item = Virtue> {
        VIRTUES.iter().map(|(v, _, _)| *v)
    }

    pub fn letter(self) -> char {
        match self {
            Virtue::Unknown(c) => c,
            known => VIRTUES
                .iter()
                .find(|(v, _, _)| *v == known)
                .map(|(_, l, _)| *l)
                .unwrap_or('?'),
        }
    }

    pub fn name(self) -> &'static str {
        VIRTUES
            .iter()
            .find(|(v, _, _)| *v == self)
            .map(|(_, _, n)| *n)
            .unwrap_or("Unknown")
    }

    pub fn is_known(self) -> bool {
        !matches!(self, Virtue::Unknown(_))
    }
}

impl fmt::Display for Virtue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// The 13 opposite pairs, first pole of each.
pub fn disposition_pairs() -> Vec<(Disposition, Disposition)> {
    DISPOSITIONS
        .iter()
        .step_by(2)
        .map(|(d, o, _, _)| (*d, *o))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedTrait {
    pub code: Disposition,
    pub prevalence: u8,
    pub intensity: u8,
}

impl PairedTrait {
    pub fn new(code: Disposition, prevalence: u8, intensity: u8) -> Result<Self, RangeError> {
        check_range(prevalence as i64, RangeKind::Prevalence)?;
        check_range(intensity as i64, RangeKind::Intensity)?;
        Ok(Self {
            code,
            prevalence,
            intensity,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnpairedValue {
    pub code: Virtue,
    pub score: u8,
}

impl UnpairedValue {
    pub fn new(code: Virtue, score: u8) -> Result<Self, RangeError> {
        check_range(score as i64, RangeKind::Score)?;
        Ok(Self { code, score })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Alignment {
    pub lnc_avg: u8,
    pub gne_avg: u8,
}

impl Alignment {
    pub fn new(lnc_avg: u8, gne_avg: u8) -> Result<Self, RangeError> {
        check_range(lnc_avg as i64, RangeKind::Alignment)?;
        check_range(gne_avg as i64, RangeKind::Alignment)?;
        Ok(Self { lnc_avg, gne_avg })
    }

    /// Rounded means of the paired prevalences and the unpaired scores.
    pub fn derive(paired: &[PairedTrait], unpaired: &[UnpairedValue]) -> Self {
        Self {
            lnc_avg: rounded_mean(paired.iter().map(|t| t.prevalence)),
            gne_avg: rounded_mean(unpaired.iter().map(|v| v.score)),
        }
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self {
            lnc_avg: 5,
            gne_avg: 5,
        }
    }
}

/// Arithmetic mean rounded half up, clipped to 1–9. Neutral (5) when empty.
fn rounded_mean(values: impl Iterator<Item = u8>) -> u8 {
    let (sum, n) = values.fold((0u32, 0u32), |(s, n), v| (s + v as u32, n + 1));
    if n == 0 {
        return 5;
    }
    let mean = (2 * sum + n) / (2 * n);
    clip_to_range(mean as i32, RangeKind::Alignment)
}

/// Serde form keeps the stored header as-is, the same way the line decoder
/// does, and re-checks every range on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NpcPersonalityData", into = "NpcPersonalityData")]
pub struct NpcPersonalityDna {
    alignment: Alignment,
    paired: Vec<PairedTrait>,
    unpaired: Vec<UnpairedValue>,
}

impl NpcPersonalityDna {
    /// Build from trait lists; the alignment is derived.
    pub fn new(paired: Vec<PairedTrait>, unpaired: Vec<UnpairedValue>) -> DnaResult<Self> {
        for (i, t) in paired.iter().enumerate() {
            PairedTrait::new(t.code, t.prevalence, t.intensity)
                .map_err(|e| DnaError::validation(format!("paired trait #{}", i + 1), 0, e))?;
            if let Disposition::Unknown(c) = t.code {
                check_letter("paired trait", c, Disposition::from_letter(c).is_some())?;
            }
        }
        for (i, v) in unpaired.iter().enumerate() {
            UnpairedValue::new(v.code, v.score)
                .map_err(|e| DnaError::validation(format!("unpaired value #{}", i + 1), 0, e))?;
            if let Virtue::Unknown(c) = v.code {
                check_letter("unpaired value", c, Virtue::from_letter(c).is_some())?;
            }
        }
        Ok(Self::derived(paired, unpaired))
    }

    pub(crate) fn derived(paired: Vec<PairedTrait>, unpaired: Vec<UnpairedValue>) -> Self {
        Self {
            alignment: Alignment::derive(&paired, &unpaired),
            paired,
            unpaired,
        }
    }

    /// Keeps a stored header as-is; used by the decoder.
    pub(crate) fn with_stored_alignment(
        alignment: Alignment,
        paired: Vec<PairedTrait>,
        unpaired: Vec<UnpairedValue>,
    ) -> Self {
        Self {
            alignment,
            paired,
            unpaired,
        }
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn paired(&self) -> &[PairedTrait] {
        &self.paired
    }

    pub fn unpaired(&self) -> &[UnpairedValue] {
        &self.unpaired
    }

    /// The alignment the current lists imply.
    pub fn derived_alignment(&self) -> Alignment {
        Alignment::derive(&self.paired, &self.unpaired)
    }

    /// Whether the stored header matches the lists.
    pub fn alignment_is_current(&self) -> bool {
        self.alignment == self.derived_alignment()
    }

    pub fn recompute_alignment(&self) -> Self {
        Self::derived(self.paired.clone(), self.unpaired.clone())
    }
}

/// Pass-through letters must read back as themselves on their own axis.
fn check_letter(kind: &'static str, letter: char, registered: bool) -> DnaResult<()> {
    let problem = if registered {
        "it names a registered entry"
    } else if !letter.is_ascii_alphabetic() {
        "it is not an ASCII letter"
    } else {
        return Ok(());
    };
    Err(DnaError::UnencodableName {
        kind,
        name: letter.to_string(),
        problem,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NpcPersonalityData {
    alignment: Alignment,
    paired: Vec<PairedTrait>,
    unpaired: Vec<UnpairedValue>,
}

impl From<NpcPersonalityDna> for NpcPersonalityData {
    fn from(dna: NpcPersonalityDna) -> Self {
        Self {
            alignment: dna.alignment,
            paired: dna.paired,
            unpaired: dna.unpaired,
        }
    }
}

impl TryFrom<NpcPersonalityData> for NpcPersonalityDna {
    type Error = DnaError;

    fn try_from(data: NpcPersonalityData) -> DnaResult<Self> {
        let stored = Alignment::new(data.alignment.lnc_avg, data.alignment.gne_avg)
            .map_err(|e| DnaError::validation("alignment header", 0, e))?;
        let dna = NpcPersonalityDna::new(data.paired, data.unpaired)?;
        Ok(Self {
            alignment: stored,
            ..dna
        })
    }
}
