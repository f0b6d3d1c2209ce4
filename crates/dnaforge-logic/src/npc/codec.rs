//! NPC line codec: `(lnc/gne) 5B4,2R1,... - H7,C3,...`
//!
//! Paired items are `<prevalence><letter><intensity>`, unpaired items are
//! `<letter><score>`, all single digits. The ` - ` between the two lists is
//! written on encode and optional on decode.

use crate::codec::{Cursor, DecodeMode};
use crate::error::{DecodeWarning, DnaError, DnaResult, Decoded};
use crate::traits::{check_range, RangeKind};

use super::{Alignment, Disposition, NpcPersonalityDna, PairedTrait, UnpairedValue, Virtue};

/// Strict decode.
pub fn decode_npc(text: &str) -> DnaResult<NpcPersonalityDna> {
    decode_npc_with(text, DecodeMode::Strict).map(|d| d.value)
}

pub fn decode_npc_with(text: &str, mode: DecodeMode) -> DnaResult<Decoded<NpcPersonalityDna>> {
    let mut cur = Cursor::new(text);
    let mut warnings = Vec::new();

    cur.expect_char('(')?;
    let lnc = ranged(&mut cur, RangeKind::Alignment, "LNC average")?;
    cur.expect_char('/')?;
    let gne = ranged(&mut cur, RangeKind::Alignment, "GNE average")?;
    cur.expect_char(')')?;
    let alignment = Alignment {
        lnc_avg: lnc,
        gne_avg: gne,
    };

    let mut paired = Vec::new();
    cur.skip_ws();
    if matches!(cur.peek(), Some(c) if c.is_ascii_digit()) {
        loop {
            cur.skip_ws();
            paired.push(paired_item(&mut cur, mode, &mut warnings)?);
            if !cur.eat_char(',') {
                break;
            }
        }
    }

    let mut unpaired = Vec::new();
    let separated = cur.eat_char('-');
    cur.skip_ws();
    if separated || matches!(cur.peek(), Some(c) if c.is_ascii_alphabetic()) {
        loop {
            cur.skip_ws();
            unpaired.push(unpaired_item(&mut cur, mode, &mut warnings)?);
            if !cur.eat_char(',') {
                break;
            }
        }
    }

    cur.expect_end()?;
    Ok(Decoded {
        value: NpcPersonalityDna::with_stored_alignment(alignment, paired, unpaired),
        warnings,
    })
}

fn ranged(cur: &mut Cursor<'_>, kind: RangeKind, subject: &str) -> DnaResult<u8> {
    let (offset, raw) = cur.number()?;
    check_range(raw, kind).map_err(|e| DnaError::validation(subject, offset, e))
}

fn digit_in(cur: &mut Cursor<'_>, kind: RangeKind, subject: &str) -> DnaResult<u8> {
    let offset = cur.pos();
    let raw = cur.digit()?;
    check_range(raw as i64, kind).map_err(|e| DnaError::validation(subject, offset, e))
}

fn paired_item(
    cur: &mut Cursor<'_>,
    mode: DecodeMode,
    warnings: &mut Vec<DecodeWarning>,
) -> DnaResult<PairedTrait> {
    let prevalence = digit_in(cur, RangeKind::Prevalence, "paired trait prevalence")?;
    let at = cur.pos();
    let letter = cur.letter()?;
    let code = match Disposition::from_letter(letter) {
        Some(code) => code,
        None => {
            unknown_letter(letter, at, mode, warnings)?;
            Disposition::Unknown(letter)
        }
    };
    let intensity = digit_in(cur, RangeKind::Intensity, "paired trait intensity")?;
    Ok(PairedTrait {
        code,
        prevalence,
        intensity,
    })
}

fn unpaired_item(
    cur: &mut Cursor<'_>,
    mode: DecodeMode,
    warnings: &mut Vec<DecodeWarning>,
) -> DnaResult<UnpairedValue> {
    let at = cur.pos();
    let letter = cur.letter()?;
    let code = match Virtue::from_letter(letter) {
        Some(code) => code,
        None => {
            unknown_letter(letter, at, mode, warnings)?;
            Virtue::Unknown(letter)
        }
    };
    let score = digit_in(cur, RangeKind::Score, "unpaired value score")?;
    Ok(UnpairedValue { code, score })
}

fn unknown_letter(
    letter: char,
    offset: usize,
    mode: DecodeMode,
    warnings: &mut Vec<DecodeWarning>,
) -> DnaResult<()> {
    match mode {
        DecodeMode::Strict => Err(DnaError::UnknownTrait {
            code: letter.to_string(),
            offset,
        }),
        DecodeMode::Lenient => {
            warnings.push(DecodeWarning::UnknownTraitRetained {
                code: letter.to_string(),
                offset,
            });
            Ok(())
        }
    }
}

pub fn encode_npc(dna: &NpcPersonalityDna) -> String {
    let a = dna.alignment();
    let mut out = format!("({}/{})", a.lnc_avg, a.gne_avg);
    if !dna.paired().is_empty() {
        let items: Vec<String> = dna
            .paired()
            .iter()
            .map(|t| format!("{}{}{}", t.prevalence, t.code, t.intensity))
            .collect();
        out.push(' ');
        out.push_str(&items.join(","));
    }
    if !dna.unpaired().is_empty() {
        let items: Vec<String> = dna
            .unpaired()
            .iter()
            .map(|v| format!("{}{}", v.code, v.score))
            .collect();
        out.push_str(" - ");
        out.push_str(&items.join(","));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY: &str = "(7/3) 5B4,2R1,8L3,4F5,7S2,3P1,7D4,2G3,9Y5,1E2,6N3,4K2,6Z4,8O3,7C2,9R4,2A5,6D3,8A1,5I4 - H7,C3,K8,G2,L9,J4,M5,F6,E7,B3,U8,S2,I6,R7,T3,A9,D4,V5,Y2,X6";

    #[test]
    fn test_decode_legacy_line() {
        let npc = decode_npc(LEGACY).unwrap();
        assert_eq!(npc.alignment(), Alignment { lnc_avg: 7, gne_avg: 3 });
        assert_eq!(npc.paired().len(), 20);
        assert_eq!(npc.unpaired().len(), 20);
        assert_eq!(
            npc.paired()[0],
            PairedTrait {
                code: Disposition::Brave,
                prevalence: 5,
                intensity: 4
            }
        );
        assert_eq!(npc.unpaired()[19].code, Virtue::Virtuous);
        // Stored header is kept even though the lists average to (5/5).
        assert_eq!(npc.derived_alignment(), Alignment { lnc_avg: 5, gne_avg: 5 });
        assert!(!npc.alignment_is_current());
    }

    #[test]
    fn test_encode_reproduces_legacy_line() {
        let npc = decode_npc(LEGACY).unwrap();
        assert_eq!(encode_npc(&npc), LEGACY);
    }

    #[test]
    fn test_separator_is_optional() {
        let with = decode_npc("(6/4) 5B4,2R1 - H7,C3").unwrap();
        let without = decode_npc("(6/4) 5B4,2R1 H7,C3").unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn test_partial_lists() {
        let only_paired = decode_npc("(5/5) 5B4").unwrap();
        assert!(only_paired.unpaired().is_empty());
        let only_values = decode_npc("(5/5) - H7").unwrap();
        assert!(only_values.paired().is_empty());
        assert_eq!(encode_npc(&only_values), "(5/5) - H7");
        assert!(decode_npc("(5/5)").unwrap().paired().is_empty());
    }

    #[test]
    fn test_intensity_out_of_range() {
        match decode_npc("(5/5) 5B7").unwrap_err() {
            DnaError::Validation { offset, source, .. } => {
                assert_eq!(offset, 8);
                assert_eq!(source.kind, RangeKind::Intensity);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_alignment_header_range() {
        assert!(matches!(
            decode_npc("(0/5) 5B4"),
            Err(DnaError::Validation { .. })
        ));
    }

    #[test]
    fn test_unknown_letter_strict_and_lenient() {
        let err = decode_npc("(5/5) 5B4 - W3").unwrap_err();
        assert!(matches!(err, DnaError::UnknownTrait { ref code, offset: 12 } if code == "W"));

        let decoded = decode_npc_with("(5/5) 5B4 - W3", DecodeMode::Lenient).unwrap();
        assert_eq!(decoded.value.unpaired()[0].code, Virtue::Unknown('W'));
        assert_eq!(decoded.warnings.len(), 1);
        assert_eq!(encode_npc(&decoded.value), "(5/5) 5B4 - W3");
    }

    #[test]
    fn test_malformed_item() {
        assert!(matches!(decode_npc("(5/5) 5B"), Err(DnaError::Parse(_))));
        assert!(matches!(decode_npc("5B4"), Err(DnaError::Parse(_))));
        assert!(matches!(decode_npc("(5/5) 5B4,"), Err(DnaError::Parse(_))));
    }
}
