//! Verbose dialect: the multi-line, human-authored form.
//!
//! Whitespace (including line breaks) is insignificant when reading; the
//! writer emits one entry per line with two-space indentation.

use std::fmt::Write as _;

use super::{parse_pattern, parse_version, Cursor, DocumentBuilder};
use crate::error::DnaResult;
use crate::evolution::TimePeriod;
use crate::world::{DnaVersion, WorldDna};

pub(super) fn parse(text: &str, doc: &mut DocumentBuilder) -> DnaResult<DnaVersion> {
    let mut cur = Cursor::new(text);

    let version = if cur.eat_keyword("World") {
        cur.expect_keyword("DNA")?;
        cur.expect_keyword("Version")?;
        cur.expect_char(':')?;
        parse_version(&mut cur)?
    } else {
        DnaVersion::default()
    };

    cur.expect_keyword("TRAITS")?;
    cur.expect_char('{')?;
    while !cur.eat_char('}') {
        let (offset, name) = cur.ident()?;
        let code = doc.trait_code(name, offset)?;
        cur.expect_char(':')?;
        cur.expect_keyword("prevalence")?;
        cur.expect_char('=')?;
        let prevalence = cur.number()?;
        cur.eat_char(',');
        cur.expect_keyword("intensity")?;
        cur.expect_char('=')?;
        let intensity = cur.number()?;
        cur.eat_char(',');
        doc.push_trait(code, prevalence, intensity)?;
    }

    if cur.eat_keyword("THRESHOLDS") {
        cur.expect_char('{')?;
        while !cur.eat_char('}') {
            let (offset, name) = cur.ident()?;
            doc.push_threshold(name, offset)?;
            cur.eat_char(',');
        }
    }

    if cur.eat_keyword("EVOLUTION") {
        cur.expect_char('{')?;
        while !cur.eat_char('}') {
            let (offset, name) = cur.ident()?;
            let code = doc.trait_code(name, offset)?;
            cur.expect_char(':')?;
            let (p_offset, p_name) = cur.ident()?;
            let pattern = parse_pattern(&cur, p_name, p_offset)?;
            if cur.eat_keyword("Time") {
                cur.expect_keyword("Periods")?;
                cur.expect_char(':')?;
            }
            let mut values = [(0usize, 0i64); 4];
            for (slot, period) in values.iter_mut().zip(TimePeriod::ALL) {
                cur.expect_keyword(period.as_str())?;
                cur.expect_char(':')?;
                *slot = cur.number()?;
            }
            doc.push_series(code, pattern, values)?;
        }
    }

    cur.expect_end()?;
    Ok(version)
}

pub(super) fn render(dna: &WorldDna) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "World DNA Version: {}", dna.version());

    out.push_str("TRAITS {\n");
    for t in dna.traits() {
        let _ = writeln!(
            out,
            "  {}: prevalence={}, intensity={}",
            t.code, t.prevalence, t.intensity
        );
    }
    out.push_str("}\n");

    if !dna.thresholds().is_empty() {
        out.push_str("\nTHRESHOLDS {\n");
        for id in dna.thresholds() {
            let _ = writeln!(out, "  {}", id);
        }
        out.push_str("}\n");
    }

    if !dna.evolution().is_empty() {
        out.push_str("\nEVOLUTION {\n");
        for (code, series) in dna.evolution() {
            let _ = writeln!(out, "  {}: {}", code, series.pattern);
            out.push_str("    Time Periods:\n");
            for period in TimePeriod::ALL {
                let _ = writeln!(out, "      {}: {}", period.as_str(), series.value(period));
            }
        }
        out.push_str("}\n");
    }

    out
}
