//! Dense dialect: the single-line "Advanced DNA" form.
//!
//! Each trait is packed as two digits, tens = prevalence, units = intensity.
//! A units digit of 0 or above 5 is rejected as out of range; nothing is
//! clipped.

use super::{parse_pattern, parse_version, Cursor, DocumentBuilder};
use crate::error::DnaResult;
use crate::world::{DnaVersion, WorldDna};

pub(super) fn parse(text: &str, doc: &mut DocumentBuilder) -> DnaResult<DnaVersion> {
    let mut cur = Cursor::new(text);

    let version = if cur.eat_keyword("V") {
        parse_version(&mut cur)?
    } else {
        DnaVersion::default()
    };

    cur.expect_keyword("TRAITS")?;
    list(&mut cur, |cur| {
        let (offset, name) = cur.ident()?;
        let code = doc.trait_code(name, offset)?;
        cur.expect_char(':')?;
        let (at, digits) = cur.digits()?;
        if digits.len() != 2 {
            return Err(cur.error_at(at, "two-digit trait value").into());
        }
        let packed = digits.as_bytes();
        let prevalence = (packed[0] - b'0') as i64;
        let intensity = (packed[1] - b'0') as i64;
        doc.push_trait(code, (at, prevalence), (at + 1, intensity))
    })?;

    if cur.eat_keyword("THRESH") {
        list(&mut cur, |cur| {
            let (offset, name) = cur.ident()?;
            doc.push_threshold(name, offset)
        })?;
    }

    if cur.eat_keyword("EVO") {
        list(&mut cur, |cur| {
            let (offset, name) = cur.ident()?;
            let code = doc.trait_code(name, offset)?;
            cur.expect_char(':')?;
            let (p_offset, p_name) = cur.ident()?;
            let pattern = parse_pattern(cur, p_name, p_offset)?;
            cur.expect_char('[')?;
            let mut values = [(0usize, 0i64); 4];
            for (i, slot) in values.iter_mut().enumerate() {
                if i > 0 {
                    cur.expect_char(',')?;
                }
                *slot = cur.number()?;
            }
            cur.expect_char(']')?;
            doc.push_series(code, pattern, values)
        })?;
    }

    cur.expect_end()?;
    Ok(version)
}

/// `{ item ; item ; ... }` with no trailing separator. `{}` is an empty list.
fn list<'a, F>(cur: &mut Cursor<'a>, mut item: F) -> DnaResult<()>
where
    F: FnMut(&mut Cursor<'a>) -> DnaResult<()>,
{
    cur.expect_char('{')?;
    if cur.eat_char('}') {
        return Ok(());
    }
    loop {
        item(cur)?;
        if cur.eat_char('}') {
            return Ok(());
        }
        if !cur.eat_char(';') {
            return Err(cur.error("`;` or `}`").into());
        }
    }
}

pub(super) fn render(dna: &WorldDna) -> String {
    let traits: Vec<String> = dna
        .traits()
        .iter()
        .map(|t| format!("{}:{}{}", t.code, t.prevalence, t.intensity))
        .collect();
    let mut out = format!("V{} TRAITS{{{}}}", dna.version(), traits.join(";"));

    if !dna.thresholds().is_empty() {
        let ids: Vec<&str> = dna.thresholds().iter().map(|id| id.as_str()).collect();
        out.push_str(&format!(" THRESH{{{}}}", ids.join(";")));
    }

    if !dna.evolution().is_empty() {
        let series: Vec<String> = dna
            .evolution()
            .iter()
            .map(|(code, s)| {
                let [past, present, near, far] = s.values;
                format!("{}:{}[{},{},{},{}]", code, s.pattern, past, present, near, far)
            })
            .collect();
        out.push_str(&format!(" EVO{{{}}}", series.join(";")));
    }

    out
}
