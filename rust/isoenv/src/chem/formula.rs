use crate::chem::elements::{
    by_symbol,
    ElementRecord,
};
use crate::errors::{
    IsoenvError,
    Result,
};

/// Parse a formula of the form `Element1Count1Element2Count2...`.
///
/// Every element symbol must be immediately followed by a decimal atom
/// count ("C2H6O1", not "C2H6O"), with no separators anywhere. Repeated
/// element symbols are kept as separate entries, matching the dimension
/// layout the caller asked for.
pub fn parse_formula(formula: &str) -> Result<Vec<(&'static ElementRecord, u32)>> {
    let invalid = |reason: String| IsoenvError::InvalidFormula {
        formula: formula.to_string(),
        reason,
    };

    if formula.is_empty() {
        return Err(invalid("empty formula".to_string()));
    }

    let mut out = Vec::new();
    let mut rest = formula;
    while !rest.is_empty() {
        let sym_len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        if sym_len == 0 {
            let c = rest.chars().next().unwrap();
            return Err(invalid(format!("unexpected character '{}'", c)));
        }
        let symbol = &rest[..sym_len];
        rest = &rest[sym_len..];

        let digit_len = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digit_len == 0 {
            return Err(invalid(format!(
                "element '{}' must be followed by an atom count",
                symbol
            )));
        }
        let count: u32 = rest[..digit_len]
            .parse()
            .map_err(|_| invalid(format!("atom count '{}' out of range", &rest[..digit_len])))?;
        rest = &rest[digit_len..];

        let record =
            by_symbol(symbol).ok_or_else(|| invalid(format!("unknown element symbol '{}'", symbol)))?;
        out.push((record, count));
    }
    Ok(out)
}
