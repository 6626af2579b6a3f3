use crate::BfError;

/// Floating point type used throughout system
pub type Real = f64;

/// Relative change between two iterates, guarded against a zero denominator.
///
/// Values whose magnitudes are both below `floor` are treated as unchanged.
pub fn relative_change(previous: Real, current: Real, floor: Real) -> Real {
    let scale = previous.abs().max(current.abs());
    if scale <= floor {
        return 0.0;
    }
    (current - previous).abs() / scale
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, BfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(BfError::NonFinite { what, value: v })
    }
}

pub fn ensure_non_negative(v: Real, what: &'static str) -> Result<Real, BfError> {
    let v = ensure_finite(v, what)?;
    if v < 0.0 {
        Err(BfError::Negative { what, value: v })
    } else {
        Ok(v)
    }
}

/// Clamp a percentage into [0, 100].
pub fn clamp_pct(v: Real) -> Real {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 100.0) }
}

/// Lenient numeric parse for engineering text.
///
/// - `"20-30"` / `"20 to 30"` reduce to the midpoint
/// - thousands separators, `%`, `~` and trailing unit text are ignored
/// - anything unparsable yields 0.0 (never an error)
pub fn parse_lenient(text: &str) -> Real {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    let negative = cleaned.starts_with('-');

    let mut tokens: Vec<(usize, usize)> = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in cleaned.char_indices() {
        let numeric = c.is_ascii_digit() || c == '.';
        match (numeric, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                tokens.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push((s, cleaned.len()));
    }

    let parse = |(s, e): (usize, usize)| cleaned[s..e].parse::<Real>().ok();

    let Some(first) = tokens.first().and_then(|t| parse(*t)) else {
        return 0.0;
    };

    if let (Some(&(_, first_end)), Some(&second_tok)) = (tokens.first(), tokens.get(1)) {
        let between = cleaned[first_end..second_tok.0].trim().to_ascii_lowercase();
        if between == "-" || between == "to" || between == "–" {
            if let Some(second) = parse(second_tok) {
                return (first + second) / 2.0;
            }
        }
    }

    if negative { -first } else { first }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_non_negative_rejects_negative() {
        assert!(ensure_non_negative(0.0, "flow").is_ok());
        assert!(matches!(
            ensure_non_negative(-1.0, "flow"),
            Err(BfError::Negative { .. })
        ));
    }

    #[test]
    fn relative_change_floor() {
        assert_eq!(relative_change(0.0, 1e-15, 1e-9), 0.0);
        assert!((relative_change(100.0, 101.0, 1e-9) - 1.0 / 101.0).abs() < 1e-12);
    }

    #[test]
    fn lenient_parse_cases() {
        assert_eq!(parse_lenient("15"), 15.0);
        assert_eq!(parse_lenient("15%"), 15.0);
        assert_eq!(parse_lenient("20-30"), 25.0);
        assert_eq!(parse_lenient("20 - 30 %"), 25.0);
        assert!((parse_lenient("0.2 to 0.4") - 0.3).abs() < 1e-12);
        assert_eq!(parse_lenient("1,200 tons"), 1200.0);
        assert_eq!(parse_lenient("~0.35"), 0.35);
        assert_eq!(parse_lenient("-5"), -5.0);
        assert_eq!(parse_lenient("n/a"), 0.0);
        assert_eq!(parse_lenient(""), 0.0);
    }
}
