// Lenient numeric parsing for stat CSV fields.

use thiserror::Error;

/// A non-empty field that is not a valid number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed number {value:?}")]
pub struct MalformedNumber {
    pub value: String,
}

/// Parse a field as `f64`, treating an empty (or whitespace-only) field as
/// 0.0. Stat exports leave counting columns blank when a player never
/// recorded the stat.
pub fn empty_float(s: &str) -> Result<f64, MalformedNumber> {
    empty_float_or(s, 0.0)
}

/// Like [`empty_float`], with an explicit value for empty fields.
pub fn empty_float_or(s: &str, default: f64) -> Result<f64, MalformedNumber> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(default);
    }
    trimmed.parse::<f64>().map_err(|_| MalformedNumber {
        value: s.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_zero() {
        assert_eq!(empty_float(""), Ok(0.0));
        assert_eq!(empty_float("   "), Ok(0.0));
    }

    #[test]
    fn plain_numbers_parse() {
        assert_eq!(empty_float("3.5"), Ok(3.5));
        assert_eq!(empty_float("-2"), Ok(-2.0));
        assert_eq!(empty_float(" 17 "), Ok(17.0));
    }

    #[test]
    fn garbage_is_an_error() {
        let err = empty_float("twelve").unwrap_err();
        assert_eq!(err.value, "twelve");
        assert!(err.to_string().contains("twelve"));
    }

    #[test]
    fn explicit_default_for_empty() {
        assert_eq!(empty_float_or("", 400.0), Ok(400.0));
        assert_eq!(empty_float_or("12", 400.0), Ok(12.0));
        assert!(empty_float_or("first", 400.0).is_err());
    }
}
