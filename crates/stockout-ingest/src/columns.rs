//! Raw column names and cell decoding.

use std::path::Path;

use polars::prelude::*;

use crate::error::{IngestError, Result};

pub const CLIENT_ID: &str = "CLIENT_ID";
pub const ORG_ID: &str = "ORG_ID";
pub const PERIOD_ID: &str = "PERIOD_ID";
pub const DRUGS_ID: &str = "DRUGS_ID";
pub const INN_ID: &str = "INN_ID";
pub const INN: &str = "INN";
pub const Q: &str = "Q";
pub const V: &str = "V";
pub const DRUG_NAME: &str = "Full medication name";
pub const NFC1: &str = "NFC Code (1)";
pub const NFC2: &str = "NFC Code (2)";

/// Columns every raw market file must carry.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    CLIENT_ID, ORG_ID, PERIOD_ID, DRUGS_ID, INN_ID, INN, Q, V, DRUG_NAME, NFC1, NFC2,
];

/// Field separator of raw market files.
pub const SEPARATOR: u8 = b';';

/// Returns every required column absent from `df`, in canonical order.
pub fn missing_columns(df: &DataFrame) -> Vec<String> {
    let present: Vec<&str> = df.get_column_names().iter().map(|name| name.as_str()).collect();
    REQUIRED_COLUMNS
        .iter()
        .filter(|column| !present.contains(column))
        .map(|column| (*column).to_string())
        .collect()
}

pub fn ensure_required_columns(df: &DataFrame, path: &Path) -> Result<()> {
    let missing = missing_columns(df);
    if missing.is_empty() {
        return Ok(());
    }
    Err(IngestError::MissingColumns {
        path: path.to_path_buf(),
        columns: missing,
    })
}

/// Borrows a column that was read with a string schema.
pub fn text_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
    Ok(df.column(name)?.str()?)
}

/// Parses a number that may use a decimal comma. Blank cells are zero.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return Some(0.0);
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parses an integer id, tolerating integral floats such as `17.0`.
pub fn parse_id(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    let value = trimmed.parse::<f64>().ok()?;
    (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
}

/// Trimmed non-empty text, `None` otherwise.
pub fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_comma() {
        assert_eq!(parse_decimal("12,5"), Some(12.5));
        assert_eq!(parse_decimal(" 3.25 "), Some(3.25));
        assert_eq!(parse_decimal("1 234,5"), Some(1234.5));
        assert_eq!(parse_decimal(""), Some(0.0));
        assert_eq!(parse_decimal("abc"), None);
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id("42.0"), Some(42));
        assert_eq!(parse_id("42.5"), None);
        assert_eq!(parse_id("x"), None);
    }

    #[test]
    fn test_missing_columns() {
        let df = df!(
            "CLIENT_ID" => ["1"],
            "Q" => ["1"],
        )
        .unwrap();
        let missing = missing_columns(&df);
        assert_eq!(missing.len(), 9);
        assert!(missing.contains(&"ORG_ID".to_string()));
        assert!(!missing.contains(&"Q".to_string()));
    }
}
