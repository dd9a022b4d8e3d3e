//! `PERIOD_ID` decoding.
//!
//! A period id is a four digit year followed by a day code `N`. The date is
//! January 1st of that year plus `N / 7` weeks and `N % 7` days.

use chrono::{NaiveDate, TimeDelta};
use stockout_model::Week;

/// Decodes a raw period id into its calendar date.
pub fn decode_period_id(raw: &str) -> Option<NaiveDate> {
    let digits = normalize_digits(raw)?;
    if digits.len() < 5 {
        return None;
    }
    let (year, code) = digits.split_at(4);
    let year: i32 = year.parse().ok()?;
    let code: i64 = code.parse().ok()?;
    let first_day = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let offset = TimeDelta::try_weeks(code / 7)? + TimeDelta::try_days(code % 7)?;
    first_day.checked_add_signed(offset)
}

/// Decodes a raw period id and aligns it to the Monday of its week.
pub fn period_week(raw: &str) -> Option<Week> {
    decode_period_id(raw).map(Week::containing)
}

/// Accepts plain integers and integral floats such as `2024007.0`.
fn normalize_digits(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let integral = match trimmed.split_once('.') {
        Some((int, frac)) if frac.bytes().all(|b| b == b'0') => int,
        Some(_) => return None,
        None => trimmed,
    };
    (!integral.is_empty() && integral.bytes().all(|b| b.is_ascii_digit())).then_some(integral)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn decodes_weeks_and_days() {
        assert_eq!(decode_period_id("202400000"), Some(date(2024, 1, 1)));
        assert_eq!(decode_period_id("202400305"), Some(date(2024, 11, 1)));
        assert_eq!(decode_period_id("20240009"), Some(date(2024, 1, 10)));
    }

    #[test]
    fn aligns_to_monday() {
        // 2024-11-01 is a Friday
        assert_eq!(period_week("202400305").unwrap().date(), date(2024, 10, 28));
    }

    #[test]
    fn rejects_malformed_ids() {
        assert_eq!(decode_period_id("2024"), None);
        assert_eq!(decode_period_id("2024ab"), None);
        assert_eq!(decode_period_id(""), None);
        assert_eq!(decode_period_id("2024007.5"), None);
        assert_eq!(decode_period_id("2024007.0"), Some(date(2024, 1, 8)));
    }
}
