//! Date canonicalization for FIRM dates, EC expiration, and survey dates.
//!
//! Certificates carry dates as "06/01/2019", "06-01-2019", "06012019", and
//! the occasional day-first European rendering. Canonicalization strips all
//! non-digits and insists on exactly eight remaining digits; anything else is
//! a parse error the caller degrades to a Warning finding.

use chrono::NaiveDate;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DateParseError {
    #[error("expected 8 digits after cleanup, found {0}")]
    WrongLength(usize),
    #[error("digits '{0}' do not form a calendar date")]
    InvalidDate(String),
}

/// Canonicalize a raw date string to a calendar date.
///
/// Digits are read as MMDDYYYY; when that month field is impossible the
/// day-first reading (DDMMYYYY) is tried before giving up, matching the
/// forgiving parsing the upstream forms require.
pub fn canonicalize(raw: &str) -> Result<NaiveDate, DateParseError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 8 {
        return Err(DateParseError::WrongLength(digits.len()));
    }

    let first: u32 = digits[0..2].parse().expect("two digits");
    let second: u32 = digits[2..4].parse().expect("two digits");
    let year: i32 = digits[4..8].parse().expect("four digits");

    NaiveDate::from_ymd_opt(year, first, second)
        .or_else(|| NaiveDate::from_ymd_opt(year, second, first))
        .ok_or(DateParseError::InvalidDate(digits))
}

/// Of two raw date strings, return the one naming the later calendar date.
/// Ties go to the second argument.
pub fn latest_of<'a>(a: &'a str, b: &'a str) -> Result<&'a str, DateParseError> {
    let parsed_a = canonicalize(a)?;
    let parsed_b = canonicalize(b)?;
    if parsed_a > parsed_b {
        Ok(a)
    } else {
        Ok(b)
    }
}

/// Inclusive range test. `end` of `None` means the window is still open
/// (the current form cycle).
pub fn is_between(
    raw: &str,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> Result<bool, DateParseError> {
    let date = canonicalize(raw)?;
    Ok(date >= start && end.map(|e| date <= e).unwrap_or(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn canonicalize_accepts_common_renderings() {
        for raw in ["06/01/2019", "06-01-2019", "06012019", " 06 01 2019 "] {
            assert_eq!(canonicalize(raw), Ok(ymd(2019, 6, 1)));
        }
    }

    #[test]
    fn canonicalize_falls_back_to_day_first() {
        // 30 cannot be a month, so the day-first reading applies.
        assert_eq!(canonicalize("30-06-2026"), Ok(ymd(2026, 6, 30)));
    }

    #[test]
    fn canonicalize_rejects_wrong_length() {
        assert_eq!(canonicalize("6/1/19"), Err(DateParseError::WrongLength(6)));
        assert_eq!(canonicalize(""), Err(DateParseError::WrongLength(0)));
    }

    #[test]
    fn canonicalize_rejects_impossible_dates() {
        assert!(matches!(
            canonicalize("13-13-2020"),
            Err(DateParseError::InvalidDate(_))
        ));
    }

    #[test]
    fn latest_of_returns_later_source_string() {
        assert_eq!(latest_of("01/01/2020", "06/01/2019"), Ok("01/01/2020"));
        assert_eq!(latest_of("06/01/2019", "01/01/2020"), Ok("01/01/2020"));
    }

    #[test]
    fn is_between_bounds_are_inclusive() {
        let start = ymd(2020, 2, 1);
        let end = Some(ymd(2023, 6, 29));
        assert_eq!(is_between("02/01/2020", start, end), Ok(true));
        assert_eq!(is_between("06/29/2023", start, end), Ok(true));
        assert_eq!(is_between("06/30/2023", start, end), Ok(false));
        assert_eq!(is_between("06/30/2023", start, None), Ok(true));
    }
}
