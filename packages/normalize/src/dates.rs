//! Parsing of the heterogeneous `date` values found in Dublin Core records.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use pubmetrics_record_models::FieldValue;

/// Placeholder written by the harvester when a record has no date.
pub const NO_DATE: &str = "No date";

/// Parses one date string.
///
/// Tries full-precision forms first (RFC 3339, ISO datetime, `YYYY-MM-DD`,
/// `YYYY-MM`) and falls back to a bare year, which maps to January 1st.
/// Returns `None` for [`NO_DATE`] and anything unparseable.
#[must_use]
pub fn parse_record_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() || value == NO_DATE {
        return None;
    }
    parse_full_precision(value).or_else(|| parse_year(value))
}

/// Returns the first parseable date of a (possibly multi-valued) field.
#[must_use]
pub fn parse_field_date(field: &FieldValue) -> Option<NaiveDate> {
    field
        .values()
        .iter()
        .find_map(|value| parse_record_date(value))
}

fn parse_full_precision(value: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.date());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d").ok()
}

fn parse_year(value: &str) -> Option<NaiveDate> {
    if value.len() != 4 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_ymd_opt(value.parse().ok()?, 1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_iso_date() {
        assert_eq!(parse_record_date("2023-06-01"), Some(ymd(2023, 6, 1)));
    }

    #[test]
    fn parses_datetimes() {
        assert_eq!(
            parse_record_date("2024-01-15T14:30:00Z"),
            Some(ymd(2024, 1, 15))
        );
        assert_eq!(
            parse_record_date("2024-01-15T14:30:00.123"),
            Some(ymd(2024, 1, 15))
        );
        assert_eq!(
            parse_record_date("2024-01-15T14:30:00"),
            Some(ymd(2024, 1, 15))
        );
    }

    #[test]
    fn parses_year_month() {
        assert_eq!(parse_record_date("2019-11"), Some(ymd(2019, 11, 1)));
    }

    #[test]
    fn falls_back_to_year() {
        assert_eq!(parse_record_date("2017"), Some(ymd(2017, 1, 1)));
        assert_eq!(parse_record_date(" 2017 "), Some(ymd(2017, 1, 1)));
    }

    #[test]
    fn rejects_placeholder_and_garbage() {
        assert!(parse_record_date(NO_DATE).is_none());
        assert!(parse_record_date("").is_none());
        assert!(parse_record_date("in review").is_none());
        assert!(parse_record_date("20170").is_none());
    }

    #[test]
    fn multi_valued_field_uses_first_parseable_entry() {
        let field = FieldValue::List(vec![
            "info:eu-repo/date/embargoEnd/unknown".to_owned(),
            "2021-03-04".to_owned(),
            "2022-01-01".to_owned(),
        ]);
        assert_eq!(parse_field_date(&field), Some(ymd(2021, 3, 4)));
    }
}
