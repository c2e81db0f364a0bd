// Utility helpers for parsing and formatting.
//
// This module centralizes the "dirty" CSV text handling so the rest of the
// code can assume clean, typed values.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

use crate::error::ReportError;

/// Split an occurrence date in literal `DD/MM/YYYY` text form into its
/// derived `(ano, mes)` fields.
///
/// The field must split into exactly three parts; anything else is a
/// `MalformedDate` error. No calendar validation happens here, that is
/// `parse_occurrence_date`'s job.
pub fn split_occurrence_date(raw: &str) -> Result<(String, String), ReportError> {
    let parts: Vec<&str> = raw.trim().split('/').collect();
    if parts.len() != 3 {
        return Err(ReportError::MalformedDate {
            value: raw.to_string(),
        });
    }
    Ok((parts[2].to_string(), parts[1].to_string()))
}

/// Parse an occurrence date (`DD/MM/YYYY`) into a `NaiveDate`.
pub fn parse_occurrence_date(raw: &str) -> Result<NaiveDate, ReportError> {
    NaiveDate::parse_from_str(raw.trim(), "%d/%m/%Y").map_err(|_| ReportError::MalformedDate {
        value: raw.to_string(),
    })
}

/// Parse a filter boundary in ISO `YYYY-MM-DD` form, as a date picker emits.
pub fn parse_filter_date(raw: &str) -> Result<NaiveDate, ReportError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ReportError::InvalidDate {
        value: raw.to_string(),
    })
}

/// Trim an optional text cell; empty cells become `None`.
pub fn non_empty(s: Option<String>) -> Option<String> {
    let s = s?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a count column while being forgiving about formatting issues that
/// are common in CSV exports (empty cells, float spellings like `3.0`).
/// Returns `None` for anything that cannot be safely parsed.
pub fn parse_count(s: Option<&str>) -> Option<i64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if let Ok(n) = s.parse::<i64>() {
        return Some(n);
    }
    s.parse::<f64>().ok().map(|f| f as i64)
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for integer-like values, used for
    // counts in console messages (e.g., `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_day_month_year() {
        let (ano, mes) = split_occurrence_date("03/01/2010").unwrap();
        assert_eq!(ano, "2010");
        assert_eq!(mes, "01");
    }

    #[test]
    fn rejects_date_without_three_parts() {
        assert!(matches!(
            split_occurrence_date("2010-01-03"),
            Err(ReportError::MalformedDate { .. })
        ));
        assert!(matches!(
            split_occurrence_date(""),
            Err(ReportError::MalformedDate { .. })
        ));
    }

    #[test]
    fn parses_occurrence_and_filter_dates() {
        assert_eq!(
            parse_occurrence_date("31/12/2019").unwrap(),
            NaiveDate::from_ymd_opt(2019, 12, 31).unwrap()
        );
        assert_eq!(
            parse_filter_date("2015-01-01").unwrap(),
            NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
        );
        assert!(matches!(
            parse_filter_date("01-01-2015"),
            Err(ReportError::InvalidDate { .. })
        ));
    }

    #[test]
    fn count_parsing_is_lenient() {
        assert_eq!(parse_count(Some("3")), Some(3));
        assert_eq!(parse_count(Some("3.0")), Some(3));
        assert_eq!(parse_count(Some("")), None);
        assert_eq!(parse_count(Some("n/a")), None);
        assert_eq!(parse_count(None), None);
    }
}
