// Parsing, rounding and small statistics helpers.
//
// Everything that touches raw cell text lives here so the loader and the
// deriver can work with typed values only.
use crate::error::{ReportError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Parse a non-negative integer counter.
///
/// - Trims whitespace and strips thousands separators (`"1,234"`).
/// - Accepts integral floats such as `"1200.0"`, which spreadsheet exports
///   produce for integer columns containing blanks elsewhere.
/// - Rejects blanks, negatives, fractions and text.
pub fn parse_count(row: usize, column: &str, raw: &str) -> Result<u64> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(ReportError::parse(row, column, raw, "empty value"));
    }
    let s = s.replace(',', "");
    if let Ok(v) = s.parse::<u64>() {
        return Ok(v);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => {
            Ok(v as u64)
        }
        Ok(_) => Err(ReportError::parse(
            row,
            column,
            raw,
            "expected a non-negative integer",
        )),
        Err(_) => Err(ReportError::parse(row, column, raw, "not a number")),
    }
}

pub fn parse_f64(row: usize, column: &str, raw: &str) -> Result<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(ReportError::parse(row, column, raw, "empty value"));
    }
    // No separator stripping: "0,05" is a decimal comma, not 5.
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ReportError::parse(row, column, raw, "not a finite number")),
    }
}

/// Parse a calendar date, trying each format in order. Datetime formats are
/// accepted and truncated to their date.
pub fn parse_date(row: usize, column: &str, raw: &str, formats: &[String]) -> Result<NaiveDate> {
    let s = raw.trim();
    for fmt in formats {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    Err(ReportError::parse(row, column, raw, "unrecognised date"))
}

/// Round to `decimals` places, ties to even.
pub fn round_to(x: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (x * scale).round_ties_even() / scale
}

/// `num / den`, or `None` when the quotient is not computable.
pub fn checked_ratio(num: f64, den: f64) -> Option<f64> {
    if den == 0.0 {
        return None;
    }
    let q = num / den;
    q.is_finite().then_some(q)
}

pub fn median(mut v: Vec<f64>) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    v.sort_by(|a, b| a.total_cmp(b));
    let mid = v.len() / 2;
    if v.len() % 2 == 1 {
        Some(v[mid])
    } else {
        Some((v[mid - 1] + v[mid]) / 2.0)
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals with locale thousands separators, e.g. `1,234,567.89`.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// `format_number` for nullable values; `n/a` when not computable.
pub fn format_opt(n: Option<f64>, decimals: usize) -> String {
    n.map(|v| format_number(v, decimals))
        .unwrap_or_else(|| "n/a".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IngestConfig;

    #[test]
    fn counts_accept_separators_and_integral_floats() {
        assert_eq!(parse_count(1, "Confirmed_Cases", " 1,234 ").unwrap(), 1234);
        assert_eq!(parse_count(1, "Confirmed_Cases", "1200.0").unwrap(), 1200);
    }

    #[test]
    fn counts_reject_bad_values() {
        for raw in ["", "-3", "2.5", "many"] {
            let err = parse_count(7, "Suspected_Cases", raw).unwrap_err();
            match err {
                ReportError::Parse { row, column, .. } => {
                    assert_eq!(row, 7);
                    assert_eq!(column, "Suspected_Cases");
                }
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn fractions_reject_decimal_commas() {
        assert_eq!(parse_f64(1, "Case_Fatality_Rate", " 0.05 ").unwrap(), 0.05);
        let err = parse_f64(4, "Case_Fatality_Rate", "0,05").unwrap_err();
        assert!(matches!(err, ReportError::Parse { row: 4, .. }));
    }

    #[test]
    fn dates_try_each_format() {
        let formats = IngestConfig::default().date_formats;
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        for raw in ["2024-03-09", "2024-03-09 00:00:00", "03/09/2024", "09-Mar-2024"] {
            assert_eq!(parse_date(1, "Report_Date", raw, &formats).unwrap(), expected);
        }
        assert!(parse_date(1, "Report_Date", "last week", &formats).is_err());
    }

    #[test]
    fn rounding_is_half_to_even() {
        assert_eq!(round_to(0.25, 1), 0.2);
        assert_eq!(round_to(0.35, 1), 0.4);
        assert_eq!(round_to(2.5, 0), 2.0);
        assert_eq!(round_to(3.5, 0), 4.0);
    }

    #[test]
    fn checked_ratio_guards_zero() {
        assert_eq!(checked_ratio(500.0, 0.0), None);
        assert_eq!(checked_ratio(0.0, 0.0), None);
        assert_eq!(checked_ratio(3.0, 2.0), Some(1.5));
    }

    #[test]
    fn median_of_even_and_odd() {
        assert_eq!(median(vec![]), None);
        assert_eq!(median(vec![3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(vec![4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn numbers_get_separators() {
        assert_eq!(format_number(19_380_000.0, 0), "19,380,000");
        assert_eq!(format_number(-1234.5, 1), "-1,234.5");
        assert_eq!(format_opt(None, 1), "n/a");
        assert_eq!(format_int(9855u64), "9,855");
    }
}
