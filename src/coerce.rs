//! Value coercion between raw CSV text and typed cells.
//!
//! Source datasets store numbers in a mix of plain and locale formats (comma
//! decimal separator), and a small number of cells carry trailing garbage.
//! The coercion pipeline is fixed: normalize separators, attempt a direct
//! parse, then fall back to extracting a leading numeric substring. Callers
//! depend on this exact order.

use lazy_static::lazy_static;
use regex::Regex;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, PrimitiveDateTime};

lazy_static! {
    /// Leading numeric substring, applied after separator normalization.
    static ref LEADING_NUMBER: Regex = Regex::new(r"^(\d+\.?\d*)").unwrap();
}

/// `YYYY-MM-DD`
const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
/// `YYYY-MM-DD HH:MM:SS`
const DATETIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
/// `YYYY-MM-DDTHH:MM:SS`
const DATETIME_T_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
/// `YYYY/MM/DD`
const DATE_SLASH_FORMAT: &[FormatItem<'static>] = format_description!("[year]/[month]/[day]");

/// Coerce a raw cell to a number.
///
/// Commas are normalized to dots first, so `"1,5"` parses as `1.5`. If the
/// normalized string still fails to parse, a leading numeric substring is
/// extracted instead, so `"1,234.5x"` normalizes to `"1.234.5x"` and coerces
/// to `1.234`. Values with no leading number are missing.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = trimmed.replace(',', ".");
    if let Ok(value) = normalized.parse::<f64>() {
        return Some(value);
    }
    LEADING_NUMBER
        .captures(&normalized)
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Parse a cell as a number without any normalization or extraction.
///
/// Used at decode time to decide whether a whole column is numeric.
pub fn parse_numeric_strict(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

/// Parse a cell as a number after comma-to-dot normalization only.
///
/// Used at decode time for the columns known to use a comma decimal
/// separator.
pub fn parse_numeric_locale(raw: &str) -> Option<f64> {
    raw.trim().replace(',', ".").parse::<f64>().ok()
}

/// Parse a cell as an integer.
pub fn parse_integer(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Parse a cell as a day-granularity date.
///
/// Accepts `YYYY-MM-DD` and `YYYY/MM/DD` dates, plus space- or T-separated
/// timestamps which are truncated to their date component.
pub fn parse_date(raw: &str) -> Option<Date> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = Date::parse(trimmed, DATE_FORMAT) {
        return Some(date);
    }
    if let Ok(date) = Date::parse(trimmed, DATE_SLASH_FORMAT) {
        return Some(date);
    }
    PrimitiveDateTime::parse(trimmed, DATETIME_FORMAT)
        .or_else(|_| PrimitiveDateTime::parse(trimmed, DATETIME_T_FORMAT))
        .map(|datetime| datetime.date())
        .ok()
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

/// Quarter bucket label for a date, e.g. `2020Q1`.
pub fn quarter_label(date: Date) -> String {
    let quarter = (u8::from(date.month()) - 1) / 3 + 1;
    format!("{}Q{}", date.year(), quarter)
}

/// Round to two decimal places for display-oriented endpoints.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn numeric_plain() {
        assert_eq!(Some(42.5), parse_numeric("42.5"));
        assert_eq!(Some(-3.0), parse_numeric(" -3 "));
    }

    #[test]
    fn numeric_comma_separator() {
        assert_eq!(Some(12.75), parse_numeric("12,75"));
    }

    #[test]
    fn numeric_leading_extraction() {
        // Comma-to-dot runs first: "1,234.5x" becomes "1.234.5x", which does
        // not parse, so the leading number "1.234" is extracted.
        assert_eq!(Some(1.234), parse_numeric("1,234.5x"));
        assert_eq!(Some(17.0), parse_numeric("17 px"));
    }

    #[test]
    fn numeric_unparseable() {
        assert_eq!(None, parse_numeric(""));
        assert_eq!(None, parse_numeric("   "));
        assert_eq!(None, parse_numeric("n/a"));
    }

    #[test]
    fn numeric_strict_rejects_locale() {
        assert_eq!(None, parse_numeric_strict("12,75"));
        assert_eq!(Some(12.75), parse_numeric_locale("12,75"));
    }

    #[test]
    fn date_formats() {
        assert_eq!(Some(date!(2020 - 01 - 15)), parse_date("2020-01-15"));
        assert_eq!(Some(date!(2020 - 01 - 15)), parse_date("2020/01/15"));
        assert_eq!(
            Some(date!(2020 - 01 - 15)),
            parse_date("2020-01-15 12:30:00")
        );
        assert_eq!(
            Some(date!(2020 - 01 - 15)),
            parse_date("2020-01-15T00:00:00")
        );
        assert_eq!(None, parse_date("15/01/2020"));
        assert_eq!(None, parse_date(""));
    }

    #[test]
    fn date_round_trip() {
        assert_eq!("2021-06-20", format_date(date!(2021 - 06 - 20)));
    }

    #[test]
    fn quarter_labels() {
        assert_eq!("2020Q1", quarter_label(date!(2020 - 03 - 31)));
        assert_eq!("2020Q2", quarter_label(date!(2020 - 04 - 01)));
        assert_eq!("2021Q4", quarter_label(date!(2021 - 12 - 01)));
    }

    #[test]
    fn rounding() {
        assert_eq!(1.23, round2(1.2345));
        assert_eq!(1.24, round2(1.235));
    }
}
