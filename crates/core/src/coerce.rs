//! Best-effort conversion between component text and typed values.
//!
//! Every `to_*` function returns `None` when the text does not convert; a
//! field may legitimately hold text that is present but not valid for its
//! kind, and validating that is not the parser's job. The `format_*`
//! functions produce the wire representation.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::grammar::tables::{DateFormat, TimeFormat};

/// An ISO 4217 currency code: three uppercase ASCII letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    /// Validate and wrap a currency code.
    pub fn new(code: &str) -> Option<Self> {
        (code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()))
            .then(|| Self(code.to_string()))
    }

    /// The three-letter code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Unsigned whole number.
pub fn to_int(s: &str) -> Option<i64> {
    if !all_digits(s) {
        return None;
    }
    s.parse().ok()
}

/// Amount with the comma decimal separator (`"1234,56"`, `"1234,"`, `",5"`).
///
/// A `.` is never accepted, and at most one comma may appear.
pub fn to_decimal(s: &str) -> Option<Decimal> {
    let (int, frac) = match s.split_once(',') {
        Some((int, frac)) => (int, frac),
        None => (s, ""),
    };
    if frac.contains(',') || (int.is_empty() && frac.is_empty()) {
        return None;
    }
    if !(int.is_empty() || all_digits(int)) || !(frac.is_empty() || all_digits(frac)) {
        return None;
    }
    let int = if int.is_empty() { "0" } else { int };
    let frac = if frac.is_empty() { "0" } else { frac };
    Decimal::from_str(&format!("{int}.{frac}")).ok()
}

/// Wire form of an amount: comma separator, no trailing zeros, and always a
/// comma (`1234` → `"1234,"`, `12.50` → `"12,5"`).
pub fn format_decimal(value: &Decimal) -> String {
    let text = value.normalize().to_string();
    match text.split_once('.') {
        Some((int, frac)) => format!("{int},{frac}"),
        None => format!("{text},"),
    }
}

/// Date in the given wire format.
///
/// Two-digit years follow chrono's `%y` pivot (`00`–`68` → 20xx, `69`–`99`
/// → 19xx). `MMDD` dates carry no year and need `reference_year`.
pub fn to_date(s: &str, format: DateFormat, reference_year: Option<i32>) -> Option<NaiveDate> {
    if s.len() != format.width() || !all_digits(s) {
        return None;
    }
    match format {
        DateFormat::Yymmdd => NaiveDate::parse_from_str(s, "%y%m%d").ok(),
        DateFormat::Yyyymmdd => NaiveDate::parse_from_str(s, "%Y%m%d").ok(),
        DateFormat::Mmdd => {
            let month = s[..2].parse().ok()?;
            let day = s[2..].parse().ok()?;
            NaiveDate::from_ymd_opt(reference_year?, month, day)
        }
    }
}

/// Wire form of a date.
pub fn format_date(date: NaiveDate, format: DateFormat) -> String {
    match format {
        DateFormat::Yymmdd => date.format("%y%m%d").to_string(),
        DateFormat::Yyyymmdd => date.format("%Y%m%d").to_string(),
        DateFormat::Mmdd => format!("{:02}{:02}", date.month(), date.day()),
    }
}

/// Time of day in the given wire format.
pub fn to_time(s: &str, format: TimeFormat) -> Option<NaiveTime> {
    if s.len() != format.width() || !all_digits(s) {
        return None;
    }
    match format {
        TimeFormat::Hhmm => NaiveTime::parse_from_str(s, "%H%M").ok(),
        TimeFormat::Hhmmss => NaiveTime::parse_from_str(s, "%H%M%S").ok(),
    }
}

/// Wire form of a time of day.
pub fn format_time(time: NaiveTime, format: TimeFormat) -> String {
    match format {
        TimeFormat::Hhmm => time.format("%H%M").to_string(),
        TimeFormat::Hhmmss => time.format("%H%M%S").to_string(),
    }
}

/// Currency code.
pub fn to_currency(s: &str) -> Option<Currency> {
    Currency::new(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_digits_only() {
        assert_eq!(to_int("0042"), Some(42));
        assert_eq!(to_int("-1"), None);
        assert_eq!(to_int("+1"), None);
        assert_eq!(to_int(""), None);
        assert_eq!(to_int("99999999999999999999"), None);
    }

    #[test]
    fn decimals_use_comma() {
        assert_eq!(to_decimal("1234,56"), Decimal::from_str("1234.56").ok());
        assert_eq!(to_decimal("1234,"), Decimal::from_str("1234").ok());
        assert_eq!(to_decimal(",5"), Decimal::from_str("0.5").ok());
        assert_eq!(to_decimal("1000"), Decimal::from_str("1000").ok());
    }

    #[test]
    fn malformed_decimals_are_none() {
        for bad in ["", ",", "12.5", "1,2,3", "12a,5", "1,-5", "N12,"] {
            assert_eq!(to_decimal(bad), None, "{bad:?}");
        }
    }

    #[test]
    fn decimal_wire_form() {
        let d = |s: &str| Decimal::from_str(s).expect("decimal literal");
        assert_eq!(format_decimal(&d("1234")), "1234,");
        assert_eq!(format_decimal(&d("12.50")), "12,5");
        assert_eq!(format_decimal(&d("0.01")), "0,01");
        assert_eq!(to_decimal(&format_decimal(&d("987.65"))), Some(d("987.65")));
    }

    #[test]
    fn dates_by_format() {
        let ymd = |y, m, d| NaiveDate::from_ymd_opt(y, m, d);
        assert_eq!(to_date("231015", DateFormat::Yymmdd, None), ymd(2023, 10, 15));
        assert_eq!(to_date("20231015", DateFormat::Yyyymmdd, None), ymd(2023, 10, 15));
        assert_eq!(to_date("1016", DateFormat::Mmdd, Some(2023)), ymd(2023, 10, 16));
        assert_eq!(to_date("1016", DateFormat::Mmdd, None), None);
        assert_eq!(to_date("231315", DateFormat::Yymmdd, None), None);
        assert_eq!(to_date("23101", DateFormat::Yymmdd, None), None);
        assert_eq!(to_date("0229", DateFormat::Mmdd, Some(2023)), None);
    }

    #[test]
    fn date_wire_form() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 9).expect("valid date");
        assert_eq!(format_date(date, DateFormat::Yymmdd), "240209");
        assert_eq!(format_date(date, DateFormat::Yyyymmdd), "20240209");
        assert_eq!(format_date(date, DateFormat::Mmdd), "0209");
    }

    #[test]
    fn times_by_format() {
        let t = NaiveTime::from_hms_opt(10, 30, 5).expect("valid time");
        assert_eq!(to_time("103005", TimeFormat::Hhmmss), Some(t));
        assert_eq!(
            to_time("1030", TimeFormat::Hhmm),
            NaiveTime::from_hms_opt(10, 30, 0)
        );
        assert_eq!(to_time("2460", TimeFormat::Hhmm), None);
        assert_eq!(format_time(t, TimeFormat::Hhmm), "1030");
        assert_eq!(format_time(t, TimeFormat::Hhmmss), "103005");
    }

    #[test]
    fn currency_codes() {
        assert_eq!(to_currency("EUR").map(|c| c.to_string()), Some("EUR".into()));
        assert_eq!(to_currency("eur"), None);
        assert_eq!(to_currency("EURO"), None);
    }
}
