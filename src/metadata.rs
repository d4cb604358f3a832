//! Document metadata and the PDF date-string convention.

use std::sync::OnceLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

/// Information-dictionary fields of a document. Absent or empty entries are
/// `None`.
#[derive(Clone, Debug, Default)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<DateTime<FixedOffset>>,
    pub modification_date: Option<DateTime<FixedOffset>>,
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?:D:)(?P<year>\d{4})(?P<month>\d{2})(?P<day>\d{2})(?P<hour>\d{2})(?P<minute>\d{2})(?P<second>\d{2})(?P<tz>[+\-zZ])?(?P<tz_hour>\d{2})?'?(?P<tz_minute>\d{2})?'?",
        )
        .expect("date pattern is valid")
    })
}

/// Parse the `D:YYYYMMDDHHmmSS[Z|±HH'mm']` date convention used by the
/// information dictionary. Anything that does not match yields `None`;
/// malformed dates are common in the wild and never an error. A missing
/// timezone is treated as UTC.
#[must_use]
pub fn parse_pdf_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let caps = date_pattern().captures(raw)?;

    let number = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u32>().ok());

    let year: i32 = caps.name("year")?.as_str().parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, number("month")?, number("day")?)?;
    let time = NaiveTime::from_hms_opt(number("hour")?, number("minute")?, number("second")?)?;

    let offset_seconds = match caps.name("tz").map(|m| m.as_str()) {
        None | Some("Z") | Some("z") => 0,
        Some(sign) => {
            let hours = number("tz_hour")? as i32;
            let minutes = number("tz_minute").unwrap_or(0) as i32;
            let total = hours * 3600 + minutes * 60;
            if sign == "-" { -total } else { total }
        }
    };
    let offset = FixedOffset::east_opt(offset_seconds)?;

    NaiveDateTime::new(date, time)
        .and_local_timezone(offset)
        .single()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_utc_marker() {
        let parsed = parse_pdf_date("D:20240131120000Z").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-01-31T12:00:00+00:00");
    }

    #[test]
    fn parses_positive_offset() {
        let parsed = parse_pdf_date("D:20240131120000+02'00'").unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn parses_negative_offset_with_minutes() {
        let parsed = parse_pdf_date("D:19990715083015-05'30'").unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), -(5 * 3600 + 30 * 60));
        assert_eq!(parsed.naive_local().to_string(), "1999-07-15 08:30:15");
    }

    #[test]
    fn missing_timezone_defaults_to_utc() {
        let parsed = parse_pdf_date("D:20101231235959").unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 0);
    }

    #[test]
    fn rejects_truncated_and_garbage_input() {
        assert!(parse_pdf_date("D:2024").is_none());
        assert!(parse_pdf_date("last tuesday").is_none());
        assert!(parse_pdf_date("").is_none());
    }

    #[test]
    fn rejects_out_of_range_components() {
        assert!(parse_pdf_date("D:20241301120000Z").is_none());
        assert!(parse_pdf_date("D:20240131250000Z").is_none());
    }
}
