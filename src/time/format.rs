use super::calendar::localize;
use super::{Resolution, Timestamp};
use crate::error::{HorizonError, HorizonResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat};
use chrono_tz::Tz;
use serde::Serializer;

const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
];

pub fn parse_timezone(name: &str) -> HorizonResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| HorizonError::InvalidTimezone(name.to_string()))
}

/// Parses an ISO-8601 instant and expresses it in `tz`.
///
/// Strings carrying an offset keep their instant; offset-less date-times
/// and bare dates are read as wall-clock time in `tz`.
pub fn parse_instant(text: &str, tz: Tz) -> HorizonResult<Timestamp> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&tz));
    }

    for format in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(localize(tz, naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(localize(tz, date.and_time(NaiveTime::MIN)));
    }

    Err(HorizonError::invalid_instant("instant", text))
}

/// A request field that was supplied and is not blank.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Same as [`parse_instant`], reporting failures against `field`.
pub fn parse_field(field: &str, text: &str, tz: Tz) -> HorizonResult<Timestamp> {
    parse_instant(text, tz).map_err(|_| HorizonError::invalid_instant(field, text))
}

/// RFC 3339 with millisecond precision, `Z` for a zero offset.
pub fn format_iso(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn serialize_iso<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_iso(ts))
}

pub fn format_for_display(ts: &Timestamp, resolution: Resolution) -> String {
    let pattern = match resolution {
        Resolution::Hour => "%b %d %H:%M",
        Resolution::Day | Resolution::Week => "%b %d",
        Resolution::Month => "%b %Y",
        Resolution::Year => "%Y",
    };
    ts.format(pattern).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use chrono_tz::{Asia::Kolkata, Europe::Berlin, UTC};

    #[test]
    fn test_parse_rfc3339_keeps_instant() {
        let ts = parse_instant("2024-01-01T12:00:00Z", Berlin).unwrap();
        assert_eq!(ts.naive_local().hour(), 13);
        assert_eq!(ts, UTC.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_local_forms() {
        let expected = Berlin.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        assert_eq!(parse_instant("2024-06-15T00:00:00", Berlin).unwrap(), expected);
        assert_eq!(parse_instant("2024-06-15T00:00", Berlin).unwrap(), expected);
        assert_eq!(parse_instant("2024-06-15", Berlin).unwrap(), expected);
        assert_eq!(parse_instant("2024-06-15T00:00:00.000", Berlin).unwrap(), expected);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_field("endDate", "not-a-date", UTC).unwrap_err();
        assert_eq!(err.to_string(), "Invalid endDate: not-a-date");
        assert!(parse_instant("2024-13-01", UTC).is_err());
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("Asia/Kolkata").unwrap(), Kolkata);
        assert_eq!(
            parse_timezone("Mars/Olympus").unwrap_err(),
            HorizonError::InvalidTimezone("Mars/Olympus".to_string())
        );
    }

    #[test]
    fn test_format_iso() {
        let ts = UTC.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_iso(&ts), "2024-01-01T00:00:00.000Z");
        let ts = Berlin.with_ymd_and_hms(2024, 7, 1, 8, 30, 0).unwrap();
        assert_eq!(format_iso(&ts), "2024-07-01T08:30:00.000+02:00");
    }

    #[test]
    fn test_format_for_display() {
        let ts = UTC.with_ymd_and_hms(2024, 3, 5, 7, 0, 0).unwrap();
        assert_eq!(format_for_display(&ts, Resolution::Hour), "Mar 05 07:00");
        assert_eq!(format_for_display(&ts, Resolution::Week), "Mar 05");
        assert_eq!(format_for_display(&ts, Resolution::Month), "Mar 2024");
        assert_eq!(format_for_display(&ts, Resolution::Year), "2024");
    }
}
