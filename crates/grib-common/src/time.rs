//! Time handling utilities.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::{GribIndexError, GribResult};

/// Unix-epoch seconds of a timestamp.
pub fn epoch_seconds(t: &DateTime<Utc>) -> i64 {
    t.timestamp()
}

/// Parse a query timestamp.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS` (UTC
/// assumed) and bare dates.
pub fn parse_timestamp(s: &str) -> GribResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(&format!("{}T00:00:00", s), "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    Err(GribIndexError::InvalidQuery(format!("unparseable timestamp: {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_space_separated() {
        let t = parse_timestamp("2018-08-30 00:04:00").unwrap();
        assert_eq!(t.to_rfc3339(), "2018-08-30T00:04:00+00:00");
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let t = parse_timestamp("2018-09-12T10:00:00+02:00").unwrap();
        assert_eq!(epoch_seconds(&t), parse_timestamp("2018-09-12 08:00:00").unwrap().timestamp());
    }

    #[test]
    fn test_parse_date_only() {
        let t = parse_timestamp("2018-09-12").unwrap();
        assert_eq!(t.format("%H:%M").to_string(), "00:00");
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
    }
}
