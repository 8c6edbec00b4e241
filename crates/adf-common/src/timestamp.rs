//! Wire timestamps
//!
//! The submission format wants local date-times with an explicit numeric
//! UTC offset, e.g. `2014-05-01T00:00:00-04:00`. Stored MGI dates are naive
//! local times in US/Eastern; the offset must be computed for the stored
//! date itself so that dates on the far side of a daylight-saving boundary
//! get the historically correct offset.

use chrono::{LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::America::New_York;
use chrono_tz::Tz;

use crate::error::{AdfError, Result};

/// Reference timezone for all stored MGI dates.
const MGI_TZ: Tz = New_York;

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";
const STORED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The current instant, formatted for the wire.
pub fn now() -> String {
    Utc::now().with_timezone(&MGI_TZ).format(WIRE_FORMAT).to_string()
}

/// Format a stored date-time string (`YYYY-MM-DD HH:MM:SS`).
///
/// A string that does not match the pattern is an error, not a best-effort
/// parse.
pub fn format_stored(s: &str) -> Result<String> {
    let naive = NaiveDateTime::parse_from_str(s, STORED_FORMAT)
        .map_err(|_| AdfError::MalformedTimestamp(s.to_string()))?;
    format_datetime(naive)
}

/// Format an already-typed naive date-time as an Eastern local time.
///
/// Ambiguous local times (the repeated fall-back hour) resolve to the
/// earlier offset. Nonexistent local times (the spring-forward gap) are an
/// error; MGI audit stamps should never land in one.
pub fn format_datetime(naive: NaiveDateTime) -> Result<String> {
    let local = match MGI_TZ.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earlier, _) => earlier,
        LocalResult::None => {
            return Err(AdfError::MalformedTimestamp(naive.to_string()));
        }
    };
    Ok(local.format(WIRE_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winter_date_gets_standard_offset() {
        let ts = format_stored("2007-01-15 00:00:00").unwrap();
        assert_eq!(ts, "2007-01-15T00:00:00-05:00");
    }

    #[test]
    fn test_summer_date_gets_daylight_offset() {
        let ts = format_stored("2014-05-01 00:00:00").unwrap();
        assert_eq!(ts, "2014-05-01T00:00:00-04:00");
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        assert!(matches!(
            format_stored("2014/05/01"),
            Err(AdfError::MalformedTimestamp(_))
        ));
        assert!(format_stored("2014-05-01T00:00:00").is_err());
        assert!(format_stored("").is_err());
    }

    #[test]
    fn test_ambiguous_fall_back_hour_resolves_early() {
        // 2014-11-02 01:30 occurred twice; the earlier instant is EDT.
        let ts = format_stored("2014-11-02 01:30:00").unwrap();
        assert_eq!(ts, "2014-11-02T01:30:00-04:00");
    }

    #[test]
    fn test_spring_forward_gap_is_an_error() {
        // 2014-03-09 02:30 never existed in US/Eastern.
        assert!(format_stored("2014-03-09 02:30:00").is_err());
    }

    #[test]
    fn test_now_has_numeric_offset_suffix() {
        let ts = now();
        let offset = &ts[ts.len() - 6..];
        assert!(offset == "-05:00" || offset == "-04:00", "offset was {offset}");
    }
}
