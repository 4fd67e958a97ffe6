//! Active Directory timestamp formats
//!
//! - `pwdLastSet` and friends are FILETIME values: 100ns ticks since
//!   1601-01-01 UTC, as a decimal string.
//! - `whenCreated` / `whenChanged` are GeneralizedTime: `YYYYMMDDHHMMSS.0Z`.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Seconds between 1601-01-01 and 1970-01-01.
const EPOCH_DIFFERENCE_SECS: i64 = 11_644_473_600;
const TICKS_PER_SECOND: i64 = 10_000_000;

/// Convert a FILETIME tick count to UTC. Zero ("must change at next logon")
/// and negative values have no meaningful time and yield `None`.
pub fn from_filetime(ticks: i64) -> Option<DateTime<Utc>> {
    if ticks <= 0 {
        return None;
    }
    let secs = ticks / TICKS_PER_SECOND - EPOCH_DIFFERENCE_SECS;
    let nanos = (ticks % TICKS_PER_SECOND) * 100;
    DateTime::from_timestamp(secs, nanos as u32)
}

/// Convert UTC to a FILETIME tick count.
pub fn to_filetime(time: DateTime<Utc>) -> i64 {
    (time.timestamp() + EPOCH_DIFFERENCE_SECS) * TICKS_PER_SECOND
        + i64::from(time.timestamp_subsec_nanos()) / 100
}

/// Parse the decimal string form of a FILETIME attribute.
pub fn parse_filetime(raw: &str) -> Option<DateTime<Utc>> {
    raw.trim().parse::<i64>().ok().and_then(from_filetime)
}

/// Parse a GeneralizedTime value. Fractional seconds are ignored.
pub fn parse_generalized_time(raw: &str) -> Option<DateTime<Utc>> {
    let digits = raw.get(..14)?;
    NaiveDateTime::parse_from_str(digits, "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_unix_epoch_in_filetime() {
        let epoch = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(to_filetime(epoch), 116_444_736_000_000_000);
        assert_eq!(from_filetime(116_444_736_000_000_000), Some(epoch));
    }

    #[test]
    fn test_known_pwd_last_set() {
        // 2024-01-15 12:00:00 UTC
        let parsed = parse_filetime("133497936000000000").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_filetime_round_trip_keeps_sub_second_ticks() {
        let time = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 15).unwrap()
            + chrono::Duration::microseconds(250_300);
        assert_eq!(from_filetime(to_filetime(time)), Some(time));
    }

    #[test]
    fn test_unset_filetime() {
        assert!(parse_filetime("0").is_none());
        assert!(parse_filetime("-1").is_none());
        assert!(parse_filetime("never").is_none());
    }

    #[test]
    fn test_generalized_time() {
        assert_eq!(
            parse_generalized_time("20240620153045.0Z"),
            Some(Utc.with_ymd_and_hms(2024, 6, 20, 15, 30, 45).unwrap())
        );
        assert!(parse_generalized_time("2024").is_none());
        assert!(parse_generalized_time("20241340000000.0Z").is_none());
    }
}
