//! Local calendar-day bucketing.

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Utc};

/// Format used for session and calendar date keys.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Local calendar day of a millisecond timestamp.
pub fn local_date<Tz: TimeZone>(timestamp_ms: i64, tz: &Tz) -> NaiveDate {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .unwrap_or_default()
        .with_timezone(tz)
        .date_naive()
}

/// `YYYY-MM-DD` key of a millisecond timestamp in `tz`.
pub fn date_key<Tz: TimeZone>(timestamp_ms: i64, tz: &Tz) -> String {
    format_key(local_date(timestamp_ms, tz))
}

pub fn format_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn parse_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_KEY_FORMAT).ok()
}

/// Monday of the ISO week containing `date`. Sunday maps six days back.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_starts_on_monday() {
        // 2024-06-10 is a Monday.
        assert_eq!(week_start(date(2024, 6, 10)), date(2024, 6, 10));
        assert_eq!(week_start(date(2024, 6, 13)), date(2024, 6, 10));
        assert_eq!(week_start(date(2024, 6, 16)), date(2024, 6, 10));
        assert_eq!(week_start(date(2024, 6, 17)), date(2024, 6, 17));
    }

    #[test]
    fn week_start_crosses_month_boundary() {
        // 2024-09-01 is a Sunday.
        assert_eq!(week_start(date(2024, 9, 1)), date(2024, 8, 26));
    }

    #[test]
    fn date_key_is_local() {
        let minus5 = FixedOffset::west_opt(5 * 3600).unwrap();
        // 2024-06-17 02:00 UTC is still the 16th at UTC-5.
        let ts = 1_718_589_600_000;
        assert_eq!(date_key(ts, &Utc), "2024-06-17");
        assert_eq!(date_key(ts, &minus5), "2024-06-16");
    }

    #[test]
    fn keys_round_trip() {
        assert_eq!(parse_key("2024-02-29"), Some(date(2024, 2, 29)));
        assert_eq!(format_key(date(2024, 2, 9)), "2024-02-09");
        assert_eq!(parse_key("not-a-date"), None);
    }
}
