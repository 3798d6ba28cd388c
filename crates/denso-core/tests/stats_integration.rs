//! Statistics over a session log built the way the app builds it.

use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use denso_core::stats::{compute_stats, week_start, MIN_DAILY_TIME};
use denso_core::{Session, SessionLog, StatsCache};

fn tz() -> FixedOffset {
    FixedOffset::west_opt(5 * 3600).unwrap()
}

fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
    tz().with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn log_at(log: &SessionLog, at: DateTime<FixedOffset>, secs: u64, subject: Option<&str>) {
    log.append_in(
        secs,
        subject.map(str::to_owned),
        at.timestamp_millis(),
        &tz(),
    )
    .unwrap();
}

// ============================================================================
// Streak continuity
// ============================================================================

#[test]
fn streak_alive_from_yesterday() {
    let today = local(2024, 6, 13, 9, 0);
    let log = SessionLog::new();
    log_at(&log, today - Duration::days(2), MIN_DAILY_TIME, None);
    log_at(&log, today - Duration::days(1), MIN_DAILY_TIME, None);

    let stats = compute_stats(&log.snapshot(), 0, &today);
    assert_eq!(stats.streak, 2);
    assert_eq!(stats.today_total, 0);
}

#[test]
fn streak_broken_by_an_empty_day() {
    let today = local(2024, 6, 13, 9, 0);
    let log = SessionLog::new();
    log_at(&log, today - Duration::days(3), MIN_DAILY_TIME, None);
    log_at(&log, today - Duration::days(2), MIN_DAILY_TIME, None);

    assert_eq!(compute_stats(&log.snapshot(), 0, &today).streak, 0);
}

#[test]
fn short_sessions_add_up_to_a_qualifying_day() {
    let today = local(2024, 6, 13, 20, 0);
    let log = SessionLog::new();
    log_at(&log, local(2024, 6, 13, 8, 0), 1000, None);
    assert_eq!(compute_stats(&log.snapshot(), 0, &today).streak, 0);
    log_at(&log, local(2024, 6, 13, 9, 0), 500, None);
    assert_eq!(compute_stats(&log.snapshot(), 0, &today).streak, 1);
}

// ============================================================================
// Weekly aggregation
// ============================================================================

#[test]
fn sunday_late_night_belongs_to_the_previous_monday() {
    // 2024-06-16 is a Sunday.
    let sunday = local(2024, 6, 16, 23, 59);
    let log = SessionLog::new();
    log_at(&log, sunday, 600, Some("1"));
    let session = &log.snapshot()[0];
    assert_eq!(session.date, "2024-06-16");

    let stats_sunday = compute_stats(&log.snapshot(), 0, &sunday);
    assert_eq!(stats_sunday.week_total, 600);
    assert_eq!(
        week_start(sunday.date_naive()),
        local(2024, 6, 10, 0, 0).date_naive()
    );

    let next_monday = local(2024, 6, 17, 0, 1);
    let stats_monday = compute_stats(&log.snapshot(), 0, &next_monday);
    assert_eq!(stats_monday.week_total, 0);
    assert!(stats_monday.subject_time.is_empty());
}

#[test]
fn date_keys_follow_the_local_zone() {
    // 23:30 local is already the next day in UTC.
    let late = local(2024, 6, 12, 23, 30);
    let session = Session::new_in(60, None, late.timestamp_millis(), &tz());
    assert_eq!(session.date, "2024-06-12");
    let utc = Session::new_in(60, None, late.timestamp_millis(), &chrono::Utc);
    assert_eq!(utc.date, "2024-06-13");
}

#[test]
fn weekly_progress_and_subject_breakdown() {
    let now = local(2024, 6, 14, 12, 0);
    let log = SessionLog::new();
    log_at(&log, local(2024, 6, 10, 9, 0), 3600, Some("math"));
    log_at(&log, local(2024, 6, 11, 9, 0), 1800, Some("bio"));
    log_at(&log, local(2024, 6, 14, 9, 0), 1800, Some("math"));
    log_at(&log, local(2024, 6, 7, 9, 0), 9000, Some("bio"));

    let stats = compute_stats(&log.snapshot(), 14_400, &now);
    assert_eq!(stats.week_total, 7200);
    assert_eq!(stats.today_total, 1800);
    assert!((stats.weekly_progress - 0.5).abs() < 1e-9);
    assert_eq!(stats.subject_seconds(Some("math")), 5400);
    assert_eq!(stats.subject_seconds(Some("bio")), 1800);
    assert_eq!(stats.recent_sessions[0].date, "2024-06-07");
}

// ============================================================================
// Memoization
// ============================================================================

#[test]
fn cache_tracks_appends_from_other_threads() {
    let log = std::sync::Arc::new(SessionLog::new());
    let now = local(2024, 6, 14, 12, 0);
    let mut cache = StatsCache::new();
    assert_eq!(cache.get(&log, 0, &now).today_total, 0);

    let writer = {
        let log = std::sync::Arc::clone(&log);
        std::thread::spawn(move || {
            for minute in 0..10 {
                log_at(&log, local(2024, 6, 14, 8, minute), 60, None);
            }
        })
    };
    writer.join().unwrap();

    assert_eq!(cache.get(&log, 0, &now).today_total, 600);
}
