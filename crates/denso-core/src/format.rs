//! Human-readable time strings.

/// `MM:SS`, or `H:MM:SS` from one hour up.
pub fn format_time(secs: u64) -> String {
    let hrs = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    if hrs > 0 {
        format!("{hrs}:{mins:02}:{secs:02}")
    } else {
        format!("{mins:02}:{secs:02}")
    }
}

/// `Xh Ym`, or `Ym` under an hour. Seconds are dropped.
pub fn format_duration(secs: u64) -> String {
    let hrs = secs / 3600;
    let mins = (secs % 3600) / 60;
    if hrs > 0 {
        format!("{hrs}h {mins}m")
    } else {
        format!("{mins}m")
    }
}
