//! Time formatting utilities.

use chrono::{DateTime, Utc};

/// Format an elapsed duration given in milliseconds.
///
/// Sub-second values print as `NNNms`; longer values as the largest two
/// non-zero units (`1d 2h`, `3h 4m`, `5m 6s`, `7.2s`).
#[must_use]
pub fn format_elapsed_ms(ms: u64) -> String {
    const SECOND: u64 = 1_000;
    const MINUTE: u64 = 60 * SECOND;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;

    if ms < SECOND {
        return format!("{ms}ms");
    }
    if ms < MINUTE {
        let tenths = (ms % SECOND) / 100;
        return if tenths == 0 {
            format!("{}s", ms / SECOND)
        } else {
            format!("{}.{tenths}s", ms / SECOND)
        };
    }

    let (major, major_unit, minor, minor_unit) = if ms >= DAY {
        (ms / DAY, "d", (ms % DAY) / HOUR, "h")
    } else if ms >= HOUR {
        (ms / HOUR, "h", (ms % HOUR) / MINUTE, "m")
    } else {
        (ms / MINUTE, "m", (ms % MINUTE) / SECOND, "s")
    };

    if minor == 0 {
        format!("{major}{major_unit}")
    } else {
        format!("{major}{major_unit} {minor}{minor_unit}")
    }
}

/// Format a relative time (past or future).
#[must_use]
pub fn format_relative_time(target: DateTime<Utc>) -> String {
    format_relative_time_from(target, Utc::now())
}

/// Format `target` relative to an explicit `now`.
#[must_use]
pub fn format_relative_time_from(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(target);

    if duration.num_seconds().abs() < 60 {
        return "just now".to_string();
    }

    let minutes = duration.num_minutes().abs();
    let hours = duration.num_hours().abs();
    let days = duration.num_days().abs();

    let suffix = if duration.num_seconds() > 0 {
        "ago"
    } else {
        "from now"
    };

    if days > 0 {
        format!("{days} day{} {suffix}", if days == 1 { "" } else { "s" })
    } else if hours > 0 {
        format!("{hours} hour{} {suffix}", if hours == 1 { "" } else { "s" })
    } else {
        format!(
            "{minutes} minute{} {suffix}",
            if minutes == 1 { "" } else { "s" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn elapsed_sub_second() {
        assert_eq!(format_elapsed_ms(0), "0ms");
        assert_eq!(format_elapsed_ms(450), "450ms");
    }

    #[test]
    fn elapsed_seconds() {
        assert_eq!(format_elapsed_ms(1_000), "1s");
        assert_eq!(format_elapsed_ms(7_250), "7.2s");
    }

    #[test]
    fn elapsed_two_largest_units() {
        assert_eq!(format_elapsed_ms(65_000), "1m 5s");
        assert_eq!(format_elapsed_ms(3_600_000), "1h");
        assert_eq!(format_elapsed_ms(3_720_000), "1h 2m");
        assert_eq!(format_elapsed_ms(90_000_000), "1d 1h");
    }

    #[test]
    fn relative_time_past() {
        let now = Utc::now();
        assert_eq!(
            format_relative_time_from(now - Duration::hours(2), now),
            "2 hours ago"
        );
        assert_eq!(format_relative_time_from(now, now), "just now");
    }

    #[test]
    fn relative_time_future() {
        let now = Utc::now();
        assert_eq!(
            format_relative_time_from(now + Duration::days(1) + Duration::minutes(1), now),
            "1 day from now"
        );
    }
}
