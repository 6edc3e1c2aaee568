use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

/// Sleep and wake instants as stored on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepWindow {
    pub sleeping_at: OffsetDateTime,
    pub wakeup_at: OffsetDateTime,
}

impl SleepWindow {
    /// Both instants land on `date`. A wake time earlier than the sleep time is
    /// stored as-is and only read as next-day by [`sleep_duration`].
    pub fn on_date(date: Date, sleep: Time, wake: Time, offset: UtcOffset) -> Self {
        Self {
            sleeping_at: PrimitiveDateTime::new(date, sleep).assume_offset(offset),
            wakeup_at: PrimitiveDateTime::new(date, wake).assume_offset(offset),
        }
    }

    pub fn duration(&self) -> Duration {
        wake_minus_sleep(self.sleeping_at, self.wakeup_at)
    }
}

fn wake_minus_sleep(sleeping_at: OffsetDateTime, wakeup_at: OffsetDateTime) -> Duration {
    if wakeup_at <= sleeping_at {
        (wakeup_at + Duration::days(1)) - sleeping_at
    } else {
        wakeup_at - sleeping_at
    }
}

/// Elapsed sleep, treating a wake instant at or before the sleep instant as
/// falling 24 hours later. `None` when either side is missing.
pub fn sleep_duration(
    sleeping_at: Option<OffsetDateTime>,
    wakeup_at: Option<OffsetDateTime>,
) -> Option<Duration> {
    Some(wake_minus_sleep(sleeping_at?, wakeup_at?))
}

/// Total hours rounded to two decimal places, e.g. 7.5 for 7h30m.
pub fn duration_hours(d: Duration) -> f64 {
    let hours = d.as_seconds_f64() / 3600.0;
    (hours * 100.0).round() / 100.0
}

/// `"7h 30m"`, `"7h"` or `"45m"`.
pub fn format_duration(d: Duration) -> String {
    let total = d.whole_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    match (hours, minutes) {
        (h, m) if h > 0 && m > 0 => format!("{}h {}m", h, m),
        (h, _) if h > 0 => format!("{}h", h),
        (_, m) => format!("{}m", m),
    }
}

pub fn format_optional(d: Option<Duration>) -> String {
    d.map(format_duration).unwrap_or_else(|| "N/A".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, time};

    #[test]
    fn overnight_wake_is_read_as_next_day() {
        let sleep = datetime!(2025-10-15 23:00 UTC);
        let wake = datetime!(2025-10-15 07:00 UTC);
        let d = sleep_duration(Some(sleep), Some(wake)).unwrap();
        assert_eq!(d, Duration::hours(8));
        assert_eq!(d, (wake + Duration::hours(24)) - sleep);
    }

    #[test]
    fn same_day_nap_is_direct_difference() {
        let sleep = datetime!(2025-10-15 13:00 UTC);
        let wake = datetime!(2025-10-15 14:45 UTC);
        assert_eq!(
            sleep_duration(Some(sleep), Some(wake)).unwrap(),
            Duration::minutes(105)
        );
    }

    #[test]
    fn equal_instants_count_as_a_full_day() {
        let t = datetime!(2025-10-15 22:00 UTC);
        assert_eq!(sleep_duration(Some(t), Some(t)).unwrap(), Duration::days(1));
    }

    #[test]
    fn missing_side_is_none_not_zero() {
        let t = datetime!(2025-10-15 22:00 UTC);
        assert_eq!(sleep_duration(None, Some(t)), None);
        assert_eq!(sleep_duration(Some(t), None), None);
        assert_eq!(format_optional(None), "N/A");
    }

    #[test]
    fn never_negative_for_wake_before_sleep() {
        let sleep = datetime!(2025-10-15 23:55 UTC);
        for h in 0..24 {
            let wake = datetime!(2025-10-15 00:00 UTC) + Duration::hours(h);
            let d = sleep_duration(Some(sleep), Some(wake)).unwrap();
            assert!(d.is_positive());
        }
    }

    #[test]
    fn formatting() {
        assert_eq!(format_duration(Duration::minutes(7 * 60 + 30)), "7h 30m");
        assert_eq!(format_duration(Duration::hours(7)), "7h");
        assert_eq!(format_duration(Duration::minutes(45)), "45m");
        assert_eq!(format_duration(Duration::ZERO), "0m");
    }

    #[test]
    fn hours_are_rounded_to_two_places() {
        assert_eq!(duration_hours(Duration::minutes(450)), 7.5);
        assert_eq!(duration_hours(Duration::minutes(500)), 8.33);
    }

    #[test]
    fn form_window_keeps_wake_on_the_entered_date() {
        let w = SleepWindow::on_date(date!(2025-10-15), time!(22:30), time!(7:00), UtcOffset::UTC);
        assert_eq!(w.wakeup_at.date(), date!(2025-10-15));
        assert!(w.wakeup_at < w.sleeping_at);
        assert_eq!(format_duration(w.duration()), "8h 30m");
    }
}
