//! Reporting calendar of a business and half-open time windows.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::AnalyticsError;

/// Reference instant plus the timezone that defines calendar days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportingClock {
    timezone: Tz,
    now: DateTime<Utc>,
}

impl ReportingClock {
    pub fn new(timezone: Tz, now: DateTime<Utc>) -> Self {
        Self { timezone, now }
    }

    /// Clock pinned to the current system time.
    pub fn system(timezone: Tz) -> Self {
        Self::new(timezone, Utc::now())
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Calendar day containing `now`.
    pub fn today(&self) -> NaiveDate {
        self.local_date(self.now)
    }

    /// Calendar day an instant falls on.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }

    pub fn local_datetime(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.timezone).naive_local()
    }

    /// First instant of a calendar day.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        self.localize(date.and_time(NaiveTime::MIN))
    }

    /// Maps a wall-clock time to an instant. Ambiguous times take the earlier
    /// instant; times skipped by a DST jump move forward to the first valid
    /// hour.
    pub fn localize(&self, local: NaiveDateTime) -> DateTime<Utc> {
        (0..=3)
            .find_map(|hours| {
                self.timezone
                    .from_local_datetime(&(local + Duration::hours(hours)))
                    .earliest()
            })
            .map(|instant| instant.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&local))
    }
}

/// Half-open interval `[start, end_exclusive)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    start: DateTime<Utc>,
    end_exclusive: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end_exclusive: DateTime<Utc>) -> Result<Self, AnalyticsError> {
        if end_exclusive <= start {
            return Err(AnalyticsError::InvalidWindow(format!(
                "end {end_exclusive} is not after start {start}"
            )));
        }
        Ok(Self {
            start,
            end_exclusive,
        })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end_exclusive(&self) -> DateTime<Utc> {
        self.end_exclusive
    }

    pub fn duration(&self) -> Duration {
        self.end_exclusive - self.start
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end_exclusive
    }

    pub fn overlaps(&self, other: &Window) -> bool {
        self.start < other.end_exclusive && other.start < self.end_exclusive
    }

    /// Whole calendar days covered, rounding a partial day up.
    ///
    /// Counted on the reporting calendar so a 23h or 25h DST day still
    /// counts as one day.
    pub fn calendar_days(&self, clock: &ReportingClock) -> u32 {
        let start = clock.local_datetime(self.start);
        let end = clock.local_datetime(self.end_exclusive);
        let whole = (end.date() - start.date()).num_days();
        let partial = i64::from(end.time() > start.time());
        u32::try_from((whole + partial).max(1)).unwrap_or(u32::MAX)
    }

    /// Two windows are comparable when they span the same number of days.
    pub fn is_comparable(&self, other: &Window, clock: &ReportingClock) -> bool {
        self.calendar_days(clock) == other.calendar_days(clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn window_rejects_non_positive_duration() {
        let at = utc(2026, 10, 18, 0);
        assert!(matches!(
            Window::new(at, at),
            Err(AnalyticsError::InvalidWindow(_))
        ));
        assert!(Window::new(at, at - Duration::hours(1)).is_err());
    }

    #[test]
    fn window_is_half_open() {
        let window = Window::new(utc(2026, 10, 17, 0), utc(2026, 10, 18, 0)).unwrap();
        assert!(window.contains(utc(2026, 10, 17, 0)));
        assert!(window.contains(utc(2026, 10, 17, 23)));
        assert!(!window.contains(utc(2026, 10, 18, 0)));
    }

    #[test]
    fn start_of_day_follows_reporting_timezone() {
        let clock = ReportingClock::new(chrono_tz::America::New_York, utc(2026, 10, 18, 2));
        // 02:00 UTC is still the 17th in New York (EDT, UTC-4).
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 10, 17).unwrap());
        assert_eq!(clock.start_of_day(clock.today()), utc(2026, 10, 17, 4));
    }

    #[test]
    fn dst_day_counts_as_one_calendar_day() {
        let clock = ReportingClock::new(chrono_tz::America::New_York, utc(2026, 11, 2, 12));
        let day = NaiveDate::from_ymd_opt(2026, 11, 1).unwrap();
        let window = Window::new(
            clock.start_of_day(day),
            clock.start_of_day(day.succ_opt().unwrap()),
        )
        .unwrap();
        assert_eq!(window.duration(), Duration::hours(25));
        assert_eq!(window.calendar_days(&clock), 1);
    }

    #[test]
    fn partial_days_round_up() {
        let clock = ReportingClock::new(Tz::UTC, utc(2026, 10, 18, 0));
        let window = Window::new(utc(2026, 10, 16, 10), utc(2026, 10, 18, 9)).unwrap();
        assert_eq!(window.calendar_days(&clock), 2);
        let short = Window::new(utc(2026, 10, 16, 10), utc(2026, 10, 16, 11)).unwrap();
        assert_eq!(short.calendar_days(&clock), 1);
    }
}
