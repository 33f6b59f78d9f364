//! Symbolic reporting periods and their predecessor windows.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::clock::{ReportingClock, Window};
use crate::AnalyticsError;

/// Periods offered by the dashboard period selector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PeriodKey {
    #[serde(rename = "Today")]
    Today,
    #[serde(rename = "Last 7 days")]
    Last7Days,
    #[serde(rename = "Last 30 days")]
    Last30Days,
    #[serde(rename = "This month")]
    ThisMonth,
}

impl PeriodKey {
    pub const ALL: [PeriodKey; 4] = [
        PeriodKey::Today,
        PeriodKey::Last7Days,
        PeriodKey::Last30Days,
        PeriodKey::ThisMonth,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PeriodKey::Today => "Today",
            PeriodKey::Last7Days => "Last 7 days",
            PeriodKey::Last30Days => "Last 30 days",
            PeriodKey::ThisMonth => "This month",
        }
    }
}

impl FromStr for PeriodKey {
    type Err = AnalyticsError;

    /// Accepts the selector labels as well as compact forms such as
    /// `last_7_days` or `ThisMonth`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = compact(value);
        PeriodKey::ALL
            .into_iter()
            .find(|key| compact(key.label()) == wanted)
            .ok_or_else(|| AnalyticsError::Parse(format!("unknown period {value:?}")))
    }
}

fn compact(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// A symbolic period or an explicit trailing day count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Key(PeriodKey),
    LastDays(u32),
}

impl From<PeriodKey> for Period {
    fn from(key: PeriodKey) -> Self {
        Period::Key(key)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Key(key) => f.write_str(key.label()),
            Period::LastDays(1) => f.write_str("Last 1 day"),
            Period::LastDays(days) => write!(f, "Last {days} days"),
        }
    }
}

/// Current window, its predecessor and the calendar days they cover.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPeriod {
    pub label: String,
    pub current: Window,
    pub previous: Window,
    pub days: u32,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
}

/// Concrete `[start, end_exclusive)` window for a period. Every window ends
/// at the start of tomorrow, so today is always included.
pub fn resolve_window(period: Period, clock: &ReportingClock) -> Result<Window, AnalyticsError> {
    let today = clock.today();
    let first_day = match period {
        Period::Key(PeriodKey::Today) => today,
        Period::Key(PeriodKey::Last7Days) => days_before(today, 6)?,
        Period::Key(PeriodKey::Last30Days) => days_before(today, 29)?,
        Period::Key(PeriodKey::ThisMonth) => today.with_day(1).unwrap_or(today),
        Period::LastDays(0) => {
            return Err(AnalyticsError::InvalidWindow(
                "a period must cover at least one day".to_string(),
            ))
        }
        Period::LastDays(days) => days_before(today, u64::from(days - 1))?,
    };
    let tomorrow = today
        .checked_add_days(Days::new(1))
        .ok_or_else(|| out_of_range(today))?;

    Window::new(clock.start_of_day(first_day), clock.start_of_day(tomorrow))
}

/// Window of the last `days` calendar days, today included.
pub fn last_n_days(days: u32, clock: &ReportingClock) -> Result<Window, AnalyticsError> {
    resolve_window(Period::LastDays(days), clock)
}

/// Equal-length window immediately before `window`, shifted back by its
/// calendar-day count.
pub fn predecessor(window: &Window, clock: &ReportingClock) -> Result<Window, AnalyticsError> {
    let days = u64::from(window.calendar_days(clock));
    let start = shift_back(clock.local_datetime(window.start()), days)?;
    let end = shift_back(clock.local_datetime(window.end_exclusive()), days)?;
    Window::new(clock.localize(start), clock.localize(end))
}

/// Resolves a period together with its predecessor window.
pub fn resolve_period(
    period: Period,
    clock: &ReportingClock,
) -> Result<ResolvedPeriod, AnalyticsError> {
    let current = resolve_window(period, clock)?;
    let previous = predecessor(&current, clock)?;
    let days = current.calendar_days(clock);

    tracing::debug!(
        period = %period,
        start = %current.start(),
        end = %current.end_exclusive(),
        days,
        "resolved reporting period"
    );

    Ok(ResolvedPeriod {
        label: period.to_string(),
        current,
        previous,
        days,
        first_day: clock.local_date(current.start()),
        last_day: clock.today(),
    })
}

fn days_before(date: NaiveDate, days: u64) -> Result<NaiveDate, AnalyticsError> {
    date.checked_sub_days(Days::new(days))
        .ok_or_else(|| out_of_range(date))
}

fn shift_back(local: NaiveDateTime, days: u64) -> Result<NaiveDateTime, AnalyticsError> {
    local
        .checked_sub_days(Days::new(days))
        .ok_or_else(|| out_of_range(local.date()))
}

fn out_of_range(date: NaiveDate) -> AnalyticsError {
    AnalyticsError::InvalidWindow(format!("date arithmetic around {date} is out of range"))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use chrono_tz::Tz;

    use super::*;

    fn clock_at(y: i32, m: u32, d: u32, h: u32) -> ReportingClock {
        ReportingClock::new(Tz::UTC, Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap())
    }

    fn midnight(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn today_covers_the_current_calendar_day() {
        let window = resolve_window(PeriodKey::Today.into(), &clock_at(2026, 10, 18, 15)).unwrap();
        assert_eq!(window.start(), midnight(2026, 10, 18));
        assert_eq!(window.end_exclusive(), midnight(2026, 10, 19));
    }

    #[test]
    fn last_seven_days_and_predecessor_are_contiguous() {
        let clock = clock_at(2026, 10, 18, 15);
        let resolved = resolve_period(PeriodKey::Last7Days.into(), &clock).unwrap();

        assert_eq!(resolved.current.start(), midnight(2026, 10, 12));
        assert_eq!(resolved.current.end_exclusive(), midnight(2026, 10, 19));
        assert_eq!(resolved.previous.start(), midnight(2026, 10, 5));
        assert_eq!(resolved.previous.end_exclusive(), midnight(2026, 10, 12));
        assert!(!resolved.current.overlaps(&resolved.previous));
        assert_eq!(resolved.days, 7);
    }

    #[test]
    fn last_thirty_days_starts_twenty_nine_days_back() {
        let window =
            resolve_window(PeriodKey::Last30Days.into(), &clock_at(2026, 10, 18, 0)).unwrap();
        assert_eq!(window.start(), midnight(2026, 9, 19));
        assert_eq!(window.end_exclusive(), midnight(2026, 10, 19));
    }

    #[test]
    fn this_month_runs_from_the_first_through_today() {
        let clock = clock_at(2026, 10, 18, 8);
        let resolved = resolve_period(PeriodKey::ThisMonth.into(), &clock).unwrap();
        assert_eq!(resolved.current.start(), midnight(2026, 10, 1));
        assert_eq!(resolved.current.end_exclusive(), midnight(2026, 10, 19));
        assert_eq!(resolved.days, 18);
        assert_eq!(resolved.previous.start(), midnight(2026, 9, 13));
        assert_eq!(resolved.previous.end_exclusive(), midnight(2026, 10, 1));
    }

    #[test]
    fn explicit_day_count_matches_named_period() {
        let clock = clock_at(2026, 10, 18, 8);
        assert_eq!(
            last_n_days(7, &clock).unwrap(),
            resolve_window(PeriodKey::Last7Days.into(), &clock).unwrap()
        );
        assert!(matches!(
            last_n_days(0, &clock),
            Err(AnalyticsError::InvalidWindow(_))
        ));
    }

    #[test]
    fn predecessor_stays_on_local_midnights_across_dst() {
        // US DST ends on 2026-11-01, so the current week has a 25h day.
        let clock = ReportingClock::new(
            chrono_tz::America::New_York,
            Utc.with_ymd_and_hms(2026, 11, 4, 15, 0, 0).unwrap(),
        );
        let resolved = resolve_period(PeriodKey::Last7Days.into(), &clock).unwrap();
        assert_eq!(resolved.days, 7);
        assert_eq!(
            clock.local_datetime(resolved.previous.start()),
            NaiveDate::from_ymd_opt(2026, 10, 22)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        assert_eq!(resolved.previous.end_exclusive(), resolved.current.start());
    }

    #[test]
    fn period_keys_parse_from_labels_and_compact_forms() {
        assert_eq!("Last 7 days".parse::<PeriodKey>().unwrap(), PeriodKey::Last7Days);
        assert_eq!("last_30_days".parse::<PeriodKey>().unwrap(), PeriodKey::Last30Days);
        assert_eq!("ThisMonth".parse::<PeriodKey>().unwrap(), PeriodKey::ThisMonth);
        assert!("yesterday".parse::<PeriodKey>().is_err());
        assert_eq!(Period::LastDays(90).to_string(), "Last 90 days");
    }
}
