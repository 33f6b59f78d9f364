//! Gap-filled bookings-by-day series.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::clock::ReportingClock;
use crate::record::AppointmentRecord;

/// Number of active appointments starting on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// One entry per day for the last `days` days, oldest first, ending today.
///
/// Days without activity are present with a zero count. Records outside the
/// range are ignored, so a superset of the range is acceptable input.
pub fn build_daily_series(
    records: &[AppointmentRecord],
    days: u32,
    clock: &ReportingClock,
) -> Vec<DailyCount> {
    let today = clock.today();
    let Some(first_day) = today.checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
    else {
        return Vec::new();
    };

    let mut buckets: BTreeMap<NaiveDate, u64> = first_day
        .iter_days()
        .take(days as usize)
        .map(|date| (date, 0))
        .collect();

    for record in records.iter().filter(|record| record.is_active()) {
        if let Some(count) = buckets.get_mut(&clock.local_date(record.start_at)) {
            *count += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use chrono_tz::Tz;

    use super::*;
    use crate::record::AppointmentStatus;

    fn clock() -> ReportingClock {
        ReportingClock::new(Tz::UTC, Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap())
    }

    fn at(d: u32, h: u32, status: AppointmentStatus) -> AppointmentRecord {
        AppointmentRecord::new(
            format!("{d}-{h}"),
            "biz",
            status,
            Utc.with_ymd_and_hms(2026, 10, d, h, 0, 0).unwrap(),
        )
    }

    #[test]
    fn empty_input_yields_full_zero_series() {
        let series = build_daily_series(&[], 30, &clock());
        assert_eq!(series.len(), 30);
        assert!(series.iter().all(|entry| entry.count == 0));
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2026, 9, 19).unwrap());
        assert_eq!(series[29].date, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert!(series
            .windows(2)
            .all(|pair| pair[0].date.succ_opt() == Some(pair[1].date)));
    }

    #[test]
    fn counts_active_records_per_day_regardless_of_time() {
        let records = vec![
            at(18, 1, AppointmentStatus::Booked),
            at(18, 23, AppointmentStatus::Inquiry),
            at(18, 9, AppointmentStatus::Cancelled),
            at(16, 9, AppointmentStatus::Rescheduled),
            at(1, 9, AppointmentStatus::Booked),
        ];
        let series = build_daily_series(&records, 3, &clock());
        let counts: Vec<u64> = series.iter().map(|entry| entry.count).collect();
        assert_eq!(counts, vec![1, 0, 2]);
    }

    #[test]
    fn buckets_use_the_reporting_timezone() {
        let clock = ReportingClock::new(
            chrono_tz::Asia::Tokyo,
            Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap(),
        );
        // 20:00 UTC on the 17th is already the 18th in Tokyo.
        let records = vec![at(17, 20, AppointmentStatus::Booked)];
        let series = build_daily_series(&records, 2, &clock);
        assert_eq!(series[1].date, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert_eq!(series[1].count, 1);
        assert_eq!(series[0].count, 0);
    }

    #[test]
    fn zero_days_yields_empty_series() {
        assert!(build_daily_series(&[at(18, 1, AppointmentStatus::Booked)], 0, &clock()).is_empty());
    }
}
