//! KPI snapshots over a window and their period-over-period delta.

use std::ops::Sub;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::clock::{ReportingClock, Window};
use crate::period::predecessor;
use crate::record::{AppointmentRecord, AppointmentStatus};
use crate::AnalyticsError;

/// Activity figures for one window. Cancelled appointments never count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    pub active_count: u64,
    pub booked_count: u64,
    pub rescheduled_count: u64,
    /// Exact sum of prices; see [`KpiSnapshot::rounded_revenue`].
    pub revenue_total: Decimal,
}

impl KpiSnapshot {
    fn add(&mut self, record: &AppointmentRecord) {
        self.active_count += 1;
        match record.status {
            AppointmentStatus::Booked => self.booked_count += 1,
            AppointmentStatus::Rescheduled => self.rescheduled_count += 1,
            AppointmentStatus::Cancelled | AppointmentStatus::Inquiry => {}
        }
        self.revenue_total = self.revenue_total.saturating_add(record.price_or_zero());
    }

    pub fn rounded_revenue(&self, minor_digits: u32) -> Decimal {
        round_minor(self.revenue_total, minor_digits)
    }
}

/// Signed elementwise difference between two snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiDelta {
    pub active_count: i64,
    pub booked_count: i64,
    pub rescheduled_count: i64,
    pub revenue_total: Decimal,
}

impl KpiDelta {
    pub fn rounded_revenue(&self, minor_digits: u32) -> Decimal {
        round_minor(self.revenue_total, minor_digits)
    }
}

impl Sub for KpiSnapshot {
    type Output = KpiDelta;

    fn sub(self, previous: KpiSnapshot) -> KpiDelta {
        KpiDelta {
            active_count: signed_diff(self.active_count, previous.active_count),
            booked_count: signed_diff(self.booked_count, previous.booked_count),
            rescheduled_count: signed_diff(self.rescheduled_count, previous.rescheduled_count),
            revenue_total: self.revenue_total.saturating_sub(previous.revenue_total),
        }
    }
}

fn signed_diff(current: u64, previous: u64) -> i64 {
    let current = i64::try_from(current).unwrap_or(i64::MAX);
    let previous = i64::try_from(previous).unwrap_or(i64::MAX);
    current.saturating_sub(previous)
}

/// Current snapshot next to its predecessor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiComparison {
    pub current_window: Window,
    pub previous_window: Window,
    pub current: KpiSnapshot,
    pub previous: KpiSnapshot,
    pub delta: KpiDelta,
}

/// Rounds an amount to `minor_digits` decimal places for display, halves
/// away from zero.
pub fn round_minor(amount: Decimal, minor_digits: u32) -> Decimal {
    amount.round_dp_with_strategy(minor_digits, RoundingStrategy::MidpointAwayFromZero)
}

/// KPIs over the active records whose start falls inside `window`.
pub fn compute_kpis(records: &[AppointmentRecord], window: &Window) -> KpiSnapshot {
    records
        .iter()
        .filter(|record| record.is_active() && window.contains(record.start_at))
        .fold(KpiSnapshot::default(), |mut snapshot, record| {
            snapshot.add(record);
            snapshot
        })
}

/// KPIs for `window` and the delta against its predecessor, both taken from
/// the same record set.
pub fn compute_kpis_with_delta(
    records: &[AppointmentRecord],
    window: &Window,
    clock: &ReportingClock,
) -> Result<KpiComparison, AnalyticsError> {
    let previous_window = predecessor(window, clock)?;
    compare_kpis(records, window, records, &previous_window, clock)
}

/// Delta between two separately fetched record sets. The windows must span
/// the same number of calendar days.
pub fn compare_kpis(
    current_records: &[AppointmentRecord],
    current_window: &Window,
    previous_records: &[AppointmentRecord],
    previous_window: &Window,
    clock: &ReportingClock,
) -> Result<KpiComparison, AnalyticsError> {
    if !current_window.is_comparable(previous_window, clock) {
        return Err(AnalyticsError::InvalidWindow(format!(
            "cannot compare a {}-day window with a {}-day window",
            current_window.calendar_days(clock),
            previous_window.calendar_days(clock)
        )));
    }

    let current = compute_kpis(current_records, current_window);
    let previous = compute_kpis(previous_records, previous_window);

    tracing::debug!(
        active = current.active_count,
        previous_active = previous.active_count,
        "computed kpi comparison"
    );

    Ok(KpiComparison {
        current_window: *current_window,
        previous_window: *previous_window,
        current,
        previous,
        delta: current - previous,
    })
}
