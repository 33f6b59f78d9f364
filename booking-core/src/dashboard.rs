//! One dashboard pass: fetch the windows a period needs, then aggregate.

use std::thread::{self, ScopedJoinHandle};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::clock::{ReportingClock, Window};
use crate::kpi::{compare_kpis, round_minor, KpiComparison};
use crate::period::{last_n_days, resolve_period, Period, ResolvedPeriod};
use crate::record::AppointmentRecord;
use crate::series::{build_daily_series, DailyCount};
use crate::services::{top_services, RankMetric, RankedGroup};
use crate::store::RecordStore;
use crate::upcoming::{upcoming_appointments, upcoming_window, UpcomingAppointment};
use crate::{AnalyticsConfig, AnalyticsError};

/// Everything the dashboard page renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub business_id: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub timezone: String,
    pub period: ResolvedPeriod,
    pub kpis: KpiComparison,
    pub daily_series: Vec<DailyCount>,
    pub top_by_revenue: Vec<RankedGroup>,
    pub top_by_count: Vec<RankedGroup>,
    pub upcoming: Vec<UpcomingAppointment>,
}

impl Dashboard {
    /// Revenue figures rounded to `minor_digits` for display. The delta is
    /// recomputed from the rounded snapshots so the shown figures add up.
    pub fn with_rounded_revenue(mut self, minor_digits: u32) -> Self {
        let kpis = &mut self.kpis;
        kpis.current.revenue_total = kpis.current.rounded_revenue(minor_digits);
        kpis.previous.revenue_total = kpis.previous.rounded_revenue(minor_digits);
        kpis.delta = kpis.current - kpis.previous;
        for group in &mut self.top_by_revenue {
            group.value = round_minor(group.value, minor_digits);
        }
        self
    }
}

struct FetchPlan {
    period: ResolvedPeriod,
    series: Option<Window>,
    upcoming: Option<Window>,
}

#[derive(Default)]
struct Fetched {
    current: Vec<AppointmentRecord>,
    previous: Vec<AppointmentRecord>,
    series: Vec<AppointmentRecord>,
    upcoming: Vec<AppointmentRecord>,
}

/// Builds the dashboard for `business_id` over `period`.
///
/// Without a business the result is an all-zero dashboard. The four windows
/// are fetched in parallel; any fetch failure aborts the whole pass.
pub fn build_dashboard<S>(
    store: &S,
    business_id: Option<&str>,
    period: Period,
    clock: &ReportingClock,
    config: &AnalyticsConfig,
) -> Result<Dashboard, AnalyticsError>
where
    S: RecordStore + ?Sized,
{
    let plan = FetchPlan {
        period: resolve_period(period, clock)?,
        series: match config.series_days {
            0 => None,
            days => Some(last_n_days(days, clock)?),
        },
        upcoming: match config.upcoming_days {
            0 => None,
            days => Some(upcoming_window(clock, days)?),
        },
    };

    let fetched = match business_id {
        Some(business_id) => fetch_all(store, business_id, &plan)?,
        None => {
            tracing::warn!("no business resolved, rendering an empty dashboard");
            Fetched::default()
        }
    };

    tracing::debug!(
        current = fetched.current.len(),
        previous = fetched.previous.len(),
        series = fetched.series.len(),
        upcoming = fetched.upcoming.len(),
        "fetched dashboard windows"
    );

    let period = plan.period;
    let kpis = compare_kpis(
        &fetched.current,
        &period.current,
        &fetched.previous,
        &period.previous,
        clock,
    )?;

    Ok(Dashboard {
        business_id: business_id.map(str::to_string),
        generated_at: clock.now(),
        timezone: clock.timezone().name().to_string(),
        kpis,
        daily_series: build_daily_series(&fetched.series, config.series_days, clock),
        top_by_revenue: top_services(
            &fetched.current,
            &period.current,
            RankMetric::RevenueSum,
            config.top_revenue_limit,
        ),
        top_by_count: top_services(
            &fetched.current,
            &period.current,
            RankMetric::Count,
            config.top_count_limit,
        ),
        upcoming: upcoming_appointments(&fetched.upcoming, clock, config.upcoming_days),
        period,
    })
}

fn fetch_all<S>(store: &S, business_id: &str, plan: &FetchPlan) -> Result<Fetched, AnalyticsError>
where
    S: RecordStore + ?Sized,
{
    let fetch = |window: Option<&Window>| match window {
        Some(window) => store.fetch_window(business_id, window),
        None => Ok(Vec::new()),
    };

    thread::scope(|scope| {
        let current = scope.spawn(|| fetch(Some(&plan.period.current)));
        let previous = scope.spawn(|| fetch(Some(&plan.period.previous)));
        let series = scope.spawn(|| fetch(plan.series.as_ref()));
        let upcoming = scope.spawn(|| fetch(plan.upcoming.as_ref()));

        Ok(Fetched {
            current: join(current)?,
            previous: join(previous)?,
            series: join(series)?,
            upcoming: join(upcoming)?,
        })
    })
}

fn join<T>(handle: ScopedJoinHandle<'_, T>) -> T {
    handle
        .join()
        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
}
