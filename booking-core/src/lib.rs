//! Analytics engine for appointment bookings: period windows, KPI deltas,
//! daily series, service rankings and a filtered appointment listing.
//!
//! Every operation is a pure function of the records and parameters it is
//! given. Business scoping and the reporting clock are explicit arguments.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

pub mod business;
pub mod clock;
pub mod dashboard;
pub mod kpi;
pub mod pager;
pub mod period;
pub mod record;
pub mod series;
pub mod services;
pub mod store;
pub mod upcoming;

pub use business::resolve_business;
pub use clock::{ReportingClock, Window};
pub use dashboard::{build_dashboard, Dashboard};
pub use kpi::{
    compare_kpis, compute_kpis, compute_kpis_with_delta, round_minor, KpiComparison, KpiDelta,
    KpiSnapshot,
};
pub use pager::{
    query_appointments, query_store, AppointmentFilters, AppointmentPage, PageRequest, SortOrder,
    StatusFilter,
};
pub use period::{
    last_n_days, predecessor, resolve_period, resolve_window, Period, PeriodKey, ResolvedPeriod,
};
pub use record::{AppointmentRecord, AppointmentStatus, UNKNOWN_SERVICE};
pub use series::{build_daily_series, DailyCount};
pub use services::{service_breakdown, top_services, RankMetric, RankedGroup, ServiceSummary};
pub use store::{BoxError, InMemoryStore, RecordStore};
pub use upcoming::{upcoming_appointments, upcoming_window, UpcomingAppointment};

pub use rust_decimal::Decimal;

/// Page size used by the appointment listing when the caller gives none.
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Tunables for a dashboard pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Timezone of the business's reporting calendar.
    pub timezone: Tz,
    /// Number of days in the bookings-by-day series.
    pub series_days: u32,
    /// Entries kept in the top services by revenue ranking.
    pub top_revenue_limit: usize,
    /// Entries kept in the top services by count ranking.
    pub top_count_limit: usize,
    /// Horizon (days) of the upcoming appointments agenda.
    pub upcoming_days: u32,
    /// Rows per page of the appointment listing when the caller gives no limit.
    pub page_limit: usize,
    /// Digits kept when revenue is rounded for presentation.
    pub currency_minor_digits: u32,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            series_days: 30,
            top_revenue_limit: 6,
            top_count_limit: 8,
            upcoming_days: 14,
            page_limit: DEFAULT_PAGE_LIMIT,
            currency_minor_digits: 2,
        }
    }
}

/// Errors raised by the engine and its adapters.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("invalid window: {0}")]
    InvalidWindow(String),
    #[error("no business resolved for this request")]
    UnresolvedBusiness,
    #[error("record store fetch failed: {0}")]
    UpstreamFetch(#[source] BoxError),
    #[error("could not read data: {0}")]
    Parse(String),
}
