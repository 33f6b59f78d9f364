//! Agenda of the appointments coming up after "now".

use chrono::{DateTime, Days, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::{ReportingClock, Window};
use crate::record::{AppointmentRecord, AppointmentStatus};
use crate::AnalyticsError;

/// Display row of the upcoming appointments table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingAppointment {
    pub id: String,
    pub start_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub service: String,
    pub caller_name: Option<String>,
    pub caller_phone: Option<String>,
}

impl From<&AppointmentRecord> for UpcomingAppointment {
    fn from(record: &AppointmentRecord) -> Self {
        Self {
            id: record.id.clone(),
            start_at: record.start_at,
            status: record.status,
            service: record.service_key().to_string(),
            caller_name: record.caller_name.clone(),
            caller_phone: record.caller_phone.clone(),
        }
    }
}

/// `[now, now + days)`. Fails for a zero-day horizon or one past the
/// representable calendar.
pub fn upcoming_window(clock: &ReportingClock, days: u32) -> Result<Window, AnalyticsError> {
    let now = clock.now();
    let end = now.checked_add_days(Days::new(u64::from(days))).ok_or_else(|| {
        AnalyticsError::InvalidWindow(format!("{days}-day horizon from {now} is out of range"))
    })?;
    Window::new(now, end)
}

/// Active appointments starting within the next `days` days, soonest first.
pub fn upcoming_appointments(
    records: &[AppointmentRecord],
    clock: &ReportingClock,
    days: u32,
) -> Vec<UpcomingAppointment> {
    let window = match upcoming_window(clock, days) {
        Ok(window) => window,
        Err(err) => {
            if days > 0 {
                tracing::warn!(days, error = %err, "skipping upcoming agenda");
            }
            return Vec::new();
        }
    };

    let mut upcoming: Vec<&AppointmentRecord> = records
        .iter()
        .filter(|record| record.is_active() && window.contains(record.start_at))
        .collect();
    upcoming.sort_by(|a, b| a.start_at.cmp(&b.start_at).then_with(|| a.id.cmp(&b.id)));

    upcoming.into_iter().map(UpcomingAppointment::from).collect()
}
