//! Record store seam and an in-memory implementation.

use chrono::{DateTime, Utc};

use crate::clock::Window;
use crate::record::AppointmentRecord;
use crate::AnalyticsError;

/// Error type returned by store implementations, passed through untouched.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Source of appointment records.
///
/// Implementations return only the records of `business_id` whose start
/// falls in `[start, end_exclusive)` (open bounds when `None`), sorted by
/// start time ascending.
pub trait RecordStore: Send + Sync {
    fn fetch(
        &self,
        business_id: &str,
        start: Option<DateTime<Utc>>,
        end_exclusive: Option<DateTime<Utc>>,
    ) -> Result<Vec<AppointmentRecord>, BoxError>;

    /// Fetches one window, wrapping failures as [`AnalyticsError::UpstreamFetch`].
    fn fetch_window(
        &self,
        business_id: &str,
        window: &Window,
    ) -> Result<Vec<AppointmentRecord>, AnalyticsError> {
        self.fetch(business_id, Some(window.start()), Some(window.end_exclusive()))
            .map_err(AnalyticsError::UpstreamFetch)
    }
}

/// Store over records already held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: Vec<AppointmentRecord>,
}

impl InMemoryStore {
    pub fn new(mut records: Vec<AppointmentRecord>) -> Self {
        records.sort_by(|a, b| a.start_at.cmp(&b.start_at).then_with(|| a.id.cmp(&b.id)));
        Self { records }
    }

    pub fn records(&self) -> &[AppointmentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for InMemoryStore {
    fn fetch(
        &self,
        business_id: &str,
        start: Option<DateTime<Utc>>,
        end_exclusive: Option<DateTime<Utc>>,
    ) -> Result<Vec<AppointmentRecord>, BoxError> {
        Ok(self
            .records
            .iter()
            .filter(|record| record.business_id == business_id)
            .filter(|record| start.map_or(true, |start| record.start_at >= start))
            .filter(|record| end_exclusive.map_or(true, |end| record.start_at < end))
            .cloned()
            .collect())
    }
}
