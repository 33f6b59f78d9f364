//! Filtered, paginated appointment listing.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{AppointmentRecord, AppointmentStatus};
use crate::store::RecordStore;
use crate::{AnalyticsError, DEFAULT_PAGE_LIMIT};

/// Status restriction; `All` disables the filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Only(AppointmentStatus),
}

impl StatusFilter {
    pub fn accepts(self, status: AppointmentStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("All"),
            StatusFilter::Only(status) => status.fmt(f),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = AnalyticsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            value.parse().map(StatusFilter::Only)
        }
    }
}

impl TryFrom<String> for StatusFilter {
    type Error = AnalyticsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StatusFilter> for String {
    fn from(filter: StatusFilter) -> Self {
        filter.to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Listing filters. Every present filter must match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppointmentFilters {
    pub start: Option<DateTime<Utc>>,
    pub end_exclusive: Option<DateTime<Utc>>,
    pub status: StatusFilter,
    /// Free text matched against caller name, phone and service labels.
    pub search: Option<String>,
    pub order: SortOrder,
}

impl AppointmentFilters {
    fn matches(&self, record: &AppointmentRecord, needle: Option<&str>) -> bool {
        self.start.map_or(true, |start| record.start_at >= start)
            && self.end_exclusive.map_or(true, |end| record.start_at < end)
            && self.status.accepts(record.status)
            && needle.map_or(true, |needle| record.matches_search(needle))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    pub limit: usize,
    pub offset: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

/// One page of rows plus the number of rows matching before pagination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentPage {
    pub rows: Vec<AppointmentRecord>,
    pub total_count: usize,
}

/// Filters `records` to `business_id`, sorts by start time and slices out
/// the requested page.
///
/// Rows starting at the same instant are ordered by id, which keeps page
/// boundaries stable across calls.
pub fn query_appointments(
    records: &[AppointmentRecord],
    business_id: &str,
    filters: &AppointmentFilters,
    page: PageRequest,
) -> AppointmentPage {
    let needle = filters
        .search
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_lowercase);

    let mut matching: Vec<&AppointmentRecord> = records
        .iter()
        .filter(|record| record.business_id == business_id)
        .filter(|record| filters.matches(record, needle.as_deref()))
        .collect();

    matching.sort_by(|a, b| {
        let by_start = match filters.order {
            SortOrder::NewestFirst => b.start_at.cmp(&a.start_at),
            SortOrder::OldestFirst => a.start_at.cmp(&b.start_at),
        };
        by_start.then_with(|| a.id.cmp(&b.id))
    });

    let total_count = matching.len();
    let rows = matching
        .into_iter()
        .skip(page.offset)
        .take(page.limit)
        .cloned()
        .collect();

    tracing::debug!(business_id, total_count, offset = page.offset, "queried appointments");

    AppointmentPage { rows, total_count }
}

/// Runs [`query_appointments`] over what the store returns for the filter's
/// date bounds.
pub fn query_store<S>(
    store: &S,
    business_id: &str,
    filters: &AppointmentFilters,
    page: PageRequest,
) -> Result<AppointmentPage, AnalyticsError>
where
    S: RecordStore + ?Sized,
{
    let records = store
        .fetch(business_id, filters.start, filters.end_exclusive)
        .map_err(AnalyticsError::UpstreamFetch)?;
    Ok(query_appointments(&records, business_id, filters, page))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::store::InMemoryStore;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap()
    }

    fn fixture() -> Vec<AppointmentRecord> {
        vec![
            AppointmentRecord::new("a", "biz", AppointmentStatus::Booked, base())
                .with_caller("Maria Lopez", "+15550001")
                .with_service_raw("Haircut"),
            AppointmentRecord::new(
                "b",
                "biz",
                AppointmentStatus::Cancelled,
                base() + Duration::days(1),
            )
            .with_caller("John Smith", "+15550002")
            .with_normalized_service("Color"),
            AppointmentRecord::new(
                "c",
                "biz",
                AppointmentStatus::Rescheduled,
                base() + Duration::days(2),
            )
            .with_caller("Li Wei", "+15550003")
            .with_service_raw("color touch-up"),
            AppointmentRecord::new(
                "d",
                "other",
                AppointmentStatus::Booked,
                base() + Duration::days(3),
            )
            .with_caller("Maria Lopez", "+15550001"),
        ]
    }

    fn page_of(limit: usize, offset: usize) -> PageRequest {
        PageRequest { limit, offset }
    }

    fn ids(page: &AppointmentPage) -> Vec<&str> {
        page.rows.iter().map(|row| row.id.as_str()).collect()
    }

    #[test]
    fn lists_business_rows_newest_first() {
        let page = query_appointments(
            &fixture(),
            "biz",
            &AppointmentFilters::default(),
            PageRequest::default(),
        );
        assert_eq!(ids(&page), vec!["c", "b", "a"]);
        assert_eq!(page.total_count, 3);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let filters = AppointmentFilters {
            search: Some("  COLOR ".into()),
            ..AppointmentFilters::default()
        };
        let page = query_appointments(&fixture(), "biz", &filters, PageRequest::default());
        assert_eq!(ids(&page), vec!["c", "b"]);

        let by_phone = AppointmentFilters {
            search: Some("0001".into()),
            ..AppointmentFilters::default()
        };
        let page = query_appointments(&fixture(), "biz", &by_phone, PageRequest::default());
        assert_eq!(ids(&page), vec!["a"]);
    }

    #[test]
    fn blank_search_does_not_filter() {
        let filters = AppointmentFilters {
            search: Some("   ".into()),
            ..AppointmentFilters::default()
        };
        let page = query_appointments(&fixture(), "biz", &filters, PageRequest::default());
        assert_eq!(page.total_count, 3);
    }

    #[test]
    fn status_and_date_filters_combine() {
        let filters = AppointmentFilters {
            start: Some(base() + Duration::hours(1)),
            end_exclusive: Some(base() + Duration::days(3)),
            status: StatusFilter::Only(AppointmentStatus::Rescheduled),
            ..AppointmentFilters::default()
        };
        let page = query_appointments(&fixture(), "biz", &filters, PageRequest::default());
        assert_eq!(ids(&page), vec!["c"]);
    }

    #[test]
    fn total_count_ignores_pagination() {
        let filters = AppointmentFilters {
            order: SortOrder::OldestFirst,
            ..AppointmentFilters::default()
        };
        let page = query_appointments(&fixture(), "biz", &filters, page_of(2, 1));
        assert_eq!(ids(&page), vec!["b", "c"]);
        assert_eq!(page.total_count, 3);

        let past_end = query_appointments(&fixture(), "biz", &filters, page_of(2, 9));
        assert!(past_end.rows.is_empty());
        assert_eq!(past_end.total_count, 3);
    }

    #[test]
    fn equal_start_times_page_without_overlap() {
        let records: Vec<_> = ["e", "c", "a", "d", "b"]
            .iter()
            .map(|id| AppointmentRecord::new(*id, "biz", AppointmentStatus::Booked, base()))
            .collect();
        let mut seen = Vec::new();
        for offset in (0..5).step_by(2) {
            let result = query_appointments(
                &records,
                "biz",
                &AppointmentFilters::default(),
                page_of(2, offset),
            );
            seen.extend(result.rows.into_iter().map(|row| row.id));
        }
        assert_eq!(seen, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn store_backed_query_matches_in_memory_query() {
        let store = InMemoryStore::new(fixture());
        let filters = AppointmentFilters {
            start: Some(base() + Duration::days(1)),
            ..AppointmentFilters::default()
        };
        let page = query_store(&store, "biz", &filters, PageRequest::default()).unwrap();
        assert_eq!(ids(&page), vec!["c", "b"]);
    }

    #[test]
    fn status_filter_round_trips_through_strings() {
        assert_eq!("All".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "cancelled".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(AppointmentStatus::Cancelled)
        );
        let filters: AppointmentFilters =
            serde_json::from_str(r#"{"status":"Booked","search":"ana"}"#).unwrap();
        assert_eq!(filters.status, StatusFilter::Only(AppointmentStatus::Booked));
        assert_eq!(filters.order, SortOrder::NewestFirst);
    }
}
