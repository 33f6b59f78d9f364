use std::fs;

use booking_core::{
    build_dashboard, query_store, AnalyticsConfig, AppointmentFilters, PageRequest, PeriodKey,
    ReportingClock, StatusFilter,
};
use booking_rows::{load_store_str, page_to_value};
use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn clock() -> ReportingClock {
    ReportingClock::new(Tz::UTC, Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap())
}

#[test]
fn dashboard_matches_golden() {
    let rows = fs::read_to_string(fixture_path("appointment_rows.json"))
        .expect("could not read fixture rows");
    let store = load_store_str(&rows).expect("could not decode fixture rows");

    let config = AnalyticsConfig {
        series_days: 7,
        ..AnalyticsConfig::default()
    };
    let dashboard = build_dashboard(
        &store,
        Some("biz-1"),
        PeriodKey::Last7Days.into(),
        &clock(),
        &config,
    )
    .expect("could not build dashboard");

    let actual = serde_json::to_value(dashboard).expect("could not serialize dashboard");
    let expected = fs::read_to_string(fixture_path("dashboard_snapshot.json"))
        .expect("could not read golden snapshot");
    let expected: Value = serde_json::from_str(&expected).expect("golden snapshot is not JSON");

    assert_eq!(actual, expected);
}

#[test]
fn listing_searches_and_pages_fixture_rows() {
    let rows = fs::read_to_string(fixture_path("appointment_rows.json"))
        .expect("could not read fixture rows");
    let store = load_store_str(&rows).expect("could not decode fixture rows");

    let filters = AppointmentFilters {
        search: Some("ana souza".into()),
        status: StatusFilter::All,
        ..AppointmentFilters::default()
    };
    let page = query_store(&store, "biz-1", &filters, PageRequest { limit: 1, offset: 0 })
        .expect("listing failed");
    let value = page_to_value(&page);

    assert_eq!(value["count"], 2);
    assert_eq!(value["rows"].as_array().map(Vec::len), Some(1));
    assert_eq!(value["rows"][0]["id"], "r6");
    assert_eq!(value["rows"][0]["caller_phone_e164"], "+15550100");
}
