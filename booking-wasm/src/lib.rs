//! WASM <-> JavaScript bridge, framework neutral.

use booking_core::{
    build_dashboard, resolve_business, AnalyticsConfig, AnalyticsError, AppointmentFilters,
    AppointmentRecord, InMemoryStore, PageRequest, Period, PeriodKey, ReportingClock,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value, Serializer};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsAnalyticsConfig {
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    series_days: Option<u32>,
    #[serde(default)]
    top_revenue_limit: Option<usize>,
    #[serde(default)]
    top_count_limit: Option<usize>,
    #[serde(default)]
    upcoming_days: Option<u32>,
    #[serde(default)]
    page_limit: Option<usize>,
    #[serde(default)]
    currency_minor_digits: Option<u32>,
}

impl TryFrom<JsAnalyticsConfig> for AnalyticsConfig {
    type Error = String;

    fn try_from(cfg: JsAnalyticsConfig) -> Result<Self, Self::Error> {
        let mut base = AnalyticsConfig::default();
        if let Some(name) = cfg.timezone {
            base.timezone = name
                .parse::<Tz>()
                .map_err(|err| format!("unknown timezone {name:?}: {err}"))?;
        }
        if let Some(days) = cfg.series_days {
            base.series_days = days;
        }
        if let Some(limit) = cfg.top_revenue_limit {
            base.top_revenue_limit = limit;
        }
        if let Some(limit) = cfg.top_count_limit {
            base.top_count_limit = limit;
        }
        if let Some(days) = cfg.upcoming_days {
            base.upcoming_days = days;
        }
        if let Some(limit) = cfg.page_limit {
            base.page_limit = limit;
        }
        if let Some(digits) = cfg.currency_minor_digits {
            base.currency_minor_digits = digits;
        }
        Ok(base)
    }
}

fn read_config(config: Option<JsValue>) -> Result<AnalyticsConfig, JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsAnalyticsConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("could not read config: {err}")))?;
            AnalyticsConfig::try_from(cfg).map_err(|err| JsValue::from_str(&err))
        }
        _ => Ok(AnalyticsConfig::default()),
    }
}

fn read_rows(rows: JsValue) -> Result<Vec<AppointmentRecord>, JsValue> {
    let payload = from_value::<serde_json::Value>(rows)
        .map_err(|err| JsValue::from_str(&format!("could not read rows: {err}")))?;
    booking_rows::decode_rows_value(&payload).map_err(to_js_error)
}

/// Period from a selector label (`"Last 7 days"`) or a plain day count.
fn read_period(period: &str) -> Result<Period, JsValue> {
    match period.trim().parse::<u32>() {
        Ok(days) => Ok(Period::LastDays(days)),
        Err(_) => period
            .parse::<PeriodKey>()
            .map(Period::from)
            .map_err(to_js_error),
    }
}

/// Dashboard for the rows of one business, revenue rounded to the configured
/// minor digits. A missing business yields an empty dashboard.
#[wasm_bindgen]
pub fn summarize_dashboard(
    rows: JsValue,
    business_id: Option<String>,
    period: String,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let cfg = read_config(config)?;
    let store = InMemoryStore::new(read_rows(rows)?);
    let clock = ReportingClock::system(cfg.timezone);

    let dashboard = build_dashboard(
        &store,
        business_id.as_deref(),
        read_period(&period)?,
        &clock,
        &cfg,
    )
    .map_err(to_js_error)?
    .with_rounded_revenue(cfg.currency_minor_digits);

    to_value(&dashboard)
        .map_err(|err| JsValue::from_str(&format!("could not serialize dashboard: {err}")))
}

/// One page of the appointment listing as `{ rows, count }`. Without a
/// `limit` the config's `page_limit` applies.
#[wasm_bindgen]
pub fn query_appointments(
    rows: JsValue,
    business_id: String,
    filters: Option<JsValue>,
    limit: Option<u32>,
    offset: Option<u32>,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let cfg = read_config(config)?;
    let records = read_rows(rows)?;
    let filters = match filters {
        Some(js_filters) if !js_filters.is_undefined() && !js_filters.is_null() => {
            from_value::<AppointmentFilters>(js_filters)
                .map_err(|err| JsValue::from_str(&format!("could not read filters: {err}")))?
        }
        _ => AppointmentFilters::default(),
    };
    let page = page_request(&cfg, limit, offset);

    let result = booking_core::query_appointments(&records, &business_id, &filters, page);
    // Plain objects rather than JS `Map`s for the row objects.
    booking_rows::page_to_value(&result)
        .serialize(&Serializer::json_compatible())
        .map_err(|err| JsValue::from_str(&format!("could not serialize page: {err}")))
}

/// URL override first, then the profile's business; `undefined` when neither
/// is set.
#[wasm_bindgen]
pub fn resolve_business_id(
    override_id: Option<String>,
    profile_business: Option<String>,
) -> Option<String> {
    resolve_business(override_id.as_deref(), profile_business.as_deref()).ok()
}

fn page_request(cfg: &AnalyticsConfig, limit: Option<u32>, offset: Option<u32>) -> PageRequest {
    PageRequest {
        limit: limit.map_or(cfg.page_limit, |limit| limit as usize),
        offset: offset.unwrap_or(0) as usize,
    }
}

fn to_js_error(err: AnalyticsError) -> JsValue {
    JsValue::from_str(&format!("Analytics error: {err}"))
}
