//! Hosted-store JSON rows to `AppointmentRecord` converter.
//!
//! Rows use the column names of the `appointments` table (`business_id`,
//! `start_ts`, `price_usd`, `caller_phone_e164`, ...). A payload is either a
//! bare array of rows or an object wrapping it under `data` or `rows`.

use booking_core::{
    AnalyticsError, AppointmentPage, AppointmentRecord, AppointmentStatus, Decimal, InMemoryStore,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{json, Map, Value};

/// Decode every row of a JSON payload.
pub fn decode_rows_str(payload: &str) -> Result<Vec<AppointmentRecord>, AnalyticsError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|err| AnalyticsError::Parse(err.to_string()))?;
    decode_rows_value(&value)
}

/// Decode every row of an already parsed payload.
pub fn decode_rows_value(payload: &Value) -> Result<Vec<AppointmentRecord>, AnalyticsError> {
    let rows = match payload {
        Value::Array(rows) => rows,
        Value::Object(map) => ["data", "rows"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .ok_or_else(|| {
                AnalyticsError::Parse("expected an array of rows under `data` or `rows`".into())
            })?,
        other => {
            return Err(AnalyticsError::Parse(format!(
                "expected an array of rows, received {}",
                kind_of(other)
            )))
        }
    };

    let records = rows
        .iter()
        .enumerate()
        .map(|(index, row)| decode_row(row, index))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(rows = records.len(), "decoded appointment rows");
    Ok(records)
}

/// Decode a payload straight into a store.
pub fn load_store_str(payload: &str) -> Result<InMemoryStore, AnalyticsError> {
    decode_rows_str(payload).map(InMemoryStore::new)
}

/// Decode a single row. `index` only serves error messages and fallback ids.
pub fn decode_row(row: &Value, index: usize) -> Result<AppointmentRecord, AnalyticsError> {
    let Some(fields) = row.as_object() else {
        return Err(row_error(
            index,
            format!("expected an object, received {}", kind_of(row)),
        ));
    };

    let business_id = extract_str(fields, &["business_id"])
        .ok_or_else(|| row_error(index, "missing business_id"))?;

    let status = extract_str(fields, &["status"])
        .ok_or_else(|| row_error(index, "missing status"))?
        .parse::<AppointmentStatus>()
        .map_err(|err| row_error(index, err.to_string()))?;

    let start_raw = extract_str(fields, &["start_ts", "start_at"])
        .ok_or_else(|| row_error(index, "missing start_ts"))?;
    let start_at = parse_datetime(&start_raw)
        .ok_or_else(|| row_error(index, format!("unreadable start_ts {start_raw:?}")))?;

    let end_at = extract_str(fields, &["end_ts", "end_at"]).and_then(|raw| {
        let parsed = parse_datetime(&raw);
        if parsed.is_none() {
            tracing::warn!(row = index, end_ts = %raw, "ignoring unreadable end_ts");
        }
        parsed
    });

    let price = extract_price(fields, index)?;

    Ok(AppointmentRecord {
        id: row_id(fields, index),
        business_id,
        status,
        start_at,
        end_at,
        price,
        service_raw: extract_str(fields, &["service_raw"]),
        normalized_service: extract_str(fields, &["normalized_service"]),
        caller_name: extract_str(fields, &["caller_name"]),
        caller_phone: extract_str(fields, &["caller_phone_e164", "caller_phone"]),
        source: extract_str(fields, &["source"]),
    })
}

/// Render a record back into the store's row shape.
pub fn record_to_row(record: &AppointmentRecord) -> Value {
    json!({
        "id": record.id,
        "business_id": record.business_id,
        "status": record.status.as_str(),
        "start_ts": record.start_at.to_rfc3339(),
        "end_ts": record.end_at.map(|end| end.to_rfc3339()),
        "price_usd": record.price,
        "service_raw": record.service_raw,
        "normalized_service": record.normalized_service,
        "caller_name": record.caller_name,
        "caller_phone_e164": record.caller_phone,
        "source": record.source,
    })
}

/// Render a listing page as `{ "rows": [...], "count": n }`.
pub fn page_to_value(page: &AppointmentPage) -> Value {
    json!({
        "rows": page.rows.iter().map(record_to_row).collect::<Vec<_>>(),
        "count": page.total_count,
    })
}

fn row_id(fields: &Map<String, Value>, index: usize) -> String {
    for key in ["id", "booking_id"] {
        match fields.get(key) {
            Some(Value::String(id)) if !id.trim().is_empty() => return id.trim().to_string(),
            Some(Value::Number(id)) => return id.to_string(),
            _ => {}
        }
    }
    tracing::warn!(row = index, "row has no id, using positional id");
    format!("row-{index}")
}

fn extract_str(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| fields.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Prices arrive as JSON numbers or, for `numeric` columns, as strings.
/// Both are read from their decimal text so no binary rounding creeps in.
fn extract_price(
    fields: &Map<String, Value>,
    index: usize,
) -> Result<Option<Decimal>, AnalyticsError> {
    let Some(raw) = ["price_usd", "price"].iter().find_map(|key| fields.get(*key)) else {
        return Ok(None);
    };

    let amount = match raw {
        Value::Null => return Ok(None),
        Value::Number(number) => parse_decimal(&number.to_string()),
        Value::String(text) if text.trim().is_empty() => return Ok(None),
        Value::String(text) => parse_decimal(text.trim()),
        _ => None,
    };

    match amount {
        Some(value) if !value.is_sign_negative() || value.is_zero() => Ok(Some(value)),
        Some(value) => Err(row_error(index, format!("price {value} is not a valid amount"))),
        None => Err(row_error(index, format!("unreadable price {raw}"))),
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    text.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

fn row_error(index: usize, message: impl Into<String>) -> AnalyticsError {
    AnalyticsError::Parse(format!("row {index}: {}", message.into()))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
