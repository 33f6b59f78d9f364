//! Canonical appointment record and its derived fields.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::AnalyticsError;

/// Service key used when a record carries no usable label.
pub const UNKNOWN_SERVICE: &str = "Unknown";

/// Lifecycle state of an appointment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AppointmentStatus {
    Booked,
    Rescheduled,
    Cancelled,
    Inquiry,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Booked,
        AppointmentStatus::Rescheduled,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Inquiry,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Booked => "Booked",
            AppointmentStatus::Rescheduled => "Rescheduled",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::Inquiry => "Inquiry",
        }
    }

    /// Everything except `Cancelled` counts as activity.
    pub fn is_active(self) -> bool {
        self != AppointmentStatus::Cancelled
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = AnalyticsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        AppointmentStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| AnalyticsError::Parse(format!("unknown appointment status {trimmed:?}")))
    }
}

/// One appointment as fetched from the record store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentRecord {
    pub id: String,
    pub business_id: String,
    pub status: AppointmentStatus,
    pub start_at: DateTime<Utc>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
    /// Amount in the business's reporting currency.
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub service_raw: Option<String>,
    #[serde(default)]
    pub normalized_service: Option<String>,
    #[serde(default)]
    pub caller_name: Option<String>,
    #[serde(default)]
    pub caller_phone: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl AppointmentRecord {
    pub fn new(
        id: impl Into<String>,
        business_id: impl Into<String>,
        status: AppointmentStatus,
        start_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            business_id: business_id.into(),
            status,
            start_at,
            end_at: None,
            price: None,
            service_raw: None,
            normalized_service: None,
            caller_name: None,
            caller_phone: None,
            source: None,
        }
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_service_raw(mut self, label: impl Into<String>) -> Self {
        self.service_raw = Some(label.into());
        self
    }

    pub fn with_normalized_service(mut self, label: impl Into<String>) -> Self {
        self.normalized_service = Some(label.into());
        self
    }

    pub fn with_caller(mut self, name: impl Into<String>, phone: impl Into<String>) -> Self {
        self.caller_name = Some(name.into());
        self.caller_phone = Some(phone.into());
        self
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Price with a missing amount counted as zero.
    pub fn price_or_zero(&self) -> Decimal {
        self.price.unwrap_or(Decimal::ZERO)
    }

    /// Grouping key: normalized label, else raw label, else [`UNKNOWN_SERVICE`].
    ///
    /// Blank labels are skipped, so a whitespace-only normalized label falls
    /// through to the raw one.
    pub fn service_key(&self) -> &str {
        non_blank(self.normalized_service.as_deref())
            .or_else(|| non_blank(self.service_raw.as_deref()))
            .unwrap_or(UNKNOWN_SERVICE)
    }

    /// Case-insensitive substring match over caller name, phone and both
    /// service labels. `needle` must already be lowercased.
    pub fn matches_search(&self, needle: &str) -> bool {
        [
            self.caller_name.as_deref(),
            self.caller_phone.as_deref(),
            self.service_raw.as_deref(),
            self.normalized_service.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|text| !text.is_empty())
}
