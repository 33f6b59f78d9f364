//! Per-service grouping: top-N rankings and the full breakdown table.

use std::cmp::Ordering;
use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::clock::Window;
use crate::kpi::round_minor;
use crate::record::AppointmentRecord;

/// Value a service ranking is ordered by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    RevenueSum,
    Count,
}

/// One entry of a ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedGroup {
    pub key: String,
    pub value: Decimal,
}

/// Row of the services table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSummary {
    pub service: String,
    pub count: u64,
    pub revenue: Decimal,
}

impl ServiceSummary {
    pub fn rounded_revenue(&self, minor_digits: u32) -> Decimal {
        round_minor(self.revenue, minor_digits)
    }
}

#[derive(Default)]
struct ServiceAccumulator {
    count: u64,
    revenue: Decimal,
}

fn group_by_service<'a>(
    records: &'a [AppointmentRecord],
    window: &Window,
) -> HashMap<&'a str, ServiceAccumulator> {
    let mut groups: HashMap<&str, ServiceAccumulator> = HashMap::new();
    for record in records
        .iter()
        .filter(|record| record.is_active() && window.contains(record.start_at))
    {
        let entry = groups.entry(record.service_key()).or_default();
        entry.count += 1;
        entry.revenue = entry.revenue.saturating_add(record.price_or_zero());
    }
    groups
}

/// Descending by value, then ascending by key.
fn by_value_then_key(a_value: Decimal, a_key: &str, b_value: Decimal, b_key: &str) -> Ordering {
    b_value.cmp(&a_value).then_with(|| a_key.cmp(b_key))
}

/// The `n` best services in `window` by `metric`. Ties are broken by
/// ascending service key so the output is reproducible; `n == 0` gives an
/// empty ranking.
pub fn top_services(
    records: &[AppointmentRecord],
    window: &Window,
    metric: RankMetric,
    n: usize,
) -> Vec<RankedGroup> {
    if n == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<RankedGroup> = group_by_service(records, window)
        .into_iter()
        .map(|(key, acc)| RankedGroup {
            key: key.to_string(),
            value: match metric {
                RankMetric::RevenueSum => acc.revenue,
                RankMetric::Count => Decimal::from(acc.count),
            },
        })
        .collect();

    ranked.sort_by(|a, b| by_value_then_key(a.value, &a.key, b.value, &b.key));
    ranked.truncate(n);
    ranked
}

/// Count and revenue for every service active in `window`, highest revenue
/// first.
pub fn service_breakdown(records: &[AppointmentRecord], window: &Window) -> Vec<ServiceSummary> {
    let mut rows: Vec<ServiceSummary> = group_by_service(records, window)
        .into_iter()
        .map(|(service, acc)| ServiceSummary {
            service: service.to_string(),
            count: acc.count,
            revenue: acc.revenue,
        })
        .collect();

    rows.sort_by(|a, b| by_value_then_key(a.revenue, &a.service, b.revenue, &b.service));
    rows
}
