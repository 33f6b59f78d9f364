//! Business scoping for a request.

use crate::AnalyticsError;

/// Picks the business a request is scoped to: an explicit override (for
/// example a `?biz=` query parameter) wins over the business associated with
/// the signed-in profile. Blank values are ignored.
pub fn resolve_business(
    override_id: Option<&str>,
    profile_business: Option<&str>,
) -> Result<String, AnalyticsError> {
    if let Some(id) = pick(override_id) {
        tracing::debug!(business_id = id, "business resolved from override");
        return Ok(id.to_string());
    }
    if let Some(id) = pick(profile_business) {
        tracing::debug!(business_id = id, "business resolved from profile");
        return Ok(id.to_string());
    }
    Err(AnalyticsError::UnresolvedBusiness)
}

fn pick(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|id| !id.is_empty())
}
