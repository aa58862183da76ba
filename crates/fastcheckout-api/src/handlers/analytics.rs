//! Checkout analytics handler

use crate::error::HttpAppError;
use crate::middleware::TenantId;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use fastcheckout_core::models::CheckoutAnalytics;
use fastcheckout_core::{ApiResponse, AppError};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_date_param(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|at| at.and_utc())
        })
}

fn required(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[tracing::instrument(skip(state, query), fields(operation = "get_checkout_analytics"))]
pub async fn get_checkout_analytics(
    State(state): State<Arc<AppState>>,
    TenantId(tenant_id): TenantId,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<CheckoutAnalytics>>, HttpAppError> {
    let (Some(start), Some(end)) = (
        required(query.start_date.as_deref()),
        required(query.end_date.as_deref()),
    ) else {
        return Err(AppError::MissingParameters(
            "startDate and endDate query parameters are required".to_string(),
        )
        .into());
    };

    let (Some(start_date), Some(end_date)) = (parse_date_param(start), parse_date_param(end))
    else {
        return Err(AppError::InvalidDateFormat(
            "Invalid date format. Use ISO 8601 format".to_string(),
        )
        .into());
    };

    if start_date > end_date {
        return Err(AppError::InvalidDateFormat(
            "startDate must not be after endDate".to_string(),
        )
        .into());
    }

    let analytics = state
        .core_api
        .get_checkout_analytics(&tenant_id, start_date, end_date)
        .await
        .map_err(|e| AppError::Analytics(e.to_string()))?;

    Ok(Json(ApiResponse::ok(analytics)))
}
