//! Academic calendar, served as events and as announcements

use axum::{
    extract::{Query, State},
    Json,
};
use campus_common::time;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::non_empty;
use crate::db::events;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    pub limit: Option<i64>,
}

/// GET /api/events/upcoming?limit=
pub async fn upcoming(
    State(state): State<AppState>,
    Query(query): Query<UpcomingQuery>,
) -> ApiResult<Json<Value>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let today = time::format_date(time::today());
    let rows = events::upcoming(&state.db, &today, limit).await?;
    Ok(Json(json!({
        "success": true,
        "count": rows.len(),
        "data": rows,
    })))
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// GET /api/events/range?start_date=&end_date=
pub async fn in_range(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<Json<Value>> {
    let (Some(start), Some(end)) = (
        non_empty(query.start_date.as_deref()),
        non_empty(query.end_date.as_deref()),
    ) else {
        return Err(ApiError::Validation(
            "Start date and end date are required".to_string(),
        ));
    };
    let start = time::parse_date(start)?;
    let end = time::parse_date(end)?;
    if start > end {
        return Err(ApiError::Validation(
            "start_date must not be after end_date".to_string(),
        ));
    }

    let (start, end) = (time::format_date(start), time::format_date(end));
    let today = time::format_date(time::today());
    let rows = events::starting_between(&state.db, &start, &end, &today).await?;
    Ok(Json(json!({
        "success": true,
        "count": rows.len(),
        "data": rows,
        "date_range": { "start_date": start, "end_date": end },
    })))
}
