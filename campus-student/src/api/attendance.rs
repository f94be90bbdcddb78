//! Student attendance views

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::api::identity::StudentIdentity;
use crate::api::ok;
use crate::error::{ApiError, ApiResult};
use crate::services::attendance;
use crate::AppState;

/// GET /api/attendance/student
pub async fn student_attendance(
    State(state): State<AppState>,
    identity: StudentIdentity,
) -> ApiResult<Json<Value>> {
    let summaries = attendance::student_attendance(&state.db, &identity.student_id).await?;
    Ok(ok(summaries))
}

/// GET /api/attendance/student/batch/:batch_id
pub async fn student_batch_attendance(
    State(state): State<AppState>,
    identity: StudentIdentity,
    Path(batch_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let summary = attendance::student_batch_attendance(&state.db, &identity.student_id, &batch_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("No approved enrollment found for this batch".to_string())
        })?;
    Ok(ok(summary))
}
