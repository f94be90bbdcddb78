//! Batch listing, enrollment and occupancy

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::api::identity::{MaybeStudent, StudentIdentity};
use crate::api::{non_empty, ok};
use crate::db::enrollments;
use crate::error::{ApiError, ApiResult};
use crate::services::enrollment::{self, EnrollmentError};
use crate::services::seat_allocation;
use crate::AppState;

impl From<EnrollmentError> for ApiError {
    fn from(err: EnrollmentError) -> Self {
        let message = err.to_string();
        match err {
            EnrollmentError::BatchNotFound => ApiError::NotFound(message),
            EnrollmentError::BatchFull | EnrollmentError::AlreadyEnrolled => {
                ApiError::Conflict(message)
            }
            EnrollmentError::Storage(e) => e.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ByCenterRequest {
    pub center: Option<String>,
}

/// POST /api/batches/by-center
///
/// Anonymous callers see the center's open batches only.
pub async fn batches_by_center(
    State(state): State<AppState>,
    MaybeStudent(student): MaybeStudent,
    Json(request): Json<ByCenterRequest>,
) -> ApiResult<Json<Value>> {
    let center = non_empty(request.center.as_deref())
        .ok_or_else(|| ApiError::Validation("Center is required".to_string()))?;

    let listing = seat_allocation::list_center_batches(
        &state.db,
        center,
        student.as_ref().map(|s| s.student_id.as_str()),
        state.policy.default_max_students,
    )
    .await?;

    Ok(ok(listing))
}

#[derive(Debug, Deserialize)]
pub struct EnrollRequest {
    pub batch_id: Option<String>,
}

/// POST /api/batches/enroll
pub async fn enroll(
    State(state): State<AppState>,
    identity: StudentIdentity,
    Json(request): Json<EnrollRequest>,
) -> ApiResult<Json<Value>> {
    let batch_id = non_empty(request.batch_id.as_deref())
        .ok_or_else(|| ApiError::Validation("Batch ID is required".to_string()))?;

    let result = enrollment::enroll(&state.db, &state.policy, &identity.student_id, batch_id)
        .await
        .map_err(|e| {
            if !matches!(e, EnrollmentError::Storage(_)) {
                warn!(student_id = %identity.student_id, batch_id, reason = %e, "Enrollment refused");
            }
            ApiError::from(e)
        })?;

    let message = if result.is_free_course {
        "Enrolled successfully in free course"
    } else {
        "Enrollment request submitted, awaiting approval"
    };

    Ok(Json(json!({
        "success": true,
        "message": message,
        "data": result,
    })))
}

/// GET /api/batches/enrolled
///
/// Lapsed enrollments are expired before the list is read.
pub async fn enrolled_batches(
    State(state): State<AppState>,
    identity: StudentIdentity,
) -> ApiResult<Json<Value>> {
    enrollment::expire_stale(&state.db, &identity.student_id).await?;
    let batches = enrollments::list_detailed(&state.db, &identity.student_id).await?;
    Ok(ok(batches))
}

/// GET /api/batches/:batch_id/occupancy
pub async fn occupancy(
    State(state): State<AppState>,
    Path(batch_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let seats = seat_allocation::get_occupancy(&state.db, &batch_id, state.policy.default_max_students)
        .await?
        .ok_or_else(|| ApiError::NotFound("Batch not found".to_string()))?;
    Ok(ok(seats))
}
