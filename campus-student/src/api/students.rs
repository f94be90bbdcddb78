//! Student profile, location lookups and assessment marks

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::identity::StudentIdentity;
use crate::api::{non_empty, ok};
use crate::db::{assessments, centers};
use crate::error::{ApiError, ApiResult};
use crate::services::profile::{self, ProfileUpdate};
use crate::AppState;

/// GET /api/students/states
pub async fn list_states(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    Ok(ok(centers::list_states(&state.db).await?))
}

#[derive(Debug, Deserialize)]
pub struct CentersQuery {
    pub state_id: Option<String>,
}

/// GET /api/students/centers?state_id=
pub async fn centers_by_state(
    State(state): State<AppState>,
    Query(query): Query<CentersQuery>,
) -> ApiResult<Json<Value>> {
    let state_id = non_empty(query.state_id.as_deref())
        .ok_or_else(|| ApiError::Validation("state_id is required".to_string()))?;
    Ok(ok(centers::centers_in_state(&state.db, state_id).await?))
}

/// GET /api/students/all-centers
pub async fn all_centers(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    Ok(ok(centers::all_centers(&state.db).await?))
}

/// GET /api/students/details
pub async fn student_details(
    State(state): State<AppState>,
    identity: StudentIdentity,
) -> ApiResult<Json<Value>> {
    Ok(ok(profile::details(&state.db, &identity.student_id).await?))
}

/// PUT /api/students/update
pub async fn update_student(
    State(state): State<AppState>,
    identity: StudentIdentity,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<Value>> {
    let details = profile::update_profile(&state.db, &identity.student_id, update).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "data": details,
    })))
}

/// GET /api/student/certificates/marks/:student_id/:batch_id
///
/// Students read their own marks only.
pub async fn assessment_marks(
    State(state): State<AppState>,
    identity: StudentIdentity,
    Path((student_id, batch_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    if student_id != identity.student_id {
        return Err(ApiError::Security(
            "Marks of another student are not visible".to_string(),
        ));
    }
    let marks = assessments::submitted_marks(&state.db, &student_id, &batch_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Assessment marks not found".to_string()))?;
    Ok(ok(marks))
}
