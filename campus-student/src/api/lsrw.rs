//! Listening, speaking, reading and writing endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::identity::StudentIdentity;
use crate::api::{non_empty, ok};
use crate::error::{ApiError, ApiResult};
use crate::services::lsrw::{self, ModuleType, SubmitRequest, TaskRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ModuleQuery {
    pub module_type: Option<String>,
}

/// GET /api/lsrw/student/:batch_id?module_type=
pub async fn student_content(
    State(state): State<AppState>,
    identity: StudentIdentity,
    Path(batch_id): Path<String>,
    Query(query): Query<ModuleQuery>,
) -> ApiResult<Json<Value>> {
    let module_type: ModuleType = non_empty(query.module_type.as_deref())
        .ok_or_else(|| ApiError::Validation("module_type is required".to_string()))?
        .parse()?;
    let items = lsrw::list_for_student(&state.db, &identity.student_id, &batch_id, module_type).await?;
    Ok(ok(items))
}

/// POST /api/lsrw/submit
pub async fn submit_answers(
    State(state): State<AppState>,
    identity: StudentIdentity,
    Json(request): Json<SubmitRequest>,
) -> ApiResult<Json<Value>> {
    let result = lsrw::submit_quiz(&state.db, &identity.student_id, request).await?;
    Ok(ok(result))
}

#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
    pub batch_id: Option<String>,
}

/// GET /api/lsrw/review/:lsrw_id?batch_id=
pub async fn review(
    State(state): State<AppState>,
    identity: StudentIdentity,
    Path(lsrw_id): Path<String>,
    Query(query): Query<ReviewQuery>,
) -> ApiResult<Json<Value>> {
    let batch_id = non_empty(query.batch_id.as_deref())
        .ok_or_else(|| ApiError::Validation("batch_id is required".to_string()))?;
    let review = lsrw::review(&state.db, &identity.student_id, &lsrw_id, batch_id).await?;
    Ok(ok(review))
}

/// POST /api/lsrw/task
pub async fn submit_task(
    State(state): State<AppState>,
    identity: StudentIdentity,
    Json(request): Json<TaskRequest>,
) -> ApiResult<Json<Value>> {
    let submission_id = lsrw::submit_task(&state.db, &identity.student_id, request).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Submission received",
        "data": { "submission_id": submission_id },
    })))
}
