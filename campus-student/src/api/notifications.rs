//! Student notifications

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::identity::StudentIdentity;
use crate::api::ok;
use crate::db::notifications;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub all: bool,
}

/// GET /api/notifications?all=
pub async fn list_notifications(
    State(state): State<AppState>,
    identity: StudentIdentity,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<Json<Value>> {
    let rows = notifications::list(&state.db, &identity.student_id, query.all).await?;
    Ok(ok(rows))
}

/// PATCH /api/notifications/:id
pub async fn mark_read(
    State(state): State<AppState>,
    identity: StudentIdentity,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    if !notifications::mark_read(&state.db, &identity.student_id, &id).await? {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }
    Ok(Json(json!({ "success": true, "message": "Notification marked as read" })))
}
