//! Class materials shared across a merge group

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::api::identity::StudentIdentity;
use crate::api::ok;
use crate::db::materials;
use crate::error::ApiResult;
use crate::services::merge_resolver;
use crate::AppState;

async fn group_of(state: &AppState, batch_id: &str) -> Vec<String> {
    merge_resolver::resolve_group(&state.db, batch_id)
        .await
        .into_iter()
        .collect()
}

/// GET /api/classes/notes/:batch_id
pub async fn notes(
    State(state): State<AppState>,
    _identity: StudentIdentity,
    Path(batch_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let group = group_of(&state, &batch_id).await;
    Ok(ok(materials::notes_for_batches(&state.db, &group).await?))
}

/// GET /api/classes/gmeets/:batch_id
pub async fn gmeets(
    State(state): State<AppState>,
    _identity: StudentIdentity,
    Path(batch_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let group = group_of(&state, &batch_id).await;
    Ok(ok(materials::gmeets_for_batches(&state.db, &group).await?))
}
