//! Payment-mode lock endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::identity::StudentIdentity;
use crate::api::{non_empty, ok};
use crate::error::{ApiError, ApiResult};
use crate::services::payment_lock::{self, LockOutcome, PaymentType};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LockRequest {
    pub register_number: Option<String>,
    pub payment_type: Option<String>,
    pub enrollment_id: Option<String>,
}

/// POST /api/payment-lock/lock
pub async fn lock_payment_type(
    State(state): State<AppState>,
    _identity: StudentIdentity,
    Json(request): Json<LockRequest>,
) -> ApiResult<Json<Value>> {
    let (Some(register_number), Some(payment_type)) = (
        non_empty(request.register_number.as_deref()),
        non_empty(request.payment_type.as_deref()),
    ) else {
        return Err(ApiError::Validation(
            "register_number and payment_type are required".to_string(),
        ));
    };
    let payment_type: PaymentType = payment_type.parse()?;

    let scope = payment_lock::resolve_scope(&state.db, request.enrollment_id.as_deref()).await?;

    match payment_lock::acquire_lock(
        &state.db,
        state.lock_wait,
        register_number,
        &scope,
        payment_type,
    )
    .await?
    {
        LockOutcome::Acquired(lock) => Ok(Json(json!({
            "success": true,
            "message": "Payment type locked successfully",
            "data": lock,
        }))),
        LockOutcome::AlreadyLocked(lock) => Err(ApiError::Conflict(format!(
            "Payment type already locked as '{}'",
            lock.payment_type
        ))),
    }
}

#[derive(Debug, Deserialize)]
pub struct LockQuery {
    pub enrollment_id: Option<String>,
}

/// GET /api/payment-lock/:register_number
pub async fn get_payment_lock(
    State(state): State<AppState>,
    _identity: StudentIdentity,
    Path(register_number): Path<String>,
    Query(query): Query<LockQuery>,
) -> ApiResult<Json<Value>> {
    let scope = payment_lock::resolve_scope(&state.db, query.enrollment_id.as_deref()).await?;
    let lock = payment_lock::get_lock(&state.db, &register_number, &scope)
        .await?
        .ok_or_else(|| ApiError::NotFound("Not locked yet".to_string()))?;
    Ok(ok(lock))
}
