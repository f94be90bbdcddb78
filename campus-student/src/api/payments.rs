//! Payment endpoints: checkout orders, verification, reconciliation and the
//! student's own transactions

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use campus_common::db::models::Student;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::identity::StudentIdentity;
use crate::api::{non_empty, ok};
use crate::db::{payments as payment_rows, students};
use crate::error::{ApiError, ApiResult};
use crate::services::payments::{
    self, CreateOrderRequest, ManualPaymentRequest, Recorded, VerifyRequest, WebhookOutcome,
};
use crate::AppState;

pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

async fn current_student(state: &AppState, identity: &StudentIdentity) -> ApiResult<Student> {
    students::get_student(&state.db, &identity.student_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))
}

/// POST /api/razorpay/create-order
pub async fn create_order(
    State(state): State<AppState>,
    _identity: StudentIdentity,
    Json(request): Json<CreateOrderRequest>,
) -> ApiResult<Json<Value>> {
    let created = payments::create_order(&state.db, state.gateway.as_ref(), request).await?;
    Ok(Json(json!({
        "success": true,
        "order": created.order,
        "key": created.key,
    })))
}

/// POST /api/razorpay/verify
pub async fn verify_payment(
    State(state): State<AppState>,
    _identity: StudentIdentity,
    Json(request): Json<VerifyRequest>,
) -> ApiResult<Json<Value>> {
    let record = payments::verify_payment(
        &state.db,
        state.gateway.as_ref(),
        state.config.razorpay.key_secret.as_deref(),
        request,
    )
    .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Payment verified and saved successfully",
        "data": record,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ManualSyncRequest {
    pub payment_id: Option<String>,
}

/// POST /api/razorpay/manual-sync
pub async fn manual_sync(
    State(state): State<AppState>,
    _identity: StudentIdentity,
    Json(request): Json<ManualSyncRequest>,
) -> ApiResult<Json<Value>> {
    let payment_id = non_empty(request.payment_id.as_deref())
        .ok_or_else(|| ApiError::Validation("payment_id is required".to_string()))?;

    let recorded = payments::manual_sync(&state.db, state.gateway.as_ref(), payment_id).await?;
    let message = match recorded {
        Recorded::Inserted(_) => "Payment synced successfully",
        Recorded::Existing(_) => "Payment already recorded",
    };
    Ok(Json(json!({
        "success": true,
        "message": message,
        "data": recorded.record(),
    })))
}

/// POST /api/razorpay/webhook
///
/// Takes the raw body: the signature covers the exact bytes sent.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let outcome = payments::handle_webhook(
        &state.db,
        state.gateway.as_ref(),
        state.config.razorpay.webhook_secret.as_deref(),
        signature,
        &body,
    )
    .await?;

    let status = match outcome {
        WebhookOutcome::Ignored(_) => "ignored",
        WebhookOutcome::Recorded(Recorded::Inserted(_)) => "recorded",
        WebhookOutcome::Recorded(Recorded::Existing(_)) => "duplicate",
        WebhookOutcome::Failed => "accepted",
    };
    Ok(Json(json!({ "status": status })))
}

/// POST /api/payments
pub async fn create_manual_payment(
    State(state): State<AppState>,
    identity: StudentIdentity,
    Json(request): Json<ManualPaymentRequest>,
) -> ApiResult<Json<Value>> {
    let student = current_student(&state, &identity).await?;
    let record = payments::record_manual_payment(&state.db, &student, request).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Payment recorded, pending verification",
        "data": record,
    })))
}

/// GET /api/payments
pub async fn list_transactions(
    State(state): State<AppState>,
    identity: StudentIdentity,
) -> ApiResult<Json<Value>> {
    let student = current_student(&state, &identity).await?;
    let transactions = match student.registration_number.as_deref() {
        Some(registration_number) => {
            payment_rows::list_for_registration(&state.db, registration_number).await?
        }
        None => Vec::new(),
    };
    Ok(ok(transactions))
}
