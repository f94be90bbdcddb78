//! Payment orders and reconciliation
//!
//! Three paths can report the same captured payment: the checkout verify
//! call, the gateway webhook and a manual sync. All of them derive the row
//! the same way and record it through [`record_payment`], which is
//! idempotent on the gateway payment id.

use campus_common::db::models::{PaymentRecord, Student};
use campus_common::{ids, time};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

use crate::db::payments::{self, NewPayment};
use crate::error::{ApiError, ApiResult};
use crate::gateway::{signature, AcquirerData, GatewayOrder, GatewayPayment, OrderRequest, PaymentGateway};
use crate::services::notifier;
use crate::services::payment_lock::{self, PaymentType};

pub const CURRENCY: &str = "INR";

/// Checkout order request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOrderRequest {
    pub final_fees: Option<f64>,
    pub registration_number: Option<String>,
    pub payment_type: Option<String>,
    pub enrollment_id: Option<String>,
    pub student_name: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub course_name: Option<String>,
    pub course_duration: Option<Value>,
    pub original_fees: Option<Value>,
    pub discount_percentage: Option<Value>,
    pub emi_duration: Option<Value>,
    pub current_emi: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedOrder {
    pub order: GatewayOrder,
    /// Public key for the checkout widget
    pub key: Option<String>,
}

/// Create a gateway order after checking the payment-mode lock
pub async fn create_order(
    pool: &SqlitePool,
    gateway: &dyn PaymentGateway,
    request: CreateOrderRequest,
) -> ApiResult<CreatedOrder> {
    let final_fees = match request.final_fees {
        Some(fees) if fees.is_finite() && fees > 0.0 => fees,
        _ => return Err(ApiError::Validation("Final fees is required".to_string())),
    };
    let registration_number = non_empty(request.registration_number.as_deref())
        .ok_or_else(|| ApiError::Validation("registration_number is required".to_string()))?;
    let payment_type: PaymentType = non_empty(request.payment_type.as_deref())
        .ok_or_else(|| ApiError::Validation("payment_type is required".to_string()))?
        .parse()?;

    let scope = payment_lock::resolve_scope(pool, request.enrollment_id.as_deref()).await?;
    if let Err(mismatch) =
        payment_lock::check_order(pool, registration_number, &scope, payment_type).await?
    {
        return Err(ApiError::Security(format!(
            "Payment mode is locked to '{}' for this enrollment; '{}' orders are not allowed",
            mismatch.locked, mismatch.requested
        )));
    }

    let order_request = OrderRequest {
        amount: (final_fees * 100.0).round() as i64,
        currency: CURRENCY.to_string(),
        receipt: format!("receipt_{}", time::now_millis()),
        notes: order_notes(&request, final_fees, payment_type),
    };

    let order = gateway.create_order(&order_request).await?;
    info!(
        order_id = %order.id,
        registration_number,
        %payment_type,
        amount = order_request.amount,
        "Payment order created"
    );

    Ok(CreatedOrder {
        order,
        key: gateway.key_id(),
    })
}

fn order_notes(request: &CreateOrderRequest, final_fees: f64, payment_type: PaymentType) -> Map<String, Value> {
    let mut notes = Map::new();
    let mut put = |key: &str, value: Option<Value>| {
        if let Some(value) = value.filter(|v| !v.is_null()) {
            notes.insert(key.to_string(), value);
        }
    };
    put("enrollment_id", request.enrollment_id.clone().map(Value::from));
    put("registration_number", request.registration_number.clone().map(Value::from));
    put("student_name", request.student_name.clone().map(Value::from));
    put("email", request.email.clone().map(Value::from));
    put("contact", request.contact.clone().map(Value::from));
    put("course_name", request.course_name.clone().map(Value::from));
    put("course_duration", request.course_duration.clone());
    put("original_fees", request.original_fees.clone());
    put("discount_percentage", request.discount_percentage.clone());
    put("final_fees", Some(Value::from(final_fees)));
    put("payment_type", Some(Value::from(payment_type.as_str())));
    put("emi_duration", request.emi_duration.clone());
    put("current_emi", request.current_emi.clone());
    notes
}

/// Derive a payment row from order notes and gateway payment data
///
/// Numeric notes are parsed leniently (unparseable means 0). Instalment
/// fields are kept only for `emi` payments. The row starts unverified.
pub fn payment_from_notes(
    payment_id: &str,
    order_id: Option<&str>,
    notes: &Map<String, Value>,
    acquirer: &AcquirerData,
) -> NewPayment {
    let payment_type = note_text(notes, "payment_type")
        .map(|t| t.to_ascii_lowercase())
        .unwrap_or_else(|| PaymentType::Full.as_str().to_string());
    let is_emi = payment_type == PaymentType::Emi.as_str();

    let bank_rrn = non_empty(acquirer.rrn.as_deref())
        .or_else(|| non_empty(acquirer.upi_transaction_id.as_deref()))
        .map(String::from);

    NewPayment {
        payment_id: payment_id.to_string(),
        order_id: order_id.map(String::from),
        enrollment_id: note_text(notes, "enrollment_id"),
        registration_number: note_text(notes, "registration_number"),
        student_name: note_text(notes, "student_name"),
        email: note_text(notes, "email"),
        contact: note_text(notes, "contact"),
        course_name: note_text(notes, "course_name"),
        course_duration: note_number(notes, "course_duration") as i64,
        original_fees: note_number(notes, "original_fees"),
        discount_percentage: note_number(notes, "discount_percentage"),
        final_fees: note_number(notes, "final_fees"),
        emi_duration: is_emi.then(|| note_number(notes, "emi_duration") as i64),
        current_emi: is_emi.then(|| note_number(notes, "current_emi") as i64),
        payment_type,
        bank_rrn,
        status: false,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn note_text(notes: &Map<String, Value>, key: &str) -> Option<String> {
    match notes.get(key)? {
        Value::String(s) => non_empty(Some(s)).map(String::from),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn note_number(notes: &Map<String, Value>, key: &str) -> f64 {
    let parsed = match notes.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite()).unwrap_or(0.0)
}

/// Outcome of recording a payment
#[derive(Debug, Clone)]
pub enum Recorded {
    Inserted(PaymentRecord),
    /// The payment id was already on file; nothing was written
    Existing(PaymentRecord),
}

impl Recorded {
    pub fn record(&self) -> &PaymentRecord {
        match self {
            Recorded::Inserted(record) | Recorded::Existing(record) => record,
        }
    }

    pub fn into_record(self) -> PaymentRecord {
        match self {
            Recorded::Inserted(record) | Recorded::Existing(record) => record,
        }
    }
}

/// Record a payment once per payment id
///
/// A newly inserted row triggers the payment-received notification.
pub async fn record_payment(pool: &SqlitePool, new: &NewPayment) -> ApiResult<Recorded> {
    let inserted = payments::insert_if_absent(pool, new).await?;
    let record = payments::find(pool, &new.payment_id)
        .await?
        .ok_or_else(|| ApiError::Upstream("Payment row missing after insert".to_string()))?;

    if inserted {
        info!(
            payment_id = %record.payment_id,
            order_id = ?record.order_id,
            payment_type = %record.payment_type,
            "Payment recorded"
        );
        notifier::payment_received(pool.clone(), record.clone());
        Ok(Recorded::Inserted(record))
    } else {
        info!(payment_id = %record.payment_id, "Payment already recorded, skipping insert");
        Ok(Recorded::Existing(record))
    }
}

/// Checkout callback
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
}

/// Verify the checkout signature, then record the payment
pub async fn verify_payment(
    pool: &SqlitePool,
    gateway: &dyn PaymentGateway,
    key_secret: Option<&str>,
    request: VerifyRequest,
) -> ApiResult<PaymentRecord> {
    let (Some(order_id), Some(payment_id), Some(sig)) = (
        non_empty(request.razorpay_order_id.as_deref()),
        non_empty(request.razorpay_payment_id.as_deref()),
        non_empty(request.razorpay_signature.as_deref()),
    ) else {
        return Err(ApiError::Validation(
            "razorpay_order_id, razorpay_payment_id and razorpay_signature are required".to_string(),
        ));
    };
    let key_secret = key_secret
        .ok_or_else(|| ApiError::Upstream("Payment gateway is not configured".to_string()))?;

    if !signature::verify_checkout(key_secret, order_id, payment_id, sig) {
        warn!(order_id, payment_id, "Checkout signature mismatch");
        return Err(ApiError::Signature("Invalid signature".to_string()));
    }

    let order = gateway.fetch_order(order_id).await?;
    let payment = gateway.fetch_payment(payment_id).await?;

    let new = payment_from_notes(payment_id, Some(order_id), &order.notes, &payment.acquirer_data);
    Ok(record_payment(pool, &new).await?.into_record())
}

/// Record a captured payment fetched straight from the gateway
///
/// Recovery path for when both the verify call and the webhook were lost.
pub async fn manual_sync(
    pool: &SqlitePool,
    gateway: &dyn PaymentGateway,
    payment_id: &str,
) -> ApiResult<Recorded> {
    let payment = gateway.fetch_payment(payment_id).await?;
    if !payment.is_captured() {
        return Err(ApiError::Conflict(format!(
            "Payment {} is not captured (status: {})",
            payment.id, payment.status
        )));
    }
    let notes = payment_notes(gateway, &payment).await;
    let new = payment_from_notes(&payment.id, payment.order_id.as_deref(), &notes, &payment.acquirer_data);
    record_payment(pool, &new).await
}

/// Notes of a payment, falling back to its order's notes
pub async fn payment_notes(gateway: &dyn PaymentGateway, payment: &GatewayPayment) -> Map<String, Value> {
    if !payment.notes.is_empty() {
        return payment.notes.clone();
    }
    let Some(order_id) = payment.order_id.as_deref() else {
        return Map::new();
    };
    match gateway.fetch_order(order_id).await {
        Ok(order) => order.notes,
        Err(e) => {
            warn!(order_id, error = %e, "Order notes unavailable, recording payment without them");
            Map::new()
        }
    }
}

pub const CAPTURED_EVENT: &str = "payment.captured";

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    event: String,
    #[serde(default)]
    payload: WebhookPayload,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookPayload {
    payment: Option<WebhookEntity>,
}

#[derive(Debug, Deserialize)]
struct WebhookEntity {
    entity: GatewayPayment,
}

/// What a signed webhook delivery led to
#[derive(Debug)]
pub enum WebhookOutcome {
    Ignored(String),
    Recorded(Recorded),
    /// Signed and relevant, but recording failed; already logged
    Failed,
}

/// Process a gateway webhook delivery
///
/// Only a bad or missing signature is an error. Once the body is
/// authenticated every outcome is acknowledged so the gateway stops
/// retrying; duplicates are absorbed by [`record_payment`].
pub async fn handle_webhook(
    pool: &SqlitePool,
    gateway: &dyn PaymentGateway,
    webhook_secret: Option<&str>,
    signature_header: Option<&str>,
    body: &[u8],
) -> ApiResult<WebhookOutcome> {
    let Some(secret) = non_empty(webhook_secret) else {
        warn!("Webhook received but no webhook secret is configured");
        return Err(ApiError::Signature("Webhook secret not configured".to_string()));
    };
    let Some(sig) = non_empty(signature_header) else {
        return Err(ApiError::Signature("Missing webhook signature".to_string()));
    };
    if !signature::verify(secret, body, sig) {
        warn!("Webhook signature mismatch");
        return Err(ApiError::Signature("Invalid webhook signature".to_string()));
    }

    let event: WebhookEvent = match serde_json::from_slice(body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Signed webhook body is not a recognised event");
            return Ok(WebhookOutcome::Ignored("unrecognised payload".to_string()));
        }
    };
    if event.event != CAPTURED_EVENT {
        debug!(event = %event.event, "Ignoring webhook event");
        return Ok(WebhookOutcome::Ignored(event.event));
    }
    let Some(WebhookEntity { entity }) = event.payload.payment else {
        warn!("payment.captured webhook without a payment entity");
        return Ok(WebhookOutcome::Ignored("missing payment entity".to_string()));
    };

    let payment = match gateway.fetch_payment(&entity.id).await {
        Ok(payment) => payment,
        Err(e) => {
            warn!(payment_id = %entity.id, error = %e, "Payment fetch failed, using webhook entity");
            entity
        }
    };
    let notes = payment_notes(gateway, &payment).await;
    let new = payment_from_notes(&payment.id, payment.order_id.as_deref(), &notes, &payment.acquirer_data);

    match record_payment(pool, &new).await {
        Ok(recorded) => Ok(WebhookOutcome::Recorded(recorded)),
        Err(e) => {
            error!(payment_id = %payment.id, error = %e, "Failed to record webhook payment");
            Ok(WebhookOutcome::Failed)
        }
    }
}

/// Student-entered payment
#[derive(Debug, Clone, Deserialize)]
pub struct ManualPaymentRequest {
    pub enrollment_id: Option<String>,
    pub amount: Option<f64>,
    pub payment_type: Option<String>,
    pub current_emi: Option<i64>,
    pub emi_duration: Option<i64>,
    pub course_name: Option<String>,
    pub course_duration: Option<i64>,
    pub original_fees: Option<f64>,
    pub discount_percentage: Option<f64>,
}

/// Record a manual payment entry, pending admin approval
pub async fn record_manual_payment(
    pool: &SqlitePool,
    student: &Student,
    request: ManualPaymentRequest,
) -> ApiResult<PaymentRecord> {
    let (Some(enrollment_id), Some(amount), Some(payment_type)) = (
        non_empty(request.enrollment_id.as_deref()),
        request.amount.filter(|a| a.is_finite() && *a > 0.0),
        non_empty(request.payment_type.as_deref()),
    ) else {
        return Err(ApiError::Validation("Missing required fields.".to_string()));
    };
    let payment_type: PaymentType = payment_type.parse()?;
    let is_emi = payment_type == PaymentType::Emi;

    let placeholder_id = format!("manual-{}-{}", time::now_millis(), &ids::generate()[..8]);

    let new = NewPayment {
        payment_id: placeholder_id.clone(),
        order_id: Some(placeholder_id),
        enrollment_id: Some(enrollment_id.to_string()),
        registration_number: student.registration_number.clone(),
        student_name: Some(student.name.clone()),
        email: student.email.clone(),
        contact: student.phone.clone(),
        course_name: Some(
            request
                .course_name
                .unwrap_or_else(|| "Unknown Course".to_string()),
        ),
        course_duration: request.course_duration.unwrap_or(0),
        original_fees: request.original_fees.unwrap_or(amount),
        discount_percentage: request.discount_percentage.unwrap_or(0.0),
        final_fees: amount,
        payment_type: payment_type.as_str().to_string(),
        emi_duration: if is_emi { request.emi_duration } else { None },
        current_emi: if is_emi { request.current_emi } else { None },
        bank_rrn: None,
        status: false,
    };

    Ok(record_payment(pool, &new).await?.into_record())
}
