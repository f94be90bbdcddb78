//! Shared fixtures for campus-student integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
};
use campus_common::config::{CampusConfig, RazorpayConfig};
use campus_common::db::init_database;
use campus_student::gateway::{
    signature, AcquirerData, GatewayError, GatewayOrder, GatewayPayment, OrderRequest,
    PaymentGateway,
};
use campus_student::{build_router, AppState};
use serde_json::{json, Map, Value};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const FREE_COURSE: &str = "ON-GR-FL-A1";
pub const KEY_SECRET: &str = "test_key_secret";
pub const WEBHOOK_SECRET: &str = "test_webhook_secret";

/// In-memory stand-in for the payment gateway
#[derive(Default)]
pub struct FakeGateway {
    orders: Mutex<HashMap<String, GatewayOrder>>,
    payments: Mutex<HashMap<String, GatewayPayment>>,
    created: Mutex<Vec<OrderRequest>>,
}

impl FakeGateway {
    pub fn add_order(&self, id: &str, notes: Value) {
        let notes = match notes {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.orders.lock().unwrap().insert(
            id.to_string(),
            GatewayOrder {
                id: id.to_string(),
                amount: 0,
                currency: "INR".to_string(),
                receipt: None,
                status: Some("paid".to_string()),
                notes,
            },
        );
    }

    pub fn add_payment(&self, id: &str, order_id: &str, status: &str, rrn: Option<&str>) {
        self.payments.lock().unwrap().insert(
            id.to_string(),
            GatewayPayment {
                id: id.to_string(),
                order_id: Some(order_id.to_string()),
                amount: 0,
                status: status.to_string(),
                method: Some("upi".to_string()),
                acquirer_data: AcquirerData {
                    rrn: rrn.map(String::from),
                    upi_transaction_id: None,
                },
                notes: Map::new(),
            },
        );
    }

    pub fn created_orders(&self) -> Vec<OrderRequest> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn key_id(&self) -> Option<String> {
        Some("rzp_test_key".to_string())
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        let id = format!("order_{}", self.created.lock().unwrap().len() + 1);
        self.created.lock().unwrap().push(request.clone());
        let order = GatewayOrder {
            id: id.clone(),
            amount: request.amount,
            currency: request.currency.clone(),
            receipt: Some(request.receipt.clone()),
            status: Some("created".to_string()),
            notes: request.notes.clone(),
        };
        self.orders.lock().unwrap().insert(id, order.clone());
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &str) -> Result<GatewayOrder, GatewayError> {
        self.orders
            .lock()
            .unwrap()
            .get(order_id)
            .cloned()
            .ok_or_else(|| GatewayError::Api(404, "order not found".to_string()))
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        self.payments
            .lock()
            .unwrap()
            .get(payment_id)
            .cloned()
            .ok_or_else(|| GatewayError::Api(404, "payment not found".to_string()))
    }
}

/// A fresh file-backed database plus the app state wired to it
pub struct TestEnv {
    _dir: TempDir,
    pub pool: SqlitePool,
    pub gateway: Arc<FakeGateway>,
    pub state: AppState,
}

impl TestEnv {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("campus.db");
        let pool = init_database(&db_path).await.unwrap();

        let config = CampusConfig {
            database_path: db_path,
            bind: "127.0.0.1:0".to_string(),
            free_courses: vec![FREE_COURSE.to_string()],
            default_max_students: 10,
            cors_origins: Vec::new(),
            db_max_lock_wait_ms: 5000,
            razorpay: RazorpayConfig {
                key_id: Some("rzp_test_key".to_string()),
                key_secret: Some(KEY_SECRET.to_string()),
                webhook_secret: Some(WEBHOOK_SECRET.to_string()),
                base_url: "http://127.0.0.1:9".to_string(),
            },
        };

        let gateway = Arc::new(FakeGateway::default());
        let state = AppState::new(pool.clone(), config, gateway.clone());

        Self {
            _dir: dir,
            pool,
            gateway,
            state,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        build_router(self.state.clone()).oneshot(request).await.unwrap()
    }
}

pub fn get(uri: &str, student: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(student) = student {
        builder = builder.header("x-student-id", student);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn send_json(method: &str, uri: &str, student: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(student) = student {
        builder = builder.header("x-student-id", student);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn post_json(uri: &str, student: Option<&str>, body: Value) -> Request<Body> {
    send_json("POST", uri, student, body)
}

/// Webhook delivery signed with the test webhook secret
pub fn signed_webhook(body: &Value) -> Request<Body> {
    let raw = body.to_string();
    let sig = signature::sign(WEBHOOK_SECRET, raw.as_bytes());
    Request::builder()
        .method("POST")
        .uri("/api/razorpay/webhook")
        .header("content-type", "application/json")
        .header("x-razorpay-signature", sig)
        .body(Body::from(raw))
        .unwrap()
}

pub fn captured_event(payment_id: &str, order_id: &str) -> Value {
    json!({
        "event": "payment.captured",
        "payload": {
            "payment": {
                "entity": {
                    "id": payment_id,
                    "order_id": order_id,
                    "amount": 500000,
                    "status": "captured",
                    "notes": []
                }
            }
        }
    })
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await
        .unwrap()
        .to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

pub async fn seed_center(pool: &SqlitePool, center_id: &str) {
    sqlx::query("INSERT INTO centers (center_id, center_name) VALUES (?, ?)")
        .bind(center_id)
        .bind(format!("Center {}", center_id))
        .execute(pool)
        .await
        .unwrap();
}

pub async fn seed_course(pool: &SqlitePool, course_id: &str, course_name: &str) {
    sqlx::query("INSERT INTO courses (course_id, course_name, type, language) VALUES (?, ?, 'online', 'German')")
        .bind(course_id)
        .bind(course_name)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn seed_batch(
    pool: &SqlitePool,
    batch_id: &str,
    course_id: &str,
    center_id: &str,
    status: &str,
    max_students: Option<i64>,
) {
    sqlx::query(
        "INSERT INTO batches (batch_id, batch_name, course_id, center_id, status, max_students) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(batch_id)
    .bind(format!("Batch {}", batch_id))
    .bind(course_id)
    .bind(center_id)
    .bind(status)
    .bind(max_students)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn seed_student(pool: &SqlitePool, student_id: &str, registration_number: &str) {
    sqlx::query(
        "INSERT INTO students (student_id, registration_number, name, email, phone, status) VALUES (?, ?, ?, ?, ?, 1)",
    )
    .bind(student_id)
    .bind(registration_number)
    .bind(format!("Student {}", student_id))
    .bind(format!("{}@example.com", student_id))
    .bind("9999999999")
    .execute(pool)
    .await
    .unwrap();
}

pub async fn seed_enrollment(
    pool: &SqlitePool,
    enrollment_id: &str,
    student_id: &str,
    batch_id: &str,
    status: bool,
    is_permanent: bool,
    end_date: Option<&str>,
) {
    sqlx::query(
        "INSERT INTO enrollments (enrollment_id, student_id, batch_id, status, is_permanent, end_date) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(enrollment_id)
    .bind(student_id)
    .bind(batch_id)
    .bind(status)
    .bind(is_permanent)
    .bind(end_date)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn seed_merge_group(pool: &SqlitePool, group_id: &str, batch_ids: &[&str]) {
    for batch_id in batch_ids {
        sqlx::query("INSERT INTO batch_merge_members (merge_group_id, batch_id) VALUES (?, ?)")
            .bind(group_id)
            .bind(batch_id)
            .execute(pool)
            .await
            .unwrap();
    }
}

pub async fn seed_state(pool: &SqlitePool, state_id: &str, state_name: &str) {
    sqlx::query("INSERT INTO states (state_id, state_name) VALUES (?, ?)")
        .bind(state_id)
        .bind(state_name)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn seed_center_in_state(pool: &SqlitePool, center_id: &str, center_name: &str, state_id: &str) {
    sqlx::query("INSERT INTO centers (center_id, center_name, state) VALUES (?, ?, ?)")
        .bind(center_id)
        .bind(center_name)
        .bind(state_id)
        .execute(pool)
        .await
        .unwrap();
}

/// `YYYY-MM-DD` for today shifted by `days`
pub fn days_from_today(days: i64) -> String {
    let mut date = campus_common::time::today();
    for _ in 0..days.abs() {
        date = if days > 0 {
            date.succ_opt().unwrap()
        } else {
            date.pred_opt().unwrap()
        };
    }
    campus_common::time::format_date(date)
}

pub async fn seed_event(pool: &SqlitePool, id: &str, start: &str, end: Option<&str>, status: &str) {
    sqlx::query(
        "INSERT INTO academic_events (id, title, event_type, event_start_date, event_end_date, status) VALUES (?, ?, 'holiday', ?, ?, ?)",
    )
    .bind(id)
    .bind(format!("Event {}", id))
    .bind(start)
    .bind(end)
    .bind(status)
    .execute(pool)
    .await
    .unwrap();
}
