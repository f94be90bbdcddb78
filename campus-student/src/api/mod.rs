//! HTTP API handlers for campus-student

pub mod attendance;
pub mod batches;
pub mod buildinfo;
pub mod classes;
pub mod events;
pub mod health;
pub mod identity;
pub mod lsrw;
pub mod notifications;
pub mod payment_lock;
pub mod payments;
pub mod students;

use axum::{
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::AppState;

pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use identity::{MaybeStudent, StudentIdentity};

/// Success envelope shared by every student endpoint
pub(crate) fn ok<T: Serialize>(data: T) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Student-facing routes; each handler extracts the identity it needs
pub fn student_routes() -> Router<AppState> {
    Router::new()
        .route("/api/batches/by-center", post(batches::batches_by_center))
        .route("/api/batches/enroll", post(batches::enroll))
        .route("/api/batches/enrolled", get(batches::enrolled_batches))
        .route("/api/batches/:batch_id/occupancy", get(batches::occupancy))
        .route("/api/classes/notes/:batch_id", get(classes::notes))
        .route("/api/classes/gmeets/:batch_id", get(classes::gmeets))
        .route("/api/attendance/student", get(attendance::student_attendance))
        .route(
            "/api/attendance/student/batch/:batch_id",
            get(attendance::student_batch_attendance),
        )
        .route("/api/payment-lock/lock", post(payment_lock::lock_payment_type))
        .route("/api/payment-lock/:register_number", get(payment_lock::get_payment_lock))
        .route("/api/razorpay/create-order", post(payments::create_order))
        .route("/api/razorpay/verify", post(payments::verify_payment))
        .route("/api/razorpay/manual-sync", post(payments::manual_sync))
        .route(
            "/api/payments",
            get(payments::list_transactions).post(payments::create_manual_payment),
        )
        .route("/api/lsrw/student/:batch_id", get(lsrw::student_content))
        .route("/api/lsrw/submit", post(lsrw::submit_answers))
        .route("/api/lsrw/review/:lsrw_id", get(lsrw::review))
        .route("/api/lsrw/task", post(lsrw::submit_task))
        .route("/api/notifications", get(notifications::list_notifications))
        .route("/api/notifications/:id", patch(notifications::mark_read))
        .route("/api/students/details", get(students::student_details))
        .route("/api/students/update", put(students::update_student))
        .route(
            "/api/student/certificates/marks/:student_id/:batch_id",
            get(students::assessment_marks),
        )
}

/// Routes that need no student identity: lookups used before sign-in, the
/// school calendar, gateway callbacks and operational endpoints
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/students/states", get(students::list_states))
        .route("/api/students/centers", get(students::centers_by_state))
        .route("/api/students/all-centers", get(students::all_centers))
        .route("/api/events/upcoming", get(events::upcoming))
        .route("/api/events/range", get(events::in_range))
        .route("/api/announcements/upcoming", get(events::upcoming))
        .route("/api/announcements/range", get(events::in_range))
        .route("/api/razorpay/webhook", post(payments::webhook))
        .route("/api/buildinfo", get(get_build_info))
        .merge(health_routes())
}
