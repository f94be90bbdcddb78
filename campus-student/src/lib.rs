//! campus-student library - student-facing LMS backend
//!
//! Enrollment with seat allocation, merge-aware class materials and
//! attendance, payment-mode locking, payment reconciliation and the
//! learning-skill quiz modules, plus student profiles, the academic
//! calendar and assessment marks.

use axum::http::{HeaderValue, Method};
use axum::Router;
use campus_common::config::CampusConfig;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub mod api;
pub mod db;
pub mod error;
pub mod gateway;
pub mod services;

use db::lock_wait::LockWait;
use gateway::PaymentGateway;
use services::enrollment::EnrollmentPolicy;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    pub config: Arc<CampusConfig>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub policy: Arc<EnrollmentPolicy>,
    /// Writer-lock budget for contended inserts
    pub lock_wait: LockWait,
}

impl AppState {
    /// Create new application state; the enrollment policy comes from config
    pub fn new(db: SqlitePool, config: CampusConfig, gateway: Arc<dyn PaymentGateway>) -> Self {
        let lock_wait = LockWait::new(config.db_max_lock_wait_ms);
        let policy = EnrollmentPolicy {
            free_courses: config.free_courses.iter().cloned().collect(),
            default_max_students: config.default_max_students,
            lock_wait,
        };
        Self {
            db,
            config: Arc::new(config),
            gateway,
            policy: Arc::new(policy),
            lock_wait,
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(parsed)
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .merge(api::student_routes())
        .merge(api::public_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
