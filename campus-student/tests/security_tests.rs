//! Payment integrity: signatures, idempotent recording and the
//! payment-mode lock

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use campus_student::gateway::signature;
use campus_student::services::payment_lock::{self, LockOutcome, LockScope, PaymentType};
use common::*;
use serde_json::json;
use std::time::Duration;

async fn payment_count(env: &TestEnv) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM student_course_payments")
        .fetch_one(&env.pool)
        .await
        .unwrap()
}

async fn seed_paid_order(env: &TestEnv, payment_status: &str) {
    env.gateway.add_order(
        "order_A",
        json!({
            "registration_number": "REG1",
            "course_name": "German A2",
            "final_fees": "5000",
            "payment_type": "full"
        }),
    );
    env.gateway.add_payment("pay_A", "order_A", payment_status, Some("RRN77"));
}

// =============================================================================
// Webhook
// =============================================================================

#[tokio::test]
async fn test_webhook_rejects_missing_or_bad_signature() {
    let env = TestEnv::new().await;
    let body = captured_event("pay_A", "order_A").to_string();

    let unsigned = Request::builder()
        .method("POST")
        .uri("/api/razorpay/webhook")
        .body(Body::from(body.clone()))
        .unwrap();
    assert_eq!(env.send(unsigned).await.status(), StatusCode::BAD_REQUEST);

    let forged = Request::builder()
        .method("POST")
        .uri("/api/razorpay/webhook")
        .header("x-razorpay-signature", signature::sign("wrong-secret", body.as_bytes()))
        .body(Body::from(body))
        .unwrap();
    let response = env.send(forged).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "INVALID_SIGNATURE");

    assert_eq!(payment_count(&env).await, 0);
}

#[tokio::test]
async fn test_webhook_replay_records_once() {
    let env = TestEnv::new().await;
    seed_student(&env.pool, "s1", "REG1").await;
    seed_paid_order(&env, "captured").await;
    let event = captured_event("pay_A", "order_A");

    let first = env.send(signed_webhook(&event)).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(body_json(first).await["status"], "recorded");

    let second = env.send(signed_webhook(&event)).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(body_json(second).await["status"], "duplicate");

    assert_eq!(payment_count(&env).await, 1);

    let (registration, rrn, status): (Option<String>, Option<String>, bool) = sqlx::query_as(
        "SELECT registration_number, bank_rrn, status FROM student_course_payments WHERE payment_id = 'pay_A'",
    )
    .fetch_one(&env.pool)
    .await
    .unwrap();
    assert_eq!(registration.as_deref(), Some("REG1"));
    assert_eq!(rrn.as_deref(), Some("RRN77"));
    assert!(!status);

    // Notification is dispatched in the background
    let mut delivered = 0i64;
    for _ in 0..50 {
        delivered = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE student_id = 's1'")
            .fetch_one(&env.pool)
            .await
            .unwrap();
        if delivered > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(delivered, 1);
}

#[tokio::test]
async fn test_webhook_ignores_other_events() {
    let env = TestEnv::new().await;
    let event = json!({"event": "payment.failed", "payload": {}});

    let response = env.send(signed_webhook(&event)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ignored");
    assert_eq!(payment_count(&env).await, 0);
}

#[tokio::test]
async fn test_webhook_falls_back_to_signed_entity() {
    let env = TestEnv::new().await;
    // Gateway knows neither the payment nor the order
    let event = captured_event("pay_unknown", "order_unknown");

    let response = env.send(signed_webhook(&event)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "recorded");
    assert_eq!(payment_count(&env).await, 1);
}

// =============================================================================
// Checkout verification and manual sync
// =============================================================================

#[tokio::test]
async fn test_verify_rejects_bad_signature_before_writing() {
    let env = TestEnv::new().await;
    seed_paid_order(&env, "captured").await;

    let response = env
        .send(post_json(
            "/api/razorpay/verify",
            Some("s1"),
            json!({
                "razorpay_order_id": "order_A",
                "razorpay_payment_id": "pay_A",
                "razorpay_signature": "deadbeef"
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(payment_count(&env).await, 0);
}

#[tokio::test]
async fn test_verify_then_repeat_returns_existing_row() {
    let env = TestEnv::new().await;
    seed_paid_order(&env, "captured").await;
    let sig = signature::sign(KEY_SECRET, b"order_A|pay_A");
    let body = json!({
        "razorpay_order_id": "order_A",
        "razorpay_payment_id": "pay_A",
        "razorpay_signature": sig
    });

    let first = env.send(post_json("/api/razorpay/verify", Some("s1"), body.clone())).await;
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_json(first).await;
    assert_eq!(first["data"]["payment_id"], "pay_A");
    assert_eq!(first["data"]["final_fees"], 5000.0);

    let second = env.send(post_json("/api/razorpay/verify", Some("s1"), body)).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(body_json(second).await["data"]["created_at"], first["data"]["created_at"]);

    assert_eq!(payment_count(&env).await, 1);
}

#[tokio::test]
async fn test_manual_sync_requires_captured_payment() {
    let env = TestEnv::new().await;
    seed_paid_order(&env, "authorized").await;

    let response = env
        .send(post_json("/api/razorpay/manual-sync", Some("s1"), json!({"payment_id": "pay_A"})))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(payment_count(&env).await, 0);
}

// =============================================================================
// Payment-mode lock
// =============================================================================

#[tokio::test]
async fn test_lock_is_immutable() {
    let env = TestEnv::new().await;

    let first = env
        .send(post_json(
            "/api/payment-lock/lock",
            Some("s1"),
            json!({"register_number": "REG1", "payment_type": "emi"}),
        ))
        .await;
    assert_eq!(first.status(), StatusCode::OK);

    for payment_type in ["full", "emi"] {
        let again = env
            .send(post_json(
                "/api/payment-lock/lock",
                Some("s1"),
                json!({"register_number": "REG1", "payment_type": payment_type}),
            ))
            .await;
        assert_eq!(again.status(), StatusCode::CONFLICT);
    }

    let lock = env.send(get("/api/payment-lock/REG1", Some("s1"))).await;
    assert_eq!(lock.status(), StatusCode::OK);
    assert_eq!(body_json(lock).await["data"]["payment_type"], "emi");
}

#[tokio::test]
async fn test_concurrent_lock_requests_acquire_once() {
    let env = TestEnv::new().await;
    seed_center(&env.pool, "c1").await;
    seed_course(&env.pool, "paid", "ON-GR-FL-A2").await;
    seed_batch(&env.pool, "b1", "paid", "c1", "Approved", None).await;

    let mut handles = Vec::new();
    for i in 0..20 {
        let pool = env.pool.clone();
        let lock_wait = env.state.lock_wait;
        let payment_type = if i % 2 == 0 { PaymentType::Full } else { PaymentType::Emi };
        handles.push(tokio::spawn(async move {
            let scope = LockScope::Batch("b1".to_string());
            payment_lock::acquire_lock(&pool, lock_wait, "REG1", &scope, payment_type).await
        }));
    }

    let mut acquired = Vec::new();
    let mut refused = Vec::new();
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            LockOutcome::Acquired(lock) => acquired.push(lock),
            LockOutcome::AlreadyLocked(lock) => refused.push(lock),
        }
    }
    assert_eq!(acquired.len(), 1);
    assert_eq!(refused.len(), 19);

    // Every refusal reports the one stored lock
    let winner = &acquired[0];
    assert!(refused.iter().all(|lock| lock.lock_id == winner.lock_id
        && lock.payment_type == winner.payment_type));

    let rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM student_payment_locks WHERE register_number = 'REG1'",
    )
    .fetch_one(&env.pool)
    .await
    .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn test_lock_validation_and_scopes() {
    let env = TestEnv::new().await;
    seed_center(&env.pool, "c1").await;
    seed_course(&env.pool, "paid", "ON-GR-FL-A2").await;
    seed_batch(&env.pool, "b1", "paid", "c1", "Approved", None).await;
    seed_enrollment(&env.pool, "e1", "s1", "b1", true, false, None).await;

    let bad_type = env
        .send(post_json(
            "/api/payment-lock/lock",
            Some("s1"),
            json!({"register_number": "REG1", "payment_type": "weekly"}),
        ))
        .await;
    assert_eq!(bad_type.status(), StatusCode::BAD_REQUEST);

    let missing_enrollment = env
        .send(post_json(
            "/api/payment-lock/lock",
            Some("s1"),
            json!({"register_number": "REG1", "payment_type": "full", "enrollment_id": "nope"}),
        ))
        .await;
    assert_eq!(missing_enrollment.status(), StatusCode::NOT_FOUND);

    // Batch scope and global scope are independent
    let batch_lock = env
        .send(post_json(
            "/api/payment-lock/lock",
            Some("s1"),
            json!({"register_number": "REG1", "payment_type": "full", "enrollment_id": "e1"}),
        ))
        .await;
    assert_eq!(batch_lock.status(), StatusCode::OK);
    let global_lock = env
        .send(post_json(
            "/api/payment-lock/lock",
            Some("s1"),
            json!({"register_number": "REG1", "payment_type": "emi"}),
        ))
        .await;
    assert_eq!(global_lock.status(), StatusCode::OK);

    let scoped = env
        .send(get("/api/payment-lock/REG1?enrollment_id=e1", Some("s1")))
        .await;
    assert_eq!(body_json(scoped).await["data"]["payment_type"], "full");

    let unlocked = env.send(get("/api/payment-lock/REG2", Some("s1"))).await;
    assert_eq!(unlocked.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_order_refused_when_type_contradicts_lock() {
    let env = TestEnv::new().await;

    env.send(post_json(
        "/api/payment-lock/lock",
        Some("s1"),
        json!({"register_number": "REG1", "payment_type": "emi"}),
    ))
    .await;

    let refused = env
        .send(post_json(
            "/api/razorpay/create-order",
            Some("s1"),
            json!({"final_fees": 4999.99, "registration_number": "REG1", "payment_type": "full"}),
        ))
        .await;
    assert_eq!(refused.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(refused).await["error"]["code"], "SECURITY_ERROR");
    assert!(env.gateway.created_orders().is_empty());

    let accepted = env
        .send(post_json(
            "/api/razorpay/create-order",
            Some("s1"),
            json!({
                "final_fees": 4999.99,
                "registration_number": "REG1",
                "payment_type": "emi",
                "emi_duration": 3,
                "current_emi": 1
            }),
        ))
        .await;
    assert_eq!(accepted.status(), StatusCode::OK);
    let json = body_json(accepted).await;
    assert_eq!(json["key"], "rzp_test_key");

    let orders = env.gateway.created_orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].amount, 499999);
    assert_eq!(orders[0].currency, "INR");
    assert!(orders[0].receipt.starts_with("receipt_"));
    assert_eq!(orders[0].notes["payment_type"], "emi");
}

#[tokio::test]
async fn test_order_requires_positive_fees() {
    let env = TestEnv::new().await;
    let response = env
        .send(post_json(
            "/api/razorpay/create-order",
            Some("s1"),
            json!({"final_fees": 0, "registration_number": "REG1", "payment_type": "full"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
