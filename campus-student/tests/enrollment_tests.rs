//! Enrollment lifecycle, expiry, merge groups and attendance

mod common;

use campus_student::db::enrollments;
use campus_student::services::enrollment::{self, EnrollmentError};
use campus_student::services::{attendance, merge_resolver};
use common::*;
use std::collections::BTreeSet;

async fn seed_courses(env: &TestEnv) {
    seed_center(&env.pool, "c1").await;
    seed_course(&env.pool, "free", FREE_COURSE).await;
    seed_course(&env.pool, "paid", "ON-GR-FL-A2").await;
}

#[tokio::test]
async fn test_free_course_is_approved_and_permanent() {
    let env = TestEnv::new().await;
    seed_courses(&env).await;
    seed_batch(&env.pool, "bf", "free", "c1", "Approved", Some(4)).await;

    let result = enrollment::enroll(&env.pool, &env.state.policy, "s1", "bf")
        .await
        .unwrap();

    assert!(result.is_free_course);
    assert!(result.status);
    assert!(result.is_permanent);
    assert_eq!(result.seats_remaining, 3);

    let row = enrollments::find(&env.pool, "s1", "bf").await.unwrap().unwrap();
    assert!(row.status && row.is_permanent);
}

#[tokio::test]
async fn test_paid_course_starts_pending() {
    let env = TestEnv::new().await;
    seed_courses(&env).await;
    seed_batch(&env.pool, "bp", "paid", "c1", "Approved", Some(1)).await;

    let result = enrollment::enroll(&env.pool, &env.state.policy, "s1", "bp")
        .await
        .unwrap();
    assert!(!result.is_free_course);
    assert!(!result.status);
    assert!(!result.is_permanent);
    assert_eq!(result.seats_remaining, 0);

    // Repeat request on a now-full batch still reports the duplicate
    let again = enrollment::enroll(&env.pool, &env.state.policy, "s1", "bp").await;
    assert!(matches!(again, Err(EnrollmentError::AlreadyEnrolled)));

    let other = enrollment::enroll(&env.pool, &env.state.policy, "s2", "bp").await;
    assert!(matches!(other, Err(EnrollmentError::BatchFull)));

    let missing = enrollment::enroll(&env.pool, &env.state.policy, "s2", "nope").await;
    assert!(matches!(missing, Err(EnrollmentError::BatchNotFound)));
}

#[tokio::test]
async fn test_expiry_spares_permanent_and_current_rows() {
    let env = TestEnv::new().await;
    seed_courses(&env).await;
    for batch_id in ["b1", "b2", "b3", "b4"] {
        seed_batch(&env.pool, batch_id, "paid", "c1", "Started", None).await;
    }
    seed_enrollment(&env.pool, "lapsed", "s1", "b1", true, false, Some("2000-01-01")).await;
    seed_enrollment(&env.pool, "permanent", "s1", "b2", true, true, Some("2000-01-01")).await;
    seed_enrollment(&env.pool, "future", "s1", "b3", true, false, Some("2999-12-31")).await;
    seed_enrollment(&env.pool, "open-ended", "s1", "b4", true, false, None).await;

    let expired = enrollment::expire_stale(&env.pool, "s1").await.unwrap();
    let expired_ids: Vec<&str> = expired.iter().map(|e| e.enrollment_id.as_str()).collect();
    assert_eq!(expired_ids, vec!["lapsed"]);

    let lapsed = enrollments::get(&env.pool, "lapsed").await.unwrap().unwrap();
    assert!(!lapsed.status);
    let permanent = enrollments::get(&env.pool, "permanent").await.unwrap().unwrap();
    assert!(permanent.status);

    // Idempotent: nothing left to expire
    assert!(enrollment::expire_stale(&env.pool, "s1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_expire_all_covers_every_student() {
    let env = TestEnv::new().await;
    seed_courses(&env).await;
    seed_batch(&env.pool, "b1", "paid", "c1", "Started", None).await;
    seed_enrollment(&env.pool, "e1", "s1", "b1", true, false, Some("2001-05-05")).await;
    seed_enrollment(&env.pool, "e2", "s2", "b1", true, false, Some("2001-05-05")).await;
    seed_enrollment(&env.pool, "e3", "s3", "b1", true, true, Some("2001-05-05")).await;

    assert_eq!(enrollment::expire_all_stale(&env.pool).await.unwrap(), 2);
    assert_eq!(enrollment::expire_all_stale(&env.pool).await.unwrap(), 0);
}

#[tokio::test]
async fn test_merge_groups_are_symmetric() {
    let env = TestEnv::new().await;
    seed_courses(&env).await;
    for batch_id in ["a", "b", "c", "solo"] {
        seed_batch(&env.pool, batch_id, "paid", "c1", "Started", None).await;
    }
    seed_merge_group(&env.pool, "g1", &["a", "b", "c"]).await;

    let expected: BTreeSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    for batch_id in ["a", "b", "c"] {
        assert_eq!(merge_resolver::resolve_group(&env.pool, batch_id).await, expected);
    }

    let solo = merge_resolver::resolve_group(&env.pool, "solo").await;
    assert_eq!(solo.into_iter().collect::<Vec<_>>(), vec!["solo".to_string()]);
}

#[tokio::test]
async fn test_attendance_spans_merge_group() {
    let env = TestEnv::new().await;
    seed_courses(&env).await;
    seed_batch(&env.pool, "a", "paid", "c1", "Started", None).await;
    seed_batch(&env.pool, "b", "paid", "c1", "Started", None).await;
    seed_merge_group(&env.pool, "g1", &["a", "b"]).await;
    seed_enrollment(&env.pool, "e1", "s1", "a", true, false, None).await;

    for (id, batch_id, date) in [
        ("sess1", "a", "2026-01-05"),
        ("sess2", "b", "2026-01-06"),
        ("sess3", "a", "2026-01-07"),
    ] {
        sqlx::query("INSERT INTO attendance_sessions (id, batch_id, session_date) VALUES (?, ?, ?)")
            .bind(id)
            .bind(batch_id)
            .bind(date)
            .execute(&env.pool)
            .await
            .unwrap();
    }
    for (id, session, status) in [("r1", "sess1", "present"), ("r2", "sess2", "late")] {
        sqlx::query("INSERT INTO attendance_records (id, session_id, student_id, status) VALUES (?, ?, 's1', ?)")
            .bind(id)
            .bind(session)
            .bind(status)
            .execute(&env.pool)
            .await
            .unwrap();
    }

    let summaries = attendance::student_attendance(&env.pool, "s1").await.unwrap();
    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert_eq!(summary.total_sessions, 3);
    assert_eq!(summary.present_count, 1);
    assert_eq!(summary.late_count, 1);
    assert_eq!(summary.attendance_percentage, 33);
    assert_eq!(summary.sessions[0].session_id, "sess3");
    assert_eq!(summary.sessions[0].status, attendance::NOT_MARKED);

    // Not approved in "b" directly
    assert!(attendance::student_batch_attendance(&env.pool, "s1", "b")
        .await
        .unwrap()
        .is_none());
}
