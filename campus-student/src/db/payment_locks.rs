//! Payment-mode lock rows
//!
//! `UNIQUE(register_number, scope_key)` makes a lock create-once.

use campus_common::db::models::PaymentLock;
use campus_common::Result;
use sqlx::SqlitePool;

/// Insert the lock unless one exists for the key; true when inserted
pub async fn insert_if_absent(
    pool: &SqlitePool,
    lock_id: &str,
    register_number: &str,
    scope_key: &str,
    payment_type: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO student_payment_locks (lock_id, register_number, scope_key, payment_type)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(register_number, scope_key) DO NOTHING
        "#,
    )
    .bind(lock_id)
    .bind(register_number)
    .bind(scope_key)
    .bind(payment_type)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn find(
    pool: &SqlitePool,
    register_number: &str,
    scope_key: &str,
) -> Result<Option<PaymentLock>> {
    let lock = sqlx::query_as::<_, PaymentLock>(
        "SELECT * FROM student_payment_locks WHERE register_number = ? AND scope_key = ?",
    )
    .bind(register_number)
    .bind(scope_key)
    .fetch_optional(pool)
    .await?;
    Ok(lock)
}
