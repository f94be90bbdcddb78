//! Student notifications

use campus_common::db::models::Notification;
use campus_common::Result;
use sqlx::SqlitePool;

pub async fn insert(
    pool: &SqlitePool,
    id: &str,
    student_id: &str,
    message: &str,
    kind: &str,
    related_id: Option<&str>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO notifications (id, student_id, message, kind, related_id) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(student_id)
    .bind(message)
    .bind(kind)
    .bind(related_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Newest first; unread only unless `include_read`
pub async fn list(
    pool: &SqlitePool,
    student_id: &str,
    include_read: bool,
) -> Result<Vec<Notification>> {
    let sql = if include_read {
        "SELECT * FROM notifications WHERE student_id = ? ORDER BY created_at DESC, id DESC"
    } else {
        "SELECT * FROM notifications WHERE student_id = ? AND is_read = 0 ORDER BY created_at DESC, id DESC"
    };
    let rows = sqlx::query_as::<_, Notification>(sql)
        .bind(student_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Mark one of the student's notifications read; false when none matched
pub async fn mark_read(pool: &SqlitePool, student_id: &str, id: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND student_id = ?")
        .bind(id)
        .bind(student_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}
