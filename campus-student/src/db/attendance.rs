//! Attendance sessions and per-student marks

use campus_common::db::models::{AttendanceRecord, AttendanceSession};
use campus_common::Result;
use sqlx::SqlitePool;

use super::placeholders;

/// Sessions held by any of the given batches, newest first
pub async fn sessions_for_batches(
    pool: &SqlitePool,
    batch_ids: &[String],
) -> Result<Vec<AttendanceSession>> {
    if batch_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT id, batch_id, session_date, notes FROM attendance_sessions WHERE batch_id IN ({}) ORDER BY session_date DESC, id ASC",
        placeholders(batch_ids.len())
    );
    let mut query = sqlx::query_as::<_, AttendanceSession>(&sql);
    for id in batch_ids {
        query = query.bind(id);
    }
    Ok(query.fetch_all(pool).await?)
}

/// The student's marks for the given sessions
pub async fn records_for_student(
    pool: &SqlitePool,
    student_id: &str,
    session_ids: &[String],
) -> Result<Vec<AttendanceRecord>> {
    if session_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT session_id, student_id, status, marked_at FROM attendance_records WHERE student_id = ? AND session_id IN ({})",
        placeholders(session_ids.len())
    );
    let mut query = sqlx::query_as::<_, AttendanceRecord>(&sql).bind(student_id);
    for id in session_ids {
        query = query.bind(id);
    }
    Ok(query.fetch_all(pool).await?)
}
