//! Enrollment rows
//!
//! [`insert_within_capacity`] is the only write path that creates an
//! enrollment. Capacity check and insert are one statement, so SQLite's
//! single-writer lock makes them indivisible; the `UNIQUE(student_id,
//! batch_id)` constraint rejects duplicates.

use campus_common::db::models::Enrollment;
use campus_common::Result;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

/// Values for a new enrollment row
#[derive(Debug, Clone)]
pub struct NewEnrollment {
    pub enrollment_id: String,
    pub student_id: String,
    pub batch_id: String,
    pub status: bool,
    pub is_permanent: bool,
}

/// Insert the enrollment only while the batch has a free seat
///
/// Returns the number of rows inserted: 0 when the batch is missing or
/// full. A duplicate (student, batch) pair surfaces as a unique violation.
pub async fn insert_within_capacity(
    pool: &SqlitePool,
    new: &NewEnrollment,
    default_max_students: i64,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO enrollments (enrollment_id, student_id, batch_id, status, is_permanent)
        SELECT ?, ?, b.batch_id, ?, ?
        FROM batches b
        WHERE b.batch_id = ?
          AND (SELECT COUNT(*) FROM enrollments WHERE batch_id = ?)
              < CASE WHEN b.max_students IS NULL OR b.max_students <= 0
                     THEN ? ELSE b.max_students END
        "#,
    )
    .bind(&new.enrollment_id)
    .bind(&new.student_id)
    .bind(new.status)
    .bind(new.is_permanent)
    .bind(&new.batch_id)
    .bind(&new.batch_id)
    .bind(default_max_students)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn get(pool: &SqlitePool, enrollment_id: &str) -> Result<Option<Enrollment>> {
    let row = sqlx::query_as::<_, Enrollment>("SELECT * FROM enrollments WHERE enrollment_id = ?")
        .bind(enrollment_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find(pool: &SqlitePool, student_id: &str, batch_id: &str) -> Result<Option<Enrollment>> {
    let row = sqlx::query_as::<_, Enrollment>(
        "SELECT * FROM enrollments WHERE student_id = ? AND batch_id = ?",
    )
    .bind(student_id)
    .bind(batch_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Expire a student's lapsed, non-permanent enrollments
///
/// `end_date` is compared as a calendar date against `today`
/// (`YYYY-MM-DD`). Returns the rows that changed.
pub async fn expire_for_student(
    pool: &SqlitePool,
    student_id: &str,
    today: &str,
) -> Result<Vec<Enrollment>> {
    let rows = sqlx::query_as::<_, Enrollment>(
        r#"
        UPDATE enrollments SET status = 0
        WHERE student_id = ?
          AND status = 1
          AND is_permanent = 0
          AND end_date IS NOT NULL
          AND date(end_date) < date(?)
        RETURNING *
        "#,
    )
    .bind(student_id)
    .bind(today)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Same predicate as [`expire_for_student`], across every student
pub async fn expire_all(pool: &SqlitePool, today: &str) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE enrollments SET status = 0
        WHERE status = 1
          AND is_permanent = 0
          AND end_date IS NOT NULL
          AND date(end_date) < date(?)
        "#,
    )
    .bind(today)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Enrollment joined with its batch, course and center
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EnrolledBatch {
    pub enrollment_id: String,
    pub status: bool,
    pub is_permanent: bool,
    pub end_date: Option<String>,
    pub enrolled_at: String,
    pub batch_id: String,
    pub batch_name: String,
    pub batch_status: String,
    pub duration: Option<i64>,
    pub total_sessions: Option<i64>,
    pub teacher_name: Option<String>,
    pub start_date: Option<String>,
    pub time_from: Option<String>,
    pub time_to: Option<String>,
    pub course_id: Option<String>,
    pub course_name: Option<String>,
    pub course_type: Option<String>,
    pub language: Option<String>,
    pub level: Option<String>,
    pub mode: Option<String>,
    pub program: Option<String>,
    pub center_id: Option<String>,
    pub center_name: Option<String>,
}

/// The student's enrollments in running or finished batches
pub async fn list_detailed(pool: &SqlitePool, student_id: &str) -> Result<Vec<EnrolledBatch>> {
    let rows = sqlx::query_as::<_, EnrolledBatch>(
        r#"
        SELECT
            e.enrollment_id, e.status, e.is_permanent, e.end_date,
            e.created_at AS enrolled_at,
            b.batch_id, b.batch_name, b.status AS batch_status, b.duration,
            b.total_sessions, b.teacher_name, b.start_date, b.time_from, b.time_to,
            c.course_id, c.course_name, c.type AS course_type, c.language, c.level,
            c.mode, c.program,
            ce.center_id, ce.center_name
        FROM enrollments e
        JOIN batches b ON b.batch_id = e.batch_id
        LEFT JOIN courses c ON c.course_id = b.course_id
        LEFT JOIN centers ce ON ce.center_id = b.center_id
        WHERE e.student_id = ?
          AND b.status IN ('Approved', 'Started', 'Completed')
        ORDER BY e.created_at DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Approved enrollments of a student (attendance view)
pub async fn list_approved(pool: &SqlitePool, student_id: &str) -> Result<Vec<Enrollment>> {
    let rows = sqlx::query_as::<_, Enrollment>(
        "SELECT * FROM enrollments WHERE student_id = ? AND status = 1 ORDER BY created_at",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
