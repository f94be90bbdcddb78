//! Attendance summaries
//!
//! A batch's sessions are those of its whole merge group. The percentage
//! counts `present` marks only.

use campus_common::db::models::{AttendanceRecord, AttendanceSession, Batch};
use campus_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::db::{attendance, batches, enrollments};
use crate::services::merge_resolver;

/// Status reported for a session the student has no mark for
pub const NOT_MARKED: &str = "not_marked";

#[derive(Debug, Clone, Serialize)]
pub struct SessionAttendance {
    pub session_id: String,
    pub session_date: String,
    pub status: String,
    pub marked_at: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchAttendance {
    pub batch_id: String,
    pub batch_name: String,
    pub batch_status: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub total_sessions: usize,
    pub present_count: usize,
    pub absent_count: usize,
    pub late_count: usize,
    pub excused_count: usize,
    pub attendance_percentage: i64,
    pub sessions: Vec<SessionAttendance>,
}

/// Fold sessions and the student's marks into a batch summary
pub fn summarize(
    batch: &Batch,
    sessions: &[AttendanceSession],
    records: &[AttendanceRecord],
) -> BatchAttendance {
    let by_session: HashMap<&str, &AttendanceRecord> =
        records.iter().map(|r| (r.session_id.as_str(), r)).collect();

    let details: Vec<SessionAttendance> = sessions
        .iter()
        .map(|session| {
            let record = by_session.get(session.id.as_str());
            SessionAttendance {
                session_id: session.id.clone(),
                session_date: session.session_date.clone(),
                status: record
                    .map(|r| r.status.clone())
                    .unwrap_or_else(|| NOT_MARKED.to_string()),
                marked_at: record.map(|r| r.marked_at.clone()),
                notes: session.notes.clone(),
            }
        })
        .collect();

    let count = |status: &str| details.iter().filter(|s| s.status == status).count();
    let total_sessions = details.len();
    let present_count = count("present");

    let attendance_percentage = if total_sessions > 0 {
        (present_count as f64 / total_sessions as f64 * 100.0).round() as i64
    } else {
        0
    };

    BatchAttendance {
        batch_id: batch.batch_id.clone(),
        batch_name: batch.batch_name.clone(),
        batch_status: batch.status.clone(),
        start_date: batch.start_date.clone(),
        end_date: batch.end_date.clone(),
        total_sessions,
        present_count,
        absent_count: count("absent"),
        late_count: count("late"),
        excused_count: count("excused"),
        attendance_percentage,
        sessions: details,
    }
}

/// Attendance for one batch of the student's, across its merge group
pub async fn batch_attendance(
    pool: &SqlitePool,
    student_id: &str,
    batch: &Batch,
) -> Result<BatchAttendance> {
    let group: Vec<String> = merge_resolver::resolve_group(pool, &batch.batch_id)
        .await
        .into_iter()
        .collect();
    let sessions = attendance::sessions_for_batches(pool, &group).await?;
    let session_ids: Vec<String> = sessions.iter().map(|s| s.id.clone()).collect();
    let records = attendance::records_for_student(pool, student_id, &session_ids).await?;
    Ok(summarize(batch, &sessions, &records))
}

/// Attendance for every approved enrollment of the student
pub async fn student_attendance(pool: &SqlitePool, student_id: &str) -> Result<Vec<BatchAttendance>> {
    let mut summaries = Vec::new();
    for enrollment in enrollments::list_approved(pool, student_id).await? {
        if let Some(batch) = batches::get_batch(pool, &enrollment.batch_id).await? {
            summaries.push(batch_attendance(pool, student_id, &batch).await?);
        }
    }
    Ok(summaries)
}

/// Attendance for one batch; `None` without an approved enrollment in it
pub async fn student_batch_attendance(
    pool: &SqlitePool,
    student_id: &str,
    batch_id: &str,
) -> Result<Option<BatchAttendance>> {
    let approved = matches!(
        enrollments::find(pool, student_id, batch_id).await?,
        Some(enrollment) if enrollment.status
    );
    if !approved {
        return Ok(None);
    }
    match batches::get_batch(pool, batch_id).await? {
        Some(batch) => Ok(Some(batch_attendance(pool, student_id, &batch).await?)),
        None => Ok(None),
    }
}
