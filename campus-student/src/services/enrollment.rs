//! Enrollment lifecycle
//!
//! Creates enrollments through the seat allocator and expires lapsed ones.
//! Free courses are auto-approved and permanent; everything else starts
//! pending admin approval and may expire once its `end_date` has passed.

use campus_common::db::models::Enrollment;
use campus_common::{ids, time};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::lock_wait::LockWait;
use crate::db::{batches, enrollments};
use crate::services::seat_allocation::{self, ReserveOutcome};

/// Configuration the lifecycle manager runs with
#[derive(Debug, Clone)]
pub struct EnrollmentPolicy {
    /// Course names enrolled as approved and permanent
    pub free_courses: HashSet<String>,
    pub default_max_students: i64,
    pub lock_wait: LockWait,
}

impl EnrollmentPolicy {
    pub fn is_free_course(&self, course_name: Option<&str>) -> bool {
        course_name.is_some_and(|name| self.free_courses.contains(name))
    }
}

#[derive(Debug, Error)]
pub enum EnrollmentError {
    #[error("You are already enrolled in this batch")]
    AlreadyEnrolled,

    #[error("Batch is full")]
    BatchFull,

    #[error("Batch not found")]
    BatchNotFound,

    #[error(transparent)]
    Storage(#[from] campus_common::Error),
}

/// Successful enrollment
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentResult {
    pub enrollment_id: String,
    pub batch_id: String,
    pub batch_name: String,
    pub is_free_course: bool,
    pub status: bool,
    pub is_permanent: bool,
    pub seats_remaining: i64,
}

/// Enroll a student in a batch
///
/// The duplicate check is the `UNIQUE(student_id, batch_id)` constraint hit
/// by the reserving insert, so a concurrent twin request sees
/// `AlreadyEnrolled` rather than a second row.
pub async fn enroll(
    pool: &SqlitePool,
    policy: &EnrollmentPolicy,
    student_id: &str,
    batch_id: &str,
) -> Result<EnrollmentResult, EnrollmentError> {
    // Existing row first: a repeat request reports AlreadyEnrolled even when
    // the batch has since filled up
    if enrollments::find(pool, student_id, batch_id).await?.is_some() {
        return Err(EnrollmentError::AlreadyEnrolled);
    }

    let Some(batch) = batches::get_batch(pool, batch_id).await? else {
        return Err(EnrollmentError::BatchNotFound);
    };
    let course_name = batches::course_name_of(pool, batch_id).await?.flatten();
    let is_free_course = policy.is_free_course(course_name.as_deref());

    let new = enrollments::NewEnrollment {
        enrollment_id: ids::generate(),
        student_id: student_id.to_string(),
        batch_id: batch_id.to_string(),
        status: is_free_course,
        is_permanent: is_free_course,
    };

    match seat_allocation::try_reserve_seat(
        pool,
        &new,
        policy.default_max_students,
        policy.lock_wait,
    )
    .await?
    {
        ReserveOutcome::Reserved => {}
        ReserveOutcome::Full => return Err(EnrollmentError::BatchFull),
        ReserveOutcome::NotFound => return Err(EnrollmentError::BatchNotFound),
        ReserveOutcome::AlreadyEnrolled => return Err(EnrollmentError::AlreadyEnrolled),
    }

    let seats_remaining = match seat_allocation::get_occupancy(
        pool,
        batch_id,
        policy.default_max_students,
    )
    .await
    {
        Ok(Some(seats)) => seats.available.max(0),
        Ok(None) => 0,
        Err(e) => {
            // The row is written; a failed follow-up count must not undo it
            warn!(batch_id, error = %e, "Occupancy re-read failed after enrollment");
            0
        }
    };

    info!(
        student_id,
        batch_id,
        is_free_course,
        seats_remaining,
        "Student enrolled"
    );

    Ok(EnrollmentResult {
        enrollment_id: new.enrollment_id,
        batch_id: batch.batch_id,
        batch_name: batch.batch_name,
        is_free_course,
        status: new.status,
        is_permanent: new.is_permanent,
        seats_remaining,
    })
}

/// Expire the student's lapsed, non-permanent enrollments
///
/// Runs on every "my enrollments" read. Returns the rows that changed.
pub async fn expire_stale(
    pool: &SqlitePool,
    student_id: &str,
) -> campus_common::Result<Vec<Enrollment>> {
    let today = time::format_date(time::today());
    let expired = enrollments::expire_for_student(pool, student_id, &today).await?;
    if !expired.is_empty() {
        info!(student_id, count = expired.len(), "Expired lapsed enrollments");
    }
    Ok(expired)
}

/// Expire lapsed, non-permanent enrollments of every student
pub async fn expire_all_stale(pool: &SqlitePool) -> campus_common::Result<u64> {
    let today = time::format_date(time::today());
    let count = enrollments::expire_all(pool, &today).await?;
    info!(count, "Expiry sweep finished");
    Ok(count)
}
