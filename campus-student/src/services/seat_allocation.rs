//! Seat allocation
//!
//! Occupancy counts every enrollment row of a batch whatever its status: a
//! pending enrollment holds its seat until an administrator removes it.
//! The same count backs [`get_occupancy`], [`try_reserve_seat`] and the
//! center listing.

use campus_common::db::models::effective_capacity;
use campus_common::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::db::batches::{self, BatchWithNames};
use crate::db::enrollments::{self, NewEnrollment};
use crate::db::lock_wait::LockWait;

/// Derived occupancy of one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeatSnapshot {
    pub capacity: i64,
    pub enrolled_count: i64,
    pub available: i64,
    pub is_full: bool,
}

impl SeatSnapshot {
    pub fn new(capacity: i64, enrolled_count: i64) -> Self {
        Self {
            capacity,
            enrolled_count,
            available: capacity - enrolled_count,
            is_full: enrolled_count >= capacity,
        }
    }
}

/// Result of an atomic seat reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// Seat taken and enrollment row written
    Reserved,
    Full,
    NotFound,
    /// The (student, batch) pair already holds a row
    AlreadyEnrolled,
}

/// Current occupancy, or `None` for an unknown batch
pub async fn get_occupancy(
    pool: &SqlitePool,
    batch_id: &str,
    default_max_students: i64,
) -> Result<Option<SeatSnapshot>> {
    let Some(batch) = batches::get_batch(pool, batch_id).await? else {
        return Ok(None);
    };
    let enrolled = batches::enrollment_count(pool, batch_id).await?;
    Ok(Some(SeatSnapshot::new(
        batch.capacity(default_max_students),
        enrolled,
    )))
}

/// Reserve a seat by inserting the enrollment row, all in one statement
///
/// The capacity comparison runs inside the insert, so N concurrent callers
/// against a batch with K free seats see exactly K `Reserved`.
pub async fn try_reserve_seat(
    pool: &SqlitePool,
    new: &NewEnrollment,
    default_max_students: i64,
    lock_wait: LockWait,
) -> Result<ReserveOutcome> {
    let inserted = lock_wait
        .write("seat reservation", || {
            enrollments::insert_within_capacity(pool, new, default_max_students)
        })
        .await;

    match inserted {
        Ok(0) => {
            // Nothing written: tell a missing batch from a full one
            if batches::get_batch(pool, &new.batch_id).await?.is_none() {
                Ok(ReserveOutcome::NotFound)
            } else {
                debug!(batch_id = %new.batch_id, "Seat reservation refused: batch full");
                Ok(ReserveOutcome::Full)
            }
        }
        Ok(_) => {
            info!(
                batch_id = %new.batch_id,
                student_id = %new.student_id,
                "Seat reserved"
            );
            Ok(ReserveOutcome::Reserved)
        }
        Err(e) if e.is_unique_violation() => Ok(ReserveOutcome::AlreadyEnrolled),
        Err(e) => Err(e),
    }
}

/// A batch in the center listing with its live occupancy
///
/// `max_students` in the flattened batch carries the effective capacity.
#[derive(Debug, Clone, Serialize)]
pub struct BatchAvailability {
    #[serde(flatten)]
    pub batch: BatchWithNames,
    pub enrolled_students: i64,
    pub available_seats: i64,
    pub is_full: bool,
    pub is_student_enrolled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CenterListing {
    pub batches: Vec<BatchAvailability>,
    pub total_batches: usize,
    pub available_batches: usize,
    pub enrolled_batches: usize,
    pub full_batches: usize,
}

/// Batches a student may see for a center
///
/// Approved batches of the center are unioned with every batch the student
/// is enrolled in (approved wins on a shared id). A batch is listed when it
/// has a free seat or the student is enrolled in it.
pub async fn list_center_batches(
    pool: &SqlitePool,
    center_id: &str,
    student_id: Option<&str>,
    default_max_students: i64,
) -> Result<CenterListing> {
    let open = batches::list_open_for_center(pool, center_id).await?;
    let enrolled = match student_id {
        Some(student_id) => batches::list_for_student(pool, student_id).await?,
        None => Vec::new(),
    };

    let enrolled_ids: HashSet<String> = enrolled.iter().map(|b| b.batch.batch_id.clone()).collect();
    let combined = union_by_id(open, enrolled);

    let ids: Vec<String> = combined.iter().map(|b| b.batch.batch_id.clone()).collect();
    let counts = batches::enrollment_counts(pool, &ids).await?;

    Ok(build_listing(combined, &counts, &enrolled_ids, default_max_students))
}

/// Union keyed by batch id; entries from `primary` win and keep their order
fn union_by_id(primary: Vec<BatchWithNames>, secondary: Vec<BatchWithNames>) -> Vec<BatchWithNames> {
    let mut seen: HashSet<String> = primary.iter().map(|b| b.batch.batch_id.clone()).collect();
    let mut combined = primary;
    for batch in secondary {
        if seen.insert(batch.batch.batch_id.clone()) {
            combined.push(batch);
        }
    }
    combined
}

fn build_listing(
    combined: Vec<BatchWithNames>,
    counts: &HashMap<String, i64>,
    enrolled_ids: &HashSet<String>,
    default_max_students: i64,
) -> CenterListing {
    let total_batches = combined.len();

    let batches: Vec<BatchAvailability> = combined
        .into_iter()
        .map(|mut entry| {
            let capacity = effective_capacity(entry.batch.max_students, default_max_students);
            let enrolled = counts.get(&entry.batch.batch_id).copied().unwrap_or(0);
            let seats = SeatSnapshot::new(capacity, enrolled);
            let is_student_enrolled = enrolled_ids.contains(&entry.batch.batch_id);
            entry.batch.max_students = Some(capacity);
            BatchAvailability {
                batch: entry,
                enrolled_students: seats.enrolled_count,
                available_seats: seats.available,
                is_full: seats.is_full,
                is_student_enrolled,
            }
        })
        .filter(|b| !b.is_full || b.is_student_enrolled)
        .collect();

    CenterListing {
        total_batches,
        available_batches: batches.iter().filter(|b| !b.is_full).count(),
        enrolled_batches: batches.iter().filter(|b| b.is_student_enrolled).count(),
        full_batches: total_batches - batches.len(),
        batches,
    }
}
