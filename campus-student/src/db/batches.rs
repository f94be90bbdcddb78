//! Batch, course and occupancy reads

use campus_common::db::models::Batch;
use campus_common::Result;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use std::collections::HashMap;

use super::placeholders;

/// Batch status that admits new enrollments
pub const OPEN_STATUS: &str = "Approved";

pub async fn get_batch(pool: &SqlitePool, batch_id: &str) -> Result<Option<Batch>> {
    let batch = sqlx::query_as::<_, Batch>("SELECT * FROM batches WHERE batch_id = ?")
        .bind(batch_id)
        .fetch_optional(pool)
        .await?;
    Ok(batch)
}

/// Batch with the display names of its course and center
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BatchWithNames {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub batch: Batch,
    pub course_name: Option<String>,
    pub center_name: Option<String>,
}

const BATCH_WITH_NAMES: &str = r#"
    SELECT b.*, c.course_name, ce.center_name
    FROM batches b
    LEFT JOIN courses c ON c.course_id = b.course_id
    LEFT JOIN centers ce ON ce.center_id = b.center_id
"#;

/// Approved batches of a center
pub async fn list_open_for_center(
    pool: &SqlitePool,
    center_id: &str,
) -> Result<Vec<BatchWithNames>> {
    let sql = format!(
        "{} WHERE b.center_id = ? AND b.status = ? ORDER BY b.created_at DESC",
        BATCH_WITH_NAMES
    );
    let batches = sqlx::query_as::<_, BatchWithNames>(&sql)
        .bind(center_id)
        .bind(OPEN_STATUS)
        .fetch_all(pool)
        .await?;
    Ok(batches)
}

/// Every batch the student holds an enrollment in, any batch status
pub async fn list_for_student(pool: &SqlitePool, student_id: &str) -> Result<Vec<BatchWithNames>> {
    let sql = format!(
        "{} WHERE b.batch_id IN (SELECT batch_id FROM enrollments WHERE student_id = ?) ORDER BY b.created_at DESC",
        BATCH_WITH_NAMES
    );
    let batches = sqlx::query_as::<_, BatchWithNames>(&sql)
        .bind(student_id)
        .fetch_all(pool)
        .await?;
    Ok(batches)
}

/// Course name of a batch, when the batch exists
pub async fn course_name_of(pool: &SqlitePool, batch_id: &str) -> Result<Option<Option<String>>> {
    let name: Option<Option<String>> = sqlx::query_scalar(
        r#"
        SELECT c.course_name FROM batches b
        LEFT JOIN courses c ON c.course_id = b.course_id
        WHERE b.batch_id = ?
        "#,
    )
    .bind(batch_id)
    .fetch_optional(pool)
    .await?;
    Ok(name)
}

/// Enrollment rows per batch, every status counted
pub async fn enrollment_count(pool: &SqlitePool, batch_id: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE batch_id = ?")
        .bind(batch_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Enrollment rows for several batches in one aggregate query
///
/// Batches without enrollments are absent from the map.
pub async fn enrollment_counts(
    pool: &SqlitePool,
    batch_ids: &[String],
) -> Result<HashMap<String, i64>> {
    if batch_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let sql = format!(
        "SELECT batch_id, COUNT(*) FROM enrollments WHERE batch_id IN ({}) GROUP BY batch_id",
        placeholders(batch_ids.len())
    );
    let mut query = sqlx::query_as::<_, (String, i64)>(&sql);
    for id in batch_ids {
        query = query.bind(id);
    }

    Ok(query.fetch_all(pool).await?.into_iter().collect())
}
