//! Tutor-entered assessment marks

use campus_common::db::models::AssessmentMarks;
use campus_common::Result;
use sqlx::SqlitePool;

/// Marks for (student, batch) once the tutor has submitted them; drafts stay hidden
pub async fn submitted_marks(
    pool: &SqlitePool,
    student_id: &str,
    batch_id: &str,
) -> Result<Option<AssessmentMarks>> {
    let marks = sqlx::query_as::<_, AssessmentMarks>(
        "SELECT * FROM assessment_marks WHERE student_id = ? AND batch_id = ? AND status = 'submitted'",
    )
    .bind(student_id)
    .bind(batch_id)
    .fetch_optional(pool)
    .await?;
    Ok(marks)
}
