//! Learning-skill content, quiz answers and task submissions

use campus_common::db::models::{LsrwAnswer, LsrwContent, TaskSubmission};
use campus_common::Result;
use sqlx::types::Json;
use sqlx::SqlitePool;
use std::collections::BTreeMap;

/// Student-visible content mapped to a batch
///
/// Listening content follows session order; everything else is newest first.
pub async fn visible_content(
    pool: &SqlitePool,
    batch_id: &str,
    course_id: &str,
    module_type: &str,
) -> Result<Vec<LsrwContent>> {
    let order = if module_type == "listening" {
        "c.session_number IS NULL, c.session_number ASC, c.created_at ASC"
    } else {
        "c.created_at DESC"
    };
    let sql = format!(
        r#"
        SELECT c.* FROM lsrw_content c
        JOIN lsrw_batch_mapping m ON m.lsrw_content_id = c.id
        WHERE m.batch_id = ?
          AND m.student_visible = 1
          AND c.course_id = ?
          AND c.module_type = ?
        ORDER BY {}
        "#,
        order
    );
    let rows = sqlx::query_as::<_, LsrwContent>(&sql)
        .bind(batch_id)
        .bind(course_id)
        .bind(module_type)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Content item, provided it is visible to students of the batch
pub async fn visible_item(
    pool: &SqlitePool,
    content_id: &str,
    batch_id: &str,
) -> Result<Option<LsrwContent>> {
    let row = sqlx::query_as::<_, LsrwContent>(
        r#"
        SELECT c.* FROM lsrw_content c
        JOIN lsrw_batch_mapping m ON m.lsrw_content_id = c.id
        WHERE c.id = ? AND m.batch_id = ? AND m.student_visible = 1
        "#,
    )
    .bind(content_id)
    .bind(batch_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Values for a scored quiz submission
#[derive(Debug, Clone)]
pub struct NewAnswer {
    pub id: String,
    pub student_id: String,
    pub lsrw_content_id: String,
    pub batch_id: String,
    pub answers: BTreeMap<String, String>,
    pub score: i64,
    pub max_marks: i64,
}

/// Insert-only; a second submission fails with a unique violation
pub async fn insert_answer(pool: &SqlitePool, answer: &NewAnswer) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO lsrw_student_answers
            (id, student_id, lsrw_content_id, batch_id, answers, score, max_marks)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&answer.id)
    .bind(&answer.student_id)
    .bind(&answer.lsrw_content_id)
    .bind(&answer.batch_id)
    .bind(Json(&answer.answers))
    .bind(answer.score)
    .bind(answer.max_marks)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_answer(
    pool: &SqlitePool,
    student_id: &str,
    content_id: &str,
    batch_id: &str,
) -> Result<Option<LsrwAnswer>> {
    let row = sqlx::query_as::<_, LsrwAnswer>(
        r#"
        SELECT * FROM lsrw_student_answers
        WHERE student_id = ? AND lsrw_content_id = ? AND batch_id = ?
        "#,
    )
    .bind(student_id)
    .bind(content_id)
    .bind(batch_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// All of a student's quiz submissions in a batch
pub async fn answers_in_batch(
    pool: &SqlitePool,
    student_id: &str,
    batch_id: &str,
) -> Result<Vec<LsrwAnswer>> {
    let rows = sqlx::query_as::<_, LsrwAnswer>(
        "SELECT * FROM lsrw_student_answers WHERE student_id = ? AND batch_id = ?",
    )
    .bind(student_id)
    .bind(batch_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Values for a speaking/writing artifact submission
#[derive(Debug, Clone)]
pub struct NewTaskSubmission {
    pub id: String,
    pub student_id: String,
    pub lsrw_content_id: String,
    pub batch_id: String,
    pub artifact_url: String,
    pub response_text: Option<String>,
}

/// Insert-only; a second submission fails with a unique violation
pub async fn insert_task_submission(pool: &SqlitePool, task: &NewTaskSubmission) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO task_submissions
            (id, student_id, lsrw_content_id, batch_id, artifact_url, response_text)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&task.id)
    .bind(&task.student_id)
    .bind(&task.lsrw_content_id)
    .bind(&task.batch_id)
    .bind(&task.artifact_url)
    .bind(&task.response_text)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn tasks_in_batch(
    pool: &SqlitePool,
    student_id: &str,
    batch_id: &str,
) -> Result<Vec<TaskSubmission>> {
    let rows = sqlx::query_as::<_, TaskSubmission>(
        "SELECT * FROM task_submissions WHERE student_id = ? AND batch_id = ?",
    )
    .bind(student_id)
    .bind(batch_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
