//! Student profile reads and self-service updates

use campus_common::db::models::Student;
use campus_common::Result;
use sqlx::SqlitePool;

pub async fn get_student(pool: &SqlitePool, student_id: &str) -> Result<Option<Student>> {
    let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE student_id = ?")
        .bind(student_id)
        .fetch_optional(pool)
        .await?;
    Ok(student)
}

pub async fn find_by_registration(
    pool: &SqlitePool,
    registration_number: &str,
) -> Result<Option<Student>> {
    let student =
        sqlx::query_as::<_, Student>("SELECT * FROM students WHERE registration_number = ?")
            .bind(registration_number)
            .fetch_optional(pool)
            .await?;
    Ok(student)
}

/// Fields a student may change; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub state_id: Option<String>,
    pub center_id: Option<String>,
}

/// Apply the changes and return the updated row, or `None` for an unknown student
pub async fn update_profile(
    pool: &SqlitePool,
    student_id: &str,
    changes: &ProfileChanges,
) -> Result<Option<Student>> {
    let student = sqlx::query_as::<_, Student>(
        r#"
        UPDATE students SET
            name = COALESCE(?, name),
            email = COALESCE(?, email),
            phone = COALESCE(?, phone),
            state_id = COALESCE(?, state_id),
            center_id = COALESCE(?, center_id)
        WHERE student_id = ?
        RETURNING *
        "#,
    )
    .bind(&changes.name)
    .bind(&changes.email)
    .bind(&changes.phone)
    .bind(&changes.state_id)
    .bind(&changes.center_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await?;
    Ok(student)
}
