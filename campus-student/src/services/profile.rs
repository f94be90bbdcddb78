//! Student profile
//!
//! Students read their own record with its state and center resolved, and
//! may change contact details and their home state and center. A center
//! always has to lie in the student's state.

use campus_common::db::models::{Center, State, Student};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::db::centers;
use crate::db::students::{self, ProfileChanges};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Serialize)]
pub struct StudentDetails {
    #[serde(flatten)]
    pub student: Student,
    pub state: Option<State>,
    pub center: Option<Center>,
}

pub async fn details(pool: &SqlitePool, student_id: &str) -> ApiResult<StudentDetails> {
    let student = students::get_student(pool, student_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;
    resolve(pool, student).await
}

async fn resolve(pool: &SqlitePool, student: Student) -> ApiResult<StudentDetails> {
    let state = match student.state_id.as_deref() {
        Some(id) => centers::get_state(pool, id).await?,
        None => None,
    };
    let center = match student.center_id.as_deref() {
        Some(id) => centers::get_center(pool, id).await?,
        None => None,
    };
    Ok(StudentDetails {
        student,
        state,
        center,
    })
}

/// Requested profile changes; absent or blank fields are left as they are
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub state: Option<String>,
    pub center: Option<String>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ProfileUpdate {
    /// Normalize the request; `None` when it changes nothing
    fn into_changes(self) -> ApiResult<Option<ProfileChanges>> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ApiError::Validation("name cannot be empty".to_string()));
        }
        let changes = ProfileChanges {
            name: trimmed(self.name),
            email: trimmed(self.email),
            phone: trimmed(self.phone),
            state_id: trimmed(self.state),
            center_id: trimmed(self.center),
        };
        if let Some(email) = changes.email.as_deref() {
            if !looks_like_email(email) {
                return Err(ApiError::Validation(format!("Invalid email '{}'", email)));
            }
        }
        let empty = changes.name.is_none()
            && changes.email.is_none()
            && changes.phone.is_none()
            && changes.state_id.is_none()
            && changes.center_id.is_none();
        Ok((!empty).then_some(changes))
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.contains('@'),
        None => false,
    }
}

pub async fn update_profile(
    pool: &SqlitePool,
    student_id: &str,
    update: ProfileUpdate,
) -> ApiResult<StudentDetails> {
    let changes = update
        .into_changes()?
        .ok_or_else(|| ApiError::Validation("No profile fields to update".to_string()))?;

    let current = students::get_student(pool, student_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    if let Some(state_id) = changes.state_id.as_deref() {
        if centers::get_state(pool, state_id).await?.is_none() {
            return Err(ApiError::Validation(format!("Unknown state '{}'", state_id)));
        }
    }

    let state_id = changes.state_id.as_deref().or(current.state_id.as_deref());
    let center_id = changes.center_id.as_deref().or(current.center_id.as_deref());
    if let Some(center_id) = center_id {
        let center = centers::get_center(pool, center_id)
            .await?
            .ok_or_else(|| ApiError::Validation(format!("Unknown center '{}'", center_id)))?;
        if let (Some(center_state), Some(state_id)) = (center.state.as_deref(), state_id) {
            if center_state != state_id {
                return Err(ApiError::Validation(
                    "Center does not belong to the selected state".to_string(),
                ));
            }
        }
    }

    let student = students::update_profile(pool, student_id, &changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;
    info!(student_id, "Profile updated");
    resolve(pool, student).await
}
