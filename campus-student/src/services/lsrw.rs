//! Listening, speaking, reading and writing modules
//!
//! Listening and reading items are quizzes scored on submission. Speaking
//! and writing items take an uploaded artifact for a tutor to grade. Either
//! way one submission per student, item and batch is accepted, and the
//! score stays hidden until a reviewer verifies it.

use campus_common::db::models::{LsrwContent, Question};
use campus_common::ids;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::db::lsrw::{self, NewAnswer, NewTaskSubmission};
use crate::db::batches;
use crate::error::{ApiError, ApiResult};
use crate::services::scoring;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Listening,
    Speaking,
    Reading,
    Writing,
}

impl ModuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Listening => "listening",
            ModuleType::Speaking => "speaking",
            ModuleType::Reading => "reading",
            ModuleType::Writing => "writing",
        }
    }

    /// Scored automatically from multiple-choice answers
    pub fn is_quiz(&self) -> bool {
        matches!(self, ModuleType::Listening | ModuleType::Reading)
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "listening" => Ok(ModuleType::Listening),
            "speaking" => Ok(ModuleType::Speaking),
            "reading" => Ok(ModuleType::Reading),
            "writing" => Ok(ModuleType::Writing),
            other => Err(ApiError::Validation(format!("Unknown module_type '{}'", other))),
        }
    }
}

/// One item in a student's module listing
#[derive(Debug, Clone, Serialize)]
pub struct ModuleItem {
    pub lsrw_id: String,
    pub title: String,
    pub instruction: Option<String>,
    pub media_url: Option<String>,
    pub module_type: String,
    pub session_number: Option<i64>,
    pub questions: Vec<Question>,
    pub max_marks: i64,
    pub created_at: String,
    pub attempted: bool,
    pub verified: bool,
    /// Withheld until verified
    pub score: Option<i64>,
    pub submitted_at: Option<String>,
}

struct Attempt {
    verified: bool,
    score: Option<i64>,
    submitted_at: String,
}

/// Student-visible content of a batch for one module
pub async fn list_for_student(
    pool: &SqlitePool,
    student_id: &str,
    batch_id: &str,
    module_type: ModuleType,
) -> ApiResult<Vec<ModuleItem>> {
    let batch = batches::get_batch(pool, batch_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Batch not found".to_string()))?;
    let Some(course_id) = batch.course_id.as_deref() else {
        return Ok(Vec::new());
    };

    let contents = lsrw::visible_content(pool, batch_id, course_id, module_type.as_str()).await?;

    let attempts: HashMap<String, Attempt> = if module_type.is_quiz() {
        lsrw::answers_in_batch(pool, student_id, batch_id)
            .await?
            .into_iter()
            .map(|a| {
                let verified = a.is_verified();
                let attempt = Attempt {
                    verified,
                    score: verified.then_some(a.score),
                    submitted_at: a.submitted_at,
                };
                (a.lsrw_content_id, attempt)
            })
            .collect()
    } else {
        lsrw::tasks_in_batch(pool, student_id, batch_id)
            .await?
            .into_iter()
            .map(|t| {
                let verified = t.is_verified();
                let attempt = Attempt {
                    verified,
                    score: if verified { t.score } else { None },
                    submitted_at: t.submitted_at,
                };
                (t.lsrw_content_id, attempt)
            })
            .collect()
    };

    Ok(contents
        .into_iter()
        .map(|content| {
            let attempt = attempts.get(&content.id);
            module_item(content, attempt)
        })
        .collect())
}

fn module_item(content: LsrwContent, attempt: Option<&Attempt>) -> ModuleItem {
    let questions = match attempt {
        Some(_) => content.questions.0,
        None => scoring::redact_answer_keys(&content.questions.0),
    };
    ModuleItem {
        lsrw_id: content.id,
        title: content.title,
        instruction: content.instruction,
        media_url: content.media_url,
        module_type: content.module_type,
        session_number: content.session_number,
        questions,
        max_marks: content.max_marks.unwrap_or(0),
        created_at: content.created_at,
        attempted: attempt.is_some(),
        verified: attempt.is_some_and(|a| a.verified),
        score: attempt.and_then(|a| a.score),
        submitted_at: attempt.map(|a| a.submitted_at.clone()),
    }
}

/// Quiz submission
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    pub batch_id: Option<String>,
    pub lsrw_id: Option<String>,
    pub answers: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitResult {
    pub submission_id: String,
    pub lsrw_id: String,
    pub total_questions: i64,
    pub max_marks: i64,
    pub message: String,
}

async fn visible_item(pool: &SqlitePool, lsrw_id: &str, batch_id: &str) -> ApiResult<LsrwContent> {
    lsrw::visible_item(pool, lsrw_id, batch_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("LSRW content not found".to_string()))
}

/// Score and store a quiz attempt, once
///
/// The marks are stored but not returned: they are released on review.
pub async fn submit_quiz(
    pool: &SqlitePool,
    student_id: &str,
    request: SubmitRequest,
) -> ApiResult<SubmitResult> {
    let (Some(batch_id), Some(lsrw_id), Some(answers)) =
        (request.batch_id, request.lsrw_id, request.answers)
    else {
        return Err(ApiError::Validation(
            "Missing required fields: batch_id, lsrw_id and answers are required".to_string(),
        ));
    };

    let content = visible_item(pool, &lsrw_id, &batch_id).await?;
    let module_type: ModuleType = content.module_type.parse()?;
    if !module_type.is_quiz() {
        return Err(ApiError::Validation(format!(
            "{} content takes a task submission, not answers",
            module_type
        )));
    }

    let score = scoring::score_quiz(&content.questions.0, &answers, content.max_marks)
        .ok_or_else(|| ApiError::Validation("This item has no questions to answer".to_string()))?;

    let answer = NewAnswer {
        id: ids::generate(),
        student_id: student_id.to_string(),
        lsrw_content_id: lsrw_id.clone(),
        batch_id,
        answers,
        score: score.marks,
        max_marks: score.max_marks,
    };

    match lsrw::insert_answer(pool, &answer).await {
        Ok(()) => {}
        Err(e) if e.is_unique_violation() => {
            return Err(ApiError::Conflict("You have already completed this quiz.".to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    info!(
        student_id,
        lsrw_id = %lsrw_id,
        correct = score.correct,
        total = score.total_questions,
        "Quiz submitted"
    );

    Ok(SubmitResult {
        submission_id: answer.id,
        lsrw_id,
        total_questions: score.total_questions,
        max_marks: score.max_marks,
        message: "Quiz submitted. Your score will be visible once it is verified.".to_string(),
    })
}

/// A submitted quiz with the answer key
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub lsrw_id: String,
    pub title: String,
    pub instruction: Option<String>,
    pub media_url: Option<String>,
    pub session_number: Option<i64>,
    pub questions: Vec<Question>,
    pub max_marks: i64,
    pub student_answers: BTreeMap<String, String>,
    pub verified: bool,
    pub score: Option<i64>,
    pub submitted_at: String,
}

pub async fn review(
    pool: &SqlitePool,
    student_id: &str,
    lsrw_id: &str,
    batch_id: &str,
) -> ApiResult<Review> {
    let submission = lsrw::find_answer(pool, student_id, lsrw_id, batch_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Quiz submission not found".to_string()))?;
    let content = visible_item(pool, lsrw_id, batch_id).await?;

    let verified = submission.is_verified();
    Ok(Review {
        lsrw_id: content.id,
        title: content.title,
        instruction: content.instruction,
        media_url: content.media_url,
        session_number: content.session_number,
        questions: content.questions.0,
        max_marks: submission.max_marks,
        student_answers: submission.answers.0,
        verified,
        score: verified.then_some(submission.score),
        submitted_at: submission.submitted_at,
    })
}

/// Speaking or writing submission; the artifact is already uploaded
#[derive(Debug, Clone, Deserialize)]
pub struct TaskRequest {
    pub batch_id: Option<String>,
    pub lsrw_id: Option<String>,
    pub artifact_url: Option<String>,
    pub text: Option<String>,
}

pub async fn submit_task(
    pool: &SqlitePool,
    student_id: &str,
    request: TaskRequest,
) -> ApiResult<String> {
    let artifact_url = request
        .artifact_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());
    let (Some(batch_id), Some(lsrw_id), Some(artifact_url)) =
        (request.batch_id, request.lsrw_id, artifact_url)
    else {
        return Err(ApiError::Validation(
            "Missing required fields: batch_id, lsrw_id and artifact_url are required".to_string(),
        ));
    };

    let content = visible_item(pool, &lsrw_id, &batch_id).await?;
    let module_type: ModuleType = content.module_type.parse()?;
    if module_type.is_quiz() {
        return Err(ApiError::Validation(format!(
            "{} content takes answers, not a task submission",
            module_type
        )));
    }

    let task = NewTaskSubmission {
        id: ids::generate(),
        student_id: student_id.to_string(),
        lsrw_content_id: lsrw_id,
        batch_id,
        artifact_url,
        response_text: request.text,
    };

    match lsrw::insert_task_submission(pool, &task).await {
        Ok(()) => {
            info!(student_id, lsrw_id = %task.lsrw_content_id, %module_type, "Task submitted");
            Ok(task.id)
        }
        Err(e) if e.is_unique_violation() => Err(ApiError::Conflict(
            "You have already submitted this task.".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_type_parsing() {
        assert_eq!("Listening".parse::<ModuleType>().unwrap(), ModuleType::Listening);
        assert!(!"writing".parse::<ModuleType>().unwrap().is_quiz());
        assert!("drawing".parse::<ModuleType>().is_err());
    }
}
