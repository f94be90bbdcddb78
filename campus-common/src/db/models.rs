//! Database models
//!
//! Row types decoded with `sqlx::FromRow` and serialized as-is in API
//! responses. Date columns (`end_date`, `session_date`, ...) are kept as the
//! stored `YYYY-MM-DD` text; comparisons happen in SQL against a bound date.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Setting {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct State {
    pub state_id: String,
    pub state_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Center {
    pub center_id: String,
    pub center_name: String,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub course_id: String,
    pub course_name: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub course_type: Option<String>,
    pub language: Option<String>,
    pub level: Option<String>,
    pub mode: Option<String>,
    pub program: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub student_id: String,
    pub registration_number: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub center_id: Option<String>,
    pub state_id: Option<String>,
    pub profile_picture: Option<String>,
    pub status: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Batch {
    pub batch_id: String,
    pub batch_name: String,
    pub course_id: Option<String>,
    pub center_id: Option<String>,
    pub teacher_name: Option<String>,
    /// Raw configured capacity; `None` or `0` means "use the default"
    pub max_students: Option<i64>,
    pub status: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub time_from: Option<String>,
    pub time_to: Option<String>,
    pub duration: Option<i64>,
    pub total_sessions: Option<i64>,
    pub created_at: String,
}

impl Batch {
    /// Capacity after applying the default for unset or zero `max_students`
    pub fn capacity(&self, default_max_students: i64) -> i64 {
        effective_capacity(self.max_students, default_max_students)
    }
}

/// Resolve a configured capacity against the fallback
pub fn effective_capacity(max_students: Option<i64>, default_max_students: i64) -> i64 {
    match max_students {
        Some(n) if n > 0 => n,
        _ => default_max_students,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub enrollment_id: String,
    pub student_id: String,
    pub batch_id: String,
    pub status: bool,
    pub is_permanent: bool,
    pub end_date: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentLock {
    pub lock_id: String,
    pub register_number: String,
    pub scope_key: String,
    pub payment_type: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentRecord {
    pub payment_id: String,
    pub order_id: Option<String>,
    pub enrollment_id: Option<String>,
    pub registration_number: Option<String>,
    pub student_name: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub course_name: Option<String>,
    pub course_duration: i64,
    pub original_fees: f64,
    pub discount_percentage: f64,
    pub final_fees: f64,
    pub payment_type: String,
    pub emi_duration: Option<i64>,
    pub current_emi: Option<i64>,
    pub bank_rrn: Option<String>,
    pub status: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub note_id: String,
    pub batch_id: String,
    pub title: String,
    pub link: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Gmeet {
    pub meet_id: String,
    pub batch_id: String,
    pub title: Option<String>,
    pub meet_link: String,
    pub date: String,
    pub time: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceSession {
    pub id: String,
    pub batch_id: String,
    pub session_date: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub session_id: String,
    pub student_id: String,
    pub status: String,
    pub marked_at: String,
}

/// One quiz question as stored in `lsrw_content.questions`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Question {
    #[serde(alias = "questionNumber")]
    pub question_number: Option<String>,
    pub question: String,
    pub options: Vec<String>,
    #[serde(alias = "correctAnswer", skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LsrwContent {
    pub id: String,
    pub course_id: Option<String>,
    pub module_type: String,
    pub title: String,
    pub instruction: Option<String>,
    pub media_url: Option<String>,
    pub session_number: Option<i64>,
    pub questions: Json<Vec<Question>>,
    pub max_marks: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LsrwAnswer {
    pub id: String,
    pub student_id: String,
    pub lsrw_content_id: String,
    pub batch_id: String,
    pub answers: Json<BTreeMap<String, String>>,
    pub score: i64,
    pub max_marks: i64,
    pub submitted_at: String,
    pub verified: bool,
    pub verified_at: Option<String>,
}

impl LsrwAnswer {
    /// A reviewer has released the score
    pub fn is_verified(&self) -> bool {
        self.verified || self.verified_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaskSubmission {
    pub id: String,
    pub student_id: String,
    pub lsrw_content_id: String,
    pub batch_id: String,
    pub artifact_url: String,
    pub response_text: Option<String>,
    pub score: Option<i64>,
    pub feedback: Option<String>,
    pub submitted_at: String,
    pub verified: bool,
    pub verified_at: Option<String>,
}

impl TaskSubmission {
    pub fn is_verified(&self) -> bool {
        self.verified || self.verified_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: String,
    pub student_id: String,
    pub message: String,
    pub kind: Option<String>,
    pub related_id: Option<String>,
    pub is_read: bool,
    pub created_at: String,
}

/// School calendar entry shown to every student
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AcademicEvent {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub event_start_date: String,
    pub event_end_date: Option<String>,
    pub event_start_time: Option<String>,
    pub event_end_time: Option<String>,
    pub status: String,
}

/// Per-skill marks a tutor records for a student in a batch
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AssessmentMarks {
    pub id: String,
    pub student_id: String,
    pub batch_id: String,
    pub listening: Option<f64>,
    pub speaking: Option<f64>,
    pub reading: Option<f64>,
    pub writing: Option<f64>,
    pub total_marks: Option<f64>,
    pub remarks: Option<String>,
    pub status: String,
    pub updated_at: String,
}
