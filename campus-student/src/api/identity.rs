//! Student identity extraction
//!
//! Tokens are verified by the authenticating proxy in front of this
//! service, which forwards the student id in `x-student-id`. Handlers take
//! the student from here and never from a request body.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

pub const STUDENT_ID_HEADER: &str = "x-student-id";

/// Verified student making the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentIdentity {
    pub student_id: String,
}

fn header_student(parts: &Parts) -> Option<StudentIdentity> {
    parts
        .headers
        .get(STUDENT_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| StudentIdentity {
            student_id: id.to_string(),
        })
}

#[async_trait]
impl<S> FromRequestParts<S> for StudentIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_student(parts).ok_or_else(|| {
            ApiError::Unauthorized("Authentication required".to_string())
        })
    }
}

/// Identity on routes that also serve anonymous callers
#[derive(Debug, Clone, Default)]
pub struct MaybeStudent(pub Option<StudentIdentity>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeStudent
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeStudent(header_student(parts)))
    }
}
