use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::domain::filter::Rejection;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("post rejected: {0}")]
    ValidationRejected(Rejection),
    #[error("guide already stored: {0}")]
    DuplicateKey(i64),
    #[error("guide not found: {0}")]
    GuideNotFound(i64),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<Rejection> for DomainError {
    fn from(reason: Rejection) -> Self {
        DomainError::ValidationRejected(reason)
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::GuideNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::DuplicateKey(_) => StatusCode::CONFLICT,
            DomainError::ValidationRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Storage details stay in the logs.
        let message = match self {
            DomainError::StorageUnavailable(_) => "storage unavailable".to_string(),
            other => other.to_string(),
        };
        let details = match self {
            DomainError::GuideNotFound(id) | DomainError::DuplicateKey(id) => {
                Some(json!({ "message_id": id }))
            }
            DomainError::ValidationRejected(reason) => {
                Some(json!({ "reason": reason.to_string() }))
            }
            DomainError::StorageUnavailable(_) => None,
        };
        let body = ErrorBody {
            error: message.as_str(),
            details,
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_variants_to_status_codes() {
        assert_eq!(
            DomainError::GuideNotFound(1).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DomainError::DuplicateKey(1).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            DomainError::from(Rejection::Poll).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            DomainError::StorageUnavailable("disk".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
