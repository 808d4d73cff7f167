use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;
use tracing::error;

use crate::store::DomainError;

/// Canonical JSON payload for error and acknowledgement responses.
#[derive(Debug, Serialize, Clone)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type ApiError = (StatusCode, Json<ApiMessage>);

/// Helper for controllers that need to return `(StatusCode, Json<ApiMessage>)`.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ApiMessage::new(message)))
}

pub fn json_ok(message: impl Into<String>) -> Json<ApiMessage> {
    Json(ApiMessage::new(message))
}

pub fn domain_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Invalid(_) => StatusCode::BAD_REQUEST,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Maps a failed domain operation onto its JSON error response.
pub fn domain_error(err: DomainError) -> ApiError {
    if let DomainError::Internal(detail) = &err {
        error!(%detail, "internal error while handling request");
        return json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "服务器内部错误，请稍后再试。",
        );
    }
    json_error(domain_status(&err), err.message())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_http_statuses() {
        let (status, Json(body)) = domain_error(DomainError::NotFound("未找到该公告。"));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.message, "未找到该公告。");

        let (status, _) = domain_error(DomainError::invalid("bad"));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, Json(body)) = domain_error(DomainError::Internal("boom".to_string()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.message.contains("boom"));
    }
}
