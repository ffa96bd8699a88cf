use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::directory::DirectoryError;
use crate::message::message_repository::RepositoryError;

pub type Result<T> = std::result::Result<T, AppError>;

/// Failures surfaced by the message store. Every lower-level error is
/// classified into exactly one of these before it leaves the service.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("message not found")]
    MsgNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("group not found")]
    GroupNotFound,

    #[error("system error: {0}")]
    SystemError(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MsgNotFound | AppError::UserNotFound | AppError::GroupNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::SystemError(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(_) => AppError::MsgNotFound,
            RepositoryError::Database(e) => AppError::SystemError(e.to_string()),
        }
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::GroupNotFound(_) => AppError::GroupNotFound,
            DirectoryError::Http(e) => AppError::SystemError(e.to_string()),
            DirectoryError::UnexpectedStatus(status) => {
                AppError::SystemError(format!("directory responded with status {}", status))
            }
            DirectoryError::InvalidUrl(url) => {
                AppError::SystemError(format!("invalid directory url {}", url))
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details stay in the logs.
        let message = match &self {
            AppError::SystemError(detail) | AppError::Config(detail) => {
                tracing::error!("request failed: {}", detail);
                "system error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn repository_not_found_maps_to_msg_not_found() {
        let err: AppError = RepositoryError::NotFound(Uuid::new_v4()).into();
        assert!(matches!(err, AppError::MsgNotFound));
    }

    #[test]
    fn unclassified_database_failure_is_system_error() {
        let err: AppError = RepositoryError::Database(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(err, AppError::SystemError(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn directory_errors_are_classified() {
        let err: AppError = DirectoryError::GroupNotFound("tstgroup".into()).into();
        assert!(matches!(err, AppError::GroupNotFound));

        let err: AppError = DirectoryError::UnexpectedStatus(503).into();
        assert!(matches!(err, AppError::SystemError(_)));
    }

    #[test]
    fn not_found_variants_are_404() {
        for err in [AppError::MsgNotFound, AppError::UserNotFound, AppError::GroupNotFound] {
            assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        }
        assert_eq!(
            AppError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
