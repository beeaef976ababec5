use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

/// HTTP-facing error. The message is sent back verbatim as the response body.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::BadRequest(msg) | AppError::Internal(msg) | AppError::Database(msg) => msg,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::BadRequest(msg) => warn!("Error: {}: {}", status, msg),
            AppError::Internal(msg) | AppError::Database(msg) => {
                error!("Error: {}: {}", status, msg)
            }
        }

        // Plain string bodies still go out as application/json; clients of the
        // service depend on the header being constant across all responses.
        let body = match self {
            AppError::BadRequest(msg) => msg,
            AppError::Internal(_) | AppError::Database(_) => {
                "internal server error".to_string()
            }
        };

        json_text_response(status, body)
    }
}

/// Build a response whose body is `body` as-is, labelled `application/json`.
pub fn json_text_response(status: StatusCode, body: impl Into<String>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        body.into(),
    )
        .into_response()
}
