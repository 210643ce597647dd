use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{catalog::CatalogError, manager::SubmitError};

#[derive(Debug)]
pub struct ErrorResponse {
    status: StatusCode,
    message: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub(crate) fn catalog_error(error: CatalogError, fallback_message: &str) -> ErrorResponse {
    if error.is_not_found() {
        return ErrorResponse::new(StatusCode::NOT_FOUND, "record not found");
    }
    match error {
        CatalogError::MessageTooShort => {
            ErrorResponse::new(StatusCode::UNPROCESSABLE_ENTITY, error.to_string())
        }
        other => {
            tracing::error!(error = %other, "catalog error");
            ErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR, fallback_message)
        }
    }
}

pub(crate) fn submit_error(error: SubmitError) -> ErrorResponse {
    match error {
        SubmitError::Validation(validation) => {
            ErrorResponse::new(StatusCode::UNPROCESSABLE_ENTITY, validation.to_string())
        }
        SubmitError::Upload(upload) => {
            tracing::warn!(index = upload.index, name = %upload.name, error = %upload.source, "upload batch aborted");
            ErrorResponse::new(
                StatusCode::BAD_GATEWAY,
                format!("failed to upload {}", upload.name),
            )
        }
        SubmitError::Store(store) => catalog_error(store, "failed to save project"),
    }
}
