//! HTTP mapping for [`PulseError`].

use crate::models::ErrorResponse;
use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pulse_core::PulseError;
use tracing::error;

/// Handler error: wraps a [`PulseError`] and renders it as
/// `{ error, message }` with the matching status code.
#[derive(Debug)]
pub struct ApiError(pub PulseError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<PulseError> for ApiError {
    fn from(err: PulseError) -> Self {
        ApiError(err)
    }
}

/// JSON body extractor whose rejections (malformed body, unknown keys on
/// update DTOs) answer 400 instead of axum's default 422.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(PulseError::Validation(rejection.body_text()))
    }
}

pub fn status_for(err: &PulseError) -> StatusCode {
    match err {
        PulseError::Validation(_)
        | PulseError::UnsupportedMediaType(_)
        | PulseError::EmptyPayload => StatusCode::BAD_REQUEST,
        PulseError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        PulseError::Forbidden(_) => StatusCode::FORBIDDEN,
        PulseError::NotFound(_) => StatusCode::NOT_FOUND,
        PulseError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        PulseError::InvalidDateFormat(_)
        | PulseError::Spreadsheet(_)
        | PulseError::Store(_)
        | PulseError::Config(_)
        | PulseError::Serialization(_)
        | PulseError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let code = self.0.code();
        metrics::counter!("api.errors", "code" => code).increment(1);

        let message = if status.is_server_error() {
            error!(error = %self.0, code, "Request failed");
            match &self.0 {
                PulseError::InvalidDateFormat(_) | PulseError::Spreadsheet(_) => self.0.to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            self.0.to_string()
        };

        (
            status,
            Json(ErrorResponse {
                error: code.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&PulseError::EmptyPayload), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&PulseError::UnsupportedMediaType("text/csv".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&PulseError::PayloadTooLarge { limit: 1 }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_for(&PulseError::Forbidden("admin only".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&PulseError::InvalidDateFormat("row 1".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&PulseError::Store("down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_details_are_not_echoed() {
        let response = ApiError(PulseError::Store("connection refused at 10.0.0.4".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
