//! HTTP error response handling for the API
//!
//! Converts domain errors into HTTP responses with the appropriate status
//! code and the structured JSON error envelope.

use crate::error::{ApiError, Error, ToHttpStatus};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let api_error: ApiError = self.into();

        (status_code, Json(api_error)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Errors normally flow through Error::into_response, which knows the
        // status; a bare ApiError is a server-side fallback
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}
