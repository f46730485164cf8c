//! Mapping of store errors to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::store::StoreError;

/// Error body returned by every API endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// A store error on its way to the client.
#[derive(Debug)]
pub struct ApiError(pub StoreError);

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            StoreError::Phase { .. } => StatusCode::SERVICE_UNAVAILABLE,
            StoreError::UnknownSection(_) => StatusCode::NOT_FOUND,
            StoreError::NotEditable(_) => StatusCode::FORBIDDEN,
            StoreError::NotASection(_) | StoreError::FieldOutsideSection { .. } => {
                StatusCode::BAD_REQUEST
            }
            StoreError::SaveInProgress => StatusCode::CONFLICT,
            StoreError::Decode(_) | StoreError::Tree(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self.0, "Request rejected");
        }
        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::DecodeError;
    use crate::store::StorePhase;

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                StoreError::Phase {
                    operation: "save",
                    phase: StorePhase::Initialized,
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (StoreError::UnknownSection("x".into()), StatusCode::NOT_FOUND),
            (StoreError::NotEditable("x".into()), StatusCode::FORBIDDEN),
            (StoreError::NotASection("ui.theme".into()), StatusCode::BAD_REQUEST),
            (StoreError::SaveInProgress, StatusCode::CONFLICT),
            (
                StoreError::Decode(DecodeError::MissingKey { path: "ui".into() }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError(error).status(), status);
        }
    }
}
