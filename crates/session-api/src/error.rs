use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use session_core::SessionError;

use crate::response::ApiResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Session(SessionError::Unauthorized) => StatusCode::UNAUTHORIZED,
            ApiError::Session(SessionError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Session(SessionError::ReservedField(_))
            | ApiError::Session(SessionError::SerializationError(_))
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Session(SessionError::EntropyUnavailable(_))
            | ApiError::Session(SessionError::StoreError(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match &self {
            ApiError::Session(SessionError::Unauthorized) => {
                tracing::warn!("Unauthorized: no session resolved");
                ("UNAUTHORIZED", "Session required".to_string())
            }
            ApiError::Session(SessionError::NotFound) => ("NOT_FOUND", "Not found".to_string()),
            ApiError::Session(e) if e.is_internal() => {
                tracing::error!("Session failure: {}", e);
                ("INTERNAL_ERROR", "Internal server error".to_string())
            }
            ApiError::Session(e) => {
                tracing::warn!("Bad request: {}", e);
                ("BAD_REQUEST", e.to_string())
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                ("BAD_REQUEST", msg.clone())
            }
        };

        (status, Json(ApiResponse::<()>::error(code, &message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (SessionError::Unauthorized, StatusCode::UNAUTHORIZED),
            (SessionError::NotFound, StatusCode::NOT_FOUND),
            (SessionError::ReservedField("created_at".into()), StatusCode::BAD_REQUEST),
            (SessionError::SerializationError("eof".into()), StatusCode::BAD_REQUEST),
            (SessionError::StoreError("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (SessionError::EntropyUnavailable("no rng".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[tokio::test]
    async fn test_internal_details_are_not_leaked() {
        let response = ApiError::from(SessionError::StoreError("10.0.0.7:6379 refused".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("INTERNAL_ERROR"));
        assert!(!text.contains("10.0.0.7"));
    }
}
