//! Session HTTP handlers (inspect, attributes, logout)

use axum::{
    extract::{Path, State},
    http::{header::SET_COOKIE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::info;

use crate::error::ApiError;
use crate::extract::CurrentSession;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::transport::CookieTransport;

#[derive(Debug, Serialize)]
pub struct SessionView {
    /// Masked; the full token only travels in the cookie.
    pub session_id: String,
    pub attributes: HashMap<String, Value>,
}

/// Stored values are JSON; anything that does not parse is returned as a string.
fn decode(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

/// GET /api/v1/session
pub async fn show(
    State(state): State<AppState>,
    CurrentSession(session_id): CurrentSession,
) -> Result<Json<ApiResponse<SessionView>>, ApiError> {
    let attributes = state
        .attributes
        .all(&session_id)
        .await?
        .into_iter()
        .map(|(k, v)| (k, decode(v)))
        .collect();

    Ok(Json(ApiResponse::success(SessionView {
        session_id: session_id.masked(),
        attributes,
    })))
}

/// GET /api/v1/session/attributes/{field}
pub async fn get_attribute(
    State(state): State<AppState>,
    CurrentSession(session_id): CurrentSession,
    Path(field): Path<String>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let raw = state.attributes.load(&session_id, &field).await?;
    Ok(Json(ApiResponse::success(decode(raw))))
}

/// PUT /api/v1/session/attributes/{field}
pub async fn put_attribute(
    State(state): State<AppState>,
    CurrentSession(session_id): CurrentSession,
    Path(field): Path<String>,
    Json(value): Json<Value>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    if field.is_empty() {
        return Err(ApiError::BadRequest("Attribute name is required".to_string()));
    }
    state.attributes.save_json(&session_id, &field, &value).await?;
    Ok(Json(ApiResponse::success(value)))
}

/// DELETE /api/v1/session/attributes/{field}
pub async fn delete_attribute(
    State(state): State<AppState>,
    CurrentSession(session_id): CurrentSession,
    Path(field): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.attributes.delete(&session_id, &field).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/session/logout
pub async fn logout(
    State(state): State<AppState>,
    CurrentSession(session_id): CurrentSession,
) -> Result<Response, ApiError> {
    state.attributes.clear(&session_id).await?;
    info!(session = %session_id.masked(), "Session cleared on logout");

    let config = state.sessions.config();
    let removal = CookieTransport::removal_cookie(&config.cookie_name, config.secure);
    let mut response = Json(ApiResponse::success(())).into_response();
    if let Ok(value) = HeaderValue::from_str(&removal.to_string()) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    Ok(response)
}
