//! Session middleware: resolves the session before the handler runs and
//! writes a new cookie afterwards when the identifier changed.

use axum::{
    extract::{Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use session_core::SessionManager;

use crate::error::ApiError;
use crate::transport::CookieTransport;

pub async fn session_middleware(
    State(sessions): State<Arc<SessionManager>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let mut transport = CookieTransport::from_headers(request.headers(), sessions.config());
    let context = sessions.handle(&mut transport).await?;

    if let Some(resolution) = context.resolution() {
        debug!(
            session = %resolution.session_id.masked(),
            is_new = resolution.is_new,
            rotated = resolution.rotated,
            "Session resolved"
        );
    }
    request.extensions_mut().insert(context);

    let mut response = next.run(request).await;

    // A handler that already set this cookie (logout) wins.
    let cookie_prefix = format!("{}=", sessions.config().cookie_name);
    let handler_set_cookie = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .any(|v| v.to_str().map(|s| s.starts_with(&cookie_prefix)).unwrap_or(false));

    if !handler_set_cookie {
        if let Some(value) = transport.set_cookie_header() {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    Ok(response)
}
