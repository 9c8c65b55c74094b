//! Request extractors for the resolved session

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use session_core::{SessionContext, SessionError, SessionId};

use crate::error::ApiError;

/// Identifier resolved by [`session_middleware`](crate::session_middleware).
/// Rejects with 401 on routes the middleware does not cover.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub SessionId);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let context = parts
            .extensions
            .get::<SessionContext>()
            .ok_or(SessionError::Unauthorized)?;
        Ok(CurrentSession(context.current()?))
    }
}
