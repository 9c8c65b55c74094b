use axum::extract::FromRef;
use std::sync::Arc;

use session_core::{SessionAttributes, SessionManager};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub attributes: Arc<SessionAttributes>,
}

impl FromRef<AppState> for Arc<SessionManager> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for Arc<SessionAttributes> {
    fn from_ref(state: &AppState) -> Self {
        state.attributes.clone()
    }
}
