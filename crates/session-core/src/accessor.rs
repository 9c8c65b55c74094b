//! Per-request view of the resolved session

use crate::domain::{SessionId, SessionResolution};
use crate::error::SessionError;

/// Carried alongside a request after the manager has run.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    resolution: Option<SessionResolution>,
}

impl SessionContext {
    pub fn resolved(resolution: SessionResolution) -> Self {
        Self { resolution: Some(resolution) }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn resolution(&self) -> Option<&SessionResolution> {
        self.resolution.as_ref()
    }

    /// The resolved identifier, or `Unauthorized` when no resolution
    /// happened for this request.
    pub fn current(&self) -> Result<SessionId, SessionError> {
        match &self.resolution {
            Some(r) if !r.session_id.as_str().is_empty() => Ok(r.session_id.clone()),
            _ => Err(SessionError::Unauthorized),
        }
    }

    /// Like [`current`](Self::current) for call sites where a missing
    /// session is a programming error.
    ///
    /// # Panics
    /// When no session was resolved.
    pub fn must_current(&self) -> SessionId {
        match self.current() {
            Ok(id) => id,
            Err(_) => panic!("missing session ID"),
        }
    }
}
