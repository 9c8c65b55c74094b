//! Session identifier and resolution outcome

use serde::Serialize;
use std::fmt;

/// Reserved attribute holding the creation time (unix seconds).
pub const CREATED_AT_FIELD: &str = "created_at";

/// Random bytes drawn per identifier.
pub const SESSION_ID_BYTES: usize = 32;
pub const SESSION_ID_HEX_LEN: usize = SESSION_ID_BYTES * 2;

/// Opaque session token exchanged with the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for log lines.
    pub fn masked(&self) -> String {
        session_shared::utils::mask_token(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of resolving one request's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionResolution {
    pub session_id: SessionId,
    pub is_new: bool,
    pub rotated: bool,
}

impl SessionResolution {
    pub fn created(session_id: SessionId) -> Self {
        Self { session_id, is_new: true, rotated: false }
    }

    pub fn refreshed(session_id: SessionId) -> Self {
        Self { session_id, is_new: false, rotated: false }
    }

    pub fn rotated(session_id: SessionId) -> Self {
        Self { session_id, is_new: false, rotated: true }
    }
}
