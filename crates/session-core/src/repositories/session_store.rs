//! Session store traits (ports)
//!
//! Implementations namespace their keys so the backend can hold unrelated
//! data. All methods take the bare session identifier.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::domain::CREATED_AT_FIELD;
use crate::error::SessionError;

#[cfg(test)]
use mockall::automock;

/// Hash-per-session key-value backend with per-key expiry.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Upserts fields. Does not touch the key's TTL.
    async fn hset(&self, session_id: &str, fields: &HashMap<String, String>) -> Result<(), SessionError>;

    /// `NotFound` when the session or the field is absent.
    async fn hget(&self, session_id: &str, field: &str) -> Result<String, SessionError>;

    /// Empty map when the session is absent.
    async fn hget_all(&self, session_id: &str) -> Result<HashMap<String, String>, SessionError>;

    /// Sets or refreshes the expiry. No-op when the key is absent.
    async fn expire(&self, session_id: &str, ttl: Duration) -> Result<(), SessionError>;

    /// Deletes the session. Succeeds when already absent.
    async fn clear(&self, session_id: &str) -> Result<(), SessionError>;

    /// Writes fields and applies the TTL. The default issues two separate
    /// calls; backends with transactions should override it.
    async fn hset_with_expiry(
        &self,
        session_id: &str,
        fields: &HashMap<String, String>,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        self.hset(session_id, fields).await?;
        self.expire(session_id, ttl).await
    }
}

/// Store that can also drop individual fields.
#[async_trait]
pub trait AttributeStore: SessionStore {
    async fn hdel(&self, session_id: &str, field: &str) -> Result<(), SessionError>;

    /// Like `hset_with_expiry`, but only for a live session carrying
    /// `created_at`; `NotFound` otherwise. The default checks then writes;
    /// backends that can do both in one step should override it.
    async fn hset_existing(
        &self,
        session_id: &str,
        fields: &HashMap<String, String>,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        self.hget(session_id, CREATED_AT_FIELD).await?;
        self.hset_with_expiry(session_id, fields, ttl).await
    }
}

/// Short-lived per-token claim taken before rotating.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RotationLease: Send + Sync {
    /// Returns `None` when this caller now holds the claim, or the
    /// identifier recorded by the current holder.
    async fn claim_rotation(
        &self,
        old_session_id: &str,
        new_session_id: &str,
        ttl: Duration,
    ) -> Result<Option<String>, SessionError>;

    /// Drops the claim on `old_session_id` if `holder` still owns it.
    async fn release_rotation(&self, old_session_id: &str, holder: &str) -> Result<(), SessionError>;
}
