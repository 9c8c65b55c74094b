//! Typed access to a session's attribute fields.
//!
//! Values are stored as JSON strings. The reserved `created_at` field is
//! hidden from listings and cannot be written or removed here.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{SessionId, CREATED_AT_FIELD};
use crate::error::SessionError;
use crate::repositories::AttributeStore;

pub struct SessionAttributes {
    store: Arc<dyn AttributeStore>,
    session_duration: Duration,
}

impl SessionAttributes {
    pub fn new(store: Arc<dyn AttributeStore>, session_duration: Duration) -> Self {
        Self { store, session_duration }
    }

    fn ensure_writable(field: &str) -> Result<(), SessionError> {
        if field == CREATED_AT_FIELD {
            return Err(SessionError::ReservedField(field.to_string()));
        }
        Ok(())
    }

    /// Serializes `value` and stores it, reapplying the session TTL so a
    /// write never leaves a key without expiry. Only existing sessions
    /// accept writes: an expired or unknown identifier yields `NotFound`.
    pub async fn save_json<T>(&self, session_id: &SessionId, field: &str, value: &T) -> Result<(), SessionError>
    where
        T: Serialize + ?Sized + Sync,
    {
        Self::ensure_writable(field)?;
        let encoded = serde_json::to_string(value)?;
        let fields = HashMap::from([(field.to_string(), encoded)]);
        self.store
            .hset_existing(session_id.as_str(), &fields, self.session_duration)
            .await
    }

    pub async fn load(&self, session_id: &SessionId, field: &str) -> Result<String, SessionError> {
        self.store.hget(session_id.as_str(), field).await
    }

    pub async fn load_json<T: DeserializeOwned>(&self, session_id: &SessionId, field: &str) -> Result<T, SessionError> {
        let raw = self.load(session_id, field).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Every attribute except the reserved creation timestamp.
    pub async fn all(&self, session_id: &SessionId) -> Result<HashMap<String, String>, SessionError> {
        let mut fields = self.store.hget_all(session_id.as_str()).await?;
        fields.remove(CREATED_AT_FIELD);
        Ok(fields)
    }

    pub async fn delete(&self, session_id: &SessionId, field: &str) -> Result<(), SessionError> {
        Self::ensure_writable(field)?;
        self.store.hdel(session_id.as_str(), field).await
    }

    pub async fn clear(&self, session_id: &SessionId) -> Result<(), SessionError> {
        self.store.clear(session_id.as_str()).await
    }
}
