//! In-process session store
//!
//! Mirrors the Redis hash semantics the manager relies on: expired keys
//! vanish lazily on access, `EXPIRE` on an absent key does nothing, and
//! deleting the last field removes the key.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use session_shared::constants::{DEFAULT_LEASE_KEY_PREFIX, DEFAULT_SESSION_KEY_PREFIX};

use crate::clock::Clock;
use crate::domain::CREATED_AT_FIELD;
use crate::error::SessionError;
use crate::repositories::{AttributeStore, RotationLease, SessionStore};

#[derive(Debug, Default, Clone)]
struct Entry {
    fields: HashMap<String, String>,
    expires_at_ms: Option<i64>,
}

impl Entry {
    fn is_expired(&self, now_ms: i64) -> bool {
        matches!(self.expires_at_ms, Some(at) if now_ms >= at)
    }
}

#[derive(Debug, Clone)]
struct Lease {
    holder: String,
    expires_at_ms: i64,
}

pub struct MemoryStore {
    map: DashMap<String, Entry>,
    leases: DashMap<String, Lease>,
    clock: Arc<dyn Clock>,
    key_prefix: String,
    lease_prefix: String,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_prefixes(clock, DEFAULT_SESSION_KEY_PREFIX, DEFAULT_LEASE_KEY_PREFIX)
    }

    pub fn with_prefixes(clock: Arc<dyn Clock>, key_prefix: &str, lease_prefix: &str) -> Self {
        Self {
            map: DashMap::new(),
            leases: DashMap::new(),
            clock,
            key_prefix: key_prefix.to_string(),
            lease_prefix: lease_prefix.to_string(),
        }
    }

    fn session_key(&self, session_id: &str) -> String {
        format!("{}{}", self.key_prefix, session_id)
    }

    fn lease_key(&self, session_id: &str) -> String {
        format!("{}{}", self.lease_prefix, session_id)
    }

    fn ttl_millis(ttl: Duration) -> i64 {
        i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
    }

    /// Copy of the live entry, dropping it if it has expired.
    fn live(&self, key: &str) -> Option<Entry> {
        let now = self.clock.now_millis();
        let entry = self.map.get(key)?;
        if entry.is_expired(now) {
            drop(entry);
            self.map.remove_if(key, |_, e| e.is_expired(now));
            return None;
        }
        Some(entry.value().clone())
    }

    /// Number of keys held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drops expired sessions and leases. Returns the number of sessions removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let before = self.map.len();
        self.map.retain(|_, e| !e.is_expired(now));
        self.leases.retain(|_, l| l.expires_at_ms > now);

        let removed = before.saturating_sub(self.map.len());
        if removed > 0 {
            debug!("Swept {} expired sessions", removed);
        }
        removed
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn hset(&self, session_id: &str, fields: &HashMap<String, String>) -> Result<(), SessionError> {
        let now = self.clock.now_millis();
        match self.map.entry(self.session_key(session_id)) {
            MapEntry::Occupied(mut o) => {
                if o.get().is_expired(now) {
                    if fields.is_empty() {
                        o.remove();
                        return Ok(());
                    }
                    o.insert(Entry::default());
                }
                o.get_mut().fields.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            MapEntry::Vacant(v) => {
                if !fields.is_empty() {
                    v.insert(Entry { fields: fields.clone(), expires_at_ms: None });
                }
            }
        }
        Ok(())
    }

    async fn hget(&self, session_id: &str, field: &str) -> Result<String, SessionError> {
        self.live(&self.session_key(session_id))
            .and_then(|mut e| e.fields.remove(field))
            .ok_or(SessionError::NotFound)
    }

    async fn hget_all(&self, session_id: &str) -> Result<HashMap<String, String>, SessionError> {
        Ok(self
            .live(&self.session_key(session_id))
            .map(|e| e.fields)
            .unwrap_or_default())
    }

    async fn expire(&self, session_id: &str, ttl: Duration) -> Result<(), SessionError> {
        let now = self.clock.now_millis();
        if let Some(mut entry) = self.map.get_mut(&self.session_key(session_id)) {
            if !entry.is_expired(now) {
                entry.expires_at_ms = Some(now.saturating_add(Self::ttl_millis(ttl)));
            }
        }
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<(), SessionError> {
        self.map.remove(&self.session_key(session_id));
        Ok(())
    }
}

#[async_trait]
impl AttributeStore for MemoryStore {
    async fn hdel(&self, session_id: &str, field: &str) -> Result<(), SessionError> {
        let key = self.session_key(session_id);
        if let Some(mut entry) = self.map.get_mut(&key) {
            entry.fields.remove(field);
        }
        self.map.remove_if(&key, |_, e| e.fields.is_empty());
        Ok(())
    }

    /// Check and write under the same shard lock.
    async fn hset_existing(
        &self,
        session_id: &str,
        fields: &HashMap<String, String>,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        let now = self.clock.now_millis();
        let mut entry = self
            .map
            .get_mut(&self.session_key(session_id))
            .filter(|e| !e.is_expired(now) && e.fields.contains_key(CREATED_AT_FIELD))
            .ok_or(SessionError::NotFound)?;
        entry.fields.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        entry.expires_at_ms = Some(now.saturating_add(Self::ttl_millis(ttl)));
        Ok(())
    }
}

#[async_trait]
impl RotationLease for MemoryStore {
    async fn claim_rotation(
        &self,
        old_session_id: &str,
        new_session_id: &str,
        ttl: Duration,
    ) -> Result<Option<String>, SessionError> {
        let now = self.clock.now_millis();
        let lease = Lease {
            holder: new_session_id.to_string(),
            expires_at_ms: now.saturating_add(Self::ttl_millis(ttl)),
        };
        match self.leases.entry(self.lease_key(old_session_id)) {
            MapEntry::Occupied(mut o) => {
                if o.get().expires_at_ms > now {
                    return Ok(Some(o.get().holder.clone()));
                }
                o.insert(lease);
            }
            MapEntry::Vacant(v) => {
                v.insert(lease);
            }
        }
        Ok(None)
    }

    async fn release_rotation(&self, old_session_id: &str, holder: &str) -> Result<(), SessionError> {
        self.leases.remove_if(&self.lease_key(old_session_id), |_, l| l.holder == holder);
        Ok(())
    }
}
