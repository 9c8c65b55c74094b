//! Session store on Redis hashes
//!
//! One hash per session under `{key_prefix}{session_id}`. Rotation claims
//! live under `{lease_prefix}{session_id}` and need Redis 7 (`SET .. NX GET`).

use async_trait::async_trait;
use deadpool_redis::redis::{self, RedisError};
use deadpool_redis::{Connection, Pool};
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

use session_core::{AttributeStore, RotationLease, SessionError, SessionStore, CREATED_AT_FIELD};
use session_shared::constants::{DEFAULT_LEASE_KEY_PREFIX, DEFAULT_SESSION_KEY_PREFIX};

fn store_error(e: RedisError) -> SessionError {
    SessionError::StoreError(e.to_string())
}

/// Redis `EXPIRE` works in whole seconds; round up so a sub-second TTL
/// does not become an immediate delete.
fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 || secs == 0 {
        secs + 1
    } else {
        secs
    }
}

/// KEYS[1] session, ARGV[1] guard field, ARGV[2] ttl secs, ARGV[3..] field/value pairs.
const HSET_EXISTING_SCRIPT: &str = r#"
if redis.call('HEXISTS', KEYS[1], ARGV[1]) == 0 then
    return 0
end
redis.call('HSET', KEYS[1], unpack(ARGV, 3))
redis.call('EXPIRE', KEYS[1], ARGV[2])
return 1
"#;

/// KEYS[1] lease, ARGV[1] expected holder.
const RELEASE_LEASE_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
"#;

fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[derive(Clone)]
pub struct RedisSessionStore {
    pool: Pool,
    key_prefix: String,
    lease_prefix: String,
}

impl RedisSessionStore {
    pub fn new(pool: Pool) -> Self {
        Self::with_prefixes(pool, DEFAULT_SESSION_KEY_PREFIX, DEFAULT_LEASE_KEY_PREFIX)
    }

    pub fn with_prefixes(pool: Pool, key_prefix: &str, lease_prefix: &str) -> Self {
        Self {
            pool,
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

    async fn connection(&self) -> Result<Connection, SessionError> {
        self.pool.get().await.map_err(|e| {
            warn!("Failed to get Redis connection from session pool: {}", e);
            SessionError::StoreError(e.to_string())
        })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn hset(&self, session_id: &str, fields: &HashMap<String, String>) -> Result<(), SessionError> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection().await?;
        let _: () = redis::cmd("HSET")
            .arg(self.session_key(session_id))
            .arg(fields)
            .query_async(&mut *conn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn hget(&self, session_id: &str, field: &str) -> Result<String, SessionError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = redis::cmd("HGET")
            .arg(self.session_key(session_id))
            .arg(field)
            .query_async(&mut *conn)
            .await
            .map_err(store_error)?;
        value.ok_or(SessionError::NotFound)
    }

    async fn hget_all(&self, session_id: &str) -> Result<HashMap<String, String>, SessionError> {
        let mut conn = self.connection().await?;
        redis::cmd("HGETALL")
            .arg(self.session_key(session_id))
            .query_async(&mut *conn)
            .await
            .map_err(store_error)
    }

    async fn expire(&self, session_id: &str, ttl: Duration) -> Result<(), SessionError> {
        let mut conn = self.connection().await?;
        let _: i64 = redis::cmd("EXPIRE")
            .arg(self.session_key(session_id))
            .arg(ttl_secs(ttl))
            .query_async(&mut *conn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<(), SessionError> {
        let mut conn = self.connection().await?;
        let _: i64 = redis::cmd("DEL")
            .arg(self.session_key(session_id))
            .query_async(&mut *conn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    /// `HSET` and `EXPIRE` in one `MULTI/EXEC`, so a cancelled request
    /// cannot leave a key without a TTL.
    async fn hset_with_expiry(
        &self,
        session_id: &str,
        fields: &HashMap<String, String>,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        if fields.is_empty() {
            return self.expire(session_id, ttl).await;
        }
        let key = self.session_key(session_id);
        let mut conn = self.connection().await?;
        let _: () = redis::pipe()
            .atomic()
            .cmd("HSET")
            .arg(&key)
            .arg(fields)
            .ignore()
            .cmd("EXPIRE")
            .arg(&key)
            .arg(ttl_secs(ttl))
            .ignore()
            .query_async(&mut *conn)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

#[async_trait]
impl AttributeStore for RedisSessionStore {
    async fn hdel(&self, session_id: &str, field: &str) -> Result<(), SessionError> {
        let mut conn = self.connection().await?;
        let _: i64 = redis::cmd("HDEL")
            .arg(self.session_key(session_id))
            .arg(field)
            .query_async(&mut *conn)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    /// Existence check and write run as one script.
    async fn hset_existing(
        &self,
        session_id: &str,
        fields: &HashMap<String, String>,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        if fields.is_empty() {
            self.hget(session_id, CREATED_AT_FIELD).await?;
            return self.expire(session_id, ttl).await;
        }
        let mut conn = self.connection().await?;
        let written: i64 = redis::cmd("EVAL")
            .arg(HSET_EXISTING_SCRIPT)
            .arg(1)
            .arg(self.session_key(session_id))
            .arg(CREATED_AT_FIELD)
            .arg(ttl_secs(ttl))
            .arg(fields)
            .query_async(&mut *conn)
            .await
            .map_err(store_error)?;
        if written == 0 {
            return Err(SessionError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl RotationLease for RedisSessionStore {
    async fn claim_rotation(
        &self,
        old_session_id: &str,
        new_session_id: &str,
        ttl: Duration,
    ) -> Result<Option<String>, SessionError> {
        let mut conn = self.connection().await?;
        // With GET, the reply is the previous holder (nil when we won).
        redis::cmd("SET")
            .arg(self.lease_key(old_session_id))
            .arg(new_session_id)
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis(ttl))
            .arg("GET")
            .query_async(&mut *conn)
            .await
            .map_err(store_error)
    }

    async fn release_rotation(&self, old_session_id: &str, holder: &str) -> Result<(), SessionError> {
        let mut conn = self.connection().await?;
        let _: i64 = redis::cmd("EVAL")
            .arg(RELEASE_LEASE_SCRIPT)
            .arg(1)
            .arg(self.lease_key(old_session_id))
            .arg(holder)
            .query_async(&mut *conn)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}
