//! Session manager: decides per request whether to create, refresh, or
//! rotate a session.
//!
//! The manager keeps no state between requests and takes no in-process
//! locks. Two requests presenting the same aged token can both rotate it
//! unless a [`RotationLease`] is configured, in which case one request wins
//! and the other adopts the winner's identifier.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use session_shared::config::SessionSettings;

use crate::accessor::SessionContext;
use crate::clock::{Clock, SystemClock};
use crate::domain::{SessionId, SessionResolution, CREATED_AT_FIELD};
use crate::error::SessionError;
use crate::repositories::{RotationLease, SessionStore};
use crate::services::token_generator::{OsTokenGenerator, TokenGenerator};
use crate::transport::TokenTransport;

/// Core-facing session settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Transport key name; not interpreted here.
    pub cookie_name: String,
    /// Passed through to the transport.
    pub secure: bool,
    /// TTL applied on creation, refresh, and rotation.
    pub session_duration: Duration,
    /// Age after which a presented token is rotated.
    pub regenerate_after: Duration,
    /// Claim TTL; `None` disables the rotation lease.
    pub rotation_lease: Option<Duration>,
}

impl From<&SessionSettings> for SessionConfig {
    fn from(s: &SessionSettings) -> Self {
        Self {
            cookie_name: s.cookie_name.clone(),
            secure: s.secure,
            session_duration: Duration::from_secs(s.session_duration_secs),
            regenerate_after: Duration::from_secs(s.regenerate_after_secs),
            rotation_lease: s.rotation_lease_ms.map(Duration::from_millis),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&SessionSettings::default())
    }
}

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    tokens: Arc<dyn TokenGenerator>,
    clock: Arc<dyn Clock>,
    lease: Option<(Arc<dyn RotationLease>, Duration)>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self {
            store,
            tokens: Arc::new(OsTokenGenerator),
            clock: Arc::new(SystemClock),
            lease: None,
            config,
        }
    }

    pub fn with_token_generator(mut self, tokens: Arc<dyn TokenGenerator>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Guards rotation with a store-held claim valid for `ttl`.
    pub fn with_rotation_lease(mut self, lease: Arc<dyn RotationLease>, ttl: Duration) -> Self {
        self.lease = Some((lease, ttl));
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Reads the token once, resolves it, and writes the identifier back
    /// only when it differs from what the client presented.
    pub async fn handle<T>(&self, transport: &mut T) -> Result<SessionContext, SessionError>
    where
        T: TokenTransport + ?Sized,
    {
        let presented = transport
            .get_token()
            .filter(|t| !t.is_empty())
            .map(SessionId::from);

        let resolution = self.resolve(presented.clone()).await?;

        if presented.as_ref() != Some(&resolution.session_id) {
            transport.set_token(resolution.session_id.as_str(), self.config.session_duration);
        }

        Ok(SessionContext::resolved(resolution))
    }

    pub async fn resolve(&self, presented: Option<SessionId>) -> Result<SessionResolution, SessionError> {
        match presented {
            None => self.create().await,
            Some(token) => self.refresh(token).await,
        }
    }

    async fn create(&self) -> Result<SessionResolution, SessionError> {
        let session_id = self.tokens.generate()?;
        let fields = HashMap::from([(CREATED_AT_FIELD.to_string(), self.clock.now_unix().to_string())]);

        self.store
            .hset_with_expiry(session_id.as_str(), &fields, self.config.session_duration)
            .await
            .inspect_err(|e| error!("Failed to create session: {}", e))?;

        info!(session = %session_id.masked(), "Session created");
        Ok(SessionResolution::created(session_id))
    }

    async fn refresh(&self, token: SessionId) -> Result<SessionResolution, SessionError> {
        // An already expired key makes this a no-op in the store.
        self.store
            .expire(token.as_str(), self.config.session_duration)
            .await
            .inspect_err(|e| error!(session = %token.masked(), "Failed to refresh session TTL: {}", e))?;

        if !self.rotation_due(&token).await {
            return Ok(SessionResolution::refreshed(token));
        }

        self.rotate(token).await
    }

    /// Missing, unparsable, or unreadable metadata means no rotation.
    async fn rotation_due(&self, token: &SessionId) -> bool {
        let raw = match self.store.hget(token.as_str(), CREATED_AT_FIELD).await {
            Ok(raw) => raw,
            Err(SessionError::NotFound) => {
                debug!(session = %token.masked(), "No created_at, skipping rotation");
                return false;
            }
            Err(e) => {
                warn!(session = %token.masked(), "Could not read created_at, skipping rotation: {}", e);
                return false;
            }
        };

        let created_at: i64 = match raw.trim().parse() {
            Ok(secs) => secs,
            Err(_) => {
                warn!(session = %token.masked(), "Unparsable created_at {:?}, skipping rotation", raw);
                return false;
            }
        };

        let age_ms = self.clock.now_millis().saturating_sub(created_at.saturating_mul(1000));
        age_ms > self.config.regenerate_after.as_millis() as i64
    }

    /// Copies the old session's fields to a fresh identifier, then drops
    /// the old key. Nothing is deleted unless the new session was written,
    /// and a failed copy gives up the lease so retries can rotate again.
    async fn rotate(&self, old: SessionId) -> Result<SessionResolution, SessionError> {
        let new_id = self.tokens.generate()?;

        if let Some((lease, ttl)) = &self.lease {
            match lease.claim_rotation(old.as_str(), new_id.as_str(), *ttl).await {
                Ok(None) => {}
                Ok(Some(winner)) => {
                    debug!(session = %old.masked(), "Rotation already claimed by another request");
                    return Ok(SessionResolution::refreshed(SessionId::from(winner)));
                }
                Err(e) => {
                    warn!(session = %old.masked(), "Rotation lease unavailable, skipping rotation: {}", e);
                    return Ok(SessionResolution::refreshed(old));
                }
            }
        }

        if let Err(e) = self.copy_session(&old, &new_id).await {
            if let Some((lease, _)) = &self.lease {
                if let Err(release_err) = lease.release_rotation(old.as_str(), new_id.as_str()).await {
                    warn!(session = %old.masked(), "Failed to release rotation lease: {}", release_err);
                }
            }
            return Err(e);
        }

        // The old key still carries its TTL and ages out on its own.
        if let Err(e) = self.store.clear(old.as_str()).await {
            warn!(session = %old.masked(), "Failed to clear rotated session: {}", e);
        }

        info!(old = %old.masked(), new = %new_id.masked(), "Session rotated");
        Ok(SessionResolution::rotated(new_id))
    }

    async fn copy_session(&self, old: &SessionId, new_id: &SessionId) -> Result<(), SessionError> {
        let mut fields = self
            .store
            .hget_all(old.as_str())
            .await
            .inspect_err(|e| error!(session = %old.masked(), "Failed to read session for rotation: {}", e))?;
        fields.insert(CREATED_AT_FIELD.to_string(), self.clock.now_unix().to_string());

        self.store
            .hset_with_expiry(new_id.as_str(), &fields, self.config.session_duration)
            .await
            .inspect_err(|e| error!(session = %old.masked(), "Failed to write rotated session: {}", e))
    }
}
