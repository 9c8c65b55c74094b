//! Application-wide constants

pub const DEFAULT_COOKIE_NAME: &str = "session_id";
pub const DEFAULT_SESSION_DURATION_SECS: u64 = 3600;
pub const DEFAULT_REGENERATE_AFTER_SECS: u64 = 1800;
pub const DEFAULT_SESSION_KEY_PREFIX: &str = "session:";
pub const DEFAULT_LEASE_KEY_PREFIX: &str = "session_rotation:";
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const MASKED_TOKEN_PREFIX_LEN: usize = 8;
