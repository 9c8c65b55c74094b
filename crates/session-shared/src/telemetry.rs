//! Telemetry setup

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogSettings;
use crate::constants::DEFAULT_LOG_LEVEL;

const KNOWN_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Normalizes a configured level, falling back to `info` for unknown values.
pub fn normalize_level(level: &str) -> (&'static str, bool) {
    let lower = level.trim().to_ascii_lowercase();
    match KNOWN_LEVELS.iter().find(|l| **l == lower) {
        Some(l) => (*l, true),
        None => (DEFAULT_LOG_LEVEL, lower.is_empty()),
    }
}

/// Installs the global subscriber. Keep the returned guard alive for the
/// lifetime of the process or buffered lines are dropped.
pub fn init_telemetry(settings: &LogSettings) -> WorkerGuard {
    let (level, recognized) = normalize_level(&settings.level);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());

    let registry = tracing_subscriber::registry().with(env_filter);
    if settings.format.eq_ignore_ascii_case("pretty") {
        registry.with(fmt::layer().with_writer(writer)).init();
    } else {
        registry.with(fmt::layer().json().with_writer(writer)).init();
    }

    if !recognized {
        tracing::warn!("Invalid log level '{}'; defaulting to {}", settings.level, DEFAULT_LOG_LEVEL);
    }
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level("DEBUG"), ("debug", true));
        assert_eq!(normalize_level(" warn "), ("warn", true));
        assert_eq!(normalize_level(""), ("info", true));
        assert_eq!(normalize_level("verbose"), ("info", false));
    }
}
