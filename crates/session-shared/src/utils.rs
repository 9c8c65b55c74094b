//! Utility functions

use crate::constants::MASKED_TOKEN_PREFIX_LEN;

/// Shortens a session token for log output.
pub fn mask_token(token: &str) -> String {
    match token.get(..MASKED_TOKEN_PREFIX_LEN) {
        Some(prefix) if token.len() > MASKED_TOKEN_PREFIX_LEN => format!("{}***", prefix),
        _ => "***".to_string(),
    }
}
