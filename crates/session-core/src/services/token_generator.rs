//! Session identifier generation

use rand::{rngs::OsRng, TryRngCore};

use crate::domain::{SessionId, SESSION_ID_BYTES};
use crate::error::SessionError;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> Result<SessionId, SessionError>;
}

/// Hex-encoded bytes from the operating system's CSPRNG.
///
/// A failing source is reported as `EntropyUnavailable`; there is no
/// fallback to a weaker generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsTokenGenerator;

impl TokenGenerator for OsTokenGenerator {
    fn generate(&self) -> Result<SessionId, SessionError> {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| SessionError::EntropyUnavailable(e.to_string()))?;
        Ok(SessionId::from(hex::encode(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SESSION_ID_HEX_LEN;
    use std::collections::HashSet;

    fn is_lower_hex(s: &str) -> bool {
        s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    #[test]
    fn test_generated_ids_are_64_lowercase_hex() {
        let id = OsTokenGenerator.generate().unwrap();
        assert_eq!(id.as_str().len(), SESSION_ID_HEX_LEN);
        assert!(is_lower_hex(id.as_str()));
    }

    #[test]
    fn test_generated_ids_do_not_collide() {
        let ids: HashSet<_> = (0..1000).map(|_| OsTokenGenerator.generate().unwrap()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
