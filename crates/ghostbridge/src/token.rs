//! Ephemeral bearer token.

use crate::error::BridgeError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::TryRngCore;
use rand::rngs::OsRng;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Number of random bytes behind a token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Authorization scheme expected in front of the token.
pub const BEARER_PREFIX: &str = "Bearer ";

/// A random shared secret presented as `Authorization: Bearer <token>`.
///
/// Generated once per bridge and never rotated. Cloning shares the same
/// immutable value.
#[derive(Clone)]
pub struct BearerToken {
    token: Arc<str>,
    header: Arc<str>,
}

impl BearerToken {
    /// Draw a new token from the operating system's randomness source.
    pub fn generate() -> Result<Self, BridgeError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(BridgeError::Randomness)?;

        Ok(Self::from_encoded(STANDARD.encode(bytes)))
    }

    fn from_encoded(token: String) -> Self {
        let header = format!("{BEARER_PREFIX}{token}");
        Self {
            token: token.into(),
            header: header.into(),
        }
    }

    /// The token itself, base64 encoded.
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// The full `Authorization` header value a client must send.
    pub fn header_value(&self) -> &str {
        &self.header
    }

    /// Check a raw `Authorization` header value.
    ///
    /// The whole value must equal `"Bearer " + token` byte for byte.
    pub fn matches(&self, presented: &[u8]) -> bool {
        bool::from(self.header.as_bytes().ct_eq(presented))
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}
