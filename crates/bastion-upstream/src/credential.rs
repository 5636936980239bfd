//! The session credential: an opaque bearer token issued by upstream.

use std::fmt;

use sha2::{Digest, Sha256};

/// Number of hex characters kept from the token digest for log correlation.
const FINGERPRINT_LEN: usize = 8;

/// Opaque bearer token proving a verified admin session.
///
/// The value is never parsed locally. `Debug` and `Display` print only the
/// fingerprint, so a credential can sit inside logged structs safely.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token. Empty or whitespace-only tokens are not credentials.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// The raw token, for cookie values and the `Authorization` header only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Short non-reversible identifier: leading hex of the SHA-256 digest.
    pub fn fingerprint(&self) -> String {
        token_fingerprint(&self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", self.fingerprint())
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fingerprint())
    }
}

/// Fingerprint an arbitrary token string.
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut out = String::with_capacity(FINGERPRINT_LEN);
    for byte in digest.iter().take(FINGERPRINT_LEN / 2) {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}
