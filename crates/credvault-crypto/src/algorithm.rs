//! Supported token signature algorithms, named as in the JOSE `alg` registry.

use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

/// Signature algorithm of a signing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    /// Ed25519 (RFC 8037).
    #[serde(rename = "EdDSA")]
    EdDsa,
    /// ECDSA over P-256 with SHA-256 (RFC 7518 §3.4).
    #[serde(rename = "ES256")]
    Es256,
}

impl KeyAlgorithm {
    /// The JOSE `alg` header value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EdDsa => "EdDSA",
            Self::Es256 => "ES256",
        }
    }

    /// Length of the raw private scalar or seed.
    pub fn secret_len(&self) -> usize {
        32
    }
}

impl std::fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for KeyAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "EdDSA" | "eddsa" | "Ed25519" | "ed25519" => Ok(Self::EdDsa),
            "ES256" | "es256" | "P-256" | "p256" => Ok(Self::Es256),
            other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}
