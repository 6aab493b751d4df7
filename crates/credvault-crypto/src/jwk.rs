//! # Public JSON Web Keys
//!
//! Public halves of signing keys rendered as JWK (RFC 7517) so that any
//! standard verifier can check issued tokens, plus the RFC 7638 thumbprint
//! used as the default key id.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use credvault_core::CanonicalBytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

/// A public JSON Web Key. Never carries private members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type: `OKP` for Ed25519, `EC` for P-256.
    pub kty: String,
    /// Curve: `Ed25519` or `P-256`.
    pub crv: String,
    /// Public key (OKP) or x coordinate (EC), base64url.
    pub x: String,
    /// y coordinate (EC only), base64url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    /// Intended algorithm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Public key use; always `sig` for issued keys.
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// Key id matching the token header `kid`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl Jwk {
    /// RFC 7638 thumbprint: SHA-256 over the canonical JSON of the required
    /// members only, base64url without padding.
    pub fn thumbprint(&self) -> Result<String, CryptoError> {
        let mut members = serde_json::Map::new();
        members.insert("crv".to_string(), self.crv.clone().into());
        members.insert("kty".to_string(), self.kty.clone().into());
        members.insert("x".to_string(), self.x.clone().into());
        if let Some(y) = &self.y {
            members.insert("y".to_string(), y.clone().into());
        }
        let canonical = CanonicalBytes::new(&serde_json::Value::Object(members))?;
        Ok(URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes())))
    }
}

/// A JWK Set (RFC 7517 §5), as published for verifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    /// Public keys, active keys first.
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Find a key by its `kid`.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }
}
