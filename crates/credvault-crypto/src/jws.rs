//! # Compact JWS Encoding
//!
//! Produces RFC 7515 compact serializations:
//! `base64url(header) "." base64url(payload) "." base64url(signature)`.
//!
//! The payload must already be `CanonicalBytes`, and the protected header is
//! canonicalized the same way, so the signing input is deterministic for a
//! given claim set and key.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use credvault_core::CanonicalBytes;
use serde::{Deserialize, Serialize};

use crate::algorithm::KeyAlgorithm;
use crate::error::CryptoError;
use crate::key::SigningKey;

/// Protected header of an issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwsHeader {
    /// Signature algorithm.
    pub alg: KeyAlgorithm,
    /// Id of the signing key.
    pub kid: String,
    /// Media type, always `JWT`.
    pub typ: String,
}

impl JwsHeader {
    /// Header for a token signed by `key`.
    pub fn for_key(key: &SigningKey) -> Self {
        Self {
            alg: key.algorithm(),
            kid: key.kid().to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Sign `payload` with `key` and return the compact serialization.
pub fn encode_compact(key: &SigningKey, payload: &CanonicalBytes) -> Result<String, CryptoError> {
    let header = CanonicalBytes::new(&JwsHeader::for_key(key))?;
    let mut token = String::with_capacity((header.len() + payload.len()) * 4 / 3 + 96);
    token.push_str(&URL_SAFE_NO_PAD.encode(header.as_bytes()));
    token.push('.');
    token.push_str(&URL_SAFE_NO_PAD.encode(payload.as_bytes()));
    let signature = key.sign(token.as_bytes())?;
    token.push('.');
    token.push_str(&URL_SAFE_NO_PAD.encode(signature));
    Ok(token)
}
