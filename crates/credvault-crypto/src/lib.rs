//! # credvault-crypto: Signing Keys and Token Encoding
//!
//! - [`SigningKey`]: issuer-bound Ed25519 (`EdDSA`) or P-256 (`ES256`) key
//!   with a redacted `Debug` and an RFC 7638 thumbprint default key id.
//! - [`KeyStore`]: issuer → active key, safe for concurrent reads, with
//!   atomic rotation and JWK Set export.
//! - [`encode_compact`]: RFC 7515 compact JWS over `CanonicalBytes`.
//!
//! Signing input is always a canonical payload; there is no entry point that
//! signs an arbitrary `serde_json::Value`.

pub mod algorithm;
pub mod error;
pub mod jwk;
pub mod jws;
pub mod key;
pub mod key_store;

pub use algorithm::KeyAlgorithm;
pub use error::CryptoError;
pub use jwk::{Jwk, JwkSet};
pub use jws::{encode_compact, JwsHeader};
pub use key::SigningKey;
pub use key_store::KeyStore;
