//! Errors raised while loading, rotating or using signing keys.

use credvault_core::CanonicalizationError;
use thiserror::Error;

/// Error from key material handling or signing.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Key material is empty, the wrong length, or invalid for its algorithm.
    #[error("malformed {algorithm} key for issuer {issuer:?}: {reason}")]
    MalformedKey {
        /// Issuer the key was configured for.
        issuer: String,
        /// Declared algorithm.
        algorithm: &'static str,
        /// What was wrong.
        reason: String,
    },

    /// A configured public key does not match the one derived from the private key.
    #[error("public key for issuer {issuer:?} does not match its private key")]
    PublicKeyMismatch {
        /// Issuer the key was configured for.
        issuer: String,
    },

    /// An algorithm name was not recognised.
    #[error("unsupported signing algorithm: {0:?} (expected EdDSA or ES256)")]
    UnsupportedAlgorithm(String),

    /// A key store was constructed with no keys.
    #[error("key store requires at least one signing key")]
    EmptyKeySet,

    /// Two keys were configured as active for the same issuer.
    #[error("duplicate signing key for issuer {0:?}")]
    DuplicateIssuer(String),

    /// Rotation targeted an issuer with no active key.
    #[error("no active key to rotate for issuer {0:?}")]
    UnknownIssuer(String),

    /// A key id is already in use by another key of the same issuer.
    #[error("key id {kid:?} already used for issuer {issuer:?}")]
    DuplicateKeyId {
        /// Issuer the key belongs to.
        issuer: String,
        /// The conflicting key id.
        kid: String,
    },

    /// The cryptographic primitive refused to sign.
    #[error("signing failed: {0}")]
    Signing(String),

    /// A header or payload could not be canonicalized.
    #[error("encoding failed: {0}")]
    Encoding(#[from] CanonicalizationError),
}
