//! # Error Types
//!
//! Errors produced by the foundational types. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations.

use thiserror::Error;

/// Error raised by core constructors and parsers.
#[derive(Error, Debug)]
pub enum CoreError {
    /// An identifier failed validation.
    #[error("invalid {kind}: {reason}")]
    InvalidIdentifier {
        /// Which identifier type was being constructed.
        kind: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// A timestamp could not be parsed or represented.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Hex or base64 decoding failed.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical claim payloads.
    /// Numeric claims must be integers or strings.
    #[error("float values are not permitted in canonical claim payloads; use string or integer: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_identifier_display_names_kind() {
        let err = CoreError::InvalidIdentifier {
            kind: "issuer id",
            reason: "must not be empty".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("issuer id"));
        assert!(msg.contains("must not be empty"));
    }

    #[test]
    fn float_rejected_display() {
        let err = CanonicalizationError::FloatRejected(2.5);
        assert!(err.to_string().contains("2.5"));
    }
}
