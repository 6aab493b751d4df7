//! # Error Taxonomy
//!
//! Two error families with different lifetimes:
//!
//! - [`ConfigError`]: raised while constructing the vault from keys and
//!   templates. A vault that failed construction does not exist, so none of
//!   these can surface at issuance time.
//! - [`IssuanceError`]: raised per issuance call. Batch issuance records
//!   them per item and carries on.

use credvault_core::CanonicalizationError;
use credvault_crypto::CryptoError;
use thiserror::Error;

/// Malformed key or template configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A signing key failed validation, or the key store could not be built.
    #[error("key configuration: {0}")]
    Key(#[from] CryptoError),

    /// A key entry names neither `private_key` nor `private_key_env`, or both.
    #[error("key for issuer {issuer:?} must set exactly one of private_key or private_key_env")]
    KeySource {
        /// Issuer of the offending key entry.
        issuer: String,
    },

    /// The environment variable holding a key is unset or not unicode.
    #[error("key for issuer {issuer:?}: environment variable {var} is not set")]
    MissingKeyEnv {
        /// Issuer of the offending key entry.
        issuer: String,
        /// Variable name.
        var: String,
    },

    /// Two templates share a type name.
    #[error("duplicate credential template type {0:?}")]
    DuplicateTemplate(String),

    /// A template declares no required and no optional fields.
    #[error("template {0:?} declares no fields")]
    DegenerateTemplate(String),

    /// A field is declared both required and optional.
    #[error("template {template:?}: field {field:?} is declared both required and optional")]
    OverlappingField {
        /// Template type name.
        template: String,
        /// Field name.
        field: String,
    },

    /// The subject field is not one of the template's declared fields.
    #[error("template {template:?}: subject field {field:?} must be a declared field")]
    InvalidSubjectField {
        /// Template type name.
        template: String,
        /// Declared subject field.
        field: String,
    },

    /// A declared field uses a name reserved for record metadata.
    #[error("template {template:?}: field name {field:?} is reserved")]
    ReservedField {
        /// Template type name.
        template: String,
        /// Field name.
        field: String,
    },

    /// The claim namespace is empty, malformed, or shadows a registered claim.
    #[error("template {template:?}: invalid claim namespace: {reason}")]
    InvalidNamespace {
        /// Template type name.
        template: String,
        /// What was wrong.
        reason: String,
    },

    /// An optional field's default does not coerce to the field's type.
    #[error("template {template:?}: default for field {field:?} is invalid: {reason}")]
    InvalidDefault {
        /// Template type name.
        template: String,
        /// Field name.
        field: String,
        /// Coercion failure.
        reason: String,
    },

    /// The template's validation rules are not a valid JSON Schema.
    #[error("template {template:?}: invalid validation rules: {reason}")]
    InvalidRules {
        /// Template type name.
        template: String,
        /// Schema compilation error.
        reason: String,
    },

    /// The configuration document could not be parsed.
    #[error("configuration parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Per-issuance failure. No token is ever produced alongside one of these.
#[derive(Error, Debug)]
pub enum IssuanceError {
    /// No template is registered under the requested type name.
    #[error("unknown credential type {0:?}")]
    UnknownCredentialType(String),

    /// A required field is absent (or null) in the subject record.
    #[error("missing required field {field:?} for credential type {template:?}")]
    MissingRequiredField {
        /// Field name.
        field: String,
        /// Template type name.
        template: String,
    },

    /// A value could not be coerced to the field's declared type.
    #[error("field {field:?}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Field name.
        field: String,
        /// Expected semantic type.
        expected: String,
        /// The offending value, rendered as JSON.
        actual: String,
    },

    /// The record carries a field the template does not declare.
    #[error("field {field:?} is not declared by credential type {template:?}")]
    UnknownField {
        /// Field name.
        field: String,
        /// Template type name.
        template: String,
    },

    /// The coerced claims violate the template's validation rules.
    #[error("credential type {template:?} rules violated: {}", violations.join("; "))]
    RuleViolation {
        /// Template type name.
        template: String,
        /// One entry per violation: `<instance path>: <message>`.
        violations: Vec<String>,
    },

    /// No active signing key for the vault's issuer identity.
    #[error("no signing key for issuer {0:?}")]
    NoSigningKey(String),

    /// The signing primitive failed.
    #[error("signing failed: {0}")]
    SigningFailure(String),

    /// The claim set could not be canonically encoded.
    #[error("claim encoding failed: {0}")]
    Encoding(String),
}

impl IssuanceError {
    /// Stable short name used in logs and batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownCredentialType(_) => "unknown_credential_type",
            Self::MissingRequiredField { .. } => "missing_required_field",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::UnknownField { .. } => "unknown_field",
            Self::RuleViolation { .. } => "rule_violation",
            Self::NoSigningKey(_) => "no_signing_key",
            Self::SigningFailure(_) => "signing_failure",
            Self::Encoding(_) => "encoding",
        }
    }
}

impl From<CanonicalizationError> for IssuanceError {
    fn from(e: CanonicalizationError) -> Self {
        Self::Encoding(e.to_string())
    }
}

impl From<CryptoError> for IssuanceError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::Encoding(inner) => Self::Encoding(inner.to_string()),
            other => Self::SigningFailure(other.to_string()),
        }
    }
}
