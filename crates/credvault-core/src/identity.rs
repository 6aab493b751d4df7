//! # Identifier Newtypes
//!
//! Newtype wrappers for the identifiers that cross the issuance pipeline.
//! You cannot pass a `KeyId` where an `IssuerId` is expected.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Identity of an issuing authority, placed in the `iss` claim.
///
/// Any non-empty string without surrounding whitespace or control
/// characters: a DID (`did:key:z6Mk...`), a URL, or a plain name such as
/// `acme-hr`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct IssuerId(String);

impl IssuerId {
    /// Validate and wrap an issuer identity.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        validate_token_like("issuer id", &id)?;
        Ok(Self(id))
    }

    /// Access the identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for IssuerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for IssuerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key identifier carried in the token header `kid`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct KeyId(String);

impl KeyId {
    /// Validate and wrap a key identifier.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        validate_token_like("key id", &id)?;
        Ok(Self(id))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for KeyId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for KeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier of an issued credential, placed in the `jti` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CredentialId(Uuid);

impl CredentialId {
    /// Generate a new random credential identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a `urn:uuid:` URN or a bare UUID.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let raw = s.strip_prefix("urn:uuid:").unwrap_or(s);
        Uuid::parse_str(raw).map(Self).map_err(|e| CoreError::InvalidIdentifier {
            kind: "credential id",
            reason: format!("{s:?} is not a UUID or urn:uuid: URN: {e}"),
        })
    }

    /// Render as a URN (`urn:uuid:...`).
    pub fn to_urn(&self) -> String {
        self.0.urn().to_string()
    }
}

impl Default for CredentialId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_urn())
    }
}

impl Serialize for CredentialId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_urn())
    }
}

impl<'de> Deserialize<'de> for CredentialId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

fn validate_token_like(kind: &'static str, id: &str) -> Result<(), CoreError> {
    if id.is_empty() {
        return Err(CoreError::InvalidIdentifier {
            kind,
            reason: "must not be empty".to_string(),
        });
    }
    if id.trim() != id {
        return Err(CoreError::InvalidIdentifier {
            kind,
            reason: format!("must not have surrounding whitespace: {id:?}"),
        });
    }
    if id.chars().any(char::is_control) {
        return Err(CoreError::InvalidIdentifier {
            kind,
            reason: format!("must not contain control characters: {id:?}"),
        });
    }
    Ok(())
}
