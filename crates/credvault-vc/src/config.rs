//! # Vault Configuration
//!
//! Already-parsed inputs for [`Vault::new()`](crate::Vault::new): the vault's
//! own issuer identity, signing keys, and credential templates. Nothing here
//! reads files. [`VaultConfig::from_yaml_str()`] exists for callers that
//! already hold the document text.
//!
//! ```yaml
//! issuer: acme-hr
//! keys:
//!   - issuer: acme-hr
//!     algorithm: EdDSA
//!     private_key_env: ACME_HR_SIGNING_KEY
//! templates:
//!   - type_name: EmployeeCredential
//!     subject_field: employeeID
//!     validity_secs: 31536000
//!     required:
//!       name: string
//!       employeeID: string
//!       hireDate: date
//!     optional:
//!       department: { type: string, default: "unassigned" }
//! ```

use std::collections::BTreeMap;

use credvault_core::{IssuerId, KeyId};
use credvault_crypto::{KeyAlgorithm, SigningKey};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ConfigError;
use crate::field::FieldType;

/// Claim namespace used when a template does not declare one.
pub const DEFAULT_NAMESPACE: &str = "vc.credentialSubject";

/// Top-level vault configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Identity the vault issues under (`iss`).
    pub issuer: IssuerId,
    /// Signing keys, one active key per issuer.
    pub keys: Vec<KeyConfig>,
    /// Credential templates.
    #[serde(default)]
    pub templates: Vec<TemplateConfig>,
}

impl VaultConfig {
    /// Parse a YAML (or JSON) configuration document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// One signing key.
///
/// Custom `Debug` redacts `private_key`.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyConfig {
    /// Issuer the key signs for.
    pub issuer: IssuerId,
    /// Signature algorithm.
    pub algorithm: KeyAlgorithm,
    /// Hex-encoded 32-byte secret.
    #[serde(default)]
    pub private_key: Option<String>,
    /// Name of an environment variable holding the hex-encoded secret.
    #[serde(default)]
    pub private_key_env: Option<String>,
    /// Expected public key (hex); checked against the private key when set.
    #[serde(default)]
    pub public_key: Option<String>,
    /// Key id; defaults to the RFC 7638 JWK thumbprint.
    #[serde(default)]
    pub kid: Option<KeyId>,
}

impl KeyConfig {
    /// Resolve the key material, reading `private_key_env` from the process
    /// environment when set.
    pub fn load(&self) -> Result<SigningKey, ConfigError> {
        self.load_with_env(|var| std::env::var(var).ok())
    }

    /// Resolve the key material with a caller-supplied environment lookup.
    pub fn load_with_env(&self, env: impl Fn(&str) -> Option<String>) -> Result<SigningKey, ConfigError> {
        let secret = match (&self.private_key, &self.private_key_env) {
            (Some(hex), None) => hex.clone(),
            (None, Some(var)) => env(var).ok_or_else(|| ConfigError::MissingKeyEnv {
                issuer: self.issuer.to_string(),
                var: var.clone(),
            })?,
            _ => {
                return Err(ConfigError::KeySource {
                    issuer: self.issuer.to_string(),
                })
            }
        };
        let key = SigningKey::from_secret_hex(self.issuer.clone(), self.algorithm, &secret, self.kid.clone())?;
        if let Some(public) = &self.public_key {
            key.check_public_hex(public)?;
        }
        Ok(key)
    }
}

impl std::fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyConfig")
            .field("issuer", &self.issuer)
            .field("algorithm", &self.algorithm)
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .field("private_key_env", &self.private_key_env)
            .field("public_key", &self.public_key)
            .field("kid", &self.kid)
            .finish()
    }
}

/// One credential template, before validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateConfig {
    /// Credential type name; also emitted as the `vct` claim.
    pub type_name: String,
    /// Required fields and their types.
    #[serde(default)]
    pub required: BTreeMap<String, FieldType>,
    /// Optional fields with defaults.
    #[serde(default)]
    pub optional: BTreeMap<String, OptionalFieldConfig>,
    /// Declared field whose value (or default) becomes the `sub` claim.
    pub subject_field: String,
    /// Dotted path under which custom claims are nested.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Seconds from `iat` to `exp`; no `exp` claim when absent.
    #[serde(default)]
    pub validity_secs: Option<u64>,
    /// Copy undeclared record fields into the claims instead of rejecting them.
    #[serde(default)]
    pub allow_unknown_fields: bool,
    /// JSON Schema (draft 2020-12) applied to the coerced custom claims.
    #[serde(default)]
    pub rules: Option<Value>,
}

/// An optional field's type and default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionalFieldConfig {
    /// Field type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Value used when the record omits the field.
    #[serde(default)]
    pub default: Value,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
    const PUBLIC: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";

    fn key_config() -> KeyConfig {
        KeyConfig {
            issuer: IssuerId::new("acme-hr").unwrap(),
            algorithm: KeyAlgorithm::EdDsa,
            private_key: Some(SECRET.to_string()),
            private_key_env: None,
            public_key: None,
            kid: None,
        }
    }

    #[test]
    fn parses_full_document() {
        let yaml = r#"
issuer: acme-hr
keys:
  - issuer: acme-hr
    algorithm: EdDSA
    private_key: 9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60
templates:
  - type_name: EmployeeCredential
    subject_field: employeeID
    validity_secs: 3600
    required:
      name: string
      employeeID: string
      hireDate: date
    optional:
      department: { type: string, default: unassigned }
"#;
        let cfg = VaultConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.issuer.as_str(), "acme-hr");
        assert_eq!(cfg.keys[0].algorithm, KeyAlgorithm::EdDsa);
        let t = &cfg.templates[0];
        assert_eq!(t.namespace, DEFAULT_NAMESPACE);
        assert_eq!(t.required["hireDate"], FieldType::Date);
        assert_eq!(t.optional["department"].default, Value::String("unassigned".to_string()));
        assert!(!t.allow_unknown_fields);
        assert!(t.rules.is_none());
    }

    #[test]
    fn unknown_keys_rejected() {
        let yaml = "issuer: acme-hr\nkeys: []\nsigner: nope\n";
        assert!(matches!(VaultConfig::from_yaml_str(yaml), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn empty_issuer_rejected() {
        let yaml = "issuer: ''\nkeys: []\n";
        assert!(VaultConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn load_inline_key() {
        let key = key_config().load().unwrap();
        assert_eq!(key.public_key_hex(), PUBLIC);
    }

    #[test]
    fn load_key_from_env_lookup() {
        let cfg = KeyConfig {
            private_key: None,
            private_key_env: Some("ACME_HR_KEY".to_string()),
            ..key_config()
        };
        let key = cfg
            .load_with_env(|var| (var == "ACME_HR_KEY").then(|| SECRET.to_string()))
            .unwrap();
        assert_eq!(key.public_key_hex(), PUBLIC);

        let err = cfg.load_with_env(|_| None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKeyEnv { ref var, .. } if var == "ACME_HR_KEY"));
    }

    #[test]
    fn exactly_one_key_source() {
        let both = KeyConfig {
            private_key_env: Some("X".to_string()),
            ..key_config()
        };
        assert!(matches!(both.load(), Err(ConfigError::KeySource { .. })));
        let neither = KeyConfig {
            private_key: None,
            ..key_config()
        };
        assert!(matches!(neither.load(), Err(ConfigError::KeySource { .. })));
    }

    #[test]
    fn public_key_must_match() {
        let good = KeyConfig {
            public_key: Some(PUBLIC.to_string()),
            ..key_config()
        };
        assert!(good.load().is_ok());
        let bad = KeyConfig {
            public_key: Some("00".repeat(32)),
            ..key_config()
        };
        assert!(matches!(bad.load(), Err(ConfigError::Key(_))));
    }

    #[test]
    fn debug_redacts_private_key() {
        let debug = format!("{:?}", key_config());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(SECRET));
    }
}
