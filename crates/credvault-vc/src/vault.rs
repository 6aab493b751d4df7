//! # Vault: the Issuing Authority
//!
//! Owns the [`KeyStore`] and [`TemplateCatalogue`] and exposes issuance:
//!
//! ```text
//! issue(type, record)
//!   → catalogue.resolve(type)          UnknownCredentialType
//!   → build_claims(template, record)   MissingRequiredField | TypeMismatch | UnknownField | RuleViolation
//!   → keys.current_key(vault issuer)   NoSigningKey
//!   → CanonicalBytes(payload)          Encoding
//!   → encode_compact(key, payload)     SigningFailure
//! ```
//!
//! The vault holds no per-call mutable state. Templates are read-only after
//! construction; keys change only through [`Vault::rotate_key()`], which is
//! an atomic swap inside the key store. `&Vault` is therefore safe to share
//! across threads, which [`Vault::issue_batch_parallel()`] relies on.

use credvault_core::{CanonicalBytes, IssuerId, KeyId};
use credvault_crypto::{encode_compact, CryptoError, JwkSet, KeyStore, SigningKey};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::claims::{build_claims, ClaimSet, SubjectRecord};
use crate::config::VaultConfig;
use crate::error::{ConfigError, IssuanceError};
use crate::template::TemplateCatalogue;

/// A signed credential.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedCredential {
    /// The claims that were signed.
    pub claims: ClaimSet,
    /// Compact JWS.
    pub token: String,
    /// Id of the key that signed `token`.
    pub key_id: KeyId,
}

/// One entry of a batch: which template to use and the subject data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IssuanceRequest {
    /// Template type name.
    pub credential_type: String,
    /// Subject attributes.
    pub subject: SubjectRecord,
}

impl IssuanceRequest {
    /// Pair a credential type with a record.
    pub fn new(credential_type: impl Into<String>, subject: SubjectRecord) -> Self {
        Self {
            credential_type: credential_type.into(),
            subject,
        }
    }
}

/// A successfully issued batch entry.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Position of the request in the input.
    pub index: usize,
    /// The issued credential.
    pub credential: IssuedCredential,
}

/// A failed batch entry.
#[derive(Debug)]
pub struct BatchFailure {
    /// Position of the request in the input.
    pub index: usize,
    /// Subject field value when present, else `#<index>`.
    pub record_id: String,
    /// Requested credential type.
    pub credential_type: String,
    /// Why issuance failed.
    pub error: IssuanceError,
}

/// Outcome of a batch, both lists in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Issued credentials.
    pub issued: Vec<BatchItem>,
    /// Per-record failures.
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    /// Number of requests processed.
    pub fn total(&self) -> usize {
        self.issued.len() + self.failures.len()
    }

    /// Whether every request was issued.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The issuing authority.
#[derive(Debug)]
pub struct Vault {
    issuer: IssuerId,
    keys: KeyStore,
    catalogue: TemplateCatalogue,
}

impl Vault {
    /// Validate every key and template and build the vault.
    ///
    /// Nothing is partially loaded: any malformed key or template fails the
    /// whole construction.
    pub fn new(config: VaultConfig) -> Result<Self, ConfigError> {
        let keys = config
            .keys
            .iter()
            .map(|k| k.load())
            .collect::<Result<Vec<_>, _>>()?;
        let keys = KeyStore::new(keys)?;
        let catalogue = TemplateCatalogue::from_configs(config.templates)?;
        Ok(Self::from_parts(config.issuer, keys, catalogue))
    }

    /// Assemble a vault from an already-built key store and catalogue.
    pub fn from_parts(issuer: IssuerId, keys: KeyStore, catalogue: TemplateCatalogue) -> Self {
        if keys.current_key(&issuer).is_none() {
            tracing::warn!(issuer = %issuer, "vault issuer has no signing key; issuance will fail");
        }
        tracing::info!(
            issuer = %issuer,
            keys = keys.len(),
            templates = catalogue.len(),
            "vault ready"
        );
        Self {
            issuer,
            keys,
            catalogue,
        }
    }

    /// Identity credentials are issued under.
    pub fn issuer(&self) -> &IssuerId {
        &self.issuer
    }

    /// The template catalogue.
    pub fn catalogue(&self) -> &TemplateCatalogue {
        &self.catalogue
    }

    /// The key store.
    pub fn key_store(&self) -> &KeyStore {
        &self.keys
    }

    /// Public keys for `issuer`, or for every issuer when `None`.
    pub fn jwks(&self, issuer: Option<&IssuerId>) -> JwkSet {
        self.keys.jwks(issuer)
    }

    /// Replace the active key for `key.issuer()`. Issuances already holding
    /// the old key finish with it; later ones use the new key.
    pub fn rotate_key(&self, key: SigningKey) -> Result<KeyId, CryptoError> {
        let retired = self.keys.rotate(key)?;
        Ok(retired.kid().clone())
    }

    /// Issue one credential.
    pub fn issue(&self, credential_type: &str, record: &SubjectRecord) -> Result<IssuedCredential, IssuanceError> {
        let template = self
            .catalogue
            .resolve(credential_type)
            .ok_or_else(|| IssuanceError::UnknownCredentialType(credential_type.to_string()))?;
        let claims = build_claims(template, record, &self.issuer)?;
        let key = self
            .keys
            .current_key(&self.issuer)
            .ok_or_else(|| IssuanceError::NoSigningKey(self.issuer.to_string()))?;
        let payload = CanonicalBytes::new(&claims)?;
        let token = encode_compact(&key, &payload)?;

        tracing::debug!(
            credential_type,
            jti = %claims.credential_id,
            sub = %claims.subject,
            kid = %key.kid(),
            "issued credential"
        );
        Ok(IssuedCredential {
            claims,
            token,
            key_id: key.kid().clone(),
        })
    }

    /// Issue a batch sequentially. Failures are logged and reported; they
    /// never stop the batch.
    pub fn issue_batch(&self, requests: &[IssuanceRequest]) -> BatchReport {
        let results = requests
            .iter()
            .enumerate()
            .map(|(index, request)| (index, self.issue(&request.credential_type, &request.subject)));
        self.collect_report(requests, results)
    }

    /// Issue a batch on the rayon thread pool. Same reporting as
    /// [`Vault::issue_batch()`], still in input order.
    pub fn issue_batch_parallel(&self, requests: &[IssuanceRequest]) -> BatchReport {
        let results: Vec<_> = requests
            .par_iter()
            .enumerate()
            .map(|(index, request)| (index, self.issue(&request.credential_type, &request.subject)))
            .collect();
        self.collect_report(requests, results)
    }

    fn collect_report(
        &self,
        requests: &[IssuanceRequest],
        results: impl IntoIterator<Item = (usize, Result<IssuedCredential, IssuanceError>)>,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        for (index, result) in results {
            match result {
                Ok(credential) => report.issued.push(BatchItem { index, credential }),
                Err(error) => {
                    let request = &requests[index];
                    let record_id = self.record_id(index, request);
                    tracing::warn!(
                        index,
                        record_id = %record_id,
                        credential_type = %request.credential_type,
                        error_kind = error.kind(),
                        error = %error,
                        "credential issuance failed"
                    );
                    report.failures.push(BatchFailure {
                        index,
                        record_id,
                        credential_type: request.credential_type.clone(),
                        error,
                    });
                }
            }
        }
        tracing::info!(
            total = report.total(),
            issued = report.issued.len(),
            failed = report.failures.len(),
            "batch complete"
        );
        report
    }

    fn record_id(&self, index: usize, request: &IssuanceRequest) -> String {
        self.catalogue
            .resolve(&request.credential_type)
            .and_then(|t| request.subject.get(t.subject_field()))
            .map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| format!("#{index}"))
    }
}
