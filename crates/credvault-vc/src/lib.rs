//! # credvault-vc: Credential Issuance
//!
//! Turns untyped subject records into signed credentials.
//!
//! ## Components
//!
//! - [`TemplateCatalogue`] / [`CredentialTemplate`]: one validated template
//!   per credential type: required and optional fields, defaults, subject
//!   field, claim namespace, validity window, and optional JSON Schema rules.
//! - [`build_claims`]: coerces a [`SubjectRecord`] against a template and
//!   produces a complete [`ClaimSet`] or a precise [`IssuanceError`].
//! - [`Vault`]: owns the key store and the catalogue; issues single
//!   credentials and batches (sequential or rayon-parallel) with per-record
//!   failure reporting.
//!
//! ## Crate Policy
//!
//! - No file I/O. Configuration arrives as [`VaultConfig`].
//! - A token is only ever produced for a complete, type-correct claim set.
//! - No verification API: issuance only.

pub mod claims;
pub mod config;
pub mod error;
pub mod field;
pub mod template;
pub mod vault;

pub use claims::{build_claims, build_claims_at, ClaimSet, SubjectRecord};
pub use config::{KeyConfig, OptionalFieldConfig, TemplateConfig, VaultConfig, DEFAULT_NAMESPACE};
pub use error::{ConfigError, IssuanceError};
pub use field::FieldType;
pub use template::{CredentialTemplate, OptionalField, Rules, TemplateCatalogue, REGISTERED_CLAIMS};
pub use vault::{BatchFailure, BatchItem, BatchReport, IssuanceRequest, IssuedCredential, Vault};
