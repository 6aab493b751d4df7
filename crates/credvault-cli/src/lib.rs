//! # credvault-cli: Command-Line Front End
//!
//! Thin glue around `credvault-vc`: reads YAML/JSON files, builds the
//! vault, and prints results. All issuance logic lives in the library
//! crates.
//!
//! ```bash
//! credvault keygen --algorithm EdDSA --issuer acme-hr --output keys/
//! credvault issue --config vault.yaml --input records.yaml --output issued.jsonl
//! credvault templates --config vault.yaml
//! credvault jwks --config vault.yaml --issuer acme-hr
//! ```
//!
//! ## Exit codes
//!
//! - `0`: success.
//! - `1`: fatal error (unreadable files, invalid configuration).
//! - `2`: batch finished but some records failed.

pub mod issue;
pub mod jwks;
pub mod keygen;
pub mod templates;

use std::path::Path;

use anyhow::{Context, Result};
use credvault_vc::{Vault, VaultConfig};

/// Exit code for a batch with per-record failures.
pub const EXIT_PARTIAL: u8 = 2;

/// Read and parse a vault configuration file.
pub fn load_config(path: &Path) -> Result<VaultConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    VaultConfig::from_yaml_str(&text).with_context(|| format!("failed to parse config: {}", path.display()))
}

/// Read a configuration file and construct the vault from it.
pub fn load_vault(path: &Path) -> Result<Vault> {
    let config = load_config(path)?;
    Vault::new(config).with_context(|| format!("invalid vault configuration: {}", path.display()))
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::path::{Path, PathBuf};

    use credvault_core::IssuerId;
    use credvault_crypto::{KeyAlgorithm, SigningKey};

    /// Write a vault config with a fresh key for `acme-hr` and an
    /// `EmployeeCredential` template; returns its path.
    pub fn write_config(dir: &Path) -> PathBuf {
        let key = SigningKey::generate(IssuerId::new("acme-hr").unwrap(), KeyAlgorithm::EdDsa).unwrap();
        let yaml = format!(
            r#"issuer: acme-hr
keys:
  - issuer: acme-hr
    algorithm: EdDSA
    private_key: {}
templates:
  - type_name: EmployeeCredential
    subject_field: employeeID
    validity_secs: 31536000
    required:
      name: string
      employeeID: string
      hireDate: date
"#,
            key.secret_key_hex().as_str()
        );
        let path = dir.join("vault.yaml");
        std::fs::write(&path, yaml).unwrap();
        path
    }
}
