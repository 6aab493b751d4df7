//! `credvault keygen`: generate a signing key pair.
//!
//! Writes `<prefix>.key` (hex secret) and `<prefix>.pub` (hex public key)
//! and prints a `keys:` entry ready to paste into a vault configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use credvault_core::IssuerId;
use credvault_crypto::{KeyAlgorithm, SigningKey};

/// Arguments for `credvault keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Signature algorithm: EdDSA or ES256.
    #[arg(long, short, default_value = "EdDSA")]
    pub algorithm: KeyAlgorithm,
    /// Issuer identity the key signs for.
    #[arg(long)]
    pub issuer: String,
    /// Output directory for the key files.
    #[arg(long, short, default_value = ".")]
    pub output: PathBuf,
    /// Prefix for the key filenames.
    #[arg(long, default_value = "credvault")]
    pub prefix: String,
}

/// Execute `credvault keygen`.
pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    let issuer = IssuerId::new(args.issuer.as_str()).context("invalid --issuer")?;
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create output directory: {}", args.output.display()))?;

    let key = SigningKey::generate(issuer, args.algorithm).context("key generation failed")?;
    let (key_path, pub_path) = write_key_files(&key, &args.output, &args.prefix)?;

    println!("OK: generated {} key for {}", key.algorithm(), key.issuer());
    println!("  Private key: {}", key_path.display());
    println!("  Public key:  {}", pub_path.display());
    println!();
    print!("{}", config_snippet(&key, &key_path));
    Ok(0)
}

fn write_key_files(key: &SigningKey, dir: &Path, prefix: &str) -> Result<(PathBuf, PathBuf)> {
    let key_path = dir.join(format!("{prefix}.key"));
    let pub_path = dir.join(format!("{prefix}.pub"));
    std::fs::write(&key_path, key.secret_key_hex().as_bytes())
        .with_context(|| format!("failed to write private key: {}", key_path.display()))?;
    std::fs::write(&pub_path, key.public_key_hex())
        .with_context(|| format!("failed to write public key: {}", pub_path.display()))?;
    Ok((key_path, pub_path))
}

/// YAML `keys:` entry for the generated key. The secret is referenced via
/// an environment variable, never inlined.
fn config_snippet(key: &SigningKey, key_path: &Path) -> String {
    let var = env_var_name(key.issuer().as_str());
    format!(
        "# export {var}=$(cat {path})\nkeys:\n  - issuer: {issuer:?}\n    algorithm: {alg}\n    kid: \"{kid}\"\n    public_key: \"{public}\"\n    private_key_env: {var}\n",
        path = key_path.display(),
        issuer = key.issuer().as_str(),
        alg = key.algorithm(),
        kid = key.kid(),
        public = key.public_key_hex(),
    )
}

fn env_var_name(issuer: &str) -> String {
    let mut name: String = issuer
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    name.push_str("_SIGNING_KEY");
    name
}
