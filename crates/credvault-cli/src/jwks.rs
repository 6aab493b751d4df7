//! `credvault jwks`: print the public JWK Set verifiers need.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use credvault_core::IssuerId;

use crate::load_vault;

/// Arguments for `credvault jwks`.
#[derive(Args, Debug)]
pub struct JwksArgs {
    /// Vault configuration (YAML or JSON).
    #[arg(long, short)]
    pub config: PathBuf,
    /// Only keys of this issuer.
    #[arg(long)]
    pub issuer: Option<String>,
}

/// Execute `credvault jwks`.
pub fn run_jwks(args: &JwksArgs) -> Result<u8> {
    println!("{}", render_jwks(args)?);
    Ok(0)
}

fn render_jwks(args: &JwksArgs) -> Result<String> {
    let vault = load_vault(&args.config)?;
    let issuer = args
        .issuer
        .as_deref()
        .map(IssuerId::new)
        .transpose()
        .context("invalid --issuer")?;
    let jwks = vault.jwks(issuer.as_ref());
    serde_json::to_string_pretty(&jwks).context("failed to serialize JWK Set")
}
