//! `credvault issue`: issue credentials for a file of subject records.
//!
//! The input is a YAML or JSON list:
//!
//! ```yaml
//! - credential_type: EmployeeCredential
//!   subject: { name: Ana Ruiz, employeeID: E-1023, hireDate: "2023-03-01" }
//! ```
//!
//! Each issued credential is written as one JSON line with `index`,
//! `credential_type`, `kid`, `token` and `claims`. Failed records are
//! reported on stderr and do not stop the batch.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use credvault_vc::{BatchItem, BatchReport, IssuanceRequest};
use serde_json::json;

use crate::{load_vault, EXIT_PARTIAL};

/// Arguments for `credvault issue`.
#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Vault configuration (YAML or JSON).
    #[arg(long, short)]
    pub config: PathBuf,
    /// Subject records (YAML or JSON list of `{credential_type, subject}`).
    #[arg(long, short)]
    pub input: PathBuf,
    /// Write JSON lines here instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    /// Issue on all CPU cores.
    #[arg(long)]
    pub parallel: bool,
}

/// Execute `credvault issue`.
pub fn run_issue(args: &IssueArgs) -> Result<u8> {
    let vault = load_vault(&args.config)?;
    let requests = load_requests(&args.input)?;
    tracing::info!(records = requests.len(), parallel = args.parallel, "issuing batch");

    let report = if args.parallel {
        vault.issue_batch_parallel(&requests)
    } else {
        vault.issue_batch(&requests)
    };

    match &args.output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("failed to create output: {}", path.display()))?;
            let mut out = std::io::BufWriter::new(file);
            write_lines(&mut out, &report.issued)?;
            out.flush().with_context(|| format!("failed to write output: {}", path.display()))?;
        }
        None => write_lines(&mut std::io::stdout().lock(), &report.issued)?,
    }

    print_failures(&report);
    Ok(if report.is_complete() { 0 } else { EXIT_PARTIAL })
}

/// Parse the records file.
pub fn load_requests(path: &Path) -> Result<Vec<IssuanceRequest>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read records: {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("failed to parse records: {}", path.display()))
}

fn write_lines(out: &mut impl Write, issued: &[BatchItem]) -> Result<()> {
    for item in issued {
        let line = json!({
            "index": item.index,
            "credential_type": item.credential.claims.credential_type,
            "kid": item.credential.key_id.as_str(),
            "token": item.credential.token,
            "claims": item.credential.claims.to_payload(),
        });
        writeln!(out, "{line}").context("failed to write issued credential")?;
    }
    Ok(())
}

fn print_failures(report: &BatchReport) {
    for failure in &report.failures {
        eprintln!(
            "FAILED: #{} record={} type={} kind={}: {}",
            failure.index,
            failure.record_id,
            failure.credential_type,
            failure.error.kind(),
            failure.error
        );
    }
    eprintln!(
        "{} issued, {} failed ({} records)",
        report.issued.len(),
        report.failures.len(),
        report.total()
    );
}
