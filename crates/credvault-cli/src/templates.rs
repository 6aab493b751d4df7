//! `credvault templates`: list the catalogue.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use credvault_vc::CredentialTemplate;

use crate::load_vault;

/// Arguments for `credvault templates`.
#[derive(Args, Debug)]
pub struct TemplatesArgs {
    /// Vault configuration (YAML or JSON).
    #[arg(long, short)]
    pub config: PathBuf,
}

/// Execute `credvault templates`.
pub fn run_templates(args: &TemplatesArgs) -> Result<u8> {
    let vault = load_vault(&args.config)?;
    let catalogue = vault.catalogue();
    for name in catalogue.type_names() {
        if let Some(template) = catalogue.resolve(name) {
            println!("{}", describe(template));
        }
    }
    Ok(0)
}

fn describe(template: &CredentialTemplate) -> String {
    let required: Vec<String> = template
        .required()
        .iter()
        .map(|(field, ty)| format!("{field}:{ty}"))
        .collect();
    let optional: Vec<String> = template
        .optional()
        .iter()
        .map(|(field, opt)| format!("{field}:{}={}", opt.field_type, opt.default))
        .collect();
    let mut line = format!(
        "{}\n  subject:   {}\n  namespace: {}\n  required:  {}",
        template.type_name(),
        template.subject_field(),
        template.namespace().join("."),
        required.join(", ")
    );
    if !optional.is_empty() {
        line.push_str(&format!("\n  optional:  {}", optional.join(", ")));
    }
    if let Some(secs) = template.validity_secs() {
        line.push_str(&format!("\n  validity:  {secs}s"));
    }
    if template.allow_unknown_fields() {
        line.push_str("\n  unknown fields pass through");
    }
    if template.rules().is_some() {
        line.push_str("\n  rules:     JSON Schema");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::write_config;

    #[test]
    fn lists_templates() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_config(dir.path());
        assert_eq!(run_templates(&TemplatesArgs { config: config.clone() }).unwrap(), 0);

        let vault = load_vault(&config).unwrap();
        let text = describe(vault.catalogue().resolve("EmployeeCredential").unwrap());
        assert!(text.starts_with("EmployeeCredential\n"));
        assert!(text.contains("subject:   employeeID"));
        assert!(text.contains("namespace: vc.credentialSubject"));
        assert!(text.contains("employeeID:string, hireDate:date, name:string"));
        assert!(text.contains("validity:  31536000s"));
    }
}
