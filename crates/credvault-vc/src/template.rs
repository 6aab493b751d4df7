//! # Credential Templates and the Template Catalogue
//!
//! A [`CredentialTemplate`] is a validated [`TemplateConfig`]: every check
//! that can fail does so at catalogue construction, never at issuance.
//!
//! ## Construction checks
//!
//! - At least one required or optional field.
//! - No field is both required and optional.
//! - The subject field is a declared field. An optional subject field
//!   falls back to its default.
//! - No field is named [`CREDENTIAL_ID_FIELD`], which a record uses to
//!   supply its own `jti`.
//! - The namespace is a non-empty dotted path whose first segment is not a
//!   registered claim name.
//! - Every optional default coerces to its declared type.
//! - Validation rules, when present, compile as a draft 2020-12 JSON Schema.
//! - Type names are unique within the catalogue.

use std::collections::{BTreeMap, HashMap};

use jsonschema::{Draft, Validator};
use serde_json::Value;

use crate::config::TemplateConfig;
use crate::error::ConfigError;
use crate::field::FieldType;

/// Claim names reserved for registered claims at the top level of a payload.
pub const REGISTERED_CLAIMS: &[&str] = &["iss", "sub", "aud", "exp", "nbf", "iat", "jti", "vct"];

/// Record key carrying a caller-supplied credential id.
pub const CREDENTIAL_ID_FIELD: &str = "jti";

/// An optional field: its type and the coerced default.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionalField {
    /// Declared type.
    pub field_type: FieldType,
    /// Default, already coerced to `field_type`.
    pub default: Value,
}

/// Compiled JSON Schema applied to a template's custom claims.
pub struct Rules {
    schema: Value,
    validator: Validator,
}

impl Rules {
    fn compile(template: &str, schema: Value) -> Result<Self, ConfigError> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&schema)
            .map_err(|e| ConfigError::InvalidRules {
                template: template.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { schema, validator })
    }

    /// The schema document as configured.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Every violation as `<instance path>: <message>`; empty when valid.
    pub fn violations(&self, instance: &Value) -> Vec<String> {
        self.validator
            .iter_errors(instance)
            .map(|e| format!("{}: {}", e.instance_path, e))
            .collect()
    }
}

impl PartialEq for Rules {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema
    }
}

impl std::fmt::Debug for Rules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rules").field("schema", &self.schema).finish_non_exhaustive()
    }
}

/// A validated credential template.
#[derive(Debug, PartialEq)]
pub struct CredentialTemplate {
    type_name: String,
    required: BTreeMap<String, FieldType>,
    optional: BTreeMap<String, OptionalField>,
    subject_field: String,
    namespace: Vec<String>,
    validity_secs: Option<u64>,
    allow_unknown_fields: bool,
    rules: Option<Rules>,
}

impl CredentialTemplate {
    /// Validate a template configuration.
    pub fn from_config(config: TemplateConfig) -> Result<Self, ConfigError> {
        let TemplateConfig {
            type_name,
            required,
            optional,
            subject_field,
            namespace,
            validity_secs,
            allow_unknown_fields,
            rules,
        } = config;

        if required.is_empty() && optional.is_empty() {
            return Err(ConfigError::DegenerateTemplate(type_name));
        }
        if let Some(field) = required.keys().find(|f| optional.contains_key(*f)) {
            return Err(ConfigError::OverlappingField {
                template: type_name.clone(),
                field: field.clone(),
            });
        }
        if let Some(field) = required
            .keys()
            .chain(optional.keys())
            .find(|f| f.as_str() == CREDENTIAL_ID_FIELD)
        {
            return Err(ConfigError::ReservedField {
                template: type_name.clone(),
                field: field.clone(),
            });
        }
        if !required.contains_key(&subject_field) && !optional.contains_key(&subject_field) {
            return Err(ConfigError::InvalidSubjectField {
                template: type_name,
                field: subject_field,
            });
        }
        let namespace = parse_namespace(&type_name, &namespace)?;

        let optional = optional
            .into_iter()
            .map(|(field, cfg)| {
                let default = cfg.field_type.coerce(&field, &cfg.default).map_err(|e| {
                    ConfigError::InvalidDefault {
                        template: type_name.clone(),
                        field: field.clone(),
                        reason: e.to_string(),
                    }
                })?;
                Ok((
                    field,
                    OptionalField {
                        field_type: cfg.field_type,
                        default,
                    },
                ))
            })
            .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;

        let rules = rules.map(|schema| Rules::compile(&type_name, schema)).transpose()?;

        Ok(Self {
            type_name,
            required,
            optional,
            subject_field,
            namespace,
            validity_secs,
            allow_unknown_fields,
            rules,
        })
    }

    /// Credential type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Required fields and their types.
    pub fn required(&self) -> &BTreeMap<String, FieldType> {
        &self.required
    }

    /// Optional fields with coerced defaults.
    pub fn optional(&self) -> &BTreeMap<String, OptionalField> {
        &self.optional
    }

    /// Declared field whose value becomes `sub`.
    pub fn subject_field(&self) -> &str {
        &self.subject_field
    }

    /// Namespace path segments, outermost first.
    pub fn namespace(&self) -> &[String] {
        &self.namespace
    }

    /// Validity window in seconds.
    pub fn validity_secs(&self) -> Option<u64> {
        self.validity_secs
    }

    /// Whether undeclared record fields pass through.
    pub fn allow_unknown_fields(&self) -> bool {
        self.allow_unknown_fields
    }

    /// Compiled validation rules.
    pub fn rules(&self) -> Option<&Rules> {
        self.rules.as_ref()
    }

    /// Whether `field` is declared required or optional.
    pub fn declares(&self, field: &str) -> bool {
        self.required.contains_key(field) || self.optional.contains_key(field)
    }
}

fn parse_namespace(template: &str, namespace: &str) -> Result<Vec<String>, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidNamespace {
        template: template.to_string(),
        reason,
    };
    let segments: Vec<String> = namespace.split('.').map(str::to_string).collect();
    if segments.iter().any(|s| s.trim().is_empty() || s.trim() != s) {
        return Err(invalid(format!("{namespace:?} must be a dotted path of non-empty names")));
    }
    if REGISTERED_CLAIMS.contains(&segments[0].as_str()) {
        return Err(invalid(format!("{:?} is a registered claim name", segments[0])));
    }
    Ok(segments)
}

/// Read-only set of templates keyed by type name.
#[derive(Debug, Default)]
pub struct TemplateCatalogue {
    templates: HashMap<String, CredentialTemplate>,
}

impl TemplateCatalogue {
    /// Build a catalogue, failing on duplicate type names.
    pub fn new(templates: impl IntoIterator<Item = CredentialTemplate>) -> Result<Self, ConfigError> {
        let mut map = HashMap::new();
        for template in templates {
            if map.contains_key(template.type_name()) {
                return Err(ConfigError::DuplicateTemplate(template.type_name));
            }
            map.insert(template.type_name.clone(), template);
        }
        Ok(Self { templates: map })
    }

    /// Validate and load template configurations.
    pub fn from_configs(configs: impl IntoIterator<Item = TemplateConfig>) -> Result<Self, ConfigError> {
        let templates = configs
            .into_iter()
            .map(CredentialTemplate::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(templates)
    }

    /// Template registered under `type_name`.
    pub fn resolve(&self, type_name: &str) -> Option<&CredentialTemplate> {
        self.templates.get(type_name)
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the catalogue holds no templates.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
