//! # Claim Construction
//!
//! Merges an untyped [`SubjectRecord`] with a [`CredentialTemplate`] into a
//! [`ClaimSet`]. A `ClaimSet` that comes back `Ok` is complete and
//! type-correct for its template; partial claim sets are never returned.
//!
//! ## Payload layout
//!
//! ```json
//! {
//!   "iss": "acme-hr",
//!   "sub": "E-1023",
//!   "iat": 1767225600,
//!   "nbf": 1767225600,
//!   "exp": 1798761600,
//!   "jti": "urn:uuid:…",
//!   "vct": "EmployeeCredential",
//!   "vc": { "credentialSubject": { "employeeID": "E-1023", "hireDate": "2023-03-01", "name": "Ana Ruiz" } }
//! }
//! ```
//!
//! Custom claims always sit under the template namespace, which cannot start
//! with a registered claim name, so they never collide with registered claims.
//!
//! ## Record conventions
//!
//! - JSON `null` counts as absent for every field, declared or not.
//! - A top-level `jti` (`urn:uuid:` URN or bare UUID) becomes the registered
//!   `jti` claim and never a custom claim. Without one a fresh v4 id is used.

use std::collections::BTreeMap;

use credvault_core::canonical::reject_floats;
use credvault_core::{CredentialId, IssuerId, Timestamp};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::IssuanceError;
use crate::template::{CredentialTemplate, CREDENTIAL_ID_FIELD};

/// Untyped subject attributes supplied per issuance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectRecord(Map<String, Value>);

impl SubjectRecord {
    /// Empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON object; `None` for any other JSON value.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Set a field, returning the record for chaining.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Value of `field`, treating JSON `null` as absent.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    /// Field names in the record.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// All entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for SubjectRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Registered and custom claims of one credential.
///
/// Serializes as the token payload (see the module docs for the layout).
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimSet {
    /// `iss`.
    pub issuer: IssuerId,
    /// `sub`: the value of the template's subject field.
    pub subject: String,
    /// `iat`, also emitted as `nbf`.
    pub issued_at: Timestamp,
    /// `exp`, when the template has a validity window.
    pub expires_at: Option<Timestamp>,
    /// `jti`.
    pub credential_id: CredentialId,
    /// `vct`: the template type name.
    pub credential_type: String,
    /// Namespace path for custom claims.
    pub namespace: Vec<String>,
    /// Coerced custom claims.
    pub custom: BTreeMap<String, Value>,
}

impl ClaimSet {
    /// The JSON payload that gets signed.
    pub fn to_payload(&self) -> Value {
        let mut payload = Map::new();
        payload.insert("iss".to_string(), Value::String(self.issuer.to_string()));
        payload.insert("sub".to_string(), Value::String(self.subject.clone()));
        payload.insert("iat".to_string(), Value::from(self.issued_at.epoch_secs()));
        payload.insert("nbf".to_string(), Value::from(self.issued_at.epoch_secs()));
        if let Some(exp) = self.expires_at {
            payload.insert("exp".to_string(), Value::from(exp.epoch_secs()));
        }
        payload.insert("jti".to_string(), Value::String(self.credential_id.to_urn()));
        payload.insert("vct".to_string(), Value::String(self.credential_type.clone()));

        let mut nested = Value::Object(self.custom.clone().into_iter().collect());
        for segment in self.namespace.iter().skip(1).rev() {
            let mut wrapper = Map::new();
            wrapper.insert(segment.clone(), nested);
            nested = Value::Object(wrapper);
        }
        let root = self.namespace.first().cloned().unwrap_or_default();
        payload.insert(root, nested);
        Value::Object(payload)
    }

    /// Custom claim by field name.
    pub fn custom_claim(&self, field: &str) -> Option<&Value> {
        self.custom.get(field)
    }
}

impl Serialize for ClaimSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_payload().serialize(serializer)
    }
}

/// Build a claim set issued now.
pub fn build_claims(
    template: &CredentialTemplate,
    record: &SubjectRecord,
    issuer: &IssuerId,
) -> Result<ClaimSet, IssuanceError> {
    build_claims_at(template, record, issuer, Timestamp::now())
}

/// Build a claim set with an explicit issuance time.
pub fn build_claims_at(
    template: &CredentialTemplate,
    record: &SubjectRecord,
    issuer: &IssuerId,
    issued_at: Timestamp,
) -> Result<ClaimSet, IssuanceError> {
    let credential_id = credential_id(record)?;
    let mut custom = BTreeMap::new();

    for (field, field_type) in template.required() {
        let value = record.get(field).ok_or_else(|| IssuanceError::MissingRequiredField {
            field: field.clone(),
            template: template.type_name().to_string(),
        })?;
        custom.insert(field.clone(), field_type.coerce(field, value)?);
    }

    for (field, optional) in template.optional() {
        let value = match record.get(field) {
            Some(value) => optional.field_type.coerce(field, value)?,
            None => optional.default.clone(),
        };
        custom.insert(field.clone(), value);
    }

    for (field, value) in record.iter() {
        if template.declares(field) || field == CREDENTIAL_ID_FIELD || value.is_null() {
            continue;
        }
        if !template.allow_unknown_fields() {
            return Err(IssuanceError::UnknownField {
                field: field.clone(),
                template: template.type_name().to_string(),
            });
        }
        reject_floats(value).map_err(|_| IssuanceError::TypeMismatch {
            field: field.clone(),
            expected: "integer-only JSON".to_string(),
            actual: value.to_string(),
        })?;
        custom.insert(field.clone(), value.clone());
    }

    if let Some(rules) = template.rules() {
        let instance = Value::Object(custom.clone().into_iter().collect());
        let violations = rules.violations(&instance);
        if !violations.is_empty() {
            return Err(IssuanceError::RuleViolation {
                template: template.type_name().to_string(),
                violations,
            });
        }
    }

    let subject = match custom.get(template.subject_field()) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => {
            return Err(IssuanceError::MissingRequiredField {
                field: template.subject_field().to_string(),
                template: template.type_name().to_string(),
            })
        }
    };

    Ok(ClaimSet {
        issuer: issuer.clone(),
        subject,
        issued_at,
        expires_at: template.validity_secs().map(|secs| issued_at.plus_secs(secs)),
        credential_id,
        credential_type: template.type_name().to_string(),
        namespace: template.namespace().to_vec(),
        custom,
    })
}

fn credential_id(record: &SubjectRecord) -> Result<CredentialId, IssuanceError> {
    let Some(value) = record.get(CREDENTIAL_ID_FIELD) else {
        return Ok(CredentialId::new());
    };
    value
        .as_str()
        .and_then(|s| CredentialId::parse(s).ok())
        .ok_or_else(|| IssuanceError::TypeMismatch {
            field: CREDENTIAL_ID_FIELD.to_string(),
            expected: "urn:uuid or UUID".to_string(),
            actual: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OptionalFieldConfig, TemplateConfig, DEFAULT_NAMESPACE};
    use crate::field::FieldType;
    use serde_json::json;

    fn template(allow_unknown: bool) -> CredentialTemplate {
        CredentialTemplate::from_config(TemplateConfig {
            type_name: "EmployeeCredential".to_string(),
            required: BTreeMap::from([
                ("name".to_string(), FieldType::String),
                ("employeeID".to_string(), FieldType::String),
                ("hireDate".to_string(), FieldType::Date),
            ]),
            optional: BTreeMap::from([(
                "grade".to_string(),
                OptionalFieldConfig {
                    field_type: FieldType::Number,
                    default: json!(1),
                },
            )]),
            subject_field: "employeeID".to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            validity_secs: Some(3600),
            allow_unknown_fields: allow_unknown,
            rules: None,
        })
        .unwrap()
    }

    fn ana() -> SubjectRecord {
        SubjectRecord::new()
            .with("name", "Ana Ruiz")
            .with("employeeID", "E-1023")
            .with("hireDate", "2023-03-01")
    }

    fn issuer() -> IssuerId {
        IssuerId::new("acme-hr").unwrap()
    }

    fn at() -> Timestamp {
        Timestamp::parse("2026-01-01T00:00:00Z").unwrap()
    }

    #[test]
    fn builds_registered_and_custom_claims() {
        let claims = build_claims_at(&template(false), &ana(), &issuer(), at()).unwrap();
        assert_eq!(claims.issuer, issuer());
        assert_eq!(claims.subject, "E-1023");
        assert_eq!(claims.issued_at, at());
        assert_eq!(claims.expires_at, Some(at().plus_secs(3600)));
        assert_eq!(claims.credential_type, "EmployeeCredential");
        assert_eq!(claims.custom_claim("grade"), Some(&json!(1)));
        assert_eq!(claims.custom.len(), 4);
    }

    #[test]
    fn payload_layout() {
        let claims = build_claims_at(&template(false), &ana(), &issuer(), at()).unwrap();
        let payload = claims.to_payload();
        let iat = at().epoch_secs();
        assert_eq!(payload["iss"], "acme-hr");
        assert_eq!(payload["sub"], "E-1023");
        assert_eq!(payload["iat"], iat);
        assert_eq!(payload["nbf"], iat);
        assert_eq!(payload["exp"], iat + 3600);
        assert_eq!(payload["vct"], "EmployeeCredential");
        assert!(payload["jti"].as_str().unwrap().starts_with("urn:uuid:"));
        assert_eq!(
            payload["vc"]["credentialSubject"],
            json!({"name": "Ana Ruiz", "employeeID": "E-1023", "hireDate": "2023-03-01", "grade": 1})
        );
        assert_eq!(payload.as_object().unwrap().len(), 8);
        assert_eq!(serde_json::to_value(&claims).unwrap(), payload);
    }

    #[test]
    fn no_exp_without_validity_window() {
        let base = template(false);
        let no_window = CredentialTemplate::from_config(TemplateConfig {
            type_name: base.type_name().to_string(),
            required: base.required().clone(),
            optional: BTreeMap::new(),
            subject_field: "employeeID".to_string(),
            namespace: "claims".to_string(),
            validity_secs: None,
            allow_unknown_fields: false,
            rules: None,
        })
        .unwrap();
        let payload = build_claims_at(&no_window, &ana(), &issuer(), at()).unwrap().to_payload();
        assert!(payload.get("exp").is_none());
        assert_eq!(payload["claims"]["name"], "Ana Ruiz");
    }

    #[test]
    fn missing_required_field() {
        let mut record = ana();
        record.0.remove("hireDate");
        match build_claims_at(&template(false), &record, &issuer(), at()) {
            Err(IssuanceError::MissingRequiredField { field, template }) => {
                assert_eq!(field, "hireDate");
                assert_eq!(template, "EmployeeCredential");
            }
            other => panic!("expected MissingRequiredField, got {other:?}"),
        }
    }

    #[test]
    fn null_counts_as_missing() {
        let record = ana().with("hireDate", Value::Null);
        assert!(matches!(
            build_claims_at(&template(false), &record, &issuer(), at()),
            Err(IssuanceError::MissingRequiredField { .. })
        ));
    }

    #[test]
    fn type_mismatch_names_field() {
        let record = ana().with("hireDate", "next tuesday");
        match build_claims_at(&template(false), &record, &issuer(), at()) {
            Err(IssuanceError::TypeMismatch { field, expected, actual }) => {
                assert_eq!(field, "hireDate");
                assert_eq!(expected, "date");
                assert_eq!(actual, "\"next tuesday\"");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn optional_field_supplied_is_coerced() {
        let record = ana().with("grade", "7");
        let claims = build_claims_at(&template(false), &record, &issuer(), at()).unwrap();
        assert_eq!(claims.custom_claim("grade"), Some(&json!(7)));
    }

    #[test]
    fn unknown_field_rejected_by_default() {
        let record = ana().with("salary", 100_000);
        assert!(matches!(
            build_claims_at(&template(false), &record, &issuer(), at()),
            Err(IssuanceError::UnknownField { ref field, .. }) if field == "salary"
        ));
    }

    #[test]
    fn unknown_field_passes_through_when_allowed() {
        let record = ana().with("badge", json!({"floor": 3}));
        let claims = build_claims_at(&template(true), &record, &issuer(), at()).unwrap();
        assert_eq!(claims.custom_claim("badge"), Some(&json!({"floor": 3})));
    }

    #[test]
    fn pass_through_floats_rejected() {
        let record = ana().with("gpa", 3.7);
        assert!(matches!(
            build_claims_at(&template(true), &record, &issuer(), at()),
            Err(IssuanceError::TypeMismatch { ref field, .. }) if field == "gpa"
        ));
    }

    #[test]
    fn rules_are_enforced() {
        let t = CredentialTemplate::from_config(TemplateConfig {
            type_name: "EmployeeCredential".to_string(),
            required: BTreeMap::from([("employeeID".to_string(), FieldType::String)]),
            optional: BTreeMap::new(),
            subject_field: "employeeID".to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            validity_secs: None,
            allow_unknown_fields: false,
            rules: Some(json!({"properties": {"employeeID": {"pattern": "^E-[0-9]+$"}}})),
        })
        .unwrap();
        let good = SubjectRecord::new().with("employeeID", "E-1");
        assert!(build_claims_at(&t, &good, &issuer(), at()).is_ok());
        let bad = SubjectRecord::new().with("employeeID", "X-1");
        assert!(matches!(
            build_claims_at(&t, &bad, &issuer(), at()),
            Err(IssuanceError::RuleViolation { .. })
        ));
    }

    #[test]
    fn numeric_subject_is_stringified() {
        let t = CredentialTemplate::from_config(TemplateConfig {
            type_name: "BadgeCredential".to_string(),
            required: BTreeMap::from([("badge".to_string(), FieldType::Number)]),
            optional: BTreeMap::new(),
            subject_field: "badge".to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            validity_secs: None,
            allow_unknown_fields: false,
            rules: None,
        })
        .unwrap();
        let claims = build_claims_at(&t, &SubjectRecord::new().with("badge", "42"), &issuer(), at()).unwrap();
        assert_eq!(claims.subject, "42");
    }

    #[test]
    fn each_build_gets_fresh_jti() {
        let a = build_claims(&template(false), &ana(), &issuer()).unwrap();
        let b = build_claims(&template(false), &ana(), &issuer()).unwrap();
        assert_ne!(a.credential_id, b.credential_id);
    }

    #[test]
    fn supplied_jti_becomes_registered_claim() {
        let urn = "urn:uuid:11111111-2222-4333-8444-555555555555";
        for allow_unknown in [false, true] {
            let record = ana().with("jti", urn);
            let claims = build_claims_at(&template(allow_unknown), &record, &issuer(), at()).unwrap();
            assert_eq!(claims.credential_id.to_urn(), urn);
            assert!(claims.custom_claim("jti").is_none());
            let payload = claims.to_payload();
            assert_eq!(payload["jti"], urn);
            assert!(payload["vc"]["credentialSubject"].get("jti").is_none());
        }
    }

    #[test]
    fn supplied_bare_uuid_jti_rendered_as_urn() {
        let record = ana().with("jti", "11111111-2222-4333-8444-555555555555");
        let claims = build_claims_at(&template(false), &record, &issuer(), at()).unwrap();
        assert_eq!(claims.to_payload()["jti"], "urn:uuid:11111111-2222-4333-8444-555555555555");
    }

    #[test]
    fn malformed_jti_rejected() {
        for bad in [json!("E-1023"), json!(42)] {
            let record = ana().with("jti", bad);
            assert!(matches!(
                build_claims_at(&template(false), &record, &issuer(), at()),
                Err(IssuanceError::TypeMismatch { ref field, .. }) if field == "jti"
            ));
        }
    }

    #[test]
    fn null_jti_generates_fresh_id() {
        let record = ana().with("jti", Value::Null);
        let claims = build_claims_at(&template(false), &record, &issuer(), at()).unwrap();
        assert!(claims.credential_id.to_urn().starts_with("urn:uuid:"));
    }

    #[test]
    fn undeclared_null_is_absent_in_both_modes() {
        for allow_unknown in [false, true] {
            let record = ana().with("salary", Value::Null);
            let claims = build_claims_at(&template(allow_unknown), &record, &issuer(), at()).unwrap();
            assert!(claims.custom_claim("salary").is_none());
            assert_eq!(claims.custom.len(), 4);
        }
    }

    #[test]
    fn optional_subject_falls_back_to_default() {
        let t = CredentialTemplate::from_config(TemplateConfig {
            type_name: "Badge".to_string(),
            required: BTreeMap::new(),
            optional: BTreeMap::from([(
                "badge".to_string(),
                OptionalFieldConfig {
                    field_type: FieldType::String,
                    default: json!("none"),
                },
            )]),
            subject_field: "badge".to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            validity_secs: None,
            allow_unknown_fields: false,
            rules: None,
        })
        .unwrap();
        let defaulted = build_claims_at(&t, &SubjectRecord::new(), &issuer(), at()).unwrap();
        assert_eq!(defaulted.subject, "none");
        let supplied = build_claims_at(&t, &SubjectRecord::new().with("badge", "B-7"), &issuer(), at()).unwrap();
        assert_eq!(supplied.subject, "B-7");
    }
}
