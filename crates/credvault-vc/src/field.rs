//! # Field Types and Coercion
//!
//! Subject records are untyped. Every declared field passes through
//! [`FieldType::coerce()`] exactly once, so type errors surface here with the
//! field name attached instead of deep inside claim encoding.
//!
//! | Type      | Accepts                                             | Produces          |
//! |-----------|-----------------------------------------------------|-------------------|
//! | `string`  | string, integer, boolean                            | JSON string       |
//! | `number`  | integer, string holding an integer                  | JSON integer      |
//! | `boolean` | boolean, `"true"` / `"false"` (any case)            | JSON boolean      |
//! | `date`    | `YYYY-MM-DD`, RFC 3339 timestamp (any offset)       | `YYYY-MM-DD` (UTC)|
//!
//! Fractional numbers are rejected everywhere: the canonical claim encoding
//! carries integers only.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::IssuanceError;

/// Semantic type of a template field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Text.
    String,
    /// Integer.
    Number,
    /// Boolean.
    Boolean,
    /// Calendar date.
    Date,
}

impl FieldType {
    /// Lowercase name as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
        }
    }

    /// Coerce `value` to this type, or fail with `TypeMismatch` naming `field`.
    pub fn coerce(&self, field: &str, value: &Value) -> Result<Value, IssuanceError> {
        let coerced = match (self, value) {
            (Self::String, Value::String(s)) => Some(Value::String(s.clone())),
            (Self::String, Value::Number(n)) if !n.is_f64() => Some(Value::String(n.to_string())),
            (Self::String, Value::Bool(b)) => Some(Value::String(b.to_string())),

            (Self::Number, Value::Number(n)) if !n.is_f64() => Some(Value::Number(n.clone())),
            (Self::Number, Value::String(s)) => parse_integer(s),

            (Self::Boolean, Value::Bool(b)) => Some(Value::Bool(*b)),
            (Self::Boolean, Value::String(s)) => match s.trim() {
                t if t.eq_ignore_ascii_case("true") => Some(Value::Bool(true)),
                t if t.eq_ignore_ascii_case("false") => Some(Value::Bool(false)),
                _ => None,
            },

            (Self::Date, Value::String(s)) => parse_date(s).map(|d| Value::String(d.format("%Y-%m-%d").to_string())),

            _ => None,
        };
        coerced.ok_or_else(|| IssuanceError::TypeMismatch {
            field: field.to_string(),
            expected: self.as_str().to_string(),
            actual: value.to_string(),
        })
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_integer(s: &str) -> Option<Value> {
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(Value::from(n));
    }
    s.parse::<u64>().ok().map(Value::from)
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(t: FieldType, v: Value) -> Value {
        t.coerce("f", &v).unwrap()
    }

    fn mismatch(t: FieldType, v: Value) -> String {
        match t.coerce("f", &v) {
            Err(IssuanceError::TypeMismatch { field, expected, actual }) => {
                assert_eq!(field, "f");
                assert_eq!(expected, t.as_str());
                actual
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn string_accepts_scalars() {
        assert_eq!(ok(FieldType::String, json!("Ana Ruiz")), json!("Ana Ruiz"));
        assert_eq!(ok(FieldType::String, json!(1023)), json!("1023"));
        assert_eq!(ok(FieldType::String, json!(true)), json!("true"));
        mismatch(FieldType::String, json!(null));
        mismatch(FieldType::String, json!(["a"]));
        mismatch(FieldType::String, json!(1.5));
    }

    #[test]
    fn number_accepts_integers_only() {
        assert_eq!(ok(FieldType::Number, json!(42)), json!(42));
        assert_eq!(ok(FieldType::Number, json!(-7)), json!(-7));
        assert_eq!(ok(FieldType::Number, json!(" 12 ")), json!(12));
        assert_eq!(ok(FieldType::Number, json!("18446744073709551615")), json!(u64::MAX));
        assert_eq!(mismatch(FieldType::Number, json!(3.7)), "3.7");
        mismatch(FieldType::Number, json!("3.7"));
        mismatch(FieldType::Number, json!("twelve"));
        mismatch(FieldType::Number, json!(false));
    }

    #[test]
    fn boolean_accepts_bool_strings() {
        assert_eq!(ok(FieldType::Boolean, json!(false)), json!(false));
        assert_eq!(ok(FieldType::Boolean, json!("TRUE")), json!(true));
        assert_eq!(ok(FieldType::Boolean, json!("False")), json!(false));
        mismatch(FieldType::Boolean, json!("yes"));
        mismatch(FieldType::Boolean, json!(1));
    }

    #[test]
    fn date_normalizes_to_utc_calendar_day() {
        assert_eq!(ok(FieldType::Date, json!("2023-03-01")), json!("2023-03-01"));
        assert_eq!(ok(FieldType::Date, json!("2023-03-01T10:00:00Z")), json!("2023-03-01"));
        assert_eq!(ok(FieldType::Date, json!("2023-03-01T01:00:00+05:00")), json!("2023-02-28"));
        assert_eq!(mismatch(FieldType::Date, json!("2023-02-30")), "\"2023-02-30\"");
        mismatch(FieldType::Date, json!("01/03/2023"));
        mismatch(FieldType::Date, json!(20230301));
    }

    #[test]
    fn serde_names_are_lowercase() {
        let t: FieldType = serde_json::from_str("\"date\"").unwrap();
        assert_eq!(t, FieldType::Date);
        assert!(serde_json::from_str::<FieldType>("\"float\"").is_err());
    }
}
