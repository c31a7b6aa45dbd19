//! Field type capability registry
//!
//! Every [`FieldType`] is registered once with a normaliser (submitted JSON to
//! a canonical shape), an intrinsic format check, a serialiser (canonical
//! shape to stored text) and a deserialiser (stored text to [`FieldValue`]).

use crate::contract::{FieldDefinition, FieldOption, FieldType, FieldValue};
use crate::domain::validation::{self, RuleSet, Subject};
use serde_json::Value;
use std::collections::HashMap;

/// Canonical shape of a submitted value
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Empty,
    Scalar(String),
    List(Vec<String>),
    Document(Value),
}

impl Normalized {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

}

type Normalizer = fn(&Value) -> Result<Normalized, String>;
type FormatCheck = fn(&Normalized) -> Option<&'static str>;
type Deserializer = fn(&str) -> FieldValue;

/// Capabilities registered for one field type
#[derive(Clone, Copy)]
pub struct FieldTypeHandler {
    pub normalize: Normalizer,
    pub check_format: FormatCheck,
    pub deserialize: Deserializer,
    /// `min`/`max` compare numerically
    pub numeric: bool,
}

impl std::fmt::Debug for FieldTypeHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldTypeHandler")
            .field("numeric", &self.numeric)
            .finish_non_exhaustive()
    }
}

/// Field type -> capability table
#[derive(Debug, Clone)]
pub struct FieldTypeRegistry {
    handlers: HashMap<FieldType, FieldTypeHandler>,
}

impl Default for FieldTypeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FieldTypeRegistry {
    /// Registry with every built-in field type
    pub fn builtin() -> Self {
        let text = FieldTypeHandler {
            normalize: normalize_scalar,
            check_format: no_format,
            deserialize: deserialize_text,
            numeric: false,
        };
        let multi = FieldTypeHandler {
            normalize: normalize_list,
            check_format: no_format,
            deserialize: deserialize_list,
            numeric: false,
        };

        let mut handlers = HashMap::new();
        for field_type in FieldType::ALL {
            let handler = match field_type {
                FieldType::Text
                | FieldType::Textarea
                | FieldType::RichText
                | FieldType::Select
                | FieldType::Radio
                | FieldType::Image
                | FieldType::File => text,
                FieldType::Number => FieldTypeHandler {
                    check_format: check_number,
                    numeric: true,
                    ..text
                },
                FieldType::Email => FieldTypeHandler {
                    check_format: check_email,
                    ..text
                },
                FieldType::Url => FieldTypeHandler {
                    check_format: check_url,
                    ..text
                },
                FieldType::Date => FieldTypeHandler {
                    check_format: check_date,
                    ..text
                },
                FieldType::Boolean => FieldTypeHandler {
                    normalize: normalize_boolean,
                    deserialize: deserialize_boolean,
                    ..text
                },
                FieldType::Checkbox | FieldType::Multiselect | FieldType::Gallery => multi,
                FieldType::Json => FieldTypeHandler {
                    normalize: normalize_json,
                    deserialize: deserialize_json,
                    ..text
                },
                FieldType::Repeater => FieldTypeHandler {
                    normalize: reject_repeater,
                    deserialize: |_| FieldValue::Null,
                    ..text
                },
            };
            handlers.insert(*field_type, handler);
        }
        Self { handlers }
    }

    /// Override the handler of one type
    pub fn register(&mut self, field_type: FieldType, handler: FieldTypeHandler) {
        self.handlers.insert(field_type, handler);
    }

    pub fn handler(&self, field_type: FieldType) -> Option<&FieldTypeHandler> {
        self.handlers.get(&field_type)
    }

    /// Interpret a stored raw value
    pub fn decode(&self, field_type: FieldType, raw: Option<&str>) -> FieldValue {
        match (raw, self.handler(field_type)) {
            (Some(raw), Some(handler)) => (handler.deserialize)(raw),
            (Some(raw), None) => FieldValue::Text(raw.to_string()),
            (None, _) => FieldValue::Null,
        }
    }

    /// Stored value or, when absent, the interpreted default
    pub fn decode_or_default(&self, field: &FieldDefinition, raw: Option<&str>) -> FieldValue {
        match raw {
            Some(raw) => self.decode(field.field_type, Some(raw)),
            None => self.decode(field.field_type, field.default_value.as_deref()),
        }
    }

    /// Validate a submitted value against the field; returns its canonical shape
    ///
    /// Covers requiredness, type format, rule string, option membership and
    /// the JSON Schema of `json` fields. Media existence is checked by the caller.
    pub fn validate(
        &self,
        field: &FieldDefinition,
        options: &[FieldOption],
        raw: &Value,
    ) -> Result<Normalized, Vec<String>> {
        let label = label_of(field);
        let handler = self
            .handler(field.field_type)
            .ok_or_else(|| vec![format!("The {label} has an unsupported field type.")])?;

        let normalized = (handler.normalize)(raw).map_err(|reason| vec![format!("The {label} {reason}.")])?;

        let rules = match field.validation_rules.as_deref() {
            Some(rules) => RuleSet::parse(rules).unwrap_or_else(|reason| {
                tracing::warn!(field = %field.slug, %reason, "Ignoring unparseable validation rules");
                RuleSet::default()
            }),
            None => RuleSet::default(),
        };

        if normalized.is_empty() {
            if field.is_required || rules.is_required() {
                return Err(vec![format!("The {label} field is required.")]);
            }
            return Ok(normalized);
        }

        let mut messages = Vec::new();
        if let Some(reason) = (handler.check_format)(&normalized) {
            messages.push(format!("The {label} {reason}."));
        }

        let subject = match &normalized {
            Normalized::Scalar(s) => Some(Subject::Scalar(s)),
            Normalized::List(items) => Some(Subject::List(items)),
            Normalized::Document(_) | Normalized::Empty => None,
        };
        if let Some(subject) = subject {
            messages.extend(rules.check(&label, subject, handler.numeric));
        }

        // Multi-valued choices without an option list accept free values.
        let restricted = field.field_type.is_choice() && !(field.field_type.is_multi_valued() && options.is_empty());
        if restricted {
            let allowed = |v: &String| options.iter().any(|o| &o.value == v);
            let valid = match &normalized {
                Normalized::Scalar(v) => allowed(v),
                Normalized::List(items) => items.iter().all(allowed),
                _ => false,
            };
            if !valid {
                messages.push(format!("The selected {label} is invalid."));
            }
        }

        if let (Normalized::Document(document), Some(schema)) = (&normalized, field.settings.get("schema")) {
            if let Err(errors) = validation::validate_against_schema(document, schema) {
                messages.extend(errors.into_iter().map(|e| format!("The {label} {e}.")));
            }
        }

        if messages.is_empty() {
            Ok(normalized)
        } else {
            Err(messages)
        }
    }
}

/// Stored text of a canonical value
pub fn serialize(value: &Normalized) -> Option<String> {
    match value {
        Normalized::Empty => None,
        Normalized::Scalar(s) => Some(s.clone()),
        Normalized::List(items) => {
            Some(Value::Array(items.iter().cloned().map(Value::String).collect()).to_string())
        }
        Normalized::Document(document) => Some(document.to_string()),
    }
}

/// Human label used in messages
pub fn label_of(field: &FieldDefinition) -> String {
    field.slug.replace('_', " ")
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn normalize_scalar(value: &Value) -> Result<Normalized, String> {
    match value {
        Value::Null => Ok(Normalized::Empty),
        Value::String(s) if s.trim().is_empty() => Ok(Normalized::Empty),
        Value::Array(_) | Value::Object(_) => Err("must be a single value".to_string()),
        other => Ok(scalar_text(other).map_or(Normalized::Empty, Normalized::Scalar)),
    }
}

fn normalize_boolean(value: &Value) -> Result<Normalized, String> {
    let parsed = match value {
        Value::Null => return Ok(Normalized::Empty),
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" => return Ok(Normalized::Empty),
            "true" | "1" | "on" | "yes" => Some(true),
            "false" | "0" | "off" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    };
    parsed
        .map(|b| Normalized::Scalar(b.to_string()))
        .ok_or_else(|| "field must be true or false".to_string())
}

/// Arrays keep their order; a scalar is wrapped
fn normalize_list(value: &Value) -> Result<Normalized, String> {
    match value {
        Value::Null => Ok(Normalized::Empty),
        Value::Array(items) if items.is_empty() => Ok(Normalized::Empty),
        Value::Array(items) => items
            .iter()
            .map(|item| scalar_text(item).ok_or_else(|| "must be a list of plain values".to_string()))
            .collect::<Result<Vec<_>, _>>()
            .map(Normalized::List),
        Value::String(s) if s.trim().is_empty() => Ok(Normalized::Empty),
        Value::Object(_) => Err("must be a list of plain values".to_string()),
        other => Ok(scalar_text(other).map_or(Normalized::Empty, |s| Normalized::List(vec![s]))),
    }
}

/// Strings are parsed as JSON text, anything else is taken as the document
fn normalize_json(value: &Value) -> Result<Normalized, String> {
    match value {
        Value::Null => Ok(Normalized::Empty),
        Value::String(s) if s.trim().is_empty() => Ok(Normalized::Empty),
        Value::String(s) => serde_json::from_str(s)
            .map(Normalized::Document)
            .map_err(|_| "must be a valid JSON string".to_string()),
        other => Ok(Normalized::Document(other.clone())),
    }
}

fn reject_repeater(_: &Value) -> Result<Normalized, String> {
    Err("is a repeater; its values are written as repeater groups".to_string())
}

fn no_format(_: &Normalized) -> Option<&'static str> {
    None
}

fn scalar_check(value: &Normalized, ok: fn(&str) -> bool) -> bool {
    match value {
        Normalized::Scalar(s) => ok(s),
        _ => true,
    }
}

fn check_number(value: &Normalized) -> Option<&'static str> {
    (!scalar_check(value, |s| validation::parse_f64(s).is_some())).then_some("must be a number")
}

fn check_email(value: &Normalized) -> Option<&'static str> {
    (!scalar_check(value, validation::is_email)).then_some("must be a valid email address")
}

fn check_url(value: &Normalized) -> Option<&'static str> {
    (!scalar_check(value, validation::is_url)).then_some("must be a valid URL")
}

fn check_date(value: &Normalized) -> Option<&'static str> {
    (!scalar_check(value, validation::is_date)).then_some("is not a valid date")
}

fn deserialize_text(raw: &str) -> FieldValue {
    FieldValue::Text(raw.to_string())
}

fn deserialize_boolean(raw: &str) -> FieldValue {
    FieldValue::Bool(matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "on" | "yes"
    ))
}

fn deserialize_list(raw: &str) -> FieldValue {
    match serde_json::from_str::<Vec<Value>>(raw) {
        Ok(items) => FieldValue::List(items.iter().filter_map(scalar_text).collect()),
        Err(_) if raw.trim().is_empty() => FieldValue::List(Vec::new()),
        Err(_) => FieldValue::List(vec![raw.to_string()]),
    }
}

fn deserialize_json(raw: &str) -> FieldValue {
    serde_json::from_str(raw).map_or_else(|_| FieldValue::Text(raw.to_string()), FieldValue::Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::FieldOwner;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn field(slug: &str, field_type: FieldType) -> FieldDefinition {
        FieldDefinition {
            id: Uuid::new_v4(),
            owner: FieldOwner::ContentType(Uuid::new_v4()),
            parent_field_id: None,
            name: slug.to_string(),
            slug: slug.to_string(),
            field_type,
            validation_rules: None,
            settings: Value::Null,
            default_value: None,
            is_required: false,
            is_unique: false,
            position: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn options(field: &FieldDefinition, values: &[&str]) -> Vec<FieldOption> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| FieldOption {
                id: Uuid::new_v4(),
                field_definition_id: field.id,
                label: v.to_uppercase(),
                value: v.to_string(),
                position: i as i32,
            })
            .collect()
    }

    #[test]
    fn test_every_type_is_registered() {
        let registry = FieldTypeRegistry::builtin();
        for field_type in FieldType::ALL {
            assert!(registry.handler(*field_type).is_some(), "{field_type} missing");
        }
    }

    #[test]
    fn test_required_field_rejects_empty() {
        let registry = FieldTypeRegistry::builtin();
        let mut headline = field("headline", FieldType::Text);
        headline.is_required = true;

        let err = registry.validate(&headline, &[], &json!("")).unwrap_err();
        assert_eq!(err, vec!["The headline field is required.".to_string()]);
        assert!(registry.validate(&headline, &[], &Value::Null).is_err());
        assert_eq!(
            registry.validate(&headline, &[], &json!("Hi")).unwrap(),
            Normalized::Scalar("Hi".into())
        );
    }

    #[test]
    fn test_optional_empty_skips_rules() {
        let registry = FieldTypeRegistry::builtin();
        let mut subtitle = field("subtitle", FieldType::Text);
        subtitle.validation_rules = Some("nullable|min:5".into());
        assert_eq!(registry.validate(&subtitle, &[], &Value::Null).unwrap(), Normalized::Empty);
        assert!(registry.validate(&subtitle, &[], &json!("abc")).is_err());
    }

    #[test]
    fn test_multiselect_wraps_scalar_and_keeps_order() {
        let registry = FieldTypeRegistry::builtin();
        let tags = field("tags", FieldType::Multiselect);
        let opts = options(&tags, &["a", "b", "c"]);

        let normalized = registry.validate(&tags, &opts, &json!(["b", "a"])).unwrap();
        assert_eq!(serialize(&normalized).as_deref(), Some(r#"["b","a"]"#));

        let wrapped = registry.validate(&tags, &opts, &json!("c")).unwrap();
        assert_eq!(wrapped, Normalized::List(vec!["c".into()]));

        let err = registry.validate(&tags, &opts, &json!(["a", "zzz"])).unwrap_err();
        assert_eq!(err, vec!["The selected tags is invalid.".to_string()]);
    }

    #[test]
    fn test_multiselect_without_options_accepts_free_values() {
        let registry = FieldTypeRegistry::builtin();
        let tags = field("tags", FieldType::Multiselect);
        let normalized = registry.validate(&tags, &[], &json!(["x", "y"])).unwrap();
        assert_eq!(normalized, Normalized::List(vec!["x".into(), "y".into()]));

        let category = field("category", FieldType::Select);
        assert!(registry.validate(&category, &[], &json!("news")).is_err());
    }

    #[test]
    fn test_select_requires_option_value() {
        let registry = FieldTypeRegistry::builtin();
        let category = field("category", FieldType::Select);
        let opts = options(&category, &["news", "sports"]);
        assert!(registry.validate(&category, &opts, &json!("news")).is_ok());
        assert!(registry.validate(&category, &opts, &json!("weather")).is_err());
        assert!(registry.validate(&category, &opts, &json!(["news"])).is_err());
    }

    #[test]
    fn test_boolean_normalisation_and_decoding() {
        let registry = FieldTypeRegistry::builtin();
        let featured = field("featured", FieldType::Boolean);
        let stored = serialize(&registry.validate(&featured, &[], &json!("on")).unwrap());
        assert_eq!(stored.as_deref(), Some("true"));
        assert_eq!(registry.decode(FieldType::Boolean, stored.as_deref()), FieldValue::Bool(true));
        assert_eq!(registry.decode(FieldType::Boolean, Some("0")), FieldValue::Bool(false));
        assert!(registry.validate(&featured, &[], &json!("maybe")).is_err());
    }

    #[test]
    fn test_number_format_and_numeric_rules() {
        let registry = FieldTypeRegistry::builtin();
        let mut rating = field("rating", FieldType::Number);
        rating.validation_rules = Some("min:1|max:5".into());
        assert!(registry.validate(&rating, &[], &json!(3)).is_ok());
        assert!(registry.validate(&rating, &[], &json!("12")).is_err());
        assert!(registry.validate(&rating, &[], &json!("three")).is_err());
    }

    #[test]
    fn test_json_field_schema() {
        let registry = FieldTypeRegistry::builtin();
        let geo = field("geo", FieldType::Json).clone();
        let geo = FieldDefinition {
            settings: json!({"schema": {"type": "object", "required": ["lat"]}}),
            ..geo
        };
        assert!(registry.validate(&geo, &[], &json!({"lat": 1})).is_ok());
        assert!(registry.validate(&geo, &[], &json!(r#"{"lat": 1}"#)).is_ok());
        assert!(registry.validate(&geo, &[], &json!({"lng": 1})).is_err());
        assert!(registry.validate(&geo, &[], &json!("{not json")).is_err());
    }

    #[test]
    fn test_repeater_values_are_rejected() {
        let registry = FieldTypeRegistry::builtin();
        let links = field("links", FieldType::Repeater);
        assert!(registry.validate(&links, &[], &json!([{"url": "x"}])).is_err());
    }

    #[test]
    fn test_decode_defaults_and_lists() {
        let registry = FieldTypeRegistry::builtin();
        let mut tags = field("tags", FieldType::Checkbox);
        tags.default_value = Some(r#"["a"]"#.into());
        assert_eq!(registry.decode_or_default(&tags, None), FieldValue::List(vec!["a".into()]));
        assert_eq!(
            registry.decode_or_default(&tags, Some(r#"["x","y"]"#)),
            FieldValue::List(vec!["x".into(), "y".into()])
        );
        assert_eq!(registry.decode(FieldType::Text, None), FieldValue::Null);
        assert_eq!(registry.decode(FieldType::Json, Some(r#"{"a":1}"#)), FieldValue::Json(json!({"a": 1})));
    }
}
