//! Slug handling, pipe-delimited validation rules and JSON Schema checks

use crate::contract::{ContentError, FieldErrors};
use chrono::{DateTime, NaiveDate};
use jsonschema::Validator;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Derive a slug: lowercase, runs of non-alphanumerics become one hyphen,
/// leading/trailing hyphens trimmed
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Validate an explicit slug: `[a-z0-9][a-z0-9_-]*`
pub fn validate_slug(field: &str, slug: &str) -> Result<(), ContentError> {
    if slug.is_empty() {
        return Err(ContentError::validation(field, format!("The {field} may not be empty.")));
    }

    let mut chars = slug.chars();
    let starts_alphanumeric = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    let rest_valid = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');

    if !starts_alphanumeric || !rest_valid {
        return Err(ContentError::validation(
            field,
            format!(
                "The {field} '{slug}' may only contain lowercase letters, digits, '-' and '_' and must start with a letter or digit."
            ),
        ));
    }
    Ok(())
}

/// Resolve the slug of a new record: explicit slugs are validated, missing ones derived
pub fn resolve_slug(explicit: Option<&str>, source: &str) -> Result<String, ContentError> {
    match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) => {
            validate_slug("slug", slug)?;
            Ok(slug.to_string())
        }
        None => {
            let slug = slugify(source);
            if slug.is_empty() {
                return Err(ContentError::validation(
                    "slug",
                    "A slug could not be derived; provide one explicitly.",
                ));
            }
            Ok(slug)
        }
    }
}

/// Require a non-blank name
pub fn require_text(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, format!("The {field} field is required."));
    }
}

// ===== Rule grammar =====

/// One parsed validation rule
#[derive(Debug, Clone)]
pub enum Rule {
    Required,
    Nullable,
    String,
    Numeric,
    Integer,
    Boolean,
    Email,
    Url,
    Alpha,
    AlphaNum,
    AlphaDash,
    Date,
    Min(f64),
    Max(f64),
    Between(f64, f64),
    Size(f64),
    In(Vec<String>),
    NotIn(Vec<String>),
    Regex(Regex),
}

/// Parsed pipe-delimited rule list
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

/// Value under validation
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    Scalar(&'a str),
    List(&'a [String]),
}

impl RuleSet {
    /// Parse `required|min:3|in:a,b`; unknown names and bad arguments are errors
    pub fn parse(input: &str) -> Result<Self, String> {
        let mut rules = Vec::new();
        for segment in input.split('|').map(str::trim).filter(|s| !s.is_empty()) {
            let (name, arg) = match segment.split_once(':') {
                Some((name, arg)) => (name.trim(), Some(arg)),
                None => (segment, None),
            };

            let rule = match (name, arg) {
                ("required", None) => Rule::Required,
                ("nullable", None) => Rule::Nullable,
                ("string", None) => Rule::String,
                ("numeric", None) => Rule::Numeric,
                ("integer", None) => Rule::Integer,
                ("boolean", None) => Rule::Boolean,
                ("email", None) => Rule::Email,
                ("url", None) => Rule::Url,
                ("alpha", None) => Rule::Alpha,
                ("alpha_num", None) => Rule::AlphaNum,
                ("alpha_dash", None) => Rule::AlphaDash,
                ("date", None) => Rule::Date,
                ("min", Some(arg)) => Rule::Min(parse_number(name, arg)?),
                ("max", Some(arg)) => Rule::Max(parse_number(name, arg)?),
                ("size", Some(arg)) => Rule::Size(parse_number(name, arg)?),
                ("between", Some(arg)) => {
                    let (low, high) = arg
                        .split_once(',')
                        .ok_or_else(|| format!("rule 'between' expects two bounds, got '{arg}'"))?;
                    Rule::Between(parse_number(name, low)?, parse_number(name, high)?)
                }
                ("in", Some(arg)) => Rule::In(split_list(arg)),
                ("not_in", Some(arg)) => Rule::NotIn(split_list(arg)),
                ("regex", Some(arg)) => {
                    let pattern = strip_delimiters(arg);
                    Rule::Regex(
                        Regex::new(pattern)
                            .map_err(|e| format!("rule 'regex' has an invalid pattern: {e}"))?,
                    )
                }
                (name, None) if takes_argument(name) => {
                    return Err(format!("rule '{name}' requires an argument"));
                }
                (name, Some(_)) if !takes_argument(name) && is_known(name) => {
                    return Err(format!("rule '{name}' does not take an argument"));
                }
                (name, _) => return Err(format!("unknown validation rule '{name}'")),
            };
            rules.push(rule);
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn is_required(&self) -> bool {
        self.rules.iter().any(|r| matches!(r, Rule::Required))
    }

    pub fn is_nullable(&self) -> bool {
        self.rules.iter().any(|r| matches!(r, Rule::Nullable))
    }

    fn is_numeric(&self) -> bool {
        self.rules
            .iter()
            .any(|r| matches!(r, Rule::Numeric | Rule::Integer))
    }

    /// Apply every rule to a non-empty value; returns human-readable messages
    pub fn check(&self, label: &str, subject: Subject<'_>, numeric_field: bool) -> Vec<String> {
        let numeric = numeric_field || self.is_numeric();
        let mut messages = Vec::new();

        for rule in &self.rules {
            let failed = match rule {
                Rule::Required | Rule::Nullable | Rule::String => None,
                Rule::Numeric => scalar_fails(subject, |s| parse_f64(s).is_some())
                    .then(|| format!("The {label} must be a number.")),
                Rule::Integer => scalar_fails(subject, |s| s.trim().parse::<i64>().is_ok())
                    .then(|| format!("The {label} must be an integer.")),
                Rule::Boolean => scalar_fails(subject, |s| {
                    matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "false" | "1" | "0")
                })
                .then(|| format!("The {label} field must be true or false.")),
                Rule::Email => each_fails(subject, is_email)
                    .then(|| format!("The {label} must be a valid email address.")),
                Rule::Url => each_fails(subject, is_url)
                    .then(|| format!("The {label} must be a valid URL.")),
                Rule::Alpha => each_fails(subject, |s| s.chars().all(char::is_alphabetic))
                    .then(|| format!("The {label} may only contain letters.")),
                Rule::AlphaNum => each_fails(subject, |s| s.chars().all(char::is_alphanumeric))
                    .then(|| format!("The {label} may only contain letters and numbers.")),
                Rule::AlphaDash => each_fails(subject, |s| {
                    s.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_')
                })
                .then(|| format!("The {label} may only contain letters, numbers, dashes and underscores.")),
                Rule::Date => each_fails(subject, is_date)
                    .then(|| format!("The {label} is not a valid date.")),
                Rule::Min(min) => measure(subject, numeric)
                    .is_some_and(|m| m < *min)
                    .then(|| format!("The {label} must be at least {}.", fmt_number(*min))),
                Rule::Max(max) => measure(subject, numeric)
                    .is_some_and(|m| m > *max)
                    .then(|| format!("The {label} may not be greater than {}.", fmt_number(*max))),
                Rule::Between(low, high) => measure(subject, numeric)
                    .is_some_and(|m| m < *low || m > *high)
                    .then(|| {
                        format!(
                            "The {label} must be between {} and {}.",
                            fmt_number(*low),
                            fmt_number(*high)
                        )
                    }),
                Rule::Size(size) => measure(subject, numeric)
                    .is_some_and(|m| (m - *size).abs() > f64::EPSILON)
                    .then(|| format!("The {label} must be {}.", fmt_number(*size))),
                Rule::In(allowed) => each_fails(subject, |s| allowed.iter().any(|a| a == s))
                    .then(|| format!("The selected {label} is invalid.")),
                Rule::NotIn(denied) => each_fails(subject, |s| !denied.iter().any(|d| d == s))
                    .then(|| format!("The selected {label} is invalid.")),
                Rule::Regex(re) => each_fails(subject, |s| re.is_match(s))
                    .then(|| format!("The {label} format is invalid.")),
            };
            if let Some(message) = failed {
                messages.push(message);
            }
        }
        messages
    }
}

fn takes_argument(name: &str) -> bool {
    matches!(name, "min" | "max" | "size" | "between" | "in" | "not_in" | "regex")
}

fn is_known(name: &str) -> bool {
    matches!(
        name,
        "required"
            | "nullable"
            | "string"
            | "numeric"
            | "integer"
            | "boolean"
            | "email"
            | "url"
            | "alpha"
            | "alpha_num"
            | "alpha_dash"
            | "date"
    )
}

fn parse_number(rule: &str, arg: &str) -> Result<f64, String> {
    parse_f64(arg).ok_or_else(|| format!("rule '{rule}' expects a number, got '{arg}'"))
}

fn split_list(arg: &str) -> Vec<String> {
    arg.split(',').map(|s| s.trim().to_string()).collect()
}

fn strip_delimiters(pattern: &str) -> &str {
    if pattern.len() >= 2 && pattern.starts_with('/') && pattern.ends_with('/') {
        &pattern[1..pattern.len() - 1]
    } else {
        pattern
    }
}

fn fmt_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Lists fail a scalar-only rule outright
fn scalar_fails(subject: Subject<'_>, ok: impl Fn(&str) -> bool) -> bool {
    match subject {
        Subject::Scalar(s) => !ok(s),
        Subject::List(_) => true,
    }
}

fn each_fails(subject: Subject<'_>, ok: impl Fn(&str) -> bool) -> bool {
    match subject {
        Subject::Scalar(s) => !ok(s),
        Subject::List(items) => items.iter().any(|s| !ok(s)),
    }
}

/// Numeric value, element count or character count
fn measure(subject: Subject<'_>, numeric: bool) -> Option<f64> {
    match subject {
        Subject::List(items) => Some(items.len() as f64),
        Subject::Scalar(s) if numeric => parse_f64(s),
        Subject::Scalar(s) => Some(s.chars().count() as f64),
    }
}

pub fn parse_f64(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn is_email(s: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(s))
}

pub fn is_url(s: &str) -> bool {
    url::Url::parse(s).is_ok_and(|u| u.has_host())
}

pub fn is_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(s.trim()).is_ok()
}

/// Validate a JSON document against a JSON Schema
pub fn validate_against_schema(data: &Value, schema: &Value) -> Result<(), Vec<String>> {
    let validator = Validator::new(schema).map_err(|e| vec![format!("Invalid JSON Schema: {e}")])?;

    let errors: Vec<String> = validator.iter_errors(data).map(|e| e.to_string()).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate that a schema document compiles
pub fn validate_schema_document(schema: &Value) -> Result<(), String> {
    Validator::new(schema)
        .map(|_| ())
        .map_err(|e| format!("Invalid JSON Schema: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  --Rust & Tokio!!  "), "rust-tokio");
        assert_eq!(slugify("Already-slugged"), "already-slugged");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("slug", "meta_title").is_ok());
        assert!(validate_slug("slug", "hello-world-2").is_ok());
        assert!(validate_slug("slug", "-leading").is_err());
        assert!(validate_slug("slug", "Upper").is_err());
        assert!(validate_slug("slug", "with space").is_err());
        assert!(validate_slug("slug", "").is_err());
    }

    #[test]
    fn test_resolve_slug_derives_from_title() {
        assert_eq!(resolve_slug(None, "Hello World").unwrap(), "hello-world");
        assert_eq!(resolve_slug(Some("  "), "Hello World").unwrap(), "hello-world");
        assert_eq!(resolve_slug(Some("custom"), "Hello World").unwrap(), "custom");
        assert!(resolve_slug(None, "!!!").is_err());
    }

    #[test]
    fn test_parse_rules() {
        let rules = RuleSet::parse("required|min:3|max:10|in:a,b").unwrap();
        assert_eq!(rules.rules().len(), 4);
        assert!(rules.is_required());
        assert!(!rules.is_nullable());

        assert!(RuleSet::parse("").unwrap().rules().is_empty());
        assert!(RuleSet::parse("bogus").is_err());
        assert!(RuleSet::parse("min").is_err());
        assert!(RuleSet::parse("min:abc").is_err());
        assert!(RuleSet::parse("email:strict").is_err());
        assert!(RuleSet::parse("regex:/[/").is_err());
    }

    #[test]
    fn test_length_rules_on_text() {
        let rules = RuleSet::parse("min:3|max:5").unwrap();
        assert!(rules.check("title", Subject::Scalar("abcd"), false).is_empty());
        assert_eq!(
            rules.check("title", Subject::Scalar("ab"), false),
            vec!["The title must be at least 3.".to_string()]
        );
        assert_eq!(rules.check("title", Subject::Scalar("abcdef"), false).len(), 1);
    }

    #[test]
    fn test_numeric_rules() {
        let rules = RuleSet::parse("numeric|between:1,10").unwrap();
        assert!(rules.check("rating", Subject::Scalar("7"), false).is_empty());
        assert_eq!(rules.check("rating", Subject::Scalar("11"), false).len(), 1);
        // "abc" fails numeric and is measured as None for between
        assert_eq!(rules.check("rating", Subject::Scalar("abc"), false).len(), 1);
    }

    #[test]
    fn test_list_rules_count_elements() {
        let rules = RuleSet::parse("max:2").unwrap();
        let items = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(rules.check("tags", Subject::List(&items), false).len(), 1);
    }

    #[test]
    fn test_format_rules() {
        let rules = RuleSet::parse("email").unwrap();
        assert!(rules.check("contact", Subject::Scalar("a@b.io"), false).is_empty());
        assert!(!rules.check("contact", Subject::Scalar("not-an-email"), false).is_empty());

        let rules = RuleSet::parse("regex:/^[A-Z]{3}$/").unwrap();
        assert!(rules.check("code", Subject::Scalar("ABC"), false).is_empty());
        assert!(!rules.check("code", Subject::Scalar("abc"), false).is_empty());

        let rules = RuleSet::parse("url").unwrap();
        assert!(rules.check("link", Subject::Scalar("https://example.com"), false).is_empty());
        assert!(!rules.check("link", Subject::Scalar("example"), false).is_empty());
    }

    #[test]
    fn test_date_detection() {
        assert!(is_date("2024-02-29"));
        assert!(is_date("2024-02-29T10:00:00Z"));
        assert!(!is_date("2023-02-29"));
        assert!(!is_date("yesterday"));
    }

    #[test]
    fn test_schema_validation() {
        let schema = json!({
            "type": "object",
            "properties": { "lat": { "type": "number" } },
            "required": ["lat"]
        });
        assert!(validate_against_schema(&json!({"lat": 1.5}), &schema).is_ok());
        assert!(validate_against_schema(&json!({"lng": 1.5}), &schema).is_err());
        assert!(validate_schema_document(&json!({"type": 12})).is_err());
    }
}
