//! Contract error types for content service
//!
//! These errors are transport-agnostic and used for inter-module communication.

use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Field-keyed validation messages
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-message error set
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Merge messages of another set under a key prefix (e.g. `links.0.`)
    pub fn merge_prefixed(&mut self, prefix: &str, other: FieldErrors) {
        for (field, messages) in other.0 {
            for message in messages {
                self.add(format!("{prefix}{field}"), message);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn as_map(&self) -> &BTreeMap<String, Vec<String>> {
        &self.0
    }

    /// `Ok(())` when empty, the validation error otherwise
    pub fn into_result(self) -> Result<(), ContentError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ContentError::Validation { errors: self })
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Content service domain errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    /// Resource not found
    #[error("{resource} not found: {id}")]
    NotFound {
        resource: &'static str,
        id: String,
    },

    /// Missing required field, failed rule, bad enum value
    #[error("Validation error: {errors}")]
    Validation { errors: FieldErrors },

    /// Slug already taken within its scope
    #[error("Slug '{slug}' already exists in {scope}")]
    DuplicateSlug { scope: String, slug: String },

    /// Non-repeatable section attached twice to the same page
    #[error("Section {template_section_id} is already attached to page {page_id}")]
    DuplicateSection {
        page_id: Uuid,
        template_section_id: Uuid,
    },

    /// Restrict-on-delete relationship violated
    #[error("Cannot delete {resource} {id}: referenced by {dependents} {dependent_resource}")]
    ReferentialIntegrity {
        resource: &'static str,
        id: Uuid,
        dependent_resource: &'static str,
        dependents: u64,
    },

    /// Capped section is full
    #[error("Template section {template_section_id} already holds its maximum of {max_widgets} widgets")]
    CapacityExceeded {
        template_section_id: Uuid,
        max_widgets: u32,
    },

    /// Filter with an invalid field reference or operator
    #[error("Malformed filter at position {position}: {reason}")]
    MalformedFilter { position: usize, reason: String },

    /// Destructive operation invoked without explicit confirmation
    #[error("Deleting {resource} {id} is irreversible and must be confirmed")]
    ConfirmationRequired { resource: &'static str, id: Uuid },

    /// State conflict (system resource, wrong lifecycle state)
    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    /// Storage or other unexpected failure
    #[error("Internal error")]
    Internal,
}

impl ContentError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            errors: FieldErrors::single(field, message),
        }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict {
            reason: reason.into(),
        }
    }

    /// Field-keyed messages when this is a validation error
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { errors } => Some(errors),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_display_and_result() {
        let mut errors = FieldErrors::new();
        assert!(errors.clone().into_result().is_ok());

        errors.add("headline", "The headline field is required.");
        errors.add("tags", "The selected tags is invalid.");
        assert_eq!(
            errors.to_string(),
            "headline: The headline field is required.; tags: The selected tags is invalid."
        );

        let err = errors.into_result().unwrap_err();
        assert!(err.field_errors().is_some_and(|e| e.contains("headline")));
    }

    #[test]
    fn test_merge_prefixed() {
        let mut outer = FieldErrors::new();
        outer.merge_prefixed("links.1.", FieldErrors::single("url", "bad"));
        assert_eq!(outer.get("links.1.url"), Some(&["bad".to_string()][..]));
    }
}
