//! HTTP error mapping to RFC-9457 Problem Details

use crate::contract::ContentError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// RFC-9457 Problem Details for HTTP API errors
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Problem {
    /// A URI reference that identifies the problem type
    #[serde(rename = "type")]
    pub type_uri: String,

    /// A short, human-readable summary of the problem type
    pub title: String,

    /// The HTTP status code
    pub status: u16,

    /// A human-readable explanation specific to this occurrence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Field-keyed validation messages
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, Vec<String>>,
}

impl Problem {
    pub fn new(status: StatusCode, title: impl Into<String>) -> Self {
        Self {
            type_uri: format!("https://httpstatuses.io/{}", status.as_u16()),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            errors: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_errors(mut self, errors: BTreeMap<String, Vec<String>>) -> Self {
        self.errors = errors;
        self
    }

    /// 400 for a malformed request body or parameter
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Bad Request").with_detail(detail)
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl From<ContentError> for Problem {
    fn from(error: ContentError) -> Self {
        map_domain_error(error)
    }
}

/// Map domain errors to HTTP Problem Details
pub fn map_domain_error(error: ContentError) -> Problem {
    let detail = error.to_string();
    match error {
        ContentError::NotFound { resource, .. } => {
            Problem::new(StatusCode::NOT_FOUND, format!("{resource} Not Found")).with_detail(detail)
        }

        ContentError::Validation { errors } => Problem::new(StatusCode::BAD_REQUEST, "Validation Error")
            .with_detail("The given data was invalid.")
            .with_errors(errors.as_map().clone()),

        ContentError::MalformedFilter { .. } => {
            Problem::new(StatusCode::BAD_REQUEST, "Malformed Filter").with_detail(detail)
        }

        ContentError::DuplicateSlug { .. } => {
            Problem::new(StatusCode::CONFLICT, "Duplicate Slug").with_detail(detail)
        }

        ContentError::DuplicateSection { .. } => {
            Problem::new(StatusCode::CONFLICT, "Duplicate Section").with_detail(detail)
        }

        ContentError::ReferentialIntegrity { .. } => {
            Problem::new(StatusCode::CONFLICT, "Referential Integrity Violation").with_detail(detail)
        }

        ContentError::CapacityExceeded { .. } => {
            Problem::new(StatusCode::CONFLICT, "Capacity Exceeded").with_detail(detail)
        }

        ContentError::Conflict { reason } => Problem::new(StatusCode::CONFLICT, "Conflict").with_detail(reason),

        ContentError::ConfirmationRequired { .. } => {
            Problem::new(StatusCode::PRECONDITION_REQUIRED, "Confirmation Required").with_detail(detail)
        }

        ContentError::Internal => Problem::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            .with_detail("An unexpected error occurred"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::FieldErrors;
    use uuid::Uuid;

    #[test]
    fn test_validation_problem_carries_field_errors() {
        let problem = map_domain_error(ContentError::Validation {
            errors: FieldErrors::single("headline", "The headline field is required."),
        });
        assert_eq!(problem.status, 400);
        assert_eq!(
            problem.errors.get("headline"),
            Some(&vec!["The headline field is required.".to_string()])
        );

        let json = serde_json::to_value(&problem).unwrap();
        assert_eq!(json["type"], "https://httpstatuses.io/400");
        assert!(json["errors"]["headline"].is_array());
    }

    #[test]
    fn test_status_mapping() {
        let id = Uuid::new_v4();
        let cases = [
            (ContentError::not_found("page", id), 404),
            (
                ContentError::DuplicateSlug {
                    scope: "pages".into(),
                    slug: "about".into(),
                },
                409,
            ),
            (
                ContentError::CapacityExceeded {
                    template_section_id: id,
                    max_widgets: 2,
                },
                409,
            ),
            (
                ContentError::ConfirmationRequired {
                    resource: "field_definition",
                    id,
                },
                428,
            ),
            (
                ContentError::MalformedFilter {
                    position: 0,
                    reason: "unknown field".into(),
                },
                400,
            ),
            (ContentError::Internal, 500),
        ];
        for (error, status) in cases {
            assert_eq!(map_domain_error(error).status, status);
        }
    }

    #[test]
    fn test_non_validation_problem_omits_errors_member() {
        let json = serde_json::to_value(map_domain_error(ContentError::conflict("system type"))).unwrap();
        assert!(json.get("errors").is_none());
        assert_eq!(json["detail"], "system type");
    }
}
