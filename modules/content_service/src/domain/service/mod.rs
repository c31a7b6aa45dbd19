//! Domain service - business logic orchestration
//!
//! One [`Service`] carries every operation; its impl blocks are split by
//! area (fields and values, content, layout, queries).

mod content;
mod fields;
mod layout;
mod queries;

use super::collaborators::{MediaLibrary, NoOpMediaLibrary, PassthroughSanitizer, RichTextSanitizer};
use super::events::{ContentEvent, EventPublisher};
use super::field_types::FieldTypeRegistry;
use super::repository::Repositories;
use super::validation;
use crate::config::Config;
use crate::contract::{ContentError, FieldErrors, ReorderScope};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Domain service for content modeling and page composition
pub struct Service {
    repos: Repositories,
    registry: FieldTypeRegistry,
    events: Arc<dyn EventPublisher>,
    media: Arc<dyn MediaLibrary>,
    sanitizer: Arc<dyn RichTextSanitizer>,
    config: Config,
}

impl Service {
    /// Create a new service instance with default configuration and collaborators
    pub fn new(repos: Repositories, events: Arc<dyn EventPublisher>) -> Self {
        Self {
            repos,
            registry: FieldTypeRegistry::builtin(),
            events,
            media: Arc::new(NoOpMediaLibrary),
            sanitizer: Arc::new(PassthroughSanitizer),
            config: Config::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_media_library(mut self, media: Arc<dyn MediaLibrary>) -> Self {
        self.media = media;
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn RichTextSanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn with_registry(mut self, registry: FieldTypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &FieldTypeRegistry {
        &self.registry
    }

    /// Publish after commit; failures are logged, never returned
    async fn publish(&self, event: ContentEvent) {
        if let Err(e) = self.events.publish(event).await {
            tracing::warn!(error = %e, "Failed to publish content event");
        }
    }

    // ===== Bulk reposition =====

    /// Give every listed id `position = index` within its scope, in one transaction
    pub async fn reorder(&self, scope: ReorderScope, ids: &[Uuid]) -> Result<(), ContentError> {
        let members: Vec<Uuid> = match scope {
            ReorderScope::TemplateSections { template_id } => {
                self.get_template(template_id).await?;
                self.repos
                    .templates
                    .list_sections(template_id)
                    .await
                    .or_internal("list template sections")?
                    .into_iter()
                    .map(|s| s.id)
                    .collect()
            }
            ReorderScope::PageSections { page_id } => {
                self.get_page(page_id).await?;
                self.repos
                    .pages
                    .list_sections(page_id)
                    .await
                    .or_internal("list page sections")?
                    .into_iter()
                    .map(|s| s.id)
                    .collect()
            }
            ReorderScope::PageSectionWidgets { page_section_id } => {
                self.get_page_section(page_section_id).await?;
                self.repos
                    .pages
                    .list_placements(&[page_section_id])
                    .await
                    .or_internal("list widget placements")?
                    .into_iter()
                    .map(|p| p.id)
                    .collect()
            }
            ReorderScope::Fields { owner_id } => self
                .repos
                .fields
                .list_by_owner(owner_id)
                .await
                .or_internal("list fields")?
                .into_iter()
                .map(|f| f.id)
                .collect(),
            ReorderScope::FieldOptions { field_definition_id } => self
                .list_field_options(field_definition_id)
                .await?
                .into_iter()
                .map(|o| o.id)
                .collect(),
            ReorderScope::QueryFilters { query_id } => self
                .get_content_query(query_id)
                .await?
                .filters
                .into_iter()
                .map(|f| f.id)
                .collect(),
        };

        ensure_members(&members, ids)?;

        let result = match scope {
            ReorderScope::TemplateSections { template_id } => {
                self.repos.templates.reposition_sections(template_id, ids).await
            }
            ReorderScope::PageSections { page_id } => self.repos.pages.reposition_sections(page_id, ids).await,
            ReorderScope::PageSectionWidgets { page_section_id } => {
                self.repos.pages.reposition_placements(page_section_id, ids).await
            }
            ReorderScope::Fields { owner_id } => self.repos.fields.reposition(owner_id, ids).await,
            ReorderScope::FieldOptions { field_definition_id } => {
                self.repos.fields.reposition_options(field_definition_id, ids).await
            }
            ReorderScope::QueryFilters { query_id } => self.repos.queries.reposition_filters(query_id, ids).await,
        };
        result.or_internal("reposition")?;

        tracing::info!(?scope, count = ids.len(), "Repositioned");
        Ok(())
    }
}

/// Every id listed once and a member of the scope
fn ensure_members(members: &[Uuid], ids: &[Uuid]) -> Result<(), ContentError> {
    let members: HashSet<&Uuid> = members.iter().collect();
    let mut seen = HashSet::new();
    let mut errors = FieldErrors::new();
    for id in ids {
        if !seen.insert(id) {
            errors.add("ids", format!("The id {id} is listed more than once."));
        } else if !members.contains(id) {
            errors.add("ids", format!("The id {id} does not belong to this scope."));
        }
    }
    errors.into_result()
}

/// Validation messages of a slug check folded into an error set
fn collect_slug(errors: &mut FieldErrors, result: Result<String, ContentError>) -> Option<String> {
    match result {
        Ok(slug) => Some(slug),
        Err(ContentError::Validation { errors: slug_errors }) => {
            errors.merge_prefixed("", slug_errors);
            None
        }
        Err(_) => None,
    }
}

/// Explicit slug on update: validated, `None` when invalid
fn check_slug(errors: &mut FieldErrors, slug: &str) -> Option<String> {
    collect_slug(errors, validation::validate_slug("slug", slug).map(|_| slug.to_string()))
}

/// JSON settings blobs must be objects (or null)
fn check_settings(errors: &mut FieldErrors, key: &str, settings: &serde_json::Value) {
    if !(settings.is_null() || settings.is_object()) {
        errors.add(key, format!("The {key} must be a JSON object."));
    }
}

/// Storage failures are logged with context and surfaced as `Internal`
trait StorageResultExt<T> {
    fn or_internal(self, operation: &'static str) -> Result<T, ContentError>;
}

impl<T> StorageResultExt<T> for anyhow::Result<T> {
    fn or_internal(self, operation: &'static str) -> Result<T, ContentError> {
        self.map_err(|e| {
            tracing::error!(operation, error = ?e, "Content storage failure");
            ContentError::Internal
        })
    }
}

fn next_position(max: Option<i32>) -> i32 {
    max.map_or(0, |m| m + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_members() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(ensure_members(&[a, b], &[b, a]).is_ok());
        assert!(ensure_members(&[a, b], &[b]).is_ok());
        assert!(ensure_members(&[a, b], &[a, a]).is_err());
        assert!(ensure_members(&[a], &[Uuid::new_v4()]).is_err());
    }

    #[test]
    fn test_check_settings() {
        let mut errors = FieldErrors::new();
        check_settings(&mut errors, "settings", &serde_json::json!({"a": 1}));
        check_settings(&mut errors, "settings", &serde_json::Value::Null);
        assert!(errors.is_empty());
        check_settings(&mut errors, "settings", &serde_json::json!([1]));
        assert!(errors.contains("settings"));
    }

    #[test]
    fn test_next_position() {
        assert_eq!(next_position(None), 0);
        assert_eq!(next_position(Some(4)), 5);
    }
}
