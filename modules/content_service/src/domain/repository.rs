//! Repository traits for data access
//!
//! These traits define the interface for data access operations.
//! Implementations are in infra/storage/repositories. Every method that
//! writes more than one row runs in a single database transaction.

use crate::contract::{
    ContentItem, ContentQuery, ContentType, FieldDefinition, FieldDeletionImpact, FieldOption,
    FieldValueRecord, Page, PageSection, PageSectionWidget, RepeaterGroup, Template,
    TemplateSection, Widget, WidgetContentTypeAssociation,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Replacement group list of one repeater field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeaterWrite {
    pub field_definition_id: Uuid,
    pub groups: Vec<RepeaterGroup>,
}

/// Value rows and repeater groups written together with their owner
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueBatch {
    pub records: Vec<FieldValueRecord>,
    pub repeaters: Vec<RepeaterWrite>,
}

impl ValueBatch {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.repeaters.is_empty()
    }
}

#[async_trait]
pub trait ContentTypeRepository: Send + Sync {
    async fn create(&self, content_type: &ContentType) -> Result<ContentType>;

    async fn update(&self, content_type: &ContentType) -> Result<ContentType>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContentType>>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ContentType>>;

    async fn list_all(&self) -> Result<Vec<ContentType>>;

    /// Delete the type with its fields, options, values, saved queries and widget associations
    async fn delete_cascade(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait FieldRepository: Send + Sync {
    /// Insert a field together with its options
    async fn create(&self, field: &FieldDefinition, options: &[FieldOption]) -> Result<FieldDefinition>;

    async fn update(&self, field: &FieldDefinition) -> Result<FieldDefinition>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FieldDefinition>>;

    async fn find_by_slug(&self, owner_id: Uuid, slug: &str) -> Result<Option<FieldDefinition>>;

    /// All fields of an owner, subfields included, ordered by position
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<FieldDefinition>>;

    async fn max_position(&self, owner_id: Uuid) -> Result<Option<i32>>;

    async fn list_options(&self, field_id: Uuid) -> Result<Vec<FieldOption>>;

    /// Options of several fields at once
    async fn list_options_for(&self, field_ids: &[Uuid]) -> Result<Vec<FieldOption>>;

    async fn replace_options(&self, field_id: Uuid, options: &[FieldOption]) -> Result<Vec<FieldOption>>;

    async fn deletion_impact(&self, field_id: Uuid) -> Result<FieldDeletionImpact>;

    /// Delete the field with options, values, repeater groups and subfields
    async fn delete_cascade(&self, field_id: Uuid) -> Result<()>;

    async fn reposition(&self, owner_id: Uuid, ids: &[Uuid]) -> Result<()>;

    async fn reposition_options(&self, field_id: Uuid, ids: &[Uuid]) -> Result<()>;
}

#[async_trait]
pub trait ValueRepository: Send + Sync {
    /// Insert or replace the single row of (instance, field)
    async fn upsert(&self, record: &FieldValueRecord) -> Result<FieldValueRecord>;

    /// Upsert rows and replace repeater groups in one transaction
    async fn write_batch(&self, owner_instance_id: Uuid, batch: &ValueBatch) -> Result<()>;

    async fn find(&self, owner_instance_id: Uuid, field_id: Uuid) -> Result<Option<FieldValueRecord>>;

    async fn list_for_instance(&self, owner_instance_id: Uuid) -> Result<Vec<FieldValueRecord>>;

    async fn list_for_instances(&self, owner_instance_ids: &[Uuid]) -> Result<Vec<FieldValueRecord>>;

    /// Instances other than `exclude` holding exactly `value` for the field
    async fn find_owners_with_value(
        &self,
        field_id: Uuid,
        value: &str,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Uuid>>;

    /// Groups of one repeater field ordered by `order_index`, values included
    async fn list_repeater_groups(&self, owner_instance_id: Uuid, field_id: Uuid) -> Result<Vec<RepeaterGroup>>;

    async fn replace_repeater_groups(&self, owner_instance_id: Uuid, write: &RepeaterWrite) -> Result<()>;
}

#[async_trait]
pub trait ContentItemRepository: Send + Sync {
    /// Insert the item with its values
    async fn create(&self, item: &ContentItem, values: &ValueBatch) -> Result<ContentItem>;

    /// Update the item row and write its values
    async fn update(&self, item: &ContentItem, values: &ValueBatch) -> Result<ContentItem>;

    /// Soft-deleted rows included
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContentItem>>;

    /// Soft-deleted rows included
    async fn find_by_slug(&self, content_type_id: Uuid, slug: &str) -> Result<Option<ContentItem>>;

    /// Items without `deleted_at`, oldest first
    async fn list_live_by_type(&self, content_type_id: Uuid) -> Result<Vec<ContentItem>>;

    /// Soft-deleted rows included
    async fn count_by_type(&self, content_type_id: Uuid) -> Result<u64>;

    async fn set_deleted_at(&self, id: Uuid, deleted_at: Option<DateTime<Utc>>) -> Result<()>;

    /// Hard delete with values and repeater groups
    async fn purge(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Insert; a default template clears the flag on its siblings
    async fn create(&self, template: &Template) -> Result<Template>;

    /// Update; a default template clears the flag on its siblings
    async fn update(&self, template: &Template) -> Result<Template>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Template>>;

    async fn find_by_slug(&self, theme_id: Uuid, slug: &str) -> Result<Option<Template>>;

    async fn list_by_theme(&self, theme_id: Uuid) -> Result<Vec<Template>>;

    /// Delete the template and its sections
    async fn delete_cascade(&self, id: Uuid) -> Result<()>;

    async fn create_section(&self, section: &TemplateSection) -> Result<TemplateSection>;

    async fn update_section(&self, section: &TemplateSection) -> Result<TemplateSection>;

    async fn find_section(&self, id: Uuid) -> Result<Option<TemplateSection>>;

    async fn find_section_by_slug(&self, template_id: Uuid, slug: &str) -> Result<Option<TemplateSection>>;

    /// Ordered by position
    async fn list_sections(&self, template_id: Uuid) -> Result<Vec<TemplateSection>>;

    async fn max_section_position(&self, template_id: Uuid) -> Result<Option<i32>>;

    async fn count_child_sections(&self, section_id: Uuid) -> Result<u64>;

    async fn delete_section(&self, id: Uuid) -> Result<()>;

    async fn reposition_sections(&self, template_id: Uuid, ids: &[Uuid]) -> Result<()>;
}

#[async_trait]
pub trait PageRepository: Send + Sync {
    async fn create(&self, page: &Page) -> Result<Page>;

    async fn update(&self, page: &Page) -> Result<Page>;

    /// Soft-deleted rows included
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Page>>;

    /// Soft-deleted rows included
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Page>>;

    async fn list_live(&self) -> Result<Vec<Page>>;

    /// Soft-deleted rows included
    async fn count_by_template(&self, template_id: Uuid) -> Result<u64>;

    /// Set or clear `deleted_at` on the page and its sections
    async fn set_deleted_at(&self, id: Uuid, deleted_at: Option<DateTime<Utc>>) -> Result<()>;

    async fn create_section(&self, section: &PageSection) -> Result<PageSection>;

    async fn find_section(&self, id: Uuid) -> Result<Option<PageSection>>;

    /// Live sections ordered by position
    async fn list_sections(&self, page_id: Uuid) -> Result<Vec<PageSection>>;

    async fn max_section_position(&self, page_id: Uuid) -> Result<Option<i32>>;

    /// Sections of one page bound to a template section
    async fn list_sections_for(&self, page_id: Uuid, template_section_id: Uuid) -> Result<Vec<PageSection>>;

    /// Live sections on every page bound to a template section
    async fn list_live_sections_of(&self, template_section_id: Uuid) -> Result<Vec<PageSection>>;

    /// Every page section referencing a template section, soft-deleted ones included
    async fn count_sections_for_template_section(&self, template_section_id: Uuid) -> Result<u64>;

    /// Hard delete with placements and their values
    async fn delete_section_cascade(&self, id: Uuid) -> Result<()>;

    async fn reposition_sections(&self, page_id: Uuid, ids: &[Uuid]) -> Result<()>;

    async fn create_placement(&self, placement: &PageSectionWidget) -> Result<PageSectionWidget>;

    async fn update_placement(&self, placement: &PageSectionWidget) -> Result<PageSectionWidget>;

    async fn find_placement(&self, id: Uuid) -> Result<Option<PageSectionWidget>>;

    /// Placements of the given sections ordered by position
    async fn list_placements(&self, page_section_ids: &[Uuid]) -> Result<Vec<PageSectionWidget>>;

    async fn max_placement_position(&self, page_section_id: Uuid) -> Result<Option<i32>>;

    async fn count_placements(&self, page_section_ids: &[Uuid]) -> Result<u64>;

    async fn count_placements_for_widget(&self, widget_id: Uuid) -> Result<u64>;

    /// Hard delete with its values
    async fn delete_placement_cascade(&self, id: Uuid) -> Result<()>;

    async fn reposition_placements(&self, page_section_id: Uuid, ids: &[Uuid]) -> Result<()>;
}

#[async_trait]
pub trait WidgetRepository: Send + Sync {
    async fn create(&self, widget: &Widget) -> Result<Widget>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Widget>>;

    async fn find_by_slug(&self, theme_id: Uuid, slug: &str) -> Result<Option<Widget>>;

    async fn list_by_theme(&self, theme_id: Uuid) -> Result<Vec<Widget>>;

    /// Delete the widget with its field definitions and associations
    async fn delete_cascade(&self, id: Uuid) -> Result<()>;

    async fn add_association(&self, association: &WidgetContentTypeAssociation) -> Result<WidgetContentTypeAssociation>;

    async fn find_association(
        &self,
        widget_id: Uuid,
        content_type_id: Uuid,
    ) -> Result<Option<WidgetContentTypeAssociation>>;

    async fn remove_association(&self, widget_id: Uuid, content_type_id: Uuid) -> Result<()>;

    async fn list_associations(&self, widget_id: Uuid) -> Result<Vec<WidgetContentTypeAssociation>>;
}

#[async_trait]
pub trait QueryRepository: Send + Sync {
    /// Insert the query with its filters
    async fn create(&self, query: &ContentQuery) -> Result<ContentQuery>;

    /// Update the query row and replace its filters
    async fn update(&self, query: &ContentQuery) -> Result<ContentQuery>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContentQuery>>;

    async fn list(&self, content_type_id: Option<Uuid>) -> Result<Vec<ContentQuery>>;

    /// Delete the query and its filters
    async fn delete(&self, id: Uuid) -> Result<()>;

    async fn reposition_filters(&self, query_id: Uuid, ids: &[Uuid]) -> Result<()>;
}

/// Repository set the service is built from
#[derive(Clone)]
pub struct Repositories {
    pub content_types: Arc<dyn ContentTypeRepository>,
    pub fields: Arc<dyn FieldRepository>,
    pub values: Arc<dyn ValueRepository>,
    pub items: Arc<dyn ContentItemRepository>,
    pub templates: Arc<dyn TemplateRepository>,
    pub pages: Arc<dyn PageRepository>,
    pub widgets: Arc<dyn WidgetRepository>,
    pub queries: Arc<dyn QueryRepository>,
}
