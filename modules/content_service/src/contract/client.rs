//! Native client trait for inter-module communication
//!
//! This trait defines the API that other modules use to read and write content.
//! NO HTTP - direct function calls.

use super::error::ContentError;
use super::model::{
    Actor, ContentItem, ContentItemPatch, ContentType, FieldValue, NewContentItem, PageLayout,
    PageNode, QueryDefinition,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Content service API for inter-module communication
#[async_trait]
pub trait ContentApi: Send + Sync {
    // ===== Content types =====

    async fn get_content_type(&self, id: Uuid) -> Result<ContentType, ContentError>;

    async fn list_content_types(&self) -> Result<Vec<ContentType>, ContentError>;

    // ===== Content items =====

    async fn create_content_item(
        &self,
        content_type_id: Uuid,
        input: NewContentItem,
        actor: Actor,
    ) -> Result<ContentItem, ContentError>;

    async fn update_content_item(
        &self,
        id: Uuid,
        patch: ContentItemPatch,
        actor: Actor,
    ) -> Result<ContentItem, ContentError>;

    async fn get_content_item(&self, id: Uuid) -> Result<ContentItem, ContentError>;

    /// Slug -> value for every top-level field of the item's type
    async fn get_content_item_values(&self, id: Uuid) -> Result<BTreeMap<String, FieldValue>, ContentError>;

    /// Soft delete
    async fn delete_content_item(&self, id: Uuid) -> Result<(), ContentError>;

    // ===== Raw field values =====

    async fn get_value(&self, owner_instance_id: Uuid, field_id: Uuid) -> Result<FieldValue, ContentError>;

    async fn set_value(
        &self,
        owner_instance_id: Uuid,
        field_id: Uuid,
        raw: serde_json::Value,
    ) -> Result<FieldValue, ContentError>;

    // ===== Queries and rendering =====

    /// Run a saved query in strict mode
    async fn run_content_query(&self, query_id: Uuid) -> Result<Vec<ContentItem>, ContentError>;

    /// Run an unsaved definition in strict mode
    async fn run_query_definition(&self, definition: QueryDefinition) -> Result<Vec<ContentItem>, ContentError>;

    async fn render_page(&self, page_id: Uuid) -> Result<PageLayout, ContentError>;

    async fn page_tree(&self) -> Result<Vec<PageNode>, ContentError>;
}
