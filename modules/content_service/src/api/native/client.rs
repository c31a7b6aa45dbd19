//! Native client implementation - wraps domain service for in-process calls

use crate::contract::{
    Actor, ContentApi, ContentError, ContentItem, ContentItemPatch, ContentType, EvaluationMode, FieldValue,
    NewContentItem, PageLayout, PageNode, QueryDefinition,
};
use crate::domain::Service;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Native client implementation that directly calls the domain service
///
/// Queries run in strict mode: in-process callers author them and want
/// malformed filters reported.
#[derive(Clone)]
pub struct NativeClient {
    service: Arc<Service>,
}

impl NativeClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ContentApi for NativeClient {
    async fn get_content_type(&self, id: Uuid) -> Result<ContentType, ContentError> {
        self.service.get_content_type(id).await
    }

    async fn list_content_types(&self) -> Result<Vec<ContentType>, ContentError> {
        self.service.list_content_types().await
    }

    async fn create_content_item(
        &self,
        content_type_id: Uuid,
        input: NewContentItem,
        actor: Actor,
    ) -> Result<ContentItem, ContentError> {
        self.service.create_content_item(content_type_id, input, actor).await
    }

    async fn update_content_item(
        &self,
        id: Uuid,
        patch: ContentItemPatch,
        actor: Actor,
    ) -> Result<ContentItem, ContentError> {
        self.service.update_content_item(id, patch, actor).await
    }

    async fn get_content_item(&self, id: Uuid) -> Result<ContentItem, ContentError> {
        self.service.get_content_item(id).await
    }

    async fn get_content_item_values(&self, id: Uuid) -> Result<BTreeMap<String, FieldValue>, ContentError> {
        self.service.get_content_item_values(id).await
    }

    async fn delete_content_item(&self, id: Uuid) -> Result<(), ContentError> {
        self.service.delete_content_item(id).await
    }

    async fn get_value(&self, owner_instance_id: Uuid, field_id: Uuid) -> Result<FieldValue, ContentError> {
        self.service.get_value(owner_instance_id, field_id).await
    }

    async fn set_value(
        &self,
        owner_instance_id: Uuid,
        field_id: Uuid,
        raw: serde_json::Value,
    ) -> Result<FieldValue, ContentError> {
        self.service.set_value(owner_instance_id, field_id, raw).await
    }

    async fn run_content_query(&self, query_id: Uuid) -> Result<Vec<ContentItem>, ContentError> {
        self.service.run_content_query(query_id, EvaluationMode::Strict).await
    }

    async fn run_query_definition(&self, definition: QueryDefinition) -> Result<Vec<ContentItem>, ContentError> {
        self.service
            .run_query_definition(&definition, EvaluationMode::Strict)
            .await
    }

    async fn render_page(&self, page_id: Uuid) -> Result<PageLayout, ContentError> {
        self.service.render_page(page_id).await
    }

    async fn page_tree(&self) -> Result<Vec<PageNode>, ContentError> {
        self.service.page_tree().await
    }
}
