//! Saved content queries and query evaluation

use super::{Service, StorageResultExt};
use crate::contract::{
    ContentError, ContentItem, ContentQuery, ContentQueryFilter, EvaluationMode, FieldErrors, FieldOwner,
    QueryDefinition,
};
use crate::domain::query::{self, PlacementQuery, StoredValues};
use crate::domain::validation;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

impl Service {
    /// Save a named query; the definition is compiled strictly first
    pub async fn create_content_query(
        &self,
        name: String,
        definition: QueryDefinition,
    ) -> Result<ContentQuery, ContentError> {
        let mut errors = FieldErrors::new();
        validation::require_text(&mut errors, "name", &name);
        errors.into_result()?;
        self.check_definition(&definition).await?;

        let now = Utc::now();
        let content_query = ContentQuery {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            content_type_id: definition.content_type_id,
            limit: definition.limit,
            offset: definition.offset,
            order_by: definition.order_by,
            order_direction: definition.order_direction,
            filters: stored_filters(definition.filters),
            created_at: now,
            updated_at: now,
        };
        let created = self
            .repos
            .queries
            .create(&content_query)
            .await
            .or_internal("create content query")?;
        tracing::info!(
            query_id = %created.id,
            content_type_id = %created.content_type_id,
            filters = created.filters.len(),
            "Created content query"
        );
        Ok(created)
    }

    /// Replace the definition (filters included) of a saved query
    pub async fn update_content_query(
        &self,
        id: Uuid,
        name: Option<String>,
        definition: QueryDefinition,
    ) -> Result<ContentQuery, ContentError> {
        let mut content_query = self.get_content_query(id).await?;
        if let Some(name) = name {
            let mut errors = FieldErrors::new();
            validation::require_text(&mut errors, "name", &name);
            errors.into_result()?;
            content_query.name = name.trim().to_string();
        }
        self.check_definition(&definition).await?;

        content_query.content_type_id = definition.content_type_id;
        content_query.limit = definition.limit;
        content_query.offset = definition.offset;
        content_query.order_by = definition.order_by;
        content_query.order_direction = definition.order_direction;
        content_query.filters = stored_filters(definition.filters);
        content_query.updated_at = Utc::now();

        let updated = self
            .repos
            .queries
            .update(&content_query)
            .await
            .or_internal("update content query")?;
        tracing::info!(query_id = %updated.id, filters = updated.filters.len(), "Updated content query");
        Ok(updated)
    }

    pub async fn get_content_query(&self, id: Uuid) -> Result<ContentQuery, ContentError> {
        self.repos
            .queries
            .find_by_id(id)
            .await
            .or_internal("find content query")?
            .ok_or_else(|| ContentError::not_found("content_query", id))
    }

    pub async fn list_content_queries(&self, content_type_id: Option<Uuid>) -> Result<Vec<ContentQuery>, ContentError> {
        self.repos
            .queries
            .list(content_type_id)
            .await
            .or_internal("list content queries")
    }

    pub async fn delete_content_query(&self, id: Uuid) -> Result<(), ContentError> {
        self.get_content_query(id).await?;
        self.repos
            .queries
            .delete(id)
            .await
            .or_internal("delete content query")?;
        tracing::info!(query_id = %id, "Deleted content query");
        Ok(())
    }

    pub async fn run_content_query(&self, id: Uuid, mode: EvaluationMode) -> Result<Vec<ContentItem>, ContentError> {
        let content_query = self.get_content_query(id).await?;
        self.evaluate_definition(&content_query.definition(), mode).await
    }

    pub async fn run_query_definition(
        &self,
        definition: &QueryDefinition,
        mode: EvaluationMode,
    ) -> Result<Vec<ContentItem>, ContentError> {
        self.evaluate_definition(definition, mode).await
    }

    /// Resolve and evaluate a placement's `content_query` blob
    pub(super) async fn evaluate_placement_query(
        &self,
        blob: &Value,
        mode: EvaluationMode,
    ) -> Result<Vec<ContentItem>, ContentError> {
        match query::parse_placement_query(blob, mode)? {
            PlacementQuery::Saved(query_id) => self.run_content_query(query_id, mode).await,
            PlacementQuery::Inline(definition) => self.evaluate_definition(&definition, mode).await,
        }
    }

    /// Strict compile of filters and order key against the type's fields
    pub(super) async fn check_definition(&self, definition: &QueryDefinition) -> Result<(), ContentError> {
        self.get_content_type(definition.content_type_id).await?;
        if definition
            .limit
            .is_some_and(|limit| limit > self.config.max_query_limit)
        {
            return Err(ContentError::validation(
                "limit",
                format!("The limit may not be greater than {}.", self.config.max_query_limit),
            ));
        }

        let fields = self
            .list_fields(FieldOwner::ContentType(definition.content_type_id))
            .await?;
        query::compile_filters(&definition.filters, &fields, EvaluationMode::Strict)?;
        query::resolve_order(definition.order_by.as_deref(), &fields, EvaluationMode::Strict)?;
        Ok(())
    }

    async fn evaluate_definition(
        &self,
        definition: &QueryDefinition,
        mode: EvaluationMode,
    ) -> Result<Vec<ContentItem>, ContentError> {
        self.get_content_type(definition.content_type_id).await?;
        let fields = self
            .list_fields(FieldOwner::ContentType(definition.content_type_id))
            .await?;
        let items = self
            .repos
            .items
            .list_live_by_type(definition.content_type_id)
            .await
            .or_internal("list content items")?;

        let item_ids: Vec<Uuid> = items.iter().map(|item| item.id).collect();
        let mut stored: StoredValues = HashMap::new();
        for record in self
            .repos
            .values
            .list_for_instances(&item_ids)
            .await
            .or_internal("list field values")?
        {
            stored
                .entry(record.owner_instance_id)
                .or_default()
                .insert(record.field_definition_id, record.value);
        }

        let mut capped = definition.clone();
        let max = self.config.max_query_limit;
        capped.limit = Some(capped.limit.map_or(max, |limit| limit.min(max)));

        let selected = query::evaluate(&capped, &fields, &items, &stored, mode)?;
        tracing::debug!(
            content_type_id = %definition.content_type_id,
            candidates = items.len(),
            selected = selected.len(),
            ?mode,
            "Evaluated content query"
        );
        Ok(selected)
    }
}

fn stored_filters(filters: Vec<crate::contract::QueryFilter>) -> Vec<ContentQueryFilter> {
    filters
        .into_iter()
        .zip(0..)
        .map(|(filter, position)| ContentQueryFilter {
            id: Uuid::new_v4(),
            position,
            filter,
        })
        .collect()
}
