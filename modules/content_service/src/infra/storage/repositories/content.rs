use super::{delete_fields, delete_instance_values, owned_field_ids, write_values};
use crate::contract::{ContentItem, ContentType};
use crate::domain::repository::{ContentItemRepository, ContentTypeRepository, ValueBatch};
use crate::infra::storage::entity::content::{content_item, content_type};
use crate::infra::storage::entity::layout::widget_content_type;
use crate::infra::storage::entity::queries::{content_query, content_query_filter};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    prelude::Expr, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

// ===== Content Type Repository =====

pub struct SeaOrmContentTypeRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmContentTypeRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContentTypeRepository for SeaOrmContentTypeRepository {
    async fn create(&self, content_type: &ContentType) -> Result<ContentType> {
        let active: content_type::ActiveModel = content_type.into();
        content_type::Entity::insert(active)
            .exec_without_returning(&*self.db)
            .await?;
        Ok(content_type.clone())
    }

    async fn update(&self, content_type: &ContentType) -> Result<ContentType> {
        let active: content_type::ActiveModel = content_type.into();
        let result = content_type::Entity::update(active).exec(&*self.db).await?;
        Ok(result.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContentType>> {
        let result = content_type::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(result.map(Into::into))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ContentType>> {
        let result = content_type::Entity::find()
            .filter(content_type::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?;
        Ok(result.map(Into::into))
    }

    async fn list_all(&self) -> Result<Vec<ContentType>> {
        let results = content_type::Entity::find()
            .order_by_asc(content_type::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn delete_cascade(&self, id: Uuid) -> Result<()> {
        let txn = self.db.begin().await?;

        let fields = owned_field_ids(&txn, id).await?;
        delete_fields(&txn, &fields).await?;

        let queries: Vec<Uuid> = content_query::Entity::find()
            .select_only()
            .column(content_query::Column::Id)
            .filter(content_query::Column::ContentTypeId.eq(id))
            .into_tuple()
            .all(&txn)
            .await?;
        if !queries.is_empty() {
            content_query_filter::Entity::delete_many()
                .filter(content_query_filter::Column::ContentQueryId.is_in(queries.clone()))
                .exec(&txn)
                .await?;
            content_query::Entity::delete_many()
                .filter(content_query::Column::Id.is_in(queries))
                .exec(&txn)
                .await?;
        }

        widget_content_type::Entity::delete_many()
            .filter(widget_content_type::Column::ContentTypeId.eq(id))
            .exec(&txn)
            .await?;
        content_type::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }
}

// ===== Content Item Repository =====

pub struct SeaOrmContentItemRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmContentItemRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContentItemRepository for SeaOrmContentItemRepository {
    async fn create(&self, item: &ContentItem, values: &ValueBatch) -> Result<ContentItem> {
        let txn = self.db.begin().await?;
        let active: content_item::ActiveModel = item.into();
        content_item::Entity::insert(active).exec_without_returning(&txn).await?;
        write_values(&txn, item.id, values).await?;
        txn.commit().await?;
        Ok(item.clone())
    }

    async fn update(&self, item: &ContentItem, values: &ValueBatch) -> Result<ContentItem> {
        let txn = self.db.begin().await?;
        let active: content_item::ActiveModel = item.into();
        let result = content_item::Entity::update(active).exec(&txn).await?;
        write_values(&txn, item.id, values).await?;
        txn.commit().await?;
        result.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContentItem>> {
        content_item::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn find_by_slug(&self, content_type_id: Uuid, slug: &str) -> Result<Option<ContentItem>> {
        content_item::Entity::find()
            .filter(content_item::Column::ContentTypeId.eq(content_type_id))
            .filter(content_item::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn list_live_by_type(&self, content_type_id: Uuid) -> Result<Vec<ContentItem>> {
        content_item::Entity::find()
            .filter(content_item::Column::ContentTypeId.eq(content_type_id))
            .filter(content_item::Column::DeletedAt.is_null())
            .order_by_asc(content_item::Column::CreatedAt)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }

    async fn count_by_type(&self, content_type_id: Uuid) -> Result<u64> {
        Ok(content_item::Entity::find()
            .filter(content_item::Column::ContentTypeId.eq(content_type_id))
            .count(&*self.db)
            .await?)
    }

    async fn set_deleted_at(&self, id: Uuid, deleted_at: Option<DateTime<Utc>>) -> Result<()> {
        content_item::Entity::update_many()
            .col_expr(content_item::Column::DeletedAt, Expr::value(deleted_at))
            .filter(content_item::Column::Id.eq(id))
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    async fn purge(&self, id: Uuid) -> Result<()> {
        let txn = self.db.begin().await?;
        delete_instance_values(&txn, &[id]).await?;
        content_item::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }
}
