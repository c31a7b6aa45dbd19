use super::reposition;
use crate::contract::ContentQuery;
use crate::domain::repository::QueryRepository;
use crate::infra::storage::entity::queries::{content_query, content_query_filter};
use crate::infra::storage::mapper::{content_query_from_parts, filter_active_model};
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub struct SeaOrmQueryRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmQueryRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

async fn insert_filters<C: ConnectionTrait>(conn: &C, query: &ContentQuery) -> Result<()> {
    for filter in &query.filters {
        content_query_filter::Entity::insert(filter_active_model(query.id, filter))
            .exec_without_returning(conn)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl QueryRepository for SeaOrmQueryRepository {
    async fn create(&self, query: &ContentQuery) -> Result<ContentQuery> {
        let active = content_query::ActiveModel::try_from(query)?;
        let txn = self.db.begin().await?;
        content_query::Entity::insert(active).exec_without_returning(&txn).await?;
        insert_filters(&txn, query).await?;
        txn.commit().await?;
        Ok(query.clone())
    }

    async fn update(&self, query: &ContentQuery) -> Result<ContentQuery> {
        let active = content_query::ActiveModel::try_from(query)?;
        let txn = self.db.begin().await?;
        content_query::Entity::update(active).exec(&txn).await?;
        content_query_filter::Entity::delete_many()
            .filter(content_query_filter::Column::ContentQueryId.eq(query.id))
            .exec(&txn)
            .await?;
        insert_filters(&txn, query).await?;
        txn.commit().await?;
        Ok(query.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContentQuery>> {
        let Some(entity) = content_query::Entity::find_by_id(id).one(&*self.db).await? else {
            return Ok(None);
        };
        let filters = content_query_filter::Entity::find()
            .filter(content_query_filter::Column::ContentQueryId.eq(id))
            .order_by_asc(content_query_filter::Column::Position)
            .all(&*self.db)
            .await?;
        content_query_from_parts(entity, filters).map(Some)
    }

    async fn list(&self, content_type_id: Option<Uuid>) -> Result<Vec<ContentQuery>> {
        let mut select = content_query::Entity::find();
        if let Some(content_type_id) = content_type_id {
            select = select.filter(content_query::Column::ContentTypeId.eq(content_type_id));
        }
        let queries = select
            .order_by_asc(content_query::Column::Name)
            .all(&*self.db)
            .await?;
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let mut filters: HashMap<Uuid, Vec<content_query_filter::Model>> = HashMap::new();
        for row in content_query_filter::Entity::find()
            .filter(content_query_filter::Column::ContentQueryId.is_in(queries.iter().map(|q| q.id)))
            .all(&*self.db)
            .await?
        {
            filters.entry(row.content_query_id).or_default().push(row);
        }

        queries
            .into_iter()
            .map(|entity| {
                let rows = filters.remove(&entity.id).unwrap_or_default();
                content_query_from_parts(entity, rows)
            })
            .collect()
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let txn = self.db.begin().await?;
        content_query_filter::Entity::delete_many()
            .filter(content_query_filter::Column::ContentQueryId.eq(id))
            .exec(&txn)
            .await?;
        content_query::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn reposition_filters(&self, query_id: Uuid, ids: &[Uuid]) -> Result<()> {
        let txn = self.db.begin().await?;
        reposition::<content_query_filter::Entity, _>(
            &txn,
            content_query_filter::Column::Id,
            content_query_filter::Column::ContentQueryId,
            content_query_filter::Column::Position,
            query_id,
            ids,
        )
        .await?;
        txn.commit().await?;
        Ok(())
    }
}
