//! SeaORM repository implementations
//!
//! Every multi-row write opens its own transaction and only touches the
//! transaction handle until commit.

mod content;
mod fields;
mod layout;
mod queries;

pub use content::{SeaOrmContentItemRepository, SeaOrmContentTypeRepository};
pub use fields::{SeaOrmFieldRepository, SeaOrmValueRepository};
pub use layout::{SeaOrmPageRepository, SeaOrmTemplateRepository, SeaOrmWidgetRepository};
pub use queries::SeaOrmQueryRepository;

use super::entity::fields::{field_definition, field_option, field_value, repeater_group, repeater_value};
use crate::contract::FieldValueRecord;
use crate::domain::repository::{RepeaterWrite, Repositories, ValueBatch};
use anyhow::Result;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
};
use std::sync::Arc;
use uuid::Uuid;

/// Wire every SeaORM repository onto one connection
pub fn repositories(db: Arc<DatabaseConnection>) -> Repositories {
    Repositories {
        content_types: Arc::new(SeaOrmContentTypeRepository::new(db.clone())),
        fields: Arc::new(SeaOrmFieldRepository::new(db.clone())),
        values: Arc::new(SeaOrmValueRepository::new(db.clone())),
        items: Arc::new(SeaOrmContentItemRepository::new(db.clone())),
        templates: Arc::new(SeaOrmTemplateRepository::new(db.clone())),
        pages: Arc::new(SeaOrmPageRepository::new(db.clone())),
        widgets: Arc::new(SeaOrmWidgetRepository::new(db.clone())),
        queries: Arc::new(SeaOrmQueryRepository::new(db)),
    }
}

/// `position = index` for every listed row of one scope
async fn reposition<E, C>(
    conn: &C,
    id_col: E::Column,
    scope_col: E::Column,
    position_col: E::Column,
    scope: Uuid,
    ids: &[Uuid],
) -> Result<()>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    for (index, id) in ids.iter().enumerate() {
        E::update_many()
            .col_expr(position_col, Expr::value(i32::try_from(index)?))
            .filter(id_col.eq(*id))
            .filter(scope_col.eq(scope))
            .exec(conn)
            .await?;
    }
    Ok(())
}

async fn upsert_value<C: ConnectionTrait>(conn: &C, record: &FieldValueRecord) -> Result<()> {
    let active: field_value::ActiveModel = record.into();
    field_value::Entity::insert(active)
        .on_conflict(
            OnConflict::columns([
                field_value::Column::OwnerInstanceId,
                field_value::Column::FieldDefinitionId,
            ])
            .update_columns([field_value::Column::Value, field_value::Column::UpdatedAt])
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

async fn replace_groups<C: ConnectionTrait>(conn: &C, owner_instance_id: Uuid, write: &RepeaterWrite) -> Result<()> {
    let existing: Vec<Uuid> = repeater_group::Entity::find()
        .select_only()
        .column(repeater_group::Column::Id)
        .filter(repeater_group::Column::OwnerInstanceId.eq(owner_instance_id))
        .filter(repeater_group::Column::FieldDefinitionId.eq(write.field_definition_id))
        .into_tuple()
        .all(conn)
        .await?;

    if !existing.is_empty() {
        repeater_value::Entity::delete_many()
            .filter(repeater_value::Column::RepeaterGroupId.is_in(existing.clone()))
            .exec(conn)
            .await?;
        repeater_group::Entity::delete_many()
            .filter(repeater_group::Column::Id.is_in(existing))
            .exec(conn)
            .await?;
    }

    let now = chrono::Utc::now();
    for group in &write.groups {
        repeater_group::Entity::insert(repeater_group::ActiveModel {
            id: Set(group.id),
            owner_instance_id: Set(owner_instance_id),
            field_definition_id: Set(write.field_definition_id),
            order_index: Set(group.order_index),
            created_at: Set(now),
        })
        .exec_without_returning(conn)
        .await?;

        for (field_id, value) in &group.values {
            repeater_value::Entity::insert(repeater_value::ActiveModel {
                id: Set(Uuid::new_v4()),
                repeater_group_id: Set(group.id),
                field_definition_id: Set(*field_id),
                value: Set(value.clone()),
            })
            .exec_without_returning(conn)
            .await?;
        }
    }
    Ok(())
}

/// Upsert value rows and replace repeater groups of one instance
async fn write_values<C: ConnectionTrait>(conn: &C, owner_instance_id: Uuid, batch: &ValueBatch) -> Result<()> {
    for record in &batch.records {
        upsert_value(conn, record).await?;
    }
    for write in &batch.repeaters {
        replace_groups(conn, owner_instance_id, write).await?;
    }
    Ok(())
}

/// Values and repeater groups held by the given instances
async fn delete_instance_values<C: ConnectionTrait>(conn: &C, instance_ids: &[Uuid]) -> Result<()> {
    if instance_ids.is_empty() {
        return Ok(());
    }
    let groups: Vec<Uuid> = repeater_group::Entity::find()
        .select_only()
        .column(repeater_group::Column::Id)
        .filter(repeater_group::Column::OwnerInstanceId.is_in(instance_ids.to_vec()))
        .into_tuple()
        .all(conn)
        .await?;
    if !groups.is_empty() {
        repeater_value::Entity::delete_many()
            .filter(repeater_value::Column::RepeaterGroupId.is_in(groups.clone()))
            .exec(conn)
            .await?;
        repeater_group::Entity::delete_many()
            .filter(repeater_group::Column::Id.is_in(groups))
            .exec(conn)
            .await?;
    }
    field_value::Entity::delete_many()
        .filter(field_value::Column::OwnerInstanceId.is_in(instance_ids.to_vec()))
        .exec(conn)
        .await?;
    Ok(())
}

/// Field definitions with their options, values and repeater data
async fn delete_fields<C: ConnectionTrait>(conn: &C, field_ids: &[Uuid]) -> Result<()> {
    if field_ids.is_empty() {
        return Ok(());
    }
    let ids = field_ids.to_vec();
    let groups: Vec<Uuid> = repeater_group::Entity::find()
        .select_only()
        .column(repeater_group::Column::Id)
        .filter(repeater_group::Column::FieldDefinitionId.is_in(ids.clone()))
        .into_tuple()
        .all(conn)
        .await?;

    repeater_value::Entity::delete_many()
        .filter(
            repeater_value::Column::RepeaterGroupId
                .is_in(groups)
                .or(repeater_value::Column::FieldDefinitionId.is_in(ids.clone())),
        )
        .exec(conn)
        .await?;
    repeater_group::Entity::delete_many()
        .filter(repeater_group::Column::FieldDefinitionId.is_in(ids.clone()))
        .exec(conn)
        .await?;
    field_value::Entity::delete_many()
        .filter(field_value::Column::FieldDefinitionId.is_in(ids.clone()))
        .exec(conn)
        .await?;
    field_option::Entity::delete_many()
        .filter(field_option::Column::FieldDefinitionId.is_in(ids.clone()))
        .exec(conn)
        .await?;
    field_definition::Entity::delete_many()
        .filter(field_definition::Column::Id.is_in(ids))
        .exec(conn)
        .await?;
    Ok(())
}

/// Every field (subfields included) owned by a content type or widget
async fn owned_field_ids<C: ConnectionTrait>(conn: &C, owner_id: Uuid) -> Result<Vec<Uuid>> {
    Ok(field_definition::Entity::find()
        .select_only()
        .column(field_definition::Column::Id)
        .filter(field_definition::Column::OwnerId.eq(owner_id))
        .into_tuple()
        .all(conn)
        .await?)
}
