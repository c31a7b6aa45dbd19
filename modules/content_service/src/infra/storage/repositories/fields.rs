use super::{delete_fields, reposition, replace_groups, upsert_value, write_values};
use crate::contract::{FieldDefinition, FieldDeletionImpact, FieldOption, FieldValueRecord, RepeaterGroup};
use crate::domain::repository::{FieldRepository, RepeaterWrite, ValueBatch, ValueRepository};
use crate::infra::storage::entity::fields::{
    field_definition, field_option, field_value, repeater_group, repeater_value,
};
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

// ===== Field Repository =====

pub struct SeaOrmFieldRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmFieldRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn subfield_ids(&self, field_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(field_definition::Entity::find()
            .select_only()
            .column(field_definition::Column::Id)
            .filter(field_definition::Column::ParentFieldId.eq(field_id))
            .into_tuple()
            .all(&*self.db)
            .await?)
    }
}

#[async_trait]
impl FieldRepository for SeaOrmFieldRepository {
    async fn create(&self, field: &FieldDefinition, options: &[FieldOption]) -> Result<FieldDefinition> {
        let txn = self.db.begin().await?;
        let active: field_definition::ActiveModel = field.into();
        field_definition::Entity::insert(active)
            .exec_without_returning(&txn)
            .await?;
        for option in options {
            let active: field_option::ActiveModel = option.into();
            field_option::Entity::insert(active).exec_without_returning(&txn).await?;
        }
        txn.commit().await?;
        Ok(field.clone())
    }

    async fn update(&self, field: &FieldDefinition) -> Result<FieldDefinition> {
        let active: field_definition::ActiveModel = field.into();
        let result = field_definition::Entity::update(active).exec(&*self.db).await?;
        result.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FieldDefinition>> {
        field_definition::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn find_by_slug(&self, owner_id: Uuid, slug: &str) -> Result<Option<FieldDefinition>> {
        field_definition::Entity::find()
            .filter(field_definition::Column::OwnerId.eq(owner_id))
            .filter(field_definition::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<FieldDefinition>> {
        field_definition::Entity::find()
            .filter(field_definition::Column::OwnerId.eq(owner_id))
            .order_by_asc(field_definition::Column::Position)
            .order_by_asc(field_definition::Column::CreatedAt)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }

    async fn max_position(&self, owner_id: Uuid) -> Result<Option<i32>> {
        let last = field_definition::Entity::find()
            .filter(field_definition::Column::OwnerId.eq(owner_id))
            .order_by_desc(field_definition::Column::Position)
            .one(&*self.db)
            .await?;
        Ok(last.map(|f| f.position))
    }

    async fn list_options(&self, field_id: Uuid) -> Result<Vec<FieldOption>> {
        self.list_options_for(&[field_id]).await
    }

    async fn list_options_for(&self, field_ids: &[Uuid]) -> Result<Vec<FieldOption>> {
        if field_ids.is_empty() {
            return Ok(Vec::new());
        }
        let results = field_option::Entity::find()
            .filter(field_option::Column::FieldDefinitionId.is_in(field_ids.to_vec()))
            .order_by_asc(field_option::Column::Position)
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn replace_options(&self, field_id: Uuid, options: &[FieldOption]) -> Result<Vec<FieldOption>> {
        let txn = self.db.begin().await?;
        field_option::Entity::delete_many()
            .filter(field_option::Column::FieldDefinitionId.eq(field_id))
            .exec(&txn)
            .await?;
        for option in options {
            let active: field_option::ActiveModel = option.into();
            field_option::Entity::insert(active).exec_without_returning(&txn).await?;
        }
        txn.commit().await?;
        Ok(options.to_vec())
    }

    async fn deletion_impact(&self, field_id: Uuid) -> Result<FieldDeletionImpact> {
        let subfields = self.subfield_ids(field_id).await?;
        let mut ids = subfields.clone();
        ids.push(field_id);

        let options = field_option::Entity::find()
            .filter(field_option::Column::FieldDefinitionId.is_in(ids.clone()))
            .count(&*self.db)
            .await?;
        let values = field_value::Entity::find()
            .filter(field_value::Column::FieldDefinitionId.is_in(ids.clone()))
            .count(&*self.db)
            .await?;
        let repeater_values = repeater_value::Entity::find()
            .filter(repeater_value::Column::FieldDefinitionId.is_in(ids.clone()))
            .count(&*self.db)
            .await?;
        let repeater_groups = repeater_group::Entity::find()
            .filter(repeater_group::Column::FieldDefinitionId.is_in(ids))
            .count(&*self.db)
            .await?;

        Ok(FieldDeletionImpact {
            options,
            values: values + repeater_values,
            repeater_groups,
            subfields: subfields.len() as u64,
        })
    }

    async fn delete_cascade(&self, field_id: Uuid) -> Result<()> {
        let mut ids = self.subfield_ids(field_id).await?;
        ids.push(field_id);

        let txn = self.db.begin().await?;
        delete_fields(&txn, &ids).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn reposition(&self, owner_id: Uuid, ids: &[Uuid]) -> Result<()> {
        let txn = self.db.begin().await?;
        reposition::<field_definition::Entity, _>(
            &txn,
            field_definition::Column::Id,
            field_definition::Column::OwnerId,
            field_definition::Column::Position,
            owner_id,
            ids,
        )
        .await?;
        txn.commit().await?;
        Ok(())
    }

    async fn reposition_options(&self, field_id: Uuid, ids: &[Uuid]) -> Result<()> {
        let txn = self.db.begin().await?;
        reposition::<field_option::Entity, _>(
            &txn,
            field_option::Column::Id,
            field_option::Column::FieldDefinitionId,
            field_option::Column::Position,
            field_id,
            ids,
        )
        .await?;
        txn.commit().await?;
        Ok(())
    }
}

// ===== Value Repository =====

pub struct SeaOrmValueRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmValueRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ValueRepository for SeaOrmValueRepository {
    async fn upsert(&self, record: &FieldValueRecord) -> Result<FieldValueRecord> {
        upsert_value(&*self.db, record).await?;
        let stored = self
            .find(record.owner_instance_id, record.field_definition_id)
            .await?;
        stored.ok_or_else(|| anyhow::anyhow!("field value vanished after upsert"))
    }

    async fn write_batch(&self, owner_instance_id: Uuid, batch: &ValueBatch) -> Result<()> {
        let txn = self.db.begin().await?;
        write_values(&txn, owner_instance_id, batch).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn find(&self, owner_instance_id: Uuid, field_id: Uuid) -> Result<Option<FieldValueRecord>> {
        let result = field_value::Entity::find()
            .filter(field_value::Column::OwnerInstanceId.eq(owner_instance_id))
            .filter(field_value::Column::FieldDefinitionId.eq(field_id))
            .one(&*self.db)
            .await?;
        Ok(result.map(Into::into))
    }

    async fn list_for_instance(&self, owner_instance_id: Uuid) -> Result<Vec<FieldValueRecord>> {
        self.list_for_instances(&[owner_instance_id]).await
    }

    async fn list_for_instances(&self, owner_instance_ids: &[Uuid]) -> Result<Vec<FieldValueRecord>> {
        if owner_instance_ids.is_empty() {
            return Ok(Vec::new());
        }
        let results = field_value::Entity::find()
            .filter(field_value::Column::OwnerInstanceId.is_in(owner_instance_ids.to_vec()))
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn find_owners_with_value(
        &self,
        field_id: Uuid,
        value: &str,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Uuid>> {
        let mut query = field_value::Entity::find()
            .select_only()
            .column(field_value::Column::OwnerInstanceId)
            .filter(field_value::Column::FieldDefinitionId.eq(field_id))
            .filter(field_value::Column::Value.eq(value));
        if let Some(exclude) = exclude {
            query = query.filter(field_value::Column::OwnerInstanceId.ne(exclude));
        }
        Ok(query.into_tuple().all(&*self.db).await?)
    }

    async fn list_repeater_groups(&self, owner_instance_id: Uuid, field_id: Uuid) -> Result<Vec<RepeaterGroup>> {
        let groups = repeater_group::Entity::find()
            .filter(repeater_group::Column::OwnerInstanceId.eq(owner_instance_id))
            .filter(repeater_group::Column::FieldDefinitionId.eq(field_id))
            .order_by_asc(repeater_group::Column::OrderIndex)
            .all(&*self.db)
            .await?;
        if groups.is_empty() {
            return Ok(Vec::new());
        }

        let mut values: HashMap<Uuid, BTreeMap<Uuid, Option<String>>> = HashMap::new();
        for row in repeater_value::Entity::find()
            .filter(repeater_value::Column::RepeaterGroupId.is_in(groups.iter().map(|g| g.id)))
            .all(&*self.db)
            .await?
        {
            values
                .entry(row.repeater_group_id)
                .or_default()
                .insert(row.field_definition_id, row.value);
        }

        Ok(groups
            .into_iter()
            .map(|group| RepeaterGroup {
                id: group.id,
                owner_instance_id: group.owner_instance_id,
                field_definition_id: group.field_definition_id,
                order_index: group.order_index,
                values: values.remove(&group.id).unwrap_or_default(),
            })
            .collect())
    }

    async fn replace_repeater_groups(&self, owner_instance_id: Uuid, write: &RepeaterWrite) -> Result<()> {
        let txn = self.db.begin().await?;
        replace_groups(&txn, owner_instance_id, write).await?;
        txn.commit().await?;
        Ok(())
    }
}
