use super::{delete_fields, delete_instance_values, owned_field_ids, reposition};
use crate::contract::{Page, PageSection, PageSectionWidget, Template, TemplateSection, Widget, WidgetContentTypeAssociation};
use crate::domain::repository::{PageRepository, TemplateRepository, WidgetRepository};
use crate::infra::storage::entity::layout::{
    page, page_section, page_section_widget, template, template_section, widget, widget_content_type,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    prelude::Expr, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

// ===== Template Repository =====

pub struct SeaOrmTemplateRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmTemplateRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

/// At most one default template per theme
async fn clear_other_defaults<C: ConnectionTrait>(conn: &C, template: &Template) -> Result<()> {
    if template.is_default {
        template::Entity::update_many()
            .col_expr(template::Column::IsDefault, Expr::value(false))
            .filter(template::Column::ThemeId.eq(template.theme_id))
            .filter(template::Column::Id.ne(template.id))
            .exec(conn)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl TemplateRepository for SeaOrmTemplateRepository {
    async fn create(&self, template: &Template) -> Result<Template> {
        let txn = self.db.begin().await?;
        clear_other_defaults(&txn, template).await?;
        let active: template::ActiveModel = template.into();
        template::Entity::insert(active).exec_without_returning(&txn).await?;
        txn.commit().await?;
        Ok(template.clone())
    }

    async fn update(&self, template: &Template) -> Result<Template> {
        let txn = self.db.begin().await?;
        clear_other_defaults(&txn, template).await?;
        let active: template::ActiveModel = template.into();
        let result = template::Entity::update(active).exec(&txn).await?;
        txn.commit().await?;
        Ok(result.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Template>> {
        let result = template::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(result.map(Into::into))
    }

    async fn find_by_slug(&self, theme_id: Uuid, slug: &str) -> Result<Option<Template>> {
        let result = template::Entity::find()
            .filter(template::Column::ThemeId.eq(theme_id))
            .filter(template::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?;
        Ok(result.map(Into::into))
    }

    async fn list_by_theme(&self, theme_id: Uuid) -> Result<Vec<Template>> {
        let results = template::Entity::find()
            .filter(template::Column::ThemeId.eq(theme_id))
            .order_by_asc(template::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn delete_cascade(&self, id: Uuid) -> Result<()> {
        let txn = self.db.begin().await?;
        template_section::Entity::delete_many()
            .filter(template_section::Column::TemplateId.eq(id))
            .exec(&txn)
            .await?;
        template::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn create_section(&self, section: &TemplateSection) -> Result<TemplateSection> {
        let active = template_section::ActiveModel::try_from(section)?;
        template_section::Entity::insert(active)
            .exec_without_returning(&*self.db)
            .await?;
        Ok(section.clone())
    }

    async fn update_section(&self, section: &TemplateSection) -> Result<TemplateSection> {
        let active = template_section::ActiveModel::try_from(section)?;
        let result = template_section::Entity::update(active).exec(&*self.db).await?;
        result.try_into()
    }

    async fn find_section(&self, id: Uuid) -> Result<Option<TemplateSection>> {
        template_section::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn find_section_by_slug(&self, template_id: Uuid, slug: &str) -> Result<Option<TemplateSection>> {
        template_section::Entity::find()
            .filter(template_section::Column::TemplateId.eq(template_id))
            .filter(template_section::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn list_sections(&self, template_id: Uuid) -> Result<Vec<TemplateSection>> {
        template_section::Entity::find()
            .filter(template_section::Column::TemplateId.eq(template_id))
            .order_by_asc(template_section::Column::Position)
            .order_by_asc(template_section::Column::CreatedAt)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }

    async fn max_section_position(&self, template_id: Uuid) -> Result<Option<i32>> {
        let last = template_section::Entity::find()
            .filter(template_section::Column::TemplateId.eq(template_id))
            .order_by_desc(template_section::Column::Position)
            .one(&*self.db)
            .await?;
        Ok(last.map(|s| s.position))
    }

    async fn count_child_sections(&self, section_id: Uuid) -> Result<u64> {
        Ok(template_section::Entity::find()
            .filter(template_section::Column::ParentId.eq(section_id))
            .count(&*self.db)
            .await?)
    }

    async fn delete_section(&self, id: Uuid) -> Result<()> {
        template_section::Entity::delete_by_id(id).exec(&*self.db).await?;
        Ok(())
    }

    async fn reposition_sections(&self, template_id: Uuid, ids: &[Uuid]) -> Result<()> {
        let txn = self.db.begin().await?;
        reposition::<template_section::Entity, _>(
            &txn,
            template_section::Column::Id,
            template_section::Column::TemplateId,
            template_section::Column::Position,
            template_id,
            ids,
        )
        .await?;
        txn.commit().await?;
        Ok(())
    }
}

// ===== Page Repository =====

pub struct SeaOrmPageRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmPageRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

async fn placement_ids<C: ConnectionTrait>(conn: &C, page_section_ids: Vec<Uuid>) -> Result<Vec<Uuid>> {
    Ok(page_section_widget::Entity::find()
        .select_only()
        .column(page_section_widget::Column::Id)
        .filter(page_section_widget::Column::PageSectionId.is_in(page_section_ids))
        .into_tuple()
        .all(conn)
        .await?)
}

#[async_trait]
impl PageRepository for SeaOrmPageRepository {
    async fn create(&self, page: &Page) -> Result<Page> {
        let active: page::ActiveModel = page.into();
        page::Entity::insert(active).exec_without_returning(&*self.db).await?;
        Ok(page.clone())
    }

    async fn update(&self, page: &Page) -> Result<Page> {
        let active: page::ActiveModel = page.into();
        let result = page::Entity::update(active).exec(&*self.db).await?;
        result.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Page>> {
        page::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Page>> {
        page::Entity::find()
            .filter(page::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn list_live(&self) -> Result<Vec<Page>> {
        page::Entity::find()
            .filter(page::Column::DeletedAt.is_null())
            .order_by_asc(page::Column::MenuOrder)
            .order_by_asc(page::Column::CreatedAt)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(TryInto::try_into)
            .collect()
    }

    async fn count_by_template(&self, template_id: Uuid) -> Result<u64> {
        Ok(page::Entity::find()
            .filter(page::Column::TemplateId.eq(template_id))
            .count(&*self.db)
            .await?)
    }

    async fn set_deleted_at(&self, id: Uuid, deleted_at: Option<DateTime<Utc>>) -> Result<()> {
        let txn = self.db.begin().await?;
        page::Entity::update_many()
            .col_expr(page::Column::DeletedAt, Expr::value(deleted_at))
            .filter(page::Column::Id.eq(id))
            .exec(&txn)
            .await?;
        page_section::Entity::update_many()
            .col_expr(page_section::Column::DeletedAt, Expr::value(deleted_at))
            .filter(page_section::Column::PageId.eq(id))
            .exec(&txn)
            .await?;
        txn.commit().await?;
        Ok(())
    }

    async fn create_section(&self, section: &PageSection) -> Result<PageSection> {
        let active: page_section::ActiveModel = section.into();
        page_section::Entity::insert(active)
            .exec_without_returning(&*self.db)
            .await?;
        Ok(section.clone())
    }

    async fn find_section(&self, id: Uuid) -> Result<Option<PageSection>> {
        let result = page_section::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(result.map(Into::into))
    }

    async fn list_sections(&self, page_id: Uuid) -> Result<Vec<PageSection>> {
        let results = page_section::Entity::find()
            .filter(page_section::Column::PageId.eq(page_id))
            .filter(page_section::Column::DeletedAt.is_null())
            .order_by_asc(page_section::Column::Position)
            .order_by_asc(page_section::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn max_section_position(&self, page_id: Uuid) -> Result<Option<i32>> {
        let last = page_section::Entity::find()
            .filter(page_section::Column::PageId.eq(page_id))
            .filter(page_section::Column::DeletedAt.is_null())
            .order_by_desc(page_section::Column::Position)
            .one(&*self.db)
            .await?;
        Ok(last.map(|s| s.position))
    }

    async fn list_sections_for(&self, page_id: Uuid, template_section_id: Uuid) -> Result<Vec<PageSection>> {
        let results = page_section::Entity::find()
            .filter(page_section::Column::PageId.eq(page_id))
            .filter(page_section::Column::TemplateSectionId.eq(template_section_id))
            .filter(page_section::Column::DeletedAt.is_null())
            .order_by_asc(page_section::Column::Position)
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn list_live_sections_of(&self, template_section_id: Uuid) -> Result<Vec<PageSection>> {
        let results = page_section::Entity::find()
            .filter(page_section::Column::TemplateSectionId.eq(template_section_id))
            .filter(page_section::Column::DeletedAt.is_null())
            .order_by_asc(page_section::Column::PageId)
            .order_by_asc(page_section::Column::Position)
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn count_sections_for_template_section(&self, template_section_id: Uuid) -> Result<u64> {
        Ok(page_section::Entity::find()
            .filter(page_section::Column::TemplateSectionId.eq(template_section_id))
            .count(&*self.db)
            .await?)
    }

    async fn delete_section_cascade(&self, id: Uuid) -> Result<()> {
        let txn = self.db.begin().await?;
        let placements = placement_ids(&txn, vec![id]).await?;
        delete_instance_values(&txn, &placements).await?;
        page_section_widget::Entity::delete_many()
            .filter(page_section_widget::Column::PageSectionId.eq(id))
            .exec(&txn)
            .await?;
        page_section::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn reposition_sections(&self, page_id: Uuid, ids: &[Uuid]) -> Result<()> {
        let txn = self.db.begin().await?;
        reposition::<page_section::Entity, _>(
            &txn,
            page_section::Column::Id,
            page_section::Column::PageId,
            page_section::Column::Position,
            page_id,
            ids,
        )
        .await?;
        txn.commit().await?;
        Ok(())
    }

    async fn create_placement(&self, placement: &PageSectionWidget) -> Result<PageSectionWidget> {
        let active: page_section_widget::ActiveModel = placement.into();
        page_section_widget::Entity::insert(active)
            .exec_without_returning(&*self.db)
            .await?;
        Ok(placement.clone())
    }

    async fn update_placement(&self, placement: &PageSectionWidget) -> Result<PageSectionWidget> {
        let active: page_section_widget::ActiveModel = placement.into();
        let result = page_section_widget::Entity::update(active).exec(&*self.db).await?;
        Ok(result.into())
    }

    async fn find_placement(&self, id: Uuid) -> Result<Option<PageSectionWidget>> {
        let result = page_section_widget::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(result.map(Into::into))
    }

    async fn list_placements(&self, page_section_ids: &[Uuid]) -> Result<Vec<PageSectionWidget>> {
        if page_section_ids.is_empty() {
            return Ok(Vec::new());
        }
        let results = page_section_widget::Entity::find()
            .filter(page_section_widget::Column::PageSectionId.is_in(page_section_ids.to_vec()))
            .order_by_asc(page_section_widget::Column::Position)
            .order_by_asc(page_section_widget::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn max_placement_position(&self, page_section_id: Uuid) -> Result<Option<i32>> {
        let last = page_section_widget::Entity::find()
            .filter(page_section_widget::Column::PageSectionId.eq(page_section_id))
            .order_by_desc(page_section_widget::Column::Position)
            .one(&*self.db)
            .await?;
        Ok(last.map(|p| p.position))
    }

    async fn count_placements(&self, page_section_ids: &[Uuid]) -> Result<u64> {
        if page_section_ids.is_empty() {
            return Ok(0);
        }
        Ok(page_section_widget::Entity::find()
            .filter(page_section_widget::Column::PageSectionId.is_in(page_section_ids.to_vec()))
            .count(&*self.db)
            .await?)
    }

    async fn count_placements_for_widget(&self, widget_id: Uuid) -> Result<u64> {
        Ok(page_section_widget::Entity::find()
            .filter(page_section_widget::Column::WidgetId.eq(widget_id))
            .count(&*self.db)
            .await?)
    }

    async fn delete_placement_cascade(&self, id: Uuid) -> Result<()> {
        let txn = self.db.begin().await?;
        delete_instance_values(&txn, &[id]).await?;
        page_section_widget::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn reposition_placements(&self, page_section_id: Uuid, ids: &[Uuid]) -> Result<()> {
        let txn = self.db.begin().await?;
        reposition::<page_section_widget::Entity, _>(
            &txn,
            page_section_widget::Column::Id,
            page_section_widget::Column::PageSectionId,
            page_section_widget::Column::Position,
            page_section_id,
            ids,
        )
        .await?;
        txn.commit().await?;
        Ok(())
    }
}

// ===== Widget Repository =====

pub struct SeaOrmWidgetRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmWidgetRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WidgetRepository for SeaOrmWidgetRepository {
    async fn create(&self, widget: &Widget) -> Result<Widget> {
        let active: widget::ActiveModel = widget.into();
        widget::Entity::insert(active).exec_without_returning(&*self.db).await?;
        Ok(widget.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Widget>> {
        let result = widget::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(result.map(Into::into))
    }

    async fn find_by_slug(&self, theme_id: Uuid, slug: &str) -> Result<Option<Widget>> {
        let result = widget::Entity::find()
            .filter(widget::Column::ThemeId.eq(theme_id))
            .filter(widget::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?;
        Ok(result.map(Into::into))
    }

    async fn list_by_theme(&self, theme_id: Uuid) -> Result<Vec<Widget>> {
        let results = widget::Entity::find()
            .filter(widget::Column::ThemeId.eq(theme_id))
            .order_by_asc(widget::Column::Name)
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn delete_cascade(&self, id: Uuid) -> Result<()> {
        let txn = self.db.begin().await?;
        let fields = owned_field_ids(&txn, id).await?;
        delete_fields(&txn, &fields).await?;
        widget_content_type::Entity::delete_many()
            .filter(widget_content_type::Column::WidgetId.eq(id))
            .exec(&txn)
            .await?;
        widget::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn add_association(&self, association: &WidgetContentTypeAssociation) -> Result<WidgetContentTypeAssociation> {
        let active: widget_content_type::ActiveModel = association.into();
        widget_content_type::Entity::insert(active)
            .exec_without_returning(&*self.db)
            .await?;
        Ok(association.clone())
    }

    async fn find_association(
        &self,
        widget_id: Uuid,
        content_type_id: Uuid,
    ) -> Result<Option<WidgetContentTypeAssociation>> {
        let result = widget_content_type::Entity::find()
            .filter(widget_content_type::Column::WidgetId.eq(widget_id))
            .filter(widget_content_type::Column::ContentTypeId.eq(content_type_id))
            .one(&*self.db)
            .await?;
        Ok(result.map(Into::into))
    }

    async fn remove_association(&self, widget_id: Uuid, content_type_id: Uuid) -> Result<()> {
        widget_content_type::Entity::delete_many()
            .filter(widget_content_type::Column::WidgetId.eq(widget_id))
            .filter(widget_content_type::Column::ContentTypeId.eq(content_type_id))
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    async fn list_associations(&self, widget_id: Uuid) -> Result<Vec<WidgetContentTypeAssociation>> {
        let results = widget_content_type::Entity::find()
            .filter(widget_content_type::Column::WidgetId.eq(widget_id))
            .all(&*self.db)
            .await?;
        Ok(results.into_iter().map(Into::into).collect())
    }
}
