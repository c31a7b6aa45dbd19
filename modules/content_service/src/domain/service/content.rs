//! Content types and content items

use super::{collect_slug, Service, StorageResultExt};
use crate::contract::{
    Actor, ContentError, ContentItem, ContentItemPatch, ContentStatus, ContentType, ContentTypePatch,
    FieldErrors, FieldValue, NewContentItem, NewContentType,
};
use crate::domain::events::ContentEvent;
use crate::domain::validation;
use chrono::Utc;
use std::collections::BTreeMap;
use uuid::Uuid;

impl Service {
    // ===== Content types =====

    pub async fn create_content_type(&self, input: NewContentType, actor: Actor) -> Result<ContentType, ContentError> {
        let mut errors = FieldErrors::new();
        validation::require_text(&mut errors, "name", &input.name);
        let slug = collect_slug(&mut errors, validation::resolve_slug(input.slug.as_deref(), &input.name));
        errors.into_result()?;
        let slug = slug.unwrap_or_default();

        self.ensure_content_type_slug_free(&slug, None).await?;

        let now = Utc::now();
        let content_type = ContentType {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            slug,
            icon: input.icon,
            description: input.description,
            is_active: input.is_active,
            is_system: input.is_system,
            created_by: actor.user_id,
            updated_by: actor.user_id,
            created_at: now,
            updated_at: now,
        };
        let created = self
            .repos
            .content_types
            .create(&content_type)
            .await
            .or_internal("create content type")?;

        tracing::info!(content_type_id = %created.id, slug = %created.slug, "Created content type");
        Ok(created)
    }

    pub async fn update_content_type(
        &self,
        id: Uuid,
        patch: ContentTypePatch,
        actor: Actor,
    ) -> Result<ContentType, ContentError> {
        let mut content_type = self.get_content_type(id).await?;
        let mut errors = FieldErrors::new();

        if let Some(name) = patch.name {
            validation::require_text(&mut errors, "name", &name);
            content_type.name = name.trim().to_string();
        }
        let new_slug = patch
            .slug
            .and_then(|slug| super::check_slug(&mut errors, slug.trim()))
            .filter(|slug| *slug != content_type.slug);
        errors.into_result()?;

        if let Some(slug) = new_slug {
            self.ensure_content_type_slug_free(&slug, Some(id)).await?;
            content_type.slug = slug;
        }
        if let Some(icon) = patch.icon {
            content_type.icon = icon;
        }
        if let Some(description) = patch.description {
            content_type.description = description;
        }
        if let Some(is_active) = patch.is_active {
            content_type.is_active = is_active;
        }
        content_type.updated_by = actor.user_id;
        content_type.updated_at = Utc::now();

        let updated = self
            .repos
            .content_types
            .update(&content_type)
            .await
            .or_internal("update content type")?;
        tracing::info!(content_type_id = %updated.id, "Updated content type");
        Ok(updated)
    }

    pub async fn get_content_type(&self, id: Uuid) -> Result<ContentType, ContentError> {
        self.repos
            .content_types
            .find_by_id(id)
            .await
            .or_internal("find content type")?
            .ok_or_else(|| ContentError::not_found("content_type", id))
    }

    pub async fn get_content_type_by_slug(&self, slug: &str) -> Result<ContentType, ContentError> {
        self.repos
            .content_types
            .find_by_slug(slug)
            .await
            .or_internal("find content type by slug")?
            .ok_or_else(|| ContentError::not_found("content_type", slug))
    }

    pub async fn list_content_types(&self) -> Result<Vec<ContentType>, ContentError> {
        self.repos
            .content_types
            .list_all()
            .await
            .or_internal("list content types")
    }

    /// Refused for system types and while any item (soft-deleted included) exists
    pub async fn delete_content_type(&self, id: Uuid) -> Result<(), ContentError> {
        let content_type = self.get_content_type(id).await?;
        if content_type.is_system {
            return Err(ContentError::conflict(format!(
                "Content type '{}' is a system type and cannot be deleted",
                content_type.slug
            )));
        }

        let dependents = self
            .repos
            .items
            .count_by_type(id)
            .await
            .or_internal("count content items")?;
        if dependents > 0 {
            return Err(ContentError::ReferentialIntegrity {
                resource: "content_type",
                id,
                dependent_resource: "content_item",
                dependents,
            });
        }

        self.repos
            .content_types
            .delete_cascade(id)
            .await
            .or_internal("delete content type")?;
        tracing::info!(content_type_id = %id, slug = %content_type.slug, "Deleted content type");
        Ok(())
    }

    async fn ensure_content_type_slug_free(&self, slug: &str, except: Option<Uuid>) -> Result<(), ContentError> {
        let existing = self
            .repos
            .content_types
            .find_by_slug(slug)
            .await
            .or_internal("find content type by slug")?;
        match existing {
            Some(other) if Some(other.id) != except => Err(ContentError::DuplicateSlug {
                scope: "content types".to_string(),
                slug: slug.to_string(),
            }),
            _ => Ok(()),
        }
    }

    // ===== Content items =====

    /// Create an item with its field values in one transaction
    pub async fn create_content_item(
        &self,
        content_type_id: Uuid,
        input: NewContentItem,
        actor: Actor,
    ) -> Result<ContentItem, ContentError> {
        let content_type = self.get_content_type(content_type_id).await?;
        let item_id = Uuid::new_v4();

        let mut errors = FieldErrors::new();
        validation::require_text(&mut errors, "title", &input.title);
        let slug = collect_slug(&mut errors, validation::resolve_slug(input.slug.as_deref(), &input.title));
        let values = self
            .prepare_values(content_type.id, item_id, &input.field_values, false, &mut errors)
            .await?;
        errors.into_result()?;
        let slug = slug.unwrap_or_default();

        self.ensure_item_slug_free(content_type.id, &slug, None).await?;

        let now = Utc::now();
        let item = ContentItem {
            id: item_id,
            content_type_id: content_type.id,
            title: input.title.trim().to_string(),
            slug,
            status: input.status,
            published_at: (input.status == ContentStatus::Published).then_some(now),
            created_by: actor.user_id,
            updated_by: actor.user_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let created = self
            .repos
            .items
            .create(&item, &values)
            .await
            .or_internal("create content item")?;

        tracing::info!(
            item_id = %created.id,
            content_type = %content_type.slug,
            slug = %created.slug,
            values = values.records.len(),
            "Created content item"
        );
        self.publish(ContentEvent::item_saved(&created, true)).await;
        if let Some(event) = ContentEvent::item_published(&created) {
            self.publish(event).await;
        }
        Ok(created)
    }

    /// Update an item; required fields absent from the patch keep their stored value
    pub async fn update_content_item(
        &self,
        id: Uuid,
        patch: ContentItemPatch,
        actor: Actor,
    ) -> Result<ContentItem, ContentError> {
        let mut item = self.get_content_item(id).await?;
        if item.deleted_at.is_some() {
            return Err(ContentError::conflict(format!(
                "Content item {id} is deleted; restore it before editing"
            )));
        }

        let mut errors = FieldErrors::new();
        if let Some(title) = patch.title {
            validation::require_text(&mut errors, "title", &title);
            item.title = title.trim().to_string();
        }
        let new_slug = patch
            .slug
            .and_then(|slug| super::check_slug(&mut errors, slug.trim()))
            .filter(|slug| *slug != item.slug);
        let values = self
            .prepare_values(item.content_type_id, item.id, &patch.field_values, true, &mut errors)
            .await?;
        errors.into_result()?;

        if let Some(slug) = new_slug {
            self.ensure_item_slug_free(item.content_type_id, &slug, Some(id)).await?;
            item.slug = slug;
        }

        let now = Utc::now();
        let newly_published = patch.status == Some(ContentStatus::Published) && item.published_at.is_none();
        if let Some(status) = patch.status {
            item.status = status;
        }
        if newly_published {
            item.published_at = Some(now);
        }
        item.updated_by = actor.user_id;
        item.updated_at = now;

        let updated = self
            .repos
            .items
            .update(&item, &values)
            .await
            .or_internal("update content item")?;

        tracing::info!(item_id = %updated.id, status = %updated.status, "Updated content item");
        self.publish(ContentEvent::item_saved(&updated, false)).await;
        if newly_published {
            if let Some(event) = ContentEvent::item_published(&updated) {
                self.publish(event).await;
            }
        }
        Ok(updated)
    }

    /// Item by id; soft-deleted items are returned with `deleted_at` set
    pub async fn get_content_item(&self, id: Uuid) -> Result<ContentItem, ContentError> {
        self.repos
            .items
            .find_by_id(id)
            .await
            .or_internal("find content item")?
            .ok_or_else(|| ContentError::not_found("content_item", id))
    }

    pub async fn get_content_item_by_slug(&self, content_type_id: Uuid, slug: &str) -> Result<ContentItem, ContentError> {
        self.repos
            .items
            .find_by_slug(content_type_id, slug)
            .await
            .or_internal("find content item by slug")?
            .filter(|item| item.deleted_at.is_none())
            .ok_or_else(|| ContentError::not_found("content_item", slug))
    }

    /// Slug -> value for every top-level field of the item's type
    pub async fn get_content_item_values(&self, id: Uuid) -> Result<BTreeMap<String, FieldValue>, ContentError> {
        let item = self.get_content_item(id).await?;
        self.instance_values(item.content_type_id, item.id).await
    }

    /// Soft delete; values stay in place
    pub async fn delete_content_item(&self, id: Uuid) -> Result<(), ContentError> {
        let item = self.get_content_item(id).await?;
        if item.deleted_at.is_some() {
            return Ok(());
        }
        self.repos
            .items
            .set_deleted_at(id, Some(Utc::now()))
            .await
            .or_internal("soft delete content item")?;
        tracing::info!(item_id = %id, "Soft deleted content item");
        self.publish(ContentEvent::item_deleted(&item, false)).await;
        Ok(())
    }

    pub async fn restore_content_item(&self, id: Uuid) -> Result<ContentItem, ContentError> {
        let item = self.get_content_item(id).await?;
        if item.deleted_at.is_none() {
            return Ok(item);
        }
        self.repos
            .items
            .set_deleted_at(id, None)
            .await
            .or_internal("restore content item")?;
        tracing::info!(item_id = %id, "Restored content item");
        self.get_content_item(id).await
    }

    /// Hard delete of a soft-deleted item with all its values
    pub async fn purge_content_item(&self, id: Uuid) -> Result<(), ContentError> {
        let item = self.get_content_item(id).await?;
        if item.deleted_at.is_none() {
            return Err(ContentError::conflict(format!(
                "Content item {id} must be deleted before it can be purged"
            )));
        }
        self.repos
            .items
            .purge(id)
            .await
            .or_internal("purge content item")?;
        tracing::info!(item_id = %id, "Purged content item");
        self.publish(ContentEvent::item_deleted(&item, true)).await;
        Ok(())
    }

    async fn ensure_item_slug_free(
        &self,
        content_type_id: Uuid,
        slug: &str,
        except: Option<Uuid>,
    ) -> Result<(), ContentError> {
        let existing = self
            .repos
            .items
            .find_by_slug(content_type_id, slug)
            .await
            .or_internal("find content item by slug")?;
        match existing {
            Some(other) if Some(other.id) != except => Err(ContentError::DuplicateSlug {
                scope: format!("content type {content_type_id}"),
                slug: slug.to_string(),
            }),
            _ => Ok(()),
        }
    }
}
