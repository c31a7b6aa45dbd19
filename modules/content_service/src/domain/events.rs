/// Domain events for content service
///
/// Events are emitted after the owning write has committed. Publishing
/// failures are logged and never fail the write.

use crate::contract::model::{ContentItem, FieldDefinition};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain event types for content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum ContentEvent {
    /// Content item was created or updated
    ContentItemSaved(ContentItemSavedEvent),
    /// Content item entered the published state
    ContentItemPublished(ContentItemPublishedEvent),
    /// Content item was soft deleted or purged
    ContentItemDeleted(ContentItemDeletedEvent),
    /// Field definition and its data were destroyed
    FieldDefinitionDeleted(FieldDefinitionDeletedEvent),
    /// Page composition changed
    LayoutChanged(LayoutChangedEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItemSavedEvent {
    pub content_type_id: Uuid,
    pub item_id: Uuid,
    pub slug: String,
    /// Whether this was a create or update
    pub is_new: bool,
    pub timestamp: DateTime<Utc>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItemPublishedEvent {
    pub content_type_id: Uuid,
    pub item_id: Uuid,
    pub published_at: DateTime<Utc>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItemDeletedEvent {
    pub content_type_id: Uuid,
    pub item_id: Uuid,
    /// Hard delete (purge) rather than soft delete
    pub purged: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinitionDeletedEvent {
    pub owner_id: Uuid,
    pub field_id: Uuid,
    pub slug: String,
    pub values_removed: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutChangedEvent {
    pub page_id: Uuid,
    /// Short description of the change (`section_attached`, `widget_placed`, ...)
    pub change: String,
    pub timestamp: DateTime<Utc>,
}

/// Event publisher trait for publishing domain events
#[async_trait::async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: ContentEvent) -> anyhow::Result<()>;
}

/// No-op event publisher for testing or when events are disabled
pub struct NoOpEventPublisher;

#[async_trait::async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish(&self, _event: ContentEvent) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Writes every event to the log as JSON
pub struct TracingEventPublisher;

#[async_trait::async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, event: ContentEvent) -> anyhow::Result<()> {
        let payload = serde_json::to_string(&event)?;
        tracing::info!(target: "content_service::events", event = %payload, "Domain event");
        Ok(())
    }
}

impl ContentEvent {
    pub fn item_saved(item: &ContentItem, is_new: bool) -> Self {
        ContentEvent::ContentItemSaved(ContentItemSavedEvent {
            content_type_id: item.content_type_id,
            item_id: item.id,
            slug: item.slug.clone(),
            is_new,
            timestamp: item.updated_at,
            user_id: item.updated_by,
        })
    }

    /// `None` unless the item carries a publication timestamp
    pub fn item_published(item: &ContentItem) -> Option<Self> {
        item.published_at.map(|published_at| {
            ContentEvent::ContentItemPublished(ContentItemPublishedEvent {
                content_type_id: item.content_type_id,
                item_id: item.id,
                published_at,
                user_id: item.updated_by,
            })
        })
    }

    pub fn item_deleted(item: &ContentItem, purged: bool) -> Self {
        ContentEvent::ContentItemDeleted(ContentItemDeletedEvent {
            content_type_id: item.content_type_id,
            item_id: item.id,
            purged,
            timestamp: Utc::now(),
        })
    }

    pub fn field_deleted(field: &FieldDefinition, values_removed: u64) -> Self {
        ContentEvent::FieldDefinitionDeleted(FieldDefinitionDeletedEvent {
            owner_id: field.owner.id(),
            field_id: field.id,
            slug: field.slug.clone(),
            values_removed,
            timestamp: Utc::now(),
        })
    }

    pub fn layout_changed(page_id: Uuid, change: &str) -> Self {
        ContentEvent::LayoutChanged(LayoutChangedEvent {
            page_id,
            change: change.to_string(),
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::ContentStatus;

    fn item() -> ContentItem {
        ContentItem {
            id: Uuid::new_v4(),
            content_type_id: Uuid::new_v4(),
            title: "Hello".to_string(),
            slug: "hello".to_string(),
            status: ContentStatus::Draft,
            published_at: None,
            created_by: None,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_item_published_requires_timestamp() {
        let mut item = item();
        assert!(ContentEvent::item_published(&item).is_none());
        item.published_at = Some(Utc::now());
        assert!(matches!(
            ContentEvent::item_published(&item),
            Some(ContentEvent::ContentItemPublished(_))
        ));
    }

    #[test]
    fn test_event_serialises_with_tag() {
        let event = ContentEvent::item_saved(&item(), true);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "content_item_saved");
        assert_eq!(json["slug"], "hello");
    }

    #[tokio::test]
    async fn test_publishers_accept_events() {
        let event = ContentEvent::layout_changed(Uuid::new_v4(), "section_attached");
        assert!(NoOpEventPublisher.publish(event.clone()).await.is_ok());
        assert!(TracingEventPublisher.publish(event).await.is_ok());
    }
}
