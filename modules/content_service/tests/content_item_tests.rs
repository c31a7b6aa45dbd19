//! Integration tests for content types and content items

mod common;

use common::{article_type, print_test_header, service};
use content_service::contract::*;
use serde_json::json;

#[tokio::test]
async fn test_article_scenario() {
    print_test_header(
        "test_article_scenario",
        &[
            "Create an Article with a required headline and multiselect tags",
            "Slug is derived from the title, values read back typed",
        ],
    );
    let service = service().await;
    let article = article_type(&service).await;
    assert_eq!(article.content_type.slug, "article");

    let user = uuid::Uuid::new_v4();
    let item = service
        .create_content_item(
            article.content_type.id,
            NewContentItem::titled("Hello World")
                .with_status(ContentStatus::Published)
                .with_value("headline", json!("Rust is fun"))
                .with_value("tags", json!(["rust", "web"])),
            Actor::user(user),
        )
        .await
        .unwrap();

    assert_eq!(item.slug, "hello-world");
    assert_eq!(item.status, ContentStatus::Published);
    assert!(item.published_at.is_some());
    assert_eq!(item.created_by, Some(user));

    let values = service.get_content_item_values(item.id).await.unwrap();
    assert_eq!(values.get("headline"), Some(&FieldValue::Text("Rust is fun".into())));
    assert_eq!(
        values.get("tags"),
        Some(&FieldValue::List(vec!["rust".into(), "web".into()]))
    );

    let by_slug = service
        .get_content_item_by_slug(article.content_type.id, "hello-world")
        .await
        .unwrap();
    assert_eq!(by_slug.id, item.id);
}

#[tokio::test]
async fn test_free_form_tags_round_trip() {
    print_test_header(
        "test_free_form_tags_round_trip",
        &[
            "A multiselect without options accepts any list of strings",
            "Omitting the required headline names headline in the error",
        ],
    );
    let service = service().await;
    let content_type = service
        .create_content_type(NewContentType::named("Article"), Actor::system())
        .await
        .unwrap();
    let owner = FieldOwner::ContentType(content_type.id);
    service
        .define_field(owner, NewFieldDefinition::new("Headline", "headline", FieldType::Text).required())
        .await
        .unwrap();
    let tags = service
        .define_field(owner, NewFieldDefinition::new("Tags", "tags", FieldType::Multiselect))
        .await
        .unwrap();

    let item = service
        .create_content_item(
            content_type.id,
            NewContentItem::titled("Hello World")
                .with_value("headline", json!("Hi"))
                .with_value("tags", json!(["x", "y"])),
            Actor::system(),
        )
        .await
        .unwrap();
    assert_eq!(item.slug, "hello-world");
    assert_eq!(
        service.get_value(item.id, tags.id).await.unwrap(),
        FieldValue::List(vec!["x".into(), "y".into()])
    );

    let err = service
        .create_content_item(
            content_type.id,
            NewContentItem::titled("Untitled").with_value("tags", json!(["x"])),
            Actor::system(),
        )
        .await
        .unwrap_err();
    match err {
        ContentError::Validation { errors } => assert!(errors.contains("headline")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_required_field_is_keyed_by_slug() {
    let service = service().await;
    let article = article_type(&service).await;

    let err = service
        .create_content_item(
            article.content_type.id,
            NewContentItem::titled("No headline").with_value("tags", json!(["rust"])),
            Actor::system(),
        )
        .await
        .unwrap_err();
    match err {
        ContentError::Validation { errors } => {
            assert_eq!(
                errors.get("headline"),
                Some(&["The headline field is required.".to_string()][..])
            );
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let listed = service
        .run_query_definition(&QueryDefinition::for_type(article.content_type.id), EvaluationMode::Strict)
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_update_keeps_stored_required_values() {
    let service = service().await;
    let article = article_type(&service).await;
    let item = service
        .create_content_item(
            article.content_type.id,
            NewContentItem::titled("Draft").with_value("headline", json!("Kept")),
            Actor::system(),
        )
        .await
        .unwrap();

    let updated = service
        .update_content_item(
            item.id,
            ContentItemPatch {
                title: Some("Renamed".into()),
                status: Some(ContentStatus::Published),
                ..Default::default()
            },
            Actor::system(),
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.slug, "draft");
    assert!(updated.published_at.is_some());

    let values = service.get_content_item_values(item.id).await.unwrap();
    assert_eq!(values.get("headline"), Some(&FieldValue::Text("Kept".into())));
}

#[tokio::test]
async fn test_published_at_survives_status_changes() {
    print_test_header(
        "test_published_at_survives_status_changes",
        &["Archiving or re-publishing keeps the first publication timestamp"],
    );
    let service = service().await;
    let article = article_type(&service).await;
    let item = service
        .create_content_item(
            article.content_type.id,
            NewContentItem::titled("Launch day")
                .with_status(ContentStatus::Published)
                .with_value("headline", json!("h")),
            Actor::system(),
        )
        .await
        .unwrap();
    let first = item.published_at.unwrap();

    let status_patch = |status| ContentItemPatch {
        status: Some(status),
        ..Default::default()
    };

    let archived = service
        .update_content_item(item.id, status_patch(ContentStatus::Archived), Actor::system())
        .await
        .unwrap();
    assert_eq!(archived.status, ContentStatus::Archived);
    assert_eq!(archived.published_at, Some(first));

    let drafted = service
        .update_content_item(item.id, status_patch(ContentStatus::Draft), Actor::system())
        .await
        .unwrap();
    assert_eq!(drafted.published_at, Some(first));

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let republished = service
        .update_content_item(item.id, status_patch(ContentStatus::Published), Actor::system())
        .await
        .unwrap();
    assert_eq!(republished.status, ContentStatus::Published);
    assert_eq!(republished.published_at, Some(first));
    assert_eq!(service.get_content_item(item.id).await.unwrap().published_at, Some(first));
}

#[tokio::test]
async fn test_item_slugs_are_scoped_per_type() {
    print_test_header(
        "test_item_slugs_are_scoped_per_type",
        &["The same slug may exist once in each content type"],
    );
    let service = service().await;
    let article = article_type(&service).await;
    let event = service
        .create_content_type(NewContentType::named("Event"), Actor::system())
        .await
        .unwrap();

    service
        .create_content_item(
            article.content_type.id,
            NewContentItem::titled("Launch").with_value("headline", json!("h")),
            Actor::system(),
        )
        .await
        .unwrap();
    service
        .create_content_item(event.id, NewContentItem::titled("Launch"), Actor::system())
        .await
        .unwrap();

    let err = service
        .create_content_item(
            article.content_type.id,
            NewContentItem::titled("Another launch")
                .with_slug("launch")
                .with_value("headline", json!("h")),
            Actor::system(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::DuplicateSlug { ref slug, .. } if slug == "launch"));
}

#[tokio::test]
async fn test_soft_delete_restore_and_purge() {
    print_test_header(
        "test_soft_delete_restore_and_purge",
        &["Soft-deleted items leave listings and slug lookups", "Purge is only allowed after a soft delete"],
    );
    let service = service().await;
    let article = article_type(&service).await;
    let item = service
        .create_content_item(
            article.content_type.id,
            NewContentItem::titled("Ephemeral").with_value("headline", json!("h")),
            Actor::system(),
        )
        .await
        .unwrap();

    let err = service.purge_content_item(item.id).await.unwrap_err();
    assert!(matches!(err, ContentError::Conflict { .. }));

    service.delete_content_item(item.id).await.unwrap();
    service.delete_content_item(item.id).await.unwrap();
    assert!(service.get_content_item(item.id).await.unwrap().deleted_at.is_some());
    assert!(matches!(
        service
            .get_content_item_by_slug(article.content_type.id, "ephemeral")
            .await,
        Err(ContentError::NotFound { .. })
    ));
    let listed = service
        .run_query_definition(&QueryDefinition::for_type(article.content_type.id), EvaluationMode::Strict)
        .await
        .unwrap();
    assert!(listed.is_empty());

    let err = service
        .update_content_item(
            item.id,
            ContentItemPatch {
                title: Some("Edited".into()),
                ..Default::default()
            },
            Actor::system(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::Conflict { .. }));

    let restored = service.restore_content_item(item.id).await.unwrap();
    assert!(restored.deleted_at.is_none());
    assert_eq!(
        service.get_content_item_values(item.id).await.unwrap().get("headline"),
        Some(&FieldValue::Text("h".into()))
    );

    service.delete_content_item(item.id).await.unwrap();
    service.purge_content_item(item.id).await.unwrap();
    assert!(matches!(
        service.get_content_item(item.id).await,
        Err(ContentError::NotFound { .. })
    ));
    assert_eq!(
        service.preview_field_deletion(article.headline.id).await.unwrap().values,
        0
    );
}

#[tokio::test]
async fn test_delete_content_type_refused_while_items_exist() {
    let service = service().await;
    let article = article_type(&service).await;
    let item = service
        .create_content_item(
            article.content_type.id,
            NewContentItem::titled("Blocker").with_value("headline", json!("h")),
            Actor::system(),
        )
        .await
        .unwrap();

    service.delete_content_item(item.id).await.unwrap();
    let err = service.delete_content_type(article.content_type.id).await.unwrap_err();
    assert!(matches!(
        err,
        ContentError::ReferentialIntegrity {
            dependent_resource: "content_item",
            dependents: 1,
            ..
        }
    ));

    service.purge_content_item(item.id).await.unwrap();
    service.delete_content_type(article.content_type.id).await.unwrap();
    assert!(matches!(
        service.get_field(article.headline.id).await,
        Err(ContentError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_system_content_type_cannot_be_deleted() {
    let service = service().await;
    let mut input = NewContentType::named("Navigation");
    input.is_system = true;
    let content_type = service.create_content_type(input, Actor::system()).await.unwrap();

    let err = service.delete_content_type(content_type.id).await.unwrap_err();
    assert!(matches!(err, ContentError::Conflict { .. }));
}

#[tokio::test]
async fn test_content_type_slug_is_unique() {
    let service = service().await;
    service
        .create_content_type(NewContentType::named("Article"), Actor::system())
        .await
        .unwrap();
    let err = service
        .create_content_type(NewContentType::named("Article"), Actor::system())
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::DuplicateSlug { .. }));
}
