//! Integration tests for field definitions and the EAV value store

mod common;

use common::{article_type, print_test_header, service};
use content_service::contract::*;
use serde_json::{json, Map, Value};

fn group(entries: Value) -> Map<String, Value> {
    match entries {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

#[tokio::test]
async fn test_set_value_twice_keeps_a_single_row() {
    print_test_header(
        "test_set_value_twice_keeps_a_single_row",
        &["Writing (instance, field) twice replaces the stored value"],
    );
    let service = service().await;
    let article = article_type(&service).await;
    let item = service
        .create_content_item(
            article.content_type.id,
            NewContentItem::titled("First").with_value("headline", json!("Initial")),
            Actor::system(),
        )
        .await
        .unwrap();

    service
        .set_value(item.id, article.headline.id, json!("Second"))
        .await
        .unwrap();
    let stored = service
        .set_value(item.id, article.headline.id, json!("Third"))
        .await
        .unwrap();
    assert_eq!(stored, FieldValue::Text("Third".into()));

    let values = service.get_content_item_values(item.id).await.unwrap();
    assert_eq!(values.get("headline"), Some(&FieldValue::Text("Third".into())));
    assert_eq!(
        service.preview_field_deletion(article.headline.id).await.unwrap().values,
        1
    );
}

#[tokio::test]
async fn test_multiselect_preserves_submitted_order() {
    let service = service().await;
    let article = article_type(&service).await;
    let item = service
        .create_content_item(
            article.content_type.id,
            NewContentItem::titled("Ordered")
                .with_value("headline", json!("h"))
                .with_value("tags", json!(["web", "rust"])),
            Actor::system(),
        )
        .await
        .unwrap();

    let value = service.get_value(item.id, article.tags.id).await.unwrap();
    assert_eq!(value.as_list(), Some(&["web".to_string(), "rust".to_string()][..]));
}

#[tokio::test]
async fn test_multiselect_rejects_unknown_option() {
    let service = service().await;
    let article = article_type(&service).await;
    let item = service
        .create_content_item(
            article.content_type.id,
            NewContentItem::titled("Tagged").with_value("headline", json!("h")),
            Actor::system(),
        )
        .await
        .unwrap();

    let err = service
        .set_value(item.id, article.tags.id, json!(["rust", "cobol"]))
        .await
        .unwrap_err();
    match err {
        ContentError::Validation { errors } => assert!(errors.contains("tags")),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(service.get_value(item.id, article.tags.id).await.unwrap().is_null());
}

#[tokio::test]
async fn test_missing_value_reads_field_default() {
    let service = service().await;
    let article = article_type(&service).await;
    let subtitle = service
        .define_field(
            FieldOwner::ContentType(article.content_type.id),
            NewFieldDefinition::new("Subtitle", "subtitle", FieldType::Text).with_default("Untitled"),
        )
        .await
        .unwrap();
    let item = service
        .create_content_item(
            article.content_type.id,
            NewContentItem::titled("Defaults").with_value("headline", json!("h")),
            Actor::system(),
        )
        .await
        .unwrap();

    assert_eq!(
        service.get_value(item.id, subtitle.id).await.unwrap(),
        FieldValue::Text("Untitled".into())
    );
}

#[tokio::test]
async fn test_value_for_foreign_instance_is_not_found() {
    let service = service().await;
    let article = article_type(&service).await;
    let err = service
        .set_value(uuid::Uuid::new_v4(), article.headline.id, json!("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::NotFound { resource: "content_item", .. }));
}

#[tokio::test]
async fn test_unique_field_rejects_taken_value() {
    print_test_header(
        "test_unique_field_rejects_taken_value",
        &["A unique field value may be held by one instance only", "Rewriting the holder's own value is allowed"],
    );
    let service = service().await;
    let article = article_type(&service).await;
    let isbn = service
        .define_field(
            FieldOwner::ContentType(article.content_type.id),
            NewFieldDefinition::new("ISBN", "isbn", FieldType::Text).unique(),
        )
        .await
        .unwrap();

    let first = service
        .create_content_item(
            article.content_type.id,
            NewContentItem::titled("Book One")
                .with_value("headline", json!("h"))
                .with_value("isbn", json!("978-3-16")),
            Actor::system(),
        )
        .await
        .unwrap();

    let err = service
        .create_content_item(
            article.content_type.id,
            NewContentItem::titled("Book Two")
                .with_value("headline", json!("h"))
                .with_value("isbn", json!("978-3-16")),
            Actor::system(),
        )
        .await
        .unwrap_err();
    match err {
        ContentError::Validation { errors } => {
            assert_eq!(errors.get("isbn"), Some(&["The isbn has already been taken.".to_string()][..]));
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    service.set_value(first.id, isbn.id, json!("978-3-16")).await.unwrap();
}

#[tokio::test]
async fn test_repeater_groups_replace_atomically() {
    print_test_header(
        "test_repeater_groups_replace_atomically",
        &["Repeater groups are replaced as a whole and read back in order"],
    );
    let service = service().await;
    let article = article_type(&service).await;
    let owner = FieldOwner::ContentType(article.content_type.id);
    let links = service
        .define_field(owner, NewFieldDefinition::new("Links", "links", FieldType::Repeater))
        .await
        .unwrap();
    service
        .define_field(
            owner,
            NewFieldDefinition::new("Label", "label", FieldType::Text)
                .required()
                .with_parent(links.id),
        )
        .await
        .unwrap();
    service
        .define_field(
            owner,
            NewFieldDefinition::new("External", "external", FieldType::Boolean).with_parent(links.id),
        )
        .await
        .unwrap();

    let item = service
        .create_content_item(
            article.content_type.id,
            NewContentItem::titled("With links").with_value("headline", json!("h")),
            Actor::system(),
        )
        .await
        .unwrap();

    let value = service
        .set_repeater_groups(
            item.id,
            links.id,
            vec![
                group(json!({"label": "Docs", "external": true})),
                group(json!({"label": "Home", "external": false})),
            ],
        )
        .await
        .unwrap();
    assert_eq!(
        value.to_json(),
        json!([{"label": "Docs", "external": true}, {"label": "Home", "external": false}])
    );

    let err = service
        .set_repeater_groups(item.id, links.id, vec![group(json!({"label": "Only"})), group(json!({}))])
        .await
        .unwrap_err();
    match err {
        ContentError::Validation { errors } => assert!(errors.contains("links.1.label")),
        other => panic!("expected validation error, got {other:?}"),
    }

    let unchanged = service.get_value(item.id, links.id).await.unwrap();
    assert_eq!(unchanged, value);

    let impact = service.preview_field_deletion(links.id).await.unwrap();
    assert_eq!(impact.repeater_groups, 2);
    assert_eq!(impact.subfields, 2);
}

#[tokio::test]
async fn test_delete_field_requires_confirmation() {
    let service = service().await;
    let article = article_type(&service).await;

    let err = service
        .delete_field(article.tags.id, Confirmation::Unconfirmed)
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::ConfirmationRequired { .. }));
    assert!(service.get_field(article.tags.id).await.is_ok());

    let impact = service
        .delete_field(article.tags.id, Confirmation::Confirmed)
        .await
        .unwrap();
    assert_eq!(impact.options, 3);
    assert!(matches!(
        service.get_field(article.tags.id).await,
        Err(ContentError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_duplicate_field_slug_per_owner() {
    let service = service().await;
    let article = article_type(&service).await;
    let err = service
        .define_field(
            FieldOwner::ContentType(article.content_type.id),
            NewFieldDefinition::new("Headline again", "headline", FieldType::Textarea),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::DuplicateSlug { .. }));

    let other = service
        .create_content_type(NewContentType::named("Event"), Actor::system())
        .await
        .unwrap();
    service
        .define_field(
            FieldOwner::ContentType(other.id),
            NewFieldDefinition::new("Headline", "headline", FieldType::Text),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reorder_fields_is_idempotent() {
    let service = service().await;
    let article = article_type(&service).await;
    let owner_id = article.content_type.id;
    let order = [article.tags.id, article.headline.id];

    service
        .reorder(ReorderScope::Fields { owner_id }, &order)
        .await
        .unwrap();
    let first: Vec<_> = service
        .list_fields(FieldOwner::ContentType(owner_id))
        .await
        .unwrap()
        .into_iter()
        .map(|f| (f.id, f.position))
        .collect();

    service
        .reorder(ReorderScope::Fields { owner_id }, &order)
        .await
        .unwrap();
    let second: Vec<_> = service
        .list_fields(FieldOwner::ContentType(owner_id))
        .await
        .unwrap()
        .into_iter()
        .map(|f| (f.id, f.position))
        .collect();

    assert_eq!(first, second);
    assert_eq!(first[0].0, article.tags.id);
}
