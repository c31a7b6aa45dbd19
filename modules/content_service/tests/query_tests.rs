//! Integration tests for content queries over stored items

mod common;

use common::{print_test_header, service};
use content_service::contract::*;
use content_service::domain::Service;
use serde_json::json;

struct NewsFixture {
    content_type: ContentType,
    category: FieldDefinition,
}

/// Story type with a `category` select and five items
async fn news(service: &Service) -> NewsFixture {
    let content_type = service
        .create_content_type(NewContentType::named("Story"), Actor::system())
        .await
        .unwrap();
    let category = service
        .define_field(
            FieldOwner::ContentType(content_type.id),
            NewFieldDefinition::new("Category", "category", FieldType::Select).with_options([
                ("News", "news"),
                ("Sports", "sports"),
                ("Culture", "culture"),
            ]),
        )
        .await
        .unwrap();

    let stories = [
        ("Election night", ContentStatus::Published, "news"),
        ("Cup final", ContentStatus::Published, "sports"),
        ("Gallery opening", ContentStatus::Published, "culture"),
        ("Budget leak", ContentStatus::Draft, "news"),
        ("Transfer window", ContentStatus::Published, "sports"),
    ];
    for (title, status, category) in stories {
        service
            .create_content_item(
                content_type.id,
                NewContentItem::titled(title)
                    .with_status(status)
                    .with_value("category", json!(category)),
                Actor::system(),
            )
            .await
            .unwrap();
    }

    NewsFixture {
        content_type,
        category,
    }
}

fn titles(items: &[ContentItem]) -> Vec<&str> {
    items.iter().map(|item| item.title.as_str()).collect()
}

#[tokio::test]
async fn test_grouped_filters_combine_or_within_and_across() {
    print_test_header(
        "test_grouped_filters_combine_or_within_and_across",
        &["status = published AND (category = news OR category = sports)"],
    );
    let service = service().await;
    let fixture = news(&service).await;

    let definition = QueryDefinition::for_type(fixture.content_type.id)
        .with_filter(QueryFilter::on_property("status", FilterOperator::Equals, "published"))
        .with_filter(QueryFilter::on_field(fixture.category.id, FilterOperator::Equals, "news").in_group("category"))
        .with_filter(
            QueryFilter::on_field(fixture.category.id, FilterOperator::Equals, "sports").in_group("category"),
        )
        .order_by("title", SortDirection::Asc);

    let items = service
        .run_query_definition(&definition, EvaluationMode::Strict)
        .await
        .unwrap();
    assert_eq!(titles(&items), vec!["Cup final", "Election night", "Transfer window"]);
}

#[tokio::test]
async fn test_order_by_field_and_pagination() {
    let service = service().await;
    let fixture = news(&service).await;

    let definition = QueryDefinition::for_type(fixture.content_type.id)
        .order_by("category", SortDirection::Asc)
        .paginate(2, 1);
    let items = service
        .run_query_definition(&definition, EvaluationMode::Strict)
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
    let values = service.get_content_item_values(items[0].id).await.unwrap();
    assert_eq!(values.get("category"), Some(&FieldValue::Text("news".into())));
}

#[tokio::test]
async fn test_malformed_filter_strict_and_best_effort() {
    print_test_header(
        "test_malformed_filter_strict_and_best_effort",
        &[
            "A saved filter whose field was deleted becomes malformed",
            "Strict evaluation fails, best-effort evaluation skips the filter",
        ],
    );
    let service = service().await;
    let fixture = news(&service).await;
    let saved = service
        .create_content_query(
            "Sports desk".into(),
            QueryDefinition::for_type(fixture.content_type.id)
                .with_filter(QueryFilter::on_property("status", FilterOperator::Equals, "published"))
                .with_filter(QueryFilter::on_field(
                    fixture.category.id,
                    FilterOperator::Equals,
                    "sports",
                )),
        )
        .await
        .unwrap();
    assert_eq!(service.run_content_query(saved.id, EvaluationMode::Strict).await.unwrap().len(), 2);

    service
        .delete_field(fixture.category.id, Confirmation::Confirmed)
        .await
        .unwrap();

    let err = service
        .run_content_query(saved.id, EvaluationMode::Strict)
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::MalformedFilter { position: 1, .. }));

    let items = service
        .run_content_query(saved.id, EvaluationMode::BestEffort)
        .await
        .unwrap();
    assert_eq!(items.len(), 4);
}

#[tokio::test]
async fn test_malformed_filter_rejected_at_authoring_time() {
    let service = service().await;
    let fixture = news(&service).await;

    let err = service
        .create_content_query(
            "Broken".into(),
            QueryDefinition::for_type(fixture.content_type.id).with_filter(QueryFilter::on_property(
                "colour",
                FilterOperator::Equals,
                "red",
            )),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::MalformedFilter { position: 0, .. }));

    let err = service
        .create_content_query(
            "Too many".into(),
            QueryDefinition::for_type(fixture.content_type.id).paginate(u64::MAX, 0),
        )
        .await
        .unwrap_err();
    match err {
        ContentError::Validation { errors } => assert!(errors.contains("limit")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_saved_query_crud() {
    print_test_header(
        "test_saved_query_crud",
        &["Saved queries keep their filters in order and can be replaced and deleted"],
    );
    let service = service().await;
    let fixture = news(&service).await;

    let saved = service
        .create_content_query(
            "Published".into(),
            QueryDefinition::for_type(fixture.content_type.id)
                .with_filter(QueryFilter::on_property("status", FilterOperator::Equals, "published"))
                .with_filter(QueryFilter::on_property("title", FilterOperator::Contains, "night")),
        )
        .await
        .unwrap();
    assert_eq!(saved.filters.len(), 2);
    assert_eq!(saved.filters[0].position, 0);
    assert_eq!(saved.filters[1].position, 1);

    let fetched = service.get_content_query(saved.id).await.unwrap();
    assert_eq!(fetched.definition(), saved.definition());
    assert_eq!(
        titles(&service.run_content_query(saved.id, EvaluationMode::Strict).await.unwrap()),
        vec!["Election night"]
    );

    let reversed = [fetched.filters[1].id, fetched.filters[0].id];
    service
        .reorder(ReorderScope::QueryFilters { query_id: saved.id }, &reversed)
        .await
        .unwrap();
    let reordered = service.get_content_query(saved.id).await.unwrap();
    assert_eq!(reordered.filters[0].id, fetched.filters[1].id);

    let updated = service
        .update_content_query(
            saved.id,
            Some("Drafts".into()),
            QueryDefinition::for_type(fixture.content_type.id)
                .with_filter(QueryFilter::on_property("status", FilterOperator::Equals, "draft")),
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Drafts");
    assert_eq!(updated.filters.len(), 1);
    assert_eq!(
        titles(&service.run_content_query(saved.id, EvaluationMode::Strict).await.unwrap()),
        vec!["Budget leak"]
    );

    assert_eq!(
        service
            .list_content_queries(Some(fixture.content_type.id))
            .await
            .unwrap()
            .len(),
        1
    );
    assert!(service
        .list_content_queries(Some(uuid::Uuid::new_v4()))
        .await
        .unwrap()
        .is_empty());

    service.delete_content_query(saved.id).await.unwrap();
    assert!(matches!(
        service.get_content_query(saved.id).await,
        Err(ContentError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_soft_deleted_items_are_not_candidates() {
    let service = service().await;
    let fixture = news(&service).await;
    let all = service
        .run_query_definition(&QueryDefinition::for_type(fixture.content_type.id), EvaluationMode::Strict)
        .await
        .unwrap();
    assert_eq!(all.len(), 5);

    service.delete_content_item(all[0].id).await.unwrap();
    let remaining = service
        .run_query_definition(&QueryDefinition::for_type(fixture.content_type.id), EvaluationMode::Strict)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 4);
    assert!(remaining.iter().all(|item| item.id != all[0].id));
}
