//! Integration tests for templates, pages, widget placements and rendering

mod common;

use common::{article_type, layout, print_test_header, service};
use content_service::contract::*;
use serde_json::json;
use std::collections::BTreeMap;

#[tokio::test]
async fn test_capacity_of_capped_section() {
    print_test_header(
        "test_capacity_of_capped_section",
        &["A section with max_widgets = 2 accepts two placements and refuses the third"],
    );
    let service = service().await;
    let fixture = layout(&service, NewTemplateSection::new("Main").with_max_widgets(2)).await;
    let page = service
        .create_page(NewPage::new("Home", fixture.template.id), Actor::system())
        .await
        .unwrap();
    let section = service
        .attach_page_section(page.id, fixture.main.id, PageSectionOverrides::default())
        .await
        .unwrap();

    let first = service
        .place_widget(section.id, NewWidgetPlacement::new(fixture.widget.id))
        .await
        .unwrap();
    let second = service
        .place_widget(section.id, NewWidgetPlacement::new(fixture.widget.id))
        .await
        .unwrap();
    assert_ne!(first.grid_id, second.grid_id);
    assert!(second.position > first.position);

    let err = service
        .place_widget(section.id, NewWidgetPlacement::new(fixture.widget.id))
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::CapacityExceeded { max_widgets: 2, .. }));

    service.remove_widget_placement(first.id).await.unwrap();
    service
        .place_widget(section.id, NewWidgetPlacement::new(fixture.widget.id))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_repeatable_sections_count_capacity_per_instance() {
    let service = service().await;
    let fixture = layout(
        &service,
        NewTemplateSection::new("Cards").with_max_widgets(1).repeatable(),
    )
    .await;
    let page = service
        .create_page(NewPage::new("Cards", fixture.template.id), Actor::system())
        .await
        .unwrap();

    for _ in 0..2 {
        let instance = service
            .attach_page_section(page.id, fixture.main.id, PageSectionOverrides::default())
            .await
            .unwrap();
        service
            .place_widget(instance.id, NewWidgetPlacement::new(fixture.widget.id))
            .await
            .unwrap();
    }
    assert_eq!(service.list_page_sections(page.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_lowering_cap_below_existing_placements_is_refused() {
    print_test_header(
        "test_lowering_cap_below_existing_placements_is_refused",
        &["A section already hosting three widgets cannot be capped at one"],
    );
    let service = service().await;
    let fixture = layout(&service, NewTemplateSection::new("Main").with_max_widgets(3)).await;
    let page = service
        .create_page(NewPage::new("Home", fixture.template.id), Actor::system())
        .await
        .unwrap();
    let section = service
        .attach_page_section(page.id, fixture.main.id, PageSectionOverrides::default())
        .await
        .unwrap();
    for _ in 0..3 {
        service
            .place_widget(section.id, NewWidgetPlacement::new(fixture.widget.id))
            .await
            .unwrap();
    }

    let cap = |max_widgets| TemplateSectionPatch {
        max_widgets: Some(Some(max_widgets)),
        ..Default::default()
    };
    let err = service
        .update_template_section(fixture.main.id, cap(1))
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::CapacityExceeded { max_widgets: 1, .. }));
    assert_eq!(
        service.get_template_section(fixture.main.id).await.unwrap().max_widgets,
        Some(3)
    );

    let updated = service
        .update_template_section(fixture.main.id, cap(3))
        .await
        .unwrap();
    assert_eq!(updated.max_widgets, Some(3));
}

#[tokio::test]
async fn test_repeatable_flag_cannot_drop_while_page_repeats_section() {
    print_test_header(
        "test_repeatable_flag_cannot_drop_while_page_repeats_section",
        &["A page holding two instances keeps the section repeatable"],
    );
    let service = service().await;
    let fixture = layout(&service, NewTemplateSection::new("Cards").repeatable()).await;
    let page = service
        .create_page(NewPage::new("Cards", fixture.template.id), Actor::system())
        .await
        .unwrap();
    let first = service
        .attach_page_section(page.id, fixture.main.id, PageSectionOverrides::default())
        .await
        .unwrap();
    let second = service
        .attach_page_section(page.id, fixture.main.id, PageSectionOverrides::default())
        .await
        .unwrap();

    let single = || TemplateSectionPatch {
        is_repeatable: Some(false),
        ..Default::default()
    };
    let err = service
        .update_template_section(fixture.main.id, single())
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::DuplicateSection { page_id, .. } if page_id == page.id));
    assert!(service.get_template_section(fixture.main.id).await.unwrap().is_repeatable);

    service.remove_page_section(second.id).await.unwrap();
    let updated = service
        .update_template_section(fixture.main.id, single())
        .await
        .unwrap();
    assert!(!updated.is_repeatable);
    assert_eq!(service.list_page_sections(page.id).await.unwrap()[0].id, first.id);
}

#[tokio::test]
async fn test_non_repeatable_section_attaches_once() {
    let service = service().await;
    let fixture = layout(&service, NewTemplateSection::new("Main")).await;
    let page = service
        .create_page(NewPage::new("Once", fixture.template.id), Actor::system())
        .await
        .unwrap();

    service
        .attach_page_section(page.id, fixture.main.id, PageSectionOverrides::default())
        .await
        .unwrap();
    let err = service
        .attach_page_section(page.id, fixture.main.id, PageSectionOverrides::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::DuplicateSection { .. }));
}

#[tokio::test]
async fn test_template_section_referential_integrity() {
    print_test_header(
        "test_template_section_referential_integrity",
        &[
            "A template section used by a page cannot be deleted",
            "Deletion succeeds once the page section is removed",
        ],
    );
    let service = service().await;
    let fixture = layout(&service, NewTemplateSection::new("Main")).await;
    let page = service
        .create_page(NewPage::new("About", fixture.template.id), Actor::system())
        .await
        .unwrap();
    let section = service
        .attach_page_section(page.id, fixture.main.id, PageSectionOverrides::default())
        .await
        .unwrap();

    let err = service.delete_template_section(fixture.main.id).await.unwrap_err();
    assert!(matches!(
        err,
        ContentError::ReferentialIntegrity {
            resource: "template_section",
            dependent_resource: "page_section",
            dependents: 1,
            ..
        }
    ));

    service.remove_page_section(section.id).await.unwrap();
    service.delete_template_section(fixture.main.id).await.unwrap();
    assert!(service.list_template_sections(fixture.template.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_template_in_use_cannot_be_deleted() {
    let service = service().await;
    let fixture = layout(&service, NewTemplateSection::new("Main")).await;
    service
        .create_page(NewPage::new("Contact", fixture.template.id), Actor::system())
        .await
        .unwrap();

    let err = service.delete_template(fixture.template.id).await.unwrap_err();
    assert!(matches!(err, ContentError::ReferentialIntegrity { .. }));
}

#[tokio::test]
async fn test_single_default_template_per_theme() {
    let service = service().await;
    let fixture = layout(&service, NewTemplateSection::new("Main")).await;
    let mut input = NewTemplate::new(fixture.theme_id, "Blog");
    input.is_default = true;
    let blog = service.create_template(input).await.unwrap();
    let mut input = NewTemplate::new(fixture.theme_id, "Shop");
    input.is_default = true;
    let shop = service.create_template(input).await.unwrap();

    let templates = service.list_templates(fixture.theme_id).await.unwrap();
    let defaults: Vec<_> = templates.iter().filter(|t| t.is_default).map(|t| t.id).collect();
    assert_eq!(defaults, vec![shop.id]);
    assert!(!service.get_template(blog.id).await.unwrap().is_default);
}

#[tokio::test]
async fn test_reorder_template_sections_is_idempotent() {
    let service = service().await;
    let fixture = layout(&service, NewTemplateSection::new("Header")).await;
    let body = service
        .add_section_to_template(fixture.template.id, NewTemplateSection::new("Body"))
        .await
        .unwrap();
    let footer = service
        .add_section_to_template(fixture.template.id, NewTemplateSection::new("Footer"))
        .await
        .unwrap();

    let scope = ReorderScope::TemplateSections {
        template_id: fixture.template.id,
    };
    let order = [footer.id, fixture.main.id, body.id];
    let positions = |sections: Vec<TemplateSection>| -> Vec<_> {
        sections.into_iter().map(|s| (s.id, s.position)).collect()
    };

    service.reorder(scope, &order).await.unwrap();
    let first = positions(service.list_template_sections(fixture.template.id).await.unwrap());
    service.reorder(scope, &order).await.unwrap();
    let second = positions(service.list_template_sections(fixture.template.id).await.unwrap());

    assert_eq!(first, second);
    assert_eq!(first.iter().map(|(id, _)| *id).collect::<Vec<_>>(), order.to_vec());

    let err = service
        .reorder(scope, &[footer.id, uuid::Uuid::new_v4()])
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::Validation { .. }));
}

#[tokio::test]
async fn test_page_tree_and_cycle_prevention() {
    print_test_header(
        "test_page_tree_and_cycle_prevention",
        &["Pages nest under parents; a page cannot move below its own descendant"],
    );
    let service = service().await;
    let fixture = layout(&service, NewTemplateSection::new("Main")).await;
    let about = service
        .create_page(NewPage::new("About", fixture.template.id), Actor::system())
        .await
        .unwrap();
    let mut team = NewPage::new("Team", fixture.template.id);
    team.parent_id = Some(about.id);
    let team = service.create_page(team, Actor::system()).await.unwrap();

    let tree = service.page_tree().await.unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].page.id, about.id);
    assert_eq!(tree[0].children.len(), 1);
    assert_eq!(tree[0].children[0].page.id, team.id);

    let err = service
        .update_page(
            about.id,
            PagePatch {
                parent_id: Some(Some(team.id)),
                ..Default::default()
            },
            Actor::system(),
        )
        .await
        .unwrap_err();
    match err {
        ContentError::Validation { errors } => assert!(errors.contains("parent_id")),
        other => panic!("expected validation error, got {other:?}"),
    }

    service.delete_page(about.id).await.unwrap();
    let tree = service.page_tree().await.unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].page.id, team.id);

    let restored = service.restore_page(about.id).await.unwrap();
    assert!(restored.deleted_at.is_none());
    assert_eq!(service.page_tree().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_page_slugs_are_global() {
    let service = service().await;
    let fixture = layout(&service, NewTemplateSection::new("Main")).await;
    service
        .create_page(NewPage::new("Pricing", fixture.template.id), Actor::system())
        .await
        .unwrap();
    let err = service
        .create_page(NewPage::new("Pricing", fixture.template.id), Actor::system())
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::DuplicateSlug { ref slug, .. } if slug == "pricing"));
}

#[tokio::test]
async fn test_render_page_resolves_sections_widgets_and_items() {
    print_test_header(
        "test_render_page_resolves_sections_widgets_and_items",
        &[
            "Rendering nests placements under their page and template sections",
            "Placement values and content query items are resolved",
        ],
    );
    let service = service().await;
    let article = article_type(&service).await;
    let fixture = layout(&service, NewTemplateSection::new("Main")).await;
    let mut sidebar = NewTemplateSection::new("Sidebar");
    sidebar.parent_id = Some(fixture.main.id);
    sidebar.section_type = SectionType::Sidebar;
    let sidebar = service
        .add_section_to_template(fixture.template.id, sidebar)
        .await
        .unwrap();

    let heading = service
        .define_field(
            FieldOwner::WidgetType(fixture.widget.id),
            NewFieldDefinition::new("Heading", "heading", FieldType::Text),
        )
        .await
        .unwrap();
    assert_eq!(heading.owner, FieldOwner::WidgetType(fixture.widget.id));
    service
        .allow_content_type(fixture.widget.id, article.content_type.id)
        .await
        .unwrap();

    for title in ["Beta", "Alpha"] {
        service
            .create_content_item(
                article.content_type.id,
                NewContentItem::titled(title).with_value("headline", json!(title)),
                Actor::system(),
            )
            .await
            .unwrap();
    }

    let page = service
        .create_page(NewPage::new("Home", fixture.template.id), Actor::system())
        .await
        .unwrap();
    let main = service
        .attach_page_section(page.id, fixture.main.id, PageSectionOverrides::default())
        .await
        .unwrap();
    let placement = service
        .place_widget(
            main.id,
            NewWidgetPlacement::new(fixture.widget.id).with_content_query(json!({
                "content_type_id": article.content_type.id,
                "order_by": "title",
                "order_direction": "ASC"
            })),
        )
        .await
        .unwrap();
    let mut values = BTreeMap::new();
    values.insert("heading".to_string(), json!("Latest"));
    service.set_widget_values(placement.id, values).await.unwrap();

    let layout = service.render_page(page.id).await.unwrap();
    assert_eq!(layout.template.id, fixture.template.id);
    assert_eq!(layout.sections.len(), 1);

    let main_section = &layout.sections[0];
    assert_eq!(main_section.template_section.id, fixture.main.id);
    assert_eq!(main_section.children.len(), 1);
    assert_eq!(main_section.children[0].template_section.id, sidebar.id);
    assert!(main_section.children[0].instances.is_empty());

    let widgets = &main_section.instances[0].widgets;
    assert_eq!(widgets.len(), 1);
    assert_eq!(widgets[0].values.get("heading"), Some(&FieldValue::Text("Latest".into())));
    let titles: Vec<_> = widgets[0]
        .items
        .as_ref()
        .unwrap()
        .iter()
        .map(|item| item.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Alpha", "Beta"]);
}

#[tokio::test]
async fn test_placement_query_requires_allowed_content_type() {
    let service = service().await;
    let article = article_type(&service).await;
    let fixture = layout(&service, NewTemplateSection::new("Main")).await;
    let page = service
        .create_page(NewPage::new("Home", fixture.template.id), Actor::system())
        .await
        .unwrap();
    let main = service
        .attach_page_section(page.id, fixture.main.id, PageSectionOverrides::default())
        .await
        .unwrap();

    let err = service
        .place_widget(
            main.id,
            NewWidgetPlacement::new(fixture.widget.id)
                .with_content_query(json!({"content_type_id": article.content_type.id})),
        )
        .await
        .unwrap_err();
    match err {
        ContentError::Validation { errors } => assert!(errors.contains("content_query")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_broken_placement_query_renders_empty_items() {
    let service = service().await;
    let article = article_type(&service).await;
    let fixture = layout(&service, NewTemplateSection::new("Main")).await;
    service
        .allow_content_type(fixture.widget.id, article.content_type.id)
        .await
        .unwrap();
    let saved = service
        .create_content_query("All articles".into(), QueryDefinition::for_type(article.content_type.id))
        .await
        .unwrap();

    let page = service
        .create_page(NewPage::new("Home", fixture.template.id), Actor::system())
        .await
        .unwrap();
    let main = service
        .attach_page_section(page.id, fixture.main.id, PageSectionOverrides::default())
        .await
        .unwrap();
    service
        .place_widget(
            main.id,
            NewWidgetPlacement::new(fixture.widget.id).with_content_query(json!({"query_id": saved.id})),
        )
        .await
        .unwrap();
    service.delete_content_query(saved.id).await.unwrap();

    let layout = service.render_page(page.id).await.unwrap();
    let widget = &layout.sections[0].instances[0].widgets[0];
    assert_eq!(widget.items.as_deref(), Some(&[][..]));
}

#[tokio::test]
async fn test_widget_in_use_cannot_be_deleted() {
    let service = service().await;
    let fixture = layout(&service, NewTemplateSection::new("Main")).await;
    let page = service
        .create_page(NewPage::new("Home", fixture.template.id), Actor::system())
        .await
        .unwrap();
    let main = service
        .attach_page_section(page.id, fixture.main.id, PageSectionOverrides::default())
        .await
        .unwrap();
    let placement = service
        .place_widget(main.id, NewWidgetPlacement::new(fixture.widget.id))
        .await
        .unwrap();

    let err = service.delete_widget(fixture.widget.id).await.unwrap_err();
    assert!(matches!(err, ContentError::ReferentialIntegrity { .. }));

    service.remove_widget_placement(placement.id).await.unwrap();
    service.delete_widget(fixture.widget.id).await.unwrap();
}
