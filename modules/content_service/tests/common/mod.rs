//! Common test utilities: an in-memory SQLite backed service and shared fixtures

#![allow(dead_code)]

use content_service::contract::*;
use content_service::domain::Service;
use content_service::infra::storage;
use content_service::ContentServiceModule;
use std::sync::Arc;
use uuid::Uuid;

pub fn print_test_header(test_name: &str, purpose: &[&str]) {
    println!("\n🧪 TEST: {}", test_name);
    if let Some(first) = purpose.first() {
        println!("📋 PURPOSE: {}", first);
    }
    for line in purpose.iter().skip(1) {
        println!("   {}", line);
    }
}

/// Migrated, initialised module on a private in-memory database
///
/// A single pooled connection keeps every query on the same SQLite memory database.
pub async fn module() -> ContentServiceModule {
    let db = storage::connect("sqlite::memory:", 1).await.unwrap();
    let module = ContentServiceModule::default();
    module.migrate(&db).await.unwrap();
    module.init(Arc::new(db)).await.unwrap();
    module
}

pub async fn service() -> Arc<Service> {
    module().await.service().unwrap()
}

/// Article content type: required `headline`, multiselect `tags`
#[derive(Debug, Clone)]
pub struct ArticleFixture {
    pub content_type: ContentType,
    pub headline: FieldDefinition,
    pub tags: FieldDefinition,
}

pub async fn article_type(service: &Service) -> ArticleFixture {
    let content_type = service
        .create_content_type(NewContentType::named("Article"), Actor::system())
        .await
        .unwrap();
    let owner = FieldOwner::ContentType(content_type.id);
    let headline = service
        .define_field(owner, NewFieldDefinition::new("Headline", "headline", FieldType::Text).required())
        .await
        .unwrap();
    let tags = service
        .define_field(
            owner,
            NewFieldDefinition::new("Tags", "tags", FieldType::Multiselect)
                .with_options([("Rust", "rust"), ("Web", "web"), ("Databases", "databases")]),
        )
        .await
        .unwrap();
    ArticleFixture {
        content_type,
        headline,
        tags,
    }
}

/// Theme template with a top-level `main` section
#[derive(Debug, Clone)]
pub struct LayoutFixture {
    pub theme_id: Uuid,
    pub template: Template,
    pub main: TemplateSection,
    pub widget: Widget,
}

pub async fn layout(service: &Service, main: NewTemplateSection) -> LayoutFixture {
    let theme_id = Uuid::new_v4();
    let template = service
        .create_template(NewTemplate::new(theme_id, "Landing"))
        .await
        .unwrap();
    let main = service.add_section_to_template(template.id, main).await.unwrap();
    let widget = service
        .create_widget(NewWidget::new(theme_id, "Hero Banner"))
        .await
        .unwrap();
    LayoutFixture {
        theme_id,
        template,
        main,
        widget,
    }
}
