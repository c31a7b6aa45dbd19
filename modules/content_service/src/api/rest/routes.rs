//! Route registration and OpenAPI schema document

use super::{dto::*, error::Problem, handlers};
use crate::domain::Service;
use axum::{
    routing::{get, post, put},
    Extension, Json, Router,
};
use std::sync::Arc;
use utoipa::OpenApi;

/// Component schemas of the REST API
#[derive(OpenApi)]
#[openapi(
    info(title = "Content Service API"),
    components(schemas(
        Problem,
        GridDto,
        StylesDto,
        FieldValuesDto,
        ValueDto,
        RepeaterGroupsRequest,
        ReorderRequest,
        ContentTypeDto,
        CreateContentTypeRequest,
        UpdateContentTypeRequest,
        FieldOptionDto,
        NewFieldOptionDto,
        SetFieldOptionsRequest,
        FieldDefinitionDto,
        CreateFieldRequest,
        UpdateFieldRequest,
        FieldDeletionImpactDto,
        ContentItemDto,
        CreateContentItemRequest,
        UpdateContentItemRequest,
        TemplateDto,
        CreateTemplateRequest,
        UpdateTemplateRequest,
        TemplateSectionDto,
        CreateTemplateSectionRequest,
        UpdateTemplateSectionRequest,
        MenuDto,
        PageDto,
        CreatePageRequest,
        UpdatePageRequest,
        PageNodeDto,
        PageSectionDto,
        AttachPageSectionRequest,
        WidgetDto,
        CreateWidgetRequest,
        WidgetContentTypeDto,
        PlacementDto,
        PlaceWidgetRequest,
        UpdatePlacementRequest,
        QueryFilterDto,
        QueryDefinitionDto,
        ContentQueryDto,
        SaveContentQueryRequest,
        RenderedWidgetDto,
        RenderedPageSectionDto,
        RenderedSectionDto,
        PageLayoutDto,
    ))
)]
pub struct ApiDoc;

/// Register all REST routes on `router`
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    router
        // Content types
        .route(
            "/content-types",
            get(handlers::list_content_types).post(handlers::create_content_type),
        )
        .route("/content-types/by-slug/{slug}", get(handlers::get_content_type_by_slug))
        .route(
            "/content-types/{id}",
            get(handlers::get_content_type)
                .put(handlers::update_content_type)
                .delete(handlers::delete_content_type),
        )
        .route(
            "/content-types/{id}/fields",
            get(handlers::list_content_type_fields).post(handlers::define_content_type_field),
        )
        .route(
            "/content-types/{id}/items",
            get(handlers::list_content_items).post(handlers::create_content_item),
        )
        .route(
            "/content-types/{id}/items/by-slug/{slug}",
            get(handlers::get_content_item_by_slug),
        )
        // Fields
        .route(
            "/fields/{id}",
            get(handlers::get_field)
                .put(handlers::update_field)
                .delete(handlers::delete_field),
        )
        .route("/fields/{id}/impact", get(handlers::preview_field_deletion))
        .route("/fields/{id}/validate", post(handlers::validate_field_value))
        .route(
            "/fields/{id}/options",
            get(handlers::list_field_options).put(handlers::set_field_options),
        )
        // Content items
        .route(
            "/items/{id}",
            get(handlers::get_content_item)
                .put(handlers::update_content_item)
                .delete(handlers::delete_content_item),
        )
        .route("/items/{id}/values", get(handlers::get_content_item_values))
        .route("/items/{id}/restore", post(handlers::restore_content_item))
        .route("/items/{id}/purge", post(handlers::purge_content_item))
        // Raw values
        .route(
            "/instances/{instance_id}/values/{field_id}",
            get(handlers::get_value).put(handlers::set_value),
        )
        .route(
            "/instances/{instance_id}/repeaters/{field_id}",
            put(handlers::set_repeater_groups),
        )
        // Templates
        .route("/themes/{theme_id}/templates", get(handlers::list_templates))
        .route("/templates", post(handlers::create_template))
        .route(
            "/templates/{id}",
            get(handlers::get_template)
                .put(handlers::update_template)
                .delete(handlers::delete_template),
        )
        .route(
            "/templates/{id}/sections",
            get(handlers::list_template_sections).post(handlers::add_template_section),
        )
        .route(
            "/template-sections/{id}",
            get(handlers::get_template_section)
                .put(handlers::update_template_section)
                .delete(handlers::delete_template_section),
        )
        // Pages
        .route("/pages", get(handlers::page_tree).post(handlers::create_page))
        .route("/pages/by-slug/{slug}", get(handlers::get_page_by_slug))
        .route(
            "/pages/{id}",
            get(handlers::get_page)
                .put(handlers::update_page)
                .delete(handlers::delete_page),
        )
        .route("/pages/{id}/restore", post(handlers::restore_page))
        .route("/pages/{id}/render", get(handlers::render_page))
        .route(
            "/pages/{id}/sections",
            get(handlers::list_page_sections).post(handlers::attach_page_section),
        )
        .route(
            "/page-sections/{id}",
            get(handlers::get_page_section).delete(handlers::remove_page_section),
        )
        .route(
            "/page-sections/{id}/widgets",
            get(handlers::list_widget_placements).post(handlers::place_widget),
        )
        .route(
            "/placements/{id}",
            get(handlers::get_widget_placement)
                .put(handlers::update_widget_placement)
                .delete(handlers::remove_widget_placement),
        )
        .route(
            "/placements/{id}/values",
            get(handlers::get_widget_values).put(handlers::set_widget_values),
        )
        // Widgets
        .route("/themes/{theme_id}/widgets", get(handlers::list_widgets))
        .route("/widgets", post(handlers::create_widget))
        .route(
            "/widgets/{id}",
            get(handlers::get_widget).delete(handlers::delete_widget),
        )
        .route(
            "/widgets/{id}/fields",
            get(handlers::list_widget_fields).post(handlers::define_widget_field),
        )
        .route("/widgets/{id}/content-types", get(handlers::list_allowed_content_types))
        .route(
            "/widgets/{id}/content-types/{content_type_id}",
            put(handlers::allow_content_type).delete(handlers::disallow_content_type),
        )
        // Queries
        .route(
            "/queries",
            get(handlers::list_content_queries).post(handlers::create_content_query),
        )
        .route("/queries/run", post(handlers::run_query_definition))
        .route(
            "/queries/{id}",
            get(handlers::get_content_query)
                .put(handlers::update_content_query)
                .delete(handlers::delete_content_query),
        )
        .route("/queries/{id}/run", post(handlers::run_content_query))
        // Bulk reposition
        .route("/reorder", post(handlers::reorder))
        .route("/openapi.json", get(openapi))
        .layer(Extension(service))
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
