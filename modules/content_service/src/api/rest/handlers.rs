//! HTTP request handlers - thin layer that delegates to domain service

use super::{dto::*, error::Problem, mapper::{reorder_scope, values_to_json}};
use crate::contract::{Actor, Confirmation, EvaluationMode, FieldOwner, QueryDefinition};
use crate::domain::Service;
use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// Header carrying the authenticated user id, set by the gateway
pub const USER_ID_HEADER: &str = "x-user-id";

type Svc = Extension<Arc<Service>>;

fn actor(headers: &HeaderMap) -> Result<Actor, Problem> {
    let Some(raw) = headers.get(USER_ID_HEADER) else {
        return Ok(Actor::system());
    };
    raw.to_str()
        .ok()
        .and_then(|s| Uuid::parse_str(s).ok())
        .map(Actor::user)
        .ok_or_else(|| Problem::bad_request(format!("{USER_ID_HEADER} must be a UUID")))
}

fn list<T, U: From<T>>(items: Vec<T>) -> Json<ListResponse<U>> {
    Json(items.into_iter().map(Into::into).collect::<Vec<U>>().into())
}

// ===== Content types =====

pub async fn list_content_types(Extension(service): Svc) -> Result<Json<ListResponse<ContentTypeDto>>, Problem> {
    Ok(list(service.list_content_types().await?))
}

pub async fn create_content_type(
    Extension(service): Svc,
    headers: HeaderMap,
    Json(req): Json<CreateContentTypeRequest>,
) -> Result<(StatusCode, Json<ContentTypeDto>), Problem> {
    let content_type = service.create_content_type(req.into(), actor(&headers)?).await?;
    Ok((StatusCode::CREATED, Json(content_type.into())))
}

pub async fn get_content_type(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<Json<ContentTypeDto>, Problem> {
    Ok(Json(service.get_content_type(id).await?.into()))
}

pub async fn get_content_type_by_slug(
    Extension(service): Svc,
    Path(slug): Path<String>,
) -> Result<Json<ContentTypeDto>, Problem> {
    Ok(Json(service.get_content_type_by_slug(&slug).await?.into()))
}

pub async fn update_content_type(
    Extension(service): Svc,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateContentTypeRequest>,
) -> Result<Json<ContentTypeDto>, Problem> {
    let content_type = service
        .update_content_type(id, req.into(), actor(&headers)?)
        .await?;
    Ok(Json(content_type.into()))
}

pub async fn delete_content_type(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<StatusCode, Problem> {
    service.delete_content_type(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ===== Fields =====

pub async fn list_content_type_fields(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
) -> Result<Json<ListResponse<FieldDefinitionDto>>, Problem> {
    Ok(list(service.list_fields(FieldOwner::ContentType(id)).await?))
}

pub async fn define_content_type_field(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateFieldRequest>,
) -> Result<(StatusCode, Json<FieldDefinitionDto>), Problem> {
    let field = service
        .define_field(FieldOwner::ContentType(id), req.try_into()?)
        .await?;
    Ok((StatusCode::CREATED, Json(field.into())))
}

pub async fn list_widget_fields(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
) -> Result<Json<ListResponse<FieldDefinitionDto>>, Problem> {
    Ok(list(service.list_fields(FieldOwner::WidgetType(id)).await?))
}

pub async fn define_widget_field(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateFieldRequest>,
) -> Result<(StatusCode, Json<FieldDefinitionDto>), Problem> {
    let field = service
        .define_field(FieldOwner::WidgetType(id), req.try_into()?)
        .await?;
    Ok((StatusCode::CREATED, Json(field.into())))
}

pub async fn get_field(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<Json<FieldDefinitionDto>, Problem> {
    Ok(Json(service.get_field(id).await?.into()))
}

pub async fn update_field(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateFieldRequest>,
) -> Result<Json<FieldDefinitionDto>, Problem> {
    Ok(Json(service.update_field(id, req.try_into()?).await?.into()))
}

/// Without `?confirm=true` the response is 428 and nothing is deleted
pub async fn delete_field(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Json<FieldDeletionImpactDto>, Problem> {
    let confirmation = if query.confirm {
        Confirmation::Confirmed
    } else {
        Confirmation::Unconfirmed
    };
    Ok(Json(service.delete_field(id, confirmation).await?.into()))
}

pub async fn preview_field_deletion(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
) -> Result<Json<FieldDeletionImpactDto>, Problem> {
    Ok(Json(service.preview_field_deletion(id).await?.into()))
}

pub async fn validate_field_value(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
    Json(req): Json<ValueDto>,
) -> Result<StatusCode, Problem> {
    service.validate_value(id, &req.value).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_field_options(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
) -> Result<Json<ListResponse<FieldOptionDto>>, Problem> {
    Ok(list(service.list_field_options(id).await?))
}

pub async fn set_field_options(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
    Json(req): Json<SetFieldOptionsRequest>,
) -> Result<Json<ListResponse<FieldOptionDto>>, Problem> {
    let options = req.options.into_iter().map(Into::into).collect();
    Ok(list(service.set_field_options(id, options).await?))
}

// ===== Content items =====

/// Live items of a type, newest first
pub async fn list_content_items(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
) -> Result<Json<ListResponse<ContentItemDto>>, Problem> {
    let items = service
        .run_query_definition(&QueryDefinition::for_type(id), EvaluationMode::Strict)
        .await?;
    Ok(list(items))
}

pub async fn create_content_item(
    Extension(service): Svc,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateContentItemRequest>,
) -> Result<(StatusCode, Json<ContentItemDto>), Problem> {
    let item = service
        .create_content_item(id, req.try_into()?, actor(&headers)?)
        .await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

pub async fn get_content_item_by_slug(
    Extension(service): Svc,
    Path((id, slug)): Path<(Uuid, String)>,
) -> Result<Json<ContentItemDto>, Problem> {
    Ok(Json(service.get_content_item_by_slug(id, &slug).await?.into()))
}

pub async fn get_content_item(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<Json<ContentItemDto>, Problem> {
    Ok(Json(service.get_content_item(id).await?.into()))
}

pub async fn update_content_item(
    Extension(service): Svc,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateContentItemRequest>,
) -> Result<Json<ContentItemDto>, Problem> {
    let item = service
        .update_content_item(id, req.try_into()?, actor(&headers)?)
        .await?;
    Ok(Json(item.into()))
}

pub async fn delete_content_item(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<StatusCode, Problem> {
    service.delete_content_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_content_item(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
) -> Result<Json<ContentItemDto>, Problem> {
    Ok(Json(service.restore_content_item(id).await?.into()))
}

pub async fn purge_content_item(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<StatusCode, Problem> {
    service.purge_content_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_content_item_values(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
) -> Result<Json<FieldValuesDto>, Problem> {
    let values = service.get_content_item_values(id).await?;
    Ok(Json(FieldValuesDto {
        values: values_to_json(values),
    }))
}

// ===== Raw values =====

pub async fn get_value(
    Extension(service): Svc,
    Path((instance_id, field_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ValueDto>, Problem> {
    let value = service.get_value(instance_id, field_id).await?;
    Ok(Json(ValueDto { value: value.to_json() }))
}

pub async fn set_value(
    Extension(service): Svc,
    Path((instance_id, field_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ValueDto>,
) -> Result<Json<ValueDto>, Problem> {
    let value = service.set_value(instance_id, field_id, req.value).await?;
    Ok(Json(ValueDto { value: value.to_json() }))
}

pub async fn set_repeater_groups(
    Extension(service): Svc,
    Path((instance_id, field_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<RepeaterGroupsRequest>,
) -> Result<Json<ValueDto>, Problem> {
    let value = service
        .set_repeater_groups(instance_id, field_id, req.groups)
        .await?;
    Ok(Json(ValueDto { value: value.to_json() }))
}

// ===== Templates =====

pub async fn list_templates(
    Extension(service): Svc,
    Path(theme_id): Path<Uuid>,
) -> Result<Json<ListResponse<TemplateDto>>, Problem> {
    Ok(list(service.list_templates(theme_id).await?))
}

pub async fn create_template(
    Extension(service): Svc,
    Json(req): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<TemplateDto>), Problem> {
    let template = service.create_template(req.into()).await?;
    Ok((StatusCode::CREATED, Json(template.into())))
}

pub async fn get_template(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<Json<TemplateDto>, Problem> {
    Ok(Json(service.get_template(id).await?.into()))
}

pub async fn update_template(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTemplateRequest>,
) -> Result<Json<TemplateDto>, Problem> {
    Ok(Json(service.update_template(id, req.into()).await?.into()))
}

pub async fn delete_template(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<StatusCode, Problem> {
    service.delete_template(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_template_sections(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
) -> Result<Json<ListResponse<TemplateSectionDto>>, Problem> {
    Ok(list(service.list_template_sections(id).await?))
}

pub async fn add_template_section(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateTemplateSectionRequest>,
) -> Result<(StatusCode, Json<TemplateSectionDto>), Problem> {
    let section = service.add_section_to_template(id, req.try_into()?).await?;
    Ok((StatusCode::CREATED, Json(section.into())))
}

pub async fn get_template_section(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
) -> Result<Json<TemplateSectionDto>, Problem> {
    Ok(Json(service.get_template_section(id).await?.into()))
}

pub async fn update_template_section(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTemplateSectionRequest>,
) -> Result<Json<TemplateSectionDto>, Problem> {
    Ok(Json(service.update_template_section(id, req.try_into()?).await?.into()))
}

pub async fn delete_template_section(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<StatusCode, Problem> {
    service.delete_template_section(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ===== Pages =====

pub async fn page_tree(Extension(service): Svc) -> Result<Json<Vec<PageNodeDto>>, Problem> {
    let tree = service.page_tree().await?;
    Ok(Json(tree.into_iter().map(Into::into).collect()))
}

pub async fn create_page(
    Extension(service): Svc,
    headers: HeaderMap,
    Json(req): Json<CreatePageRequest>,
) -> Result<(StatusCode, Json<PageDto>), Problem> {
    let page = service.create_page(req.try_into()?, actor(&headers)?).await?;
    Ok((StatusCode::CREATED, Json(page.into())))
}

pub async fn get_page(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<Json<PageDto>, Problem> {
    Ok(Json(service.get_page(id).await?.into()))
}

pub async fn get_page_by_slug(Extension(service): Svc, Path(slug): Path<String>) -> Result<Json<PageDto>, Problem> {
    Ok(Json(service.get_page_by_slug(&slug).await?.into()))
}

pub async fn update_page(
    Extension(service): Svc,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePageRequest>,
) -> Result<Json<PageDto>, Problem> {
    let page = service
        .update_page(id, req.try_into()?, actor(&headers)?)
        .await?;
    Ok(Json(page.into()))
}

pub async fn delete_page(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<StatusCode, Problem> {
    service.delete_page(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_page(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<Json<PageDto>, Problem> {
    Ok(Json(service.restore_page(id).await?.into()))
}

pub async fn render_page(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<Json<PageLayoutDto>, Problem> {
    Ok(Json(service.render_page(id).await?.into()))
}

pub async fn list_page_sections(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
) -> Result<Json<ListResponse<PageSectionDto>>, Problem> {
    Ok(list(service.list_page_sections(id).await?))
}

pub async fn attach_page_section(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
    Json(req): Json<AttachPageSectionRequest>,
) -> Result<(StatusCode, Json<PageSectionDto>), Problem> {
    let template_section_id = req.template_section_id;
    let section = service
        .attach_page_section(id, template_section_id, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(section.into())))
}

pub async fn get_page_section(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<Json<PageSectionDto>, Problem> {
    Ok(Json(service.get_page_section(id).await?.into()))
}

pub async fn remove_page_section(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<StatusCode, Problem> {
    service.remove_page_section(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ===== Placements =====

pub async fn list_widget_placements(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
) -> Result<Json<ListResponse<PlacementDto>>, Problem> {
    Ok(list(service.list_widget_placements(id).await?))
}

pub async fn place_widget(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
    Json(req): Json<PlaceWidgetRequest>,
) -> Result<(StatusCode, Json<PlacementDto>), Problem> {
    let placement = service.place_widget(id, req.into()).await?;
    Ok((StatusCode::CREATED, Json(placement.into())))
}

pub async fn get_widget_placement(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<Json<PlacementDto>, Problem> {
    Ok(Json(service.get_widget_placement(id).await?.into()))
}

pub async fn update_widget_placement(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePlacementRequest>,
) -> Result<Json<PlacementDto>, Problem> {
    Ok(Json(service.update_widget_placement(id, req.into()).await?.into()))
}

pub async fn remove_widget_placement(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<StatusCode, Problem> {
    service.remove_widget_placement(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_widget_values(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<Json<FieldValuesDto>, Problem> {
    let values = service.get_widget_values(id).await?;
    Ok(Json(FieldValuesDto {
        values: values_to_json(values),
    }))
}

pub async fn set_widget_values(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
    Json(req): Json<FieldValuesDto>,
) -> Result<Json<FieldValuesDto>, Problem> {
    let values = service.set_widget_values(id, req.values).await?;
    Ok(Json(FieldValuesDto {
        values: values_to_json(values),
    }))
}

// ===== Widgets =====

pub async fn list_widgets(
    Extension(service): Svc,
    Path(theme_id): Path<Uuid>,
) -> Result<Json<ListResponse<WidgetDto>>, Problem> {
    Ok(list(service.list_widgets(theme_id).await?))
}

pub async fn create_widget(
    Extension(service): Svc,
    Json(req): Json<CreateWidgetRequest>,
) -> Result<(StatusCode, Json<WidgetDto>), Problem> {
    let widget = service.create_widget(req.into()).await?;
    Ok((StatusCode::CREATED, Json(widget.into())))
}

pub async fn get_widget(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<Json<WidgetDto>, Problem> {
    Ok(Json(service.get_widget(id).await?.into()))
}

pub async fn delete_widget(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<StatusCode, Problem> {
    service.delete_widget(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_allowed_content_types(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
) -> Result<Json<ListResponse<ContentTypeDto>>, Problem> {
    Ok(list(service.list_allowed_content_types(id).await?))
}

pub async fn allow_content_type(
    Extension(service): Svc,
    Path((id, content_type_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<WidgetContentTypeDto>, Problem> {
    Ok(Json(service.allow_content_type(id, content_type_id).await?.into()))
}

pub async fn disallow_content_type(
    Extension(service): Svc,
    Path((id, content_type_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, Problem> {
    service.disallow_content_type(id, content_type_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ===== Queries =====

pub async fn list_content_queries(
    Extension(service): Svc,
    Query(query): Query<ListQueriesQuery>,
) -> Result<Json<ListResponse<ContentQueryDto>>, Problem> {
    Ok(list(service.list_content_queries(query.content_type_id).await?))
}

pub async fn create_content_query(
    Extension(service): Svc,
    Json(req): Json<SaveContentQueryRequest>,
) -> Result<(StatusCode, Json<ContentQueryDto>), Problem> {
    let query = service
        .create_content_query(req.name.unwrap_or_default(), req.definition.try_into()?)
        .await?;
    Ok((StatusCode::CREATED, Json(query.into())))
}

pub async fn get_content_query(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<Json<ContentQueryDto>, Problem> {
    Ok(Json(service.get_content_query(id).await?.into()))
}

pub async fn update_content_query(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
    Json(req): Json<SaveContentQueryRequest>,
) -> Result<Json<ContentQueryDto>, Problem> {
    let query = service
        .update_content_query(id, req.name, req.definition.try_into()?)
        .await?;
    Ok(Json(query.into()))
}

pub async fn delete_content_query(Extension(service): Svc, Path(id): Path<Uuid>) -> Result<StatusCode, Problem> {
    service.delete_content_query(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn run_content_query(
    Extension(service): Svc,
    Path(id): Path<Uuid>,
) -> Result<Json<ListResponse<ContentItemDto>>, Problem> {
    Ok(list(service.run_content_query(id, EvaluationMode::Strict).await?))
}

pub async fn run_query_definition(
    Extension(service): Svc,
    Json(req): Json<QueryDefinitionDto>,
) -> Result<Json<ListResponse<ContentItemDto>>, Problem> {
    let definition: QueryDefinition = req.try_into()?;
    Ok(list(
        service
            .run_query_definition(&definition, EvaluationMode::Strict)
            .await?,
    ))
}

// ===== Reorder =====

pub async fn reorder(Extension(service): Svc, Json(req): Json<ReorderRequest>) -> Result<StatusCode, Problem> {
    let scope = reorder_scope(&req.scope, req.parent_id)?;
    service.reorder(scope, &req.ids).await?;
    Ok(StatusCode::NO_CONTENT)
}
