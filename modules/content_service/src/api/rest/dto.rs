//! REST DTOs with serde derives for HTTP API
//!
//! Enum-valued fields travel as their canonical strings and are parsed in
//! the mapper so that a bad value becomes a field-keyed validation error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

/// Distinguishes an absent key (`None`) from an explicit `null` (`Some(None)`)
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Generic list envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(items: Vec<T>) -> Self {
        let total = items.len();
        Self { items, total }
    }
}

// ===== Shared =====

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
pub struct GridDto {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub w: i32,
    #[serde(default)]
    pub h: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct StylesDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<String>,
}

/// Field values keyed by field slug
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct FieldValuesDto {
    #[serde(default)]
    pub values: BTreeMap<String, serde_json::Value>,
}

/// Single raw or interpreted value
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValueDto {
    pub value: serde_json::Value,
}

/// Repeater groups keyed by subfield slug
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RepeaterGroupsRequest {
    #[schema(value_type = Vec<Object>)]
    pub groups: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Bulk reposition of one parent scope
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReorderRequest {
    /// `template_sections`, `page_sections`, `page_section_widgets`, `fields`,
    /// `field_options` or `query_filters`
    #[schema(example = "page_sections")]
    pub scope: String,

    /// Id of the parent the listed rows belong to
    pub parent_id: Uuid,

    /// Every member of the scope in its new order
    pub ids: Vec<Uuid>,
}

// ===== Content types =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContentTypeDto {
    pub id: Uuid,
    #[schema(example = "Article")]
    pub name: String,
    #[schema(example = "article")]
    pub slug: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub is_system: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateContentTypeRequest {
    pub name: String,
    /// Derived from the name when omitted
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_system: bool,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateContentTypeRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub icon: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

fn default_true() -> bool {
    true
}

// ===== Fields =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FieldOptionDto {
    pub id: Uuid,
    pub field_definition_id: Uuid,
    pub label: String,
    pub value: String,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewFieldOptionDto {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetFieldOptionsRequest {
    pub options: Vec<NewFieldOptionDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FieldDefinitionDto {
    pub id: Uuid,
    /// `content_type` or `widget_type`
    pub owner_type: String,
    pub owner_id: Uuid,
    pub parent_field_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    #[schema(example = "multiselect")]
    pub field_type: String,
    #[schema(example = "min:3|max:120")]
    pub validation_rules: Option<String>,
    pub settings: serde_json::Value,
    pub default_value: Option<String>,
    pub is_required: bool,
    pub is_unique: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateFieldRequest {
    pub name: String,
    pub slug: String,
    pub field_type: String,
    #[serde(default)]
    pub parent_field_id: Option<Uuid>,
    #[serde(default)]
    pub validation_rules: Option<String>,
    #[serde(default)]
    pub settings: serde_json::Value,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub options: Vec<NewFieldOptionDto>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateFieldRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub field_type: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub validation_rules: Option<Option<String>>,
    #[serde(default)]
    pub settings: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub default_value: Option<Option<String>>,
    #[serde(default)]
    pub is_required: Option<bool>,
    #[serde(default)]
    pub is_unique: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FieldDeletionImpactDto {
    pub options: u64,
    pub values: u64,
    pub repeater_groups: u64,
    pub subfields: u64,
}

/// `?confirm=true` acknowledges an irreversible delete
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

// ===== Content items =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContentItemDto {
    pub id: Uuid,
    pub content_type_id: Uuid,
    pub title: String,
    #[schema(example = "hello-world")]
    pub slug: String,
    #[schema(example = "published")]
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateContentItemRequest {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    /// Defaults to `draft`
    #[serde(default)]
    pub status: Option<String>,
    /// Field values keyed by field slug
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateContentItemRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

// ===== Templates =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TemplateDto {
    pub id: Uuid,
    pub theme_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub is_active: bool,
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTemplateRequest {
    pub theme_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub settings: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateTemplateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub is_default: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub settings: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TemplateSectionDto {
    pub id: Uuid,
    pub template_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub position: i32,
    pub grid: GridDto,
    #[schema(example = "multi_column")]
    pub section_type: String,
    pub column_layout: Option<String>,
    pub is_repeatable: bool,
    pub max_widgets: Option<u32>,
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTemplateSectionRequest {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub grid: GridDto,
    /// Defaults to `standard`
    #[serde(default)]
    pub section_type: Option<String>,
    #[serde(default)]
    pub column_layout: Option<String>,
    #[serde(default)]
    pub is_repeatable: bool,
    #[serde(default)]
    pub max_widgets: Option<u32>,
    #[serde(default)]
    pub settings: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateTemplateSectionRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub grid: Option<GridDto>,
    #[serde(default)]
    pub section_type: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub column_layout: Option<Option<String>>,
    #[serde(default)]
    pub is_repeatable: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<u32>)]
    pub max_widgets: Option<Option<u32>>,
    #[serde(default)]
    pub settings: Option<serde_json::Value>,
}

// ===== Pages =====

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MenuDto {
    #[serde(default)]
    pub show_in_menu: bool,
    #[serde(default)]
    pub menu_title: Option<String>,
    #[serde(default)]
    pub menu_order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PageDto {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub template_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub status: String,
    pub menu: MenuDto,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreatePageRequest {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub template_id: Uuid,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub menu: MenuDto,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdatePageRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub parent_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub menu: Option<MenuDto>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub meta_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub meta_description: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PageNodeDto {
    pub page: PageDto,
    #[schema(no_recursion)]
    pub children: Vec<PageNodeDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PageSectionDto {
    pub id: Uuid,
    pub page_id: Uuid,
    pub template_section_id: Uuid,
    pub position: i32,
    pub styles: StylesDto,
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AttachPageSectionRequest {
    pub template_section_id: Uuid,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub styles: StylesDto,
    #[serde(default)]
    pub settings: serde_json::Value,
}

// ===== Widgets =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WidgetDto {
    pub id: Uuid,
    pub theme_id: Uuid,
    pub name: String,
    pub slug: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateWidgetRequest {
    pub theme_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub settings: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WidgetContentTypeDto {
    pub id: Uuid,
    pub widget_id: Uuid,
    pub content_type_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlacementDto {
    pub id: Uuid,
    pub page_section_id: Uuid,
    pub widget_id: Uuid,
    pub position: i32,
    pub grid: GridDto,
    #[schema(example = "gw-V1StGXR8_Z5j")]
    pub grid_id: String,
    pub settings: serde_json::Value,
    pub content_query: Option<serde_json::Value>,
    pub styles: StylesDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PlaceWidgetRequest {
    pub widget_id: Uuid,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub grid: GridDto,
    #[serde(default)]
    pub settings: serde_json::Value,
    /// Either `{"query_id": ...}` or an inline query definition
    #[serde(default)]
    pub content_query: Option<serde_json::Value>,
    #[serde(default)]
    pub styles: StylesDto,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdatePlacementRequest {
    #[serde(default)]
    pub grid: Option<GridDto>,
    #[serde(default)]
    pub settings: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Object>)]
    pub content_query: Option<Option<serde_json::Value>>,
    #[serde(default)]
    pub styles: Option<StylesDto>,
}

// ===== Queries =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueryFilterDto {
    /// Set for stored filters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub field_id: Option<Uuid>,
    /// Fixed item property (`title`, `slug`, `status`, ...)
    #[serde(default)]
    pub field_key: Option<String>,
    #[schema(example = "equals")]
    pub operator: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub condition_group: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueryDefinitionDto {
    pub content_type_id: Uuid,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub order_by: Option<String>,
    /// `asc` or `desc` (default)
    #[serde(default)]
    pub order_direction: Option<String>,
    #[serde(default)]
    pub filters: Vec<QueryFilterDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContentQueryDto {
    pub id: Uuid,
    pub name: String,
    pub content_type_id: Uuid,
    pub limit: Option<u64>,
    pub offset: u64,
    pub order_by: Option<String>,
    pub order_direction: String,
    pub filters: Vec<QueryFilterDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SaveContentQueryRequest {
    /// Required on create, kept when omitted on update
    #[serde(default)]
    pub name: Option<String>,
    pub definition: QueryDefinitionDto,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQueriesQuery {
    pub content_type_id: Option<Uuid>,
}

// ===== Rendering =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenderedWidgetDto {
    pub placement: PlacementDto,
    pub widget: WidgetDto,
    pub values: BTreeMap<String, serde_json::Value>,
    /// Present when the placement carries a content query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ContentItemDto>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenderedPageSectionDto {
    pub page_section: PageSectionDto,
    pub widgets: Vec<RenderedWidgetDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RenderedSectionDto {
    pub template_section: TemplateSectionDto,
    pub instances: Vec<RenderedPageSectionDto>,
    #[schema(no_recursion)]
    pub children: Vec<RenderedSectionDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PageLayoutDto {
    pub page: PageDto,
    pub template: TemplateDto,
    pub sections: Vec<RenderedSectionDto>,
}
