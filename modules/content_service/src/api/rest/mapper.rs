//! Mapper implementations for converting between DTOs and contract models
//!
//! Outbound conversions are infallible `From` impls. Inbound requests carry
//! enum names as strings, so they convert with `TryFrom` and fail with a
//! field-keyed validation error.

use super::dto::*;
use crate::contract::{self, ContentError};
use std::str::FromStr;

fn parse<T: FromStr>(field: &str, raw: &str) -> Result<T, ContentError> {
    raw.parse()
        .map_err(|_| ContentError::validation(field, format!("The selected {field} is invalid.")))
}

fn parse_opt<T: FromStr>(field: &str, raw: Option<&str>) -> Result<Option<T>, ContentError> {
    raw.map(|raw| parse(field, raw)).transpose()
}

// ===== Shared =====

impl From<contract::GridRect> for GridDto {
    fn from(grid: contract::GridRect) -> Self {
        Self {
            x: grid.x,
            y: grid.y,
            w: grid.w,
            h: grid.h,
        }
    }
}

impl From<GridDto> for contract::GridRect {
    fn from(grid: GridDto) -> Self {
        Self {
            x: grid.x,
            y: grid.y,
            w: grid.w,
            h: grid.h,
        }
    }
}

impl From<contract::StyleOverrides> for StylesDto {
    fn from(styles: contract::StyleOverrides) -> Self {
        Self {
            css_class: styles.css_class,
            background_color: styles.background_color,
            padding: styles.padding,
            margin: styles.margin,
        }
    }
}

impl From<StylesDto> for contract::StyleOverrides {
    fn from(styles: StylesDto) -> Self {
        Self {
            css_class: styles.css_class,
            background_color: styles.background_color,
            padding: styles.padding,
            margin: styles.margin,
        }
    }
}

pub fn values_to_json(
    values: std::collections::BTreeMap<String, contract::FieldValue>,
) -> std::collections::BTreeMap<String, serde_json::Value> {
    values
        .into_iter()
        .map(|(slug, value)| (slug, value.to_json()))
        .collect()
}

/// Map a reorder scope name onto its parent id
pub fn reorder_scope(scope: &str, parent_id: uuid::Uuid) -> Result<contract::ReorderScope, ContentError> {
    use contract::ReorderScope;
    Ok(match scope {
        "template_sections" => ReorderScope::TemplateSections { template_id: parent_id },
        "page_sections" => ReorderScope::PageSections { page_id: parent_id },
        "page_section_widgets" => ReorderScope::PageSectionWidgets {
            page_section_id: parent_id,
        },
        "fields" => ReorderScope::Fields { owner_id: parent_id },
        "field_options" => ReorderScope::FieldOptions {
            field_definition_id: parent_id,
        },
        "query_filters" => ReorderScope::QueryFilters { query_id: parent_id },
        _ => return Err(ContentError::validation("scope", "The selected scope is invalid.")),
    })
}

// ===== Content types =====

impl From<contract::ContentType> for ContentTypeDto {
    fn from(content_type: contract::ContentType) -> Self {
        Self {
            id: content_type.id,
            name: content_type.name,
            slug: content_type.slug,
            icon: content_type.icon,
            description: content_type.description,
            is_active: content_type.is_active,
            is_system: content_type.is_system,
            created_by: content_type.created_by,
            updated_by: content_type.updated_by,
            created_at: content_type.created_at,
            updated_at: content_type.updated_at,
        }
    }
}

impl From<CreateContentTypeRequest> for contract::NewContentType {
    fn from(req: CreateContentTypeRequest) -> Self {
        Self {
            name: req.name,
            slug: req.slug,
            icon: req.icon,
            description: req.description,
            is_active: req.is_active,
            is_system: req.is_system,
        }
    }
}

impl From<UpdateContentTypeRequest> for contract::ContentTypePatch {
    fn from(req: UpdateContentTypeRequest) -> Self {
        Self {
            name: req.name,
            slug: req.slug,
            icon: req.icon,
            description: req.description,
            is_active: req.is_active,
        }
    }
}

// ===== Fields =====

impl From<contract::FieldOption> for FieldOptionDto {
    fn from(option: contract::FieldOption) -> Self {
        Self {
            id: option.id,
            field_definition_id: option.field_definition_id,
            label: option.label,
            value: option.value,
            position: option.position,
        }
    }
}

impl From<NewFieldOptionDto> for contract::NewFieldOption {
    fn from(option: NewFieldOptionDto) -> Self {
        Self {
            label: option.label,
            value: option.value,
        }
    }
}

impl From<contract::FieldDefinition> for FieldDefinitionDto {
    fn from(field: contract::FieldDefinition) -> Self {
        Self {
            id: field.id,
            owner_type: field.owner.kind().to_string(),
            owner_id: field.owner.id(),
            parent_field_id: field.parent_field_id,
            name: field.name,
            slug: field.slug,
            field_type: field.field_type.to_string(),
            validation_rules: field.validation_rules,
            settings: field.settings,
            default_value: field.default_value,
            is_required: field.is_required,
            is_unique: field.is_unique,
            position: field.position,
            created_at: field.created_at,
            updated_at: field.updated_at,
        }
    }
}

impl TryFrom<CreateFieldRequest> for contract::NewFieldDefinition {
    type Error = ContentError;

    fn try_from(req: CreateFieldRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: req.name,
            slug: req.slug,
            field_type: parse("field_type", &req.field_type)?,
            parent_field_id: req.parent_field_id,
            validation_rules: req.validation_rules,
            settings: req.settings,
            default_value: req.default_value,
            is_required: req.is_required,
            is_unique: req.is_unique,
            position: req.position,
            options: req.options.into_iter().map(Into::into).collect(),
        })
    }
}

impl TryFrom<UpdateFieldRequest> for contract::FieldDefinitionPatch {
    type Error = ContentError;

    fn try_from(req: UpdateFieldRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: req.name,
            slug: req.slug,
            field_type: parse_opt("field_type", req.field_type.as_deref())?,
            validation_rules: req.validation_rules,
            settings: req.settings,
            default_value: req.default_value,
            is_required: req.is_required,
            is_unique: req.is_unique,
        })
    }
}

impl From<contract::FieldDeletionImpact> for FieldDeletionImpactDto {
    fn from(impact: contract::FieldDeletionImpact) -> Self {
        Self {
            options: impact.options,
            values: impact.values,
            repeater_groups: impact.repeater_groups,
            subfields: impact.subfields,
        }
    }
}

// ===== Content items =====

impl From<contract::ContentItem> for ContentItemDto {
    fn from(item: contract::ContentItem) -> Self {
        Self {
            id: item.id,
            content_type_id: item.content_type_id,
            title: item.title,
            slug: item.slug,
            status: item.status.to_string(),
            published_at: item.published_at,
            created_by: item.created_by,
            updated_by: item.updated_by,
            created_at: item.created_at,
            updated_at: item.updated_at,
            deleted_at: item.deleted_at,
        }
    }
}

impl TryFrom<CreateContentItemRequest> for contract::NewContentItem {
    type Error = ContentError;

    fn try_from(req: CreateContentItemRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: req.title,
            slug: req.slug,
            status: parse_opt("status", req.status.as_deref())?.unwrap_or(contract::ContentStatus::Draft),
            field_values: req.fields,
        })
    }
}

impl TryFrom<UpdateContentItemRequest> for contract::ContentItemPatch {
    type Error = ContentError;

    fn try_from(req: UpdateContentItemRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: req.title,
            slug: req.slug,
            status: parse_opt("status", req.status.as_deref())?,
            field_values: req.fields,
        })
    }
}

// ===== Templates =====

impl From<contract::Template> for TemplateDto {
    fn from(template: contract::Template) -> Self {
        Self {
            id: template.id,
            theme_id: template.theme_id,
            name: template.name,
            slug: template.slug,
            description: template.description,
            is_default: template.is_default,
            is_active: template.is_active,
            settings: template.settings,
            created_at: template.created_at,
            updated_at: template.updated_at,
        }
    }
}

impl From<CreateTemplateRequest> for contract::NewTemplate {
    fn from(req: CreateTemplateRequest) -> Self {
        Self {
            theme_id: req.theme_id,
            name: req.name,
            slug: req.slug,
            description: req.description,
            is_default: req.is_default,
            is_active: req.is_active,
            settings: req.settings,
        }
    }
}

impl From<UpdateTemplateRequest> for contract::TemplatePatch {
    fn from(req: UpdateTemplateRequest) -> Self {
        Self {
            name: req.name,
            slug: req.slug,
            description: req.description,
            is_default: req.is_default,
            is_active: req.is_active,
            settings: req.settings,
        }
    }
}

impl From<contract::TemplateSection> for TemplateSectionDto {
    fn from(section: contract::TemplateSection) -> Self {
        Self {
            id: section.id,
            template_id: section.template_id,
            parent_id: section.parent_id,
            name: section.name,
            slug: section.slug,
            position: section.position,
            grid: section.grid.into(),
            section_type: section.section_type.to_string(),
            column_layout: section.column_layout,
            is_repeatable: section.is_repeatable,
            max_widgets: section.max_widgets,
            settings: section.settings,
            created_at: section.created_at,
            updated_at: section.updated_at,
        }
    }
}

impl TryFrom<CreateTemplateSectionRequest> for contract::NewTemplateSection {
    type Error = ContentError;

    fn try_from(req: CreateTemplateSectionRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: req.name,
            slug: req.slug,
            parent_id: req.parent_id,
            position: req.position,
            grid: req.grid.into(),
            section_type: parse_opt("section_type", req.section_type.as_deref())?
                .unwrap_or(contract::SectionType::Standard),
            column_layout: req.column_layout,
            is_repeatable: req.is_repeatable,
            max_widgets: req.max_widgets,
            settings: req.settings,
        })
    }
}

impl TryFrom<UpdateTemplateSectionRequest> for contract::TemplateSectionPatch {
    type Error = ContentError;

    fn try_from(req: UpdateTemplateSectionRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: req.name,
            grid: req.grid.map(Into::into),
            section_type: parse_opt("section_type", req.section_type.as_deref())?,
            column_layout: req.column_layout,
            is_repeatable: req.is_repeatable,
            max_widgets: req.max_widgets,
            settings: req.settings,
        })
    }
}

// ===== Pages =====

impl From<contract::MenuSettings> for MenuDto {
    fn from(menu: contract::MenuSettings) -> Self {
        Self {
            show_in_menu: menu.show_in_menu,
            menu_title: menu.menu_title,
            menu_order: menu.menu_order,
        }
    }
}

impl From<MenuDto> for contract::MenuSettings {
    fn from(menu: MenuDto) -> Self {
        Self {
            show_in_menu: menu.show_in_menu,
            menu_title: menu.menu_title,
            menu_order: menu.menu_order,
        }
    }
}

impl From<contract::Page> for PageDto {
    fn from(page: contract::Page) -> Self {
        Self {
            id: page.id,
            title: page.title,
            slug: page.slug,
            template_id: page.template_id,
            parent_id: page.parent_id,
            status: page.status.to_string(),
            menu: page.menu.into(),
            meta_title: page.meta_title,
            meta_description: page.meta_description,
            published_at: page.published_at,
            created_by: page.created_by,
            updated_by: page.updated_by,
            created_at: page.created_at,
            updated_at: page.updated_at,
            deleted_at: page.deleted_at,
        }
    }
}

impl TryFrom<CreatePageRequest> for contract::NewPage {
    type Error = ContentError;

    fn try_from(req: CreatePageRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: req.title,
            slug: req.slug,
            template_id: req.template_id,
            parent_id: req.parent_id,
            status: parse_opt("status", req.status.as_deref())?.unwrap_or(contract::PageStatus::Draft),
            menu: req.menu.into(),
            meta_title: req.meta_title,
            meta_description: req.meta_description,
        })
    }
}

impl TryFrom<UpdatePageRequest> for contract::PagePatch {
    type Error = ContentError;

    fn try_from(req: UpdatePageRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            title: req.title,
            slug: req.slug,
            parent_id: req.parent_id,
            status: parse_opt("status", req.status.as_deref())?,
            menu: req.menu.map(Into::into),
            meta_title: req.meta_title,
            meta_description: req.meta_description,
        })
    }
}

impl From<contract::PageNode> for PageNodeDto {
    fn from(node: contract::PageNode) -> Self {
        Self {
            page: node.page.into(),
            children: node.children.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<contract::PageSection> for PageSectionDto {
    fn from(section: contract::PageSection) -> Self {
        Self {
            id: section.id,
            page_id: section.page_id,
            template_section_id: section.template_section_id,
            position: section.position,
            styles: section.styles.into(),
            settings: section.settings,
            created_at: section.created_at,
            updated_at: section.updated_at,
            deleted_at: section.deleted_at,
        }
    }
}

impl From<AttachPageSectionRequest> for contract::PageSectionOverrides {
    fn from(req: AttachPageSectionRequest) -> Self {
        Self {
            position: req.position,
            styles: req.styles.into(),
            settings: req.settings,
        }
    }
}

// ===== Widgets =====

impl From<contract::Widget> for WidgetDto {
    fn from(widget: contract::Widget) -> Self {
        Self {
            id: widget.id,
            theme_id: widget.theme_id,
            name: widget.name,
            slug: widget.slug,
            icon: widget.icon,
            description: widget.description,
            is_active: widget.is_active,
            settings: widget.settings,
            created_at: widget.created_at,
            updated_at: widget.updated_at,
        }
    }
}

impl From<CreateWidgetRequest> for contract::NewWidget {
    fn from(req: CreateWidgetRequest) -> Self {
        Self {
            theme_id: req.theme_id,
            name: req.name,
            slug: req.slug,
            icon: req.icon,
            description: req.description,
            settings: req.settings,
        }
    }
}

impl From<contract::WidgetContentTypeAssociation> for WidgetContentTypeDto {
    fn from(association: contract::WidgetContentTypeAssociation) -> Self {
        Self {
            id: association.id,
            widget_id: association.widget_id,
            content_type_id: association.content_type_id,
        }
    }
}

impl From<contract::PageSectionWidget> for PlacementDto {
    fn from(placement: contract::PageSectionWidget) -> Self {
        Self {
            id: placement.id,
            page_section_id: placement.page_section_id,
            widget_id: placement.widget_id,
            position: placement.position,
            grid: placement.grid.into(),
            grid_id: placement.grid_id,
            settings: placement.settings,
            content_query: placement.content_query,
            styles: placement.styles.into(),
            created_at: placement.created_at,
            updated_at: placement.updated_at,
        }
    }
}

impl From<PlaceWidgetRequest> for contract::NewWidgetPlacement {
    fn from(req: PlaceWidgetRequest) -> Self {
        Self {
            widget_id: req.widget_id,
            position: req.position,
            grid: req.grid.into(),
            settings: req.settings,
            content_query: req.content_query,
            styles: req.styles.into(),
        }
    }
}

impl From<UpdatePlacementRequest> for contract::WidgetPlacementPatch {
    fn from(req: UpdatePlacementRequest) -> Self {
        Self {
            grid: req.grid.map(Into::into),
            settings: req.settings,
            content_query: req.content_query,
            styles: req.styles.map(Into::into),
        }
    }
}

// ===== Queries =====

impl From<contract::ContentQueryFilter> for QueryFilterDto {
    fn from(stored: contract::ContentQueryFilter) -> Self {
        Self {
            id: Some(stored.id),
            field_id: stored.filter.field_id,
            field_key: stored.filter.field_key,
            operator: stored.filter.operator.to_string(),
            value: stored.filter.value,
            condition_group: stored.filter.condition_group,
        }
    }
}

impl TryFrom<QueryFilterDto> for contract::QueryFilter {
    type Error = ContentError;

    fn try_from(dto: QueryFilterDto) -> Result<Self, Self::Error> {
        Ok(Self {
            field_id: dto.field_id,
            field_key: dto.field_key,
            operator: parse("operator", &dto.operator)?,
            value: dto.value,
            condition_group: dto.condition_group,
        })
    }
}

impl TryFrom<QueryDefinitionDto> for contract::QueryDefinition {
    type Error = ContentError;

    fn try_from(dto: QueryDefinitionDto) -> Result<Self, Self::Error> {
        Ok(Self {
            content_type_id: dto.content_type_id,
            limit: dto.limit,
            offset: dto.offset,
            order_by: dto.order_by,
            order_direction: parse_opt("order_direction", dto.order_direction.as_deref())?.unwrap_or_default(),
            filters: dto
                .filters
                .into_iter()
                .map(TryInto::try_into)
                .collect::<Result<_, _>>()?,
        })
    }
}

impl From<contract::ContentQuery> for ContentQueryDto {
    fn from(query: contract::ContentQuery) -> Self {
        Self {
            id: query.id,
            name: query.name,
            content_type_id: query.content_type_id,
            limit: query.limit,
            offset: query.offset,
            order_by: query.order_by,
            order_direction: query.order_direction.to_string(),
            filters: query.filters.into_iter().map(Into::into).collect(),
            created_at: query.created_at,
            updated_at: query.updated_at,
        }
    }
}

// ===== Rendering =====

impl From<contract::RenderedWidget> for RenderedWidgetDto {
    fn from(rendered: contract::RenderedWidget) -> Self {
        Self {
            placement: rendered.placement.into(),
            widget: rendered.widget.into(),
            values: values_to_json(rendered.values),
            items: rendered
                .items
                .map(|items| items.into_iter().map(Into::into).collect()),
        }
    }
}

impl From<contract::RenderedPageSection> for RenderedPageSectionDto {
    fn from(rendered: contract::RenderedPageSection) -> Self {
        Self {
            page_section: rendered.page_section.into(),
            widgets: rendered.widgets.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<contract::RenderedSection> for RenderedSectionDto {
    fn from(rendered: contract::RenderedSection) -> Self {
        Self {
            template_section: rendered.template_section.into(),
            instances: rendered.instances.into_iter().map(Into::into).collect(),
            children: rendered.children.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<contract::PageLayout> for PageLayoutDto {
    fn from(layout: contract::PageLayout) -> Self {
        Self {
            page: layout.page.into(),
            template: layout.template.into(),
            sections: layout.sections.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_unknown_field_type_is_field_keyed() {
        let req: CreateFieldRequest =
            serde_json::from_value(serde_json::json!({"name": "Body", "slug": "body", "field_type": "wysiwyg"}))
                .unwrap();
        let err = contract::NewFieldDefinition::try_from(req).unwrap_err();
        assert!(err.field_errors().is_some_and(|e| e.contains("field_type")));
    }

    #[test]
    fn test_patch_distinguishes_null_from_absent() {
        let cleared: UpdatePageRequest = serde_json::from_value(serde_json::json!({"parent_id": null})).unwrap();
        assert_eq!(cleared.parent_id, Some(None));

        let untouched: UpdatePageRequest = serde_json::from_value(serde_json::json!({"title": "About"})).unwrap();
        assert_eq!(untouched.parent_id, None);
    }

    #[test]
    fn test_query_definition_defaults_to_descending() {
        let dto: QueryDefinitionDto = serde_json::from_value(serde_json::json!({
            "content_type_id": Uuid::nil(),
            "filters": [{"field_key": "status", "operator": "equals", "value": "published"}]
        }))
        .unwrap();
        let definition = contract::QueryDefinition::try_from(dto).unwrap();
        assert_eq!(definition.order_direction, contract::SortDirection::Desc);
        assert_eq!(definition.filters[0].operator, contract::FilterOperator::Equals);
    }

    #[test]
    fn test_reorder_scope_names() {
        let id = Uuid::new_v4();
        assert_eq!(
            reorder_scope("page_sections", id).unwrap(),
            contract::ReorderScope::PageSections { page_id: id }
        );
        assert!(reorder_scope("pages", id).is_err());
    }
}
