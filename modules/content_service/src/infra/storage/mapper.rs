//! Entity to model mappers
//!
//! Conversions between SeaORM entities and contract models. String-backed
//! enums are parsed on the way out, so rows with unknown values fail loudly.

use super::entity::content::{content_item, content_type};
use super::entity::fields::{field_definition, field_option, field_value};
use super::entity::layout::{
    page, page_section, page_section_widget, template, template_section, widget, widget_content_type,
};
use super::entity::queries::{content_query, content_query_filter};
use crate::contract::{
    ContentItem, ContentQuery, ContentQueryFilter, ContentType, FieldDefinition, FieldOption, FieldOwner,
    FieldValueRecord, GridRect, MenuSettings, Page, PageSection, PageSectionWidget, QueryFilter, StyleOverrides,
    Template, TemplateSection, Widget, WidgetContentTypeAssociation,
};
use anyhow::{anyhow, Context};
use sea_orm::ActiveValue::Set;

// ===== Content =====

impl From<content_type::Model> for ContentType {
    fn from(entity: content_type::Model) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            slug: entity.slug,
            icon: entity.icon,
            description: entity.description,
            is_active: entity.is_active,
            is_system: entity.is_system,
            created_by: entity.created_by,
            updated_by: entity.updated_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

impl From<&ContentType> for content_type::ActiveModel {
    fn from(model: &ContentType) -> Self {
        Self {
            id: Set(model.id),
            name: Set(model.name.clone()),
            slug: Set(model.slug.clone()),
            icon: Set(model.icon.clone()),
            description: Set(model.description.clone()),
            is_active: Set(model.is_active),
            is_system: Set(model.is_system),
            created_by: Set(model.created_by),
            updated_by: Set(model.updated_by),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
        }
    }
}

impl TryFrom<content_item::Model> for ContentItem {
    type Error = anyhow::Error;

    fn try_from(entity: content_item::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            content_type_id: entity.content_type_id,
            title: entity.title,
            slug: entity.slug,
            status: entity.status.parse()?,
            published_at: entity.published_at,
            created_by: entity.created_by,
            updated_by: entity.updated_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            deleted_at: entity.deleted_at,
        })
    }
}

impl From<&ContentItem> for content_item::ActiveModel {
    fn from(model: &ContentItem) -> Self {
        Self {
            id: Set(model.id),
            content_type_id: Set(model.content_type_id),
            title: Set(model.title.clone()),
            slug: Set(model.slug.clone()),
            status: Set(model.status.as_str().to_string()),
            published_at: Set(model.published_at),
            created_by: Set(model.created_by),
            updated_by: Set(model.updated_by),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
            deleted_at: Set(model.deleted_at),
        }
    }
}

// ===== Fields and values =====

impl TryFrom<field_definition::Model> for FieldDefinition {
    type Error = anyhow::Error;

    fn try_from(entity: field_definition::Model) -> Result<Self, Self::Error> {
        let owner = match entity.owner_type.as_str() {
            "content_type" => FieldOwner::ContentType(entity.owner_id),
            "widget_type" => FieldOwner::WidgetType(entity.owner_id),
            other => return Err(anyhow!("unknown field owner type '{other}'")),
        };
        Ok(Self {
            id: entity.id,
            owner,
            parent_field_id: entity.parent_field_id,
            name: entity.name,
            slug: entity.slug,
            field_type: entity
                .field_type
                .parse()
                .with_context(|| format!("field definition {}", entity.id))?,
            validation_rules: entity.validation_rules,
            settings: entity.settings,
            default_value: entity.default_value,
            is_required: entity.is_required,
            is_unique: entity.is_unique,
            position: entity.position,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

impl From<&FieldDefinition> for field_definition::ActiveModel {
    fn from(model: &FieldDefinition) -> Self {
        Self {
            id: Set(model.id),
            owner_type: Set(model.owner.kind().to_string()),
            owner_id: Set(model.owner.id()),
            parent_field_id: Set(model.parent_field_id),
            name: Set(model.name.clone()),
            slug: Set(model.slug.clone()),
            field_type: Set(model.field_type.as_str().to_string()),
            validation_rules: Set(model.validation_rules.clone()),
            settings: Set(model.settings.clone()),
            default_value: Set(model.default_value.clone()),
            is_required: Set(model.is_required),
            is_unique: Set(model.is_unique),
            position: Set(model.position),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
        }
    }
}

impl From<field_option::Model> for FieldOption {
    fn from(entity: field_option::Model) -> Self {
        Self {
            id: entity.id,
            field_definition_id: entity.field_definition_id,
            label: entity.label,
            value: entity.value,
            position: entity.position,
        }
    }
}

impl From<&FieldOption> for field_option::ActiveModel {
    fn from(model: &FieldOption) -> Self {
        Self {
            id: Set(model.id),
            field_definition_id: Set(model.field_definition_id),
            label: Set(model.label.clone()),
            value: Set(model.value.clone()),
            position: Set(model.position),
        }
    }
}

impl From<field_value::Model> for FieldValueRecord {
    fn from(entity: field_value::Model) -> Self {
        Self {
            id: entity.id,
            owner_instance_id: entity.owner_instance_id,
            field_definition_id: entity.field_definition_id,
            value: entity.value,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

impl From<&FieldValueRecord> for field_value::ActiveModel {
    fn from(model: &FieldValueRecord) -> Self {
        Self {
            id: Set(model.id),
            owner_instance_id: Set(model.owner_instance_id),
            field_definition_id: Set(model.field_definition_id),
            value: Set(model.value.clone()),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
        }
    }
}

// ===== Layout =====

impl From<template::Model> for Template {
    fn from(entity: template::Model) -> Self {
        Self {
            id: entity.id,
            theme_id: entity.theme_id,
            name: entity.name,
            slug: entity.slug,
            description: entity.description,
            is_default: entity.is_default,
            is_active: entity.is_active,
            settings: entity.settings,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

impl From<&Template> for template::ActiveModel {
    fn from(model: &Template) -> Self {
        Self {
            id: Set(model.id),
            theme_id: Set(model.theme_id),
            name: Set(model.name.clone()),
            slug: Set(model.slug.clone()),
            description: Set(model.description.clone()),
            is_default: Set(model.is_default),
            is_active: Set(model.is_active),
            settings: Set(model.settings.clone()),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
        }
    }
}

impl TryFrom<template_section::Model> for TemplateSection {
    type Error = anyhow::Error;

    fn try_from(entity: template_section::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            template_id: entity.template_id,
            parent_id: entity.parent_id,
            name: entity.name,
            slug: entity.slug,
            position: entity.position,
            grid: GridRect {
                x: entity.grid_x,
                y: entity.grid_y,
                w: entity.grid_w,
                h: entity.grid_h,
            },
            section_type: entity.section_type.parse()?,
            column_layout: entity.column_layout,
            is_repeatable: entity.is_repeatable,
            max_widgets: entity.max_widgets.map(u32::try_from).transpose()?,
            settings: entity.settings,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

impl TryFrom<&TemplateSection> for template_section::ActiveModel {
    type Error = anyhow::Error;

    fn try_from(model: &TemplateSection) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Set(model.id),
            template_id: Set(model.template_id),
            parent_id: Set(model.parent_id),
            name: Set(model.name.clone()),
            slug: Set(model.slug.clone()),
            position: Set(model.position),
            grid_x: Set(model.grid.x),
            grid_y: Set(model.grid.y),
            grid_w: Set(model.grid.w),
            grid_h: Set(model.grid.h),
            section_type: Set(model.section_type.as_str().to_string()),
            column_layout: Set(model.column_layout.clone()),
            is_repeatable: Set(model.is_repeatable),
            max_widgets: Set(model.max_widgets.map(i32::try_from).transpose()?),
            settings: Set(model.settings.clone()),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
        })
    }
}

impl TryFrom<page::Model> for Page {
    type Error = anyhow::Error;

    fn try_from(entity: page::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            title: entity.title,
            slug: entity.slug,
            template_id: entity.template_id,
            parent_id: entity.parent_id,
            status: entity.status.parse()?,
            menu: MenuSettings {
                show_in_menu: entity.show_in_menu,
                menu_title: entity.menu_title,
                menu_order: entity.menu_order,
            },
            meta_title: entity.meta_title,
            meta_description: entity.meta_description,
            published_at: entity.published_at,
            created_by: entity.created_by,
            updated_by: entity.updated_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            deleted_at: entity.deleted_at,
        })
    }
}

impl From<&Page> for page::ActiveModel {
    fn from(model: &Page) -> Self {
        Self {
            id: Set(model.id),
            title: Set(model.title.clone()),
            slug: Set(model.slug.clone()),
            template_id: Set(model.template_id),
            parent_id: Set(model.parent_id),
            status: Set(model.status.as_str().to_string()),
            show_in_menu: Set(model.menu.show_in_menu),
            menu_title: Set(model.menu.menu_title.clone()),
            menu_order: Set(model.menu.menu_order),
            meta_title: Set(model.meta_title.clone()),
            meta_description: Set(model.meta_description.clone()),
            published_at: Set(model.published_at),
            created_by: Set(model.created_by),
            updated_by: Set(model.updated_by),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
            deleted_at: Set(model.deleted_at),
        }
    }
}

impl From<page_section::Model> for PageSection {
    fn from(entity: page_section::Model) -> Self {
        Self {
            id: entity.id,
            page_id: entity.page_id,
            template_section_id: entity.template_section_id,
            position: entity.position,
            styles: StyleOverrides {
                css_class: entity.css_class,
                background_color: entity.background_color,
                padding: entity.padding,
                margin: entity.margin,
            },
            settings: entity.settings,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            deleted_at: entity.deleted_at,
        }
    }
}

impl From<&PageSection> for page_section::ActiveModel {
    fn from(model: &PageSection) -> Self {
        Self {
            id: Set(model.id),
            page_id: Set(model.page_id),
            template_section_id: Set(model.template_section_id),
            position: Set(model.position),
            css_class: Set(model.styles.css_class.clone()),
            background_color: Set(model.styles.background_color.clone()),
            padding: Set(model.styles.padding.clone()),
            margin: Set(model.styles.margin.clone()),
            settings: Set(model.settings.clone()),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
            deleted_at: Set(model.deleted_at),
        }
    }
}

impl From<widget::Model> for Widget {
    fn from(entity: widget::Model) -> Self {
        Self {
            id: entity.id,
            theme_id: entity.theme_id,
            name: entity.name,
            slug: entity.slug,
            icon: entity.icon,
            description: entity.description,
            is_active: entity.is_active,
            settings: entity.settings,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

impl From<&Widget> for widget::ActiveModel {
    fn from(model: &Widget) -> Self {
        Self {
            id: Set(model.id),
            theme_id: Set(model.theme_id),
            name: Set(model.name.clone()),
            slug: Set(model.slug.clone()),
            icon: Set(model.icon.clone()),
            description: Set(model.description.clone()),
            is_active: Set(model.is_active),
            settings: Set(model.settings.clone()),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
        }
    }
}

impl From<widget_content_type::Model> for WidgetContentTypeAssociation {
    fn from(entity: widget_content_type::Model) -> Self {
        Self {
            id: entity.id,
            widget_id: entity.widget_id,
            content_type_id: entity.content_type_id,
        }
    }
}

impl From<&WidgetContentTypeAssociation> for widget_content_type::ActiveModel {
    fn from(model: &WidgetContentTypeAssociation) -> Self {
        Self {
            id: Set(model.id),
            widget_id: Set(model.widget_id),
            content_type_id: Set(model.content_type_id),
        }
    }
}

impl From<page_section_widget::Model> for PageSectionWidget {
    fn from(entity: page_section_widget::Model) -> Self {
        Self {
            id: entity.id,
            page_section_id: entity.page_section_id,
            widget_id: entity.widget_id,
            position: entity.position,
            grid: GridRect {
                x: entity.grid_x,
                y: entity.grid_y,
                w: entity.grid_w,
                h: entity.grid_h,
            },
            grid_id: entity.grid_id,
            settings: entity.settings,
            content_query: entity.content_query,
            styles: StyleOverrides {
                css_class: entity.css_class,
                background_color: entity.background_color,
                padding: entity.padding,
                margin: entity.margin,
            },
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

impl From<&PageSectionWidget> for page_section_widget::ActiveModel {
    fn from(model: &PageSectionWidget) -> Self {
        Self {
            id: Set(model.id),
            page_section_id: Set(model.page_section_id),
            widget_id: Set(model.widget_id),
            position: Set(model.position),
            grid_x: Set(model.grid.x),
            grid_y: Set(model.grid.y),
            grid_w: Set(model.grid.w),
            grid_h: Set(model.grid.h),
            grid_id: Set(model.grid_id.clone()),
            settings: Set(model.settings.clone()),
            content_query: Set(model.content_query.clone()),
            css_class: Set(model.styles.css_class.clone()),
            background_color: Set(model.styles.background_color.clone()),
            padding: Set(model.styles.padding.clone()),
            margin: Set(model.styles.margin.clone()),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
        }
    }
}

// ===== Queries =====

impl TryFrom<content_query_filter::Model> for ContentQueryFilter {
    type Error = anyhow::Error;

    fn try_from(entity: content_query_filter::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            position: entity.position,
            filter: QueryFilter {
                field_id: entity.field_id,
                field_key: entity.field_key,
                operator: entity.operator.parse()?,
                value: entity.value,
                condition_group: entity.condition_group,
            },
        })
    }
}

pub fn filter_active_model(query_id: uuid::Uuid, filter: &ContentQueryFilter) -> content_query_filter::ActiveModel {
    content_query_filter::ActiveModel {
        id: Set(filter.id),
        content_query_id: Set(query_id),
        field_id: Set(filter.filter.field_id),
        field_key: Set(filter.filter.field_key.clone()),
        operator: Set(filter.filter.operator.as_str().to_string()),
        value: Set(filter.filter.value.clone()),
        condition_group: Set(filter.filter.condition_group.clone()),
        position: Set(filter.position),
    }
}

/// Assemble a saved query from its row and its filter rows
pub fn content_query_from_parts(
    entity: content_query::Model,
    filters: Vec<content_query_filter::Model>,
) -> anyhow::Result<ContentQuery> {
    let mut filters = filters
        .into_iter()
        .map(ContentQueryFilter::try_from)
        .collect::<anyhow::Result<Vec<_>>>()?;
    filters.sort_by_key(|f| f.position);

    Ok(ContentQuery {
        id: entity.id,
        name: entity.name,
        content_type_id: entity.content_type_id,
        limit: entity.limit.map(u64::try_from).transpose()?,
        offset: u64::try_from(entity.offset)?,
        order_by: entity.order_by,
        order_direction: entity.order_direction.parse()?,
        filters,
        created_at: entity.created_at,
        updated_at: entity.updated_at,
    })
}

impl TryFrom<&ContentQuery> for content_query::ActiveModel {
    type Error = anyhow::Error;

    fn try_from(model: &ContentQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Set(model.id),
            name: Set(model.name.clone()),
            content_type_id: Set(model.content_type_id),
            limit: Set(model.limit.map(i64::try_from).transpose()?),
            offset: Set(i64::try_from(model.offset)?),
            order_by: Set(model.order_by.clone()),
            order_direction: Set(model.order_direction.as_str().to_string()),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
        })
    }
}
