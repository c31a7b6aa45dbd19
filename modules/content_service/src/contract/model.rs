//! Contract models for content service
//!
//! These models are transport-agnostic and used for inter-module communication.
//! NO serde derives - these are pure domain models. Opaque settings blobs are
//! carried as `serde_json::Value` and only interpreted by their consumers.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ===== Shared value objects =====

/// Authenticated actor performing a write (used for audit columns)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Actor {
    /// User identifier, `None` for system/background writes
    pub user_id: Option<Uuid>,
}

impl Actor {
    /// Actor without a user identity
    pub fn system() -> Self {
        Self::default()
    }

    /// Actor for an authenticated user
    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }
}

/// Grid placement metadata used by the front-end designer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// Per-placement style overrides
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyleOverrides {
    pub css_class: Option<String>,
    pub background_color: Option<String>,
    pub padding: Option<String>,
    pub margin: Option<String>,
}

/// Confirmation token for destructive, irreversible operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Caller has not confirmed; the operation only reports its impact
    Unconfirmed,
    /// Caller explicitly confirmed the destructive operation
    Confirmed,
}

/// Error returned when a string does not name a known enum variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// Implements `as_str`, `Display` and `FromStr` for a string-backed enum
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// All variants in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical storage/wire representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

// ===== Field schema =====

/// Owner scope of a field definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldOwner {
    ContentType(Uuid),
    WidgetType(Uuid),
}

impl FieldOwner {
    pub fn id(&self) -> Uuid {
        match self {
            Self::ContentType(id) | Self::WidgetType(id) => *id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ContentType(_) => "content_type",
            Self::WidgetType(_) => "widget_type",
        }
    }
}

/// Supported dynamic field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Text,
    Textarea,
    RichText,
    Number,
    Email,
    Url,
    Date,
    Boolean,
    Select,
    Radio,
    Checkbox,
    Multiselect,
    Image,
    File,
    Gallery,
    Json,
    Repeater,
}

string_enum!(FieldType, "field type", {
    Text => "text",
    Textarea => "textarea",
    RichText => "rich_text",
    Number => "number",
    Email => "email",
    Url => "url",
    Date => "date",
    Boolean => "boolean",
    Select => "select",
    Radio => "radio",
    Checkbox => "checkbox",
    Multiselect => "multiselect",
    Image => "image",
    File => "file",
    Gallery => "gallery",
    Json => "json",
    Repeater => "repeater",
});

impl FieldType {
    /// Field types whose values must come from the option list
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            Self::Select | Self::Radio | Self::Checkbox | Self::Multiselect
        )
    }

    /// Field types stored as a JSON array
    pub fn is_multi_valued(&self) -> bool {
        matches!(self, Self::Checkbox | Self::Multiselect | Self::Gallery)
    }

    /// Field types holding media identifiers
    pub fn is_media(&self) -> bool {
        matches!(self, Self::Image | Self::File | Self::Gallery)
    }
}

/// Schema of one dynamic field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub id: Uuid,
    pub owner: FieldOwner,
    /// Set for repeater subfields
    pub parent_field_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub field_type: FieldType,
    /// Pipe-delimited rule string, e.g. `min:3|max:120`
    pub validation_rules: Option<String>,
    pub settings: serde_json::Value,
    pub default_value: Option<String>,
    pub is_required: bool,
    pub is_unique: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Enumerated value of a choice field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOption {
    pub id: Uuid,
    pub field_definition_id: Uuid,
    pub label: String,
    pub value: String,
    pub position: i32,
}

/// Input for a new option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFieldOption {
    pub label: String,
    pub value: String,
}

/// Input for defining a field
#[derive(Debug, Clone, PartialEq)]
pub struct NewFieldDefinition {
    pub name: String,
    pub slug: String,
    pub field_type: FieldType,
    pub parent_field_id: Option<Uuid>,
    pub validation_rules: Option<String>,
    pub settings: serde_json::Value,
    pub default_value: Option<String>,
    pub is_required: bool,
    pub is_unique: bool,
    pub position: Option<i32>,
    pub options: Vec<NewFieldOption>,
}

impl NewFieldDefinition {
    /// Minimal input: everything optional left at its default
    pub fn new(name: impl Into<String>, slug: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            field_type,
            parent_field_id: None,
            validation_rules: None,
            settings: serde_json::Value::Null,
            default_value: None,
            is_required: false,
            is_unique: false,
            position: None,
            options: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn with_rules(mut self, rules: impl Into<String>) -> Self {
        self.validation_rules = Some(rules.into());
        self
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    pub fn with_settings(mut self, settings: serde_json::Value) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_parent(mut self, parent_field_id: Uuid) -> Self {
        self.parent_field_id = Some(parent_field_id);
        self
    }

    /// Options given as `(label, value)` pairs
    pub fn with_options<I, L, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = (L, V)>,
        L: Into<String>,
        V: Into<String>,
    {
        self.options = options
            .into_iter()
            .map(|(label, value)| NewFieldOption {
                label: label.into(),
                value: value.into(),
            })
            .collect();
        self
    }
}

/// Partial update of a field definition
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldDefinitionPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub field_type: Option<FieldType>,
    pub validation_rules: Option<Option<String>>,
    pub settings: Option<serde_json::Value>,
    pub default_value: Option<Option<String>>,
    pub is_required: Option<bool>,
    pub is_unique: Option<bool>,
}

/// What a field deletion would destroy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldDeletionImpact {
    pub options: u64,
    pub values: u64,
    pub repeater_groups: u64,
    pub subfields: u64,
}

// ===== EAV values =====

/// Raw stored value row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValueRecord {
    pub id: Uuid,
    pub owner_instance_id: Uuid,
    pub field_definition_id: Uuid,
    pub value: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ordered group of a repeater field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeaterGroup {
    pub id: Uuid,
    pub owner_instance_id: Uuid,
    pub field_definition_id: Uuid,
    pub order_index: i32,
    /// Subfield id -> raw value
    pub values: BTreeMap<Uuid, Option<String>>,
}

/// Read-time interpretation of a stored value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Bool(bool),
    List(Vec<String>),
    Json(serde_json::Value),
    Repeater(Vec<BTreeMap<String, FieldValue>>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// JSON view of the value (repeaters become an array of objects)
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Self::Null => Value::Null,
            Self::Text(s) => Value::String(s.clone()),
            Self::Bool(b) => Value::Bool(*b),
            Self::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            Self::Json(v) => v.clone(),
            Self::Repeater(groups) => Value::Array(
                groups
                    .iter()
                    .map(|group| {
                        Value::Object(
                            group
                                .iter()
                                .map(|(slug, value)| (slug.clone(), value.to_json()))
                                .collect(),
                        )
                    })
                    .collect(),
            ),
        }
    }
}

// ===== Content types and items =====

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    pub id: Uuid,
    pub name: String,
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContentType {
    pub name: String,
    pub slug: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub is_system: bool,
}

impl NewContentType {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: None,
            icon: None,
            description: None,
            is_active: true,
            is_system: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentTypePatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub icon: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentStatus {
    Draft,
    Published,
    Archived,
}

string_enum!(ContentStatus, "content status", {
    Draft => "draft",
    Published => "published",
    Archived => "archived",
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub id: Uuid,
    pub content_type_id: Uuid,
    pub title: String,
    pub slug: String,
    pub status: ContentStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a content item; field values keyed by field slug
#[derive(Debug, Clone, PartialEq)]
pub struct NewContentItem {
    pub title: String,
    pub slug: Option<String>,
    pub status: ContentStatus,
    pub field_values: BTreeMap<String, serde_json::Value>,
}

impl NewContentItem {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slug: None,
            status: ContentStatus::Draft,
            field_values: BTreeMap::new(),
        }
    }

    pub fn with_status(mut self, status: ContentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_value(mut self, slug: impl Into<String>, value: serde_json::Value) -> Self {
        self.field_values.insert(slug.into(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentItemPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub status: Option<ContentStatus>,
    pub field_values: BTreeMap<String, serde_json::Value>,
}

// ===== Layout composition =====

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
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

#[derive(Debug, Clone, PartialEq)]
pub struct NewTemplate {
    pub theme_id: Uuid,
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub is_default: bool,
    pub is_active: bool,
    pub settings: serde_json::Value,
}

impl NewTemplate {
    pub fn new(theme_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            theme_id,
            name: name.into(),
            slug: None,
            description: None,
            is_default: false,
            is_active: true,
            settings: serde_json::Value::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
    pub is_default: Option<bool>,
    pub is_active: Option<bool>,
    pub settings: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionType {
    Standard,
    MultiColumn,
    Header,
    Footer,
    Sidebar,
}

string_enum!(SectionType, "section type", {
    Standard => "standard",
    MultiColumn => "multi_column",
    Header => "header",
    Footer => "footer",
    Sidebar => "sidebar",
});

impl SectionType {
    pub fn requires_column_layout(&self) -> bool {
        matches!(self, Self::MultiColumn)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSection {
    pub id: Uuid,
    pub template_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub position: i32,
    pub grid: GridRect,
    pub section_type: SectionType,
    pub column_layout: Option<String>,
    pub is_repeatable: bool,
    pub max_widgets: Option<u32>,
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTemplateSection {
    pub name: String,
    pub slug: Option<String>,
    pub parent_id: Option<Uuid>,
    pub position: Option<i32>,
    pub grid: GridRect,
    pub section_type: SectionType,
    pub column_layout: Option<String>,
    pub is_repeatable: bool,
    pub max_widgets: Option<u32>,
    pub settings: serde_json::Value,
}

impl NewTemplateSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: None,
            parent_id: None,
            position: None,
            grid: GridRect::default(),
            section_type: SectionType::Standard,
            column_layout: None,
            is_repeatable: false,
            max_widgets: None,
            settings: serde_json::Value::Null,
        }
    }

    pub fn with_max_widgets(mut self, max_widgets: u32) -> Self {
        self.max_widgets = Some(max_widgets);
        self
    }

    pub fn repeatable(mut self) -> Self {
        self.is_repeatable = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemplateSectionPatch {
    pub name: Option<String>,
    pub grid: Option<GridRect>,
    pub section_type: Option<SectionType>,
    pub column_layout: Option<Option<String>>,
    pub is_repeatable: Option<bool>,
    pub max_widgets: Option<Option<u32>>,
    pub settings: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Draft,
    Published,
}

string_enum!(PageStatus, "page status", {
    Draft => "draft",
    Published => "published",
});

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MenuSettings {
    pub show_in_menu: bool,
    pub menu_title: Option<String>,
    pub menu_order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub template_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub status: PageStatus,
    pub menu: MenuSettings,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPage {
    pub title: String,
    pub slug: Option<String>,
    pub template_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub status: PageStatus,
    pub menu: MenuSettings,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

impl NewPage {
    pub fn new(title: impl Into<String>, template_id: Uuid) -> Self {
        Self {
            title: title.into(),
            slug: None,
            template_id,
            parent_id: None,
            status: PageStatus::Draft,
            menu: MenuSettings::default(),
            meta_title: None,
            meta_description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PagePatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub parent_id: Option<Option<Uuid>>,
    pub status: Option<PageStatus>,
    pub menu: Option<MenuSettings>,
    pub meta_title: Option<Option<String>>,
    pub meta_description: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageSection {
    pub id: Uuid,
    pub page_id: Uuid,
    pub template_section_id: Uuid,
    pub position: i32,
    pub styles: StyleOverrides,
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Overrides supplied when attaching a section to a page
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageSectionOverrides {
    pub position: Option<i32>,
    pub styles: StyleOverrides,
    pub settings: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
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

#[derive(Debug, Clone, PartialEq)]
pub struct NewWidget {
    pub theme_id: Uuid,
    pub name: String,
    pub slug: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub settings: serde_json::Value,
}

impl NewWidget {
    pub fn new(theme_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            theme_id,
            name: name.into(),
            slug: None,
            icon: None,
            description: None,
            settings: serde_json::Value::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetContentTypeAssociation {
    pub id: Uuid,
    pub widget_id: Uuid,
    pub content_type_id: Uuid,
}

/// A widget placed into a page section
#[derive(Debug, Clone, PartialEq)]
pub struct PageSectionWidget {
    pub id: Uuid,
    pub page_section_id: Uuid,
    pub widget_id: Uuid,
    pub position: i32,
    pub grid: GridRect,
    /// Opaque identity key for the front-end designer
    pub grid_id: String,
    pub settings: serde_json::Value,
    pub content_query: Option<serde_json::Value>,
    pub styles: StyleOverrides,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewWidgetPlacement {
    pub widget_id: Uuid,
    pub position: Option<i32>,
    pub grid: GridRect,
    pub settings: serde_json::Value,
    pub content_query: Option<serde_json::Value>,
    pub styles: StyleOverrides,
}

impl NewWidgetPlacement {
    pub fn new(widget_id: Uuid) -> Self {
        Self {
            widget_id,
            position: None,
            grid: GridRect::default(),
            settings: serde_json::Value::Null,
            content_query: None,
            styles: StyleOverrides::default(),
        }
    }

    pub fn with_content_query(mut self, query: serde_json::Value) -> Self {
        self.content_query = Some(query);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WidgetPlacementPatch {
    pub grid: Option<GridRect>,
    pub settings: Option<serde_json::Value>,
    pub content_query: Option<Option<serde_json::Value>>,
    pub styles: Option<StyleOverrides>,
}

/// Parent scope of a bulk reposition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderScope {
    TemplateSections { template_id: Uuid },
    PageSections { page_id: Uuid },
    PageSectionWidgets { page_section_id: Uuid },
    Fields { owner_id: Uuid },
    FieldOptions { field_definition_id: Uuid },
    QueryFilters { query_id: Uuid },
}

// ===== Content queries =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Contains,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

string_enum!(FilterOperator, "filter operator", {
    Equals => "equals",
    NotEquals => "not_equals",
    Contains => "contains",
    StartsWith => "starts_with",
    EndsWith => "ends_with",
    GreaterThan => "greater_than",
    LessThan => "less_than",
    In => "in",
    NotIn => "not_in",
    IsNull => "is_null",
    IsNotNull => "is_not_null",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

string_enum!(SortDirection, "sort direction", {
    Asc => "asc",
    Desc => "desc",
});

/// One filter predicate; exactly one of `field_id` / `field_key` must be set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    pub field_id: Option<Uuid>,
    pub field_key: Option<String>,
    pub operator: FilterOperator,
    pub value: Option<String>,
    pub condition_group: Option<String>,
}

impl QueryFilter {
    pub fn on_field(field_id: Uuid, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            field_id: Some(field_id),
            field_key: None,
            operator,
            value: Some(value.into()),
            condition_group: None,
        }
    }

    pub fn on_property(key: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            field_id: None,
            field_key: Some(key.into()),
            operator,
            value: Some(value.into()),
            condition_group: None,
        }
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.condition_group = Some(group.into());
        self
    }
}

/// Unsaved query definition (also the inline placement query shape)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDefinition {
    pub content_type_id: Uuid,
    pub limit: Option<u64>,
    pub offset: u64,
    pub order_by: Option<String>,
    pub order_direction: SortDirection,
    pub filters: Vec<QueryFilter>,
}

impl QueryDefinition {
    pub fn for_type(content_type_id: Uuid) -> Self {
        Self {
            content_type_id,
            limit: None,
            offset: 0,
            order_by: None,
            order_direction: SortDirection::default(),
            filters: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: QueryFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, key: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some(key.into());
        self.order_direction = direction;
        self
    }

    pub fn paginate(mut self, limit: u64, offset: u64) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }
}

/// Stored filter row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentQueryFilter {
    pub id: Uuid,
    pub position: i32,
    pub filter: QueryFilter,
}

/// Saved, named query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentQuery {
    pub id: Uuid,
    pub name: String,
    pub content_type_id: Uuid,
    pub limit: Option<u64>,
    pub offset: u64,
    pub order_by: Option<String>,
    pub order_direction: SortDirection,
    pub filters: Vec<ContentQueryFilter>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentQuery {
    pub fn definition(&self) -> QueryDefinition {
        QueryDefinition {
            content_type_id: self.content_type_id,
            limit: self.limit,
            offset: self.offset,
            order_by: self.order_by.clone(),
            order_direction: self.order_direction,
            filters: self.filters.iter().map(|f| f.filter.clone()).collect(),
        }
    }
}

/// Evaluation mode of the query evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationMode {
    /// Admin authoring: malformed input fails loudly
    Strict,
    /// Page rendering: malformed filters are skipped with a warning
    BestEffort,
}

// ===== Rendering =====

/// Fully resolved page layout tree
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub page: Page,
    pub template: Template,
    pub sections: Vec<RenderedSection>,
}

/// A template section with the page's instances of it and nested sections
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSection {
    pub template_section: TemplateSection,
    pub instances: Vec<RenderedPageSection>,
    pub children: Vec<RenderedSection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPageSection {
    pub page_section: PageSection,
    pub widgets: Vec<RenderedWidget>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedWidget {
    pub placement: PageSectionWidget,
    pub widget: Widget,
    pub values: BTreeMap<String, FieldValue>,
    /// Items selected by the placement's content query, if it has one
    pub items: Option<Vec<ContentItem>>,
}

/// Node of the page hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNode {
    pub page: Page,
    pub children: Vec<PageNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_round_trips_through_str() {
        for field_type in FieldType::ALL {
            assert_eq!(field_type.as_str().parse::<FieldType>(), Ok(*field_type));
        }
        assert!("wysiwyg".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_field_type_capabilities() {
        assert!(FieldType::Select.is_choice());
        assert!(!FieldType::Text.is_choice());
        assert!(FieldType::Multiselect.is_multi_valued());
        assert!(FieldType::Gallery.is_media());
        assert!(!FieldType::Repeater.is_multi_valued());
    }

    #[test]
    fn test_repeater_value_to_json() {
        let mut group = BTreeMap::new();
        group.insert("label".to_string(), FieldValue::Text("Docs".into()));
        group.insert("external".to_string(), FieldValue::Bool(true));
        let value = FieldValue::Repeater(vec![group]);
        assert_eq!(
            value.to_json(),
            serde_json::json!([{"label": "Docs", "external": true}])
        );
    }

    #[test]
    fn test_section_type_column_layout_requirement() {
        assert!(SectionType::MultiColumn.requires_column_layout());
        assert!(!SectionType::Header.requires_column_layout());
    }
}
