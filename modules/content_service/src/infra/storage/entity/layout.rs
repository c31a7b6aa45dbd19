//! Templates, pages, widgets and placements

/// Template table entity
pub mod template {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "templates")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub theme_id: Uuid,
        pub name: String,
        /// Unique per theme
        pub slug: String,
        pub description: Option<String>,
        pub is_default: bool,
        pub is_active: bool,
        pub settings: Json,
        pub created_at: DateTimeUtc,
        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Template section table entity
pub mod template_section {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "template_sections")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub template_id: Uuid,
        pub parent_id: Option<Uuid>,
        pub name: String,
        /// Unique per template
        pub slug: String,
        pub position: i32,
        pub grid_x: i32,
        pub grid_y: i32,
        pub grid_w: i32,
        pub grid_h: i32,
        pub section_type: String,
        pub column_layout: Option<String>,
        pub is_repeatable: bool,
        pub max_widgets: Option<i32>,
        pub settings: Json,
        pub created_at: DateTimeUtc,
        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Page table entity
pub mod page {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "pages")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub title: String,
        /// Globally unique
        pub slug: String,
        pub template_id: Uuid,
        pub parent_id: Option<Uuid>,
        pub status: String,
        pub show_in_menu: bool,
        pub menu_title: Option<String>,
        pub menu_order: i32,
        pub meta_title: Option<String>,
        pub meta_description: Option<String>,
        pub published_at: Option<DateTimeUtc>,
        pub created_by: Option<Uuid>,
        pub updated_by: Option<Uuid>,
        pub created_at: DateTimeUtc,
        pub updated_at: DateTimeUtc,
        pub deleted_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Page section table entity
pub mod page_section {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "page_sections")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub page_id: Uuid,
        pub template_section_id: Uuid,
        pub position: i32,
        pub css_class: Option<String>,
        pub background_color: Option<String>,
        pub padding: Option<String>,
        pub margin: Option<String>,
        pub settings: Json,
        pub created_at: DateTimeUtc,
        pub updated_at: DateTimeUtc,
        pub deleted_at: Option<DateTimeUtc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Widget table entity
pub mod widget {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "widgets")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub theme_id: Uuid,
        pub name: String,
        /// Unique per theme
        pub slug: String,
        pub icon: Option<String>,
        pub description: Option<String>,
        pub is_active: bool,
        pub settings: Json,
        pub created_at: DateTimeUtc,
        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Widget / content type association table entity
pub mod widget_content_type {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "widget_content_types")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub widget_id: Uuid,
        pub content_type_id: Uuid,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Widget placement table entity
pub mod page_section_widget {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "page_section_widgets")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub page_section_id: Uuid,
        pub widget_id: Uuid,
        pub position: i32,
        pub grid_x: i32,
        pub grid_y: i32,
        pub grid_w: i32,
        pub grid_h: i32,
        /// Globally unique designer key
        pub grid_id: String,
        pub settings: Json,
        pub content_query: Option<Json>,
        pub css_class: Option<String>,
        pub background_color: Option<String>,
        pub padding: Option<String>,
        pub margin: Option<String>,
        pub created_at: DateTimeUtc,
        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
