//! Database migrations for content service

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_content::Migration),
            Box::new(m20250301_000002_create_fields::Migration),
            Box::new(m20250301_000003_create_layout::Migration),
            Box::new(m20250301_000004_create_queries::Migration),
        ]
    }
}

fn created_at<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

fn unique_index<T: IntoIden + Clone + 'static>(name: &str, table: T, cols: Vec<T>) -> IndexCreateStatement {
    let mut index = Index::create();
    index.name(name).table(table).unique();
    for col in cols {
        index.col(col);
    }
    index.to_owned()
}

mod m20250301_000001_create_content {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000001_create_content"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ContentTypes::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(ContentTypes::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(ContentTypes::Name).string().not_null())
                        .col(ColumnDef::new(ContentTypes::Slug).string().not_null())
                        .col(ColumnDef::new(ContentTypes::Icon).string())
                        .col(ColumnDef::new(ContentTypes::Description).text())
                        .col(ColumnDef::new(ContentTypes::IsActive).boolean().not_null().default(true))
                        .col(ColumnDef::new(ContentTypes::IsSystem).boolean().not_null().default(false))
                        .col(ColumnDef::new(ContentTypes::CreatedBy).uuid())
                        .col(ColumnDef::new(ContentTypes::UpdatedBy).uuid())
                        .col(created_at(ContentTypes::CreatedAt))
                        .col(created_at(ContentTypes::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(unique_index(
                    "uq_content_types_slug",
                    ContentTypes::Table,
                    vec![ContentTypes::Slug],
                ))
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ContentItems::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(ContentItems::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(ContentItems::ContentTypeId).uuid().not_null())
                        .col(ColumnDef::new(ContentItems::Title).string().not_null())
                        .col(ColumnDef::new(ContentItems::Slug).string().not_null())
                        .col(ColumnDef::new(ContentItems::Status).string().not_null().default("draft"))
                        .col(ColumnDef::new(ContentItems::PublishedAt).timestamp_with_time_zone())
                        .col(ColumnDef::new(ContentItems::CreatedBy).uuid())
                        .col(ColumnDef::new(ContentItems::UpdatedBy).uuid())
                        .col(created_at(ContentItems::CreatedAt))
                        .col(created_at(ContentItems::UpdatedAt))
                        .col(ColumnDef::new(ContentItems::DeletedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_content_items_content_type")
                                .from(ContentItems::Table, ContentItems::ContentTypeId)
                                .to(ContentTypes::Table, ContentTypes::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(unique_index(
                    "uq_content_items_type_slug",
                    ContentItems::Table,
                    vec![ContentItems::ContentTypeId, ContentItems::Slug],
                ))
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_content_items_deleted_at")
                        .table(ContentItems::Table)
                        .col(ContentItems::DeletedAt)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ContentItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ContentTypes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden, Clone)]
    enum ContentTypes {
        Table,
        Id,
        Name,
        Slug,
        Icon,
        Description,
        IsActive,
        IsSystem,
        CreatedBy,
        UpdatedBy,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden, Clone)]
    enum ContentItems {
        Table,
        Id,
        ContentTypeId,
        Title,
        Slug,
        Status,
        PublishedAt,
        CreatedBy,
        UpdatedBy,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}

mod m20250301_000002_create_fields {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000002_create_fields"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(FieldDefinitions::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(FieldDefinitions::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(FieldDefinitions::OwnerType).string().not_null())
                        .col(ColumnDef::new(FieldDefinitions::OwnerId).uuid().not_null())
                        .col(ColumnDef::new(FieldDefinitions::ParentFieldId).uuid())
                        .col(ColumnDef::new(FieldDefinitions::Name).string().not_null())
                        .col(ColumnDef::new(FieldDefinitions::Slug).string().not_null())
                        .col(ColumnDef::new(FieldDefinitions::FieldType).string().not_null())
                        .col(ColumnDef::new(FieldDefinitions::ValidationRules).text())
                        .col(ColumnDef::new(FieldDefinitions::Settings).json().not_null())
                        .col(ColumnDef::new(FieldDefinitions::DefaultValue).text())
                        .col(ColumnDef::new(FieldDefinitions::IsRequired).boolean().not_null().default(false))
                        .col(ColumnDef::new(FieldDefinitions::IsUnique).boolean().not_null().default(false))
                        .col(ColumnDef::new(FieldDefinitions::Position).integer().not_null().default(0))
                        .col(created_at(FieldDefinitions::CreatedAt))
                        .col(created_at(FieldDefinitions::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(unique_index(
                    "uq_field_definitions_owner_slug",
                    FieldDefinitions::Table,
                    vec![FieldDefinitions::OwnerId, FieldDefinitions::Slug],
                ))
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(FieldOptions::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(FieldOptions::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(FieldOptions::FieldDefinitionId).uuid().not_null())
                        .col(ColumnDef::new(FieldOptions::Label).string().not_null())
                        .col(ColumnDef::new(FieldOptions::Value).string().not_null())
                        .col(ColumnDef::new(FieldOptions::Position).integer().not_null().default(0))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_field_options_field")
                                .from(FieldOptions::Table, FieldOptions::FieldDefinitionId)
                                .to(FieldDefinitions::Table, FieldDefinitions::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(FieldValues::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(FieldValues::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(FieldValues::OwnerInstanceId).uuid().not_null())
                        .col(ColumnDef::new(FieldValues::FieldDefinitionId).uuid().not_null())
                        .col(ColumnDef::new(FieldValues::Value).text())
                        .col(created_at(FieldValues::CreatedAt))
                        .col(created_at(FieldValues::UpdatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_field_values_field")
                                .from(FieldValues::Table, FieldValues::FieldDefinitionId)
                                .to(FieldDefinitions::Table, FieldDefinitions::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(unique_index(
                    "uq_field_values_instance_field",
                    FieldValues::Table,
                    vec![FieldValues::OwnerInstanceId, FieldValues::FieldDefinitionId],
                ))
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RepeaterGroups::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(RepeaterGroups::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(RepeaterGroups::OwnerInstanceId).uuid().not_null())
                        .col(ColumnDef::new(RepeaterGroups::FieldDefinitionId).uuid().not_null())
                        .col(ColumnDef::new(RepeaterGroups::OrderIndex).integer().not_null().default(0))
                        .col(created_at(RepeaterGroups::CreatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_repeater_groups_field")
                                .from(RepeaterGroups::Table, RepeaterGroups::FieldDefinitionId)
                                .to(FieldDefinitions::Table, FieldDefinitions::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_repeater_groups_instance_field")
                        .table(RepeaterGroups::Table)
                        .col(RepeaterGroups::OwnerInstanceId)
                        .col(RepeaterGroups::FieldDefinitionId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RepeaterValues::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(RepeaterValues::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(RepeaterValues::RepeaterGroupId).uuid().not_null())
                        .col(ColumnDef::new(RepeaterValues::FieldDefinitionId).uuid().not_null())
                        .col(ColumnDef::new(RepeaterValues::Value).text())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_repeater_values_group")
                                .from(RepeaterValues::Table, RepeaterValues::RepeaterGroupId)
                                .to(RepeaterGroups::Table, RepeaterGroups::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(unique_index(
                    "uq_repeater_values_group_field",
                    RepeaterValues::Table,
                    vec![RepeaterValues::RepeaterGroupId, RepeaterValues::FieldDefinitionId],
                ))
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RepeaterValues::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(RepeaterGroups::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(FieldValues::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(FieldOptions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(FieldDefinitions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden, Clone)]
    enum FieldDefinitions {
        Table,
        Id,
        OwnerType,
        OwnerId,
        ParentFieldId,
        Name,
        Slug,
        FieldType,
        ValidationRules,
        Settings,
        DefaultValue,
        IsRequired,
        IsUnique,
        Position,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden, Clone)]
    enum FieldOptions {
        Table,
        Id,
        FieldDefinitionId,
        Label,
        Value,
        Position,
    }

    #[derive(DeriveIden, Clone)]
    enum FieldValues {
        Table,
        Id,
        OwnerInstanceId,
        FieldDefinitionId,
        Value,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden, Clone)]
    enum RepeaterGroups {
        Table,
        Id,
        OwnerInstanceId,
        FieldDefinitionId,
        OrderIndex,
        CreatedAt,
    }

    #[derive(DeriveIden, Clone)]
    enum RepeaterValues {
        Table,
        Id,
        RepeaterGroupId,
        FieldDefinitionId,
        Value,
    }
}

mod m20250301_000003_create_layout {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000003_create_layout"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Templates::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Templates::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Templates::ThemeId).uuid().not_null())
                        .col(ColumnDef::new(Templates::Name).string().not_null())
                        .col(ColumnDef::new(Templates::Slug).string().not_null())
                        .col(ColumnDef::new(Templates::Description).text())
                        .col(ColumnDef::new(Templates::IsDefault).boolean().not_null().default(false))
                        .col(ColumnDef::new(Templates::IsActive).boolean().not_null().default(true))
                        .col(ColumnDef::new(Templates::Settings).json().not_null())
                        .col(created_at(Templates::CreatedAt))
                        .col(created_at(Templates::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(unique_index(
                    "uq_templates_theme_slug",
                    Templates::Table,
                    vec![Templates::ThemeId, Templates::Slug],
                ))
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(TemplateSections::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(TemplateSections::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(TemplateSections::TemplateId).uuid().not_null())
                        .col(ColumnDef::new(TemplateSections::ParentId).uuid())
                        .col(ColumnDef::new(TemplateSections::Name).string().not_null())
                        .col(ColumnDef::new(TemplateSections::Slug).string().not_null())
                        .col(ColumnDef::new(TemplateSections::Position).integer().not_null().default(0))
                        .col(ColumnDef::new(TemplateSections::GridX).integer().not_null().default(0))
                        .col(ColumnDef::new(TemplateSections::GridY).integer().not_null().default(0))
                        .col(ColumnDef::new(TemplateSections::GridW).integer().not_null().default(0))
                        .col(ColumnDef::new(TemplateSections::GridH).integer().not_null().default(0))
                        .col(
                            ColumnDef::new(TemplateSections::SectionType)
                                .string()
                                .not_null()
                                .default("standard"),
                        )
                        .col(ColumnDef::new(TemplateSections::ColumnLayout).string())
                        .col(
                            ColumnDef::new(TemplateSections::IsRepeatable)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(TemplateSections::MaxWidgets).integer())
                        .col(ColumnDef::new(TemplateSections::Settings).json().not_null())
                        .col(created_at(TemplateSections::CreatedAt))
                        .col(created_at(TemplateSections::UpdatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_template_sections_template")
                                .from(TemplateSections::Table, TemplateSections::TemplateId)
                                .to(Templates::Table, Templates::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(unique_index(
                    "uq_template_sections_template_slug",
                    TemplateSections::Table,
                    vec![TemplateSections::TemplateId, TemplateSections::Slug],
                ))
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Pages::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Pages::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Pages::Title).string().not_null())
                        .col(ColumnDef::new(Pages::Slug).string().not_null())
                        .col(ColumnDef::new(Pages::TemplateId).uuid().not_null())
                        .col(ColumnDef::new(Pages::ParentId).uuid())
                        .col(ColumnDef::new(Pages::Status).string().not_null().default("draft"))
                        .col(ColumnDef::new(Pages::ShowInMenu).boolean().not_null().default(false))
                        .col(ColumnDef::new(Pages::MenuTitle).string())
                        .col(ColumnDef::new(Pages::MenuOrder).integer().not_null().default(0))
                        .col(ColumnDef::new(Pages::MetaTitle).string())
                        .col(ColumnDef::new(Pages::MetaDescription).text())
                        .col(ColumnDef::new(Pages::PublishedAt).timestamp_with_time_zone())
                        .col(ColumnDef::new(Pages::CreatedBy).uuid())
                        .col(ColumnDef::new(Pages::UpdatedBy).uuid())
                        .col(created_at(Pages::CreatedAt))
                        .col(created_at(Pages::UpdatedAt))
                        .col(ColumnDef::new(Pages::DeletedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_pages_template")
                                .from(Pages::Table, Pages::TemplateId)
                                .to(Templates::Table, Templates::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(unique_index("uq_pages_slug", Pages::Table, vec![Pages::Slug]))
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PageSections::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(PageSections::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(PageSections::PageId).uuid().not_null())
                        .col(ColumnDef::new(PageSections::TemplateSectionId).uuid().not_null())
                        .col(ColumnDef::new(PageSections::Position).integer().not_null().default(0))
                        .col(ColumnDef::new(PageSections::CssClass).string())
                        .col(ColumnDef::new(PageSections::BackgroundColor).string())
                        .col(ColumnDef::new(PageSections::Padding).string())
                        .col(ColumnDef::new(PageSections::Margin).string())
                        .col(ColumnDef::new(PageSections::Settings).json().not_null())
                        .col(created_at(PageSections::CreatedAt))
                        .col(created_at(PageSections::UpdatedAt))
                        .col(ColumnDef::new(PageSections::DeletedAt).timestamp_with_time_zone())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_page_sections_page")
                                .from(PageSections::Table, PageSections::PageId)
                                .to(Pages::Table, Pages::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_page_sections_template_section")
                                .from(PageSections::Table, PageSections::TemplateSectionId)
                                .to(TemplateSections::Table, TemplateSections::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_page_sections_page_template_section")
                        .table(PageSections::Table)
                        .col(PageSections::PageId)
                        .col(PageSections::TemplateSectionId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Widgets::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Widgets::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Widgets::ThemeId).uuid().not_null())
                        .col(ColumnDef::new(Widgets::Name).string().not_null())
                        .col(ColumnDef::new(Widgets::Slug).string().not_null())
                        .col(ColumnDef::new(Widgets::Icon).string())
                        .col(ColumnDef::new(Widgets::Description).text())
                        .col(ColumnDef::new(Widgets::IsActive).boolean().not_null().default(true))
                        .col(ColumnDef::new(Widgets::Settings).json().not_null())
                        .col(created_at(Widgets::CreatedAt))
                        .col(created_at(Widgets::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(unique_index(
                    "uq_widgets_theme_slug",
                    Widgets::Table,
                    vec![Widgets::ThemeId, Widgets::Slug],
                ))
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WidgetContentTypes::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(WidgetContentTypes::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(WidgetContentTypes::WidgetId).uuid().not_null())
                        .col(ColumnDef::new(WidgetContentTypes::ContentTypeId).uuid().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_widget_content_types_widget")
                                .from(WidgetContentTypes::Table, WidgetContentTypes::WidgetId)
                                .to(Widgets::Table, Widgets::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(unique_index(
                    "uq_widget_content_types_pair",
                    WidgetContentTypes::Table,
                    vec![WidgetContentTypes::WidgetId, WidgetContentTypes::ContentTypeId],
                ))
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PageSectionWidgets::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(PageSectionWidgets::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(PageSectionWidgets::PageSectionId).uuid().not_null())
                        .col(ColumnDef::new(PageSectionWidgets::WidgetId).uuid().not_null())
                        .col(ColumnDef::new(PageSectionWidgets::Position).integer().not_null().default(0))
                        .col(ColumnDef::new(PageSectionWidgets::GridX).integer().not_null().default(0))
                        .col(ColumnDef::new(PageSectionWidgets::GridY).integer().not_null().default(0))
                        .col(ColumnDef::new(PageSectionWidgets::GridW).integer().not_null().default(0))
                        .col(ColumnDef::new(PageSectionWidgets::GridH).integer().not_null().default(0))
                        .col(ColumnDef::new(PageSectionWidgets::GridId).string().not_null())
                        .col(ColumnDef::new(PageSectionWidgets::Settings).json().not_null())
                        .col(ColumnDef::new(PageSectionWidgets::ContentQuery).json())
                        .col(ColumnDef::new(PageSectionWidgets::CssClass).string())
                        .col(ColumnDef::new(PageSectionWidgets::BackgroundColor).string())
                        .col(ColumnDef::new(PageSectionWidgets::Padding).string())
                        .col(ColumnDef::new(PageSectionWidgets::Margin).string())
                        .col(created_at(PageSectionWidgets::CreatedAt))
                        .col(created_at(PageSectionWidgets::UpdatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_page_section_widgets_section")
                                .from(PageSectionWidgets::Table, PageSectionWidgets::PageSectionId)
                                .to(PageSections::Table, PageSections::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_page_section_widgets_widget")
                                .from(PageSectionWidgets::Table, PageSectionWidgets::WidgetId)
                                .to(Widgets::Table, Widgets::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(unique_index(
                    "uq_page_section_widgets_grid_id",
                    PageSectionWidgets::Table,
                    vec![PageSectionWidgets::GridId],
                ))
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PageSectionWidgets::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WidgetContentTypes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Widgets::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PageSections::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Pages::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(TemplateSections::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Templates::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden, Clone)]
    enum Templates {
        Table,
        Id,
        ThemeId,
        Name,
        Slug,
        Description,
        IsDefault,
        IsActive,
        Settings,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden, Clone)]
    enum TemplateSections {
        Table,
        Id,
        TemplateId,
        ParentId,
        Name,
        Slug,
        Position,
        GridX,
        GridY,
        GridW,
        GridH,
        SectionType,
        ColumnLayout,
        IsRepeatable,
        MaxWidgets,
        Settings,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden, Clone)]
    enum Pages {
        Table,
        Id,
        Title,
        Slug,
        TemplateId,
        ParentId,
        Status,
        ShowInMenu,
        MenuTitle,
        MenuOrder,
        MetaTitle,
        MetaDescription,
        PublishedAt,
        CreatedBy,
        UpdatedBy,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }

    #[derive(DeriveIden, Clone)]
    enum PageSections {
        Table,
        Id,
        PageId,
        TemplateSectionId,
        Position,
        CssClass,
        BackgroundColor,
        Padding,
        Margin,
        Settings,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }

    #[derive(DeriveIden, Clone)]
    enum Widgets {
        Table,
        Id,
        ThemeId,
        Name,
        Slug,
        Icon,
        Description,
        IsActive,
        Settings,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden, Clone)]
    enum WidgetContentTypes {
        Table,
        Id,
        WidgetId,
        ContentTypeId,
    }

    #[derive(DeriveIden, Clone)]
    enum PageSectionWidgets {
        Table,
        Id,
        PageSectionId,
        WidgetId,
        Position,
        GridX,
        GridY,
        GridW,
        GridH,
        GridId,
        Settings,
        ContentQuery,
        CssClass,
        BackgroundColor,
        Padding,
        Margin,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000004_create_queries {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000004_create_queries"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ContentQueries::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(ContentQueries::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(ContentQueries::Name).string().not_null())
                        .col(ColumnDef::new(ContentQueries::ContentTypeId).uuid().not_null())
                        .col(ColumnDef::new(ContentQueries::Limit).big_integer())
                        .col(ColumnDef::new(ContentQueries::Offset).big_integer().not_null().default(0))
                        .col(ColumnDef::new(ContentQueries::OrderBy).string())
                        .col(
                            ColumnDef::new(ContentQueries::OrderDirection)
                                .string()
                                .not_null()
                                .default("desc"),
                        )
                        .col(created_at(ContentQueries::CreatedAt))
                        .col(created_at(ContentQueries::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ContentQueryFilters::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(ContentQueryFilters::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(ContentQueryFilters::ContentQueryId).uuid().not_null())
                        .col(ColumnDef::new(ContentQueryFilters::FieldId).uuid())
                        .col(ColumnDef::new(ContentQueryFilters::FieldKey).string())
                        .col(ColumnDef::new(ContentQueryFilters::Operator).string().not_null())
                        .col(ColumnDef::new(ContentQueryFilters::Value).text())
                        .col(ColumnDef::new(ContentQueryFilters::ConditionGroup).string())
                        .col(ColumnDef::new(ContentQueryFilters::Position).integer().not_null().default(0))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_content_query_filters_query")
                                .from(ContentQueryFilters::Table, ContentQueryFilters::ContentQueryId)
                                .to(ContentQueries::Table, ContentQueries::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_content_queries_content_type")
                        .table(ContentQueries::Table)
                        .col(ContentQueries::ContentTypeId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ContentQueryFilters::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ContentQueries::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden, Clone)]
    enum ContentQueries {
        Table,
        Id,
        Name,
        ContentTypeId,
        Limit,
        Offset,
        OrderBy,
        OrderDirection,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden, Clone)]
    enum ContentQueryFilters {
        Table,
        Id,
        ContentQueryId,
        FieldId,
        FieldKey,
        Operator,
        Value,
        ConditionGroup,
        Position,
    }
}
