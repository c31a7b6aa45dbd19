//! Templates, sections, pages, widgets, placements and page rendering

use super::{check_settings, check_slug, collect_slug, next_position, Service, StorageResultExt};
use crate::contract::{
    Actor, ContentError, ContentType, EvaluationMode, FieldErrors, FieldValue, NewPage, NewTemplate,
    NewTemplateSection, NewWidget, NewWidgetPlacement, Page, PageLayout, PageNode, PagePatch, PageSection,
    PageSectionOverrides, PageSectionWidget, PageStatus, RenderedPageSection, RenderedSection, RenderedWidget,
    Template, TemplatePatch, TemplateSection, TemplateSectionPatch, Widget, WidgetContentTypeAssociation,
    WidgetPlacementPatch,
};
use crate::domain::events::ContentEvent;
use crate::domain::query::{self, PlacementQuery};
use crate::domain::tree::{self, Forest};
use crate::domain::validation;
use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

impl Service {
    // ===== Templates =====

    pub async fn create_template(&self, input: NewTemplate) -> Result<Template, ContentError> {
        let mut errors = FieldErrors::new();
        validation::require_text(&mut errors, "name", &input.name);
        let slug = collect_slug(&mut errors, validation::resolve_slug(input.slug.as_deref(), &input.name));
        check_settings(&mut errors, "settings", &input.settings);
        errors.into_result()?;
        let slug = slug.unwrap_or_default();

        self.ensure_template_slug_free(input.theme_id, &slug, None).await?;

        let now = Utc::now();
        let template = Template {
            id: Uuid::new_v4(),
            theme_id: input.theme_id,
            name: input.name.trim().to_string(),
            slug,
            description: input.description,
            is_default: input.is_default,
            is_active: input.is_active,
            settings: input.settings,
            created_at: now,
            updated_at: now,
        };
        let created = self
            .repos
            .templates
            .create(&template)
            .await
            .or_internal("create template")?;
        tracing::info!(template_id = %created.id, theme_id = %created.theme_id, slug = %created.slug, "Created template");
        Ok(created)
    }

    pub async fn update_template(&self, id: Uuid, patch: TemplatePatch) -> Result<Template, ContentError> {
        let mut template = self.get_template(id).await?;
        let mut errors = FieldErrors::new();

        if let Some(name) = patch.name {
            validation::require_text(&mut errors, "name", &name);
            template.name = name.trim().to_string();
        }
        let new_slug = patch
            .slug
            .and_then(|slug| check_slug(&mut errors, slug.trim()))
            .filter(|slug| *slug != template.slug);
        if let Some(settings) = patch.settings {
            check_settings(&mut errors, "settings", &settings);
            template.settings = settings;
        }
        errors.into_result()?;

        if let Some(slug) = new_slug {
            self.ensure_template_slug_free(template.theme_id, &slug, Some(id)).await?;
            template.slug = slug;
        }
        if let Some(description) = patch.description {
            template.description = description;
        }
        if let Some(is_default) = patch.is_default {
            template.is_default = is_default;
        }
        if let Some(is_active) = patch.is_active {
            template.is_active = is_active;
        }
        template.updated_at = Utc::now();

        let updated = self
            .repos
            .templates
            .update(&template)
            .await
            .or_internal("update template")?;
        tracing::info!(template_id = %updated.id, "Updated template");
        Ok(updated)
    }

    pub async fn get_template(&self, id: Uuid) -> Result<Template, ContentError> {
        self.repos
            .templates
            .find_by_id(id)
            .await
            .or_internal("find template")?
            .ok_or_else(|| ContentError::not_found("template", id))
    }

    pub async fn list_templates(&self, theme_id: Uuid) -> Result<Vec<Template>, ContentError> {
        self.repos
            .templates
            .list_by_theme(theme_id)
            .await
            .or_internal("list templates")
    }

    /// Refused while pages use the template; cascades its sections otherwise
    pub async fn delete_template(&self, id: Uuid) -> Result<(), ContentError> {
        self.get_template(id).await?;
        let dependents = self
            .repos
            .pages
            .count_by_template(id)
            .await
            .or_internal("count pages")?;
        if dependents > 0 {
            return Err(ContentError::ReferentialIntegrity {
                resource: "template",
                id,
                dependent_resource: "page",
                dependents,
            });
        }
        self.repos
            .templates
            .delete_cascade(id)
            .await
            .or_internal("delete template")?;
        tracing::info!(template_id = %id, "Deleted template");
        Ok(())
    }

    async fn ensure_template_slug_free(&self, theme_id: Uuid, slug: &str, except: Option<Uuid>) -> Result<(), ContentError> {
        let existing = self
            .repos
            .templates
            .find_by_slug(theme_id, slug)
            .await
            .or_internal("find template by slug")?;
        match existing {
            Some(other) if Some(other.id) != except => Err(ContentError::DuplicateSlug {
                scope: format!("theme {theme_id}"),
                slug: slug.to_string(),
            }),
            _ => Ok(()),
        }
    }

    // ===== Template sections =====

    pub async fn add_section_to_template(
        &self,
        template_id: Uuid,
        input: NewTemplateSection,
    ) -> Result<TemplateSection, ContentError> {
        let template = self.get_template(template_id).await?;

        let mut errors = FieldErrors::new();
        validation::require_text(&mut errors, "name", &input.name);
        let slug = collect_slug(&mut errors, validation::resolve_slug(input.slug.as_deref(), &input.name));
        check_column_layout(&mut errors, input.section_type, input.column_layout.as_deref());
        check_settings(&mut errors, "settings", &input.settings);
        if let Some(parent_id) = input.parent_id {
            let parent = self
                .repos
                .templates
                .find_section(parent_id)
                .await
                .or_internal("find template section")?;
            if parent.is_none_or(|p| p.template_id != template.id) {
                errors.add("parent_id", "The parent section must belong to the same template.");
            }
        }
        errors.into_result()?;
        let slug = slug.unwrap_or_default();

        if self
            .repos
            .templates
            .find_section_by_slug(template.id, &slug)
            .await
            .or_internal("find template section by slug")?
            .is_some()
        {
            return Err(ContentError::DuplicateSlug {
                scope: format!("template {}", template.id),
                slug,
            });
        }

        let position = match input.position {
            Some(position) => position,
            None => next_position(
                self.repos
                    .templates
                    .max_section_position(template.id)
                    .await
                    .or_internal("max section position")?,
            ),
        };

        let now = Utc::now();
        let section = TemplateSection {
            id: Uuid::new_v4(),
            template_id: template.id,
            parent_id: input.parent_id,
            name: input.name.trim().to_string(),
            slug,
            position,
            grid: input.grid,
            section_type: input.section_type,
            column_layout: input.column_layout,
            is_repeatable: input.is_repeatable,
            max_widgets: input.max_widgets,
            settings: input.settings,
            created_at: now,
            updated_at: now,
        };
        let created = self
            .repos
            .templates
            .create_section(&section)
            .await
            .or_internal("create template section")?;
        tracing::info!(
            section_id = %created.id,
            template_id = %template.id,
            slug = %created.slug,
            position = created.position,
            "Added template section"
        );
        Ok(created)
    }

    pub async fn update_template_section(
        &self,
        id: Uuid,
        patch: TemplateSectionPatch,
    ) -> Result<TemplateSection, ContentError> {
        let mut section = self.get_template_section(id).await?;
        let before = section.clone();
        let mut errors = FieldErrors::new();

        if let Some(name) = patch.name {
            validation::require_text(&mut errors, "name", &name);
            section.name = name.trim().to_string();
        }
        if let Some(grid) = patch.grid {
            section.grid = grid;
        }
        if let Some(section_type) = patch.section_type {
            section.section_type = section_type;
        }
        if let Some(column_layout) = patch.column_layout {
            section.column_layout = column_layout;
        }
        if let Some(is_repeatable) = patch.is_repeatable {
            section.is_repeatable = is_repeatable;
        }
        if let Some(max_widgets) = patch.max_widgets {
            section.max_widgets = max_widgets;
        }
        if let Some(settings) = patch.settings {
            check_settings(&mut errors, "settings", &settings);
            section.settings = settings;
        }
        check_column_layout(&mut errors, section.section_type, section.column_layout.as_deref());
        errors.into_result()?;
        if section.is_repeatable != before.is_repeatable || section.max_widgets != before.max_widgets {
            self.ensure_instances_fit(&section).await?;
        }

        section.updated_at = Utc::now();
        let updated = self
            .repos
            .templates
            .update_section(&section)
            .await
            .or_internal("update template section")?;
        tracing::info!(section_id = %updated.id, "Updated template section");
        Ok(updated)
    }

    pub async fn get_template_section(&self, id: Uuid) -> Result<TemplateSection, ContentError> {
        self.repos
            .templates
            .find_section(id)
            .await
            .or_internal("find template section")?
            .ok_or_else(|| ContentError::not_found("template_section", id))
    }

    pub async fn list_template_sections(&self, template_id: Uuid) -> Result<Vec<TemplateSection>, ContentError> {
        self.get_template(template_id).await?;
        self.repos
            .templates
            .list_sections(template_id)
            .await
            .or_internal("list template sections")
    }

    /// Refused while page sections (of live or deleted pages) or child sections reference it
    pub async fn delete_template_section(&self, id: Uuid) -> Result<(), ContentError> {
        self.get_template_section(id).await?;

        let page_sections = self
            .repos
            .pages
            .count_sections_for_template_section(id)
            .await
            .or_internal("count page sections")?;
        if page_sections > 0 {
            return Err(ContentError::ReferentialIntegrity {
                resource: "template_section",
                id,
                dependent_resource: "page_section",
                dependents: page_sections,
            });
        }

        let children = self
            .repos
            .templates
            .count_child_sections(id)
            .await
            .or_internal("count child sections")?;
        if children > 0 {
            return Err(ContentError::ReferentialIntegrity {
                resource: "template_section",
                id,
                dependent_resource: "template_section",
                dependents: children,
            });
        }

        self.repos
            .templates
            .delete_section(id)
            .await
            .or_internal("delete template section")?;
        tracing::info!(section_id = %id, "Deleted template section");
        Ok(())
    }

    // ===== Pages =====

    pub async fn create_page(&self, input: NewPage, actor: Actor) -> Result<Page, ContentError> {
        let mut errors = FieldErrors::new();
        validation::require_text(&mut errors, "title", &input.title);
        let slug = collect_slug(&mut errors, validation::resolve_slug(input.slug.as_deref(), &input.title));
        if self
            .repos
            .templates
            .find_by_id(input.template_id)
            .await
            .or_internal("find template")?
            .is_none()
        {
            errors.add("template_id", "The selected template does not exist.");
        }
        if let Some(parent_id) = input.parent_id {
            if !self.is_live_page(parent_id).await? {
                errors.add("parent_id", "The selected parent page does not exist.");
            }
        }
        errors.into_result()?;
        let slug = slug.unwrap_or_default();

        self.ensure_page_slug_free(&slug, None).await?;

        let now = Utc::now();
        let page = Page {
            id: Uuid::new_v4(),
            title: input.title.trim().to_string(),
            slug,
            template_id: input.template_id,
            parent_id: input.parent_id,
            status: input.status,
            menu: input.menu,
            meta_title: input.meta_title,
            meta_description: input.meta_description,
            published_at: (input.status == PageStatus::Published).then_some(now),
            created_by: actor.user_id,
            updated_by: actor.user_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let created = self.repos.pages.create(&page).await.or_internal("create page")?;
        tracing::info!(page_id = %created.id, slug = %created.slug, "Created page");
        self.publish(ContentEvent::layout_changed(created.id, "page_created")).await;
        Ok(created)
    }

    /// Update a page; re-parenting below one of its own descendants is refused
    pub async fn update_page(&self, id: Uuid, patch: PagePatch, actor: Actor) -> Result<Page, ContentError> {
        let mut page = self.get_live_page(id).await?;
        let mut errors = FieldErrors::new();

        if let Some(title) = patch.title {
            validation::require_text(&mut errors, "title", &title);
            page.title = title.trim().to_string();
        }
        let new_slug = patch
            .slug
            .and_then(|slug| check_slug(&mut errors, slug.trim()))
            .filter(|slug| *slug != page.slug);

        if let Some(parent_id) = patch.parent_id {
            if let Some(new_parent) = parent_id {
                if !self.is_live_page(new_parent).await? {
                    errors.add("parent_id", "The selected parent page does not exist.");
                } else {
                    let forest = Forest::build(self.repos.pages.list_live().await.or_internal("list pages")?);
                    if tree::would_create_cycle(&forest, page.id, new_parent) {
                        errors.add(
                            "parent_id",
                            "A page cannot be moved below itself or one of its descendants.",
                        );
                    }
                }
            }
            page.parent_id = parent_id;
        }
        errors.into_result()?;

        if let Some(slug) = new_slug {
            self.ensure_page_slug_free(&slug, Some(id)).await?;
            page.slug = slug;
        }

        let now = Utc::now();
        if let Some(status) = patch.status {
            if status == PageStatus::Published && page.published_at.is_none() {
                page.published_at = Some(now);
            }
            page.status = status;
        }
        if let Some(menu) = patch.menu {
            page.menu = menu;
        }
        if let Some(meta_title) = patch.meta_title {
            page.meta_title = meta_title;
        }
        if let Some(meta_description) = patch.meta_description {
            page.meta_description = meta_description;
        }
        page.updated_by = actor.user_id;
        page.updated_at = now;

        let updated = self.repos.pages.update(&page).await.or_internal("update page")?;
        tracing::info!(page_id = %updated.id, status = %updated.status, "Updated page");
        Ok(updated)
    }

    /// Page by id; soft-deleted pages are returned with `deleted_at` set
    pub async fn get_page(&self, id: Uuid) -> Result<Page, ContentError> {
        self.repos
            .pages
            .find_by_id(id)
            .await
            .or_internal("find page")?
            .ok_or_else(|| ContentError::not_found("page", id))
    }

    pub async fn get_page_by_slug(&self, slug: &str) -> Result<Page, ContentError> {
        self.repos
            .pages
            .find_by_slug(slug)
            .await
            .or_internal("find page by slug")?
            .filter(|page| page.deleted_at.is_none())
            .ok_or_else(|| ContentError::not_found("page", slug))
    }

    async fn get_live_page(&self, id: Uuid) -> Result<Page, ContentError> {
        let page = self.get_page(id).await?;
        if page.deleted_at.is_some() {
            return Err(ContentError::not_found("page", id));
        }
        Ok(page)
    }

    async fn is_live_page(&self, id: Uuid) -> Result<bool, ContentError> {
        Ok(self
            .repos
            .pages
            .find_by_id(id)
            .await
            .or_internal("find page")?
            .is_some_and(|p| p.deleted_at.is_none()))
    }

    /// Hierarchy of live pages; children of deleted pages surface as roots
    pub async fn page_tree(&self) -> Result<Vec<PageNode>, ContentError> {
        let pages = self.repos.pages.list_live().await.or_internal("list pages")?;
        let forest = Forest::build(pages);
        Ok(forest.fold(|page, children| PageNode {
            page: page.clone(),
            children,
        }))
    }

    /// Soft delete of the page and its sections
    pub async fn delete_page(&self, id: Uuid) -> Result<(), ContentError> {
        let page = self.get_page(id).await?;
        if page.deleted_at.is_some() {
            return Ok(());
        }
        self.repos
            .pages
            .set_deleted_at(id, Some(Utc::now()))
            .await
            .or_internal("soft delete page")?;
        tracing::info!(page_id = %id, "Soft deleted page");
        self.publish(ContentEvent::layout_changed(id, "page_deleted")).await;
        Ok(())
    }

    pub async fn restore_page(&self, id: Uuid) -> Result<Page, ContentError> {
        let page = self.get_page(id).await?;
        if page.deleted_at.is_none() {
            return Ok(page);
        }
        self.ensure_page_slug_free(&page.slug, Some(id)).await?;
        self.repos
            .pages
            .set_deleted_at(id, None)
            .await
            .or_internal("restore page")?;
        tracing::info!(page_id = %id, "Restored page");
        self.get_page(id).await
    }

    async fn ensure_page_slug_free(&self, slug: &str, except: Option<Uuid>) -> Result<(), ContentError> {
        let existing = self
            .repos
            .pages
            .find_by_slug(slug)
            .await
            .or_internal("find page by slug")?;
        match existing {
            Some(other) if Some(other.id) != except => Err(ContentError::DuplicateSlug {
                scope: "pages".to_string(),
                slug: slug.to_string(),
            }),
            _ => Ok(()),
        }
    }

    // ===== Page sections =====

    /// Instantiate a template section on a page
    pub async fn attach_page_section(
        &self,
        page_id: Uuid,
        template_section_id: Uuid,
        overrides: PageSectionOverrides,
    ) -> Result<PageSection, ContentError> {
        let page = self.get_live_page(page_id).await?;
        let template_section = self.get_template_section(template_section_id).await?;

        let mut errors = FieldErrors::new();
        if template_section.template_id != page.template_id {
            errors.add(
                "template_section_id",
                "The section does not belong to the page's template.",
            );
        }
        check_settings(&mut errors, "settings", &overrides.settings);
        errors.into_result()?;

        if !template_section.is_repeatable {
            let existing = self
                .repos
                .pages
                .list_sections_for(page.id, template_section.id)
                .await
                .or_internal("list page sections")?;
            if !existing.is_empty() {
                return Err(ContentError::DuplicateSection {
                    page_id: page.id,
                    template_section_id: template_section.id,
                });
            }
        }

        let position = match overrides.position {
            Some(position) => position,
            None => next_position(
                self.repos
                    .pages
                    .max_section_position(page.id)
                    .await
                    .or_internal("max page section position")?,
            ),
        };

        let now = Utc::now();
        let section = PageSection {
            id: Uuid::new_v4(),
            page_id: page.id,
            template_section_id: template_section.id,
            position,
            styles: overrides.styles,
            settings: overrides.settings,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let created = self
            .repos
            .pages
            .create_section(&section)
            .await
            .or_internal("create page section")?;
        tracing::info!(
            page_section_id = %created.id,
            page_id = %page.id,
            template_section = %template_section.slug,
            "Attached page section"
        );
        self.publish(ContentEvent::layout_changed(page.id, "section_attached")).await;
        Ok(created)
    }

    pub async fn get_page_section(&self, id: Uuid) -> Result<PageSection, ContentError> {
        self.repos
            .pages
            .find_section(id)
            .await
            .or_internal("find page section")?
            .filter(|section| section.deleted_at.is_none())
            .ok_or_else(|| ContentError::not_found("page_section", id))
    }

    pub async fn list_page_sections(&self, page_id: Uuid) -> Result<Vec<PageSection>, ContentError> {
        self.get_page(page_id).await?;
        self.repos
            .pages
            .list_sections(page_id)
            .await
            .or_internal("list page sections")
    }

    /// Hard delete with widget placements and their values
    pub async fn remove_page_section(&self, id: Uuid) -> Result<(), ContentError> {
        let section = self
            .repos
            .pages
            .find_section(id)
            .await
            .or_internal("find page section")?
            .ok_or_else(|| ContentError::not_found("page_section", id))?;
        self.repos
            .pages
            .delete_section_cascade(id)
            .await
            .or_internal("delete page section")?;
        tracing::info!(page_section_id = %id, page_id = %section.page_id, "Removed page section");
        self.publish(ContentEvent::layout_changed(section.page_id, "section_removed")).await;
        Ok(())
    }

    // ===== Widgets =====

    pub async fn create_widget(&self, input: NewWidget) -> Result<Widget, ContentError> {
        let mut errors = FieldErrors::new();
        validation::require_text(&mut errors, "name", &input.name);
        let slug = collect_slug(&mut errors, validation::resolve_slug(input.slug.as_deref(), &input.name));
        check_settings(&mut errors, "settings", &input.settings);
        errors.into_result()?;
        let slug = slug.unwrap_or_default();

        if self
            .repos
            .widgets
            .find_by_slug(input.theme_id, &slug)
            .await
            .or_internal("find widget by slug")?
            .is_some()
        {
            return Err(ContentError::DuplicateSlug {
                scope: format!("theme {}", input.theme_id),
                slug,
            });
        }

        let now = Utc::now();
        let widget = Widget {
            id: Uuid::new_v4(),
            theme_id: input.theme_id,
            name: input.name.trim().to_string(),
            slug,
            icon: input.icon,
            description: input.description,
            is_active: true,
            settings: input.settings,
            created_at: now,
            updated_at: now,
        };
        let created = self.repos.widgets.create(&widget).await.or_internal("create widget")?;
        tracing::info!(widget_id = %created.id, slug = %created.slug, "Created widget");
        Ok(created)
    }

    pub async fn get_widget(&self, id: Uuid) -> Result<Widget, ContentError> {
        self.repos
            .widgets
            .find_by_id(id)
            .await
            .or_internal("find widget")?
            .ok_or_else(|| ContentError::not_found("widget", id))
    }

    pub async fn list_widgets(&self, theme_id: Uuid) -> Result<Vec<Widget>, ContentError> {
        self.repos
            .widgets
            .list_by_theme(theme_id)
            .await
            .or_internal("list widgets")
    }

    /// Refused while placements reference the widget
    pub async fn delete_widget(&self, id: Uuid) -> Result<(), ContentError> {
        self.get_widget(id).await?;
        let dependents = self
            .repos
            .pages
            .count_placements_for_widget(id)
            .await
            .or_internal("count widget placements")?;
        if dependents > 0 {
            return Err(ContentError::ReferentialIntegrity {
                resource: "widget",
                id,
                dependent_resource: "page_section_widget",
                dependents,
            });
        }
        self.repos
            .widgets
            .delete_cascade(id)
            .await
            .or_internal("delete widget")?;
        tracing::info!(widget_id = %id, "Deleted widget");
        Ok(())
    }

    /// Idempotent
    pub async fn allow_content_type(
        &self,
        widget_id: Uuid,
        content_type_id: Uuid,
    ) -> Result<WidgetContentTypeAssociation, ContentError> {
        self.get_widget(widget_id).await?;
        self.get_content_type(content_type_id).await?;

        if let Some(existing) = self
            .repos
            .widgets
            .find_association(widget_id, content_type_id)
            .await
            .or_internal("find widget association")?
        {
            return Ok(existing);
        }

        let association = WidgetContentTypeAssociation {
            id: Uuid::new_v4(),
            widget_id,
            content_type_id,
        };
        let created = self
            .repos
            .widgets
            .add_association(&association)
            .await
            .or_internal("add widget association")?;
        tracing::info!(%widget_id, %content_type_id, "Allowed content type for widget");
        Ok(created)
    }

    pub async fn disallow_content_type(&self, widget_id: Uuid, content_type_id: Uuid) -> Result<(), ContentError> {
        self.get_widget(widget_id).await?;
        self.repos
            .widgets
            .remove_association(widget_id, content_type_id)
            .await
            .or_internal("remove widget association")?;
        tracing::info!(%widget_id, %content_type_id, "Disallowed content type for widget");
        Ok(())
    }

    pub async fn list_allowed_content_types(&self, widget_id: Uuid) -> Result<Vec<ContentType>, ContentError> {
        self.get_widget(widget_id).await?;
        let associations = self
            .repos
            .widgets
            .list_associations(widget_id)
            .await
            .or_internal("list widget associations")?;
        let mut content_types = Vec::with_capacity(associations.len());
        for association in associations {
            content_types.push(self.get_content_type(association.content_type_id).await?);
        }
        Ok(content_types)
    }

    // ===== Widget placements =====

    /// Place a widget into a page section, honouring the section's widget cap
    pub async fn place_widget(
        &self,
        page_section_id: Uuid,
        input: NewWidgetPlacement,
    ) -> Result<PageSectionWidget, ContentError> {
        let page_section = self.get_page_section(page_section_id).await?;
        let widget = self.get_widget(input.widget_id).await?;
        let template_section = self.get_template_section(page_section.template_section_id).await?;

        let mut errors = FieldErrors::new();
        check_settings(&mut errors, "settings", &input.settings);
        errors.into_result()?;
        if let Some(content_query) = &input.content_query {
            self.check_placement_query(&widget, content_query).await?;
        }

        self.ensure_capacity(&page_section, &template_section).await?;

        let position = match input.position {
            Some(position) => position,
            None => next_position(
                self.repos
                    .pages
                    .max_placement_position(page_section.id)
                    .await
                    .or_internal("max placement position")?,
            ),
        };

        let now = Utc::now();
        let placement = PageSectionWidget {
            id: Uuid::new_v4(),
            page_section_id: page_section.id,
            widget_id: widget.id,
            position,
            grid: input.grid,
            grid_id: format!("gw-{}", nanoid::nanoid!(12)),
            settings: input.settings,
            content_query: input.content_query,
            styles: input.styles,
            created_at: now,
            updated_at: now,
        };
        let created = self
            .repos
            .pages
            .create_placement(&placement)
            .await
            .or_internal("create widget placement")?;
        tracing::info!(
            placement_id = %created.id,
            page_section_id = %page_section.id,
            widget = %widget.slug,
            grid_id = %created.grid_id,
            "Placed widget"
        );
        self.publish(ContentEvent::layout_changed(page_section.page_id, "widget_placed")).await;
        Ok(created)
    }

    pub async fn update_widget_placement(
        &self,
        id: Uuid,
        patch: WidgetPlacementPatch,
    ) -> Result<PageSectionWidget, ContentError> {
        let mut placement = self.get_widget_placement(id).await?;
        let mut errors = FieldErrors::new();

        if let Some(grid) = patch.grid {
            placement.grid = grid;
        }
        if let Some(settings) = patch.settings {
            check_settings(&mut errors, "settings", &settings);
            placement.settings = settings;
        }
        if let Some(styles) = patch.styles {
            placement.styles = styles;
        }
        errors.into_result()?;

        if let Some(content_query) = patch.content_query {
            if let Some(query) = &content_query {
                let widget = self.get_widget(placement.widget_id).await?;
                self.check_placement_query(&widget, query).await?;
            }
            placement.content_query = content_query;
        }
        placement.updated_at = Utc::now();

        let updated = self
            .repos
            .pages
            .update_placement(&placement)
            .await
            .or_internal("update widget placement")?;
        tracing::info!(placement_id = %updated.id, "Updated widget placement");
        Ok(updated)
    }

    pub async fn get_widget_placement(&self, id: Uuid) -> Result<PageSectionWidget, ContentError> {
        self.repos
            .pages
            .find_placement(id)
            .await
            .or_internal("find widget placement")?
            .ok_or_else(|| ContentError::not_found("widget_placement", id))
    }

    pub async fn list_widget_placements(&self, page_section_id: Uuid) -> Result<Vec<PageSectionWidget>, ContentError> {
        self.get_page_section(page_section_id).await?;
        self.repos
            .pages
            .list_placements(&[page_section_id])
            .await
            .or_internal("list widget placements")
    }

    /// Hard delete with its field values
    pub async fn remove_widget_placement(&self, id: Uuid) -> Result<(), ContentError> {
        let placement = self.get_widget_placement(id).await?;
        self.repos
            .pages
            .delete_placement_cascade(id)
            .await
            .or_internal("delete widget placement")?;
        tracing::info!(placement_id = %id, "Removed widget placement");
        if let Ok(section) = self.get_page_section(placement.page_section_id).await {
            self.publish(ContentEvent::layout_changed(section.page_id, "widget_removed")).await;
        }
        Ok(())
    }

    /// Validate and store widget field values (keyed by slug) in one transaction
    pub async fn set_widget_values(
        &self,
        placement_id: Uuid,
        values: BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, FieldValue>, ContentError> {
        let placement = self.get_widget_placement(placement_id).await?;
        let mut errors = FieldErrors::new();
        let batch = self
            .prepare_values(placement.widget_id, placement.id, &values, true, &mut errors)
            .await?;
        errors.into_result()?;

        if !batch.is_empty() {
            self.repos
                .values
                .write_batch(placement.id, &batch)
                .await
                .or_internal("write widget values")?;
        }
        tracing::debug!(placement_id = %placement.id, values = batch.records.len(), "Stored widget values");
        self.instance_values(placement.widget_id, placement.id).await
    }

    pub async fn get_widget_values(&self, placement_id: Uuid) -> Result<BTreeMap<String, FieldValue>, ContentError> {
        let placement = self.get_widget_placement(placement_id).await?;
        self.instance_values(placement.widget_id, placement.id).await
    }

    /// Placements counted per page for single sections, per instance for repeatable ones
    async fn ensure_capacity(
        &self,
        page_section: &PageSection,
        template_section: &TemplateSection,
    ) -> Result<(), ContentError> {
        let Some(max_widgets) = template_section.max_widgets else {
            return Ok(());
        };

        let section_ids: Vec<Uuid> = if template_section.is_repeatable {
            vec![page_section.id]
        } else {
            self.repos
                .pages
                .list_sections_for(page_section.page_id, template_section.id)
                .await
                .or_internal("list page sections")?
                .into_iter()
                .map(|s| s.id)
                .collect()
        };
        let placed = self
            .repos
            .pages
            .count_placements(&section_ids)
            .await
            .or_internal("count widget placements")?;

        if placed >= u64::from(max_widgets) {
            return Err(ContentError::CapacityExceeded {
                template_section_id: template_section.id,
                max_widgets,
            });
        }
        Ok(())
    }

    /// Existing page sections must still satisfy a changed repeatable flag or widget cap
    async fn ensure_instances_fit(&self, template_section: &TemplateSection) -> Result<(), ContentError> {
        let instances = self
            .repos
            .pages
            .list_live_sections_of(template_section.id)
            .await
            .or_internal("list page sections")?;

        let mut per_page: BTreeMap<Uuid, Vec<Uuid>> = BTreeMap::new();
        for instance in &instances {
            per_page.entry(instance.page_id).or_default().push(instance.id);
        }

        if !template_section.is_repeatable {
            if let Some((page_id, _)) = per_page.iter().find(|(_, ids)| ids.len() > 1) {
                return Err(ContentError::DuplicateSection {
                    page_id: *page_id,
                    template_section_id: template_section.id,
                });
            }
        }

        let Some(max_widgets) = template_section.max_widgets else {
            return Ok(());
        };
        let groups: Vec<Vec<Uuid>> = if template_section.is_repeatable {
            instances.iter().map(|s| vec![s.id]).collect()
        } else {
            per_page.into_values().collect()
        };
        for section_ids in groups {
            let placed = self
                .repos
                .pages
                .count_placements(&section_ids)
                .await
                .or_internal("count widget placements")?;
            if placed > u64::from(max_widgets) {
                return Err(ContentError::CapacityExceeded {
                    template_section_id: template_section.id,
                    max_widgets,
                });
            }
        }
        Ok(())
    }

    /// Strict parse; the targeted content type must be allowed for the widget
    async fn check_placement_query(&self, widget: &Widget, blob: &Value) -> Result<(), ContentError> {
        let content_type_id = match query::parse_placement_query(blob, EvaluationMode::Strict)? {
            PlacementQuery::Saved(query_id) => self.get_content_query(query_id).await?.content_type_id,
            PlacementQuery::Inline(definition) => {
                self.check_definition(&definition).await?;
                definition.content_type_id
            }
        };

        let allowed = self
            .repos
            .widgets
            .find_association(widget.id, content_type_id)
            .await
            .or_internal("find widget association")?;
        if allowed.is_none() {
            return Err(ContentError::validation(
                "content_query",
                format!(
                    "Widget '{}' is not allowed to query content type {content_type_id}.",
                    widget.slug
                ),
            ));
        }
        Ok(())
    }

    // ===== Rendering =====

    /// Resolve a page into its template-section tree with instances, widgets, values and items
    pub async fn render_page(&self, page_id: Uuid) -> Result<PageLayout, ContentError> {
        let page = self.get_live_page(page_id).await?;
        let template = self.get_template(page.template_id).await?;
        let template_sections = self
            .repos
            .templates
            .list_sections(template.id)
            .await
            .or_internal("list template sections")?;
        let page_sections = self
            .repos
            .pages
            .list_sections(page.id)
            .await
            .or_internal("list page sections")?;
        let section_ids: Vec<Uuid> = page_sections.iter().map(|s| s.id).collect();
        let placements = self
            .repos
            .pages
            .list_placements(&section_ids)
            .await
            .or_internal("list widget placements")?;

        let mut widgets: HashMap<Uuid, Widget> = HashMap::new();
        let mut rendered_widgets: HashMap<Uuid, Vec<RenderedWidget>> = HashMap::new();
        for placement in placements {
            let widget = match widgets.get(&placement.widget_id) {
                Some(widget) => widget.clone(),
                None => {
                    let widget = self.get_widget(placement.widget_id).await?;
                    widgets.insert(widget.id, widget.clone());
                    widget
                }
            };
            let values = self.instance_values(widget.id, placement.id).await?;
            let items = match &placement.content_query {
                Some(blob) => Some(self.placement_items(placement.id, blob).await),
                None => None,
            };
            rendered_widgets
                .entry(placement.page_section_id)
                .or_default()
                .push(RenderedWidget {
                    placement,
                    widget,
                    values,
                    items,
                });
        }

        let mut instances: HashMap<Uuid, Vec<RenderedPageSection>> = HashMap::new();
        for page_section in page_sections {
            let widgets = rendered_widgets.remove(&page_section.id).unwrap_or_default();
            instances
                .entry(page_section.template_section_id)
                .or_default()
                .push(RenderedPageSection { page_section, widgets });
        }

        let sections = Forest::build(template_sections).fold(|template_section, children| RenderedSection {
            template_section: template_section.clone(),
            instances: instances.remove(&template_section.id).unwrap_or_default(),
            children,
        });

        tracing::debug!(page_id = %page.id, sections = sections.len(), "Rendered page");
        Ok(PageLayout {
            page,
            template,
            sections,
        })
    }

    /// Best-effort items of a placement query; failures render as an empty list
    async fn placement_items(&self, placement_id: Uuid, blob: &Value) -> Vec<crate::contract::ContentItem> {
        match self.evaluate_placement_query(blob, EvaluationMode::BestEffort).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(%placement_id, error = %e, "Content query of widget placement failed");
                Vec::new()
            }
        }
    }
}

fn check_column_layout(errors: &mut FieldErrors, section_type: crate::contract::SectionType, column_layout: Option<&str>) {
    if section_type.requires_column_layout() && column_layout.is_none_or(|c| c.trim().is_empty()) {
        errors.add(
            "column_layout",
            format!("The column layout field is required when section type is {section_type}."),
        );
    }
}
