//! Field definitions, options and the EAV value store

use super::{check_settings, check_slug, next_position, Service, StorageResultExt};
use crate::contract::{
    Confirmation, ContentError, FieldDefinition, FieldDefinitionPatch, FieldDeletionImpact, FieldErrors,
    FieldOption, FieldOwner, FieldType, FieldValue, FieldValueRecord, NewFieldDefinition, NewFieldOption,
    RepeaterGroup,
};
use crate::domain::events::ContentEvent;
use crate::domain::field_types::{self, Normalized};
use crate::domain::repository::{RepeaterWrite, ValueBatch};
use crate::domain::validation::{self, RuleSet};
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use uuid::Uuid;

impl Service {
    // ===== Field definitions =====

    pub async fn define_field(
        &self,
        owner: FieldOwner,
        input: NewFieldDefinition,
    ) -> Result<FieldDefinition, ContentError> {
        self.ensure_owner(owner).await?;

        let mut errors = FieldErrors::new();
        validation::require_text(&mut errors, "name", &input.name);
        let slug = check_slug(&mut errors, input.slug.trim());
        check_rules(&mut errors, input.validation_rules.as_deref());
        check_field_settings(&mut errors, input.field_type, &input.settings);
        check_options(&mut errors, input.field_type, &input.options);

        if let Some(parent_id) = input.parent_field_id {
            self.check_parent(&mut errors, owner, parent_id, input.field_type).await?;
        }
        errors.into_result()?;
        let slug = slug.unwrap_or_default();

        if self
            .repos
            .fields
            .find_by_slug(owner.id(), &slug)
            .await
            .or_internal("find field by slug")?
            .is_some()
        {
            return Err(ContentError::DuplicateSlug {
                scope: format!("{} {}", owner.kind(), owner.id()),
                slug,
            });
        }

        let position = match input.position {
            Some(position) => position,
            None => next_position(self.repos.fields.max_position(owner.id()).await.or_internal("max field position")?),
        };

        let now = Utc::now();
        let field = FieldDefinition {
            id: Uuid::new_v4(),
            owner,
            parent_field_id: input.parent_field_id,
            name: input.name.trim().to_string(),
            slug,
            field_type: input.field_type,
            validation_rules: input.validation_rules.filter(|r| !r.trim().is_empty()),
            settings: input.settings,
            default_value: input.default_value,
            is_required: input.is_required,
            is_unique: input.is_unique,
            position,
            created_at: now,
            updated_at: now,
        };
        let options = build_options(field.id, &input.options);

        let created = self
            .repos
            .fields
            .create(&field, &options)
            .await
            .or_internal("create field")?;

        tracing::info!(
            field_id = %created.id,
            owner = owner.kind(),
            owner_id = %owner.id(),
            slug = %created.slug,
            field_type = %created.field_type,
            "Defined field"
        );
        Ok(created)
    }

    pub async fn update_field(&self, id: Uuid, patch: FieldDefinitionPatch) -> Result<FieldDefinition, ContentError> {
        let mut field = self.get_field(id).await?;
        let mut errors = FieldErrors::new();

        if let Some(name) = patch.name {
            validation::require_text(&mut errors, "name", &name);
            field.name = name.trim().to_string();
        }

        let mut slug_changed = false;
        if let Some(slug) = patch.slug {
            if let Some(slug) = check_slug(&mut errors, slug.trim()) {
                slug_changed = slug != field.slug;
                field.slug = slug;
            }
        }

        if let Some(field_type) = patch.field_type.filter(|t| *t != field.field_type) {
            self.check_type_change(&field).await?;
            if field_type == FieldType::Repeater && field.parent_field_id.is_some() {
                errors.add("field_type", "Repeater fields cannot be nested.");
            }
            field.field_type = field_type;
        }

        if let Some(rules) = patch.validation_rules {
            check_rules(&mut errors, rules.as_deref());
            field.validation_rules = rules.filter(|r| !r.trim().is_empty());
        }
        if let Some(settings) = patch.settings {
            field.settings = settings;
        }
        check_field_settings(&mut errors, field.field_type, &field.settings);

        if let Some(default_value) = patch.default_value {
            field.default_value = default_value;
        }
        if let Some(is_required) = patch.is_required {
            field.is_required = is_required;
        }
        if let Some(is_unique) = patch.is_unique {
            field.is_unique = is_unique;
        }
        errors.into_result()?;

        if slug_changed {
            let existing = self
                .repos
                .fields
                .find_by_slug(field.owner.id(), &field.slug)
                .await
                .or_internal("find field by slug")?;
            if existing.is_some_and(|other| other.id != field.id) {
                return Err(ContentError::DuplicateSlug {
                    scope: format!("{} {}", field.owner.kind(), field.owner.id()),
                    slug: field.slug,
                });
            }
        }

        field.updated_at = Utc::now();
        let updated = self.repos.fields.update(&field).await.or_internal("update field")?;
        tracing::info!(field_id = %updated.id, slug = %updated.slug, "Updated field");
        Ok(updated)
    }

    pub async fn get_field(&self, id: Uuid) -> Result<FieldDefinition, ContentError> {
        self.repos
            .fields
            .find_by_id(id)
            .await
            .or_internal("find field")?
            .ok_or_else(|| ContentError::not_found("field_definition", id))
    }

    /// Every field of an owner, subfields included, by position
    pub async fn list_fields(&self, owner: FieldOwner) -> Result<Vec<FieldDefinition>, ContentError> {
        self.ensure_owner(owner).await?;
        self.repos
            .fields
            .list_by_owner(owner.id())
            .await
            .or_internal("list fields")
    }

    pub async fn list_field_options(&self, field_id: Uuid) -> Result<Vec<FieldOption>, ContentError> {
        self.get_field(field_id).await?;
        self.repos
            .fields
            .list_options(field_id)
            .await
            .or_internal("list field options")
    }

    /// Replace the option list atomically
    pub async fn set_field_options(
        &self,
        field_id: Uuid,
        options: Vec<NewFieldOption>,
    ) -> Result<Vec<FieldOption>, ContentError> {
        let field = self.get_field(field_id).await?;
        let mut errors = FieldErrors::new();
        if !field.field_type.is_choice() {
            errors.add(
                "options",
                format!("Fields of type {} do not take options.", field.field_type),
            );
        } else {
            check_options(&mut errors, field.field_type, &options);
        }
        errors.into_result()?;

        let stored = self
            .repos
            .fields
            .replace_options(field.id, &build_options(field.id, &options))
            .await
            .or_internal("replace field options")?;
        tracing::info!(field_id = %field.id, count = stored.len(), "Replaced field options");
        Ok(stored)
    }

    pub async fn preview_field_deletion(&self, id: Uuid) -> Result<FieldDeletionImpact, ContentError> {
        self.get_field(id).await?;
        self.repos
            .fields
            .deletion_impact(id)
            .await
            .or_internal("field deletion impact")
    }

    /// Destroy the field and every value it holds; requires confirmation
    pub async fn delete_field(&self, id: Uuid, confirmation: Confirmation) -> Result<FieldDeletionImpact, ContentError> {
        let field = self.get_field(id).await?;
        if confirmation != Confirmation::Confirmed {
            return Err(ContentError::ConfirmationRequired {
                resource: "field_definition",
                id,
            });
        }

        let impact = self.preview_field_deletion(id).await?;
        self.repos
            .fields
            .delete_cascade(id)
            .await
            .or_internal("delete field")?;

        tracing::info!(
            field_id = %id,
            slug = %field.slug,
            values = impact.values,
            options = impact.options,
            subfields = impact.subfields,
            "Deleted field"
        );
        self.publish(ContentEvent::field_deleted(&field, impact.values)).await;
        Ok(impact)
    }

    // ===== Values =====

    /// Validate a raw value against a field without storing it
    pub async fn validate_value(&self, field_id: Uuid, raw: &Value) -> Result<(), ContentError> {
        let field = self.get_field(field_id).await?;
        let options = self.options_of(&field).await?;
        let mut errors = FieldErrors::new();
        if field.field_type == FieldType::Repeater {
            let groups = parse_groups(&mut errors, &field, raw);
            let subfields = self.subfields_of(&field).await?;
            let sub_options = self.options_for(&subfields).await?;
            self.prepare_repeater(&field, &subfields, &sub_options, &groups, None, &mut errors)
                .await?;
        } else {
            self.prepare_value(&field, &options, raw, None, &field.slug, &mut errors)
                .await?;
        }
        errors.into_result()
    }

    /// Validate and upsert the single value of (instance, field)
    pub async fn set_value(&self, owner_instance_id: Uuid, field_id: Uuid, raw: Value) -> Result<FieldValue, ContentError> {
        let field = self.get_field(field_id).await?;
        if field.field_type == FieldType::Repeater {
            return Err(ContentError::validation(
                field.slug,
                "Repeater values must be written as repeater groups.",
            ));
        }
        if field.parent_field_id.is_some() {
            return Err(ContentError::validation(
                field.slug,
                "Subfield values are written through their repeater groups.",
            ));
        }
        self.ensure_instance(field.owner, owner_instance_id).await?;

        let options = self.options_of(&field).await?;
        let mut errors = FieldErrors::new();
        let stored = self
            .prepare_value(&field, &options, &raw, Some(owner_instance_id), &field.slug, &mut errors)
            .await?;
        errors.into_result()?;

        let now = Utc::now();
        let record = self
            .repos
            .values
            .upsert(&FieldValueRecord {
                id: Uuid::new_v4(),
                owner_instance_id,
                field_definition_id: field.id,
                value: stored,
                created_at: now,
                updated_at: now,
            })
            .await
            .or_internal("upsert field value")?;

        tracing::debug!(field_id = %field.id, instance = %owner_instance_id, "Stored field value");
        Ok(self.registry.decode(field.field_type, record.value.as_deref()))
    }

    /// Stored value, the field default when no row exists
    pub async fn get_value(&self, owner_instance_id: Uuid, field_id: Uuid) -> Result<FieldValue, ContentError> {
        let field = self.get_field(field_id).await?;
        if field.field_type == FieldType::Repeater {
            let subfields = self.subfields_of(&field).await?;
            return self.read_repeater(&field, &subfields, owner_instance_id).await;
        }

        let record = self
            .repos
            .values
            .find(owner_instance_id, field.id)
            .await
            .or_internal("find field value")?;
        Ok(match record {
            Some(record) => self.registry.decode(field.field_type, record.value.as_deref()),
            None => self.registry.decode_or_default(&field, None),
        })
    }

    /// Replace every group of a repeater field atomically
    pub async fn set_repeater_groups(
        &self,
        owner_instance_id: Uuid,
        field_id: Uuid,
        groups: Vec<Map<String, Value>>,
    ) -> Result<FieldValue, ContentError> {
        let field = self.get_field(field_id).await?;
        if field.field_type != FieldType::Repeater {
            return Err(ContentError::validation(
                field.slug,
                format!("Fields of type {} do not take repeater groups.", field.field_type),
            ));
        }
        self.ensure_instance(field.owner, owner_instance_id).await?;

        let subfields = self.subfields_of(&field).await?;
        let options = self.options_for(&subfields).await?;
        let mut errors = FieldErrors::new();
        let write = self
            .prepare_repeater(&field, &subfields, &options, &groups, Some(owner_instance_id), &mut errors)
            .await?;
        errors.into_result()?;

        self.repos
            .values
            .replace_repeater_groups(owner_instance_id, &write)
            .await
            .or_internal("replace repeater groups")?;
        tracing::debug!(field_id = %field.id, instance = %owner_instance_id, groups = write.groups.len(), "Replaced repeater groups");

        self.read_repeater(&field, &subfields, owner_instance_id).await
    }

    // ===== Internal helpers shared with content items and widget placements =====

    pub(super) async fn ensure_owner(&self, owner: FieldOwner) -> Result<(), ContentError> {
        match owner {
            FieldOwner::ContentType(id) => self.get_content_type(id).await.map(|_| ()),
            FieldOwner::WidgetType(id) => self.get_widget(id).await.map(|_| ()),
        }
    }

    /// The instance must be an item of the owning type or a placement of the owning widget
    async fn ensure_instance(&self, owner: FieldOwner, instance_id: Uuid) -> Result<(), ContentError> {
        match owner {
            FieldOwner::ContentType(type_id) => {
                let item = self
                    .repos
                    .items
                    .find_by_id(instance_id)
                    .await
                    .or_internal("find content item")?;
                match item {
                    Some(item) if item.content_type_id == type_id => Ok(()),
                    _ => Err(ContentError::not_found("content_item", instance_id)),
                }
            }
            FieldOwner::WidgetType(widget_id) => {
                let placement = self
                    .repos
                    .pages
                    .find_placement(instance_id)
                    .await
                    .or_internal("find widget placement")?;
                match placement {
                    Some(placement) if placement.widget_id == widget_id => Ok(()),
                    _ => Err(ContentError::not_found("widget_placement", instance_id)),
                }
            }
        }
    }

    async fn check_parent(
        &self,
        errors: &mut FieldErrors,
        owner: FieldOwner,
        parent_id: Uuid,
        field_type: FieldType,
    ) -> Result<(), ContentError> {
        let parent = self
            .repos
            .fields
            .find_by_id(parent_id)
            .await
            .or_internal("find parent field")?;
        match parent {
            Some(parent)
                if parent.owner == owner
                    && parent.field_type == FieldType::Repeater
                    && parent.parent_field_id.is_none() =>
            {
                if field_type == FieldType::Repeater {
                    errors.add("field_type", "Repeater fields cannot be nested.");
                }
            }
            _ => errors.add(
                "parent_field_id",
                "The parent field must be a repeater field of the same owner.",
            ),
        }
        Ok(())
    }

    async fn check_type_change(&self, field: &FieldDefinition) -> Result<(), ContentError> {
        let impact = self
            .repos
            .fields
            .deletion_impact(field.id)
            .await
            .or_internal("field deletion impact")?;
        if impact.values > 0 || impact.repeater_groups > 0 {
            return Err(ContentError::conflict(format!(
                "The type of field '{}' cannot change while it holds {} values",
                field.slug,
                impact.values + impact.repeater_groups
            )));
        }
        if impact.subfields > 0 {
            return Err(ContentError::conflict(format!(
                "Field '{}' still has {} subfields",
                field.slug, impact.subfields
            )));
        }
        Ok(())
    }

    async fn options_of(&self, field: &FieldDefinition) -> Result<Vec<FieldOption>, ContentError> {
        if !field.field_type.is_choice() {
            return Ok(Vec::new());
        }
        self.repos
            .fields
            .list_options(field.id)
            .await
            .or_internal("list field options")
    }

    /// Options of every choice field in the list, keyed by field id
    pub(super) async fn options_for(
        &self,
        fields: &[FieldDefinition],
    ) -> Result<HashMap<Uuid, Vec<FieldOption>>, ContentError> {
        let ids: Vec<Uuid> = fields
            .iter()
            .filter(|f| f.field_type.is_choice())
            .map(|f| f.id)
            .collect();
        let mut by_field: HashMap<Uuid, Vec<FieldOption>> = HashMap::new();
        if ids.is_empty() {
            return Ok(by_field);
        }
        for option in self
            .repos
            .fields
            .list_options_for(&ids)
            .await
            .or_internal("list field options")?
        {
            by_field.entry(option.field_definition_id).or_default().push(option);
        }
        Ok(by_field)
    }

    async fn subfields_of(&self, field: &FieldDefinition) -> Result<Vec<FieldDefinition>, ContentError> {
        Ok(self
            .repos
            .fields
            .list_by_owner(field.owner.id())
            .await
            .or_internal("list fields")?
            .into_iter()
            .filter(|f| f.parent_field_id == Some(field.id))
            .collect())
    }

    /// Validated stored text of one value; messages are recorded under `key`
    async fn prepare_value(
        &self,
        field: &FieldDefinition,
        options: &[FieldOption],
        raw: &Value,
        instance_id: Option<Uuid>,
        key: &str,
        errors: &mut FieldErrors,
    ) -> Result<Option<String>, ContentError> {
        let label = field_types::label_of(field);
        let normalized = match self.registry.validate(field, options, raw) {
            Ok(normalized) => normalized,
            Err(messages) => {
                for message in messages {
                    errors.add(key, message);
                }
                return Ok(None);
            }
        };

        if field.field_type.is_media() && self.config.verify_media {
            let identifiers: Vec<&String> = match &normalized {
                Normalized::Scalar(id) => vec![id],
                Normalized::List(ids) => ids.iter().collect(),
                _ => Vec::new(),
            };
            for identifier in identifiers {
                let exists = self.media.exists(identifier).await.or_internal("media lookup")?;
                if !exists {
                    errors.add(key, format!("The {label} references unknown media '{identifier}'."));
                }
            }
        }

        let mut stored = field_types::serialize(&normalized);
        if field.field_type == FieldType::RichText && self.config.sanitize_rich_text {
            stored = stored.map(|html| self.sanitizer.sanitize(&html));
        }

        if let Some(value) = &stored {
            if value.len() > self.config.max_value_size {
                errors.add(
                    key,
                    format!(
                        "The {label} may not be larger than {} bytes.",
                        self.config.max_value_size
                    ),
                );
            }

            if field.is_unique && field.parent_field_id.is_none() {
                let holders = self
                    .repos
                    .values
                    .find_owners_with_value(field.id, value, instance_id)
                    .await
                    .or_internal("unique value lookup")?;
                if !holders.is_empty() {
                    errors.add(key, format!("The {label} has already been taken."));
                }
            }
        }
        Ok(stored)
    }

    /// Validated replacement group list; messages keyed `repeater.index.subfield`
    async fn prepare_repeater(
        &self,
        field: &FieldDefinition,
        subfields: &[FieldDefinition],
        options: &HashMap<Uuid, Vec<FieldOption>>,
        groups: &[Map<String, Value>],
        instance_id: Option<Uuid>,
        errors: &mut FieldErrors,
    ) -> Result<RepeaterWrite, ContentError> {
        if groups.is_empty() && is_required(field) {
            errors.add(
                field.slug.clone(),
                format!("The {} field is required.", field_types::label_of(field)),
            );
        }

        let known: HashSet<&str> = subfields.iter().map(|s| s.slug.as_str()).collect();
        let mut prepared = Vec::with_capacity(groups.len());
        for (index, group) in groups.iter().enumerate() {
            for unknown in group.keys().filter(|k| !known.contains(k.as_str())) {
                tracing::debug!(repeater = %field.slug, key = %unknown, "Ignoring unknown repeater key");
            }

            let mut values = BTreeMap::new();
            for subfield in subfields {
                let raw = group.get(&subfield.slug).unwrap_or(&Value::Null);
                let key = format!("{}.{}.{}", field.slug, index, subfield.slug);
                let sub_options = options.get(&subfield.id).map(Vec::as_slice).unwrap_or_default();
                let stored = self
                    .prepare_value(subfield, sub_options, raw, instance_id, &key, errors)
                    .await?;
                values.insert(subfield.id, stored);
            }

            prepared.push(RepeaterGroup {
                id: Uuid::new_v4(),
                owner_instance_id: instance_id.unwrap_or_default(),
                field_definition_id: field.id,
                order_index: i32::try_from(index).unwrap_or(i32::MAX),
                values,
            });
        }

        Ok(RepeaterWrite {
            field_definition_id: field.id,
            groups: prepared,
        })
    }

    /// Validate submitted values (keyed by slug) against an owner's top-level fields
    ///
    /// Absent required fields are satisfied by stored values when `is_update`.
    pub(super) async fn prepare_values(
        &self,
        owner_id: Uuid,
        instance_id: Uuid,
        submitted: &BTreeMap<String, Value>,
        is_update: bool,
        errors: &mut FieldErrors,
    ) -> Result<ValueBatch, ContentError> {
        let fields = self
            .repos
            .fields
            .list_by_owner(owner_id)
            .await
            .or_internal("list fields")?;
        let options = self.options_for(&fields).await?;
        let top_level: Vec<&FieldDefinition> = fields.iter().filter(|f| f.parent_field_id.is_none()).collect();

        for slug in submitted.keys() {
            if !top_level.iter().any(|f| &f.slug == slug) {
                tracing::debug!(%owner_id, %slug, "Ignoring value for unknown field");
            }
        }

        let now = Utc::now();
        let mut batch = ValueBatch::default();
        for field in top_level {
            match submitted.get(&field.slug) {
                Some(raw) if field.field_type == FieldType::Repeater => {
                    let groups = parse_groups(errors, field, raw);
                    let subfields: Vec<FieldDefinition> = fields
                        .iter()
                        .filter(|f| f.parent_field_id == Some(field.id))
                        .cloned()
                        .collect();
                    let mut write = self
                        .prepare_repeater(field, &subfields, &options, &groups, Some(instance_id), errors)
                        .await?;
                    for group in &mut write.groups {
                        group.owner_instance_id = instance_id;
                    }
                    batch.repeaters.push(write);
                }
                Some(raw) => {
                    let field_options = options.get(&field.id).map(Vec::as_slice).unwrap_or_default();
                    let stored = self
                        .prepare_value(field, field_options, raw, Some(instance_id), &field.slug, errors)
                        .await?;
                    batch.records.push(FieldValueRecord {
                        id: Uuid::new_v4(),
                        owner_instance_id: instance_id,
                        field_definition_id: field.id,
                        value: stored,
                        created_at: now,
                        updated_at: now,
                    });
                }
                None if is_required(field) => {
                    let satisfied = is_update && self.has_stored_value(field, instance_id).await?;
                    if !satisfied {
                        errors.add(
                            field.slug.clone(),
                            format!("The {} field is required.", field_types::label_of(field)),
                        );
                    }
                }
                None => {}
            }
        }
        Ok(batch)
    }

    async fn has_stored_value(&self, field: &FieldDefinition, instance_id: Uuid) -> Result<bool, ContentError> {
        if field.field_type == FieldType::Repeater {
            let groups = self
                .repos
                .values
                .list_repeater_groups(instance_id, field.id)
                .await
                .or_internal("list repeater groups")?;
            return Ok(!groups.is_empty());
        }
        let record = self
            .repos
            .values
            .find(instance_id, field.id)
            .await
            .or_internal("find field value")?;
        Ok(record.and_then(|r| r.value).is_some_and(|v| !v.is_empty()))
    }

    async fn read_repeater(
        &self,
        field: &FieldDefinition,
        subfields: &[FieldDefinition],
        instance_id: Uuid,
    ) -> Result<FieldValue, ContentError> {
        let groups = self
            .repos
            .values
            .list_repeater_groups(instance_id, field.id)
            .await
            .or_internal("list repeater groups")?;
        Ok(FieldValue::Repeater(
            groups
                .into_iter()
                .map(|group| {
                    subfields
                        .iter()
                        .map(|sub| {
                            let value = match group.values.get(&sub.id) {
                                Some(raw) => self.registry.decode(sub.field_type, raw.as_deref()),
                                None => self.registry.decode_or_default(sub, None),
                            };
                            (sub.slug.clone(), value)
                        })
                        .collect()
                })
                .collect(),
        ))
    }

    /// Slug -> value for every top-level field of the owner
    pub(super) async fn instance_values(
        &self,
        owner_id: Uuid,
        instance_id: Uuid,
    ) -> Result<BTreeMap<String, FieldValue>, ContentError> {
        let fields = self
            .repos
            .fields
            .list_by_owner(owner_id)
            .await
            .or_internal("list fields")?;
        let rows: HashMap<Uuid, Option<String>> = self
            .repos
            .values
            .list_for_instance(instance_id)
            .await
            .or_internal("list field values")?
            .into_iter()
            .map(|r| (r.field_definition_id, r.value))
            .collect();

        let mut values = BTreeMap::new();
        for field in fields.iter().filter(|f| f.parent_field_id.is_none()) {
            let value = if field.field_type == FieldType::Repeater {
                let subfields: Vec<FieldDefinition> = fields
                    .iter()
                    .filter(|f| f.parent_field_id == Some(field.id))
                    .cloned()
                    .collect();
                self.read_repeater(field, &subfields, instance_id).await?
            } else {
                match rows.get(&field.id) {
                    Some(raw) => self.registry.decode(field.field_type, raw.as_deref()),
                    None => self.registry.decode_or_default(field, None),
                }
            };
            values.insert(field.slug.clone(), value);
        }
        Ok(values)
    }
}

fn is_required(field: &FieldDefinition) -> bool {
    field.is_required
        || field
            .validation_rules
            .as_deref()
            .and_then(|rules| RuleSet::parse(rules).ok())
            .is_some_and(|rules| rules.is_required())
}

fn check_rules(errors: &mut FieldErrors, rules: Option<&str>) {
    if let Some(rules) = rules {
        if let Err(reason) = RuleSet::parse(rules) {
            errors.add("validation_rules", format!("The validation rules are invalid: {reason}."));
        }
    }
}

fn check_field_settings(errors: &mut FieldErrors, field_type: FieldType, settings: &Value) {
    check_settings(errors, "settings", settings);
    if field_type == FieldType::Json {
        if let Some(schema) = settings.get("schema") {
            if let Err(reason) = validation::validate_schema_document(schema) {
                errors.add("settings.schema", reason);
            }
        }
    }
}

fn check_options(errors: &mut FieldErrors, field_type: FieldType, options: &[NewFieldOption]) {
    if options.is_empty() {
        return;
    }
    if !field_type.is_choice() {
        errors.add("options", format!("Fields of type {field_type} do not take options."));
        return;
    }
    let mut seen = HashSet::new();
    for (index, option) in options.iter().enumerate() {
        if option.value.trim().is_empty() {
            errors.add(format!("options.{index}.value"), "The option value field is required.");
        } else if !seen.insert(option.value.as_str()) {
            errors.add(
                format!("options.{index}.value"),
                format!("The option value '{}' is listed more than once.", option.value),
            );
        }
        if option.label.trim().is_empty() {
            errors.add(format!("options.{index}.label"), "The option label field is required.");
        }
    }
}

fn build_options(field_id: Uuid, options: &[NewFieldOption]) -> Vec<FieldOption> {
    options
        .iter()
        .enumerate()
        .map(|(index, option)| FieldOption {
            id: Uuid::new_v4(),
            field_definition_id: field_id,
            label: option.label.trim().to_string(),
            value: option.value.clone(),
            position: i32::try_from(index).unwrap_or(i32::MAX),
        })
        .collect()
}

/// Submitted repeater value as a list of group objects
fn parse_groups(errors: &mut FieldErrors, field: &FieldDefinition, raw: &Value) -> Vec<Map<String, Value>> {
    match raw {
        Value::Null => Vec::new(),
        Value::Array(items) => {
            let mut groups = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                match item {
                    Value::Object(group) => groups.push(group.clone()),
                    _ => errors.add(
                        format!("{}.{}", field.slug, index),
                        "Each repeater group must be an object.",
                    ),
                }
            }
            groups
        }
        _ => {
            errors.add(
                field.slug.clone(),
                format!("The {} must be a list of groups.", field_types::label_of(field)),
            );
            Vec::new()
        }
    }
}
