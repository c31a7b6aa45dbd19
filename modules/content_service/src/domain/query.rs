//! Content query evaluator
//!
//! Filters are bucketed by `condition_group`: members of a bucket are
//! OR-combined, buckets are AND-combined. Items are then ordered and paged.

use crate::contract::{
    ContentError, ContentItem, EvaluationMode, FieldDefinition, FilterOperator, QueryDefinition,
    QueryFilter, SortDirection,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

/// Built-in item properties addressable by `field_key` and `order_by`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemProperty {
    Title,
    Slug,
    Status,
    CreatedAt,
    UpdatedAt,
    PublishedAt,
}

impl FromStr for ItemProperty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "slug" => Ok(Self::Slug),
            "status" => Ok(Self::Status),
            "created_at" => Ok(Self::CreatedAt),
            "updated_at" => Ok(Self::UpdatedAt),
            "published_at" => Ok(Self::PublishedAt),
            other => Err(format!("unknown item property '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Field(Uuid),
    Property(ItemProperty),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub target: Target,
    pub operator: FilterOperator,
    pub operand: Option<String>,
}

/// Compiled filter set: AND over buckets, OR inside a bucket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    buckets: Vec<Vec<Predicate>>,
}

impl Selection {
    pub fn buckets(&self) -> &[Vec<Predicate>] {
        &self.buckets
    }

    pub fn matches(&self, candidate: &Candidate<'_>) -> bool {
        self.buckets
            .iter()
            .all(|bucket| bucket.iter().any(|p| p.matches(candidate)))
    }
}

/// Item under evaluation with its resolved field values (defaults applied)
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub item: &'a ContentItem,
    pub values: HashMap<Uuid, String>,
}

enum Subject<'a> {
    Text(&'a str),
    Time(DateTime<Utc>),
}

impl Candidate<'_> {
    fn subject(&self, target: Target) -> Option<Subject<'_>> {
        match target {
            Target::Field(id) => self
                .values
                .get(&id)
                .map(String::as_str)
                .filter(|v| !v.is_empty())
                .map(Subject::Text),
            Target::Property(property) => match property {
                ItemProperty::Title => Some(Subject::Text(&self.item.title)),
                ItemProperty::Slug => Some(Subject::Text(&self.item.slug)),
                ItemProperty::Status => Some(Subject::Text(self.item.status.as_str())),
                ItemProperty::CreatedAt => Some(Subject::Time(self.item.created_at)),
                ItemProperty::UpdatedAt => Some(Subject::Time(self.item.updated_at)),
                ItemProperty::PublishedAt => self.item.published_at.map(Subject::Time),
            },
        }
    }
}

impl Predicate {
    pub fn matches(&self, candidate: &Candidate<'_>) -> bool {
        let subject = candidate.subject(self.target);
        let operand = self.operand.as_deref().unwrap_or_default();

        let Some(subject) = subject else {
            return matches!(
                self.operator,
                FilterOperator::IsNull | FilterOperator::NotEquals | FilterOperator::NotIn
            );
        };

        let text = match &subject {
            Subject::Text(s) => (*s).to_string(),
            Subject::Time(t) => t.to_rfc3339(),
        };

        match self.operator {
            FilterOperator::IsNull => false,
            FilterOperator::IsNotNull => true,
            FilterOperator::Equals => equals(&subject, &text, operand),
            FilterOperator::NotEquals => !equals(&subject, &text, operand),
            FilterOperator::Contains => text.to_lowercase().contains(&operand.to_lowercase()),
            FilterOperator::StartsWith => text.to_lowercase().starts_with(&operand.to_lowercase()),
            FilterOperator::EndsWith => text.to_lowercase().ends_with(&operand.to_lowercase()),
            FilterOperator::GreaterThan => compare(&subject, &text, operand) == Ordering::Greater,
            FilterOperator::LessThan => compare(&subject, &text, operand) == Ordering::Less,
            FilterOperator::In => split_literals(operand).any(|v| v == text),
            FilterOperator::NotIn => !split_literals(operand).any(|v| v == text),
        }
    }
}

fn split_literals(operand: &str) -> impl Iterator<Item = &str> {
    operand.split(',').map(str::trim)
}

fn equals(subject: &Subject<'_>, text: &str, operand: &str) -> bool {
    match (subject, parse_instant(operand)) {
        (Subject::Time(t), Some(other)) => *t == other,
        _ => text == operand,
    }
}

fn compare(subject: &Subject<'_>, text: &str, operand: &str) -> Ordering {
    if let Subject::Time(t) = subject {
        if let Some(other) = parse_instant(operand) {
            return t.cmp(&other);
        }
    }
    match (parse_number(text), parse_number(operand)) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => text.cmp(operand),
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// RFC 3339 datetime or a bare date (midnight UTC)
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Resolve a filter to a predicate, or explain why it is malformed
pub fn compile_filter(filter: &QueryFilter, fields: &[FieldDefinition]) -> Result<Predicate, String> {
    let key = filter.field_key.as_deref().map(str::trim).filter(|k| !k.is_empty());
    let target = match (filter.field_id, key) {
        (Some(_), Some(_)) => return Err("both field_id and field_key are set".to_string()),
        (None, None) => return Err("one of field_id or field_key is required".to_string()),
        (Some(id), None) => {
            if !fields.iter().any(|f| f.id == id && f.parent_field_id.is_none()) {
                return Err(format!("field {id} does not belong to the queried content type"));
            }
            Target::Field(id)
        }
        (None, Some(key)) => Target::Property(key.parse::<ItemProperty>()?),
    };

    let needs_operand = !matches!(filter.operator, FilterOperator::IsNull | FilterOperator::IsNotNull);
    if needs_operand && filter.value.is_none() {
        return Err(format!("operator '{}' requires a value", filter.operator));
    }

    Ok(Predicate {
        target,
        operator: filter.operator,
        operand: filter.value.clone(),
    })
}

/// Compile a filter list; strict mode fails on the first malformed filter
pub fn compile_filters(
    filters: &[QueryFilter],
    fields: &[FieldDefinition],
    mode: EvaluationMode,
) -> Result<Selection, ContentError> {
    let mut buckets: Vec<Vec<Predicate>> = Vec::new();
    let mut groups: HashMap<&str, usize> = HashMap::new();

    for (position, filter) in filters.iter().enumerate() {
        let predicate = match compile_filter(filter, fields) {
            Ok(predicate) => predicate,
            Err(reason) => match mode {
                EvaluationMode::Strict => return Err(ContentError::MalformedFilter { position, reason }),
                EvaluationMode::BestEffort => {
                    tracing::warn!(position, %reason, "Skipping malformed content filter");
                    continue;
                }
            },
        };

        match filter.condition_group.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
            Some(group) => match groups.get(group) {
                Some(&index) => buckets[index].push(predicate),
                None => {
                    groups.insert(group, buckets.len());
                    buckets.push(vec![predicate]);
                }
            },
            None => buckets.push(vec![predicate]),
        }
    }

    Ok(Selection { buckets })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKey {
    Property(ItemProperty),
    Field(Uuid),
}

/// Resolve `order_by`: properties first, then top-level field slugs
pub fn resolve_order(
    order_by: Option<&str>,
    fields: &[FieldDefinition],
    mode: EvaluationMode,
) -> Result<OrderKey, ContentError> {
    let Some(key) = order_by.map(str::trim).filter(|k| !k.is_empty()) else {
        return Ok(OrderKey::Property(ItemProperty::CreatedAt));
    };

    if let Ok(property) = key.parse::<ItemProperty>() {
        return Ok(OrderKey::Property(property));
    }
    if let Some(field) = fields.iter().find(|f| f.slug == key && f.parent_field_id.is_none()) {
        return Ok(OrderKey::Field(field.id));
    }

    match mode {
        EvaluationMode::Strict => Err(ContentError::validation(
            "order_by",
            format!("Unknown order key '{key}'."),
        )),
        EvaluationMode::BestEffort => {
            tracing::warn!(order_by = key, "Unknown order key, falling back to created_at");
            Ok(OrderKey::Property(ItemProperty::CreatedAt))
        }
    }
}

fn sort_value<'a>(candidate: &'a Candidate<'_>, key: OrderKey) -> Option<Subject<'a>> {
    match key {
        OrderKey::Property(property) => candidate.subject(Target::Property(property)),
        OrderKey::Field(id) => candidate.subject(Target::Field(id)),
    }
}

fn cmp_subjects(a: Option<Subject<'_>>, b: Option<Subject<'_>>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Subject::Time(a)), Some(Subject::Time(b))) => a.cmp(&b),
        (Some(Subject::Text(a)), Some(Subject::Text(b))) => a.cmp(b),
        (Some(Subject::Time(_)), Some(Subject::Text(_))) => Ordering::Less,
        (Some(Subject::Text(_)), Some(Subject::Time(_))) => Ordering::Greater,
    }
}

/// Stored raw values of every candidate item, keyed by item id then field id
pub type StoredValues = HashMap<Uuid, HashMap<Uuid, Option<String>>>;

/// Evaluate a definition over live candidate items
pub fn evaluate(
    definition: &QueryDefinition,
    fields: &[FieldDefinition],
    items: &[ContentItem],
    stored: &StoredValues,
    mode: EvaluationMode,
) -> Result<Vec<ContentItem>, ContentError> {
    let selection = compile_filters(&definition.filters, fields, mode)?;
    let order = resolve_order(definition.order_by.as_deref(), fields, mode)?;
    let top_level: Vec<&FieldDefinition> = fields.iter().filter(|f| f.parent_field_id.is_none()).collect();

    let mut candidates: Vec<Candidate<'_>> = items
        .iter()
        .filter(|item| item.deleted_at.is_none())
        .map(|item| {
            let row = stored.get(&item.id);
            let values = top_level
                .iter()
                .filter_map(|field| {
                    let raw = row
                        .and_then(|r| r.get(&field.id))
                        .and_then(Clone::clone)
                        .or_else(|| field.default_value.clone());
                    raw.map(|raw| (field.id, raw))
                })
                .collect();
            Candidate { item, values }
        })
        .filter(|candidate| selection.matches(candidate))
        .collect();

    candidates.sort_by(|a, b| {
        let ordering = cmp_subjects(sort_value(a, order), sort_value(b, order))
            .then_with(|| a.item.id.cmp(&b.item.id));
        match definition.order_direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });

    let offset = usize::try_from(definition.offset).unwrap_or(usize::MAX);
    let limit = definition
        .limit
        .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

    Ok(candidates
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|c| c.item.clone())
        .collect())
}

// ===== Placement queries =====

/// Content query attached to a widget placement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementQuery {
    Saved(Uuid),
    Inline(QueryDefinition),
}

#[derive(Debug, Deserialize)]
struct PlacementQueryDoc {
    query_id: Option<Uuid>,
    content_type_id: Option<Uuid>,
    limit: Option<u64>,
    offset: Option<u64>,
    order_by: Option<String>,
    order_direction: Option<String>,
    #[serde(default)]
    filters: Vec<FilterDoc>,
}

#[derive(Debug, Deserialize)]
struct FilterDoc {
    field_id: Option<Uuid>,
    field_key: Option<String>,
    operator: String,
    value: Option<Value>,
    condition_group: Option<String>,
}

fn operand_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}

/// Parse a placement's `content_query` blob
pub fn parse_placement_query(blob: &Value, mode: EvaluationMode) -> Result<PlacementQuery, ContentError> {
    let doc: PlacementQueryDoc = serde_json::from_value(blob.clone()).map_err(|e| {
        ContentError::validation("content_query", format!("The content query is malformed: {e}."))
    })?;

    if let Some(query_id) = doc.query_id {
        return Ok(PlacementQuery::Saved(query_id));
    }

    let content_type_id = doc.content_type_id.ok_or_else(|| {
        ContentError::validation(
            "content_query.content_type_id",
            "The content query needs a query_id or a content_type_id.",
        )
    })?;

    let order_direction = match doc.order_direction.as_deref() {
        None => SortDirection::default(),
        Some(direction) => match direction.to_ascii_lowercase().parse::<SortDirection>() {
            Ok(direction) => direction,
            Err(e) if mode == EvaluationMode::Strict => {
                return Err(ContentError::validation("content_query.order_direction", e.to_string()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Unknown order direction, using default");
                SortDirection::default()
            }
        },
    };

    let mut filters = Vec::with_capacity(doc.filters.len());
    for (position, filter) in doc.filters.into_iter().enumerate() {
        let operator = match filter.operator.parse::<FilterOperator>() {
            Ok(operator) => operator,
            Err(e) => match mode {
                EvaluationMode::Strict => {
                    return Err(ContentError::MalformedFilter {
                        position,
                        reason: e.to_string(),
                    });
                }
                EvaluationMode::BestEffort => {
                    tracing::warn!(position, error = %e, "Skipping content filter with unknown operator");
                    continue;
                }
            },
        };
        filters.push(QueryFilter {
            field_id: filter.field_id,
            field_key: filter.field_key,
            operator,
            value: operand_text(filter.value),
            condition_group: filter.condition_group,
        });
    }

    Ok(PlacementQuery::Inline(QueryDefinition {
        content_type_id,
        limit: doc.limit,
        offset: doc.offset.unwrap_or(0),
        order_by: doc.order_by,
        order_direction,
        filters,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{ContentStatus, FieldOwner, FieldType};
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn field(owner: Uuid, slug: &str) -> FieldDefinition {
        FieldDefinition {
            id: Uuid::new_v4(),
            owner: FieldOwner::ContentType(owner),
            parent_field_id: None,
            name: slug.to_string(),
            slug: slug.to_string(),
            field_type: FieldType::Text,
            validation_rules: None,
            settings: Value::Null,
            default_value: None,
            is_required: false,
            is_unique: false,
            position: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(type_id: Uuid, title: &str, status: ContentStatus, age_minutes: i64) -> ContentItem {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let created = base - Duration::minutes(age_minutes);
        ContentItem {
            id: Uuid::new_v4(),
            content_type_id: type_id,
            title: title.to_string(),
            slug: title.to_lowercase(),
            status,
            published_at: (status == ContentStatus::Published).then_some(created),
            created_by: None,
            updated_by: None,
            created_at: created,
            updated_at: created,
            deleted_at: None,
        }
    }

    struct Fixture {
        type_id: Uuid,
        category: FieldDefinition,
        items: Vec<ContentItem>,
        stored: StoredValues,
    }

    fn fixture() -> Fixture {
        let type_id = Uuid::new_v4();
        let category = field(type_id, "category");
        let rows = [
            ("Alpha", ContentStatus::Published, "news", 40),
            ("Beta", ContentStatus::Published, "sports", 30),
            ("Gamma", ContentStatus::Draft, "news", 20),
            ("Delta", ContentStatus::Published, "weather", 10),
        ];
        let mut items = Vec::new();
        let mut stored = StoredValues::new();
        for (title, status, cat, age) in rows {
            let item = item(type_id, title, status, age);
            stored.insert(item.id, HashMap::from([(category.id, Some(cat.to_string()))]));
            items.push(item);
        }
        Fixture {
            type_id,
            category,
            items,
            stored,
        }
    }

    fn titles(items: &[ContentItem]) -> Vec<&str> {
        items.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn test_and_of_or_groups() {
        let f = fixture();
        let def = QueryDefinition::for_type(f.type_id)
            .with_filter(QueryFilter::on_property("status", FilterOperator::Equals, "published"))
            .with_filter(QueryFilter::on_field(f.category.id, FilterOperator::Equals, "news").in_group("cat"))
            .with_filter(QueryFilter::on_field(f.category.id, FilterOperator::Equals, "sports").in_group("cat"))
            .order_by("title", SortDirection::Asc);

        let result = evaluate(&def, &[f.category.clone()], &f.items, &f.stored, EvaluationMode::Strict).unwrap();
        assert_eq!(titles(&result), vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_ungrouped_filters_are_anded() {
        let f = fixture();
        let def = QueryDefinition::for_type(f.type_id)
            .with_filter(QueryFilter::on_field(f.category.id, FilterOperator::Equals, "news"))
            .with_filter(QueryFilter::on_field(f.category.id, FilterOperator::Equals, "sports"));
        let result = evaluate(&def, &[f.category.clone()], &f.items, &f.stored, EvaluationMode::Strict).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_empty_filters_select_all_newest_first() {
        let f = fixture();
        let def = QueryDefinition::for_type(f.type_id);
        let result = evaluate(&def, &[], &f.items, &f.stored, EvaluationMode::Strict).unwrap();
        assert_eq!(titles(&result), vec!["Delta", "Gamma", "Beta", "Alpha"]);
    }

    #[test]
    fn test_limit_offset_after_ordering() {
        let f = fixture();
        let def = QueryDefinition::for_type(f.type_id)
            .order_by("title", SortDirection::Asc)
            .paginate(2, 1);
        let result = evaluate(&def, &[], &f.items, &f.stored, EvaluationMode::Strict).unwrap();
        assert_eq!(titles(&result), vec!["Beta", "Delta"]);
    }

    #[test]
    fn test_operators() {
        let f = fixture();
        let fields = [f.category.clone()];
        let run = |filter: QueryFilter| {
            let def = QueryDefinition::for_type(f.type_id)
                .with_filter(filter)
                .order_by("title", SortDirection::Asc);
            titles(&evaluate(&def, &fields, &f.items, &f.stored, EvaluationMode::Strict).unwrap())
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        };

        assert_eq!(run(QueryFilter::on_property("title", FilterOperator::Contains, "LT")), vec!["Delta"]);
        assert_eq!(run(QueryFilter::on_property("title", FilterOperator::StartsWith, "g")), vec!["Gamma"]);
        assert_eq!(run(QueryFilter::on_property("slug", FilterOperator::EndsWith, "A")).len(), 4);
        assert_eq!(
            run(QueryFilter::on_field(f.category.id, FilterOperator::In, "news , weather")),
            vec!["Alpha", "Delta", "Gamma"]
        );
        assert_eq!(
            run(QueryFilter::on_field(f.category.id, FilterOperator::NotIn, "news,weather")),
            vec!["Beta"]
        );
        assert_eq!(
            run(QueryFilter::on_property("created_at", FilterOperator::GreaterThan, "2024-01-01T11:35:00Z")),
            vec!["Delta", "Gamma"]
        );
        assert_eq!(
            run(QueryFilter::on_property("published_at", FilterOperator::LessThan, "2030-01-01")),
            vec!["Alpha", "Beta", "Delta"]
        );
    }

    #[test]
    fn test_null_operators_and_defaults() {
        let type_id = Uuid::new_v4();
        let mut rating = field(type_id, "rating");
        let subtitle = field(type_id, "subtitle");
        rating.default_value = Some("3".into());

        let a = item(type_id, "A", ContentStatus::Draft, 2);
        let b = item(type_id, "B", ContentStatus::Draft, 1);
        let stored = StoredValues::from([
            (a.id, HashMap::from([(rating.id, Some("10".to_string())), (subtitle.id, Some(String::new()))])),
            (b.id, HashMap::from([(subtitle.id, Some("Hello".to_string()))])),
        ]);
        let fields = [rating.clone(), subtitle.clone()];
        let items = [a, b];

        let mut null_filter = QueryFilter::on_field(subtitle.id, FilterOperator::IsNull, "");
        null_filter.value = None;
        let def = QueryDefinition::for_type(type_id).with_filter(null_filter);
        let result = evaluate(&def, &fields, &items, &stored, EvaluationMode::Strict).unwrap();
        assert_eq!(titles(&result), vec!["A"]);

        // Numeric comparison: "10" > "9" numerically, and B falls back to default "3"
        let def = QueryDefinition::for_type(type_id)
            .with_filter(QueryFilter::on_field(rating.id, FilterOperator::GreaterThan, "9"));
        let result = evaluate(&def, &fields, &items, &stored, EvaluationMode::Strict).unwrap();
        assert_eq!(titles(&result), vec!["A"]);

        let def = QueryDefinition::for_type(type_id)
            .with_filter(QueryFilter::on_field(rating.id, FilterOperator::Equals, "3"));
        let result = evaluate(&def, &fields, &items, &stored, EvaluationMode::Strict).unwrap();
        assert_eq!(titles(&result), vec!["B"]);
    }

    #[test]
    fn test_missing_value_fails_comparisons() {
        let type_id = Uuid::new_v4();
        let rating = field(type_id, "rating");
        let a = item(type_id, "A", ContentStatus::Draft, 1);
        let def = QueryDefinition::for_type(type_id)
            .with_filter(QueryFilter::on_field(rating.id, FilterOperator::LessThan, "100"));
        let result = evaluate(&def, &[rating], &[a], &StoredValues::new(), EvaluationMode::Strict).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_malformed_filters_by_mode() {
        let f = fixture();
        let mut both = QueryFilter::on_field(f.category.id, FilterOperator::Equals, "news");
        both.field_key = Some("title".into());
        let foreign = QueryFilter::on_field(Uuid::new_v4(), FilterOperator::Equals, "x");
        let unknown_key = QueryFilter::on_property("colour", FilterOperator::Equals, "red");

        for filter in [both, foreign, unknown_key] {
            let def = QueryDefinition::for_type(f.type_id).with_filter(filter);
            let fields = [f.category.clone()];
            let err = evaluate(&def, &fields, &f.items, &f.stored, EvaluationMode::Strict).unwrap_err();
            assert!(matches!(err, ContentError::MalformedFilter { position: 0, .. }));

            let all = evaluate(&def, &fields, &f.items, &f.stored, EvaluationMode::BestEffort).unwrap();
            assert_eq!(all.len(), 4);
        }
    }

    #[test]
    fn test_unknown_order_by_by_mode() {
        let f = fixture();
        let def = QueryDefinition::for_type(f.type_id).order_by("nope", SortDirection::Asc);
        assert!(matches!(
            evaluate(&def, &[], &f.items, &f.stored, EvaluationMode::Strict),
            Err(ContentError::Validation { .. })
        ));
        let result = evaluate(&def, &[], &f.items, &f.stored, EvaluationMode::BestEffort).unwrap();
        assert_eq!(titles(&result), vec!["Alpha", "Beta", "Gamma", "Delta"]);
    }

    #[test]
    fn test_order_by_field_missing_first_ascending() {
        let f = fixture();
        let mut items = f.items.clone();
        let extra = item(f.type_id, "Zeta", ContentStatus::Draft, 5);
        items.push(extra);
        let def = QueryDefinition::for_type(f.type_id).order_by("category", SortDirection::Asc);
        let result = evaluate(&def, &[f.category.clone()], &items, &f.stored, EvaluationMode::Strict).unwrap();
        assert_eq!(result[0].title, "Zeta");
        assert_eq!(result.last().map(|i| i.title.as_str()), Some("Delta"));
    }

    #[test]
    fn test_soft_deleted_items_are_excluded() {
        let f = fixture();
        let mut items = f.items.clone();
        items[0].deleted_at = Some(Utc::now());
        let result = evaluate(&QueryDefinition::for_type(f.type_id), &[], &items, &f.stored, EvaluationMode::Strict).unwrap();
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_parse_placement_queries() {
        let saved_id = Uuid::new_v4();
        assert_eq!(
            parse_placement_query(&json!({"query_id": saved_id}), EvaluationMode::Strict).unwrap(),
            PlacementQuery::Saved(saved_id)
        );

        let type_id = Uuid::new_v4();
        let inline = json!({
            "content_type_id": type_id,
            "limit": 3,
            "order_by": "title",
            "order_direction": "ASC",
            "filters": [
                {"field_key": "status", "operator": "in", "value": ["published", "archived"]},
                {"field_key": "title", "operator": "sounds_like", "value": "x"}
            ]
        });
        assert!(matches!(
            parse_placement_query(&inline, EvaluationMode::Strict),
            Err(ContentError::MalformedFilter { position: 1, .. })
        ));

        let PlacementQuery::Inline(def) = parse_placement_query(&inline, EvaluationMode::BestEffort).unwrap() else {
            panic!("expected inline query");
        };
        assert_eq!(def.content_type_id, type_id);
        assert_eq!(def.limit, Some(3));
        assert_eq!(def.order_direction, SortDirection::Asc);
        assert_eq!(def.filters.len(), 1);
        assert_eq!(def.filters[0].value.as_deref(), Some("published,archived"));

        assert!(parse_placement_query(&json!({"limit": 2}), EvaluationMode::BestEffort).is_err());
        assert!(parse_placement_query(&json!("nope"), EvaluationMode::BestEffort).is_err());
    }
}
