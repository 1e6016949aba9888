//! Idempotent lookup and create-or-update.

use std::collections::HashSet;

use serde_json::Value;

use relkit_core::config::UpsertConfig;
use relkit_core::entity::{is_null_value, Condition, Entity, Filter, Values};
use relkit_core::errors::{RelkitError, RelkitResult};
use relkit_core::schema::EntityType;
use relkit_core::traits::IEntityStorage;
use relkit_observability::{events, upsert_span};

use crate::fields::{assignable_field, filter_field_dict, JOIN_SEPARATOR};
use crate::queryset::QuerySet;

/// Switches for `get_if_exists` and `create_or_update`.
#[derive(Debug, Clone)]
pub struct UpsertOptions {
    /// OR the criteria together instead of AND.
    pub match_any: bool,
    /// Keep null criteria and match them against NULL.
    pub search_nulls: bool,
    /// Write null values instead of skipping them.
    pub save_nulls: bool,
    pub empty_lists_are_null: bool,
    /// On update, only fill fields that are currently null.
    pub only_update_existing_nulls: bool,
    /// List criteria match by overlap; list updates append missing elements.
    pub allow_list_overlaps: bool,
    /// Skip the lookup and always create.
    pub force_create: bool,
}

impl From<&UpsertConfig> for UpsertOptions {
    fn from(config: &UpsertConfig) -> Self {
        Self {
            match_any: false,
            search_nulls: config.search_nulls,
            save_nulls: config.save_nulls,
            empty_lists_are_null: config.empty_lists_are_null,
            only_update_existing_nulls: false,
            allow_list_overlaps: false,
            force_create: false,
        }
    }
}

impl Default for UpsertOptions {
    fn default() -> Self {
        Self::from(&UpsertConfig::default())
    }
}

impl UpsertOptions {
    pub fn match_any(mut self) -> Self {
        self.match_any = true;
        self
    }

    pub fn search_nulls(mut self) -> Self {
        self.search_nulls = true;
        self
    }

    pub fn save_nulls(mut self) -> Self {
        self.save_nulls = true;
        self
    }

    pub fn empty_lists_are_null(mut self, value: bool) -> Self {
        self.empty_lists_are_null = value;
        self
    }

    pub fn only_update_existing_nulls(mut self) -> Self {
        self.only_update_existing_nulls = true;
        self
    }

    pub fn allow_list_overlaps(mut self) -> Self {
        self.allow_list_overlaps = true;
        self
    }

    pub fn force_create(mut self) -> Self {
        self.force_create = true;
        self
    }
}

/// The single entity in `queryset` matching `criteria`, if any.
///
/// Null criteria are dropped unless `search_nulls`. No criteria left means no
/// match. More than one match is a `MultipleObjectsReturned` error.
pub fn get_if_exists<S: IEntityStorage>(
    queryset: &QuerySet<'_, S>,
    criteria: &Values,
    options: &UpsertOptions,
) -> RelkitResult<Option<Entity>> {
    let search = filter_field_dict(
        criteria,
        !options.search_nulls,
        options.empty_lists_are_null,
        false,
    );
    if search.is_empty() {
        return Ok(None);
    }

    let conditions = search
        .into_iter()
        .map(|(key, value)| {
            lookup_condition(
                queryset.storage(),
                queryset.entity_type(),
                &key,
                value,
                options.allow_list_overlaps,
            )
        })
        .collect::<RelkitResult<Vec<Condition>>>()?;
    let lookup = if options.match_any {
        Filter::or(conditions)
    } else {
        Filter::and(conditions)
    };

    let mut matches = queryset
        .storage()
        .filter(queryset.entity_type(), &lookup)?;
    if !queryset.filter().is_empty() {
        let scope: HashSet<i64> = queryset.pks()?.into_iter().collect();
        matches.retain(|e| scope.contains(&e.pk));
    }

    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.into_iter().next()),
        count => {
            tracing::error!(
                entity_type = %queryset.entity_type(),
                count = count,
                lookup = ?lookup,
                "get_if_exists matched multiple rows"
            );
            Err(RelkitError::MultipleObjectsReturned {
                entity_type: queryset.entity_type().to_string(),
                count,
            })
        }
    }
}

/// Ensure an entity matching `criteria` exists and carries `updates`.
///
/// Looks the entity up with `get_if_exists` (skipped under `force_create`).
/// A miss creates it from `criteria` plus `updates`; a hit applies `updates`
/// field by field. A uniqueness collision on create is retried once as a
/// lookup followed by an update.
pub fn create_or_update<S: IEntityStorage>(
    queryset: &QuerySet<'_, S>,
    criteria: &Values,
    updates: Option<&Values>,
    options: &UpsertOptions,
) -> RelkitResult<Entity> {
    let span = upsert_span!(queryset.entity_type());
    let _guard = span.enter();

    let existing = if options.force_create {
        None
    } else {
        get_if_exists(queryset, criteria, options)?
    };

    let (entity, created) = match existing {
        Some(existing) => match updates {
            Some(updates) => (update_object(queryset, existing, updates, options)?, false),
            None => (existing, false),
        },
        None => match create_object(queryset, criteria, updates, options) {
            Ok(entity) => (entity, true),
            Err(e) if e.is_unique_violation() => {
                events::unique_collision_retried(queryset.entity_type(), "lookup", &e.to_string());
                match get_if_exists(queryset, criteria, options)? {
                    Some(existing) => {
                        let updates = updates.cloned().unwrap_or_default();
                        (update_object(queryset, existing, &updates, options)?, false)
                    }
                    None => return Err(e),
                }
            }
            Err(e) => return Err(e),
        },
    };

    events::entity_upserted(&entity.reference(), created);
    Ok(entity)
}

/// Insert from `criteria` plus `updates`. Keys that are not assignable
/// fields are dropped, as are `__` joins and, unless `save_nulls`, nulls.
fn create_object<S: IEntityStorage>(
    queryset: &QuerySet<'_, S>,
    criteria: &Values,
    updates: Option<&Values>,
    options: &UpsertOptions,
) -> RelkitResult<Entity> {
    let model = queryset.model()?;
    let mut values = assignable(
        model,
        filter_field_dict(criteria, !options.save_nulls, options.empty_lists_are_null, true),
    );
    if let Some(updates) = updates {
        let updates = filter_field_dict(
            updates,
            !options.save_nulls,
            options.empty_lists_are_null,
            true,
        );
        for (field, value) in assignable(model, updates) {
            values.entry(field).or_insert(value);
        }
    }
    queryset.storage().create(queryset.entity_type(), &values)
}

/// Apply `updates` to `existing` and save it.
fn update_object<S: IEntityStorage>(
    queryset: &QuerySet<'_, S>,
    mut existing: Entity,
    updates: &Values,
    options: &UpsertOptions,
) -> RelkitResult<Entity> {
    let model = queryset.model()?;
    let updates = filter_field_dict(
        updates,
        !options.save_nulls,
        options.empty_lists_are_null,
        true,
    );

    for (key, value) in assignable(model, updates) {
        let Some(field) = model.field_by_attname(&key) else {
            continue;
        };
        if field.primary_key {
            continue;
        }
        let current = existing.get(&field.name);
        if options.only_update_existing_nulls
            && !is_null_value(&current, options.empty_lists_are_null)
        {
            continue;
        }
        let merged = match (current, value) {
            (Value::Array(mut items), Value::Array(incoming)) if options.allow_list_overlaps => {
                for item in incoming {
                    if !items.contains(&item) {
                        items.push(item);
                    }
                }
                Value::Array(items)
            }
            (_, value) => value,
        };
        existing.set(&field.name, merged);
    }

    queryset.storage().save(&existing)?;
    queryset.storage().refresh(&mut existing)?;
    Ok(existing)
}

/// One lookup criterion as a filter condition. A `relation__rest` key follows
/// a foreign key column and matches the related entities selected by `rest`.
fn lookup_condition<S: IEntityStorage>(
    storage: &S,
    entity_type: &str,
    key: &str,
    value: Value,
    allow_list_overlaps: bool,
) -> RelkitResult<Condition> {
    let Some((relation, rest)) = key.split_once(JOIN_SEPARATOR) else {
        return Ok(match value {
            Value::Array(items) if allow_list_overlaps => {
                Condition::Overlap(key.to_string(), items)
            }
            value => Condition::Exact(key.to_string(), value),
        });
    };

    let field = storage.schema().field(entity_type, relation)?;
    let related_type = match field.related_type() {
        Some(related) if field.is_foreign_key_column() => related,
        _ => {
            return Err(RelkitError::ValidationError {
                reason: format!("cannot join through '{relation}' on {entity_type}"),
            })
        }
    };
    let inner = lookup_condition(storage, related_type, rest, value, allow_list_overlaps)?;
    let pks = storage.pks(related_type, &Filter::and(vec![inner]))?;
    Ok(Condition::In(
        field.name.clone(),
        pks.into_iter().map(Value::from).collect(),
    ))
}

fn assignable(model: &EntityType, values: Values) -> Values {
    values
        .into_iter()
        .filter(|(key, _)| assignable_field(model, key).is_some())
        .collect()
}
