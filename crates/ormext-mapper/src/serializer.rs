//! Typed, recursive serialization of records to JSON structures.
//!
//! Field values are coerced by their declared type. Relations are followed
//! only through slots that are already loaded, so output depth is bounded
//! by what the caller populated.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use ormext_core::{
    EntityDef, Existence, FieldType, MetadataProvider, Record, RecordCollection, RelationKind,
    RelationSlot, Result, TimestampError, Value,
};
use serde_json::{Map, Value as JsonValue};

use crate::change_tracker::is_changed;
use crate::config::MapperConfig;

/// Options for [`Serializer::to_array_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToArrayOptions {
    /// Emit only fields that differ from the snapshot.
    pub only_changed: bool,
    /// Coerce field values by declared type.
    pub cast: bool,
}

impl Default for ToArrayOptions {
    fn default() -> Self {
        Self {
            only_changed: false,
            cast: true,
        }
    }
}

impl ToArrayOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn only_changed(mut self, value: bool) -> Self {
        self.only_changed = value;
        self
    }

    #[must_use]
    pub fn cast(mut self, value: bool) -> Self {
        self.cast = value;
        self
    }
}

/// Layouts accepted for stored timestamps without an explicit offset.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Converts records into `serde_json` objects.
#[derive(Clone, Copy)]
pub struct Serializer<'a> {
    metadata: &'a dyn MetadataProvider,
    config: &'a MapperConfig,
}

impl std::fmt::Debug for Serializer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Serializer")
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}

impl<'a> Serializer<'a> {
    pub fn new(metadata: &'a dyn MetadataProvider, config: &'a MapperConfig) -> Self {
        Self { metadata, config }
    }

    /// Serialize `record` with default options.
    pub fn to_array(&self, record: &Record) -> Result<JsonValue> {
        self.to_array_with(record, ToArrayOptions::default())
    }

    /// Serialize `record` and its loaded relations.
    ///
    /// An unknown entity type yields an empty object, or an error in strict
    /// mode.
    #[tracing::instrument(level = "trace", skip(self, record), fields(entity = record.entity()))]
    pub fn to_array_with(&self, record: &Record, options: ToArrayOptions) -> Result<JsonValue> {
        let def = match self.metadata.require(record.entity()) {
            Ok(def) => *def,
            Err(err) if self.config.strict => return Err(err),
            Err(err) => {
                tracing::debug!(error = %err, "Serializing unknown entity as empty object");
                return Ok(JsonValue::Object(Map::new()));
            }
        };

        let mut out = Map::new();
        self.write_fields(&def, record, options, &mut out);
        self.write_relations(&def, record, options, &mut out)?;
        Ok(JsonValue::Object(out))
    }

    /// Serialize every member of `collection` into an array.
    pub fn all_to_array(&self, collection: &RecordCollection) -> Result<JsonValue> {
        self.all_to_array_with(collection, ToArrayOptions::default())
    }

    pub fn all_to_array_with(
        &self,
        collection: &RecordCollection,
        options: ToArrayOptions,
    ) -> Result<JsonValue> {
        collection
            .iter()
            .map(|record| self.to_array_with(record, options))
            .collect::<Result<Vec<_>>>()
            .map(JsonValue::Array)
    }

    /// Interpret a stored timestamp in the source zone and render it as an
    /// ISO-8601 UTC string.
    ///
    /// `Ok(None)` for NULL, empty and zero-sentinel values.
    pub fn try_timestamp(&self, field: &str, value: &Value) -> Result<Option<String>> {
        let raw = value.normalize();
        let raw = raw.trim();
        if raw.is_empty() || raw == self.config.zero_timestamp {
            return Ok(None);
        }

        let parsed = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            Some(dt.with_timezone(&Utc))
        } else {
            let naive = NAIVE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .or_else(|| {
                    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                });
            naive.and_then(|n| {
                self.config
                    .source_offset
                    .from_local_datetime(&n)
                    .single()
                    .map(|dt| dt.with_timezone(&Utc))
            })
        };

        parsed
            .map(|dt| Some(dt.to_rfc3339_opts(SecondsFormat::Secs, false)))
            .ok_or_else(|| {
                TimestampError {
                    field: field.to_string(),
                    value: raw.to_string(),
                    message: "unrecognized date/time layout".to_string(),
                }
                .into()
            })
    }

    fn timestamp(&self, field: &str, value: &Value) -> JsonValue {
        match self.try_timestamp(field, value) {
            Ok(Some(iso)) => JsonValue::String(iso),
            Ok(None) => JsonValue::Null,
            Err(err) => {
                tracing::warn!(error = %err, "Timestamp left empty");
                JsonValue::String(String::new())
            }
        }
    }

    fn write_fields(
        &self,
        def: &EntityDef,
        record: &Record,
        options: ToArrayOptions,
        out: &mut Map<String, JsonValue>,
    ) {
        for field in def.fields {
            let name = field.name;
            if record.hides(def, name) || (options.only_changed && !is_changed(record, name)) {
                continue;
            }
            let value = record.value(name);
            let json = if options.cast {
                self.coerce(name, field.field_type, value)
            } else {
                value.to_json()
            };
            out.insert(name.to_string(), json);
        }
    }

    fn coerce(&self, name: &str, field_type: FieldType, value: &Value) -> JsonValue {
        match field_type {
            FieldType::Integer => JsonValue::from(value.to_int()),
            FieldType::Float => serde_json::Number::from_f64(value.to_float())
                .map_or(JsonValue::Null, JsonValue::Number),
            FieldType::Boolean => JsonValue::Bool(value.truthy()),
            FieldType::String => JsonValue::String(value.normalize()),
            FieldType::Timestamp => self.timestamp(name, value),
            FieldType::Opaque => value.to_json(),
        }
    }

    fn write_relations(
        &self,
        def: &EntityDef,
        record: &Record,
        options: ToArrayOptions,
        out: &mut Map<String, JsonValue>,
    ) -> Result<()> {
        for relation in def.relations {
            let Some(slot) = record.relation(relation.name) else {
                continue;
            };
            if !slot.exists() {
                continue;
            }
            let json = match (relation.kind, slot) {
                (RelationKind::HasOne, RelationSlot::One(related)) => {
                    self.to_array_with(related, options)?
                }
                (RelationKind::HasMany, RelationSlot::Many(related)) => {
                    self.all_to_array_with(related, options)?
                }
                _ => {
                    tracing::debug!(relation = relation.name, "Slot shape does not match relation kind");
                    continue;
                }
            };
            out.insert(relation.output_key(), json);
        }
        Ok(())
    }
}
