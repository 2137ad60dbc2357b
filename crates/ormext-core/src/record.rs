//! Records: one persisted or transient entity instance.

use std::collections::{BTreeMap, BTreeSet};

use crate::collection::RecordCollection;
use crate::entity::EntityDef;
use crate::value::Value;

/// Field name to value mapping, as sent to and returned by providers.
pub type FieldMap = BTreeMap<String, Value>;

/// Shared "exists / count" capability of single records and collections.
///
/// Cascade and serialization code only needs these two questions answered,
/// so a has-one slot and a has-many slot can be checked the same way.
pub trait Existence {
    /// A record exists when it has a positive id; a collection exists when
    /// it has members.
    fn exists(&self) -> bool;

    /// 1 or 0 for a record, member count for a collection.
    fn count(&self) -> usize;
}

/// A loaded relation slot on a record.
///
/// Slots own their contents for the current unit of work. A slot that has
/// not been loaded is simply absent from the record.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationSlot {
    /// A single related record (has-one side).
    One(Box<Record>),
    /// A collection of related records (has-many side).
    Many(RecordCollection),
}

impl RelationSlot {
    pub fn as_one(&self) -> Option<&Record> {
        match self {
            RelationSlot::One(rec) => Some(rec),
            RelationSlot::Many(_) => None,
        }
    }

    pub fn as_many(&self) -> Option<&RecordCollection> {
        match self {
            RelationSlot::Many(coll) => Some(coll),
            RelationSlot::One(_) => None,
        }
    }
}

impl Existence for RelationSlot {
    fn exists(&self) -> bool {
        match self {
            RelationSlot::One(rec) => rec.exists(),
            RelationSlot::Many(coll) => coll.exists(),
        }
    }

    fn count(&self) -> usize {
        match self {
            RelationSlot::One(rec) => rec.count(),
            RelationSlot::Many(coll) => coll.count(),
        }
    }
}

impl From<Record> for RelationSlot {
    fn from(rec: Record) -> Self {
        RelationSlot::One(Box::new(rec))
    }
}

impl From<RecordCollection> for RelationSlot {
    fn from(coll: RecordCollection) -> Self {
        RelationSlot::Many(coll)
    }
}

/// One entity instance: typed field values, a change-detection snapshot,
/// per-instance hidden fields and loaded relation slots.
///
/// The id lives in the `"id"` field; a record without a positive id is
/// transient.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    entity: String,
    fields: FieldMap,
    stored: BTreeMap<String, String>,
    hidden: BTreeSet<String>,
    /// Type-level hidden fields this instance exposes anyway.
    unhidden: BTreeSet<String>,
    relations: BTreeMap<String, RelationSlot>,
}

impl Record {
    /// Create a transient record of the given entity type.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            fields: FieldMap::new(),
            stored: BTreeMap::new(),
            hidden: BTreeSet::new(),
            unhidden: BTreeSet::new(),
            relations: BTreeMap::new(),
        }
    }

    /// Create a transient record starting with the definition's hidden
    /// fields.
    pub fn of(def: &EntityDef) -> Self {
        let mut rec = Self::new(def.name);
        rec.hidden = def.hidden.iter().map(|h| (*h).to_string()).collect();
        rec
    }

    /// Create a record from a row loaded from the store.
    ///
    /// The snapshot is captured from every column of the row.
    pub fn loaded(def: &EntityDef, row: FieldMap) -> Self {
        let mut rec = Self::of(def);
        rec.stored = row.iter().map(|(k, v)| (k.clone(), v.normalize())).collect();
        rec.fields = row;
        rec
    }

    /// Builder-style [`Record::set`].
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Entity type name.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// The positive id, if this record is persisted.
    pub fn id(&self) -> Option<i64> {
        self.fields
            .get("id")
            .and_then(Value::as_i64)
            .filter(|id| *id > 0)
    }

    /// Set the id field.
    pub fn set_id(&mut self, id: i64) {
        self.fields.insert("id".to_string(), Value::BigInt(id));
    }

    /// Get a field value. Unset fields read as `None`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Get a field value, treating unset as NULL.
    pub fn value(&self, field: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.fields.get(field).unwrap_or(&NULL)
    }

    /// Assign a field value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// All assigned fields.
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Stored (snapshot) value of a field, string-normalized.
    pub fn stored(&self, field: &str) -> Option<&str> {
        self.stored.get(field).map(String::as_str)
    }

    /// The full snapshot.
    pub fn snapshot(&self) -> &BTreeMap<String, String> {
        &self.stored
    }

    /// Recapture the snapshot for the given fields from the current values.
    ///
    /// Only load and successful save call this; field assignment never
    /// touches the snapshot.
    pub fn capture_snapshot<'a>(&mut self, fields: impl IntoIterator<Item = &'a str>) {
        for field in fields {
            let normalized = self.value(field).normalize();
            self.stored.insert(field.to_string(), normalized);
        }
    }

    /// Exclude a field from serialization.
    pub fn hide(&mut self, field: impl Into<String>) {
        let field = field.into();
        self.unhidden.remove(&field);
        self.hidden.insert(field);
    }

    /// Include a hidden field in serialization again, overriding the
    /// entity type's hidden list too.
    pub fn unhide(&mut self, field: &str) {
        self.hidden.remove(field);
        self.unhidden.insert(field.to_string());
    }

    /// Is `field` hidden on this instance?
    ///
    /// Only sees the type's hidden list if the record was built from its
    /// definition; use [`Record::hides`] when the definition is at hand.
    pub fn is_hidden(&self, field: &str) -> bool {
        self.hidden.contains(field)
    }

    /// Is `field` hidden, given the record's entity definition?
    ///
    /// Fields listed in `def.hidden` stay hidden unless this instance
    /// unhid them, however the record was constructed.
    pub fn hides(&self, def: &EntityDef, field: &str) -> bool {
        self.hidden.contains(field)
            || (def.hidden.iter().any(|h| *h == field) && !self.unhidden.contains(field))
    }

    /// Get a loaded relation slot.
    pub fn relation(&self, name: &str) -> Option<&RelationSlot> {
        self.relations.get(name)
    }

    pub fn relation_mut(&mut self, name: &str) -> Option<&mut RelationSlot> {
        self.relations.get_mut(name)
    }

    /// Store a loaded relation slot under the relation's simple name.
    pub fn set_relation(&mut self, name: impl Into<String>, slot: impl Into<RelationSlot>) {
        self.relations.insert(name.into(), slot.into());
    }

    /// Drop a loaded relation slot, returning it.
    pub fn unset_relation(&mut self, name: &str) -> Option<RelationSlot> {
        self.relations.remove(name)
    }

    /// Names of all loaded relation slots.
    pub fn loaded_relations(&self) -> impl Iterator<Item = &str> {
        self.relations.keys().map(String::as_str)
    }
}

impl Existence for Record {
    fn exists(&self) -> bool {
        self.id().is_some()
    }

    fn count(&self) -> usize {
        usize::from(self.exists())
    }
}
