//! The `Mapper` facade: one entry point over the mapper components.

use std::sync::Arc;

use ormext_core::{
    EntityEvents, Existence, MetadataProvider, PersistenceProvider, Record, RecordCollection,
    Result, Table,
};
use serde_json::Value as JsonValue;

use crate::change_tracker::ChangeTracker;
use crate::config::MapperConfig;
use crate::context::MapperContext;
use crate::events::EventRegistry;
use crate::persist::Persister;
use crate::relation::{RelatedRef, RelationResolver};
use crate::serializer::{Serializer, ToArrayOptions};

/// Saves, deletes, tracks and serializes records.
///
/// The metadata and persistence providers are injected and only borrowed;
/// records are passed in explicitly and never retained.
///
/// # Example
///
/// ```
/// use ormext_core::{EntityDef, Existence, FieldDef, LazyRegistry, SchemaRegistry};
/// use ormext_mapper::Mapper;
/// use ormext_memory::MemoryStore;
///
/// static ORDER_FIELDS: [FieldDef; 2] = [FieldDef::integer("id"), FieldDef::float("total")];
///
/// fn build() -> SchemaRegistry {
///     SchemaRegistry::new().with(EntityDef::new("Order", "orders").fields(&ORDER_FIELDS))
/// }
///
/// static SCHEMA: LazyRegistry = LazyRegistry::new(build);
///
/// # fn main() -> ormext_core::Result<()> {
/// let store = MemoryStore::new();
/// let mapper = Mapper::new(&SCHEMA, &store);
///
/// let mut order = mapper.create("Order")?.with("total", 9.5);
/// mapper.save(&mut order)?;
/// assert!(order.exists());
/// assert_eq!(store.row_count("orders"), 1);
/// # Ok(())
/// # }
/// ```
pub struct Mapper<'a> {
    metadata: &'a dyn MetadataProvider,
    store: &'a dyn PersistenceProvider,
    config: MapperConfig,
    events: EventRegistry,
}

impl<'a> Mapper<'a> {
    /// Create a mapper with the default configuration.
    pub fn new(metadata: &'a dyn MetadataProvider, store: &'a dyn PersistenceProvider) -> Self {
        Self {
            metadata,
            store,
            config: MapperConfig::default(),
            events: EventRegistry::new(),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Register post-operation hooks for `entity`.
    pub fn register_events(&mut self, entity: impl Into<String>, hooks: impl EntityEvents + 'static) {
        self.events.register(entity, Arc::new(hooks));
    }

    /// Register hooks that are also held elsewhere.
    pub fn register_shared_events(&mut self, entity: impl Into<String>, hooks: Arc<dyn EntityEvents>) {
        self.events.register(entity, hooks);
    }

    pub fn context(&self) -> MapperContext<'_> {
        MapperContext {
            metadata: self.metadata,
            store: self.store,
            config: &self.config,
            events: &self.events,
        }
    }

    pub fn change_tracker(&self) -> ChangeTracker<'_> {
        ChangeTracker::new(self.metadata)
    }

    pub fn resolver(&self) -> RelationResolver<'_> {
        RelationResolver::new(self.context())
    }

    pub fn serializer(&self) -> Serializer<'_> {
        Serializer::new(self.metadata, &self.config)
    }

    fn persister(&self) -> Persister<'_> {
        Persister::new(self.context())
    }

    /// Raw operations on a named table.
    pub fn table<'t>(&'t self, name: &'t str) -> Table<'t> {
        Table::new(self.store, name)
    }

    /// A transient record of type `entity`, with the type's hidden fields.
    ///
    /// Unknown types get a bare record (or an error in strict mode).
    pub fn create(&self, entity: &str) -> Result<Record> {
        match self.metadata.require(entity) {
            Ok(def) => Ok(Record::of(def)),
            Err(err) if self.config.strict => Err(err),
            Err(_) => Ok(Record::new(entity)),
        }
    }

    // ==================== Loading ====================

    /// Load the record of type `entity` with `id`.
    pub fn find(&self, entity: &str, id: i64) -> Result<Option<Record>> {
        self.persister().find(entity, id)
    }

    /// Refresh `record` in place from the store.
    pub fn reload(&self, record: &mut Record) -> Result<bool> {
        self.persister().reload(record)
    }

    // ==================== Saving ====================

    /// Insert or update `record`; a transient record receives its id.
    pub fn save(&self, record: &mut Record) -> Result<bool> {
        self.persister().save(record)
    }

    /// Link `owner` to `related`, if `related` is persisted.
    pub fn save_related(
        &self,
        owner: &mut Record,
        related: &mut Record,
        name: Option<&str>,
    ) -> Result<bool> {
        if !related.exists() {
            tracing::debug!(related = related.entity(), "Related record not persisted, nothing to link");
            return Ok(false);
        }
        self.save_relation(owner, related, name)
    }

    /// Link `owner` to `related` under the relation `name` (default: the
    /// related entity type).
    pub fn save_relation(
        &self,
        owner: &mut Record,
        related: &mut Record,
        name: Option<&str>,
    ) -> Result<bool> {
        self.resolver().save_relation(owner, related, name)
    }

    // ==================== Deleting ====================

    /// Primary delete (soft or hard) of a persisted record.
    pub fn delete(&self, record: &mut Record) -> Result<bool> {
        self.persister().delete(record)
    }

    /// Sever `owner`'s link to `related`, if `owner` is persisted.
    pub fn delete_related<'r>(
        &self,
        owner: &mut Record,
        related: impl Into<RelatedRef<'r>>,
        name: Option<&str>,
    ) -> Result<bool> {
        if !owner.exists() {
            tracing::debug!(owner = owner.entity(), "Owner not persisted, nothing to sever");
            return Ok(false);
        }
        self.delete_relation(owner, related, name)
    }

    /// Sever `owner`'s link to a related record, or to every record of a
    /// related type.
    pub fn delete_relation<'r>(
        &self,
        owner: &mut Record,
        related: impl Into<RelatedRef<'r>>,
        name: Option<&str>,
    ) -> Result<bool> {
        self.resolver().delete_relation(owner, related.into(), name)
    }

    /// Primary delete of every member of `collection`.
    pub fn delete_all(&self, collection: &mut RecordCollection) -> Result<usize> {
        self.persister().delete_all(collection)
    }

    // ==================== Change tracking ====================

    pub fn has_change(&self, record: &Record) -> bool {
        self.change_tracker().has_change(record)
    }

    pub fn try_has_change(&self, record: &Record) -> Result<bool> {
        self.change_tracker().try_has_change(record)
    }

    pub fn reset_stored_fields(&self, record: &mut Record) -> bool {
        self.change_tracker().reset_stored_fields(record)
    }

    // ==================== Serialization ====================

    pub fn to_array(&self, record: &Record) -> Result<JsonValue> {
        self.serializer().to_array(record)
    }

    pub fn to_array_with(&self, record: &Record, options: ToArrayOptions) -> Result<JsonValue> {
        self.serializer().to_array_with(record, options)
    }

    pub fn all_to_array(&self, collection: &RecordCollection) -> Result<JsonValue> {
        self.serializer().all_to_array(collection)
    }
}

impl std::fmt::Debug for Mapper<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("config", &self.config)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
