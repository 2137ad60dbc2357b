//! Primary save, load and delete of single records.

use ormext_core::{
    EntityDef, Existence, FieldMap, MetadataError, Record, RecordCollection, Result,
};

use crate::context::MapperContext;

/// Writes and loads whole records through the persistence provider.
#[derive(Debug, Clone, Copy)]
pub struct Persister<'a> {
    ctx: MapperContext<'a>,
}

impl<'a> Persister<'a> {
    pub fn new(ctx: MapperContext<'a>) -> Self {
        Self { ctx }
    }

    /// Load the record of type `entity` with `id`.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn find(&self, entity: &str, id: i64) -> Result<Option<Record>> {
        let def = match self.ctx.metadata.require(entity) {
            Ok(def) => def,
            Err(err) => return self.ctx.skip(err),
        };
        let Some(mut row) = self.ctx.store.find(def.table, id)? else {
            tracing::debug!(table = def.table, id = id, "Row not found");
            return Ok(None);
        };
        row.entry("id".to_string()).or_insert(id.into());
        Ok(Some(Record::loaded(def, row)))
    }

    /// Replace `record`'s fields and snapshot with the stored row.
    ///
    /// Returns `false` when the record is transient or its row is gone.
    pub fn reload(&self, record: &mut Record) -> Result<bool> {
        let Some(id) = record.id() else {
            tracing::debug!(entity = record.entity(), "Cannot reload a transient record");
            return Ok(false);
        };
        match self.find(record.entity(), id)? {
            Some(fresh) => {
                *record = fresh;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Insert or update `record`, take the assigned id and recapture the
    /// snapshot.
    ///
    /// Only table fields the record has a value for are written.
    #[tracing::instrument(level = "debug", skip(self, record), fields(entity = record.entity()))]
    pub fn save(&self, record: &mut Record) -> Result<bool> {
        let def = match self.ctx.metadata.require(record.entity()) {
            Ok(def) => *def,
            Err(err) => return self.ctx.skip(err),
        };
        let values = table_values(&def, record);
        let id = self.ctx.store.save(def.table, record.id(), &values)?;
        tracing::debug!(table = def.table, id = id, fields = values.len(), "Saved record");
        record.set_id(id);
        record.capture_snapshot(def.field_names());
        Ok(true)
    }

    /// Primary delete of a persisted record.
    ///
    /// Entity types with the configured deletion field are soft-deleted: a
    /// deletion marker is saved and its id stored on the record. Others are
    /// removed by id. Registered `post_delete` hooks run afterwards.
    #[tracing::instrument(level = "debug", skip(self, record), fields(entity = record.entity()))]
    pub fn delete(&self, record: &mut Record) -> Result<bool> {
        let Some(id) = record.id() else {
            tracing::debug!("Cannot delete a transient record");
            return Ok(false);
        };
        let def = match self.ctx.metadata.require(record.entity()) {
            Ok(def) => *def,
            Err(err) => return self.ctx.skip(err),
        };

        let config = self.ctx.config;
        if def.has_field(config.deletion_field) {
            match self.ctx.metadata.entity(config.deletion_entity) {
                Some(marker_def) => {
                    let mut marker = Record::of(marker_def);
                    self.save(&mut marker)?;
                    if let Some(marker_id) = marker.id() {
                        record.set(config.deletion_field, marker_id);
                        self.save(record)?;
                        tracing::debug!(id = id, marker = marker_id, "Soft-deleted record");
                    }
                }
                None if config.strict => {
                    return Err(MetadataError::unknown_entity(config.deletion_entity).into());
                }
                None => {
                    tracing::debug!(
                        deletion_entity = config.deletion_entity,
                        "Deletion entity not registered, soft delete skipped"
                    );
                }
            }
        } else {
            self.ctx.store.delete(def.table, id)?;
            tracing::debug!(table = def.table, id = id, "Deleted record");
        }

        if let Some(hooks) = self.ctx.events.get(record.entity()) {
            hooks.post_delete(record);
        }
        Ok(true)
    }

    /// Primary delete of every member; returns how many were deleted.
    pub fn delete_all(&self, collection: &mut RecordCollection) -> Result<usize> {
        let mut deleted = 0;
        for record in collection.iter_mut() {
            if self.delete(record)? {
                deleted += 1;
            }
        }
        tracing::debug!(members = collection.count(), deleted = deleted, "Deleted collection");
        Ok(deleted)
    }
}

/// The values of `def`'s table fields that `record` has set, without `id`.
fn table_values(def: &EntityDef, record: &Record) -> FieldMap {
    def.field_names()
        .filter(|name| *name != "id")
        .filter_map(|name| record.get(name).map(|v| (name.to_string(), v.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapperConfig;
    use crate::events::EventRegistry;
    use crate::test_support::{POST, RecordingHooks, TAG, persisted, registry};
    use ormext_core::{SchemaRegistry, Value, field_map};
    use ormext_memory::{MemoryStore, StoreOp};
    use std::sync::Arc;

    struct Fixture {
        registry: SchemaRegistry,
        store: MemoryStore,
        config: MapperConfig,
        events: EventRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: registry(),
                store: MemoryStore::new(),
                config: MapperConfig::default(),
                events: EventRegistry::new(),
            }
        }

        fn persister(&self) -> Persister<'_> {
            Persister::new(MapperContext {
                metadata: &self.registry,
                store: &self.store,
                config: &self.config,
                events: &self.events,
            })
        }
    }

    #[test]
    fn test_save_assigns_id_and_snapshot() {
        let fx = Fixture::new();
        let mut tag = Record::of(&TAG).with("label", "red").with("junk", 1);
        assert!(fx.persister().save(&mut tag).unwrap());
        assert_eq!(tag.id(), Some(1));
        assert_eq!(tag.stored("label"), Some("red"));
        assert_eq!(tag.stored("id"), Some("1"));

        // non-table fields are not written
        let row = fx.store.row("tags", 1).unwrap();
        assert_eq!(row.get("label"), Some(&Value::from("red")));
        assert!(row.get("junk").is_none());
    }

    #[test]
    fn test_save_unknown_entity() {
        let mut fx = Fixture::new();
        let mut ghost = Record::new("Ghost");
        assert!(!fx.persister().save(&mut ghost).unwrap());
        assert!(fx.store.journal().is_empty());

        fx.config = MapperConfig::default().strict(true);
        assert!(fx.persister().save(&mut ghost).unwrap_err().is_metadata());
    }

    #[test]
    fn test_find_and_reload() {
        let fx = Fixture::new();
        fx.store
            .seed("tags", field_map([("id", Value::BigInt(4)), ("label", Value::from("blue"))]));

        let mut tag = fx.persister().find("Tag", 4).unwrap().unwrap();
        assert_eq!(tag.stored("label"), Some("blue"));
        assert!(fx.persister().find("Tag", 5).unwrap().is_none());

        tag.set("label", "green");
        assert!(fx.persister().reload(&mut tag).unwrap());
        assert_eq!(tag.value("label"), &Value::from("blue"));

        let mut transient = Record::of(&TAG);
        assert!(!fx.persister().reload(&mut transient).unwrap());
    }

    #[test]
    fn test_hard_delete_runs_hook() {
        let mut fx = Fixture::new();
        let hooks = Arc::new(RecordingHooks::default());
        fx.events.register("Tag", hooks.clone());
        fx.store.seed("tags", field_map([("id", 2_i64)]));

        let mut tag = persisted(&TAG, 2);
        assert!(fx.persister().delete(&mut tag).unwrap());
        assert_eq!(fx.store.row_count("tags"), 0);
        assert_eq!(hooks.calls(), vec!["post_delete Some(2)"]);
    }

    #[test]
    fn test_soft_delete_saves_marker() {
        let fx = Fixture::new();
        fx.store.seed("posts", field_map([("id", 10_i64)]));

        let mut post = persisted(&POST, 10);
        assert!(fx.persister().delete(&mut post).unwrap());

        assert_eq!(post.value("deletion_id"), &Value::BigInt(1));
        assert_eq!(fx.store.row_count("posts"), 1);
        assert_eq!(fx.store.row_count("deletions"), 1);
        assert_eq!(
            fx.store.row("posts", 10).unwrap().get("deletion_id"),
            Some(&Value::BigInt(1))
        );
    }

    #[test]
    fn test_soft_delete_without_marker_type() {
        let mut fx = Fixture::new();
        fx.config = MapperConfig::default().deletion_entity("Tombstone");
        let hooks = Arc::new(RecordingHooks::default());
        fx.events.register("Post", hooks.clone());

        let mut post = persisted(&POST, 10);
        assert!(fx.persister().delete(&mut post).unwrap());
        assert!(fx.store.journal().is_empty());
        assert_eq!(hooks.calls(), vec!["post_delete Some(10)"]);

        fx.config = MapperConfig::default().deletion_entity("Tombstone").strict(true);
        assert!(fx.persister().delete(&mut post).unwrap_err().is_metadata());
    }

    #[test]
    fn test_delete_transient_is_noop() {
        let fx = Fixture::new();
        let mut tag = Record::of(&TAG);
        assert!(!fx.persister().delete(&mut tag).unwrap());
        assert!(fx.store.journal().is_empty());
    }

    #[test]
    fn test_delete_all() {
        let fx = Fixture::new();
        for id in 1..=3_i64 {
            fx.store.seed("tags", field_map([("id", id)]));
        }
        let mut coll: RecordCollection = (1..=3).map(|id| persisted(&TAG, id)).collect();
        coll.add(Record::of(&TAG));

        assert_eq!(fx.persister().delete_all(&mut coll).unwrap(), 3);
        assert_eq!(fx.store.row_count("tags"), 0);
        assert_eq!(
            fx.store.journal().last(),
            Some(&StoreOp::Delete {
                table: "tags".into(),
                id: 3,
            })
        );
    }

    #[test]
    fn test_store_errors_propagate() {
        let fx = Fixture::new();
        fx.store.fail_writes("tags");
        let mut tag = Record::of(&TAG);
        assert!(fx.persister().save(&mut tag).unwrap_err().is_store());
        assert!(!tag.exists());
    }
}
