//! ormext - relation-aware data-mapper entities.
//!
//! ormext sits between application code and a relational store and
//! provides:
//!
//! - Records and record collections sharing one existence/count contract
//! - Snapshot-based change detection
//! - Save and delete cascades across owner-table, related-table and
//!   join-table relations, with has-one exclusivity
//! - Typed, recursive serialization to JSON
//!
//! Entity metadata is declared as static tables and handed to the mapper
//! together with a persistence provider.
//!
//! # Quick Start
//!
//! ```
//! use ormext::prelude::*;
//!
//! static TAG_FIELDS: [FieldDef; 2] = [FieldDef::integer("id"), FieldDef::string("label")];
//! static POST_FIELDS: [FieldDef; 2] = [FieldDef::integer("id"), FieldDef::string("title")];
//! static POST_RELATIONS: [RelationDef; 1] = [RelationDef::has_many("tag", "Tag")
//!     .join_self_as("post_id")
//!     .join_other_as("tag_id")
//!     .relationship_table("post_tags")];
//!
//! fn schema() -> SchemaRegistry {
//!     SchemaRegistry::new()
//!         .with(EntityDef::new("Tag", "tags").fields(&TAG_FIELDS))
//!         .with(
//!             EntityDef::new("Post", "posts")
//!                 .fields(&POST_FIELDS)
//!                 .relations(&POST_RELATIONS),
//!         )
//! }
//!
//! static SCHEMA: LazyRegistry = LazyRegistry::new(schema);
//!
//! # fn main() -> ormext::Result<()> {
//! let store = MemoryStore::new();
//! let mapper = Mapper::new(&SCHEMA, &store);
//!
//! let mut post = mapper.create("Post")?.with("title", "Hello");
//! let mut tag = mapper.create("Tag")?.with("label", "rust");
//! mapper.save(&mut post)?;
//! mapper.save(&mut tag)?;
//! mapper.save_relation(&mut post, &mut tag, None)?;
//!
//! assert_eq!(store.row_count("post_tags"), 1);
//! assert!(!mapper.has_change(&post));
//! assert_eq!(mapper.to_array(&post)?["title"], "Hello");
//! # Ok(())
//! # }
//! ```

pub use ormext_core::{
    ConfigError, EntityDef, EntityEvents, Error, Existence, FieldDef, FieldMap, FieldType,
    LazyRegistry, MetadataError, MetadataErrorKind, MetadataProvider, PersistenceProvider, Record,
    RecordCollection, RelationDef, RelationKind, RelationSlot, Result, SchemaRegistry, StoreError,
    StoreErrorKind, Table, TimestampError, Topology, Value, field_map, find_relation, pluralize,
};
pub use ormext_mapper::{
    ChangeTracker, EventRegistry, Mapper, MapperConfig, MapperContext, Persister, RelatedRef,
    RelationResolver, Serializer, ToArrayOptions,
};
pub use ormext_memory::{MemoryStore, StoreOp};
pub use ormext_schema::{ModelSchema, PropertySchema};

/// Schema description generation.
pub mod schema {
    pub use ormext_schema::*;
}

/// JSON values produced by serialization.
pub use serde_json::Value as JsonValue;

/// The types most programs need.
pub mod prelude {
    pub use crate::{
        EntityDef, EntityEvents, Error, Existence, FieldDef, FieldType, JsonValue, LazyRegistry,
        Mapper, MapperConfig, MemoryStore, MetadataProvider, PersistenceProvider, Record,
        RecordCollection, RelatedRef, RelationDef, RelationKind, Result, SchemaRegistry,
        ToArrayOptions, Value,
    };
}
