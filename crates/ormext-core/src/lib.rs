//! Core types and traits for ormext.
//!
//! This crate provides the foundational abstractions the mapper works on:
//!
//! - `Record` and `RecordCollection` sharing the `Existence` contract
//! - `EntityDef`, `FieldDef` and `RelationDef` static metadata tables
//! - `MetadataProvider` for looking definitions up by entity type
//! - `PersistenceProvider` for row-level storage
//! - `Value` for untyped field values

pub mod collection;
pub mod entity;
pub mod error;
pub mod field;
pub mod metadata;
pub mod record;
pub mod relationship;
pub mod store;
pub mod value;

pub use collection::RecordCollection;
pub use entity::{EntityDef, EntityEvents};
pub use error::{
    ConfigError, Error, MetadataError, MetadataErrorKind, Result, StoreError, StoreErrorKind,
    TimestampError,
};
pub use field::{FieldDef, FieldType};
pub use metadata::{LazyRegistry, MetadataProvider, SchemaRegistry};
pub use record::{Existence, FieldMap, Record, RelationSlot};
pub use relationship::{RelationDef, RelationKind, Topology, find_relation, pluralize};
pub use store::{PersistenceProvider, Table, field_map};
pub use value::Value;
