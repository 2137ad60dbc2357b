//! Record operations for ormext.
//!
//! `ormext-mapper` is the operational layer over `ormext-core`:
//!
//! - [`ChangeTracker`] detects changes against a record's snapshot
//! - [`RelationResolver`] cascades saves and deletes across relations
//! - [`Serializer`] renders records to typed JSON structures
//! - [`Mapper`] ties them together behind one facade
//!
//! # Error policy
//!
//! By default, unknown entity types, unknown relations and unpersisted
//! relation endpoints turn the operation into a logged no-op. Only failures
//! reported by the persistence provider are returned. With
//! [`MapperConfig::strict`] the skipped cases are returned as errors too.

pub mod change_tracker;
pub mod config;
pub mod context;
pub mod events;
pub mod mapper;
pub mod persist;
pub mod relation;
pub mod serializer;

#[cfg(test)]
mod test_support;

pub use change_tracker::ChangeTracker;
pub use config::MapperConfig;
pub use context::MapperContext;
pub use events::EventRegistry;
pub use mapper::Mapper;
pub use persist::Persister;
pub use relation::{RelatedRef, RelationResolver};
pub use serializer::{Serializer, ToArrayOptions};
