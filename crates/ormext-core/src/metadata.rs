//! Metadata providers: per-type field and relation definitions.
//!
//! The metadata provider is the one piece of process-wide shared state. It is
//! read-only after construction; [`LazyRegistry`] builds it exactly once on
//! first use, even when several threads race to that first use.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::Result;
use crate::entity::EntityDef;
use crate::error::MetadataError;
use crate::field::FieldDef;
use crate::relationship::{RelationDef, find_relation};

/// Source of field and relation definitions per entity type.
///
/// Only [`MetadataProvider::entity`] must be implemented; the lookups the
/// core performs are derived from it.
pub trait MetadataProvider: Send + Sync {
    /// Look up the definition of an entity type.
    fn entity(&self, name: &str) -> Option<&EntityDef>;

    /// Look up an entity type, failing with [`MetadataError`] if unknown.
    fn require(&self, name: &str) -> Result<&EntityDef> {
        self.entity(name)
            .ok_or_else(|| MetadataError::unknown_entity(name).into())
    }

    /// Field definitions of `name`, in declaration order.
    fn field_definitions(&self, name: &str) -> Result<&'static [FieldDef]> {
        Ok(self.require(name)?.fields)
    }

    /// Table field names of `name`, in declaration order.
    fn field_names(&self, name: &str) -> Result<Vec<&'static str>> {
        Ok(self.require(name)?.field_names().collect())
    }

    /// Relation definitions of `name`, in declaration order.
    fn relation_definitions(&self, name: &str) -> Result<&'static [RelationDef]> {
        Ok(self.require(name)?.relations)
    }

    /// Backing table of `name`.
    fn table_name(&self, name: &str) -> Result<&'static str> {
        Ok(self.require(name)?.table)
    }

    /// Resolve the relation of `entity` answering to `key`.
    fn relation(&self, entity: &str, key: &str) -> Result<&'static RelationDef> {
        let relations = self.relation_definitions(entity)?;
        find_relation(relations, key)
            .ok_or_else(|| MetadataError::unknown_relation(entity, key).into())
    }
}

impl<T: MetadataProvider + ?Sized> MetadataProvider for &T {
    fn entity(&self, name: &str) -> Option<&EntityDef> {
        (**self).entity(name)
    }
}

/// In-memory registry of entity definitions.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    entities: HashMap<&'static str, EntityDef>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity definition, replacing any previous one of the
    /// same name.
    pub fn register(&mut self, entity: EntityDef) {
        if self.entities.insert(entity.name, entity).is_some() {
            tracing::debug!(entity = entity.name, "Replaced entity definition");
        }
    }

    /// Builder-style [`SchemaRegistry::register`].
    #[must_use]
    pub fn with(mut self, entity: EntityDef) -> Self {
        self.register(entity);
        self
    }

    /// Number of registered entity types.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if no entity types are registered.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate over registered definitions (unordered).
    pub fn iter(&self) -> impl Iterator<Item = &EntityDef> {
        self.entities.values()
    }
}

impl FromIterator<EntityDef> for SchemaRegistry {
    fn from_iter<I: IntoIterator<Item = EntityDef>>(iter: I) -> Self {
        let mut registry = Self::new();
        for entity in iter {
            registry.register(entity);
        }
        registry
    }
}

impl MetadataProvider for SchemaRegistry {
    fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }
}

/// A registry built on first use.
///
/// Intended for `static` declarations:
///
/// ```
/// use ormext_core::{EntityDef, LazyRegistry, MetadataProvider, SchemaRegistry};
///
/// fn build() -> SchemaRegistry {
///     SchemaRegistry::new().with(EntityDef::new("Tag", "tags"))
/// }
///
/// static SCHEMA: LazyRegistry = LazyRegistry::new(build);
///
/// assert_eq!(SCHEMA.table_name("Tag").unwrap(), "tags");
/// ```
pub struct LazyRegistry {
    cell: OnceLock<SchemaRegistry>,
    init: fn() -> SchemaRegistry,
}

impl LazyRegistry {
    /// Create a registry that runs `init` once, on first lookup.
    pub const fn new(init: fn() -> SchemaRegistry) -> Self {
        Self {
            cell: OnceLock::new(),
            init,
        }
    }

    /// Get the registry, building it if needed.
    pub fn get(&self) -> &SchemaRegistry {
        self.cell.get_or_init(|| {
            let registry = (self.init)();
            tracing::debug!(entities = registry.len(), "Built entity metadata registry");
            registry
        })
    }

    /// Has the registry been built yet?
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl std::fmt::Debug for LazyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyRegistry")
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

impl MetadataProvider for LazyRegistry {
    fn entity(&self, name: &str) -> Option<&EntityDef> {
        self.get().entity(name)
    }
}
