//! Relation-aware save and delete cascades.
//!
//! A relation's `relationship_table` decides where its key lives:
//!
//! - the owner's table: the owner row carries `join_other_as`
//! - the related table: the related row carries `join_self_as`
//! - anything else: a join table holds `(join_self_as, join_other_as)` rows
//!
//! Cascades only run when both endpoints are persisted. Nothing here is
//! transactional; a failure between two writes leaves the first in place.

use ormext_core::{
    EntityDef, Error, Existence, MetadataError, Record, RelationDef, RelationKind, Result, Table,
    Topology, Value, field_map, find_relation,
};

use crate::context::MapperContext;
use crate::persist::Persister;

/// The related side of a relation severance.
#[derive(Debug)]
pub enum RelatedRef<'r> {
    /// A loaded related record.
    Entity(&'r mut Record),
    /// A related entity type, severing every link from the owner without
    /// loading the related records.
    Type(&'r str),
}

impl RelatedRef<'_> {
    /// Entity type name of the related side.
    pub fn entity(&self) -> &str {
        match self {
            RelatedRef::Entity(record) => record.entity(),
            RelatedRef::Type(entity) => entity,
        }
    }
}

impl<'r> From<&'r mut Record> for RelatedRef<'r> {
    fn from(record: &'r mut Record) -> Self {
        RelatedRef::Entity(record)
    }
}

impl<'r> From<&'r str> for RelatedRef<'r> {
    fn from(entity: &'r str) -> Self {
        RelatedRef::Type(entity)
    }
}

/// A resolved relation between two entity types.
#[derive(Debug, Clone, Copy)]
struct Link {
    def: &'static RelationDef,
    owner: EntityDef,
    related: EntityDef,
    topology: Topology,
}

/// Performs save and delete cascades across declared relations.
#[derive(Debug, Clone, Copy)]
pub struct RelationResolver<'a> {
    ctx: MapperContext<'a>,
}

impl<'a> RelationResolver<'a> {
    pub fn new(ctx: MapperContext<'a>) -> Self {
        Self { ctx }
    }

    /// Link `owner` to `related` under the relation named `name`.
    ///
    /// `name` defaults to the related entity type. Returns `true` when the
    /// link was written.
    #[tracing::instrument(level = "debug", skip(self, owner, related), fields(owner = owner.entity(), related = related.entity()))]
    pub fn save_relation(
        &self,
        owner: &mut Record,
        related: &mut Record,
        name: Option<&str>,
    ) -> Result<bool> {
        let key = name.unwrap_or(related.entity()).to_string();
        let Some(link) = self.resolve(owner.entity(), related.entity(), &key)? else {
            return Ok(false);
        };

        let transient_owner_ok =
            link.topology == Topology::OwnerTable && self.ctx.config.link_transient_owner;
        let (Some(related_id), true) = (related.id(), owner.exists() || transient_owner_ok) else {
            return self.missing_endpoint(owner, link.def);
        };

        let def = link.def;
        tracing::debug!(relation = def.name, topology = link.topology.as_str(), "Saving relation");
        match link.topology {
            Topology::OwnerTable => {
                if !link.owner.has_field(def.join_other_as) {
                    tracing::debug!(column = def.join_other_as, "Key column is not an owner field");
                    return Ok(false);
                }
                // A has-one reciprocal allows a single owner per related row.
                // The bulk form clears earlier links, so their keys read 0.
                if let Some(reciprocal) = find_relation(link.related.relations, def.other_field)
                    .filter(|r| r.kind == RelationKind::HasOne)
                {
                    self.delete_relation(
                        related,
                        RelatedRef::Type(owner.entity()),
                        Some(reciprocal.name),
                    )?;
                }
                owner.set(def.join_other_as, related_id);
                self.persister().save(owner)?;
            }
            Topology::RelatedTable => {
                if !link.related.has_field(def.join_self_as) {
                    tracing::debug!(column = def.join_self_as, "Key column is not a related field");
                    return Ok(false);
                }
                let owner_id = owner.id().unwrap_or_default();
                // Freed rows get the bulk form's 0 key, not NULL.
                if def.kind == RelationKind::HasOne {
                    self.delete_relation(owner, RelatedRef::Type(related.entity()), Some(def.name))?;
                }
                related.set(def.join_self_as, owner_id);
                self.persister().save(related)?;
            }
            Topology::JoinTable => {
                let owner_id = owner.id().unwrap_or_default();
                let row = field_map([
                    (def.join_self_as, owner_id),
                    (def.join_other_as, related_id),
                ]);
                Table::new(self.ctx.store, def.relationship_table).insert(&row)?;
            }
        }
        Ok(true)
    }

    /// Sever the link between `owner` and `related` under the relation
    /// named `name`.
    ///
    /// With [`RelatedRef::Type`] every link from `owner` is severed; a
    /// related-table key is then zeroed rather than nulled. Afterwards the
    /// owner's relation slot is dropped, its snapshot recaptured and, for
    /// the record form, `post_delete_relation` hooks run.
    #[tracing::instrument(level = "debug", skip(self, owner, related), fields(owner = owner.entity(), related = related.entity()))]
    pub fn delete_relation(
        &self,
        owner: &mut Record,
        mut related: RelatedRef<'_>,
        name: Option<&str>,
    ) -> Result<bool> {
        let key = name.unwrap_or(related.entity()).to_string();
        let Some(link) = self.resolve(owner.entity(), related.entity(), &key)? else {
            return Ok(false);
        };

        // The type form has no related id to check.
        let related_id = match &related {
            RelatedRef::Entity(record) => record.id(),
            RelatedRef::Type(_) => None,
        };
        let related_missing = matches!(related, RelatedRef::Entity(_)) && related_id.is_none();
        let Some(owner_id) = owner.id().filter(|_| !related_missing) else {
            return self.missing_endpoint(owner, link.def);
        };

        let def = link.def;
        tracing::debug!(relation = def.name, topology = link.topology.as_str(), "Deleting relation");
        match link.topology {
            Topology::OwnerTable => {
                if link.owner.has_field(def.join_other_as) {
                    owner.set(def.join_other_as, Value::Null);
                    self.persister().save(owner)?;
                } else {
                    tracing::debug!(column = def.join_other_as, "Key column is not an owner field");
                }
            }
            Topology::RelatedTable => {
                if !link.related.has_field(def.join_self_as) {
                    tracing::debug!(column = def.join_self_as, "Key column is not a related field");
                } else if let RelatedRef::Entity(record) = &mut related {
                    record.set(def.join_self_as, Value::Null);
                    self.persister().save(record)?;
                } else {
                    let cleared = Table::new(self.ctx.store, def.relationship_table).update(
                        &field_map([(def.join_self_as, 0_i64)]),
                        &field_map([(def.join_self_as, owner_id)]),
                    )?;
                    tracing::debug!(table = def.relationship_table, rows = cleared, "Cleared keys");
                }
            }
            Topology::JoinTable => {
                let mut filter = field_map([(def.join_self_as, owner_id)]);
                if let Some(related_id) = related_id {
                    filter.insert(def.join_other_as.to_string(), related_id.into());
                }
                let removed = Table::new(self.ctx.store, def.relationship_table).delete(&filter)?;
                tracing::debug!(table = def.relationship_table, rows = removed, "Removed join rows");
            }
        }

        owner.unset_relation(def.name);
        owner.capture_snapshot(link.owner.field_names());

        if let RelatedRef::Entity(record) = related {
            if let Some(hooks) = self.ctx.events.get(owner.entity()) {
                hooks.post_delete_relation(owner, record);
            }
        }
        Ok(true)
    }

    fn persister(&self) -> Persister<'a> {
        Persister::new(self.ctx)
    }

    /// Resolve the relation of `owner_entity` answering to `key` and
    /// classify its topology against the two endpoint tables.
    fn resolve(&self, owner_entity: &str, related_entity: &str, key: &str) -> Result<Option<Link>> {
        let lookup = || -> Result<Link> {
            let owner = *self.ctx.metadata.require(owner_entity)?;
            let def = find_relation(owner.relations, key)
                .ok_or_else(|| MetadataError::unknown_relation(owner_entity, key))?;
            let related = *self.ctx.metadata.require(related_entity)?;
            let topology = Topology::classify(def.relationship_table, owner.table, related.table);
            Ok(Link {
                def,
                owner,
                related,
                topology,
            })
        };
        match lookup() {
            Ok(link) => Ok(Some(link)),
            Err(err) => self.ctx.skip(err),
        }
    }

    fn missing_endpoint(&self, owner: &Record, def: &RelationDef) -> Result<bool> {
        self.ctx.skip(Error::MissingEndpoint {
            entity: owner.entity().to_string(),
            relation: def.name.to_string(),
        })
    }
}
