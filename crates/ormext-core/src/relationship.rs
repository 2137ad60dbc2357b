//! Relation metadata for ormext.
//!
//! Relations are declared as static tables next to the field tables of each
//! entity type. A definition names both foreign-key columns and the table
//! where the key (or join row) physically lives; from that the resolver
//! infers one of three storage topologies.

use serde::Serialize;

/// Cardinality of a relation as seen from the declaring entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RelationKind {
    /// At most one related record. Saving a new link severs the old one.
    HasOne,
    /// Any number of related records.
    HasMany,
}

/// Where a relation's foreign key lives, relative to its two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// The key column is on the owner's table (`owner.join_other_as`).
    OwnerTable,
    /// The key column is on the related table (`related.join_self_as`).
    RelatedTable,
    /// A separate join table holds `(join_self_as, join_other_as)` rows.
    JoinTable,
}

impl Topology {
    /// Classify a relationship table against the two endpoint tables.
    ///
    /// The owner's table is checked first, so a self-referencing relation
    /// always resolves to [`Topology::OwnerTable`].
    #[must_use]
    pub fn classify(relationship_table: &str, owner_table: &str, related_table: &str) -> Self {
        if relationship_table == owner_table {
            Topology::OwnerTable
        } else if relationship_table == related_table {
            Topology::RelatedTable
        } else {
            Topology::JoinTable
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Topology::OwnerTable => "owner-table",
            Topology::RelatedTable => "related-table",
            Topology::JoinTable => "join-table",
        }
    }
}

/// Declarative description of how two entity types relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelationDef {
    /// Kind of relation.
    pub kind: RelationKind,

    /// Simple (singular) relation name, e.g. `"customer"`.
    ///
    /// Also the key of the relation slot on a record.
    pub name: &'static str,

    /// Entity type name of the related side, e.g. `"Customer"`.
    pub entity: &'static str,

    /// Column holding the owning side's id, e.g. `"order_id"`.
    pub join_self_as: &'static str,

    /// Column holding the other side's id, e.g. `"customer_id"`.
    pub join_other_as: &'static str,

    /// Table where the key column or join row lives.
    pub relationship_table: &'static str,

    /// Name of the reciprocal relation on the related type.
    pub other_field: &'static str,
}

impl RelationDef {
    /// Create a relation with the given kind, name and related entity type.
    ///
    /// Key columns, relationship table and reciprocal name start empty.
    #[must_use]
    pub const fn new(kind: RelationKind, name: &'static str, entity: &'static str) -> Self {
        Self {
            kind,
            name,
            entity,
            join_self_as: "",
            join_other_as: "",
            relationship_table: "",
            other_field: "",
        }
    }

    /// Shorthand for a [`RelationKind::HasOne`] relation.
    #[must_use]
    pub const fn has_one(name: &'static str, entity: &'static str) -> Self {
        Self::new(RelationKind::HasOne, name, entity)
    }

    /// Shorthand for a [`RelationKind::HasMany`] relation.
    #[must_use]
    pub const fn has_many(name: &'static str, entity: &'static str) -> Self {
        Self::new(RelationKind::HasMany, name, entity)
    }

    /// Set the column holding the owning side's id.
    #[must_use]
    pub const fn join_self_as(mut self, column: &'static str) -> Self {
        self.join_self_as = column;
        self
    }

    /// Set the column holding the other side's id.
    #[must_use]
    pub const fn join_other_as(mut self, column: &'static str) -> Self {
        self.join_other_as = column;
        self
    }

    /// Set the table where the key column or join row lives.
    #[must_use]
    pub const fn relationship_table(mut self, table: &'static str) -> Self {
        self.relationship_table = table;
        self
    }

    /// Set the reciprocal relation's name on the related type.
    #[must_use]
    pub const fn other_field(mut self, name: &'static str) -> Self {
        self.other_field = name;
        self
    }

    /// Does this definition answer to `key`, by simple name or related type?
    #[must_use]
    pub fn answers_to(&self, key: &str) -> bool {
        self.name == key || self.entity == key
    }

    /// Output key for serialized relation slots: singular for `HasOne`,
    /// pluralized for `HasMany`.
    #[must_use]
    pub fn output_key(&self) -> String {
        match self.kind {
            RelationKind::HasOne => self.name.to_string(),
            RelationKind::HasMany => pluralize(self.name),
        }
    }
}

/// Find the relation answering to `key`.
///
/// A simple-name match wins over a related-type match, so a type with two
/// relations to the same entity can still address each one by name.
#[must_use]
pub fn find_relation<'a>(relations: &'a [RelationDef], key: &str) -> Option<&'a RelationDef> {
    relations
        .iter()
        .find(|rel| rel.name == key)
        .or_else(|| relations.iter().find(|rel| rel.entity == key))
}

/// Simple English pluralization for relation output keys.
///
/// Rules:
/// - Words ending in 's', 'x', 'z', 'ch', 'sh' -> add 'es'
/// - Words ending in 'y' preceded by consonant -> change 'y' to 'ies'
/// - Special cases: person -> people, child -> children, etc.
/// - Default: add 's'
#[must_use]
pub fn pluralize(word: &str) -> String {
    match word {
        "person" => return "people".to_string(),
        "child" => return "children".to_string(),
        "man" => return "men".to_string(),
        "woman" => return "women".to_string(),
        "datum" => return "data".to_string(),
        "index" => return "indices".to_string(),
        _ => {}
    }

    if word.is_empty() {
        return String::new();
    }

    if word.ends_with('s')
        || word.ends_with('x')
        || word.ends_with('z')
        || word.ends_with("ch")
        || word.ends_with("sh")
    {
        return format!("{word}es");
    }

    if let Some(stem) = word.strip_suffix('y') {
        let before_y = stem.chars().last();
        if before_y.is_some_and(|c| !"aeiou".contains(c)) {
            return format!("{stem}ies");
        }
    }

    format!("{word}s")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER_CUSTOMER: RelationDef = RelationDef::has_one("customer", "Customer")
        .join_self_as("order_id")
        .join_other_as("customer_id")
        .relationship_table("orders")
        .other_field("orders");

    const ORDER_NOTES: RelationDef = RelationDef::has_many("note", "Note")
        .join_self_as("order_id")
        .join_other_as("note_id")
        .relationship_table("notes")
        .other_field("order");

    #[test]
    fn test_classify_topologies() {
        assert_eq!(
            Topology::classify("orders", "orders", "customers"),
            Topology::OwnerTable
        );
        assert_eq!(
            Topology::classify("customers", "orders", "customers"),
            Topology::RelatedTable
        );
        assert_eq!(
            Topology::classify("post_tags", "posts", "tags"),
            Topology::JoinTable
        );
        // Self-referencing relations prefer the owner's table.
        assert_eq!(
            Topology::classify("users", "users", "users"),
            Topology::OwnerTable
        );
    }

    #[test]
    fn test_find_relation_by_name_then_entity() {
        let rels = [ORDER_CUSTOMER, ORDER_NOTES];
        assert_eq!(find_relation(&rels, "customer"), Some(&ORDER_CUSTOMER));
        assert_eq!(find_relation(&rels, "Customer"), Some(&ORDER_CUSTOMER));
        assert_eq!(find_relation(&rels, "Note"), Some(&ORDER_NOTES));
        assert_eq!(find_relation(&rels, "Invoice"), None);
    }

    #[test]
    fn test_find_relation_prefers_name_match() {
        let billing = RelationDef::has_one("billing", "Address");
        let address = RelationDef::has_one("Address", "Address");
        let rels = [billing, address];
        assert_eq!(find_relation(&rels, "Address"), Some(&address));
    }

    #[test]
    fn test_output_key() {
        assert_eq!(ORDER_CUSTOMER.output_key(), "customer");
        assert_eq!(ORDER_NOTES.output_key(), "notes");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("tag"), "tags");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("batch"), "batches");
        assert_eq!(pluralize("person"), "people");
        assert_eq!(pluralize(""), "");
    }
}
