//! Entity type definitions and the optional event-hook capability.

use crate::field::FieldDef;
use crate::record::Record;
use crate::relationship::RelationDef;

/// Static description of one entity type.
///
/// These tables are produced offline (or written by hand) and registered
/// with a metadata provider; the runtime never derives them.
///
/// # Example
///
/// ```
/// use ormext_core::{EntityDef, FieldDef, RelationDef};
///
/// static ORDER_FIELDS: [FieldDef; 3] = [
///     FieldDef::integer("id"),
///     FieldDef::integer("customer_id"),
///     FieldDef::timestamp("created"),
/// ];
/// static ORDER_RELATIONS: [RelationDef; 1] = [RelationDef::has_one("customer", "Customer")
///     .join_self_as("order_id")
///     .join_other_as("customer_id")
///     .relationship_table("orders")
///     .other_field("order")];
/// static ORDER: EntityDef = EntityDef::new("Order", "orders")
///     .fields(&ORDER_FIELDS)
///     .relations(&ORDER_RELATIONS);
///
/// assert_eq!(ORDER.field_names().count(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDef {
    /// Entity type name, e.g. `"Order"`.
    pub name: &'static str,
    /// Backing table name, e.g. `"orders"`.
    pub table: &'static str,
    /// Table fields in declaration order.
    pub fields: &'static [FieldDef],
    /// Relations in declaration order.
    pub relations: &'static [RelationDef],
    /// Fields hidden from serialization unless a record unhides them.
    pub hidden: &'static [&'static str],
}

impl EntityDef {
    /// Create an entity with no fields or relations.
    #[must_use]
    pub const fn new(name: &'static str, table: &'static str) -> Self {
        Self {
            name,
            table,
            fields: &[],
            relations: &[],
            hidden: &[],
        }
    }

    #[must_use]
    pub const fn fields(mut self, fields: &'static [FieldDef]) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub const fn relations(mut self, relations: &'static [RelationDef]) -> Self {
        self.relations = relations;
        self
    }

    #[must_use]
    pub const fn hidden(mut self, hidden: &'static [&'static str]) -> Self {
        self.hidden = hidden;
        self
    }

    /// Iterate over the table field names.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Is `name` one of this entity's table fields?
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }
}

/// Post-operation hooks an entity type may opt into.
///
/// Hooks run after the core operation completes and never before. Types
/// that do not register an implementation are simply not notified.
pub trait EntityEvents: Send + Sync {
    /// Called after a primary delete (hard or soft) of `record`.
    #[allow(unused_variables)]
    fn post_delete(&self, record: &Record) {}

    /// Called after the link between `owner` and `related` was severed.
    ///
    /// Not called for the bulk form that severs by type designator.
    #[allow(unused_variables)]
    fn post_delete_relation(&self, owner: &Record, related: &Record) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldType;

    static TAG_FIELDS: [FieldDef; 2] = [FieldDef::integer("id"), FieldDef::string("label")];
    static TAG: EntityDef = EntityDef::new("Tag", "tags")
        .fields(&TAG_FIELDS)
        .hidden(&["label"]);

    #[test]
    fn test_field_lookup() {
        assert!(TAG.has_field("label"));
        assert!(!TAG.has_field("post_id"));
        assert_eq!(TAG.field_names().collect::<Vec<_>>(), vec!["id", "label"]);
        assert_eq!(TAG.fields[1].field_type, FieldType::String);
        assert!(TAG.relations.is_empty());
    }

    struct Silent;
    impl EntityEvents for Silent {}

    #[test]
    fn test_default_hooks_are_no_ops() {
        let rec = Record::new("Tag");
        Silent.post_delete(&rec);
        Silent.post_delete_relation(&rec, &rec);
    }
}
