#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use ormext::prelude::*;
use ormext::field_map;

// Shop: orders carry the customer key; customers have many orders.

pub static CUSTOMER_FIELDS: [FieldDef; 3] = [
    FieldDef::integer("id"),
    FieldDef::string("name"),
    FieldDef::string("password"),
];
pub static CUSTOMER_RELATIONS: [RelationDef; 1] = [RelationDef::has_many("order", "Order")
    .join_self_as("customer_id")
    .join_other_as("order_id")
    .relationship_table("orders")
    .other_field("customer")];
pub static CUSTOMER: EntityDef = EntityDef::new("Customer", "customers")
    .fields(&CUSTOMER_FIELDS)
    .relations(&CUSTOMER_RELATIONS)
    .hidden(&["password"]);

pub static ORDER_FIELDS: [FieldDef; 5] = [
    FieldDef::integer("id"),
    FieldDef::integer("customer_id"),
    FieldDef::float("total"),
    FieldDef::boolean("paid"),
    FieldDef::timestamp("created"),
];
pub static ORDER_RELATIONS: [RelationDef; 1] = [RelationDef::has_one("customer", "Customer")
    .join_self_as("order_id")
    .join_other_as("customer_id")
    .relationship_table("orders")
    .other_field("order")];
pub static ORDER: EntityDef = EntityDef::new("Order", "orders")
    .fields(&ORDER_FIELDS)
    .relations(&ORDER_RELATIONS);

// Blog: posts and tags meet in a join table; posts are soft-deleted.

pub static POST_FIELDS: [FieldDef; 3] = [
    FieldDef::integer("id"),
    FieldDef::string("title"),
    FieldDef::integer("deletion_id"),
];
pub static POST_RELATIONS: [RelationDef; 1] = [RelationDef::has_many("tag", "Tag")
    .join_self_as("post_id")
    .join_other_as("tag_id")
    .relationship_table("post_tags")
    .other_field("post")];
pub static POST: EntityDef = EntityDef::new("Post", "posts")
    .fields(&POST_FIELDS)
    .relations(&POST_RELATIONS);

pub static TAG_FIELDS: [FieldDef; 2] = [FieldDef::integer("id"), FieldDef::string("label")];
pub static TAG_RELATIONS: [RelationDef; 1] = [RelationDef::has_many("post", "Post")
    .join_self_as("tag_id")
    .join_other_as("post_id")
    .relationship_table("post_tags")
    .other_field("tag")];
pub static TAG: EntityDef = EntityDef::new("Tag", "tags")
    .fields(&TAG_FIELDS)
    .relations(&TAG_RELATIONS);

pub static DELETION_FIELDS: [FieldDef; 1] = [FieldDef::integer("id")];
pub static DELETION: EntityDef = EntityDef::new("Deletion", "deletions").fields(&DELETION_FIELDS);

fn build_schema() -> SchemaRegistry {
    [CUSTOMER, ORDER, POST, TAG, DELETION].into_iter().collect()
}

pub static SCHEMA: LazyRegistry = LazyRegistry::new(build_schema);

// Exclusive: a customer has one order, the key still lives on orders.

pub static SOLE_CUSTOMER_RELATIONS: [RelationDef; 1] = [RelationDef::has_one("order", "Order")
    .join_self_as("customer_id")
    .join_other_as("order_id")
    .relationship_table("orders")
    .other_field("customer")];
pub static SOLE_CUSTOMER: EntityDef = EntityDef::new("Customer", "customers")
    .fields(&CUSTOMER_FIELDS)
    .relations(&SOLE_CUSTOMER_RELATIONS);

pub fn exclusive_schema() -> SchemaRegistry {
    [SOLE_CUSTOMER, ORDER].into_iter().collect()
}

/// A record of `def` with the given id.
pub fn persisted(def: &EntityDef, id: i64) -> Record {
    let mut rec = Record::of(def);
    rec.set_id(id);
    rec
}

/// Seed a row with an id and a customer key.
pub fn seed_order(store: &MemoryStore, id: i64, customer_id: i64) {
    store.seed(
        "orders",
        field_map([("id", id), ("customer_id", customer_id)]),
    );
}

/// Hook implementation logging into a shared vector.
#[derive(Clone, Default)]
pub struct HookLog(pub Arc<Mutex<Vec<String>>>);

impl HookLog {
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl EntityEvents for HookLog {
    fn post_delete(&self, record: &Record) {
        self.0
            .lock()
            .unwrap()
            .push(format!("deleted {} {:?}", record.entity(), record.id()));
    }

    fn post_delete_relation(&self, owner: &Record, related: &Record) {
        self.0.lock().unwrap().push(format!(
            "unlinked {} {:?} from {} {:?}",
            owner.entity(),
            owner.id(),
            related.entity(),
            related.id()
        ));
    }
}
