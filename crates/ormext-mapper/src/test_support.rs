//! Shared fixtures for the mapper's unit tests.

use std::sync::Mutex;

use ormext_core::{EntityDef, EntityEvents, FieldDef, Record, RelationDef, SchemaRegistry};

pub static CUSTOMER_FIELDS: [FieldDef; 2] = [FieldDef::integer("id"), FieldDef::string("name")];
pub static CUSTOMER_RELATIONS: [RelationDef; 2] = [
    RelationDef::has_many("order", "Order")
        .join_self_as("customer_id")
        .join_other_as("order_id")
        .relationship_table("orders")
        .other_field("customer"),
    RelationDef::has_one("account", "Account")
        .join_self_as("customer_id")
        .join_other_as("account_id")
        .relationship_table("accounts")
        .other_field("customer"),
];
pub static CUSTOMER: EntityDef = EntityDef::new("Customer", "customers")
    .fields(&CUSTOMER_FIELDS)
    .relations(&CUSTOMER_RELATIONS);

pub static ORDER_FIELDS: [FieldDef; 3] = [
    FieldDef::integer("id"),
    FieldDef::integer("customer_id"),
    FieldDef::float("total"),
];
pub static ORDER_RELATIONS: [RelationDef; 1] = [RelationDef::has_one("customer", "Customer")
    .join_self_as("order_id")
    .join_other_as("customer_id")
    .relationship_table("orders")
    .other_field("order")];
pub static ORDER: EntityDef = EntityDef::new("Order", "orders")
    .fields(&ORDER_FIELDS)
    .relations(&ORDER_RELATIONS);

pub static ACCOUNT_FIELDS: [FieldDef; 2] = [FieldDef::integer("id"), FieldDef::integer("customer_id")];
pub static ACCOUNT_RELATIONS: [RelationDef; 1] = [RelationDef::has_one("customer", "Customer")
    .join_self_as("account_id")
    .join_other_as("customer_id")
    .relationship_table("accounts")
    .other_field("account")];
pub static ACCOUNT: EntityDef = EntityDef::new("Account", "accounts")
    .fields(&ACCOUNT_FIELDS)
    .relations(&ACCOUNT_RELATIONS);

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
pub static TAG: EntityDef = EntityDef::new("Tag", "tags").fields(&TAG_FIELDS);

pub static DELETION_FIELDS: [FieldDef; 1] = [FieldDef::integer("id")];
pub static DELETION: EntityDef = EntityDef::new("Deletion", "deletions").fields(&DELETION_FIELDS);

pub fn registry() -> SchemaRegistry {
    [CUSTOMER, ORDER, ACCOUNT, POST, TAG, DELETION]
        .into_iter()
        .collect()
}

/// A record of `def` with the given id.
pub fn persisted(def: &EntityDef, id: i64) -> Record {
    let mut rec = Record::of(def);
    rec.set_id(id);
    rec
}

/// Hooks that remember what they were told.
#[derive(Default)]
pub struct RecordingHooks {
    pub calls: Mutex<Vec<String>>,
}

impl RecordingHooks {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl EntityEvents for RecordingHooks {
    fn post_delete(&self, record: &Record) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("post_delete {:?}", record.id()));
    }

    fn post_delete_relation(&self, owner: &Record, related: &Record) {
        self.calls.lock().unwrap().push(format!(
            "post_delete_relation {:?} {} {:?}",
            owner.id(),
            related.entity(),
            related.id()
        ));
    }
}
