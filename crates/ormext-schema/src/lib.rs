//! Schema descriptions for ormext entity types.
//!
//! Turns the static [`EntityDef`] tables into JSON-Schema-like objects for
//! API documentation:
//!
//! ```json
//! {"title": "Order", "type": "object", "properties": {"id": {"type": "number"}, ...}}
//! ```
//!
//! Fields map to `number`, `boolean` or `string`; has-one relations become
//! `$ref`s and has-many relations arrays of `$ref`s under the plural name.
//! Every description also carries the audit properties the store maintains
//! for all rows. This runs offline; the runtime never calls it.

use std::collections::BTreeMap;

use ormext_core::{EntityDef, FieldType, MetadataProvider, RelationKind, SchemaRegistry};
use serde::Serialize;

/// Entity type the audit `*_by` references point at.
pub const AUDIT_USER_ENTITY: &str = "User";

/// Schema of one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertySchema {
    /// A primitive JSON type.
    Simple {
        #[serde(rename = "type")]
        kind: &'static str,
    },
    /// A reference to another entity's description.
    Reference {
        #[serde(rename = "$ref")]
        reference: String,
    },
    /// An array of items.
    Array {
        #[serde(rename = "type")]
        kind: &'static str,
        items: Box<PropertySchema>,
    },
    /// Any value.
    Any {},
}

impl PropertySchema {
    pub fn simple(kind: &'static str) -> Self {
        PropertySchema::Simple { kind }
    }

    /// Reference to the description of `entity`.
    pub fn reference(entity: &str) -> Self {
        PropertySchema::Reference {
            reference: format!("#/definitions/{entity}"),
        }
    }

    pub fn array_of(items: PropertySchema) -> Self {
        PropertySchema::Array {
            kind: "array",
            items: Box::new(items),
        }
    }

    /// Schema for a field of the given declared type.
    pub fn for_field(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Integer | FieldType::Float => Self::simple("number"),
            FieldType::Boolean => Self::simple("boolean"),
            FieldType::String | FieldType::Timestamp => Self::simple("string"),
            FieldType::Opaque => PropertySchema::Any {},
        }
    }
}

/// Description of one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSchema {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub properties: BTreeMap<String, PropertySchema>,
}

impl ModelSchema {
    /// Describe `def`.
    pub fn from_entity(def: &EntityDef) -> Self {
        let mut properties = BTreeMap::new();

        for field in def.fields {
            properties.insert(field.name.to_string(), PropertySchema::for_field(field.field_type));
        }

        for relation in def.relations {
            let target = PropertySchema::reference(relation.entity);
            let schema = match relation.kind {
                RelationKind::HasOne => target,
                RelationKind::HasMany => PropertySchema::array_of(target),
            };
            properties.insert(relation.output_key(), schema);
        }

        // Declared fields take precedence over the audit defaults.
        for (name, schema) in audit_properties() {
            properties.entry(name.to_string()).or_insert(schema);
        }

        tracing::trace!(entity = def.name, properties = properties.len(), "Described entity");
        Self {
            title: def.name.to_string(),
            kind: "object",
            properties,
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.get(name)
    }

    /// The description as a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// The audit properties present on every entity.
pub fn audit_properties() -> [(&'static str, PropertySchema); 7] {
    [
        ("id", PropertySchema::simple("number")),
        ("created", PropertySchema::simple("string")),
        ("updated", PropertySchema::simple("string")),
        ("created_by_id", PropertySchema::simple("number")),
        ("created_by", PropertySchema::reference(AUDIT_USER_ENTITY)),
        ("updated_by_id", PropertySchema::simple("number")),
        ("updated_by", PropertySchema::reference(AUDIT_USER_ENTITY)),
    ]
}

/// Describe the entity type `name` known to `metadata`.
pub fn describe(metadata: &dyn MetadataProvider, name: &str) -> ormext_core::Result<ModelSchema> {
    Ok(ModelSchema::from_entity(metadata.require(name)?))
}

/// Describe every entity type in `registry`, keyed by entity name.
pub fn definitions(registry: &SchemaRegistry) -> BTreeMap<String, ModelSchema> {
    registry
        .iter()
        .map(|def| (def.name.to_string(), ModelSchema::from_entity(def)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ormext_core::{FieldDef, RelationDef};
    use serde_json::json;

    static POST_FIELDS: [FieldDef; 4] = [
        FieldDef::integer("id"),
        FieldDef::string("title"),
        FieldDef::boolean("published"),
        FieldDef::opaque("payload"),
    ];
    static POST_RELATIONS: [RelationDef; 2] = [
        RelationDef::has_one("author", "User").relationship_table("posts"),
        RelationDef::has_many("category", "Category").relationship_table("post_categories"),
    ];
    static POST: EntityDef = EntityDef::new("Post", "posts")
        .fields(&POST_FIELDS)
        .relations(&POST_RELATIONS);

    #[test]
    fn test_describe_post() {
        let schema = ModelSchema::from_entity(&POST);
        assert_eq!(schema.title, "Post");
        assert_eq!(schema.property("title"), Some(&PropertySchema::simple("string")));
        assert_eq!(schema.property("payload"), Some(&PropertySchema::Any {}));

        let json = schema.to_json();
        assert_eq!(json["type"], "object");
        assert_eq!(json["properties"]["published"], json!({"type": "boolean"}));
        assert_eq!(json["properties"]["payload"], json!({}));
        assert_eq!(
            json["properties"]["author"],
            json!({"$ref": "#/definitions/User"})
        );
        assert_eq!(
            json["properties"]["categories"],
            json!({"type": "array", "items": {"$ref": "#/definitions/Category"}})
        );
        assert!(json["properties"].get("category").is_none());
    }

    #[test]
    fn test_audit_properties_appended() {
        let schema = ModelSchema::from_entity(&EntityDef::new("Tag", "tags"));
        for (name, _) in audit_properties() {
            assert!(schema.property(name).is_some(), "missing {name}");
        }
        assert_eq!(
            schema.to_json()["properties"]["updated_by"],
            json!({"$ref": "#/definitions/User"})
        );
    }

    #[test]
    fn test_declared_fields_win_over_audit() {
        static FIELDS: [FieldDef; 1] = [FieldDef::timestamp("created_by_id")];
        let schema = ModelSchema::from_entity(&EntityDef::new("Odd", "odd").fields(&FIELDS));
        assert_eq!(
            schema.property("created_by_id"),
            Some(&PropertySchema::simple("string"))
        );
    }

    #[test]
    fn test_describe_through_provider() {
        let registry = SchemaRegistry::new().with(POST);
        assert_eq!(describe(&registry, "Post").unwrap().title, "Post");
        assert!(describe(&registry, "Ghost").unwrap_err().is_metadata());

        let defs = definitions(&registry);
        assert_eq!(defs.keys().collect::<Vec<_>>(), vec!["Post"]);
    }
}
