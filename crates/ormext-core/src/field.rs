//! Field definitions.

use serde::{Deserialize, Serialize};

/// Declared primitive type of a table field.
///
/// The declared type drives serialization coercion only; values are stored
/// untyped in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// `int` columns, emitted as JSON integers
    Integer,
    /// `float`, `double` and `decimal` columns
    Float,
    /// `tinyint` columns used as booleans
    Boolean,
    /// `varchar`, `text` and `time` columns
    String,
    /// `datetime` columns stored in the source time zone
    Timestamp,
    /// Anything else; passed through unchanged
    Opaque,
}

impl FieldType {
    /// Map a declared SQL column type (as found in the metadata tables) to
    /// its coercion class.
    #[must_use]
    pub fn from_sql(name: &str) -> Self {
        let base = name
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match base.as_str() {
            "int" | "integer" | "bigint" | "smallint" | "mediumint" => FieldType::Integer,
            "float" | "double" | "decimal" => FieldType::Float,
            "tinyint" => FieldType::Boolean,
            "varchar" | "text" | "time" => FieldType::String,
            "datetime" => FieldType::Timestamp,
            _ => FieldType::Opaque,
        }
    }

    /// Get the canonical SQL name for this type.
    #[must_use]
    pub const fn sql_name(&self) -> &'static str {
        match self {
            FieldType::Integer => "int",
            FieldType::Float => "double",
            FieldType::Boolean => "tinyint",
            FieldType::String => "varchar",
            FieldType::Timestamp => "datetime",
            FieldType::Opaque => "blob",
        }
    }
}

/// Metadata about a single table field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDef {
    /// Column name, also the key in the record's field map
    pub name: &'static str,
    /// Declared type
    pub field_type: FieldType,
}

impl FieldDef {
    /// Create a new field definition.
    pub const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self { name, field_type }
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub const fn float(name: &'static str) -> Self {
        Self::new(name, FieldType::Float)
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub const fn string(name: &'static str) -> Self {
        Self::new(name, FieldType::String)
    }

    pub const fn timestamp(name: &'static str) -> Self {
        Self::new(name, FieldType::Timestamp)
    }

    pub const fn opaque(name: &'static str) -> Self {
        Self::new(name, FieldType::Opaque)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_sql_classes() {
        assert_eq!(FieldType::from_sql("int"), FieldType::Integer);
        assert_eq!(FieldType::from_sql("INT(11)"), FieldType::Integer);
        assert_eq!(FieldType::from_sql("decimal(10,2)"), FieldType::Float);
        assert_eq!(FieldType::from_sql("double"), FieldType::Float);
        assert_eq!(FieldType::from_sql("tinyint(1)"), FieldType::Boolean);
        assert_eq!(FieldType::from_sql("varchar(255)"), FieldType::String);
        assert_eq!(FieldType::from_sql("time"), FieldType::String);
        assert_eq!(FieldType::from_sql("datetime"), FieldType::Timestamp);
        assert_eq!(FieldType::from_sql("json"), FieldType::Opaque);
        assert_eq!(FieldType::from_sql(""), FieldType::Opaque);
    }

    #[test]
    fn test_sql_name_round_trips_through_from_sql() {
        for ty in [
            FieldType::Integer,
            FieldType::Float,
            FieldType::Boolean,
            FieldType::String,
            FieldType::Timestamp,
            FieldType::Opaque,
        ] {
            assert_eq!(FieldType::from_sql(ty.sql_name()), ty);
        }
    }

    #[test]
    fn test_const_constructors() {
        const CREATED: FieldDef = FieldDef::timestamp("created");
        assert_eq!(CREATED.name, "created");
        assert_eq!(CREATED.field_type, FieldType::Timestamp);
    }
}
