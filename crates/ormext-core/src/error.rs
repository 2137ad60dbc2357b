//! Error types for ormext operations.
//!
//! Most record operations follow a "skip and continue" policy: unknown
//! entity types, unknown relations and unpersisted endpoints degrade to
//! no-ops. The variants here exist for the provider failures that are always
//! propagated, and for the strict mode that opts into explicit errors.

use std::fmt;

/// The primary error type for all ormext operations.
#[derive(Debug)]
pub enum Error {
    /// Metadata resolution failed (unknown entity, relation or field)
    Metadata(MetadataError),
    /// The persistence provider reported a failure
    Store(StoreError),
    /// A timestamp value could not be interpreted
    Timestamp(TimestampError),
    /// A relation cascade was attempted with an unpersisted endpoint
    MissingEndpoint {
        /// Entity type of the owning record.
        entity: String,
        /// Relation name that was being resolved.
        relation: String,
    },
    /// Configuration errors
    Config(ConfigError),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug, Clone)]
pub struct MetadataError {
    pub kind: MetadataErrorKind,
    /// Entity type the lookup was made for.
    pub entity: String,
    /// Relation or field name, when the lookup was for one.
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataErrorKind {
    /// No definitions are registered for the entity type
    UnknownEntity,
    /// The entity type has no relation by that name
    UnknownRelation,
    /// The entity type has no field by that name
    UnknownField,
}

#[derive(Debug)]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub table: Option<String>,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Row or table not found
    NotFound,
    /// Constraint rejected the write
    Constraint,
    /// Any other backend failure
    Backend,
}

#[derive(Debug, Clone)]
pub struct TimestampError {
    pub field: String,
    pub value: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl MetadataError {
    pub fn unknown_entity(entity: impl Into<String>) -> Self {
        Self {
            kind: MetadataErrorKind::UnknownEntity,
            entity: entity.into(),
            name: None,
        }
    }

    pub fn unknown_relation(entity: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            kind: MetadataErrorKind::UnknownRelation,
            entity: entity.into(),
            name: Some(relation.into()),
        }
    }

    pub fn unknown_field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            kind: MetadataErrorKind::UnknownField,
            entity: entity.into(),
            name: Some(field.into()),
        }
    }
}

impl StoreError {
    pub fn not_found(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::NotFound,
            table: Some(table.into()),
            message: message.into(),
            source: None,
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Backend,
            table: None,
            message: message.into(),
            source: None,
        }
    }
}

impl Error {
    /// Is this a metadata-resolution failure?
    pub fn is_metadata(&self) -> bool {
        matches!(self, Error::Metadata(_))
    }

    /// Did this error come from the persistence provider?
    pub fn is_store(&self) -> bool {
        matches!(self, Error::Store(_))
    }

    /// Get the table involved, if the error carries one.
    pub fn table(&self) -> Option<&str> {
        match self {
            Error::Store(e) => e.table.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Metadata(e) => write!(f, "Metadata error: {}", e),
            Error::Store(e) => {
                if let Some(table) = &e.table {
                    write!(f, "Store error on table '{}': {}", table, e.message)
                } else {
                    write!(f, "Store error: {}", e.message)
                }
            }
            Error::Timestamp(e) => write!(f, "Timestamp error: {}", e),
            Error::MissingEndpoint { entity, relation } => write!(
                f,
                "relation '{}' on '{}' requires both endpoints to be persisted",
                relation, entity
            ),
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Store(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Config(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, &self.name) {
            (MetadataErrorKind::UnknownEntity, _) | (_, None) => {
                write!(f, "unknown entity type '{}'", self.entity)
            }
            (MetadataErrorKind::UnknownRelation, Some(name)) => {
                write!(f, "entity '{}' has no relation '{}'", self.entity, name)
            }
            (MetadataErrorKind::UnknownField, Some(name)) => {
                write!(f, "entity '{}' has no field '{}'", self.entity, name)
            }
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot interpret '{}' in field '{}': {}",
            self.value, self.field, self.message
        )
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for MetadataError {}

impl From<MetadataError> for Error {
    fn from(err: MetadataError) -> Self {
        Error::Metadata(err)
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Error::Store(err)
    }
}

impl From<TimestampError> for Error {
    fn from(err: TimestampError) -> Self {
        Error::Timestamp(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

/// Result type alias for ormext operations.
pub type Result<T> = std::result::Result<T, Error>;
