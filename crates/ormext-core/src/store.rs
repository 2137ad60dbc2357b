//! Persistence provider abstraction.
//!
//! The core never builds SQL. It asks a provider to find, save and delete
//! rows by id, and for relation bookkeeping it issues raw row operations
//! against a named table through [`Table`].

use crate::Result;
use crate::record::FieldMap;

/// Row-level storage consumed by the mapper.
///
/// Implementations are expected to be synchronous; every call completes or
/// fails before returning. Nothing here is transactional: a cascade that
/// touches two rows may leave them inconsistent if the second call fails.
pub trait PersistenceProvider: Send + Sync {
    /// Load the row with `id` from `table`.
    fn find(&self, table: &str, id: i64) -> Result<Option<FieldMap>>;

    /// Insert (when `id` is `None`) or update the row, returning its id.
    ///
    /// `values` holds the table fields to write, without the id column.
    fn save(&self, table: &str, id: Option<i64>, values: &FieldMap) -> Result<i64>;

    /// Delete the row with `id` from `table`.
    ///
    /// A row that is already gone is not an error.
    fn delete(&self, table: &str, id: i64) -> Result<()>;

    /// Insert a raw row into `table`.
    fn insert_row(&self, table: &str, row: &FieldMap) -> Result<()>;

    /// Set `set` on every row of `table` matching all of `filter`; returns
    /// the number of rows changed.
    fn update_rows(&self, table: &str, set: &FieldMap, filter: &FieldMap) -> Result<u64>;

    /// Delete every row of `table` matching all of `filter`; returns the
    /// number of rows removed.
    fn delete_rows(&self, table: &str, filter: &FieldMap) -> Result<u64>;
}

/// A handle for raw operations on one table.
///
/// ```ignore
/// Table::new(store, "post_tags").insert(&row)?;
/// ```
#[derive(Clone, Copy)]
pub struct Table<'a> {
    store: &'a dyn PersistenceProvider,
    name: &'a str,
}

impl<'a> Table<'a> {
    pub fn new(store: &'a dyn PersistenceProvider, name: &'a str) -> Self {
        Self { store, name }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    #[tracing::instrument(level = "trace", skip(self, row), fields(table = self.name))]
    pub fn insert(&self, row: &FieldMap) -> Result<()> {
        self.store.insert_row(self.name, row)
    }

    #[tracing::instrument(level = "trace", skip(self, set, filter), fields(table = self.name))]
    pub fn update(&self, set: &FieldMap, filter: &FieldMap) -> Result<u64> {
        self.store.update_rows(self.name, set, filter)
    }

    #[tracing::instrument(level = "trace", skip(self, filter), fields(table = self.name))]
    pub fn delete(&self, filter: &FieldMap) -> Result<u64> {
        self.store.delete_rows(self.name, filter)
    }
}

impl std::fmt::Debug for Table<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table").field("name", &self.name).finish()
    }
}

/// Build a [`FieldMap`] from `(column, value)` pairs.
///
/// ```
/// use ormext_core::{Value, field_map};
///
/// let row = field_map([("post_id", Value::BigInt(10)), ("tag_id", Value::BigInt(3))]);
/// assert_eq!(row.len(), 2);
/// ```
pub fn field_map<K, V, I>(pairs: I) -> FieldMap
where
    K: Into<String>,
    V: Into<crate::Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
