//! In-process persistence provider for ormext.
//!
//! `MemoryStore` keeps every table as an ordered list of rows behind a
//! mutex. Tables are created on first write. Rows of entity tables carry an
//! `"id"` column assigned from a per-table counter; raw join-table rows are
//! stored exactly as inserted.
//!
//! Every provider call is appended to a journal so callers can assert which
//! store operations an entity operation issued, including "none at all".
//!
//! Row matching for `update_rows`/`delete_rows` compares string-normalized
//! values, so `BigInt(3)` matches `Text("3")` the way a loosely typed SQL
//! comparison would.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use ormext_core::{FieldMap, PersistenceProvider, Result, StoreError, Value};

/// One provider call, as recorded in the journal.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    Find {
        table: String,
        id: i64,
    },
    Save {
        table: String,
        id: i64,
        /// `true` when the call assigned a new id.
        inserted: bool,
    },
    Delete {
        table: String,
        id: i64,
    },
    InsertRow {
        table: String,
        row: FieldMap,
    },
    UpdateRows {
        table: String,
        set: FieldMap,
        filter: FieldMap,
        affected: u64,
    },
    DeleteRows {
        table: String,
        filter: FieldMap,
        affected: u64,
    },
}

impl StoreOp {
    /// Table the operation touched.
    pub fn table(&self) -> &str {
        match self {
            StoreOp::Find { table, .. }
            | StoreOp::Save { table, .. }
            | StoreOp::Delete { table, .. }
            | StoreOp::InsertRow { table, .. }
            | StoreOp::UpdateRows { table, .. }
            | StoreOp::DeleteRows { table, .. } => table,
        }
    }

    /// Did the operation write anything?
    pub fn is_write(&self) -> bool {
        !matches!(self, StoreOp::Find { .. })
    }
}

#[derive(Debug, Default)]
struct MemTable {
    rows: Vec<FieldMap>,
    last_id: i64,
}

impl MemTable {
    fn position(&self, id: i64) -> Option<usize> {
        self.rows.iter().position(|row| row_id(row) == Some(id))
    }

    fn track_id(&mut self, row: &FieldMap) {
        if let Some(id) = row_id(row) {
            self.last_id = self.last_id.max(id);
        }
    }
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, MemTable>,
    journal: Vec<StoreOp>,
    failing: BTreeSet<String>,
}

impl State {
    fn table(&mut self, name: &str) -> &mut MemTable {
        self.tables.entry(name.to_string()).or_default()
    }

    fn check_writable(&self, table: &str) -> Result<()> {
        if self.failing.contains(table) {
            tracing::debug!(table = table, "Injected write failure");
            return Err(StoreError::backend(format!("writes to '{table}' are failing")).into());
        }
        Ok(())
    }
}

/// A thread-safe in-memory [`PersistenceProvider`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a row into `table` without journaling it.
    ///
    /// Used to set up fixtures; an `"id"` column advances the table's id
    /// counter.
    pub fn seed(&self, table: &str, row: FieldMap) {
        let mut state = self.lock();
        let tbl = state.table(table);
        tbl.track_id(&row);
        tbl.rows.push(row);
    }

    /// All rows of `table`, in insertion order.
    pub fn rows(&self, table: &str) -> Vec<FieldMap> {
        self.lock()
            .tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// The row of `table` with `id`, if any.
    pub fn row(&self, table: &str, id: i64) -> Option<FieldMap> {
        let state = self.lock();
        let tbl = state.tables.get(table)?;
        tbl.position(id).map(|pos| tbl.rows[pos].clone())
    }

    /// Number of rows in `table`.
    pub fn row_count(&self, table: &str) -> usize {
        self.lock().tables.get(table).map_or(0, |t| t.rows.len())
    }

    /// Every call recorded so far, oldest first.
    pub fn journal(&self) -> Vec<StoreOp> {
        self.lock().journal.clone()
    }

    /// Only the write calls recorded so far.
    pub fn writes(&self) -> Vec<StoreOp> {
        self.lock()
            .journal
            .iter()
            .filter(|op| op.is_write())
            .cloned()
            .collect()
    }

    /// Forget the recorded calls, keeping the data.
    pub fn clear_journal(&self) {
        self.lock().journal.clear();
    }

    /// Make every later write to `table` fail with a backend error.
    pub fn fail_writes(&self, table: &str) {
        self.lock().failing.insert(table.to_string());
    }

    /// Undo [`MemoryStore::fail_writes`].
    pub fn restore_writes(&self, table: &str) {
        self.lock().failing.remove(table);
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PersistenceProvider for MemoryStore {
    fn find(&self, table: &str, id: i64) -> Result<Option<FieldMap>> {
        let mut state = self.lock();
        state.journal.push(StoreOp::Find {
            table: table.to_string(),
            id,
        });
        let found = state
            .tables
            .get(table)
            .and_then(|t| t.position(id).map(|pos| t.rows[pos].clone()));
        tracing::trace!(table = table, id = id, found = found.is_some(), "find");
        Ok(found)
    }

    fn save(&self, table: &str, id: Option<i64>, values: &FieldMap) -> Result<i64> {
        let mut state = self.lock();
        state.check_writable(table)?;

        let tbl = state.table(table);
        let (id, inserted) = match id.and_then(|id| tbl.position(id).map(|pos| (id, pos))) {
            Some((id, pos)) => {
                let row = &mut tbl.rows[pos];
                for (field, value) in values {
                    row.insert(field.clone(), value.clone());
                }
                (id, false)
            }
            None => {
                // Unknown ids are inserted as given, new rows take the next id.
                let id = id.unwrap_or(tbl.last_id + 1);
                let mut row = values.clone();
                row.insert("id".to_string(), Value::BigInt(id));
                tbl.track_id(&row);
                tbl.rows.push(row);
                (id, true)
            }
        };

        tracing::trace!(table = table, id = id, inserted = inserted, "save");
        state.journal.push(StoreOp::Save {
            table: table.to_string(),
            id,
            inserted,
        });
        Ok(id)
    }

    fn delete(&self, table: &str, id: i64) -> Result<()> {
        let mut state = self.lock();
        state.check_writable(table)?;

        // Deleting a row that is already gone is a no-op.
        let tbl = state.table(table);
        let removed = tbl.position(id).map(|pos| tbl.rows.remove(pos)).is_some();

        tracing::trace!(table = table, id = id, removed = removed, "delete");
        state.journal.push(StoreOp::Delete {
            table: table.to_string(),
            id,
        });
        Ok(())
    }

    fn insert_row(&self, table: &str, row: &FieldMap) -> Result<()> {
        let mut state = self.lock();
        state.check_writable(table)?;

        let tbl = state.table(table);
        tbl.track_id(row);
        tbl.rows.push(row.clone());

        state.journal.push(StoreOp::InsertRow {
            table: table.to_string(),
            row: row.clone(),
        });
        Ok(())
    }

    fn update_rows(&self, table: &str, set: &FieldMap, filter: &FieldMap) -> Result<u64> {
        let mut state = self.lock();
        state.check_writable(table)?;

        let mut affected = 0;
        for row in &mut state.table(table).rows {
            if matches(row, filter) {
                for (field, value) in set {
                    row.insert(field.clone(), value.clone());
                }
                affected += 1;
            }
        }

        tracing::trace!(table = table, affected = affected, "update_rows");
        state.journal.push(StoreOp::UpdateRows {
            table: table.to_string(),
            set: set.clone(),
            filter: filter.clone(),
            affected,
        });
        Ok(affected)
    }

    fn delete_rows(&self, table: &str, filter: &FieldMap) -> Result<u64> {
        let mut state = self.lock();
        state.check_writable(table)?;

        let tbl = state.table(table);
        let before = tbl.rows.len();
        tbl.rows.retain(|row| !matches(row, filter));
        let affected = (before - tbl.rows.len()) as u64;

        tracing::trace!(table = table, affected = affected, "delete_rows");
        state.journal.push(StoreOp::DeleteRows {
            table: table.to_string(),
            filter: filter.clone(),
            affected,
        });
        Ok(affected)
    }
}

fn row_id(row: &FieldMap) -> Option<i64> {
    row.get("id").and_then(Value::as_i64)
}

fn matches(row: &FieldMap, filter: &FieldMap) -> bool {
    filter.iter().all(|(field, expected)| {
        let actual = row.get(field).map(Value::normalize).unwrap_or_default();
        actual == expected.normalize()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ormext_core::{Table, field_map};

    #[test]
    fn test_save_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let a = store.save("orders", None, &field_map([("total", 5)])).unwrap();
        let b = store.save("orders", None, &FieldMap::new()).unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(store.row_count("orders"), 2);
        assert_eq!(
            store.row("orders", 1).unwrap().get("total"),
            Some(&Value::BigInt(5))
        );
    }

    #[test]
    fn test_save_existing_updates_in_place() {
        let store = MemoryStore::new();
        store.seed("orders", field_map([("id", 100_i64), ("total", 1)]));

        let id = store.save("orders", Some(100), &field_map([("total", 9)])).unwrap();
        assert_eq!(id, 100);
        assert_eq!(store.row_count("orders"), 1);
        assert_eq!(
            store.journal(),
            vec![StoreOp::Save {
                table: "orders".into(),
                id: 100,
                inserted: false,
            }]
        );

        // the seeded id advanced the counter
        assert_eq!(store.save("orders", None, &FieldMap::new()).unwrap(), 101);
    }

    #[test]
    fn test_find_and_delete() {
        let store = MemoryStore::new();
        store.seed("tags", field_map([("id", Value::BigInt(3)), ("label", Value::from("red"))]));

        let row = store.find("tags", 3).unwrap().unwrap();
        assert_eq!(row.get("label"), Some(&Value::from("red")));
        assert!(store.find("tags", 4).unwrap().is_none());

        store.delete("tags", 3).unwrap();
        assert_eq!(store.row_count("tags"), 0);

        store.delete("tags", 3).unwrap();
        assert_eq!(
            store.writes(),
            vec![
                StoreOp::Delete { table: "tags".into(), id: 3 },
                StoreOp::Delete { table: "tags".into(), id: 3 },
            ]
        );
    }

    #[test]
    fn test_raw_rows_match_loosely() {
        let store = MemoryStore::new();
        let table = Table::new(&store, "orders");
        store.seed("orders", field_map([("id", 1_i64), ("customer_id", 7_i64)]));
        store.seed("orders", field_map([("id", Value::BigInt(2)), ("customer_id", Value::from("7"))]));
        store.seed("orders", field_map([("id", 3_i64), ("customer_id", 8_i64)]));

        let changed = table
            .update(&field_map([("customer_id", 0)]), &field_map([("customer_id", 7)]))
            .unwrap();
        assert_eq!(changed, 2);
        assert_eq!(
            store.row("orders", 2).unwrap().get("customer_id"),
            Some(&Value::BigInt(0))
        );

        let removed = table.delete(&field_map([("customer_id", 8)])).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.row_count("orders"), 2);
    }

    #[test]
    fn test_insert_row_keeps_duplicates() {
        let store = MemoryStore::new();
        let row = field_map([("post_id", 10_i64), ("tag_id", 3_i64)]);
        store.insert_row("post_tags", &row).unwrap();
        store.insert_row("post_tags", &row).unwrap();
        assert_eq!(store.rows("post_tags"), vec![row.clone(), row]);
    }

    #[test]
    fn test_injected_failures_are_not_journaled() {
        let store = MemoryStore::new();
        store.fail_writes("orders");
        let err = store.save("orders", None, &FieldMap::new()).unwrap_err();
        assert!(err.is_store());
        assert!(store.journal().is_empty());

        store.restore_writes("orders");
        assert!(store.save("orders", None, &FieldMap::new()).is_ok());
    }

    #[test]
    fn test_writes_filter_skips_finds() {
        let store = MemoryStore::new();
        store.find("orders", 1).unwrap();
        assert_eq!(store.journal().len(), 1);
        assert!(store.writes().is_empty());
        store.clear_journal();
        assert!(store.journal().is_empty());
    }
}
