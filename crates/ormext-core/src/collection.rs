//! Ordered record collections with a lazily built id index.
//!
//! The index is built on first lookup and thrown away (not patched) on every
//! membership change, so it can never disagree with the members.

use std::cell::OnceCell;
use std::collections::HashMap;

use crate::record::{Existence, Record};

/// An ordered group of records sharing the [`Existence`] contract.
#[derive(Debug, Clone, Default)]
pub struct RecordCollection {
    items: Vec<Record>,
    /// id -> position in `items`. Empty cell means "not built".
    index: OnceCell<HashMap<i64, usize>>,
}

impl RecordCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    pub fn add(&mut self, item: Record) {
        self.items.push(item);
        self.invalidate();
    }

    /// Remove the first member structurally equal to `item`.
    pub fn remove(&mut self, item: &Record) -> Option<Record> {
        let pos = self.items.iter().position(|r| r == item);
        self.invalidate();
        pos.map(|pos| self.items.remove(pos))
    }

    /// Remove the member indexed under `id`.
    pub fn remove_by_id(&mut self, id: i64) -> Option<Record> {
        let indexed = *self.index().get(&id)?;
        let pos = self
            .items
            .iter()
            .position(|r| r == &self.items[indexed])
            .unwrap_or(indexed);
        self.invalidate();
        Some(self.items.remove(pos))
    }

    /// Look up a member by id, building the index if needed.
    pub fn get_by_id(&self, id: i64) -> Option<&Record> {
        self.index().get(&id).map(|pos| &self.items[*pos])
    }

    /// Mutable lookup by id.
    ///
    /// The index is dropped afterwards since the caller may change the id.
    pub fn get_by_id_mut(&mut self, id: i64) -> Option<&mut Record> {
        let pos = *self.index().get(&id)?;
        self.invalidate();
        self.items.get_mut(pos)
    }

    /// Is there a member with this id?
    pub fn has_id(&self, id: i64) -> bool {
        self.index().contains_key(&id)
    }

    /// Remove all members.
    pub fn clear(&mut self) {
        self.items.clear();
        self.invalidate();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first(&self) -> Option<&Record> {
        self.items.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.items.iter()
    }

    /// Mutable iteration. Drops the index, as members' ids may change.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Record> {
        self.invalidate();
        self.items.iter_mut()
    }

    /// Members as a slice.
    pub fn as_slice(&self) -> &[Record] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<Record> {
        self.items
    }

    /// Has the id index been built since the last membership change?
    pub fn is_indexed(&self) -> bool {
        self.index.get().is_some()
    }

    fn index(&self) -> &HashMap<i64, usize> {
        self.index.get_or_init(|| {
            // Later members win on duplicate ids; unpersisted members are not indexed.
            let map: HashMap<i64, usize> = self
                .items
                .iter()
                .enumerate()
                .filter_map(|(pos, rec)| rec.id().map(|id| (id, pos)))
                .collect();
            tracing::trace!(members = self.items.len(), indexed = map.len(), "Built id index");
            map
        })
    }

    fn invalidate(&mut self) {
        self.index.take();
    }
}

impl PartialEq for RecordCollection {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Existence for RecordCollection {
    fn exists(&self) -> bool {
        !self.items.is_empty()
    }

    fn count(&self) -> usize {
        self.items.len()
    }
}

impl From<Vec<Record>> for RecordCollection {
    fn from(items: Vec<Record>) -> Self {
        Self {
            items,
            index: OnceCell::new(),
        }
    }
}

impl FromIterator<Record> for RecordCollection {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl IntoIterator for RecordCollection {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordCollection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Extend<Record> for RecordCollection {
    fn extend<I: IntoIterator<Item = Record>>(&mut self, iter: I) {
        self.items.extend(iter);
        self.invalidate();
    }
}
