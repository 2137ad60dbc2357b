//! Snapshot-based dirty detection for records.
//!
//! A record carries a snapshot of string-normalized values captured at load
//! and after each successful save. A record is dirty when any table field's
//! normalized current value differs from its snapshot entry; a missing entry
//! counts as the empty string.

use ormext_core::{MetadataProvider, Record, Result};

/// Compares records against their snapshots.
#[derive(Clone, Copy)]
pub struct ChangeTracker<'a> {
    metadata: &'a dyn MetadataProvider,
}

impl<'a> ChangeTracker<'a> {
    pub fn new(metadata: &'a dyn MetadataProvider) -> Self {
        Self { metadata }
    }

    /// Has any table field changed since the last load or save?
    ///
    /// If the entity type is unknown this answers `false` ("assume
    /// unchanged"), in strict mode too. Use [`ChangeTracker::try_has_change`]
    /// to see the failure.
    #[tracing::instrument(level = "trace", skip(self, record), fields(entity = record.entity()))]
    pub fn has_change(&self, record: &Record) -> bool {
        match self.try_has_change(record) {
            Ok(dirty) => dirty,
            Err(err) => {
                tracing::debug!(error = %err, "Change detection failed, assuming unchanged");
                false
            }
        }
    }

    /// Like [`ChangeTracker::has_change`], but reports metadata failures.
    pub fn try_has_change(&self, record: &Record) -> Result<bool> {
        let fields = self.metadata.field_definitions(record.entity())?;
        let dirty = fields.iter().any(|f| is_changed(record, f.name));
        tracing::trace!(dirty = dirty, "Dirty check result");
        Ok(dirty)
    }

    /// Names of the table fields that changed, in declaration order.
    ///
    /// Empty when the entity type is unknown.
    pub fn changed_fields(&self, record: &Record) -> Vec<&'static str> {
        self.metadata
            .field_definitions(record.entity())
            .map(|fields| {
                fields
                    .iter()
                    .map(|f| f.name)
                    .filter(|name| is_changed(record, name))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Recapture the snapshot from the current values of all table fields.
    ///
    /// Returns `false` (and leaves the snapshot alone) if the entity type is
    /// unknown.
    #[tracing::instrument(level = "trace", skip(self, record), fields(entity = record.entity()))]
    pub fn reset_stored_fields(&self, record: &mut Record) -> bool {
        match self.metadata.field_names(record.entity()) {
            Ok(names) => {
                record.capture_snapshot(names);
                true
            }
            Err(err) => {
                tracing::debug!(error = %err, "Cannot reset snapshot");
                false
            }
        }
    }
}

impl std::fmt::Debug for ChangeTracker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeTracker").finish_non_exhaustive()
    }
}

/// Does `field` differ from its snapshot entry?
pub(crate) fn is_changed(record: &Record, field: &str) -> bool {
    record.value(field).normalize() != record.stored(field).unwrap_or_default()
}
