//! Mapper configuration.

use chrono::{FixedOffset, Offset, Utc};
use ormext_core::{ConfigError, Result};

/// Configuration for a [`Mapper`](crate::Mapper).
///
/// All settings have working defaults; nothing is read from files or the
/// environment.
#[derive(Debug, Clone)]
pub struct MapperConfig {
    /// Zone that stored timestamps are written in. Default UTC+01:00.
    pub source_offset: FixedOffset,
    /// Timestamp value meaning "never". Serializes to `null`.
    pub zero_timestamp: &'static str,
    /// Table field whose presence enables soft delete.
    pub deletion_field: &'static str,
    /// Entity type saved as the soft-delete marker.
    pub deletion_entity: &'static str,
    /// Return metadata and missing-endpoint errors instead of skipping.
    pub strict: bool,
    /// Let an owner-table save cascade persist a transient owner.
    pub link_transient_owner: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            source_offset: FixedOffset::east_opt(3600).unwrap_or_else(|| Utc.fix()),
            zero_timestamp: "0000-00-00 00:00:00",
            deletion_field: "deletion_id",
            deletion_entity: "Deletion",
            strict: false,
            link_transient_owner: false,
        }
    }
}

impl MapperConfig {
    /// Create a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the zone stored timestamps are written in.
    #[must_use]
    pub fn source_offset(mut self, offset: FixedOffset) -> Self {
        self.source_offset = offset;
        self
    }

    /// Set the source zone as whole hours east of UTC.
    ///
    /// Fails for offsets outside -23..=23.
    pub fn with_source_offset_hours(mut self, hours: i32) -> Result<Self> {
        let offset = hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ConfigError {
                message: format!("source offset of {hours} hours is out of range"),
                source: None,
            })?;
        self.source_offset = offset;
        Ok(self)
    }

    #[must_use]
    pub fn zero_timestamp(mut self, sentinel: &'static str) -> Self {
        self.zero_timestamp = sentinel;
        self
    }

    #[must_use]
    pub fn deletion_field(mut self, field: &'static str) -> Self {
        self.deletion_field = field;
        self
    }

    #[must_use]
    pub fn deletion_entity(mut self, entity: &'static str) -> Self {
        self.deletion_entity = entity;
        self
    }

    /// Enable or disable strict mode.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub fn link_transient_owner(mut self, enabled: bool) -> Self {
        self.link_transient_owner = enabled;
        self
    }
}
