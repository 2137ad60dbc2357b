//! Shared collaborators handed to every mapper component.

use ormext_core::{Error, MetadataProvider, PersistenceProvider, Result};

use crate::config::MapperConfig;
use crate::events::EventRegistry;

/// Borrowed view of the mapper's collaborators.
#[derive(Clone, Copy)]
pub struct MapperContext<'a> {
    pub metadata: &'a dyn MetadataProvider,
    pub store: &'a dyn PersistenceProvider,
    pub config: &'a MapperConfig,
    pub events: &'a EventRegistry,
}

impl<'a> MapperContext<'a> {
    /// Apply the skip-and-continue policy to a recoverable error.
    ///
    /// Lenient mode logs and yields `T::default()` (a no-op result); strict
    /// mode returns the error. Store errors must not be routed through here.
    pub(crate) fn skip<T: Default>(&self, err: Error) -> Result<T> {
        if self.config.strict {
            return Err(err);
        }
        tracing::debug!(error = %err, "Skipping operation");
        Ok(T::default())
    }
}

impl std::fmt::Debug for MapperContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapperContext")
            .field("config", self.config)
            .field("events", self.events)
            .finish_non_exhaustive()
    }
}
