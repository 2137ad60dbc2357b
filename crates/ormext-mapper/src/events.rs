//! Per-entity registration of post-operation hooks.

use std::collections::HashMap;
use std::sync::Arc;

use ormext_core::EntityEvents;

/// Hook implementations keyed by entity type name.
///
/// Types without an entry are not notified.
#[derive(Clone, Default)]
pub struct EventRegistry {
    hooks: HashMap<String, Arc<dyn EntityEvents>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register hooks for `entity`, replacing earlier ones.
    pub fn register(&mut self, entity: impl Into<String>, hooks: Arc<dyn EntityEvents>) {
        self.hooks.insert(entity.into(), hooks);
    }

    /// Hooks registered for `entity`.
    pub fn get(&self, entity: &str) -> Option<&dyn EntityEvents> {
        self.hooks.get(entity).map(|h| h.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut entities: Vec<&str> = self.hooks.keys().map(String::as_str).collect();
        entities.sort_unstable();
        f.debug_struct("EventRegistry")
            .field("entities", &entities)
            .finish()
    }
}
