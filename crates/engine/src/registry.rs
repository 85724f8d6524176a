//! Handler Registry — a concurrent `job_type -> Handler` map (spec §4.3).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::EngineError;
use crate::handler::Handler;

/// Maps a `job_type` string to exactly one [`Handler`] implementation.
///
/// Registration rejects an empty type and duplicates; lookup is a lock-read
/// (spec §4.3). A `parking_lot::RwLock<HashMap<...>>` mirrors the
/// concurrent-map idiom the teacher uses for its worker/session registries.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn Handler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Rejects an empty `job_type` and a second
    /// registration for a `job_type` already claimed.
    pub fn register(&self, handler: Arc<dyn Handler>) -> Result<(), EngineError> {
        let job_type = handler.job_type().to_string();
        if job_type.is_empty() {
            return Err(EngineError::EmptyHandlerType);
        }
        let mut handlers = self.handlers.write();
        if handlers.contains_key(&job_type) {
            return Err(EngineError::DuplicateHandler(job_type));
        }
        tracing::debug!(job_type, "registered handler");
        handlers.insert(job_type, handler);
        Ok(())
    }

    /// Look up the handler for `job_type`, if any is registered.
    pub fn get(&self, job_type: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.read().get(job_type).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
