//! Operation registry: stable identifier → constructed handler
//!
//! Handlers are registered once at startup and never re-resolved per
//! call. Registration failures (duplicate slug) and lookups of unknown
//! slugs surface immediately as configuration faults.

use crate::OperationHandler;
use std::collections::HashMap;
use std::sync::Arc;
use ticketflow_types::{FlowError, FlowResult, OperationDescriptor};

/// Registry of operation handlers keyed by operation slug
#[derive(Clone, Default)]
pub struct OperationRegistry {
    handlers: HashMap<String, Arc<dyn OperationHandler>>,
    descriptors: Vec<OperationDescriptor>,
}

impl OperationRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its descriptor's slug.
    ///
    /// Fails if the slug is already taken.
    pub fn register(
        &mut self,
        descriptor: OperationDescriptor,
        handler: Arc<dyn OperationHandler>,
    ) -> FlowResult<()> {
        if self.handlers.contains_key(&descriptor.slug) {
            return Err(FlowError::DuplicateOperation(descriptor.slug));
        }
        tracing::info!(operation = %descriptor.slug, "Operation registered");
        self.handlers.insert(descriptor.slug.clone(), handler);
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Resolve a handler by operation slug
    pub fn resolve(&self, slug: &str) -> FlowResult<Arc<dyn OperationHandler>> {
        self.handlers
            .get(slug)
            .cloned()
            .ok_or_else(|| FlowError::UnknownOperation(slug.to_string()))
    }

    /// Check if an operation is registered
    pub fn contains(&self, slug: &str) -> bool {
        self.handlers.contains_key(slug)
    }

    /// Descriptors of all registered operations
    pub fn descriptors(&self) -> &[OperationDescriptor] {
        &self.descriptors
    }

    /// Number of registered operations
    pub fn count(&self) -> usize {
        self.handlers.len()
    }
}

impl std::fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("operations", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
