//! Error types for the ticketflow layers
//!
//! Two families: `FlowError` for engine and graph-model faults, and
//! `StorageError` for persistence-collaborator faults. Storage faults
//! propagate to the caller uncaught; the engine never retries writes.

use crate::{ElementId, StepId, TicketId, WorkflowId};
use chrono::{DateTime, Utc};

/// Errors surfaced by the graph model and the execution core
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Operation already registered: {0}")]
    DuplicateOperation(String),

    #[error("Workflow has no initial element: {0}")]
    NoInitialElement(WorkflowId),

    #[error("Workflow already has an initial element: {0}")]
    DuplicateInitialElement(WorkflowId),

    #[error("Duplicate element slug in workflow: {0}")]
    DuplicateElementSlug(String),

    #[error("Link endpoint is not an element of this workflow: {0}")]
    LinkEndpointMissing(ElementId),

    #[error("Ticket belongs to workflow {expected}, got {found}")]
    WorkflowMismatch {
        expected: WorkflowId,
        found: WorkflowId,
    },

    #[error("Run exceeded {limit} steps on ticket {ticket}")]
    IterationLimit { ticket: TicketId, limit: usize },

    #[error("Script error: {0}")]
    Script(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors raised by a storage collaborator
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Duplicate task for step {step} at {creation}")]
    DuplicateTask {
        step: StepId,
        creation: DateTime<Utc>,
    },

    #[error("Ticket not found: {0}")]
    TicketNotFound(TicketId),

    #[error("Step not found: {0}")]
    StepNotFound(StepId),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result type alias for flow operations
pub type FlowResult<T> = Result<T, FlowError>;
