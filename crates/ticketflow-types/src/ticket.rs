//! Tickets and steps: one execution of a workflow and its trail
//!
//! A Ticket is a single run of a workflow for a creator. A Step records
//! that the ticket has reached a specific element; steps accumulate as the
//! ticket crosses links, forming the occupancy history of the run.

use crate::{ElementId, UserId, Workflow, WorkflowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Identifiers ──────────────────────────────────────────────────────

/// Unique identifier for a ticket
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(pub String);

impl TicketId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a step
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(pub String);

impl StepId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Ticket ───────────────────────────────────────────────────────────

/// One execution instance of a workflow
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique identifier
    pub id: TicketId,
    /// The workflow this ticket runs against
    pub workflow_id: WorkflowId,
    /// When the ticket was created
    pub creation: DateTime<Utc>,
    /// Who created the ticket
    pub creator: UserId,
    /// When the ticket was last advanced; None if never run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_check: Option<DateTime<Utc>>,
    /// Who last advanced the ticket
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checkor: Option<UserId>,
}

impl Ticket {
    /// Create a new unsaved ticket bound to a workflow and creator
    pub fn new(workflow: &Workflow, creator: UserId) -> Self {
        Self {
            id: TicketId::generate(),
            workflow_id: workflow.id.clone(),
            creation: Utc::now(),
            creator,
            last_check: None,
            last_checkor: None,
        }
    }

    /// Whether the ticket has ever been advanced
    pub fn has_run(&self) -> bool {
        self.last_check.is_some()
    }

    /// Stamp the ticket as checked now by the given actor
    pub fn mark_checked(&mut self, checkor: UserId) {
        self.last_check = Some(Utc::now());
        self.last_checkor = Some(checkor);
    }
}

// ── Step ─────────────────────────────────────────────────────────────

/// A record of a ticket's occupancy at a particular element
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Step {
    /// Unique identifier
    pub id: StepId,
    /// The ticket this step belongs to
    pub ticket_id: TicketId,
    /// The element the ticket reached
    pub element_id: ElementId,
    /// When the ticket arrived here
    pub creation: DateTime<Utc>,
}

impl Step {
    /// Record arrival of a ticket at an element
    pub fn new(ticket_id: TicketId, element_id: ElementId) -> Self {
        Self {
            id: StepId::generate(),
            ticket_id,
            element_id,
            creation: Utc::now(),
        }
    }
}
