//! Tasks: the append-only units of work-state for a ticket
//!
//! A Task captures the ticket's state at a step with a status from the
//! task state machine. Tasks are never mutated after creation — progress
//! is recorded by deriving a new task from the current one. The current
//! task for a ticket is always the most recently created one across all
//! of its steps.

use crate::{ElementId, RunContext, Step, StepId, Ticket, TicketId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON object used for task state and element parameters
pub type JsonMap = serde_json::Map<String, Value>;

// ── Task Status ──────────────────────────────────────────────────────

/// The status lifecycle of a task.
///
/// Which statuses an operation reacts to is up to the operation; the
/// engine itself only distinguishes terminal from non-terminal and
/// applies the Finished/Terminated synthesis on dead ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    /// Freshly created, not yet processed by its element
    #[default]
    New,
    /// Paused pending external resolution
    Waiting,
    /// External resolution arrived; ready to progress
    Updated,
    /// The element's work is done; traversal may move on
    Completed,
    /// The element failed; state carries the error message
    Error,
    /// Terminal: completed with no further element to move to
    Finished,
    /// Terminal: errored with no recovery path
    Terminated,
}

impl TaskStatus {
    /// Check if this status ends the ticket's progression
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Terminated)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::New => "new",
            Self::Waiting => "waiting",
            Self::Updated => "updated",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Finished => "finished",
            Self::Terminated => "terminated",
        };
        write!(f, "{}", label)
    }
}

// ── Identifiers ──────────────────────────────────────────────────────

/// Unique identifier for a task
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Task ─────────────────────────────────────────────────────────────

/// One immutable unit of work-state for a ticket at a step
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,
    /// The ticket this task advances
    pub ticket_id: TicketId,
    /// The step this task belongs to
    pub step_id: StepId,
    /// The element captured by the step, denormalized for cheap resolution
    pub element_id: ElementId,
    /// When the task was created
    pub creation: DateTime<Utc>,
    /// Operation-defined state accumulated as the ticket progresses
    pub state: JsonMap,
    /// Who created the task
    pub creator: UserId,
    /// Position in the task state machine
    pub status: TaskStatus,
}

impl Task {
    /// The lazily-materialized first task of a ticket: empty state, New
    pub fn empty(ticket: &Ticket, step: &Step, creator: UserId) -> Self {
        Self {
            id: TaskId::generate(),
            ticket_id: ticket.id.clone(),
            step_id: step.id.clone(),
            element_id: step.element_id.clone(),
            creation: Utc::now(),
            state: JsonMap::new(),
            creator,
            status: TaskStatus::New,
        }
    }

    /// Derive a successor task: fresh identity and creation time, same
    /// step linkage, state, and status. The ancestor is left untouched.
    pub fn derive(&self, ctx: &RunContext) -> Self {
        Self {
            id: TaskId::generate(),
            ticket_id: self.ticket_id.clone(),
            step_id: self.step_id.clone(),
            element_id: self.element_id.clone(),
            creation: Utc::now(),
            state: self.state.clone(),
            creator: ctx.user.clone(),
            status: self.status,
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_state(mut self, state: JsonMap) -> Self {
        self.state = state;
        self
    }

    /// Re-bind this task to a new step (after crossing a link)
    pub fn at_step(mut self, step: &Step) -> Self {
        self.step_id = step.id.clone();
        self.element_id = step.element_id.clone();
        self
    }

    /// Turn this task into an Error task, preserving the prior state
    /// alongside the message for diagnosis.
    pub fn into_error(mut self, message: impl Into<String>) -> Self {
        let mut wrapped = JsonMap::new();
        wrapped.insert("state".into(), Value::Object(std::mem::take(&mut self.state)));
        wrapped.insert("error".into(), Value::String(message.into()));
        self.state = wrapped;
        self.status = TaskStatus::Error;
        self
    }

    /// Check if this task ends the ticket's progression
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// ── Operator Task ────────────────────────────────────────────────────

/// Unique identifier for an operator task
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperatorTaskId(pub String);

impl OperatorTaskId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for OperatorTaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Work assigned to a human operator while a task is Waiting.
///
/// Created by the external-task protocol and removed again on cleanup;
/// at most one per step while waiting.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OperatorTask {
    /// Unique identifier
    pub id: OperatorTaskId,
    /// The step whose task is waiting on this work
    pub step_id: StepId,
    /// The operator the work is assigned to
    pub operator: UserId,
    /// When the work was assigned
    pub creation: DateTime<Utc>,
}

impl OperatorTask {
    pub fn new(step_id: StepId, operator: UserId) -> Self {
        Self {
            id: OperatorTaskId::generate(),
            step_id,
            operator,
            creation: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Element, Workflow};

    fn make_fixture() -> (Workflow, Ticket, Step) {
        let mut wf = Workflow::new("Test", "test");
        wf.add_element(Element::new("start", "__init").initial())
            .unwrap();
        let ticket = Ticket::new(&wf, UserId::new("alice"));
        let step = Step::new(
            ticket.id.clone(),
            wf.initial_element().unwrap().id.clone(),
        );
        (wf, ticket, step)
    }

    #[test]
    fn test_empty_task() {
        let (_, ticket, step) = make_fixture();
        let task = Task::empty(&ticket, &step, UserId::new("alice"));
        assert_eq!(task.status, TaskStatus::New);
        assert!(task.state.is_empty());
        assert_eq!(task.element_id, step.element_id);
    }

    #[test]
    fn test_derive_leaves_ancestor_untouched() {
        let (_, ticket, step) = make_fixture();
        let mut original = Task::empty(&ticket, &step, UserId::new("alice"));
        original
            .state
            .insert("x".into(), serde_json::json!(1));

        let ctx = RunContext::new(UserId::new("bob"));
        let derived = original
            .derive(&ctx)
            .with_status(TaskStatus::Completed)
            .with_state({
                let mut m = JsonMap::new();
                m.insert("x".into(), serde_json::json!(2));
                m
            });

        assert_eq!(original.state.get("x"), Some(&serde_json::json!(1)));
        assert_eq!(original.status, TaskStatus::New);
        assert_eq!(derived.state.get("x"), Some(&serde_json::json!(2)));
        assert_eq!(derived.creator.as_str(), "bob");
        assert_ne!(original.id, derived.id);
        assert_eq!(original.step_id, derived.step_id);
    }

    #[test]
    fn test_into_error_preserves_prior_state() {
        let (_, ticket, step) = make_fixture();
        let mut task = Task::empty(&ticket, &step, UserId::new("alice"));
        task.state.insert("progress".into(), serde_json::json!(3));

        let errored = task.into_error("operation failed");
        assert_eq!(errored.status, TaskStatus::Error);
        assert_eq!(
            errored.state.get("error"),
            Some(&serde_json::json!("operation failed"))
        );
        assert_eq!(
            errored.state.get("state"),
            Some(&serde_json::json!({"progress": 3}))
        );
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(TaskStatus::Finished.is_terminal());
        assert!(TaskStatus::Terminated.is_terminal());
        assert!(!TaskStatus::New.is_terminal());
        assert!(!TaskStatus::Waiting.is_terminal());
        assert!(!TaskStatus::Completed.is_terminal());
        assert!(!TaskStatus::Error.is_terminal());
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(format!("{}", TaskStatus::New), "new");
        assert_eq!(format!("{}", TaskStatus::Terminated), "terminated");
    }

    #[test]
    fn test_operator_task() {
        let (_, ticket, step) = make_fixture();
        let op = OperatorTask::new(step.id.clone(), UserId::new("operator-1"));
        assert_eq!(op.step_id, step.id);
        assert_ne!(op.id.0, ticket.id.0);
    }
}
