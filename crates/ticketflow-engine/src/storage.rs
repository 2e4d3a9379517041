//! Storage collaborator: the persistence seam the engine writes through
//!
//! The engine never owns storage. Every handler and the runner receive a
//! [`Storage`] implementation; constraint violations propagate to the
//! caller uncaught and the engine never retries a write.
//!
//! [`MemoryStorage`] is the HashMap-backed reference implementation used
//! by the test suite and by callers that do not need durability.

use std::collections::HashMap;
use ticketflow_types::{
    OperatorTask, Step, StepId, StorageError, Task, Ticket, TicketId,
};

/// Persistence interface for tickets, steps, tasks, and operator tasks.
///
/// Implementations must enforce the `(step, creation)` uniqueness of
/// tasks; the engine relies on it for monotonic task history.
pub trait Storage {
    fn insert_step(&mut self, step: Step) -> Result<(), StorageError>;

    fn step(&self, id: &StepId) -> Result<Option<Step>, StorageError>;

    fn steps_for_ticket(&self, ticket: &TicketId) -> Result<Vec<Step>, StorageError>;

    /// Append a task to the history. Fails with
    /// [`StorageError::DuplicateTask`] if a task already exists for the
    /// same step and creation timestamp.
    fn insert_task(&mut self, task: Task) -> Result<(), StorageError>;

    /// The current task for a ticket: the most recently created task
    /// across all of its steps, ties resolved by insertion order.
    fn latest_task_for_ticket(&self, ticket: &TicketId) -> Result<Option<Task>, StorageError>;

    fn tasks_for_ticket(&self, ticket: &TicketId) -> Result<Vec<Task>, StorageError>;

    fn save_ticket(&mut self, ticket: &Ticket) -> Result<(), StorageError>;

    fn ticket(&self, id: &TicketId) -> Result<Option<Ticket>, StorageError>;

    fn insert_operator_task(&mut self, task: OperatorTask) -> Result<(), StorageError>;

    fn operator_tasks_for_step(&self, step: &StepId) -> Result<Vec<OperatorTask>, StorageError>;

    /// Idempotent: removing for a step with no operator tasks succeeds.
    fn remove_operator_tasks_for_step(&mut self, step: &StepId) -> Result<(), StorageError>;
}

// ── In-memory storage ────────────────────────────────────────────────

/// HashMap-backed storage for tests and embedded use
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    tickets: HashMap<TicketId, Ticket>,
    steps: HashMap<StepId, Step>,
    tasks: Vec<Task>,
    operator_tasks: Vec<OperatorTask>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of tasks across all tickets
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Total number of steps across all tickets
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Total number of outstanding operator tasks
    pub fn operator_task_count(&self) -> usize {
        self.operator_tasks.len()
    }
}

impl Storage for MemoryStorage {
    fn insert_step(&mut self, step: Step) -> Result<(), StorageError> {
        self.steps.insert(step.id.clone(), step);
        Ok(())
    }

    fn step(&self, id: &StepId) -> Result<Option<Step>, StorageError> {
        Ok(self.steps.get(id).cloned())
    }

    fn steps_for_ticket(&self, ticket: &TicketId) -> Result<Vec<Step>, StorageError> {
        let mut steps: Vec<Step> = self
            .steps
            .values()
            .filter(|s| &s.ticket_id == ticket)
            .cloned()
            .collect();
        steps.sort_by_key(|s| s.creation);
        Ok(steps)
    }

    fn insert_task(&mut self, task: Task) -> Result<(), StorageError> {
        if self
            .tasks
            .iter()
            .any(|t| t.step_id == task.step_id && t.creation == task.creation)
        {
            return Err(StorageError::DuplicateTask {
                step: task.step_id,
                creation: task.creation,
            });
        }
        self.tasks.push(task);
        Ok(())
    }

    fn latest_task_for_ticket(&self, ticket: &TicketId) -> Result<Option<Task>, StorageError> {
        Ok(self
            .tasks
            .iter()
            .filter(|t| &t.ticket_id == ticket)
            .max_by_key(|t| t.creation)
            .cloned())
    }

    fn tasks_for_ticket(&self, ticket: &TicketId) -> Result<Vec<Task>, StorageError> {
        let mut tasks: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| &t.ticket_id == ticket)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.creation);
        Ok(tasks)
    }

    fn save_ticket(&mut self, ticket: &Ticket) -> Result<(), StorageError> {
        self.tickets.insert(ticket.id.clone(), ticket.clone());
        Ok(())
    }

    fn ticket(&self, id: &TicketId) -> Result<Option<Ticket>, StorageError> {
        Ok(self.tickets.get(id).cloned())
    }

    fn insert_operator_task(&mut self, task: OperatorTask) -> Result<(), StorageError> {
        self.operator_tasks.push(task);
        Ok(())
    }

    fn operator_tasks_for_step(&self, step: &StepId) -> Result<Vec<OperatorTask>, StorageError> {
        Ok(self
            .operator_tasks
            .iter()
            .filter(|o| &o.step_id == step)
            .cloned()
            .collect())
    }

    fn remove_operator_tasks_for_step(&mut self, step: &StepId) -> Result<(), StorageError> {
        self.operator_tasks.retain(|o| &o.step_id != step);
        Ok(())
    }
}
