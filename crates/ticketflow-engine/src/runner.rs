//! Ticket runner: drives a ticket through repeated dispatch steps
//!
//! `run_workflow_step` advances a ticket by at most one dispatch;
//! `run_workflow` loops it until no further progress is possible in this
//! invocation. Both assume the caller holds an exclusive lock on the
//! ticket for the duration of the call — the read-modify-write of the
//! ticket's current task has no engine-level concurrency control.

use crate::{ElementProcessor, OperationRegistry, Storage};
use ticketflow_types::{
    FlowError, FlowResult, RunContext, Step, Task, TaskStatus, Ticket, Workflow,
};

/// Defensive bound on dispatch steps per `run_workflow` call.
///
/// A well-formed graph cannot cycle without a state change, but a
/// misconfigured one can; hitting the cap returns
/// [`FlowError::IterationLimit`] instead of spinning.
pub const MAX_RUN_STEPS: usize = 500;

/// Drives tickets through their workflow graphs
#[derive(Clone, Debug)]
pub struct TicketRunner {
    processor: ElementProcessor,
}

impl TicketRunner {
    /// Create a runner dispatching through the given registry
    pub fn new(registry: OperationRegistry) -> Self {
        Self {
            processor: ElementProcessor::new(registry),
        }
    }

    /// The element processor this runner delegates to
    pub fn processor(&self) -> &ElementProcessor {
        &self.processor
    }

    /// Create a new unsaved ticket bound to a workflow and the acting
    /// user. The workflow must be able to accept tickets (exactly one
    /// initial element).
    pub fn create_ticket(&self, workflow: &Workflow, ctx: &RunContext) -> FlowResult<Ticket> {
        workflow.validate()?;
        Ok(Ticket::new(workflow, ctx.user.clone()))
    }

    /// Run a single workflow step on a ticket.
    ///
    /// Determines the current task — a brand-new empty task at the
    /// initial element for a never-checked ticket, otherwise the most
    /// recent task on record — and delegates to the element processor
    /// once. The produced task (if any) is returned unsaved.
    pub fn run_workflow_step(
        &self,
        ticket: &Ticket,
        workflow: &Workflow,
        ctx: &RunContext,
        store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>> {
        if ticket.workflow_id != workflow.id {
            return Err(FlowError::WorkflowMismatch {
                expected: ticket.workflow_id.clone(),
                found: workflow.id.clone(),
            });
        }

        let pre_task = if !ticket.has_run() {
            let initial = workflow
                .initial_element()
                .ok_or_else(|| FlowError::NoInitialElement(workflow.id.clone()))?;
            let step = Step::new(ticket.id.clone(), initial.id.clone());
            store.insert_step(step.clone())?;
            Task::empty(ticket, &step, ctx.user.clone())
        } else {
            match store.latest_task_for_ticket(&ticket.id)? {
                Some(task) => task,
                None => return Ok(None),
            }
        };

        let element = match workflow.element(&pre_task.element_id) {
            Some(element) => element.clone(),
            None => return Ok(self.stop_on_unresolvable_element(&pre_task, ctx)),
        };

        self.processor
            .process_task(&pre_task, &element, workflow, ctx, store)
    }

    /// Run workflow steps until no progress is made.
    ///
    /// Stamps `last_check`/`last_checkor`, persists every intermediate
    /// task and finally the ticket, and returns the last task produced
    /// (or `None` when no progress was made at all).
    pub fn run_workflow(
        &self,
        ticket: &mut Ticket,
        workflow: &Workflow,
        ctx: &RunContext,
        store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>> {
        let mut last_task: Option<Task> = None;

        for _ in 0..MAX_RUN_STEPS {
            let task = self.run_workflow_step(ticket, workflow, ctx, store)?;
            ticket.mark_checked(ctx.user.clone());

            match task {
                None => {
                    store.save_ticket(ticket)?;
                    if let Some(last) = &last_task {
                        tracing::info!(
                            ticket_id = %ticket.id,
                            status = %last.status,
                            "Ticket run settled"
                        );
                    }
                    return Ok(last_task);
                }
                Some(task) => {
                    store.insert_task(task.clone())?;
                    last_task = Some(task);
                }
            }
        }

        Err(FlowError::IterationLimit {
            ticket: ticket.id.clone(),
            limit: MAX_RUN_STEPS,
        })
    }

    /// The current task points at an element missing from the workflow
    /// definition. Error tasks stop here as Terminated; anything else
    /// enters the error state so the run halts on the next dispatch.
    fn stop_on_unresolvable_element(&self, pre_task: &Task, ctx: &RunContext) -> Option<Task> {
        if pre_task.is_terminal() {
            return None;
        }
        tracing::warn!(
            ticket_id = %pre_task.ticket_id,
            element_id = %pre_task.element_id,
            "Current task's element is missing from the workflow"
        );
        let next = match pre_task.status {
            TaskStatus::Error => pre_task.derive(ctx).with_status(TaskStatus::Terminated),
            _ => crate::enter_error_state(pre_task, ctx, "element not resolvable in workflow"),
        };
        Some(next)
    }
}

impl Default for TicketRunner {
    /// A runner carrying only the built-in operations, with no scripts
    /// registered.
    fn default() -> Self {
        let registry = crate::ops::builtin_registry(crate::ops::ScriptOperation::new())
            .expect("builtin operation slugs are distinct");
        Self::new(registry)
    }
}
