//! External-task protocol: pause a ticket until an outside actor resolves it
//!
//! An external operation puts its task into Waiting and parks the ticket
//! there; the run stalls until someone calls [`mark_updated`] on the
//! waiting task and persists the Updated task it returns. The next run
//! resumes from Updated, cleans up, and moves on.
//!
//! Implementors provide the three protocol points ([`ExternalOperation::begin`],
//! [`ExternalOperation::resume`], [`ExternalOperation::cleanup_task`]) and
//! register the operation wrapped in [`External`], which wires them into the
//! status dispatch. All three are required methods, so forgetting one is a
//! compile error rather than a silent no-op.

use crate::{move_to_next, OperationHandler, Storage};
use ticketflow_types::{
    Element, FlowResult, OperatorTask, RunContext, Task, TaskStatus, Workflow, DEFAULT_OUTCOME,
};

/// Contract for operations whose work happens outside the engine.
///
/// All three methods are required. `begin` must be idempotent: a task
/// re-dispatched at New must not duplicate external side effects.
pub trait ExternalOperation: Send + Sync {
    /// Start the external work and return the Waiting task
    fn begin(
        &self,
        task: &Task,
        element: &Element,
        workflow: &Workflow,
        ctx: &RunContext,
        store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>>;

    /// The external work reported back; decide how the task proceeds
    fn resume(
        &self,
        task: &Task,
        element: &Element,
        workflow: &Workflow,
        ctx: &RunContext,
        store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>>;

    /// Tear down whatever `begin` set up; runs on completion and on error
    fn cleanup_task(
        &self,
        task: &Task,
        element: &Element,
        workflow: &Workflow,
        ctx: &RunContext,
        store: &mut dyn Storage,
    ) -> FlowResult<()>;
}

/// Adapter binding an [`ExternalOperation`] into the status dispatch
#[derive(Clone, Copy, Debug, Default)]
pub struct External<T>(pub T);

impl<T: ExternalOperation> OperationHandler for External<T> {
    fn on_new(
        &self,
        task: &Task,
        element: &Element,
        workflow: &Workflow,
        ctx: &RunContext,
        store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>> {
        self.0.begin(task, element, workflow, ctx, store)
    }

    /// Waiting is the parked state: no progress until marked updated
    fn on_waiting(
        &self,
        _task: &Task,
        _element: &Element,
        _workflow: &Workflow,
        _ctx: &RunContext,
        _store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>> {
        Ok(None)
    }

    fn on_updated(
        &self,
        task: &Task,
        element: &Element,
        workflow: &Workflow,
        ctx: &RunContext,
        store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>> {
        self.0.resume(task, element, workflow, ctx, store)
    }

    fn on_completed(
        &self,
        task: &Task,
        element: &Element,
        workflow: &Workflow,
        ctx: &RunContext,
        store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>> {
        self.0.cleanup_task(task, element, workflow, ctx, store)?;
        move_to_next(task, element, workflow, DEFAULT_OUTCOME, ctx, store)
    }

    fn on_error(
        &self,
        task: &Task,
        element: &Element,
        workflow: &Workflow,
        ctx: &RunContext,
        store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>> {
        self.0.cleanup_task(task, element, workflow, ctx, store)?;
        Ok(None)
    }
}

/// Acknowledge a waiting task: the external work is done.
///
/// Returns the Updated task for the caller to persist; the next run of
/// the ticket resumes from it.
pub fn mark_updated(task: &Task, ctx: &RunContext) -> Task {
    tracing::info!(
        ticket_id = %task.ticket_id,
        task_id = %task.id,
        user = %ctx.user,
        "Waiting task marked updated"
    );
    task.derive(ctx).with_status(TaskStatus::Updated)
}

/// External task resolved by a human operator.
///
/// Beginning assigns an operator task for the step; resuming completes
/// the task unconditionally; cleanup removes the step's operator tasks.
#[derive(Clone, Copy, Debug, Default)]
pub struct OperatorExternalTask;

impl ExternalOperation for OperatorExternalTask {
    fn begin(
        &self,
        task: &Task,
        _element: &Element,
        _workflow: &Workflow,
        ctx: &RunContext,
        store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>> {
        // Re-dispatch at New must not assign the work twice
        if store.operator_tasks_for_step(&task.step_id)?.is_empty() {
            let assigned = OperatorTask::new(task.step_id.clone(), ctx.user.clone());
            tracing::info!(
                ticket_id = %task.ticket_id,
                step_id = %task.step_id,
                operator = %assigned.operator,
                "Operator task assigned"
            );
            store.insert_operator_task(assigned)?;
        }
        Ok(Some(task.derive(ctx).with_status(TaskStatus::Waiting)))
    }

    fn resume(
        &self,
        task: &Task,
        _element: &Element,
        _workflow: &Workflow,
        ctx: &RunContext,
        _store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>> {
        Ok(Some(task.derive(ctx).with_status(TaskStatus::Completed)))
    }

    fn cleanup_task(
        &self,
        task: &Task,
        _element: &Element,
        _workflow: &Workflow,
        _ctx: &RunContext,
        store: &mut dyn Storage,
    ) -> FlowResult<()> {
        store.remove_operator_tasks_for_step(&task.step_id)?;
        Ok(())
    }
}
