//! Operation handler contract: per-status dispatch for element operations
//!
//! An operation handler exposes one entry point, [`OperationHandler::handle`],
//! which dispatches on the incoming task's status through a dense match to
//! per-status methods. Each operation kind overrides only the statuses it
//! cares about; everything else falls through to [`OperationHandler::fallback`].
//!
//! Contract for every sub-handler: given a non-terminal task, return either
//! `None` (no progress this invocation) or a new task derived from the input
//! — never mutate the input in place. Side effects must be idempotent with
//! respect to repeated invocation at the same status.

use crate::Storage;
use ticketflow_types::{
    Element, FlowResult, RunContext, Step, Task, TaskStatus, Workflow, DEFAULT_OUTCOME,
};

/// The polymorphic logic bound to an element, dispatched per task status
pub trait OperationHandler: Send + Sync {
    /// Entry point: route the task to the sub-handler for its status.
    ///
    /// Terminal statuses produce no work here; the element processor
    /// guards them before dispatch anyway.
    fn handle(
        &self,
        task: &Task,
        element: &Element,
        workflow: &Workflow,
        ctx: &RunContext,
        store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>> {
        match task.status {
            TaskStatus::New => self.on_new(task, element, workflow, ctx, store),
            TaskStatus::Waiting => self.on_waiting(task, element, workflow, ctx, store),
            TaskStatus::Updated => self.on_updated(task, element, workflow, ctx, store),
            TaskStatus::Completed => self.on_completed(task, element, workflow, ctx, store),
            TaskStatus::Error => self.on_error(task, element, workflow, ctx, store),
            TaskStatus::Finished | TaskStatus::Terminated => Ok(None),
        }
    }

    fn on_new(
        &self,
        task: &Task,
        element: &Element,
        workflow: &Workflow,
        ctx: &RunContext,
        store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>> {
        self.fallback(task, element, workflow, ctx, store)
    }

    fn on_waiting(
        &self,
        task: &Task,
        element: &Element,
        workflow: &Workflow,
        ctx: &RunContext,
        store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>> {
        self.fallback(task, element, workflow, ctx, store)
    }

    fn on_updated(
        &self,
        task: &Task,
        element: &Element,
        workflow: &Workflow,
        ctx: &RunContext,
        store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>> {
        self.fallback(task, element, workflow, ctx, store)
    }

    /// Default completion behavior: move to the next element along the
    /// "next" outcome.
    fn on_completed(
        &self,
        task: &Task,
        element: &Element,
        workflow: &Workflow,
        ctx: &RunContext,
        store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>> {
        move_to_next(task, element, workflow, DEFAULT_OUTCOME, ctx, store)
    }

    /// Default error behavior: no progress; the processor synthesizes
    /// the Terminated task.
    fn on_error(
        &self,
        _task: &Task,
        _element: &Element,
        _workflow: &Workflow,
        _ctx: &RunContext,
        _store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>> {
        Ok(None)
    }

    /// Where unhandled statuses land: no progress
    fn fallback(
        &self,
        _task: &Task,
        _element: &Element,
        _workflow: &Workflow,
        _ctx: &RunContext,
        _store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>> {
        Ok(None)
    }
}

// ── Graph traversal ──────────────────────────────────────────────────

/// Move a task across the link carrying the named outcome.
///
/// No link with that outcome means a dead end: `None` is returned and
/// the processor's Finished/Terminated synthesis applies. When several
/// links share the outcome, the last one in definition order wins. A
/// self-loop re-enters the current element without creating a step; any
/// other target gets exactly one new persisted step.
pub fn move_to_next(
    task: &Task,
    element: &Element,
    workflow: &Workflow,
    outcome: &str,
    ctx: &RunContext,
    store: &mut dyn Storage,
) -> FlowResult<Option<Task>> {
    let links = workflow.outgoing_links_named(&element.id, outcome);
    let link = match links.last() {
        Some(link) => *link,
        None => return Ok(None),
    };

    let next = task.derive(ctx).with_status(TaskStatus::New);
    if link.target == task.element_id {
        return Ok(Some(next));
    }

    let step = Step::new(task.ticket_id.clone(), link.target.clone());
    store.insert_step(step.clone())?;
    tracing::debug!(
        ticket_id = %task.ticket_id,
        from = %element.slug_name,
        to = %link.target,
        outcome = %outcome,
        "Ticket crossed link"
    );
    Ok(Some(next.at_step(&step)))
}

/// Derive an Error task from the incoming one, carrying the prior state
/// and a message for diagnosis.
pub fn enter_error_state(task: &Task, ctx: &RunContext, message: impl Into<String>) -> Task {
    task.derive(ctx).into_error(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;
    use ticketflow_types::{Element, Link, Ticket, UserId};

    struct NoopOperation;
    impl OperationHandler for NoopOperation {}

    fn make_fixture() -> (Workflow, Task, MemoryStorage, RunContext) {
        let mut wf = Workflow::new("Test", "test");
        let a = wf
            .add_element(Element::new("a", "__init").initial())
            .unwrap();
        let b = wf.add_element(Element::new("b", "script")).unwrap();
        wf.add_link(Link::new(a.clone(), b)).unwrap();

        let ticket = Ticket::new(&wf, UserId::new("alice"));
        let step = Step::new(ticket.id.clone(), a);
        let mut store = MemoryStorage::new();
        store.insert_step(step.clone()).unwrap();
        let task = Task::empty(&ticket, &step, UserId::new("alice"));
        let ctx = RunContext::new(UserId::new("alice"));
        (wf, task, store, ctx)
    }

    #[test]
    fn test_default_dispatch_is_no_progress() {
        let (wf, task, mut store, ctx) = make_fixture();
        let element = wf.element_by_slug("a").unwrap().clone();
        let result = NoopOperation
            .handle(&task, &element, &wf, &ctx, &mut store)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_completed_moves_to_next() {
        let (wf, task, mut store, ctx) = make_fixture();
        let element = wf.element_by_slug("a").unwrap().clone();
        let completed = task.with_status(TaskStatus::Completed);

        let moved = NoopOperation
            .handle(&completed, &element, &wf, &ctx, &mut store)
            .unwrap()
            .unwrap();

        assert_eq!(moved.status, TaskStatus::New);
        assert_eq!(moved.element_id, wf.element_by_slug("b").unwrap().id);
        assert_ne!(moved.step_id, completed.step_id);
        assert_eq!(store.step_count(), 2);
    }

    #[test]
    fn test_terminal_statuses_dispatch_to_nothing() {
        let (wf, task, mut store, ctx) = make_fixture();
        let element = wf.element_by_slug("a").unwrap().clone();
        let finished = task.with_status(TaskStatus::Finished);
        let result = NoopOperation
            .handle(&finished, &element, &wf, &ctx, &mut store)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_move_with_no_matching_outcome_is_dead_end() {
        let (wf, task, mut store, ctx) = make_fixture();
        let element = wf.element_by_slug("a").unwrap().clone();
        let result =
            move_to_next(&task, &element, &wf, "escalate", &ctx, &mut store).unwrap();
        assert!(result.is_none());
        assert_eq!(store.step_count(), 1);
    }

    #[test]
    fn test_self_loop_creates_no_step() {
        let mut wf = Workflow::new("Loop", "loop");
        let a = wf
            .add_element(Element::new("a", "external-task").initial())
            .unwrap();
        wf.add_link(Link::new(a.clone(), a.clone())).unwrap();

        let ticket = Ticket::new(&wf, UserId::new("alice"));
        let step = Step::new(ticket.id.clone(), a.clone());
        let mut store = MemoryStorage::new();
        store.insert_step(step.clone()).unwrap();
        let task = Task::empty(&ticket, &step, UserId::new("alice"));
        let ctx = RunContext::new(UserId::new("alice"));
        let element = wf.element_by_slug("a").unwrap().clone();

        let moved = move_to_next(&task, &element, &wf, "next", &ctx, &mut store)
            .unwrap()
            .unwrap();
        assert_eq!(moved.step_id, task.step_id);
        assert_eq!(store.step_count(), 1);
    }

    #[test]
    fn test_duplicate_outcome_last_link_wins() {
        let mut wf = Workflow::new("Dup", "dup");
        let a = wf
            .add_element(Element::new("a", "script").initial())
            .unwrap();
        let b = wf.add_element(Element::new("b", "script")).unwrap();
        let c = wf.add_element(Element::new("c", "script")).unwrap();
        wf.add_link(Link::new(a.clone(), b)).unwrap();
        wf.add_link(Link::new(a.clone(), c.clone())).unwrap();

        let ticket = Ticket::new(&wf, UserId::new("alice"));
        let step = Step::new(ticket.id.clone(), a.clone());
        let mut store = MemoryStorage::new();
        store.insert_step(step.clone()).unwrap();
        let task = Task::empty(&ticket, &step, UserId::new("alice"));
        let ctx = RunContext::new(UserId::new("alice"));
        let element = wf.element_by_slug("a").unwrap().clone();

        let moved = move_to_next(&task, &element, &wf, "next", &ctx, &mut store)
            .unwrap()
            .unwrap();
        assert_eq!(moved.element_id, c);
        // exactly one new step despite two matching links
        assert_eq!(store.step_count(), 2);
    }

    #[test]
    fn test_enter_error_state() {
        let (_, task, _, ctx) = make_fixture();
        let errored = enter_error_state(&task, &ctx, "boom");
        assert_eq!(errored.status, TaskStatus::Error);
        assert_eq!(errored.state.get("error"), Some(&serde_json::json!("boom")));
    }
}
