//! Element processor: one dispatch step for a task at its element
//!
//! The processor resolves the element's operation handler, invokes the
//! dispatch contract, and applies the cross-cutting post-conditions:
//! Finished/Terminated synthesis for dead ends and Error conversion for
//! configuration faults (unresolvable operation, malformed graph). It is
//! the only place allowed to decide that a ticket's progress has ended.

use crate::{enter_error_state, OperationRegistry, Storage};
use ticketflow_types::{
    Element, FlowError, FlowResult, RunContext, Task, TaskStatus, Workflow,
};

/// Applies a single operation dispatch to a task
#[derive(Clone, Debug)]
pub struct ElementProcessor {
    registry: OperationRegistry,
}

impl ElementProcessor {
    pub fn new(registry: OperationRegistry) -> Self {
        Self { registry }
    }

    /// The operation registry this processor dispatches through
    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Run a single dispatch on the task using its element.
    ///
    /// Returns `None` when the task is already terminal or no progress
    /// was made; otherwise the newly derived task. A `Completed` or
    /// `Error` task that made no progress is finalized to `Finished` or
    /// `Terminated` respectively.
    pub fn process_task(
        &self,
        task: &Task,
        element: &Element,
        workflow: &Workflow,
        ctx: &RunContext,
        store: &mut dyn Storage,
    ) -> FlowResult<Option<Task>> {
        if task.is_terminal() {
            return Ok(None);
        }

        let handler = match self.registry.resolve(&element.operation) {
            Ok(handler) => handler,
            Err(FlowError::UnknownOperation(op)) => {
                // Configuration fault: stop the ticket here but keep it
                // inspectable through its task history.
                tracing::warn!(
                    ticket_id = %task.ticket_id,
                    element = %element.slug_name,
                    operation = %op,
                    "Unresolvable operation; task entering error state"
                );
                return Ok(Some(enter_error_state(
                    task,
                    ctx,
                    format!("unresolvable operation '{}'", op),
                )));
            }
            Err(e) => return Err(e),
        };

        let produced = handler.handle(task, element, workflow, ctx, store)?;

        let produced = match produced {
            Some(next) => Some(next),
            None => match task.status {
                // Successful dead end: no outgoing link was taken
                TaskStatus::Completed => {
                    Some(task.derive(ctx).with_status(TaskStatus::Finished))
                }
                TaskStatus::Error => {
                    Some(task.derive(ctx).with_status(TaskStatus::Terminated))
                }
                _ => None,
            },
        };

        // Malformed graph: the produced task must sit at a resolvable element
        if let Some(next) = &produced {
            if workflow.element(&next.element_id).is_none() {
                tracing::warn!(
                    ticket_id = %task.ticket_id,
                    element_id = %next.element_id,
                    "Task moved to an element missing from its workflow"
                );
                return Ok(Some(enter_error_state(
                    task,
                    ctx,
                    "task unable to resolve its element after processing",
                )));
            }
        }

        Ok(produced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{builtin_registry, ScriptOperation};
    use crate::MemoryStorage;
    use ticketflow_types::{Element, Step, Ticket, UserId};

    fn make_processor() -> ElementProcessor {
        ElementProcessor::new(builtin_registry(ScriptOperation::new()).unwrap())
    }

    fn make_fixture(operation: &str) -> (Workflow, Task, MemoryStorage, RunContext) {
        let mut wf = Workflow::new("Test", "test");
        let a = wf
            .add_element(Element::new("a", operation).initial())
            .unwrap();
        let ticket = Ticket::new(&wf, UserId::new("alice"));
        let step = Step::new(ticket.id.clone(), a);
        let mut store = MemoryStorage::new();
        store.insert_step(step.clone()).unwrap();
        let task = Task::empty(&ticket, &step, UserId::new("alice"));
        let ctx = RunContext::new(UserId::new("alice"));
        (wf, task, store, ctx)
    }

    #[test]
    fn test_terminal_task_is_guarded() {
        let (wf, task, mut store, ctx) = make_fixture("__init");
        let element = wf.element_by_slug("a").unwrap().clone();
        let finished = task.with_status(TaskStatus::Finished);

        let result = make_processor()
            .process_task(&finished, &element, &wf, &ctx, &mut store)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_completed_dead_end_finalizes_to_finished() {
        let (wf, task, mut store, ctx) = make_fixture("__init");
        let element = wf.element_by_slug("a").unwrap().clone();
        let completed = task.with_status(TaskStatus::Completed);

        let finalized = make_processor()
            .process_task(&completed, &element, &wf, &ctx, &mut store)
            .unwrap()
            .unwrap();
        assert_eq!(finalized.status, TaskStatus::Finished);
        assert_eq!(finalized.step_id, completed.step_id);
    }

    #[test]
    fn test_error_dead_end_finalizes_to_terminated() {
        let (wf, task, mut store, ctx) = make_fixture("__init");
        let element = wf.element_by_slug("a").unwrap().clone();
        let errored = task.with_status(TaskStatus::Error);

        let finalized = make_processor()
            .process_task(&errored, &element, &wf, &ctx, &mut store)
            .unwrap()
            .unwrap();
        assert_eq!(finalized.status, TaskStatus::Terminated);
    }

    #[test]
    fn test_unresolvable_operation_enters_error_state() {
        let (wf, task, mut store, ctx) = make_fixture("no-such-operation");
        let element = wf.element_by_slug("a").unwrap().clone();

        let errored = make_processor()
            .process_task(&task, &element, &wf, &ctx, &mut store)
            .unwrap()
            .unwrap();
        assert_eq!(errored.status, TaskStatus::Error);
        let message = errored.state.get("error").unwrap().as_str().unwrap();
        assert!(message.contains("no-such-operation"));
    }

    #[test]
    fn test_init_processes_new_task() {
        let (mut wf, task, mut store, ctx) = make_fixture("__init");
        wf.elements[0].op_params.insert("x".into(), serde_json::json!(1));
        let element = wf.element_by_slug("a").unwrap().clone();

        let completed = make_processor()
            .process_task(&task, &element, &wf, &ctx, &mut store)
            .unwrap()
            .unwrap();
        assert_eq!(completed.status, TaskStatus::Completed);
        assert_eq!(completed.state.get("x"), Some(&serde_json::json!(1)));
    }
}
